//! Uploaded-file validation and normalization.
//!
//! [`FileParam`] checks the raw [`FileDescriptor`] a transport produced;
//! [`FileParam::to_file`] turns it into an [`UploadFile`] whose mime type and
//! size come from the bytes on disk, not from what the client declared.
//!
//! An [`UploadFile`] owns its temp file. It is removed by
//! [`UploadFile::clear`] or when the value is dropped, unless it was moved
//! somewhere permanent with [`UploadFile::persist`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ApiError;
use crate::request::FileDescriptor;
use crate::sniff::sniff_file;

/// Validator around one uploaded-file descriptor.
#[derive(Clone, Debug)]
pub struct FileParam {
    name: String,
    descriptor: Option<FileDescriptor>,
    upload_dir: PathBuf,
}

impl FileParam {
    pub fn new(name: impl Into<String>, descriptor: Option<FileDescriptor>, upload_dir: PathBuf) -> Self {
        Self { name: name.into(), descriptor, upload_dir }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn descriptor(&self) -> Option<&FileDescriptor> { self.descriptor.as_ref() }

    /// Fails unless a descriptor with path, name and size is present.
    pub fn required(self, message: impl Into<String>, code: i64) -> Result<Self, ApiError> {
        match &self.descriptor {
            Some(d) if d.is_complete() => Ok(self),
            _ => Err(ApiError::invalid(message, code)),
        }
    }

    /// Fails unless the declared size is in `1..=max_bytes`.
    pub fn max_size(self, max_bytes: i64, message: impl Into<String>, code: i64) -> Result<Self, ApiError> {
        match self.descriptor.as_ref().and_then(|d| d.declared_size) {
            Some(size) if size > 0 && size <= max_bytes => Ok(self),
            _ => Err(ApiError::invalid(message, code)),
        }
    }

    /// `None` when the descriptor is missing or cannot be normalized.
    pub fn to_file(&self) -> Option<UploadFile> {
        UploadFile::from_descriptor(self.descriptor.as_ref()?, &self.upload_dir)
    }
}

/// A verified upload with probed metadata.
#[derive(Debug)]
pub struct UploadFile {
    path: PathBuf,
    mime: String,
    name: String,
    size: u64,
    extension: Option<String>,
    persisted: bool,
}

impl UploadFile {
    /// Normalizes `descriptor`; any failure yields `None`, never an error.
    pub fn from_descriptor(descriptor: &FileDescriptor, upload_dir: &Path) -> Option<Self> {
        let original = descriptor.original_name.as_deref().filter(|n| !n.is_empty())?;
        let temp = descriptor.temp_path.as_deref().filter(|p| !p.as_os_str().is_empty())?;

        if !is_upload(temp, upload_dir) {
            debug!(path = %temp.display(), "rejected: not a spooled upload");
            return None;
        }

        let size = fs::metadata(temp).ok()?.len();
        let mime = match sniff_file(temp) {
            Ok(Some(mime)) if size > 0 => mime,
            Ok(_) => return None,
            Err(e) => {
                debug!(path = %temp.display(), "mime probe failed: {e}");
                return None;
            }
        };

        let name = Path::new(original).file_name()?.to_string_lossy().into_owned();
        let extension = extension_of(&name);

        Some(Self {
            path: temp.to_path_buf(),
            mime: mime.to_owned(),
            name,
            size,
            extension,
            persisted: false,
        })
    }

    pub fn path(&self) -> &Path { &self.path }
    pub fn mime(&self) -> &str { &self.mime }
    /// Base name of the client-supplied file name.
    pub fn name(&self) -> &str { &self.name }
    /// Size on disk, in bytes.
    pub fn size(&self) -> u64 { self.size }
    /// Lowercased extension of [`name`](Self::name).
    pub fn extension(&self) -> Option<&str> { self.extension.as_deref() }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image")
    }

    /// Deletes the temp file if it is still there. Idempotent; errors are
    /// ignored.
    pub fn clear(&mut self) {
        if self.persisted {
            return;
        }
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                debug!(path = %self.path.display(), "temp file removal failed: {e}");
            }
        }
    }

    /// Moves the upload to `dest` and gives up ownership of the file.
    pub fn persist(mut self, dest: impl AsRef<Path>) -> io::Result<PathBuf> {
        let dest = dest.as_ref();
        if fs::rename(&self.path, dest).is_err() {
            // Rename fails across filesystems.
            fs::copy(&self.path, dest)?;
            let _ = fs::remove_file(&self.path);
        }
        self.persisted = true;
        Ok(dest.to_path_buf())
    }
}

impl Drop for UploadFile {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Lowercased text after the last `.` of `name`. A leading dot counts, so
/// `.htaccess` has extension `htaccess`; a trailing dot yields none.
fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// The path is a regular file (not a symlink) inside the upload directory.
fn is_upload(path: &Path, upload_dir: &Path) -> bool {
    let Ok(meta) = fs::symlink_metadata(path) else { return false };
    if !meta.is_file() {
        return false;
    }
    match (path.canonicalize(), upload_dir.canonicalize()) {
        (Ok(file), Ok(dir)) => file.starts_with(&dir),
        _ => false,
    }
}
