//! Incoming request and its parameter context.
//!
//! A [`Request`] is built by the transport (the bundled
//! [`Server`](crate::Server), or any other collaborator) and handed to
//! [`Router::run`](crate::Router::run). It is immutable for the lifetime of
//! the request. Handlers read inputs through [`Request::get`] and
//! [`Request::get_file`], which return chainable validators.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::file::FileParam;
use crate::param::Param;

/// Raw, untrusted description of one uploaded file.
///
/// Every field is optional because the transport may only have parsed part of
/// a multipart section; a descriptor missing any field counts as absent when
/// validated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileDescriptor {
    pub temp_path: Option<PathBuf>,
    pub original_name: Option<String>,
    pub declared_size: Option<i64>,
}

impl FileDescriptor {
    pub fn new(temp_path: impl Into<PathBuf>, original_name: impl Into<String>, declared_size: i64) -> Self {
        Self {
            temp_path: Some(temp_path.into()),
            original_name: Some(original_name.into()),
            declared_size: Some(declared_size),
        }
    }

    /// All three fields are present.
    pub fn is_complete(&self) -> bool {
        self.temp_path.is_some() && self.original_name.is_some() && self.declared_size.is_some()
    }
}

/// One entry of [`Request::all`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Param(&'a str),
    File(&'a FileDescriptor),
}

/// An incoming HTTP request.
#[derive(Clone, Debug)]
pub struct Request {
    method: String,
    uri: String,
    params: HashMap<String, String>,
    files: HashMap<String, FileDescriptor>,
    upload_dir: PathBuf,
}

impl Request {
    /// `uri` is the request target as received: path plus optional query.
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            params: HashMap::new(),
            files: HashMap::new(),
            upload_dir: std::env::temp_dir(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.params.extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_file(mut self, name: impl Into<String>, file: FileDescriptor) -> Self {
        self.files.insert(name.into(), file);
        self
    }

    /// Directory the transport spools uploads into. Temp paths outside it
    /// are not accepted as uploads.
    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = dir.into();
        self
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn uri(&self) -> &str { &self.uri }
    pub fn upload_dir(&self) -> &Path { &self.upload_dir }
    pub fn files(&self) -> &HashMap<String, FileDescriptor> { &self.files }

    /// The request path, without the query string.
    pub fn path(&self) -> &str {
        match self.uri.split_once('?') {
            Some((path, _)) => path,
            None => &self.uri,
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn file_exists(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Validator for a query/body parameter. Never fails by itself.
    pub fn get(&self, name: &str) -> Param {
        Param::new(name, self.params.get(name).cloned())
    }

    /// Validator for an uploaded file. Never fails by itself.
    pub fn get_file(&self, name: &str) -> FileParam {
        FileParam::new(name, self.files.get(name).cloned(), self.upload_dir.clone())
    }

    /// Parameters and files merged by name; a file wins over a parameter
    /// with the same name.
    pub fn all(&self) -> HashMap<&str, Input<'_>> {
        let mut merged: HashMap<&str, Input<'_>> = self.params.iter()
            .map(|(k, v)| (k.as_str(), Input::Param(v.as_str())))
            .collect();
        merged.extend(self.files.iter().map(|(k, f)| (k.as_str(), Input::File(f))));
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_excludes_query() {
        assert_eq!(Request::new("GET", "/users?page=2").path(), "/users");
        assert_eq!(Request::new("GET", "/users").path(), "/users");
        assert_eq!(Request::new("GET", "/?").path(), "/");
    }

    #[test]
    fn membership_checks() {
        let req = Request::new("POST", "/upload")
            .with_param("title", "")
            .with_file("avatar", FileDescriptor::default());
        assert!(req.exists("title"));
        assert!(!req.exists("avatar"));
        assert!(req.file_exists("avatar"));
        assert!(!req.file_exists("title"));
    }

    #[test]
    fn all_prefers_files_on_collision() {
        let file = FileDescriptor::new("/tmp/upload123", "a.png", 10);
        let req = Request::new("POST", "/")
            .with_params([("doc", "text"), ("q", "x")])
            .with_file("doc", file.clone());
        let all = req.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all["doc"], Input::File(&file));
        assert_eq!(all["q"], Input::Param("x"));
    }

    #[test]
    fn descriptor_completeness() {
        assert!(FileDescriptor::new("/tmp/x", "x.txt", 1).is_complete());
        let partial = FileDescriptor { original_name: Some("x.txt".into()), ..Default::default() };
        assert!(!partial.is_complete());
    }
}
