//! Content-based mime detection for uploaded files.
//!
//! Only the leading bytes are inspected; the client-declared content type
//! and file name are never consulted. Binary formats are recognized by
//! `infer`; anything it does not know is classed as plain text or as an
//! opaque byte stream.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Same window `infer::get_from_path` reads.
const SNIFF_LEN: u64 = 8192;

/// Reads the head of `path` and guesses its mime type. `Ok(None)` for an
/// empty file.
pub(crate) fn sniff_file(path: &Path) -> io::Result<Option<&'static str>> {
    let mut head = Vec::new();
    File::open(path)?.take(SNIFF_LEN).read_to_end(&mut head)?;
    Ok(sniff(&head))
}

pub(crate) fn sniff(head: &[u8]) -> Option<&'static str> {
    if head.is_empty() {
        return None;
    }
    if let Some(kind) = infer::get(head) {
        return Some(kind.mime_type());
    }
    if is_text(head) {
        return Some("text/plain");
    }
    Some("application/octet-stream")
}

fn is_text(head: &[u8]) -> bool {
    // A multi-byte sequence may be cut at the sniff boundary.
    let valid = match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    };
    valid && !head.iter().any(|b| matches!(b, 0x00..=0x08 | 0x0e..=0x1a | 0x1c..=0x1f))
}
