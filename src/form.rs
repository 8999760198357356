//! Request-body and query-string decoding for the bundled transport.
//!
//! Only what a [`Request`](crate::Request) needs: flat string parameters
//! and spooled file parts. Nested keys (`a[b]=c`) are kept verbatim.

use std::io::{self, Write};
use std::path::Path;

use crate::request::FileDescriptor;

/// One decoded `multipart/form-data` section.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Part {
    pub(crate) name: String,
    pub(crate) filename: Option<String>,
    pub(crate) data: Vec<u8>,
}

/// Decodes an `application/x-www-form-urlencoded` payload, which is also
/// the query-string format. Pairs with an empty name are skipped.
pub(crate) fn parse_form(raw: &[u8]) -> Vec<(String, String)> {
    url::form_urlencoded::parse(raw)
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Extracts the boundary from a `multipart/form-data` content type.
pub(crate) fn multipart_boundary(content_type: &str) -> Option<&str> {
    let (mime, params) = content_type.split_once(';')?;
    if !mime.trim().eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }
    params.split(';').find_map(|p| {
        let (k, v) = p.split_once('=')?;
        k.trim().eq_ignore_ascii_case("boundary").then(|| v.trim().trim_matches('"'))
    })
    .filter(|b| !b.is_empty())
}

/// Splits a multipart body into its parts. Malformed sections are dropped.
///
/// Past the first one, a delimiter only counts at the start of a line and
/// when followed by `--` or a line break, so boundary text inside part data
/// is left alone.
pub(crate) fn parse_multipart(body: &[u8], boundary: &str) -> Vec<Part> {
    let dash = format!("--{boundary}").into_bytes();
    let delimiter = format!("\r\n--{boundary}").into_bytes();
    let mut parts = Vec::new();

    // The first delimiter may open the body with no preceding CRLF.
    let mut cursor = if body.starts_with(&dash) {
        dash.len()
    } else {
        match find_delimiter(body, &delimiter, 0) {
            Some(at) => at + delimiter.len(),
            None => return parts,
        }
    };

    loop {
        if body[cursor..].starts_with(b"--") {
            break;
        }
        // Skip transport padding up to the end of the delimiter line.
        let Some(eol) = find(body, b"\r\n", cursor) else { break };
        let start = eol + 2;
        let Some(next) = find_delimiter(body, &delimiter, start) else { break };
        if let Some(part) = parse_part(&body[start..next]) {
            parts.push(part);
        }
        cursor = next + delimiter.len();
    }
    parts
}

/// Next `delimiter` at or after `from` that is followed by `--`, a line
/// break or padding.
fn find_delimiter(body: &[u8], delimiter: &[u8], mut from: usize) -> Option<usize> {
    loop {
        let at = find(body, delimiter, from)?;
        match body.get(at + delimiter.len()) {
            None | Some(b'-' | b'\r' | b' ' | b'\t') => return Some(at),
            Some(_) => from = at + 1,
        }
    }
}

fn parse_part(section: &[u8]) -> Option<Part> {
    let split = find(section, b"\r\n\r\n", 0)?;
    let head = std::str::from_utf8(&section[..split]).ok()?;
    let data = section[split + 4..].to_vec();

    let disposition = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim().eq_ignore_ascii_case("content-disposition").then_some(value)
        })?;

    let mut name = None;
    let mut filename = None;
    for attr in disposition.split(';').skip(1) {
        let Some((k, v)) = attr.split_once('=') else { continue };
        let v = v.trim().trim_matches('"').to_owned();
        match k.trim() {
            "name" => name = Some(v),
            "filename" => filename = Some(v),
            _ => {}
        }
    }

    Some(Part { name: name?, filename, data })
}

/// Writes a file part into `dir` and describes it. The caller owns the file.
pub(crate) fn spool(part: &Part, dir: &Path) -> io::Result<FileDescriptor> {
    let mut tmp = tempfile::Builder::new().prefix("donner-").tempfile_in(dir)?;
    tmp.write_all(&part.data)?;
    let (_, path) = tmp.keep().map_err(|e| e.error)?;
    Ok(FileDescriptor::new(
        path,
        part.filename.clone().unwrap_or_default(),
        part.data.len() as i64,
    ))
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}
