use std::io::Write;
use std::path::{Path, PathBuf};

use donner::{ApiError, FileDescriptor, Input, Method, Reply, Request, Router, Status};
use serde_json::{Value, json};

const GIF: &[u8] = b"GIF89a\x01\x00\x01\x00\x80\x00\x00\xff\xff\xff\x00\x00\x00,";

fn spool(dir: &Path, bytes: &[u8]) -> PathBuf {
    let mut tmp = tempfile::Builder::new().prefix("upload").tempfile_in(dir).unwrap();
    tmp.write_all(bytes).unwrap();
    tmp.keep().unwrap().1
}

fn avatar(req: &Request, _params: &[String]) -> Result<Reply, ApiError> {
    let file = req
        .get_file("avatar")
        .required("Avatar is required", 10)?
        .max_size(1024, "Avatar too large", 11)?
        .to_file()
        .ok_or_else(|| ApiError::invalid("Avatar unreadable", 12))?;
    if !file.is_image() {
        return Err(ApiError::invalid("Avatar must be an image", 13));
    }
    Reply::json(Status::Created, &json!({
        "name": file.name(),
        "mime": file.mime(),
        "size": file.size(),
        "extension": file.extension(),
    }))
}

fn router() -> Router {
    Router::new().on(Method::Post, "/avatar", avatar)
}

fn error_code(body: &[u8]) -> i64 {
    let v: Value = serde_json::from_slice(body).unwrap();
    v["error"]["code"].as_i64().unwrap()
}

#[test]
fn accepted_upload_is_probed_and_released() {
    let dir = tempfile::tempdir().unwrap();
    let path = spool(dir.path(), GIF);
    let req = Request::new("POST", "/avatar")
        .with_upload_dir(dir.path())
        .with_file("avatar", FileDescriptor::new(&path, "Me.GIF", GIF.len() as i64));

    let resp = router().run(req);
    assert_eq!(resp.status_code(), 201);
    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(body, json!({ "name": "Me.GIF", "mime": "image/gif", "size": GIF.len(), "extension": "gif" }));
    // The handler dropped the UploadFile, which removed the temp file.
    assert!(!path.exists());
}

#[test]
fn missing_upload_is_rejected() {
    let resp = router().run(Request::new("POST", "/avatar"));
    assert_eq!(resp.status_code(), 400);
    assert_eq!(error_code(resp.body()), 10);
}

#[test]
fn declared_size_is_checked() {
    let dir = tempfile::tempdir().unwrap();
    let path = spool(dir.path(), GIF);
    let req = Request::new("POST", "/avatar")
        .with_upload_dir(dir.path())
        .with_file("avatar", FileDescriptor::new(&path, "me.gif", 4096));
    assert_eq!(error_code(router().run(req).body()), 11);
}

#[test]
fn renamed_text_is_not_an_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = spool(dir.path(), b"definitely not a picture");
    let req = Request::new("POST", "/avatar")
        .with_upload_dir(dir.path())
        .with_file("avatar", FileDescriptor::new(&path, "cat.png", 24));
    assert_eq!(error_code(router().run(req).body()), 13);
}

#[test]
fn foreign_paths_are_unreadable() {
    let spool_dir = tempfile::tempdir().unwrap();
    let other = tempfile::tempdir().unwrap();
    let path = spool(other.path(), GIF);
    let req = Request::new("POST", "/avatar")
        .with_upload_dir(spool_dir.path())
        .with_file("avatar", FileDescriptor::new(&path, "me.gif", GIF.len() as i64));
    assert_eq!(error_code(router().run(req).body()), 12);
    assert!(path.exists());
}

#[test]
fn all_merges_params_and_files() {
    let descriptor = FileDescriptor::new("/tmp/upload1", "a.txt", 1);
    let req = Request::new("POST", "/")
        .with_param("a", "1")
        .with_param("doc", "shadowed")
        .with_file("doc", descriptor.clone());
    let all = req.all();
    assert_eq!(all.get("a"), Some(&Input::Param("1")));
    assert_eq!(all.get("doc"), Some(&Input::File(&descriptor)));
}
