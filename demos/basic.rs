//! Minimal donner example: JSON endpoints, validation, an upload and a redirect.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/status
//!   curl 'http://localhost:3000/users?page=2&ids=1,2,3'
//!   curl http://localhost:3000/users/abc
//!   curl -F title=me -F avatar=@photo.png http://localhost:3000/avatar
//!   curl -i http://localhost:3000/old-home

use donner::{
    ApiError, INVALID_REQUEST, Items, Method, Redirect, Reply, Request, Router, Server, Status,
};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let app = Router::new()
        .on(Method::Get,  "/status",     status)
        .on(Method::Get,  "/users",      list_users)
        .on(Method::Get,  "/users/{id}", show_user)
        .on(Method::Post, "/avatar",     upload_avatar)
        .on(Method::All,  "/old-home",   old_home);

    Server::bind("0.0.0.0:3000")
        .upload_dir(std::env::temp_dir())
        .serve(app)
        .await
        .expect("server error");
}

#[derive(Serialize)]
struct User {
    id: i64,
    name: String,
    email: Option<String>,
    _password_hash: String,
}

fn user(id: i64) -> User {
    User {
        id,
        name: format!("user{id}"),
        email: (id % 2 == 0).then(|| format!("user{id}@example.com")),
        _password_hash: "never rendered".to_owned(),
    }
}

// GET /status
fn status(_req: &Request, _params: &[String]) -> Result<Reply, ApiError> {
    Reply::json(Status::Ok, &json!({ "status": "online" }))
}

// GET /users?page=2&ids=1,2,3
//
// Null fields and `_`-prefixed fields are stripped from each row.
fn list_users(req: &Request, _params: &[String]) -> Result<Items, ApiError> {
    let page = req.get("page").default_value(1).as_positive_int("Invalid page", 1)?;
    let ids = req.get("ids").default_value("1,2").as_positive_int_list("Invalid ids", 2)?;

    let rows: Vec<User> = ids.into_iter().map(user).collect();
    let total = rows.len() as u64;
    let items = Items::new(rows, total)?;
    Ok(if page > 1 { items.previous_cursor((page - 1).to_string()) } else { items })
}

// GET /users/{id}
fn show_user(_req: &Request, params: &[String]) -> Result<Reply, ApiError> {
    let id: i64 = params[0]
        .parse()
        .map_err(|_| ApiError::invalid("Invalid user ID", INVALID_REQUEST))?;
    Reply::object(Status::Ok, &user(id))
}

// POST /avatar (multipart)
fn upload_avatar(req: &Request, _params: &[String]) -> Result<Reply, ApiError> {
    let title = req.get("title").default_value("untitled").as_string("Invalid title", 3)?;
    let file = req
        .get_file("avatar")
        .required("Avatar is required", 4)?
        .max_size(2 * 1024 * 1024, "Avatar is too large", 5)?
        .to_file()
        .ok_or_else(|| ApiError::invalid("Avatar could not be read", 6))?;

    if !file.is_image() {
        return Err(ApiError::invalid("Avatar must be an image", 7));
    }

    Reply::json(Status::Created, &json!({
        "title": title,
        "name": file.name(),
        "mime": file.mime(),
        "size": file.size(),
    }))
}

// ANY /old-home -> 302 /status?from=old-home
fn old_home(_req: &Request, _params: &[String]) -> Result<Redirect, ApiError> {
    Ok(Redirect::new("/status")?.query("from", "old-home"))
}
