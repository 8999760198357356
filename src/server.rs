//! HTTP transport and graceful shutdown.
//!
//! The server is the collaborator that turns wire requests into
//! [`Request`] values and writes [`Response`]s back. Per request it:
//!
//! 1. collects the body, answering `413` past [`Server::max_body`],
//! 2. decodes query-string and `application/x-www-form-urlencoded`
//!    parameters (body wins on a name clash),
//! 3. spools `multipart/form-data` file parts into the upload directory,
//! 4. runs the [`Router`] on the blocking pool,
//! 5. deletes spooled files that no handler persisted.
//!
//! On **SIGTERM** or Ctrl-C it stops accepting, lets in-flight connections
//! finish, and then [`Server::serve`] returns.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::form::{multipart_boundary, parse_form, parse_multipart, spool};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// Default cap on a collected request body: 8 MiB.
const DEFAULT_MAX_BODY: usize = 8 * 1024 * 1024;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    upload_dir: PathBuf,
    max_body: usize,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    ///
    /// ```rust,no_run
    /// use donner::Server;
    /// let server = Server::bind("0.0.0.0:3000").upload_dir("/var/spool/donner");
    /// ```
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr, upload_dir: std::env::temp_dir(), max_body: DEFAULT_MAX_BODY }
    }

    /// Directory multipart uploads are spooled into. Defaults to the system
    /// temp directory.
    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = dir.into();
        self
    }

    /// Largest request body accepted, in bytes. Larger bodies are answered
    /// with `413 Content Too Large` before routing.
    pub fn max_body(mut self, bytes: usize) -> Self {
        self.max_body = bytes;
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let router = Arc::new(router);
        let upload_dir = Arc::new(self.upload_dir);
        let max_body = self.max_body;

        info!(addr = %self.addr, upload_dir = %upload_dir.display(), max_body, "donner listening");

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting at once.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let upload_dir = Arc::clone(&upload_dir);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            let upload_dir = Arc::clone(&upload_dir);
                            async move { dispatch(router, upload_dir, max_body, req).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("donner stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one request and produces one response. Every failure is turned
/// into a status code here, so hyper never sees an error.
async fn dispatch(
    router: Arc<Router>,
    upload_dir: Arc<PathBuf>,
    max_body: usize,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match read_body(body, max_body).await {
        Ok(body) => body,
        Err(status) => return Ok(Response::status(status).into_http()),
    };

    let request = build_request(&parts, &body, &upload_dir);
    let spooled: Vec<PathBuf> = request.files().values()
        .filter_map(|f| f.temp_path.clone())
        .collect();

    let response = match tokio::task::spawn_blocking(move || router.run(request)).await {
        Ok(response) => response,
        Err(e) => {
            error!("handler panicked: {e}");
            Response::status(Status::InternalServerError)
        }
    };

    for path in spooled {
        if path.exists() {
            let _ = std::fs::remove_file(&path);
        }
    }

    Ok(response.into_http())
}

/// Collects at most `limit` bytes. Fails with the status to answer:
/// `413` past the limit, `400` when the body cannot be read.
async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, Status>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            warn!(limit, "request body too large");
            Err(Status::ContentTooLarge)
        }
        Err(e) => {
            warn!("failed to read request body: {e}");
            Err(Status::BadRequest)
        }
    }
}

fn build_request(parts: &http::request::Parts, body: &[u8], upload_dir: &Path) -> Request {
    let uri = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    let mut request = Request::new(parts.method.as_str(), uri)
        .with_upload_dir(upload_dir)
        .with_params(parse_form(parts.uri.query().unwrap_or("").as_bytes()));

    let content_type = parts.headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("application/x-www-form-urlencoded") {
        request = request.with_params(parse_form(body));
    } else if let Some(boundary) = multipart_boundary(content_type) {
        for part in parse_multipart(body, boundary) {
            match part.filename.as_deref() {
                None => {
                    let value = String::from_utf8_lossy(&part.data).into_owned();
                    request = request.with_param(part.name, value);
                }
                // No file chosen in the form field.
                Some("") => {}
                Some(_) => match spool(&part, upload_dir) {
                    Ok(descriptor) => request = request.with_file(part.name, descriptor),
                    Err(e) => error!(field = %part.name, "failed to spool upload: {e}"),
                },
            }
        }
    }
    request
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or Ctrl-C.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(method: &str, uri: &str, content_type: Option<&str>) -> http::request::Parts {
        let mut builder = http::Request::builder().method(method).uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn body_within_limit_is_collected() {
        let body = read_body(Full::new(Bytes::from_static(b"a=1")), 3).await.unwrap();
        assert_eq!(&body[..], b"a=1");
    }

    #[tokio::test]
    async fn oversized_body_is_413() {
        let status = read_body(Full::new(Bytes::from_static(b"a=12")), 3).await.unwrap_err();
        assert_eq!(status, Status::ContentTooLarge);
    }

    #[test]
    fn query_parameters_reach_the_request() {
        let dir = tempfile::tempdir().unwrap();
        let req = build_request(&parts("GET", "/users?page=2&q=a+b", None), b"", dir.path());
        assert_eq!(req.method(), "GET");
        assert_eq!(req.path(), "/users");
        assert_eq!(req.get("page").as_int("x", 0).unwrap(), 2);
        assert_eq!(req.get("q").as_string("x", 0).unwrap(), "a b");
    }

    #[test]
    fn form_body_overrides_query() {
        let dir = tempfile::tempdir().unwrap();
        let p = parts("POST", "/save?id=1&mode=q", Some("application/x-www-form-urlencoded"));
        let req = build_request(&p, b"mode=body&name=x%21", dir.path());
        assert_eq!(req.get("id").as_int("x", 0).unwrap(), 1);
        assert_eq!(req.get("mode").as_string("x", 0).unwrap(), "body");
        assert_eq!(req.get("name").as_string("x", 0).unwrap(), "x!");
    }

    #[test]
    fn multipart_files_are_spooled() {
        let dir = tempfile::tempdir().unwrap();
        let p = parts("POST", "/upload", Some("multipart/form-data; boundary=B"));
        let body = b"--B\r\n\
Content-Disposition: form-data; name=\"title\"\r\n\r\n\
hi\r\n\
--B\r\n\
Content-Disposition: form-data; name=\"doc\"; filename=\"notes.txt\"\r\n\r\n\
some notes\r\n\
--B\r\n\
Content-Disposition: form-data; name=\"empty\"; filename=\"\"\r\n\r\n\
\r\n\
--B--\r\n";
        let req = build_request(&p, body, dir.path());

        assert_eq!(req.get("title").as_string("x", 0).unwrap(), "hi");
        assert!(!req.file_exists("empty"));
        let file = req.get_file("doc").required("x", 0).unwrap().to_file().unwrap();
        assert_eq!(file.name(), "notes.txt");
        assert_eq!(file.mime(), "text/plain");
        assert_eq!(file.size(), 10);
    }
}
