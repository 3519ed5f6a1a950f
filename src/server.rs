//! HTTP host adapter and graceful shutdown.
//!
//! Every request gets its own [`Router`]: the server derives a
//! [`RequestContext`] from the request, hands a fresh router to the
//! application's route-definition function, runs it and sends the
//! [`Response`](crate::Response) it produced. Nothing is shared between
//! requests except that function, so controller instances never outlive the
//! request they were created for.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or **Ctrl-C** the server stops accepting connections, lets
//! every in-flight connection finish, then returns from [`Server::serve`].

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::error::Error;
use crate::request::RequestContext;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    script_name: String,
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
    /// use waypost::Server;
    /// let server = Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr
            .parse()
            .unwrap_or_else(|e| panic!("invalid socket address `{addr}`: {e}"));
        Self { addr, script_name: String::new() }
    }

    /// Mounts the application below `script_name`, e.g. `/app/index.php`.
    /// Routes then match the part of the path after it, and
    /// [`RequestContext::path`] links back under it.
    pub fn script_name(mut self, script_name: &str) -> Self {
        self.script_name = script_name.to_owned();
        self
    }

    /// Serves `app` until SIGTERM or Ctrl-C, then drains in-flight
    /// connections.
    ///
    /// `app` receives a fresh router per request and returns it with its
    /// routes registered.
    pub async fn serve<A>(self, app: A) -> Result<(), Error>
    where
        A: Fn(Router) -> Router + Send + Sync + 'static,
    {
        self.serve_with_shutdown(app, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops when `signal` resolves.
    pub async fn serve_with_shutdown<A, S>(self, app: A, signal: S) -> Result<(), Error>
    where
        A: Fn(Router) -> Router + Send + Sync + 'static,
        S: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.addr).await?;

        // Only the route-definition function is shared between connections;
        // each request builds its own router from it.
        let app = Arc::new(app);
        let script_name: Arc<str> = Arc::from(self.script_name);

        info!(addr = %self.addr, script_name = &*script_name, "waypost listening");

        // Every spawned connection task, so shutdown can wait for them.
        let mut tasks = tokio::task::JoinSet::new();

        // `select!` polls the signal by reference on every iteration, which
        // needs it pinned in place.
        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Arms are checked top to bottom: once the signal fires no
                // queued connection is accepted.
                biased;

                () = &mut signal => {
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

                    let app = Arc::clone(&app);
                    let script_name = Arc::clone(&script_name);
                    // Adapts tokio's AsyncRead/AsyncWrite to hyper's IO traits.
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection, so every
                        // request gets a fresh router and controller cache.
                        let svc = service_fn(move |req| {
                            let res = dispatch(&*app, &script_name, req);
                            async move { Ok::<_, Infallible>(res) }
                        });

                        // HTTP/1.1 or HTTP/2, whichever the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connections so the set stays bounded.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Drain in-flight connections before returning.
        while tasks.join_next().await.is_some() {}

        info!("waypost stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one request and produces one response. Dispatch errors become a
/// bare `500`.
fn dispatch<A>(app: &A, script_name: &str, req: hyper::Request<Incoming>) -> http::Response<Full<Bytes>>
where
    A: Fn(Router) -> Router,
{
    let ctx = RequestContext::from_http(&req, script_name);
    let mut router = app(Router::init(ctx));

    match router.run() {
        Ok(handled) => {
            debug!(method = %req.method(), uri = %req.uri(), handled, "request dispatched");
            router.into_response().into_http()
        }
        Err(e) => {
            error!(method = %req.method(), uri = %req.uri(), "dispatch failed: {e}");
            let mut res = http::Response::new(Full::new(Bytes::new()));
            *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            res
        }
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or Ctrl-C. A signal that cannot be
/// installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
