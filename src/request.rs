//! Per-dispatch request context.

use crate::method::Method;

/// What the router knows about the request it is dispatching.
///
/// Derived once from the host's method, request URI and script name, then
/// read-only. The dispatch path ([`path_info`](Self::path_info)) is the URI
/// with the script prefix and the query string removed, always starting with
/// exactly one `/`.
///
/// ```rust
/// use waypost::RequestContext;
///
/// // no URL rewriting: the script name is part of the URI
/// let ctx = RequestContext::new("GET", "/app/index.php/users/7?page=2", "/app/index.php");
/// assert_eq!(ctx.path_info(), "/users/7");
/// assert_eq!(ctx.script_name(), "/app/index.php");
///
/// // URL rewriting: the script directory stands in for the script name
/// let ctx = RequestContext::new("GET", "/app/users/7", "/app/index.php");
/// assert_eq!(ctx.path_info(), "/users/7");
/// assert_eq!(ctx.script_name(), "/app");
/// ```
#[derive(Clone, Debug)]
pub struct RequestContext {
    method: Option<Method>,
    raw_method: String,
    script_name: String,
    script_dir: String,
    path_info: String,
}

impl RequestContext {
    pub fn new(method: &str, request_uri: &str, script_name: &str) -> Self {
        let script_dir = dirname(script_name);
        let script_name = if request_uri.starts_with(script_name) {
            script_name.to_owned()
        } else {
            script_dir.clone()
        };

        let path = request_uri.strip_prefix(script_name.as_str()).unwrap_or(request_uri);
        let path = path.split_once('?').map_or(path, |(path, _query)| path);
        let path_info = format!("/{}", path.trim_start_matches('/'));

        Self {
            method: method.parse().ok(),
            raw_method: method.to_owned(),
            script_name,
            script_dir,
            path_info,
        }
    }

    /// Builds the context from an `http` request mounted below `script_name`
    /// (`""` when the application owns the whole URI space).
    pub fn from_http<B>(req: &http::Request<B>, script_name: &str) -> Self {
        let uri = req.uri().path_and_query().map_or("/", |pq| pq.as_str());
        Self::new(req.method().as_str(), uri, script_name)
    }

    /// The request method, or `None` when it is not one the router knows.
    pub fn method(&self) -> Option<Method> { self.method }

    /// The request method exactly as the host reported it.
    pub fn raw_method(&self) -> &str { &self.raw_method }

    /// The path routes are matched against.
    pub fn path_info(&self) -> &str { &self.path_info }

    /// The script URL path, or the script directory under URL rewriting.
    pub fn script_name(&self) -> &str { &self.script_name }

    /// The script directory URL path, without a trailing `/`.
    pub fn script_dir(&self) -> &str { &self.script_dir }

    /// `uri` appended to the script path: `/login` → `/app/index.php/login`.
    pub fn path(&self, uri: &str) -> String {
        format!("{}/{}", self.script_name, uri.trim_start_matches('/'))
    }

    /// `uri` appended to the script directory: `/img/logo.png` → `/app/img/logo.png`.
    pub fn asset(&self, uri: &str) -> String {
        format!("{}/{}", self.script_dir, uri.trim_start_matches('/'))
    }
}

fn dirname(script_name: &str) -> String {
    let name = script_name.replace('\\', "/");
    let name = name.trim_end_matches('/');
    match name.rfind('/') {
        Some(i) => name[..i].trim_end_matches('/').to_owned(),
        None    => String::new(),
    }
}
