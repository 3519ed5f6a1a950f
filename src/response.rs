//! The response boundary handlers write to.
//!
//! A [`Response`] starts as an empty `200 OK`. Handlers set headers, append to
//! the body and, through a redirect, may halt the dispatch. The host turns the
//! finished value into a wire response with [`Response::into_http`].

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;

/// An outgoing HTTP response under construction.
#[derive(Debug)]
pub struct Response {
    pub(crate) status: StatusCode,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
    pub(crate) halted: bool,
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: Vec::new(),
            body: Vec::new(),
            halted: false,
        }
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets a header, replacing any earlier value under the same name.
    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Appends to the body.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) -> &mut Self {
        self.body.extend_from_slice(chunk.as_ref());
        self
    }

    /// Emits `Location: uri` with `302 Found`; `halt` also stops the dispatch
    /// once the running handler returns.
    ///
    /// A status already set to `201` or any `3xx` is kept, so a handler can
    /// pick `301` before redirecting.
    pub fn redirect(&mut self, uri: &str, halt: bool) -> &mut Self {
        if !(self.status.is_redirection() || self.status == StatusCode::CREATED) {
            self.status = StatusCode::FOUND;
        }
        self.set_header("location", uri);
        if halt {
            self.halted = true;
        }
        self
    }

    /// Stops the dispatch: no further handler of any phase runs.
    pub fn halt(&mut self) -> &mut Self {
        self.halted = true;
        self
    }

    pub fn is_halted(&self) -> bool { self.halted }

    /// Converts into an `http` response. A non-empty body without a
    /// `content-type` header is sent as `text/html; charset=utf-8`.
    pub fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(self.status);
        if !self.body.is_empty() && self.header("content-type").is_none() {
            builder = builder.header("content-type", "text/html; charset=utf-8");
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        match builder.body(Full::new(Bytes::from(self.body))) {
            Ok(res) => res,
            Err(_)  => {
                let mut res = http::Response::new(Full::new(Bytes::new()));
                *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                res
            }
        }
    }
}

impl Default for Response {
    fn default() -> Self { Self::new() }
}
