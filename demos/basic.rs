//! Minimal waypost example: middleware, token routes, a controller and a
//! custom not-found page.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/
//!   curl -i http://localhost:3000/users/42
//!   curl -i http://localhost:3000/users/alice       # 404, :number only
//!   curl -i http://localhost:3000/notes/first-note
//!   curl -i -X POST http://localhost:3000/notes/first-note
//!   curl -i http://localhost:3000/admin/panel       # redirected to /login

use waypost::{Bound, Call, Controller, Error, Method, Router, Server};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    Server::bind("0.0.0.0:3000")
        .serve(routes)
        .await
        .expect("server error");
}

fn routes(router: Router) -> Router {
    router
        .controller("Notes", Notes::default)
        .before(&[Method::Get, Method::Post], "/.*", stamp)
        .before(&[Method::Get], "/admin/.*", |call: &mut Call<'_>| {
            call.redirect("/login", true, true);
        })
        .get("", home)
        .get("/users/:number", get_user)
        .get_or_post("/notes/:alpha", Bound::new("Notes", "touch"))
        .get("/notes", Bound::new("Notes", "list"))
        .set_not_found(not_found)
}

// Runs for every GET/POST, before any route.
fn stamp(call: &mut Call<'_>) {
    call.response().set_header("x-powered-by", "waypost");
}

fn home(call: &mut Call<'_>) {
    let users = call.path("/users/1");
    call.write(format!("<a href=\"{users}\">first user</a>"));
}

fn get_user(call: &mut Call<'_>) {
    let id = call.arg(0).unwrap_or("unknown").to_owned();
    call.response().set_header("content-type", "application/json");
    call.write(format!(r#"{{"id":"{id}"}}"#));
}

fn not_found(call: &mut Call<'_>) {
    call.response().set_status(http::StatusCode::NOT_FOUND);
    call.write("nothing here");
}

// A controller lives as long as its router, which the server builds per
// request, so the count here only spans one request.
#[derive(Default)]
struct Notes {
    touched: Vec<String>,
}

impl Controller for Notes {
    fn responds_to(&self, action: &str) -> bool {
        matches!(action, "touch" | "list")
    }

    fn call(&mut self, action: &str, call: &mut Call<'_>) -> Result<(), Error> {
        match action {
            "touch" => {
                let slug = call.arg(0).unwrap_or_default().to_owned();
                call.write(format!("{} {slug}", call.request().raw_method()));
                self.touched.push(slug);
            }
            _ => {
                call.write(self.touched.join(","));
            }
        }
        Ok(())
    }
}
