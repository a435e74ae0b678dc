//! Minimal astor-bind demo: wrapped actions behind a tiny matchit route table.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl 'http://localhost:3000/users/42?verbose=yes'
//!   curl 'http://localhost:3000/search?q=rust&tags=a,b&min=2&max=10'
//!   curl -X POST http://localhost:3000/users -d 'name=alice&age=31'
//!   curl http://localhost:3000/healthz

use std::convert::Infallible;
use std::sync::Arc;

use astor_bind::response::{Error, Json};
use astor_bind::{Binder, HandlerService, PathParams, Request, bindable, service, wrap};
use hyper::service::{Service, service_fn};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{error, info};

bindable! {
    struct Range {
        #[bind("min")]
        min: u32,
        #[bind("max")]
        max: Option<u32>,
    }
}

#[derive(Serialize)]
struct User {
    id: u64,
    name: String,
    age: Option<u8>,
}

// GET /users/{id}
async fn get_user(id: u64, verbose: bool) -> Result<Json<User>, Error> {
    if id == 0 {
        return Err(Error::not_found("no such user"));
    }
    let age = verbose.then_some(31);
    Ok(Json::new(User { id, name: "alice".into(), age }))
}

// POST /users (form body)
async fn create_user(name: String, age: Option<u8>) -> Result<Json<User>, Error> {
    if name.is_empty() {
        return Err(Error::bad_request("name is required"));
    }
    Ok(Json::new(User { id: 99, name, age }))
}

// GET /search. `range` is unnamed and binds from every parameter.
async fn search(q: String, tags: Vec<String>, range: Range) -> Json<serde_json::Value> {
    Json::new(serde_json::json!({
        "q": q,
        "tags": tags,
        "min": range.min,
        "max": range.max,
    }))
}

async fn liveness(_req: Request) -> &'static str {
    "ok"
}

struct Routes {
    get: matchit::Router<HandlerService>,
    post: matchit::Router<HandlerService>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    // Custom converters would be registered here, before the binder is shared.
    let binder = Arc::new(Binder::new());

    let mut routes = Routes { get: matchit::Router::new(), post: matchit::Router::new() };
    routes.get.insert("/users/{id}", service(wrap(&binder, get_user, ["id", "verbose"])?))?;
    routes.get.insert("/search", service(wrap(&binder, search, ["q", "tags"])?))?;
    routes.get.insert("/healthz", service(liveness))?;
    routes.post.insert("/users", service(wrap(&binder, create_user, ["name", "age"])?))?;
    let routes = Arc::new(routes);

    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    info!(addr = "0.0.0.0:3000", "demo listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        let routes = Arc::clone(&routes);
        tokio::spawn(async move {
            let svc = service_fn(move |mut req: http::Request<hyper::body::Incoming>| {
                let routes = Arc::clone(&routes);
                async move {
                    let table = match *req.method() {
                        http::Method::POST => &routes.post,
                        _ => &routes.get,
                    };
                    let Ok(matched) = table.at(req.uri().path()) else {
                        return Ok::<_, Infallible>(
                            astor_bind::Response::status(http::StatusCode::NOT_FOUND).into_inner(),
                        );
                    };
                    let params: PathParams = matched.params.iter().collect();
                    let handler = matched.value.clone();
                    req.extensions_mut().insert(params);
                    handler.call(req).await
                }
            });

            if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                .serve_connection(TokioIo::new(stream), svc)
                .await
            {
                error!(peer = %peer, "connection error: {e}");
            }
        });
    }
}
