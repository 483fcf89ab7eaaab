//! Runs a few in-memory requests through a bound route and prints what comes back.
//!
//! RUST_LOG=trace cargo run --example signup

use http::header::CONTENT_TYPE;
use http::StatusCode;
use micro_intake::handler::handler_fn;
use micro_intake::validate::{Checks, Validate, ValidationErrors};
use micro_intake::{
    context, BindError, BindTarget, Body, ErrorKind, Model, Registry, Request, RequestHandler, ResponseWriter, Route,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, Deserialize)]
struct Signup {
    name: String,
    email: String,
    age: u8,
}

impl Validate for Signup {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Checks::for_struct("Signup")
            .required("Name", self.name.as_str())
            .email("Email", &self.email)
            .gte("Age", self.age, 18)
            .finish()
    }
}

impl Model for Signup {}

fn signup(req: &mut Request, resp: &mut ResponseWriter) {
    if let Some(signup) = context::bound::<Signup>(req) {
        resp.text(StatusCode::CREATED, &format!("welcome {}", signup.name));
    }
}

fn report_invalid(req: &mut Request, resp: &mut ResponseWriter, err: &BindError) {
    context::abort(req);
    let problems = err.validation_errors().map(ValidationErrors::to_line).unwrap_or_default();
    resp.json(StatusCode::UNPROCESSABLE_ENTITY, &serde_json::json!({ "error": err.kind().message(), "fields": problems }));
}

fn request(content_type: &str, body: &'static str) -> Request {
    http::Request::post("/signup").header(CONTENT_TYPE, content_type).body(Body::from(body)).unwrap()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let registry = Arc::new(Registry::new());
    registry.errors().register(ErrorKind::BodyValidate, report_invalid);

    let handler = Route::new(Arc::clone(&registry)).bind(BindTarget::of::<Signup>()).handler(Arc::new(handler_fn(signup)));

    let requests = [
        request("application/json", r#"{"name":"tom","email":"tom@example.com","age":20}"#),
        request("application/x-www-form-urlencoded", "name=amy&email=amy&age=12"),
        request("application/json", r#"{"name":"#),
        request("text/csv", "name,email\n"),
    ];

    for mut req in requests {
        let mut resp = ResponseWriter::new();
        handler.invoke(&mut req, &mut resp).await;
        info!(status = %resp.status(), body = %String::from_utf8_lossy(resp.body()), "signup handled");
    }
}
