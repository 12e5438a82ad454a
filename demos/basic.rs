//! Minimal apier example: a small user API with a protected endpoint.
//!
//! Run with:
//!   APIER_ACCESS_TOKENS='s3cret=alice:admin' RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users \
//!        -H 'authorization: Bearer s3cret' \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!   curl -X DELETE http://localhost:3000/users/42 -H 'authorization: Bearer s3cret'
//!   curl -X OPTIONS -i http://localhost:3000/whatever

use apier::{App, Config, Context, Endpoint, Method, Router, Server, Status};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), apier::Error> {
    apier::logging::init();
    let config = Config::from_env()?;

    let router = Router::new()
        .endpoint([Method::Get], "/users/:id", get_user)?
        .register(Endpoint::new([Method::Post], "/users", create_user).permissions(["admin"]))?
        .register(Endpoint::new([Method::Delete], "/users/:id", delete_user).permissions(["admin"]))?;

    let app = App::builder(config.clone()).router(router).build().await?;
    Server::from_config(&config).serve(app).await
}

// GET /users/:id
async fn get_user(ctx: Context) {
    let id = ctx.param("id").unwrap_or("unknown").to_owned();
    ctx.send(json!({ "id": id, "name": "alice" }));
}

// POST /users: body fields arrive in ctx.req().data()
async fn create_user(ctx: Context) {
    let Some(name) = ctx.req().data().get("name").and_then(|v| v.as_str()).map(str::to_owned) else {
        ctx.set_status_code(Status::BadRequest);
        ctx.send(json!({ "reason": "name is required" }));
        return;
    };

    ctx.set_status_code(Status::Created);
    ctx.send(json!({ "id": 99, "name": name }));
}

// DELETE /users/:id → 204 No Content
async fn delete_user(ctx: Context) {
    ctx.set_status_code(Status::NoContent);
}
