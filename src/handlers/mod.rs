pub mod post_handlers;
pub mod user_handlers;

use actix_web::{HttpResponse, get, web};
use serde_json::json;

use crate::contract;

/// Registers every routed handler; `main` and the tests share this.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(user_handlers::get_users)
        .service(user_handlers::create_user)
        .service(user_handlers::get_user_by_id)
        .service(user_handlers::update_user)
        .service(user_handlers::delete_user)
        .service(user_handlers::get_user_posts)
        .service(post_handlers::get_posts)
        .service(post_handlers::create_post)
        .service(post_handlers::get_post_by_id)
        .service(post_handlers::update_post)
        .service(post_handlers::delete_post)
        .service(health)
        .service(openapi_document);
}

/// Liveness probe.
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// The contract registry rendered as an OpenAPI document, for external
/// tooling and client regeneration.
#[get("/openapi.json")]
pub async fn openapi_document() -> HttpResponse {
    HttpResponse::Ok().json(&*contract::DOCUMENT)
}
