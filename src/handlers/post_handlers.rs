//! Post endpoints, same shape as the user handlers.

use std::collections::HashMap;

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde_json::Value;

use crate::AppState;
use crate::contract::{self, OperationId};
use crate::dtos::{CreatePostRequest, UpdatePostRequest};
use crate::errors::ApiError;
use crate::repositories::PostFilter;

type ApiResult = Result<HttpResponse, ApiError>;

#[get("/posts")]
pub async fn get_posts(
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
) -> ApiResult {
    let op = contract::get(OperationId::GetPosts);
    let published = op.parse_query_bool("published", query.get("published").map(String::as_str))?;
    let posts = state
        .posts
        .find_many(PostFilter { published, author_id: None })
        .await?;
    Ok(HttpResponse::Ok().json(posts))
}

#[post("/posts")]
pub async fn create_post(state: web::Data<AppState>, body: web::Json<Value>) -> ApiResult {
    let op = contract::get(OperationId::CreatePost);
    let accepted = op.validate_body(&body)?;
    let req: CreatePostRequest = serde_json::from_value(accepted).map_err(anyhow::Error::from)?;
    let post = state.posts.create(req).await?;
    Ok(HttpResponse::Created().json(post))
}

#[get("/posts/{id}")]
pub async fn get_post_by_id(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    let op = contract::get(OperationId::GetPostById);
    let id = op.parse_path_uuid("id", &path)?;
    match state.posts.find_by_id(id).await? {
        Some(post) => Ok(HttpResponse::Ok().json(post)),
        None => Err(ApiError::NotFound { resource: "Post" }),
    }
}

#[put("/posts/{id}")]
pub async fn update_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> ApiResult {
    let op = contract::get(OperationId::UpdatePost);
    let id = op.parse_path_uuid("id", &path)?;
    let accepted = op.validate_body(&body)?;
    let req: UpdatePostRequest = serde_json::from_value(accepted).map_err(anyhow::Error::from)?;
    match state.posts.update(id, req).await? {
        Some(post) => Ok(HttpResponse::Ok().json(post)),
        None => Err(ApiError::NotFound { resource: "Post" }),
    }
}

#[delete("/posts/{id}")]
pub async fn delete_post(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    let op = contract::get(OperationId::DeletePost);
    let id = op.parse_path_uuid("id", &path)?;
    if state.posts.delete(id).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::NotFound { resource: "Post" })
    }
}
