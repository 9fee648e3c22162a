//! User endpoints. Each handler validates the raw request against its
//! contract registry entry before the store is ever touched.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde_json::Value;

use crate::AppState;
use crate::contract::{self, OperationId};
use crate::dtos::{CreateUserRequest, UpdateUserRequest};
use crate::errors::ApiError;
use crate::repositories::PostFilter;

type ApiResult = Result<HttpResponse, ApiError>;

#[get("/users")]
pub async fn get_users(state: web::Data<AppState>) -> ApiResult {
    let users = state.users.find_many().await?;
    Ok(HttpResponse::Ok().json(users))
}

#[post("/users")]
pub async fn create_user(state: web::Data<AppState>, body: web::Json<Value>) -> ApiResult {
    let op = contract::get(OperationId::CreateUser);
    let accepted = op.validate_body(&body)?;
    let req: CreateUserRequest = serde_json::from_value(accepted).map_err(anyhow::Error::from)?;
    let user = state.users.create(req).await?;
    Ok(HttpResponse::Created().json(user))
}

#[get("/users/{id}")]
pub async fn get_user_by_id(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    let op = contract::get(OperationId::GetUserById);
    let id = op.parse_path_uuid("id", &path)?;
    match state.users.find_by_id(id).await? {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Err(ApiError::NotFound { resource: "User" }),
    }
}

#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> ApiResult {
    let op = contract::get(OperationId::UpdateUser);
    let id = op.parse_path_uuid("id", &path)?;
    let accepted = op.validate_body(&body)?;
    let req: UpdateUserRequest = serde_json::from_value(accepted).map_err(anyhow::Error::from)?;
    match state.users.update(id, req).await? {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Err(ApiError::NotFound { resource: "User" }),
    }
}

#[delete("/users/{id}")]
pub async fn delete_user(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    let op = contract::get(OperationId::DeleteUser);
    let id = op.parse_path_uuid("id", &path)?;
    if state.users.delete(id).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::NotFound { resource: "User" })
    }
}

#[get("/users/{userId}/posts")]
pub async fn get_user_posts(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    let op = contract::get(OperationId::GetUserPosts);
    let user_id = op.parse_path_uuid("userId", &path)?;
    let posts = state
        .posts
        .find_many(PostFilter { author_id: Some(user_id), published: None })
        .await?;
    Ok(HttpResponse::Ok().json(posts))
}
