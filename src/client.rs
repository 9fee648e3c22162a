//! Typed client over the same contract registry the server validates with.
//!
//! Every call builds its request from the operation's registry entry (method,
//! path template, query rules) and decodes the response according to the
//! schema declared for the received status code. Declared 4xx responses come
//! back as [`ClientError::Api`] values, never panics.

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use crate::contract::{self, HttpMethod, OperationId, OperationSpec};
use crate::dtos::{CreatePostRequest, CreateUserRequest, UpdatePostRequest, UpdateUserRequest};
use crate::errors::ErrorResponse;
use crate::models::{Post, User};

/// How a call can fail.
#[derive(Debug, Error)]
pub enum ClientError {
    /// An error response the registry declares for this operation.
    #[error("api error {status}: {}", .error.message)]
    Api { status: u16, error: ErrorResponse },
    /// A status the registry declares nothing about; carries the raw body.
    #[error("unexpected status {status}")]
    Unexpected { status: u16, body: String },
    /// Network-level failure before a body could be read.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    /// Success body that does not match the declared response schema.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Uses a preconfigured reqwest client (timeouts, proxies, ...).
    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        op: &OperationSpec,
        path_params: &[(&str, String)],
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<(u16, Vec<u8>), ClientError> {
        let url = format!("{}{}", self.base_url, op.render_path(path_params));
        let mut request = self.http.request(reqwest_method(op.method), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        Ok((status, bytes.to_vec()))
    }

    pub async fn get_users(&self) -> Result<Vec<User>, ClientError> {
        let op = contract::get(OperationId::GetUsers);
        let (status, body) = self.send(op, &[], &[], None::<&()>).await?;
        decode(op, status, &body)
    }

    pub async fn create_user(&self, req: &CreateUserRequest) -> Result<User, ClientError> {
        let op = contract::get(OperationId::CreateUser);
        let (status, body) = self.send(op, &[], &[], Some(req)).await?;
        decode(op, status, &body)
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Result<User, ClientError> {
        let op = contract::get(OperationId::GetUserById);
        let (status, body) = self
            .send(op, &[("id", id.to_string())], &[], None::<&()>)
            .await?;
        decode(op, status, &body)
    }

    pub async fn update_user(
        &self,
        id: Uuid,
        req: &UpdateUserRequest,
    ) -> Result<User, ClientError> {
        let op = contract::get(OperationId::UpdateUser);
        let (status, body) = self
            .send(op, &[("id", id.to_string())], &[], Some(req))
            .await?;
        decode(op, status, &body)
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<(), ClientError> {
        let op = contract::get(OperationId::DeleteUser);
        let (status, body) = self
            .send(op, &[("id", id.to_string())], &[], None::<&()>)
            .await?;
        decode_empty(op, status, &body)
    }

    pub async fn get_user_posts(&self, user_id: Uuid) -> Result<Vec<Post>, ClientError> {
        let op = contract::get(OperationId::GetUserPosts);
        let (status, body) = self
            .send(op, &[("userId", user_id.to_string())], &[], None::<&()>)
            .await?;
        decode(op, status, &body)
    }

    pub async fn get_posts(&self, published: Option<bool>) -> Result<Vec<Post>, ClientError> {
        let op = contract::get(OperationId::GetPosts);
        let query: &[(&str, &str)] = match published {
            Some(true) => &[("published", "true")],
            Some(false) => &[("published", "false")],
            None => &[],
        };
        let (status, body) = self.send(op, &[], query, None::<&()>).await?;
        decode(op, status, &body)
    }

    pub async fn create_post(&self, req: &CreatePostRequest) -> Result<Post, ClientError> {
        let op = contract::get(OperationId::CreatePost);
        let (status, body) = self.send(op, &[], &[], Some(req)).await?;
        decode(op, status, &body)
    }

    pub async fn get_post_by_id(&self, id: Uuid) -> Result<Post, ClientError> {
        let op = contract::get(OperationId::GetPostById);
        let (status, body) = self
            .send(op, &[("id", id.to_string())], &[], None::<&()>)
            .await?;
        decode(op, status, &body)
    }

    pub async fn update_post(
        &self,
        id: Uuid,
        req: &UpdatePostRequest,
    ) -> Result<Post, ClientError> {
        let op = contract::get(OperationId::UpdatePost);
        let (status, body) = self
            .send(op, &[("id", id.to_string())], &[], Some(req))
            .await?;
        decode(op, status, &body)
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<(), ClientError> {
        let op = contract::get(OperationId::DeletePost);
        let (status, body) = self
            .send(op, &[("id", id.to_string())], &[], None::<&()>)
            .await?;
        decode_empty(op, status, &body)
    }
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

/// Decodes a response according to the status codes declared for `op`.
fn decode<T: DeserializeOwned>(
    op: &OperationSpec,
    status: u16,
    body: &[u8],
) -> Result<T, ClientError> {
    if status == op.success {
        return Ok(serde_json::from_slice(body)?);
    }
    Err(classify_error(op, status, body))
}

/// Variant for operations whose success response has no body.
fn decode_empty(op: &OperationSpec, status: u16, body: &[u8]) -> Result<(), ClientError> {
    if status == op.success {
        return Ok(());
    }
    Err(classify_error(op, status, body))
}

fn classify_error(op: &OperationSpec, status: u16, body: &[u8]) -> ClientError {
    if op.errors.iter().any(|declared| declared.status == status) {
        // Declared status: the body is expected to be an ErrorResponse. If it
        // is not, fall through to the unclassified case with the raw body.
        if let Ok(error) = serde_json::from_slice::<ErrorResponse>(body) {
            return ClientError::Api { status, error };
        }
    }
    ClientError::Unexpected {
        status,
        body: String::from_utf8_lossy(body).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_status_decodes_the_typed_payload() {
        let op = contract::get(OperationId::GetUserById);
        let body = serde_json::json!({
            "id": Uuid::new_v4().to_string(),
            "email": "ada@example.com",
            "name": "Ada Lovelace",
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z"
        });
        let user: User = decode(op, 200, body.to_string().as_bytes()).expect("decodes");
        assert_eq!(user.name, "Ada Lovelace");
    }

    #[test]
    fn declared_error_status_becomes_a_typed_api_error() {
        let op = contract::get(OperationId::GetUserById);
        let body = br#"{"message":"User not found","code":"not_found"}"#;
        let err = decode::<User>(op, 404, body).unwrap_err();
        match err {
            ClientError::Api { status, error } => {
                assert_eq!(status, 404);
                assert_eq!(error.message, "User not found");
                assert_eq!(error.code.as_deref(), Some("not_found"));
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn undeclared_status_is_unclassified_with_the_raw_body() {
        let op = contract::get(OperationId::GetUserById);
        let err = decode::<User>(op, 418, b"teapot").unwrap_err();
        match err {
            ClientError::Unexpected { status, body } => {
                assert_eq!(status, 418);
                assert_eq!(body, "teapot");
            }
            other => panic!("expected Unexpected, got {other:?}"),
        }
    }

    #[test]
    fn declared_status_with_a_malformed_body_is_unclassified() {
        let op = contract::get(OperationId::GetUserById);
        let err = decode::<User>(op, 404, b"<html>gateway</html>").unwrap_err();
        assert!(matches!(err, ClientError::Unexpected { status: 404, .. }));
    }

    #[test]
    fn malformed_success_body_is_a_decode_error() {
        let op = contract::get(OperationId::GetUsers);
        let err = decode::<Vec<User>>(op, 200, b"{not json").unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn empty_success_decodes_for_delete_operations() {
        let op = contract::get(OperationId::DeleteUser);
        assert!(decode_empty(op, 204, b"").is_ok());
        let err = decode_empty(op, 404, br#"{"message":"User not found"}"#).unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 404, .. }));
    }
}
