//! Persistence collaborators. The handlers only see the two store traits;
//! Postgres and in-memory implementations are interchangeable behind them.

pub mod memory;
pub mod post_repository;
pub mod user_repository;

pub use memory::MemoryStore;
pub use post_repository::PgPostStore;
pub use user_repository::PgUserStore;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::dtos::{CreatePostRequest, CreateUserRequest, UpdatePostRequest, UpdateUserRequest};
use crate::models::{Post, User};

/// Filter for [`PostStore::find_many`]. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub published: Option<bool>,
    pub author_id: Option<Uuid>,
}

/// Persistence contract for users. `find_many` results are ordered by
/// `created_at` descending. `delete` owns the cascade: the user's posts go
/// with the user.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_many(&self) -> Result<Vec<User>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn create(&self, req: CreateUserRequest) -> Result<User>;
    /// Merges only the supplied fields; `None` leaves a field as it was.
    /// Returns `None` when no record matches.
    async fn update(&self, id: Uuid, req: UpdateUserRequest) -> Result<Option<User>>;
    /// Returns false when no record matched.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// Persistence contract for posts, same conventions as [`UserStore`].
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn find_many(&self, filter: PostFilter) -> Result<Vec<Post>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>>;
    async fn create(&self, req: CreatePostRequest) -> Result<Post>;
    async fn update(&self, id: Uuid, req: UpdatePostRequest) -> Result<Option<Post>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
}
