//! In-memory store: the demo fallback when no database is configured, and
//! the test double behind the HTTP surface.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{PostFilter, PostStore, UserStore};
use crate::dtos::{CreatePostRequest, CreateUserRequest, UpdatePostRequest, UpdateUserRequest};
use crate::models::{Post, User};

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    posts: RwLock<HashMap<Uuid, Post>>,
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_many(&self) -> Result<Vec<User>> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.get(&id).cloned())
    }

    async fn create(&self, req: CreateUserRequest) -> Result<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: req.email,
            name: req.name,
            created_at: now,
            updated_at: now,
        };
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, req: UpdateUserRequest) -> Result<Option<User>> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(email) = req.email {
            user.email = email;
        }
        if let Some(name) = req.name {
            user.name = name;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        if users.remove(&id).is_none() {
            return Ok(false);
        }
        let mut posts = self.posts.write().unwrap_or_else(PoisonError::into_inner);
        posts.retain(|_, post| post.author_id != id);
        Ok(true)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn find_many(&self, filter: PostFilter) -> Result<Vec<Post>> {
        let posts = self.posts.read().unwrap_or_else(PoisonError::into_inner);
        let mut matched: Vec<Post> = posts
            .values()
            .filter(|post| filter.published.is_none_or(|p| post.published == p))
            .filter(|post| filter.author_id.is_none_or(|a| post.author_id == a))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        let posts = self.posts.read().unwrap_or_else(PoisonError::into_inner);
        Ok(posts.get(&id).cloned())
    }

    async fn create(&self, req: CreatePostRequest) -> Result<Post> {
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            title: req.title,
            content: req.content,
            published: req.published.unwrap_or(false),
            author_id: req.author_id,
            created_at: now,
            updated_at: now,
        };
        let mut posts = self.posts.write().unwrap_or_else(PoisonError::into_inner);
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, id: Uuid, req: UpdatePostRequest) -> Result<Option<Post>> {
        let mut posts = self.posts.write().unwrap_or_else(PoisonError::into_inner);
        let Some(post) = posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = req.title {
            post.title = title;
        }
        if let Some(content) = req.content {
            post.content = content;
        }
        if let Some(published) = req.published {
            post.published = published;
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut posts = self.posts.write().unwrap_or_else(PoisonError::into_inner);
        Ok(posts.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_user_req() -> CreateUserRequest {
        CreateUserRequest {
            email: "ada@example.com".to_string(),
            name: "Ada Lovelace".to_string(),
        }
    }

    #[tokio::test]
    async fn update_merges_only_supplied_fields() {
        let store = MemoryStore::default();
        let user = UserStore::create(&store, create_user_req()).await.unwrap();

        let updated = UserStore::update(
            &store,
            user.id,
            UpdateUserRequest {
                name: Some("Ada King".to_string()),
                ..UpdateUserRequest::default()
            },
        )
        .await
        .unwrap()
        .expect("user exists");

        assert_eq!(updated.name, "Ada King");
        assert_eq!(updated.email, user.email);
        assert_eq!(updated.created_at, user.created_at);
    }

    #[tokio::test]
    async fn deleting_a_user_removes_their_posts() {
        let store = MemoryStore::default();
        let user = UserStore::create(&store, create_user_req()).await.unwrap();
        for title in ["one", "two"] {
            PostStore::create(
                &store,
                CreatePostRequest {
                    title: title.to_string(),
                    content: String::new(),
                    published: None,
                    author_id: user.id,
                },
            )
            .await
            .unwrap();
        }

        assert!(UserStore::delete(&store, user.id).await.unwrap());
        let remaining = PostStore::find_many(&store, PostFilter::default())
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn find_many_orders_newest_first_and_filters() {
        let store = MemoryStore::default();
        let user = UserStore::create(&store, create_user_req()).await.unwrap();
        for (title, published) in [("a", false), ("b", true), ("c", true)] {
            PostStore::create(
                &store,
                CreatePostRequest {
                    title: title.to_string(),
                    content: String::new(),
                    published: Some(published),
                    author_id: user.id,
                },
            )
            .await
            .unwrap();
        }

        let all = PostStore::find_many(&store, PostFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));

        let published = PostStore::find_many(
            &store,
            PostFilter { published: Some(true), author_id: None },
        )
        .await
        .unwrap();
        assert_eq!(published.len(), 2);
        assert!(published.iter().all(|post| post.published));
    }
}
