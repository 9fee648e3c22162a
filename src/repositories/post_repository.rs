use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use uuid::Uuid;

use super::{PostFilter, PostStore};
use crate::dtos::{CreatePostRequest, UpdatePostRequest};
use crate::models::Post;

pub struct PgPostStore {
    pool: Pool,
}

impl PgPostStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn row_to_post(row: &Row) -> Post {
    Post {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        published: row.get("published"),
        author_id: row.get("author_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn find_many(&self, filter: PostFilter) -> Result<Vec<Post>> {
        let client = self.pool.get().await.context("failed to get pg client")?;
        let mut sql = String::from(
            "SELECT id, title, content, published, author_id, created_at, updated_at FROM posts",
        );
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();
        let mut conditions: Vec<String> = Vec::new();
        if let Some(published) = filter.published.as_ref() {
            params.push(published);
            conditions.push(format!("published = ${}", params.len()));
        }
        if let Some(author_id) = filter.author_id.as_ref() {
            params.push(author_id);
            conditions.push(format!("author_id = ${}", params.len()));
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC");

        let rows = client
            .query(sql.as_str(), &params)
            .await
            .context("failed to list posts")?;
        Ok(rows.iter().map(row_to_post).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        let client = self.pool.get().await.context("failed to get pg client")?;
        let row = client
            .query_opt(
                "SELECT id, title, content, published, author_id, created_at, updated_at \
                 FROM posts WHERE id = $1",
                &[&id],
            )
            .await
            .context("failed to fetch post")?;
        Ok(row.as_ref().map(row_to_post))
    }

    async fn create(&self, req: CreatePostRequest) -> Result<Post> {
        let client = self.pool.get().await.context("failed to get pg client")?;
        let now = Utc::now();
        let published = req.published.unwrap_or(false);
        let row = client
            .query_one(
                "INSERT INTO posts (id, title, content, published, author_id, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) \
                 RETURNING id, title, content, published, author_id, created_at, updated_at",
                &[
                    &Uuid::new_v4(),
                    &req.title,
                    &req.content,
                    &published,
                    &req.author_id,
                    &now,
                    &now,
                ],
            )
            .await
            .context("failed to create post")?;
        Ok(row_to_post(&row))
    }

    async fn update(&self, id: Uuid, req: UpdatePostRequest) -> Result<Option<Post>> {
        let client = self.pool.get().await.context("failed to get pg client")?;
        let row = client
            .query_opt(
                "UPDATE posts SET \
                   title = COALESCE($2, title), \
                   content = COALESCE($3, content), \
                   published = COALESCE($4, published), \
                   updated_at = $5 \
                 WHERE id = $1 \
                 RETURNING id, title, content, published, author_id, created_at, updated_at",
                &[&id, &req.title, &req.content, &req.published, &Utc::now()],
            )
            .await
            .context("failed to update post")?;
        Ok(row.as_ref().map(row_to_post))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let client = self.pool.get().await.context("failed to get pg client")?;
        let deleted = client
            .execute("DELETE FROM posts WHERE id = $1", &[&id])
            .await
            .context("failed to delete post")?;
        Ok(deleted > 0)
    }
}
