use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;

use super::UserStore;
use crate::dtos::{CreateUserRequest, UpdateUserRequest};
use crate::models::User;

pub struct PgUserStore {
    pool: Pool,
}

impl PgUserStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &Row) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_many(&self) -> Result<Vec<User>> {
        let client = self.pool.get().await.context("failed to get pg client")?;
        let rows = client
            .query(
                "SELECT id, email, name, created_at, updated_at \
                 FROM users ORDER BY created_at DESC",
                &[],
            )
            .await
            .context("failed to list users")?;
        Ok(rows.iter().map(row_to_user).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let client = self.pool.get().await.context("failed to get pg client")?;
        let row = client
            .query_opt(
                "SELECT id, email, name, created_at, updated_at FROM users WHERE id = $1",
                &[&id],
            )
            .await
            .context("failed to fetch user")?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn create(&self, req: CreateUserRequest) -> Result<User> {
        let client = self.pool.get().await.context("failed to get pg client")?;
        let now = Utc::now();
        let row = client
            .query_one(
                "INSERT INTO users (id, email, name, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING id, email, name, created_at, updated_at",
                &[&Uuid::new_v4(), &req.email, &req.name, &now, &now],
            )
            .await
            .context("failed to create user")?;
        Ok(row_to_user(&row))
    }

    async fn update(&self, id: Uuid, req: UpdateUserRequest) -> Result<Option<User>> {
        let client = self.pool.get().await.context("failed to get pg client")?;
        let row = client
            .query_opt(
                "UPDATE users SET \
                   email = COALESCE($2, email), \
                   name = COALESCE($3, name), \
                   updated_at = $4 \
                 WHERE id = $1 \
                 RETURNING id, email, name, created_at, updated_at",
                &[&id, &req.email, &req.name, &Utc::now()],
            )
            .await
            .context("failed to update user")?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut client = self.pool.get().await.context("failed to get pg client")?;
        // A user's posts go with the user, atomically.
        let tx = client
            .transaction()
            .await
            .context("failed to open transaction")?;
        tx.execute("DELETE FROM posts WHERE author_id = $1", &[&id])
            .await
            .context("failed to delete user's posts")?;
        let deleted = tx
            .execute("DELETE FROM users WHERE id = $1", &[&id])
            .await
            .context("failed to delete user")?;
        tx.commit().await.context("failed to commit user delete")?;
        Ok(deleted > 0)
    }
}
