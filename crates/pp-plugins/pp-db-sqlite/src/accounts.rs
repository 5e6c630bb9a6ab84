use async_trait::async_trait;
use chrono::Utc;
use pp_core::{Account, AccountRepo, HandleClaim, Post, PostRepo};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::SqliteStore;

fn account_from_row(row: &SqliteRow) -> sqlx::Result<Account> {
    Ok(Account {
        id: row.try_get("id")?,
        handle: row.try_get("handle")?,
        push_token: row.try_get("push_token")?,
        push_token_updated_at: row.try_get("push_token_updated_at")?,
        created_at: row.try_get("created_at")?,
    })
}

fn post_from_row(row: &SqliteRow) -> sqlx::Result<Post> {
    Ok(Post {
        id: row.try_get("id")?,
        owner_account_id: row.try_get("owner_account_id")?,
        media_url: row.try_get("media_url")?,
        owner_handle: row.try_get("owner_handle")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl AccountRepo for SqliteStore {
    async fn create_account(&self, account: Account) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO accounts (id, handle, push_token, push_token_updated_at, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(account.id)
            .bind(account.handle)
            .bind(account.push_token)
            .bind(account.push_token_updated_at)
            .bind(account.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_account(&self, id: &str) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query("SELECT id, handle, push_token, push_token_updated_at, created_at FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(account_from_row).transpose()?)
    }

    /// Reservation and assignment in one transaction.
    ///
    /// # Developer Note
    /// The reservation insert runs first so the transaction takes SQLite's
    /// write lock before reading anything. The reservation's primary key then
    /// arbitrates concurrent claims: the loser's insert fails with a unique
    /// violation and its transaction rolls back on drop. A violation on the
    /// caller's own reservation is a re-claim, not a conflict.
    async fn claim_handle(&self, account_id: &str, handle: &str) -> anyhow::Result<HandleClaim> {
        let mut tx = self.pool.begin().await?;

        // 1. Reserve the lowercased key
        let reserved = sqlx::query("INSERT INTO handle_reservations (handle_key, account_id, created_at) VALUES (?, ?, ?)")
            .bind(handle.to_lowercase())
            .bind(account_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await;
        match reserved {
            Ok(_) => {}
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                let holder: Option<String> =
                    sqlx::query_scalar("SELECT account_id FROM handle_reservations WHERE handle_key = ?")
                        .bind(handle.to_lowercase())
                        .fetch_optional(&mut *tx)
                        .await?;
                return Ok(match holder {
                    Some(holder) if holder == account_id => HandleClaim::AlreadySet,
                    _ => HandleClaim::Taken,
                });
            }
            Err(err) => return Err(err.into()),
        }

        // 2. Assign the display handle, only once
        let updated = sqlx::query("UPDATE accounts SET handle = ? WHERE id = ? AND handle IS NULL")
            .bind(handle)
            .bind(account_id)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM accounts WHERE id = ?")
                .bind(account_id)
                .fetch_optional(&mut *tx)
                .await?;
            return Ok(match exists {
                Some(_) => HandleClaim::AlreadySet,
                None => HandleClaim::UnknownAccount,
            });
        }

        tx.commit().await?;
        Ok(HandleClaim::Claimed)
    }

    async fn set_push_token(&self, account_id: &str, token: Option<String>) -> anyhow::Result<bool> {
        let updated_at = token.as_ref().map(|_| Utc::now());
        let result = sqlx::query("UPDATE accounts SET push_token = ?, push_token_updated_at = ? WHERE id = ?")
            .bind(token)
            .bind(updated_at)
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl PostRepo for SqliteStore {
    async fn create_post(&self, post: Post) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO posts (id, owner_account_id, media_url, owner_handle, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(post.id)
            .bind(post.owner_account_id)
            .bind(post.media_url)
            .bind(post.owner_handle)
            .bind(post.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_post(&self, id: &str) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query("SELECT id, owner_account_id, media_url, owner_handle, created_at FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(post_from_row).transpose()?)
    }
}
