//! Comment and reaction persistence. The reaction uniqueness key
//! (target_kind, target_id, ip_address, reaction_kind) is a unique
//! index; a violated insert surfaces as `AppError::Conflict` and the
//! engine above decides how to resolve it.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use vk_core::error::{AppError, Result};
use vk_core::models::{Comment, NewComment, NewReaction, Reaction};
use vk_core::target::{ContentKind, ReactionKind, Target};
use vk_core::traits::EngagementRepo;

use crate::{db_err, SqliteStore};

fn target_from(row: &SqliteRow) -> Result<Target> {
    let token: String = row.get("target_kind");
    let kind = ContentKind::from_token(&token)
        .ok_or_else(|| AppError::Storage(format!("unknown target kind {token:?} in stored row")))?;
    Ok(Target::new(kind, row.get("target_id")))
}

fn comment_from(row: &SqliteRow) -> Result<Comment> {
    Ok(Comment {
        id: row.get("id"),
        target: target_from(row)?,
        username: row.get("username"),
        body: row.get("body"),
        email: row.get("email"),
        is_approved: row.get("is_approved"),
        is_featured: row.get("is_featured"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        ip_address: row.get("ip_address"),
    })
}

fn reaction_from(row: &SqliteRow) -> Result<Reaction> {
    let token: String = row.get("reaction_kind");
    let kind = ReactionKind::from_token(&token)
        .ok_or_else(|| AppError::Storage(format!("unknown reaction kind {token:?} in stored row")))?;
    Ok(Reaction {
        id: row.get("id"),
        target: target_from(row)?,
        kind,
        username: row.get("username"),
        ip_address: row.get("ip_address"),
        user_agent: row.get("user_agent"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl EngagementRepo for SqliteStore {
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment> {
        let result = sqlx::query(
            "INSERT INTO comments \
             (target_kind, target_id, username, body, email, is_approved, is_featured, created_at, updated_at, ip_address) \
             VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?)",
        )
        .bind(comment.target.kind.as_token())
        .bind(comment.target.id)
        .bind(&comment.username)
        .bind(&comment.body)
        .bind(&comment.email)
        .bind(comment.is_approved)
        .bind(comment.created_at)
        .bind(comment.created_at)
        .bind(&comment.ip_address)
        .execute(self.pool())
        .await
        .map_err(db_err)?;

        Ok(Comment {
            id: result.last_insert_rowid(),
            target: comment.target,
            username: comment.username,
            body: comment.body,
            email: comment.email,
            is_approved: comment.is_approved,
            is_featured: false,
            created_at: comment.created_at,
            updated_at: comment.created_at,
            ip_address: comment.ip_address,
        })
    }

    async fn comment(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(db_err)?;
        row.map(|row| comment_from(&row)).transpose()
    }

    async fn approved_comments(&self, target: Target) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT * FROM comments \
             WHERE target_kind = ? AND target_id = ? AND is_approved = 1 \
             ORDER BY created_at DESC",
        )
        .bind(target.kind.as_token())
        .bind(target.id)
        .fetch_all(self.pool())
        .await
        .map_err(db_err)?;
        rows.iter().map(comment_from).collect()
    }

    async fn count_approved_comments(&self, target: Target) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) FROM comments \
             WHERE target_kind = ? AND target_id = ? AND is_approved = 1",
        )
        .bind(target.kind.as_token())
        .bind(target.id)
        .fetch_one(self.pool())
        .await
        .map_err(db_err)?;
        Ok(row.get::<i64, _>(0))
    }

    async fn set_comment_approved(&self, id: i64, approved: bool) -> Result<()> {
        let result = sqlx::query("UPDATE comments SET is_approved = ?, updated_at = ? WHERE id = ?")
            .bind(approved)
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Comment".to_string(), id));
        }
        Ok(())
    }

    async fn set_comment_featured(&self, id: i64, featured: bool) -> Result<()> {
        let result = sqlx::query("UPDATE comments SET is_featured = ?, updated_at = ? WHERE id = ?")
            .bind(featured)
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Comment".to_string(), id));
        }
        Ok(())
    }

    async fn find_reaction(
        &self,
        target: Target,
        ip: &str,
        kind: ReactionKind,
    ) -> Result<Option<Reaction>> {
        let row = sqlx::query(
            "SELECT * FROM reactions \
             WHERE target_kind = ? AND target_id = ? AND ip_address = ? AND reaction_kind = ?",
        )
        .bind(target.kind.as_token())
        .bind(target.id)
        .bind(ip)
        .bind(kind.as_token())
        .fetch_optional(self.pool())
        .await
        .map_err(db_err)?;
        row.map(|row| reaction_from(&row)).transpose()
    }

    async fn insert_reaction(&self, reaction: NewReaction) -> Result<Reaction> {
        let result = sqlx::query(
            "INSERT INTO reactions \
             (target_kind, target_id, reaction_kind, username, ip_address, user_agent, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(reaction.target.kind.as_token())
        .bind(reaction.target.id)
        .bind(reaction.kind.as_token())
        .bind(&reaction.username)
        .bind(&reaction.ip_address)
        .bind(&reaction.user_agent)
        .bind(reaction.created_at)
        .execute(self.pool())
        .await
        .map_err(db_err)?;

        Ok(Reaction {
            id: result.last_insert_rowid(),
            target: reaction.target,
            kind: reaction.kind,
            username: reaction.username,
            ip_address: reaction.ip_address,
            user_agent: reaction.user_agent,
            created_at: reaction.created_at,
        })
    }

    async fn delete_reaction(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reactions WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_reactions(&self, target: Target) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) FROM reactions WHERE target_kind = ? AND target_id = ?")
            .bind(target.kind.as_token())
            .bind(target.id)
            .fetch_one(self.pool())
            .await
            .map_err(db_err)?;
        Ok(row.get::<i64, _>(0))
    }

    async fn count_reactions_of_kind(&self, target: Target, kind: ReactionKind) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) FROM reactions \
             WHERE target_kind = ? AND target_id = ? AND reaction_kind = ?",
        )
        .bind(target.kind.as_token())
        .bind(target.id)
        .bind(kind.as_token())
        .fetch_one(self.pool())
        .await
        .map_err(db_err)?;
        Ok(row.get::<i64, _>(0))
    }

    /// Runs in a transaction so an entity is never left with half its
    /// attachments. Reactions hanging off the target's own comments go
    /// first, while the comment rows still exist to select against.
    async fn purge_target(&self, target: Target) -> Result<u64> {
        let mut tx = self.pool().begin().await.map_err(db_err)?;

        let nested_reactions = sqlx::query(
            "DELETE FROM reactions WHERE target_kind = 'comment' AND target_id IN \
             (SELECT id FROM comments WHERE target_kind = ? AND target_id = ?)",
        )
        .bind(target.kind.as_token())
        .bind(target.id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?
        .rows_affected();

        let comments = sqlx::query("DELETE FROM comments WHERE target_kind = ? AND target_id = ?")
            .bind(target.kind.as_token())
            .bind(target.id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .rows_affected();

        let reactions = sqlx::query("DELETE FROM reactions WHERE target_kind = ? AND target_id = ?")
            .bind(target.kind.as_token())
            .bind(target.id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .rows_affected();

        tx.commit().await.map_err(db_err)?;
        log::debug!(
            "purged {} attachments for {target}",
            nested_reactions + comments + reactions
        );
        Ok(nested_reactions + comments + reactions)
    }
}
