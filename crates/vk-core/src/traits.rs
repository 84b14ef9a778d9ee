//! # Core Traits (Ports)
//!
//! Any storage plugin must implement these traits to be used by the
//! binary. The engines and handlers only ever see the contracts.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Author, Category, Comment, Episode, Genre, NewComment, NewReaction, Reaction, ShortStory, Story,
};
use crate::target::{ReactionKind, Target};

/// Read access to the story catalog.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CatalogRepo: Send + Sync {
    // Single-entity lookups (also backing target resolution)
    async fn story(&self, id: i64) -> Result<Option<Story>>;
    async fn episode(&self, id: i64) -> Result<Option<Episode>>;
    async fn short_story(&self, id: i64) -> Result<Option<ShortStory>>;
    async fn author(&self, id: i64) -> Result<Option<Author>>;
    async fn genre(&self, id: i64) -> Result<Option<Genre>>;

    /// Stories, newest release first, optionally filtered by category.
    async fn list_stories(&self, category: Option<i64>) -> Result<Vec<Story>>;
    /// All episodes ordered by episode number.
    async fn list_episodes(&self) -> Result<Vec<Episode>>;
    /// Episodes of one story, ordered by episode number.
    async fn episodes_for_story(&self, story_id: i64) -> Result<Vec<Episode>>;
    /// The story an episode belongs to (lowest story id wins when the
    /// episode is linked to several).
    async fn story_for_episode(&self, episode_id: i64) -> Result<Option<Story>>;
    /// Published short stories, newest first, optionally by category.
    async fn list_short_stories(&self, category: Option<i64>) -> Result<Vec<ShortStory>>;
    /// Active categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    // Homepage feeds
    async fn newest_stories(&self, limit: i64) -> Result<Vec<Story>>;
    async fn newest_episodes(&self, limit: i64) -> Result<Vec<Episode>>;
    async fn featured_short_stories(&self, limit: i64) -> Result<Vec<ShortStory>>;
}

/// Persistence for comments and reactions, plus the read-side counts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait EngagementRepo: Send + Sync {
    // Comment operations
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment>;
    async fn comment(&self, id: i64) -> Result<Option<Comment>>;
    /// Approved comments for a target, newest first.
    async fn approved_comments(&self, target: Target) -> Result<Vec<Comment>>;
    async fn count_approved_comments(&self, target: Target) -> Result<i64>;
    /// Moderation flag updates; refresh the comment's `updated_at`.
    async fn set_comment_approved(&self, id: i64, approved: bool) -> Result<()>;
    async fn set_comment_featured(&self, id: i64, featured: bool) -> Result<()>;

    // Reaction operations
    /// Exact-match lookup on (target, ip, kind) — the toggle key.
    async fn find_reaction(&self, target: Target, ip: &str, kind: ReactionKind)
        -> Result<Option<Reaction>>;
    /// Inserts a reaction row. A uniqueness violation must map to
    /// `AppError::Conflict` so the engine can degrade to a delete.
    async fn insert_reaction(&self, reaction: NewReaction) -> Result<Reaction>;
    /// Returns false when the row was already gone.
    async fn delete_reaction(&self, id: i64) -> Result<bool>;
    async fn count_reactions(&self, target: Target) -> Result<i64>;
    async fn count_reactions_of_kind(&self, target: Target, kind: ReactionKind) -> Result<i64>;

    /// Deletes every comment and reaction attached to `target`,
    /// including reactions on the target's own comments. Called by the
    /// owning entity's lifecycle when that entity is destroyed.
    async fn purge_target(&self, target: Target) -> Result<u64>;
}
