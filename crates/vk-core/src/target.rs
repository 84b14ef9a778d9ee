//! # Polymorphic Targets
//!
//! Comments and reactions attach to content through a `(kind, id)` pair
//! instead of per-type foreign keys. [`Registry`] is the single place
//! untrusted `(token, id)` submissions are resolved against the backing
//! stores; adding a new attachable kind means touching the enum and the
//! registry, nothing else.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::traits::{CatalogRepo, EngagementRepo};

/// The closed set of entity kinds a comment or reaction may attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Story,
    Episode,
    ShortStory,
    Comment,
}

impl ContentKind {
    pub const ALL: [ContentKind; 4] = [
        ContentKind::Story,
        ContentKind::Episode,
        ContentKind::ShortStory,
        ContentKind::Comment,
    ];

    /// Parses a wire token. Anything outside the closed set is rejected.
    pub fn from_token(token: &str) -> Option<ContentKind> {
        match token {
            "story" => Some(ContentKind::Story),
            "episode" => Some(ContentKind::Episode),
            "shortstory" => Some(ContentKind::ShortStory),
            "comment" => Some(ContentKind::Comment),
            _ => None,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            ContentKind::Story => "story",
            ContentKind::Episode => "episode",
            ContentKind::ShortStory => "shortstory",
            ContentKind::Comment => "comment",
        }
    }

    /// Comments may target everything except other comments; reactions
    /// may target all four kinds.
    pub fn accepts_comments(self) -> bool {
        !matches!(self, ContentKind::Comment)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// A reference to the entity an attachment points at. Not an owned
/// entity — validity means the id currently resolves through
/// [`Registry`], and the owning entity's lifecycle may invalidate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub kind: ContentKind,
    pub id: i64,
}

impl Target {
    pub fn new(kind: ContentKind, id: i64) -> Target {
        Target { kind, id }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// The fixed emoji vocabulary for reactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Heart,
    Like,
    Love,
    Laugh,
    Wow,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 5] = [
        ReactionKind::Heart,
        ReactionKind::Like,
        ReactionKind::Love,
        ReactionKind::Laugh,
        ReactionKind::Wow,
    ];

    pub fn from_token(token: &str) -> Option<ReactionKind> {
        match token {
            "heart" => Some(ReactionKind::Heart),
            "like" => Some(ReactionKind::Like),
            "love" => Some(ReactionKind::Love),
            "laugh" => Some(ReactionKind::Laugh),
            "wow" => Some(ReactionKind::Wow),
            _ => None,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            ReactionKind::Heart => "heart",
            ReactionKind::Like => "like",
            ReactionKind::Love => "love",
            ReactionKind::Laugh => "laugh",
            ReactionKind::Wow => "wow",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            ReactionKind::Heart => "❤️",
            ReactionKind::Like => "👍",
            ReactionKind::Love => "😍",
            ReactionKind::Laugh => "😂",
            ReactionKind::Wow => "😮",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Minimal handle returned by target resolution: the validated target
/// plus a human-readable label for presentation and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub target: Target,
    pub label: String,
}

/// Resolves `(kind, id)` references against the backing stores. Catalog
/// kinds delegate to [`CatalogRepo`]; comments live with the engagement
/// store.
pub struct Registry<'a> {
    catalog: &'a dyn CatalogRepo,
    engage: &'a dyn EngagementRepo,
}

impl<'a> Registry<'a> {
    pub fn new(catalog: &'a dyn CatalogRepo, engage: &'a dyn EngagementRepo) -> Registry<'a> {
        Registry { catalog, engage }
    }

    fn parse(token: &str, id: Option<i64>) -> Result<Target> {
        if token.is_empty() {
            return Err(AppError::invalid_reference());
        }
        let id = id.ok_or_else(AppError::invalid_reference)?;
        let kind = ContentKind::from_token(token).ok_or_else(AppError::invalid_content_type)?;
        Ok(Target::new(kind, id))
    }

    /// Maps an untrusted `(token, id)` submission to a resolved entity.
    pub async fn resolve_submission(&self, token: &str, id: Option<i64>) -> Result<EntityRef> {
        self.resolve(Self::parse(token, id)?).await
    }

    /// Variant for comment submissions: comments cannot target other
    /// comments, and the kind is rejected before any store lookup.
    pub async fn resolve_commentable(&self, token: &str, id: Option<i64>) -> Result<EntityRef> {
        let target = Self::parse(token, id)?;
        if !target.kind.accepts_comments() {
            return Err(AppError::invalid_content_type());
        }
        self.resolve(target).await
    }

    /// Looks the target up in its backing store. `InvalidTarget` when
    /// the underlying entity does not exist.
    pub async fn resolve(&self, target: Target) -> Result<EntityRef> {
        let label = match target.kind {
            ContentKind::Story => self.catalog.story(target.id).await?.map(|s| s.title),
            ContentKind::Episode => self
                .catalog
                .episode(target.id)
                .await?
                .map(|e| format!("Episode {}: {}", e.episode_number, e.title_en)),
            ContentKind::ShortStory => self.catalog.short_story(target.id).await?.map(|s| s.title_en),
            ContentKind::Comment => self
                .engage
                .comment(target.id)
                .await?
                .map(|c| format!("Comment by {}", c.username)),
        };
        match label {
            Some(label) => Ok(EntityRef { target, label }),
            None => Err(AppError::invalid_reference()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_cover_the_closed_set() {
        for kind in ContentKind::ALL {
            assert_eq!(ContentKind::from_token(kind.as_token()), Some(kind));
        }
        assert_eq!(ContentKind::from_token("shortstory"), Some(ContentKind::ShortStory));
        assert_eq!(ContentKind::from_token("Story"), None);
        assert_eq!(ContentKind::from_token("page"), None);
        assert_eq!(ContentKind::from_token(""), None);
    }

    #[test]
    fn serde_uses_the_wire_tokens() {
        let json = serde_json::to_string(&ContentKind::ShortStory).unwrap();
        assert_eq!(json, "\"shortstory\"");
        let kind: ContentKind = serde_json::from_str("\"episode\"").unwrap();
        assert_eq!(kind, ContentKind::Episode);

        let json = serde_json::to_string(&ReactionKind::Laugh).unwrap();
        assert_eq!(json, "\"laugh\"");
    }

    #[test]
    fn comments_cannot_target_comments() {
        assert!(ContentKind::Story.accepts_comments());
        assert!(ContentKind::Episode.accepts_comments());
        assert!(ContentKind::ShortStory.accepts_comments());
        assert!(!ContentKind::Comment.accepts_comments());
    }

    #[test]
    fn reaction_tokens_roundtrip() {
        for kind in ReactionKind::ALL {
            assert_eq!(ReactionKind::from_token(kind.as_token()), Some(kind));
            assert!(!kind.emoji().is_empty());
        }
        assert_eq!(ReactionKind::from_token("dislike"), None);
    }

    #[test]
    fn parse_rejects_incomplete_references() {
        let err = Registry::parse("story", None).unwrap_err();
        assert_eq!(err.public_message(), "Invalid content reference");

        let err = Registry::parse("", Some(3)).unwrap_err();
        assert_eq!(err.public_message(), "Invalid content reference");

        let err = Registry::parse("article", Some(3)).unwrap_err();
        assert_eq!(err.public_message(), "Invalid content type");
    }
}
