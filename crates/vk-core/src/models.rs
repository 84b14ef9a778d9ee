//! # Domain Models
//!
//! These structs represent the core entities of Vaahaka. Catalog rows
//! carry the storage layer's integer ids; engagement rows (comments,
//! reactions) reference their subject through a [`Target`] instead of a
//! typed foreign key.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::target::{ReactionKind, Target};

/// Reader-facing grouping for stories and short stories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Hex color code for category display
    pub color: String,
    /// Icon class or emoji
    pub icon: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub bio: String,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
}

/// A serialized story: an ordered collection of episodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub category_id: Option<i64>,
    /// Featured stories surface on the homepage
    pub is_featured: bool,
}

/// One installment of a story. Titles and bodies are bilingual; the
/// rendered side is picked per request via [`Lang`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub id: i64,
    pub episode_number: i64,
    pub title_dv: String,
    pub title_en: String,
    pub content_dv: String,
    pub content_en: String,
    pub published_date: NaiveDate,
    pub author_id: i64,
    pub genre_id: Option<i64>,
}

impl Episode {
    pub fn title(&self, lang: Lang) -> &str {
        if lang.is_en() { &self.title_en } else { &self.title_dv }
    }

    pub fn content(&self, lang: Lang) -> &str {
        if lang.is_en() { &self.content_en } else { &self.content_dv }
    }
}

/// A self-contained story published outside any episode sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortStory {
    pub id: i64,
    pub title_dv: String,
    pub title_en: String,
    pub author_id: i64,
    pub genre_id: Option<i64>,
    pub category_id: Option<i64>,
    pub content_dv: String,
    pub content_en: String,
    pub published_date: NaiveDate,
    pub is_featured: bool,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShortStory {
    pub fn title(&self, lang: Lang) -> &str {
        if lang.is_en() { &self.title_en } else { &self.title_dv }
    }

    pub fn content(&self, lang: Lang) -> &str {
        if lang.is_en() { &self.content_en } else { &self.content_dv }
    }
}

/// A reader comment attached to any commentable entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub target: Target,
    /// Reader name (2-50 characters)
    pub username: String,
    /// Comment content (minimum 5 characters)
    pub body: String,
    /// Optional email for notifications
    pub email: Option<String>,
    pub is_approved: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Kept for moderation only, never rendered
    pub ip_address: Option<String>,
}

/// An emoji reaction. At most one row exists per
/// (target, ip_address, kind) — the toggle invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub id: i64,
    pub target: Target,
    pub kind: ReactionKind,
    pub username: Option<String>,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A validated comment ready for insertion; the store assigns the id and
/// initializes `updated_at` to `created_at`.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub target: Target,
    pub username: String,
    pub body: String,
    pub email: Option<String>,
    pub is_approved: bool,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A validated reaction ready for insertion.
#[derive(Debug, Clone)]
pub struct NewReaction {
    pub target: Target,
    pub kind: ReactionKind,
    pub username: Option<String>,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Raw comment submission as received from the boundary. Fields arrive
/// untrusted; [`crate::engage::Comments::submit`] trims and validates
/// before any write.
#[derive(Debug, Clone)]
pub struct CommentSubmission {
    pub content_type: String,
    pub object_id: Option<i64>,
    pub username: String,
    pub body: String,
    pub email: Option<String>,
    pub source_ip: Option<String>,
}

/// Raw reaction submission as received from the boundary.
#[derive(Debug, Clone)]
pub struct ReactionSubmission {
    pub content_type: String,
    pub object_id: Option<i64>,
    pub reaction_type: String,
    pub username: Option<String>,
    pub source_ip: String,
    pub user_agent: Option<String>,
}

/// Per-request language preference. Dhivehi is the default; the value is
/// carried as explicit request context, never as ambient global state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Dv,
    En,
}

impl Lang {
    pub fn from_token(token: &str) -> Lang {
        if token == "en" { Lang::En } else { Lang::Dv }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Lang::Dv => "dv",
            Lang::En => "en",
        }
    }

    pub fn toggled(self) -> Lang {
        match self {
            Lang::Dv => Lang::En,
            Lang::En => Lang::Dv,
        }
    }

    pub fn is_en(self) -> bool {
        self == Lang::En
    }
}

/// Previous and next episode around `number` within one story's episode
/// set. The slice does not have to be sorted.
pub fn episode_neighbors(episodes: &[Episode], number: i64) -> (Option<&Episode>, Option<&Episode>) {
    let previous = episodes
        .iter()
        .filter(|e| e.episode_number < number)
        .max_by_key(|e| e.episode_number);
    let next = episodes
        .iter()
        .filter(|e| e.episode_number > number)
        .min_by_key(|e| e.episode_number);
    (previous, next)
}
