//! # Engagement Engines
//!
//! Comment submission, reaction toggling, and the read-side count
//! facade. All domain rules live here; the handlers stay thin and the
//! storage plugins stay dumb. Validation always runs before the first
//! write, so a failed submission leaves storage untouched.

use chrono::Utc;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{
    Comment, CommentSubmission, NewComment, NewReaction, ReactionSubmission,
};
use crate::target::{ReactionKind, Registry, Target};
use crate::traits::{CatalogRepo, EngagementRepo};

/// Bounds on reader-supplied fields.
const USERNAME_MIN: usize = 2;
const USERNAME_MAX: usize = 50;
const BODY_MIN: usize = 5;

/// The comment engine: validation, creation, moderation flags.
pub struct Comments<'a> {
    registry: Registry<'a>,
    store: &'a dyn EngagementRepo,
}

impl<'a> Comments<'a> {
    pub fn new(catalog: &'a dyn CatalogRepo, store: &'a dyn EngagementRepo) -> Comments<'a> {
        Comments {
            registry: Registry::new(catalog, store),
            store,
        }
    }

    /// Validates and persists a reader comment. Comments are
    /// auto-approved on creation; moderation flips the flag later
    /// out-of-band.
    pub async fn submit(&self, submission: CommentSubmission) -> Result<Comment> {
        let username = submission.username.trim();
        if username.chars().count() < USERNAME_MIN {
            return Err(AppError::Validation {
                field: "username",
                reason: "Username must be at least 2 characters".to_string(),
            });
        }
        if username.chars().count() > USERNAME_MAX {
            return Err(AppError::Validation {
                field: "username",
                reason: "Username must be at most 50 characters".to_string(),
            });
        }

        let body = submission.body.trim();
        if body.chars().count() < BODY_MIN {
            return Err(AppError::Validation {
                field: "comment",
                reason: "Comment must be at least 5 characters".to_string(),
            });
        }

        let email = match submission.email.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(addr) if is_valid_email(addr) => Some(addr.to_string()),
            Some(_) => {
                return Err(AppError::Validation {
                    field: "email",
                    reason: "Enter a valid email address".to_string(),
                })
            }
        };

        let entity = self
            .registry
            .resolve_commentable(&submission.content_type, submission.object_id)
            .await?;

        let comment = self
            .store
            .insert_comment(NewComment {
                target: entity.target,
                username: username.to_string(),
                body: body.to_string(),
                email,
                // Auto-approve policy: no moderation queue in front of
                // publication, only behind it.
                is_approved: true,
                ip_address: submission.source_ip,
                created_at: Utc::now(),
            })
            .await?;
        log::info!("comment {} added on {} ({})", comment.id, entity.target, entity.label);
        Ok(comment)
    }

    /// Approved comments for one target, newest first.
    pub async fn approved_for(&self, target: Target) -> Result<Vec<Comment>> {
        self.store.approved_comments(target).await
    }

    // Moderation actions, administrative only. Readers never reach
    // these; the submission path cannot touch the flags.

    pub async fn set_approved(&self, id: i64, approved: bool) -> Result<()> {
        self.store.set_comment_approved(id, approved).await
    }

    pub async fn set_featured(&self, id: i64, featured: bool) -> Result<()> {
        self.store.set_comment_featured(id, featured).await
    }
}

/// Result of a reaction toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added { id: i64, total: i64 },
    Removed { total: i64 },
}

impl ToggleOutcome {
    pub fn total(self) -> i64 {
        match self {
            ToggleOutcome::Added { total, .. } | ToggleOutcome::Removed { total } => total,
        }
    }

    pub fn action(self) -> &'static str {
        match self {
            ToggleOutcome::Added { .. } => "added",
            ToggleOutcome::Removed { .. } => "removed",
        }
    }
}

/// The reaction engine: per-(target, client, kind) toggle semantics.
pub struct Reactions<'a> {
    registry: Registry<'a>,
    store: &'a dyn EngagementRepo,
}

impl<'a> Reactions<'a> {
    pub fn new(catalog: &'a dyn CatalogRepo, store: &'a dyn EngagementRepo) -> Reactions<'a> {
        Reactions {
            registry: Registry::new(catalog, store),
            store,
        }
    }

    /// Adds the reaction when no (target, ip, kind) row exists, removes
    /// the row when one does. Totals are recomputed from storage after
    /// the mutation rather than kept as running counters.
    ///
    /// The dedup key includes the kind: one client may hold a heart and
    /// a like on the same target at once, each toggling independently.
    pub async fn toggle(&self, submission: ReactionSubmission) -> Result<ToggleOutcome> {
        let ip = submission.source_ip.trim();
        if ip.is_empty() {
            return Err(AppError::Validation {
                field: "source_ip",
                reason: "Could not determine client address".to_string(),
            });
        }

        let entity = self
            .registry
            .resolve_submission(&submission.content_type, submission.object_id)
            .await?;
        let target = entity.target;

        let kind = ReactionKind::from_token(&submission.reaction_type)
            .ok_or_else(|| AppError::InvalidReactionKind(submission.reaction_type.clone()))?;

        let username = match submission.username.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(name) if name.chars().count() > USERNAME_MAX => {
                return Err(AppError::Validation {
                    field: "username",
                    reason: "Username must be at most 50 characters".to_string(),
                })
            }
            Some(name) => Some(name.to_string()),
        };

        if let Some(existing) = self.store.find_reaction(target, ip, kind).await? {
            self.store.delete_reaction(existing.id).await?;
            let total = self.store.count_reactions(target).await?;
            log::info!("reaction {kind} removed from {target}");
            return Ok(ToggleOutcome::Removed { total });
        }

        let reaction = NewReaction {
            target,
            kind,
            username,
            ip_address: ip.to_string(),
            user_agent: submission.user_agent,
            created_at: Utc::now(),
        };
        match self.store.insert_reaction(reaction).await {
            Ok(added) => {
                let total = self.store.count_reactions(target).await?;
                log::info!("reaction {kind} added on {target}");
                Ok(ToggleOutcome::Added { id: added.id, total })
            }
            // Lost the insert race: someone else created the row after
            // our lookup, so the toggle becomes a removal.
            Err(AppError::Conflict(_)) => match self.store.find_reaction(target, ip, kind).await? {
                Some(existing) => {
                    self.store.delete_reaction(existing.id).await?;
                    let total = self.store.count_reactions(target).await?;
                    Ok(ToggleOutcome::Removed { total })
                }
                None => Err(AppError::Conflict(format!(
                    "reaction toggle raced twice on {target}"
                ))),
            },
            Err(other) => Err(other),
        }
    }
}

/// Read-side rollups per target. Pure queries over current storage
/// state; no cached counters, so there is nothing to drift or
/// invalidate.
pub struct Counts<'a> {
    store: &'a dyn EngagementRepo,
}

impl<'a> Counts<'a> {
    pub fn new(store: &'a dyn EngagementRepo) -> Counts<'a> {
        Counts { store }
    }

    pub async fn total_approved_comments(&self, target: Target) -> Result<i64> {
        self.store.count_approved_comments(target).await
    }

    pub async fn total_reactions(&self, target: Target) -> Result<i64> {
        self.store.count_reactions(target).await
    }

    pub async fn heart_reactions(&self, target: Target) -> Result<i64> {
        self.store.count_reactions_of_kind(target, ReactionKind::Heart).await
    }

    /// The three counts bundled for page rendering.
    pub async fn summary(&self, target: Target) -> Result<EngagementSummary> {
        Ok(EngagementSummary {
            comments: self.total_approved_comments(target).await?,
            reactions: self.total_reactions(target).await?,
            hearts: self.heart_reactions(target).await?,
        })
    }
}

/// Counts rendered alongside a content entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngagementSummary {
    pub comments: i64,
    pub reactions: i64,
    pub hearts: i64,
}

/// Shape check only: one `@`, non-empty local part, dotted domain, no
/// whitespace. Anything stricter belongs to the mail server.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
