//! vaahaka/crates/vk-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Vaahaka.

pub mod models;
pub mod target;
pub mod traits;
pub mod engage;
pub mod error;

// Re-exporting for easier access in other crates
pub use models::*;
pub use target::*;
pub use traits::*;
pub use engage::*;
pub use error::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use super::target::*;
    use chrono::Utc;

    #[test]
    fn test_comment_construction() {
        let now = Utc::now();
        let comment = Comment {
            id: 1,
            target: Target::new(ContentKind::Episode, 7),
            username: "Ali".to_string(),
            body: "Great episode!".to_string(),
            email: None,
            is_approved: true,
            is_featured: false,
            created_at: now,
            updated_at: now,
            ip_address: Some("1.2.3.4".to_string()),
        };
        assert!(comment.is_approved);
        assert_eq!(comment.target.to_string(), "episode/7");
    }
}
