//! # vk-ui
//!
//! Askama templates for the reader-facing pages. Handlers in vk-api fill
//! these with domain models and render; body text passes through the
//! `br` filter so plain prose keeps its line breaks.

use askama::Template;
use vk_core::engage::EngagementSummary;
use vk_core::models::{Category, Comment, Episode, Lang, ShortStory, Story};

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate<'a> {
    pub featured_stories: &'a [Story],
    pub latest_episodes: &'a [Episode],
    pub featured_short_stories: &'a [ShortStory],
    pub lang: Lang,
}

#[derive(Template)]
#[template(path = "story_list.html")]
pub struct StoryListTemplate<'a> {
    pub stories: &'a [Story],
    pub categories: &'a [Category],
    pub selected_category: Option<i64>,
    pub lang: Lang,
}

#[derive(Template)]
#[template(path = "story_detail.html")]
pub struct StoryDetailTemplate<'a> {
    pub story: &'a Story,
    pub episodes: &'a [Episode],
    pub comments: &'a [Comment],
    pub counts: EngagementSummary,
    pub lang: Lang,
}

#[derive(Template)]
#[template(path = "episode_list.html")]
pub struct EpisodeListTemplate<'a> {
    pub episodes: &'a [Episode],
    pub lang: Lang,
}

#[derive(Template)]
#[template(path = "episode_detail.html")]
pub struct EpisodeDetailTemplate<'a> {
    pub episode: &'a Episode,
    pub story: Option<&'a Story>,
    pub previous_episode: Option<&'a Episode>,
    pub next_episode: Option<&'a Episode>,
    pub author_name: &'a str,
    pub genre_name: &'a str,
    pub comments: &'a [Comment],
    pub counts: EngagementSummary,
    pub lang: Lang,
}

#[derive(Template)]
#[template(path = "short_story_list.html")]
pub struct ShortStoryListTemplate<'a> {
    pub short_stories: &'a [ShortStory],
    pub categories: &'a [Category],
    pub selected_category: Option<i64>,
    pub lang: Lang,
}

#[derive(Template)]
#[template(path = "short_story_detail.html")]
pub struct ShortStoryDetailTemplate<'a> {
    pub short_story: &'a ShortStory,
    pub author_name: &'a str,
    pub genre_name: &'a str,
    pub comments: &'a [Comment],
    pub counts: EngagementSummary,
    pub lang: Lang,
}

/// Template filters; askama resolves `{{ value|br }}` against this
/// module.
pub mod filters {
    use std::fmt::Display;

    /// Escapes body text and joins lines with `<br />`. Combine with
    /// `|safe` — the output is already escaped.
    pub fn br(value: impl Display) -> askama::Result<String> {
        let text = value.to_string();
        let escaped = html_escape::encode_safe(&text);
        Ok(escaped.lines().collect::<Vec<_>>().join("<br />"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use vk_core::target::{ContentKind, Target};

    #[test]
    fn br_filter_escapes_and_keeps_line_breaks() {
        let html = filters::br("line one\n<script>line two</script>").unwrap();
        assert_eq!(html, "line one<br />&lt;script&gt;line two&lt;/script&gt;");
    }

    #[test]
    fn story_detail_renders_comments_and_counts() {
        let story = Story {
            id: 3,
            title: "Dheriyaa".to_string(),
            description: "A story told in parts.".to_string(),
            release_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            category_id: None,
            is_featured: true,
        };
        let now = Utc::now();
        let comments = vec![Comment {
            id: 1,
            target: Target::new(ContentKind::Story, 3),
            username: "Ali".to_string(),
            body: "Loved this one".to_string(),
            email: None,
            is_approved: true,
            is_featured: false,
            created_at: now,
            updated_at: now,
            ip_address: None,
        }];
        let html = StoryDetailTemplate {
            story: &story,
            episodes: &[],
            comments: &comments,
            counts: EngagementSummary { comments: 1, reactions: 2, hearts: 1 },
            lang: Lang::En,
        }
        .render()
        .unwrap();
        assert!(html.contains("Dheriyaa"));
        assert!(html.contains("Loved this one"));
        assert!(html.contains("data-object-id=\"3\""));
    }
}
