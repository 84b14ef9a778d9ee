//! # vk-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the core
//! engines. The JSON endpoints keep the site's envelope convention:
//! domain failures answer HTTP 200 with `success: false` — the reader
//! widgets treat every well-formed response as a result, not a protocol
//! error. Infrastructure failures are the exception and answer 500 with
//! a generic message.

use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use askama::Template;
use serde::Deserialize;
use serde_json::json;

use vk_core::engage::{Comments, Counts, Reactions, ToggleOutcome};
use vk_core::error::AppError;
use vk_core::models::{episode_neighbors, CommentSubmission, Lang, ReactionSubmission};
use vk_core::target::{ContentKind, Target};
use vk_core::traits::{CatalogRepo, EngagementRepo};
use vk_ui::{
    EpisodeDetailTemplate, EpisodeListTemplate, HomeTemplate, ShortStoryDetailTemplate,
    ShortStoryListTemplate, StoryDetailTemplate, StoryListTemplate,
};

/// State shared across all Actix-web workers.
pub struct AppState {
    pub catalog: Box<dyn CatalogRepo>,
    pub engage: Box<dyn EngagementRepo>,
}

impl AppState {
    fn comments(&self) -> Comments<'_> {
        Comments::new(&*self.catalog, &*self.engage)
    }

    fn reactions(&self) -> Reactions<'_> {
        Reactions::new(&*self.catalog, &*self.engage)
    }

    fn counts(&self) -> Counts<'_> {
        Counts::new(&*self.engage)
    }
}

const LANG_COOKIE: &str = "lang";

/// Request-scoped language preference, read from the `lang` cookie.
fn lang_of(req: &HttpRequest) -> Lang {
    req.cookie(LANG_COOKIE)
        .map(|c| Lang::from_token(c.value()))
        .unwrap_or_default()
}

/// First `X-Forwarded-For` entry when present, else the peer address.
fn client_ip(req: &HttpRequest) -> Option<String> {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }
    req.peer_addr().map(|addr| addr.ip().to_string())
}

fn user_agent(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

// ── JSON API ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub object_id: Option<i64>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddReactionRequest {
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub object_id: Option<i64>,
    #[serde(default = "default_reaction")]
    pub reaction_type: String,
    #[serde(default)]
    pub username: Option<String>,
}

fn default_reaction() -> String {
    "heart".to_string()
}

fn envelope_error(err: &AppError) -> HttpResponse {
    if err.is_domain() {
        HttpResponse::Ok().json(json!({ "success": false, "error": err.public_message() }))
    } else {
        log::error!("engagement request failed: {err}");
        HttpResponse::InternalServerError()
            .json(json!({ "success": false, "error": err.public_message() }))
    }
}

fn bad_payload() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": false, "error": "Invalid request body" }))
}

/// POST /api/comments/add/
pub async fn add_comment(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> impl Responder {
    // Deserialized by hand so a malformed body lands in the same
    // envelope instead of an extractor rejection.
    let payload: AddCommentRequest = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(_) => return bad_payload(),
    };

    let submission = CommentSubmission {
        content_type: payload.content_type,
        object_id: payload.object_id,
        username: payload.username,
        body: payload.comment,
        email: payload.email,
        source_ip: client_ip(&req),
    };

    match data.comments().submit(submission).await {
        Ok(comment) => HttpResponse::Ok().json(json!({
            "success": true,
            "comment_id": comment.id,
            "message": "Comment added successfully!",
        })),
        Err(err) => envelope_error(&err),
    }
}

/// POST /api/reactions/add/
pub async fn add_reaction(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> impl Responder {
    let payload: AddReactionRequest = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(_) => return bad_payload(),
    };

    let submission = ReactionSubmission {
        content_type: payload.content_type,
        object_id: payload.object_id,
        reaction_type: payload.reaction_type,
        username: payload.username,
        source_ip: client_ip(&req).unwrap_or_default(),
        user_agent: user_agent(&req),
    };

    match data.reactions().toggle(submission).await {
        Ok(ToggleOutcome::Added { id, total }) => HttpResponse::Ok().json(json!({
            "success": true,
            "action": "added",
            "reaction_id": id,
            "total_reactions": total,
        })),
        Ok(ToggleOutcome::Removed { total }) => HttpResponse::Ok().json(json!({
            "success": true,
            "action": "removed",
            "total_reactions": total,
        })),
        Err(err) => envelope_error(&err),
    }
}

// ── Pages ───────────────────────────────────────────────────────────────────

fn render<T: Template>(template: T) -> HttpResponse {
    match template.render() {
        Ok(html) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(html),
        Err(err) => {
            log::error!("template rendering failed: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

fn page_error(err: &AppError) -> HttpResponse {
    match err {
        AppError::NotFound(..) | AppError::InvalidTarget(_) => HttpResponse::NotFound().finish(),
        other => {
            log::error!("page query failed: {other}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<i64>,
}

/// GET /
pub async fn home(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let lang = lang_of(&req);
    let feeds = async {
        let stories = data.catalog.newest_stories(3).await?;
        let episodes = data.catalog.newest_episodes(5).await?;
        let short_stories = data.catalog.featured_short_stories(3).await?;
        Ok::<_, AppError>((stories, episodes, short_stories))
    }
    .await;

    match feeds {
        Ok((stories, episodes, short_stories)) => render(HomeTemplate {
            featured_stories: &stories,
            latest_episodes: &episodes,
            featured_short_stories: &short_stories,
            lang,
        }),
        Err(err) => page_error(&err),
    }
}

/// GET /stories/
pub async fn story_list(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<CategoryQuery>,
) -> impl Responder {
    let lang = lang_of(&req);
    let listing = async {
        let stories = data.catalog.list_stories(query.category).await?;
        let categories = data.catalog.list_categories().await?;
        Ok::<_, AppError>((stories, categories))
    }
    .await;

    match listing {
        Ok((stories, categories)) => render(StoryListTemplate {
            stories: &stories,
            categories: &categories,
            selected_category: query.category,
            lang,
        }),
        Err(err) => page_error(&err),
    }
}

/// GET /stories/{id}/
pub async fn story_detail(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> impl Responder {
    let id = path.into_inner();
    let lang = lang_of(&req);

    let story = match data.catalog.story(id).await {
        Ok(Some(story)) => story,
        Ok(None) => return HttpResponse::NotFound().finish(),
        Err(err) => return page_error(&err),
    };

    let target = Target::new(ContentKind::Story, id);
    let page = async {
        let episodes = data.catalog.episodes_for_story(id).await?;
        let comments = data.comments().approved_for(target).await?;
        let counts = data.counts().summary(target).await?;
        Ok::<_, AppError>((episodes, comments, counts))
    }
    .await;

    match page {
        Ok((episodes, comments, counts)) => render(StoryDetailTemplate {
            story: &story,
            episodes: &episodes,
            comments: &comments,
            counts,
            lang,
        }),
        Err(err) => page_error(&err),
    }
}

/// GET /episodes/
pub async fn episode_list(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let lang = lang_of(&req);
    match data.catalog.list_episodes().await {
        Ok(episodes) => render(EpisodeListTemplate {
            episodes: &episodes,
            lang,
        }),
        Err(err) => page_error(&err),
    }
}

/// GET /episodes/{id}/
pub async fn episode_detail(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> impl Responder {
    let id = path.into_inner();
    let lang = lang_of(&req);

    let episode = match data.catalog.episode(id).await {
        Ok(Some(episode)) => episode,
        Ok(None) => return HttpResponse::NotFound().finish(),
        Err(err) => return page_error(&err),
    };

    let target = Target::new(ContentKind::Episode, id);
    let page = async {
        // Previous/next navigation is scoped to the owning story.
        let story = data.catalog.story_for_episode(id).await?;
        let siblings = match &story {
            Some(story) => data.catalog.episodes_for_story(story.id).await?,
            None => Vec::new(),
        };
        let author = data.catalog.author(episode.author_id).await?;
        let genre = match episode.genre_id {
            Some(genre_id) => data.catalog.genre(genre_id).await?,
            None => None,
        };
        let comments = data.comments().approved_for(target).await?;
        let counts = data.counts().summary(target).await?;
        Ok::<_, AppError>((story, siblings, author, genre, comments, counts))
    }
    .await;

    match page {
        Ok((story, siblings, author, genre, comments, counts)) => {
            let (previous, next) = episode_neighbors(&siblings, episode.episode_number);
            let author_name = author.map(|a| a.name).unwrap_or_default();
            let genre_name = genre.map(|g| g.name).unwrap_or_default();
            render(EpisodeDetailTemplate {
                episode: &episode,
                story: story.as_ref(),
                previous_episode: previous,
                next_episode: next,
                author_name: &author_name,
                genre_name: &genre_name,
                comments: &comments,
                counts,
                lang,
            })
        }
        Err(err) => page_error(&err),
    }
}

/// GET /short-stories/
pub async fn short_story_list(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<CategoryQuery>,
) -> impl Responder {
    let lang = lang_of(&req);
    let listing = async {
        let short_stories = data.catalog.list_short_stories(query.category).await?;
        let categories = data.catalog.list_categories().await?;
        Ok::<_, AppError>((short_stories, categories))
    }
    .await;

    match listing {
        Ok((short_stories, categories)) => render(ShortStoryListTemplate {
            short_stories: &short_stories,
            categories: &categories,
            selected_category: query.category,
            lang,
        }),
        Err(err) => page_error(&err),
    }
}

/// GET /short-stories/{id}/
pub async fn short_story_detail(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> impl Responder {
    let id = path.into_inner();
    let lang = lang_of(&req);

    let short_story = match data.catalog.short_story(id).await {
        // Unpublished short stories are invisible to readers.
        Ok(Some(short_story)) if short_story.is_published => short_story,
        Ok(_) => return HttpResponse::NotFound().finish(),
        Err(err) => return page_error(&err),
    };

    let target = Target::new(ContentKind::ShortStory, id);
    let page = async {
        let author = data.catalog.author(short_story.author_id).await?;
        let genre = match short_story.genre_id {
            Some(genre_id) => data.catalog.genre(genre_id).await?,
            None => None,
        };
        let comments = data.comments().approved_for(target).await?;
        let counts = data.counts().summary(target).await?;
        Ok::<_, AppError>((author, genre, comments, counts))
    }
    .await;

    match page {
        Ok((author, genre, comments, counts)) => {
            let author_name = author.map(|a| a.name).unwrap_or_default();
            let genre_name = genre.map(|g| g.name).unwrap_or_default();
            render(ShortStoryDetailTemplate {
                short_story: &short_story,
                author_name: &author_name,
                genre_name: &genre_name,
                comments: &comments,
                counts,
                lang,
            })
        }
        Err(err) => page_error(&err),
    }
}

/// GET /toggle-language/ — flips the lang cookie and bounces back to the
/// referring page.
pub async fn toggle_language(req: HttpRequest) -> impl Responder {
    let flipped = lang_of(&req).toggled();
    let back = req
        .headers()
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("/")
        .to_string();

    let cookie = Cookie::build(LANG_COOKIE, flipped.as_token()).path("/").finish();
    HttpResponse::SeeOther()
        .cookie(cookie)
        .insert_header((header::LOCATION, back))
        .finish()
}
