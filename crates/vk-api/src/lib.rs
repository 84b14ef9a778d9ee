//! # vk-api
//!
//! The web routing and orchestration layer for Vaahaka.

pub mod handlers;
pub mod middleware;

use actix_web::web;

/// Configures the routes for the site.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// everything under a different prefix if needed.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            .route("/", web::get().to(handlers::home))
            .route("/stories/", web::get().to(handlers::story_list))
            .route("/stories/{id}/", web::get().to(handlers::story_detail))
            .route("/short-stories/", web::get().to(handlers::short_story_list))
            .route("/short-stories/{id}/", web::get().to(handlers::short_story_detail))
            .route("/episodes/", web::get().to(handlers::episode_list))
            .route("/episodes/{id}/", web::get().to(handlers::episode_detail))
            .route("/toggle-language/", web::get().to(handlers::toggle_language))
            // Comment and reaction APIs
            .route("/api/comments/add/", web::post().to(handlers::add_comment))
            .route("/api/reactions/add/", web::post().to(handlers::add_reaction)),
    );
}
