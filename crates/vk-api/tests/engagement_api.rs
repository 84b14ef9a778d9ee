//! HTTP-level tests for the comment/reaction endpoints over the real
//! SQLite plugin: the `success:false` envelope convention and the
//! reader scenario end to end.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use actix_web::cookie::Cookie;
use actix_web::{test, web, App};
use serde_json::{json, Value};

use vk_api::configure_routes;
use vk_api::handlers::AppState;
use vk_db_sqlite::SqliteStore;

async fn state_with_episode() -> (web::Data<AppState>, i64) {
    let store = SqliteStore::memory().await.unwrap();
    let author = sqlx::query("INSERT INTO authors (name) VALUES ('Aminath Shiuna')")
        .execute(store.pool())
        .await
        .unwrap()
        .last_insert_rowid();
    let episode = sqlx::query(
        "INSERT INTO episodes \
         (episode_number, title_dv, title_en, content_dv, content_en, published_date, author_id) \
         VALUES (7, 'ބައި 7', 'Part 7', 'ފެށުން', 'The beginning', '2024-03-20', ?)",
    )
    .bind(author)
    .execute(store.pool())
    .await
    .unwrap()
    .last_insert_rowid();

    let state = web::Data::new(AppState {
        catalog: Box::new(store.clone()),
        engage: Box::new(store),
    });
    (state, episode)
}

fn peer(last_octet: u8) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(1, 2, 3, last_octet)), 40000)
}

#[actix_web::test]
async fn malformed_body_answers_inside_the_envelope() {
    let (state, _) = state_with_episode().await;
    let app = test::init_service(App::new().app_data(state).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/comments/add/")
        .set_payload("{not json")
        .peer_addr(peer(4))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Invalid request body"));
}

#[actix_web::test]
async fn domain_failures_answer_200_with_success_false() {
    let (state, episode) = state_with_episode().await;
    let app = test::init_service(App::new().app_data(state).configure(configure_routes)).await;

    // Too-short username
    let req = test::TestRequest::post()
        .uri("/api/comments/add/")
        .set_json(json!({
            "content_type": "episode",
            "object_id": episode,
            "username": "A",
            "comment": "Great episode!",
        }))
        .peer_addr(peer(4))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Username must be at least 2 characters"));

    // Unknown kind token
    let req = test::TestRequest::post()
        .uri("/api/comments/add/")
        .set_json(json!({
            "content_type": "article",
            "object_id": episode,
            "username": "Ali",
            "comment": "Great episode!",
        }))
        .peer_addr(peer(4))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["error"], json!("Invalid content type"));

    // Unresolvable id
    let req = test::TestRequest::post()
        .uri("/api/reactions/add/")
        .set_json(json!({ "content_type": "episode", "object_id": 9999 }))
        .peer_addr(peer(4))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Invalid content reference"));
}

#[actix_web::test]
async fn comment_then_heart_toggle_scenario() {
    let (state, episode) = state_with_episode().await;
    let app = test::init_service(App::new().app_data(state).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/comments/add/")
        .set_json(json!({
            "content_type": "episode",
            "object_id": episode,
            "username": "Ali",
            "comment": "Great episode!",
        }))
        .peer_addr(peer(4))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Comment added successfully!"));
    assert!(body["comment_id"].as_i64().unwrap() > 0);

    // Heart from 1.2.3.4: added, total 1. reaction_type defaults to heart.
    let req = test::TestRequest::post()
        .uri("/api/reactions/add/")
        .set_json(json!({ "content_type": "episode", "object_id": episode }))
        .peer_addr(peer(4))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["action"], json!("added"));
    assert_eq!(body["total_reactions"], json!(1));
    assert!(body["reaction_id"].as_i64().is_some());

    // Same call from the same client: removed, total 0.
    let req = test::TestRequest::post()
        .uri("/api/reactions/add/")
        .set_json(json!({ "content_type": "episode", "object_id": episode }))
        .peer_addr(peer(4))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["action"], json!("removed"));
    assert_eq!(body["total_reactions"], json!(0));
}

#[actix_web::test]
async fn forwarded_for_header_identifies_the_client() {
    let (state, episode) = state_with_episode().await;
    let app = test::init_service(App::new().app_data(state).configure(configure_routes)).await;

    // Two requests from different peers but the same forwarded client
    // toggle the same reaction row.
    for (peer_octet, action) in [(10, "added"), (11, "removed")] {
        let req = test::TestRequest::post()
            .uri("/api/reactions/add/")
            .set_json(json!({ "content_type": "episode", "object_id": episode }))
            .insert_header(("x-forwarded-for", "203.0.113.9, 10.0.0.1"))
            .peer_addr(peer(peer_octet))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["action"], json!(action));
    }
}

#[actix_web::test]
async fn episode_page_renders_in_the_requested_language() {
    let (state, episode) = state_with_episode().await;
    let app = test::init_service(App::new().app_data(state).configure(configure_routes)).await;

    let req = test::TestRequest::get()
        .uri(&format!("/episodes/{episode}/"))
        .cookie(Cookie::new("lang", "en"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("Part 7"));
    assert!(html.contains("The beginning"));

    // Default language is Dhivehi.
    let req = test::TestRequest::get()
        .uri(&format!("/episodes/{episode}/"))
        .to_request();
    let html = String::from_utf8(
        test::read_body(test::call_service(&app, req).await).await.to_vec(),
    )
    .unwrap();
    assert!(html.contains("ބައި 7"));
}
