mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};

#[tokio::test]
async fn cannot_subscribe_to_self() {
    let app = TestApp::new().await;
    let (id, cookie) = app.signed_in("ann").await;

    let resp = app.post(&format!("/users/{id}/subscribe"), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.count("SELECT COUNT(*) FROM subscriptions").await, 0);
}

#[tokio::test]
async fn subscribe_returns_author_feed() {
    let app = TestApp::new().await;
    let (author_id, author) = app.signed_in("chef").await;
    let (_, fan) = app.signed_in("fan").await;
    let tag = app.create_tag("Dinner", "dinner").await;
    let salt = app.create_ingredient("Salt", "g").await;
    for name in ["Soup", "Stew", "Roast"] {
        app.create_recipe(&author, name, &[tag], &[(salt, 1)]).await;
    }

    let resp = app
        .post(&format!("/users/{author_id}/subscribe?recipes_limit=2"), Some(&fan))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let feed = body_json(resp).await;
    assert_eq!(feed["id"], author_id);
    assert_eq!(feed["username"], "chef");
    assert_eq!(feed["is_subscribed"], true);
    assert_eq!(feed["recipes"].as_array().unwrap().len(), 2);
    assert_eq!(feed["recipes_count"], 3);

    let profile = body_json(app.get(&format!("/users/{author_id}"), Some(&fan)).await).await;
    assert_eq!(profile["is_subscribed"], true);
}

#[tokio::test]
async fn subscribing_twice_is_rejected() {
    let app = TestApp::new().await;
    let (author_id, _) = app.create_user("chef").await;
    let (_, fan) = app.signed_in("fan").await;
    let uri = format!("/users/{author_id}/subscribe");

    assert_eq!(app.post(&uri, Some(&fan)).await.status(), StatusCode::CREATED);

    let resp = app.post(&uri, Some(&fan)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["errors"].is_string());
    assert_eq!(app.count("SELECT COUNT(*) FROM subscriptions").await, 1);
}

#[tokio::test]
async fn unsubscribe_then_again_is_rejected() {
    let app = TestApp::new().await;
    let (author_id, _) = app.create_user("chef").await;
    let (_, fan) = app.signed_in("fan").await;
    let uri = format!("/users/{author_id}/subscribe");

    app.post(&uri, Some(&fan)).await;

    assert_eq!(app.delete(&uri, Some(&fan)).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.delete(&uri, Some(&fan)).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn subscriptions_list_shows_followed_authors() {
    let app = TestApp::new().await;
    let (chef, chef_cookie) = app.signed_in("chef").await;
    let (baker, _) = app.create_user("baker").await;
    app.create_user("stranger").await;
    let (_, fan) = app.signed_in("fan").await;

    let tag = app.create_tag("Dinner", "dinner").await;
    let salt = app.create_ingredient("Salt", "g").await;
    app.create_recipe(&chef_cookie, "Soup", &[tag], &[(salt, 1)]).await;

    for id in [chef, baker] {
        app.post(&format!("/users/{id}/subscribe"), Some(&fan)).await;
    }

    let resp = app.get("/users/subscriptions", Some(&fan)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let feeds = body_json(resp).await;
    let feeds = feeds.as_array().unwrap();
    assert_eq!(feeds.len(), 2);
    assert!(feeds.iter().all(|f| f["is_subscribed"] == true));

    let chef_feed = feeds.iter().find(|f| f["id"] == chef).unwrap();
    assert_eq!(chef_feed["recipes_count"], 1);
    assert_eq!(chef_feed["recipes"][0]["name"], "Soup");

    let resp = app.get("/users/subscriptions?recipes_limit=0", Some(&fan)).await;
    let feeds = body_json(resp).await;
    assert!(feeds[0]["recipes"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn bad_recipes_limit_is_rejected() {
    let app = TestApp::new().await;
    let (_, fan) = app.signed_in("fan").await;

    let resp = app.get("/users/subscriptions?recipes_limit=-1", Some(&fan)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_author_is_not_found() {
    let app = TestApp::new().await;
    let (_, fan) = app.signed_in("fan").await;

    let resp = app.post("/users/999/subscribe", Some(&fan)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = app.delete("/users/999/subscribe", Some(&fan)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn anonymous_user_cannot_subscribe() {
    let app = TestApp::new().await;
    let (author_id, _) = app.create_user("chef").await;

    let resp = app.post(&format!("/users/{author_id}/subscribe"), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = app.get("/users/subscriptions", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
