#![allow(dead_code)]

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use foodgram::config::Config;

pub const PASSWORD: &str = "correct-horse-battery";

/// 1x1 transparent GIF as a data URI.
pub const GIF: &str = "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    pub media_root: PathBuf,
}

impl TestApp {
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let media_root =
            std::env::temp_dir().join(format!("foodgram-test-{}", uuid::Uuid::new_v4()));
        let config = Config {
            database_url: "sqlite::memory:".into(),
            host: "127.0.0.1".into(),
            port: 0,
            media_root: media_root.clone(),
            secure_cookies: false,
        };

        let router = foodgram::build_app(pool.clone(), &config)
            .await
            .expect("Failed to build app");

        Self {
            router,
            db: pool,
            media_root,
        }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Create a user in the database and return (user_id, email).
    pub async fn create_user(&self, username: &str) -> (i64, String) {
        static HASH: OnceLock<String> = OnceLock::new();
        let hash = HASH.get_or_init(|| foodgram::auth::hash_password(PASSWORD).unwrap());
        let email = format!("{username}@example.com");

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (email, username, first_name, last_name, password_hash, is_staff, created_at)
            VALUES (?, ?, ?, ?, ?, 0, ?)
            RETURNING id
            "#,
        )
        .bind(&email)
        .bind(username)
        .bind("Test")
        .bind(username)
        .bind(hash)
        .bind(chrono::Utc::now().to_rfc3339())
        .fetch_one(&self.db)
        .await
        .expect("Failed to create test user");

        (id, email)
    }

    pub async fn make_staff(&self, user_id: i64) {
        sqlx::query("UPDATE users SET is_staff = 1 WHERE id = ?")
            .bind(user_id)
            .execute(&self.db)
            .await
            .unwrap();
    }

    /// Log in and return the session cookie string.
    pub async fn login(&self, email: &str) -> String {
        let resp = self
            .post_json("/auth/login", &json!({ "email": email, "password": PASSWORD }), None)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        resp.headers()
            .get("set-cookie")
            .expect("Login should set a session cookie")
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    /// Create a user, log them in, and return (user_id, cookie).
    pub async fn signed_in(&self, username: &str) -> (i64, String) {
        let (id, email) = self.create_user(username).await;
        let cookie = self.login(&email).await;
        (id, cookie)
    }

    pub async fn create_tag(&self, name: &str, slug: &str) -> i64 {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags")
            .fetch_one(&self.db)
            .await
            .unwrap();
        foodgram::cli::create_tag(&self.db, name, &format!("#{:06X}", count + 1), slug)
            .await
            .expect("Failed to create tag")
    }

    pub async fn create_ingredient(&self, name: &str, unit: &str) -> i64 {
        foodgram::models::ingredient::insert(&self.db, name, unit)
            .await
            .expect("Failed to create ingredient")
            .expect("Ingredient already exists")
    }

    /// Create a recipe through the API and return its id.
    pub async fn create_recipe(
        &self,
        cookie: &str,
        name: &str,
        tags: &[i64],
        ingredients: &[(i64, i64)],
    ) -> i64 {
        let resp = self
            .post_json("/recipes", &recipe_body(name, tags, ingredients), Some(cookie))
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await["id"].as_i64().unwrap()
    }

    pub async fn count(&self, sql: &str) -> i64 {
        sqlx::query_scalar(sql).fetch_one(&self.db).await.unwrap()
    }

    /// Send a GET request with an optional session cookie.
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send("GET", uri, None, cookie).await
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send("POST", uri, None, cookie).await
    }

    pub async fn post_json(&self, uri: &str, body: &Value, cookie: Option<&str>) -> Response {
        self.send("POST", uri, Some(body), cookie).await
    }

    pub async fn patch_json(&self, uri: &str, body: &Value, cookie: Option<&str>) -> Response {
        self.send("PATCH", uri, Some(body), cookie).await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send("DELETE", uri, None, cookie).await
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<&Value>,
        cookie: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().uri(uri).method(method);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.request(req).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.media_root).ok();
    }
}

pub fn recipe_body(name: &str, tags: &[i64], ingredients: &[(i64, i64)]) -> Value {
    json!({
        "name": name,
        "text": format!("How to make {name}"),
        "cooking_time": 15,
        "image": GIF,
        "tags": tags,
        "ingredients": ingredients
            .iter()
            .map(|(id, amount)| json!({ "id": id, "amount": amount }))
            .collect::<Vec<_>>(),
    })
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(resp: Response) -> Value {
    serde_json::from_str(&body_string(resp).await).unwrap()
}
