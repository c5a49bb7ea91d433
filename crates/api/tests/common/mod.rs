#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use bazaar_api::auth::jwt::JwtConfig;
use bazaar_api::auth::password::hash_password;
use bazaar_api::config::ServerConfig;
use bazaar_api::router::build_app_router;
use bazaar_api::state::AppState;
use bazaar_db::models::user::{CreateUser, User};
use bazaar_db::repositories::UserRepo;

/// Password given to every user created by [`create_user`].
pub const PASSWORD: &str = "correct horse battery";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uploads land in a per-process temp directory.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hs256".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        cookie_secure: false,
        upload_dir: std::env::temp_dir().join(format!("bazaar-uploads-{}", std::process::id())),
        public_base_url: "http://localhost:3000".to_string(),
        max_upload_bytes: 64 * 1024,
        return_window_days: 7,
    }
}

pub fn test_state(pool: PgPool) -> AppState {
    AppState {
        pool,
        config: Arc::new(test_config()),
        event_bus: Arc::new(bazaar_events::EventBus::default()),
    }
}

/// Build the production router around the given pool.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app_router(test_state(pool), &test_config())
}

pub fn upload_dir() -> PathBuf {
    test_config().upload_dir
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Insert an active user with [`PASSWORD`] directly through the repository.
pub async fn create_user(pool: &PgPool, email: &str, role: &str) -> User {
    let password_hash = hash_password(PASSWORD).expect("hashing should succeed");
    UserRepo::create(
        pool,
        &CreateUser {
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            password_hash,
            role: role.to_string(),
        },
    )
    .await
    .expect("user creation should succeed")
}

/// Log in through the API and return the access token from `Set-Cookie`.
pub async fn login(app: &Router, email: &str) -> String {
    let response = post_json(
        app,
        "/api/auth/login",
        None,
        serde_json::json!({ "email": email, "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), 200, "login should succeed for {email}");
    cookie_value(&response, "access_token").expect("login must set the access cookie")
}

/// Create a user and log them in, returning `(user, access_token)`.
pub async fn signed_in(pool: &PgPool, app: &Router, email: &str, role: &str) -> (User, String) {
    let user = create_user(pool, email, role).await;
    let token = login(app, email).await;
    (user, token)
}

/// Value of the named cookie set by a response, if any.
pub fn cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("router is infallible")
}

fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    request(method, uri, token)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, request(Method::GET, uri, token).body(Body::empty()).unwrap()).await
}

/// GET with the access token sent as a cookie instead of a Bearer header.
pub async fn get_with_cookie(app: &Router, uri: &str, token: &str) -> Response<Body> {
    let req = Request::builder()
        .uri(uri)
        .header(COOKIE, format!("access_token={token}"))
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, request(Method::DELETE, uri, token).body(Body::empty()).unwrap()).await
}

pub async fn post_empty(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, request(Method::POST, uri, token).body(Body::empty()).unwrap()).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, json_request(Method::POST, uri, token, body)).await
}

pub async fn put_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, json_request(Method::PUT, uri, token, body)).await
}

pub async fn patch_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, json_request(Method::PATCH, uri, token, body)).await
}

/// POST a multipart form where every part is a file `(field, filename, bytes)`.
pub async fn post_multipart(
    app: &Router,
    uri: &str,
    token: &str,
    parts: &[(&str, &str, &[u8])],
) -> Response<Body> {
    const BOUNDARY: &str = "bazaar-test-boundary";
    let mut body = Vec::new();
    for (field, filename, bytes) in parts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let req = request(Method::POST, uri, Some(token))
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap();
    send(app, req).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn product_body(name: &str, price: &str, stock: i32) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "description": "Hand thrown stoneware, glazed in small batches.",
        "price": price,
        "stock": stock,
        "images": ["/uploads/mug.jpg"],
        "submit": true,
    })
}

/// Create a product as `seller_token` and approve it as `admin_token`.
pub async fn approved_product(
    app: &Router,
    seller_token: &str,
    admin_token: &str,
    name: &str,
    price: &str,
    stock: i32,
) -> i64 {
    let response = post_json(
        app,
        "/api/products",
        Some(seller_token),
        product_body(name, price, stock),
    )
    .await;
    assert_eq!(response.status(), 201);
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_json(
        app,
        &format!("/api/products/{id}/review"),
        Some(admin_token),
        serde_json::json!({ "approve": true }),
    )
    .await;
    assert_eq!(response.status(), 200);
    id
}

pub fn shipping_address() -> serde_json::Value {
    serde_json::json!({
        "name": "Asha Rao",
        "phone": "+91 98765-43210",
        "line1": "12 MG Road",
        "city": "Bengaluru",
        "state": "Karnataka",
        "postal_code": "560001",
    })
}
