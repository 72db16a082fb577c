mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::*;
use reserrega_cloud::config::Environment;
use shared::account::{AccountStatus, Role};

fn login_request(email: &str, password: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(
            serde_json::json!({"email": email, "password": password}).to_string(),
        ))
        .unwrap()
}

fn session_cookie_value(response: &axum::http::Response<Body>) -> String {
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    cookie
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("reserrega_session="))
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = TestApp::new(Environment::Development);
    app.add_user("u-1", Role::Seller, AccountStatus::Active).await;

    let response = app
        .send(login_request(" U-1@Reserrega.test ", PASSWORD, "10.0.0.1"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Secure"));
    let token = session_cookie_value(&response);

    let body = body_json(response).await;
    assert_eq!(body["user_id"], "u-1");
    assert_eq!(body["company_id"], COMPANY);
    assert_eq!(body["role"], "seller");
    assert_eq!(body["token"], token.as_str());

    let me = app.send(get("/api/store/overview", Some(&token))).await;
    assert_eq!(me.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_production_cookie_is_secure() {
    let app = TestApp::new(Environment::Production);
    app.add_user("u-1", Role::Admin, AccountStatus::Active).await;

    let response = app
        .send(login_request("u-1@reserrega.test", PASSWORD, "10.0.0.1"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.ends_with("; Secure"));
}

#[tokio::test]
async fn test_wrong_password_rejected() {
    let app = TestApp::new(Environment::Development);
    app.add_user("u-1", Role::Admin, AccountStatus::Active).await;

    let response = app
        .send(login_request("u-1@reserrega.test", "wrong", "10.0.0.1"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], 1002);

    let unknown = app
        .send(login_request("ghost@reserrega.test", PASSWORD, "10.0.0.1"))
        .await;
    assert_eq!(body_json(unknown).await["code"], 1002);
}

#[tokio::test]
async fn test_inactive_account_cannot_login() {
    let app = TestApp::new(Environment::Development);
    app.add_user("u-1", Role::Admin, AccountStatus::Inactive).await;

    let response = app
        .send(login_request("u-1@reserrega.test", PASSWORD, "10.0.0.1"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], 1007);
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let app = TestApp::new(Environment::Development);
    let user = app.add_user("u-1", Role::Buyer, AccountStatus::Active).await;
    let token = token_for(&user);

    let logout = app
        .send(json_request("POST", "/api/auth/logout", Some(&token), &serde_json::json!({})))
        .await;
    assert_eq!(logout.status(), StatusCode::OK);
    assert!(clears_cookie(logout.headers()));

    let after = app.send(get("/api/subscription", Some(&token))).await;
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_session_still_clears_cookie() {
    let app = TestApp::new(Environment::Development);
    let response = app
        .send(json_request("POST", "/api/auth/logout", None, &serde_json::json!({})))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(clears_cookie(response.headers()));
}

#[tokio::test]
async fn test_login_rate_limited_per_ip() {
    let app = TestApp::new(Environment::Development);
    app.add_user("u-1", Role::Admin, AccountStatus::Active).await;

    for _ in 0..5 {
        let response = app
            .send(login_request("u-1@reserrega.test", "wrong", "192.0.2.7"))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let limited = app
        .send(login_request("u-1@reserrega.test", PASSWORD, "192.0.2.7"))
        .await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(limited).await["code"], 1008);

    let other_ip = app
        .send(login_request("u-1@reserrega.test", PASSWORD, "192.0.2.8"))
        .await;
    assert_eq!(other_ip.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_store_error_detail_depends_on_environment() {
    let dev = TestApp::new(Environment::Development);
    dev.store.fail_user_lookups(true);
    let response = dev
        .send(login_request("u-1@reserrega.test", PASSWORD, "10.0.0.1"))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["code"], 9001);
    assert_eq!(body["message"], "user lookup unavailable");

    let prod = TestApp::new(Environment::Production);
    prod.store.fail_user_lookups(true);
    let response = prod
        .send(login_request("u-1@reserrega.test", PASSWORD, "10.0.0.1"))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["message"], "Internal server error");
}
