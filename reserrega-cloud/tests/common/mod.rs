#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, Response, StatusCode, header};
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use reserrega_cloud::api;
use reserrega_cloud::auth::session;
use reserrega_cloud::clock::FixedClock;
use reserrega_cloud::config::{Config, Environment};
use reserrega_cloud::state::AppState;
use reserrega_cloud::store::{MemoryStore, ResourceRecord, Store, UserRecord};
use reserrega_cloud::util::hash_password;
use shared::account::{AccountStatus, Role};
use shared::billing::{PlanType, ResourceType, Subscription, SubscriptionStatus};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-jwt-secret";
pub const WEBHOOK_SECRET: &str = "whsec_integration";
pub const PASSWORD: &str = "hunter2-but-longer";
pub const COMPANY: &str = "company-1";

/// Wall clock of every test app
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap()
}

pub fn config(environment: Environment) -> Config {
    Config {
        database_url: "postgres://unused".into(),
        http_port: 0,
        environment,
        jwt_secret: JWT_SECRET.into(),
        session_ttl_hours: 24,
        stripe_webhook_secret: WEBHOOK_SECRET.into(),
        stripe_pro_price_id: "price_pro".into(),
        stripe_enterprise_price_id: "price_enterprise".into(),
        multi_tenant: true,
        billing_enabled: true,
    }
}

pub struct TestApp {
    pub store: MemoryStore,
    pub router: Router,
}

impl TestApp {
    pub fn new(environment: Environment) -> Self {
        Self::with_config(config(environment))
    }

    pub fn with_config(config: Config) -> Self {
        let store = MemoryStore::new();
        let state = AppState::with_store(
            &config,
            Arc::new(store.clone()),
            Arc::new(FixedClock(t0())),
        );
        Self {
            store,
            router: api::create_router(state),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn add_user(&self, id: &str, role: Role, status: AccountStatus) -> UserRecord {
        let user = UserRecord {
            id: id.into(),
            company_id: COMPANY.into(),
            email: format!("{id}@reserrega.test"),
            hashed_password: hash_password(PASSWORD).unwrap(),
            role,
            status,
        };
        self.store.insert_user(user.clone()).await;
        user
    }

    pub async fn set_subscription(&self, plan: PlanType, status: SubscriptionStatus) {
        self.store
            .save_subscription(&Subscription {
                company_id: COMPANY.into(),
                plan,
                status,
                provider_subscription_id: None,
                current_period_end: None,
                updated_at: t0().timestamp_millis(),
            })
            .await
            .unwrap();
    }

    pub async fn add_resources(&self, resource_type: ResourceType, count: i64) {
        for n in 0..count {
            self.store
                .create_resource(&ResourceRecord {
                    id: format!("{}-{n}", resource_type.as_db()),
                    company_id: COMPANY.into(),
                    resource_type,
                    name: format!("{} {n}", resource_type.as_db()),
                    active: true,
                    created_at: n,
                })
                .await
                .unwrap();
        }
    }
}

pub fn token_for(user: &UserRecord) -> String {
    session::create_token(&user.id, &user.company_id, user.role, JWT_SECRET, 24)
        .unwrap()
        .0
}

pub fn get(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("{}={token}", session::SESSION_COOKIE));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(
    method: &str,
    path: &str,
    token: Option<&str>,
    body: &serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// True when the response clears the session cookie
pub fn clears_cookie(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|c| c.starts_with("reserrega_session=;") && c.contains("Max-Age=0"))
}

pub fn assert_redirect(response: &Response<Body>, to: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(response), Some(to));
}
