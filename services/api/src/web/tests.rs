//! Router-level tests over the in-memory store with canned collaborators.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use lexvault_core::domain::{
    Advisory, AdvisoryExchange, Extraction, ExtractionDraft, PlatformStats, ReadinessStatus,
    RiskAssessment, SigningReadiness, SupportMessage, VerificationEmail,
};
use lexvault_core::{
    AdminAdvisoryService, AdvisoryService, ExtractionRequest, ExtractionService, MailService,
    MemoryStore, PortResult, Store, SupportService, WorkspacePolicy, WorkspaceServices,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use super::{router, AppState};
use crate::config::Config;

struct Canned;

#[async_trait]
impl ExtractionService for Canned {
    async fn extract(&self, request: &ExtractionRequest) -> PortResult<ExtractionDraft> {
        Ok(ExtractionDraft {
            title: format!("Review of {}", request.filename),
            document_type: "Services Agreement".to_string(),
            has_substantive_content: true,
            extraction: Extraction {
                clauses: vec!["Term of 24 months".to_string()],
                ..Extraction::default()
            },
        })
    }
}

#[async_trait]
impl AdvisoryService for Canned {
    async fn advise(&self, _extraction: &Extraction) -> PortResult<Advisory> {
        Ok(Advisory {
            executive_signals: vec!["Long lock-in".to_string()],
            readers_miss: vec![],
            scenarios: vec![],
            risks: RiskAssessment {
                level: "Medium".to_string(),
                details: "Renewal is automatic.".to_string(),
                flags: vec![],
            },
            leverage: vec![],
            signing_readiness: SigningReadiness {
                status: ReadinessStatus::Caution,
                justification: "Negotiate the renewal clause.".to_string(),
            },
            professional_questions: vec![],
        })
    }
}

#[async_trait]
impl SupportService for Canned {
    async fn support_reply(&self, _history: &[SupportMessage], _message: &str) -> PortResult<String> {
        Ok("Upload a document to begin.".to_string())
    }
}

#[async_trait]
impl AdminAdvisoryService for Canned {
    async fn admin_advisory(
        &self,
        _query: &str,
        stats: &PlatformStats,
        _history: &[AdvisoryExchange],
    ) -> PortResult<String> {
        Ok(format!("{} users", stats.total_users))
    }
}

#[async_trait]
impl MailService for Canned {
    async fn send_verification(&self, _email: &VerificationEmail) -> PortResult<()> {
        Ok(())
    }
}

fn app_state(tweak: impl FnOnce(&mut WorkspacePolicy)) -> Arc<AppState> {
    let config = Config::from_lookup(|key| match key {
        "OPENAI_API_KEY" => Some("test".to_string()),
        _ => None,
    })
    .unwrap();
    let mut policy = config.policy();
    tweak(&mut policy);
    let canned = Arc::new(Canned);
    let services = WorkspaceServices {
        store: Store::new(Arc::new(MemoryStore::new())),
        extraction: canned.clone(),
        advisory: canned.clone(),
        support: canned.clone(),
        admin_advisor: canned.clone(),
        mail: canned,
        policy: Arc::new(policy),
    };
    Arc::new(AppState::new(Arc::new(config), services))
}

fn app() -> Router {
    router(app_state(|_| {}))
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

async fn signup(app: &Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            None,
            json!({ "email": email, "name": "Ada Counsel", "role": "Attorney" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

fn multipart_upload(cookie: &str, name: &str, content: &str) -> Request<Body> {
    let boundary = "lexvault-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{n}\"\r\nContent-Type: text/plain\r\n\r\n{c}\r\n--{b}--\r\n",
        b = boundary,
        n = name,
        c = content
    );
    Request::builder()
        .method("POST")
        .uri("/documents")
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn protected_routes_require_a_session_cookie() {
    let app = app();
    let response = app
        .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["success"], json!(false));
}

#[tokio::test]
async fn duplicate_signup_is_a_conflict() {
    let app = app();
    signup(&app, "ada@counsel.test").await;
    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            None,
            json!({ "email": "ADA@counsel.test", "name": "Ada Again", "role": "Other" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn a_document_moves_through_review_and_approval() {
    let app = app();
    let cookie = signup(&app, "ada@counsel.test").await;

    let response = app
        .clone()
        .oneshot(multipart_upload(&cookie, "msa.txt", "The parties agree to a 24 month term."))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["name"], json!("msa.txt"));

    let response = app
        .clone()
        .oneshot(json_request("POST", "/brief/approve", Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/brief/review", Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["phase"], json!("stage1_complete"));
    assert_eq!(body["brief"]["title"], json!("Review of msa.txt"));

    let response = app
        .clone()
        .oneshot(json_request("POST", "/brief/approve", Some(&cookie), json!({})))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["phase"], json!("stage2_complete"));
    assert_eq!(body["brief"]["isApproved"], json!(true));
}

#[tokio::test]
async fn members_are_forbidden_from_admin_routes() {
    let app = app();
    let cookie = signup(&app, "ada@counsel.test").await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/stats")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn logout_invalidates_the_cookie() {
    let app = app();
    let cookie = signup(&app, "ada@counsel.test").await;
    let response = app
        .clone()
        .oneshot(json_request("POST", "/auth/logout", Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request("GET", "/me", Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn vault_pin_setup_then_locked_listing() {
    let app = app();
    let cookie = signup(&app, "ada@counsel.test").await;
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/vault/pin",
            Some(&cookie),
            json!({ "pin": "2468", "confirmation": "2468" }),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["step"], json!("complete"));

    app.clone()
        .oneshot(json_request("POST", "/vault/lock", Some(&cookie), json!({})))
        .await
        .unwrap();
    let response = app
        .clone()
        .oneshot(json_request("GET", "/vault/briefs", Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(json_request(
            "POST",
            "/vault/unlock",
            Some(&cookie),
            json!({ "pin": "1111" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn idle_workspaces_are_swept_from_the_cache() {
    let state = app_state(|policy| policy.inactivity_limit = chrono::Duration::zero());
    let app = router(state.clone());
    let cookie = signup(&app, "ada@counsel.test").await;
    signup(&app, "ben@counsel.test").await;
    assert_eq!(state.live_sessions().await, 2);

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    assert_eq!(state.sweep_idle().await, 2);
    assert_eq!(state.live_sessions().await, 0);

    let response = app
        .oneshot(json_request("GET", "/me", Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn active_workspaces_survive_a_sweep() {
    let state = app_state(|_| {});
    let app = router(state.clone());
    signup(&app, "ada@counsel.test").await;
    assert_eq!(state.sweep_idle().await, 0);
    assert_eq!(state.live_sessions().await, 1);
}
