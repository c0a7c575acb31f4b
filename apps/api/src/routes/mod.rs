pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::auth::handlers as auth;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth API
        .route("/api/auth/register", post(auth::handle_register))
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/check-username", get(auth::handle_check_username))
        .route("/api/auth/check-email", get(auth::handle_check_email))
        .route("/api/auth/validate-token", get(auth::handle_validate_token))
        // Users API
        .route("/api/users/current", get(auth::handle_current_user))
        .route("/api/users/profile", put(auth::handle_update_profile))
        .route("/api/users/password", put(auth::handle_change_password))
        // Resume API
        .route(
            "/api/resumes",
            get(resumes::handle_list_own).post(resumes::handle_create),
        )
        .route(
            "/api/resumes/me",
            get(resumes::handle_get_primary).post(resumes::handle_upsert_primary),
        )
        .route("/api/resumes/public", get(resumes::handle_list_public))
        .route("/api/resumes/named/:name", get(resumes::handle_get_by_name))
        .route(
            "/api/resumes/default-template",
            get(resumes::handle_default_template),
        )
        .route(
            "/api/resumes/:id",
            get(resumes::handle_get)
                .put(resumes::handle_update)
                .delete(resumes::handle_delete),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::clock::FixedClock;

    struct TestApp {
        router: Router,
        clock: Arc<FixedClock>,
    }

    impl TestApp {
        fn new() -> Self {
            let clock = Arc::new(FixedClock::epoch());
            let router = build_router(AppState::for_tests(clock.clone()));
            Self { router, clock }
        }

        async fn call(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut req = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let body = match body {
                Some(v) => {
                    req = req.header(header::CONTENT_TYPE, "application/json");
                    Body::from(v.to_string())
                }
                None => Body::empty(),
            };
            let resp = self
                .router
                .clone()
                .oneshot(req.body(body).unwrap())
                .await
                .unwrap();
            let status = resp.status();
            let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
                .await
                .unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }

        async fn register_and_login(&self, username: &str) -> String {
            let (status, _) = self
                .call(
                    Method::POST,
                    "/api/auth/register",
                    None,
                    Some(json!({
                        "username": username,
                        "email": format!("{username}@example.com"),
                        "password": "s3cret",
                        "fullName": username.to_uppercase()
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            let (status, body) = self
                .call(
                    Method::POST,
                    "/api/auth/login",
                    None,
                    Some(json!({"username": username, "password": "s3cret"})),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            body["token"].as_str().unwrap().to_string()
        }
    }

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new();
        let (status, body) = app.call(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_register_hides_hash_and_rejects_duplicates() {
        let app = TestApp::new();
        let payload = json!({
            "username": "ada",
            "email": "ada@example.com",
            "password": "pw",
            "fullName": "Ada"
        });
        let (status, body) = app
            .call(Method::POST, "/api/auth/register", None, Some(payload.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.get("passwordHash").is_none());
        assert_eq!(body["fullName"], "Ada");

        let (status, body) = app
            .call(Method::POST, "/api/auth/register", None, Some(payload))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "DUPLICATE_USERNAME");
    }

    #[tokio::test]
    async fn test_login_failure_is_generic() {
        let app = TestApp::new();
        app.register_and_login("ada").await;
        let (s1, b1) = app
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"username": "ada", "password": "nope"})),
            )
            .await;
        let (s2, b2) = app
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"username": "ghost", "password": "nope"})),
            )
            .await;
        assert_eq!(s1, StatusCode::UNAUTHORIZED);
        assert_eq!(s1, s2);
        assert_eq!(b1, b2);
    }

    #[tokio::test]
    async fn test_bearer_required_and_expiry() {
        let app = TestApp::new();
        let token = app.register_and_login("ada").await;

        let (status, _) = app.call(Method::GET, "/api/users/current", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = app
            .call(Method::GET, "/api/users/current", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "ada");

        app.clock.advance(chrono::Duration::hours(24));
        let (status, body) = app
            .call(Method::GET, "/api/auth/validate-token", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn test_primary_resume_flow() {
        let app = TestApp::new();
        let token = app.register_and_login("ada").await;

        let (status, _) = app
            .call(Method::GET, "/api/resumes/me", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app
            .call(
                Method::POST,
                "/api/resumes/me",
                Some(&token),
                Some(json!({"aboutMe": "x", "skills": "go"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Primary Resume");
        assert_eq!(body["skills"], json!({"content": "go"}));

        let (_, body) = app
            .call(Method::GET, "/api/resumes/me", Some(&token), None)
            .await;
        assert_eq!(body["aboutMe"], "x");
    }

    #[tokio::test]
    async fn test_resume_access_control() {
        let app = TestApp::new();
        let owner = app.register_and_login("ada").await;
        let other = app.register_and_login("bob").await;

        let (status, body) = app
            .call(
                Method::POST,
                "/api/resumes",
                Some(&owner),
                Some(json!({"name": "CV"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/api/resumes/{}", body["id"].as_str().unwrap());

        let (status, _) = app
            .call(
                Method::POST,
                "/api/resumes",
                Some(&owner),
                Some(json!({"resumeName": "CV"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app.call(Method::GET, &uri, Some(&other), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .call(Method::GET, "/api/resumes/named/CV", Some(&owner), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "CV");
        let (status, _) = app
            .call(Method::GET, "/api/resumes/named/CV", Some(&other), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .call(
                Method::PUT,
                &uri,
                Some(&owner),
                Some(json!({"isPublic": true})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app.call(Method::GET, &uri, Some(&other), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .call(
                Method::PUT,
                &uri,
                Some(&other),
                Some(json!({"aboutMe": "pwned"})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app.call(Method::DELETE, &uri, Some(&other), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, public) = app.call(Method::GET, "/api/resumes/public", None, None).await;
        assert_eq!(public.as_array().unwrap().len(), 1);

        let (status, _) = app.call(Method::DELETE, &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app.call(Method::GET, &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_profile_and_password_change() {
        let app = TestApp::new();
        let token = app.register_and_login("ada").await;
        app.register_and_login("bob").await;

        let (status, body) = app
            .call(
                Method::PUT,
                "/api/users/profile",
                Some(&token),
                Some(json!({"bio": "hello"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bio"], "hello");

        let (status, body) = app
            .call(
                Method::PUT,
                "/api/users/profile",
                Some(&token),
                Some(json!({"email": "bob@example.com"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "EMAIL_TAKEN");

        let (status, _) = app
            .call(
                Method::PUT,
                "/api/users/password",
                Some(&token),
                Some(json!({"currentPassword": "wrong", "newPassword": "n3w"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .call(
                Method::PUT,
                "/api/users/password",
                Some(&token),
                Some(json!({"currentPassword": "s3cret", "newPassword": "n3w"})),
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = app
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"username": "ada", "password": "n3w"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bad_json_body_uses_error_shape() {
        let app = TestApp::new();
        let token = app.register_and_login("ada").await;

        let (status, body) = app
            .call(
                Method::POST,
                "/api/resumes/me",
                Some(&token),
                Some(json!({"skills": 42})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"].is_string());

        let (status, body) = app
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"username": "ada"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_availability_and_template() {
        let app = TestApp::new();
        app.register_and_login("ada").await;

        let (_, body) = app
            .call(Method::GET, "/api/auth/check-username?username=ada", None, None)
            .await;
        assert_eq!(body["available"], false);
        let (_, body) = app
            .call(
                Method::GET,
                "/api/auth/check-email?email=new%40example.com",
                None,
                None,
            )
            .await;
        assert_eq!(body["available"], true);

        let (status, body) = app
            .call(Method::GET, "/api/resumes/default-template", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["skills"].is_string());
    }
}
