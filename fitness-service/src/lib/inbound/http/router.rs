use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::change_password::change_password;
use super::handlers::create_user::create_user;
use super::handlers::delete_user::delete_user;
use super::handlers::forgot_password::forgot_password;
use super::handlers::get_user::get_user;
use super::handlers::login::login;
use super::handlers::me::me;
use super::handlers::reset_password::reset_password;
use super::handlers::update_user::update_user;
use super::middleware::authenticate as auth_middleware;
use crate::account::ports::AccountServicePort;
use crate::domain::user::ports::UserServicePort;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServicePort>,
    pub account_service: Arc<dyn AccountServicePort>,
}

pub fn create_router(
    user_service: Arc<dyn UserServicePort>,
    account_service: Arc<dyn AccountServicePort>,
) -> Router {
    let state = AppState {
        user_service,
        account_service,
    };

    let public_routes = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/users", post(create_user));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/users/me/password", put(change_password))
        .route(
            "/api/users/:user_id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            // Headers are left out: they carry bearer tokens.
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use auth::AuthSettings;
    use auth::PasswordHasher;
    use axum::http::header;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::*;
    use crate::account::service::AccountService;
    use crate::domain::user::service::UserService;
    use crate::outbound::notifications::LogResetMailer;
    use crate::outbound::repositories::InMemoryResetLedger;
    use crate::outbound::repositories::InMemoryUserRepository;

    fn router() -> Router {
        let settings =
            AuthSettings::with_defaults(b"router-test-secret-at-least-32-bytes".to_vec()).unwrap();
        let hasher = PasswordHasher::with_work_factor(8, 1, 1).unwrap();
        let repository = Arc::new(InMemoryUserRepository::new());

        let user_service =
            Arc::new(UserService::new(Arc::clone(&repository)).with_hasher(hasher.clone()));
        let account_service = Arc::new(
            AccountService::new(
                &settings,
                repository,
                Arc::new(LogResetMailer::new()),
                Arc::new(InMemoryResetLedger::new()),
            )
            .with_hasher(hasher),
        );

        create_router(user_service, account_service)
    }

    #[tokio::test]
    async fn test_protected_route_requires_bearer_token() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE),
            Some(&header::HeaderValue::from_static("Bearer"))
        );
    }

    #[tokio::test]
    async fn test_protected_route_rejects_garbage_token() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/me")
                    .header(header::AUTHORIZATION, "Bearer not.a.token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/api/workouts")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
