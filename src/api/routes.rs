//! HTTP API route definitions.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{country, diagnostics, species, AppState};

/// Create the API router.
///
/// Paths match exactly as declared, trailing slash included.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/conservation/v1/country/:country_identifier", get(country))
        .route("/conservation/v1/species/:species_key", get(species))
        .route("/conservation/v1/diag/", get(diagnostics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn offline_state() -> AppState {
        let config = Config::with_upstreams(8080, "http://127.0.0.1:9", "http://127.0.0.1:9");
        AppState::new(&config).unwrap()
    }

    #[tokio::test]
    async fn diag_endpoint_returns_ok_with_upstreams_down() {
        let app = create_router(offline_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/conservation/v1/diag/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn diag_without_trailing_slash_is_not_found() {
        let app = create_router(offline_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/conservation/v1/diag")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_numeric_species_key_is_bad_request() {
        let app = create_router(offline_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/conservation/v1/species/abies")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn post_is_method_not_allowed() {
        let app = create_router(offline_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/conservation/v1/species/2476674")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn unreachable_occurrence_search_is_bad_gateway() {
        let app = create_router(offline_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/conservation/v1/country/NO?limit=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn unreachable_species_upstream_is_bad_gateway() {
        let app = create_router(offline_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/conservation/v1/species/2476674")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
