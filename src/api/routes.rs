//! API route definitions
//!
//! - /api/v1/sign-to-text          single-frame static prediction
//! - /api/v1/predict-frame         full pipeline with per-session history
//! - /api/v1/clear-history         reset a session's gesture buffer
//! - /api/v1/training/*            sample recording and model training
//! - /api/v1/status                models, sessions and counters

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, ApiState};

/// All `/api/v1` routes.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/sign-to-text", post(handlers::sign_to_text))
        .route("/predict-frame", post(handlers::predict_frame))
        .route("/clear-history", post(handlers::clear_history))
        .route("/training/record", post(handlers::record_sample))
        .route("/training/train-dynamic", post(handlers::train_dynamic))
        .route("/training/train-static", post(handlers::train_static))
        .route("/status", get(handlers::get_status))
        .with_state(state)
}

/// Health endpoint at root level
pub fn health_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::landmarks::{Frame, HandLandmarker, LandmarkError};
    use crate::pipeline::Recognizer;
    use crate::types::Landmark;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct NoHands;

    impl HandLandmarker for NoHands {
        fn detect(&self, _: &Frame) -> Result<Vec<Vec<Landmark>>, LandmarkError> {
            Ok(vec![])
        }
        fn describe(&self) -> String {
            "none".into()
        }
    }

    fn create_test_state() -> ApiState {
        let mut config = AppConfig::default();
        config.models.static_path = "/nonexistent/static.json".into();
        config.models.dynamic_path = "/nonexistent/dynamic.json".into();
        let recognizer = Arc::new(Recognizer::initialize(&config, Arc::new(NoHands)));
        ApiState::new(recognizer, "/nonexistent/training")
    }

    #[tokio::test]
    async fn test_status_route() {
        let app = api_routes(create_test_state());
        let resp = app
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_route() {
        let app = health_routes(create_test_state());
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_predict_frame_requires_post() {
        let app = api_routes(create_test_state());
        let resp = app
            .oneshot(Request::builder().uri("/predict-frame").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
