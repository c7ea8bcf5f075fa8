pub mod api;
pub mod health;
pub mod metrics;
pub mod middleware;

pub use api::*;
pub use health::*;
pub use metrics::*;
pub use middleware::*;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};

use crate::config::ServerConfig;
use crate::observability::{observability_middleware, Metrics};
use crate::services::CuisineService;

/// Build the application router with every route and middleware layer
pub fn create_app(
    cuisine_service: Arc<CuisineService>,
    metrics: Arc<Metrics>,
    server: &ServerConfig,
) -> Router {
    let metrics_for_middleware = metrics.clone();
    let max_request_size = server.max_request_size;

    let api_state = ApiState::new(cuisine_service, server.host_name.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::HEAD])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
        .route("/api/health", get(health_check))
        .route("/api/all/cuisines", get(get_all_cuisines))
        .route("/api/add/cuisine", post(add_new_cuisine))
        .route("/api/add/all/dishes", post(add_all_dishes))
        .with_state(api_state)
        // Last layer added runs first
        .layer(DefaultBodyLimit::max(max_request_size))
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(axum_middleware::from_fn(move |req, next| {
            request_validation_middleware(max_request_size, req, next)
        }))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(axum_middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AllCuisinesResponse, Cuisine, CuisineResponse, RepositoryError};
    use crate::repositories::cuisine_repository::MockTestCuisineRepository;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn server_config() -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 6080,
            request_timeout_seconds: 5,
            max_request_size: 1024 * 1024,
            host_name: "test-host".to_string(),
        }
    }

    fn app(mock_repo: MockTestCuisineRepository) -> Router {
        app_with_config(mock_repo, &server_config())
    }

    fn app_with_config(mock_repo: MockTestCuisineRepository, server: &ServerConfig) -> Router {
        let metrics = Arc::new(Metrics::new().unwrap());
        let service = Arc::new(CuisineService::new(Arc::new(mock_repo)).with_metrics(metrics.clone()));
        create_app(service, metrics, server)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(MockTestCuisineRepository::new())
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
            "nosniff"
        );
        let body: Value = body_json(response).await;
        assert_eq!(body, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_add_italian_cuisine_with_pizza() {
        let mut mock_repo = MockTestCuisineRepository::new();
        mock_repo.expect_exists_by_name().returning(|_| Ok(false));
        mock_repo
            .expect_insert_cuisine()
            .returning(|_| Ok("64b7f0c2".to_string()));
        mock_repo
            .expect_insert_dishes()
            .returning(|_, dishes| Ok((0..dishes.len()).map(|i| format!("dish-{}", i)).collect()));
        mock_repo
            .expect_set_cuisine_dishes()
            .times(1)
            .returning(|_, _| Ok(()));

        let response = app(mock_repo)
            .oneshot(post_json(
                "/api/add/cuisine",
                json!({"name": "Italian", "dishes": [{"name": "Pizza"}]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: CuisineResponse = body_json(response).await;
        let cuisine = body.cuisine.unwrap();
        assert!(!cuisine.id.is_empty());
        assert_eq!(cuisine.dishes.len(), 1);
        assert_eq!(cuisine.dishes[0].name, "Pizza");
        assert_eq!(cuisine.dishes[0].cuisine, cuisine.id);
        assert_eq!(body.message.status, "200");
        assert_eq!(body.message.host_name, "test-host");
        assert!(!body.message.time_taken.is_empty());
        assert!(body.message.error_log.is_empty());
    }

    #[tokio::test]
    async fn test_add_cuisine_empty_name() {
        let mut mock_repo = MockTestCuisineRepository::new();
        mock_repo.expect_exists_by_name().never();
        mock_repo.expect_insert_cuisine().never();

        let response = app(mock_repo)
            .oneshot(post_json("/api/add/cuisine", json!({"name": ""})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = body_json(response).await;
        assert_eq!(body["Cuisine"], Value::Null);
        assert_eq!(body["Message"]["Status"], "400");
        assert_eq!(body["Message"]["ErrorLog"][0]["RootCause"], "Validation error");
        assert_eq!(
            body["Message"]["ErrorLog"][0]["Trace"],
            "missing params for database insert"
        );
    }

    #[tokio::test]
    async fn test_add_cuisine_null_lists() {
        let mut mock_repo = MockTestCuisineRepository::new();
        mock_repo.expect_exists_by_name().returning(|_| Ok(false));
        mock_repo
            .expect_insert_cuisine()
            .withf(|cuisine| cuisine.name == "Italian" && cuisine.tags.is_empty())
            .returning(|_| Ok("64b7f0c2".to_string()));
        mock_repo.expect_insert_dishes().never();
        mock_repo.expect_set_cuisine_dishes().never();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/add/cuisine")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Italian","dishes":null,"tags":null}"#))
            .unwrap();

        let response = app(mock_repo).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: CuisineResponse = body_json(response).await;
        let cuisine = body.cuisine.unwrap();
        assert_eq!(cuisine.id, "64b7f0c2");
        assert!(cuisine.dishes.is_empty());
    }

    #[tokio::test]
    async fn test_add_cuisine_oversized_body_without_content_length() {
        let mut mock_repo = MockTestCuisineRepository::new();
        mock_repo.expect_exists_by_name().never();
        mock_repo.expect_insert_cuisine().never();

        let server = ServerConfig {
            max_request_size: 1024,
            ..server_config()
        };
        let padding = "a".repeat(2048);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/add/cuisine")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"name": padding}).to_string()))
            .unwrap();
        assert!(request.headers().get(header::CONTENT_LENGTH).is_none());

        let response = app_with_config(mock_repo, &server)
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body: CuisineResponse = body_json(response).await;
        assert!(body.cuisine.is_none());
        assert_eq!(body.message.error_log[0].root_cause, "Request too large");
    }

    #[tokio::test]
    async fn test_add_cuisine_malformed_body() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/add/cuisine")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap();

        let response = app(MockTestCuisineRepository::new())
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: CuisineResponse = body_json(response).await;
        assert_eq!(body.message.error_log[0].root_cause, "Unable to parse request");
    }

    #[tokio::test]
    async fn test_add_cuisine_duplicate_is_insertion_error() {
        let mut mock_repo = MockTestCuisineRepository::new();
        mock_repo.expect_exists_by_name().returning(|_| Ok(true));
        mock_repo.expect_insert_cuisine().never();

        let response = app(mock_repo)
            .oneshot(post_json("/api/add/cuisine", json!({"name": "Italian"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: CuisineResponse = body_json(response).await;
        assert_eq!(body.message.error_log[0].root_cause, "Insertion error");
        assert_eq!(
            body.message.error_log[0].trace,
            "Italian already exists in the database"
        );
    }

    #[tokio::test]
    async fn test_get_all_cuisines_sets_count() {
        let mut mock_repo = MockTestCuisineRepository::new();
        mock_repo.expect_find_all().returning(|| {
            Ok(vec![
                Cuisine {
                    id: "1".to_string(),
                    name: "Italian".to_string(),
                    ..Default::default()
                },
                Cuisine {
                    id: "2".to_string(),
                    name: "Thai".to_string(),
                    ..Default::default()
                },
            ])
        });

        let response = app(mock_repo)
            .oneshot(
                Request::builder()
                    .uri("/api/all/cuisines")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: AllCuisinesResponse = body_json(response).await;
        assert_eq!(body.cuisines.unwrap().len(), 2);
        assert_eq!(body.message.count, 2);
    }

    #[tokio::test]
    async fn test_get_all_cuisines_storage_error() {
        let mut mock_repo = MockTestCuisineRepository::new();
        mock_repo.expect_find_all().returning(|| {
            Err(RepositoryError::TableNotFound {
                table_name: "Cuisines".to_string(),
            })
        });

        let response = app(mock_repo)
            .oneshot(
                Request::builder()
                    .uri("/api/all/cuisines")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: AllCuisinesResponse = body_json(response).await;
        assert!(body.cuisines.is_none());
        assert_eq!(body.message.error_log[0].root_cause, "FindAll error");
    }

    #[tokio::test]
    async fn test_add_all_dishes_not_implemented() {
        let mut mock_repo = MockTestCuisineRepository::new();
        mock_repo.expect_insert_dishes().never();

        let response = app(mock_repo)
            .oneshot(post_json(
                "/api/add/all/dishes",
                json!({"cuisine": "1", "dishes": [{"name": "Pho"}]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let request = Request::builder()
            .uri("/api/health")
            .header(header::ORIGIN, "http://example.com")
            .body(Body::empty())
            .unwrap();

        let response = app(MockTestCuisineRepository::new())
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_metrics_endpoint_counts_requests() {
        let app = app(MockTestCuisineRepository::new());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains(r#"endpoint="/api/health""#));
    }
}
