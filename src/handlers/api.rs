use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{instrument, warn};

use crate::models::{AddCuisineRequest, AllCuisinesResponse, CuisineResponse};
use crate::services::CuisineService;

/// Shared application state for the cuisine endpoints
#[derive(Clone)]
pub struct ApiState {
    pub cuisine_service: Arc<CuisineService>,
    pub host_name: Arc<str>,
}

impl ApiState {
    pub fn new(cuisine_service: Arc<CuisineService>, host_name: impl Into<Arc<str>>) -> Self {
        Self {
            cuisine_service,
            host_name: host_name.into(),
        }
    }
}

/// `POST /api/add/cuisine`
#[instrument(name = "add_new_cuisine", skip(state, payload))]
pub async fn add_new_cuisine(
    State(state): State<ApiState>,
    payload: Result<Json<AddCuisineRequest>, JsonRejection>,
) -> (StatusCode, Json<CuisineResponse>) {
    let start = Instant::now();

    let mut response = match payload {
        Ok(Json(request)) => {
            CuisineResponse::from_result(state.cuisine_service.add_new_cuisine(request).await)
        }
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!(error = %rejection, "Cuisine request body over the size limit");
            CuisineResponse::failure(
                rejection.body_text(),
                "Request too large",
                StatusCode::PAYLOAD_TOO_LARGE,
            )
        }
        Err(rejection) => {
            warn!(error = %rejection, "Failed to parse cuisine request");
            CuisineResponse::failure(
                rejection.body_text(),
                "Unable to parse request",
                StatusCode::BAD_REQUEST,
            )
        }
    };

    response.message.stamp(&state.host_name, start.elapsed());
    (response.message.status_code(), Json(response))
}

/// `GET /api/all/cuisines`
#[instrument(name = "get_all_cuisines", skip(state))]
pub async fn get_all_cuisines(
    State(state): State<ApiState>,
) -> (StatusCode, Json<AllCuisinesResponse>) {
    let start = Instant::now();

    let mut response =
        AllCuisinesResponse::from_result(state.cuisine_service.get_all_cuisines().await);

    response.message.stamp(&state.host_name, start.elapsed());
    (response.message.status_code(), Json(response))
}

/// `POST /api/add/all/dishes`; dishes are only added as part of creating a cuisine
#[instrument(name = "add_all_dishes", skip(state))]
pub async fn add_all_dishes(State(state): State<ApiState>) -> (StatusCode, Json<CuisineResponse>) {
    let start = Instant::now();

    let mut response = CuisineResponse::failure(
        "adding dishes to an existing cuisine is not supported",
        "Not implemented",
        StatusCode::NOT_IMPLEMENTED,
    );

    response.message.stamp(&state.host_name, start.elapsed());
    (response.message.status_code(), Json(response))
}
