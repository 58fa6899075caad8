use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use serde::Serialize;

use crate::data::filter::nurses_in_city;
use crate::data::model::NurseRecord;
use crate::error::ApiError;
use crate::state::SharedState;

pub const GREETING: &str = "مرحباً بك في نظام ترشيح الممرضين";

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub data_loaded: bool,
}

/// GET / - liveness and whether a dataset is loaded
pub async fn root(State(state): State<SharedState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running",
        message: GREETING,
        data_loaded: state.store.is_loaded().await,
    })
}

/// GET /nurses/{city} - nurses in a city, best score first
pub async fn nurses_by_city(
    State(state): State<SharedState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<NurseRecord>>, ApiError> {
    let Path(city) = path?;
    let dataset = state
        .store
        .snapshot_or_reload()
        .await
        .ok_or(ApiError::DataUnavailable)?;

    let nurses = nurses_in_city(&dataset, &city)?;
    if nurses.is_empty() {
        return Err(ApiError::CityNotFound(city));
    }
    log::debug!("{} nurses found for {city:?}", nurses.len());

    Ok(Json(nurses))
}

pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
