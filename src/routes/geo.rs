use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use serde::Deserialize;

use crate::{error::Result, services::geo_service, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct StateQuery {
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CityQuery {
    pub prefix: Option<String>,
}

#[axum::debug_handler]
pub async fn lookup_cep(
    State(state): State<AppState>,
    Path(cep): Path<String>,
) -> Result<impl IntoResponse> {
    let address = state.geo_service.lookup_cep(&cep).await?;
    Ok(Json(address))
}

#[axum::debug_handler]
pub async fn list_states(Query(query): Query<StateQuery>) -> impl IntoResponse {
    Json(geo_service::suggest_states(query.q.as_deref().unwrap_or_default()))
}

#[axum::debug_handler]
pub async fn list_cities(
    State(state): State<AppState>,
    Path(uf): Path<String>,
    Query(query): Query<CityQuery>,
) -> Result<impl IntoResponse> {
    let cities = state
        .geo_service
        .list_cities(&uf, query.prefix.as_deref())
        .await?;
    Ok(Json(cities))
}
