use axum::{
    extract::{Query, State},
    Extension, Json,
};
use prospecto_geo::AddressMatch;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct AddressSearchQuery {
    #[serde(default)]
    pub q: String,
}

/// IBGE address lookup for the map's search box. `data` is `null` when
/// nothing matched.
pub(super) async fn search_address(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<AddressSearchQuery>,
) -> Result<Json<ApiResponse<Option<AddressMatch>>>, ApiError> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "query parameter `q` must not be empty",
        ));
    }

    let found = state.address_search.search_address(q).await.map_err(|e| {
        tracing::warn!(error = %e, "address search failed");
        let code = if e.is_configuration() {
            "not_configured"
        } else {
            "upstream_error"
        };
        ApiError::new(req_id.0.clone(), code, e.to_string())
    })?;

    Ok(Json(ApiResponse {
        data: found,
        meta: ResponseMeta::new(req_id.0),
    }))
}
