//! Company search
//!
//! Public directory search by keyword, name, industry or offered service.

use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::companies::{find_companies, CompanyFilter};
use crate::api::ApiQuery;
use crate::app::AppState;
use crate::domain::SearchQuery;
use crate::error::ApiResult;

/// GET /search
pub async fn search_companies(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let query = query.normalized();
    let pagination = query.pagination();

    tracing::debug!(
        q = ?query.q,
        name = ?query.name,
        industry = ?query.industry,
        service = ?query.service,
        "Searching companies"
    );

    let filter = CompanyFilter {
        name: query.name,
        industry: query.industry,
        user_id: None,
        service: query.service,
        keyword: query.q,
    };

    let page = find_companies(&state.db, filter, &pagination).await?;
    Ok(Json(page))
}
