//! Tender routes
//!
//! Tenders are posted by a company and mutated only by that company's owner.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::applications::{find_applications, ApplicationFilter};
use super::companies::company_owner;
use crate::api::{
    ApiJson, ApiPath, ApiQuery, DataResponse, MessageResponse, Paginated, PaginationParams,
};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::db::like_pattern;
use crate::domain::{
    ApplicationQuery, CreateTenderRequest, DeleteQuery, TenderQuery, TenderResponse,
    UpdateTenderRequest,
};
use crate::error::{ApiError, ApiResult};

/// Database row for tender, joined with its company and application count
#[derive(Debug, sqlx::FromRow)]
struct TenderRow {
    id: Uuid,
    company_id: Uuid,
    company_name: String,
    title: String,
    description: Option<String>,
    deadline: NaiveDate,
    budget: Option<Decimal>,
    application_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TenderRow> for TenderResponse {
    fn from(row: TenderRow) -> Self {
        let today = Utc::now().date_naive();
        Self {
            id: row.id,
            company_id: row.company_id,
            company_name: row.company_name,
            title: row.title,
            description: row.description,
            deadline: row.deadline,
            budget: row.budget,
            is_open: row.deadline >= today,
            application_count: row.application_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const TENDER_SELECT: &str = r#"
    SELECT t.id, t.company_id, c.name AS company_name, t.title, t.description,
           t.deadline, t.budget,
           (SELECT COUNT(*) FROM applications a WHERE a.tender_id = t.id) AS application_count,
           t.created_at, t.updated_at
    FROM tenders t
    JOIN companies c ON c.id = t.company_id
"#;

const TENDER_FILTER: &str = r#"
    WHERE ($1::uuid IS NULL OR t.company_id = $1)
    AND ($2::text IS NULL OR t.title ILIKE $2 OR t.description ILIKE $2)
    AND ($3::bool = false OR t.deadline >= CURRENT_DATE)
"#;

async fn fetch_tender(db: &PgPool, tender_id: Uuid) -> ApiResult<TenderRow> {
    sqlx::query_as::<_, TenderRow>(&format!("{} WHERE t.id = $1", TENDER_SELECT))
        .bind(tender_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Tender not found"))
}

async fn find_tenders(
    db: &PgPool,
    query: &TenderQuery,
    pagination: &PaginationParams,
) -> ApiResult<Paginated<TenderResponse>> {
    let keyword = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(like_pattern);
    let open_only = query.open_only.unwrap_or(false);

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM tenders t {}",
        TENDER_FILTER
    ))
    .bind(query.company_id)
    .bind(&keyword)
    .bind(open_only)
    .fetch_one(db)
    .await?;

    let rows = sqlx::query_as::<_, TenderRow>(&format!(
        "{} {} ORDER BY t.deadline ASC, t.created_at DESC LIMIT $4 OFFSET $5",
        TENDER_SELECT, TENDER_FILTER
    ))
    .bind(query.company_id)
    .bind(&keyword)
    .bind(open_only)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(db)
    .await?;

    let data: Vec<TenderResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Paginated::new(data, pagination, total as u64))
}

/// 404 for unknown tenders, 403 unless `user_id` owns the posting company
async fn ensure_tender_owner(db: &PgPool, tender_id: Uuid, user_id: Uuid) -> ApiResult<()> {
    let owner: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT c.user_id FROM tenders t
        JOIN companies c ON c.id = t.company_id
        WHERE t.id = $1
        "#,
    )
    .bind(tender_id)
    .fetch_optional(db)
    .await?;

    match owner {
        None => Err(ApiError::not_found("Tender not found")),
        Some(owner) if owner != user_id => Err(ApiError::forbidden(
            "Only the owner of the posting company can manage this tender",
        )),
        Some(_) => Ok(()),
    }
}

/// POST /tender
///
/// Post a tender on behalf of one of the caller's companies.
pub async fn create_tender(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateTenderRequest>,
) -> ApiResult<impl IntoResponse> {
    let req = req.validate(Utc::now().date_naive())?;

    match company_owner(&state.db, req.company_id).await? {
        None => return Err(ApiError::referential("Company does not exist")),
        Some(owner) if owner != auth.user_id => {
            return Err(ApiError::forbidden(
                "Tenders can only be posted by the company owner",
            ))
        }
        Some(_) => {}
    }

    tracing::info!(
        user_id = %auth.user_id,
        company_id = %req.company_id,
        title = %req.title,
        deadline = %req.deadline,
        "Creating tender"
    );

    let tender_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO tenders (company_id, title, description, deadline, budget)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(req.company_id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.deadline)
    .bind(req.budget)
    .fetch_one(&state.db)
    .await?;

    let response: TenderResponse = fetch_tender(&state.db, tender_id).await?.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /tender
///
/// List tenders, soonest deadline first.
pub async fn list_tenders(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<TenderQuery>,
) -> ApiResult<impl IntoResponse> {
    let pagination = query.pagination();
    let page = find_tenders(&state.db, &query, &pagination).await?;
    Ok(Json(page))
}

/// GET /company/:company_id/tenders
pub async fn list_company_tenders(
    State(state): State<Arc<AppState>>,
    ApiPath(company_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<TenderQuery>,
) -> ApiResult<impl IntoResponse> {
    if company_owner(&state.db, company_id).await?.is_none() {
        return Err(ApiError::not_found("Company not found"));
    }

    let query = TenderQuery {
        company_id: Some(company_id),
        ..query
    };
    let pagination = query.pagination();
    let page = find_tenders(&state.db, &query, &pagination).await?;
    Ok(Json(page))
}

/// GET /tender/:tender_id
pub async fn get_tender(
    State(state): State<Arc<AppState>>,
    ApiPath(tender_id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let row = fetch_tender(&state.db, tender_id).await?;
    Ok(Json(DataResponse::new(TenderResponse::from(row))))
}

/// PATCH /tender/:tender_id
///
/// Partial update by the posting company's owner. A blank `description` clears it.
pub async fn update_tender(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(tender_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateTenderRequest>,
) -> ApiResult<impl IntoResponse> {
    ensure_tender_owner(&state.db, tender_id, auth.user_id).await?;
    let req = req.validate(Utc::now().date_naive())?;

    tracing::info!(user_id = %auth.user_id, tender_id = %tender_id, "Updating tender");

    sqlx::query(
        r#"
        UPDATE tenders SET
            title = COALESCE($2, title),
            description = CASE WHEN $3::text IS NULL THEN description ELSE NULLIF($3, '') END,
            deadline = COALESCE($4, deadline),
            budget = COALESCE($5, budget),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(tender_id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.deadline)
    .bind(req.budget)
    .execute(&state.db)
    .await?;

    let row = fetch_tender(&state.db, tender_id).await?;
    Ok(Json(DataResponse::new(TenderResponse::from(row))))
}

/// DELETE /tender/:tender_id
///
/// Refused while applications reference the tender, unless `cascade=true`.
pub async fn delete_tender(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(tender_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<DeleteQuery>,
) -> ApiResult<impl IntoResponse> {
    let mut tx = state.db.begin().await?;

    let owner: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT c.user_id FROM tenders t
        JOIN companies c ON c.id = t.company_id
        WHERE t.id = $1
        FOR UPDATE OF t
        "#,
    )
    .bind(tender_id)
    .fetch_optional(&mut *tx)
    .await?;

    match owner {
        None => return Err(ApiError::not_found("Tender not found")),
        Some(owner) if owner != auth.user_id => {
            return Err(ApiError::forbidden(
                "Only the owner of the posting company can delete this tender",
            ))
        }
        Some(_) => {}
    }

    let applications: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE tender_id = $1")
            .bind(tender_id)
            .fetch_one(&mut *tx)
            .await?;

    if applications > 0 {
        if !query.cascade() {
            return Err(ApiError::conflict(format!(
                "Tender has {} application(s); pass cascade=true to delete them too",
                applications
            )));
        }

        sqlx::query("DELETE FROM applications WHERE tender_id = $1")
            .bind(tender_id)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query("DELETE FROM tenders WHERE id = $1")
        .bind(tender_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        user_id = %auth.user_id,
        tender_id = %tender_id,
        applications_deleted = applications,
        "Tender deleted"
    );

    Ok(Json(MessageResponse::with_code(
        format!("Tender deleted along with {} application(s)", applications),
        "TENDER_DELETED",
    )))
}

/// GET /tender/:tender_id/applications
///
/// All applications received by a tender; visible to the tender owner only.
pub async fn list_tender_applications(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(tender_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ApplicationQuery>,
) -> ApiResult<impl IntoResponse> {
    ensure_tender_owner(&state.db, tender_id, auth.user_id).await?;

    let pagination = query.pagination();
    let filter = ApplicationFilter {
        viewer: None,
        tender_id: Some(tender_id),
        company_id: query.company_id,
        ..Default::default()
    };

    let page = find_applications(&state.db, filter, &pagination).await?;
    Ok(Json(page))
}
