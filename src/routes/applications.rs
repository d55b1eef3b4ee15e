//! Application routes
//!
//! Companies submit proposals against tenders. An application is visible to
//! the applicant's owner and to the owner of the tender's company.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::companies::company_owner;
use crate::api::{
    ApiJson, ApiPath, ApiQuery, DataResponse, MessageResponse, Paginated, PaginationParams,
};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::{ApplicationQuery, ApplicationResponse, CreateApplicationRequest};
use crate::error::{ApiError, ApiResult};

/// Database row for application
#[derive(Debug, sqlx::FromRow)]
struct ApplicationRow {
    id: Uuid,
    tender_id: Uuid,
    tender_title: String,
    company_id: Uuid,
    company_name: String,
    proposal: String,
    submitted_at: DateTime<Utc>,
}

impl From<ApplicationRow> for ApplicationResponse {
    fn from(row: ApplicationRow) -> Self {
        Self {
            id: row.id,
            tender_id: row.tender_id,
            tender_title: row.tender_title,
            company_id: row.company_id,
            company_name: row.company_name,
            proposal: row.proposal,
            submitted_at: row.submitted_at,
        }
    }
}

/// Filters for application lookups; `viewer` restricts to rows the user may see
#[derive(Debug, Default)]
pub(crate) struct ApplicationFilter {
    pub viewer: Option<Uuid>,
    pub id: Option<Uuid>,
    pub tender_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
}

const APPLICATION_FROM: &str = r#"
    FROM applications a
    JOIN tenders t ON t.id = a.tender_id
    JOIN companies c ON c.id = a.company_id
    JOIN companies tc ON tc.id = t.company_id
    WHERE ($1::uuid IS NULL OR c.user_id = $1 OR tc.user_id = $1)
    AND ($2::uuid IS NULL OR a.id = $2)
    AND ($3::uuid IS NULL OR a.tender_id = $3)
    AND ($4::uuid IS NULL OR a.company_id = $4)
"#;

const APPLICATION_COLUMNS: &str = "a.id, a.tender_id, t.title AS tender_title, a.company_id, \
     c.name AS company_name, a.proposal, a.submitted_at";

/// Page of applications matching `filter`, most recent first
pub(crate) async fn find_applications(
    db: &PgPool,
    filter: ApplicationFilter,
    pagination: &PaginationParams,
) -> ApiResult<Paginated<ApplicationResponse>> {
    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {}", APPLICATION_FROM))
        .bind(filter.viewer)
        .bind(filter.id)
        .bind(filter.tender_id)
        .bind(filter.company_id)
        .fetch_one(db)
        .await?;

    let rows = sqlx::query_as::<_, ApplicationRow>(&format!(
        "SELECT {} {} ORDER BY a.submitted_at DESC, a.id LIMIT $5 OFFSET $6",
        APPLICATION_COLUMNS, APPLICATION_FROM
    ))
    .bind(filter.viewer)
    .bind(filter.id)
    .bind(filter.tender_id)
    .bind(filter.company_id)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(db)
    .await?;

    let data: Vec<ApplicationResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Paginated::new(data, pagination, total as u64))
}

async fn fetch_application(
    db: &PgPool,
    application_id: Uuid,
    viewer: Uuid,
) -> ApiResult<ApplicationRow> {
    sqlx::query_as::<_, ApplicationRow>(&format!(
        "SELECT {} {}",
        APPLICATION_COLUMNS, APPLICATION_FROM
    ))
    .bind(Some(viewer))
    .bind(Some(application_id))
    .bind(None::<Uuid>)
    .bind(None::<Uuid>)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| ApiError::not_found("Application not found"))
}

/// POST /application
///
/// Submit a proposal against a tender on behalf of one of the caller's companies.
pub async fn submit_application(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateApplicationRequest>,
) -> ApiResult<impl IntoResponse> {
    let req = req.validate()?;

    match company_owner(&state.db, req.company_id).await? {
        None => return Err(ApiError::referential("Company does not exist")),
        Some(owner) if owner != auth.user_id => {
            return Err(ApiError::forbidden(
                "Applications can only be submitted by the company owner",
            ))
        }
        Some(_) => {}
    }

    let tender: Option<(Uuid, NaiveDate)> =
        sqlx::query_as("SELECT company_id, deadline FROM tenders WHERE id = $1")
            .bind(req.tender_id)
            .fetch_optional(&state.db)
            .await?;

    let (tender_company, deadline) =
        tender.ok_or_else(|| ApiError::referential("Tender does not exist"))?;

    if tender_company == req.company_id {
        return Err(ApiError::bad_request(
            "A company cannot apply to its own tender",
        ));
    }
    if deadline < Utc::now().date_naive() {
        return Err(ApiError::bad_request(format!(
            "Tender closed on {}",
            deadline
        )));
    }

    tracing::info!(
        user_id = %auth.user_id,
        tender_id = %req.tender_id,
        company_id = %req.company_id,
        "Submitting application"
    );

    let application_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO applications (tender_id, company_id, proposal)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(req.tender_id)
    .bind(req.company_id)
    .bind(&req.proposal)
    .fetch_one(&state.db)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ApiError::conflict("This company has already applied to this tender")
        }
        other => ApiError::from(other),
    })?;

    let row = fetch_application(&state.db, application_id, auth.user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(ApplicationResponse::from(row))),
    ))
}

/// GET /application
///
/// Applications the caller submitted or received, optionally narrowed to a
/// tender or applicant company.
pub async fn list_applications(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ApplicationQuery>,
) -> ApiResult<impl IntoResponse> {
    let pagination = query.pagination();
    let filter = ApplicationFilter {
        viewer: Some(auth.user_id),
        id: None,
        tender_id: query.tender_id,
        company_id: query.company_id,
    };

    let page = find_applications(&state.db, filter, &pagination).await?;
    Ok(Json(page))
}

/// GET /application/:application_id
pub async fn get_application(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(application_id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let row = fetch_application(&state.db, application_id, auth.user_id).await?;
    Ok(Json(DataResponse::new(ApplicationResponse::from(row))))
}

/// DELETE /application/:application_id
///
/// Withdraw an application; only the applicant company's owner may do this.
pub async fn withdraw_application(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(application_id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let owner: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT c.user_id FROM applications a
        JOIN companies c ON c.id = a.company_id
        WHERE a.id = $1
        "#,
    )
    .bind(application_id)
    .fetch_optional(&state.db)
    .await?;

    match owner {
        None => return Err(ApiError::not_found("Application not found")),
        Some(owner) if owner != auth.user_id => {
            return Err(ApiError::forbidden(
                "Only the applicant company's owner can withdraw this application",
            ))
        }
        Some(_) => {}
    }

    sqlx::query("DELETE FROM applications WHERE id = $1")
        .bind(application_id)
        .execute(&state.db)
        .await?;

    tracing::info!(
        user_id = %auth.user_id,
        application_id = %application_id,
        "Application withdrawn"
    );

    Ok(Json(MessageResponse::with_code(
        "Application withdrawn",
        "APPLICATION_WITHDRAWN",
    )))
}
