//! Company routes
//!
//! Company profiles owned by a user, plus logo upload to Supabase Storage.

use axum::{
    extract::{multipart::{MultipartError, MultipartRejection}, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{
    ApiJson, ApiPath, ApiQuery, DataResponse, MessageResponse, Paginated, PaginationParams,
};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::db::like_pattern;
use crate::domain::validation::optional_text;
use crate::domain::{
    CompanyQuery, CompanyResponse, CreateCompanyRequest, DeleteQuery, UpdateCompanyRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::services::storage::{logo_extension, logo_object_path};

/// Database row for company
#[derive(Debug, sqlx::FromRow)]
struct CompanyRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    industry: String,
    description: Option<String>,
    services: Vec<String>,
    logo_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CompanyRow> for CompanyResponse {
    fn from(row: CompanyRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            industry: row.industry,
            description: row.description,
            services: row.services,
            logo_url: row.logo_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const COMPANY_COLUMNS: &str =
    "c.id, c.user_id, c.name, c.industry, c.description, c.services, c.logo_url, c.created_at, c.updated_at";

/// Filters shared by `GET /company` and `GET /search`; `None` does not constrain
#[derive(Debug, Default)]
pub(crate) struct CompanyFilter {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub user_id: Option<Uuid>,
    pub service: Option<String>,
    pub keyword: Option<String>,
}

const COMPANY_FILTER: &str = r#"
    WHERE ($1::text IS NULL OR c.name ILIKE $1)
    AND ($2::text IS NULL OR LOWER(c.industry) = LOWER($2))
    AND ($3::uuid IS NULL OR c.user_id = $3)
    AND ($4::text IS NULL OR EXISTS (
        SELECT 1 FROM unnest(c.services) AS s(service) WHERE LOWER(s.service) = LOWER($4)))
    AND ($5::text IS NULL OR c.name ILIKE $5 OR c.description ILIKE $5 OR EXISTS (
        SELECT 1 FROM unnest(c.services) AS s(service) WHERE s.service ILIKE $5))
"#;

/// Page of companies matching `filter`, newest first
pub(crate) async fn find_companies(
    db: &PgPool,
    filter: CompanyFilter,
    pagination: &PaginationParams,
) -> ApiResult<Paginated<CompanyResponse>> {
    let name = filter.name.as_deref().map(like_pattern);
    let industry = filter.industry.as_deref();
    let keyword = filter.keyword.as_deref().map(like_pattern);

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM companies c {}",
        COMPANY_FILTER
    ))
    .bind(&name)
    .bind(industry)
    .bind(filter.user_id)
    .bind(&filter.service)
    .bind(&keyword)
    .fetch_one(db)
    .await?;

    let rows = sqlx::query_as::<_, CompanyRow>(&format!(
        "SELECT {} FROM companies c {} ORDER BY c.created_at DESC, c.id LIMIT $6 OFFSET $7",
        COMPANY_COLUMNS, COMPANY_FILTER
    ))
    .bind(&name)
    .bind(industry)
    .bind(filter.user_id)
    .bind(&filter.service)
    .bind(&keyword)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(db)
    .await?;

    let data: Vec<CompanyResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Paginated::new(data, pagination, total as u64))
}

/// Owner of a company, or `None` if it does not exist
pub(crate) async fn company_owner(db: &PgPool, company_id: Uuid) -> ApiResult<Option<Uuid>> {
    let owner = sqlx::query_scalar("SELECT user_id FROM companies WHERE id = $1")
        .bind(company_id)
        .fetch_optional(db)
        .await?;
    Ok(owner)
}

/// 404 for unknown companies, 403 when `user_id` is not the owner
pub(crate) async fn ensure_company_owner(
    db: &PgPool,
    company_id: Uuid,
    user_id: Uuid,
) -> ApiResult<()> {
    match company_owner(db, company_id).await? {
        None => Err(ApiError::not_found("Company not found")),
        Some(owner) if owner != user_id => Err(ApiError::forbidden(
            "Only the company owner can modify this company",
        )),
        Some(_) => Ok(()),
    }
}

async fn fetch_company(db: &PgPool, company_id: Uuid) -> ApiResult<CompanyRow> {
    sqlx::query_as::<_, CompanyRow>(&format!(
        "SELECT {} FROM companies c WHERE c.id = $1",
        COMPANY_COLUMNS
    ))
    .bind(company_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| ApiError::not_found("Company not found"))
}

/// POST /company
///
/// Register a company owned by the caller.
pub async fn create_company(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateCompanyRequest>,
) -> ApiResult<impl IntoResponse> {
    let req = req.validate()?;

    tracing::info!(
        user_id = %auth.user_id,
        company_name = %req.name,
        industry = %req.industry,
        "Creating company"
    );

    let row = sqlx::query_as::<_, CompanyRow>(&format!(
        r#"
        INSERT INTO companies AS c (user_id, name, industry, description, services)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {}
        "#,
        COMPANY_COLUMNS
    ))
    .bind(auth.user_id)
    .bind(&req.name)
    .bind(&req.industry)
    .bind(&req.description)
    .bind(&req.services)
    .fetch_one(&state.db)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            ApiError::referential("User account does not exist")
        }
        other => ApiError::from(other),
    })?;

    let response: CompanyResponse = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /company
///
/// List companies, optionally filtered by name, industry or owner.
pub async fn list_companies(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<CompanyQuery>,
) -> ApiResult<impl IntoResponse> {
    let pagination = query.pagination();
    let filter = CompanyFilter {
        name: optional_text(query.name),
        industry: optional_text(query.industry),
        user_id: query.user_id,
        ..Default::default()
    };

    let page = find_companies(&state.db, filter, &pagination).await?;
    Ok(Json(page))
}

/// GET /company/:company_id
pub async fn get_company(
    State(state): State<Arc<AppState>>,
    ApiPath(company_id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let row = fetch_company(&state.db, company_id).await?;
    Ok(Json(DataResponse::new(CompanyResponse::from(row))))
}

/// PATCH /company/:company_id
///
/// Partial update; only the owner may change a company. A blank
/// `description` clears it.
pub async fn update_company(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(company_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateCompanyRequest>,
) -> ApiResult<impl IntoResponse> {
    ensure_company_owner(&state.db, company_id, auth.user_id).await?;
    let req = req.validate()?;

    tracing::info!(user_id = %auth.user_id, company_id = %company_id, "Updating company");

    let row = sqlx::query_as::<_, CompanyRow>(&format!(
        r#"
        UPDATE companies AS c SET
            name = COALESCE($2, c.name),
            industry = COALESCE($3, c.industry),
            description = CASE WHEN $4::text IS NULL THEN c.description ELSE NULLIF($4, '') END,
            services = COALESCE($5, c.services),
            updated_at = NOW()
        WHERE c.id = $1
        RETURNING {}
        "#,
        COMPANY_COLUMNS
    ))
    .bind(company_id)
    .bind(&req.name)
    .bind(&req.industry)
    .bind(&req.description)
    .bind(&req.services)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Company not found"))?;

    Ok(Json(DataResponse::new(CompanyResponse::from(row))))
}

/// Counts of rows that reference a company
async fn company_dependants(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
) -> ApiResult<(i64, i64)> {
    let (tenders, applications): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM tenders WHERE company_id = $1),
            (SELECT COUNT(*) FROM applications a
                WHERE a.company_id = $1
                OR a.tender_id IN (SELECT id FROM tenders WHERE company_id = $1))
        "#,
    )
    .bind(company_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok((tenders, applications))
}

/// DELETE /company/:company_id
///
/// Refused while tenders or applications reference the company, unless `cascade=true`.
pub async fn delete_company(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(company_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<DeleteQuery>,
) -> ApiResult<impl IntoResponse> {
    let mut tx = state.db.begin().await?;

    // Row lock blocks new tenders/applications from referencing it meanwhile
    let owner: Option<Uuid> =
        sqlx::query_scalar("SELECT user_id FROM companies WHERE id = $1 FOR UPDATE")
            .bind(company_id)
            .fetch_optional(&mut *tx)
            .await?;

    match owner {
        None => return Err(ApiError::not_found("Company not found")),
        Some(owner) if owner != auth.user_id => {
            return Err(ApiError::forbidden(
                "Only the company owner can delete this company",
            ))
        }
        Some(_) => {}
    }

    let (tenders, applications) = company_dependants(&mut tx, company_id).await?;

    if (tenders > 0 || applications > 0) && !query.cascade() {
        return Err(ApiError::conflict(format!(
            "Company is referenced by {} tender(s) and {} application(s); pass cascade=true to delete them too",
            tenders, applications
        )));
    }

    if query.cascade() {
        sqlx::query(
            r#"
            DELETE FROM applications
            WHERE company_id = $1
            OR tender_id IN (SELECT id FROM tenders WHERE company_id = $1)
            "#,
        )
        .bind(company_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM tenders WHERE company_id = $1")
            .bind(company_id)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query("DELETE FROM companies WHERE id = $1")
        .bind(company_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        user_id = %auth.user_id,
        company_id = %company_id,
        tenders_deleted = tenders,
        applications_deleted = applications,
        "Company deleted"
    );

    Ok(Json(MessageResponse::with_code(
        format!(
            "Company deleted along with {} tender(s) and {} application(s)",
            tenders, applications
        ),
        "COMPANY_DELETED",
    )))
}

/// POST /company/:company_id/logo
///
/// Multipart upload with a `logo` (or `file`) part. Stores the image in the
/// logo bucket and saves its public URL on the company.
pub async fn upload_logo(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(company_id): ApiPath<Uuid>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let mut multipart = multipart?;
    ensure_company_owner(&state.db, company_id, auth.user_id).await?;

    let max_bytes = state.settings.logo_max_bytes;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        if name != "logo" && name != "file" {
            continue;
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_default();
        let extension = logo_extension(&content_type).ok_or_else(|| {
            ApiError::bad_request(format!(
                "Unsupported logo type '{}'; use PNG, JPEG, WebP, GIF or SVG",
                content_type
            ))
        })?;

        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some((content_type, extension, data));
        break;
    }

    let (content_type, extension, data) =
        upload.ok_or_else(|| ApiError::bad_request("logo file is required"))?;

    if data.is_empty() {
        return Err(ApiError::bad_request("logo file is empty"));
    }
    if data.len() > max_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "logo must be at most {} bytes",
            max_bytes
        )));
    }

    let path = logo_object_path(company_id, extension);
    tracing::info!(
        user_id = %auth.user_id,
        company_id = %company_id,
        bucket = %state.storage.bucket(),
        path = %path,
        size = data.len(),
        "Uploading company logo"
    );

    let logo_url = state.storage.upload(&path, &content_type, data).await?;

    let row = sqlx::query_as::<_, CompanyRow>(&format!(
        r#"
        UPDATE companies AS c SET logo_url = $2, updated_at = NOW()
        WHERE c.id = $1
        RETURNING {}
        "#,
        COMPANY_COLUMNS
    ))
    .bind(company_id)
    .bind(&logo_url)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Company not found"))?;

    Ok(Json(DataResponse::new(CompanyResponse::from(row))))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("logo upload exceeds the size limit".to_string())
    } else {
        ApiError::bad_request(format!("Invalid multipart body: {}", err.body_text()))
    }
}
