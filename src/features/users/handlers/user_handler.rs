use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AdminSession;
use crate::features::users::dtos::{AuthRecordDto, DisableUserDto, UserCardDto, UserDetailDto};
use crate::features::users::services::UserService;
use crate::shared::types::{ApiResponse, Meta};
use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Approval cards for all end-user accounts", body = ApiResponse<Vec<UserCardDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users(
    _session: AdminSession,
    State(service): State<Arc<UserService>>,
) -> Result<Json<ApiResponse<Vec<UserCardDto>>>> {
    let cards = service.list().await?;
    let total = cards.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(cards),
        None,
        Some(Meta { total }),
    )))
}

#[utoipa::path(
    get,
    path = "/api/users/{uid}",
    params(
        ("uid" = String, Path, description = "User account id")
    ),
    responses(
        (status = 200, description = "Full profile for one account", body = ApiResponse<UserDetailDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_user(
    _session: AdminSession,
    State(service): State<Arc<UserService>>,
    Path(uid): Path<String>,
) -> Result<Json<ApiResponse<UserDetailDto>>> {
    let detail = service.detail(&uid)?;
    Ok(Json(ApiResponse::success(Some(detail), None, None)))
}

#[utoipa::path(
    post,
    path = "/api/users/{uid}/approve",
    params(
        ("uid" = String, Path, description = "User account id")
    ),
    responses(
        (status = 200, description = "User approved"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn approve_user(
    _session: AdminSession,
    State(service): State<Arc<UserService>>,
    Path(uid): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    let message = service.approve(&uid).await?;
    Ok(Json(ApiResponse::success(None, Some(message), None)))
}

#[utoipa::path(
    post,
    path = "/api/users/{uid}/resubmit-id",
    params(
        ("uid" = String, Path, description = "User account id")
    ),
    responses(
        (status = 200, description = "Resubmission requested, approval reset"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn resubmit_id(
    _session: AdminSession,
    State(service): State<Arc<UserService>>,
    Path(uid): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    let message = service.require_resubmit(&uid).await?;
    Ok(Json(ApiResponse::success(None, Some(message), None)))
}

#[utoipa::path(
    post,
    path = "/api/users/{uid}/disable",
    params(
        ("uid" = String, Path, description = "User account id")
    ),
    request_body = DisableUserDto,
    responses(
        (status = 200, description = "Sign-in toggled at the auth provider"),
        (status = 400, description = "Missing disable field"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
        (status = 502, description = "Auth provider unreachable")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn disable_user(
    _session: AdminSession,
    State(service): State<Arc<UserService>>,
    Path(uid): Path<String>,
    AppJson(dto): AppJson<DisableUserDto>,
) -> Result<Json<ApiResponse<()>>> {
    let disable = dto
        .disable
        .ok_or_else(|| AppError::BadRequest("Missing uid or disable field".to_string()))?;

    let message = service.set_disabled(&uid, disable).await?;
    Ok(Json(ApiResponse::success(None, Some(message), None)))
}

#[utoipa::path(
    get,
    path = "/api/users/{uid}/auth",
    params(
        ("uid" = String, Path, description = "User account id")
    ),
    responses(
        (status = 200, description = "Auth-provider record for one account", body = ApiResponse<AuthRecordDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No auth account for the uid"),
        (status = 502, description = "Auth provider unreachable")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_user_auth(
    _session: AdminSession,
    State(service): State<Arc<UserService>>,
    Path(uid): Path<String>,
) -> Result<Json<ApiResponse<AuthRecordDto>>> {
    let record = service.auth_record(&uid).await?;
    Ok(Json(ApiResponse::success(Some(record), None, None)))
}
