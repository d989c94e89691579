//! Handlers for the `/projects` resource.
//!
//! Every operation is scoped to the authenticated caller: listing returns
//! only their projects and touching someone else's project is a 403.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pitchcraft_core::error::CoreError;
use pitchcraft_core::project::{normalize_name, ProjectInput, ProjectPatch, ProjectResponse};
use pitchcraft_core::types::DbId;
use pitchcraft_db::models::project::{CreateProject, Project, UpdateProject};
use pitchcraft_db::repositories::ProjectRepo;

use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/projects
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(input): ValidatedJson<ProjectInput>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectResponse>>)> {
    let name = normalize_name(input.name.as_deref().unwrap_or_default())?;

    let project = ProjectRepo::create(
        &state.pool,
        &CreateProject {
            user_id: auth.user_id,
            name,
            description: input.description,
            status_id: input.status.map(|s| s.id()),
            notes: input.notes,
        },
    )
    .await?;

    tracing::info!(project_id = project.id, user_id = auth.user_id, "Project created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: project.into(),
        }),
    ))
}

/// GET /api/projects
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<ProjectResponse>>>> {
    let projects = ProjectRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: projects.into_iter().map(ProjectResponse::from).collect(),
    }))
}

/// GET /api/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectResponse>>> {
    let project = find_owned(&state, &auth, id).await?;
    Ok(Json(DataResponse {
        data: project.into(),
    }))
}

/// PUT /api/projects/{id}
///
/// Fields absent from the body are left unchanged.
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<ProjectPatch>,
) -> AppResult<Json<DataResponse<ProjectResponse>>> {
    find_owned(&state, &auth, id).await?;

    let changes = UpdateProject {
        name: input.name.as_deref().map(normalize_name).transpose()?,
        description: input.description,
        status_id: input.status.map(|s| s.id()),
        notes: input.notes,
    };

    let project = ProjectRepo::update(&state.pool, id, &changes)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;

    tracing::info!(project_id = id, user_id = auth.user_id, "Project updated");
    Ok(Json(DataResponse {
        data: project.into(),
    }))
}

/// DELETE /api/projects/{id}
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_owned(&state, &auth, id).await?;

    if ProjectRepo::delete(&state.pool, id).await? {
        tracing::info!(project_id = id, user_id = auth.user_id, "Project deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))
    }
}

/// Load a project and check that the caller owns it.
async fn find_owned(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<Project> {
    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;

    if project.user_id != auth.user_id {
        tracing::warn!(project_id = id, user_id = auth.user_id, "Project ownership mismatch");
        return Err(AppError::Core(CoreError::Forbidden(
            "You do not have access to this project".into(),
        )));
    }
    Ok(project)
}
