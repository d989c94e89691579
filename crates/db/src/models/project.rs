//! Project entity model and DTOs.

use pitchcraft_core::project::{ProjectResponse, ProjectStatus};
use pitchcraft_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow)]
pub struct Project {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub status_id: i16,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    /// Resolve the status lookup id. Unknown ids fall back to draft.
    pub fn status(&self) -> ProjectStatus {
        ProjectStatus::from_id(self.status_id).unwrap_or_default()
    }
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        let status = project.status();
        Self {
            id: project.id,
            user_id: project.user_id,
            name: project.name,
            description: project.description,
            status,
            notes: project.notes,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// DTO for creating a new project.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub user_id: DbId,
    pub name: String,
    pub description: Option<String>,
    /// Defaults to 1 (draft) if omitted.
    pub status_id: Option<i16>,
    pub notes: Option<String>,
}

/// DTO for updating an existing project. All fields are optional.
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status_id: Option<i16>,
    pub notes: Option<String>,
}
