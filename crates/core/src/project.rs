//! Project status values and request validation rules.
//!
//! The numeric status ids match the seed rows of the `project_statuses`
//! lookup table; the lowercase names are the wire format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Project lifecycle status.
#[repr(i16)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Draft = 1,
    Published = 2,
    Archived = 3,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 3] = [Self::Draft, Self::Published, Self::Archived];

    /// Return the database status id.
    pub fn id(self) -> i16 {
        self as i16
    }

    /// Look up a status by its database id.
    pub fn from_id(id: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid project status '{s}'. Must be one of: draft, published, archived"
                ))
            })
    }
}

/// Body of `POST /api/projects`.
///
/// `name` is optional at the type level so a missing field surfaces as a
/// field-level validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProjectInput {
    #[validate(
        required(message = "name is required"),
        length(min = 1, max = 100, message = "name must be 1-100 characters")
    )]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 5000, message = "notes must be at most 5000 characters"))]
    pub notes: Option<String>,
}

/// Body of `PUT /api/projects/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 5000, message = "notes must be at most 5000 characters"))]
    pub notes: Option<String>,
}

/// Wire representation of a stored project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Trim a user-supplied name, rejecting names that are blank after trimming.
pub fn normalize_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("name must not be blank".to_string()));
    }
    Ok(trimmed.to_string())
}
