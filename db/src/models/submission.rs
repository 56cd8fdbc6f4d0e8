use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Represents the status of a submission throughout its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "submission_status_enum"
)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Waiting for an admin to assign marks.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Marks assigned; the pending → graded transition happens exactly once.
    #[sea_orm(string_value = "graded")]
    Graded,
}

impl Default for SubmissionStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status_str = match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Graded => "graded",
        };
        write!(f, "{}", status_str)
    }
}

/// Represents a kid's response artifact for a specific comic.
///
/// Each submission is linked to one kid and one comic; at most one
/// submission exists per (kid, comic) pair.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    /// Primary key of the submission.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the kid who submitted.
    pub kid_id: i64,
    /// ID of the comic being answered.
    pub comic_id: i64,
    pub description: Option<String>,
    pub comments: Option<String>,
    /// JSON array of uploaded file URLs.
    pub files: String,
    /// Awarded marks; `None` until graded.
    pub marks: Option<i32>,
    /// Current status of the submission in the lifecycle.
    pub status: SubmissionStatus,
    /// Instant the kid handed the work in.
    pub submission_date: DateTime<Utc>,
    /// Timestamp when the submission was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp when the submission was last updated.
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Link to the kid who owns this submission.
    #[sea_orm(
        belongs_to = "super::kid::Entity",
        from = "Column::KidId",
        to = "super::kid::Column::Id"
    )]
    Kid,

    /// Link to the comic being answered.
    #[sea_orm(
        belongs_to = "super::comic::Entity",
        from = "Column::ComicId",
        to = "super::comic::Column::Id"
    )]
    Comic,
}

impl Related<super::kid::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Kid.def()
    }
}

impl Related<super::comic::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comic.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
