use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Represents an assignment unit in the `comics` table.
///
/// A comic carries a point value (`total_marks`), an optional bonus awarded
/// to submissions made before `submission_deadline`, and a cap on how many
/// files a kid may attach to a submission.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "comics")]
pub struct Model {
    /// Primary key ID (auto-incremented).
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    /// URL of the cover image.
    pub image: String,
    pub category: Option<String>,
    /// Submissions created on or before this instant earn `bonus`.
    pub submission_deadline: Option<DateTime<Utc>>,
    /// Bonus points for on-time submissions (non-negative).
    pub bonus: i32,
    /// Total achievable marks (non-negative).
    pub total_marks: i32,
    /// Maximum number of files per submission.
    pub max_uploads: i32,
    /// JSON array of attached document URLs.
    pub document: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::submission::Entity")]
    Submission,
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
