use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use serde::Serialize;

use crate::password;

/// Represents a child user account in the `kids` table.
///
/// A kid is created either by an admin, through the phone-based profile
/// flow, or through the three-step email signup flow. Email and parent
/// phone are each optional but unique when present.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "kids")]
pub struct Model {
    /// Primary key ID (auto-incremented).
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The kid's display name.
    pub name: String,
    /// Unique email address, set by the email signup flow.
    pub email: Option<String>,
    /// Unique parent phone number, set by the phone profile flow.
    pub parent_phone: Option<String>,
    /// Hashed password; absent for phone-only profiles.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// URL of the kid's avatar image, if uploaded.
    pub avatar: Option<String>,
    pub gender: Option<String>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    /// Whether the email address has been verified with an OTP.
    pub is_verified: bool,
    /// Pending email verification code; cleared once verified.
    #[serde(skip_serializing)]
    pub verification_code: Option<String>,
    #[serde(skip_serializing)]
    pub verification_code_expires: Option<DateTime<Utc>>,
    /// Timestamp of the most recent successful authentication.
    pub last_login: Option<DateTime<Utc>>,
    /// Timestamp when the kid was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp when the kid was last updated.
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

impl Model {
    pub async fn find_by_email(
        db: &DatabaseConnection,
        email: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find().filter(Column::Email.eq(email)).one(db).await
    }

    pub async fn find_by_parent_phone(
        db: &DatabaseConnection,
        parent_phone: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::ParentPhone.eq(parent_phone))
            .one(db)
            .await
    }

    /// Checks a plaintext password against the stored hash.
    ///
    /// Phone-only profiles have no password and never verify.
    pub fn verify_password(&self, password: &str) -> bool {
        match &self.password_hash {
            Some(hash) => password::verify_password(password, hash),
            None => false,
        }
    }

    /// Records a successful authentication.
    ///
    /// Best-effort: callers log a failure but never block the request on it.
    pub async fn touch_last_login(db: &DatabaseConnection, kid_id: i64) -> Result<(), DbErr> {
        let active = ActiveModel {
            id: Set(kid_id),
            last_login: Set(Some(Utc::now())),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        active.update(db).await.map(|_| ())
    }
}
