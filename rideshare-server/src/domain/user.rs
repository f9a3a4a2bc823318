use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub is_driver: bool,
    #[serde(rename = "vehicle")]
    pub vehicle_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: String,
        email: String,
        password_hash: String,
        phone: Option<String>,
        is_driver: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            phone,
            is_driver,
            vehicle_id: None,
            created_at: Utc::now().trunc_subsecs(6),
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// The expanded form of a user reference inside trip listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}
