use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub battery_capacity: f64,
    pub current_battery: f64,
    #[serde(rename = "owner")]
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(
        owner_id: Uuid,
        make: String,
        model: String,
        year: i32,
        battery_capacity: f64,
        current_battery: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            make,
            model,
            year,
            battery_capacity,
            current_battery,
            owner_id,
            created_at: Utc::now().trunc_subsecs(6),
        }
    }
}
