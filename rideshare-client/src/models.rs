use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ======================= USERS =======================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Display)]
#[display("{name} <{email}>")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub is_driver: bool,
    #[serde(default)]
    pub vehicle: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub is_driver: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

// ======================= TRIPS =======================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Display)]
#[display("{address}")]
pub struct Location {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl Location {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            coordinates: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "kebab-case")]
pub enum TripStatus {
    #[display("scheduled")]
    Scheduled,
    #[display("in-progress")]
    InProgress,
    #[display("completed")]
    Completed,
    #[display("cancelled")]
    Cancelled,
}

/// Relationship of the logged-in user to a trip, rendered as the status line
/// of a trip card.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViewerStatus {
    #[display("You are the driver")]
    IsDriver,
    #[display("You are a passenger")]
    IsPassenger,
    #[display("{seats} seats available")]
    SeatsAvailable { seats: u16 },
    #[display("Trip full")]
    Full,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    pub user: UserSummary,
    pub pickup_location: Location,
    pub dropoff_location: Location,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: Uuid,
    pub driver: UserSummary,
    pub start_location: Location,
    pub end_location: Location,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub available_seats: u16,
    pub remaining_seats: u16,
    #[serde(default)]
    pub passengers: Vec<Passenger>,
    pub status: TripStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub viewer_status: Option<ViewerStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrip {
    pub start_location: Location,
    pub end_location: Location,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub available_seats: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinTrip {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropoff_location: Option<Location>,
}

// ======================= VEHICLES =======================

#[derive(Debug, Clone, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
#[display("{year} {make} {model}")]
pub struct Vehicle {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub battery_capacity: f64,
    pub current_battery: f64,
    pub owner: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicle {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub battery_capacity: f64,
    pub current_battery: f64,
}
