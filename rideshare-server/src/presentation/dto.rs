use crate::application::trip_service::JoinRequest;
use crate::application::vehicle_service::NewVehicle;
use crate::domain::trip::{Location, NewTrip, TripStatus};
use crate::domain::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ======================= USERS / AUTH =======================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, alias = "is_driver")]
    pub is_driver: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,
    pub access_token: String,
    pub token_type: String, // "Bearer"
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ======================= TRIPS =======================

/// Older forms post a bare address string instead of a location object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LocationInput {
    Address(String),
    Full(Location),
}

impl From<LocationInput> for Location {
    fn from(input: LocationInput) -> Self {
        match input {
            LocationInput::Address(address) => Location::new(address),
            LocationInput::Full(location) => location,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripRequest {
    #[serde(alias = "start_location")]
    pub start_location: LocationInput,
    #[serde(alias = "end_location")]
    pub end_location: LocationInput,
    #[serde(alias = "departure_time")]
    pub departure_time: DateTime<Utc>,
    #[serde(alias = "arrival_time")]
    pub arrival_time: DateTime<Utc>,
    #[serde(alias = "available_seats")]
    pub available_seats: u16,
    #[serde(default)]
    pub status: TripStatus,
    #[serde(default)]
    pub driver: Option<Uuid>,
}

impl CreateTripRequest {
    pub fn into_parts(self) -> (Option<Uuid>, NewTrip) {
        (
            self.driver,
            NewTrip {
                start_location: self.start_location.into(),
                end_location: self.end_location.into(),
                departure_time: self.departure_time,
                arrival_time: self.arrival_time,
                available_seats: self.available_seats,
                status: self.status,
            },
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinTripRequest {
    #[serde(default)]
    pub user: Option<Uuid>,
    #[serde(default, alias = "pickup_location")]
    pub pickup_location: Option<LocationInput>,
    #[serde(default, alias = "dropoff_location")]
    pub dropoff_location: Option<LocationInput>,
}

impl JoinTripRequest {
    pub fn into_request(self, user_id: Uuid) -> JoinRequest {
        JoinRequest {
            user_id,
            pickup_location: self.pickup_location.map(Location::from),
            dropoff_location: self.dropoff_location.map(Location::from),
        }
    }
}

// ======================= VEHICLES =======================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(alias = "battery_capacity")]
    pub battery_capacity: f64,
    #[serde(alias = "current_battery")]
    pub current_battery: f64,
    #[serde(default)]
    pub owner: Option<Uuid>,
}

impl CreateVehicleRequest {
    pub fn into_parts(self) -> (Option<Uuid>, NewVehicle) {
        (
            self.owner,
            NewVehicle {
                make: self.make,
                model: self.model,
                year: self.year,
                battery_capacity: self.battery_capacity,
                current_battery: self.current_battery,
            },
        )
    }
}
