use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::user::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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

    pub fn with_coordinates(mut self, lat: f64, lng: f64) -> Self {
        self.coordinates = Some(Coordinates { lat, lng });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TripStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Scheduled => "scheduled",
            TripStatus::InProgress => "in-progress",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TripStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "scheduled" => Ok(TripStatus::Scheduled),
            "in-progress" => Ok(TripStatus::InProgress),
            "completed" => Ok(TripStatus::Completed),
            "cancelled" => Ok(TripStatus::Cancelled),
            other => Err(DomainError::Internal(format!("unknown trip status {other}"))),
        }
    }
}

/// One membership record: who rides along and where they get on and off.
#[derive(Debug, Clone, PartialEq)]
pub struct Passenger {
    pub user_id: Uuid,
    pub pickup_location: Location,
    pub dropoff_location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTrip {
    pub start_location: Location,
    pub end_location: Location,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub available_seats: u16,
    pub status: TripStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub start_location: Location,
    pub end_location: Location,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    /// Total seat capacity fixed at creation.
    pub available_seats: u16,
    pub passengers: Vec<Passenger>,
    pub status: TripStatus,
    pub created_at: DateTime<Utc>,
}

/// How a given viewer relates to a trip. Display-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViewerStatus {
    IsDriver,
    IsPassenger,
    SeatsAvailable { seats: u16 },
    Full,
}

impl Trip {
    /// Timestamps are cut to microseconds, the precision Postgres stores, so
    /// a created trip compares equal to the row read back later.
    pub fn new(driver_id: Uuid, fields: NewTrip) -> Self {
        Self {
            id: Uuid::new_v4(),
            driver_id,
            start_location: fields.start_location,
            end_location: fields.end_location,
            departure_time: fields.departure_time.trunc_subsecs(6),
            arrival_time: fields.arrival_time.trunc_subsecs(6),
            available_seats: fields.available_seats,
            passengers: Vec::new(),
            status: fields.status,
            created_at: Utc::now().trunc_subsecs(6),
        }
    }

    pub fn remaining_seats(&self) -> u16 {
        let taken = u16::try_from(self.passengers.len()).unwrap_or(u16::MAX);
        self.available_seats.saturating_sub(taken)
    }

    pub fn is_full(&self) -> bool {
        self.passengers.len() >= usize::from(self.available_seats)
    }

    pub fn has_passenger(&self, user_id: Uuid) -> bool {
        self.passengers.iter().any(|p| p.user_id == user_id)
    }

    /// True when the user drives or rides on this trip.
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.driver_id == user_id || self.has_passenger(user_id)
    }

    /// Checks whether `passenger` may be appended, in the order the API
    /// reports failures: capacity first, then the driver and duplicate guards.
    pub fn check_admission(&self, passenger: &Passenger) -> Result<(), DomainError> {
        if self.is_full() {
            return Err(DomainError::NoAvailableSeats(self.id));
        }
        if passenger.user_id == self.driver_id {
            return Err(DomainError::DriverCannotJoin(self.id));
        }
        if self.has_passenger(passenger.user_id) {
            return Err(DomainError::AlreadyJoined(self.id));
        }
        Ok(())
    }

    pub fn admit(&mut self, passenger: Passenger) -> Result<(), DomainError> {
        self.check_admission(&passenger)?;
        self.passengers.push(passenger);
        Ok(())
    }

    pub fn viewer_status(&self, viewer: Uuid) -> ViewerStatus {
        if self.driver_id == viewer {
            return ViewerStatus::IsDriver;
        }
        if self.has_passenger(viewer) {
            return ViewerStatus::IsPassenger;
        }
        match self.remaining_seats() {
            0 => ViewerStatus::Full,
            seats => ViewerStatus::SeatsAvailable { seats },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerListing {
    pub user: UserSummary,
    pub pickup_location: Location,
    pub dropoff_location: Location,
}

/// A trip with its user references expanded, as served by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripListing {
    pub id: Uuid,
    pub driver: UserSummary,
    pub start_location: Location,
    pub end_location: Location,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub available_seats: u16,
    pub remaining_seats: u16,
    pub passengers: Vec<PassengerListing>,
    pub status: TripStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_status: Option<ViewerStatus>,
}
