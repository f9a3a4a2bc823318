use std::sync::Arc;

use crate::data::user_repository::UserRepository;
use crate::data::vehicle_repository::VehicleRepository;
use crate::domain::{error::DomainError, vehicle::Vehicle};
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub battery_capacity: f64,
    pub current_battery: f64,
}

#[derive(Clone)]
pub struct VehicleService {
    vehicles: Arc<dyn VehicleRepository>,
    users: Arc<dyn UserRepository>,
}

impl VehicleService {
    pub fn new(vehicles: Arc<dyn VehicleRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { vehicles, users }
    }

    pub async fn get_vehicle(&self, id: Uuid) -> Result<Vehicle, DomainError> {
        self.vehicles
            .find_by_id(id)
            .await?
            .ok_or(DomainError::VehicleNotFound(id))
    }

    /// Stores the vehicle and points the owner's profile at it.
    #[instrument(skip(self, input))]
    pub async fn register_vehicle(
        &self,
        owner_id: Uuid,
        input: NewVehicle,
    ) -> Result<Vehicle, DomainError> {
        if input.make.trim().is_empty() || input.model.trim().is_empty() {
            return Err(DomainError::validation("make and model are required"));
        }
        let battery_ok = input.battery_capacity.is_finite()
            && input.current_battery.is_finite()
            && input.battery_capacity >= 0.0
            && (0.0..=input.battery_capacity).contains(&input.current_battery);
        if !battery_ok {
            return Err(DomainError::validation(
                "currentBattery must lie between 0 and batteryCapacity",
            ));
        }
        if self.users.find_by_id(owner_id).await?.is_none() {
            return Err(DomainError::validation(format!("unknown owner {owner_id}")));
        }

        let vehicle = Vehicle::new(
            owner_id,
            input.make.trim().to_string(),
            input.model.trim().to_string(),
            input.year,
            input.battery_capacity,
            input.current_battery,
        );
        self.vehicles.create(vehicle).await
    }
}
