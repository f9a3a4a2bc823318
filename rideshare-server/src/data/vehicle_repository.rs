use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::data::user_repository::InMemoryUserRepository;
use crate::domain::error::DomainError;
use crate::domain::vehicle::Vehicle;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Stores the vehicle and points its owner's profile at it. Either both
    /// writes land or neither does.
    async fn create(&self, vehicle: Vehicle) -> Result<Vehicle, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, DomainError>;
}

#[derive(Clone)]
pub struct PostgresVehicleRepository {
    pool: PgPool,
}

impl PostgresVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleRepository for PostgresVehicleRepository {
    async fn create(&self, vehicle: Vehicle) -> Result<Vehicle, DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("failed to open vehicle transaction: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        sqlx::query(
            r#"
            INSERT INTO vehicles
                (id, make, model, year, battery_capacity, current_battery, owner_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(vehicle.battery_capacity)
        .bind(vehicle.current_battery)
        .bind(vehicle.owner_id)
        .bind(vehicle.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("failed to create vehicle: {}", e);
            if e.as_database_error().map(|db| db.is_foreign_key_violation()) == Some(true) {
                DomainError::UserNotFound(vehicle.owner_id)
            } else {
                DomainError::Internal(format!("database error: {}", e))
            }
        })?;

        let linked = sqlx::query("UPDATE users SET vehicle_id = $1 WHERE id = $2")
            .bind(vehicle.id)
            .bind(vehicle.owner_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("failed to link vehicle {} to user {}: {}", vehicle.id, vehicle.owner_id, e);
                DomainError::Internal(format!("database error: {}", e))
            })?;
        // Dropping the transaction rolls the insert back.
        if linked.rows_affected() == 0 {
            return Err(DomainError::UserNotFound(vehicle.owner_id));
        }

        tx.commit().await.map_err(|e| {
            error!("failed to commit vehicle {}: {}", vehicle.id, e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(vehicle_id = %vehicle.id, owner_id = %vehicle.owner_id, "vehicle created");
        Ok(vehicle)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, DomainError> {
        sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT id, make, model, year, battery_capacity, current_battery, owner_id, created_at
            FROM vehicles WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find vehicle {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })
    }
}

/// Shares the user store so the owner link is written under the same
/// vehicle lock as the insert.
pub struct InMemoryVehicleRepository {
    vehicles: RwLock<HashMap<Uuid, Vehicle>>,
    users: Arc<InMemoryUserRepository>,
}

impl InMemoryVehicleRepository {
    pub fn new(users: Arc<InMemoryUserRepository>) -> Self {
        Self {
            vehicles: RwLock::new(HashMap::new()),
            users,
        }
    }
}

#[async_trait]
impl VehicleRepository for InMemoryVehicleRepository {
    async fn create(&self, vehicle: Vehicle) -> Result<Vehicle, DomainError> {
        let mut vehicles = self
            .vehicles
            .write()
            .map_err(|_| DomainError::Internal("vehicle store lock poisoned".into()))?;
        self.users.link_vehicle(vehicle.owner_id, vehicle.id)?;
        vehicles.insert(vehicle.id, vehicle.clone());
        info!(vehicle_id = %vehicle.id, owner_id = %vehicle.owner_id, "vehicle created");
        Ok(vehicle)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, DomainError> {
        let vehicles = self
            .vehicles
            .read()
            .map_err(|_| DomainError::Internal("vehicle store lock poisoned".into()))?;
        Ok(vehicles.get(&id).cloned())
    }
}
