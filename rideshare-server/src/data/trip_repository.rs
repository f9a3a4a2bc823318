use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::error::DomainError;
use crate::domain::trip::{Coordinates, Location, Passenger, Trip, TripStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use tracing::{error, info, warn};
use uuid::Uuid;

#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn create(&self, trip: Trip) -> Result<Trip, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Trip>, DomainError>;
    async fn list_all(&self) -> Result<Vec<Trip>, DomainError>;
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Trip>, DomainError>;
    /// Appends `passenger` if the trip admits it. The admission check and the
    /// append are one atomic step: concurrent joins cannot oversell seats.
    async fn join(&self, trip_id: Uuid, passenger: Passenger) -> Result<Trip, DomainError>;
}

#[derive(Clone)]
pub struct PostgresTripRepository {
    pool: PgPool,
}

impl PostgresTripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TRIP_COLUMNS: &str = r#"
    t.id, t.driver_id,
    t.start_address, t.start_lat, t.start_lng,
    t.end_address, t.end_lat, t.end_lng,
    t.departure_time, t.arrival_time, t.available_seats, t.status, t.created_at
"#;

#[derive(sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    driver_id: Uuid,
    start_address: String,
    start_lat: Option<f64>,
    start_lng: Option<f64>,
    end_address: String,
    end_lat: Option<f64>,
    end_lng: Option<f64>,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    available_seats: i32,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct PassengerRow {
    trip_id: Uuid,
    user_id: Uuid,
    pickup_address: String,
    pickup_lat: Option<f64>,
    pickup_lng: Option<f64>,
    dropoff_address: String,
    dropoff_lat: Option<f64>,
    dropoff_lng: Option<f64>,
}

fn location(address: String, lat: Option<f64>, lng: Option<f64>) -> Location {
    Location {
        address,
        coordinates: lat.zip(lng).map(|(lat, lng)| Coordinates { lat, lng }),
    }
}

fn lat_lng(location: &Location) -> (Option<f64>, Option<f64>) {
    location
        .coordinates
        .map(|c| (Some(c.lat), Some(c.lng)))
        .unwrap_or((None, None))
}

impl TripRow {
    fn into_trip(self, passengers: Vec<Passenger>) -> Result<Trip, DomainError> {
        let available_seats = u16::try_from(self.available_seats).map_err(|_| {
            DomainError::Internal(format!(
                "trip {} has out-of-range seat count {}",
                self.id, self.available_seats
            ))
        })?;
        Ok(Trip {
            id: self.id,
            driver_id: self.driver_id,
            start_location: location(self.start_address, self.start_lat, self.start_lng),
            end_location: location(self.end_address, self.end_lat, self.end_lng),
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            available_seats,
            passengers,
            status: self.status.parse::<TripStatus>()?,
            created_at: self.created_at,
        })
    }
}

impl From<PassengerRow> for Passenger {
    fn from(row: PassengerRow) -> Self {
        Passenger {
            user_id: row.user_id,
            pickup_location: location(row.pickup_address, row.pickup_lat, row.pickup_lng),
            dropoff_location: location(row.dropoff_address, row.dropoff_lat, row.dropoff_lng),
        }
    }
}

fn db_error(context: &str) -> impl Fn(sqlx::Error) -> DomainError + '_ {
    move |e| {
        error!("db error {}: {}", context, e);
        DomainError::Internal(e.to_string())
    }
}

async fn load_passengers<'e, E>(
    executor: E,
    trip_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Passenger>>, DomainError>
where
    E: Executor<'e, Database = Postgres>,
{
    let rows = sqlx::query_as::<_, PassengerRow>(
        r#"
        SELECT trip_id, user_id,
               pickup_address, pickup_lat, pickup_lng,
               dropoff_address, dropoff_lat, dropoff_lng
        FROM trip_passengers
        WHERE trip_id = ANY($1)
        ORDER BY seq
        "#,
    )
    .bind(trip_ids)
    .fetch_all(executor)
    .await
    .map_err(db_error("loading passengers"))?;

    let mut grouped: HashMap<Uuid, Vec<Passenger>> = HashMap::new();
    for row in rows {
        grouped.entry(row.trip_id).or_default().push(row.into());
    }
    Ok(grouped)
}

impl PostgresTripRepository {
    async fn assemble(&self, rows: Vec<TripRow>) -> Result<Vec<Trip>, DomainError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut passengers = load_passengers(&self.pool, &ids).await?;
        rows.into_iter()
            .map(|row| {
                let riders = passengers.remove(&row.id).unwrap_or_default();
                row.into_trip(riders)
            })
            .collect()
    }
}

#[async_trait]
impl TripRepository for PostgresTripRepository {
    async fn create(&self, trip: Trip) -> Result<Trip, DomainError> {
        let (start_lat, start_lng) = lat_lng(&trip.start_location);
        let (end_lat, end_lng) = lat_lng(&trip.end_location);
        sqlx::query(
            r#"
            INSERT INTO trips (
                id, driver_id,
                start_address, start_lat, start_lng,
                end_address, end_lat, end_lng,
                departure_time, arrival_time, available_seats, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(trip.id)
        .bind(trip.driver_id)
        .bind(&trip.start_location.address)
        .bind(start_lat)
        .bind(start_lng)
        .bind(&trip.end_location.address)
        .bind(end_lat)
        .bind(end_lng)
        .bind(trip.departure_time)
        .bind(trip.arrival_time)
        .bind(i32::from(trip.available_seats))
        .bind(trip.status.as_str())
        .bind(trip.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create trip: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(trip_id = %trip.id, driver_id = %trip.driver_id, seats = trip.available_seats, "trip created");
        Ok(trip)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Trip>, DomainError> {
        let row = sqlx::query_as::<_, TripRow>(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips t WHERE t.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding trip"))?;

        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> Result<Vec<Trip>, DomainError> {
        let rows = sqlx::query_as::<_, TripRow>(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips t ORDER BY t.created_at, t.id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing trips"))?;

        self.assemble(rows).await
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Trip>, DomainError> {
        let rows = sqlx::query_as::<_, TripRow>(&format!(
            r#"
            SELECT {TRIP_COLUMNS}
            FROM trips t
            WHERE t.driver_id = $1
               OR EXISTS (
                   SELECT 1 FROM trip_passengers p
                   WHERE p.trip_id = t.id AND p.user_id = $1
               )
            ORDER BY t.created_at, t.id
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing user trips"))?;

        self.assemble(rows).await
    }

    async fn join(&self, trip_id: Uuid, passenger: Passenger) -> Result<Trip, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("opening join"))?;

        // Row lock serializes concurrent joins on the same trip.
        let row = sqlx::query_as::<_, TripRow>(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips t WHERE t.id = $1 FOR UPDATE"
        ))
        .bind(trip_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("locking trip"))?
        .ok_or(DomainError::TripNotFound(trip_id))?;

        let riders = load_passengers(&mut *tx, &[trip_id])
            .await?
            .remove(&trip_id)
            .unwrap_or_default();
        let mut trip = row.into_trip(riders)?;

        if let Err(rejected) = trip.check_admission(&passenger) {
            warn!(trip_id = %trip_id, user_id = %passenger.user_id, reason = %rejected, "join rejected");
            return Err(rejected);
        }

        let (pickup_lat, pickup_lng) = lat_lng(&passenger.pickup_location);
        let (dropoff_lat, dropoff_lng) = lat_lng(&passenger.dropoff_location);
        sqlx::query(
            r#"
            INSERT INTO trip_passengers (
                trip_id, user_id,
                pickup_address, pickup_lat, pickup_lng,
                dropoff_address, dropoff_lat, dropoff_lng
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(trip_id)
        .bind(passenger.user_id)
        .bind(&passenger.pickup_location.address)
        .bind(pickup_lat)
        .bind(pickup_lng)
        .bind(&passenger.dropoff_location.address)
        .bind(dropoff_lat)
        .bind(dropoff_lng)
        .execute(&mut *tx)
        .await
        .map_err(db_error("inserting passenger"))?;

        tx.commit().await.map_err(db_error("committing join"))?;

        info!(trip_id = %trip_id, user_id = %passenger.user_id, "passenger joined trip");
        trip.passengers.push(passenger);
        Ok(trip)
    }
}

/// Trips kept in creation order behind a single lock.
#[derive(Default)]
pub struct InMemoryTripRepository {
    trips: Mutex<Vec<Trip>>,
}

impl InMemoryTripRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Trip>>, DomainError> {
        self.trips
            .lock()
            .map_err(|_| DomainError::Internal("trip store lock poisoned".into()))
    }
}

#[async_trait]
impl TripRepository for InMemoryTripRepository {
    async fn create(&self, trip: Trip) -> Result<Trip, DomainError> {
        self.lock()?.push(trip.clone());
        info!(trip_id = %trip.id, driver_id = %trip.driver_id, seats = trip.available_seats, "trip created");
        Ok(trip)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Trip>, DomainError> {
        Ok(self.lock()?.iter().find(|t| t.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Trip>, DomainError> {
        Ok(self.lock()?.clone())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Trip>, DomainError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|t| t.involves(user_id))
            .cloned()
            .collect())
    }

    async fn join(&self, trip_id: Uuid, passenger: Passenger) -> Result<Trip, DomainError> {
        let mut trips = self.lock()?;
        let trip = trips
            .iter_mut()
            .find(|t| t.id == trip_id)
            .ok_or(DomainError::TripNotFound(trip_id))?;

        let user_id = passenger.user_id;
        if let Err(rejected) = trip.admit(passenger) {
            warn!(trip_id = %trip_id, user_id = %user_id, reason = %rejected, "join rejected");
            return Err(rejected);
        }

        info!(trip_id = %trip_id, user_id = %user_id, "passenger joined trip");
        Ok(trip.clone())
    }
}
