use std::collections::HashMap;
use std::sync::Arc;

use crate::data::trip_repository::TripRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::trip::{Location, NewTrip, Passenger, PassengerListing, Trip, TripListing};
use crate::domain::user::UserSummary;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// A join request before defaults are applied. Missing pickup or dropoff
/// points fall back to the trip's own start and end.
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub user_id: Uuid,
    pub pickup_location: Option<Location>,
    pub dropoff_location: Option<Location>,
}

#[derive(Clone)]
pub struct TripService {
    trips: Arc<dyn TripRepository>,
    users: Arc<dyn UserRepository>,
}

impl TripService {
    pub fn new(trips: Arc<dyn TripRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { trips, users }
    }

    #[instrument(skip(self, fields))]
    pub async fn create_trip(
        &self,
        driver_id: Uuid,
        fields: NewTrip,
    ) -> Result<TripListing, DomainError> {
        require_address(&fields.start_location, "startLocation")?;
        require_address(&fields.end_location, "endLocation")?;
        self.require_user(driver_id, "driver").await?;

        let trip = self.trips.create(Trip::new(driver_id, fields)).await?;
        self.listing(trip, Some(driver_id)).await
    }

    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn join_trip(
        &self,
        trip_id: Uuid,
        request: JoinRequest,
    ) -> Result<TripListing, DomainError> {
        let trip = self
            .trips
            .find_by_id(trip_id)
            .await?
            .ok_or(DomainError::TripNotFound(trip_id))?;
        // Capacity is reported ahead of any problem with the joining user or
        // the payload.
        if trip.is_full() {
            warn!(trip_id = %trip_id, "join rejected: trip full");
            return Err(DomainError::NoAvailableSeats(trip_id));
        }
        self.require_user(request.user_id, "user").await?;

        let passenger = Passenger {
            user_id: request.user_id,
            pickup_location: request
                .pickup_location
                .unwrap_or_else(|| trip.start_location.clone()),
            dropoff_location: request
                .dropoff_location
                .unwrap_or_else(|| trip.end_location.clone()),
        };
        require_address(&passenger.pickup_location, "pickupLocation")?;
        require_address(&passenger.dropoff_location, "dropoffLocation")?;

        // The repository re-checks capacity atomically; the read above only
        // resolves defaults and existence.
        let updated = self.trips.join(trip_id, passenger).await?;
        self.listing(updated, Some(request.user_id)).await
    }

    pub async fn get_trip(
        &self,
        trip_id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<TripListing, DomainError> {
        let trip = self
            .trips
            .find_by_id(trip_id)
            .await?
            .ok_or(DomainError::TripNotFound(trip_id))?;
        self.listing(trip, viewer).await
    }

    pub async fn list_trips(&self, viewer: Option<Uuid>) -> Result<Vec<TripListing>, DomainError> {
        let trips = self.trips.list_all().await?;
        self.listings(trips, viewer).await
    }

    pub async fn list_trips_for_user(
        &self,
        user_id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<Vec<TripListing>, DomainError> {
        let trips = self.trips.list_for_user(user_id).await?;
        debug!(user_id = %user_id, count = trips.len(), "user trips loaded");
        self.listings(trips, viewer).await
    }

    async fn require_user(&self, user_id: Uuid, role: &str) -> Result<(), DomainError> {
        match self.users.find_by_id(user_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::validation(format!("unknown {role} {user_id}"))),
        }
    }

    async fn listing(&self, trip: Trip, viewer: Option<Uuid>) -> Result<TripListing, DomainError> {
        let mut listings = self.listings(vec![trip], viewer).await?;
        listings
            .pop()
            .ok_or_else(|| DomainError::Internal("trip listing went missing".into()))
    }

    async fn listings(
        &self,
        trips: Vec<Trip>,
        viewer: Option<Uuid>,
    ) -> Result<Vec<TripListing>, DomainError> {
        let mut ids: Vec<Uuid> = trips
            .iter()
            .flat_map(|t| std::iter::once(t.driver_id).chain(t.passengers.iter().map(|p| p.user_id)))
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let directory: HashMap<Uuid, UserSummary> = self
            .users
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.summary()))
            .collect();

        trips
            .into_iter()
            .map(|trip| to_listing(trip, &directory, viewer))
            .collect()
    }
}

fn require_address(location: &Location, field: &str) -> Result<(), DomainError> {
    if location.address.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} address is required")));
    }
    Ok(())
}

fn lookup(directory: &HashMap<Uuid, UserSummary>, id: Uuid) -> Result<UserSummary, DomainError> {
    directory
        .get(&id)
        .cloned()
        .ok_or_else(|| DomainError::Internal(format!("dangling user reference {id}")))
}

fn to_listing(
    trip: Trip,
    directory: &HashMap<Uuid, UserSummary>,
    viewer: Option<Uuid>,
) -> Result<TripListing, DomainError> {
    let viewer_status = viewer.map(|v| trip.viewer_status(v));
    let remaining_seats = trip.remaining_seats();
    let passengers = trip
        .passengers
        .into_iter()
        .map(|p| {
            Ok(PassengerListing {
                user: lookup(directory, p.user_id)?,
                pickup_location: p.pickup_location,
                dropoff_location: p.dropoff_location,
            })
        })
        .collect::<Result<Vec<_>, DomainError>>()?;

    Ok(TripListing {
        id: trip.id,
        driver: lookup(directory, trip.driver_id)?,
        start_location: trip.start_location,
        end_location: trip.end_location,
        departure_time: trip.departure_time,
        arrival_time: trip.arrival_time,
        available_seats: trip.available_seats,
        remaining_seats,
        passengers,
        status: trip.status,
        created_at: trip.created_at,
        viewer_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::trip_repository::InMemoryTripRepository;
    use crate::data::user_repository::InMemoryUserRepository;
    use crate::domain::trip::{TripStatus, ViewerStatus};
    use crate::domain::user::User;
    use chrono::{Duration, SubsecRound, Utc};

    struct Fixture {
        service: TripService,
        users: Arc<InMemoryUserRepository>,
    }

    impl Fixture {
        fn new() -> Self {
            let users = Arc::new(InMemoryUserRepository::new());
            let trips = Arc::new(InMemoryTripRepository::new());
            Self {
                service: TripService::new(trips, users.clone()),
                users,
            }
        }

        async fn user(&self, name: &str) -> Uuid {
            let user = User::new(
                name.into(),
                format!("{}@example.com", name.to_lowercase()),
                "hash".into(),
                None,
                false,
            );
            self.users.create(user).await.unwrap().id
        }
    }

    fn fields(seats: u16) -> NewTrip {
        let departure = (Utc::now() + Duration::hours(3)).trunc_subsecs(6);
        NewTrip {
            start_location: Location::new("Harbour Rd 4").with_coordinates(53.55, 9.99),
            end_location: Location::new("Central Station"),
            departure_time: departure,
            arrival_time: departure + Duration::minutes(25),
            available_seats: seats,
            status: TripStatus::Scheduled,
        }
    }

    fn join(user_id: Uuid) -> JoinRequest {
        JoinRequest {
            user_id,
            pickup_location: None,
            dropoff_location: None,
        }
    }

    #[tokio::test]
    async fn capacity_scenario_two_seats_three_riders() {
        let fx = Fixture::new();
        let driver = fx.user("Dana").await;
        let (a, b, c) = (fx.user("Avi").await, fx.user("Bea").await, fx.user("Cal").await);
        let onlooker = fx.user("Olu").await;

        let trip = fx.service.create_trip(driver, fields(2)).await.unwrap();

        let after_a = fx.service.join_trip(trip.id, join(a)).await.unwrap();
        assert_eq!(after_a.viewer_status, Some(ViewerStatus::IsPassenger));
        let seen = fx.service.get_trip(trip.id, Some(onlooker)).await.unwrap();
        assert_eq!(seen.viewer_status, Some(ViewerStatus::SeatsAvailable { seats: 1 }));

        fx.service.join_trip(trip.id, join(b)).await.unwrap();
        let seen = fx.service.get_trip(trip.id, Some(onlooker)).await.unwrap();
        assert_eq!(seen.viewer_status, Some(ViewerStatus::Full));

        let err = fx.service.join_trip(trip.id, join(c)).await.unwrap_err();
        assert!(matches!(err, DomainError::NoAvailableSeats(_)));

        let riders: Vec<Uuid> = fx
            .service
            .get_trip(trip.id, None)
            .await
            .unwrap()
            .passengers
            .iter()
            .map(|p| p.user.id)
            .collect();
        assert_eq!(riders, vec![a, b]);
    }

    #[tokio::test]
    async fn a_full_trip_reports_capacity_before_payload_problems() {
        let fx = Fixture::new();
        let driver = fx.user("Dana").await;
        let trip = fx.service.create_trip(driver, fields(0)).await.unwrap();

        let err = fx
            .service
            .join_trip(trip.id, join(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NoAvailableSeats(_)));

        let rider = fx.user("Rae").await;
        let blank_pickup = JoinRequest {
            user_id: rider,
            pickup_location: Some(Location::new(" ")),
            dropoff_location: None,
        };
        let err = fx.service.join_trip(trip.id, blank_pickup).await.unwrap_err();
        assert!(matches!(err, DomainError::NoAvailableSeats(_)));
    }

    #[tokio::test]
    async fn joining_a_missing_trip_mutates_nothing() {
        let fx = Fixture::new();
        let driver = fx.user("Dana").await;
        let rider = fx.user("Rae").await;
        fx.service.create_trip(driver, fields(1)).await.unwrap();

        let err = fx
            .service
            .join_trip(Uuid::new_v4(), join(rider))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::TripNotFound(_)));

        let trips = fx.service.list_trips(None).await.unwrap();
        assert!(trips.iter().all(|t| t.passengers.is_empty()));
    }

    #[tokio::test]
    async fn created_trip_lists_back_with_identical_fields() {
        let fx = Fixture::new();
        let driver = fx.user("Dana").await;
        let input = fields(4);

        let created = fx.service.create_trip(driver, input.clone()).await.unwrap();
        let listed = fx.service.list_trips(None).await.unwrap();

        assert_eq!(listed.len(), 1);
        let trip = &listed[0];
        assert_eq!(trip.id, created.id);
        assert_eq!(trip.start_location, input.start_location);
        assert_eq!(trip.end_location, input.end_location);
        assert_eq!(trip.departure_time, input.departure_time);
        assert_eq!(trip.arrival_time, input.arrival_time);
        assert_eq!(trip.available_seats, 4);
        assert_eq!(trip.remaining_seats, 4);
        assert_eq!(trip.driver.name, "Dana");
        assert_eq!(trip.status, TripStatus::Scheduled);
        assert!(trip.viewer_status.is_none());
    }

    #[tokio::test]
    async fn pickup_and_dropoff_default_to_the_route_ends() {
        let fx = Fixture::new();
        let driver = fx.user("Dana").await;
        let rider = fx.user("Rae").await;
        let trip = fx.service.create_trip(driver, fields(2)).await.unwrap();

        let joined = fx.service.join_trip(trip.id, join(rider)).await.unwrap();
        let seat = &joined.passengers[0];
        assert_eq!(seat.pickup_location, trip.start_location);
        assert_eq!(seat.dropoff_location, trip.end_location);
        assert_eq!(seat.user.email, "rae@example.com");
    }

    #[tokio::test]
    async fn explicit_pickup_is_kept() {
        let fx = Fixture::new();
        let driver = fx.user("Dana").await;
        let rider = fx.user("Rae").await;
        let trip = fx.service.create_trip(driver, fields(2)).await.unwrap();

        let request = JoinRequest {
            user_id: rider,
            pickup_location: Some(Location::new("Bakery on 5th")),
            dropoff_location: None,
        };
        let joined = fx.service.join_trip(trip.id, request).await.unwrap();
        assert_eq!(joined.passengers[0].pickup_location.address, "Bakery on 5th");
        assert_eq!(joined.passengers[0].dropoff_location, trip.end_location);
    }

    #[tokio::test]
    async fn user_trips_cover_driving_and_riding_only() {
        let fx = Fixture::new();
        let dana = fx.user("Dana").await;
        let eli = fx.user("Eli").await;
        let rae = fx.user("Rae").await;

        let driven = fx.service.create_trip(dana, fields(2)).await.unwrap();
        let ridden = fx.service.create_trip(eli, fields(2)).await.unwrap();
        let unrelated = fx.service.create_trip(eli, fields(2)).await.unwrap();
        fx.service.join_trip(ridden.id, join(dana)).await.unwrap();
        fx.service.join_trip(unrelated.id, join(rae)).await.unwrap();

        let mine = fx
            .service
            .list_trips_for_user(dana, Some(dana))
            .await
            .unwrap();
        let ids: Vec<Uuid> = mine.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![driven.id, ridden.id]);
        assert_eq!(mine[0].viewer_status, Some(ViewerStatus::IsDriver));
        assert_eq!(mine[1].viewer_status, Some(ViewerStatus::IsPassenger));
    }

    #[tokio::test]
    async fn unknown_people_are_validation_failures() {
        let fx = Fixture::new();
        let err = fx
            .service
            .create_trip(Uuid::new_v4(), fields(2))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let driver = fx.user("Dana").await;
        let trip = fx.service.create_trip(driver, fields(2)).await.unwrap();
        let err = fx
            .service
            .join_trip(trip.id, join(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn blank_addresses_are_rejected() {
        let fx = Fixture::new();
        let driver = fx.user("Dana").await;
        let mut input = fields(2);
        input.end_location = Location::new("   ");
        let err = fx.service.create_trip(driver, input).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("endLocation")));
    }

    #[tokio::test]
    async fn zero_seat_trips_are_accepted_but_cannot_be_joined() {
        let fx = Fixture::new();
        let driver = fx.user("Dana").await;
        let rider = fx.user("Rae").await;
        let trip = fx.service.create_trip(driver, fields(0)).await.unwrap();
        assert_eq!(trip.remaining_seats, 0);

        let err = fx.service.join_trip(trip.id, join(rider)).await.unwrap_err();
        assert!(matches!(err, DomainError::NoAvailableSeats(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn simultaneous_joins_on_the_last_seat_admit_exactly_one() {
        let fx = Fixture::new();
        let driver = fx.user("Dana").await;
        let first = fx.user("Avi").await;
        let second = fx.user("Bea").await;
        let trip = fx.service.create_trip(driver, fields(1)).await.unwrap();

        let (left, right) = tokio::join!(
            tokio::spawn({
                let service = fx.service.clone();
                async move { service.join_trip(trip.id, join(first)).await }
            }),
            tokio::spawn({
                let service = fx.service.clone();
                async move { service.join_trip(trip.id, join(second)).await }
            }),
        );
        let outcomes = [left.unwrap(), right.unwrap()];

        let admitted = outcomes.iter().filter(|r| r.is_ok()).count();
        let refused = outcomes
            .iter()
            .filter(|r| matches!(r, Err(DomainError::NoAvailableSeats(_))))
            .count();
        assert_eq!((admitted, refused), (1, 1));

        let stored = fx.service.get_trip(trip.id, None).await.unwrap();
        assert_eq!(stored.passengers.len(), 1);
    }
}
