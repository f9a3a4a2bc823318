pub mod auth;
pub mod trip;
pub mod vehicle;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::register)
        .service(auth::login)
        .service(auth::current_user)
        .service(trip::list_trips)
        .service(trip::create_trip)
        .service(trip::get_trip)
        .service(trip::join_trip)
        .service(trip::user_trips)
        .service(vehicle::create_vehicle)
        .service(vehicle::get_vehicle);
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::app::{Services, build_app};
    use crate::data::trip_repository::InMemoryTripRepository;
    use crate::data::user_repository::{InMemoryUserRepository, UserRepository};
    use crate::data::vehicle_repository::InMemoryVehicleRepository;
    use crate::domain::trip::{Location, NewTrip, TripStatus};
    use crate::domain::user::User;
    use crate::infrastructure::security::JwtKeys;
    use actix_web::App;
    use actix_web::body::MessageBody;
    use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    /// In-memory application plus shortcuts for seeding users and trips
    /// without going through HTTP.
    pub(crate) struct TestApp {
        services: Services,
        users: Arc<InMemoryUserRepository>,
        keys: JwtKeys,
    }

    impl TestApp {
        pub(crate) fn new() -> Self {
            let keys = JwtKeys::new("test-secret".into(), 60);
            let users = Arc::new(InMemoryUserRepository::new());
            let services = Services::from_repositories(
                users.clone(),
                Arc::new(InMemoryTripRepository::new()),
                Arc::new(InMemoryVehicleRepository::new(users.clone())),
                keys.clone(),
            );
            Self {
                services,
                users,
                keys,
            }
        }

        pub(crate) fn app(
            &self,
        ) -> App<
            impl ServiceFactory<
                ServiceRequest,
                Config = (),
                Response = ServiceResponse<impl MessageBody + use<>>,
                Error = actix_web::Error,
                InitError = (),
            > + use<>,
        > {
            build_app(&self.services, &[])
        }

        pub(crate) async fn user(&self, name: &str, is_driver: bool) -> User {
            let user = User::new(
                name.into(),
                format!("{}@example.com", name.to_lowercase()),
                "unused-hash".into(),
                None,
                is_driver,
            );
            self.users.create(user).await.unwrap()
        }

        pub(crate) async fn trip(&self, driver_id: Uuid, seats: u16) -> Uuid {
            let departure = Utc::now() + Duration::hours(2);
            let fields = NewTrip {
                start_location: Location::new("Depot"),
                end_location: Location::new("Campus"),
                departure_time: departure,
                arrival_time: departure + Duration::minutes(30),
                available_seats: seats,
                status: TripStatus::Scheduled,
            };
            self.services
                .trips
                .create_trip(driver_id, fields)
                .await
                .unwrap()
                .id
        }

        pub(crate) fn bearer(&self, user_id: Uuid) -> String {
            format!("Bearer {}", self.keys.generate_token(user_id).unwrap())
        }
    }
}
