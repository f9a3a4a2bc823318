mod error;
mod http_client;
pub mod models;

pub use error::RideshareClientError;
pub use http_client::RideshareHttpClient;

use async_trait::async_trait;
use models::{
    CreateTrip, CreateVehicle, JoinTrip, LoginResponse, NewUser, Trip, User, Vehicle,
};
use uuid::Uuid;

/// Operations exposed by the rideshare API. Calls that act "as me" use the
/// bearer token the client was built with.
#[async_trait(?Send)]
pub trait RideshareClient {
    async fn register(&self, user: NewUser) -> Result<User, RideshareClientError>;
    async fn login(&self, email: &str, password: &str)
    -> Result<LoginResponse, RideshareClientError>;
    async fn logout(&self) -> Result<(), RideshareClientError>;
    async fn current_user(&self) -> Result<User, RideshareClientError>;

    async fn list_trips(&self) -> Result<Vec<Trip>, RideshareClientError>;
    async fn get_trip(&self, id: Uuid) -> Result<Trip, RideshareClientError>;
    async fn user_trips(&self, user_id: Uuid) -> Result<Vec<Trip>, RideshareClientError>;
    async fn create_trip(&self, trip: CreateTrip) -> Result<Trip, RideshareClientError>;
    async fn join_trip(&self, trip_id: Uuid, join: JoinTrip)
    -> Result<Trip, RideshareClientError>;

    async fn register_vehicle(&self, vehicle: CreateVehicle)
    -> Result<Vehicle, RideshareClientError>;
    async fn get_vehicle(&self, id: Uuid) -> Result<Vehicle, RideshareClientError>;
}
