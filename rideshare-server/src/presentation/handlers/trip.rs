use crate::application::trip_service::TripService;
use crate::domain::error::DomainError;
use crate::presentation::dto::{CreateTripRequest, JoinTripRequest};
use crate::presentation::utils::{AuthenticatedUser, request_id, resolve_actor};
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::info;
use uuid::Uuid;

#[get("/trips")]
pub async fn list_trips(
    req: HttpRequest,
    viewer: Option<AuthenticatedUser>,
    trips: web::Data<TripService>,
) -> Result<HttpResponse, DomainError> {
    let listed = trips.list_trips(viewer.map(|v| v.id)).await?;

    info!(
        request_id = %request_id(&req),
        count = listed.len(),
        "trips retrieved"
    );

    Ok(HttpResponse::Ok().json(listed))
}

#[post("/trips")]
pub async fn create_trip(
    req: HttpRequest,
    user: Option<AuthenticatedUser>,
    trips: web::Data<TripService>,
    payload: web::Json<CreateTripRequest>,
) -> Result<HttpResponse, DomainError> {
    let (driver, fields) = payload.into_inner().into_parts();
    let driver_id = resolve_actor(driver, user.as_ref(), "driver")?;
    let trip = trips.create_trip(driver_id, fields).await?;

    info!(
        request_id = %request_id(&req),
        trip_id = %trip.id,
        driver_id = %driver_id,
        "trip created"
    );

    Ok(HttpResponse::Created().json(trip))
}

#[get("/trips/{trip_id}")]
pub async fn get_trip(
    viewer: Option<AuthenticatedUser>,
    trips: web::Data<TripService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let trip = trips
        .get_trip(path.into_inner(), viewer.map(|v| v.id))
        .await?;
    Ok(HttpResponse::Ok().json(trip))
}

/// The body is optional: an empty POST joins as the token holder with the
/// trip's own start and end as pickup and dropoff.
#[post("/trips/{trip_id}/join")]
pub async fn join_trip(
    req: HttpRequest,
    user: Option<AuthenticatedUser>,
    trips: web::Data<TripService>,
    path: web::Path<Uuid>,
    body: web::Bytes,
) -> Result<HttpResponse, DomainError> {
    let trip_id = path.into_inner();
    let payload: JoinTripRequest = if body.iter().all(u8::is_ascii_whitespace) {
        JoinTripRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| DomainError::validation(format!("invalid join payload: {e}")))?
    };
    let user_id = resolve_actor(payload.user, user.as_ref(), "user")?;

    let trip = trips
        .join_trip(trip_id, payload.into_request(user_id))
        .await?;

    info!(
        request_id = %request_id(&req),
        trip_id = %trip_id,
        user_id = %user_id,
        remaining = trip.remaining_seats,
        "trip joined"
    );

    Ok(HttpResponse::Ok().json(trip))
}

#[get("/users/{user_id}/trips")]
pub async fn user_trips(
    req: HttpRequest,
    viewer: Option<AuthenticatedUser>,
    trips: web::Data<TripService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let user_id = path.into_inner();
    let listed = trips
        .list_trips_for_user(user_id, viewer.map(|v| v.id))
        .await?;

    info!(
        request_id = %request_id(&req),
        user_id = %user_id,
        count = listed.len(),
        "user trips retrieved"
    );

    Ok(HttpResponse::Ok().json(listed))
}
