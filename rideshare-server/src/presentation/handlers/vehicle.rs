use crate::application::vehicle_service::VehicleService;
use crate::domain::error::DomainError;
use crate::presentation::dto::CreateVehicleRequest;
use crate::presentation::utils::{AuthenticatedUser, request_id, resolve_actor};
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::info;
use uuid::Uuid;

#[post("/vehicles")]
pub async fn create_vehicle(
    req: HttpRequest,
    user: Option<AuthenticatedUser>,
    vehicles: web::Data<VehicleService>,
    payload: web::Json<CreateVehicleRequest>,
) -> Result<HttpResponse, DomainError> {
    let (owner, input) = payload.into_inner().into_parts();
    let owner_id = resolve_actor(owner, user.as_ref(), "owner")?;
    let vehicle = vehicles.register_vehicle(owner_id, input).await?;

    info!(
        request_id = %request_id(&req),
        vehicle_id = %vehicle.id,
        owner_id = %owner_id,
        "vehicle registered"
    );

    Ok(HttpResponse::Created().json(vehicle))
}

#[get("/vehicles/{vehicle_id}")]
pub async fn get_vehicle(
    vehicles: web::Data<VehicleService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let vehicle = vehicles.get_vehicle(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(vehicle))
}

#[cfg(test)]
mod tests {
    use crate::presentation::handlers::testing::TestApp;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn vehicle_registration_links_owner_profile() {
        let ctx = TestApp::new();
        let app = test::init_service(ctx.app()).await;
        let owner = ctx.user("Dana", true).await;

        let req = test::TestRequest::post()
            .uri("/api/vehicles")
            .insert_header(("Authorization", ctx.bearer(owner.id)))
            .set_json(json!({
                "make": "Tesla",
                "model": "Model 3",
                "year": 2022,
                "batteryCapacity": 75.0,
                "currentBattery": 60.0
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let vehicle: Value = test::read_body_json(resp).await;
        assert_eq!(vehicle["owner"], json!(owner.id));

        let req = test::TestRequest::get()
            .uri(&format!("/api/vehicles/{}", vehicle["id"].as_str().unwrap()))
            .to_request();
        let fetched: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched["model"], "Model 3");

        let req = test::TestRequest::get()
            .uri("/api/current_user")
            .insert_header(("Authorization", ctx.bearer(owner.id)))
            .to_request();
        let me: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(me["vehicle"], vehicle["id"]);
    }

    #[actix_web::test]
    async fn unknown_vehicle_is_not_found() {
        let ctx = TestApp::new();
        let app = test::init_service(ctx.app()).await;
        let req = test::TestRequest::get()
            .uri(&format!("/api/vehicles/{}", uuid::Uuid::new_v4()))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }
}
