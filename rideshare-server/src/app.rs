use std::sync::Arc;

use crate::application::auth_service::AuthService;
use crate::application::trip_service::TripService;
use crate::application::vehicle_service::VehicleService;
use crate::data::trip_repository::{InMemoryTripRepository, PostgresTripRepository, TripRepository};
use crate::data::user_repository::{InMemoryUserRepository, PostgresUserRepository, UserRepository};
use crate::data::vehicle_repository::{
    InMemoryVehicleRepository, PostgresVehicleRepository, VehicleRepository,
};
use crate::domain::error::DomainError;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::security::JwtKeys;
use crate::presentation::handlers;
use crate::presentation::middleware::{JwtAuthMiddleware, RequestIdMiddleware, TimingMiddleware};
use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::DefaultHeaders;
use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub trips: TripService,
    pub vehicles: VehicleService,
}

impl Services {
    pub fn from_repositories(
        users: Arc<dyn UserRepository>,
        trips: Arc<dyn TripRepository>,
        vehicles: Arc<dyn VehicleRepository>,
        keys: JwtKeys,
    ) -> Self {
        Self {
            auth: AuthService::new(Arc::clone(&users), keys),
            trips: TripService::new(trips, Arc::clone(&users)),
            vehicles: VehicleService::new(vehicles, users),
        }
    }

    pub fn postgres(pool: PgPool, keys: JwtKeys) -> Self {
        Self::from_repositories(
            Arc::new(PostgresUserRepository::new(pool.clone())),
            Arc::new(PostgresTripRepository::new(pool.clone())),
            Arc::new(PostgresVehicleRepository::new(pool)),
            keys,
        )
    }

    pub fn in_memory(keys: JwtKeys) -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        Self::from_repositories(
            users.clone(),
            Arc::new(InMemoryTripRepository::new()),
            Arc::new(InMemoryVehicleRepository::new(users)),
            keys,
        )
    }
}

/// Builds the full application: middleware stack, JSON error handling and
/// every `/api` route. Shared by the server and the handler tests.
pub fn build_app(
    services: &Services,
    cors_origins: &[String],
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody + use<>>,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        DomainError::validation(format!("invalid JSON payload: {err}")).into()
    });
    let path_config = web::PathConfig::default().error_handler(|err, _req| {
        DomainError::validation(format!("invalid path parameter: {err}")).into()
    });

    App::new()
        .wrap(
            DefaultHeaders::new()
                .add(("X-Content-Type-Options", "nosniff"))
                .add(("Referrer-Policy", "no-referrer"))
                .add(("Permissions-Policy", "geolocation=()"))
                .add(("Cross-Origin-Opener-Policy", "same-origin")),
        )
        .wrap(build_cors(cors_origins))
        .wrap(TimingMiddleware)
        .wrap(RequestIdMiddleware)
        .app_data(json_config)
        .app_data(path_config)
        .app_data(web::Data::new(services.auth.clone()))
        .app_data(web::Data::new(services.trips.clone()))
        .app_data(web::Data::new(services.vehicles.clone()))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(health))
                // Logout must succeed even with a stale token.
                .service(handlers::auth::logout)
                .service(
                    web::scope("")
                        .wrap(JwtAuthMiddleware::new(services.auth.keys().clone()))
                        .configure(handlers::configure),
                ),
        )
}

pub async fn start_rest_server(config: AppConfig, services: Services) -> anyhow::Result<()> {
    let bind_address = (config.host.clone(), config.port);

    info!(
        host = %bind_address.0,
        port = bind_address.1,
        storage = ?config.storage,
        "HTTP server starting"
    );

    HttpServer::new(move || build_app(&services, &config.cors_origins))
        .bind(bind_address)?
        .run()
        .await
        .map_err(anyhow::Error::new)?;

    info!("HTTP server stopped");
    Ok(())
}

fn build_cors(origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::AUTHORIZATION,
        ])
        .supports_credentials()
        .max_age(3600);

    for origin in origins {
        cors = match origin.as_str() {
            "*" => cors.allow_any_origin(),
            exact => cors.allowed_origin(exact),
        };
    }

    cors
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use crate::presentation::handlers::testing::TestApp;
    use actix_web::test;
    use serde_json::Value;

    #[actix_web::test]
    async fn health_and_response_headers() {
        let ctx = TestApp::new();
        let app = test::init_service(ctx.app()).await;

        let req = test::TestRequest::get()
            .uri("/api/health")
            .insert_header(("x-request-id", "req-42"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let headers = resp.headers();
        assert_eq!(headers.get("x-request-id").unwrap(), "req-42");
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert!(
            headers
                .get("server-timing")
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("app;dur=")
        );

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "ok");
    }

    #[actix_web::test]
    async fn request_id_is_generated_when_absent() {
        let ctx = TestApp::new();
        let app = test::init_service(ctx.app()).await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        let rid = resp.headers().get("x-request-id").unwrap().to_str().unwrap();
        assert!(uuid::Uuid::parse_str(rid).is_ok());
    }
}
