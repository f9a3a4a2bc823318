use crate::application::auth_service::AuthService;
use crate::domain::error::DomainError;
use crate::presentation::dto::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest};
use crate::presentation::utils::{AuthenticatedUser, request_id};
use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use tracing::info;

#[post("/users")]
pub async fn register(
    req: HttpRequest,
    service: web::Data<AuthService>,
    payload: web::Json<RegisterRequest>,
) -> Result<impl Responder, DomainError> {
    let RegisterRequest {
        name,
        email,
        password,
        phone,
        is_driver,
    } = payload.into_inner();
    let user = service
        .register(name, email, password, phone, is_driver)
        .await?;

    info!(
        request_id = %request_id(&req),
        user_id = %user.id,
        email = %user.email,
        is_driver = user.is_driver,
        "user registered"
    );

    Ok(HttpResponse::Created().json(user))
}

#[post("/login")]
pub async fn login(
    service: web::Data<AuthService>,
    payload: web::Json<LoginRequest>,
) -> Result<impl Responder, DomainError> {
    let (user, jwt) = service.login(&payload.email, &payload.password).await?;

    info!(user_id = %user.id, "user logged in");

    Ok(HttpResponse::Ok().json(LoginResponse {
        user,
        access_token: jwt,
        token_type: "Bearer".to_string(),
        expires_in: service.keys().ttl_seconds(),
    }))
}

/// Tokens are stateless; logging out means the client forgets its token.
#[post("/logout")]
pub async fn logout() -> impl Responder {
    HttpResponse::Ok().json(MessageResponse {
        message: "Logged out successfully",
    })
}

#[get("/current_user")]
pub async fn current_user(
    user: AuthenticatedUser,
    service: web::Data<AuthService>,
) -> Result<impl Responder, DomainError> {
    let user = service.get_user(user.id).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[cfg(test)]
mod tests {
    use crate::presentation::handlers::testing::TestApp;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn register_login_and_whoami() {
        let ctx = TestApp::new();
        let app = test::init_service(ctx.app()).await;

        let req = test::TestRequest::post()
            .uri("/api/users")
            .set_json(json!({
                "name": "Ada",
                "email": "Ada@Example.com",
                "password": "pw",
                "phone": "+49 30 1234",
                "is_driver": true
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["email"], "ada@example.com");
        assert_eq!(created["isDriver"], true);
        assert!(created.get("passwordHash").is_none());
        assert!(created.get("password").is_none());

        let req = test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({"email": "ada@example.com", "password": "pw"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let login: Value = test::read_body_json(resp).await;
        assert_eq!(login["tokenType"], "Bearer");
        assert_eq!(login["user"]["id"], created["id"]);
        let token = login["accessToken"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/api/current_user")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let me: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(me["name"], "Ada");
        assert_eq!(me["phone"], "+49 30 1234");
    }

    #[actix_web::test]
    async fn duplicate_email_is_a_bad_request() {
        let ctx = TestApp::new();
        let app = test::init_service(ctx.app()).await;
        ctx.user("Ada", false).await;

        let req = test::TestRequest::post()
            .uri("/api/users")
            .set_json(json!({"name": "Ada", "email": "ada@example.com", "password": "x"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let err: Value = test::read_body_json(resp).await;
        assert_eq!(err["error"], "email already registered");
    }

    #[actix_web::test]
    async fn anonymous_and_forged_sessions_are_unauthorized() {
        let ctx = TestApp::new();
        let app = test::init_service(ctx.app()).await;

        let req = test::TestRequest::get().uri("/api/current_user").to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );

        let req = test::TestRequest::get()
            .uri("/api/trips")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );

        let req = test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({"email": "ghost@example.com", "password": "pw"}))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn logout_acknowledges() {
        let ctx = TestApp::new();
        let app = test::init_service(ctx.app()).await;
        let req = test::TestRequest::post().uri("/api/logout").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Logged out successfully");
    }

    #[actix_web::test]
    async fn logout_succeeds_with_an_expired_or_forged_token() {
        let ctx = TestApp::new();
        let app = test::init_service(ctx.app()).await;
        let user = ctx.user("Rae", false).await;
        let expired = crate::infrastructure::security::JwtKeys::new("test-secret".into(), -10)
            .generate_token(user.id)
            .unwrap();

        for header in [format!("Bearer {expired}"), "Bearer expired.or.forged".to_string()] {
            let req = test::TestRequest::post()
                .uri("/api/logout")
                .insert_header(("Authorization", header))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        // the same stale token is still refused elsewhere
        let req = test::TestRequest::get()
            .uri("/api/current_user")
            .insert_header(("Authorization", format!("Bearer {expired}")))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
