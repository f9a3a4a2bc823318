use actix_web::dev::Payload;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{Ready, ready};
use uuid::Uuid;

use crate::application::auth_service::AuthService;
use crate::domain::error::DomainError;
use crate::infrastructure::security::JwtKeys;
use crate::presentation::middleware::RequestId;

/// Picks the user an operation acts for: the id named in the body, else the
/// bearer-token identity. A body naming someone other than the token holder
/// is refused.
pub fn resolve_actor(
    claimed: Option<Uuid>,
    session: Option<&AuthenticatedUser>,
    field: &str,
) -> Result<Uuid, DomainError> {
    match (claimed, session) {
        (Some(claimed), Some(user)) if claimed != user.id => Err(DomainError::Forbidden),
        (Some(claimed), _) => Ok(claimed),
        (None, Some(user)) => Ok(user.id),
        (None, None) => Err(DomainError::validation(format!("{field} is required"))),
    }
}

pub fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub name: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(DomainError::Unauthorized.into())),
        }
    }
}

pub async fn extract_user_from_token(
    token: &str,
    keys: &JwtKeys,
    auth_service: &AuthService,
) -> Result<AuthenticatedUser, DomainError> {
    let claims = keys
        .verify_token(token)
        .map_err(|_| DomainError::Unauthorized)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| DomainError::Unauthorized)?;

    let user = auth_service
        .get_user(user_id)
        .await
        .map_err(|_| DomainError::Unauthorized)?;

    Ok(AuthenticatedUser {
        id: user.id,
        name: user.name,
    })
}
