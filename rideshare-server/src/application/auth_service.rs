use std::sync::Arc;

use tracing::{instrument, warn};

use crate::data::user_repository::UserRepository;
use crate::domain::{error::DomainError, user::User};
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};

#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UserRepository>, keys: JwtKeys) -> Self {
        Self { repo, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn get_user(&self, id: uuid::Uuid) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::UserNotFound(id))
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: String,
        email: String,
        password: String,
        phone: Option<String>,
        is_driver: bool,
    ) -> Result<User, DomainError> {
        let name = name.trim().to_string();
        let email = email.trim().to_lowercase();
        if name.is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        if !email.contains('@') {
            return Err(DomainError::validation("a valid email is required"));
        }
        if password.is_empty() {
            return Err(DomainError::validation("password is required"));
        }
        let phone = phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());

        let hash =
            hash_password(&password).map_err(|err| DomainError::Internal(err.to_string()))?;
        let user = User::new(name, email, hash, phone, is_driver);
        self.repo.create(user).await
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), DomainError> {
        let user = self
            .repo
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|_| DomainError::Unauthorized)?;
        if !valid {
            warn!(user_id = %user.id, "login with wrong password");
            return Err(DomainError::Unauthorized);
        }

        let token = self
            .keys
            .generate_token(user.id)
            .map_err(|err| DomainError::Internal(err.to_string()))?;
        Ok((user, token))
    }
}
