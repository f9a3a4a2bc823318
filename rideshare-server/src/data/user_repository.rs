use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::error::DomainError;
use crate::domain::user::User;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> Result<User, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, DomainError>;
}

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, phone, is_driver, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(user.is_driver)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create user: {}", e);
            if e.as_database_error()
                .and_then(|db| db.constraint())
                .map(|c| c.contains("users_email"))
                == Some(true)
            {
                DomainError::UserAlreadyExists(user.email.clone())
            } else {
                DomainError::Internal(format!("database error: {}", e))
            }
        })?;

        info!(user_id = %user.id, email = %user.email, "user created");
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, phone, is_driver, vehicle_id, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to find user by email {}: {}", email, e);
            DomainError::Internal(format!("database error: {}", e))
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, phone, is_driver, vehicle_id, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to find user by id {}: {}", id, e);
            DomainError::Internal(format!("database error: {}", e))
        })
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, DomainError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, phone, is_driver, vehicle_id, created_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to load {} users: {}", ids.len(), e);
            DomainError::Internal(format!("database error: {}", e))
        })
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link_vehicle(&self, id: Uuid, vehicle_id: Uuid) -> Result<(), DomainError> {
        let mut users = self.users.write().map_err(poisoned)?;
        let user = users.get_mut(&id).ok_or(DomainError::UserNotFound(id))?;
        user.vehicle_id = Some(vehicle_id);
        Ok(())
    }
}

fn poisoned<T>(_: T) -> DomainError {
    DomainError::Internal("user store lock poisoned".into())
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut users = self.users.write().map_err(poisoned)?;
        if users.values().any(|u| u.email == user.email) {
            return Err(DomainError::UserAlreadyExists(user.email));
        }
        users.insert(user.id, user.clone());
        info!(user_id = %user.id, email = %user.email, "user created");
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, DomainError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }
}
