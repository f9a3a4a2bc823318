use crate::RideshareClient;
use crate::error::RideshareClientError;
use crate::models::{
    CreateTrip, CreateVehicle, JoinTrip, LoginResponse, NewUser, Trip, User, Vehicle,
};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct RideshareHttpClient {
    client: Arc<Client>,
    base_url: String,
    token: Option<String>,
}

impl RideshareHttpClient {
    pub fn connect(endpoint: &str) -> Result<Self, RideshareClientError> {
        let base_url = endpoint.trim_end_matches('/').to_string();
        Ok(Self {
            client: Arc::new(Client::builder().build()?),
            base_url,
            token: None,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder, RideshareClientError> {
        match &self.token {
            Some(token) => {
                let header = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                    RideshareClientError::Unauthorized("stored token is not a valid header".into())
                })?;
                Ok(req.header(AUTHORIZATION, header))
            }
            None => Ok(req),
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, RideshareClientError> {
        let resp = self.authorized(req)?.send().await?;

        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            Err(RideshareClientError::from_http_response(resp).await)
        }
    }
}

#[async_trait(?Send)]
impl RideshareClient for RideshareHttpClient {
    async fn register(&self, user: NewUser) -> Result<User, RideshareClientError> {
        self.send(self.client.post(self.url("/users")).json(&user))
            .await
    }

    async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<LoginResponse, RideshareClientError> {
        let req = self
            .client
            .post(self.url("/login"))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }));
        self.send(req).await
    }

    async fn logout(&self) -> Result<(), RideshareClientError> {
        let _: serde_json::Value = self.send(self.client.post(self.url("/logout"))).await?;
        Ok(())
    }

    async fn current_user(&self) -> Result<User, RideshareClientError> {
        if self.token.is_none() {
            return Err(RideshareClientError::Unauthorized("not logged in".into()));
        }
        self.send(self.client.get(self.url("/current_user"))).await
    }

    async fn list_trips(&self) -> Result<Vec<Trip>, RideshareClientError> {
        self.send(self.client.get(self.url("/trips"))).await
    }

    async fn get_trip(&self, id: Uuid) -> Result<Trip, RideshareClientError> {
        self.send(self.client.get(self.url(&format!("/trips/{id}"))))
            .await
    }

    async fn user_trips(&self, user_id: Uuid) -> Result<Vec<Trip>, RideshareClientError> {
        self.send(self.client.get(self.url(&format!("/users/{user_id}/trips"))))
            .await
    }

    async fn create_trip(&self, trip: CreateTrip) -> Result<Trip, RideshareClientError> {
        self.send(self.client.post(self.url("/trips")).json(&trip))
            .await
    }

    async fn join_trip(&self, trip_id: Uuid, join: JoinTrip) -> Result<Trip, RideshareClientError> {
        let req = self
            .client
            .post(self.url(&format!("/trips/{trip_id}/join")))
            .json(&join);
        self.send(req).await
    }

    async fn register_vehicle(
        &self,
        vehicle: CreateVehicle,
    ) -> Result<Vehicle, RideshareClientError> {
        self.send(self.client.post(self.url("/vehicles")).json(&vehicle))
            .await
    }

    async fn get_vehicle(&self, id: Uuid) -> Result<Vehicle, RideshareClientError> {
        self.send(self.client.get(self.url(&format!("/vehicles/{id}"))))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_rooted_under_api() {
        let client = RideshareHttpClient::connect("http://localhost:8080/").unwrap();
        assert_eq!(client.url("/trips"), "http://localhost:8080/api/trips");
    }

    #[test]
    fn blank_tokens_are_dropped() {
        let client = RideshareHttpClient::connect("http://localhost:8080")
            .unwrap()
            .with_token(Some("  ".into()));
        assert!(client.token().is_none());

        let client = client.with_token(Some("abc".into()));
        assert_eq!(client.token(), Some("abc"));
    }

    #[test]
    fn bearer_header_is_attached_when_logged_in() {
        let client = RideshareHttpClient::connect("http://localhost:8080")
            .unwrap()
            .with_token(Some("abc".into()));
        let req = client
            .authorized(client.client.get(client.url("/trips")))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(req.headers().get(AUTHORIZATION).unwrap(), "Bearer abc");
    }
}
