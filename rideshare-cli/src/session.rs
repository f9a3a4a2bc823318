use rideshare_client::RideshareClientError;
use rideshare_client::models::{LoginResponse, User};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use uuid::Uuid;

/// Who is logged in, persisted between CLI invocations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<SessionUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_driver: bool,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_driver: user.is_driver,
        }
    }
}

impl Session {
    pub fn from_login(login: &LoginResponse) -> Self {
        Self {
            token: Some(login.access_token.clone()),
            user: Some(SessionUser::from(&login.user)),
        }
    }

    /// A missing file is an anonymous session.
    pub fn load(path: &Path) -> io::Result<Self> {
        match fs::read_to_string(path) {
            Ok(raw) if raw.trim().is_empty() => Ok(Self::default()),
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err),
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, raw)
    }

    pub fn clear(path: &Path) -> io::Result<()> {
        match fs::remove_file(path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }

    /// Drops the session file whatever the server answered to logout. A token
    /// the server already rejects counts as logged out.
    pub fn finish_logout(
        path: &Path,
        outcome: Result<(), RideshareClientError>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        Self::clear(path)?;
        match outcome {
            Ok(()) | Err(RideshareClientError::Unauthorized(_)) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user.as_ref().map(|u| u.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logged_in() -> Session {
        Session {
            token: Some("jwt".into()),
            user: Some(SessionUser {
                id: Uuid::new_v4(),
                name: "Rae".into(),
                email: "rae@example.com".into(),
                is_driver: false,
            }),
        }
    }

    #[test]
    fn missing_file_is_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::load(&dir.path().join("nope")).unwrap();
        assert_eq!(session, Session::default());
        assert!(session.user_id().is_none());
    }

    #[test]
    fn save_load_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let session = logged_in();

        session.save(&path).unwrap();
        let loaded = Session::load(&path).unwrap();
        assert_eq!(loaded, session);
        assert_eq!(loaded.user_id(), session.user_id());

        Session::clear(&path).unwrap();
        assert!(!path.exists());
        Session::clear(&path).unwrap();
    }

    #[test]
    fn logout_clears_the_file_even_when_the_token_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        logged_in().save(&path).unwrap();
        Session::finish_logout(
            &path,
            Err(RideshareClientError::Unauthorized("token expired".into())),
        )
        .unwrap();
        assert!(!path.exists());

        logged_in().save(&path).unwrap();
        let err = Session::finish_logout(
            &path,
            Err(RideshareClientError::Server {
                status: 503,
                message: "down".into(),
            }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("down"));
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        let err = Session::load(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
