//! In-memory authentication adapter with Argon2 password hashes.

use std::collections::HashMap;
use std::sync::Arc;

use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{Role, Session, User};

use super::ports::AuthProvider;
use super::AuthError;

pub const MIN_PASSWORD_LEN: usize = 6;

struct StoredUser {
  user: User,
  password_hash: String,
}

#[derive(Clone, Default)]
pub struct InMemoryAuth {
  users: Arc<RwLock<HashMap<String, StoredUser>>>,
  sessions: Arc<RwLock<HashMap<String, Session>>>,
  organizers: Arc<Vec<String>>,
}

impl InMemoryAuth {
  /// `organizers` are e-mails that receive the organizer role on sign-up.
  pub fn new(organizers: &[String]) -> Self {
    Self {
      organizers: Arc::new(organizers.iter().map(|e| normalize_email(e)).collect()),
      ..Self::default()
    }
  }

  async fn open_session(&self, user: User) -> Session {
    let session = Session { token: Uuid::new_v4().simple().to_string(), user, created_at: Utc::now() };
    self.sessions.write().await.insert(session.token.clone(), session.clone());
    session
  }
}

fn normalize_email(email: &str) -> String {
  email.trim().to_lowercase()
}

async fn hash_password(password: String) -> Result<String, AuthError> {
  tokio::task::spawn_blocking(move || {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map(|h| h.to_string())
      .map_err(|e| AuthError::Internal(e.to_string()))
  })
  .await
  .map_err(|e| AuthError::Internal(e.to_string()))?
}

async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
  tokio::task::spawn_blocking(move || {
    let parsed = PasswordHash::new(&hash).map_err(|e| AuthError::Internal(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
  })
  .await
  .map_err(|e| AuthError::Internal(e.to_string()))?
}

#[async_trait::async_trait]
impl AuthProvider for InMemoryAuth {
  #[instrument(level = "info", skip_all)]
  async fn sign_up(&self, email: &str, password: &str, display_name: Option<&str>) -> Result<Session, AuthError> {
    let email = normalize_email(email);
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
      return Err(AuthError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
      return Err(AuthError::WeakPassword);
    }
    if self.users.read().await.contains_key(&email) {
      return Err(AuthError::EmailTaken);
    }

    let password_hash = hash_password(password.to_string()).await?;
    let role = if self.organizers.contains(&email) { Role::Organizer } else { Role::Member };
    let user = User {
      id: Uuid::new_v4(),
      email: email.clone(),
      display_name: display_name.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string),
      role,
    };

    {
      let mut users = self.users.write().await;
      // Another sign-up may have taken the address meanwhile.
      if users.contains_key(&email) {
        return Err(AuthError::EmailTaken);
      }
      users.insert(email, StoredUser { user: user.clone(), password_hash });
    }
    info!(target: "chat", user_id = %user.id, ?role, "User signed up");
    Ok(self.open_session(user).await)
  }

  #[instrument(level = "info", skip_all)]
  async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
    let email = normalize_email(email);
    let (user, hash) = {
      let users = self.users.read().await;
      let stored = users.get(&email).ok_or(AuthError::InvalidCredentials)?;
      (stored.user.clone(), stored.password_hash.clone())
    };
    if !verify_password(password.to_string(), hash).await? {
      return Err(AuthError::InvalidCredentials);
    }
    info!(target: "chat", user_id = %user.id, "User signed in");
    Ok(self.open_session(user).await)
  }

  async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
    self.sessions.write().await.remove(token);
    Ok(())
  }

  async fn session(&self, token: &str) -> Result<Option<Session>, AuthError> {
    Ok(self.sessions.read().await.get(token).cloned())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn sign_up_then_in_and_out() {
    let auth = InMemoryAuth::new(&[]);
    let s = auth.sign_up("Olena@School.ua", "kosmos1", Some("Олена")).await.unwrap();
    assert_eq!(s.user.email, "olena@school.ua");
    assert_eq!(s.user.role, Role::Member);

    let s2 = auth.sign_in("olena@school.ua", "kosmos1").await.unwrap();
    assert_ne!(s.token, s2.token);
    assert_eq!(auth.session(&s2.token).await.unwrap().map(|s| s.user.id), Some(s.user.id));

    auth.sign_out(&s2.token).await.unwrap();
    assert!(auth.session(&s2.token).await.unwrap().is_none());
    assert!(auth.session(&s.token).await.unwrap().is_some());
  }

  #[tokio::test]
  async fn rejects_bad_input_and_wrong_password() {
    let auth = InMemoryAuth::new(&[]);
    assert!(matches!(auth.sign_up("nobody", "kosmos1", None).await, Err(AuthError::InvalidEmail)));
    assert!(matches!(auth.sign_up("a@b.ua", "123", None).await, Err(AuthError::WeakPassword)));
    auth.sign_up("a@b.ua", "kosmos1", None).await.unwrap();
    assert!(matches!(auth.sign_up("A@B.ua", "kosmos2", None).await, Err(AuthError::EmailTaken)));
    assert!(matches!(auth.sign_in("a@b.ua", "wrong!!").await, Err(AuthError::InvalidCredentials)));
    assert!(matches!(auth.sign_in("x@b.ua", "kosmos1").await, Err(AuthError::InvalidCredentials)));
  }

  #[tokio::test]
  async fn configured_emails_become_organizers() {
    let auth = InMemoryAuth::new(&["Mentor@School.ua".to_string()]);
    let s = auth.sign_up("mentor@school.ua", "secret1", None).await.unwrap();
    assert!(s.user.is_organizer());
  }
}
