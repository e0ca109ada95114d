//! Sign-up, log-in and session resolution.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::error::{AppError, FieldErrors, Result};
use crate::forms::{LoginForm, SignupForm};
use crate::models::{Identity, User};
use crate::traits::{AuthProvider, UserRepo};

/// How long a session cookie stays valid.
pub const SESSION_TTL_DAYS: i64 = 14;

/// An opened session: the token goes to the client, the user to the request.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

pub struct Accounts {
    users: Arc<dyn UserRepo>,
    auth: Arc<dyn AuthProvider>,
}

impl Accounts {
    pub fn new(users: Arc<dyn UserRepo>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { users, auth }
    }

    /// Maps a session cookie to the requester. Missing, unknown and expired
    /// tokens all mean anonymous.
    pub async fn resolve(&self, token: Option<&str>) -> Result<Identity> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(Identity::Anonymous);
        };
        let digest = self.auth.token_digest(token);
        Ok(match self.users.get_session_user(&digest).await? {
            Some(user) => Identity::User(user),
            None => Identity::Anonymous,
        })
    }

    /// Creates an account without opening a session.
    pub async fn register(&self, username: &str, password: &str) -> Result<User> {
        if self.users.get_user_by_username(username).await?.is_some() {
            return Err(AppError::Conflict(format!("username {username} is taken")));
        }
        let hash = self.auth.hash_password(password)?;
        let user = User::new(username);
        self.users.create_user(user.clone(), &hash).await?;
        log::info!("registered user {}", user.username);
        Ok(user)
    }

    pub async fn signup(&self, form: &SignupForm) -> Result<std::result::Result<Session, FieldErrors>> {
        let (username, password) = match form.validate() {
            Ok(values) => values,
            Err(errors) => return Ok(Err(errors)),
        };
        if self.users.get_user_by_username(&username).await?.is_some() {
            let mut errors = FieldErrors::new();
            errors.add("username", "A user with that username already exists.");
            return Ok(Err(errors));
        }
        let user = self.register(&username, &password).await?;
        Ok(Ok(self.open_session(user).await?))
    }

    pub async fn login(&self, form: &LoginForm) -> Result<std::result::Result<Session, FieldErrors>> {
        let (username, password) = match form.validate() {
            Ok(values) => values,
            Err(errors) => return Ok(Err(errors)),
        };
        let Some((user, hash)) = self.users.get_credentials(&username).await? else {
            return Ok(Err(LoginForm::invalid_credentials()));
        };
        if !self.auth.verify_password(&password, &hash).await {
            log::warn!("failed login for {username}");
            return Ok(Err(LoginForm::invalid_credentials()));
        }
        log::info!("{} logged in", user.username);
        Ok(Ok(self.open_session(user).await?))
    }

    pub async fn logout(&self, token: Option<&str>) -> Result<()> {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.users.delete_session(&self.auth.token_digest(token)).await?;
        }
        Ok(())
    }

    async fn open_session(&self, user: User) -> Result<Session> {
        let token = self.auth.new_session_token()?;
        let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);
        self.users
            .create_session(&self.auth.token_digest(&token), user.id, expires_at)
            .await?;
        Ok(Session { token, user })
    }
}
