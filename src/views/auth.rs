use serde::Deserialize;

use crate::error::{ClientError, ClientResult};
use crate::models::User;
use crate::session::{SessionProvider, TokenStore};

pub const PASSWORD_MIN_LEN: usize = 6;

const LOGIN_FALLBACK: &str = "Login failed. Please try again.";
const REGISTER_FALLBACK: &str = "Registration failed. Please try again.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    /// Only checks that both fields were filled in.
    pub fn validate(&self) -> ClientResult<()> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ClientError::Validation(
                "Email and password are required".to_string(),
            ));
        }
        Ok(())
    }

    /// Signs in, returning the message to show beside the form on failure.
    pub async fn submit<S: TokenStore>(
        &self,
        sessions: &mut SessionProvider<S>,
    ) -> Result<User, String> {
        self.validate().map_err(|e| e.user_message(LOGIN_FALLBACK))?;
        sessions
            .login(self.email.trim(), &self.password)
            .await
            .map_err(|e| {
                tracing::info!("Login rejected: {}", e);
                e.user_message(LOGIN_FALLBACK)
            })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> ClientResult<()> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ClientError::Validation(
                "Email and password are required".to_string(),
            ));
        }
        if self.password.chars().count() < PASSWORD_MIN_LEN {
            return Err(ClientError::Validation(format!(
                "Password must be at least {PASSWORD_MIN_LEN} characters"
            )));
        }
        if self.password != self.confirm_password {
            return Err(ClientError::Validation("Passwords do not match".to_string()));
        }
        Ok(())
    }

    /// Validates locally, then creates the account. Nothing is sent when
    /// validation fails.
    pub async fn submit<S: TokenStore>(
        &self,
        sessions: &mut SessionProvider<S>,
    ) -> Result<User, String> {
        self.validate().map_err(|e| e.user_message(REGISTER_FALLBACK))?;
        sessions
            .register(self.email.trim(), &self.password)
            .await
            .map_err(|e| {
                tracing::info!("Registration rejected: {}", e);
                e.user_message(REGISTER_FALLBACK)
            })
    }
}
