//! Authentication module.

use crate::db::{Database, Session, User, now_timestamp};
use crate::error::{AppError, Result};
use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::{OsRng, RngCore},
    },
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password using Argon2.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Generate a secure random token.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn validate_password(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password should be {} characters long minimum",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Registration form.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    /// First name.
    pub firstname: &'a str,
    /// Last name.
    pub lastname: &'a str,
    /// E-mail, used as login.
    pub email: &'a str,
    /// Plain text password.
    pub password: &'a str,
}

/// Authentication service.
pub struct AuthService {
    db: Database,
    session_duration_days: u32,
    registration_enabled: bool,
}

impl AuthService {
    /// Create a new auth service.
    pub fn new(db: Database, session_duration_days: u32, registration_enabled: bool) -> Self {
        Self {
            db,
            session_duration_days,
            registration_enabled,
        }
    }

    /// Self-service registration.
    pub fn register(&self, new_user: NewUser<'_>) -> Result<User> {
        if !self.registration_enabled {
            return Err(AppError::PermissionDenied(
                "Registration is disabled".to_string(),
            ));
        }

        self.create_user(new_user)
    }

    /// Create a new user (admin function).
    pub fn create_user(&self, new_user: NewUser<'_>) -> Result<User> {
        let email = new_user.email.trim();
        if email.is_empty() || email.len() > 254 || !email.contains('@') {
            return Err(AppError::Validation("E-mail is not formatted".to_string()));
        }

        if new_user.firstname.trim().is_empty() || new_user.lastname.trim().is_empty() {
            return Err(AppError::Validation(
                "First name and last name are mandatory".to_string(),
            ));
        }

        validate_password(new_user.password)?;

        let password_hash = hash_password(new_user.password)?;

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            firstname: new_user.firstname.trim().to_string(),
            lastname: new_user.lastname.trim().to_string(),
            email: email.to_lowercase(),
            password_hash,
            created_at: now_timestamp(),
            last_login: None,
        };

        self.db.create_user(&user)?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login and create a session.
    pub fn login(&self, email: &str, password: &str) -> Result<(User, String)> {
        let user = self
            .db
            .get_user_by_email(&email.trim().to_lowercase())?
            .ok_or_else(|| AppError::Unauthorized("Invalid e-mail or password".to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized(
                "Invalid e-mail or password".to_string(),
            ));
        }

        self.db.update_user_last_login(&user.id)?;

        let token = generate_token();
        let expires_at = now_timestamp() + (self.session_duration_days as i64 * 24 * 60 * 60);

        let session = Session {
            token: token.clone(),
            user_id: user.id.clone(),
            expires_at,
        };

        self.db.create_session(&session)?;

        Ok((user, token))
    }

    /// Validate a session token and return the user.
    pub fn validate_token(&self, token: &str) -> Result<Option<User>> {
        let session = match self.db.get_session(token)? {
            Some(s) => s,
            None => return Ok(None),
        };

        // Check expiration
        if session.expires_at < now_timestamp() {
            self.db.delete_session(token)?;
            return Ok(None);
        }

        self.db.get_user_by_id(&session.user_id)
    }

    /// Logout (delete session).
    pub fn logout(&self, token: &str) -> Result<()> {
        self.db.delete_session(token)
    }

    /// Change user password.
    pub fn change_password(&self, email: &str, new_password: &str) -> Result<bool> {
        validate_password(new_password)?;

        let password_hash = hash_password(new_password)?;
        self.db
            .update_user_password(&email.trim().to_lowercase(), &password_hash)
    }

    /// Delete a user.
    pub fn delete_user(&self, email: &str) -> Result<bool> {
        self.db.delete_user(&email.trim().to_lowercase())
    }

    /// List all users.
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.db.list_users()
    }
}
