use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    db::{DbPool, user_store::UserStore},
    error::{AppError, Result},
    models::user::{Principal, UserDto},
};

/// Bearer-token claims for an admin session
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub admin: bool,
    pub exp: i64,
}

/// Successful login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserDto,
}

pub struct AuthService {
    users: UserStore,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_secs: i64,
}

impl AuthService {
    pub fn new(pool: DbPool, jwt_secret: &str, token_ttl_secs: i64) -> Self {
        Self {
            users: UserStore::new(pool),
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_ttl_secs,
        }
    }

    /// Verify credentials and issue a signed bearer token. The failure
    /// message is uniform so callers cannot probe for usernames.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        let user = self
            .users
            .get_user_by_username(username)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(invalid_credentials());
        }

        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            admin: user.is_admin,
            exp: Utc::now().timestamp() + self.token_ttl_secs,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token signing failed: {e}")))?;

        Ok(AuthResponse {
            token,
            user: UserDto::from(user),
        })
    }

    /// Decode a bearer token and load its user as the request principal.
    /// Loading from the store means a deleted account stops working even
    /// while its token is still unexpired.
    pub async fn verify_token(&self, token: &str) -> Result<Principal> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| AppError::Auth("Invalid or expired token".into()))?;

        let user = self
            .users
            .get_user_by_id(data.claims.sub)
            .await
            .map_err(|_| AppError::Auth("Unknown user".into()))?;

        Ok(Principal::from(&user))
    }
}

fn invalid_credentials() -> AppError {
    AppError::Auth("Invalid username or password".into())
}

/// Hash a password for storage
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))?;

    Ok(hash.to_string())
}

/// Check a password against a stored hash. Malformed hashes verify false.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
