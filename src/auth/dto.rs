use serde::{Deserialize, Serialize};

use crate::auth::claims::Role;
use crate::auth::repo::Purchase;

/// Request body for user registration. `role` is parsed by the handler so
/// a bad value yields a validation error, not a body-decoding failure.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub username: String,
    pub role: Role,
}

/// Response returned after register or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    pub user: PublicUser,
}

/// Response for the profile endpoint: the public view plus the purchase
/// history, never the password hash.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub username: String,
    pub role: Role,
    pub purchases: Vec<Purchase>,
}
