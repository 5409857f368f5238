//! Auth Module
//!
//! API consumers exchange a key and secret for a short lived HS256 bearer
//! token, which protected routes then require.
//!
//! # Flow
//! - `POST /auth` with `{api_key, api_secret}` returns `{access_token}`
//! - Protected routes read `Authorization: Bearer <token>` (`JWT <token>` also accepted)

mod consumers;
mod middleware;
mod token;

use thiserror::Error;

use crate::error::StoreError;

pub use consumers::{generate_credentials, hash_secret, ApiCredentials};
pub use middleware::require_bearer;
pub use token::{Authenticator, Claims};

// == Auth Error ==
#[derive(Error, Debug)]
pub enum AuthError {
    /// Key unknown or secret wrong
    #[error("invalid api key or secret")]
    InvalidCredentials,

    /// No Authorization header
    #[error("missing bearer token")]
    MissingToken,

    /// Header present but not a usable token
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Token signature fine but past its expiry
    #[error("token expired")]
    Expired,

    /// Token could not be signed
    #[error("token signing failed: {0}")]
    Signing(String),

    /// Consumer lookup failed
    #[error(transparent)]
    Store(#[from] StoreError),
}
