//! Request and Response models for the burn ban API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::TokenRequest;
pub use responses::{CountyResponse, ErrorResponse, HealthResponse, StatsResponse, TokenResponse};
