//! API Module
//!
//! HTTP handlers and routing for the burn ban REST API.
//!
//! # Endpoints
//! - `GET /county/:name` - Burn ban status by county name
//! - `GET /location/:lat/:lng` - Burn ban status by coordinates
//! - `GET /place/:place` - Burn ban status by address
//! - `POST /auth` - Issue a bearer token
//! - `GET /stats` - Service counters
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
