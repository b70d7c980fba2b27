//! ITAM console: admin client for the IT asset-management REST backend.
//!
//! Session handling (token slots, claim extraction, role-gated navigation),
//! the shared paginated-search contract, and one service per backend
//! collection. The `itam-cli` binary is the screens layer on top.

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod gate;
pub mod models;
// Filter/page/sort state and tolerant page decoding for every list screen
pub mod query;
pub mod resources;
// REST collaborator: bearer hook and 401 interceptor
pub mod rest;
pub mod session;
pub mod storage;
pub mod telemetry;

pub use error::{ConsoleError, ConsoleResult};
pub use rest::RestClient;
pub use session::SessionManager;
