//! Request-level surface shared by the HTTP adapters and the CLI.
//!
//! Handlers own the predictors for the process lifetime and turn every
//! outcome into a status code plus JSON body.

pub mod response;
pub mod services;

pub use response::{respond, ApiResponse};
pub use services::{Services, Slot};

/// Version of the response contract, reported by every health check.
pub const API_VERSION: u32 = 1;
