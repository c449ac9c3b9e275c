//! Flight-passenger search projection.
//!
//! Indexes manifest (APIS) and reservation (PNR) messages into one document
//! per passenger per flight, and answers free-text passenger searches and
//! passenger link analysis against those documents.

pub mod config;
pub mod error;
pub mod models;
pub mod search;

pub use error::{AppError, Result};
