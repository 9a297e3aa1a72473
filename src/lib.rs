//! book-network: a book sharing backend.
//!
//! Users register the books they own, browse and borrow other people's
//! shareable books, hand them back, and leave feedback. Owners control
//! whether a book is shareable or archived and confirm returns.
//!
//! # Features
//!
//! - User accounts and session token authentication
//! - Book registration with cover photo upload
//! - Borrow, return and return approval workflow
//! - Paged listings of available, owned, borrowed and lent books
//! - Feedback with per-book average rating

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Authentication and user management.
pub mod auth;
/// Books and the borrow workflow.
pub mod book;
/// Configuration and CLI.
pub mod config;
/// Database operations.
pub mod db;
/// Error types.
pub mod error;
/// Book feedback.
pub mod feedback;
/// Paged listings.
pub mod page;
/// HTTP server.
pub mod server;
/// Cover photo storage.
pub mod storage;

#[cfg(test)]
mod tests;

pub use config::{Cli, Command, Config};
pub use db::Database;
pub use error::{AppError, ErrorKind, Result};
pub use server::AppState;
