//! Application state shared across handlers.

use crate::auth::AuthService;
use crate::book::BookService;
use crate::config::Config;
use crate::db::Database;
use crate::feedback::FeedbackService;
use crate::storage::FileStorage;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Authentication service.
    pub auth: Arc<AuthService>,
    /// Book and borrow operations.
    pub books: BookService,
    /// Feedback operations.
    pub feedback: FeedbackService,
}

impl AppState {
    /// Create new application state with database.
    pub fn new_with_db(config: Config, db: Database, auth: AuthService) -> Self {
        let storage = FileStorage::new(config.upload.photos_output_path.clone());

        Self {
            books: BookService::new(db.clone(), storage),
            feedback: FeedbackService::new(db),
            config: Arc::new(config),
            auth: Arc::new(auth),
        }
    }
}
