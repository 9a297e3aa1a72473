//! Feedback on books: notes and comments from borrowers and readers.

use crate::book::rules::{is_borrowable, is_owner};
use crate::db::{Database, Feedback, User, now_timestamp};
use crate::error::{AppError, Result};
use crate::page::{PageRequest, PageResponse};
use serde::{Deserialize, Serialize};

/// Highest note a book can receive.
pub const MAX_NOTE: f64 = 5.0;

/// Feedback creation request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    /// Note between 0 and 5.
    pub note: f64,
    /// Comment.
    pub comment: String,
    /// Reviewed book.
    pub book_id: i64,
}

/// Feedback as shown to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    /// Note between 0 and 5.
    pub note: f64,
    /// Comment.
    pub comment: String,
    /// Written by the caller.
    pub own_feedback: bool,
}

impl FeedbackResponse {
    fn from_feedback(feedback: Feedback, user_id: &str) -> Self {
        Self {
            own_feedback: feedback.created_by == user_id,
            note: feedback.note,
            comment: feedback.comment,
        }
    }
}

impl FeedbackRequest {
    fn validate(&self) -> Result<()> {
        if !(0.0..=MAX_NOTE).contains(&self.note) {
            return Err(AppError::Validation(format!(
                "Note must be between 0 and {}",
                MAX_NOTE
            )));
        }
        if self.comment.trim().is_empty() {
            return Err(AppError::Validation("Comment is mandatory".to_string()));
        }
        Ok(())
    }
}

/// Feedback operations on behalf of an authenticated user.
#[derive(Clone)]
pub struct FeedbackService {
    db: Database,
}

impl FeedbackService {
    /// Create a new feedback service.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Leave feedback on someone else's shareable book.
    pub fn save(&self, request: FeedbackRequest, user: &User) -> Result<i64> {
        request.validate()?;

        let book = self
            .db
            .get_book(request.book_id)?
            .ok_or_else(|| {
                AppError::NotFound(format!("No book found with ID {}", request.book_id))
            })?;

        if !is_borrowable(&book) {
            return Err(AppError::PermissionDenied(
                "You cannot give feedback on an archived or not shareable book".to_string(),
            ));
        }
        if is_owner(&user.id, &book) {
            return Err(AppError::PermissionDenied(
                "You cannot give feedback on your own book".to_string(),
            ));
        }

        let feedback = Feedback {
            id: 0,
            book_id: book.id,
            note: request.note,
            comment: request.comment.trim().to_string(),
            created_by: user.id.clone(),
            created_at: now_timestamp(),
        };
        let id = self.db.insert_feedback(&feedback)?;
        tracing::info!(book_id = book.id, feedback_id = id, "Feedback saved");
        Ok(id)
    }

    /// Feedback on a book, newest first.
    pub fn find_all_by_book(
        &self,
        book_id: i64,
        req: PageRequest,
        user: &User,
    ) -> Result<PageResponse<FeedbackResponse>> {
        Ok(self
            .db
            .find_feedbacks_by_book(book_id, req)?
            .map(|f| FeedbackResponse::from_feedback(f, &user.id)))
    }
}
