mod books;
mod feedback;
mod history;
mod schema;

pub use schema::Database;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID.
    pub id: String,
    /// First name.
    pub firstname: String,
    /// Last name.
    pub lastname: String,
    /// E-mail address, used as login.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Account creation timestamp.
    pub created_at: i64,
    /// Last login timestamp.
    pub last_login: Option<i64>,
}

impl User {
    /// Display name shown to other users.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

/// Authentication session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Session token.
    pub token: String,
    /// User ID.
    pub user_id: String,
    /// Expiration timestamp.
    pub expires_at: i64,
}

/// A book registered by its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Book ID (0 before insertion).
    pub id: i64,
    /// Title.
    pub title: String,
    /// Author name.
    pub author_name: String,
    /// ISBN.
    pub isbn: String,
    /// Short synopsis.
    pub synopsis: Option<String>,
    /// Path of the stored cover image.
    pub book_cover: Option<String>,
    /// Removed from circulation by the owner.
    pub archived: bool,
    /// Owner allows others to borrow it.
    pub shareable: bool,
    /// Owning user ID.
    pub owner_id: String,
    /// Creation timestamp.
    pub created_at: i64,
    /// Last update timestamp.
    pub updated_at: i64,
}

/// A book joined with the data its views need.
#[derive(Debug, Clone)]
pub struct BookView {
    /// The book row.
    pub book: Book,
    /// Owner display name.
    pub owner_name: String,
    /// Average feedback note, 0.0 without feedback.
    pub rate: f64,
}

/// One loan of a book to a borrower.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookTransactionHistory {
    /// Transaction ID (0 before insertion).
    pub id: i64,
    /// Borrowed book.
    pub book_id: i64,
    /// Borrower.
    pub user_id: String,
    /// Borrower has handed the book back.
    pub returned: bool,
    /// Owner has confirmed receiving it back.
    pub returned_approved: bool,
    /// Creation timestamp.
    pub created_at: i64,
    /// Last update timestamp.
    pub updated_at: i64,
}

/// A transaction joined with its book, for listings.
#[derive(Debug, Clone)]
pub struct TransactionView {
    /// The transaction row.
    pub history: BookTransactionHistory,
    /// The borrowed book with owner and rate.
    pub book: BookView,
}

/// Feedback left on a book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    /// Feedback ID (0 before insertion).
    pub id: i64,
    /// Rated book.
    pub book_id: i64,
    /// Note between 0 and 5.
    pub note: f64,
    /// Free text comment.
    pub comment: String,
    /// Author user ID.
    pub created_by: String,
    /// Creation timestamp.
    pub created_at: i64,
}

/// Timestamp helper.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Convert timestamp to DateTime.
pub fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}

/// Round an average note to one decimal.
pub(crate) fn round_rate(rate: f64) -> f64 {
    (rate * 10.0).round() / 10.0
}
