use crate::db::{Book, BookView, TransactionView, now_timestamp};
use crate::error::{AppError, Result};
use crate::storage;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// Book creation request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    /// Title.
    pub title: String,
    /// Author name.
    pub author_name: String,
    /// ISBN.
    pub isbn: String,
    /// Short synopsis.
    #[serde(default)]
    pub synopsis: Option<String>,
    /// Allow others to borrow it.
    #[serde(default)]
    pub shareable: bool,
}

impl BookRequest {
    pub(crate) fn validate(&self) -> Result<()> {
        let required = [
            ("title", &self.title),
            ("authorName", &self.author_name),
            ("isbn", &self.isbn),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{} is mandatory", field)));
            }
        }
        Ok(())
    }

    pub(crate) fn into_book(self, owner_id: &str) -> Book {
        let now = now_timestamp();
        Book {
            id: 0,
            title: self.title.trim().to_string(),
            author_name: self.author_name.trim().to_string(),
            isbn: self.isbn.trim().to_string(),
            synopsis: self.synopsis,
            book_cover: None,
            archived: false,
            shareable: self.shareable,
            owner_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Book as shown to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    /// Book ID.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Author name.
    pub author_name: String,
    /// ISBN.
    pub isbn: String,
    /// Short synopsis.
    pub synopsis: Option<String>,
    /// Owner display name.
    pub owner: String,
    /// Base64 encoded cover image.
    pub cover: Option<String>,
    /// Average feedback note.
    pub rate: f64,
    /// Archived flag.
    pub archived: bool,
    /// Shareable flag.
    pub shareable: bool,
}

impl From<BookView> for BookResponse {
    fn from(view: BookView) -> Self {
        let cover = view
            .book
            .book_cover
            .as_deref()
            .and_then(storage::read_file)
            .map(|bytes| STANDARD.encode(bytes));

        Self {
            id: view.book.id,
            title: view.book.title,
            author_name: view.book.author_name,
            isbn: view.book.isbn,
            synopsis: view.book.synopsis,
            owner: view.owner_name,
            cover,
            rate: view.rate,
            archived: view.book.archived,
            shareable: view.book.shareable,
        }
    }
}

/// A borrowed (or lent) book with the loan's state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowedBookResponse {
    /// Book ID.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Author name.
    pub author_name: String,
    /// ISBN.
    pub isbn: String,
    /// Average feedback note.
    pub rate: f64,
    /// Borrower has returned it.
    pub returned: bool,
    /// Owner approved the return.
    pub returned_approved: bool,
}

impl From<TransactionView> for BorrowedBookResponse {
    fn from(view: TransactionView) -> Self {
        Self {
            id: view.book.book.id,
            title: view.book.book.title,
            author_name: view.book.book.author_name,
            isbn: view.book.book.isbn,
            rate: view.book.rate,
            returned: view.history.returned,
            returned_approved: view.history.returned_approved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str) -> BookRequest {
        BookRequest {
            title: title.to_string(),
            author_name: "Ursula K. Le Guin".to_string(),
            isbn: "9780441478125".to_string(),
            synopsis: None,
            shareable: true,
        }
    }

    #[test]
    fn blank_title_is_rejected() {
        assert!(request("  ").validate().is_err());
        assert!(request("The Left Hand of Darkness").validate().is_ok());
    }

    #[test]
    fn new_books_are_never_archived() {
        let book = request(" Lathe of Heaven ").into_book("owner");
        assert_eq!(book.title, "Lathe of Heaven");
        assert!(!book.archived);
        assert!(book.shareable);
        assert_eq!(book.owner_id, "owner");
    }

    #[test]
    fn request_accepts_camel_case_json() {
        let req: BookRequest = serde_json::from_str(
            r#"{"title":"Kindred","authorName":"Octavia Butler","isbn":"978-0807083697"}"#,
        )
        .unwrap();
        assert_eq!(req.author_name, "Octavia Butler");
        assert!(!req.shareable);
    }
}
