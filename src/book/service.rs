use super::mapper::{BookRequest, BookResponse, BorrowedBookResponse};
use super::rules::{is_borrowable, is_owner};
use crate::db::{Book, Database, User, now_timestamp};
use crate::error::{AppError, Result};
use crate::page::{PageRequest, PageResponse};
use crate::storage::{self, FileStorage};
use std::path::Path;

/// Book operations on behalf of an authenticated user.
#[derive(Clone)]
pub struct BookService {
    db: Database,
    storage: FileStorage,
}

impl BookService {
    /// Create a new book service.
    pub fn new(db: Database, storage: FileStorage) -> Self {
        Self { db, storage }
    }

    /// Register a book owned by `user`.
    pub fn save(&self, request: BookRequest, user: &User) -> Result<i64> {
        request.validate()?;
        let book = request.into_book(&user.id);
        let id = self.db.insert_book(&book)?;
        tracing::info!(book_id = id, owner = %user.id, "Book saved");
        Ok(id)
    }

    /// Get one book.
    pub fn find_by_id(&self, book_id: i64) -> Result<BookResponse> {
        self.db
            .get_book_view(book_id)?
            .map(BookResponse::from)
            .ok_or_else(|| not_found(book_id))
    }

    /// Books `user` may borrow.
    pub fn find_all_books(&self, req: PageRequest, user: &User) -> Result<PageResponse<BookResponse>> {
        Ok(self
            .db
            .find_displayable_books(&user.id, req)?
            .map(BookResponse::from))
    }

    /// Books owned by `user`.
    pub fn find_all_books_by_owner(
        &self,
        req: PageRequest,
        user: &User,
    ) -> Result<PageResponse<BookResponse>> {
        Ok(self
            .db
            .find_books_by_owner(&user.id, req)?
            .map(BookResponse::from))
    }

    /// Books `user` has borrowed.
    pub fn find_all_borrowed_books(
        &self,
        req: PageRequest,
        user: &User,
    ) -> Result<PageResponse<BorrowedBookResponse>> {
        Ok(self
            .db
            .find_borrowed_books(&user.id, req)?
            .map(BorrowedBookResponse::from))
    }

    /// Loans of books owned by `user`.
    pub fn find_all_returned_books(
        &self,
        req: PageRequest,
        user: &User,
    ) -> Result<PageResponse<BorrowedBookResponse>> {
        Ok(self
            .db
            .find_returned_books(&user.id, req)?
            .map(BorrowedBookResponse::from))
    }

    /// Flip the shareable flag. Owner only.
    pub fn toggle_shareable(&self, book_id: i64, user: &User) -> Result<i64> {
        let mut book = self.load_owned(
            book_id,
            user,
            "You cannot update the shareable status of others' books",
        )?;
        book.shareable = !book.shareable;
        self.persist(&mut book)?;
        tracing::info!(book_id, shareable = book.shareable, "Shareable status updated");
        Ok(book_id)
    }

    /// Flip the archived flag. Owner only.
    pub fn toggle_archived(&self, book_id: i64, user: &User) -> Result<i64> {
        let mut book = self.load_owned(
            book_id,
            user,
            "You cannot update the archived status of others' books",
        )?;
        book.archived = !book.archived;
        self.persist(&mut book)?;
        tracing::info!(book_id, archived = book.archived, "Archived status updated");
        Ok(book_id)
    }

    /// Borrow someone else's book. Returns the transaction ID.
    pub fn borrow(&self, book_id: i64, user: &User) -> Result<i64> {
        let book = self.load_borrowable(book_id)?;
        if is_owner(&user.id, &book) {
            return Err(AppError::PermissionDenied(
                "You cannot borrow your own book".to_string(),
            ));
        }

        let id = self.db.create_borrow(book_id, &user.id)?;
        tracing::info!(book_id, transaction_id = id, borrower = %user.id, "Book borrowed");
        Ok(id)
    }

    /// Hand a borrowed book back. Returns the transaction ID.
    pub fn return_book(&self, book_id: i64, user: &User) -> Result<i64> {
        let book = self.load_borrowable(book_id)?;
        if is_owner(&user.id, &book) {
            return Err(AppError::PermissionDenied(
                "You cannot borrow or return your own book".to_string(),
            ));
        }

        let mut history = self
            .db
            .find_open_borrow(book_id, &user.id)?
            .ok_or_else(|| AppError::PermissionDenied("You did not borrow this book".to_string()))?;

        history.returned = true;
        history.updated_at = now_timestamp();
        self.db.update_history(&history)?;
        tracing::info!(book_id, transaction_id = history.id, "Book returned");
        Ok(history.id)
    }

    /// Confirm a returned book is back. Owner only; returns the transaction ID.
    pub fn approve_return(&self, book_id: i64, user: &User) -> Result<i64> {
        let book = self.load_borrowable(book_id)?;
        if !is_owner(&user.id, &book) {
            return Err(AppError::PermissionDenied(
                "Only the owner can approve the return of a book".to_string(),
            ));
        }

        let mut history = self
            .db
            .find_pending_approval(book_id, &user.id)?
            .ok_or_else(|| {
                AppError::PermissionDenied(
                    "The book is not returned yet. You cannot approve its return".to_string(),
                )
            })?;

        history.returned_approved = true;
        history.updated_at = now_timestamp();
        self.db.update_history(&history)?;
        tracing::info!(book_id, transaction_id = history.id, "Book return approved");
        Ok(history.id)
    }

    /// Store a cover image for a book. Owner only.
    pub fn upload_cover(
        &self,
        book_id: i64,
        content: &[u8],
        file_name: &str,
        user: &User,
    ) -> Result<()> {
        if content.is_empty() {
            return Err(AppError::Validation("Cover file is empty".to_string()));
        }

        let mut book = self.load_owned(
            book_id,
            user,
            "You cannot change the cover of others' books",
        )?;
        let path = self.storage.save_file(content, file_name, &user.id)?;
        let previous = book.book_cover.replace(path.to_string_lossy().to_string());

        if let Err(e) = self.persist(&mut book) {
            storage::remove_file(&path);
            return Err(e);
        }
        if let Some(old) = previous
            && Path::new(&old) != path.as_path()
        {
            storage::remove_file(Path::new(&old));
        }

        tracing::info!(book_id, path = %path.display(), "Cover uploaded");
        Ok(())
    }

    /// Stored cover path, if the book has one.
    pub fn cover_path(&self, book_id: i64) -> Result<Option<String>> {
        let book = self.load(book_id)?;
        Ok(book.book_cover)
    }

    fn load(&self, book_id: i64) -> Result<Book> {
        self.db.get_book(book_id)?.ok_or_else(|| not_found(book_id))
    }

    fn load_owned(&self, book_id: i64, user: &User, denied: &str) -> Result<Book> {
        let book = self.load(book_id)?;
        if !is_owner(&user.id, &book) {
            return Err(AppError::PermissionDenied(denied.to_string()));
        }
        Ok(book)
    }

    fn load_borrowable(&self, book_id: i64) -> Result<Book> {
        let book = self.load(book_id)?;
        if !is_borrowable(&book) {
            return Err(AppError::PermissionDenied(
                "Book cannot be borrowed since it is archived or not shareable".to_string(),
            ));
        }
        Ok(book)
    }

    fn persist(&self, book: &mut Book) -> Result<()> {
        book.updated_at = now_timestamp();
        if !self.db.update_book(book)? {
            return Err(not_found(book.id));
        }
        Ok(())
    }
}

fn not_found(book_id: i64) -> AppError {
    AppError::NotFound(format!("No book found with ID {}", book_id))
}
