use crate::db::{Book, BookView, Database, round_rate};
use crate::error::{AppError, Result};
use crate::page::{Page, PageRequest};
use rusqlite::{OptionalExtension, params};

/// Columns shared by every book view query; `b` is books, `u` its owner.
pub(super) const BOOK_VIEW_COLUMNS: &str = "b.id, b.title, b.author_name, b.isbn, b.synopsis, b.book_cover,
        b.archived, b.shareable, b.owner_id, b.created_at, b.updated_at,
        u.firstname || ' ' || u.lastname,
        COALESCE((SELECT AVG(f.note) FROM feedbacks f WHERE f.book_id = b.id), 0.0)";

impl Database {
    // ========== BOOK OPERATIONS ==========

    /// Insert a new book, returning its ID.
    pub fn insert_book(&self, book: &Book) -> Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO books
             (title, author_name, isbn, synopsis, book_cover, archived, shareable, owner_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                book.title,
                book.author_name,
                book.isbn,
                book.synopsis,
                book.book_cover,
                book.archived,
                book.shareable,
                book.owner_id,
                book.created_at,
                book.updated_at,
            ],
        )
        .map_err(|e| AppError::Internal(format!("Failed to save book: {}", e)))?;
        Ok(conn.last_insert_rowid())
    }

    /// Persist the mutable fields of an existing book.
    pub fn update_book(&self, book: &Book) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "UPDATE books SET title = ?1, author_name = ?2, isbn = ?3, synopsis = ?4,
                    book_cover = ?5, archived = ?6, shareable = ?7, updated_at = ?8
                 WHERE id = ?9",
                params![
                    book.title,
                    book.author_name,
                    book.isbn,
                    book.synopsis,
                    book.book_cover,
                    book.archived,
                    book.shareable,
                    book.updated_at,
                    book.id,
                ],
            )
            .map_err(|e| AppError::Internal(format!("Failed to update book: {}", e)))?;
        Ok(rows > 0)
    }

    /// Get a book by ID.
    pub fn get_book(&self, id: i64) -> Result<Option<Book>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, title, author_name, isbn, synopsis, book_cover, archived, shareable,
                    owner_id, created_at, updated_at
             FROM books WHERE id = ?1",
            params![id],
            Self::row_to_book,
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to get book: {}", e)))
    }

    /// Get a book with owner name and rate.
    pub fn get_book_view(&self, id: i64) -> Result<Option<BookView>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!(
                "SELECT {BOOK_VIEW_COLUMNS}
                 FROM books b JOIN users u ON u.id = b.owner_id
                 WHERE b.id = ?1"
            ),
            params![id],
            |row| Self::row_to_book_view(row, 0),
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to get book: {}", e)))
    }

    /// Books others may borrow: shareable, not archived, not owned by `user_id`.
    pub fn find_displayable_books(&self, user_id: &str, req: PageRequest) -> Result<Page<BookView>> {
        self.page_books(
            "b.archived = 0 AND b.shareable = 1 AND b.owner_id != ?1",
            user_id,
            req,
        )
    }

    /// Books owned by `owner_id`.
    pub fn find_books_by_owner(&self, owner_id: &str, req: PageRequest) -> Result<Page<BookView>> {
        self.page_books("b.owner_id = ?1", owner_id, req)
    }

    fn page_books(&self, filter: &str, user_id: &str, req: PageRequest) -> Result<Page<BookView>> {
        let conn = self.conn.lock();

        let total: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM books b WHERE {filter}"),
                params![user_id],
                |row| row.get(0),
            )
            .map_err(|e| AppError::Internal(format!("Failed to count books: {}", e)))?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {BOOK_VIEW_COLUMNS}
                 FROM books b JOIN users u ON u.id = b.owner_id
                 WHERE {filter}
                 ORDER BY b.created_at DESC, b.id DESC
                 LIMIT ?2 OFFSET ?3"
            ))
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let items = stmt
            .query_map(params![user_id, req.limit(), req.offset()], |row| {
                Self::row_to_book_view(row, 0)
            })
            .map_err(|e| AppError::Internal(format!("Failed to list books: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect books: {}", e)))?;

        Ok(Page {
            items,
            total: total as u64,
            request: req,
        })
    }

    fn row_to_book(row: &rusqlite::Row<'_>) -> rusqlite::Result<Book> {
        Ok(Book {
            id: row.get(0)?,
            title: row.get(1)?,
            author_name: row.get(2)?,
            isbn: row.get(3)?,
            synopsis: row.get(4)?,
            book_cover: row.get(5)?,
            archived: row.get(6)?,
            shareable: row.get(7)?,
            owner_id: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    /// Read [`BOOK_VIEW_COLUMNS`] starting at column `start`.
    pub(super) fn row_to_book_view(row: &rusqlite::Row<'_>, start: usize) -> rusqlite::Result<BookView> {
        Ok(BookView {
            book: Book {
                id: row.get(start)?,
                title: row.get(start + 1)?,
                author_name: row.get(start + 2)?,
                isbn: row.get(start + 3)?,
                synopsis: row.get(start + 4)?,
                book_cover: row.get(start + 5)?,
                archived: row.get(start + 6)?,
                shareable: row.get(start + 7)?,
                owner_id: row.get(start + 8)?,
                created_at: row.get(start + 9)?,
                updated_at: row.get(start + 10)?,
            },
            owner_name: row.get(start + 11)?,
            rate: round_rate(row.get(start + 12)?),
        })
    }
}
