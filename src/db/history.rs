use super::books::BOOK_VIEW_COLUMNS;
use crate::db::{BookTransactionHistory, Database, TransactionView, now_timestamp};
use crate::error::{AppError, Result};
use crate::page::{Page, PageRequest};
use rusqlite::{OptionalExtension, params};

const HISTORY_COLUMNS: &str =
    "h.id, h.book_id, h.user_id, h.returned, h.returned_approved, h.created_at, h.updated_at";

impl Database {
    // ========== BORROW TRANSACTION OPERATIONS ==========

    /// Record a new borrow of `book_id` by `user_id`.
    ///
    /// The open-borrow check and the insert run in one transaction under the
    /// connection lock, so two concurrent borrows cannot both pass the check.
    /// Fails with [`AppError::Conflict`] if the user already has an
    /// unapproved transaction for this book.
    pub fn create_borrow(&self, book_id: i64, user_id: &str) -> Result<i64> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Internal(format!("Failed to begin transaction: {}", e)))?;

        let open: bool = tx
            .query_row(
                "SELECT EXISTS (
                    SELECT 1 FROM book_transaction_history
                    WHERE book_id = ?1 AND user_id = ?2 AND returned_approved = 0
                 )",
                params![book_id, user_id],
                |row| row.get(0),
            )
            .map_err(|e| AppError::Internal(format!("Failed to check borrow: {}", e)))?;

        if open {
            return Err(AppError::Conflict(
                "The requested book is already borrowed".to_string(),
            ));
        }

        let now = now_timestamp();
        tx.execute(
            "INSERT INTO book_transaction_history
             (book_id, user_id, returned, returned_approved, created_at, updated_at)
             VALUES (?1, ?2, 0, 0, ?3, ?3)",
            params![book_id, user_id, now],
        )
        .map_err(borrow_insert_error)?;
        let id = tx.last_insert_rowid();

        tx.commit()
            .map_err(|e| AppError::Internal(format!("Failed to commit borrow: {}", e)))?;
        Ok(id)
    }

    /// Get a transaction by ID.
    pub fn get_history(&self, id: i64) -> Result<Option<BookTransactionHistory>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {HISTORY_COLUMNS} FROM book_transaction_history h WHERE h.id = ?1"),
            params![id],
            Self::row_to_history,
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to get transaction: {}", e)))
    }

    /// The borrower's transaction for this book that is neither returned nor approved.
    pub fn find_open_borrow(
        &self,
        book_id: i64,
        user_id: &str,
    ) -> Result<Option<BookTransactionHistory>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!(
                "SELECT {HISTORY_COLUMNS} FROM book_transaction_history h
                 WHERE h.book_id = ?1 AND h.user_id = ?2
                   AND h.returned = 0 AND h.returned_approved = 0
                 ORDER BY h.created_at, h.id LIMIT 1"
            ),
            params![book_id, user_id],
            Self::row_to_history,
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to find borrow: {}", e)))
    }

    /// Oldest returned-but-unapproved transaction on a book owned by `owner_id`.
    pub fn find_pending_approval(
        &self,
        book_id: i64,
        owner_id: &str,
    ) -> Result<Option<BookTransactionHistory>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!(
                "SELECT {HISTORY_COLUMNS} FROM book_transaction_history h
                 JOIN books b ON b.id = h.book_id
                 WHERE h.book_id = ?1 AND b.owner_id = ?2
                   AND h.returned = 1 AND h.returned_approved = 0
                 ORDER BY h.created_at, h.id LIMIT 1"
            ),
            params![book_id, owner_id],
            Self::row_to_history,
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to find returned borrow: {}", e)))
    }

    /// Persist the flags of an existing transaction.
    pub fn update_history(&self, history: &BookTransactionHistory) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "UPDATE book_transaction_history
                 SET returned = ?1, returned_approved = ?2, updated_at = ?3
                 WHERE id = ?4",
                params![
                    history.returned,
                    history.returned_approved,
                    history.updated_at,
                    history.id,
                ],
            )
            .map_err(|e| AppError::Internal(format!("Failed to update transaction: {}", e)))?;
        Ok(rows > 0)
    }

    /// Transactions where `user_id` is the borrower.
    pub fn find_borrowed_books(&self, user_id: &str, req: PageRequest) -> Result<Page<TransactionView>> {
        self.page_history("h.user_id = ?1", user_id, req)
    }

    /// Transactions on books owned by `owner_id`.
    pub fn find_returned_books(&self, owner_id: &str, req: PageRequest) -> Result<Page<TransactionView>> {
        self.page_history("b.owner_id = ?1", owner_id, req)
    }

    fn page_history(
        &self,
        filter: &str,
        user_id: &str,
        req: PageRequest,
    ) -> Result<Page<TransactionView>> {
        let conn = self.conn.lock();

        let total: i64 = conn
            .query_row(
                &format!(
                    "SELECT COUNT(*) FROM book_transaction_history h
                     JOIN books b ON b.id = h.book_id
                     WHERE {filter}"
                ),
                params![user_id],
                |row| row.get(0),
            )
            .map_err(|e| AppError::Internal(format!("Failed to count transactions: {}", e)))?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {HISTORY_COLUMNS}, {BOOK_VIEW_COLUMNS}
                 FROM book_transaction_history h
                 JOIN books b ON b.id = h.book_id
                 JOIN users u ON u.id = b.owner_id
                 WHERE {filter}
                 ORDER BY h.created_at DESC, h.id DESC
                 LIMIT ?2 OFFSET ?3"
            ))
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let items = stmt
            .query_map(params![user_id, req.limit(), req.offset()], |row| {
                Ok(TransactionView {
                    history: Self::row_to_history(row)?,
                    book: Self::row_to_book_view(row, 7)?,
                })
            })
            .map_err(|e| AppError::Internal(format!("Failed to list transactions: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect transactions: {}", e)))?;

        Ok(Page {
            items,
            total: total as u64,
            request: req,
        })
    }

    fn row_to_history(row: &rusqlite::Row<'_>) -> rusqlite::Result<BookTransactionHistory> {
        Ok(BookTransactionHistory {
            id: row.get(0)?,
            book_id: row.get(1)?,
            user_id: row.get(2)?,
            returned: row.get(3)?,
            returned_approved: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

/// `idx_history_open_borrow` violations are duplicate borrows.
fn borrow_insert_error(e: rusqlite::Error) -> AppError {
    if e.to_string().contains("UNIQUE constraint") {
        AppError::Conflict("The requested book is already borrowed".to_string())
    } else {
        AppError::Internal(format!("Failed to save borrow: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Book, User};
    use crate::error::ErrorKind;

    fn insert_open_borrow(db: &Database, book_id: i64, user_id: &str) -> rusqlite::Result<usize> {
        db.conn.lock().execute(
            "INSERT INTO book_transaction_history
             (book_id, user_id, returned, returned_approved, created_at, updated_at)
             VALUES (?1, ?2, 0, 0, 0, 0)",
            params![book_id, user_id],
        )
    }

    fn seed() -> (Database, i64) {
        let db = Database::open_memory().unwrap();
        for (id, email) in [("u1", "owner@example.com"), ("u2", "borrower@example.com")] {
            db.create_user(&User {
                id: id.to_string(),
                firstname: "Test".to_string(),
                lastname: id.to_string(),
                email: email.to_string(),
                password_hash: "hash".to_string(),
                created_at: 0,
                last_login: None,
            })
            .unwrap();
        }
        let book_id = db
            .insert_book(&Book {
                id: 0,
                title: "Solaris".to_string(),
                author_name: "Stanislaw Lem".to_string(),
                isbn: "9780156027601".to_string(),
                synopsis: None,
                book_cover: None,
                archived: false,
                shareable: true,
                owner_id: "u1".to_string(),
                created_at: 0,
                updated_at: 0,
            })
            .unwrap();
        (db, book_id)
    }

    #[test]
    fn open_borrow_index_violation_is_conflict() {
        let (db, book_id) = seed();
        insert_open_borrow(&db, book_id, "u2").unwrap();

        let err = insert_open_borrow(&db, book_id, "u2").unwrap_err();
        assert_eq!(borrow_insert_error(err).kind(), ErrorKind::Conflict);
    }

    #[test]
    fn approved_borrows_do_not_block_the_index() {
        let (db, book_id) = seed();
        insert_open_borrow(&db, book_id, "u2").unwrap();
        db.conn
            .lock()
            .execute(
                "UPDATE book_transaction_history SET returned = 1, returned_approved = 1",
                [],
            )
            .unwrap();

        assert!(insert_open_borrow(&db, book_id, "u2").is_ok());
    }

    #[test]
    fn other_insert_failures_are_internal() {
        let (db, _) = seed();
        let err = insert_open_borrow(&db, 999, "u2").unwrap_err();
        assert_eq!(borrow_insert_error(err).kind(), ErrorKind::Internal);
    }
}
