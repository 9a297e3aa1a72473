use crate::db::{Database, Feedback};
use crate::error::{AppError, Result};
use crate::page::{Page, PageRequest};
use rusqlite::params;

impl Database {
    // ========== FEEDBACK OPERATIONS ==========

    /// Insert feedback, returning its ID.
    pub fn insert_feedback(&self, feedback: &Feedback) -> Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO feedbacks (book_id, note, comment, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                feedback.book_id,
                feedback.note,
                feedback.comment,
                feedback.created_by,
                feedback.created_at,
            ],
        )
        .map_err(|e| AppError::Internal(format!("Failed to save feedback: {}", e)))?;
        Ok(conn.last_insert_rowid())
    }

    /// Feedback on a book, newest first.
    pub fn find_feedbacks_by_book(&self, book_id: i64, req: PageRequest) -> Result<Page<Feedback>> {
        let conn = self.conn.lock();

        let total: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM feedbacks WHERE book_id = ?1",
                params![book_id],
                |row| row.get(0),
            )
            .map_err(|e| AppError::Internal(format!("Failed to count feedbacks: {}", e)))?;

        let mut stmt = conn
            .prepare(
                "SELECT id, book_id, note, comment, created_by, created_at
                 FROM feedbacks WHERE book_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2 OFFSET ?3",
            )
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let items = stmt
            .query_map(params![book_id, req.limit(), req.offset()], |row| {
                Ok(Feedback {
                    id: row.get(0)?,
                    book_id: row.get(1)?,
                    note: row.get(2)?,
                    comment: row.get(3)?,
                    created_by: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })
            .map_err(|e| AppError::Internal(format!("Failed to list feedbacks: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect feedbacks: {}", e)))?;

        Ok(Page {
            items,
            total: total as u64,
            request: req,
        })
    }
}
