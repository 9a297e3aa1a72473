//! Permission predicates over books.

use crate::db::Book;

/// Does `actor_id` own `book`?
pub fn is_owner(actor_id: &str, book: &Book) -> bool {
    book.owner_id == actor_id
}

/// Can anyone borrow, return or review `book` right now?
pub fn is_borrowable(book: &Book) -> bool {
    !book.archived && book.shareable
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(archived: bool, shareable: bool) -> Book {
        Book {
            id: 1,
            title: "Dune".to_string(),
            author_name: "Frank Herbert".to_string(),
            isbn: "9780441013593".to_string(),
            synopsis: None,
            book_cover: None,
            archived,
            shareable,
            owner_id: "u1".to_string(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn only_shareable_unarchived_books_are_borrowable() {
        assert!(is_borrowable(&book(false, true)));
        assert!(!is_borrowable(&book(true, true)));
        assert!(!is_borrowable(&book(false, false)));
        assert!(!is_borrowable(&book(true, false)));
    }

    #[test]
    fn ownership_is_id_equality() {
        let b = book(false, true);
        assert!(is_owner("u1", &b));
        assert!(!is_owner("u2", &b));
    }
}
