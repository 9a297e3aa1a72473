use crate::auth::{AuthService, NewUser};
use crate::book::{BookRequest, BookService};
use crate::config::Config;
use crate::db::{Book, Database, Session, User, now_timestamp};
use crate::error::ErrorKind;
use crate::feedback::{FeedbackRequest, FeedbackService};
use crate::page::PageRequest;
use crate::storage::FileStorage;
use tempfile::TempDir;

fn test_db() -> Database {
    Database::open_memory().unwrap()
}

fn create_user(db: &Database, id: &str, email: &str) -> User {
    let user = User {
        id: id.to_string(),
        firstname: "Test".to_string(),
        lastname: id.to_string(),
        email: email.to_string(),
        password_hash: "hash".to_string(),
        created_at: now_timestamp(),
        last_login: None,
    };
    db.create_user(&user).unwrap();
    user
}

fn create_book(db: &Database, owner: &User, archived: bool, shareable: bool) -> i64 {
    let book = Book {
        id: 0,
        title: "The Dispossessed".to_string(),
        author_name: "Ursula K. Le Guin".to_string(),
        isbn: "9780061054884".to_string(),
        synopsis: Some("An ambiguous utopia".to_string()),
        book_cover: None,
        archived,
        shareable,
        owner_id: owner.id.clone(),
        created_at: now_timestamp(),
        updated_at: now_timestamp(),
    };
    db.insert_book(&book).unwrap()
}

struct Fixture {
    db: Database,
    books: BookService,
    feedback: FeedbackService,
    owner: User,
    borrower: User,
    uploads: TempDir,
}

fn fixture() -> Fixture {
    let db = test_db();
    let uploads = tempfile::tempdir().unwrap();
    Fixture {
        books: BookService::new(db.clone(), FileStorage::new(uploads.path())),
        feedback: FeedbackService::new(db.clone()),
        owner: create_user(&db, "u1", "owner@example.com"),
        borrower: create_user(&db, "u2", "borrower@example.com"),
        db,
        uploads,
    }
}

fn page(page: u32, size: u32) -> PageRequest {
    PageRequest::new(page, size).unwrap()
}

fn book_request(title: &str, shareable: bool) -> BookRequest {
    BookRequest {
        title: title.to_string(),
        author_name: "Iain M. Banks".to_string(),
        isbn: "9780316005388".to_string(),
        synopsis: None,
        shareable,
    }
}

// ============================================================================
// DATABASE
// ============================================================================

#[test]
fn db_create_and_get_user() {
    let db = test_db();
    create_user(&db, "user-1", "alice@example.com");

    let found = db.get_user_by_email("alice@example.com").unwrap().unwrap();
    assert_eq!(found.id, "user-1");
    assert_eq!(found.full_name(), "Test user-1");

    let found_by_id = db.get_user_by_id("user-1").unwrap().unwrap();
    assert_eq!(found_by_id.email, "alice@example.com");
}

#[test]
fn db_duplicate_email_is_conflict() {
    let db = test_db();
    create_user(&db, "user-1", "alice@example.com");

    let dup = User {
        id: "user-2".to_string(),
        firstname: "Other".to_string(),
        lastname: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        password_hash: "hash2".to_string(),
        created_at: now_timestamp(),
        last_login: None,
    };
    assert_eq!(db.create_user(&dup).unwrap_err().kind(), ErrorKind::Conflict);
}

#[test]
fn db_delete_user() {
    let db = test_db();
    create_user(&db, "user-1", "bob@example.com");

    assert!(db.delete_user("bob@example.com").unwrap());
    assert!(db.get_user_by_email("bob@example.com").unwrap().is_none());
}

#[test]
fn db_delete_user_keeps_loan_history() {
    let f = fixture();
    let book_id = create_book(&f.db, &f.owner, false, true);
    let tx = f.books.borrow(book_id, &f.borrower).unwrap();

    for email in ["borrower@example.com", "owner@example.com"] {
        let err = f.db.delete_user(email).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(f.db.get_user_by_email(email).unwrap().is_some());
    }

    assert!(f.db.get_history(tx).unwrap().is_some());
    let lent = f
        .books
        .find_all_returned_books(page(0, 10), &f.owner)
        .unwrap();
    assert_eq!(lent.total_elements, 1);

    // Approved loans are history too
    f.books.return_book(book_id, &f.borrower).unwrap();
    f.books.approve_return(book_id, &f.owner).unwrap();
    let err = f.db.delete_user("borrower@example.com").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn db_delete_user_without_loans_removes_books() {
    let f = fixture();
    let book_id = create_book(&f.db, &f.owner, false, true);

    assert!(f.db.delete_user("owner@example.com").unwrap());
    assert!(f.db.get_book(book_id).unwrap().is_none());
}

#[test]
fn auth_delete_user_with_open_loan_is_conflict() {
    let f = fixture();
    let book_id = create_book(&f.db, &f.owner, false, true);
    f.books.borrow(book_id, &f.borrower).unwrap();

    let auth = AuthService::new(f.db.clone(), 1, true);
    let err = auth.delete_user("Borrower@Example.com").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn db_session_lifecycle() {
    let db = test_db();
    create_user(&db, "user-1", "carol@example.com");

    let session = Session {
        token: "token123".to_string(),
        user_id: "user-1".to_string(),
        expires_at: now_timestamp() + 3600,
    };
    db.create_session(&session).unwrap();

    let found = db.get_session("token123").unwrap().unwrap();
    assert_eq!(found.user_id, "user-1");

    db.delete_session("token123").unwrap();
    assert!(db.get_session("token123").unwrap().is_none());
}

#[test]
fn db_expired_sessions_cleanup() {
    let db = test_db();
    create_user(&db, "user-1", "dave@example.com");

    for (token, offset) in [("expired", -3600), ("valid", 3600)] {
        db.create_session(&Session {
            token: token.to_string(),
            user_id: "user-1".to_string(),
            expires_at: now_timestamp() + offset,
        })
        .unwrap();
    }

    assert_eq!(db.cleanup_expired_sessions().unwrap(), 1);
    assert!(db.get_session("expired").unwrap().is_none());
    assert!(db.get_session("valid").unwrap().is_some());
}

#[test]
fn db_book_view_has_owner_name_and_zero_rate() {
    let db = test_db();
    let owner = create_user(&db, "u1", "owner@example.com");
    let id = create_book(&db, &owner, false, true);

    let view = db.get_book_view(id).unwrap().unwrap();
    assert_eq!(view.book.id, id);
    assert_eq!(view.owner_name, "Test u1");
    assert_eq!(view.rate, 0.0);
    assert!(db.get_book_view(id + 100).unwrap().is_none());
}

#[test]
fn db_open_borrow_is_unique_per_book_and_user() {
    let db = test_db();
    let owner = create_user(&db, "u1", "owner@example.com");
    let borrower = create_user(&db, "u2", "borrower@example.com");
    let other = create_user(&db, "u3", "other@example.com");
    let id = create_book(&db, &owner, false, true);

    db.create_borrow(id, &borrower.id).unwrap();
    let err = db.create_borrow(id, &borrower.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // A different user is not blocked by someone else's loan
    assert!(db.create_borrow(id, &other.id).is_ok());
}

#[test]
fn db_concurrent_borrows_create_one_transaction() {
    let db = test_db();
    let owner = create_user(&db, "u1", "owner@example.com");
    create_user(&db, "u2", "borrower@example.com");
    let id = create_book(&db, &owner, false, true);

    let barrier = std::sync::Arc::new(std::sync::Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let db = db.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                db.create_borrow(id, "u2")
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let ok = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    let borrowed = db.find_borrowed_books("u2", page(0, 10)).unwrap();
    assert_eq!(borrowed.total, 1);
}

// ============================================================================
// BORROW WORKFLOW
// ============================================================================

#[test]
fn borrow_return_approve_example() {
    let f = fixture();
    let book_id = create_book(&f.db, &f.owner, false, true);

    let tx = f.books.borrow(book_id, &f.borrower).unwrap();
    let history = f.db.get_history(tx).unwrap().unwrap();
    assert_eq!(history.book_id, book_id);
    assert_eq!(history.user_id, f.borrower.id);
    assert!(!history.returned);
    assert!(!history.returned_approved);

    assert_eq!(f.books.return_book(book_id, &f.borrower).unwrap(), tx);
    let history = f.db.get_history(tx).unwrap().unwrap();
    assert!(history.returned);
    assert!(!history.returned_approved);

    assert_eq!(f.books.approve_return(book_id, &f.owner).unwrap(), tx);
    let history = f.db.get_history(tx).unwrap().unwrap();
    assert!(history.returned);
    assert!(history.returned_approved);
}

#[test]
fn borrow_missing_book_is_not_found() {
    let f = fixture();
    let err = f.books.borrow(42, &f.borrower).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn unavailable_books_reject_every_workflow_step() {
    let f = fixture();

    for (archived, shareable) in [(true, true), (false, false), (true, false)] {
        let book_id = create_book(&f.db, &f.owner, archived, shareable);

        let borrow = f.books.borrow(book_id, &f.borrower).unwrap_err();
        let ret = f.books.return_book(book_id, &f.borrower).unwrap_err();
        let approve = f.books.approve_return(book_id, &f.owner).unwrap_err();

        assert_eq!(borrow.kind(), ErrorKind::PermissionDenied);
        assert_eq!(ret.kind(), ErrorKind::PermissionDenied);
        assert_eq!(approve.kind(), ErrorKind::PermissionDenied);
    }
}

#[test]
fn owner_cannot_borrow_or_return_own_book() {
    let f = fixture();
    let book_id = create_book(&f.db, &f.owner, false, true);

    let borrow = f.books.borrow(book_id, &f.owner).unwrap_err();
    let ret = f.books.return_book(book_id, &f.owner).unwrap_err();

    assert_eq!(borrow.kind(), ErrorKind::PermissionDenied);
    assert_eq!(ret.kind(), ErrorKind::PermissionDenied);
}

#[test]
fn second_borrow_conflicts_until_approved() {
    let f = fixture();
    let book_id = create_book(&f.db, &f.owner, false, true);

    f.books.borrow(book_id, &f.borrower).unwrap();
    let err = f.books.borrow(book_id, &f.borrower).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // Returned but not yet approved is still open
    f.books.return_book(book_id, &f.borrower).unwrap();
    let err = f.books.borrow(book_id, &f.borrower).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    f.books.approve_return(book_id, &f.owner).unwrap();
    assert!(f.books.borrow(book_id, &f.borrower).is_ok());
}

#[test]
fn return_requires_open_borrow() {
    let f = fixture();
    let book_id = create_book(&f.db, &f.owner, false, true);

    let err = f.books.return_book(book_id, &f.borrower).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    f.books.borrow(book_id, &f.borrower).unwrap();
    f.books.return_book(book_id, &f.borrower).unwrap();

    let again = f.books.return_book(book_id, &f.borrower).unwrap_err();
    assert_eq!(again.kind(), ErrorKind::PermissionDenied);
}

#[test]
fn approve_requires_returned_transaction() {
    let f = fixture();
    let book_id = create_book(&f.db, &f.owner, false, true);

    let err = f.books.approve_return(book_id, &f.owner).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    f.books.borrow(book_id, &f.borrower).unwrap();
    let err = f.books.approve_return(book_id, &f.owner).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    f.books.return_book(book_id, &f.borrower).unwrap();
    f.books.approve_return(book_id, &f.owner).unwrap();

    let twice = f.books.approve_return(book_id, &f.owner).unwrap_err();
    assert_eq!(twice.kind(), ErrorKind::PermissionDenied);
}

#[test]
fn only_owner_can_approve_return() {
    let f = fixture();
    let book_id = create_book(&f.db, &f.owner, false, true);

    f.books.borrow(book_id, &f.borrower).unwrap();
    f.books.return_book(book_id, &f.borrower).unwrap();

    let err = f.books.approve_return(book_id, &f.borrower).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}

#[test]
fn archiving_during_loan_blocks_return() {
    let f = fixture();
    let book_id = create_book(&f.db, &f.owner, false, true);

    f.books.borrow(book_id, &f.borrower).unwrap();
    f.books.toggle_archived(book_id, &f.owner).unwrap();

    let err = f.books.return_book(book_id, &f.borrower).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}

// ============================================================================
// TOGGLES
// ============================================================================

#[test]
fn toggles_flip_once_and_restore_on_double_toggle() {
    let f = fixture();
    let book_id = create_book(&f.db, &f.owner, false, true);

    assert_eq!(f.books.toggle_shareable(book_id, &f.owner).unwrap(), book_id);
    assert!(!f.db.get_book(book_id).unwrap().unwrap().shareable);
    f.books.toggle_shareable(book_id, &f.owner).unwrap();
    assert!(f.db.get_book(book_id).unwrap().unwrap().shareable);

    f.books.toggle_archived(book_id, &f.owner).unwrap();
    assert!(f.db.get_book(book_id).unwrap().unwrap().archived);
    f.books.toggle_archived(book_id, &f.owner).unwrap();
    assert!(!f.db.get_book(book_id).unwrap().unwrap().archived);
}

#[test]
fn toggles_are_owner_only() {
    let f = fixture();
    let book_id = create_book(&f.db, &f.owner, false, true);

    let share = f.books.toggle_shareable(book_id, &f.borrower).unwrap_err();
    let archive = f.books.toggle_archived(book_id, &f.borrower).unwrap_err();
    assert_eq!(share.kind(), ErrorKind::PermissionDenied);
    assert_eq!(archive.kind(), ErrorKind::PermissionDenied);

    let book = f.db.get_book(book_id).unwrap().unwrap();
    assert!(book.shareable);
    assert!(!book.archived);
}

#[test]
fn toggle_missing_book_is_not_found() {
    let f = fixture();
    let err = f.books.toggle_shareable(7, &f.owner).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ============================================================================
// SAVE AND LISTINGS
// ============================================================================

#[test]
fn save_and_find_by_id() {
    let f = fixture();
    let id = f
        .books
        .save(book_request("Consider Phlebas", true), &f.owner)
        .unwrap();

    let book = f.books.find_by_id(id).unwrap();
    assert_eq!(book.title, "Consider Phlebas");
    assert_eq!(book.owner, "Test u1");
    assert!(book.shareable);
    assert!(!book.archived);
    assert!(book.cover.is_none());

    let err = f.books.find_by_id(id + 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn save_rejects_blank_fields() {
    let f = fixture();
    let err = f.books.save(book_request(" ", true), &f.owner).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn displayable_books_exclude_own_archived_and_private() {
    let f = fixture();
    let visible = f.books.save(book_request("Visible", true), &f.owner).unwrap();
    f.books.save(book_request("Private", false), &f.owner).unwrap();
    let archived = f.books.save(book_request("Archived", true), &f.owner).unwrap();
    f.books.toggle_archived(archived, &f.owner).unwrap();
    f.books
        .save(book_request("Borrower's own", true), &f.borrower)
        .unwrap();

    let available = f.books.find_all_books(page(0, 10), &f.borrower).unwrap();
    assert_eq!(available.total_elements, 1);
    assert_eq!(available.content[0].id, visible);

    let own = f.books.find_all_books_by_owner(page(0, 10), &f.owner).unwrap();
    assert_eq!(own.total_elements, 3);
}

#[test]
fn listings_are_newest_first_and_paged() {
    let f = fixture();
    let ids: Vec<i64> = (0..5)
        .map(|i| {
            f.books
                .save(book_request(&format!("Book {}", i), true), &f.owner)
                .unwrap()
        })
        .collect();

    let first = f.books.find_all_books(page(0, 2), &f.borrower).unwrap();
    assert_eq!(first.total_elements, 5);
    assert_eq!(first.total_pages, 3);
    assert!(first.first);
    assert!(!first.last);
    assert_eq!(first.content[0].id, ids[4]);
    assert_eq!(first.content[1].id, ids[3]);

    let last = f.books.find_all_books(page(2, 2), &f.borrower).unwrap();
    assert!(last.last);
    assert_eq!(last.content.len(), 1);
    assert_eq!(last.content[0].id, ids[0]);
}

#[test]
fn borrowed_and_returned_listings() {
    let f = fixture();
    let book_id = create_book(&f.db, &f.owner, false, true);
    f.books.borrow(book_id, &f.borrower).unwrap();
    f.books.return_book(book_id, &f.borrower).unwrap();

    let borrowed = f
        .books
        .find_all_borrowed_books(page(0, 10), &f.borrower)
        .unwrap();
    assert_eq!(borrowed.total_elements, 1);
    assert_eq!(borrowed.content[0].id, book_id);
    assert!(borrowed.content[0].returned);
    assert!(!borrowed.content[0].returned_approved);

    let lent = f
        .books
        .find_all_returned_books(page(0, 10), &f.owner)
        .unwrap();
    assert_eq!(lent.total_elements, 1);
    assert_eq!(lent.content[0].title, "The Dispossessed");

    // Neither side sees the other's view
    assert_eq!(
        f.books
            .find_all_borrowed_books(page(0, 10), &f.owner)
            .unwrap()
            .total_elements,
        0
    );
    assert_eq!(
        f.books
            .find_all_returned_books(page(0, 10), &f.borrower)
            .unwrap()
            .total_elements,
        0
    );
}

// ============================================================================
// COVERS
// ============================================================================

#[test]
fn upload_cover_is_stored_and_encoded() {
    let f = fixture();
    let book_id = create_book(&f.db, &f.owner, false, true);

    f.books
        .upload_cover(book_id, b"fake-png", "cover.PNG", &f.owner)
        .unwrap();

    let path = f.books.cover_path(book_id).unwrap().unwrap();
    assert!(path.ends_with(".png"));
    assert!(path.contains("users"));

    let book = f.books.find_by_id(book_id).unwrap();
    assert_eq!(book.cover.as_deref(), Some("ZmFrZS1wbmc="));
}

#[test]
fn upload_cover_is_owner_only() {
    let f = fixture();
    let book_id = create_book(&f.db, &f.owner, false, true);

    let err = f
        .books
        .upload_cover(book_id, b"img", "c.jpg", &f.borrower)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert!(f.books.cover_path(book_id).unwrap().is_none());
}

#[test]
fn replacing_cover_removes_previous_file() {
    let f = fixture();
    let book_id = create_book(&f.db, &f.owner, false, true);

    f.books
        .upload_cover(book_id, b"first", "a.png", &f.owner)
        .unwrap();
    let first = f.books.cover_path(book_id).unwrap().unwrap();

    f.books
        .upload_cover(book_id, b"second", "b.jpg", &f.owner)
        .unwrap();
    let second = f.books.cover_path(book_id).unwrap().unwrap();

    assert_ne!(first, second);
    assert!(!std::path::Path::new(&first).exists());
    assert_eq!(std::fs::read(&second).unwrap(), b"second");

    let user_dir = f.uploads.path().join("users").join(&f.owner.id);
    assert_eq!(std::fs::read_dir(user_dir).unwrap().count(), 1);
}

#[test]
fn failed_cover_upload_leaves_no_file() {
    let f = fixture();
    let book_id = create_book(&f.db, &f.owner, false, true);

    let err = f
        .books
        .upload_cover(book_id, b"img", "c.png", &f.borrower)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert!(!f.uploads.path().join("users").exists());
}

// ============================================================================
// FEEDBACK
// ============================================================================

fn feedback(book_id: i64, note: f64) -> FeedbackRequest {
    FeedbackRequest {
        note,
        comment: "A great read".to_string(),
        book_id,
    }
}

#[test]
fn feedback_drives_rate_and_own_flag() {
    let f = fixture();
    let reader = create_user(&f.db, "u3", "reader@example.com");
    let book_id = create_book(&f.db, &f.owner, false, true);

    f.feedback.save(feedback(book_id, 4.0), &f.borrower).unwrap();
    f.feedback.save(feedback(book_id, 3.5), &reader).unwrap();
    f.feedback.save(feedback(book_id, 5.0), &reader).unwrap();

    let book = f.books.find_by_id(book_id).unwrap();
    assert_eq!(book.rate, 4.2);

    let feedbacks = f
        .feedback
        .find_all_by_book(book_id, page(0, 10), &f.borrower)
        .unwrap();
    assert_eq!(feedbacks.total_elements, 3);
    let own: Vec<bool> = feedbacks.content.iter().map(|r| r.own_feedback).collect();
    assert_eq!(own, vec![false, false, true]);
}

#[test]
fn feedback_rules() {
    let f = fixture();
    let book_id = create_book(&f.db, &f.owner, false, true);
    let archived = create_book(&f.db, &f.owner, true, true);

    let own = f.feedback.save(feedback(book_id, 5.0), &f.owner).unwrap_err();
    assert_eq!(own.kind(), ErrorKind::PermissionDenied);

    let unavailable = f
        .feedback
        .save(feedback(archived, 5.0), &f.borrower)
        .unwrap_err();
    assert_eq!(unavailable.kind(), ErrorKind::PermissionDenied);

    let missing = f.feedback.save(feedback(999, 5.0), &f.borrower).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    let invalid = f.feedback.save(feedback(book_id, 6.0), &f.borrower).unwrap_err();
    assert_eq!(invalid.kind(), ErrorKind::Validation);
}

// ============================================================================
// AUTH
// ============================================================================

fn new_user<'a>(email: &'a str, password: &'a str) -> NewUser<'a> {
    NewUser {
        firstname: "Ada",
        lastname: "Lovelace",
        email,
        password,
    }
}

#[test]
fn auth_create_user_and_login() {
    let auth = AuthService::new(test_db(), 1, true);

    let user = auth
        .create_user(new_user("Ada@Example.com", "password123"))
        .unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.full_name(), "Ada Lovelace");

    let (logged_in, token) = auth.login("ada@example.com", "password123").unwrap();
    assert_eq!(logged_in.id, user.id);
    assert!(!token.is_empty());

    let validated = auth.validate_token(&token).unwrap().unwrap();
    assert_eq!(validated.id, user.id);
    assert!(auth.validate_token("invalid_token").unwrap().is_none());
}

#[test]
fn auth_logout() {
    let auth = AuthService::new(test_db(), 1, true);
    auth.create_user(new_user("bob@example.com", "password123"))
        .unwrap();
    let (_, token) = auth.login("bob@example.com", "password123").unwrap();

    auth.logout(&token).unwrap();
    assert!(auth.validate_token(&token).unwrap().is_none());
}

#[test]
fn auth_registration_disabled() {
    let auth = AuthService::new(test_db(), 1, false);
    let err = auth
        .register(new_user("new@example.com", "password123"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}

#[test]
fn auth_wrong_password_is_unauthorized() {
    let auth = AuthService::new(test_db(), 1, true);
    auth.create_user(new_user("eve@example.com", "correct-horse"))
        .unwrap();

    let err = auth.login("eve@example.com", "wrong-horse").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn auth_change_password() {
    let auth = AuthService::new(test_db(), 1, true);
    auth.create_user(new_user("frank@example.com", "oldpassword"))
        .unwrap();
    assert!(
        auth.change_password("frank@example.com", "newpassword")
            .unwrap()
    );

    assert!(auth.login("frank@example.com", "oldpassword").is_err());
    assert!(auth.login("frank@example.com", "newpassword").is_ok());
}

#[test]
fn auth_rejects_bad_input() {
    let auth = AuthService::new(test_db(), 1, true);

    assert!(auth.create_user(new_user("not-an-email", "password123")).is_err());
    assert!(auth.create_user(new_user("short@example.com", "abc")).is_err());
    assert!(auth.create_user(new_user("", "password123")).is_err());
}

// ============================================================================
// CONFIG
// ============================================================================

#[test]
fn config_parse_toml() {
    let toml = r#"
[server]
bind = "127.0.0.1:9090"
title = "Test Network"

[database]
path = "/tmp/test.db"

[auth]
registration = "disabled"
session_days = 7

[upload]
photos_output_path = "/tmp/uploads"
"#;
    let config: Config = toml::from_str(toml).unwrap();
    assert_eq!(config.server.bind.port(), 9090);
    assert_eq!(config.server.title, "Test Network");
    assert!(!config.auth.registration_enabled());
    assert_eq!(config.auth.session_days, 7);
    assert_eq!(
        config.upload.photos_output_path,
        std::path::PathBuf::from("/tmp/uploads")
    );
}

#[test]
fn config_default_values() {
    let config = Config::default();
    assert_eq!(config.server.bind.port(), 8088);
    assert!(config.auth.registration_enabled());
    assert_eq!(config.auth.session_days, 1);
}

#[test]
fn generated_config_parses() {
    let config: Config = toml::from_str(&Config::generate_default()).unwrap();
    assert_eq!(config.server.bind.port(), 8088);
}
