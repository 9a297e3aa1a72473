//! Books: registration, listing and the borrow/return workflow.

mod mapper;
pub mod rules;
mod service;

pub use mapper::{BookRequest, BookResponse, BorrowedBookResponse};
pub use service::BookService;
