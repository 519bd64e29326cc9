//! Data models for Meeple

pub mod board_game;
pub mod category;
pub mod item;
pub mod loan;
pub mod review;
pub mod user;

// Re-export commonly used types
pub use board_game::{BoardGame, BoardGameShort};
pub use category::{Category, CategoryDetails};
pub use item::{BoardGameItem, ItemState};
pub use loan::{Loan, LoanDetails, LoanStatus};
pub use review::Review;
pub use user::{User, UserDetails, UserKind, UserRole, UserShort};
