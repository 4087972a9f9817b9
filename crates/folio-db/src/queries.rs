//! Database query functions organized by domain.

pub mod advances;
pub mod books;
pub mod payments;
pub mod payouts;
pub mod settings;
pub mod users;
