//! # folio-types
//!
//! Shared domain types used across the Folio workspace: exact fixed-point
//! money, percentages, the payment-completion event consumed by the
//! settlement engine, and the domain events it emits.

pub mod advance;
pub mod events;
pub mod money;
pub mod product;

pub use advance::AdvanceStatus;
pub use events::SettlementEvent;
pub use money::{Money, MoneyError, Percent};
pub use product::{PaymentEvent, ProductKind, SettlementResult};

/// Common type aliases.
pub type UserId = i64;
pub type BookId = i64;
pub type AdvanceId = i64;

/// Minor units per XAF (2 decimal places).
pub const MINOR_UNITS_PER_XAF: i64 = 100;
