//! Effective commission rate resolution.
//!
//! The platform's cut of a gross amount depends on what was sold:
//!
//! - **Donations**: the global donation rate (default 10%)
//! - **Books with a custom rate**: the per-book override, unconditionally
//! - **Books with an audiobook**: the global audiobook rate (default 30%)
//! - **Ebook-only books**: the global ebook rate (default 10%)
//!
//! Rates are read fresh at settlement time, never cached: a rate change
//! applies to future settlements only and never recomputes past ones.

use folio_db::queries::settings::CommissionSettings;
use folio_types::{Percent, ProductKind};

/// Default ebook commission: 10%.
pub const DEFAULT_EBOOK_BPS: i64 = 1_000;

/// Default audiobook commission: 30%.
pub const DEFAULT_AUDIOBOOK_BPS: i64 = 3_000;

/// Default donation commission: 10%.
pub const DEFAULT_DONATION_BPS: i64 = 1_000;

/// Resolve the effective commission rate for a product.
///
/// Total over all inputs; there are no error branches. The per-book
/// `custom_rate` only applies to books — donations always use the global
/// donation rate.
pub fn resolve_rate(
    kind: ProductKind,
    custom_rate: Option<Percent>,
    config: &CommissionSettings,
) -> Percent {
    match (kind, custom_rate) {
        (ProductKind::Donation, _) => config.donation,
        (_, Some(custom)) => custom,
        (kind, None) => config.rate_for(kind),
    }
}
