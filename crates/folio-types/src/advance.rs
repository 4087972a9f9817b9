//! Upfront advance status.

/// Lifecycle state of an upfront advance.
///
/// ```text
/// in_review ──▸ approved ──▸ completed   (full recoupment, terminal)
///     │             │
///     │             └──▸ cancelled       (manual, terminal)
///     ├──▸ rejected                      (terminal)
///     └──▸ cancelled                     (manual, terminal)
/// ```
///
/// Only `Approved` advances participate in settlement, and only the
/// settlement engine moves one to `Completed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvanceStatus {
    InReview,
    Approved,
    Completed,
    Rejected,
    Cancelled,
}

impl AdvanceStatus {
    /// Stable string form used in the database.
    pub const fn as_str(self) -> &'static str {
        match self {
            AdvanceStatus::InReview => "in_review",
            AdvanceStatus::Approved => "approved",
            AdvanceStatus::Completed => "completed",
            AdvanceStatus::Rejected => "rejected",
            AdvanceStatus::Cancelled => "cancelled",
        }
    }

    /// Parse the database string form.
    pub fn parse(s: &str) -> Option<AdvanceStatus> {
        match s {
            "in_review" => Some(AdvanceStatus::InReview),
            "approved" => Some(AdvanceStatus::Approved),
            "completed" => Some(AdvanceStatus::Completed),
            "rejected" => Some(AdvanceStatus::Rejected),
            "cancelled" => Some(AdvanceStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether no further transition can leave this state.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            AdvanceStatus::Completed | AdvanceStatus::Rejected | AdvanceStatus::Cancelled
        )
    }
}
