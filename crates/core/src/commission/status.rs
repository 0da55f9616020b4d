//! The nine states a commission moves through.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a commission. New commissions start in
/// [`CommissionStatus::Inquiry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "commission_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    #[default]
    Inquiry,
    Quoted,
    Accepted,
    DepositReceived,
    InProgress,
    Review,
    Completed,
    Delivered,
    Cancelled,
}

/// Coarse visual grouping of statuses used for badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusColor {
    Inquiry,
    Accepted,
    InProgress,
    Completed,
    Delivered,
    Cancelled,
}

impl StatusColor {
    /// CSS class for the badge.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Inquiry => "status-badge--inquiry",
            Self::Accepted => "status-badge--accepted",
            Self::InProgress => "status-badge--in_progress",
            Self::Completed => "status-badge--completed",
            Self::Delivered => "status-badge--delivered",
            Self::Cancelled => "status-badge--cancelled",
        }
    }
}

impl CommissionStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 9] = [
        Self::Inquiry,
        Self::Quoted,
        Self::Accepted,
        Self::DepositReceived,
        Self::InProgress,
        Self::Review,
        Self::Completed,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// The database/wire token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inquiry => "inquiry",
            Self::Quoted => "quoted",
            Self::Accepted => "accepted",
            Self::DepositReceived => "deposit_received",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Completed => "completed",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Human-readable label, e.g. `Deposit Received`.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Inquiry => "Inquiry",
            Self::Quoted => "Quoted",
            Self::Accepted => "Accepted",
            Self::DepositReceived => "Deposit Received",
            Self::InProgress => "In Progress",
            Self::Review => "Review",
            Self::Completed => "Completed",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Badge color bucket.
    #[must_use]
    pub const fn color(&self) -> StatusColor {
        match self {
            Self::Inquiry => StatusColor::Inquiry,
            Self::Quoted | Self::Accepted => StatusColor::Accepted,
            Self::DepositReceived | Self::InProgress | Self::Review => StatusColor::InProgress,
            Self::Completed => StatusColor::Completed,
            Self::Delivered => StatusColor::Delivered,
            Self::Cancelled => StatusColor::Cancelled,
        }
    }

    /// Progress through the lifecycle, 0..=100.
    #[must_use]
    pub const fn progress_percentage(&self) -> u8 {
        match self {
            Self::Inquiry => 5,
            Self::Quoted => 15,
            Self::Accepted => 25,
            Self::DepositReceived => 35,
            Self::InProgress => 60,
            Self::Review => 80,
            Self::Completed => 95,
            Self::Delivered => 100,
            Self::Cancelled => 0,
        }
    }

    /// Whether the work is finished or abandoned. Such commissions are
    /// never overdue.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Completed | Self::Delivered | Self::Cancelled)
    }

    /// Whether the commission still counts as active (not delivered or
    /// cancelled).
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl std::fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CommissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid commission status: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_progress_scale() {
        let scale: Vec<u8> = CommissionStatus::ALL
            .iter()
            .map(CommissionStatus::progress_percentage)
            .collect();
        assert_eq!(scale, [5, 15, 25, 35, 60, 80, 95, 100, 0]);
    }

    #[test]
    fn test_six_color_buckets() {
        let buckets: HashSet<_> = CommissionStatus::ALL.iter().map(CommissionStatus::color).collect();
        assert_eq!(buckets.len(), 6);
        assert_eq!(CommissionStatus::Quoted.color(), CommissionStatus::Accepted.color());
        assert_eq!(
            CommissionStatus::DepositReceived.color().css_class(),
            "status-badge--in_progress"
        );
    }

    #[test]
    fn test_token_parsing() {
        for status in CommissionStatus::ALL {
            assert_eq!(status.as_str().parse::<CommissionStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<CommissionStatus>().is_err());
        assert_eq!(CommissionStatus::DepositReceived.label(), "Deposit Received");
    }

    #[test]
    fn test_active() {
        assert!(CommissionStatus::Completed.is_active());
        assert!(!CommissionStatus::Delivered.is_active());
        assert!(!CommissionStatus::Cancelled.is_active());
    }
}
