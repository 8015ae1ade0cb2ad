//! Order status vocabulary and mapping.
//!
//! The upstream commerce platform and the dashboard use different status
//! vocabularies. The upstream set is canonical inside the gateway; the
//! dashboard-facing vocabulary is derived through an explicit mapping so
//! no code path has to guess which is which.

use serde::{Deserialize, Serialize};

/// Canonical order status, matching the upstream platform's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    OnHold,
    Completed,
    Cancelled,
    Refunded,
    Failed,
}

impl OrderStatus {
    /// The terminal value an order transitions to when a shipment is
    /// recorded with "mark shipped" set.
    pub const FULFILLED: Self = Self::Completed;

    /// The upstream wire value for this status.
    #[must_use]
    pub const fn as_upstream(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::OnHold => "on-hold",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::Failed => "failed",
        }
    }

    /// Parse an upstream wire value.
    ///
    /// Unknown values map to `None`; the upstream can grow statuses (for
    /// example via plugins) and callers decide how to degrade.
    #[must_use]
    pub fn from_upstream(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "on-hold" => Some(Self::OnHold),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "refunded" => Some(Self::Refunded),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// The dashboard-facing display status for this canonical status.
    #[must_use]
    pub const fn display_status(self) -> DisplayStatus {
        match self {
            Self::Pending | Self::OnHold | Self::Failed => DisplayStatus::Pending,
            Self::Processing => DisplayStatus::Processing,
            Self::Completed => DisplayStatus::Shipped,
            Self::Cancelled | Self::Refunded => DisplayStatus::Cancelled,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_upstream())
    }
}

/// Dashboard-facing order status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    Pending,
    Processing,
    Shipped,
    Cancelled,
}
