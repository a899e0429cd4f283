//! Order status vocabulary and its cash-flow categories.
//!
//! Statuses arrive from the store as free-form labels. Historical data mixes the
//! English labels with French synonyms, so [`OrderStatus::parse_label`] is the one
//! place that knows every accepted spelling, and [`OrderStatus::category`] is the
//! one place that maps a status onto a [`StatusCategory`].
//!
//! | Category  | Labels                                |
//! |-----------|---------------------------------------|
//! | Collected | Delivered, Payée                      |
//! | Pending   | Pending, Shipped, En cours            |
//! | Lost      | Returned, Cancelled, Refused, Retour  |

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Canonical lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Created, not yet handed to the courier. Synonym: "En cours".
    Pending,
    /// Handed to the courier.
    Shipped,
    /// Delivered and paid. Synonym: "Payée".
    Delivered,
    /// Sent back by the courier. Synonym: "Retour".
    Returned,
    /// Cancelled before delivery.
    Cancelled,
    /// Refused by the customer at the door.
    Refused,
}

/// Coarse cash-flow grouping over [`OrderStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    /// Money in hand.
    Collected,
    /// Money still on the road.
    Pending,
    /// Money that will not arrive.
    Lost,
}

/// A label that is not part of the status vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0:?}")]
pub struct StatusParseError(pub String);

impl OrderStatus {
    /// Every canonical status, in lifecycle order.
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Returned,
        OrderStatus::Cancelled,
        OrderStatus::Refused,
    ];

    /// Resolve a stored label (canonical or synonym) to its status.
    ///
    /// Matching is exact after trimming surrounding whitespace; labels are stored
    /// by the application, not typed by users, so case folding would only hide
    /// data problems.
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Pending" | "En cours" => Some(OrderStatus::Pending),
            "Shipped" => Some(OrderStatus::Shipped),
            "Delivered" | "Payée" => Some(OrderStatus::Delivered),
            "Returned" | "Retour" => Some(OrderStatus::Returned),
            "Cancelled" => Some(OrderStatus::Cancelled),
            "Refused" => Some(OrderStatus::Refused),
            _ => None,
        }
    }

    /// The category this status contributes to.
    pub const fn category(self) -> StatusCategory {
        match self {
            OrderStatus::Delivered => StatusCategory::Collected,
            OrderStatus::Pending | OrderStatus::Shipped => StatusCategory::Pending,
            OrderStatus::Returned | OrderStatus::Cancelled | OrderStatus::Refused => {
                StatusCategory::Lost
            }
        }
    }

    /// Canonical label written back to storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Returned => "Returned",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Refused => "Refused",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = StatusParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::parse_label(s).ok_or_else(|| StatusParseError(s.to_string()))
    }
}

impl StatusCategory {
    /// Category of a raw label, or `None` when the label is outside the vocabulary.
    pub fn of_label(label: &str) -> Option<Self> {
        OrderStatus::parse_label(label).map(OrderStatus::category)
    }
}
