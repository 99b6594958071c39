//! Status enumerations and their transition tables.
//!
//! Each table is a `match` returning a `&'static` slice, so it is total over
//! the enumeration by construction and never rebuilt per call. Slice order is
//! the declared order reported by `allowed_transitions`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::guard::LifecycleStatus;
use crate::kind::EntityKind;

/// Returned when status or entity-kind text does not name a known value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseStatusError {
    #[error("unknown {kind} status: {input:?}")]
    UnknownStatus { kind: EntityKind, input: String },
    #[error("unknown entity kind: {input:?}")]
    UnknownKind { input: String },
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_uppercase().replace('-', "_")
}

/// Lifecycle of a sale order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    /// Created, awaiting approval or payment. Initial state.
    Pending,
    Approved,
    Paid,
    /// Goods handed over.
    Fulfilled,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "PENDING",
            SaleStatus::Approved => "APPROVED",
            SaleStatus::Paid => "PAID",
            SaleStatus::Fulfilled => "FULFILLED",
            SaleStatus::Cancelled => "CANCELLED",
        }
    }
}

impl LifecycleStatus for SaleStatus {
    const KIND: EntityKind = EntityKind::Sale;
    const ALL: &'static [Self] = &[
        SaleStatus::Pending,
        SaleStatus::Approved,
        SaleStatus::Paid,
        SaleStatus::Fulfilled,
        SaleStatus::Cancelled,
    ];

    // APPROVED and PAID may fall back to PENDING; nothing leaves FULFILLED or CANCELLED.
    fn transitions(self) -> &'static [Self] {
        use SaleStatus::*;
        match self {
            Pending => &[Approved, Paid, Fulfilled, Cancelled],
            Approved => &[Paid, Fulfilled, Cancelled, Pending],
            Paid => &[Fulfilled, Cancelled, Pending],
            Fulfilled => &[],
            Cancelled => &[],
        }
    }

    fn name(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "PENDING" => Ok(SaleStatus::Pending),
            "APPROVED" => Ok(SaleStatus::Approved),
            "PAID" => Ok(SaleStatus::Paid),
            "FULFILLED" => Ok(SaleStatus::Fulfilled),
            "CANCELLED" => Ok(SaleStatus::Cancelled),
            _ => Err(ParseStatusError::UnknownStatus {
                kind: EntityKind::Sale,
                input: s.to_string(),
            }),
        }
    }
}

/// Lifecycle of a quotation. Strictly forward: no edge returns to DRAFT or SENT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuotationStatus {
    Draft,
    Sent,
    Confirmed,
    /// Converted into a sale order.
    Approved,
    Rejected,
}

impl QuotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::Draft => "DRAFT",
            QuotationStatus::Sent => "SENT",
            QuotationStatus::Confirmed => "CONFIRMED",
            QuotationStatus::Approved => "APPROVED",
            QuotationStatus::Rejected => "REJECTED",
        }
    }
}

impl LifecycleStatus for QuotationStatus {
    const KIND: EntityKind = EntityKind::Quotation;
    const ALL: &'static [Self] = &[
        QuotationStatus::Draft,
        QuotationStatus::Sent,
        QuotationStatus::Confirmed,
        QuotationStatus::Approved,
        QuotationStatus::Rejected,
    ];

    fn transitions(self) -> &'static [Self] {
        use QuotationStatus::*;
        match self {
            Draft => &[Sent, Confirmed, Rejected],
            Sent => &[Confirmed, Rejected],
            Confirmed => &[Approved],
            Approved => &[],
            Rejected => &[],
        }
    }

    fn name(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuotationStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "DRAFT" => Ok(QuotationStatus::Draft),
            "SENT" => Ok(QuotationStatus::Sent),
            "CONFIRMED" => Ok(QuotationStatus::Confirmed),
            "APPROVED" => Ok(QuotationStatus::Approved),
            "REJECTED" => Ok(QuotationStatus::Rejected),
            _ => Err(ParseStatusError::UnknownStatus {
                kind: EntityKind::Quotation,
                input: s.to_string(),
            }),
        }
    }
}

/// Coarse lifecycle of a fulfillment (delivery) record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentStatus {
    Pending,
    /// A rider / delivery person has been assigned.
    Assigned,
    InTransit,
    Delivered,
    Cancelled,
}

impl FulfillmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::Pending => "PENDING",
            FulfillmentStatus::Assigned => "ASSIGNED",
            FulfillmentStatus::InTransit => "IN_TRANSIT",
            FulfillmentStatus::Delivered => "DELIVERED",
            FulfillmentStatus::Cancelled => "CANCELLED",
        }
    }
}

impl LifecycleStatus for FulfillmentStatus {
    const KIND: EntityKind = EntityKind::Fulfillment;
    const ALL: &'static [Self] = &[
        FulfillmentStatus::Pending,
        FulfillmentStatus::Assigned,
        FulfillmentStatus::InTransit,
        FulfillmentStatus::Delivered,
        FulfillmentStatus::Cancelled,
    ];

    // Forward-or-cancel only; no reversibility.
    fn transitions(self) -> &'static [Self] {
        use FulfillmentStatus::*;
        match self {
            Pending => &[Assigned, Cancelled],
            Assigned => &[InTransit, Cancelled],
            InTransit => &[Delivered, Cancelled],
            Delivered => &[],
            Cancelled => &[],
        }
    }

    fn name(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FulfillmentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "PENDING" => Ok(FulfillmentStatus::Pending),
            "ASSIGNED" => Ok(FulfillmentStatus::Assigned),
            "IN_TRANSIT" => Ok(FulfillmentStatus::InTransit),
            "DELIVERED" => Ok(FulfillmentStatus::Delivered),
            "CANCELLED" => Ok(FulfillmentStatus::Cancelled),
            _ => Err(ParseStatusError::UnknownStatus {
                kind: EntityKind::Fulfillment,
                input: s.to_string(),
            }),
        }
    }
}
