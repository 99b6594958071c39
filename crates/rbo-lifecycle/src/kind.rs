use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::status::ParseStatusError;

/// The independently tracked entity lifecycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Sale,
    Quotation,
    Fulfillment,
}

impl EntityKind {
    pub const ALL: &'static [EntityKind] =
        &[EntityKind::Sale, EntityKind::Quotation, EntityKind::Fulfillment];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Sale => "SALE",
            EntityKind::Quotation => "QUOTATION",
            EntityKind::Fulfillment => "FULFILLMENT",
        }
    }

    /// Lower-case noun used in operator-facing messages ("invalid sale transition").
    pub fn noun(&self) -> &'static str {
        match self {
            EntityKind::Sale => "sale",
            EntityKind::Quotation => "quotation",
            EntityKind::Fulfillment => "fulfillment",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SALE" => Ok(EntityKind::Sale),
            "QUOTATION" => Ok(EntityKind::Quotation),
            "FULFILLMENT" | "FULFILMENT" => Ok(EntityKind::Fulfillment),
            _ => Err(ParseStatusError::UnknownKind {
                input: s.to_string(),
            }),
        }
    }
}
