use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerId;
use crate::domain::material::MaterialId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuotationId(pub i64);

impl fmt::Display for QuotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuotationStatus {
    Draft,
    Sent,
    Approved,
    Rejected,
}

impl QuotationStatus {
    pub const ALL: [QuotationStatus; 4] = [Self::Draft, Self::Sent, Self::Approved, Self::Rejected];

    /// Integer code used by the status update endpoint and the `status` column.
    pub fn code(&self) -> i64 {
        match self {
            Self::Draft => 0,
            Self::Sent => 1,
            Self::Approved => 2,
            Self::Rejected => 3,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, DomainError> {
        match code {
            0 => Ok(Self::Draft),
            1 => Ok(Self::Sent),
            2 => Ok(Self::Approved),
            3 => Ok(Self::Rejected),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Sent => "Sent",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuotationStatus {
    type Err = DomainError;

    /// Accepts the exact status name or its integer code.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Ok(code) = trimmed.parse::<i64>() {
            return Self::from_code(code);
        }

        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == trimmed)
            .ok_or_else(|| DomainError::UnknownStatus(trimmed.to_string()))
    }
}

/// Line item as entered by the user, before prices are frozen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationItemDraft {
    pub product_name: String,
    pub width: Decimal,
    pub height: Decimal,
    pub depth: Decimal,
    pub material_id: MaterialId,
    pub quantity: u32,
}

/// Line item with its snapshot price. Never re-priced after materialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationItem {
    pub product_name: String,
    pub width: Decimal,
    pub height: Decimal,
    pub depth: Decimal,
    pub material_id: MaterialId,
    pub quantity: u32,
    pub unit_price_snapshot: Decimal,
    pub total_price: Decimal,
}

/// Create payload: customer, raw items and the requested percents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuotation {
    pub customer_id: CustomerId,
    pub items: Vec<QuotationItemDraft>,
    #[serde(default)]
    pub discount_percent: Decimal,
    #[serde(default)]
    pub tax_percent: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quotation {
    pub id: QuotationId,
    pub customer_id: CustomerId,
    pub status: QuotationStatus,
    pub discount_percent: Decimal,
    pub tax_percent: Decimal,
    pub items: Vec<QuotationItem>,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    /// Bumped by every persisted status change; used for conditional updates.
    pub version: u32,
}
