use std::fmt;

use serde::{Deserialize, Serialize};

/// An amount in minor units (cents) of an ISO currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub amount: i64,
    pub currency: String,
}

impl Money {
    pub fn new(amount: i64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(0, currency)
    }

    /// `None` when the product does not fit in an `i64`.
    pub fn checked_times(&self, factor: u32) -> Option<Self> {
        let amount = self.amount.checked_mul(i64::from(factor))?;
        Some(Self::new(amount, self.currency.clone()))
    }

    pub fn checked_add(&self, other: &Money) -> Option<Self> {
        let amount = self.amount.checked_add(other.amount)?;
        Some(Self::new(amount, self.currency.clone()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        write!(f, "{sign}{} {}.{:02}", self.currency, abs / 100, abs % 100)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestBreakdown {
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
}

impl GuestBreakdown {
    pub fn new(adults: u32, children: u32, infants: u32) -> Self {
        Self {
            adults,
            children,
            infants,
        }
    }

    /// Headcount, saturating at `u32::MAX` for absurd inputs.
    pub fn total(&self) -> u32 {
        self.checked_total().unwrap_or(u32::MAX)
    }

    pub fn checked_total(&self) -> Option<u32> {
        self.adults.checked_add(self.children)?.checked_add(self.infants)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBand {
    Adult,
    Child,
    Infant,
}

impl AgeBand {
    pub fn label(&self) -> &'static str {
        match self {
            AgeBand::Adult => "Adult",
            AgeBand::Child => "Child",
            AgeBand::Infant => "Infant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeTier {
    pub band: AgeBand,
    pub min_age: u8,
    pub max_age: u8,
    pub price: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupBracket {
    pub min_size: u32,
    pub max_size: u32,
    pub price: Money,
}

/// Declarative price configuration of a booking option.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PricingModel {
    PerPerson {
        tiers: Vec<AgeTier>,
    },
    #[serde(rename_all = "camelCase")]
    PerUnit {
        unit_label: String,
        price_per_unit: Money,
        max_occupancy: u32,
        #[serde(default)]
        base_occupancy: Option<u32>,
        #[serde(default)]
        extra_person_fee: Option<Money>,
    },
    #[serde(rename_all = "camelCase")]
    FlatRate {
        price: Money,
        min_participants: u32,
        max_participants: u32,
    },
    TieredGroup {
        brackets: Vec<GroupBracket>,
    },
    #[serde(rename_all = "camelCase")]
    BasePlusPerson {
        base_price: Money,
        included_participants: u32,
        per_person_price: Money,
        max_participants: u32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CapacityModel {
    #[serde(rename_all = "camelCase")]
    Shared { total_seats: u32 },
    #[serde(rename_all = "camelCase")]
    Unit {
        total_units: u32,
        occupancy_per_unit: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub total: Money,
    pub breakdown: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units_needed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fits_in_one_unit: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityFit {
    pub fits: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units_needed: Option<u32>,
    pub statement: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceComparison {
    pub difference: Money,
    pub percent_more: f64,
    pub statement: String,
}
