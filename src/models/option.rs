use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::pricing::{
    CapacityFit, CapacityModel, GuestBreakdown, Money, PriceComparison, PriceQuote, PricingModel,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    /// Shared seats alongside other parties; the pricing baseline.
    Join,
    Private,
    Charter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingMode {
    Fixed,
    Flexible,
}

/// A purchasable variant of a tour with its own pricing and capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingOption {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub name: String,
    pub kind: OptionKind,
    pub pricing: PricingModel,
    pub capacity: CapacityModel,
    pub scheduling: SchedulingMode,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i32,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    pub schedule_id: Uuid,
    pub time: NaiveTime,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seats_remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units_remaining: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OptionSchedule {
    Fixed {
        slots: Vec<SlotAvailability>,
    },
    Flexible {
        earliest: Option<NaiveTime>,
        latest: Option<NaiveTime>,
    },
}

impl OptionSchedule {
    pub fn is_available(&self) -> bool {
        match self {
            OptionSchedule::Fixed { slots } => slots.iter().any(|slot| slot.available),
            OptionSchedule::Flexible { earliest, .. } => earliest.is_some(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Badge {
    BestValue,
    SaveMoney,
    BestForFamilies,
    Recommended,
}

/// Per-request projection of a booking option for one party and date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedOption {
    pub option_id: Uuid,
    pub name: String,
    pub kind: OptionKind,
    pub price: PriceQuote,
    pub capacity: CapacityFit,
    pub schedule: OptionSchedule,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<PriceComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<Badge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeDate {
    pub date: NaiveDate,
    pub available_options: usize,
    pub lowest_price: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityReport {
    pub tour_id: Uuid,
    pub date: NaiveDate,
    pub guests: GuestBreakdown,
    pub options: Vec<CalculatedOption>,
    pub sold_out: bool,
    pub alternative_dates: Vec<AlternativeDate>,
    pub waitlist_available: bool,
}
