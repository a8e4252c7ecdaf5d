//! Price and capacity evaluation of a single pricing model.
//!
//! `check_capacity_fit` answers the same "does this party fit" question that
//! `calculate_price` answers implicitly: whenever it reports no fit the
//! calculator returns `None` for the same input.

use crate::models::pricing::{
    AgeBand, AgeTier, CapacityFit, GuestBreakdown, Money, PriceComparison, PriceQuote,
    PricingModel,
};

pub fn calculate_price(model: &PricingModel, guests: &GuestBreakdown) -> Option<PriceQuote> {
    let headcount = guests.total();

    match model {
        PricingModel::PerPerson { tiers } => per_person_price(tiers, guests),
        PricingModel::PerUnit {
            unit_label,
            price_per_unit,
            max_occupancy,
            base_occupancy,
            extra_person_fee,
        } => {
            let units = units_needed(headcount, *max_occupancy)?;
            let mut total = price_per_unit.checked_times(units)?;
            let mut breakdown = format!("{units} x {unit_label} @ {price_per_unit}");

            if let (Some(base), Some(fee)) = (base_occupancy, extra_person_fee) {
                let extras = headcount.saturating_sub(units.saturating_mul(*base));
                if extras > 0 {
                    total = total.checked_add(&fee.checked_times(extras)?)?;
                    breakdown.push_str(&format!(", {extras} extra guests @ {fee}"));
                }
            }

            Some(PriceQuote {
                total,
                breakdown,
                units_needed: Some(units),
                fits_in_one_unit: Some(units == 1),
            })
        }
        PricingModel::FlatRate {
            price,
            min_participants,
            max_participants,
        } => {
            if headcount < *min_participants || headcount > *max_participants {
                return None;
            }

            Some(PriceQuote {
                total: price.clone(),
                breakdown: format!("Flat rate for up to {max_participants} guests"),
                units_needed: None,
                fits_in_one_unit: None,
            })
        }
        PricingModel::TieredGroup { brackets } => {
            let bracket = brackets
                .iter()
                .find(|bracket| bracket.min_size <= headcount && headcount <= bracket.max_size)?;

            Some(PriceQuote {
                total: bracket.price.clone(),
                breakdown: format!(
                    "Group of {headcount} ({}-{} guests)",
                    bracket.min_size, bracket.max_size
                ),
                units_needed: None,
                fits_in_one_unit: None,
            })
        }
        PricingModel::BasePlusPerson {
            base_price,
            included_participants,
            per_person_price,
            max_participants,
        } => {
            if headcount > *max_participants {
                return None;
            }

            let extras = headcount.saturating_sub(*included_participants);
            let mut total = base_price.clone();
            let mut breakdown =
                format!("Base price for {included_participants} guests {base_price}");
            if extras > 0 {
                total = total.checked_add(&per_person_price.checked_times(extras)?)?;
                breakdown.push_str(&format!(", {extras} additional @ {per_person_price}"));
            }

            Some(PriceQuote {
                total,
                breakdown,
                units_needed: None,
                fits_in_one_unit: None,
            })
        }
    }
}

fn per_person_price(tiers: &[AgeTier], guests: &GuestBreakdown) -> Option<PriceQuote> {
    let mut total = Money::zero(tiers.first()?.price.currency.clone());
    let mut parts = Vec::new();

    for (band, count) in bands(guests) {
        match tiers.iter().find(|tier| tier.band == band) {
            Some(tier) => {
                total = total.checked_add(&tier.price.checked_times(count)?)?;
                parts.push(format!(
                    "{count} x {} ({}-{}) @ {}",
                    band.label(),
                    tier.min_age,
                    tier.max_age,
                    tier.price
                ));
            }
            None if band == AgeBand::Infant => parts.push(format!("{count} x Infant free")),
            None => return None,
        }
    }

    Some(PriceQuote {
        total,
        breakdown: parts.join(", "),
        units_needed: None,
        fits_in_one_unit: None,
    })
}

/// Non-empty guest categories in display order.
fn bands(guests: &GuestBreakdown) -> impl Iterator<Item = (AgeBand, u32)> {
    [
        (AgeBand::Adult, guests.adults),
        (AgeBand::Child, guests.children),
        (AgeBand::Infant, guests.infants),
    ]
    .into_iter()
    .filter(|(_, count)| *count > 0)
}

fn units_needed(headcount: u32, max_occupancy: u32) -> Option<u32> {
    if max_occupancy == 0 {
        return None;
    }
    Some(headcount.div_ceil(max_occupancy))
}

pub fn check_capacity_fit(model: &PricingModel, guests: &GuestBreakdown) -> CapacityFit {
    let headcount = guests.total();

    match model {
        PricingModel::PerPerson { tiers } => {
            let missing = bands(guests)
                .map(|(band, _)| band)
                .find(|band| *band != AgeBand::Infant && !tiers.iter().any(|t| t.band == *band));

            match missing {
                _ if tiers.is_empty() => not_fitting("No guest prices configured"),
                Some(band) => not_fitting(&format!("No {} price configured", band.label())),
                None => CapacityFit {
                    fits: true,
                    units_needed: None,
                    statement: format!("Priced per guest for {headcount} guests"),
                },
            }
        }
        PricingModel::PerUnit {
            unit_label,
            max_occupancy,
            ..
        } => match units_needed(headcount, *max_occupancy) {
            Some(1) => CapacityFit {
                fits: true,
                units_needed: Some(1),
                statement: format!("Fits in one {unit_label}"),
            },
            Some(units) => CapacityFit {
                fits: true,
                units_needed: Some(units),
                statement: format!(
                    "Needs {units} x {unit_label} for {headcount} guests (max {max_occupancy} each)"
                ),
            },
            None => not_fitting(&format!("{unit_label} has no occupancy configured")),
        },
        PricingModel::FlatRate {
            min_participants,
            max_participants,
            ..
        } => {
            if headcount < *min_participants || headcount > *max_participants {
                not_fitting(&format!(
                    "Requires {min_participants}-{max_participants} guests"
                ))
            } else {
                CapacityFit {
                    fits: true,
                    units_needed: None,
                    statement: format!("Suitable for {min_participants}-{max_participants} guests"),
                }
            }
        }
        PricingModel::TieredGroup { brackets } => {
            let covered = brackets
                .iter()
                .any(|bracket| bracket.min_size <= headcount && headcount <= bracket.max_size);
            if covered {
                CapacityFit {
                    fits: true,
                    units_needed: None,
                    statement: format!("Group rate available for {headcount} guests"),
                }
            } else {
                not_fitting(&format!("No group rate for {headcount} guests"))
            }
        }
        PricingModel::BasePlusPerson {
            max_participants, ..
        } => {
            if headcount > *max_participants {
                not_fitting(&format!("Maximum {max_participants} guests"))
            } else {
                CapacityFit {
                    fits: true,
                    units_needed: None,
                    statement: format!("Up to {max_participants} guests"),
                }
            }
        }
    }
}

fn not_fitting(statement: &str) -> CapacityFit {
    CapacityFit {
        fits: false,
        units_needed: None,
        statement: statement.to_string(),
    }
}

/// Price difference against the shared option; `None` across currencies or for a zero baseline.
pub fn compare_to_baseline(candidate: &Money, baseline: &Money) -> Option<PriceComparison> {
    if candidate.currency != baseline.currency || baseline.amount == 0 {
        return None;
    }

    let difference = Money::new(
        candidate.amount.checked_sub(baseline.amount)?,
        candidate.currency.clone(),
    );
    let percent_more = difference.amount as f64 / baseline.amount as f64 * 100.0;

    let statement = if difference.amount > 0 {
        format!("{percent_more:.0}% more than the shared tour")
    } else if difference.amount < 0 {
        let saving = Money::new(difference.amount.saturating_neg(), difference.currency.clone());
        format!("Save {saving} compared to the shared tour")
    } else {
        "Same price as the shared tour".to_string()
    };

    Some(PriceComparison {
        difference,
        percent_more,
        statement,
    })
}
