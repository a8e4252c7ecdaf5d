use crate::models::option::{Badge, CalculatedOption, OptionKind};
use crate::models::pricing::GuestBreakdown;

const BEST_VALUE_MAX_PREMIUM: f64 = 25.0;
const GROUP_SIZE_FOR_RECOMMENDATION: u32 = 3;

type Rule = fn(&CalculatedOption, &GuestBreakdown) -> bool;

/// Evaluated in order; the first rule that holds decides the badge.
const RULES: [(Badge, Rule); 4] = [
    (Badge::BestValue, modest_premium),
    (Badge::SaveMoney, cheaper_than_shared),
    (Badge::BestForFamilies, family_fits_one_unit),
    (Badge::Recommended, suits_larger_party),
];

pub fn assign_badge(option: &CalculatedOption, guests: &GuestBreakdown) -> Option<Badge> {
    RULES
        .iter()
        .find(|(_, rule)| rule(option, guests))
        .map(|(badge, _)| *badge)
}

fn modest_premium(option: &CalculatedOption, _guests: &GuestBreakdown) -> bool {
    option
        .comparison
        .as_ref()
        .is_some_and(|c| (0.0..=BEST_VALUE_MAX_PREMIUM).contains(&c.percent_more))
}

fn cheaper_than_shared(option: &CalculatedOption, _guests: &GuestBreakdown) -> bool {
    option
        .comparison
        .as_ref()
        .is_some_and(|c| c.percent_more < 0.0)
}

fn family_fits_one_unit(option: &CalculatedOption, guests: &GuestBreakdown) -> bool {
    guests.children > 0
        && (option.price.fits_in_one_unit == Some(true) || option.capacity.units_needed == Some(1))
}

fn suits_larger_party(option: &CalculatedOption, guests: &GuestBreakdown) -> bool {
    option.kind != OptionKind::Join && guests.total() >= GROUP_SIZE_FOR_RECOMMENDATION
}
