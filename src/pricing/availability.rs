//! Bookable options for a tour, date and party.
//!
//! Each active booking option is filtered by capacity fit, priced, checked
//! against the departures of the day and compared with the shared option.

use chrono::{Days, NaiveDate, Utc};
use futures::future::try_join_all;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::option::{
    AlternativeDate, AvailabilityReport, BookingOption, CalculatedOption, OptionKind,
    OptionSchedule, SchedulingMode, SlotAvailability,
};
use crate::models::pricing::{
    AgeBand, AgeTier, CapacityFit, CapacityModel, GuestBreakdown, PricingModel,
};
use crate::models::schedule::{Departure, Tour};
use crate::pricing::badges::assign_badge;
use crate::pricing::calculator::{calculate_price, check_capacity_fit, compare_to_baseline};
use crate::store::AvailabilityRepository;

pub const LEGACY_OPTION_NAME: &str = "Standard Experience";

/// Below this many open alternative dates a sold-out request is offered the waitlist.
const MIN_ALTERNATIVES: usize = 2;

pub async fn check_availability(
    repo: &dyn AvailabilityRepository,
    tour_id: Uuid,
    date: NaiveDate,
    guests: GuestBreakdown,
    alternative_window: u32,
) -> Result<AvailabilityReport, AppError> {
    let tour = repo.get_tour(tour_id).await?;
    let options = evaluate_date(repo, &tour, date, &guests).await?;
    let sold_out = options.iter().all(|option| !option.available);

    let (alternative_dates, waitlist_available) = if sold_out {
        let alternatives = scan_alternatives(repo, &tour, date, &guests, alternative_window).await?;
        let waitlist = alternatives.len() < MIN_ALTERNATIVES;
        (alternatives, waitlist)
    } else {
        (Vec::new(), false)
    };

    info!(
        %tour_id,
        %date,
        guests = guests.total(),
        options = options.len(),
        sold_out,
        alternatives = alternative_dates.len(),
        "availability checked"
    );

    Ok(AvailabilityReport {
        tour_id,
        date,
        guests,
        options,
        sold_out,
        alternative_dates,
        waitlist_available,
    })
}

async fn evaluate_date(
    repo: &dyn AvailabilityRepository,
    tour: &Tour,
    date: NaiveDate,
    guests: &GuestBreakdown,
) -> Result<Vec<CalculatedOption>, AppError> {
    let departures = repo.list_departures(tour.id, date).await?;

    let mut configs: Vec<BookingOption> = repo
        .list_booking_options(tour.id)
        .await?
        .into_iter()
        .filter(|option| option.is_active)
        .collect();

    if configs.is_empty() {
        if departures.is_empty() {
            return Ok(Vec::new());
        }
        configs.push(legacy_option(tour));
    }

    let mut calculated = Vec::with_capacity(configs.len());
    for option in &configs {
        let fit = check_capacity_fit(&option.pricing, guests);
        if !fit.fits {
            debug!(option_id = %option.id, reason = %fit.statement, "option does not fit party");
            continue;
        }

        let Some(price) = calculate_price(&option.pricing, guests) else {
            continue;
        };

        let units_needed = units_for(&option.capacity, &fit, guests);
        let schedule = match option.scheduling {
            SchedulingMode::Fixed => OptionSchedule::Fixed {
                slots: slot_availability(repo, option, &departures, guests, units_needed).await?,
            },
            SchedulingMode::Flexible => OptionSchedule::Flexible {
                earliest: departures.first().map(|departure| departure.time),
                latest: departures.last().map(|departure| departure.time),
            },
        };

        calculated.push(CalculatedOption {
            option_id: option.id,
            name: option.name.clone(),
            kind: option.kind,
            price,
            capacity: CapacityFit {
                units_needed,
                ..fit
            },
            available: schedule.is_available(),
            schedule,
            comparison: None,
            badge: None,
        });
    }

    attach_comparisons(&mut calculated);
    for option in calculated.iter_mut().filter(|option| option.available) {
        option.badge = assign_badge(option, guests);
    }

    Ok(calculated)
}

/// Synthesized when a tour predates booking options: shared seats at the flat base price.
fn legacy_option(tour: &Tour) -> BookingOption {
    BookingOption {
        id: tour.id,
        tour_id: tour.id,
        name: LEGACY_OPTION_NAME.to_string(),
        kind: OptionKind::Join,
        pricing: PricingModel::PerPerson {
            tiers: vec![
                AgeTier {
                    band: AgeBand::Adult,
                    min_age: 13,
                    max_age: 99,
                    price: tour.base_price.clone(),
                },
                AgeTier {
                    band: AgeBand::Child,
                    min_age: 3,
                    max_age: 12,
                    price: tour.base_price.clone(),
                },
            ],
        },
        capacity: CapacityModel::Shared {
            total_seats: tour.max_group_size,
        },
        scheduling: SchedulingMode::Fixed,
        is_active: true,
        sort_order: 0,
    }
}

fn units_for(capacity: &CapacityModel, fit: &CapacityFit, guests: &GuestBreakdown) -> Option<u32> {
    match capacity {
        CapacityModel::Shared { .. } => fit.units_needed,
        CapacityModel::Unit {
            occupancy_per_unit, ..
        } => fit.units_needed.or_else(|| {
            (*occupancy_per_unit > 0).then(|| guests.total().div_ceil(*occupancy_per_unit))
        }),
    }
}

async fn slot_availability(
    repo: &dyn AvailabilityRepository,
    option: &BookingOption,
    departures: &[Departure],
    guests: &GuestBreakdown,
    units_needed: Option<u32>,
) -> Result<Vec<SlotAvailability>, AppError> {
    let usages = try_join_all(
        departures
            .iter()
            .map(|departure| repo.slot_usage(departure.schedule_id, option.id)),
    )
    .await?;

    let slots = departures
        .iter()
        .zip(usages)
        .map(|(departure, usage)| match option.capacity {
            CapacityModel::Shared { total_seats } => {
                let remaining = total_seats.saturating_sub(usage.booked_seats);
                SlotAvailability {
                    schedule_id: departure.schedule_id,
                    time: departure.time,
                    available: remaining >= guests.total(),
                    seats_remaining: Some(remaining),
                    units_remaining: None,
                }
            }
            CapacityModel::Unit { total_units, .. } => {
                let remaining = total_units.saturating_sub(usage.booked_units);
                SlotAvailability {
                    schedule_id: departure.schedule_id,
                    time: departure.time,
                    available: units_needed.is_some_and(|units| units <= remaining),
                    seats_remaining: None,
                    units_remaining: Some(remaining),
                }
            }
        })
        .collect();

    Ok(slots)
}

/// Compares every option with the first shared (join) option, if there is one.
fn attach_comparisons(options: &mut [CalculatedOption]) {
    let Some(baseline_index) = options
        .iter()
        .position(|option| option.kind == OptionKind::Join)
    else {
        return;
    };
    let baseline = options[baseline_index].price.total.clone();

    for (index, option) in options.iter_mut().enumerate() {
        if index != baseline_index {
            option.comparison = compare_to_baseline(&option.price.total, &baseline);
        }
    }
}

async fn scan_alternatives(
    repo: &dyn AvailabilityRepository,
    tour: &Tour,
    date: NaiveDate,
    guests: &GuestBreakdown,
    window: u32,
) -> Result<Vec<AlternativeDate>, AppError> {
    let today = Utc::now().date_naive();
    let candidates: Vec<NaiveDate> = (1..=u64::from(window))
        .flat_map(|offset| {
            [
                date.checked_sub_days(Days::new(offset)),
                date.checked_add_days(Days::new(offset)),
            ]
        })
        .flatten()
        .filter(|candidate| *candidate >= today)
        .collect();

    let evaluated = try_join_all(
        candidates
            .iter()
            .map(|candidate| evaluate_date(repo, tour, *candidate, guests)),
    )
    .await?;

    let mut alternatives: Vec<AlternativeDate> = candidates
        .into_iter()
        .zip(evaluated)
        .filter_map(|(candidate, options)| {
            let open: Vec<&CalculatedOption> =
                options.iter().filter(|option| option.available).collect();
            if open.is_empty() {
                return None;
            }

            Some(AlternativeDate {
                date: candidate,
                available_options: open.len(),
                lowest_price: open
                    .iter()
                    .map(|option| &option.price.total)
                    .min_by_key(|price| price.amount)
                    .cloned(),
            })
        })
        .collect();
    alternatives.sort_by_key(|alternative| alternative.date);

    Ok(alternatives)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
    use uuid::Uuid;

    use super::{check_availability, LEGACY_OPTION_NAME};
    use crate::models::option::{Badge, BookingOption, OptionKind, OptionSchedule, SchedulingMode};
    use crate::models::pricing::{
        AgeBand, AgeTier, CapacityModel, GuestBreakdown, Money, PricingModel,
    };
    use crate::models::schedule::{SlotUsage, Tour, TourSchedule};
    use crate::store::MemoryStore;

    const TOUR: u128 = 2;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 5, day).unwrap()
    }

    fn usd(amount: i64) -> Money {
        Money::new(amount, "USD")
    }

    fn store_with_departures(days: &[u32]) -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_tour(Tour {
            id: Uuid::from_u128(TOUR),
            organization_id: Uuid::from_u128(1),
            name: "Red Rock Canyon".to_string(),
            base_price: usd(8_000),
            max_group_size: 12,
        });
        for &day in days {
            store.insert_schedule(TourSchedule {
                id: Uuid::from_u128(1_000 + day as u128),
                organization_id: Uuid::from_u128(1),
                tour_id: Uuid::from_u128(TOUR),
                date: date(day),
                departure: Utc.with_ymd_and_hms(2030, 5, day, 8, 0, 0).unwrap(),
            });
        }
        store
    }

    fn join_option(seats: u32) -> BookingOption {
        BookingOption {
            id: Uuid::from_u128(10),
            tour_id: Uuid::from_u128(TOUR),
            name: "Join a group".to_string(),
            kind: OptionKind::Join,
            pricing: PricingModel::PerPerson {
                tiers: vec![
                    AgeTier {
                        band: AgeBand::Adult,
                        min_age: 13,
                        max_age: 99,
                        price: usd(5_000),
                    },
                    AgeTier {
                        band: AgeBand::Child,
                        min_age: 3,
                        max_age: 12,
                        price: usd(3_000),
                    },
                ],
            },
            capacity: CapacityModel::Shared { total_seats: seats },
            scheduling: SchedulingMode::Fixed,
            is_active: true,
            sort_order: 0,
        }
    }

    fn private_suv(price: i64) -> BookingOption {
        BookingOption {
            id: Uuid::from_u128(11),
            tour_id: Uuid::from_u128(TOUR),
            name: "Private SUV".to_string(),
            kind: OptionKind::Private,
            pricing: PricingModel::PerUnit {
                unit_label: "SUV".to_string(),
                price_per_unit: usd(price),
                max_occupancy: 5,
                base_occupancy: None,
                extra_person_fee: None,
            },
            capacity: CapacityModel::Unit {
                total_units: 2,
                occupancy_per_unit: 5,
            },
            scheduling: SchedulingMode::Fixed,
            is_active: true,
            sort_order: 1,
        }
    }

    #[tokio::test]
    async fn options_are_priced_compared_and_badged() {
        let store = store_with_departures(&[10]);
        store.insert_booking_option(join_option(14));
        store.insert_booking_option(private_suv(20_000));

        // 2 adults + 2 children on the shared tour: 160.00
        let report = check_availability(
            &store,
            Uuid::from_u128(TOUR),
            date(10),
            GuestBreakdown::new(2, 2, 0),
            3,
        )
        .await
        .unwrap();

        assert!(!report.sold_out);
        assert_eq!(report.options.len(), 2);

        let join = &report.options[0];
        assert_eq!(join.price.total, usd(16_000));
        assert!(join.comparison.is_none());
        assert!(join.badge.is_none());

        let private = &report.options[1];
        assert_eq!(private.price.total, usd(20_000));
        let comparison = private.comparison.as_ref().unwrap();
        assert!((comparison.percent_more - 25.0).abs() < 1e-9);
        assert_eq!(private.badge, Some(Badge::BestValue));
    }

    #[tokio::test]
    async fn unit_slots_use_remaining_vehicles() {
        let store = store_with_departures(&[10]);
        store.insert_booking_option(join_option(14));
        store.insert_booking_option(private_suv(40_000));
        store.set_slot_usage(
            Uuid::from_u128(1_010),
            Uuid::from_u128(11),
            SlotUsage {
                booked_seats: 0,
                booked_units: 1,
            },
        );

        // 7 guests need two SUVs but only one is left
        let report = check_availability(
            &store,
            Uuid::from_u128(TOUR),
            date(10),
            GuestBreakdown::new(7, 0, 0),
            3,
        )
        .await
        .unwrap();

        let private = &report.options[1];
        assert_eq!(private.capacity.units_needed, Some(2));
        assert!(!private.available);
        match &private.schedule {
            OptionSchedule::Fixed { slots } => assert_eq!(slots[0].units_remaining, Some(1)),
            other => panic!("unexpected schedule {other:?}"),
        }
        assert!(private.badge.is_none());
        assert!(report.options[0].available);
    }

    #[tokio::test]
    async fn options_that_cannot_fit_are_dropped() {
        let store = store_with_departures(&[10]);
        let mut adults_only = join_option(14);
        if let PricingModel::PerPerson { tiers } = &mut adults_only.pricing {
            tiers.retain(|tier| tier.band == AgeBand::Adult);
        }
        store.insert_booking_option(adults_only);
        store.insert_booking_option(private_suv(20_000));

        let report = check_availability(
            &store,
            Uuid::from_u128(TOUR),
            date(10),
            GuestBreakdown::new(1, 1, 0),
            3,
        )
        .await
        .unwrap();

        assert_eq!(report.options.len(), 1);
        assert_eq!(report.options[0].kind, OptionKind::Private);
        assert!(report.options[0].comparison.is_none());
    }

    #[tokio::test]
    async fn legacy_tour_gets_standard_experience() {
        let store = store_with_departures(&[10]);

        let report = check_availability(
            &store,
            Uuid::from_u128(TOUR),
            date(10),
            GuestBreakdown::new(2, 0, 1),
            3,
        )
        .await
        .unwrap();

        assert_eq!(report.options.len(), 1);
        assert_eq!(report.options[0].name, LEGACY_OPTION_NAME);
        assert_eq!(report.options[0].price.total, usd(16_000));
        assert!(report.options[0].available);
    }

    #[tokio::test]
    async fn sold_out_date_suggests_nearby_dates() {
        let store = store_with_departures(&[10, 8, 12, 14]);
        store.insert_booking_option(join_option(6));
        store.set_slot_usage(
            Uuid::from_u128(1_010),
            Uuid::from_u128(10),
            SlotUsage {
                booked_seats: 6,
                booked_units: 0,
            },
        );

        let report = check_availability(
            &store,
            Uuid::from_u128(TOUR),
            date(10),
            GuestBreakdown::new(2, 0, 0),
            3,
        )
        .await
        .unwrap();

        assert!(report.sold_out);
        let dates: Vec<NaiveDate> = report.alternative_dates.iter().map(|a| a.date).collect();
        assert_eq!(dates, vec![date(8), date(12)]);
        assert_eq!(report.alternative_dates[0].lowest_price, Some(usd(10_000)));
        assert!(!report.waitlist_available);
    }

    #[tokio::test]
    async fn legacy_tour_without_departures_is_sold_out_with_waitlist() {
        let store = store_with_departures(&[]);

        let report = check_availability(
            &store,
            Uuid::from_u128(TOUR),
            date(10),
            GuestBreakdown::new(2, 0, 0),
            3,
        )
        .await
        .unwrap();

        assert!(report.options.is_empty());
        assert!(report.sold_out);
        assert!(report.alternative_dates.is_empty());
        assert!(report.waitlist_available);
    }

    fn flexible_charter() -> BookingOption {
        BookingOption {
            id: Uuid::from_u128(12),
            tour_id: Uuid::from_u128(TOUR),
            name: "Charter any time".to_string(),
            kind: OptionKind::Charter,
            pricing: PricingModel::FlatRate {
                price: usd(60_000),
                min_participants: 1,
                max_participants: 8,
            },
            capacity: CapacityModel::Unit {
                total_units: 1,
                occupancy_per_unit: 8,
            },
            scheduling: SchedulingMode::Flexible,
            is_active: true,
            sort_order: 2,
        }
    }

    #[tokio::test]
    async fn flexible_option_reports_departure_window() {
        let store = store_with_departures(&[10]);
        store.insert_schedule(TourSchedule {
            id: Uuid::from_u128(2_010),
            organization_id: Uuid::from_u128(1),
            tour_id: Uuid::from_u128(TOUR),
            date: date(10),
            departure: Utc.with_ymd_and_hms(2030, 5, 10, 14, 30, 0).unwrap(),
        });
        store.insert_booking_option(flexible_charter());

        let report = check_availability(
            &store,
            Uuid::from_u128(TOUR),
            date(10),
            GuestBreakdown::new(3, 0, 0),
            3,
        )
        .await
        .unwrap();

        assert!(!report.sold_out);
        let charter = &report.options[0];
        assert!(charter.available);
        match &charter.schedule {
            OptionSchedule::Flexible { earliest, latest } => {
                assert_eq!(*earliest, NaiveTime::from_hms_opt(8, 0, 0));
                assert_eq!(*latest, NaiveTime::from_hms_opt(14, 30, 0));
            }
            other => panic!("unexpected schedule {other:?}"),
        }
    }

    #[tokio::test]
    async fn flexible_option_without_departures_is_sold_out() {
        let store = store_with_departures(&[10]);
        store.insert_booking_option(flexible_charter());

        let report = check_availability(
            &store,
            Uuid::from_u128(TOUR),
            date(20),
            GuestBreakdown::new(3, 0, 0),
            3,
        )
        .await
        .unwrap();

        assert_eq!(report.options.len(), 1);
        assert!(!report.options[0].available);
        assert!(matches!(
            report.options[0].schedule,
            OptionSchedule::Flexible {
                earliest: None,
                latest: None
            }
        ));
        assert!(report.sold_out);
        assert!(report.alternative_dates.is_empty());
        assert!(report.waitlist_available);
    }

    #[tokio::test]
    async fn unknown_tour_is_not_found() {
        let store = MemoryStore::new();
        let result = check_availability(
            &store,
            Uuid::from_u128(TOUR),
            date(10),
            GuestBreakdown::new(2, 0, 0),
            3,
        )
        .await;

        assert!(matches!(result, Err(crate::error::AppError::NotFound(_))));
    }
}
