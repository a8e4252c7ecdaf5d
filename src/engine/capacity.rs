use std::collections::HashMap;

use uuid::Uuid;

use crate::models::guide::AvailableGuide;

/// Remaining seats per guide for the lifetime of one assignment run.
#[derive(Debug, Clone, Default)]
pub struct CapacityLedger {
    remaining: HashMap<Uuid, u32>,
}

impl CapacityLedger {
    pub fn new(guides: &[&AvailableGuide]) -> Self {
        let remaining = guides
            .iter()
            .map(|guide| {
                let seats = guide.available_capacity.min(guide.vehicle_capacity);
                (guide.id, seats)
            })
            .collect();

        Self { remaining }
    }

    pub fn remaining(&self, guide_id: Uuid) -> u32 {
        self.remaining.get(&guide_id).copied().unwrap_or(0)
    }

    pub fn can_take(&self, guide_id: Uuid, passengers: u32) -> bool {
        self.remaining(guide_id) >= passengers
    }

    pub fn consume(&mut self, guide_id: Uuid, passengers: u32) {
        if let Some(seats) = self.remaining.get_mut(&guide_id) {
            *seats = seats.saturating_sub(passengers);
        }
    }

    /// A private party takes the whole vehicle, whatever its size.
    pub fn claim_vehicle(&mut self, guide_id: Uuid) {
        if let Some(seats) = self.remaining.get_mut(&guide_id) {
            *seats = 0;
        }
    }
}
