use chrono::Duration;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::clock::Clock;
use crate::models::{PilotId, TripRequest};
use crate::repository::ScheduleStore;
use crate::{default_hold_ttl, CoreError, CoreResult};

/// Works out which rostered pilots are free to crew a trip.
pub struct AvailabilityResolver {
    store: Arc<dyn ScheduleStore>,
    clock: Arc<dyn Clock>,
    hold_ttl: Duration,
}

impl AvailabilityResolver {
    pub fn new(store: Arc<dyn ScheduleStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            hold_ttl: default_hold_ttl(),
        }
    }

    pub fn with_hold_ttl(mut self, hold_ttl: Duration) -> Self {
        self.hold_ttl = hold_ttl;
        self
    }

    /// Eligible pilots for `request`, least loaded first, ties by pilot id.
    ///
    /// An empty list means either nobody is rostered at that base on that
    /// weekday, or everybody rostered is busy.
    pub async fn resolve(&self, request: &TripRequest) -> CoreResult<Vec<PilotId>> {
        let weekday = request.weekday();
        let rostered: BTreeSet<PilotId> = self
            .store
            .get_work_patterns()
            .await
            .map_err(CoreError::Store)?
            .into_iter()
            .filter(|p| p.covers(&request.location, weekday))
            .map(|p| p.pilot_id)
            .collect();

        if rostered.is_empty() {
            debug!(base = %request.location, ?weekday, "No pilot rostered");
            return Ok(Vec::new());
        }

        let date = request.date();
        let bookings = self
            .store
            .get_bookings_for_date(date)
            .await
            .map_err(CoreError::Store)?;

        let now = self.clock.now();
        let blocked: HashSet<PilotId> = bookings
            .iter()
            .filter(|b| b.blocks(request, now, self.hold_ttl))
            .map(|b| b.pilot_id)
            .collect();

        let mut load: HashMap<PilotId, usize> = HashMap::new();
        for booking in &bookings {
            *load.entry(booking.pilot_id).or_insert(0) += 1;
        }

        let mut available: Vec<PilotId> = rostered
            .iter()
            .copied()
            .filter(|id| !blocked.contains(id))
            .collect();

        if available.is_empty() {
            debug!(
                base = %request.location,
                %date,
                rostered = rostered.len(),
                "All rostered pilots are busy"
            );
            return Ok(available);
        }

        available.sort_by_key(|id| (load.get(id).copied().unwrap_or(0), *id));
        debug!(base = %request.location, %date, ?available, "Resolved available pilots");
        Ok(available)
    }
}
