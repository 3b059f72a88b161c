use chrono::Duration;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::availability::AvailabilityResolver;
use crate::clock::Clock;
use crate::locks::DateLocks;
use crate::models::{
    HoldState, PilotId, ReservationHandle, ScheduleConfirmation, TripBooking, TripRequest,
};
use crate::repository::ScheduleStore;
use crate::{default_hold_ttl, CoreError, CoreResult};

/// Places short-lived holds on pilots and confirms them before they lapse.
///
/// Hold placement and confirmation for the same calendar date run one at a
/// time, so two concurrent callers never walk away holding the same pilot.
pub struct ReservationManager {
    resolver: AvailabilityResolver,
    store: Arc<dyn ScheduleStore>,
    clock: Arc<dyn Clock>,
    hold_ttl: Duration,
    date_locks: DateLocks,
}

impl ReservationManager {
    pub fn new(store: Arc<dyn ScheduleStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            resolver: AvailabilityResolver::new(store.clone(), clock.clone()),
            store,
            clock,
            hold_ttl: default_hold_ttl(),
            date_locks: DateLocks::new(),
        }
    }

    /// Overrides the hold lifetime for both resolution and confirmation.
    pub fn with_hold_ttl(mut self, hold_ttl: Duration) -> Self {
        self.resolver = self.resolver.with_hold_ttl(hold_ttl);
        self.hold_ttl = hold_ttl;
        self
    }

    /// Resolves the least loaded free pilot and holds them for the trip.
    /// Returns an empty handle when nobody can fly it.
    pub async fn get_next_available(&self, request: &TripRequest) -> CoreResult<ReservationHandle> {
        let _guard = self.date_locks.lock(request.date()).await;

        let candidates = self.resolver.resolve(request).await?;
        match candidates.first() {
            Some(&pilot_id) => self.write_hold(pilot_id, request).await,
            None => {
                info!(base = %request.location, departure = %request.departure_date_time, "No pilot available");
                Ok(ReservationHandle::empty())
            }
        }
    }

    /// Holds `pilot_id` for the trip without re-checking availability. Only
    /// call this for a pilot the resolver just produced.
    pub async fn place_hold(&self, pilot_id: PilotId, request: &TripRequest) -> CoreResult<ReservationHandle> {
        let _guard = self.date_locks.lock(request.date()).await;
        self.write_hold(pilot_id, request).await
    }

    async fn write_hold(&self, pilot_id: PilotId, request: &TripRequest) -> CoreResult<ReservationHandle> {
        let booking = TripBooking {
            pilot_id,
            departure_date_time: request.departure_date_time,
            return_date_time: request.return_date_time,
            reservation_key: Uuid::new_v4().to_string(),
            reservation_time: self.clock.now(),
            is_confirmed: false,
        };

        self.store
            .append_booking(&booking)
            .await
            .map_err(CoreError::Store)?;

        info!(
            pilot_id,
            reservation_key = %booking.reservation_key,
            departure = %booking.departure_date_time,
            "Hold placed"
        );
        Ok(ReservationHandle::held(pilot_id, booking.reservation_key))
    }

    /// Turns a live hold into a firm booking. `false` for unknown keys,
    /// expired holds and bookings that are already confirmed.
    pub async fn confirm(&self, confirmation: &ScheduleConfirmation) -> CoreResult<bool> {
        let _guard = self.date_locks.lock(confirmation.date()).await;

        let bookings = self
            .store
            .get_bookings_for_date(confirmation.date())
            .await
            .map_err(CoreError::Store)?;

        let hold = bookings.into_iter().find(|b| {
            b.pilot_id == confirmation.pilot_id
                && b.reservation_key == confirmation.reservation_key
                && !b.is_confirmed
        });

        let Some(mut booking) = hold else {
            warn!(
                pilot_id = confirmation.pilot_id,
                reservation_key = %confirmation.reservation_key,
                "No open hold to confirm"
            );
            return Ok(false);
        };

        if booking.hold_state(self.clock.now(), self.hold_ttl) == HoldState::Expired {
            warn!(
                pilot_id = booking.pilot_id,
                reservation_key = %booking.reservation_key,
                reserved_at = %booking.reservation_time,
                "Hold expired before confirmation"
            );
            return Ok(false);
        }

        booking.is_confirmed = true;
        self.store
            .update_booking(&booking)
            .await
            .map_err(CoreError::Store)?;

        info!(pilot_id = booking.pilot_id, reservation_key = %booking.reservation_key, "Hold confirmed");
        Ok(true)
    }
}
