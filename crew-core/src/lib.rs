pub mod availability;
pub mod clock;
pub mod locks;
pub mod memory;
pub mod models;
pub mod repository;
pub mod reservation;

pub use availability::AvailabilityResolver;
pub use clock::{Clock, FixedClock, SystemClock};
pub use memory::InMemoryScheduleStore;
pub use models::{
    HoldState, PilotId, ReservationHandle, ScheduleConfirmation, TripBooking, TripRequest,
    WorkPattern,
};
pub use repository::{ScheduleStore, StoreError};
pub use reservation::ReservationManager;

/// Seconds an unconfirmed hold keeps a pilot blocked.
pub const DEFAULT_HOLD_TTL_SECONDS: u32 = 10 * 60;

pub fn default_hold_ttl() -> chrono::Duration {
    chrono::Duration::seconds(i64::from(DEFAULT_HOLD_TTL_SECONDS))
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Schedule store failure: {0}")]
    Store(#[source] StoreError),
    #[error("Invalid trip request: {0}")]
    InvalidRequest(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
