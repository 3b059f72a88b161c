use async_trait::async_trait;
use chrono::NaiveDate;
use crate::models::{TripBooking, WorkPattern};

pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Repository trait for roster and trip booking access.
///
/// Implementations must make `append_booking` and `update_booking` atomic with
/// respect to each other; the core does no retrying on failure.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn get_work_patterns(&self) -> Result<Vec<WorkPattern>, StoreError>;

    /// Every booking whose departure falls on `date` (UTC), live or not.
    async fn get_bookings_for_date(&self, date: NaiveDate) -> Result<Vec<TripBooking>, StoreError>;

    async fn append_booking(&self, booking: &TripBooking) -> Result<(), StoreError>;

    /// Replaces the stored booking carrying the same reservation key.
    async fn update_booking(&self, booking: &TripBooking) -> Result<(), StoreError>;
}
