use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::models::{TripBooking, WorkPattern};
use crate::repository::{ScheduleStore, StoreError};

/// In-memory store (used for tests and the `memory` storage backend)
pub struct InMemoryScheduleStore {
    crew: RwLock<Vec<WorkPattern>>,
    bookings: RwLock<BTreeMap<NaiveDate, Vec<TripBooking>>>,
}

impl InMemoryScheduleStore {
    pub fn new(crew: Vec<WorkPattern>) -> Self {
        Self {
            crew: RwLock::new(crew),
            bookings: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn with_bookings(crew: Vec<WorkPattern>, bookings: Vec<TripBooking>) -> Self {
        let mut by_date: BTreeMap<NaiveDate, Vec<TripBooking>> = BTreeMap::new();
        for booking in bookings {
            by_date.entry(booking.date()).or_default().push(booking);
        }
        Self {
            crew: RwLock::new(crew),
            bookings: RwLock::new(by_date),
        }
    }

    /// Every booking held, in date order.
    pub async fn all_bookings(&self) -> Vec<TripBooking> {
        self.bookings.read().await.values().flatten().cloned().collect()
    }
}

impl Default for InMemoryScheduleStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl ScheduleStore for InMemoryScheduleStore {
    async fn get_work_patterns(&self) -> Result<Vec<WorkPattern>, StoreError> {
        Ok(self.crew.read().await.clone())
    }

    async fn get_bookings_for_date(&self, date: NaiveDate) -> Result<Vec<TripBooking>, StoreError> {
        Ok(self
            .bookings
            .read()
            .await
            .get(&date)
            .cloned()
            .unwrap_or_default())
    }

    async fn append_booking(&self, booking: &TripBooking) -> Result<(), StoreError> {
        self.bookings
            .write()
            .await
            .entry(booking.date())
            .or_default()
            .push(booking.clone());
        Ok(())
    }

    async fn update_booking(&self, booking: &TripBooking) -> Result<(), StoreError> {
        let mut bookings = self.bookings.write().await;
        let existing = bookings
            .values_mut()
            .flatten()
            .find(|b| b.reservation_key == booking.reservation_key)
            .ok_or_else(|| format!("No booking with reservation key {}", booking.reservation_key))?;
        *existing = booking.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn booking(key: &str, day: u32) -> TripBooking {
        let departure = Utc.with_ymd_and_hms(2020, 10, day, 14, 0, 0).unwrap();
        TripBooking {
            pilot_id: 1,
            departure_date_time: departure,
            return_date_time: departure + chrono::Duration::hours(2),
            reservation_key: key.to_string(),
            reservation_time: departure - chrono::Duration::hours(3),
            is_confirmed: false,
        }
    }

    #[tokio::test]
    async fn test_bookings_are_filed_by_date() {
        let store = InMemoryScheduleStore::default();
        store.append_booking(&booking("a", 1)).await.unwrap();
        store.append_booking(&booking("b", 2)).await.unwrap();

        let first = NaiveDate::from_ymd_opt(2020, 10, 1).unwrap();
        let day = store.get_bookings_for_date(first).await.unwrap();
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].reservation_key, "a");
    }

    #[tokio::test]
    async fn test_update_unknown_key_fails() {
        let store = InMemoryScheduleStore::with_bookings(Vec::new(), vec![booking("a", 1)]);

        let mut confirmed = booking("a", 1);
        confirmed.is_confirmed = true;
        store.update_booking(&confirmed).await.unwrap();
        assert!(store.all_bookings().await[0].is_confirmed);

        assert!(store.update_booking(&booking("missing", 1)).await.is_err());
    }
}
