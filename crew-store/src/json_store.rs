use async_trait::async_trait;
use chrono::NaiveDate;
use crew_core::repository::{ScheduleStore, StoreError as CoreStoreError};
use crew_core::{TripBooking, WorkPattern};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::StoreError;

#[derive(Deserialize)]
struct CrewFile {
    #[serde(rename = "Crew")]
    crew: Vec<WorkPattern>,
}

/// Reads the roster file (`{"Crew": [...]}`).
pub async fn read_crew(path: &Path) -> Result<Vec<WorkPattern>, StoreError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| StoreError::Io { path: path.display().to_string(), source })?;
    let file: CrewFile = serde_json::from_str(&contents)
        .map_err(|source| StoreError::Serialization { path: path.display().to_string(), source })?;
    Ok(file.crew)
}

/// Schedule store backed by two JSON files: a read-only roster and a
/// schedule holding every booking ever written.
///
/// Writes rewrite the whole schedule file under one mutex and land through a
/// rename, so readers never see a half-written file.
pub struct JsonFileScheduleStore {
    crew_path: PathBuf,
    schedule_path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileScheduleStore {
    /// Opens the store, creating an empty schedule file when there is none.
    pub async fn open(crew_path: impl Into<PathBuf>, schedule_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self {
            crew_path: crew_path.into(),
            schedule_path: schedule_path.into(),
            write_lock: Mutex::new(()),
        };

        let exists = tokio::fs::try_exists(&store.schedule_path)
            .await
            .map_err(|source| store.io_error(source))?;
        if !exists {
            info!("Creating empty schedule file at {}", store.schedule_path.display());
            store.write_schedule(&[]).await?;
        }
        Ok(store)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io { path: self.schedule_path.display().to_string(), source }
    }

    async fn read_schedule(&self) -> Result<Vec<TripBooking>, StoreError> {
        let contents = tokio::fs::read_to_string(&self.schedule_path)
            .await
            .map_err(|source| self.io_error(source))?;
        serde_json::from_str(&contents).map_err(|source| StoreError::Serialization {
            path: self.schedule_path.display().to_string(),
            source,
        })
    }

    async fn write_schedule(&self, bookings: &[TripBooking]) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(bookings).map_err(|source| StoreError::Serialization {
            path: self.schedule_path.display().to_string(),
            source,
        })?;

        let tmp_path = self.schedule_path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, contents)
            .await
            .map_err(|source| self.io_error(source))?;
        tokio::fs::rename(&tmp_path, &self.schedule_path)
            .await
            .map_err(|source| self.io_error(source))
    }
}

#[async_trait]
impl ScheduleStore for JsonFileScheduleStore {
    async fn get_work_patterns(&self) -> Result<Vec<WorkPattern>, CoreStoreError> {
        Ok(read_crew(&self.crew_path).await?)
    }

    async fn get_bookings_for_date(&self, date: NaiveDate) -> Result<Vec<TripBooking>, CoreStoreError> {
        let bookings: Vec<TripBooking> = self
            .read_schedule()
            .await?
            .into_iter()
            .filter(|b| b.date() == date)
            .collect();
        debug!("Loaded {} bookings for {}", bookings.len(), date);
        Ok(bookings)
    }

    async fn append_booking(&self, booking: &TripBooking) -> Result<(), CoreStoreError> {
        let _guard = self.write_lock.lock().await;
        let mut bookings = self.read_schedule().await?;
        bookings.push(booking.clone());
        self.write_schedule(&bookings).await?;
        Ok(())
    }

    async fn update_booking(&self, booking: &TripBooking) -> Result<(), CoreStoreError> {
        let _guard = self.write_lock.lock().await;
        let mut bookings = self.read_schedule().await?;
        let existing = bookings
            .iter_mut()
            .find(|b| b.reservation_key == booking.reservation_key)
            .ok_or_else(|| StoreError::BookingNotFound(booking.reservation_key.clone()))?;
        *existing = booking.clone();
        self.write_schedule(&bookings).await?;
        Ok(())
    }
}
