use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

pub type PilotId = u32;

/// Roster entry: where a pilot is based and which weekdays they fly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkPattern {
    #[serde(rename = "ID")]
    pub pilot_id: PilotId,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Base")]
    pub base: String,
    #[serde(rename = "WorkDays")]
    pub work_days: Vec<Weekday>,
}

impl WorkPattern {
    pub fn new(pilot_id: PilotId, base: impl Into<String>, work_days: Vec<Weekday>) -> Self {
        Self {
            pilot_id,
            name: None,
            base: base.into(),
            work_days,
        }
    }

    /// True when the pilot is based at `base` and rostered on `day`.
    pub fn covers(&self, base: &str, day: Weekday) -> bool {
        self.base == base && self.work_days.contains(&day)
    }
}

/// Derived hold state of a booking at a given instant. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldState {
    Unconfirmed,
    Confirmed,
    Expired,
}

/// A pilot's occupied window on a given day, plus the reservation it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct TripBooking {
    pub pilot_id: PilotId,
    pub departure_date_time: DateTime<Utc>,
    pub return_date_time: DateTime<Utc>,
    pub reservation_key: String,
    pub reservation_time: DateTime<Utc>,
    pub is_confirmed: bool,
}

impl TripBooking {
    /// Calendar date the booking is filed under.
    pub fn date(&self) -> NaiveDate {
        self.departure_date_time.date_naive()
    }

    pub fn hold_state(&self, now: DateTime<Utc>, ttl: Duration) -> HoldState {
        if self.is_confirmed {
            HoldState::Confirmed
        } else if now - self.reservation_time <= ttl {
            HoldState::Unconfirmed
        } else {
            HoldState::Expired
        }
    }

    /// Confirmed bookings and unexpired holds block; expired holds are ignored.
    pub fn is_live(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.hold_state(now, ttl) != HoldState::Expired
    }

    /// Inclusive overlap: windows conflict unless one ends strictly before
    /// the other starts. Touching edges count as a conflict.
    pub fn overlaps(&self, departure: DateTime<Utc>, return_at: DateTime<Utc>) -> bool {
        !(self.return_date_time < departure || self.departure_date_time > return_at)
    }

    /// Whether this booking keeps its pilot off the requested trip.
    pub fn blocks(&self, request: &TripRequest, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.is_live(now, ttl)
            && self.overlaps(request.departure_date_time, request.return_date_time)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TripRequest {
    pub location: String,
    pub departure_date_time: DateTime<Utc>,
    pub return_date_time: DateTime<Utc>,
}

impl TripRequest {
    pub fn new(
        location: impl Into<String>,
        departure_date_time: DateTime<Utc>,
        return_date_time: DateTime<Utc>,
    ) -> Self {
        Self {
            location: location.into(),
            departure_date_time,
            return_date_time,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.departure_date_time.date_naive()
    }

    pub fn weekday(&self) -> Weekday {
        self.departure_date_time.weekday()
    }

    /// Rejects trips that depart in the past or return before they leave.
    pub fn validate(&self, now: DateTime<Utc>) -> CoreResult<()> {
        if self.departure_date_time < now {
            return Err(CoreError::InvalidRequest(format!(
                "departure {} is in the past",
                self.departure_date_time
            )));
        }
        if self.return_date_time < self.departure_date_time {
            return Err(CoreError::InvalidRequest(format!(
                "return {} is before departure {}",
                self.return_date_time, self.departure_date_time
            )));
        }
        Ok(())
    }
}

/// Caller's request to turn a hold into a firm booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfirmation {
    pub location: String,
    pub departure_date_time: DateTime<Utc>,
    pub return_date_time: DateTime<Utc>,
    pub pilot_id: PilotId,
    pub reservation_key: String,
}

impl ScheduleConfirmation {
    pub fn date(&self) -> NaiveDate {
        self.departure_date_time.date_naive()
    }
}

/// Outcome of a hold attempt. Both fields are set, or neither is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationHandle {
    pub pilot_id: Option<PilotId>,
    pub reservation_key: Option<String>,
}

impl ReservationHandle {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn held(pilot_id: PilotId, reservation_key: String) -> Self {
        Self {
            pilot_id: Some(pilot_id),
            reservation_key: Some(reservation_key),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pilot_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 10, 1, h, m, s).unwrap()
    }

    fn booking(departure: DateTime<Utc>, return_at: DateTime<Utc>) -> TripBooking {
        TripBooking {
            pilot_id: 1,
            departure_date_time: departure,
            return_date_time: return_at,
            reservation_key: "key".to_string(),
            reservation_time: at(11, 0, 0),
            is_confirmed: true,
        }
    }

    #[test]
    fn test_touching_edges_overlap() {
        let b = booking(at(12, 0, 0), at(14, 0, 0));
        assert!(b.overlaps(at(14, 0, 0), at(16, 0, 0)));

        let b = booking(at(16, 0, 0), at(18, 0, 0));
        assert!(b.overlaps(at(14, 0, 0), at(16, 0, 0)));
    }

    #[test]
    fn test_disjoint_windows_do_not_overlap() {
        let b = booking(at(12, 0, 0), at(13, 59, 59));
        assert!(!b.overlaps(at(14, 0, 0), at(16, 0, 0)));

        let b = booking(at(16, 0, 1), at(18, 0, 0));
        assert!(!b.overlaps(at(14, 0, 0), at(16, 0, 0)));
    }

    #[test]
    fn test_containment_overlaps_both_ways() {
        let short = booking(at(16, 0, 0), at(18, 0, 0));
        assert!(short.overlaps(at(14, 0, 0), at(20, 0, 0)));

        let long = booking(at(14, 0, 0), at(20, 0, 0));
        assert!(long.overlaps(at(16, 0, 0), at(18, 0, 0)));
    }

    #[test]
    fn test_hold_state_transitions() {
        let ttl = Duration::minutes(10);
        let mut b = booking(at(14, 0, 0), at(16, 0, 0));
        b.is_confirmed = false;

        assert_eq!(b.hold_state(at(11, 10, 0), ttl), HoldState::Unconfirmed);
        assert_eq!(b.hold_state(at(11, 10, 1), ttl), HoldState::Expired);
        assert!(!b.is_live(at(11, 10, 1), ttl));

        b.is_confirmed = true;
        assert_eq!(b.hold_state(at(23, 0, 0), ttl), HoldState::Confirmed);
    }

    #[test]
    fn test_request_validation() {
        let now = at(11, 0, 0);
        assert!(TripRequest::new("Berlin", at(14, 0, 0), at(16, 0, 0)).validate(now).is_ok());
        assert!(TripRequest::new("Berlin", at(10, 0, 0), at(16, 0, 0)).validate(now).is_err());
        assert!(matches!(
            TripRequest::new("Berlin", at(16, 0, 0), at(14, 0, 0)).validate(now),
            Err(CoreError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_booking_uses_schedule_file_casing() {
        let value = serde_json::to_value(booking(at(14, 0, 0), at(16, 0, 0))).unwrap();
        assert_eq!(value["PilotId"], 1);
        assert_eq!(value["ReservationKey"], "key");
        assert_eq!(value["IsConfirmed"], true);
        assert!(value.get("DepartureDateTime").is_some());
        assert!(value.get("ReturnDateTime").is_some());
        assert!(value.get("ReservationTime").is_some());
        assert!(value.get("pilot_id").is_none());
    }

    #[test]
    fn test_work_pattern_deserialization() {
        let json = r#"
            {
                "ID": 7,
                "Name": "Andy",
                "Base": "Munich",
                "WorkDays": ["Monday", "Thursday"]
            }
        "#;
        let pattern: WorkPattern = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(pattern.pilot_id, 7);
        assert!(pattern.covers("Munich", Weekday::Thu));
        assert!(!pattern.covers("Munich", Weekday::Fri));
        assert!(!pattern.covers("Berlin", Weekday::Mon));
    }
}
