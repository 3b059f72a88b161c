use std::sync::Arc;
use crew_core::{Clock, ReservationManager};

#[derive(Clone)]
pub struct AppState {
    pub reservations: Arc<ReservationManager>,
    pub clock: Arc<dyn Clock>,
}
