pub mod app_config;
pub mod error;
pub mod json_store;

pub use error::StoreError;
pub use json_store::JsonFileScheduleStore;
