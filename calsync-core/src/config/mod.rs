//! Configuration types for calsync.

mod calendar_config;
mod sync_config;

pub use calendar_config::CalendarConfig;
pub use sync_config::SyncConfig;
