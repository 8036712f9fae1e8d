//! Running reconciliation across calendars.

mod orchestrator;
mod placeholder;
mod summary;
mod window;

pub use orchestrator::{Orchestrator, StopHandle};
pub use placeholder::{new_placeholder, placeholder_availability, placeholder_update};
pub use summary::{ORPHAN_CLEANUP, SyncResult, SyncSummary};
pub use window::SyncWindow;
