//! Eligibility filtering and placeholder diffing between two calendars.

mod diff_kind;
mod eligibility;
mod engine;
mod sync_action;

pub use diff_kind::DiffKind;
pub use eligibility::is_eligible;
pub use engine::compute_sync_actions;
pub use sync_action::SyncAction;
