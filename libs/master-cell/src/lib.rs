pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use router::*;

// Re-exported for the booking workflow, which claims and releases slots
// through the same service the schedule endpoints use.
pub use services::schedule::ScheduleService;
