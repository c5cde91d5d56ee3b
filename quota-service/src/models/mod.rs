pub mod feedback;
pub mod period;
pub mod usage;

pub use feedback::{BonusGrant, FeedbackOutcome, FeedbackRecord};
pub use period::Period;
pub use usage::{Authorization, Decision, PeriodStats, RecordedUsage};
