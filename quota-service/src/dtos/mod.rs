pub mod admin;
pub mod quota;

pub use admin::{
    BeginResetResponse, FeedbackListResponse, ResetAllRequest, ResetLimitsResponse, StatsResponse,
};
pub use quota::{
    AuthorizeRequest, AuthorizeResponse, FeedbackRequest, FeedbackResponse, RecordUsageRequest,
    RecordUsageResponse,
};
