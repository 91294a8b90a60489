pub mod feed_service;
pub mod follow_service;
pub mod ingest_service;
pub mod post_service;
pub mod scheduler;
pub mod user_service;

pub use feed_service::FeedService;
pub use follow_service::FollowService;
pub use ingest_service::{CycleReport, IngestCycle, IngestService};
pub use post_service::{PostService, DEFAULT_BROWSE_LIMIT};
pub use scheduler::{Scheduler, Ticker};
pub use user_service::UserService;
