// Services layer for business logic
// Services own validation and ownership checks, calling storage directly

pub mod account;
pub mod graph;
pub mod subscription;
pub mod video;

pub use account::AccountService;
pub use graph::GraphAggregator;
pub use subscription::SubscriptionService;
pub use video::VideoService;
