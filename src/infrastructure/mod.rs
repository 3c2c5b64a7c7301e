// Infrastructure module - Background timers, task tracking and the REST client
pub mod heartbeat;
pub mod http;
pub mod liveness;
pub mod task_manager;
pub mod timer;

pub use heartbeat::HeartbeatManager;
pub use http::{ApiClient, TokenProvider};
pub use liveness::LivenessMonitor;
pub use task_manager::TaskManager;
pub use timer::ReconnectPolicy;
