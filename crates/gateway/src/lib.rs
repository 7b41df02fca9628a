mod appointments;
pub mod builder;
mod directory;
pub mod donations;
pub mod error;
pub mod gateway;
mod inventory;
pub mod metrics;
mod requests;

pub use builder::GatewayBuilder;
pub use donations::RecordedDonation;
pub use error::GatewayError;
pub use gateway::Gateway;
pub use metrics::{GatewayMetrics, MetricsSnapshot};
