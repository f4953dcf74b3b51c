//! Callback handlers that turn state events into output nodes

pub mod address;
pub mod command;
pub mod rollout;

pub use address::AddressBuilder;
pub use command::CommandLineBuilder;
pub use rollout::RolloutPlanBuilder;
