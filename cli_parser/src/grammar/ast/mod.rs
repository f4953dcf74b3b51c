//! Output nodes handed to callers after a successful parse
//!
//! All nodes are plain owned data and serialize with serde.

pub mod command;
pub mod format;
pub mod rollout;

pub use command::{AddressNode, OperationRequestAddress, ParsedArgument, ParsedCommandLine};
pub use format::{CommandFormat, COMMAND_FORMAT};
pub use rollout::{
    ConcurrentRolloutPlanGroup, ParsedRolloutPlanHeader, RolloutPlanEntry, RolloutProperty,
    SingleRolloutPlanGroup,
};
