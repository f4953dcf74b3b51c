// Internal modules
pub mod config;
pub mod grammar;
#[macro_use]
pub mod logging;
pub mod parsing;

// Re-export key types for library consumers
pub use grammar::{
    OperationRequestAddress, ParsedArgument, ParsedCommandLine, ParsedRolloutPlanHeader,
    RolloutPlanEntry,
};
pub use parsing::{
    parse_address, parse_arguments, parse_command_line, parse_rollout_plan, ParseError,
    ParseResult, ParserOptions,
};
