//! State graphs for the command line, address and rollout plan grammars
//!
//! A graph is built once per escaping configuration and shared read-only by
//! every scan that uses that configuration.

pub mod address;
pub mod ast;
pub mod builders;
pub mod command;
pub mod ids;
pub mod rollout;
pub mod value;

use crate::parsing::{ParserOptions, StateGraph};
use std::sync::OnceLock;

pub use ast::{
    AddressNode, CommandFormat, ConcurrentRolloutPlanGroup, OperationRequestAddress,
    ParsedArgument, ParsedCommandLine, ParsedRolloutPlanHeader, RolloutPlanEntry,
    RolloutProperty, SingleRolloutPlanGroup, COMMAND_FORMAT,
};
pub use builders::{AddressBuilder, CommandLineBuilder, RolloutPlanBuilder};
pub use ids::StateId;

static ESCAPING: OnceLock<StateGraph> = OnceLock::new();
static ESCAPING_LITERAL_QUOTES: OnceLock<StateGraph> = OnceLock::new();
static LITERAL_VALUES: OnceLock<StateGraph> = OnceLock::new();
static LITERAL: OnceLock<StateGraph> = OnceLock::new();

/// Shared graph for the escaping flags in `options`
pub fn state_graph(options: &ParserOptions) -> &'static StateGraph {
    let cell = match (options.value_escaping, options.escape_in_quotes) {
        (true, true) => &ESCAPING,
        (true, false) => &ESCAPING_LITERAL_QUOTES,
        (false, true) => &LITERAL_VALUES,
        (false, false) => &LITERAL,
    };
    cell.get_or_init(|| build_graph(options))
}

/// Build a fresh graph holding every state of every grammar
pub fn build_graph(options: &ParserOptions) -> StateGraph {
    let mut graph = StateGraph::new();
    value::install(&mut graph, options);
    command::install(&mut graph, options);
    address::install(&mut graph, options);
    rollout::install(&mut graph, options);
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [StateId; StateId::COUNT] = [
        StateId::Escape,
        StateId::QuoteIncluded,
        StateId::QuoteStripped,
        StateId::BracketGroup,
        StateId::ParenGroup,
        StateId::BraceGroup,
        StateId::WhitespaceSkip,
        StateId::Command,
        StateId::OperationName,
        StateId::AddressCommandSeparator,
        StateId::ArgumentList,
        StateId::Argument,
        StateId::ArgumentValueSeparator,
        StateId::ArgumentValue,
        StateId::Redirect,
        StateId::RedirectTarget,
        StateId::OperationHeaders,
        StateId::Address,
        StateId::Node,
        StateId::NodeTypeNameSeparator,
        StateId::NodeSeparator,
        StateId::HeaderValue,
        StateId::PlanRef,
        StateId::PlanBody,
        StateId::GroupList,
        StateId::ListItemSeparator,
        StateId::ConcurrencyMarker,
        StateId::ServerGroup,
        StateId::ServerGroupName,
        StateId::GroupProperties,
        StateId::HeaderProperties,
        StateId::Property,
        StateId::PropertyValue,
        StateId::PropertyValueText,
    ];

    #[test]
    fn test_every_state_is_installed() {
        let graph = build_graph(&ParserOptions::default());
        for id in ALL_STATES {
            assert!(graph.contains(id), "missing state {}", id);
        }
    }

    #[test]
    fn test_graphs_are_shared_per_configuration() {
        let default = ParserOptions::default();
        let literal = ParserOptions {
            value_escaping: false,
            ..ParserOptions::default()
        };

        assert!(std::ptr::eq(state_graph(&default), state_graph(&default)));
        assert!(!std::ptr::eq(state_graph(&default), state_graph(&literal)));
    }
}
