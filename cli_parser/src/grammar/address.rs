//! Address path states: `/type=name/type=name`, `..`, `.type`

use crate::grammar::ids::StateId;
use crate::parsing::{
    CharacterHandler, ParseResult, ParserOptions, ParsingContext, ParsingState, StateGraph,
};

pub(crate) fn install(graph: &mut StateGraph, _options: &ParserOptions) {
    graph.insert(address());
    graph.insert(node());
    graph.insert(node_type_name_separator());
    graph.insert(node_separator());
}

fn address() -> ParsingState {
    let mut state = ParsingState::new(StateId::Address);
    state.set_handle_entrance(true);
    state.enter_state('/', StateId::NodeSeparator);
    state.leave_state(':');
    state.set_leave_on_whitespace(true);
    state.set_default_handler(CharacterHandler::EnterState(StateId::Node));
    state.set_return_handler(CharacterHandler::Custom(address_returned));
    state
}

fn address_returned(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    let cursor = ctx.cursor();
    if cursor.returned_from() != Some(StateId::Node) {
        return Ok(());
    }
    match cursor.character() {
        None => Ok(()),
        Some('/') => ctx.enter_state(StateId::NodeSeparator),
        Some(_) => ctx.leave_state(),
    }
}

/// `type`, `type=name`, or a navigation token
fn node() -> ParsingState {
    let mut state = ParsingState::new(StateId::Node);
    state.set_handle_entrance(true);
    state.set_default_handler(CharacterHandler::Content);
    state.enter_state('=', StateId::NodeTypeNameSeparator);
    state.enter_state('"', StateId::QuoteStripped);
    state.enter_state('\\', StateId::Escape);
    state.leave_state('/');
    state.leave_state(':');
    state.set_leave_on_whitespace(true);
    state
}

fn node_type_name_separator() -> ParsingState {
    let mut state = ParsingState::new(StateId::NodeTypeNameSeparator);
    state.set_enter_handler(CharacterHandler::LeaveState);
    state
}

fn node_separator() -> ParsingState {
    let mut state = ParsingState::new(StateId::NodeSeparator);
    state.set_enter_handler(CharacterHandler::LeaveState);
    state
}
