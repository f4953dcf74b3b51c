//! Command line states:
//! `<address>? <operation-name> <arguments>? ({ headers })? (> target)?`

use super::value::put_value_openers;
use crate::grammar::ids::StateId;
use crate::parsing::{
    CharacterHandler, ParseError, ParseResult, ParserOptions, ParsingContext, ParsingState,
    StateGraph,
};

pub(crate) fn install(graph: &mut StateGraph, options: &ParserOptions) {
    graph.insert(command());
    graph.insert(operation_name());
    graph.insert(address_command_separator());
    graph.insert(argument_list());
    graph.insert(argument());
    graph.insert(argument_value_separator());
    graph.insert(argument_value(options));
    graph.insert(redirect());
    graph.insert(redirect_target(options));
    graph.insert(operation_headers());
}

// ============================================================================
// COMMAND ROOT
// ============================================================================

fn command() -> ParsingState {
    let mut state = ParsingState::new(StateId::Command);
    state.set_ignore_whitespaces(true);
    state.enter_state('/', StateId::Address);
    state.enter_state('.', StateId::Address);
    state.enter_state(':', StateId::AddressCommandSeparator);
    state.enter_state('-', StateId::ArgumentList);
    state.enter_state('>', StateId::Redirect);
    state.set_default_handler(CharacterHandler::EnterState(StateId::OperationName));
    state.set_return_handler(CharacterHandler::Custom(command_returned));
    state
}

fn command_returned(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    let cursor = ctx.cursor();
    let ch = match cursor.character() {
        Some(ch) => ch,
        None => return Ok(()),
    };
    match cursor.returned_from() {
        Some(StateId::Address) => ctx.enter_state(StateId::AddressCommandSeparator),
        Some(StateId::OperationName) | Some(StateId::AddressCommandSeparator) => match ch {
            '>' => ctx.enter_state(StateId::Redirect),
            '{' => ctx.enter_state(StateId::OperationHeaders),
            _ => ctx.enter_state(StateId::ArgumentList),
        },
        Some(StateId::ArgumentList) => match ch {
            '>' => ctx.enter_state(StateId::Redirect),
            '{' => ctx.enter_state(StateId::OperationHeaders),
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

// ============================================================================
// OPERATION NAME
// ============================================================================

fn operation_name() -> ParsingState {
    let mut state = ParsingState::new(StateId::OperationName);
    state.set_handle_entrance(true);
    state.set_default_handler(CharacterHandler::Content);
    state.enter_state('\\', StateId::Escape);
    state.set_leave_on_whitespace(true);
    state.leave_state('>');
    state.leave_state('{');
    state
}

/// Bridge between the address and the operation name, consuming `:`
fn address_command_separator() -> ParsingState {
    let mut state = ParsingState::new(StateId::AddressCommandSeparator);
    state.set_ignore_whitespaces(true);
    state.put_handler(':', CharacterHandler::Noop);
    state.leave_state('>');
    state.set_default_handler(CharacterHandler::EnterState(StateId::OperationName));
    state.set_return_handler(CharacterHandler::LeaveState);
    state
}

// ============================================================================
// ARGUMENTS
// ============================================================================

fn argument_list() -> ParsingState {
    let mut state = ParsingState::new(StateId::ArgumentList);
    state.set_handle_entrance(true);
    state.set_ignore_whitespaces(true);
    state.leave_state('>');
    state.put_handler('{', CharacterHandler::Custom(argument_list_end));
    state.set_default_handler(CharacterHandler::EnterState(StateId::Argument));
    state.set_return_handler(CharacterHandler::Custom(argument_list_returned));
    state
}

/// An argument that ended on a non-space character hands it to the next argument
fn argument_list_returned(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    match ctx.cursor().character() {
        None => Ok(()),
        Some('>') => ctx.leave_state(),
        Some('{') => argument_list_end(ctx),
        Some(ch) if ch.is_whitespace() => Ok(()),
        Some(_) => ctx.enter_state(StateId::Argument),
    }
}

/// `{` hands over to the header block of the enclosing command
fn argument_list_end(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    if ctx.cursor().parent_state().is_none() {
        return Err(ctx.cursor().unexpected_character());
    }
    ctx.leave_state()
}

/// `name`, `name=value` or `name = value`
fn argument() -> ParsingState {
    let mut state = ParsingState::new(StateId::Argument);
    state.set_handle_entrance(true);
    state.set_default_handler(CharacterHandler::Content);
    state.enter_state('=', StateId::ArgumentValueSeparator);
    state.enter_state('\\', StateId::Escape);
    state.leave_state('{');
    state.set_whitespace_handler(CharacterHandler::EnterState(StateId::WhitespaceSkip));
    state.set_return_handler(CharacterHandler::Custom(argument_returned));
    state
}

fn argument_returned(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    let cursor = ctx.cursor();
    match cursor.returned_from() {
        Some(StateId::WhitespaceSkip) => {
            if cursor.character() == Some('=') {
                ctx.enter_state(StateId::ArgumentValueSeparator)
            } else {
                ctx.leave_state()
            }
        }
        Some(StateId::ArgumentValueSeparator) => ctx.leave_state(),
        _ => Ok(()),
    }
}

fn argument_value_separator() -> ParsingState {
    let mut state = ParsingState::new(StateId::ArgumentValueSeparator);
    state.set_ignore_whitespaces(true);
    state.set_default_handler(CharacterHandler::EnterState(StateId::ArgumentValue));
    state.set_return_handler(CharacterHandler::LeaveState);
    state
}

fn argument_value(options: &ParserOptions) -> ParsingState {
    let mut state = ParsingState::new(StateId::ArgumentValue);
    state.set_handle_entrance(true);
    state.set_update_value_index(true);
    state.set_default_handler(CharacterHandler::Content);
    state.set_leave_on_whitespace(true);
    put_value_openers(&mut state, options);
    state
}

// ============================================================================
// OUTPUT REDIRECT
// ============================================================================

/// Entered on `>`; stays open until end of content so a second token fails
fn redirect() -> ParsingState {
    let mut state = ParsingState::new(StateId::Redirect);
    state.set_ignore_whitespaces(true);
    state.set_default_handler(CharacterHandler::Custom(redirect_target_start));
    state.set_end_content_handler(CharacterHandler::Custom(redirect_end));
    state
}

fn redirect_target_start(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    if ctx.cursor().returned_from().is_some() {
        return Err(ctx.cursor().unexpected_character());
    }
    ctx.enter_state(StateId::RedirectTarget)
}

fn redirect_end(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    let cursor = ctx.cursor();
    if cursor.returned_from().is_none() {
        return Err(ParseError::missing_redirect_target(cursor.frame_start()));
    }
    ctx.leave_state()
}

fn redirect_target(options: &ParserOptions) -> ParsingState {
    let mut state = ParsingState::new(StateId::RedirectTarget);
    state.set_handle_entrance(true);
    state.set_default_handler(CharacterHandler::Content);
    state.set_leave_on_whitespace(true);
    state.enter_state('"', StateId::QuoteStripped);
    if options.value_escaping {
        state.enter_state('\\', StateId::Escape);
    }
    state
}

// ============================================================================
// OPERATION HEADERS
// ============================================================================

/// `{ ... }` after the operation name or arguments; only a redirect may follow
fn operation_headers() -> ParsingState {
    let mut state = ParsingState::new(StateId::OperationHeaders);
    state.set_enter_handler(CharacterHandler::EnterState(StateId::PlanBody));
    state.set_ignore_whitespaces(true);
    state.enter_state('>', StateId::Redirect);
    state.set_default_handler(CharacterHandler::Custom(trailing_input));
    state
}

fn trailing_input(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    Err(ctx.cursor().unexpected_character())
}
