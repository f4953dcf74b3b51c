//! Rollout plan header states
//!
//! ```text
//! header     := plan-ref props? | '{' 'rollout'? (plan-ref | group-list | props)? props? '}' props?
//! group-list := group ((',' | '^') group)*
//! group      := name ('(' property (',' property)* ')')?
//! property   := name ('=' value)?
//! ```

use super::value::unterminated_group;
use crate::grammar::ids::StateId;
use crate::parsing::{
    CharacterHandler, ParseResult, ParserOptions, ParsingContext, ParsingCursor, ParsingState,
    StateGraph,
};

const ROLLOUT_KEYWORD: &str = "rollout";
const PLAN_ID: &str = "id";

/// Characters that end a property name or value
const DELIMITERS: &str = ",);}";

/// Characters that end a group or property name
const NAME_TERMINATORS: &str = "=,^;(){}";

pub(crate) fn install(graph: &mut StateGraph, _options: &ParserOptions) {
    graph.insert(header_value());
    graph.insert(plan_body());
    graph.insert(group_list());
    graph.insert(list_item_separator());
    graph.insert(concurrency_marker());
    graph.insert(server_group());
    graph.insert(server_group_name());
    graph.insert(group_properties());
    graph.insert(header_properties());
    graph.insert(property(StateId::Property));
    graph.insert(property(StateId::PlanRef));
    graph.insert(property_value());
    graph.insert(property_value_text());
}

fn unexpected(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    Err(ctx.cursor().unexpected_character())
}

// ============================================================================
// HEADER VALUE
// ============================================================================

fn header_value() -> ParsingState {
    let mut state = ParsingState::new(StateId::HeaderValue);
    state.set_ignore_whitespaces(true);
    state.put_handler('{', CharacterHandler::Custom(plan_body_start));
    state.enter_state(';', StateId::HeaderProperties);
    state.set_default_handler(CharacterHandler::Custom(header_item));
    state.set_return_handler(CharacterHandler::Custom(header_value_returned));
    state
}

/// Braces are only allowed before anything else
fn plan_body_start(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    if ctx.cursor().returned_from().is_some() {
        return unexpected(ctx);
    }
    ctx.enter_state(StateId::PlanBody)
}

/// The first bare token is the plan reference, later ones are properties
fn header_item(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    if ctx.cursor().returned_from().is_some() {
        ctx.enter_state(StateId::HeaderProperties)
    } else {
        ctx.enter_state(StateId::PlanRef)
    }
}

fn header_value_returned(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    let cursor = ctx.cursor();
    let ch = match cursor.character() {
        Some(ch) => ch,
        None => return Ok(()),
    };
    match cursor.returned_from() {
        Some(StateId::PlanRef) => match ch {
            '}' | ')' | ',' => unexpected(ctx),
            _ => ctx.enter_state(StateId::HeaderProperties),
        },
        Some(StateId::HeaderProperties) => unexpected(ctx),
        _ => Ok(()),
    }
}

// ============================================================================
// PLAN BODY
// ============================================================================

fn plan_body() -> ParsingState {
    let mut state = ParsingState::new(StateId::PlanBody);
    state.set_enter_handler(CharacterHandler::Custom(skip_rollout_keyword));
    state.set_ignore_whitespaces(true);
    state.leave_state('}');
    state.enter_state(';', StateId::HeaderProperties);
    state.set_default_handler(CharacterHandler::Custom(plan_body_item));
    state.set_return_handler(CharacterHandler::Custom(plan_body_returned));
    state.set_end_content_handler(CharacterHandler::Custom(unterminated_group));
    state
}

/// Index of the first non-whitespace character at or after `from`
fn skip_whitespace(cursor: &ParsingCursor<'_>, from: usize) -> usize {
    let mut index = from;
    while cursor.char_at(index).map_or(false, char::is_whitespace) {
        index += 1;
    }
    index
}

fn matches_at(cursor: &ParsingCursor<'_>, at: usize, word: &str) -> bool {
    word.chars()
        .enumerate()
        .all(|(i, ch)| cursor.char_at(at + i) == Some(ch))
}

/// `{ rollout a ^ b }` reads the same as `{ a ^ b }`
fn skip_rollout_keyword(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    let cursor = ctx.cursor();
    let start = skip_whitespace(cursor, cursor.location() + 1);
    let after = start + ROLLOUT_KEYWORD.chars().count();
    let terminated = cursor.char_at(after).map_or(false, char::is_whitespace);
    if matches_at(cursor, start, ROLLOUT_KEYWORD) && terminated {
        let skip = after - 1 - cursor.location();
        ctx.advance_location(skip);
    }
    Ok(())
}

/// Name of the `name = value` pair starting at the cursor, if one does
fn assignment_name(cursor: &ParsingCursor<'_>) -> Option<String> {
    let start = cursor.location();
    let mut end = start;
    while let Some(ch) = cursor.char_at(end) {
        if ch.is_whitespace() || NAME_TERMINATORS.contains(ch) {
            break;
        }
        end += 1;
    }
    let next = skip_whitespace(cursor, end);
    if end == start || cursor.char_at(next) != Some('=') {
        return None;
    }
    Some((start..end).filter_map(|i| cursor.char_at(i)).collect())
}

/// `id = name` at the start of the braces is a plan reference, any other
/// `name = value` starts the header properties
fn plan_body_item(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    let cursor = ctx.cursor();
    if cursor.returned_from().is_some() {
        return ctx.enter_state(StateId::HeaderProperties);
    }
    match assignment_name(cursor) {
        Some(name) if name == PLAN_ID => ctx.enter_state(StateId::PlanRef),
        Some(_) => ctx.enter_state(StateId::HeaderProperties),
        None => ctx.enter_state(StateId::GroupList),
    }
}

fn plan_body_returned(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    let cursor = ctx.cursor();
    let ch = match cursor.character() {
        Some(ch) => ch,
        None => return Ok(()),
    };
    match cursor.returned_from() {
        Some(StateId::GroupList) | Some(StateId::PlanRef) | Some(StateId::HeaderProperties)
            if ch == '}' =>
        {
            ctx.leave_state()
        }
        Some(StateId::GroupList) | Some(StateId::PlanRef) => {
            ctx.enter_state(StateId::HeaderProperties)
        }
        Some(StateId::HeaderProperties) => unexpected(ctx),
        _ => Ok(()),
    }
}

// ============================================================================
// SERVER GROUP LIST
// ============================================================================

fn group_list() -> ParsingState {
    let mut state = ParsingState::new(StateId::GroupList);
    state.set_handle_entrance(true);
    state.set_ignore_whitespaces(true);
    state.enter_state(',', StateId::ListItemSeparator);
    state.enter_state('^', StateId::ConcurrencyMarker);
    state.leave_state('}');
    state.leave_state(';');
    state.set_default_handler(CharacterHandler::EnterState(StateId::ServerGroup));
    state.set_return_handler(CharacterHandler::Custom(group_list_returned));
    state
}

fn group_list_returned(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    let cursor = ctx.cursor();
    if cursor.returned_from() == Some(StateId::ListItemSeparator) {
        return Ok(());
    }
    match cursor.character() {
        None => Ok(()),
        Some(',') => ctx.enter_state(StateId::ListItemSeparator),
        Some('^') => ctx.enter_state(StateId::ConcurrencyMarker),
        Some(ch) if ch.is_whitespace() => Ok(()),
        Some(_) => ctx.leave_state(),
    }
}

fn list_item_separator() -> ParsingState {
    let mut state = ParsingState::new(StateId::ListItemSeparator);
    state.set_enter_handler(CharacterHandler::LeaveState);
    state
}

/// Parses the one group that joins the previous group's cluster
fn concurrency_marker() -> ParsingState {
    let mut state = ParsingState::new(StateId::ConcurrencyMarker);
    state.set_ignore_whitespaces(true);
    state.put_handlers(",};^", CharacterHandler::LeaveState);
    state.set_default_handler(CharacterHandler::EnterState(StateId::ServerGroup));
    state.set_return_handler(CharacterHandler::LeaveState);
    state
}

// ============================================================================
// SERVER GROUP
// ============================================================================

fn server_group() -> ParsingState {
    let mut state = ParsingState::new(StateId::ServerGroup);
    state.set_enter_handler(CharacterHandler::EnterState(StateId::ServerGroupName));
    state.set_ignore_whitespaces(true);
    state.put_handler('(', CharacterHandler::Custom(group_properties_start));
    state.set_default_handler(CharacterHandler::LeaveState);
    state.set_return_handler(CharacterHandler::Custom(server_group_returned));
    state
}

/// One property list per group
fn group_properties_start(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    if ctx.cursor().returned_from() == Some(StateId::GroupProperties) {
        return unexpected(ctx);
    }
    ctx.enter_state(StateId::GroupProperties)
}

fn server_group_returned(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    let cursor = ctx.cursor();
    if cursor.returned_from() != Some(StateId::ServerGroupName) {
        return Ok(());
    }
    match cursor.character() {
        None => Ok(()),
        Some('(') => ctx.enter_state(StateId::GroupProperties),
        Some(ch) if ch.is_whitespace() => Ok(()),
        Some(_) => ctx.leave_state(),
    }
}

fn server_group_name() -> ParsingState {
    let mut state = ParsingState::new(StateId::ServerGroupName);
    state.set_handle_entrance(true);
    state.set_default_handler(CharacterHandler::Content);
    state.enter_state('\\', StateId::Escape);
    state.set_leave_on_whitespace(true);
    state.put_handlers(",^};()", CharacterHandler::LeaveState);
    state
}

fn group_properties() -> ParsingState {
    let mut state = ParsingState::new(StateId::GroupProperties);
    state.set_ignore_whitespaces(true);
    state.leave_state(')');
    state.enter_state(',', StateId::ListItemSeparator);
    state.set_default_handler(CharacterHandler::EnterState(StateId::Property));
    state.set_return_handler(CharacterHandler::Custom(group_properties_returned));
    state.set_end_content_handler(CharacterHandler::Custom(unterminated_group));
    state
}

fn group_properties_returned(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    let cursor = ctx.cursor();
    if cursor.returned_from() != Some(StateId::Property) {
        return Ok(());
    }
    match cursor.character() {
        None => Ok(()),
        Some(',') => ctx.enter_state(StateId::ListItemSeparator),
        Some(')') => ctx.leave_state(),
        Some(';') | Some('}') => unexpected(ctx),
        Some(ch) if ch.is_whitespace() => Ok(()),
        Some(_) => ctx.enter_state(StateId::Property),
    }
}

// ============================================================================
// PROPERTIES
// ============================================================================

fn header_properties() -> ParsingState {
    let mut state = ParsingState::new(StateId::HeaderProperties);
    state.set_handle_entrance(true);
    state.set_ignore_whitespaces(true);
    state.put_handlers(";,", CharacterHandler::Noop);
    state.leave_state('}');
    state.put_handler(')', CharacterHandler::Custom(unexpected));
    state.set_default_handler(CharacterHandler::EnterState(StateId::Property));
    state.set_return_handler(CharacterHandler::Custom(header_properties_returned));
    state
}

fn header_properties_returned(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    let cursor = ctx.cursor();
    if cursor.returned_from() != Some(StateId::Property) {
        return Ok(());
    }
    match cursor.character() {
        None | Some(';') | Some(',') => Ok(()),
        Some('}') => ctx.leave_state(),
        Some(')') => unexpected(ctx),
        Some(ch) if ch.is_whitespace() => Ok(()),
        Some(_) => ctx.enter_state(StateId::Property),
    }
}

/// `name`, `name=value` or `name = value`; plan references share the shape
fn property(id: StateId) -> ParsingState {
    let mut state = ParsingState::new(id);
    state.set_handle_entrance(true);
    state.set_default_handler(CharacterHandler::Content);
    state.enter_state('=', StateId::PropertyValue);
    state.enter_state('\\', StateId::Escape);
    state.set_whitespace_handler(CharacterHandler::EnterState(StateId::WhitespaceSkip));
    state.put_handlers(DELIMITERS, CharacterHandler::LeaveState);
    state.set_return_handler(CharacterHandler::Custom(property_returned));
    state
}

fn property_returned(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    let cursor = ctx.cursor();
    match cursor.returned_from() {
        Some(StateId::WhitespaceSkip) => {
            if cursor.character() == Some('=') {
                ctx.enter_state(StateId::PropertyValue)
            } else {
                ctx.leave_state()
            }
        }
        Some(StateId::PropertyValue) => ctx.leave_state(),
        _ => Ok(()),
    }
}

fn property_value() -> ParsingState {
    let mut state = ParsingState::new(StateId::PropertyValue);
    state.set_ignore_whitespaces(true);
    state.put_handlers(DELIMITERS, CharacterHandler::LeaveState);
    state.set_default_handler(CharacterHandler::EnterState(StateId::PropertyValueText));
    state.set_return_handler(CharacterHandler::LeaveState);
    state
}

fn property_value_text() -> ParsingState {
    let mut state = ParsingState::new(StateId::PropertyValueText);
    state.set_handle_entrance(true);
    state.set_update_value_index(true);
    state.set_default_handler(CharacterHandler::Content);
    state.set_leave_on_whitespace(true);
    state.put_handlers(DELIMITERS, CharacterHandler::LeaveState);
    state.enter_state('"', StateId::QuoteStripped);
    state.enter_state('\\', StateId::Escape);
    state
}
