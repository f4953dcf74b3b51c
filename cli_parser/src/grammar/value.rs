//! Value-level states shared by every grammar: escape, quotes, bracket
//! groups and whitespace skipping

use crate::grammar::ids::StateId;
use crate::parsing::{
    CharacterHandler, ParseError, ParseResult, ParserOptions, ParsingContext, ParsingState,
    StateGraph,
};

pub(crate) fn install(graph: &mut StateGraph, options: &ParserOptions) {
    graph.insert(escape());
    graph.insert(quote(StateId::QuoteIncluded, true, options));
    graph.insert(quote(StateId::QuoteStripped, false, options));
    graph.insert(group(StateId::BracketGroup, ']', options));
    graph.insert(group(StateId::ParenGroup, ')', options));
    graph.insert(group(StateId::BraceGroup, '}', options));
    graph.insert(whitespace_skip());
}

/// Map `"`, `[`, `(`, `{` and optionally `\` to the nested value states
pub(crate) fn put_value_openers(state: &mut ParsingState, options: &ParserOptions) {
    state.enter_state('"', StateId::QuoteIncluded);
    state.enter_state('[', StateId::BracketGroup);
    state.enter_state('(', StateId::ParenGroup);
    state.enter_state('{', StateId::BraceGroup);
    if options.value_escaping {
        state.enter_state('\\', StateId::Escape);
    }
}

// ============================================================================
// ESCAPE
// ============================================================================

fn escape() -> ParsingState {
    let mut state = ParsingState::new(StateId::Escape);
    state.set_enter_handler(CharacterHandler::Custom(escape_next));
    state
}

/// Take the character after the backslash literally; a trailing backslash is dropped
fn escape_next(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    ctx.advance_location(1);
    if !ctx.cursor().is_end_of_content() {
        ctx.report_character()?;
    }
    ctx.leave_state()
}

/// Report the backslash and the character it escapes, so an included span
/// reads back exactly as written
fn escape_kept(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    ctx.report_character()?;
    ctx.advance_location(1);
    if !ctx.cursor().is_end_of_content() {
        ctx.report_character()?;
    }
    Ok(())
}

// ============================================================================
// QUOTES
// ============================================================================

fn quote(id: StateId, included: bool, options: &ParserOptions) -> ParsingState {
    let mut state = ParsingState::new(id);
    if included {
        state.set_enter_handler(CharacterHandler::Content);
        state.put_handler('"', CharacterHandler::ContentAndLeave);
    } else {
        state.leave_state('"');
    }
    match (options.escape_in_quotes, included) {
        (true, true) => state.put_handler('\\', CharacterHandler::Custom(escape_kept)),
        (true, false) => state.enter_state('\\', StateId::Escape),
        (false, _) => {}
    }
    state.set_default_handler(CharacterHandler::Content);
    state.set_end_content_handler(CharacterHandler::Custom(unterminated_quote));
    state
}

fn unterminated_quote(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    Err(ParseError::unterminated_quote(ctx.cursor().frame_start()))
}

// ============================================================================
// BRACKET GROUPS
// ============================================================================

/// Accumulates verbatim until `closing`, nesting further groups on the stack
fn group(id: StateId, closing: char, options: &ParserOptions) -> ParsingState {
    let mut state = ParsingState::new(id);
    state.set_enter_handler(CharacterHandler::Content);
    state.set_default_handler(CharacterHandler::Content);
    put_value_openers(&mut state, options);
    state.put_handler(closing, CharacterHandler::ContentAndLeave);
    state.set_end_content_handler(CharacterHandler::Custom(unterminated_group));
    state
}

pub(crate) fn unterminated_group(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
    let cursor = ctx.cursor();
    let start = cursor.frame_start();
    let opening = cursor.char_at(start).unwrap_or('[');
    Err(ParseError::unterminated_group(opening, start))
}

// ============================================================================
// WHITESPACE
// ============================================================================

/// Swallows whitespace and returns on the first other character
fn whitespace_skip() -> ParsingState {
    let mut state = ParsingState::new(StateId::WhitespaceSkip);
    state.set_ignore_whitespaces(true);
    state.set_default_handler(CharacterHandler::LeaveState);
    state
}
