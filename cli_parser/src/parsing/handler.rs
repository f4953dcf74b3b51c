//! Character handlers: the unit of behaviour a state maps a character to

use super::context::ParsingContext;
use super::error::ParseResult;
use crate::grammar::ids::StateId;

/// Behaviour that needs more than the built-in handlers
pub type HandlerFn = fn(&mut ParsingContext<'_, '_>) -> ParseResult<()>;

/// Decides how the scan advances for one character
///
/// Handlers are plain values so states can be built once and shared by every
/// scan; anything stateful lives in the context.
#[derive(Clone, Copy)]
pub enum CharacterHandler {
    /// Consume the character without effect
    Noop,
    /// Report the character as content to the callback
    Content,
    /// Pop the current state
    LeaveState,
    /// Report the character, then pop the current state
    ContentAndLeave,
    /// Push the given state
    EnterState(StateId),
    /// Run the current state's own handler for the current character
    Dispatch,
    Custom(HandlerFn),
}

impl CharacterHandler {
    pub fn handle(self, ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
        match self {
            CharacterHandler::Noop => Ok(()),
            CharacterHandler::Content => ctx.report_character(),
            CharacterHandler::LeaveState => ctx.leave_state(),
            CharacterHandler::ContentAndLeave => {
                ctx.report_character()?;
                ctx.leave_state()
            }
            CharacterHandler::EnterState(state) => ctx.enter_state(state),
            CharacterHandler::Dispatch => ctx.dispatch(),
            CharacterHandler::Custom(handler) => handler(ctx),
        }
    }
}

impl std::fmt::Debug for CharacterHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CharacterHandler::Noop => f.write_str("Noop"),
            CharacterHandler::Content => f.write_str("Content"),
            CharacterHandler::LeaveState => f.write_str("LeaveState"),
            CharacterHandler::ContentAndLeave => f.write_str("ContentAndLeave"),
            CharacterHandler::EnterState(state) => write!(f, "EnterState({})", state),
            CharacterHandler::Dispatch => f.write_str("Dispatch"),
            CharacterHandler::Custom(_) => f.write_str("Custom"),
        }
    }
}
