//! Flyweight parsing states and the graph that owns them

use super::error::{ParseError, ParseResult};
use super::handler::CharacterHandler;
use crate::config::compile_time::engine::DISPATCH_TABLE_SIZE;
use crate::grammar::ids::StateId;
use std::collections::HashMap;

// ============================================================================
// PARSING STATE
// ============================================================================

/// Immutable template node of the automaton
///
/// A state maps characters to handlers and says what happens when it is
/// entered, returned to, or still open at end of input. Per-scan data never
/// lives here.
#[derive(Debug, Clone)]
pub struct ParsingState {
    id: StateId,
    enter_handler: CharacterHandler,
    default_handler: CharacterHandler,
    return_handler: CharacterHandler,
    end_content_handler: CharacterHandler,
    whitespace_handler: Option<CharacterHandler>,
    table: Box<[Option<CharacterHandler>]>,
    overflow: HashMap<char, CharacterHandler>,
    leave_on_whitespace: bool,
    ignore_whitespaces: bool,
    update_value_index: bool,
}

impl ParsingState {
    pub fn new(id: StateId) -> Self {
        Self {
            id,
            enter_handler: CharacterHandler::Noop,
            default_handler: CharacterHandler::Noop,
            return_handler: CharacterHandler::Noop,
            end_content_handler: CharacterHandler::LeaveState,
            whitespace_handler: None,
            table: vec![None; DISPATCH_TABLE_SIZE].into_boxed_slice(),
            overflow: HashMap::new(),
            leave_on_whitespace: false,
            ignore_whitespaces: false,
            update_value_index: false,
        }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    pub fn put_handler(&mut self, ch: char, handler: CharacterHandler) {
        let code = ch as usize;
        if code < self.table.len() {
            self.table[code] = Some(handler);
        } else {
            self.overflow.insert(ch, handler);
        }
    }

    /// Map every character in `chars` to the same handler
    pub fn put_handlers(&mut self, chars: &str, handler: CharacterHandler) {
        for ch in chars.chars() {
            self.put_handler(ch, handler);
        }
    }

    pub fn enter_state(&mut self, ch: char, state: StateId) {
        self.put_handler(ch, CharacterHandler::EnterState(state));
    }

    pub fn leave_state(&mut self, ch: char) {
        self.put_handler(ch, CharacterHandler::LeaveState);
    }

    pub fn set_enter_handler(&mut self, handler: CharacterHandler) {
        self.enter_handler = handler;
    }

    pub fn set_default_handler(&mut self, handler: CharacterHandler) {
        self.default_handler = handler;
    }

    pub fn set_return_handler(&mut self, handler: CharacterHandler) {
        self.return_handler = handler;
    }

    pub fn set_end_content_handler(&mut self, handler: CharacterHandler) {
        self.end_content_handler = handler;
    }

    pub fn set_whitespace_handler(&mut self, handler: CharacterHandler) {
        self.whitespace_handler = Some(handler);
    }

    /// Re-dispatch the character that caused the state to be entered
    pub fn set_handle_entrance(&mut self, handle: bool) {
        self.enter_handler = if handle {
            CharacterHandler::Dispatch
        } else {
            CharacterHandler::Noop
        };
    }

    pub fn set_leave_on_whitespace(&mut self, leave: bool) {
        self.leave_on_whitespace = leave;
        self.whitespace_handler = leave.then_some(CharacterHandler::LeaveState);
    }

    pub fn set_ignore_whitespaces(&mut self, ignore: bool) {
        self.ignore_whitespaces = ignore;
    }

    pub fn set_update_value_index(&mut self, update: bool) {
        self.update_value_index = update;
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn enter_handler(&self) -> CharacterHandler {
        self.enter_handler
    }

    pub fn return_handler(&self) -> CharacterHandler {
        self.return_handler
    }

    pub fn end_content_handler(&self) -> CharacterHandler {
        self.end_content_handler
    }

    pub fn leaves_on_whitespace(&self) -> bool {
        self.leave_on_whitespace
    }

    pub fn ignores_whitespaces(&self) -> bool {
        self.ignore_whitespaces
    }

    pub fn updates_value_index(&self) -> bool {
        self.update_value_index
    }

    /// Exact mapping first, then whitespace policy, then the default
    pub fn handler_for(&self, ch: char) -> CharacterHandler {
        let code = ch as usize;
        let mapped = if code < self.table.len() {
            self.table[code]
        } else {
            self.overflow.get(&ch).copied()
        };
        if let Some(handler) = mapped {
            return handler;
        }

        if ch.is_whitespace() {
            if self.ignore_whitespaces {
                return CharacterHandler::Noop;
            }
            if let Some(handler) = self.whitespace_handler {
                return handler;
            }
        }

        self.default_handler
    }
}

// ============================================================================
// STATE GRAPH
// ============================================================================

/// Owns one flyweight per state id; read-only once built
#[derive(Debug, Clone)]
pub struct StateGraph {
    states: Vec<Option<ParsingState>>,
}

impl StateGraph {
    pub fn new() -> Self {
        Self {
            states: vec![None; StateId::COUNT],
        }
    }

    pub fn insert(&mut self, state: ParsingState) {
        let index = state.id().index();
        self.states[index] = Some(state);
    }

    pub fn contains(&self, id: StateId) -> bool {
        self.states[id.index()].is_some()
    }

    pub fn state(&self, id: StateId) -> ParseResult<&ParsingState> {
        self.states[id.index()].as_ref().ok_or_else(|| {
            ParseError::internal_parser_error(&format!("state {} is not part of this graph", id))
        })
    }
}

impl Default for StateGraph {
    fn default() -> Self {
        Self::new()
    }
}
