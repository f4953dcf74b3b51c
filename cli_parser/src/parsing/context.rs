//! Per-scan driver: cursor, explicit state stack and callback sink
//!
//! States are shared read-only templates; everything that changes while a
//! line is scanned lives here and is dropped when the scan returns.

use super::error::{ParseError, ParseResult};
use super::state::StateGraph;
use crate::config::compile_time::{engine::MAX_STACK_DEPTH, input::MAX_INPUT_LENGTH};
use crate::grammar::ids::StateId;
use crate::logging::codes;
use crate::{log_debug, log_error, log_success};

// ============================================================================
// CALLBACK
// ============================================================================

/// Event sink notified as the scan moves through the state graph
///
/// `entered_state` fires after the frame is pushed and `leaving_state` fires
/// while the frame is still on top, so `cursor.state()` names the state the
/// event concerns in both cases.
pub trait ParsingCallbackHandler {
    fn entered_state(&mut self, cursor: &ParsingCursor<'_>) -> ParseResult<()>;

    fn leaving_state(&mut self, cursor: &ParsingCursor<'_>) -> ParseResult<()>;

    fn character(&mut self, cursor: &ParsingCursor<'_>) -> ParseResult<()>;
}

// ============================================================================
// CURSOR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    state: StateId,
    start: usize,
    token_start: usize,
}

/// Read view of a scan in progress, handed to callbacks
#[derive(Debug)]
pub struct ParsingCursor<'a> {
    graph: &'a StateGraph,
    input: &'a str,
    chars: Vec<char>,
    location: usize,
    stack: Vec<Frame>,
    buffer: String,
    last_popped: Option<StateId>,
    value_index: Option<usize>,
    started: bool,
    trace: bool,
}

impl<'a> ParsingCursor<'a> {
    fn new(input: &'a str, graph: &'a StateGraph) -> Self {
        Self {
            graph,
            input,
            chars: input.chars().collect(),
            location: 0,
            stack: Vec::new(),
            buffer: String::new(),
            last_popped: None,
            value_index: None,
            started: false,
            trace: false,
        }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Character offset of the cursor
    pub fn location(&self) -> usize {
        self.location
    }

    /// Current character; `None` while the initial state is entered and
    /// once the input is exhausted
    pub fn character(&self) -> Option<char> {
        if !self.started {
            return None;
        }
        self.chars.get(self.location).copied()
    }

    pub fn is_end_of_content(&self) -> bool {
        self.location >= self.chars.len()
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// State on top of the stack
    pub fn state(&self) -> Option<StateId> {
        self.stack.last().map(|frame| frame.state)
    }

    pub fn parent_state(&self) -> Option<StateId> {
        let depth = self.stack.len();
        if depth < 2 {
            return None;
        }
        Some(self.stack[depth - 2].state)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Offset at which the current state was entered
    pub fn frame_start(&self) -> usize {
        self.stack.last().map(|frame| frame.start).unwrap_or(0)
    }

    /// Content reported since the current state was entered, nested states included
    pub fn token(&self) -> &str {
        let start = self.stack.last().map(|frame| frame.token_start).unwrap_or(0);
        &self.buffer[start..]
    }

    /// The child most recently popped back into the current state
    ///
    /// `None` until the current state has had a child return to it.
    pub fn returned_from(&self) -> Option<StateId> {
        self.last_popped
    }

    /// Offset of the most recently entered value state
    pub fn value_index(&self) -> Option<usize> {
        self.value_index
    }

    /// Error for the current character, or for running out of input
    pub fn unexpected_character(&self) -> ParseError {
        match self.character() {
            Some(ch) => ParseError::unexpected_character(ch, self.location),
            None => ParseError::internal_parser_error(&format!(
                "unexpected end of content in state {}",
                self.state().map(|id| id.name()).unwrap_or("<none>")
            )),
        }
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

/// Mutable driver for one scan over one input string
pub struct ParsingContext<'a, 'cb> {
    cursor: ParsingCursor<'a>,
    callback: &'cb mut dyn ParsingCallbackHandler,
}

impl<'a, 'cb> ParsingContext<'a, 'cb> {
    pub fn new(
        input: &'a str,
        graph: &'a StateGraph,
        callback: &'cb mut dyn ParsingCallbackHandler,
    ) -> Self {
        Self {
            cursor: ParsingCursor::new(input, graph),
            callback,
        }
    }

    /// Log every push and pop at debug level
    pub fn trace_transitions(mut self, trace: bool) -> Self {
        self.cursor.trace = trace;
        self
    }

    pub fn cursor(&self) -> &ParsingCursor<'a> {
        &self.cursor
    }

    // ------------------------------------------------------------------
    // Primitives used by character handlers
    // ------------------------------------------------------------------

    /// Push `id` and run its enter handler with the current character
    pub fn enter_state(&mut self, id: StateId) -> ParseResult<()> {
        let graph = self.cursor.graph;
        let state = graph.state(id)?;

        let depth = self.cursor.stack.len() + 1;
        if depth > MAX_STACK_DEPTH {
            return Err(ParseError::NestingTooDeep {
                depth,
                offset: self.cursor.location,
            });
        }

        self.cursor.stack.push(Frame {
            state: id,
            start: self.cursor.location,
            token_start: self.cursor.buffer.len(),
        });
        self.cursor.last_popped = None;
        if state.updates_value_index() {
            self.cursor.value_index = Some(self.cursor.location);
        }
        if self.cursor.trace {
            log_debug!("Entered state",
                "state" => id,
                "offset" => self.cursor.location,
                "depth" => depth
            );
        }

        self.callback.entered_state(&self.cursor)?;
        state.enter_handler().handle(self)
    }

    /// Pop the current state and run the parent's return handler
    pub fn leave_state(&mut self) -> ParseResult<()> {
        let frame = match self.cursor.stack.last() {
            Some(frame) => *frame,
            None => return Err(ParseError::internal_parser_error("leave with empty stack")),
        };

        self.callback.leaving_state(&self.cursor)?;
        self.cursor.stack.pop();
        self.cursor.last_popped = Some(frame.state);
        if self.cursor.trace {
            log_debug!("Left state",
                "state" => frame.state,
                "offset" => self.cursor.location,
                "depth" => self.cursor.stack.len()
            );
        }

        match self.cursor.stack.last() {
            Some(parent) => {
                let graph = self.cursor.graph;
                graph.state(parent.state)?.return_handler().handle(self)
            }
            None => Ok(()),
        }
    }

    /// Move forward; the cursor never moves back or past the end
    pub fn advance_location(&mut self, count: usize) {
        self.cursor.location = (self.cursor.location + count).min(self.cursor.chars.len());
    }

    /// Append the current character to the token buffer and notify the callback
    pub fn report_character(&mut self) -> ParseResult<()> {
        let ch = match self.cursor.character() {
            Some(ch) => ch,
            None => return Ok(()),
        };
        self.cursor.buffer.push(ch);
        self.callback.character(&self.cursor)
    }

    /// Run the current state's own handler for the current character
    pub fn dispatch(&mut self) -> ParseResult<()> {
        let ch = match self.cursor.character() {
            Some(ch) => ch,
            None => return Ok(()),
        };
        let graph = self.cursor.graph;
        match self.cursor.state() {
            Some(id) => graph.state(id)?.handler_for(ch).handle(self),
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Driver
    // ------------------------------------------------------------------

    /// Scan the whole input starting in `initial`
    pub fn run(mut self, initial: StateId) -> ParseResult<()> {
        let result = self.scan_from(initial);
        match &result {
            Ok(()) => log_success!(codes::success::SCAN_COMPLETED, "Scan completed",
                "state" => initial,
                "length" => self.cursor.len()
            ),
            Err(error) => match error.offset() {
                Some(offset) => log_error!(error.error_code(), &error.to_string(),
                    offset = offset,
                    "state" => initial
                ),
                None => log_error!(error.error_code(), &error.to_string(),
                    "state" => initial
                ),
            },
        }
        result
    }

    fn scan_from(&mut self, initial: StateId) -> ParseResult<()> {
        let length = self.cursor.len();
        if length > MAX_INPUT_LENGTH {
            return Err(ParseError::InputTooLarge {
                length,
                max: MAX_INPUT_LENGTH,
            });
        }

        let graph = self.cursor.graph;
        self.enter_state(initial)?;
        self.cursor.started = true;

        while let Some(ch) = self.cursor.character() {
            if self.cursor.stack.is_empty() {
                if !ch.is_whitespace() {
                    return Err(ParseError::unexpected_character(ch, self.cursor.location));
                }
            } else if let Some(id) = self.cursor.state() {
                graph.state(id)?.handler_for(ch).handle(self)?;
            }
            self.advance_location(1);
        }

        self.unwind()
    }

    /// Close every open frame at end of content
    fn unwind(&mut self) -> ParseResult<()> {
        let graph = self.cursor.graph;
        while let Some(top) = self.cursor.stack.last().copied() {
            let depth = self.cursor.stack.len();
            graph
                .state(top.state)?
                .end_content_handler()
                .handle(self)?;

            // a handler that neither left nor failed still gets its frame popped
            if self.cursor.stack.get(depth - 1) == Some(&top) {
                self.leave_state()?;
            }
        }
        Ok(())
    }
}

/// Scan `input` through `graph` from `initial`, reporting to `callback`
pub fn scan(
    input: &str,
    graph: &StateGraph,
    initial: StateId,
    callback: &mut dyn ParsingCallbackHandler,
) -> ParseResult<()> {
    ParsingContext::new(input, graph, callback).run(initial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::handler::CharacterHandler;
    use crate::parsing::state::ParsingState;
    use assert_matches::assert_matches;

    #[derive(Default)]
    struct Recorder {
        entered: usize,
        left: usize,
        max_depth: usize,
        content: String,
        returns: Vec<(StateId, Option<StateId>)>,
    }

    impl ParsingCallbackHandler for Recorder {
        fn entered_state(&mut self, cursor: &ParsingCursor<'_>) -> ParseResult<()> {
            self.entered += 1;
            self.max_depth = self.max_depth.max(cursor.depth());
            Ok(())
        }

        fn leaving_state(&mut self, _cursor: &ParsingCursor<'_>) -> ParseResult<()> {
            self.left += 1;
            Ok(())
        }

        fn character(&mut self, cursor: &ParsingCursor<'_>) -> ParseResult<()> {
            if let Some(ch) = cursor.character() {
                self.content.push(ch);
            }
            Ok(())
        }
    }

    fn escape(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
        ctx.advance_location(1);
        if !ctx.cursor().is_end_of_content() {
            ctx.report_character()?;
        }
        ctx.leave_state()
    }

    fn unterminated_bracket(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
        Err(ParseError::unterminated_group('[', ctx.cursor().frame_start()))
    }

    fn end_on_semicolon(ctx: &mut ParsingContext<'_, '_>) -> ParseResult<()> {
        ctx.leave_state()
    }

    /// Root accumulating content with `[...]` groups and backslash escapes
    fn test_graph() -> StateGraph {
        let mut graph = StateGraph::new();

        let mut root = ParsingState::new(StateId::Command);
        root.set_default_handler(CharacterHandler::Content);
        root.enter_state('[', StateId::BracketGroup);
        root.enter_state('\\', StateId::Escape);
        root.put_handler(';', CharacterHandler::Custom(end_on_semicolon));
        graph.insert(root);

        let mut group = ParsingState::new(StateId::BracketGroup);
        group.set_enter_handler(CharacterHandler::Content);
        group.set_default_handler(CharacterHandler::Content);
        group.put_handler(']', CharacterHandler::ContentAndLeave);
        group.enter_state('[', StateId::BracketGroup);
        group.set_end_content_handler(CharacterHandler::Custom(unterminated_bracket));
        graph.insert(group);

        let mut esc = ParsingState::new(StateId::Escape);
        esc.set_enter_handler(CharacterHandler::Custom(escape));
        graph.insert(esc);

        graph
    }

    #[test]
    fn test_nested_groups_keep_stack_balanced() {
        let graph = test_graph();
        let mut recorder = Recorder::default();

        scan("a[b[c]]d", &graph, StateId::Command, &mut recorder).unwrap();

        assert_eq!(recorder.content, "a[b[c]]d");
        assert_eq!(recorder.entered, 3);
        assert_eq!(recorder.entered, recorder.left);
        assert_eq!(recorder.max_depth, 3);
    }

    #[test]
    fn test_unterminated_group_reports_opening_offset() {
        let graph = test_graph();
        let mut recorder = Recorder::default();

        let result = scan("ab[cd", &graph, StateId::Command, &mut recorder);

        assert_matches!(
            result,
            Err(ParseError::UnterminatedGroup { opening: '[', offset: 2 })
        );
    }

    #[test]
    fn test_escape_suppresses_special_meaning() {
        let graph = test_graph();
        let mut recorder = Recorder::default();

        scan("a\\[b", &graph, StateId::Command, &mut recorder).unwrap();

        assert_eq!(recorder.content, "a[b");
        // root and the escape only
        assert_eq!(recorder.entered, 2);
        assert_eq!(recorder.left, 2);
    }

    #[test]
    fn test_dangling_backslash_is_dropped() {
        let graph = test_graph();
        let mut recorder = Recorder::default();

        scan("ab\\", &graph, StateId::Command, &mut recorder).unwrap();

        assert_eq!(recorder.content, "ab");
        assert_eq!(recorder.entered, recorder.left);
    }

    #[test]
    fn test_nesting_limit() {
        let graph = test_graph();
        let mut recorder = Recorder::default();
        let input = "[".repeat(MAX_STACK_DEPTH);

        let result = scan(&input, &graph, StateId::Command, &mut recorder);

        assert_matches!(result, Err(ParseError::NestingTooDeep { depth, .. }) if depth == MAX_STACK_DEPTH + 1);
    }

    #[test]
    fn test_input_length_limit() {
        let graph = test_graph();
        let mut recorder = Recorder::default();
        let input = "a".repeat(MAX_INPUT_LENGTH + 1);

        let result = scan(&input, &graph, StateId::Command, &mut recorder);

        assert_matches!(result, Err(ParseError::InputTooLarge { .. }));
        assert_eq!(recorder.entered, 0);
    }

    #[test]
    fn test_trailing_input_after_root() {
        let graph = test_graph();

        let mut recorder = Recorder::default();
        let result = scan("ab;cd", &graph, StateId::Command, &mut recorder);
        assert_matches!(
            result,
            Err(ParseError::UnexpectedCharacter { found: 'c', offset: 3 })
        );

        let mut recorder = Recorder::default();
        scan("ab;  ", &graph, StateId::Command, &mut recorder).unwrap();
        assert_eq!(recorder.content, "ab");
    }

    #[test]
    fn test_frames_without_leaving_end_handler_are_popped() {
        let mut graph = StateGraph::new();
        let mut root = ParsingState::new(StateId::HeaderValue);
        root.set_default_handler(CharacterHandler::EnterState(StateId::Property));
        root.set_end_content_handler(CharacterHandler::Noop);
        graph.insert(root);
        let mut property = ParsingState::new(StateId::Property);
        property.set_handle_entrance(true);
        property.set_default_handler(CharacterHandler::Content);
        property.set_end_content_handler(CharacterHandler::Noop);
        graph.insert(property);

        let mut recorder = Recorder::default();
        scan("abc", &graph, StateId::HeaderValue, &mut recorder).unwrap();

        assert_eq!(recorder.content, "abc");
        assert_eq!(recorder.entered, 2);
        assert_eq!(recorder.left, 2);
    }

    struct ReturnRecorder(Recorder);

    impl ParsingCallbackHandler for ReturnRecorder {
        fn entered_state(&mut self, cursor: &ParsingCursor<'_>) -> ParseResult<()> {
            if let Some(state) = cursor.state() {
                self.0.returns.push((state, cursor.returned_from()));
            }
            self.0.entered_state(cursor)
        }

        fn leaving_state(&mut self, cursor: &ParsingCursor<'_>) -> ParseResult<()> {
            if let Some(state) = cursor.state() {
                self.0.returns.push((state, cursor.returned_from()));
            }
            self.0.leaving_state(cursor)
        }

        fn character(&mut self, cursor: &ParsingCursor<'_>) -> ParseResult<()> {
            self.0.character(cursor)
        }
    }

    #[test]
    fn test_returned_from_tracks_last_child() {
        let graph = test_graph();
        let mut recorder = ReturnRecorder(Recorder::default());

        scan("[x]\\y", &graph, StateId::Command, &mut recorder).unwrap();

        assert_eq!(
            recorder.0.returns,
            vec![
                (StateId::Command, None),
                (StateId::BracketGroup, None),
                (StateId::BracketGroup, None),
                (StateId::Escape, None),
                (StateId::Escape, None),
                (StateId::Command, Some(StateId::Escape)),
            ]
        );
        assert_eq!(recorder.0.content, "[x]y");
    }

    #[test]
    fn test_token_covers_nested_content() {
        struct TokenAtLeave(Vec<String>);
        impl ParsingCallbackHandler for TokenAtLeave {
            fn entered_state(&mut self, _cursor: &ParsingCursor<'_>) -> ParseResult<()> {
                Ok(())
            }
            fn leaving_state(&mut self, cursor: &ParsingCursor<'_>) -> ParseResult<()> {
                self.0.push(cursor.token().to_string());
                Ok(())
            }
            fn character(&mut self, _cursor: &ParsingCursor<'_>) -> ParseResult<()> {
                Ok(())
            }
        }

        let graph = test_graph();
        let mut tokens = TokenAtLeave(Vec::new());
        scan("a[b[c]]", &graph, StateId::Command, &mut tokens).unwrap();

        assert_eq!(tokens.0, vec!["[c]", "[b[c]]", "a[b[c]]"]);
    }
}
