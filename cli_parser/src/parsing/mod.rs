//! Character dispatch engine and the parser entry points built on it
//!
//! Each entry point pairs a shared state graph with a fresh builder, runs
//! one scan and hands back the builder's output.

pub mod context;
pub mod error;
pub mod handler;
pub mod state;

// Re-export public types
pub use context::{scan, ParsingCallbackHandler, ParsingContext, ParsingCursor};
pub use error::{ParseError, ParseResult};
pub use handler::{CharacterHandler, HandlerFn};
pub use state::{ParsingState, StateGraph};

use crate::config::runtime::ParserPreferences;
use crate::grammar::{
    self, AddressBuilder, CommandLineBuilder, OperationRequestAddress, ParsedArgument,
    ParsedCommandLine, ParsedRolloutPlanHeader, RolloutPlanBuilder, StateId,
};
use crate::log_success;
use crate::logging::codes;

// ============================================================================
// OPTIONS
// ============================================================================

/// Construction-time flags selecting which shared graph a scan runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// `\` escapes the next character in names and values
    pub value_escaping: bool,
    /// `\` escapes the next character inside quoted spans
    pub escape_in_quotes: bool,
    /// Log every state push and pop at debug level
    pub trace_transitions: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            value_escaping: true,
            escape_in_quotes: true,
            trace_transitions: false,
        }
    }
}

impl ParserOptions {
    pub fn from_preferences(preferences: &ParserPreferences) -> Self {
        Self {
            value_escaping: preferences.value_escaping,
            escape_in_quotes: preferences.escape_in_quotes,
            trace_transitions: preferences.trace_transitions,
        }
    }
}

impl From<&ParserPreferences> for ParserOptions {
    fn from(preferences: &ParserPreferences) -> Self {
        Self::from_preferences(preferences)
    }
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

fn require_input(text: &str) -> ParseResult<()> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }
    Ok(())
}

fn run_scan(
    text: &str,
    initial: StateId,
    options: &ParserOptions,
    callback: &mut dyn ParsingCallbackHandler,
) -> ParseResult<()> {
    require_input(text)?;
    ParsingContext::new(text, grammar::state_graph(options), callback)
        .trace_transitions(options.trace_transitions)
        .run(initial)
}

/// Parse `<address>? <operation-name> <arguments>? ({ headers })? (> target)?`
pub fn parse_command_line(line: &str, options: &ParserOptions) -> ParseResult<ParsedCommandLine> {
    let mut builder = CommandLineBuilder::new(None);
    run_scan(line, StateId::Command, options, &mut builder)?;

    let command_line = builder.into_command_line()?;
    log_success!(codes::success::COMMAND_LINE_PARSED, "Command line parsed",
        "operation" => command_line.operation_name.as_deref().unwrap_or("<none>"),
        "arguments" => command_line.arguments.len()
    );
    Ok(command_line)
}

/// Parse a bare argument list such as `name=value --flag`
pub fn parse_arguments(text: &str, options: &ParserOptions) -> ParseResult<Vec<ParsedArgument>> {
    let mut builder = CommandLineBuilder::new(None);
    run_scan(text, StateId::ArgumentList, options, &mut builder)?;

    let arguments = builder.into_arguments();
    log_success!(codes::success::COMMAND_LINE_PARSED, "Arguments parsed",
        "arguments" => arguments.len()
    );
    Ok(arguments)
}

/// Parse an address, resolving relative paths against `prefix`
pub fn parse_address(
    text: &str,
    prefix: Option<&OperationRequestAddress>,
    options: &ParserOptions,
) -> ParseResult<OperationRequestAddress> {
    let mut builder = AddressBuilder::new(prefix);
    run_scan(text, StateId::Address, options, &mut builder)?;

    let address = builder.into_address();
    log_success!(codes::success::ADDRESS_PARSED, "Address parsed", "address" => address);
    Ok(address)
}

/// Parse a rollout plan header value: a plan reference or a braced group list
pub fn parse_rollout_plan(
    text: &str,
    options: &ParserOptions,
) -> ParseResult<ParsedRolloutPlanHeader> {
    let mut builder = RolloutPlanBuilder::new();
    run_scan(text, StateId::HeaderValue, options, &mut builder)?;

    let header = builder.into_header()?;
    log_success!(codes::success::ROLLOUT_PLAN_PARSED, "Rollout plan parsed",
        "entries" => header.entries.len(),
        "properties" => header.properties.len()
    );
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::RolloutPlanEntry;
    use crate::logging::{self, LogLevel, LoggingService, MemoryLogger};
    use assert_matches::assert_matches;
    use std::sync::Arc;

    fn options() -> ParserOptions {
        ParserOptions::default()
    }

    fn command(line: &str) -> ParsedCommandLine {
        parse_command_line(line, &options()).unwrap()
    }

    fn rollout(text: &str) -> ParsedRolloutPlanHeader {
        parse_rollout_plan(text, &options()).unwrap()
    }

    #[derive(Default)]
    struct Balance {
        entered: usize,
        left: usize,
    }

    impl ParsingCallbackHandler for Balance {
        fn entered_state(&mut self, _cursor: &ParsingCursor<'_>) -> ParseResult<()> {
            self.entered += 1;
            Ok(())
        }
        fn leaving_state(&mut self, _cursor: &ParsingCursor<'_>) -> ParseResult<()> {
            self.left += 1;
            Ok(())
        }
        fn character(&mut self, _cursor: &ParsingCursor<'_>) -> ParseResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_stack_balance_across_grammars() {
        let graph = grammar::state_graph(&options());
        let cases = [
            (StateId::Command, "/subsystem=logging:read-resource recursive=true > out.txt"),
            (StateId::Command, "op a = b c=[1,(2,{3})] d=\"x y\" flag"),
            (StateId::Command, "op foo\\"),
            (StateId::Command, "/a=b:do x=1 {rollout a(y=1)^b;p=v} > out"),
            (StateId::ArgumentList, "  a b=c   "),
            (StateId::Address, "a=b/../c=\"d:/e\"/.type"),
            (
                StateId::HeaderValue,
                "{ rollout a(x=1,y) ^ b ^ c, d ; p = v } q",
            ),
            (StateId::HeaderValue, "id=myplan p"),
        ];
        for (initial, input) in cases {
            let mut balance = Balance::default();
            scan(input, graph, initial, &mut balance).unwrap();
            assert!(balance.entered > 0, "{}", input);
            assert_eq!(balance.entered, balance.left, "{}", input);
        }
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert_matches!(parse_command_line("", &options()), Err(ParseError::EmptyInput));
        assert_matches!(parse_arguments("   ", &options()), Err(ParseError::EmptyInput));
        assert_matches!(parse_address("\t", None, &options()), Err(ParseError::EmptyInput));
        assert_matches!(parse_rollout_plan(" ", &options()), Err(ParseError::EmptyInput));
    }

    #[test]
    fn test_options_follow_preferences() {
        let preferences = ParserPreferences {
            value_escaping: false,
            escape_in_quotes: true,
            trace_transitions: true,
        };
        let options = ParserOptions::from(&preferences);
        assert!(!options.value_escaping);
        assert!(options.escape_in_quotes);
        assert!(options.trace_transitions);
    }

    // ------------------------------------------------------------------
    // Command lines
    // ------------------------------------------------------------------

    #[test]
    fn test_operation_with_address_and_arguments() {
        let line = command("/subsystem=logging:read-resource recursive=true include-runtime");

        let address = line.address.as_ref().unwrap();
        assert_eq!(address.to_string(), "/subsystem=logging");
        assert_eq!(line.operation_name.as_deref(), Some("read-resource"));
        assert_eq!(line.argument_value("recursive"), Some("true"));
        assert!(line.argument("include-runtime").unwrap().is_flag());
        assert_eq!(line.argument("recursive").unwrap().offset, 33);
        assert_eq!(line.redirect, None);
    }

    #[test]
    fn test_leading_colon_is_empty_address() {
        let line = command(":read-resource");
        assert_eq!(line.address, Some(OperationRequestAddress::new()));
        assert_eq!(line.operation_name.as_deref(), Some("read-resource"));

        let line = command("read-resource");
        assert_eq!(line.address, None);
    }

    #[test]
    fn test_leading_dash_is_argument_only() {
        let line = command("--verbose level=2");
        assert_eq!(line.operation_name, None);
        assert_eq!(line.arguments.len(), 2);
        assert!(line.argument("--verbose").unwrap().is_flag());
        assert_eq!(line.argument_value("level"), Some("2"));
    }

    #[test]
    fn test_name_value_argument() {
        let arguments = parse_arguments("foo=bar", &options()).unwrap();
        assert_eq!(arguments, vec![ParsedArgument::new("foo", Some("bar".to_string()), 0)]);
    }

    #[test]
    fn test_bare_name_is_flag() {
        let arguments = parse_arguments("foo", &options()).unwrap();
        assert_eq!(arguments.len(), 1);
        assert_eq!(arguments[0].name, "foo");
        assert!(arguments[0].is_flag());
    }

    #[test]
    fn test_whitespace_around_separator() {
        let arguments = parse_arguments("a = b c", &options()).unwrap();
        assert_eq!(arguments[0].name, "a");
        assert_eq!(arguments[0].value.as_deref(), Some("b"));
        assert!(arguments[1].is_flag());
        assert_eq!(arguments[1].offset, 6);
    }

    #[test]
    fn test_bracketed_value_is_verbatim() {
        let line = command("op foo=[a,b,c] bar={x=(1, 2)}");
        assert_eq!(line.argument_value("foo"), Some("[a,b,c]"));
        assert_eq!(line.argument_value("bar"), Some("{x=(1, 2)}"));
    }

    #[test]
    fn test_missing_argument_value_points_at_separator() {
        let error = parse_arguments("name=", &options()).unwrap_err();
        assert_eq!(
            error,
            ParseError::MissingArgumentValue {
                name: "name".to_string(),
                offset: 4
            }
        );
        assert_eq!(error.to_string(), "Argument 'name' is missing value at offset 4.");
    }

    #[test]
    fn test_empty_name_before_separator() {
        assert_matches!(
            parse_arguments("=value", &options()),
            Err(ParseError::UnexpectedCharacter { found: '=', offset: 0 })
        );
    }

    #[test]
    fn test_quoted_value_keeps_space() {
        let arguments = parse_arguments("name=\"a b\" next", &options()).unwrap();
        assert_eq!(arguments.len(), 2);
        assert_eq!(arguments[0].value.as_deref(), Some("\"a b\""));
        assert_eq!(arguments[1].name, "next");
    }

    #[test]
    fn test_escape_inside_quotes_enabled() {
        let arguments = parse_arguments("v=\"a\\\"b\"", &options()).unwrap();
        assert_eq!(arguments[0].value.as_deref(), Some("\"a\\\"b\""));
    }

    #[test]
    fn test_escaped_quote_survives_rewrite() {
        let line = command("op v=\"a\\\"b\" w=\"c\\\\\"");
        let written = line.to_command_line(&crate::grammar::COMMAND_FORMAT);
        assert_eq!(written, "op v=\"a\\\"b\" w=\"c\\\\\"");
        assert_eq!(command(&written), line);
    }

    #[test]
    fn test_escape_inside_quotes_disabled() {
        let literal = ParserOptions {
            escape_in_quotes: false,
            ..ParserOptions::default()
        };
        let arguments = parse_arguments("v=\"a\\b\"", &literal).unwrap();
        assert_eq!(arguments[0].value.as_deref(), Some("\"a\\b\""));
    }

    #[test]
    fn test_escaped_separator_is_content() {
        let arguments = parse_arguments("foo\\=bar", &options()).unwrap();
        assert_eq!(arguments.len(), 1);
        assert_eq!(arguments[0].name, "foo=bar");
        assert!(arguments[0].is_flag());
    }

    #[test]
    fn test_value_escaping_disabled() {
        let literal = ParserOptions {
            value_escaping: false,
            ..ParserOptions::default()
        };
        let arguments = parse_arguments("path=c:\\temp", &literal).unwrap();
        assert_eq!(arguments[0].value.as_deref(), Some("c:\\temp"));
    }

    #[test]
    fn test_unterminated_value_group() {
        assert_matches!(
            parse_arguments("a=[1,2", &options()),
            Err(ParseError::UnterminatedGroup { opening: '[', offset: 2 })
        );
        assert_matches!(
            parse_arguments("a=\"open", &options()),
            Err(ParseError::UnterminatedQuote { offset: 2 })
        );
    }

    #[test]
    fn test_redirect() {
        let line = command("ls > out.txt");
        assert_eq!(line.operation_name.as_deref(), Some("ls"));
        assert!(line.arguments.is_empty());
        assert_eq!(line.redirect.as_deref(), Some("out.txt"));

        let line = command("ls>out.txt");
        assert_eq!(line.redirect.as_deref(), Some("out.txt"));

        let line = command(":read-resource recursive > \"my file.txt\"");
        assert!(line.argument("recursive").unwrap().is_flag());
        assert_eq!(line.redirect.as_deref(), Some("my file.txt"));
    }

    #[test]
    fn test_redirect_errors() {
        assert_matches!(
            parse_command_line("ls >", &options()),
            Err(ParseError::MissingRedirectTarget { offset: 3 })
        );
        assert_matches!(
            parse_command_line("ls > a b", &options()),
            Err(ParseError::UnexpectedCharacter { found: 'b', offset: 7 })
        );
    }

    #[test]
    fn test_written_line_matches_input() {
        let input = "/subsystem=logging:read-resource recursive name=\"a b\" > out.txt";
        let line = command(input);
        assert_eq!(line.to_command_line(&crate::grammar::COMMAND_FORMAT), input);
    }

    #[test]
    fn test_scan_completion_is_logged() {
        let memory = Arc::new(MemoryLogger::new());
        let service = LoggingService::new(memory.clone(), LogLevel::Debug);
        logging::init_global_logging_with_service(Arc::new(service)).unwrap();

        command(":read-resource");
        assert!(memory.has_success_with_code(codes::success::SCAN_COMPLETED));
        assert!(memory.has_success_with_code(codes::success::COMMAND_LINE_PARSED));
    }

    // ------------------------------------------------------------------
    // Operation headers
    // ------------------------------------------------------------------

    const THREAD_FACTORY: &str = "/profile=default/subsystem=threads/thread-factory=mytf";

    #[test]
    fn test_rollout_header_on_command_line() {
        let line = command(&format!("{}:do{{ rollout groupA ^ groupB}}", THREAD_FACTORY));

        assert_eq!(line.address.as_ref().unwrap().nodes().len(), 3);
        assert_eq!(line.operation_name.as_deref(), Some("do"));
        assert!(line.arguments.is_empty());

        let headers = line.headers.unwrap();
        assert_eq!(headers.entries.len(), 1);
        assert!(headers.entries[0].is_concurrent());
        assert_eq!(headers.entries[0].group_names(), vec!["groupA", "groupB"]);
    }

    #[test]
    fn test_generic_headers_on_command_line() {
        let line = command(&format!("{}:do{{ name = value }}", THREAD_FACTORY));
        let headers = line.headers.unwrap();
        assert!(!headers.has_groups());
        assert_eq!(headers.property("name"), Some("value"));

        let line = command(&format!("{}:do{{ name1 = value1 ; name2=value2 }}", THREAD_FACTORY));
        let headers = line.headers.unwrap();
        let names: Vec<&str> = headers.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["name1", "name2"]);
        assert_eq!(headers.property("name2"), Some("value2"));

        let line = command(&format!("{}:do{{}}", THREAD_FACTORY));
        assert_eq!(line.headers, Some(ParsedRolloutPlanHeader::default()));
    }

    #[test]
    fn test_plan_reference_header_on_command_line() {
        let line = command(&format!("{}:do{{ rollout id = myplan}}", THREAD_FACTORY));
        assert_eq!(line.headers.unwrap().plan_ref.as_deref(), Some("myplan"));
    }

    #[test]
    fn test_headers_after_arguments_and_before_redirect() {
        let input = "/a=b:do x=1 {rollout a^b,c(y=2);timeout=5} > out.txt";
        let line = command(input);

        assert_eq!(line.argument_value("x"), Some("1"));
        assert_eq!(line.redirect.as_deref(), Some("out.txt"));
        let headers = line.headers.as_ref().unwrap();
        assert_eq!(headers.entries[0].group_names(), vec!["a", "b"]);
        assert_eq!(headers.entries[1].group_names(), vec!["c"]);
        assert_eq!(headers.property("timeout"), Some("5"));

        let written = line.to_command_line(&crate::grammar::COMMAND_FORMAT);
        assert_eq!(written, input);
        assert_eq!(command(&written), line);
    }

    #[test]
    fn test_header_block_errors() {
        assert_matches!(
            parse_command_line("/a=b:do{ rollout groupA", &options()),
            Err(ParseError::UnterminatedGroup { opening: '{', offset: 7 })
        );
        assert_matches!(
            parse_command_line("op{a}b", &options()),
            Err(ParseError::UnexpectedCharacter { found: 'b', offset: 5 })
        );
        assert_matches!(
            parse_arguments("x=1 {a}", &options()),
            Err(ParseError::UnexpectedCharacter { found: '{', offset: 4 })
        );
    }

    // ------------------------------------------------------------------
    // Addresses
    // ------------------------------------------------------------------

    fn address(text: &str, prefix: Option<&OperationRequestAddress>) -> String {
        parse_address(text, prefix, &options()).unwrap().to_string()
    }

    #[test]
    fn test_address_relative_to_prefix() {
        let mut prefix = OperationRequestAddress::new();
        prefix.to_node("a", "b");
        assert_eq!(address("subsystem", Some(&prefix)), "/a=b/subsystem");
        assert_eq!(address("/subsystem", Some(&prefix)), "/subsystem");
        assert_eq!(address("./subsystem=x", Some(&prefix)), "/a=b/subsystem=x");
        assert_eq!(address("..", Some(&prefix)), "/");
    }

    #[test]
    fn test_bare_token_names_trailing_type() {
        let mut prefix = OperationRequestAddress::new();
        prefix.to_node_type("a");
        assert_eq!(address("b", Some(&prefix)), "/a=b");
    }

    #[test]
    fn test_address_navigation_tokens() {
        assert_eq!(address("c=d/../e=f", None), "/e=f");
        assert_eq!(address("a=b/.type/c", None), "/a=c");

        let parsed = parse_address("subsystem=", None, &options()).unwrap();
        assert!(parsed.ends_on_type());
    }

    #[test]
    fn test_quoted_and_escaped_node_names() {
        let quoted = parse_address("data-source=\"java:/H2DS\"", None, &options()).unwrap();
        assert_eq!(quoted.nodes()[0].name.as_deref(), Some("java:/H2DS"));

        let escaped = parse_address("data-source=java\\:\\/H2DS", None, &options()).unwrap();
        assert_eq!(escaped, quoted);
    }

    #[test]
    fn test_address_trailing_input() {
        assert_matches!(
            parse_address("a=b:op", None, &options()),
            Err(ParseError::UnexpectedCharacter { found: 'o', offset: 4 })
        );
    }

    // ------------------------------------------------------------------
    // Rollout plans
    // ------------------------------------------------------------------

    #[test]
    fn test_sequential_and_concurrent_groups() {
        let header = rollout("{groupA,groupB^groupC;max-failed-servers=1}");

        assert_eq!(header.plan_ref, None);
        assert_eq!(header.entries.len(), 2);
        assert!(!header.entries[0].is_concurrent());
        assert_eq!(header.entries[0].group_names(), vec!["groupA"]);
        assert!(header.entries[1].is_concurrent());
        assert_eq!(header.entries[1].group_names(), vec!["groupB", "groupC"]);
        assert_eq!(header.property("max-failed-servers"), Some("1"));
    }

    #[test]
    fn test_group_properties() {
        let header = rollout("{groupA(max-failed-servers=2)}");
        match &header.entries[..] {
            [RolloutPlanEntry::Single(group)] => {
                assert_eq!(group.name, "groupA");
                assert_eq!(group.property("max-failed-servers"), Some("2"));
            }
            other => panic!("unexpected entries {:?}", other),
        }
        assert!(header.properties.is_empty());
    }

    #[test]
    fn test_plan_reference() {
        let header = rollout("id=planRef");
        assert_eq!(header.plan_ref.as_deref(), Some("planRef"));
        assert!(!header.has_groups());
        assert_eq!(header.to_model(), None);

        let header = rollout("{ rollout id = myplan}");
        assert_eq!(header.plan_ref.as_deref(), Some("myplan"));

        assert_matches!(
            parse_rollout_plan("name=planRef", &options()),
            Err(ParseError::InvalidPlanReference { .. })
        );
    }

    #[test]
    fn test_full_plan_with_keyword() {
        let header = rollout(
            "{ rollout groupA(rolling-to-servers=true,max-failure-percentage=20) ^ groupB, \
             groupC, groupD(rolling-to-servers=true,max-failed-servers=1) ^ groupE \
             rollback-across-groups}",
        );

        let names: Vec<Vec<&str>> = header.entries.iter().map(|e| e.group_names()).collect();
        assert_eq!(
            names,
            vec![vec!["groupA", "groupB"], vec!["groupC"], vec!["groupD", "groupE"]]
        );
        assert!(header.entries[0].is_concurrent());
        assert!(!header.entries[1].is_concurrent());
        assert_eq!(header.property("rollback-across-groups"), Some("true"));

        let model = header.to_model().unwrap();
        let series = &model["rollout-plan"]["in-series"];
        assert_eq!(
            series[0]["concurrent-groups"]["groupA"]["max-failure-percentage"],
            "20"
        );
        assert!(series[1]["server-group"]["groupC"].is_null());
        assert_eq!(
            series[2]["concurrent-groups"]["groupD"]["max-failed-servers"],
            "1"
        );
    }

    #[test]
    fn test_concurrency_chain_accumulates() {
        let header = rollout("{a^b^c,d}");
        assert_eq!(header.entries[0].group_names(), vec!["a", "b", "c"]);
        assert_eq!(header.entries[1].group_names(), vec!["d"]);
    }

    #[test]
    fn test_header_properties_inside_braces() {
        let header = rollout("{ name = value }");
        assert!(!header.has_groups());
        assert_eq!(header.plan_ref, None);
        assert_eq!(header.property("name"), Some("value"));

        let header = rollout("{ rollout prop1=value1 prop2 = value2}");
        assert_eq!(header.property("prop1"), Some("value1"));
        assert_eq!(header.property("prop2"), Some("value2"));
    }

    #[test]
    fn test_empty_group_property_slot() {
        assert_matches!(
            parse_rollout_plan("{a(x=1,)}", &options()),
            Err(ParseError::MissingPropertyName { offset: 7 })
        );
        assert_matches!(
            parse_rollout_plan("{a(x=1,,y)}", &options()),
            Err(ParseError::MissingPropertyName { offset: 7 })
        );
        assert_matches!(
            parse_rollout_plan("{a(,x)}", &options()),
            Err(ParseError::MissingPropertyName { offset: 3 })
        );
    }

    #[test]
    fn test_header_properties_after_braces() {
        let header = rollout("{a} rollback-across-groups;x = y");
        assert_eq!(header.property("rollback-across-groups"), Some("true"));
        assert_eq!(header.property("x"), Some("y"));
    }

    #[test]
    fn test_rollout_errors() {
        let error = parse_rollout_plan("{a(x=)}", &options()).unwrap_err();
        assert_eq!(error.to_string(), "Property 'x' is missing value at offset 5.");

        assert_matches!(
            parse_rollout_plan("{a(=1)}", &options()),
            Err(ParseError::MissingPropertyName { offset: 3 })
        );
        assert_matches!(
            parse_rollout_plan("{a,}", &options()),
            Err(ParseError::MissingGroupName { offset: 3 })
        );
        assert_matches!(
            parse_rollout_plan("{^a}", &options()),
            Err(ParseError::MisplacedConcurrencyMarker { offset: 1 })
        );
        assert_matches!(
            parse_rollout_plan("{a^}", &options()),
            Err(ParseError::MisplacedConcurrencyMarker { offset: 2 })
        );
        assert_matches!(
            parse_rollout_plan("{a", &options()),
            Err(ParseError::UnterminatedGroup { opening: '{', offset: 0 })
        );
    }
}
