//! Error and success codes with their classification metadata
//!
//! Every failure the parser can report maps to one code here; the registry
//! carries the category, severity and recommended action for each.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub const fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

/// Caller errors: the input itself is unusable
pub mod caller {
    use super::Code;

    pub const EMPTY_INPUT: Code = Code::new("E001");
    pub const INPUT_TOO_LARGE: Code = Code::new("E002");
}

/// Structural errors: something opened was never closed
pub mod structural {
    use super::Code;

    pub const UNTERMINATED_QUOTE: Code = Code::new("E010");
    pub const UNTERMINATED_GROUP: Code = Code::new("E011");
    pub const NESTING_TOO_DEEP: Code = Code::new("E012");
}

/// Grammatical errors: well-formed characters in an ill-formed order
pub mod grammatical {
    use super::Code;

    pub const MISSING_PROPERTY_NAME: Code = Code::new("E020");
    pub const MISSING_PROPERTY_VALUE: Code = Code::new("E021");
    pub const MISSING_ARGUMENT_VALUE: Code = Code::new("E022");
    pub const MISSING_GROUP_NAME: Code = Code::new("E023");
    pub const MISPLACED_CONCURRENCY_MARKER: Code = Code::new("E024");
    pub const MISSING_REDIRECT_TARGET: Code = Code::new("E025");
    pub const UNEXPECTED_CHARACTER: Code = Code::new("E026");
    pub const INVALID_PLAN_REFERENCE: Code = Code::new("E027");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

/// Success codes
pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I001");
    pub const SCAN_COMPLETED: Code = Code::new("I010");
    pub const COMMAND_LINE_PARSED: Code = Code::new("I020");
    pub const ADDRESS_PARSED: Code = Code::new("I021");
    pub const ROLLOUT_PLAN_PARSED: Code = Code::new("I030");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

static METADATA: &[ErrorMetadata] = &[
    ErrorMetadata::new(
        "ERR001",
        "System",
        Severity::Critical,
        true,
        "Internal parser error",
        "File a bug report with the input that triggered it",
    ),
    ErrorMetadata::new(
        "ERR002",
        "System",
        Severity::Critical,
        true,
        "System initialization failure",
        "Check configuration files and environment variables",
    ),
    ErrorMetadata::new(
        "E001",
        "Caller",
        Severity::Medium,
        false,
        "Input is empty",
        "Provide a command line to parse",
    ),
    ErrorMetadata::new(
        "E002",
        "Caller",
        Severity::High,
        true,
        "Input exceeds the maximum accepted length",
        "Shorten the command line or raise max_input_length in the build profile",
    ),
    ErrorMetadata::new(
        "E010",
        "Structural",
        Severity::High,
        false,
        "Quoted span is not closed",
        "Add the closing quote",
    ),
    ErrorMetadata::new(
        "E011",
        "Structural",
        Severity::High,
        false,
        "Bracket, parenthesis or brace is not closed",
        "Add the matching closing character",
    ),
    ErrorMetadata::new(
        "E012",
        "Structural",
        Severity::High,
        true,
        "Nesting exceeds the maximum state stack depth",
        "Reduce bracket nesting or raise max_stack_depth in the build profile",
    ),
    ErrorMetadata::new(
        "E020",
        "Grammatical",
        Severity::Medium,
        false,
        "Property has a value but no name",
        "Add a property name before '='",
    ),
    ErrorMetadata::new(
        "E021",
        "Grammatical",
        Severity::Medium,
        false,
        "Property has '=' but no value",
        "Add a value after '=' or drop the '=' for a flag property",
    ),
    ErrorMetadata::new(
        "E022",
        "Grammatical",
        Severity::Medium,
        false,
        "Argument has '=' but no value",
        "Add a value after '=' or drop the '=' for a flag argument",
    ),
    ErrorMetadata::new(
        "E023",
        "Grammatical",
        Severity::Medium,
        false,
        "Server group entry has no name",
        "Remove the extra separator or name the group",
    ),
    ErrorMetadata::new(
        "E024",
        "Grammatical",
        Severity::Medium,
        false,
        "Concurrency marker '^' must join two server groups",
        "Place '^' between two group names",
    ),
    ErrorMetadata::new(
        "E025",
        "Grammatical",
        Severity::Medium,
        false,
        "Output redirect is missing its target or has extra content",
        "Follow '>' with exactly one target",
    ),
    ErrorMetadata::new(
        "E026",
        "Grammatical",
        Severity::Medium,
        false,
        "Character is not valid at this position",
        "Escape the character or remove it",
    ),
    ErrorMetadata::new(
        "E027",
        "Grammatical",
        Severity::Medium,
        false,
        "Rollout plan reference is malformed",
        "Use 'id=<plan-name>' or a bare plan name",
    ),
    ErrorMetadata::new(
        "I001",
        "System",
        Severity::Low,
        false,
        "Logging system initialized",
        "None",
    ),
    ErrorMetadata::new(
        "I010",
        "Engine",
        Severity::Low,
        false,
        "Scan completed with a balanced state stack",
        "None",
    ),
    ErrorMetadata::new(
        "I020",
        "Command",
        Severity::Low,
        false,
        "Command line parsed",
        "None",
    ),
    ErrorMetadata::new(
        "I021",
        "Command",
        Severity::Low,
        false,
        "Address path parsed",
        "None",
    ),
    ErrorMetadata::new(
        "I030",
        "RolloutPlan",
        Severity::Low,
        false,
        "Rollout plan header parsed",
        "None",
    ),
];

/// Metadata registry using OnceLock for thread safety
static ERROR_REGISTRY: OnceLock<HashMap<&'static str, &'static ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, &'static ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| METADATA.iter().map(|meta| (meta.code, meta)).collect())
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

/// Get metadata for a specific code
pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code).copied()
}

/// Get severity from code
pub fn get_severity(code: &str) -> Severity {
    get_error_metadata(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

/// Check if the code requires the caller to stop processing further input
pub fn requires_halt(code: &str) -> bool {
    get_error_metadata(code)
        .map(|metadata| metadata.requires_halt)
        .unwrap_or(false)
}

/// Get human-readable description for code
pub fn get_description(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

/// Get recommended action for code
pub fn get_action(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

/// Get category from code
pub fn get_category(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}
