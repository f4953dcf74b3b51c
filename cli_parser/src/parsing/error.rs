//! Parse failure types with error code mapping
//!
//! Every failure aborts the scan that raised it and carries the character
//! offset the caller should point at.

use crate::logging::{codes, Code};

pub type ParseResult<T> = Result<T, ParseError>;

/// Lexical and grammatical parse failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Input is empty.")]
    EmptyInput,

    #[error("Input of {length} characters exceeds the limit of {max}.")]
    InputTooLarge { length: usize, max: usize },

    #[error("Unterminated quote starting at offset {offset}.")]
    UnterminatedQuote { offset: usize },

    #[error("Unterminated '{opening}' starting at offset {offset}.")]
    UnterminatedGroup { opening: char, offset: usize },

    #[error("Nesting depth {depth} exceeds the limit at offset {offset}.")]
    NestingTooDeep { depth: usize, offset: usize },

    #[error("Property is missing name at offset {offset}.")]
    MissingPropertyName { offset: usize },

    #[error("Property '{name}' is missing value at offset {offset}.")]
    MissingPropertyValue { name: String, offset: usize },

    #[error("Argument '{name}' is missing value at offset {offset}.")]
    MissingArgumentValue { name: String, offset: usize },

    #[error("Server group is missing name at offset {offset}.")]
    MissingGroupName { offset: usize },

    #[error("Concurrency marker '^' must join two server groups at offset {offset}.")]
    MisplacedConcurrencyMarker { offset: usize },

    #[error("Output redirect is missing target at offset {offset}.")]
    MissingRedirectTarget { offset: usize },

    #[error("Unexpected character '{found}' at offset {offset}.")]
    UnexpectedCharacter { found: char, offset: usize },

    #[error("Plan reference must be 'id=<name>' but found '{name}' at offset {offset}.")]
    InvalidPlanReference { name: String, offset: usize },

    #[error("Internal parser error: {message}")]
    InternalParserError { message: String },
}

impl ParseError {
    pub fn unterminated_quote(offset: usize) -> Self {
        Self::UnterminatedQuote { offset }
    }

    pub fn unterminated_group(opening: char, offset: usize) -> Self {
        Self::UnterminatedGroup { opening, offset }
    }

    pub fn missing_property_name(offset: usize) -> Self {
        Self::MissingPropertyName { offset }
    }

    pub fn missing_property_value(name: &str, offset: usize) -> Self {
        Self::MissingPropertyValue {
            name: name.to_string(),
            offset,
        }
    }

    pub fn missing_argument_value(name: &str, offset: usize) -> Self {
        Self::MissingArgumentValue {
            name: name.to_string(),
            offset,
        }
    }

    pub fn missing_group_name(offset: usize) -> Self {
        Self::MissingGroupName { offset }
    }

    pub fn misplaced_concurrency_marker(offset: usize) -> Self {
        Self::MisplacedConcurrencyMarker { offset }
    }

    pub fn missing_redirect_target(offset: usize) -> Self {
        Self::MissingRedirectTarget { offset }
    }

    pub fn unexpected_character(found: char, offset: usize) -> Self {
        Self::UnexpectedCharacter { found, offset }
    }

    pub fn invalid_plan_reference(name: &str, offset: usize) -> Self {
        Self::InvalidPlanReference {
            name: name.to_string(),
            offset,
        }
    }

    pub fn internal_parser_error(message: &str) -> Self {
        Self::InternalParserError {
            message: message.to_string(),
        }
    }

    /// Get error code for global logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::EmptyInput => codes::caller::EMPTY_INPUT,
            Self::InputTooLarge { .. } => codes::caller::INPUT_TOO_LARGE,
            Self::UnterminatedQuote { .. } => codes::structural::UNTERMINATED_QUOTE,
            Self::UnterminatedGroup { .. } => codes::structural::UNTERMINATED_GROUP,
            Self::NestingTooDeep { .. } => codes::structural::NESTING_TOO_DEEP,
            Self::MissingPropertyName { .. } => codes::grammatical::MISSING_PROPERTY_NAME,
            Self::MissingPropertyValue { .. } => codes::grammatical::MISSING_PROPERTY_VALUE,
            Self::MissingArgumentValue { .. } => codes::grammatical::MISSING_ARGUMENT_VALUE,
            Self::MissingGroupName { .. } => codes::grammatical::MISSING_GROUP_NAME,
            Self::MisplacedConcurrencyMarker { .. } => {
                codes::grammatical::MISPLACED_CONCURRENCY_MARKER
            }
            Self::MissingRedirectTarget { .. } => codes::grammatical::MISSING_REDIRECT_TARGET,
            Self::UnexpectedCharacter { .. } => codes::grammatical::UNEXPECTED_CHARACTER,
            Self::InvalidPlanReference { .. } => codes::grammatical::INVALID_PLAN_REFERENCE,
            Self::InternalParserError { .. } => codes::system::INTERNAL_ERROR,
        }
    }

    /// Character offset of the failure, when it concerns one
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::EmptyInput | Self::InputTooLarge { .. } | Self::InternalParserError { .. } => {
                None
            }
            Self::UnterminatedQuote { offset }
            | Self::UnterminatedGroup { offset, .. }
            | Self::NestingTooDeep { offset, .. }
            | Self::MissingPropertyName { offset }
            | Self::MissingPropertyValue { offset, .. }
            | Self::MissingArgumentValue { offset, .. }
            | Self::MissingGroupName { offset }
            | Self::MisplacedConcurrencyMarker { offset }
            | Self::MissingRedirectTarget { offset }
            | Self::UnexpectedCharacter { offset, .. }
            | Self::InvalidPlanReference { offset, .. } => Some(*offset),
        }
    }

    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.error_code().as_str()).as_str()
    }

    pub fn category(&self) -> &'static str {
        codes::get_category(self.error_code().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_messages() {
        assert_eq!(
            ParseError::missing_property_name(7).to_string(),
            "Property is missing name at offset 7."
        );
        assert_eq!(
            ParseError::missing_property_value("max-failed-servers", 20).to_string(),
            "Property 'max-failed-servers' is missing value at offset 20."
        );
    }

    #[test]
    fn test_error_code_and_offset() {
        let error = ParseError::unterminated_group('[', 4);
        assert_eq!(error.error_code(), codes::structural::UNTERMINATED_GROUP);
        assert_eq!(error.offset(), Some(4));
        assert_eq!(error.category(), "Structural");

        assert_eq!(ParseError::EmptyInput.offset(), None);
        assert_eq!(ParseError::EmptyInput.error_code().as_str(), "E001");
    }
}
