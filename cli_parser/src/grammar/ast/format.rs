//! Command line serialization
//!
//! Arguments follow the operation name with no wrapping delimiters and are
//! separated by whitespace.

use super::command::{ParsedArgument, ParsedCommandLine};
use super::rollout::{property_value_text, GroupList, ParsedRolloutPlanHeader};

const ROLLOUT_KEYWORD: &str = "rollout";

/// Characters a writer places between the parts of a command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFormat {
    pub address_operation_separator: char,
    pub name_value_separator: char,
    pub argument_separator: char,
    pub redirect_marker: char,
    pub header_list_start: char,
    pub header_list_end: char,
    pub header_separator: char,
}

pub const COMMAND_FORMAT: CommandFormat = CommandFormat {
    address_operation_separator: ':',
    name_value_separator: '=',
    argument_separator: ' ',
    redirect_marker: '>',
    header_list_start: '{',
    header_list_end: '}',
    header_separator: ';',
};

impl Default for CommandFormat {
    fn default() -> Self {
        COMMAND_FORMAT
    }
}

impl CommandFormat {
    pub fn write_argument(&self, argument: &ParsedArgument, out: &mut String) {
        out.push_str(&escape_name(&argument.name));
        if let Some(value) = &argument.value {
            out.push(self.name_value_separator);
            out.push_str(&quote_if_needed(value));
        }
    }

    /// `{rollout <plan>;name=value}`, the form a header block reads back from
    pub fn write_headers(&self, header: &ParsedRolloutPlanHeader, out: &mut String) {
        let mut parts = Vec::new();
        if let Some(plan_ref) = &header.plan_ref {
            parts.push(format!("{} id={}", ROLLOUT_KEYWORD, property_value_text(plan_ref)));
        } else if header.has_groups() {
            parts.push(format!("{} {}", ROLLOUT_KEYWORD, GroupList(&header.entries)));
        }
        for property in &header.properties {
            parts.push(format!(
                "{}{}{}",
                property.name,
                self.name_value_separator,
                property_value_text(&property.value)
            ));
        }

        out.push(self.header_list_start);
        out.push_str(&parts.join(&self.header_separator.to_string()));
        out.push(self.header_list_end);
    }
}

/// Values already wrapped in quotes or brackets are written as parsed
fn is_enclosed(value: &str) -> bool {
    let first = value.chars().next();
    let last = value.chars().last();
    matches!(
        (first, last),
        (Some('"'), Some('"')) | (Some('['), Some(']')) | (Some('('), Some(')')) | (Some('{'), Some('}'))
    ) && value.chars().count() > 1
}

fn quote_if_needed(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value.chars().any(|ch| ch.is_whitespace() || ch == '"');
    if !needs_quotes || is_enclosed(value) {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

/// Names may not contain an unescaped separator or whitespace
fn escape_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch == '=' || ch == '\\' || ch.is_whitespace() {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

impl ParsedCommandLine {
    /// Write the line back in command syntax
    pub fn to_command_line(&self, format: &CommandFormat) -> String {
        let mut out = String::new();

        if let Some(address) = &self.address {
            out.push_str(&address.to_string());
        }
        if let Some(operation) = &self.operation_name {
            if self.address.is_some() {
                out.push(format.address_operation_separator);
            }
            out.push_str(operation);
        }
        for argument in &self.arguments {
            if !out.is_empty() {
                out.push(format.argument_separator);
            }
            format.write_argument(argument, &mut out);
        }
        if let Some(headers) = &self.headers {
            if !self.arguments.is_empty() {
                out.push(format.argument_separator);
            }
            format.write_headers(headers, &mut out);
        }
        if let Some(target) = &self.redirect {
            if !out.is_empty() {
                out.push(format.argument_separator);
            }
            out.push(format.redirect_marker);
            out.push(format.argument_separator);
            out.push_str(&quote_if_needed(target));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ast::{OperationRequestAddress, RolloutProperty};

    #[test]
    fn test_write_full_line() {
        let mut address = OperationRequestAddress::new();
        address.to_node("subsystem", "logging");
        let line = ParsedCommandLine {
            address: Some(address),
            operation_name: Some("read-resource".to_string()),
            arguments: vec![
                ParsedArgument::new("recursive", None, 0),
                ParsedArgument::new("name", Some("a b".to_string()), 0),
                ParsedArgument::new("list", Some("[a, b]".to_string()), 0),
            ],
            headers: None,
            redirect: Some("out.txt".to_string()),
        };

        assert_eq!(
            line.to_command_line(&COMMAND_FORMAT),
            "/subsystem=logging:read-resource recursive name=\"a b\" list=[a, b] > out.txt"
        );
    }

    #[test]
    fn test_quoting_rules() {
        assert_eq!(quote_if_needed("plain"), "plain");
        assert_eq!(quote_if_needed("\"kept as is\""), "\"kept as is\"");
        assert_eq!(quote_if_needed("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote_if_needed(""), "\"\"");
        assert_eq!(escape_name("a=b"), "a\\=b");
    }

    #[test]
    fn test_write_headers() {
        let mut header = ParsedRolloutPlanHeader::default();
        header
            .properties
            .push(RolloutProperty::new("blocking-timeout", "5", 0));
        let line = ParsedCommandLine {
            operation_name: Some("do".to_string()),
            headers: Some(header.clone()),
            ..Default::default()
        };
        assert_eq!(line.to_command_line(&COMMAND_FORMAT), "do{blocking-timeout=5}");

        header.plan_ref = Some("my plan".to_string());
        let mut out = String::new();
        COMMAND_FORMAT.write_headers(&header, &mut out);
        assert_eq!(out, "{rollout id=\"my plan\";blocking-timeout=5}");
    }
}
