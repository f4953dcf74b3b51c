//! Assembles a `ParsedCommandLine` from command state events

use super::address::AddressBuilder;
use super::rollout::RolloutPlanBuilder;
use crate::grammar::ast::{OperationRequestAddress, ParsedArgument, ParsedCommandLine};
use crate::grammar::ids::StateId;
use crate::log_debug;
use crate::parsing::{ParseError, ParseResult, ParsingCallbackHandler, ParsingCursor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    OperationName,
    ArgumentName,
    ArgumentValue,
    RedirectTarget,
}

#[derive(Debug, Default)]
pub struct CommandLineBuilder {
    address: AddressBuilder,
    has_address: bool,
    operation_name: Option<String>,
    arguments: Vec<ParsedArgument>,
    redirect: Option<String>,
    headers: RolloutPlanBuilder,
    in_headers: bool,
    has_headers: bool,

    field: Option<Field>,
    buffer: String,
    argument_name: String,
    argument_value: Option<String>,
    argument_offset: usize,
    separator_offset: usize,
}

impl CommandLineBuilder {
    /// `prefix` is the address relative paths resolve against
    pub fn new(prefix: Option<&OperationRequestAddress>) -> Self {
        Self {
            address: AddressBuilder::new(prefix),
            ..Self::default()
        }
    }

    pub fn arguments(&self) -> &[ParsedArgument] {
        &self.arguments
    }

    pub fn into_command_line(self) -> ParseResult<ParsedCommandLine> {
        let headers = if self.has_headers {
            Some(self.headers.into_header()?)
        } else {
            None
        };
        Ok(ParsedCommandLine {
            address: self.has_address.then(|| self.address.into_address()),
            operation_name: self.operation_name,
            arguments: self.arguments,
            headers,
            redirect: self.redirect,
        })
    }

    pub fn into_arguments(self) -> Vec<ParsedArgument> {
        self.arguments
    }

    fn start_field(&mut self, field: Field) {
        self.field = Some(field);
        self.buffer.clear();
    }
}

impl ParsingCallbackHandler for CommandLineBuilder {
    fn entered_state(&mut self, cursor: &ParsingCursor<'_>) -> ParseResult<()> {
        self.address.entered_state(cursor)?;
        if cursor.state() == Some(StateId::OperationHeaders) {
            self.in_headers = true;
            self.has_headers = true;
        }
        if self.in_headers {
            self.headers.entered_state(cursor)?;
        }

        match cursor.state() {
            // a leading ':' addresses the current node
            Some(StateId::Address) | Some(StateId::AddressCommandSeparator) => {
                self.has_address = true
            }
            Some(StateId::OperationName) => self.start_field(Field::OperationName),
            Some(StateId::Argument) => {
                self.start_field(Field::ArgumentName);
                self.argument_value = None;
                self.argument_offset = cursor.location();
            }
            Some(StateId::ArgumentValueSeparator) => {
                self.argument_name = self.buffer.trim().to_string();
                if self.argument_name.is_empty() {
                    return Err(ParseError::unexpected_character('=', cursor.location()));
                }
                self.field = None;
                self.separator_offset = cursor.location();
            }
            Some(StateId::ArgumentValue) => self.start_field(Field::ArgumentValue),
            Some(StateId::RedirectTarget) => self.start_field(Field::RedirectTarget),
            _ => {}
        }
        Ok(())
    }

    fn leaving_state(&mut self, cursor: &ParsingCursor<'_>) -> ParseResult<()> {
        self.address.leaving_state(cursor)?;
        if self.in_headers {
            self.headers.leaving_state(cursor)?;
            if cursor.state() == Some(StateId::OperationHeaders) {
                self.in_headers = false;
            }
        }

        match cursor.state() {
            Some(StateId::OperationName) => {
                let name = std::mem::take(&mut self.buffer);
                self.operation_name = (!name.is_empty()).then_some(name);
                self.field = None;
            }
            Some(StateId::ArgumentValue) => {
                self.argument_value = Some(std::mem::take(&mut self.buffer));
                self.field = None;
            }
            Some(StateId::ArgumentValueSeparator) => {
                if self.argument_value.is_none() {
                    return Err(ParseError::missing_argument_value(
                        &self.argument_name,
                        self.separator_offset,
                    ));
                }
            }
            Some(StateId::Argument) => {
                // a flag has no separator, so its name is still buffered
                if self.field == Some(Field::ArgumentName) {
                    self.argument_name = self.buffer.trim().to_string();
                }
                self.field = None;
                if self.argument_name.is_empty() {
                    return Ok(());
                }
                self.arguments.push(ParsedArgument::new(
                    std::mem::take(&mut self.argument_name),
                    self.argument_value.take(),
                    self.argument_offset,
                ));
            }
            Some(StateId::RedirectTarget) => {
                let target = std::mem::take(&mut self.buffer);
                self.field = None;
                if target.is_empty() {
                    return Err(ParseError::missing_redirect_target(cursor.frame_start()));
                }
                self.redirect = Some(target);
            }
            Some(StateId::Command) => {
                log_debug!("Command line parsed",
                    "operation" => self.operation_name.as_deref().unwrap_or("<none>"),
                    "arguments" => self.arguments.len()
                );
            }
            _ => {}
        }
        Ok(())
    }

    fn character(&mut self, cursor: &ParsingCursor<'_>) -> ParseResult<()> {
        self.address.character(cursor)?;
        if self.in_headers {
            self.headers.character(cursor)?;
        }

        if self.field.is_some() {
            if let Some(ch) = cursor.character() {
                self.buffer.push(ch);
            }
        }
        Ok(())
    }
}
