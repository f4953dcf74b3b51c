//! Assembles an `OperationRequestAddress` from address state events

use crate::grammar::ast::OperationRequestAddress;
use crate::grammar::ids::StateId;
use crate::log_debug;
use crate::parsing::{ParseResult, ParsingCallbackHandler, ParsingCursor};

const PARENT_NODE: &str = "..";
const CURRENT_NODE: &str = ".";
const NODE_TYPE: &str = ".type";

/// Builds on top of a prefix address, the way a shell resolves paths
/// against its current node
#[derive(Debug, Default)]
pub struct AddressBuilder {
    address: OperationRequestAddress,
    node_type: String,
    node_name: Option<String>,
    in_node: bool,
    node_seen: bool,
}

impl AddressBuilder {
    pub fn new(prefix: Option<&OperationRequestAddress>) -> Self {
        Self {
            address: prefix.cloned().unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn address(&self) -> &OperationRequestAddress {
        &self.address
    }

    pub fn into_address(self) -> OperationRequestAddress {
        self.address
    }

    fn finish_node(&mut self) {
        let node_type = std::mem::take(&mut self.node_type);
        match self.node_name.take() {
            Some(name) if name.is_empty() => self.address.to_node_type(&node_type),
            Some(name) => self.address.to_node(&node_type, &name),
            None => match node_type.as_str() {
                "" | CURRENT_NODE => {}
                PARENT_NODE => self.address.to_parent_node(),
                NODE_TYPE => self.address.to_last_node_type(),
                _ => {
                    if !self.address.to_node_name(&node_type) {
                        self.address.to_node_type(&node_type);
                    }
                }
            },
        }
    }
}

impl ParsingCallbackHandler for AddressBuilder {
    fn entered_state(&mut self, cursor: &ParsingCursor<'_>) -> ParseResult<()> {
        match cursor.state() {
            Some(StateId::Address) => self.node_seen = false,
            Some(StateId::NodeSeparator) => {
                // a leading slash is the root
                if !self.node_seen {
                    self.address.reset();
                    self.node_seen = true;
                }
            }
            Some(StateId::Node) => {
                self.in_node = true;
                self.node_seen = true;
                self.node_type.clear();
                self.node_name = None;
            }
            Some(StateId::NodeTypeNameSeparator) => match &mut self.node_name {
                Some(name) => name.push('='),
                None => self.node_name = Some(String::new()),
            },
            _ => {}
        }
        Ok(())
    }

    fn leaving_state(&mut self, cursor: &ParsingCursor<'_>) -> ParseResult<()> {
        match cursor.state() {
            Some(StateId::Node) => {
                self.finish_node();
                self.in_node = false;
            }
            Some(StateId::Address) => {
                log_debug!("Address parsed", "address" => self.address);
            }
            _ => {}
        }
        Ok(())
    }

    fn character(&mut self, cursor: &ParsingCursor<'_>) -> ParseResult<()> {
        if !self.in_node {
            return Ok(());
        }
        if let Some(ch) = cursor.character() {
            match &mut self.node_name {
                Some(name) => name.push(ch),
                None => self.node_type.push(ch),
            }
        }
        Ok(())
    }
}
