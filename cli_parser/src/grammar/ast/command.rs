//! Command line output nodes: address path, arguments, parsed line

use super::rollout::ParsedRolloutPlanHeader;
use serde::{Deserialize, Serialize};
use std::fmt;

// === ADDRESS ===

/// One `type=name` step of an address; `name` is absent while the path ends on a type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressNode {
    pub node_type: String,
    pub name: Option<String>,
}

impl AddressNode {
    pub fn new(node_type: impl Into<String>, name: Option<String>) -> Self {
        Self {
            node_type: node_type.into(),
            name,
        }
    }
}

/// Management resource address, root first
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperationRequestAddress {
    nodes: Vec<AddressNode>,
}

impl OperationRequestAddress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[AddressNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Reset to the root
    pub fn reset(&mut self) {
        self.nodes.clear();
    }

    pub fn to_node(&mut self, node_type: &str, name: &str) {
        self.nodes
            .push(AddressNode::new(node_type, Some(name.to_string())));
    }

    /// Append a type with no name yet
    pub fn to_node_type(&mut self, node_type: &str) {
        self.nodes.push(AddressNode::new(node_type, None));
    }

    /// Complete the trailing type with `name`; returns false if the address
    /// does not end on a type
    pub fn to_node_name(&mut self, name: &str) -> bool {
        match self.nodes.last_mut() {
            Some(node) if node.name.is_none() => {
                node.name = Some(name.to_string());
                true
            }
            _ => false,
        }
    }

    /// Drop the name of the last node, keeping its type
    pub fn to_last_node_type(&mut self) {
        if let Some(node) = self.nodes.last_mut() {
            node.name = None;
        }
    }

    pub fn to_parent_node(&mut self) {
        self.nodes.pop();
    }

    pub fn ends_on_type(&self) -> bool {
        self.nodes
            .last()
            .map_or(false, |node| node.name.is_none())
    }
}

impl fmt::Display for OperationRequestAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nodes.is_empty() {
            return f.write_str("/");
        }
        for node in &self.nodes {
            write!(f, "/{}", node.node_type)?;
            if let Some(name) = &node.name {
                write!(f, "={}", name)?;
            }
        }
        Ok(())
    }
}

// === ARGUMENTS ===

/// `name[=value]`; no value means a presence flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedArgument {
    pub name: String,
    pub value: Option<String>,
    /// Character offset of the name
    pub offset: usize,
}

impl ParsedArgument {
    pub fn new(name: impl Into<String>, value: Option<String>, offset: usize) -> Self {
        Self {
            name: name.into(),
            value,
            offset,
        }
    }

    pub fn is_flag(&self) -> bool {
        self.value.is_none()
    }
}

// === COMMAND LINE ===

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedCommandLine {
    pub address: Option<OperationRequestAddress>,
    pub operation_name: Option<String>,
    pub arguments: Vec<ParsedArgument>,
    /// Braced operation headers, rollout plan included
    pub headers: Option<ParsedRolloutPlanHeader>,
    /// Output redirect target
    pub redirect: Option<String>,
}

impl ParsedCommandLine {
    pub fn argument(&self, name: &str) -> Option<&ParsedArgument> {
        self.arguments.iter().find(|argument| argument.name == name)
    }

    pub fn has_argument(&self, name: &str) -> bool {
        self.argument(name).is_some()
    }

    /// Value of the first argument called `name`
    pub fn argument_value(&self, name: &str) -> Option<&str> {
        self.argument(name)
            .and_then(|argument| argument.value.as_deref())
    }
}
