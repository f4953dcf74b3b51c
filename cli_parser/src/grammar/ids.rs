//! Identifiers for every state in the command, address and rollout graphs

use std::fmt;

/// Names one flyweight state; doubles as the index into a `StateGraph`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateId {
    // Shared value-level states
    Escape,
    QuoteIncluded,
    QuoteStripped,
    BracketGroup,
    ParenGroup,
    BraceGroup,
    WhitespaceSkip,

    // Command line
    Command,
    OperationName,
    AddressCommandSeparator,
    ArgumentList,
    Argument,
    ArgumentValueSeparator,
    ArgumentValue,
    Redirect,
    RedirectTarget,
    OperationHeaders,

    // Address path
    Address,
    Node,
    NodeTypeNameSeparator,
    NodeSeparator,

    // Rollout plan header
    HeaderValue,
    PlanRef,
    PlanBody,
    GroupList,
    ListItemSeparator,
    ConcurrencyMarker,
    ServerGroup,
    ServerGroupName,
    GroupProperties,
    HeaderProperties,
    Property,
    PropertyValue,
    PropertyValueText,
}

impl StateId {
    pub const COUNT: usize = StateId::PropertyValueText as usize + 1;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            StateId::Escape => "ESCAPE",
            StateId::QuoteIncluded => "QUOTES_INCLUDED",
            StateId::QuoteStripped => "QUOTES_STRIPPED",
            StateId::BracketGroup => "BRACKETS",
            StateId::ParenGroup => "PARENTHESIS",
            StateId::BraceGroup => "BRACES",
            StateId::WhitespaceSkip => "WS",
            StateId::Command => "CMD",
            StateId::OperationName => "OP_NAME",
            StateId::AddressCommandSeparator => "ADDR_CMD_SEP",
            StateId::ArgumentList => "ARG_LIST",
            StateId::Argument => "ARG",
            StateId::ArgumentValueSeparator => "ARG_VALUE_SEP",
            StateId::ArgumentValue => "ARG_VALUE",
            StateId::Redirect => "REDIRECT",
            StateId::RedirectTarget => "REDIRECT_TARGET",
            StateId::OperationHeaders => "HEADERS",
            StateId::Address => "ADDR",
            StateId::Node => "NODE",
            StateId::NodeTypeNameSeparator => "NODE_TYPE_NAME_SEP",
            StateId::NodeSeparator => "NODE_SEP",
            StateId::HeaderValue => "HEADER_VALUE",
            StateId::PlanRef => "PLAN_REF",
            StateId::PlanBody => "PLAN",
            StateId::GroupList => "SG_LIST",
            StateId::ListItemSeparator => "ITEM_SEP",
            StateId::ConcurrencyMarker => "CONCURRENT",
            StateId::ServerGroup => "SG",
            StateId::ServerGroupName => "SG_NAME",
            StateId::GroupProperties => "SG_PROPS",
            StateId::HeaderProperties => "HEADER_PROPS",
            StateId::Property => "PROP",
            StateId::PropertyValue => "PROP_VALUE",
            StateId::PropertyValueText => "PROP_TEXT",
        }
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
