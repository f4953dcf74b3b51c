//! Assembles a `ParsedRolloutPlanHeader` from rollout state events
//!
//! Groups are held back as a pending entry until the next separator shows
//! whether the following group joins them concurrently (`^`) or starts a
//! new step (`,`).

use crate::grammar::ast::{
    ConcurrentRolloutPlanGroup, ParsedRolloutPlanHeader, RolloutPlanEntry, RolloutProperty,
    SingleRolloutPlanGroup,
};
use crate::grammar::ids::StateId;
use crate::log_debug;
use crate::parsing::{ParseError, ParseResult, ParsingCallbackHandler, ParsingCursor};

const PLAN_ID: &str = "id";
const FLAG_VALUE: &str = "true";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    GroupName,
    PropertyName,
    PropertyValue,
}

#[derive(Debug, Default)]
pub struct RolloutPlanBuilder {
    header: ParsedRolloutPlanHeader,
    complete: Option<ParsedRolloutPlanHeader>,

    field: Option<Field>,
    buffer: String,

    group: Option<SingleRolloutPlanGroup>,
    pending: Option<RolloutPlanEntry>,
    concurrent_next: bool,
    group_expected: bool,
    in_group_properties: bool,
    property_expected: bool,

    property_name: String,
    property_value: Option<String>,
    property_offset: usize,
}

impl RolloutPlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished header, once the header value or header block has been left
    pub fn header(&self) -> Option<&ParsedRolloutPlanHeader> {
        self.complete.as_ref()
    }

    pub fn into_header(self) -> ParseResult<ParsedRolloutPlanHeader> {
        self.complete
            .ok_or_else(|| ParseError::internal_parser_error("rollout plan header was not completed"))
    }

    fn start_field(&mut self, field: Field) {
        self.field = Some(field);
        self.buffer.clear();
    }

    fn flush_pending(&mut self) {
        if let Some(entry) = self.pending.take() {
            self.header.entries.push(entry);
        }
    }

    fn complete_group(&mut self, group: SingleRolloutPlanGroup) {
        if self.concurrent_next {
            self.concurrent_next = false;
            self.pending = match self.pending.take() {
                Some(RolloutPlanEntry::Single(previous)) => {
                    Some(RolloutPlanEntry::Concurrent(ConcurrentRolloutPlanGroup {
                        groups: vec![previous, group],
                    }))
                }
                Some(RolloutPlanEntry::Concurrent(mut cluster)) => {
                    cluster.groups.push(group);
                    Some(RolloutPlanEntry::Concurrent(cluster))
                }
                None => Some(RolloutPlanEntry::Single(group)),
            };
        } else {
            self.flush_pending();
            self.pending = Some(RolloutPlanEntry::Single(group));
        }
        self.group_expected = false;
    }

    fn group_has_no_properties(&self) -> bool {
        self.group
            .as_ref()
            .map_or(true, |group| group.properties.is_empty())
    }

    fn finish_property(&mut self, cursor: &ParsingCursor<'_>, plan_ref: bool) -> ParseResult<()> {
        // a name with no value is still buffered
        if self.field == Some(Field::PropertyName) {
            self.property_name = self.buffer.trim().to_string();
        }
        self.field = None;

        let name = std::mem::take(&mut self.property_name);
        let value = self.property_value.take();
        if name.is_empty() {
            return Err(ParseError::missing_property_name(cursor.location()));
        }

        if plan_ref {
            self.header.plan_ref = match value {
                None => Some(name),
                Some(value) if name == PLAN_ID => Some(value),
                Some(_) => {
                    return Err(ParseError::invalid_plan_reference(
                        &name,
                        self.property_offset,
                    ))
                }
            };
            return Ok(());
        }

        let property = RolloutProperty::new(
            name,
            value.unwrap_or_else(|| FLAG_VALUE.to_string()),
            self.property_offset,
        );
        match (&mut self.group, self.in_group_properties) {
            (Some(group), true) => group.add_property(property),
            _ => self.header.properties.push(property),
        }
        Ok(())
    }
}

impl ParsingCallbackHandler for RolloutPlanBuilder {
    fn entered_state(&mut self, cursor: &ParsingCursor<'_>) -> ParseResult<()> {
        match cursor.state() {
            Some(StateId::HeaderValue) | Some(StateId::OperationHeaders) => {
                self.header = ParsedRolloutPlanHeader::default();
                self.complete = None;
                self.pending = None;
                self.concurrent_next = false;
            }
            Some(StateId::GroupList) => self.group_expected = true,
            Some(StateId::ServerGroup) => {
                self.group = Some(SingleRolloutPlanGroup::default());
            }
            Some(StateId::ServerGroupName) => self.start_field(Field::GroupName),
            Some(StateId::GroupProperties) => {
                self.in_group_properties = true;
                self.property_expected = false;
            }
            Some(StateId::ListItemSeparator) if self.in_group_properties => {
                if self.property_expected || self.group_has_no_properties() {
                    return Err(ParseError::missing_property_name(cursor.location()));
                }
                self.property_expected = true;
            }
            Some(StateId::ListItemSeparator) => {
                if self.group_expected {
                    return Err(ParseError::missing_group_name(cursor.location()));
                }
                self.group_expected = true;
            }
            Some(StateId::ConcurrencyMarker) => {
                if self.pending.is_none() || self.group_expected {
                    return Err(ParseError::misplaced_concurrency_marker(cursor.location()));
                }
                self.concurrent_next = true;
            }
            Some(StateId::Property) | Some(StateId::PlanRef) => {
                self.property_expected = false;
                self.start_field(Field::PropertyName);
                self.property_value = None;
                self.property_offset = cursor.location();
            }
            Some(StateId::PropertyValue) => {
                self.property_name = self.buffer.trim().to_string();
                self.field = None;
                if self.property_name.is_empty() {
                    return Err(ParseError::missing_property_name(cursor.location()));
                }
            }
            Some(StateId::PropertyValueText) => self.start_field(Field::PropertyValue),
            _ => {}
        }
        Ok(())
    }

    fn leaving_state(&mut self, cursor: &ParsingCursor<'_>) -> ParseResult<()> {
        match cursor.state() {
            Some(StateId::ServerGroupName) => {
                let name = self.buffer.trim().to_string();
                self.field = None;
                if name.is_empty() {
                    return Err(ParseError::missing_group_name(cursor.frame_start()));
                }
                if let Some(group) = &mut self.group {
                    group.name = name;
                }
            }
            Some(StateId::GroupProperties) => {
                if self.property_expected {
                    return Err(ParseError::missing_property_name(cursor.location()));
                }
                self.in_group_properties = false;
            }
            Some(StateId::ServerGroup) => {
                if let Some(group) = self.group.take() {
                    self.complete_group(group);
                }
            }
            Some(StateId::ConcurrencyMarker) => {
                if self.concurrent_next {
                    return Err(ParseError::misplaced_concurrency_marker(cursor.frame_start()));
                }
            }
            Some(StateId::GroupList) => {
                if self.group_expected {
                    return Err(ParseError::missing_group_name(cursor.location()));
                }
                self.flush_pending();
            }
            Some(StateId::PropertyValueText) => {
                self.property_value = Some(std::mem::take(&mut self.buffer));
                self.field = None;
            }
            Some(StateId::PropertyValue) => {
                let blank = self
                    .property_value
                    .as_deref()
                    .map_or(true, |value| value.trim().is_empty());
                if blank {
                    return Err(ParseError::missing_property_value(
                        &self.property_name,
                        cursor.location(),
                    ));
                }
            }
            Some(StateId::Property) => self.finish_property(cursor, false)?,
            Some(StateId::PlanRef) => self.finish_property(cursor, true)?,
            Some(StateId::HeaderValue) | Some(StateId::OperationHeaders) => {
                self.flush_pending();
                let header = std::mem::take(&mut self.header);
                log_debug!("Rollout plan parsed",
                    "entries" => header.entries.len(),
                    "properties" => header.properties.len()
                );
                self.complete = Some(header);
            }
            _ => {}
        }
        Ok(())
    }

    fn character(&mut self, cursor: &ParsingCursor<'_>) -> ParseResult<()> {
        if self.field.is_some() {
            if let Some(ch) = cursor.character() {
                self.buffer.push(ch);
            }
        }
        Ok(())
    }
}
