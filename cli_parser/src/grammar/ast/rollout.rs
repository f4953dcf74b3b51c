//! Rollout plan header output nodes

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// === MODEL KEYS ===

pub const ROLLOUT_PLAN: &str = "rollout-plan";
pub const IN_SERIES: &str = "in-series";
pub const SERVER_GROUP: &str = "server-group";
pub const CONCURRENT_GROUPS: &str = "concurrent-groups";

// === PROPERTIES ===

/// `name=value` pair; bare names carry the value `"true"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloutProperty {
    pub name: String,
    pub value: String,
    /// Character offset of the name
    pub offset: usize,
}

impl RolloutProperty {
    pub fn new(name: impl Into<String>, value: impl Into<String>, offset: usize) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            offset,
        }
    }
}

/// Characters that end a property value unless it is quoted
const VALUE_DELIMITERS: &str = ",;()}=\"\\";

/// Value as it has to be written to read back unchanged
pub(crate) fn property_value_text(value: &str) -> String {
    let plain = !value.is_empty()
        && !value
            .chars()
            .any(|ch| ch.is_whitespace() || VALUE_DELIMITERS.contains(ch));
    if plain {
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

fn properties_to_model(properties: &[RolloutProperty]) -> Value {
    if properties.is_empty() {
        return Value::Null;
    }
    let mut map = Map::new();
    for property in properties {
        map.insert(property.name.clone(), Value::String(property.value.clone()));
    }
    Value::Object(map)
}

fn keyed(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

// === GROUPS ===

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SingleRolloutPlanGroup {
    pub name: String,
    pub properties: Vec<RolloutProperty>,
}

impl SingleRolloutPlanGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn add_property(&mut self, property: RolloutProperty) {
        self.properties.push(property);
    }

    /// First value recorded for `name`
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|property| property.name == name)
            .map(|property| property.value.as_str())
    }
}

/// Groups that roll out together, in the order written
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConcurrentRolloutPlanGroup {
    pub groups: Vec<SingleRolloutPlanGroup>,
}

impl ConcurrentRolloutPlanGroup {
    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|group| group.name.as_str()).collect()
    }
}

/// One step of the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolloutPlanEntry {
    Single(SingleRolloutPlanGroup),
    Concurrent(ConcurrentRolloutPlanGroup),
}

impl RolloutPlanEntry {
    pub fn group_names(&self) -> Vec<&str> {
        match self {
            Self::Single(group) => vec![group.name.as_str()],
            Self::Concurrent(cluster) => cluster.group_names(),
        }
    }

    pub fn is_concurrent(&self) -> bool {
        matches!(self, Self::Concurrent(_))
    }

    fn to_model(&self) -> Value {
        match self {
            Self::Single(group) => {
                let mut groups = Map::new();
                groups.insert(group.name.clone(), properties_to_model(&group.properties));
                keyed(SERVER_GROUP, Value::Object(groups))
            }
            Self::Concurrent(cluster) => {
                let mut groups = Map::new();
                for group in &cluster.groups {
                    groups.insert(group.name.clone(), properties_to_model(&group.properties));
                }
                keyed(CONCURRENT_GROUPS, Value::Object(groups))
            }
        }
    }
}

// === HEADER ===

/// Parsed value of a rollout plan operation header
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedRolloutPlanHeader {
    /// Name of a stored plan, when the header refers to one
    pub plan_ref: Option<String>,
    pub entries: Vec<RolloutPlanEntry>,
    pub properties: Vec<RolloutProperty>,
}

impl ParsedRolloutPlanHeader {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|property| property.name == name)
            .map(|property| property.value.as_str())
    }

    pub fn has_groups(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Operation header model; plan references need the server to resolve
    pub fn to_model(&self) -> Option<Value> {
        if self.plan_ref.is_some() {
            return None;
        }

        let mut plan = Map::new();
        if !self.entries.is_empty() {
            let series: Vec<Value> = self.entries.iter().map(RolloutPlanEntry::to_model).collect();
            plan.insert(IN_SERIES.to_string(), Value::Array(series));
        }
        for property in &self.properties {
            plan.insert(property.name.clone(), Value::String(property.value.clone()));
        }

        Some(keyed(ROLLOUT_PLAN, Value::Object(plan)))
    }
}

/// `a(x=1)^b,c`
pub(crate) struct GroupList<'a>(pub(crate) &'a [RolloutPlanEntry]);

impl fmt::Display for GroupList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            let groups = match entry {
                RolloutPlanEntry::Single(group) => std::slice::from_ref(group),
                RolloutPlanEntry::Concurrent(cluster) => cluster.groups.as_slice(),
            };
            for (j, group) in groups.iter().enumerate() {
                if j > 0 {
                    f.write_str("^")?;
                }
                f.write_str(&group.name)?;
                if !group.properties.is_empty() {
                    let props: Vec<String> = group
                        .properties
                        .iter()
                        .map(|p| format!("{}={}", p.name, property_value_text(&p.value)))
                        .collect();
                    write!(f, "({})", props.join(","))?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for ParsedRolloutPlanHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(plan_ref) = &self.plan_ref {
            write!(f, "id={}", plan_ref)?;
        } else {
            write!(f, "{{rollout {}}}", GroupList(&self.entries))?;
        }
        for property in &self.properties {
            write!(f, ";{}={}", property.name, property_value_text(&property.value))?;
        }
        Ok(())
    }
}
