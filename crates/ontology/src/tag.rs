use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::condition::Condition;
use crate::definition::TagTypeDefinition;
use crate::error::OntologyError;
use crate::registry::TagTypeRegistry;
use crate::value::TagValue;

/// A concrete tag attached to one stored item.
///
/// The name is resolved against a [`TagTypeRegistry`] only when the tag is
/// validated or evaluated, so tags with unknown names load fine and behave
/// as `string` tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagInstance {
    pub name: String,
    pub condition: Condition,
    #[serde(default)]
    pub value: TagValue,
}

/// Wire form produced by [`TagInstance::to_wire`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireTag {
    pub name: String,
    pub condition: String,
    pub value: JsonValue,
}

impl TagInstance {
    pub fn new(
        name: impl Into<String>,
        condition: impl Into<Condition>,
        value: impl Into<TagValue>,
    ) -> Self {
        Self {
            name: name.into(),
            condition: condition.into(),
            value: value.into(),
        }
    }

    pub fn definition<'r>(&self, registry: &'r TagTypeRegistry) -> &'r TagTypeDefinition {
        registry.lookup(&self.name)
    }

    pub fn is_valid(&self, registry: &TagTypeRegistry) -> bool {
        self.definition(registry)
            .validate(&self.value, &self.condition)
    }

    /// Change the condition, reshaping the value when the range-ness of the
    /// condition changes. Entering `between` resets to an empty pair of the
    /// type's range kind; leaving it resets to empty text.
    pub fn set_condition(&mut self, condition: impl Into<Condition>, registry: &TagTypeRegistry) {
        let condition = condition.into();
        if condition.is_range() != self.condition.is_range() {
            self.value = self.definition(registry).empty_value(&condition);
        }
        self.condition = condition;
    }

    pub fn set_value(&mut self, value: impl Into<TagValue>) {
        self.value = value.into();
    }

    pub fn to_wire(&self, registry: &TagTypeRegistry) -> WireTag {
        WireTag {
            name: self.name.clone(),
            condition: self.condition.to_string(),
            value: self.definition(registry).serialize(&self.value),
        }
    }

    pub fn from_wire(wire: &WireTag, registry: &TagTypeRegistry) -> Result<Self, OntologyError> {
        let value = registry.lookup(&wire.name).deserialize(&wire.value)?;
        Ok(Self {
            name: wire.name.clone(),
            condition: Condition::from(wire.condition.as_str()),
            value,
        })
    }
}
