use std::collections::HashSet;
use std::str::FromStr;

use papertrail_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata definition for a tracked business entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDefinition {
    logical_name: NonEmptyString,
    display_name: NonEmptyString,
}

impl EntityDefinition {
    /// Creates a new entity definition with validated fields.
    pub fn new(
        logical_name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            logical_name: NonEmptyString::new(logical_name)?,
            display_name: NonEmptyString::new(display_name)?,
        })
    }

    /// Returns the logical (stable) name.
    #[must_use]
    pub fn logical_name(&self) -> &NonEmptyString {
        &self.logical_name
    }

    /// Returns the display (human-friendly) name.
    #[must_use]
    pub fn display_name(&self) -> &NonEmptyString {
        &self.display_name
    }
}

/// Supported metadata field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// UTF-8 string field.
    Text,
    /// Numeric field.
    Number,
    /// Boolean field.
    Boolean,
    /// Time-of-day string field.
    Time,
    /// Date-only string field.
    Date,
    /// Date-time string field.
    DateTime,
    /// Arbitrary JSON field.
    Json,
    /// Many-to-one relation field.
    Relation,
    /// Secret-valued field whose contents are never audited.
    Secret,
}

impl FieldType {
    /// Returns a stable storage value for the field type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Time => "time",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Json => "json",
            Self::Relation => "relation",
            Self::Secret => "secret",
        }
    }
}

impl FromStr for FieldType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(Self::Text),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            "time" => Ok(Self::Time),
            "date" => Ok(Self::Date),
            "datetime" => Ok(Self::DateTime),
            "json" => Ok(Self::Json),
            "relation" => Ok(Self::Relation),
            "secret" => Ok(Self::Secret),
            _ => Err(AppError::Validation(format!(
                "unknown field type '{value}'"
            ))),
        }
    }
}

/// One key/label pair of an option set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSetItem {
    key: String,
    label: String,
}

impl OptionSetItem {
    /// Creates an option set item from a raw storage key and display label.
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }

    /// Returns the raw storage key.
    #[must_use]
    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }
}

/// Discrete value-to-label mapping attached to an enumerated field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
    items: Vec<OptionSetItem>,
}

impl OptionSet {
    /// Creates an option set from its items, rejecting empty and duplicate keys.
    pub fn new(items: Vec<OptionSetItem>) -> AppResult<Self> {
        if items.is_empty() {
            return Err(AppError::Validation(
                "option set must contain at least one item".to_owned(),
            ));
        }

        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.key().to_owned()) {
                return Err(AppError::Validation(format!(
                    "duplicate option set key '{}'",
                    item.key()
                )));
            }
        }

        Ok(Self { items })
    }

    /// Returns all items.
    #[must_use]
    pub fn items(&self) -> &[OptionSetItem] {
        &self.items
    }

    /// Normalizes a stored JSON value into a raw option key.
    ///
    /// String, number and boolean values map onto their string forms; other
    /// JSON shapes never match an option key.
    #[must_use]
    pub fn raw_key(value: &Value) -> Option<String> {
        match value {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    /// Looks up the label for a stored value, by raw key.
    #[must_use]
    pub fn label_for(&self, value: &Value) -> Option<&str> {
        let key = Self::raw_key(value)?;
        self.items
            .iter()
            .find(|item| item.key() == key)
            .map(OptionSetItem::label)
    }
}

/// Metadata definition for a single entity field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFieldDefinition {
    entity_logical_name: NonEmptyString,
    logical_name: NonEmptyString,
    display_name: NonEmptyString,
    field_type: FieldType,
    is_identifier: bool,
    never_persist: bool,
    option_set: Option<OptionSet>,
    relation_target_entity: Option<NonEmptyString>,
}

impl EntityFieldDefinition {
    /// Creates a validated metadata field definition.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        entity_logical_name: impl Into<String>,
        logical_name: impl Into<String>,
        display_name: impl Into<String>,
        field_type: FieldType,
        is_identifier: bool,
        never_persist: bool,
        option_set: Option<OptionSet>,
        relation_target_entity: Option<String>,
    ) -> AppResult<Self> {
        let relation_target_entity = relation_target_entity
            .map(NonEmptyString::new)
            .transpose()?;

        match (field_type, relation_target_entity.is_some()) {
            (FieldType::Relation, false) => {
                return Err(AppError::Validation(
                    "relation fields require relation_target_entity".to_owned(),
                ));
            }
            (FieldType::Relation, true) => {}
            (_, true) => {
                return Err(AppError::Validation(
                    "relation_target_entity is only allowed for relation fields".to_owned(),
                ));
            }
            (_, false) => {}
        }

        if option_set.is_some() && matches!(field_type, FieldType::Relation | FieldType::Secret) {
            return Err(AppError::Validation(format!(
                "option sets are not supported for {} fields",
                field_type.as_str()
            )));
        }

        Ok(Self {
            entity_logical_name: NonEmptyString::new(entity_logical_name)?,
            logical_name: NonEmptyString::new(logical_name)?,
            display_name: NonEmptyString::new(display_name)?,
            field_type,
            is_identifier,
            never_persist,
            option_set,
            relation_target_entity,
        })
    }

    /// Returns the field's parent entity logical name.
    #[must_use]
    pub fn entity_logical_name(&self) -> &NonEmptyString {
        &self.entity_logical_name
    }

    /// Returns the field logical name.
    #[must_use]
    pub fn logical_name(&self) -> &NonEmptyString {
        &self.logical_name
    }

    /// Returns the display name used as the field caption in messages.
    #[must_use]
    pub fn display_name(&self) -> &NonEmptyString {
        &self.display_name
    }

    /// Returns the field type.
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Returns whether the field is the primary identifier.
    #[must_use]
    pub fn is_identifier(&self) -> bool {
        self.is_identifier
    }

    /// Returns whether the field is excluded from persistence.
    #[must_use]
    pub fn never_persist(&self) -> bool {
        self.never_persist
    }

    /// Returns the discrete value-to-label mapping, if any.
    #[must_use]
    pub fn option_set(&self) -> Option<&OptionSet> {
        self.option_set.as_ref()
    }

    /// Returns relation target entity when field type is relation.
    #[must_use]
    pub fn relation_target_entity(&self) -> Option<&NonEmptyString> {
        self.relation_target_entity.as_ref()
    }
}

/// Entity schema consulted for classification and rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    entity: EntityDefinition,
    fields: Vec<EntityFieldDefinition>,
}

impl EntitySchema {
    /// Creates a new schema with invariant checks.
    pub fn new(entity: EntityDefinition, fields: Vec<EntityFieldDefinition>) -> AppResult<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if field.entity_logical_name() != entity.logical_name() {
                return Err(AppError::Validation(format!(
                    "field '{}' belongs to entity '{}', not '{}'",
                    field.logical_name().as_str(),
                    field.entity_logical_name().as_str(),
                    entity.logical_name().as_str()
                )));
            }
            if !seen.insert(field.logical_name().as_str().to_owned()) {
                return Err(AppError::Validation(format!(
                    "duplicate field logical name '{}' in schema",
                    field.logical_name().as_str()
                )));
            }
        }

        Ok(Self { entity, fields })
    }

    /// Returns the entity metadata.
    #[must_use]
    pub fn entity(&self) -> &EntityDefinition {
        &self.entity
    }

    /// Returns all fields.
    #[must_use]
    pub fn fields(&self) -> &[EntityFieldDefinition] {
        &self.fields
    }

    /// Looks up a field definition by logical name.
    #[must_use]
    pub fn field(&self, logical_name: &str) -> Option<&EntityFieldDefinition> {
        self.fields
            .iter()
            .find(|field| field.logical_name().as_str() == logical_name)
    }

    /// Returns whether the schema declares a field with the given name.
    #[must_use]
    pub fn has_field(&self, logical_name: &str) -> bool {
        self.field(logical_name).is_some()
    }
}
