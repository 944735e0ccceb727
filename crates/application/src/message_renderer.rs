use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use papertrail_core::{AppError, AppResult};
use papertrail_domain::{
    AuditEventType, AuditRecord, ChangeClassifier, ChangePayload, Classification,
    EntityFieldDefinition, EntitySchema, FieldChange, FieldType, OptionSet, TemporalGranularity,
};
use serde_json::Value;

use crate::audit_ports::ReferenceTitleResolver;

mod templates;
#[cfg(test)]
mod tests;

pub use templates::MessageTemplates;
use templates::render_template;

/// Strftime patterns applied per temporal granularity at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalFormats {
    /// Pattern for time-of-day fields.
    pub time: String,
    /// Pattern for date-only fields.
    pub date: String,
    /// Pattern for date-time fields.
    pub datetime: String,
}

impl Default for TemporalFormats {
    fn default() -> Self {
        Self {
            time: "%H:%M".to_owned(),
            date: "%Y-%m-%d".to_owned(),
            datetime: "%Y-%m-%d %H:%M".to_owned(),
        }
    }
}

impl TemporalFormats {
    fn for_granularity(&self, granularity: TemporalGranularity) -> &str {
        match granularity {
            TemporalGranularity::Time => self.time.as_str(),
            TemporalGranularity::Date => self.date.as_str(),
            TemporalGranularity::DateTime => self.datetime.as_str(),
        }
    }
}

/// Turns a persisted audit record into its human-readable message.
///
/// Rendering is a pure function of the record's stored data plus the live
/// lookups needed for reference and option-set resolution: re-rendering the
/// same record yields the same string while titles and mappings are
/// unchanged. Missing referenced data degrades to raw values and never
/// raises.
#[derive(Clone)]
pub struct MessageRenderer {
    resolver: Arc<dyn ReferenceTitleResolver>,
    templates: MessageTemplates,
    formats: TemporalFormats,
}

impl MessageRenderer {
    /// Creates a renderer with default templates and temporal formats.
    #[must_use]
    pub fn new(resolver: Arc<dyn ReferenceTitleResolver>) -> Self {
        Self {
            resolver,
            templates: MessageTemplates::default(),
            formats: TemporalFormats::default(),
        }
    }

    /// Replaces the message templates.
    #[must_use]
    pub fn with_templates(mut self, templates: MessageTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Replaces the temporal formats.
    #[must_use]
    pub fn with_formats(mut self, formats: TemporalFormats) -> Self {
        self.formats = formats;
        self
    }

    /// Renders the message for an audit record against current metadata.
    pub async fn render(&self, record: &AuditRecord, schema: &EntitySchema) -> AppResult<String> {
        match record.event_type() {
            AuditEventType::Created => Ok(render_template(
                &self.templates.created,
                &[("modelCaption", schema.entity().display_name().as_str())],
            )),
            AuditEventType::Deleted => Ok(render_template(
                &self.templates.deleted,
                &[("modelCaption", schema.entity().display_name().as_str())],
            )),
            AuditEventType::Custom(name) => Ok(name.clone()),
            AuditEventType::FieldChanged => self.render_field_changed(record, schema).await,
        }
    }

    async fn render_field_changed(
        &self,
        record: &AuditRecord,
        schema: &EntitySchema,
    ) -> AppResult<String> {
        let field_ident = record.field_ident().ok_or_else(|| {
            AppError::Validation("field_changed record has no field ident".to_owned())
        })?;
        let field = schema.field(field_ident).ok_or_else(|| {
            AppError::Validation(format!(
                "field '{}' does not exist on entity '{}'",
                field_ident,
                schema.entity().logical_name().as_str()
            ))
        })?;
        let caption = field.display_name().as_str();

        let change = match record.change_data() {
            ChangePayload::Field(change) => change,
            ChangePayload::None => {
                return Ok(render_template(
                    &self.templates.changed_without_values,
                    &[("fieldName", caption)],
                ));
            }
            ChangePayload::Custom(_) => {
                return Err(AppError::Validation(
                    "field_changed record carries a custom payload".to_owned(),
                ));
            }
        };

        // Classification is re-derived from current metadata, not stored.
        let classification = ChangeClassifier::classify(schema, field_ident, &BTreeSet::new());
        match classification {
            Classification::NoValue => Ok(render_template(
                &self.templates.changed_without_values,
                &[("fieldName", caption)],
            )),
            Classification::Reference => self.render_reference_field(field, change).await,
            Classification::Enumerated => Ok(self.render_enumerated_field(field, change)),
            Classification::Temporal(granularity) => {
                Ok(self.render_temporal_field(caption, change, granularity))
            }
            Classification::Skip | Classification::Scalar => {
                if is_structured(change) {
                    Ok(self.render_json_field(caption, change))
                } else {
                    Ok(self.render_scalar_field(caption, change))
                }
            }
        }
    }

    async fn render_reference_field(
        &self,
        field: &EntityFieldDefinition,
        change: &FieldChange,
    ) -> AppResult<String> {
        let caption = field.display_name().as_str();
        let target = field.relation_target_entity().ok_or_else(|| {
            AppError::Validation(format!(
                "relation field '{}' has no target entity",
                field.logical_name().as_str()
            ))
        })?;

        let old_display = match reference_id(change.old_value()) {
            Some(id) => Some(self.resolve_or_raw(target.as_str(), &id).await?),
            None => None,
        };
        let new_display = match reference_id(change.new_value()) {
            Some(id) => self.resolve_or_raw(target.as_str(), &id).await?,
            None => String::new(),
        };

        Ok(match old_display {
            Some(old_title) => render_template(
                &self.templates.changed_with_old_value,
                &[
                    ("fieldName", caption),
                    ("oldValue", old_title.as_str()),
                    ("newValue", new_display.as_str()),
                ],
            ),
            None => render_template(
                &self.templates.changed_no_old_value,
                &[("fieldName", caption), ("newValue", new_display.as_str())],
            ),
        })
    }

    async fn resolve_or_raw(&self, entity_logical_name: &str, record_id: &str) -> AppResult<String> {
        Ok(self
            .resolver
            .resolve_title(entity_logical_name, record_id)
            .await?
            .map(|reference| reference.title)
            .unwrap_or_else(|| record_id.to_owned()))
    }

    fn render_enumerated_field(&self, field: &EntityFieldDefinition, change: &FieldChange) -> String {
        let caption = field.display_name().as_str();
        let Some(options) = field.option_set() else {
            return self.render_scalar_field(caption, change);
        };

        // Absent keys render as empty strings; the raw old key decides the template.
        let old_label = options.label_for(change.old_value()).unwrap_or("");
        let new_label = options.label_for(change.new_value()).unwrap_or("");
        let old_key = OptionSet::raw_key(change.old_value()).unwrap_or_default();

        if old_key.is_empty() {
            render_template(
                &self.templates.changed_no_old_value,
                &[("fieldName", caption), ("newValue", new_label)],
            )
        } else {
            render_template(
                &self.templates.changed_with_old_value,
                &[
                    ("fieldName", caption),
                    ("oldValue", old_label),
                    ("newValue", new_label),
                ],
            )
        }
    }

    fn render_temporal_field(
        &self,
        caption: &str,
        change: &FieldChange,
        granularity: TemporalGranularity,
    ) -> String {
        let format = self.formats.for_granularity(granularity);
        let new_text = match parse_stored_timestamp(change.new_value()) {
            Some(timestamp) => timestamp.format(format).to_string(),
            None => raw_text(change.new_value()),
        };

        match parse_stored_timestamp(change.old_value()) {
            Some(timestamp) => render_template(
                &self.templates.changed_with_old_value,
                &[
                    ("fieldName", caption),
                    ("oldValue", timestamp.format(format).to_string().as_str()),
                    ("newValue", new_text.as_str()),
                ],
            ),
            None => render_template(
                &self.templates.changed_no_old_value,
                &[("fieldName", caption), ("newValue", new_text.as_str())],
            ),
        }
    }

    fn render_scalar_field(&self, caption: &str, change: &FieldChange) -> String {
        let old_text = raw_text(change.old_value());
        let new_text = raw_text(change.new_value());

        if old_text.is_empty() {
            render_template(
                &self.templates.changed_no_old_value,
                &[("fieldName", caption), ("newValue", new_text.as_str())],
            )
        } else {
            render_template(
                &self.templates.changed_with_old_value,
                &[
                    ("fieldName", caption),
                    ("oldValue", old_text.as_str()),
                    ("newValue", new_text.as_str()),
                ],
            )
        }
    }

    fn render_json_field(&self, caption: &str, change: &FieldChange) -> String {
        let old_text = json_text(change.old_value());
        let new_text = json_text(change.new_value());

        if old_text.is_empty() {
            render_template(
                &self.templates.changed_no_old_value,
                &[("fieldName", caption), ("newValue", new_text.as_str())],
            )
        } else {
            render_template(
                &self.templates.changed_with_old_value,
                &[
                    ("fieldName", caption),
                    ("oldValue", old_text.as_str()),
                    ("newValue", new_text.as_str()),
                ],
            )
        }
    }
}

fn is_structured(change: &FieldChange) -> bool {
    change.field_type() == FieldType::Json
        || change.old_value().is_object()
        || change.old_value().is_array()
        || change.new_value().is_object()
        || change.new_value().is_array()
}

fn reference_id(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn parse_stored_timestamp(value: &Value) -> Option<DateTime<FixedOffset>> {
    value
        .as_str()
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
}

fn raw_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn json_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) if text.is_empty() => String::new(),
        other => other.to_string(),
    }
}
