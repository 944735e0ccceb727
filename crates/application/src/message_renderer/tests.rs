use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use papertrail_core::AppResult;
use papertrail_domain::{
    AuditEventType, AuditRecord, ChangePayload, EntityDefinition, EntityFieldDefinition,
    EntitySchema, FieldChange, FieldType, OptionSet, OptionSetItem,
};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::audit_ports::{ReferenceTitle, ReferenceTitleResolver};

use super::MessageRenderer;

struct FakeResolver {
    titles: Mutex<HashMap<(String, String), String>>,
}

impl FakeResolver {
    fn new() -> Self {
        Self {
            titles: Mutex::new(HashMap::new()),
        }
    }

    async fn insert(&self, entity: &str, record_id: &str, title: &str) {
        self.titles
            .lock()
            .await
            .insert((entity.to_owned(), record_id.to_owned()), title.to_owned());
    }

    async fn remove(&self, entity: &str, record_id: &str) {
        self.titles
            .lock()
            .await
            .remove(&(entity.to_owned(), record_id.to_owned()));
    }
}

#[async_trait]
impl ReferenceTitleResolver for FakeResolver {
    async fn resolve_title(
        &self,
        entity_logical_name: &str,
        record_id: &str,
    ) -> AppResult<Option<ReferenceTitle>> {
        Ok(self
            .titles
            .lock()
            .await
            .get(&(entity_logical_name.to_owned(), record_id.to_owned()))
            .map(|title| ReferenceTitle {
                record_id: record_id.to_owned(),
                title: title.clone(),
            }))
    }
}

fn field(
    name: &str,
    caption: &str,
    field_type: FieldType,
    option_set: Option<OptionSet>,
    target: Option<&str>,
) -> EntityFieldDefinition {
    EntityFieldDefinition::new(
        "invoice",
        name,
        caption,
        field_type,
        false,
        false,
        option_set,
        target.map(str::to_owned),
    )
    .unwrap_or_else(|_| unreachable!())
}

fn status_options() -> OptionSet {
    OptionSet::new(vec![
        OptionSetItem::new("0", "Draft"),
        OptionSetItem::new("1", "Sent"),
    ])
    .unwrap_or_else(|_| unreachable!())
}

fn schema() -> EntitySchema {
    let entity = EntityDefinition::new("invoice", "Invoice").unwrap_or_else(|_| unreachable!());
    EntitySchema::new(
        entity,
        vec![
            field("name", "Name", FieldType::Text, None, None),
            field("status", "Status", FieldType::Number, Some(status_options()), None),
            field("owner", "Owner", FieldType::Relation, None, Some("user")),
            field("password", "Password", FieldType::Secret, None, None),
            field("settings", "Settings", FieldType::Json, None, None),
            field("due_date", "Due date", FieldType::Date, None, None),
            field("sent_at", "Sent at", FieldType::DateTime, None, None),
        ],
    )
    .unwrap_or_else(|_| unreachable!())
}

fn field_record(field_name: &str, field_type: FieldType, old: Value, new: Value) -> AuditRecord {
    AuditRecord::new(
        "invoice",
        "1",
        AuditEventType::FieldChanged,
        Some(field_name.to_owned()),
        ChangePayload::Field(FieldChange::new(field_type, old, new)),
        None,
    )
    .unwrap_or_else(|_| unreachable!())
}

fn renderer(resolver: Arc<FakeResolver>) -> MessageRenderer {
    MessageRenderer::new(resolver)
}

#[tokio::test]
async fn renders_created_and_deleted_with_model_caption() {
    let renderer = renderer(Arc::new(FakeResolver::new()));
    let schema = schema();

    let created = AuditRecord::new(
        "invoice",
        "1",
        AuditEventType::Created,
        None,
        ChangePayload::None,
        None,
    )
    .unwrap_or_else(|_| unreachable!());
    let deleted = AuditRecord::new(
        "invoice",
        "1",
        AuditEventType::Deleted,
        None,
        ChangePayload::None,
        None,
    )
    .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        renderer.render(&created, &schema).await.unwrap_or_default(),
        "created Invoice"
    );
    assert_eq!(
        renderer.render(&deleted, &schema).await.unwrap_or_default(),
        "deleted Invoice"
    );
}

#[tokio::test]
async fn renders_scalar_change_with_both_values() {
    let renderer = renderer(Arc::new(FakeResolver::new()));
    let record = field_record("name", FieldType::Text, json!("Acme"), json!("Acme Corp"));

    assert_eq!(
        renderer.render(&record, &schema()).await.unwrap_or_default(),
        r#"changed "Name" from "Acme" to "Acme Corp""#
    );
}

#[tokio::test]
async fn renders_scalar_set_when_old_value_is_empty() {
    let renderer = renderer(Arc::new(FakeResolver::new()));
    let record = field_record("name", FieldType::Text, json!(null), json!("Acme"));

    assert_eq!(
        renderer.render(&record, &schema()).await.unwrap_or_default(),
        r#"set "Name" to "Acme""#
    );
}

#[tokio::test]
async fn renders_enumerated_labels_from_current_mapping() {
    let renderer = renderer(Arc::new(FakeResolver::new()));
    let record = field_record("status", FieldType::Number, json!(0), json!(1));

    assert_eq!(
        renderer.render(&record, &schema()).await.unwrap_or_default(),
        r#"changed "Status" from "Draft" to "Sent""#
    );
}

#[tokio::test]
async fn mutated_mapping_renders_empty_string_not_error() {
    let renderer = renderer(Arc::new(FakeResolver::new()));
    let record = field_record("status", FieldType::Number, json!(0), json!(7));

    assert_eq!(
        renderer.render(&record, &schema()).await.unwrap_or_default(),
        r#"changed "Status" from "Draft" to """#
    );
}

#[tokio::test]
async fn enumerated_set_template_when_old_key_absent() {
    let renderer = renderer(Arc::new(FakeResolver::new()));
    let record = field_record("status", FieldType::Number, json!(null), json!(1));

    assert_eq!(
        renderer.render(&record, &schema()).await.unwrap_or_default(),
        r#"set "Status" to "Sent""#
    );
}

#[tokio::test]
async fn reference_set_template_uses_new_title() {
    let resolver = Arc::new(FakeResolver::new());
    resolver.insert("user", "7", "Some User").await;
    let renderer = renderer(resolver);

    let record = field_record("owner", FieldType::Relation, json!(null), json!("7"));

    assert_eq!(
        renderer.render(&record, &schema()).await.unwrap_or_default(),
        r#"set "Owner" to "Some User""#
    );
}

#[tokio::test]
async fn reference_change_uses_both_titles() {
    let resolver = Arc::new(FakeResolver::new());
    resolver.insert("user", "7", "Some User").await;
    resolver.insert("user", "8", "Other User").await;
    let renderer = renderer(resolver);

    let record = field_record("owner", FieldType::Relation, json!("7"), json!("8"));

    assert_eq!(
        renderer.render(&record, &schema()).await.unwrap_or_default(),
        r#"changed "Owner" from "Some User" to "Other User""#
    );
}

#[tokio::test]
async fn deleted_referenced_row_falls_back_to_raw_id() {
    let resolver = Arc::new(FakeResolver::new());
    resolver.insert("user", "7", "Some User").await;
    resolver.insert("user", "8", "Other User").await;
    let renderer = renderer(resolver.clone());

    let record = field_record("owner", FieldType::Relation, json!("7"), json!("8"));
    resolver.remove("user", "7").await;

    assert_eq!(
        renderer.render(&record, &schema()).await.unwrap_or_default(),
        r#"changed "Owner" from "7" to "Other User""#
    );
}

#[tokio::test]
async fn date_fields_render_only_the_date_portion() {
    let renderer = renderer(Arc::new(FakeResolver::new()));
    let record = field_record(
        "due_date",
        FieldType::Date,
        json!("2019-12-31T23:00:00+00:00"),
        json!("2020-01-01T11:11:00+00:00"),
    );

    assert_eq!(
        renderer.render(&record, &schema()).await.unwrap_or_default(),
        r#"changed "Due date" from "2019-12-31" to "2020-01-01""#
    );
}

#[tokio::test]
async fn unparseable_old_timestamp_renders_set_template() {
    let renderer = renderer(Arc::new(FakeResolver::new()));
    let record = field_record(
        "sent_at",
        FieldType::DateTime,
        json!(null),
        json!("2020-01-01T11:11:00+00:00"),
    );

    assert_eq!(
        renderer.render(&record, &schema()).await.unwrap_or_default(),
        r#"set "Sent at" to "2020-01-01 11:11""#
    );
}

#[tokio::test]
async fn secret_fields_render_without_values() {
    let renderer = renderer(Arc::new(FakeResolver::new()));
    let record = AuditRecord::new(
        "invoice",
        "1",
        AuditEventType::FieldChanged,
        Some("password".to_owned()),
        ChangePayload::None,
        None,
    )
    .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        renderer.render(&record, &schema()).await.unwrap_or_default(),
        r#"changed "Password""#
    );
}

#[tokio::test]
async fn structured_values_are_json_encoded() {
    let renderer = renderer(Arc::new(FakeResolver::new()));
    let record = field_record(
        "settings",
        FieldType::Json,
        json!({"theme": "light"}),
        json!({"theme": "dark"}),
    );

    assert_eq!(
        renderer.render(&record, &schema()).await.unwrap_or_default(),
        r#"changed "Settings" from "{"theme":"light"}" to "{"theme":"dark"}""#
    );
}

#[tokio::test]
async fn unknown_field_ident_is_a_configuration_error() {
    let renderer = renderer(Arc::new(FakeResolver::new()));
    let record = field_record("vanished", FieldType::Text, json!("a"), json!("b"));

    let result = renderer.render(&record, &schema()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn custom_events_render_their_name() {
    let renderer = renderer(Arc::new(FakeResolver::new()));
    let record = AuditRecord::new(
        "invoice",
        "1",
        AuditEventType::custom("ADDED_EMAIL").unwrap_or_else(|_| unreachable!()),
        None,
        ChangePayload::None,
        None,
    )
    .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        renderer.render(&record, &schema()).await.unwrap_or_default(),
        "ADDED_EMAIL"
    );
}

#[tokio::test]
async fn rendering_is_idempotent_while_lookups_are_unchanged() {
    let resolver = Arc::new(FakeResolver::new());
    resolver.insert("user", "7", "Some User").await;
    let renderer = renderer(resolver);
    let schema = schema();

    let record = field_record("owner", FieldType::Relation, json!(null), json!("7"));
    let first = renderer.render(&record, &schema).await.unwrap_or_default();
    let second = renderer.render(&record, &schema).await.unwrap_or_default();

    assert_eq!(first, second);
}
