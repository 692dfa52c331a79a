//! Compilation of a selection into an event document.
//!
//! The projection walks the store from the root scope. Every selected field
//! contributes a placeholder value at its document path and recurses into its
//! own scope; a member selected under a value-picking parent (a field with a
//! `typeList` or an `enum` type) becomes the parent's value instead.

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::data::{
    classify::selects_value,
    document::{Segment, set_path},
    field::{Field, FieldType, SchemaNode, Selectable},
    schema::{MAX_WALK_DEPTH, Schema},
    selection::{SelectionKey, SelectionStore},
};

/// Project `store` over `schema` into an event document.
///
/// The result always carries `schema` set to the schema's canonical URL under
/// `base_url`. Projection only reads its inputs, so it is safe to recompute
/// from scratch after every change.
pub fn project(store: &SelectionStore, schema: &Schema, base_url: &str) -> Value {
    let mut event = Value::Object(Map::new());
    let scope = Scope {
        key: SelectionKey::root(),
        fields: &schema.properties,
        parent: None,
        path: Vec::new(),
    };
    project_scope(store, &scope, &mut event);
    set_path(
        &mut event,
        &[Segment::key("schema")],
        Value::String(schema.canonical_url(base_url)),
    );
    event
}

struct Scope<'a> {
    key: SelectionKey,
    /// Live children of the scope's owner, used to observe hydrated copies.
    fields: &'a [Field],
    parent: Option<&'a Field>,
    path: Vec<Segment>,
}

fn project_scope(store: &SelectionStore, scope: &Scope<'_>, event: &mut Value) {
    if scope.path.len() > MAX_WALK_DEPTH {
        return;
    }
    let value_pick = scope.parent.is_some_and(selects_value);

    for member in store.selected(&scope.key) {
        if value_pick {
            set_path(event, &scope.path, Value::String(member.name().to_string()));
            continue;
        }

        let field = live_field(member, scope.fields);
        let mut path = scope.path.clone();
        path.push(Segment::key(field.name.as_str()));
        if field.field_type == Some(FieldType::Array) {
            path.push(Segment::Index(0));
        }

        if let Some(value) = placeholder(&field) {
            set_path(event, &path, value);
        }

        let child = Scope {
            key: scope.key.child(field.id.as_str()),
            fields: &field.properties,
            parent: Some(field.as_ref()),
            path,
        };
        project_scope(store, &child, event);
    }
}

/// The schema's current copy of a selected member, falling back to the copy
/// captured at selection time.
fn live_field<'a>(member: &'a Selectable, fields: &'a [Field]) -> Cow<'a, Field> {
    if let Some(live) = fields.iter().find(|f| f.id == member.id()) {
        return Cow::Borrowed(live);
    }
    match member {
        Selectable::Field(f) => Cow::Borrowed(f),
        Selectable::Variant(v) => Cow::Owned(Field::from(v)),
    }
}

/// Placeholder value written for a selected field. `None` leaves the slot
/// unset so deeper writes create the array on their own.
pub fn placeholder(field: &Field) -> Option<Value> {
    match field.field_type {
        Some(FieldType::String) => Some(Value::String(
            field
                .constraints
                .pattern
                .clone()
                .unwrap_or_else(|| "string".to_string()),
        )),
        Some(FieldType::Number) => Some(Value::from(0)),
        Some(FieldType::Object) | Some(FieldType::Enum) => Some(Value::Object(Map::new())),
        Some(FieldType::Array) => None,
        Some(FieldType::Other) | None => {
            if let [only] = field.type_list.as_slice() {
                Some(Value::String(only.name.clone()))
            } else if !field.properties.is_empty() {
                Some(Value::Object(Map::new()))
            } else {
                Some(Value::String("string".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::data::{field::TypeVariant, selection::SelectionMode};

    const BASE_URL: &str = "http://schema.site.com";

    fn type_field() -> Field {
        Field::new("F1", "@type").with_type_list(vec![TypeVariant::new("t1", "Click")])
    }

    fn actor() -> Field {
        Field::new("actor", "actor")
            .with_type(FieldType::Object)
            .with_properties(vec![Field::new("actor.id", "id").with_type(FieldType::String)])
    }

    fn schema(properties: Vec<Field>) -> Schema {
        Schema {
            id: "/events/event.json/326.json#".to_string(),
            key: "event".to_string(),
            version: "326".to_string(),
            properties,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_selection_has_schema_url() {
        let event = project(&SelectionStore::new(), &schema(vec![]), BASE_URL);
        assert_eq!(
            event,
            json!({"schema": "http://schema.site.com/events/event.json/326.json#"})
        );
    }

    #[test]
    fn test_value_selection() {
        let s = schema(vec![type_field()]);
        let mut store = SelectionStore::new();
        store.set_selection(&[], type_field(), SelectionMode::Add);
        // A single typeList entry is already the placeholder.
        assert_eq!(project(&store, &s, BASE_URL)["@type"], json!("Click"));

        store.set_selection(
            &[type_field()],
            TypeVariant::new("t1", "Click"),
            SelectionMode::Replace,
        );
        assert_eq!(project(&store, &s, BASE_URL)["@type"], json!("Click"));
    }

    #[test]
    fn test_enum_value_overwrites_placeholder() {
        let intent = Field::new("intent", "intent")
            .with_type(FieldType::Enum)
            .with_type_list(vec![TypeVariant::new("i1", "Buy"), TypeVariant::new("i2", "Sell")]);
        let s = schema(vec![intent.clone()]);
        let mut store = SelectionStore::new();
        store.set_selection(&[], intent.clone(), SelectionMode::Add);
        assert_eq!(project(&store, &s, BASE_URL)["intent"], json!({}));

        store.set_selection(&[intent], TypeVariant::new("i2", "Sell"), SelectionMode::Replace);
        assert_eq!(project(&store, &s, BASE_URL)["intent"], json!("Sell"));
    }

    #[test]
    fn test_nested_fields() {
        let s = schema(vec![actor()]);
        let mut store = SelectionStore::new();
        store.set_selection(&[], actor(), SelectionMode::Add);
        assert_eq!(project(&store, &s, BASE_URL)["actor"], json!({}));

        store.set_selection(&[actor()], actor().properties[0].clone(), SelectionMode::Add);
        assert_eq!(project(&store, &s, BASE_URL)["actor"], json!({"id": "string"}));
    }

    #[test]
    fn test_placeholders() {
        let string = Field::new("a", "a").with_type(FieldType::String);
        assert_eq!(placeholder(&string), Some(json!("string")));
        assert_eq!(
            placeholder(&string.with_pattern("^sdrn:")),
            Some(json!("^sdrn:"))
        );
        assert_eq!(
            placeholder(&Field::new("n", "n").with_type(FieldType::Number)),
            Some(json!(0))
        );
        assert_eq!(
            placeholder(&Field::new("e", "e").with_type(FieldType::Enum)),
            Some(json!({}))
        );
        assert_eq!(
            placeholder(&Field::new("l", "l").with_type(FieldType::Array)),
            None
        );
        assert_eq!(
            placeholder(&Field::new("c", "c").with_properties(vec![Field::new("d", "d")])),
            Some(json!({}))
        );
        assert_eq!(placeholder(&Field::new("u", "u")), Some(json!("string")));
        let two = Field::new("t", "t").with_type_list(vec![
            TypeVariant::new("x", "X"),
            TypeVariant::new("y", "Y"),
        ]);
        assert_eq!(placeholder(&two), Some(json!("string")));
    }

    #[test]
    fn test_array_fields_are_materialized_by_children() {
        let additional_ids = Field::new("ids", "additionalIds")
            .with_type(FieldType::Array)
            .with_properties(vec![
                Field::new("ids.component", "component").with_type(FieldType::String),
            ]);
        let s = schema(vec![additional_ids.clone()]);
        let mut store = SelectionStore::new();
        store.set_selection(&[], additional_ids.clone(), SelectionMode::Add);
        assert!(project(&store, &s, BASE_URL).get("additionalIds").is_none());

        store.set_selection(
            &[additional_ids.clone()],
            additional_ids.properties[0].clone(),
            SelectionMode::Add,
        );
        assert_eq!(
            project(&store, &s, BASE_URL)["additionalIds"],
            json!([{"component": "string"}])
        );
    }

    #[test]
    fn test_projection_observes_hydrated_schema() {
        let lazy = Field::new("object", "object").with_reference("/objects/Article.json#");
        let mut s = schema(vec![lazy.clone()]);
        let mut store = SelectionStore::new();
        store.set_selection(&[], lazy, SelectionMode::Add);
        assert_eq!(project(&store, &s, BASE_URL)["object"], json!("string"));

        s.properties[0].properties = vec![Field::new("headline", "headline")];
        assert_eq!(project(&store, &s, BASE_URL)["object"], json!({}));
    }

    #[test]
    fn test_projection_is_idempotent() {
        let s = schema(vec![actor(), type_field()]);
        let mut store = SelectionStore::new();
        store.set_selection(&[], actor(), SelectionMode::Add);
        store.set_selection(&[actor()], actor().properties[0].clone(), SelectionMode::Add);
        store.set_selection(&[], type_field(), SelectionMode::Add);
        assert_eq!(project(&store, &s, BASE_URL), project(&store, &s, BASE_URL));
    }
}
