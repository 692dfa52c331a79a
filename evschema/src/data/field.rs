use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Value type tag carried by a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text, optionally constrained by a pattern.
    String,
    /// Numeric value.
    Number,
    /// Composite value with named members.
    Object,
    /// Collection value.
    Array,
    /// Closed set of values.
    Enum,
    /// Any type tag not handled explicitly (`integer`, `boolean`, ...).
    #[serde(other)]
    Other,
}

/// Value constraints attached to a field.
///
/// Bounds are kept as raw JSON because catalogs publish them both as numbers
/// and as strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<Value>,
}

/// A named closed choice attached to a field's `typeList`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeVariant {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// One schema node, leaf or composite.
///
/// A field whose `reference` is set while `properties` is empty has not been
/// hydrated yet; see [`crate::data::resolver`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Globally unique id, stable across reloads.
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub required: bool,
    #[serde(flatten)]
    pub constraints: Constraints,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub type_list: Vec<TypeVariant>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub properties: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_one_of_property: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Field {
    /// Create a field with only an id and a name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the type tag.
    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    /// Set the child fields.
    pub fn with_properties(mut self, properties: Vec<Field>) -> Self {
        self.properties = properties;
        self
    }

    /// Set the closed value list.
    pub fn with_type_list(mut self, type_list: Vec<TypeVariant>) -> Self {
        self.type_list = type_list;
        self
    }

    /// Point the field at a lazily fetched definition.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Mark the field's children as mutually exclusive.
    pub fn one_of(mut self) -> Self {
        self.is_one_of_property = true;
        self
    }

    /// Set the string pattern constraint.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.constraints.pattern = Some(pattern.into());
        self
    }

    /// `true` when the field points at a definition whose properties have not
    /// been fetched yet.
    pub fn is_unresolved(&self) -> bool {
        self.reference.is_some() && self.properties.is_empty()
    }

    /// Find a direct child by name.
    pub fn child_by_name(&self, name: &str) -> Option<&Field> {
        find_field_by_name(name, &self.properties)
    }

    /// Find a direct child by id.
    pub fn child_by_id(&self, id: &str) -> Option<&Field> {
        self.properties.iter().find(|f| f.id == id)
    }

    /// Find a value variant by name.
    pub fn variant_by_name(&self, name: &str) -> Option<&TypeVariant> {
        self.type_list.iter().find(|t| t.name == name)
    }
}

impl TypeVariant {
    /// Create a variant with an id and a name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

impl From<&TypeVariant> for Field {
    fn from(variant: &TypeVariant) -> Self {
        Field {
            id: variant.id.clone(),
            name: variant.name.clone(),
            reference: variant.reference.clone(),
            ..Default::default()
        }
    }
}

/// Find a field by name within a list of siblings.
pub fn find_field_by_name<'a>(name: &str, fields: &'a [Field]) -> Option<&'a Field> {
    fields.iter().find(|f| f.name == name)
}

/// Anything addressable by a stable schema id.
pub trait SchemaNode {
    /// The node's globally unique id.
    fn id(&self) -> &str;
    /// The node's display and document name.
    fn name(&self) -> &str;
}

impl SchemaNode for Field {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl SchemaNode for TypeVariant {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A member of a selection set: either a field or a value variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Selectable {
    Field(Field),
    Variant(TypeVariant),
}

impl Selectable {
    /// The field view of this member. Variants present as bare fields.
    pub fn to_field(&self) -> Field {
        match self {
            Selectable::Field(f) => f.clone(),
            Selectable::Variant(v) => Field::from(v),
        }
    }
}

impl SchemaNode for Selectable {
    fn id(&self) -> &str {
        match self {
            Selectable::Field(f) => &f.id,
            Selectable::Variant(v) => &v.id,
        }
    }

    fn name(&self) -> &str {
        match self {
            Selectable::Field(f) => &f.name,
            Selectable::Variant(v) => &v.name,
        }
    }
}

impl From<Field> for Selectable {
    fn from(field: Field) -> Self {
        Selectable::Field(field)
    }
}

impl From<&Field> for Selectable {
    fn from(field: &Field) -> Self {
        Selectable::Field(field.clone())
    }
}

impl From<TypeVariant> for Selectable {
    fn from(variant: TypeVariant) -> Self {
        Selectable::Variant(variant)
    }
}

impl From<&TypeVariant> for Selectable {
    fn from(variant: &TypeVariant) -> Self {
        Selectable::Variant(variant.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_from_catalog_json() {
        let json = serde_json::json!({
            "id": "/events/event.json#/properties/object",
            "name": "object",
            "type": "object",
            "required": null,
            "pattern": "^[a-z]+$",
            "maxLength": "64",
            "properties": null,
            "typeList": [{"id": "t1", "name": "Article"}],
            "reference": "/objects/Article.json/56.json#",
            "isOneOfProperty": true
        });
        let field: Field = serde_json::from_value(json).unwrap();
        assert_eq!(field.field_type, Some(FieldType::Object));
        assert!(!field.required);
        assert!(field.properties.is_empty());
        assert!(field.is_unresolved());
        assert!(field.is_one_of_property);
        assert_eq!(field.constraints.pattern.as_deref(), Some("^[a-z]+$"));
        assert_eq!(
            field.constraints.max_length,
            Some(Value::String("64".to_string()))
        );
        assert_eq!(field.variant_by_name("Article").map(|t| t.id.as_str()), Some("t1"));
    }

    #[test]
    fn test_unknown_type_tag() {
        let field: Field =
            serde_json::from_value(serde_json::json!({"id": "a", "name": "a", "type": "integer"}))
                .unwrap();
        assert_eq!(field.field_type, Some(FieldType::Other));
    }

    #[test]
    fn test_selectable_identity() {
        let variant = TypeVariant::new("t1", "Click");
        let member = Selectable::from(&variant);
        assert_eq!(member.id(), "t1");
        assert_eq!(member.name(), "Click");
        assert_eq!(member.to_field().id, "t1");
        assert!(member.to_field().field_type.is_none());
    }
}
