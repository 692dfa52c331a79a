use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::field::{Field, TypeVariant, find_field_by_name};

/// Schema key of the tracker event root schema.
pub const TRACKER_SCHEMA_KEY: &str = "event";
/// Schema key of the engagement event root schema.
pub const ENGAGEMENT_SCHEMA_KEY: &str = "engagement-event";

/// Upper bound for structural walks over a schema tree.
///
/// Hydrated definitions can refer back to their ancestors, so walks stop
/// descending past this depth.
pub const MAX_WALK_DEPTH: usize = 64;

/// Errors raised while addressing fields inside a schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// No field with this name exists at the given path.
    #[error("no field named `{name}` under `{path}`")]
    FieldNotFound { path: String, name: String },
    /// The field has no value variant with this name.
    #[error("field `{path}` has no value `{name}`")]
    VariantNotFound { path: String, name: String },
    /// An empty name path was supplied.
    #[error("empty field path")]
    EmptyPath,
}

/// A root event schema at one version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Canonical id; also the reference URI of its root property list.
    pub id: String,
    pub key: String,
    pub version: String,
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub type_property: String,
    #[serde(default)]
    pub type_description: String,
    #[serde(default)]
    pub type_list: Vec<TypeVariant>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Field>,
}

/// Position of a field in the tree as child indices from the root list.
pub type FieldIndexPath = Vec<usize>;

impl Schema {
    /// Canonical URL of this schema version under `base_url`.
    pub fn canonical_url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.id)
    }

    /// Find a root field by name.
    pub fn root_field(&self, name: &str) -> Option<&Field> {
        find_field_by_name(name, &self.properties)
    }

    /// Resolve a name path (`["actor", "id"]`) into the chain of fields it
    /// designates, starting from the root list.
    pub fn resolve_names<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Field>, SchemaError> {
        if names.is_empty() {
            return Err(SchemaError::EmptyPath);
        }
        let mut out: Vec<Field> = Vec::with_capacity(names.len());
        let mut siblings = &self.properties;
        for name in names {
            let name = name.as_ref();
            let field = find_field_by_name(name, siblings).ok_or_else(|| {
                SchemaError::FieldNotFound {
                    path: display_path(&out),
                    name: name.to_string(),
                }
            })?;
            siblings = &field.properties;
            out.push(field.clone());
        }
        Ok(out)
    }

    /// Field at an index path.
    pub fn field_at(&self, path: &[usize]) -> Option<&Field> {
        let (first, rest) = path.split_first()?;
        let mut field = self.properties.get(*first)?;
        for idx in rest {
            field = field.properties.get(*idx)?;
        }
        Some(field)
    }

    /// Mutable field at an index path.
    pub fn field_at_mut(&mut self, path: &[usize]) -> Option<&mut Field> {
        let (first, rest) = path.split_first()?;
        let mut field = self.properties.get_mut(*first)?;
        for idx in rest {
            field = field.properties.get_mut(*idx)?;
        }
        Some(field)
    }

    /// Every position in the tree holding a field whose `reference` equals
    /// `reference`, in depth-first order.
    pub fn reference_occurrences(&self, reference: &str) -> Vec<FieldIndexPath> {
        let mut found = Vec::new();
        let mut current = Vec::new();
        collect_references(&self.properties, reference, &mut current, &mut found);
        found
    }

    /// Write `properties` into every listed occurrence that still references
    /// `reference` and has no properties. Returns how many fields changed.
    pub fn fill_properties(
        &mut self,
        reference: &str,
        occurrences: &[FieldIndexPath],
        properties: &[Field],
    ) -> usize {
        let mut patched = 0;
        for path in occurrences {
            if let Some(field) = self.field_at_mut(path)
                && field.reference.as_deref() == Some(reference)
                && field.properties.is_empty()
            {
                field.properties = properties.to_vec();
                patched += 1;
            }
        }
        patched
    }

    /// Sort root properties by name.
    pub fn sort_properties(&mut self) {
        self.properties.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

fn collect_references(
    fields: &[Field],
    reference: &str,
    current: &mut Vec<usize>,
    found: &mut Vec<FieldIndexPath>,
) {
    if current.len() >= MAX_WALK_DEPTH {
        return;
    }
    for (idx, field) in fields.iter().enumerate() {
        current.push(idx);
        if field.reference.as_deref() == Some(reference) {
            found.push(current.clone());
        }
        collect_references(&field.properties, reference, current, found);
        current.pop();
    }
}

/// Dotted display form of a field path.
pub fn display_path(path: &[Field]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }
    path.iter()
        .map(|f| f.name.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::field::FieldType;

    fn article_ref() -> &'static str {
        "/objects/Article.json/56.json#"
    }

    fn schema() -> Schema {
        Schema {
            id: "/events/event.json/326.json#".to_string(),
            key: TRACKER_SCHEMA_KEY.to_string(),
            version: "326".to_string(),
            properties: vec![
                Field::new("actor", "actor")
                    .with_type(FieldType::Object)
                    .with_properties(vec![
                        Field::new("actor.id", "id").with_type(FieldType::String),
                    ]),
                Field::new("object", "object").one_of().with_properties(vec![
                    Field::new("object.Article", "Article").with_reference(article_ref()),
                    Field::new("object.Page", "Page"),
                ]),
                Field::new("target", "target").with_properties(vec![
                    Field::new("target.Article", "Article").with_reference(article_ref()),
                ]),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_canonical_url() {
        let s = schema();
        assert_eq!(
            s.canonical_url("http://schema.site.com/"),
            "http://schema.site.com/events/event.json/326.json#"
        );
    }

    #[test]
    fn test_resolve_names() {
        let s = schema();
        let path = s.resolve_names(&["actor", "id"]).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path[1].id, "actor.id");

        let err = s.resolve_names(&["actor", "name"]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::FieldNotFound {
                path: "actor".to_string(),
                name: "name".to_string()
            }
        );
        assert_eq!(s.resolve_names::<&str>(&[]), Err(SchemaError::EmptyPath));
    }

    #[test]
    fn test_reference_occurrences_and_fill() {
        let mut s = schema();
        let found = s.reference_occurrences(article_ref());
        assert_eq!(found, vec![vec![1, 0], vec![2, 0]]);

        let props = vec![Field::new("Article.headline", "headline")];
        assert_eq!(s.fill_properties(article_ref(), &found, &props), 2);
        assert_eq!(s.field_at(&[2, 0]).unwrap().properties, props);
        // Already filled occurrences are left alone.
        assert_eq!(s.fill_properties(article_ref(), &found, &[]), 0);
    }
}
