//! Schema catalog access.
//!
//! The engine only consumes the narrow [`SchemaCatalog`] contract; transport
//! lives with the caller. [`BundleCatalog`] serves everything from one
//! in-memory bundle, which can be read from a JSON file.

use std::{collections::BTreeMap, path::Path};

use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::EngineConfig,
    data::{field::Field, schema::Schema},
};

/// Errors returned by a [`SchemaCatalog`].
///
/// The type is `Clone` so one in-flight request can hand the same outcome to
/// every caller waiting on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// No schema is published under this key and version.
    #[error("schema `{key}` version `{version}` not found")]
    SchemaNotFound { key: String, version: String },
    /// Nothing is published for this reference URI.
    #[error("no properties published for `{0}`")]
    PropertiesNotFound(String),
    /// The catalog source could not be read.
    #[error("failed to read catalog {path}: {message}")]
    Io { path: String, message: String },
    /// The catalog source is not a valid bundle.
    #[error("invalid catalog bundle: {0}")]
    Decode(String),
    /// The catalog backend refused or failed the request.
    #[error("catalog request failed: {0}")]
    Unavailable(String),
}

/// Source of schemas and lazily fetched property lists.
#[async_trait]
pub trait SchemaCatalog: Send + Sync {
    /// Root-level schema summaries, latest version of each.
    async fn fetch_schemas(&self) -> Result<Vec<Schema>, CatalogError>;

    /// One schema at a specific version.
    async fn fetch_schema(&self, key: &str, version: &str) -> Result<Schema, CatalogError>;

    /// Property list behind a reference URI.
    async fn fetch_properties(&self, reference: &str) -> Result<Vec<Field>, CatalogError>;
}

/// A catalog served from one in-memory bundle.
///
/// Bundle layout:
///
/// ```json
/// {
///   "schemas": [ { "id": "...", "key": "event", "version": "326", ... } ],
///   "versions": { "event@325": { "id": "...", ... } },
///   "properties": { "/events/event.json/326.json#": [ { "id": "...", "name": "..." } ] }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleCatalog {
    #[serde(default)]
    pub schemas: Vec<Schema>,
    #[serde(default)]
    pub versions: BTreeMap<String, Schema>,
    #[serde(default)]
    pub properties: BTreeMap<String, Vec<Field>>,
}

impl BundleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a bundle from a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CatalogError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Self::from_json_str(&content)
    }

    /// Parse a bundle from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(content).map_err(|e| CatalogError::Decode(e.to_string()))
    }

    /// Publish a root schema summary.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Publish a specific schema version.
    pub fn with_version(mut self, schema: Schema) -> Self {
        self.versions
            .insert(version_key(&schema.key, &schema.version), schema);
        self
    }

    /// Publish the property list behind a reference URI.
    pub fn with_properties(mut self, reference: impl Into<String>, properties: Vec<Field>) -> Self {
        self.properties.insert(reference.into(), properties);
        self
    }
}

fn version_key(key: &str, version: &str) -> String {
    format!("{key}@{version}")
}

#[async_trait]
impl SchemaCatalog for BundleCatalog {
    async fn fetch_schemas(&self) -> Result<Vec<Schema>, CatalogError> {
        Ok(self.schemas.clone())
    }

    async fn fetch_schema(&self, key: &str, version: &str) -> Result<Schema, CatalogError> {
        if let Some(schema) = self.versions.get(&version_key(key, version)) {
            return Ok(schema.clone());
        }
        self.schemas
            .iter()
            .find(|s| s.key == key && s.version == version)
            .cloned()
            .ok_or_else(|| CatalogError::SchemaNotFound {
                key: key.to_string(),
                version: version.to_string(),
            })
    }

    async fn fetch_properties(&self, reference: &str) -> Result<Vec<Field>, CatalogError> {
        self.properties
            .get(reference)
            .cloned()
            .ok_or_else(|| CatalogError::PropertiesNotFound(reference.to_string()))
    }
}

/// Latest root schemas keyed by schema key, with highlighted type variants
/// marked.
///
/// Every key listed in [`EngineConfig::highlighted`] must be published;
/// otherwise nothing is returned.
pub async fn fetch_schema_summaries(
    catalog: &dyn SchemaCatalog,
    config: &EngineConfig,
) -> Result<BTreeMap<String, Schema>, CatalogError> {
    let schemas = catalog.fetch_schemas().await?;
    let mut out = BTreeMap::new();
    for (key, highlighted) in &config.highlighted {
        let Some(schema) = schemas.iter().find(|s| &s.key == key) else {
            warn!("root schema `{key}` is not published by the catalog");
            return Ok(BTreeMap::new());
        };
        let mut schema = schema.clone();
        for variant in &mut schema.type_list {
            variant.highlighted = Some(highlighted.contains(&variant.name));
        }
        out.insert(key.clone(), schema);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        field::TypeVariant,
        schema::{ENGAGEMENT_SCHEMA_KEY, TRACKER_SCHEMA_KEY},
    };

    fn root(key: &str, version: &str, types: &[&str]) -> Schema {
        Schema {
            id: format!("/events/{key}.json/{version}.json#"),
            key: key.to_string(),
            version: version.to_string(),
            type_list: types
                .iter()
                .map(|t| TypeVariant::new(format!("{key}-{t}"), *t))
                .collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_schema_versions() {
        let catalog = BundleCatalog::new()
            .with_schema(root(TRACKER_SCHEMA_KEY, "326", &[]))
            .with_version(root(TRACKER_SCHEMA_KEY, "325", &[]));

        let latest = catalog.fetch_schema(TRACKER_SCHEMA_KEY, "326").await.unwrap();
        assert_eq!(latest.version, "326");
        let older = catalog.fetch_schema(TRACKER_SCHEMA_KEY, "325").await.unwrap();
        assert_eq!(older.version, "325");
        assert_eq!(
            catalog.fetch_schema(TRACKER_SCHEMA_KEY, "1").await,
            Err(CatalogError::SchemaNotFound {
                key: TRACKER_SCHEMA_KEY.to_string(),
                version: "1".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_fetch_properties() {
        let catalog =
            BundleCatalog::new().with_properties("/a.json#", vec![Field::new("a.b", "b")]);
        assert_eq!(catalog.fetch_properties("/a.json#").await.unwrap().len(), 1);
        assert!(matches!(
            catalog.fetch_properties("/missing.json#").await,
            Err(CatalogError::PropertiesNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_summaries_mark_highlighted_types() {
        let catalog = BundleCatalog::new()
            .with_schema(root(TRACKER_SCHEMA_KEY, "326", &["Click", "Purchase"]))
            .with_schema(root(ENGAGEMENT_SCHEMA_KEY, "353", &["Zoom", "Hover"]));
        let summaries = fetch_schema_summaries(&catalog, &EngineConfig::default())
            .await
            .unwrap();

        let tracker = &summaries[TRACKER_SCHEMA_KEY];
        assert_eq!(tracker.type_list[0].highlighted, Some(true));
        assert_eq!(tracker.type_list[1].highlighted, Some(false));
        let engagement = &summaries[ENGAGEMENT_SCHEMA_KEY];
        assert_eq!(engagement.type_list[0].highlighted, Some(true));
        assert_eq!(engagement.type_list[1].highlighted, Some(false));
    }

    #[tokio::test]
    async fn test_summaries_require_every_root() {
        let catalog = BundleCatalog::new().with_schema(root(TRACKER_SCHEMA_KEY, "326", &[]));
        let summaries = fetch_schema_summaries(&catalog, &EngineConfig::default())
            .await
            .unwrap();
        assert!(summaries.is_empty());
    }

    #[test]
    fn test_bundle_from_json() {
        let bundle = BundleCatalog::from_json_str(
            r#"{"schemas": [{"id": "/e#", "key": "event", "version": "1"}],
                "properties": {"/e#": [{"id": "x", "name": "x"}]}}"#,
        )
        .unwrap();
        assert_eq!(bundle.schemas.len(), 1);
        assert!(bundle.versions.is_empty());
        assert!(matches!(
            BundleCatalog::from_json_str("[]"),
            Err(CatalogError::Decode(_))
        ));
    }
}
