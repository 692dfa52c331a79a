use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::{
    config::EngineConfig,
    data::{
        action::Action,
        catalog::{CatalogError, SchemaCatalog, fetch_schema_summaries},
        categories::FieldCategories,
        classify::FieldKind,
        field::{Field, SchemaNode, Selectable},
        projector::project,
        resolver::{Hydration, ReferenceResolver},
        schema::{ENGAGEMENT_SCHEMA_KEY, Schema, SchemaError, display_path},
        selection::{SelectionMode, SelectionStore},
    },
};

/// Root field holding the canonical schema URL.
pub const SCHEMA_FIELD_NAME: &str = "schema";
/// Root field holding the event type.
pub const TYPE_FIELD_NAME: &str = "@type";
/// Root field holding the engagement action.
pub const ACTION_FIELD_NAME: &str = "action";

/// Errors raised while opening a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("schema `{0}` is not published by the catalog")]
    UnknownSchema(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// One schema being composed into an event.
///
/// A session owns its schema copy, its selection store and its resolver.
/// Switching schema or version means opening a new session.
pub struct Session {
    schema: Schema,
    store: SelectionStore,
    resolver: ReferenceResolver,
    config: EngineConfig,
}

impl Session {
    /// Start an empty session over an already loaded schema.
    pub fn new(schema: Schema, catalog: Arc<dyn SchemaCatalog>, config: EngineConfig) -> Self {
        Self {
            schema,
            store: SelectionStore::new(),
            resolver: ReferenceResolver::new(catalog),
            config,
        }
    }

    /// Load schema `key` from `catalog` and pre-select its mandatory fields.
    ///
    /// `version` defaults to the latest one; a version the catalog cannot
    /// serve falls back to the latest with a warning. `type_name` picks the
    /// event type when `@type` offers more than one.
    pub async fn open(
        catalog: Arc<dyn SchemaCatalog>,
        config: EngineConfig,
        key: &str,
        version: Option<&str>,
        type_name: Option<&str>,
    ) -> Result<Self, SessionError> {
        let summaries = fetch_schema_summaries(catalog.as_ref(), &config).await?;
        let latest = summaries
            .get(key)
            .cloned()
            .ok_or_else(|| SessionError::UnknownSchema(key.to_string()))?;

        let mut schema = match version {
            Some(version) if version != latest.version => {
                match catalog.fetch_schema(key, version).await {
                    Ok(schema) => schema,
                    Err(e) => {
                        warn!(
                            "falling back to `{key}` version {}: {e}",
                            latest.version
                        );
                        latest
                    }
                }
            }
            _ => latest,
        };

        match catalog.fetch_properties(&schema.id).await {
            Ok(properties) => schema.properties = properties,
            Err(e) if !schema.properties.is_empty() => {
                debug!("keeping bundled root properties of `{}`: {e}", schema.id);
            }
            Err(e) => return Err(e.into()),
        }
        schema.sort_properties();
        info!(
            "opened `{}` version {} with {} root fields",
            schema.key,
            schema.version,
            schema.properties.len()
        );

        let mut session = Self::new(schema, catalog, config);
        session.preselect(type_name);
        Ok(session)
    }

    fn preselect(&mut self, type_name: Option<&str>) {
        if let Some(field) = self.schema.root_field(SCHEMA_FIELD_NAME).cloned() {
            self.select_field(&[], &field);
        }

        if let Some(field) = self.schema.root_field(TYPE_FIELD_NAME).cloned() {
            let variant = match field.type_list.as_slice() {
                [only] => Some(only),
                _ => type_name.and_then(|name| field.variant_by_name(name)),
            };
            if let Some(variant) = variant {
                self.select_field(&[], &field);
                self.select_value(std::slice::from_ref(&field), variant);
            }
        }

        if self.schema.key == ENGAGEMENT_SCHEMA_KEY
            && let Some(field) = self.schema.root_field(ACTION_FIELD_NAME).cloned()
            && let Some(variant) = type_name.and_then(|name| field.variant_by_name(name))
        {
            self.select_field(&[], &field);
            self.select_value(std::slice::from_ref(&field), variant);
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }

    /// Current selection snapshot. Cloning it is cheap and the clone stays
    /// frozen across later changes.
    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    pub fn is_selected(&self, path: &[Field], node: &impl SchemaNode) -> bool {
        self.store.is_selected(path, node)
    }

    pub fn selection_count(&self, path: &[Field]) -> usize {
        self.store.selection_count(path)
    }

    /// The event document projected from the current selection.
    pub fn event(&self) -> Value {
        project(&self.store, &self.schema, &self.config.base_url)
    }

    /// Root fields grouped for presentation.
    pub fn categories(&self) -> FieldCategories<'_> {
        FieldCategories::new(&self.schema.properties, &self.config.categories)
    }

    /// Select `field` under `path`, selecting every unselected ancestor on
    /// the way. Inside a mutually exclusive group (a one-of group or an enum)
    /// the selection replaces the current member. Nodes already selected are
    /// left as they are, together with their selected children.
    pub fn select_field(&mut self, path: &[Field], field: &Field) {
        for depth in 0..=path.len() {
            let (parents, node) = match path.get(depth) {
                Some(ancestor) => (&path[..depth], ancestor),
                None => (path, field),
            };
            if !self.store.is_selected(parents, node) {
                let mode = cascade_mode(parents);
                self.store.set_selection(parents, node, mode);
            }
        }
    }

    /// Deselect `field` under `path` and purge its selected subtree.
    pub fn deselect_field(&mut self, path: &[Field], field: &Field) {
        self.store.set_selection(path, field, SelectionMode::Remove);
    }

    /// Make `value` the only value picked for the field `path` leads to.
    pub fn select_value(&mut self, path: &[Field], value: impl Into<Selectable>) {
        self.store.set_selection(path, value, SelectionMode::Replace);
    }

    /// Select a root field by name. Unknown names are logged and ignored.
    pub fn select_root_field(&mut self, name: &str) {
        match self.schema.root_field(name).cloned() {
            Some(field) => self.select_field(&[], &field),
            None => warn!("no root field named `{name}`"),
        }
    }

    /// Deselect a root field by name. Unknown names are logged and ignored.
    pub fn deselect_root_field(&mut self, name: &str) {
        match self.schema.root_field(name).cloned() {
            Some(field) => self.deselect_field(&[], &field),
            None => warn!("no root field named `{name}`"),
        }
    }

    pub fn clear_all(&mut self) {
        self.store.clear_all();
    }

    /// Hydrate every occurrence of `reference`. Returns how many fields were
    /// filled; fetch failures are logged and fill nothing.
    pub async fn hydrate(&mut self, reference: &str) -> usize {
        match self.resolver.hydrate(&self.schema, reference).await {
            Some(hydration) => self.apply_hydration(&hydration),
            None => 0,
        }
    }

    /// Write a hydration computed earlier into the schema.
    pub fn apply_hydration(&mut self, hydration: &Hydration) -> usize {
        hydration.apply(&mut self.schema)
    }

    /// Resolve a name path, hydrating unresolved references on the way down.
    pub async fn expand<S: AsRef<str>>(&mut self, names: &[S]) -> Result<Vec<Field>, SchemaError> {
        for depth in 1..=names.len() {
            let path = self.schema.resolve_names(&names[..depth])?;
            if let Some(reference) = path
                .last()
                .filter(|field| field.is_unresolved())
                .and_then(|field| field.reference.clone())
            {
                self.hydrate(&reference).await;
            }
        }
        self.schema.resolve_names(names)
    }

    /// Parse and apply one textual action. Returns `false` when the text is
    /// not understood or names a field that does not exist; the selection is
    /// then unchanged.
    pub async fn dispatch(&mut self, text: &str) -> bool {
        match text.parse::<Action>() {
            Ok(action) => self.apply(&action).await,
            Err(e) => {
                warn!("ignoring `{}`: {e}", text.trim());
                false
            }
        }
    }

    /// Apply one action.
    pub async fn apply(&mut self, action: &Action) -> bool {
        let result = match action {
            Action::Select(names) => self.expand(names).await.map(|path| {
                if let Some((field, parents)) = path.split_last() {
                    self.select_field(parents, field);
                }
            }),
            Action::Deselect(names) => self.schema.resolve_names(names).map(|path| {
                if let Some((field, parents)) = path.split_last() {
                    self.deselect_field(parents, field);
                }
            }),
            Action::Value { path, variant } => match self.expand(path).await {
                Ok(path) => self.pick_value(&path, variant),
                Err(e) => Err(e),
            },
            Action::Clear => {
                self.clear_all();
                Ok(())
            }
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("ignoring `{action}`: {e}");
                false
            }
        }
    }

    fn pick_value(&mut self, path: &[Field], name: &str) -> Result<(), SchemaError> {
        let Some((field, parents)) = path.split_last() else {
            return Err(SchemaError::EmptyPath);
        };
        let value: Selectable = match field.variant_by_name(name) {
            Some(variant) => variant.into(),
            None => field
                .child_by_name(name)
                .ok_or_else(|| SchemaError::VariantNotFound {
                    path: display_path(path),
                    name: name.to_string(),
                })?
                .into(),
        };
        self.select_field(parents, field);
        self.select_value(path, value);
        Ok(())
    }
}

fn cascade_mode(parents: &[Field]) -> SelectionMode {
    match parents.last() {
        Some(parent) if FieldKind::of(parent).is_exclusive() => SelectionMode::Replace,
        _ => SelectionMode::Add,
    }
}
