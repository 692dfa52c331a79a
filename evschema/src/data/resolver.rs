//! Lazy hydration of referenced schema subtrees.
//!
//! A field carrying a `reference` but no `properties` has not been fetched
//! yet. [`ReferenceResolver::hydrate`] locates every occurrence of that
//! reference in the schema and produces a [`Hydration`] patch that fills them
//! all at once. Fetches are single-flight: concurrent and repeated requests
//! for one URI share a single catalog call.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, error, warn};

use crate::data::{
    catalog::{CatalogError, SchemaCatalog},
    field::Field,
    schema::{FieldIndexPath, Schema},
};

type FetchResult = Result<Arc<Vec<Field>>, CatalogError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// Properties to write into every occurrence of a reference.
#[derive(Debug, Clone)]
pub struct Hydration {
    pub reference: String,
    pub occurrences: Vec<FieldIndexPath>,
    pub properties: Arc<Vec<Field>>,
}

impl Hydration {
    /// Patch `schema`. Occurrences already holding properties are left
    /// untouched, so applying the same hydration twice is harmless.
    pub fn apply(&self, schema: &mut Schema) -> usize {
        let patched = schema.fill_properties(&self.reference, &self.occurrences, &self.properties);
        debug!(
            "hydrated {patched}/{} occurrences of `{}`",
            self.occurrences.len(),
            self.reference
        );
        patched
    }
}

/// Memoizing, single-flight property fetcher for one schema session.
pub struct ReferenceResolver {
    catalog: Arc<dyn SchemaCatalog>,
    fetches: Mutex<HashMap<String, SharedFetch>>,
}

impl ReferenceResolver {
    pub fn new(catalog: Arc<dyn SchemaCatalog>) -> Self {
        Self {
            catalog,
            fetches: Mutex::new(HashMap::new()),
        }
    }

    /// The catalog this resolver fetches from.
    pub fn catalog(&self) -> &Arc<dyn SchemaCatalog> {
        &self.catalog
    }

    /// Compute the patch hydrating every occurrence of `reference`.
    ///
    /// Returns `None` when there is nothing to do: the reference does not
    /// occur, every occurrence is already hydrated, or the fetch failed. A
    /// failed fetch is logged and leaves the occurrences unresolved; calling
    /// again retries it.
    pub async fn hydrate(&self, schema: &Schema, reference: &str) -> Option<Hydration> {
        let occurrences = schema.reference_occurrences(reference);
        if occurrences.is_empty() {
            debug!("reference `{reference}` does not occur in `{}`", schema.id);
            return None;
        }

        let mut missing = false;
        let mut loaded = None;
        for path in &occurrences {
            match schema.field_at(path) {
                Some(field) if !field.properties.is_empty() => {
                    loaded.get_or_insert(&field.properties);
                }
                _ => missing = true,
            }
        }
        if !missing {
            return None;
        }
        if let Some(properties) = loaded {
            return Some(Hydration {
                reference: reference.to_string(),
                occurrences,
                properties: Arc::new(properties.clone()),
            });
        }

        match self.fetch(reference).await {
            Ok(properties) if properties.is_empty() => {
                warn!("reference `{reference}` resolved to no properties");
                None
            }
            Ok(properties) => Some(Hydration {
                reference: reference.to_string(),
                occurrences,
                properties,
            }),
            Err(e) => {
                error!("failed to fetch properties for `{reference}`: {e}");
                None
            }
        }
    }

    /// Fetch the property list behind `reference`, sharing one catalog call
    /// among every caller. Successful results are memoized; failures are
    /// forgotten so the next call retries.
    pub async fn fetch(&self, reference: &str) -> FetchResult {
        let shared = {
            let mut fetches = self.fetches.lock().unwrap_or_else(PoisonError::into_inner);
            fetches
                .entry(reference.to_string())
                .or_insert_with(|| {
                    debug!("fetching properties for `{reference}`");
                    let catalog = Arc::clone(&self.catalog);
                    let uri = reference.to_string();
                    async move { catalog.fetch_properties(&uri).await.map(Arc::new) }
                        .boxed()
                        .shared()
                })
                .clone()
        };

        let result = shared.clone().await;
        if result.is_err() {
            let mut fetches = self.fetches.lock().unwrap_or_else(PoisonError::into_inner);
            if fetches
                .get(reference)
                .is_some_and(|current| current.ptr_eq(&shared))
            {
                fetches.remove(reference);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    const ARTICLE: &str = "/objects/Article.json/56.json#";

    /// Catalog counting property fetches, optionally failing the first ones.
    struct CountingCatalog {
        calls: AtomicUsize,
        failures: usize,
    }

    impl CountingCatalog {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                failures,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SchemaCatalog for CountingCatalog {
        async fn fetch_schemas(&self) -> Result<Vec<Schema>, CatalogError> {
            Ok(Vec::new())
        }

        async fn fetch_schema(&self, key: &str, version: &str) -> Result<Schema, CatalogError> {
            Err(CatalogError::SchemaNotFound {
                key: key.to_string(),
                version: version.to_string(),
            })
        }

        async fn fetch_properties(&self, reference: &str) -> Result<Vec<Field>, CatalogError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if call < self.failures {
                return Err(CatalogError::Unavailable(format!("{reference}: timeout")));
            }
            Ok(vec![Field::new("Article.headline", "headline")])
        }
    }

    fn schema() -> Schema {
        Schema {
            id: "/events/event.json/326.json#".to_string(),
            properties: vec![
                Field::new("object", "object").one_of().with_properties(vec![
                    Field::new("object.Article", "Article").with_reference(ARTICLE),
                ]),
                Field::new("target", "target").with_properties(vec![
                    Field::new("target.Article", "Article").with_reference(ARTICLE),
                ]),
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_hydrates_every_occurrence() {
        let catalog = CountingCatalog::new(0);
        let resolver = ReferenceResolver::new(catalog.clone());
        let mut s = schema();

        let hydration = resolver.hydrate(&s, ARTICLE).await.unwrap();
        assert_eq!(hydration.apply(&mut s), 2);
        assert_eq!(s.field_at(&[0, 0]).unwrap().properties.len(), 1);
        assert_eq!(s.field_at(&[1, 0]).unwrap().properties.len(), 1);

        assert!(resolver.hydrate(&s, ARTICLE).await.is_none());
        assert_eq!(catalog.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_hydrations_share_one_fetch() {
        let catalog = CountingCatalog::new(0);
        let resolver = ReferenceResolver::new(catalog.clone());
        let mut s = schema();

        let (a, b) = futures::join!(resolver.hydrate(&s, ARTICLE), resolver.hydrate(&s, ARTICLE));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(catalog.calls(), 1);
        assert!(Arc::ptr_eq(&a.properties, &b.properties));

        assert_eq!(a.apply(&mut s), 2);
        assert_eq!(b.apply(&mut s), 0);
        assert_eq!(
            s.field_at(&[0, 0]).unwrap().properties,
            s.field_at(&[1, 0]).unwrap().properties
        );
    }

    #[tokio::test]
    async fn test_partial_hydration_copies_without_fetching() {
        let catalog = CountingCatalog::new(0);
        let resolver = ReferenceResolver::new(catalog.clone());
        let mut s = schema();
        s.field_at_mut(&[0, 0]).unwrap().properties = vec![Field::new("x", "x")];

        let hydration = resolver.hydrate(&s, ARTICLE).await.unwrap();
        assert_eq!(hydration.apply(&mut s), 1);
        assert_eq!(s.field_at(&[1, 0]).unwrap().properties[0].id, "x");
        assert_eq!(catalog.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_schema_unresolved_and_retries() {
        let catalog = CountingCatalog::new(1);
        let resolver = ReferenceResolver::new(catalog.clone());
        let mut s = schema();

        assert!(resolver.hydrate(&s, ARTICLE).await.is_none());
        assert!(s.field_at(&[0, 0]).unwrap().is_unresolved());

        let hydration = resolver.hydrate(&s, ARTICLE).await.unwrap();
        hydration.apply(&mut s);
        assert!(!s.field_at(&[0, 0]).unwrap().is_unresolved());
        assert_eq!(catalog.calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_reference_is_a_no_op() {
        let catalog = CountingCatalog::new(0);
        let resolver = ReferenceResolver::new(catalog.clone());
        assert!(resolver.hydrate(&schema(), "/nope.json#").await.is_none());
        assert_eq!(catalog.calls(), 0);
    }
}
