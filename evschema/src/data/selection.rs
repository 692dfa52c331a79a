//! Path-addressed selection bookkeeping.
//!
//! A [`SelectionStore`] maps a [`SelectionKey`] (the ids of the fields leading
//! to a scope) to the ordered set of members selected in that scope. Every
//! mutation goes through copy-on-write, so a clone taken before a mutation
//! keeps observing the old contents.

use std::{collections::BTreeMap, fmt, sync::Arc};

use log::debug;

use crate::data::field::{Field, SchemaNode, Selectable};

/// Key of the root scope.
pub const SCHEMA_ROOT_KEY: &str = "_root";
/// Separator placed before every id in a key.
pub const SELECTION_KEY_SEPARATOR: char = '|';

/// Canonical serialization of a selection path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectionKey(String);

impl SelectionKey {
    /// Key of the empty path.
    pub fn root() -> Self {
        Self(SCHEMA_ROOT_KEY.to_string())
    }

    /// Key of the scope reached through `path`.
    pub fn from_path<'a, I>(path: I) -> Self
    where
        I: IntoIterator<Item = &'a Field>,
    {
        path.into_iter()
            .fold(Self::root(), |key, field| key.child(&field.id))
    }

    /// Key of the scope below the member `id` of this scope.
    pub fn child(&self, id: &str) -> Self {
        let mut key = String::with_capacity(self.0.len() + id.len() + 1);
        key.push_str(&self.0);
        key.push(SELECTION_KEY_SEPARATOR);
        key.push_str(id);
        Self(key)
    }

    /// `true` when this key equals `prefix` or lies below it.
    ///
    /// Matching stops at id boundaries: `_root|ab` is not below `_root|a`.
    pub fn is_within(&self, prefix: &SelectionKey) -> bool {
        match self.0.strip_prefix(prefix.0.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with(SELECTION_KEY_SEPARATOR),
            None => false,
        }
    }

    /// The serialized key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How [`SelectionStore::set_selection`] changes a scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionMode {
    /// Insert into the scope; nothing is purged.
    #[default]
    Add,
    /// Make the node the only member; displaced subtrees are purged.
    Replace,
    /// Drop the node and its selected subtree.
    Remove,
}

/// Snapshot of every selected member, keyed by scope.
#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    entries: Arc<BTreeMap<SelectionKey, Vec<Selectable>>>,
    revision: u64,
}

impl SelectionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if `node` is a member of the scope reached through `path`.
    pub fn is_selected(&self, path: &[Field], node: &impl SchemaNode) -> bool {
        self.is_selected_at(&SelectionKey::from_path(path), node.id())
    }

    /// `true` if a member with `id` is selected under `key`.
    pub fn is_selected_at(&self, key: &SelectionKey, id: &str) -> bool {
        self.selected(key).iter().any(|m| m.id() == id)
    }

    /// Number of members selected in the scope reached through `path`.
    pub fn selection_count(&self, path: &[Field]) -> usize {
        self.selected(&SelectionKey::from_path(path)).len()
    }

    /// Members selected under `key`, in selection order. Unknown keys read as
    /// empty.
    pub fn selected(&self, key: &SelectionKey) -> &[Selectable] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of non-empty scopes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over scopes and their members in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&SelectionKey, &[Selectable])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Counter bumped by every mutation that changes the contents.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply one selection change in place.
    pub fn set_selection(
        &mut self,
        path: &[Field],
        node: impl Into<Selectable>,
        mode: SelectionMode,
    ) {
        let key = SelectionKey::from_path(path);
        self.set_selection_at(key, node.into(), mode);
    }

    /// Apply one selection change and return the resulting snapshot, leaving
    /// `self` untouched.
    pub fn with_selection(
        &self,
        path: &[Field],
        node: impl Into<Selectable>,
        mode: SelectionMode,
    ) -> Self {
        let mut next = self.clone();
        next.set_selection(path, node, mode);
        next
    }

    /// Apply one selection change to the scope `key`.
    pub fn set_selection_at(&mut self, key: SelectionKey, node: Selectable, mode: SelectionMode) {
        debug!("selection {mode:?} `{}` at {key}", node.id());
        match mode {
            SelectionMode::Add => self.add(key, node),
            SelectionMode::Replace => self.replace(key, node),
            SelectionMode::Remove => self.remove(key, node.id()),
        }
    }

    /// Drop every selection.
    pub fn clear_all(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.entries = Arc::new(BTreeMap::new());
        self.bump_revision();
    }

    fn add(&mut self, key: SelectionKey, node: Selectable) {
        if self.is_selected_at(&key, node.id()) {
            return;
        }
        Arc::make_mut(&mut self.entries)
            .entry(key)
            .or_default()
            .push(node);
        self.bump_revision();
    }

    fn replace(&mut self, key: SelectionKey, node: Selectable) {
        let mut purge: Vec<SelectionKey> = self
            .selected(&key)
            .iter()
            .filter(|m| m.id() != node.id())
            .map(|m| key.child(m.id()))
            .collect();
        purge.push(key.child(node.id()));

        let entries = Arc::make_mut(&mut self.entries);
        for prefix in &purge {
            purge_downstream(entries, prefix);
        }
        entries.insert(key, vec![node]);
        self.bump_revision();
    }

    fn remove(&mut self, key: SelectionKey, id: &str) {
        let downstream = key.child(id);
        let has_downstream = self.entries.keys().any(|k| k.is_within(&downstream));
        if !self.is_selected_at(&key, id) && !has_downstream {
            return;
        }

        let entries = Arc::make_mut(&mut self.entries);
        if let Some(members) = entries.get_mut(&key) {
            members.retain(|m| m.id() != id);
            if members.is_empty() {
                entries.remove(&key);
            }
        }
        purge_downstream(entries, &downstream);
        self.bump_revision();
    }

    fn bump_revision(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

fn purge_downstream(entries: &mut BTreeMap<SelectionKey, Vec<Selectable>>, prefix: &SelectionKey) {
    entries.retain(|key, _| !key.is_within(prefix));
}
