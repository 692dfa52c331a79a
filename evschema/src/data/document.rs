use serde_json::{Map, Value};

/// One step of a document path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Member of an object.
    Key(String),
    /// Position in an array.
    Index(usize),
}

impl Segment {
    pub fn key(key: impl Into<String>) -> Self {
        Segment::Key(key.into())
    }
}

/// Write `value` at `path` inside `doc`, creating intermediate containers.
///
/// A step that meets a missing slot or a scalar replaces it with an object
/// (for [`Segment::Key`]) or an array (for [`Segment::Index`]). Arrays are
/// padded with `null` up to the written index. An empty path replaces `doc`.
pub fn set_path(doc: &mut Value, path: &[Segment], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        *doc = value;
        return;
    };
    let slot = match first {
        Segment::Key(key) => {
            if !doc.is_object() {
                *doc = Value::Object(Map::new());
            }
            let Value::Object(map) = doc else {
                return;
            };
            map.entry(key.clone()).or_insert(Value::Null)
        }
        Segment::Index(idx) => {
            if !doc.is_array() {
                *doc = Value::Array(Vec::new());
            }
            let Value::Array(items) = doc else {
                return;
            };
            if items.len() <= *idx {
                items.resize(*idx + 1, Value::Null);
            }
            &mut items[*idx]
        }
    };
    set_path(slot, rest, value);
}
