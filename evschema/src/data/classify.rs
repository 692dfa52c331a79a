use crate::data::field::{Field, FieldType};

/// How a field's children or values are toggled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Terminal leaf with no further configuration surface.
    Single,
    /// Exactly one child or value may be active.
    Radio,
    /// Children are toggled independently.
    Checkbox,
}

/// What a field's configuration surface chooses among.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Closed type variants from `typeList`.
    Value,
    /// Nested fields from `properties`.
    Structural,
    /// Nothing to configure.
    Leaf,
}

impl FieldKind {
    /// Classify a field.
    pub fn of(field: &Field) -> Self {
        let is_enum = field.field_type == Some(FieldType::Enum);
        if field.properties.is_empty() && field.type_list.is_empty() && !is_enum {
            return FieldKind::Single;
        }
        if field.is_one_of_property || is_enum {
            FieldKind::Radio
        } else {
            FieldKind::Checkbox
        }
    }

    /// `true` when selecting a child displaces the current one.
    pub fn is_exclusive(self) -> bool {
        self == FieldKind::Radio
    }
}

impl ConfigSource {
    /// Determine the configuration source of a field. `typeList` wins over
    /// `properties` when both are present.
    pub fn of(field: &Field) -> Self {
        if !field.type_list.is_empty() {
            ConfigSource::Value
        } else if !field.properties.is_empty() {
            ConfigSource::Structural
        } else {
            ConfigSource::Leaf
        }
    }
}

/// `true` when the field is configured by picking one of its values.
pub fn is_value_selection(field: &Field) -> bool {
    ConfigSource::of(field) == ConfigSource::Value
}

/// `true` when a member selected under `parent` is the parent's value rather
/// than a nested field of its own.
pub fn selects_value(parent: &Field) -> bool {
    !parent.type_list.is_empty() || parent.field_type == Some(FieldType::Enum)
}
