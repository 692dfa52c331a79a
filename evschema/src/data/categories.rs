use crate::{config::CategoryConfig, data::field::Field};

/// Root fields split into presentation groups.
#[derive(Debug, Default, PartialEq)]
pub struct FieldCategories<'a> {
    /// Listed main fields, in list order.
    pub main: Vec<&'a Field>,
    /// Unlisted fields, by name.
    pub additional: Vec<&'a Field>,
    /// Listed technical fields, in list order.
    pub technical: Vec<&'a Field>,
}

impl<'a> FieldCategories<'a> {
    /// Group `fields` according to `config`.
    pub fn new(fields: &'a [Field], config: &CategoryConfig) -> Self {
        Self {
            main: ordered_by_list(fields, &config.main),
            additional: additional_fields(fields, config),
            technical: ordered_by_list(fields, &config.technical),
        }
    }
}

fn ordered_by_list<'a>(fields: &'a [Field], list: &[String]) -> Vec<&'a Field> {
    let mut out: Vec<(usize, &Field)> = fields
        .iter()
        .filter_map(|f| list.iter().position(|n| n == &f.name).map(|pos| (pos, f)))
        .collect();
    out.sort_by_key(|(pos, _)| *pos);
    out.into_iter().map(|(_, f)| f).collect()
}

fn additional_fields<'a>(fields: &'a [Field], config: &CategoryConfig) -> Vec<&'a Field> {
    let mut out: Vec<&Field> = fields
        .iter()
        .filter(|f| !config.main.contains(&f.name) && !config.technical.contains(&f.name))
        .collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}
