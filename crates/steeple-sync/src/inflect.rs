//! Table-name inflection.
//!
//! CRUD mutations arrive tagged with plural snake_case table names; the
//! canonical entity names are singular pascal-case. The rules here cover
//! the tables this system owns plus the regular English patterns; new
//! irregulars get added to the table as schemas grow.

/// Singularize a snake_case table name.
#[must_use]
pub fn singularize(table: &str) -> String {
    const IRREGULARS: &[(&str, &str)] = &[("people", "person"), ("children", "child")];

    // Irregulars apply to the last underscore-separated word so that
    // prefixed tables like `household_people` inflect too.
    let (prefix, word) = match table.rfind('_') {
        Some(idx) => (&table[..=idx], &table[idx + 1..]),
        None => ("", table),
    };

    if let Some((_, singular)) = IRREGULARS.iter().find(|(plural, _)| *plural == word) {
        return format!("{prefix}{singular}");
    }

    let singular = if let Some(stem) = word.strip_suffix("ies") {
        if stem.is_empty() {
            word.to_string()
        } else {
            format!("{stem}y")
        }
    } else if word.ends_with("ses")
        || word.ends_with("xes")
        || word.ends_with("zes")
        || word.ends_with("ches")
        || word.ends_with("shes")
    {
        word[..word.len() - 2].to_string()
    } else if word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    };

    format!("{prefix}{singular}")
}

/// Convert a snake_case name to PascalCase.
#[must_use]
pub fn pascal_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Derive the canonical entity name for a table name.
#[must_use]
pub fn table_to_entity_name(table: &str) -> String {
    pascal_case(&singularize(table))
}
