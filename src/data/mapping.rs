use std::path::Path;

use super::dictionary::read_entries;
use super::model::{known_type_codes, ColumnMapping, EventTable, Role, TypeCodeSelection};

/// Candidate column names for `role`: the user dictionary
/// `<cols_dir>/<role file>`, or the built-in list if it cannot be read.
pub fn candidates(role: Role, cols_dir: &Path) -> Vec<String> {
    read_entries(&cols_dir.join(role.dictionary_file())).unwrap_or_else(|| {
        role.fallback_candidates()
            .iter()
            .map(|s| s.to_string())
            .collect()
    })
}

/// Suggest the header column for `role`.
///
/// The first header name (trimmed) found among the candidates wins. With no
/// match the role's default position is used, or the last column when the
/// header is too short. `None` only for an empty header.
pub fn suggest(header: &[String], role: Role, cols_dir: &Path) -> Option<usize> {
    let last = header.len().checked_sub(1)?;
    let candidates = candidates(role, cols_dir);
    let found = header
        .iter()
        .position(|name| candidates.iter().any(|c| c == name.trim()));
    Some(found.unwrap_or_else(|| role.default_index().min(last)))
}

/// Suggest a column for every role.
pub fn suggest_mapping(header: &[String], cols_dir: &Path) -> ColumnMapping {
    let mut mapping = ColumnMapping::new();
    for role in Role::ALL {
        if let Some(i) = suggest(header, role, cols_dir) {
            mapping.set(role, header[i].clone());
        }
    }
    mapping
}

/// Pre-select the known type codes that actually occur in the mapped type
/// column. Empty when the type role is not mapped to a header column.
pub fn suggest_type_selection(table: &EventTable, mapping: &ColumnMapping) -> TypeCodeSelection {
    let Some(index) = mapping
        .get(Role::Type)
        .and_then(|name| table.header.iter().position(|h| h == name))
    else {
        return TypeCodeSelection::none();
    };

    let mut selection = TypeCodeSelection::none();
    for code in known_type_codes() {
        if table.column(index).any(|v| v.trim() == code) {
            selection.set(&code, true);
        }
    }
    selection
}
