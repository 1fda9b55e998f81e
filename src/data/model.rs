use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Role – the logical meaning of a spreadsheet column
// ---------------------------------------------------------------------------

/// Logical column roles the pipeline needs, independent of how the source
/// spreadsheet happens to name its columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    X,
    Y,
    Z,
    Value,
    Date,
    Type,
    Comment,
    SourceFile,
}

impl Role {
    /// All roles in the order they are shown and suggested.
    pub const ALL: [Role; 8] = [
        Role::X,
        Role::Y,
        Role::Z,
        Role::Value,
        Role::Date,
        Role::Type,
        Role::Comment,
        Role::SourceFile,
    ];

    /// Human-readable label for the mapping widgets.
    pub fn label(self) -> &'static str {
        match self {
            Role::X => "X",
            Role::Y => "Y",
            Role::Z => "Z",
            Role::Value => "Value",
            Role::Date => "Date",
            Role::Type => "Type",
            Role::Comment => "Comment",
            Role::SourceFile => "Source file",
        }
    }

    /// Name of the suggestion dictionary under `<dict_dir>/cols/`.
    pub fn dictionary_file(self) -> &'static str {
        match self {
            Role::X => "x.txt",
            Role::Y => "y.txt",
            Role::Z => "z.txt",
            Role::Value => "value.txt",
            Role::Date => "time.txt",
            Role::Type => "type_id.txt",
            Role::Comment => "comment.txt",
            Role::SourceFile => "source_filename.txt",
        }
    }

    /// Built-in candidates used when the dictionary file cannot be read.
    pub fn fallback_candidates(self) -> &'static [&'static str] {
        match self {
            Role::X => &["EX", "X"],
            Role::Y => &["EY", "Y"],
            Role::Z => &["EZ", "Z"],
            Role::Value => &["EEnergy", "Energy"],
            Role::Date => &["ELocTime"],
            Role::Type => &["ETypeId", "TypeId"],
            Role::Comment => &["EComment", "Comment"],
            Role::SourceFile => &["ESourseFileName", "ESourceFileName", "SourceFileName"],
        }
    }

    /// Column index assumed when no header name matches.
    pub fn default_index(self) -> usize {
        match self {
            Role::X => 0,
            Role::Y => 1,
            Role::Z => 2,
            Role::Value => 3,
            Role::Date => 4,
            Role::Type => 5,
            Role::Comment => 6,
            Role::SourceFile => 7,
        }
    }

    /// Canonical column name in exported workbooks, `None` for roles that
    /// are not exported.
    pub fn export_name(self) -> Option<&'static str> {
        match self {
            Role::Type => Some("TypeId"),
            Role::X => Some("X"),
            Role::Y => Some("Y"),
            Role::Z => Some("Z"),
            Role::Value => Some("Energy"),
            Role::Date => Some("LocTime"),
            Role::Comment | Role::SourceFile => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// ColumnMapping – role → actual column name
// ---------------------------------------------------------------------------

/// Raised when the mapping does not describe the loaded sheet.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("no column selected for {0}")]
    Unassigned(Role),

    #[error("column '{column}' selected for {role} is not in the sheet header")]
    UnknownColumn { role: Role, column: String },
}

/// Which header column plays which role. Rebuilt whenever a new sheet is
/// selected; always user-overridable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    columns: BTreeMap<Role, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, role: Role, column: impl Into<String>) {
        self.columns.insert(role, column.into());
    }

    pub fn get(&self, role: Role) -> Option<&str> {
        self.columns.get(&role).map(String::as_str)
    }

    /// Resolve every role to a column index of `header`.
    pub fn resolve(&self, header: &[String]) -> Result<ResolvedColumns, MappingError> {
        let mut indices = [0usize; 8];
        for (slot, role) in indices.iter_mut().zip(Role::ALL) {
            let column = self.get(role).ok_or(MappingError::Unassigned(role))?;
            *slot = header
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| MappingError::UnknownColumn {
                    role,
                    column: column.to_string(),
                })?;
        }
        Ok(ResolvedColumns { indices })
    }
}

/// Column indices for every role, in [`Role::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    indices: [usize; 8],
}

impl ResolvedColumns {
    pub fn index(&self, role: Role) -> usize {
        self.indices[role as usize]
    }
}

// ---------------------------------------------------------------------------
// EventTable – one loaded sheet, all cells kept as text
// ---------------------------------------------------------------------------

/// A sheet as loaded: trimmed header names plus rows of raw cell text.
/// Never mutated after loading; the pipeline works on copies.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl EventTable {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let header = header.into_iter().map(|h| h.trim().to_string()).collect();
        Self { header, rows }
    }

    /// Number of data rows (header excluded).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, short rows yield `""`.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(index).map(String::as_str).unwrap_or(""))
    }

    /// Project every row onto the mapped roles.
    pub fn records(&self, mapping: &ColumnMapping) -> Result<Vec<EventRecord>, MappingError> {
        let cols = mapping.resolve(&self.header)?;
        let cell = |row: &[String], role: Role| {
            row.get(cols.index(role)).cloned().unwrap_or_default()
        };
        Ok(self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| EventRecord {
                row: i,
                timestamp: cell(row, Role::Date),
                type_code: cell(row, Role::Type),
                x: cell(row, Role::X),
                y: cell(row, Role::Y),
                z: cell(row, Role::Z),
                value: cell(row, Role::Value),
                comment: cell(row, Role::Comment),
                source_filename: cell(row, Role::SourceFile),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// EventRecord – one row seen through the column mapping
// ---------------------------------------------------------------------------

/// A single seismic event, all fields still text. `row` is the position in
/// the source sheet and serves as the record's identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventRecord {
    pub row: usize,
    pub timestamp: String,
    pub type_code: String,
    pub x: String,
    pub y: String,
    pub z: String,
    pub value: String,
    pub comment: String,
    pub source_filename: String,
}

impl EventRecord {
    pub fn field(&self, role: Role) -> &str {
        match role {
            Role::X => &self.x,
            Role::Y => &self.y,
            Role::Z => &self.z,
            Role::Value => &self.value,
            Role::Date => &self.timestamp,
            Role::Type => &self.type_code,
            Role::Comment => &self.comment,
            Role::SourceFile => &self.source_filename,
        }
    }
}

// ---------------------------------------------------------------------------
// TypeCodeSelection – enabled event types
// ---------------------------------------------------------------------------

/// Number of event type codes the monitoring system knows about.
pub const KNOWN_TYPE_COUNT: usize = 15;

/// The known type codes as they appear in source data ("0" .. "14").
pub fn known_type_codes() -> impl Iterator<Item = String> {
    (0..KNOWN_TYPE_COUNT).map(|i| i.to_string())
}

/// Set of type-code strings currently allowed through the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeCodeSelection {
    codes: BTreeSet<String>,
}

impl TypeCodeSelection {
    /// Every known code selected.
    pub fn all() -> Self {
        Self {
            codes: known_type_codes().collect(),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code.trim())
    }

    pub fn set(&mut self, code: &str, enabled: bool) {
        if enabled {
            self.codes.insert(code.trim().to_string());
        } else {
            self.codes.remove(code.trim());
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for TypeCodeSelection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            codes: iter.into_iter().map(|s| s.into().trim().to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> EventTable {
        EventTable::new(
            vec![" EX".into(), "EY ".into(), "EZ".into(), "EEnergy".into()],
            vec![vec!["1".into(), "2".into()]],
        )
    }

    fn full_mapping(names: &[&str; 8]) -> ColumnMapping {
        let mut mapping = ColumnMapping::new();
        for (role, name) in Role::ALL.into_iter().zip(names) {
            mapping.set(role, *name);
        }
        mapping
    }

    #[test]
    fn header_is_trimmed() {
        let table = sample_table();
        assert_eq!(table.header, vec!["EX", "EY", "EZ", "EEnergy"]);
    }

    #[test]
    fn resolve_reports_unassigned_role() {
        let mut mapping = ColumnMapping::new();
        mapping.set(Role::X, "EX");
        let err = mapping.resolve(&sample_table().header).unwrap_err();
        assert_eq!(err, MappingError::Unassigned(Role::Y));
    }

    #[test]
    fn resolve_reports_unknown_column() {
        let mapping = full_mapping(&["EX", "EY", "EZ", "EEnergy", "T", "TY", "C", "F"]);
        let err = mapping.resolve(&sample_table().header).unwrap_err();
        assert_eq!(
            err,
            MappingError::UnknownColumn {
                role: Role::Date,
                column: "T".into()
            }
        );
    }

    #[test]
    fn records_pad_short_rows() {
        let header: Vec<String> = ["a", "b", "c", "d", "e", "f", "g", "h"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let table = EventTable::new(header, vec![vec!["1".into(), "2".into(), "3".into()]]);
        let mapping = full_mapping(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let records = table.records(&mapping).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].x, "1");
        assert_eq!(records[0].z, "3");
        assert_eq!(records[0].value, "");
        assert_eq!(records[0].field(Role::Y), "2");
    }

    #[test]
    fn type_selection_trims_codes() {
        let selection: TypeCodeSelection = ["3 ", "7"].into_iter().collect();
        assert!(selection.contains("3"));
        assert!(selection.contains(" 7"));
        assert!(!selection.contains("1"));
        assert_eq!(TypeCodeSelection::all().len(), KNOWN_TYPE_COUNT);
    }
}
