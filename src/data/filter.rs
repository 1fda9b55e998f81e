use std::collections::BTreeSet;

use super::blacklist::{load_sites, SiteDefinition};
use super::model::{ColumnMapping, EventRecord, EventTable, MappingError, TypeCodeSelection};
use crate::config::AppConfig;

/// Width of the filename tail that identifies a site (".KIR", ".RAS").
pub const SITE_SUFFIX_WIDTH: usize = 4;

// ---------------------------------------------------------------------------
// Filter criteria: what the user has switched on
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    /// Type codes allowed through.
    pub selected_types: TypeCodeSelection,
    /// Names of the sites whose rows are kept. Empty keeps nothing.
    pub selected_sites: BTreeSet<String>,
    /// Order the result by the site part of the source filename.
    pub group_by_site: bool,
}

// ---------------------------------------------------------------------------
// Row filter
// ---------------------------------------------------------------------------

/// Return the records passing every stage, as a fresh sequence.
///
/// A record is kept when:
/// * X, Y, Z and value are non-blank
/// * its type code is selected
/// * its source filename ends with the suffix of a selected site
/// * no site owning its filename blacklists its comment
///
/// With `group_by_site` the result is stably sorted by the filename's
/// trailing [`SITE_SUFFIX_WIDTH`] characters.
pub fn filter_events(
    records: &[EventRecord],
    criteria: &FilterCriteria,
    sites: &[SiteDefinition],
) -> Vec<EventRecord> {
    let selected_suffixes: Vec<&str> = sites
        .iter()
        .filter(|site| criteria.selected_sites.contains(&site.name))
        .map(|site| site.suffix.as_str())
        .collect();

    let mut kept: Vec<EventRecord> = records
        .iter()
        .filter(|rec| {
            !is_blank(&rec.x) && !is_blank(&rec.y) && !is_blank(&rec.z) && !is_blank(&rec.value)
        })
        .filter(|rec| criteria.selected_types.contains(&rec.type_code))
        .filter(|rec| {
            selected_suffixes
                .iter()
                .any(|suffix| rec.source_filename.ends_with(suffix))
        })
        .filter(|rec| {
            sites
                .iter()
                .filter(|site| site.owns(&rec.source_filename))
                .all(|site| !site.blacklist.matches(&rec.comment))
        })
        .cloned()
        .collect();

    if criteria.group_by_site {
        kept.sort_by(|a, b| site_key(&a.source_filename).cmp(site_key(&b.source_filename)));
    }
    kept
}

/// Resolve `mapping` against `table`, re-read the site blacklists and filter.
///
/// Blacklists are loaded on every call so edits to the files apply to the
/// next run.
pub fn run_filter(
    table: &EventTable,
    mapping: &ColumnMapping,
    criteria: &FilterCriteria,
    config: &AppConfig,
) -> Result<Vec<EventRecord>, MappingError> {
    let records = table.records(mapping)?;
    let sites = load_sites(&config.sites, &config.dict_dir);
    let filtered = filter_events(&records, criteria, &sites);
    log::debug!("Filter kept {} of {} rows", filtered.len(), records.len());
    Ok(filtered)
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Trailing site part of a filename, the whole name when shorter.
fn site_key(filename: &str) -> &str {
    match filename.char_indices().rev().nth(SITE_SUFFIX_WIDTH - 1) {
        Some((i, _)) => &filename[i..],
        None => filename,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::blacklist::Blacklist;
    use crate::data::model::Role;
    use std::fs;

    fn rec(row: usize, x: &str, type_code: &str, comment: &str, file: &str) -> EventRecord {
        EventRecord {
            row,
            timestamp: "2024-01-01 00:00:00".into(),
            type_code: type_code.into(),
            x: x.into(),
            y: "2".into(),
            z: "3".into(),
            value: "10".into(),
            comment: comment.into(),
            source_filename: file.into(),
        }
    }

    fn sites(kir: &[&str], ras: &[&str]) -> Vec<SiteDefinition> {
        vec![
            SiteDefinition::new("Kirovsky", ".KIR", Blacklist::from_patterns(kir)),
            SiteDefinition::new("Rasvumchorrsky", ".RAS", Blacklist::from_patterns(ras)),
        ]
    }

    fn criteria(types: &[&str], site_names: &[&str], group: bool) -> FilterCriteria {
        FilterCriteria {
            selected_types: types.iter().copied().collect(),
            selected_sites: site_names.iter().map(|s| s.to_string()).collect(),
            group_by_site: group,
        }
    }

    #[test]
    fn blacklisted_and_blank_rows_are_dropped() {
        let records = vec![
            rec(0, "1", "3", "blast test", "a.KIR"),
            rec(1, "", "3", "ok", "b.KIR"),
        ];
        let out = filter_events(
            &records,
            &criteria(&["3"], &["Kirovsky"], false),
            &sites(&["blast*"], &[]),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn blank_required_fields_never_pass() {
        let mut blank_value = rec(0, "1", "3", "", "a.KIR");
        blank_value.value = "  ".into();
        let mut blank_z = rec(1, "1", "3", "", "a.KIR");
        blank_z.z = String::new();
        let mut blank_y = rec(2, "1", "3", "", "a.KIR");
        blank_y.y = String::new();
        let ok = rec(3, "1", "3", "", "a.KIR");

        let out = filter_events(
            &[blank_value, blank_z, blank_y, ok],
            &criteria(&["3"], &["Kirovsky"], false),
            &sites(&[], &[]),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].row, 3);
    }

    #[test]
    fn type_allow_list() {
        let records = vec![
            rec(0, "1", "3", "", "a.KIR"),
            rec(1, "1", "4", "", "a.KIR"),
            rec(2, "1", " 3 ", "", "a.KIR"),
        ];
        let out = filter_events(
            &records,
            &criteria(&["3"], &["Kirovsky"], false),
            &sites(&[], &[]),
        );
        let rows: Vec<usize> = out.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![0, 2]);
    }

    #[test]
    fn blacklist_applies_only_to_owning_site() {
        let records = vec![
            rec(0, "1", "1", "blast", "a.KIR"),
            rec(1, "1", "1", "blast", "a.RAS"),
            rec(2, "1", "1", "noise", "a.RAS"),
            rec(3, "1", "1", "noise", "a.KIR"),
        ];
        let out = filter_events(
            &records,
            &criteria(&["1"], &["Kirovsky", "Rasvumchorrsky"], false),
            &sites(&["blast"], &["noise"]),
        );
        let rows: Vec<usize> = out.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![1, 3]);
    }

    #[test]
    fn rows_of_unselected_sites_are_dropped() {
        let records = vec![rec(0, "1", "1", "", "a.KIR")];
        let out = filter_events(
            &records,
            &criteria(&["1"], &["Rasvumchorrsky"], false),
            &sites(&[], &[]),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn no_site_selected_keeps_nothing() {
        let records = vec![rec(0, "1", "1", "", "a.KIR"), rec(1, "1", "1", "", "b.RAS")];
        let out = filter_events(&records, &criteria(&["1"], &[], false), &sites(&[], &[]));
        assert!(out.is_empty());
    }

    #[test]
    fn files_of_unknown_sites_are_dropped() {
        let records = vec![rec(0, "1", "1", "", "a.XYZ"), rec(1, "1", "1", "", "KIR")];
        let out = filter_events(
            &records,
            &criteria(&["1"], &["Kirovsky", "Rasvumchorrsky"], false),
            &sites(&[], &[]),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn grouping_is_stable_by_site_suffix() {
        let records = vec![
            rec(0, "1", "1", "", "x1.RAS"),
            rec(1, "1", "1", "", "x2.KIR"),
            rec(2, "1", "1", "", "x3.RAS"),
            rec(3, "1", "1", "", "x4.KIR"),
        ];
        let both = ["Kirovsky", "Rasvumchorrsky"];

        let grouped = filter_events(&records, &criteria(&["1"], &both, true), &sites(&[], &[]));
        let rows: Vec<usize> = grouped.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![1, 3, 0, 2]);

        let ungrouped = filter_events(&records, &criteria(&["1"], &both, false), &sites(&[], &[]));
        let rows: Vec<usize> = ungrouped.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![0, 1, 2, 3]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let records = vec![
            rec(0, "1", "1", "blast", "a.KIR"),
            rec(1, "1", "2", "", "b.RAS"),
            rec(2, "", "1", "", "c.RAS"),
            rec(3, "1", "1", "", "d.RAS"),
            rec(4, "1", "1", "", "e.KIR"),
        ];
        let c = criteria(&["1"], &["Kirovsky", "Rasvumchorrsky"], true);
        let s = sites(&["blast*"], &[]);

        let once = filter_events(&records, &c, &s);
        let twice = filter_events(&once, &c, &s);
        assert_eq!(once, twice);
        assert_eq!(records.len(), 5);
    }

    #[test]
    fn site_key_handles_short_and_multibyte_names() {
        assert_eq!(site_key("event.KIR"), ".KIR");
        assert_eq!(site_key("KIR"), "KIR");
        assert_eq!(site_key("событие.RAS"), ".RAS");
        assert_eq!(site_key("ёжик"), "ёжик");
    }

    #[test]
    fn run_filter_rereads_blacklists() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("blacklist")).unwrap();
        let config = AppConfig {
            dict_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };

        let header = ["EX", "EY", "EZ", "EEnergy", "ELocTime", "ETypeId", "EComment", "SourceFileName"];
        let table = EventTable::new(
            header.iter().map(|s| s.to_string()).collect(),
            vec![["1", "2", "3", "4", "t", "1", "blast 5", "f.KIR"]
                .iter()
                .map(|s| s.to_string())
                .collect()],
        );
        let mut mapping = ColumnMapping::new();
        for (role, name) in Role::ALL.into_iter().zip(header) {
            mapping.set(role, name);
        }
        let c = criteria(&["1"], &["Kirovsky"], true);

        assert_eq!(run_filter(&table, &mapping, &c, &config).unwrap().len(), 1);

        fs::write(dir.path().join("blacklist/kir.txt"), "blast *\n").unwrap();
        assert!(run_filter(&table, &mapping, &c, &config).unwrap().is_empty());
    }

    #[test]
    fn run_filter_reports_bad_mapping() {
        let config = AppConfig::default();
        let table = EventTable::new(vec!["EX".into()], vec![]);
        let err = run_filter(&table, &ColumnMapping::new(), &FilterCriteria::default(), &config)
            .unwrap_err();
        assert_eq!(err, MappingError::Unassigned(Role::X));
    }
}
