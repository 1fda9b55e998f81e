use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::data::export::{export_events, with_default_extension, ExportOptions};
use crate::data::filter::{run_filter, FilterCriteria};
use crate::data::loader::{self, Workbook};
use crate::data::mapping::{suggest_mapping, suggest_type_selection};
use crate::data::model::{known_type_codes, ColumnMapping, EventRecord, EventTable, Role, TypeCodeSelection};
use crate::geo::reference::reference_transform;
use crate::geo::transformer::CoordinateTransformer;
use crate::task::{BackgroundTask, Progress, TaskContext};

/// Columns of the preview table, in display order.
pub const PREVIEW_COLUMNS: [Role; 8] = [
    Role::Date,
    Role::Type,
    Role::X,
    Role::Y,
    Role::Z,
    Role::Value,
    Role::Comment,
    Role::SourceFile,
];

// ---------------------------------------------------------------------------
// Background work owned by the state
// ---------------------------------------------------------------------------

pub enum PendingTask {
    LoadSheet(BackgroundTask<EventTable>),
    Export(BackgroundTask<(PathBuf, usize)>),
}

impl PendingTask {
    pub fn title(&self) -> &str {
        match self {
            PendingTask::LoadSheet(t) => t.title(),
            PendingTask::Export(t) => t.title(),
        }
    }

    pub fn progress(&self) -> Progress {
        match self {
            PendingTask::LoadSheet(t) => t.progress(),
            PendingTask::Export(t) => t.progress(),
        }
    }

    pub fn can_abort(&self) -> bool {
        match self {
            PendingTask::LoadSheet(t) => t.can_abort(),
            PendingTask::Export(t) => t.can_abort(),
        }
    }

    pub fn cancel(&self) {
        match self {
            PendingTask::LoadSheet(t) => t.cancel(),
            PendingTask::Export(t) => t.cancel(),
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,

    /// Opened workbook (None until the user picks a file).
    pub workbook: Option<Workbook>,

    /// Index into `workbook.sheet_names` of the loaded sheet.
    pub sheet: Option<usize>,

    /// The loaded sheet.
    pub table: Option<EventTable>,

    /// Role → column, rebuilt on every sheet change.
    pub mapping: ColumnMapping,

    /// Type / site toggles and ordering.
    pub criteria: FilterCriteria,

    /// Show and export geodetic coordinates.
    pub apply_transform: bool,

    /// Result of the last filter pass; replaced, never mutated.
    pub filtered: Arc<Vec<EventRecord>>,

    /// Memoized coordinate conversion for the preview.
    pub transformer: CoordinateTransformer,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// At most one background task per user action.
    pub task: Option<PendingTask>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let criteria = FilterCriteria {
            selected_types: TypeCodeSelection::none(),
            selected_sites: config.sites.iter().map(|s| s.name.clone()).collect(),
            group_by_site: config.group_by_site,
        };
        Self {
            apply_transform: config.apply_transform,
            config,
            workbook: None,
            sheet: None,
            table: None,
            mapping: ColumnMapping::new(),
            criteria,
            filtered: Arc::new(Vec::new()),
            transformer: CoordinateTransformer::new(*reference_transform()),
            status_message: None,
            task: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.task.is_some()
    }

    fn report_error(&mut self, context: &str, e: &anyhow::Error) {
        log::error!("{context}: {e:#}");
        self.status_message = Some(format!("{context}: {e:#}"));
    }

    // -- loading --

    /// Open a workbook and start loading its first sheet.
    pub fn open_workbook(&mut self, path: &Path) {
        match loader::open_workbook(path) {
            Ok(workbook) => {
                log::info!("Opened {} with sheets {:?}", path.display(), workbook.sheet_names);
                self.workbook = Some(workbook);
                self.sheet = None;
                self.select_sheet(0);
            }
            Err(e) => self.report_error("Failed to open file", &e),
        }
    }

    /// Start loading sheet `index` in the background.
    pub fn select_sheet(&mut self, index: usize) {
        if self.is_busy() {
            return;
        }
        let Some(workbook) = &self.workbook else {
            return;
        };
        let Some(name) = workbook.sheet_names.get(index).cloned() else {
            return;
        };
        let path = workbook.path.clone();
        let job = move |ctx: &TaskContext| loader::read_sheet(&path, &name, ctx);

        // Rows and mapping of the previous sheet must not outlive the switch.
        self.clear_table();
        self.sheet = Some(index);
        match BackgroundTask::spawn("Loading sheet", true, job) {
            Ok(task) => self.task = Some(PendingTask::LoadSheet(task)),
            Err(e) => self.report_error("Failed to load sheet", &e),
        }
    }

    /// Forget the loaded sheet and everything derived from it.
    fn clear_table(&mut self) {
        self.table = None;
        self.mapping = ColumnMapping::new();
        self.criteria.selected_types = TypeCodeSelection::none();
        self.filtered = Arc::new(Vec::new());
        self.transformer.invalidate();
    }

    /// Ingest a newly loaded sheet: suggest mapping and types, then filter.
    pub fn set_table(&mut self, table: EventTable) {
        if table.is_empty() {
            log::warn!("Sheet has a header but no data rows");
        }
        self.mapping = suggest_mapping(&table.header, &self.config.columns_dir());
        self.criteria.selected_types = suggest_type_selection(&table, &self.mapping);
        self.transformer.invalidate();
        self.table = Some(table);
        self.status_message = None;
        self.refilter();
    }

    // -- filter controls --

    /// Re-run the filter pipeline on the loaded sheet.
    pub fn refilter(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        match run_filter(table, &self.mapping, &self.criteria, &self.config) {
            Ok(rows) => {
                self.filtered = Arc::new(rows);
                if self.status_message.as_deref().is_some_and(|m| m.starts_with("Column mapping")) {
                    self.status_message = None;
                }
            }
            Err(e) => {
                log::warn!("Column mapping: {e}");
                self.filtered = Arc::new(Vec::new());
                self.status_message = Some(format!("Column mapping: {e}"));
            }
        }
    }

    pub fn set_column(&mut self, role: Role, column: &str) {
        self.mapping.set(role, column);
        // Cached coordinates are keyed by row and would still hold the old columns.
        self.transformer.invalidate();
        self.refilter();
    }

    pub fn set_type(&mut self, code: &str, enabled: bool) {
        self.criteria.selected_types.set(code, enabled);
        self.refilter();
    }

    pub fn select_all_types(&mut self) {
        self.criteria.selected_types = TypeCodeSelection::all();
        self.refilter();
    }

    pub fn clear_types(&mut self) {
        self.criteria.selected_types = TypeCodeSelection::none();
        self.refilter();
    }

    pub fn set_site(&mut self, name: &str, enabled: bool) {
        if enabled {
            self.criteria.selected_sites.insert(name.to_string());
        } else {
            self.criteria.selected_sites.remove(name);
        }
        self.refilter();
    }

    pub fn select_all_sites(&mut self) {
        self.criteria.selected_sites = self.config.sites.iter().map(|s| s.name.clone()).collect();
        self.refilter();
    }

    pub fn clear_sites(&mut self) {
        self.criteria.selected_sites = BTreeSet::new();
        self.refilter();
    }

    pub fn set_group_by_site(&mut self, enabled: bool) {
        self.criteria.group_by_site = enabled;
        self.refilter();
    }

    // -- preview --

    /// Display strings for the first `preview_rows` filtered events, in
    /// [`PREVIEW_COLUMNS`] order. With the transform on, X/Y/Z show
    /// converted values, or the raw text when it is not a number.
    pub fn preview(&mut self) -> Vec<[String; 8]> {
        let rows = Arc::clone(&self.filtered);
        rows.iter()
            .take(self.config.preview_rows)
            .map(|rec| {
                let coords = if self.apply_transform {
                    self.transformer
                        .transform_row(rec.row, &rec.x, &rec.y, &rec.z)
                        .ok()
                } else {
                    None
                };
                PREVIEW_COLUMNS.map(|role| match (coords, role) {
                    (Some(p), Role::X) => format!("{:.3}", p[0]),
                    (Some(p), Role::Y) => format!("{:.3}", p[1]),
                    (Some(p), Role::Z) => format!("{:.3}", p[2]),
                    _ => rec.field(role).to_string(),
                })
            })
            .collect()
    }

    // -- export --

    /// Export the current filtered rows in the background.
    pub fn start_export(&mut self, destination: &Path) {
        if self.is_busy() {
            return;
        }
        let destination = with_default_extension(destination);
        let records = Arc::clone(&self.filtered);
        let transform = self.apply_transform.then(|| *reference_transform());
        let decimal_comma = self.config.decimal_comma;

        let job = move |ctx: &TaskContext| -> anyhow::Result<(PathBuf, usize)> {
            let options = ExportOptions {
                transform: transform.as_ref(),
                decimal_comma,
            };
            let n = export_events(&records, &destination, &options, ctx)?;
            Ok((destination, n))
        };
        match BackgroundTask::spawn("Saving file", true, job) {
            Ok(task) => self.task = Some(PendingTask::Export(task)),
            Err(e) => self.report_error("Failed to save", &e),
        }
    }

    // -- task polling --

    /// Collect the result of a finished background task, if any.
    pub fn poll_task(&mut self) {
        let Some(task) = &mut self.task else {
            return;
        };
        match task {
            PendingTask::LoadSheet(t) => match t.try_finish() {
                None => {}
                Some(Ok(table)) => {
                    self.task = None;
                    self.set_table(table);
                }
                Some(Err(e)) => {
                    self.task = None;
                    self.report_error("Failed to load sheet", &e);
                }
            },
            PendingTask::Export(t) => match t.try_finish() {
                None => {}
                Some(Ok((path, n))) => {
                    self.task = None;
                    self.status_message = Some(format!("Saved {n} rows to {}", path.display()));
                }
                Some(Err(e)) => {
                    self.task = None;
                    self.report_error("Failed to save", &e);
                }
            },
        }
    }

    /// Known type codes, for the type checklist.
    pub fn type_codes() -> Vec<String> {
        known_type_codes().collect()
    }
}
