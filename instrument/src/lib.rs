//! Event capture for route evaluation.
//!
//! A `tracing` subscriber that turns structured events into one column table
//! per target, so that search, trial and cascade telemetry can be inspected
//! from tests or dumped to parquet for offline analysis. Columns appear the
//! first time a field is seen and are back-filled with zero values.
//!
//! ```ignore
//! // in route-core:
//! tracing::info!(target: "trial", trial, removed_edges, reached, cost);
//!
//! // in a test:
//! let (report, log) = instrument::capture(|| planner.evaluate(&query));
//! let trials = &log.tables["trial"];
//! assert_eq!(trials.rows, 500);
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Level, Metadata, Subscriber};

/// Values of one field across every row of a table.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    U64(Vec<u64>),
    I64(Vec<i64>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::U64(v) => v.len(),
            ColumnData::I64(v) => v.len(),
            ColumnData::F64(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
            ColumnData::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fill_to(&mut self, rows: usize) {
        let missing = rows.saturating_sub(self.len());
        if missing == 0 {
            return;
        }
        match self {
            ColumnData::U64(v) => v.extend(std::iter::repeat_n(0, missing)),
            ColumnData::I64(v) => v.extend(std::iter::repeat_n(0, missing)),
            ColumnData::F64(v) => v.extend(std::iter::repeat_n(0.0, missing)),
            ColumnData::Bool(v) => v.extend(std::iter::repeat_n(false, missing)),
            ColumnData::Str(v) => v.extend(std::iter::repeat_n(String::new(), missing)),
        }
    }
}

/// Rows of one event target. Columns are kept sorted by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTable {
    pub columns: BTreeMap<String, ColumnData>,
    pub rows: usize,
}

impl EventTable {
    fn align(&mut self) {
        for col in self.columns.values_mut() {
            col.fill_to(self.rows);
        }
    }

    fn column_mut(&mut self, name: &str, empty: impl FnOnce(usize) -> ColumnData) -> &mut ColumnData {
        let rows = self.rows;
        self.columns
            .entry(name.to_string())
            .or_insert_with(|| empty(rows))
    }

    pub fn f64_column(&self, name: &str) -> Option<&[f64]> {
        match self.columns.get(name)? {
            ColumnData::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn u64_column(&self, name: &str) -> Option<&[u64]> {
        match self.columns.get(name)? {
            ColumnData::U64(v) => Some(v),
            _ => None,
        }
    }

    pub fn str_column(&self, name: &str) -> Option<&[String]> {
        match self.columns.get(name)? {
            ColumnData::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Rows where the boolean field `name` is set.
    pub fn bool_count(&self, name: &str) -> usize {
        match self.columns.get(name) {
            Some(ColumnData::Bool(v)) => v.iter().filter(|b| **b).count(),
            _ => 0,
        }
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let columns = self
            .columns
            .iter()
            .map(|(name, col)| match col {
                ColumnData::U64(v) => Column::new(name.into(), v),
                ColumnData::I64(v) => Column::new(name.into(), v),
                ColumnData::F64(v) => Column::new(name.into(), v),
                ColumnData::Bool(v) => Column::new(name.into(), v),
                ColumnData::Str(v) => Column::new(name.into(), v),
            })
            .collect();
        DataFrame::new(columns)
    }
}

/// Tables captured on the current thread, keyed by event target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    pub tables: HashMap<String, EventTable>,
}

impl EventLog {
    pub fn rows(&self, target: &str) -> usize {
        self.tables.get(target).map_or(0, |t| t.rows)
    }

    /// Tables that fail to convert are skipped.
    pub fn to_dataframes(&self) -> HashMap<String, DataFrame> {
        self.tables
            .iter()
            .filter_map(|(target, table)| table.to_dataframe().ok().map(|df| (target.clone(), df)))
            .collect()
    }
}

thread_local! {
    static LOG: RefCell<EventLog> = RefCell::default();
}

struct RowWriter<'a> {
    table: &'a mut EventTable,
}

impl RowWriter<'_> {
    fn push_str(&mut self, field: &Field, value: String) {
        if let ColumnData::Str(v) = self
            .table
            .column_mut(field.name(), |rows| ColumnData::Str(vec![String::new(); rows]))
        {
            v.push(value);
        }
    }
}

impl Visit for RowWriter<'_> {
    fn record_u64(&mut self, field: &Field, value: u64) {
        if let ColumnData::U64(v) = self
            .table
            .column_mut(field.name(), |rows| ColumnData::U64(vec![0; rows]))
        {
            v.push(value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if let ColumnData::I64(v) = self
            .table
            .column_mut(field.name(), |rows| ColumnData::I64(vec![0; rows]))
        {
            v.push(value);
        }
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let ColumnData::F64(v) = self
            .table
            .column_mut(field.name(), |rows| ColumnData::F64(vec![0.0; rows]))
        {
            v.push(value);
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if let ColumnData::Bool(v) = self
            .table
            .column_mut(field.name(), |rows| ColumnData::Bool(vec![false; rows]))
        {
            v.push(value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push_str(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.push_str(field, format!("{value:?}"));
    }
}

/// Records events at or above `min_level` into the thread-local [`EventLog`].
/// Spans are ignored.
pub struct TableSubscriber {
    min_level: Level,
}

impl TableSubscriber {
    pub fn new(min_level: Level) -> Self {
        Self { min_level }
    }
}

impl Default for TableSubscriber {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl Subscriber for TableSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event() && *metadata.level() <= self.min_level
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let target = event.metadata().target();
        LOG.with(|log| {
            let mut log = log.borrow_mut();
            let table = log.tables.entry(target.to_string()).or_default();
            table.align();
            event.record(&mut RowWriter { table: &mut *table });
            table.rows += 1;
            table.align();
        });
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Take everything recorded on this thread.
pub fn take() -> EventLog {
    LOG.with(|log| std::mem::take(&mut *log.borrow_mut()))
}

pub fn reset() {
    LOG.with(|log| *log.borrow_mut() = EventLog::default());
}

/// Run `f` under a scoped INFO subscriber and return its output together
/// with the events it emitted.
pub fn capture<T>(f: impl FnOnce() -> T) -> (T, EventLog) {
    capture_at(Level::INFO, f)
}

pub fn capture_at<T>(min_level: Level, f: impl FnOnce() -> T) -> (T, EventLog) {
    reset();
    let out = tracing::subscriber::with_default(TableSubscriber::new(min_level), f);
    (out, take())
}

/// Write each frame to `{dir}/{target}.parquet`.
pub fn write_parquet(frames: &mut HashMap<String, DataFrame>, dir: &Path) -> PolarsResult<()> {
    let io = |e: std::io::Error| PolarsError::IO {
        error: e.into(),
        msg: None,
    };
    std::fs::create_dir_all(dir).map_err(io)?;
    for (target, df) in frames.iter_mut() {
        let file = std::fs::File::create(dir.join(format!("{target}.parquet"))).map_err(io)?;
        ParquetWriter::new(file).finish(df)?;
    }
    Ok(())
}

fn run_dir_name(label: &str, started: std::time::SystemTime) -> String {
    let secs = started
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let label: String = label
        .chars()
        .take(48)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{label}_{secs}")
}

/// Collects events for one analysis run and writes them to parquet on drop.
///
/// Output lands in `{parent}/{label}_{unix_secs}/` with a `_ready` marker
/// once every table is written. Call [`RunRecorder::frames`] to inspect the
/// data before the recorder goes out of scope.
///
/// The subscriber is scoped to the creating thread, like the log it fills:
/// create the recorder on the thread that runs the analysis.
pub struct RunRecorder {
    dir: PathBuf,
    frames: Option<HashMap<String, DataFrame>>,
    _subscriber: tracing::subscriber::DefaultGuard,
}

impl RunRecorder {
    pub fn new(parent: impl Into<PathBuf>, label: &str) -> Self {
        let dir = parent
            .into()
            .join(run_dir_name(label, std::time::SystemTime::now()));
        reset();
        let subscriber = tracing::subscriber::set_default(TableSubscriber::default());
        Self {
            dir,
            frames: None,
            _subscriber: subscriber,
        }
    }

    /// First call drains the thread-local log; later calls reuse it.
    pub fn frames(&mut self) -> &HashMap<String, DataFrame> {
        self.frames.get_or_insert_with(|| take().to_dataframes())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Drop for RunRecorder {
    fn drop(&mut self) {
        let mut frames = self.frames.take().unwrap_or_else(|| take().to_dataframes());
        if frames.is_empty() {
            return;
        }
        if let Err(e) = write_parquet(&mut frames, &self.dir) {
            eprintln!("RunRecorder({}): parquet write failed: {e}", self.dir.display());
            return;
        }
        if let Err(e) = std::fs::File::create(self.dir.join("_ready")) {
            eprintln!("RunRecorder({}): marker write failed: {e}", self.dir.display());
        }
    }
}
