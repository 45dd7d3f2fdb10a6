//! The per-directory results table and the records it persists.
//!
//! One row per image, keyed by `file_path`. The table is the source of
//! truth: every [`ResultStore::upsert`] re-reads it from disk, replaces
//! only the affected rows, and writes it back, so rows and columns
//! written by other tools survive.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use hrr_pipeline::{ImageRecord, PipelineError, RecordSnapshot, RoiCell};

use crate::config::AnalysisConfig;
use crate::scan::scan_images;
use crate::table::Table;

/// Key column of the results table.
pub const KEY_COLUMN: &str = "file_path";

/// Columns written for every record, in table order.
pub const COLUMNS: [&str; 9] = [
    KEY_COLUMN,
    "liver_locations",
    "kidney_locations",
    "mean_liver",
    "std_liver",
    "mean_kidney",
    "std_kidney",
    "ratio",
    "ratio_std",
];

/// Raw pixel columns that tables using [`HEADER_ALIASES`] may carry.
/// They are dropped on write.
const SAMPLE_COLUMNS: [&str; 2] = ["liver_pixels", "kidney_pixels"];

/// Alternative header names accepted on read, with the [`COLUMNS`] name
/// each one stands for. A table using them is saved back under the
/// current names.
const HEADER_ALIASES: [(&str, &str); 7] = [
    ("file_name", KEY_COLUMN),
    ("liver_mean", "mean_liver"),
    ("liver_std", "std_liver"),
    ("kidney_mean", "mean_kidney"),
    ("kidney_std", "std_kidney"),
    ("hepatic_renal_ratio", "ratio"),
    ("hepatic_renal_ratio_std", "ratio_std"),
];

/// `(set, required)` indices into [`COLUMNS`]: a row with the first
/// statistic must also have the second.
const PAIRED_COLUMNS: [(usize, usize); 5] = [(3, 4), (4, 3), (5, 6), (6, 5), (8, 7)];

/// Errors that can occur while loading or saving the results table.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem access failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: std::io::Error,
    },

    /// The table could not be parsed or written as CSV.
    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        /// Table path.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: csv::Error,
    },

    /// A required column is absent from the table.
    #[error("{} has no {column:?} column", .path.display())]
    MissingColumn {
        /// Table path.
        path: PathBuf,
        /// Name of the missing column.
        column: &'static str,
    },

    /// A row's ROI cells could not be decoded or encoded.
    #[error("row {file_path}: {source}")]
    Decode {
        /// Key of the offending row.
        file_path: String,
        /// Underlying cause.
        #[source]
        source: PipelineError,
    },

    /// A numeric cell holds something other than a number, or is blank
    /// while its paired statistic is set.
    #[error("row {file_path}: column {column} holds {value:?}, expected a number")]
    InvalidNumber {
        /// Key of the offending row.
        file_path: String,
        /// Column name.
        column: &'static str,
        /// Cell text.
        value: String,
    },

    /// Two rows share the same key.
    #[error("{} lists {file_path} more than once", .path.display())]
    DuplicateKey {
        /// Table path.
        path: PathBuf,
        /// The repeated key.
        file_path: String,
    },
}

/// Records of one analysis directory, backed by its results table.
#[derive(Debug, Clone)]
pub struct ResultStore {
    directory: PathBuf,
    config: AnalysisConfig,
    records: Vec<ImageRecord>,
}

impl ResultStore {
    /// Open the results table in `dir`, creating it first if absent.
    ///
    /// A new table gets one row per image found by the directory scan,
    /// in path order. Either way the records are then read back from
    /// the table, so a fresh store and a reopened one load identically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be scanned, or
    /// any error from reading or writing the table.
    pub fn open_or_initialize(
        dir: impl Into<PathBuf>,
        config: &AnalysisConfig,
    ) -> Result<Self, StoreError> {
        let directory = dir.into();
        let table_path = config.results_path(&directory);

        if !table_path.exists() {
            let images =
                scan_images(&directory, &config.image_extensions).map_err(|source| {
                    StoreError::Io {
                        path: directory.clone(),
                        source,
                    }
                })?;
            let mut table = Table::new(COLUMNS);
            for image in &images {
                let record = ImageRecord::new(image.to_string_lossy());
                write_row(&mut table, &record.snapshot())?;
            }
            table.write(&table_path)?;
            log::info!(
                "created {} with {} images",
                table_path.display(),
                images.len()
            );
        }

        let records = load_records(&table_path)?;
        log::debug!(
            "loaded {} records from {}",
            records.len(),
            table_path.display()
        );
        Ok(Self {
            directory,
            config: config.clone(),
            records,
        })
    }

    /// The analysis directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Configuration the store was opened with.
    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Location of the results table.
    #[must_use]
    pub fn table_path(&self) -> PathBuf {
        self.config.results_path(&self.directory)
    }

    /// All records in table order.
    #[must_use]
    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the store holds no records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record keyed by `file_path`.
    #[must_use]
    pub fn record(&self, file_path: &str) -> Option<&ImageRecord> {
        self.records.iter().find(|r| r.file_path() == file_path)
    }

    /// Persist one record, then adopt it as the in-memory copy.
    ///
    /// # Errors
    ///
    /// See [`upsert_all`](Self::upsert_all).
    pub fn upsert(&mut self, record: &ImageRecord) -> Result<(), StoreError> {
        self.upsert_all(std::slice::from_ref(record))
    }

    /// Persist several records in a single read/modify/write of the table.
    ///
    /// Each record's row is overwritten, or appended if the table has no
    /// row for its `file_path`. Every other row and every column outside
    /// the record schema is kept. Raw pixel samples are never written.
    ///
    /// # Errors
    ///
    /// Returns any error from reading or writing the table.
    pub fn upsert_all(&mut self, records: &[ImageRecord]) -> Result<(), StoreError> {
        let path = self.table_path();
        let mut table = read_table(&path)?;
        table.arrange_columns(&COLUMNS);
        for column in SAMPLE_COLUMNS {
            table.remove_column(column);
        }
        for record in records {
            write_row(&mut table, &record.snapshot())?;
        }
        table.write(&path)?;
        log::debug!("saved {} records to {}", records.len(), path.display());

        for record in records {
            match self
                .records
                .iter_mut()
                .find(|r| r.file_path() == record.file_path())
            {
                Some(slot) => *slot = record.clone(),
                None => self.records.push(record.clone()),
            }
        }
        Ok(())
    }

    /// Re-read every record from the table, dropping unsaved edits.
    ///
    /// # Errors
    ///
    /// Returns any error from reading the table.
    pub fn reload(&mut self) -> Result<(), StoreError> {
        self.records = load_records(&self.table_path())?;
        Ok(())
    }
}

/// Read the table at `path`, mapping [`HEADER_ALIASES`] to current names.
fn read_table(path: &Path) -> Result<Table, StoreError> {
    let mut table = Table::read(path)?;
    for (alias, name) in HEADER_ALIASES {
        if table.rename_column(alias, name) {
            log::debug!("{}: reading column {alias} as {name}", path.display());
        }
    }
    Ok(table)
}

/// Overwrite (or append) the row keyed by `snapshot.file_path`.
///
/// `table` must already contain every column in [`COLUMNS`].
fn write_row(table: &mut Table, snapshot: &RecordSnapshot) -> Result<(), StoreError> {
    let encode = |cell: &RoiCell| {
        cell.to_text().map_err(|source| StoreError::Decode {
            file_path: snapshot.file_path.clone(),
            source,
        })
    };
    let cells = [
        snapshot.file_path.clone(),
        encode(&snapshot.liver_locations)?,
        encode(&snapshot.kidney_locations)?,
        format_number(snapshot.mean_liver),
        format_number(snapshot.std_liver),
        format_number(snapshot.mean_kidney),
        format_number(snapshot.std_kidney),
        format_number(snapshot.ratio),
        format_number(snapshot.ratio_std),
    ];

    let Some(key) = table.column_index(KEY_COLUMN) else {
        return Ok(());
    };
    let row = table
        .find_row(key, &snapshot.file_path)
        .unwrap_or_else(|| table.push_row());
    for (name, value) in COLUMNS.iter().zip(cells) {
        if let Some(column) = table.column_index(name) {
            table.set(row, column, value);
        }
    }
    Ok(())
}

fn load_records(path: &Path) -> Result<Vec<ImageRecord>, StoreError> {
    let table = read_table(path)?;
    let key = table
        .column_index(KEY_COLUMN)
        .ok_or_else(|| StoreError::MissingColumn {
            path: path.to_path_buf(),
            column: KEY_COLUMN,
        })?;
    let columns = COLUMNS.map(|name| table.column_index(name));

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let file_path = table.get(row, key).unwrap_or_default().to_owned();
        if !seen.insert(file_path.clone()) {
            return Err(StoreError::DuplicateKey {
                path: path.to_path_buf(),
                file_path,
            });
        }

        let cell = |index: usize| {
            columns[index]
                .and_then(|column| table.get(row, column))
                .unwrap_or_default()
        };
        let mut numbers = [None; COLUMNS.len()];
        for (index, value) in numbers.iter_mut().enumerate().skip(3) {
            *value = parse_number(&file_path, COLUMNS[index], cell(index))?;
        }
        if let Some(&(_, blank)) = PAIRED_COLUMNS
            .iter()
            .find(|&&(set, required)| numbers[set].is_some() && numbers[required].is_none())
        {
            return Err(StoreError::InvalidNumber {
                file_path,
                column: COLUMNS[blank],
                value: cell(blank).to_owned(),
            });
        }

        let snapshot = RecordSnapshot {
            file_path: file_path.clone(),
            liver_locations: RoiCell::Encoded(cell(1).to_owned()),
            kidney_locations: RoiCell::Encoded(cell(2).to_owned()),
            mean_liver: numbers[3],
            std_liver: numbers[4],
            mean_kidney: numbers[5],
            std_kidney: numbers[6],
            ratio: numbers[7],
            ratio_std: numbers[8],
        };
        let record = ImageRecord::from_snapshot(snapshot).map_err(|source| StoreError::Decode {
            file_path: file_path.clone(),
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

fn format_number(value: Option<f64>) -> String {
    value.map_or_else(String::new, |v| v.to_string())
}

fn parse_number(
    file_path: &str,
    column: &'static str,
    text: &str,
) -> Result<Option<f64>, StoreError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|_| StoreError::InvalidNumber {
            file_path: file_path.to_owned(),
            column,
            value: text.to_owned(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hrr_pipeline::{EllipseRoi, GrayImage, Structure};
    use image::Luma;

    use super::*;

    fn touch_images(dir: &Path, names: &[&str]) {
        for name in names {
            GrayImage::from_pixel(8, 8, Luma([90]))
                .save_with_format(dir.join(name), image::ImageFormat::Tiff)
                .unwrap();
        }
    }

    fn roi(cx: f64, cy: f64, rx: f64, ry: f64) -> EllipseRoi {
        EllipseRoi::new(cx, cy, rx, ry).unwrap()
    }

    #[test]
    fn initializes_one_row_per_image_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        touch_images(dir.path(), &["b.tif", "a.tif"]);
        std::fs::write(dir.path().join("readme.txt"), "x").unwrap();

        let store = ResultStore::open_or_initialize(dir.path(), &AnalysisConfig::default()).unwrap();
        let names: Vec<_> = store
            .records()
            .iter()
            .map(|r| Path::new(r.file_path()).file_name().unwrap().to_owned())
            .collect();
        assert_eq!(names, ["a.tif", "b.tif"]);
        assert!(store.records().iter().all(|r| !r.is_annotated()));

        let table = Table::read(&store.table_path()).unwrap();
        assert_eq!(table.headers(), COLUMNS);
        assert_eq!(table.get(0, 1), Some("[]"));
        assert_eq!(table.get(0, 3), Some(""));
    }

    #[test]
    fn initialization_is_deterministic() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        for dir in [&first, &second] {
            touch_images(dir.path(), &["c.tif", "a.tiff", "b.tif"]);
        }
        let config = AnalysisConfig::default();
        let a = ResultStore::open_or_initialize(first.path(), &config).unwrap();
        let b = ResultStore::open_or_initialize(second.path(), &config).unwrap();

        let names = |s: &ResultStore| -> Vec<String> {
            s.records()
                .iter()
                .map(|r| Path::new(r.file_path()).file_name().unwrap().to_string_lossy().into_owned())
                .collect()
        };
        assert_eq!(names(&a), names(&b));
        assert_eq!(names(&a), ["a.tiff", "b.tif", "c.tif"]);
    }

    #[test]
    fn reopening_the_same_directory_loads_the_same_table() {
        let dir = tempfile::tempdir().unwrap();
        touch_images(dir.path(), &["c.tif", "a.tiff", "b.tif"]);
        let config = AnalysisConfig::default();
        let table_path = config.results_path(dir.path());

        let first = ResultStore::open_or_initialize(dir.path(), &config).unwrap();
        let first_table = std::fs::read(&table_path).unwrap();
        let second = ResultStore::open_or_initialize(dir.path(), &config).unwrap();
        let second_table = std::fs::read(&table_path).unwrap();

        let keys = |s: &ResultStore| -> Vec<String> {
            s.records()
                .iter()
                .map(|r| r.file_path().to_owned())
                .collect()
        };
        assert_eq!(keys(&first), keys(&second));
        assert_eq!(first_table, second_table);
        for store in [&first, &second] {
            assert!(store.records().iter().all(|r| r.statistics().is_none()));
        }

        let table = Table::read(&table_path).unwrap();
        assert_eq!(table.len(), 3);
        for row in 0..table.len() {
            for column in 3..COLUMNS.len() {
                assert_eq!(table.get(row, column), Some(""), "row {row} column {column}");
            }
        }
    }

    #[test]
    fn upsert_round_trips_rois_and_statistics() {
        let dir = tempfile::tempdir().unwrap();
        touch_images(dir.path(), &["a.tif"]);
        let config = AnalysisConfig::default();
        let mut store = ResultStore::open_or_initialize(dir.path(), &config).unwrap();

        let mut record = store.records()[0].clone();
        record.add_roi(Structure::Liver, roi(3.0, 3.0, 1.5, 1.5));
        record.add_roi(Structure::Kidney, roi(5.0, 5.0, 1.0, 2.0));
        record.add_roi(Structure::Kidney, roi(1.0 / 3.0, 2.5, 0.7, 0.9));
        record.recompute(&crate::FileRasters).unwrap();
        store.upsert(&record).unwrap();

        let reopened = ResultStore::open_or_initialize(dir.path(), &config).unwrap();
        let back = &reopened.records()[0];
        assert_eq!(back.rois(Structure::Liver), record.rois(Structure::Liver));
        assert_eq!(back.rois(Structure::Kidney), record.rois(Structure::Kidney));
        assert_eq!(back.mean(Structure::Liver), Some(90.0));
        assert_eq!(back.ratio(), record.ratio());
        assert!(back.samples().is_none());
    }

    #[test]
    fn upsert_preserves_unknown_columns_and_other_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("LRR_results.csv");
        std::fs::write(
            &path,
            "note,file_path,liver_locations,kidney_locations,mean_liver,std_liver,mean_kidney,std_kidney,ratio,ratio_std,liver_pixels\n\
             keep me,x.tif,[],[],,,,,,,\"[1, 2]\"\n\
             other,y.tif,[],[],,,,,,,\n",
        )
        .unwrap();
        let mut store = ResultStore::open_or_initialize(dir.path(), &AnalysisConfig::default()).unwrap();

        let mut record = store.record("y.tif").unwrap().clone();
        record.add_roi(Structure::Liver, roi(1.0, 1.0, 1.0, 1.0));
        store.upsert(&record).unwrap();

        let table = Table::read(&path).unwrap();
        let mut expected: Vec<&str> = COLUMNS.to_vec();
        expected.push("note");
        assert_eq!(table.headers(), expected);
        assert_eq!(table.get(0, 0), Some("x.tif"));
        assert_eq!(table.get(0, 9), Some("keep me"));
        assert_eq!(table.get(1, 1), Some("[[1.0,1.0,1.0,1.0]]"));
        assert_eq!(table.get(1, 9), Some("other"));
        assert_eq!(
            store.record("y.tif").unwrap().rois(Structure::Liver).len(),
            1
        );
    }

    #[test]
    fn upsert_appends_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ResultStore::open_or_initialize(dir.path(), &AnalysisConfig::default()).unwrap();
        assert!(store.is_empty());

        store.upsert(&ImageRecord::new("late.tif")).unwrap();
        assert_eq!(store.len(), 1);
        store.reload().unwrap();
        assert_eq!(store.records()[0].file_path(), "late.tif");
    }

    #[test]
    fn upsert_keeps_rows_written_by_another_process() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalysisConfig::default();
        let mut ours = ResultStore::open_or_initialize(dir.path(), &config).unwrap();
        let mut theirs = ResultStore::open_or_initialize(dir.path(), &config).unwrap();

        theirs.upsert(&ImageRecord::new("theirs.tif")).unwrap();
        ours.upsert(&ImageRecord::new("ours.tif")).unwrap();

        ours.reload().unwrap();
        let keys: Vec<_> = ours.records().iter().map(ImageRecord::file_path).collect();
        assert_eq!(keys, ["theirs.tif", "ours.tif"]);
    }

    #[test]
    fn reload_discards_unsaved_edits() {
        let dir = tempfile::tempdir().unwrap();
        touch_images(dir.path(), &["a.tif"]);
        let mut store = ResultStore::open_or_initialize(dir.path(), &AnalysisConfig::default()).unwrap();
        let key = store.records()[0].file_path().to_owned();

        let mut record = store.records()[0].clone();
        record.add_roi(Structure::Liver, roi(1.0, 1.0, 1.0, 1.0));
        store.upsert(&record).unwrap();
        assert_eq!(store.record(&key).unwrap().rois(Structure::Liver).len(), 1);

        std::fs::write(
            store.table_path(),
            format!("file_path,liver_locations\n{key},[]\n"),
        )
        .unwrap();
        store.reload().unwrap();
        assert!(store.record(&key).unwrap().rois(Structure::Liver).is_empty());
    }

    #[test]
    fn tuple_cells_and_nan_numbers_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("LRR_results.csv"),
            "file_path,liver_locations,kidney_locations,mean_liver,std_liver,mean_kidney,std_kidney,ratio,ratio_std\n\
             a.tif,\"[(10, 20, 5, 5)]\",\"[(30, 40, 3.5, 2)]\",NaN,nan,,,,\n",
        )
        .unwrap();
        let store = ResultStore::open_or_initialize(dir.path(), &AnalysisConfig::default()).unwrap();
        let record = &store.records()[0];
        assert_eq!(record.rois(Structure::Liver), [roi(10.0, 20.0, 5.0, 5.0)]);
        assert_eq!(record.rois(Structure::Kidney), [roi(30.0, 40.0, 3.5, 2.0)]);
        assert!(record.statistics().is_none());
    }

    #[test]
    fn aliased_headers_load_and_are_renamed_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("LRR_results.csv");
        std::fs::write(
            &path,
            "file_name,liver_locations,kidney_locations,liver_pixels,kidney_pixels,liver_mean,kidney_mean,liver_std,kidney_std,hepatic_renal_ratio,hepatic_renal_ratio_std\n\
             a.tif,\"[(10, 20, 5, 5)]\",\"[(30, 40, 3.5, 2)]\",\"[1, 2]\",\"[3]\",110,55,10,5,2,0.25\n",
        )
        .unwrap();
        let mut store = ResultStore::open_or_initialize(dir.path(), &AnalysisConfig::default()).unwrap();
        let record = store.record("a.tif").unwrap().clone();
        assert_eq!(record.rois(Structure::Liver), [roi(10.0, 20.0, 5.0, 5.0)]);
        assert_eq!(record.mean(Structure::Liver), Some(110.0));
        assert_eq!(record.std(Structure::Kidney), Some(5.0));
        assert_eq!(record.ratio(), Some(2.0));
        assert_eq!(record.ratio_std(), Some(0.25));

        store.upsert(&record).unwrap();
        let table = Table::read(&path).unwrap();
        assert_eq!(table.headers(), COLUMNS);
        assert_eq!(table.get(0, 0), Some("a.tif"));
        assert_eq!(table.get(0, 3), Some("110"));
    }

    #[test]
    fn mean_without_std_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("LRR_results.csv"),
            "file_path,liver_locations,kidney_locations,mean_liver,std_liver,mean_kidney,std_kidney,ratio,ratio_std\n\
             a.tif,[],[],110,,50,5,,\n",
        )
        .unwrap();
        let err = ResultStore::open_or_initialize(dir.path(), &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidNumber { column: "std_liver", ref file_path, .. } if file_path == "a.tif"
        ));
    }

    #[test]
    fn ratio_std_without_ratio_is_rejected_but_ratio_alone_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("LRR_results.csv");
        let header = "file_path,mean_liver,std_liver,mean_kidney,std_kidney,ratio,ratio_std\n";
        std::fs::write(&path, format!("{header}a.tif,0,0,50,5,,0.1\n")).unwrap();
        let err = ResultStore::open_or_initialize(dir.path(), &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidNumber { column: "ratio", .. }));

        std::fs::write(&path, format!("{header}a.tif,0,0,50,5,0,\n")).unwrap();
        let store = ResultStore::open_or_initialize(dir.path(), &AnalysisConfig::default()).unwrap();
        let record = &store.records()[0];
        assert_eq!(record.ratio(), Some(0.0));
        assert_eq!(record.ratio_std(), None);
    }

    #[test]
    fn malformed_roi_cell_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("LRR_results.csv"),
            "file_path,liver_locations\na.tif,[[1, 2]]\n",
        )
        .unwrap();
        let err = ResultStore::open_or_initialize(dir.path(), &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, StoreError::Decode { file_path, .. } if file_path == "a.tif"));
    }

    #[test]
    fn missing_key_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("LRR_results.csv"), "name,ratio\na.tif,1\n").unwrap();
        let err = ResultStore::open_or_initialize(dir.path(), &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::MissingColumn {
                column: KEY_COLUMN,
                ..
            }
        ));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("LRR_results.csv"),
            "file_path,liver_locations\na.tif,[]\na.tif,[]\n",
        )
        .unwrap();
        let err = ResultStore::open_or_initialize(dir.path(), &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { file_path, .. } if file_path == "a.tif"));
    }

    #[test]
    fn non_numeric_cell_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("LRR_results.csv"),
            "file_path,ratio\na.tif,high\n",
        )
        .unwrap();
        let err = ResultStore::open_or_initialize(dir.path(), &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidNumber { column: "ratio", .. }
        ));
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ResultStore::open_or_initialize(dir.path().join("absent"), &AnalysisConfig::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn numbers_format_and_parse() {
        assert_eq!(format_number(None), "");
        assert_eq!(format_number(Some(110.0)), "110");
        assert_eq!(format_number(Some(2.0625)), "2.0625");
        let v = 160.0 / 3.0;
        assert_eq!(parse_number("k", "ratio", &format_number(Some(v))).unwrap(), Some(v));
        assert_eq!(parse_number("k", "ratio", " ").unwrap(), None);
    }
}
