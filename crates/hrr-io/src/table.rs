//! A header-plus-rows CSV table with atomic replacement on write.
//!
//! The table is schema-agnostic: every cell is text, and columns the
//! caller does not know about survive a read/modify/write cycle in their
//! original order.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::store::StoreError;

/// An in-memory CSV table. Every row has exactly one cell per header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// An empty table with the given columns.
    #[must_use]
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Read a table from `path`. The first record is the header row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Csv`] if the file cannot be opened or a row
    /// has a different number of cells than the header.
    pub fn read(path: &Path) -> Result<Self, StoreError> {
        let csv_err = |source| StoreError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(csv_err)?;
        let headers = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(str::to_owned)
            .collect();
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_owned).collect()))
            .collect::<Result<_, _>>()
            .map_err(csv_err)?;

        Ok(Self { headers, rows })
    }

    /// Write the table to `path`.
    ///
    /// The table is written to a temporary file in the same directory and
    /// then renamed over `path`, so readers never observe a partial file.
    /// An existing file's permissions carry over to the replacement.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the temporary file cannot be created
    /// or renamed, and [`StoreError::Csv`] if writing fails.
    pub fn write(&self, path: &Path) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        let csv_err = |source| StoreError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(parent).map_err(io_err)?;
        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
            writer.write_record(&self.headers).map_err(csv_err)?;
            for row in &self.rows {
                writer.write_record(row).map_err(csv_err)?;
            }
            writer.flush().map_err(io_err)?;
        }
        match fs::metadata(path) {
            Ok(meta) => tmp
                .as_file()
                .set_permissions(meta.permissions())
                .map_err(io_err)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(io_err(e)),
        }
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    /// Column names in order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no data rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the column called `name`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Put `leading` first, in that order, followed by every other
    /// column in its current order. Missing leading columns are added
    /// with empty cells.
    pub fn arrange_columns(&mut self, leading: &[&str]) {
        let mut order: Vec<Option<usize>> = leading
            .iter()
            .map(|name| self.column_index(name))
            .collect();
        order.extend(
            (0..self.headers.len())
                .filter(|&i| !leading.contains(&self.headers[i].as_str()))
                .map(Some),
        );

        let mut headers: Vec<String> = leading.iter().map(|&name| name.to_owned()).collect();
        headers.extend(
            order[leading.len()..]
                .iter()
                .flatten()
                .map(|&i| self.headers[i].clone()),
        );
        for row in &mut self.rows {
            *row = order
                .iter()
                .map(|slot| slot.map_or_else(String::new, |i| row[i].clone()))
                .collect();
        }
        self.headers = headers;
    }

    /// Rename column `from` to `to`, unless `to` already exists.
    /// Returns `true` if a column was renamed.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        if self.column_index(to).is_some() {
            return false;
        }
        let Some(index) = self.column_index(from) else {
            return false;
        };
        to.clone_into(&mut self.headers[index]);
        true
    }

    /// Drop the column called `name`. Returns `true` if it existed.
    pub fn remove_column(&mut self, name: &str) -> bool {
        let Some(index) = self.column_index(name) else {
            return false;
        };
        self.headers.remove(index);
        for row in &mut self.rows {
            row.remove(index);
        }
        true
    }

    /// Index of the first row whose `column` cell equals `value`.
    #[must_use]
    pub fn find_row(&self, column: usize, value: &str) -> Option<usize> {
        self.rows.iter().position(|row| row[column] == value)
    }

    /// Append a row of empty cells and return its index.
    pub fn push_row(&mut self) -> usize {
        self.rows.push(vec![String::new(); self.headers.len()]);
        self.rows.len() - 1
    }

    /// Cell text, or `None` if `row` or `column` is out of range.
    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
    }

    /// Overwrite one cell. Out-of-range positions are ignored.
    pub fn set(&mut self, row: usize, column: usize, value: impl Into<String>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = value.into();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::new(["b", "key", "a"]);
        let r = t.push_row();
        t.set(r, 0, "b0");
        t.set(r, 1, "k0");
        t.set(r, 2, "a0");
        let r = t.push_row();
        t.set(r, 0, "b1");
        t.set(r, 1, "k1");
        t.set(r, 2, "a1");
        t
    }

    #[test]
    fn write_then_read_preserves_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let mut t = sample();
        t.set(0, 2, "has, comma and \"quotes\"");
        t.write(&path).unwrap();

        let back = Table::read(&path).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn write_replaces_existing_file_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "old\n1\n").unwrap();
        sample().write(&path).unwrap();

        assert_eq!(Table::read(&path).unwrap(), sample());
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn write_keeps_existing_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "old\n1\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        sample().write(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn rename_column_keeps_cells_and_refuses_clashes() {
        let mut t = sample();
        assert!(t.rename_column("b", "c"));
        assert_eq!(t.headers(), ["c", "key", "a"]);
        assert_eq!(t.get(1, 0), Some("b1"));
        assert!(!t.rename_column("c", "a"));
        assert!(!t.rename_column("missing", "z"));
        assert_eq!(t.headers(), ["c", "key", "a"]);
    }

    #[test]
    fn arrange_columns_moves_known_first_and_keeps_the_rest() {
        let mut t = sample();
        t.arrange_columns(&["key", "new"]);
        assert_eq!(t.headers(), ["key", "new", "b", "a"]);
        assert_eq!(t.get(0, 0), Some("k0"));
        assert_eq!(t.get(0, 1), Some(""));
        assert_eq!(t.get(0, 2), Some("b0"));
        assert_eq!(t.get(1, 3), Some("a1"));
    }

    #[test]
    fn remove_column_drops_cells() {
        let mut t = sample();
        assert!(t.remove_column("key"));
        assert!(!t.remove_column("key"));
        assert_eq!(t.headers(), ["b", "a"]);
        assert_eq!(t.get(1, 1), Some("a1"));
    }

    #[test]
    fn find_row_and_push_row() {
        let mut t = sample();
        assert_eq!(t.find_row(1, "k1"), Some(1));
        assert_eq!(t.find_row(1, "k9"), None);
        let r = t.push_row();
        assert_eq!(r, 2);
        assert_eq!(t.get(2, 0), Some(""));
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn ragged_file_is_csv_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "a,b\n1,2,3\n").unwrap();
        assert!(matches!(Table::read(&path), Err(StoreError::Csv { .. })));
    }

    #[test]
    fn out_of_range_access_is_harmless() {
        let mut t = sample();
        assert_eq!(t.get(5, 0), None);
        t.set(5, 0, "x");
        assert_eq!(t, sample());
    }
}
