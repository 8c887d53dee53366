use crate::Error;
use crate::GtfsReader;
use log::info;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::path::Path;

/// One line of a CSV file, before any type conversion
///
/// Consumed once by the [crate::RowParser], then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntity {
    /// Line of the row in its file, 1-based. The header is line 1.
    pub index: u64,
    /// Number of cells actually present in the CSV record
    pub cell_count: usize,
    values: FxHashMap<String, String>,
}

impl RawEntity {
    /// Builds a row from column name and raw value pairs
    pub fn new<K, V>(index: u64, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let values: FxHashMap<String, String> = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        RawEntity {
            index,
            cell_count: values.len(),
            values,
        }
    }

    /// The raw value of a column, `None` if the column is absent or the cell is empty
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .get(column)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Content of one CSV file of the feed
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Name of the file in the feed, like `stops.txt`
    pub file_name: String,
    /// Header line of the file, in file order
    pub headers: Vec<String>,
    records: Vec<(u64, csv::StringRecord)>,
}

impl RawTable {
    pub(crate) fn new(
        file_name: String,
        headers: Vec<String>,
        records: Vec<(u64, csv::StringRecord)>,
    ) -> Self {
        RawTable {
            file_name,
            headers,
            records,
        }
    }

    /// Builds a table from in-memory rows, numbering them as if read from a file
    pub fn from_rows(file_name: &str, headers: &[&str], rows: &[&[&str]]) -> Self {
        let records = rows
            .iter()
            .enumerate()
            .map(|(i, row)| (i as u64 + 2, csv::StringRecord::from(row.to_vec())))
            .collect();
        RawTable::new(
            file_name.to_owned(),
            headers.iter().map(|h| h.to_string()).collect(),
            records,
        )
    }

    /// Number of data rows, the header excluded
    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    /// Forward-only access to the rows of the table
    pub fn provider(&self) -> RowProvider<'_> {
        RowProvider {
            table: self,
            position: 0,
        }
    }
}

/// Iterates over the [RawEntity] of one table
pub struct RowProvider<'a> {
    table: &'a RawTable,
    position: usize,
}

impl<'a> RowProvider<'a> {
    /// Number of columns declared by the header line
    pub fn header_count(&self) -> usize {
        self.table.headers.len()
    }

    /// The header line
    pub fn headers(&self) -> &'a [String] {
        &self.table.headers
    }
}

impl<'a> Iterator for RowProvider<'a> {
    type Item = RawEntity;

    fn next(&mut self) -> Option<RawEntity> {
        let (line, record) = self.table.records.get(self.position)?;
        self.position += 1;

        let mut values = FxHashMap::default();
        for (header, value) in self.table.headers.iter().zip(record.iter()) {
            // a repeated header keeps its first column
            values
                .entry(header.clone())
                .or_insert_with(|| value.to_owned());
        }
        Some(RawEntity {
            index: *line,
            cell_count: record.len(),
            values,
        })
    }
}

/// Data structure that maps the files of a feed with little intelligence
///
/// This is what the ingestion consumes: a set of named tables, each with a header and rows.
#[derive(Debug, Default)]
pub struct RawGtfs {
    /// Time needed to read the archive in milliseconds
    pub read_duration: i64,
    /// Every `.txt` file that could be read as CSV, by file name
    pub tables: BTreeMap<String, RawTable>,
    /// Every `.txt` file that is present but could not be read as CSV
    pub unreadable: BTreeMap<String, Error>,
    /// All entries of the archive
    pub files: Vec<String>,
    /// Entries of the archive that are folders
    pub folders: Vec<String>,
    /// sha256 sum of the feed
    pub sha256: Option<String>,
}

impl RawGtfs {
    /// Reads from an url (if starts with http), or a local path (either a directory or zipped file)
    ///
    /// To read from an url, build with read-url feature
    pub fn new(gtfs: &str) -> Result<Self, Error> {
        GtfsReader::default().read(gtfs)
    }

    /// Reads the raw GTFS from a local zip archive or local directory
    pub fn from_path<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path> + std::fmt::Display,
    {
        GtfsReader::default().read_from_path(path)
    }

    /// Reads for any object implementing [std::io::Read] and [std::io::Seek]
    pub fn from_reader<T: std::io::Read + std::io::Seek>(reader: T) -> Result<Self, Error> {
        GtfsReader::default().read_from_reader(reader)
    }

    /// Feed made of already loaded tables
    pub fn from_tables(tables: impl IntoIterator<Item = RawTable>) -> Self {
        let tables: BTreeMap<String, RawTable> = tables
            .into_iter()
            .map(|t| (t.file_name.clone(), t))
            .collect();
        RawGtfs {
            files: tables.keys().cloned().collect(),
            tables,
            ..Default::default()
        }
    }

    /// Names of all `.txt` files of the feed, readable or not
    pub fn filenames(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .keys()
            .chain(self.unreadable.keys())
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Row access for a file, `None` when the file is absent or could not be read
    pub fn provider_for_file(&self, file_name: &str) -> Option<RowProvider<'_>> {
        self.tables.get(file_name).map(RawTable::provider)
    }

    /// Logs some basic statistics about the feed. Mostly to be sure that everything was read
    pub fn print_stats(&self) {
        info!("GTFS data read in {} ms", self.read_duration);
        for (name, table) in &self.tables {
            info!("  {}: {} rows", name, table.row_count());
        }
        for (name, e) in &self.unreadable {
            info!("  {}: could not read {}", name, e);
        }
    }
}
