use chrono::Utc;
use log::debug;
use sha2::{Digest, Sha256};

use crate::raw_gtfs::RawTable;
use crate::{Error, RawGtfs};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Allows to parameterize how the feed is read
///
/// ```
/// use std::io::{Cursor, Write};
///
/// let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
/// writer.start_file("stops.txt", zip::write::FileOptions::default())?;
/// writer.write_all(b"stop_id,stop_name\ns1,Berri-UQAM\ns2,Sherbrooke\n")?;
/// let archive = writer.finish()?.into_inner();
///
/// let raw = gtfs_validation::GtfsReader::default()
///     .trim_fields(false) // Keeps the spaces around the values
///     .read_from_reader(Cursor::new(archive))?;
/// assert_eq!(2, raw.tables["stops.txt"].row_count());
/// assert!(raw.sha256.is_some());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Derivative)]
#[derivative(Default)]
pub struct GtfsReader {
    /// Avoid trimming the fields
    ///
    /// It is quite time consumming
    /// If performance is an issue, and if your data is high quality, you can switch it off
    #[derivative(Default(value = "true"))]
    pub trim_fields: bool,
}

impl GtfsReader {
    /// Should the fields be trimmed (default: true)
    ///
    /// It is quite time consumming
    /// If performance is an issue, and if your data is high quality, you can set it to false
    pub fn trim_fields(mut self, trim_fields: bool) -> Self {
        self.trim_fields = trim_fields;
        self
    }

    /// Reads from an url (if starts with `"http"`) if the feature `read-url` is activated,
    /// or a local path (either a directory or zipped file)
    pub fn read(self, gtfs: &str) -> Result<RawGtfs, Error> {
        #[cfg(feature = "read-url")]
        if gtfs.starts_with("http") {
            return self.read_from_url(gtfs);
        }
        self.read_from_path(gtfs)
    }

    /// Reads the feed from a remote url
    #[cfg(feature = "read-url")]
    pub fn read_from_url<U: reqwest::IntoUrl>(self, url: U) -> Result<RawGtfs, Error> {
        let mut res = reqwest::blocking::get(url)?.error_for_status()?;
        let mut body = Vec::new();
        res.read_to_end(&mut body)?;
        let cursor = std::io::Cursor::new(body);
        self.read_from_reader(cursor)
    }

    /// Reads the raw feed from a local zip archive or local directory
    pub fn read_from_path<P>(&self, path: P) -> Result<RawGtfs, Error>
    where
        P: AsRef<Path> + std::fmt::Display,
    {
        let p = path.as_ref();
        if p.is_file() {
            let reader = File::open(p)?;
            self.read_from_reader(reader)
        } else if p.is_dir() {
            self.read_from_directory(p)
        } else {
            Err(Error::NotFileNorDirectory(format!("{}", p.display())))
        }
    }

    fn read_from_directory(&self, p: &Path) -> Result<RawGtfs, Error> {
        let now = Utc::now();
        let mut result = RawGtfs::default();

        let mut entries: Vec<_> = std::fs::read_dir(p)?.filter_map(|d| d.ok()).collect();
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let Some(name) = entry.file_name().to_str().map(|s| s.to_owned()) else {
                continue;
            };
            let path = entry.path();
            if path.is_dir() {
                result.folders.push(format!("{}/", name));
                result.files.push(format!("{}/", name));
                continue;
            }
            result.files.push(name.clone());
            if !name.ends_with(".txt") {
                continue;
            }
            let table = File::open(&path)
                .map_err(|e| Error::NamedFileIO {
                    file_name: name.clone(),
                    source: Box::new(e),
                })
                .and_then(|r| self.read_table(r, &name));
            result.insert_table(name, table);
        }

        result.read_duration = Utc::now().signed_duration_since(now).num_milliseconds();
        Ok(result)
    }

    /// Reads for any object implementing [std::io::Read] and [std::io::Seek]
    ///
    /// Mostly an internal function that abstracts reading from an url or local file
    pub fn read_from_reader<T: std::io::Read + std::io::Seek>(
        &self,
        reader: T,
    ) -> Result<RawGtfs, Error> {
        let now = Utc::now();
        let mut hasher = Sha256::new();
        let mut buf_reader = std::io::BufReader::new(reader);
        let _n = std::io::copy(&mut buf_reader, &mut hasher)?;
        let hash = hasher.finalize();
        let mut archive = zip::ZipArchive::new(buf_reader)?;
        let mut file_mapping = BTreeMap::new();
        let mut result = RawGtfs::default();

        for i in 0..archive.len() {
            let archive_file = archive.by_index(i)?;
            let name = archive_file.name().to_owned();
            result.files.push(name.clone());

            // only the top level is read, a nested member is reported through its folder
            if let Some((folder, _)) = name.split_once('/') {
                let folder = format!("{}/", folder);
                if !result.folders.contains(&folder) {
                    result.folders.push(folder);
                }
                continue;
            }
            if name.ends_with(".txt") {
                file_mapping.entry(name).or_insert(i);
            }
        }

        for (file_name, i) in file_mapping {
            let table = archive
                .by_index(i)
                .map_err(|e| Error::NamedFileIO {
                    file_name: file_name.clone(),
                    source: Box::new(e),
                })
                .and_then(|f| self.read_table(f, &file_name));
            result.insert_table(file_name, table);
        }

        let sha256 = format!("{:x}", hash);
        debug!("sha256 of the archive: {}", sha256);
        result.sha256 = Some(sha256);
        result.read_duration = Utc::now().signed_duration_since(now).num_milliseconds();
        Ok(result)
    }

    fn read_table<T>(&self, mut reader: T, file_name: &str) -> Result<RawTable, Error>
    where
        T: std::io::Read,
    {
        let mut content = Vec::new();
        reader
            .read_to_end(&mut content)
            .map_err(|e| Error::NamedFileIO {
                file_name: file_name.to_owned(),
                source: Box::new(e),
            })?;
        let content = content
            .strip_prefix(&[0xefu8, 0xbbu8, 0xbfu8])
            .unwrap_or(&content);

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(if self.trim_fields {
                csv::Trim::Fields
            } else {
                csv::Trim::None
            })
            .from_reader(content);
        let headers = reader
            .headers()
            .map_err(|e| Error::CSVError {
                file_name: file_name.to_owned(),
                source: e,
                line: None,
            })?
            .iter()
            .map(String::from)
            .collect::<Vec<_>>();

        // Pre-allocate a StringRecord for performance reasons
        let mut rec = csv::StringRecord::new();
        let mut records = Vec::new();
        while reader.read_record(&mut rec).map_err(|e| Error::CSVError {
            file_name: file_name.to_owned(),
            line: e.position().map(|p| p.line()),
            source: e,
        })? {
            // blank lines are skipped by the csv reader, lines stay those of the file
            let line = rec.position().map(|p| p.line()).unwrap_or(0);
            records.push((line, rec.clone()));
        }
        Ok(RawTable::new(file_name.to_owned(), headers, records))
    }
}

impl RawGtfs {
    fn insert_table(&mut self, file_name: String, table: Result<RawTable, Error>) {
        match table {
            Ok(t) => {
                self.tables.insert(file_name, t);
            }
            Err(e) => {
                self.unreadable.insert(file_name, e);
            }
        }
    }
}
