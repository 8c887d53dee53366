use crate::export::{exporter_for, ExportFormat, NoticeExporter};
use crate::notice::{Notice, Severity};
use crate::Error;
use parking_lot::Mutex;
use std::path::Path;

/// Append-only list of the notices of a run
///
/// Notices can be added through a shared reference, from any thread.
#[derive(Debug, Default)]
pub struct NoticeRepository {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeRepository {
    /// Empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the notice and gives back what was stored
    pub fn add_notice(&self, notice: Notice) -> Notice {
        self.notices.lock().push(notice.clone());
        notice
    }

    /// Stores every notice, in order
    pub fn add_all(&self, notices: impl IntoIterator<Item = Notice>) {
        self.notices.lock().extend(notices);
    }

    /// Every notice, in the order they were added
    pub fn get_all(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    /// Number of stored notices
    pub fn notice_count(&self) -> usize {
        self.notices.lock().len()
    }

    fn count(&self, severity: Severity) -> usize {
        self.notices
            .lock()
            .iter()
            .filter(|n| n.severity() == severity)
            .count()
    }

    /// Number of notices of [Severity::Error]
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Number of notices of [Severity::Warning]
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// At least one notice is an error
    pub fn has_errors(&self) -> bool {
        self.notices
            .lock()
            .iter()
            .any(|n| n.severity() == Severity::Error)
    }

    /// Exporter writing the given format in the output directory
    pub fn exporter(
        format: ExportFormat,
        output_path: &Path,
    ) -> Result<Box<dyn NoticeExporter>, Error> {
        exporter_for(format, output_path)
    }

    /// Gives every notice to the exporter, in order, between the beginning and the end of the export
    pub fn export(&self, exporter: &mut dyn NoticeExporter) -> Result<(), Error> {
        let notices = self.get_all();
        exporter.export_begin()?;
        for notice in &notices {
            notice.export(exporter)?;
        }
        exporter.export_end()
    }
}
