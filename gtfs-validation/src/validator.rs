//! Runs a whole validation: reads the feed, ingests it, then runs the rules.
use crate::exec_params::{
    ExecParamRepository, ABORT_ON_ERROR, EXCLUDE, INPUT, MAX_DATASET_SIZE_MB, URL,
};
use crate::ingest::ingest;
use crate::notice::{Notice, NoticeKind};
use crate::repository::DatasetRepository;
use crate::rules::{default_rules, RuleContext, ValidationRule};
use crate::{Error, GtfsReader, NoticeRepository, RawGtfs};
use chrono::Utc;
use log::{error, info, warn};
use std::backtrace::Backtrace;
use std::panic::{catch_unwind, AssertUnwindSafe};

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Validates a feed with a set of rules
///
/// ```no_run
/// let mut params = gtfs_validation::ExecParamRepository::new();
/// params.add("input", "fixtures/gtfs.zip").unwrap();
/// let notices = gtfs_validation::Validator::new(params).run();
/// println!("{} errors", notices.error_count());
/// ```
pub struct Validator {
    params: ExecParamRepository,
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    /// Validator running every rule of [default_rules]
    pub fn new(params: ExecParamRepository) -> Self {
        Validator {
            params,
            rules: default_rules(),
        }
    }

    /// Replaces the rules to run
    pub fn with_rules(mut self, rules: Vec<Box<dyn ValidationRule>>) -> Self {
        self.rules = rules;
        self
    }

    /// The parameters of the run
    pub fn params(&self) -> &ExecParamRepository {
        &self.params
    }

    /// Reads the feed given by the `url` or `input` parameter and validates it
    ///
    /// Never fails: when the feed cannot be read, the repository holds a single notice saying so
    pub fn run(&self) -> NoticeRepository {
        let notices = NoticeRepository::new();
        let (source, raw) = match self.read_feed() {
            Ok(read) => read,
            Err(notice) => {
                notices.add_notice(notice);
                return notices;
            }
        };
        raw.print_stats();
        self.validate(&source, &raw, &notices);
        notices
    }

    /// Validates an already read feed. `source` only names the feed in the report
    pub fn run_on(&self, source: &str, raw: &RawGtfs) -> NoticeRepository {
        let notices = NoticeRepository::new();
        self.validate(source, raw, &notices);
        notices
    }

    fn read_feed(&self) -> Result<(String, RawGtfs), Notice> {
        if self.params.has_exec_param_value(URL) {
            let url = self
                .params
                .get_exec_param_value(URL)
                .map_err(|e| input_notice(&e))?;
            info!("Downloading archive from {}", url);
            return self
                .download(&url)
                .map(|raw| (url.clone(), raw))
                .map_err(|reason| {
                    Notice::new(NoticeKind::CannotDownloadArchive {
                        url: url.clone(),
                        reason,
                    })
                });
        }

        let input = self
            .params
            .get_exec_param_value(INPUT)
            .map_err(|e| input_notice(&e))?;
        info!("Reading feed from {}", input);
        GtfsReader::default()
            .read_from_path(&input)
            .map(|raw| (input.clone(), raw))
            .map_err(|e| input_notice(&e))
    }

    #[cfg(feature = "read-url")]
    fn download(&self, url: &str) -> Result<RawGtfs, String> {
        GtfsReader::default()
            .read_from_url(url)
            .map_err(|e| describe(&e))
    }

    #[cfg(not(feature = "read-url"))]
    fn download(&self, _url: &str) -> Result<RawGtfs, String> {
        Err("downloading needs the read-url feature".to_owned())
    }

    fn validate(&self, source: &str, raw: &RawGtfs, notices: &NoticeRepository) {
        let start = Utc::now();
        let exclude = self.params.get_list(EXCLUDE).unwrap_or_else(|e| {
            warn!("Ignoring the exclusion list: {}", e);
            vec![]
        });
        let feed = ingest(raw, &exclude, notices);

        let abort_on_error = self.params.get_bool(ABORT_ON_ERROR).unwrap_or_else(|e| {
            warn!("{}, continuing after ingestion errors", e);
            false
        });
        if abort_on_error && notices.has_errors() {
            info!(
                "The feed has {} errors, the rules are skipped. Run without --abort-on-error to validate it anyway",
                notices.error_count()
            );
        } else {
            self.run_rules(&feed.dataset, notices);
        }

        let processing_time_secs =
            Utc::now().signed_duration_since(start).num_milliseconds() as f64 / 1000.0;
        let error_count = notices.error_count();
        let warning_count = notices.warning_count();
        info!(
            "Validation of {} done in {} s: {} errors, {} warnings",
            source, processing_time_secs, error_count, warning_count
        );
        notices.add_notice(Notice::new(NoticeKind::ValidationProcessInfo {
            input: source.to_owned(),
            processed_files: feed.processed_files,
            processing_time_secs,
            error_count,
            warning_count,
        }));
    }

    fn run_rules(&self, dataset: &DatasetRepository, notices: &NoticeRepository) {
        let budget_mb = self
            .params
            .get_f64(MAX_DATASET_SIZE_MB)
            .unwrap_or_else(|e| {
                warn!("{}, no memory budget", e);
                f64::INFINITY
            });
        let ctx = RuleContext {
            dataset,
            exec_params: &self.params,
            notices,
        };

        for rule in &self.rules {
            let dataset_size_megabytes = dataset.estimated_size_bytes() as f64 / BYTES_PER_MEGABYTE;
            if dataset_size_megabytes > budget_mb {
                warn!(
                    "Dataset of {:.1} MB over the budget of {} MB, the remaining rules are skipped",
                    dataset_size_megabytes, budget_mb
                );
                notices.add_notice(Notice::new(NoticeKind::OutOfMemory {
                    dataset_size_megabytes,
                    notice_count: notices.notice_count(),
                }));
                return;
            }

            info!("Validating rule '{}'", rule.name());
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| rule.execute(&ctx))) {
                let exception_message = panic_message(payload.as_ref());
                error!("Rule '{}' crashed: {}", rule.name(), exception_message);
                notices.add_notice(Notice::new(NoticeKind::ValidatorCrash {
                    rule_name: rule.name().to_owned(),
                    exception_message,
                    stack_trace: Backtrace::force_capture().to_string(),
                }));
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

/// The error with its causes
fn describe(e: &Error) -> String {
    let mut reason = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(&cause.to_string());
        source = cause.source();
    }
    reason
}

fn input_notice(e: &Error) -> Notice {
    Notice::new(NoticeKind::CannotUnzipInputArchive {
        reason: describe(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw_gtfs::RawTable;

    struct Crashing;

    impl ValidationRule for Crashing {
        fn name(&self) -> &'static str {
            "crashing rule"
        }

        fn execute(&self, _ctx: &RuleContext) {
            panic!("index out of bounds");
        }
    }

    struct Unused;

    impl ValidationRule for Unused {
        fn name(&self) -> &'static str {
            "unused trips"
        }

        fn execute(&self, ctx: &RuleContext) {
            for trip in ctx.dataset.trip_all() {
                ctx.report("trips.txt", trip.id.as_str(), NoticeKind::TripNotUsed);
            }
        }
    }

    fn feed() -> RawGtfs {
        RawGtfs::from_tables([
            RawTable::from_rows(
                "agency.txt",
                &["agency_name", "agency_url", "agency_timezone"],
                &[&["STM", "https://www.stm.info", "America/Montreal"]],
            ),
            RawTable::from_rows(
                "stops.txt",
                &["stop_id", "stop_name", "stop_lat", "stop_lon"],
                &[&["s1", "Berri", "45.515", "-73.561"]],
            ),
            RawTable::from_rows(
                "routes.txt",
                &["route_id", "route_short_name", "route_type"],
                &[&["r1", "1", "1"]],
            ),
            RawTable::from_rows(
                "trips.txt",
                &["route_id", "service_id", "trip_id"],
                &[&["r1", "weekdays", "t1"]],
            ),
            RawTable::from_rows(
                "calendar_dates.txt",
                &["service_id", "date", "exception_type"],
                &[&["weekdays", "20240101", "1"]],
            ),
            RawTable::from_rows(
                "stop_times.txt",
                &["trip_id", "arrival_time", "departure_time", "stop_id", "stop_sequence"],
                &[&["t1", "08:00:00", "08:00:00", "s1", "1"]],
            ),
        ])
    }

    fn codes(notices: &NoticeRepository) -> Vec<&'static str> {
        notices.get_all().iter().map(|n| n.code()).collect()
    }

    #[test]
    fn crash_is_reported_and_the_run_goes_on() {
        let validator = Validator::new(ExecParamRepository::new())
            .with_rules(vec![Box::new(Crashing), Box::new(Unused)]);
        let notices = validator.run_on("memory", &feed());
        let all = notices.get_all();
        assert_eq!(vec!["E056", "W017", "I001"], codes(&notices));
        match &all[0].kind {
            NoticeKind::ValidatorCrash {
                rule_name,
                exception_message,
                ..
            } => {
                assert_eq!("crashing rule", rule_name);
                assert_eq!("index out of bounds", exception_message);
            }
            kind => panic!("unexpected notice {:?}", kind),
        }
    }

    #[test]
    fn memory_budget_halts_the_rules() {
        let mut params = ExecParamRepository::new();
        params.add(MAX_DATASET_SIZE_MB, "0").unwrap();
        let validator = Validator::new(params).with_rules(vec![Box::new(Unused)]);
        let notices = validator.run_on("memory", &feed());
        assert_eq!(vec!["E057", "I001"], codes(&notices));
    }

    #[test]
    fn abort_on_error_skips_the_rules() {
        let mut raw = feed();
        raw.tables.remove("routes.txt");
        raw.files.retain(|f| f != "routes.txt");

        let validator = Validator::new(ExecParamRepository::new()).with_rules(vec![Box::new(Unused)]);
        assert_eq!(vec!["E001", "W017", "I001"], codes(&validator.run_on("memory", &raw)));

        let mut params = ExecParamRepository::new();
        params.add(ABORT_ON_ERROR, "true").unwrap();
        let validator = Validator::new(params).with_rules(vec![Box::new(Unused)]);
        assert_eq!(vec!["E001", "I001"], codes(&validator.run_on("memory", &raw)));
    }

    #[test]
    fn process_info_closes_the_report() {
        let notices = Validator::new(ExecParamRepository::new()).run_on("memory", &feed());
        let all = notices.get_all();
        match &all.last().map(|n| &n.kind) {
            Some(NoticeKind::ValidationProcessInfo {
                input,
                processed_files,
                error_count,
                ..
            }) => {
                assert_eq!("memory", input);
                assert_eq!(
                    &vec![
                        "agency.txt",
                        "stops.txt",
                        "routes.txt",
                        "trips.txt",
                        "calendar_dates.txt",
                        "stop_times.txt"
                    ],
                    processed_files
                );
                assert_eq!(notices.error_count(), *error_count);
            }
            kind => panic!("unexpected notice {:?}", kind),
        }
    }

    #[test]
    fn unreadable_input() {
        let mut params = ExecParamRepository::new();
        params.add(INPUT, "/does/not/exist.zip").unwrap();
        let notices = Validator::new(params).run();
        assert_eq!(vec!["E021"], codes(&notices));
    }

    #[cfg(not(feature = "read-url"))]
    #[test]
    fn download_needs_the_feature() {
        let mut params = ExecParamRepository::new();
        params.add(URL, "https://example.com/gtfs.zip").unwrap();
        let notices = Validator::new(params).run();
        assert_eq!(vec!["E023"], codes(&notices));
    }
}
