//! Writing the validation report.
//!
//! Exporters are driven by [crate::NoticeRepository::export], which calls
//! [NoticeExporter::export_begin], then [crate::Notice::export] for every notice, then
//! [NoticeExporter::export_end].
use crate::notice::{Notice, NoticeKind, NoticeValue, Severity};
use crate::Error;
use prost::Message;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Format of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// `results.json`
    Json,
    /// `results.pb`, length delimited protobuf messages
    Protobuf,
}

impl ExportFormat {
    /// Name of the report file
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "results.json",
            ExportFormat::Protobuf => "results.pb",
        }
    }
}

/// Renders the notices in one format
pub trait NoticeExporter {
    /// Called once, before any notice
    fn export_begin(&mut self) -> Result<(), Error>;
    /// Called once per notice, in order
    fn export(&mut self, notice: &Notice) -> Result<(), Error>;
    /// Called once, after every notice
    fn export_end(&mut self) -> Result<(), Error>;
}

/// Exporter writing in the output directory, that is created if needed
pub fn exporter_for(format: ExportFormat, output_dir: &Path) -> Result<Box<dyn NoticeExporter>, Error> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format.file_name());
    let file = File::create(&path).map_err(|e| Error::NamedFileIO {
        file_name: path.display().to_string(),
        source: Box::new(e),
    })?;
    let writer = BufWriter::new(file);
    Ok(match format {
        ExportFormat::Json => Box::new(JsonNoticeExporter::new(writer)),
        ExportFormat::Protobuf => Box::new(ProtobufNoticeExporter::new(writer)),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonNotice {
    code: &'static str,
    severity: Severity,
    title: &'static str,
    filename: Option<String>,
    entity_id: String,
    notice_specific: BTreeMap<&'static str, NoticeValue>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    results: &'a [JsonNotice],
}

/// Writes `{"results": [...]}`, one object per notice
pub struct JsonNoticeExporter<W: Write> {
    writer: W,
    results: Vec<JsonNotice>,
}

impl<W: Write> JsonNoticeExporter<W> {
    /// Exporter writing the report to `writer` at the end of the export
    pub fn new(writer: W) -> Self {
        JsonNoticeExporter {
            writer,
            results: vec![],
        }
    }

    /// Gives back the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> NoticeExporter for JsonNoticeExporter<W> {
    fn export_begin(&mut self) -> Result<(), Error> {
        self.results.clear();
        Ok(())
    }

    fn export(&mut self, notice: &Notice) -> Result<(), Error> {
        self.results.push(JsonNotice {
            code: notice.code(),
            severity: notice.severity(),
            title: notice.title(),
            filename: notice.filename.clone(),
            entity_id: notice.entity_id.clone(),
            notice_specific: notice.specific_fields().into_iter().collect(),
        });
        Ok(())
    }

    fn export_end(&mut self) -> Result<(), Error> {
        serde_json::to_writer_pretty(
            &mut self.writer,
            &JsonReport {
                results: &self.results,
            },
        )?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Category of a problem in the protobuf report
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ProblemType {
    TypeUnknown = 0,
    TypeArchiveCorrupted = 1,
    TypeCsvMissingTable = 2,
    TypeCsvMissingColumn = 3,
    TypeCsvUnknownColumn = 4,
    TypeCsvBadNumberOfValues = 5,
    TypeCsvValueError = 6,
    TypeCsvOutOfRange = 7,
    TypeCsvMissingValue = 8,
    TypeCsvDuplicateEntity = 9,
    TypeCsvFileCorrupted = 10,
    TypeUnknownFile = 11,
    TypeInvalidReference = 12,
    TypeInconsistentValues = 13,
    TypeScheduleInconsistency = 14,
    TypeGeometry = 15,
    TypeFeedExpiration = 16,
    TypeUnusedEntity = 17,
    TypeValidatorInternal = 18,
    TypeInfo = 19,
}

/// Severity of a problem in the protobuf report
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ProblemSeverity {
    Info = 0,
    SuspiciousWarning = 1,
    Error = 2,
}

/// One notice of the protobuf report
#[derive(Clone, PartialEq, prost::Message)]
pub struct GtfsProblem {
    /// File of the notice
    #[prost(string, tag = "1")]
    pub csv_file_name: String,
    /// Category, see [ProblemType]
    #[prost(enumeration = "ProblemType", tag = "2")]
    pub problem_type: i32,
    /// See [ProblemSeverity]
    #[prost(enumeration = "ProblemSeverity", tag = "3")]
    pub severity: i32,
    /// Line of the file, when known
    #[prost(int64, tag = "4")]
    pub entity_row: i64,
    /// Field of the entity that has the problem
    #[prost(string, tag = "5")]
    pub entity_name: String,
    /// Identifier of the entity
    #[prost(string, tag = "6")]
    pub entity_id: String,
    /// Value that has the problem
    #[prost(string, tag = "7")]
    pub entity_value: String,
    /// Identifier of the other entity involved
    #[prost(string, tag = "8")]
    pub alt_entity_id: String,
    /// Field of the other entity involved
    #[prost(string, tag = "9")]
    pub alt_entity_name: String,
    /// Value of the other entity involved
    #[prost(string, tag = "10")]
    pub alt_entity_value: String,
    /// Code of the notice
    #[prost(string, tag = "11")]
    pub code: String,
    /// Title of the notice
    #[prost(string, tag = "12")]
    pub title: String,
}

#[derive(Default)]
struct Located {
    row: i64,
    name: String,
    value: String,
    alt_id: String,
    alt_name: String,
    alt_value: String,
}

fn field(name: &str, value: impl ToString) -> Located {
    Located {
        name: name.to_owned(),
        value: value.to_string(),
        ..Default::default()
    }
}

fn nothing() -> Located {
    Located::default()
}

impl Located {
    fn row(mut self, row: u64) -> Self {
        self.row = i64::try_from(row).unwrap_or(i64::MAX);
        self
    }

    fn alt(mut self, id: impl ToString, name: &str, value: impl ToString) -> Self {
        self.alt_id = id.to_string();
        self.alt_name = name.to_owned();
        self.alt_value = value.to_string();
        self
    }
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Category and located values of a notice
fn to_problem(kind: &NoticeKind) -> (ProblemType, Located) {
    use NoticeKind::*;
    use ProblemType::*;
    match kind {
        MissingRequiredFile | MissingCalendarAndCalendarDateFiles => (TypeCsvMissingTable, nothing()),
        MissingRequiredValue { field_name } => (TypeCsvMissingValue, field(field_name, "")),
        CannotParseInteger {
            field_name,
            line_number,
            raw_value,
        }
        | CannotParseFloat {
            field_name,
            line_number,
            raw_value,
        }
        | CannotParseDate {
            field_name,
            line_number,
            raw_value,
        } => (
            TypeCsvValueError,
            field(field_name, raw_value).row(*line_number),
        ),
        IntegerFieldValueOutOfRange {
            field_name,
            range_min,
            range_max,
            actual_value,
        } => (
            TypeCsvOutOfRange,
            field(field_name, actual_value).alt("", "range", format!("{}..{}", range_min, range_max)),
        ),
        FloatFieldValueOutOfRange {
            field_name,
            range_min,
            range_max,
            actual_value,
            ..
        } => (
            TypeCsvOutOfRange,
            field(field_name, actual_value).alt("", "range", format!("{}..{}", range_min, range_max)),
        ),
        InvalidColor {
            field_name,
            line_number,
            color_value: value,
        }
        | InvalidTime {
            field_name,
            line_number,
            time_value: value,
        } => (TypeCsvValueError, field(field_name, value).row(*line_number)),
        InvalidUrl {
            field_name,
            url_value: value,
        }
        | InvalidTimezone {
            field_name,
            timezone_value: value,
        }
        | InvalidCurrencyCode {
            field_name,
            currency_code: value,
        }
        | InvalidLang {
            field_name,
            lang_value: value,
        }
        | InvalidEmail {
            field_name,
            email_value: value,
        }
        | UnexpectedEnumValue {
            field_name,
            enum_value: value,
        }
        | NonAsciiOrNonPrintableChar {
            field_name,
            raw_value: value,
        } => (TypeCsvValueError, field(field_name, value)),
        InvalidRowLength {
            row_index,
            expected_length,
            actual_length,
        } => (
            TypeCsvBadNumberOfValues,
            field("row length", actual_length)
                .row(*row_index)
                .alt("", "header length", expected_length),
        ),
        MissingHeaders {
            expected_headers,
            actual_headers,
        } => (
            TypeCsvMissingColumn,
            field("headers", join(actual_headers)).alt("", "required headers", join(expected_headers)),
        ),
        DuplicatedHeader {
            duplicated_header_name,
        } => (TypeCsvUnknownColumn, field("header", duplicated_header_name)),
        NonStandardHeaders { extra_headers } => {
            (TypeCsvUnknownColumn, field("headers", join(extra_headers)))
        }
        EmptyFile { .. } => (TypeCsvFileCorrupted, nothing()),
        DuplicatedEntity { key } => {
            let names: Vec<&str> = key.iter().map(|(n, _)| *n).collect();
            let values: Vec<&str> = key.iter().map(|(_, v)| v.as_str()).collect();
            (TypeCsvDuplicateEntity, field(&names.join(","), values.join(",")))
        }
        CannotUnzipInputArchive { reason } | CannotConstructDataProvider { reason } => {
            (TypeArchiveCorrupted, field("reason", reason))
        }
        CannotDownloadArchive { url, reason } => {
            (TypeArchiveCorrupted, field("url", url).alt("", "reason", reason))
        }
        InputZipContainsFolder { folder_name } => (TypeArchiveCorrupted, field("folder", folder_name)),
        ExtraFileFound => (TypeUnknownFile, nothing()),
        IllegalFieldValueCombination {
            field_name,
            conflicting_field_name,
        } => (
            TypeInconsistentValues,
            field(field_name, "").alt("", conflicting_field_name, ""),
        ),
        RouteColorAndTextInsufficientContrast { contrast_ratio } => {
            (TypeInconsistentValues, field("contrast_ratio", contrast_ratio))
        }
        SameNameAndDescriptionForRoute {
            route_desc,
            conflicting_field_name,
        } => (
            TypeInconsistentValues,
            field("route_desc", route_desc).alt("", conflicting_field_name, route_desc),
        ),
        RouteLongNameContainsShortName | RouteLongNameEqualsShortName => (
            TypeInconsistentValues,
            field("route_long_name", "").alt("", "route_short_name", ""),
        ),
        RouteShortNameTooLong { short_name_length } => {
            (TypeInconsistentValues, field("route_short_name", short_name_length))
        }
        InconsistentAgencyTimezone { timezones } => {
            (TypeInconsistentValues, field("agency_timezone", join(timezones)))
        }
        FeedInfoLangAgencyLangMismatch {
            agency_lang,
            feed_lang,
        } => (
            TypeInconsistentValues,
            field("feed_lang", feed_lang).alt("", "agency_lang", agency_lang),
        ),
        CalendarEndDateBeforeStartDate {
            start_date,
            end_date,
        } => (
            TypeInconsistentValues,
            field("end_date", end_date).alt("", "start_date", start_date),
        ),
        FeedInfoStartDateAfterEndDate {
            start_date,
            end_date,
        } => (
            TypeInconsistentValues,
            field("feed_start_date", start_date).alt("", "feed_end_date", end_date),
        ),
        MissingShortAndLongNameForRoute => (TypeCsvMissingValue, field("route_short_name", "")),
        MissingAgencyId => (TypeCsvMissingValue, field("agency_id", "")),
        MissingTripEdgeStopTime {
            field_name,
            stop_sequence,
        } => (
            TypeCsvMissingValue,
            field(field_name, "").alt("", "stop_sequence", stop_sequence),
        ),
        MissingFeedEndDate => (TypeCsvMissingValue, field("feed_end_date", "")),
        MissingFeedStartDate => (TypeCsvMissingValue, field("feed_start_date", "")),
        StationWithParentStation { parent_id } => {
            (TypeInvalidReference, field("parent_station", parent_id))
        }
        ParentStationInvalidLocationType {
            child_location_type,
            parent_id,
            expected_parent_location_type,
            actual_parent_location_type,
        } => (
            TypeInvalidReference,
            field("location_type", child_location_type).alt(
                parent_id,
                "location_type",
                format!(
                    "{} (expected {})",
                    actual_parent_location_type, expected_parent_location_type
                ),
            ),
        ),
        RouteIdNotFound {
            field_name,
            unknown_route_id: value,
        }
        | ShapeIdNotFound {
            field_name,
            unknown_shape_id: value,
        }
        | AgencyIdNotFound {
            field_name,
            unknown_agency_id: value,
        }
        | ServiceIdNotFound {
            field_name,
            unknown_service_id: value,
        }
        | TripIdNotFound {
            field_name,
            unknown_trip_id: value,
        }
        | StopIdNotFound {
            field_name,
            unknown_stop_id: value,
        }
        | FareIdNotFound {
            field_name,
            unknown_fare_id: value,
        } => (TypeInvalidReference, field(field_name, value)),
        FeedExpiresInLessThan7Days {
            feed_end_date,
            current_date,
        }
        | FeedExpiresInLessThan30Days {
            feed_end_date,
            current_date,
        } => (
            TypeFeedExpiration,
            field("feed_end_date", feed_end_date).alt("", "current_date", current_date),
        ),
        DecreasingStopTimeDistance {
            shape_dist_traveled,
            previous_stop_sequence,
            previous_shape_dist_traveled,
            ..
        } => (
            TypeScheduleInconsistency,
            field("shape_dist_traveled", shape_dist_traveled).alt(
                previous_stop_sequence,
                "shape_dist_traveled",
                previous_shape_dist_traveled,
            ),
        ),
        DecreasingShapeDistance {
            shape_dist_traveled,
            previous_shape_pt_sequence,
            previous_shape_dist_traveled,
            ..
        } => (
            TypeGeometry,
            field("shape_dist_traveled", shape_dist_traveled).alt(
                previous_shape_pt_sequence,
                "shape_dist_traveled",
                previous_shape_dist_traveled,
            ),
        ),
        StopTimeArrivalTimeAfterDepartureTime {
            stop_sequence,
            arrival_time,
            departure_time,
        } => (
            TypeScheduleInconsistency,
            field("arrival_time", arrival_time).alt(stop_sequence, "departure_time", departure_time),
        ),
        FrequencyStartTimeAfterEndTime {
            start_time,
            end_time,
        } => (
            TypeScheduleInconsistency,
            field("start_time", start_time).alt("", "end_time", end_time),
        ),
        FastTravelBetweenStops {
            speed_kmh,
            stop_sequences,
        } => (
            TypeScheduleInconsistency,
            field("speed_kmh", format!("{:.2}", speed_kmh)).alt(
                "",
                "stop_sequence",
                join(stop_sequences),
            ),
        ),
        BackwardsTimeTravelInStop {
            arrival_time,
            previous_stop_sequence,
            previous_departure_time,
            ..
        } => (
            TypeScheduleInconsistency,
            field("arrival_time", arrival_time).alt(
                previous_stop_sequence,
                "departure_time",
                previous_departure_time,
            ),
        ),
        UnusableTrip => (TypeScheduleInconsistency, nothing()),
        OverlappingTripFrequencies {
            previous_start_time,
            previous_end_time,
            start_time,
            end_time,
        } => (
            TypeScheduleInconsistency,
            field("start_time", format!("{}-{}", start_time, end_time)).alt(
                "",
                "start_time",
                format!("{}-{}", previous_start_time, previous_end_time),
            ),
        ),
        BlockTripsWithOverlappingStopTimes {
            previous_trip_id,
            block_id,
            trip_first_time,
            trip_last_time,
            previous_trip_first_time,
            previous_trip_last_time,
            ..
        } => (
            TypeScheduleInconsistency,
            field("block_id", block_id).alt(
                previous_trip_id,
                "trip_id",
                format!(
                    "{}-{} / {}-{}",
                    trip_first_time, trip_last_time, previous_trip_first_time, previous_trip_last_time
                ),
            ),
        ),
        StopTooFarFromTripShape {
            stop_id,
            shape_id,
            distance_meters,
            ..
        } => (
            TypeGeometry,
            field("stop_id", stop_id).alt(shape_id, "distance_meters", format!("{:.1}", distance_meters)),
        ),
        SuspiciousMinTransferTime {
            range_min,
            range_max,
            actual_value,
        } => (
            TypeCsvOutOfRange,
            field("min_transfer_time", actual_value).alt("", "range", format!("{}..{}", range_min, range_max)),
        ),
        ShapeNotUsed | TripNotUsed => (TypeUnusedEntity, nothing()),
        DuplicateRouteLongName {
            duplicate_long_name: name,
            conflicting_route_id,
        }
        | DuplicateRouteShortName {
            duplicate_short_name: name,
            conflicting_route_id,
        } => (
            TypeCsvDuplicateEntity,
            field("route_name", name).alt(conflicting_route_id, "route_name", name),
        ),
        DuplicateRouteLongNameShortNameCombination {
            duplicate_long_name,
            duplicate_short_name,
            conflicting_route_id,
        } => (
            TypeCsvDuplicateEntity,
            field("route_long_name", duplicate_long_name).alt(
                conflicting_route_id,
                "route_short_name",
                duplicate_short_name,
            ),
        ),
        ValidatorCrash {
            rule_name,
            exception_message,
            ..
        } => (
            TypeValidatorInternal,
            field("rule", rule_name).alt("", "message", exception_message),
        ),
        OutOfMemory {
            dataset_size_megabytes,
            notice_count,
        } => (
            TypeValidatorInternal,
            field("dataset_size_megabytes", dataset_size_megabytes).alt("", "notice_count", notice_count),
        ),
        ValidationProcessInfo {
            input,
            processing_time_secs,
            ..
        } => (
            TypeInfo,
            field("input", input).alt("", "processing_time_secs", processing_time_secs),
        ),
    }
}

impl GtfsProblem {
    /// The protobuf form of a notice
    pub fn from_notice(notice: &Notice) -> Self {
        let (problem_type, located) = to_problem(&notice.kind);
        let severity = match notice.severity() {
            Severity::Error => ProblemSeverity::Error,
            Severity::Warning => ProblemSeverity::SuspiciousWarning,
            Severity::Info => ProblemSeverity::Info,
        };
        GtfsProblem {
            csv_file_name: notice.filename.clone().unwrap_or_default(),
            problem_type: problem_type as i32,
            severity: severity as i32,
            entity_row: located.row,
            entity_name: located.name,
            entity_id: notice.entity_id.clone(),
            entity_value: located.value,
            alt_entity_id: located.alt_id,
            alt_entity_name: located.alt_name,
            alt_entity_value: located.alt_value,
            code: notice.code().to_owned(),
            title: notice.title().to_owned(),
        }
    }
}

/// Writes one length delimited [GtfsProblem] per notice
pub struct ProtobufNoticeExporter<W: Write> {
    writer: W,
}

impl<W: Write> ProtobufNoticeExporter<W> {
    /// Exporter writing the messages to `writer` as they come
    pub fn new(writer: W) -> Self {
        ProtobufNoticeExporter { writer }
    }

    /// Gives back the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> NoticeExporter for ProtobufNoticeExporter<W> {
    fn export_begin(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn export(&mut self, notice: &Notice) -> Result<(), Error> {
        let mut buf = vec![];
        GtfsProblem::from_notice(notice).encode_length_delimited(&mut buf)?;
        self.writer.write_all(&buf)?;
        Ok(())
    }

    fn export_end(&mut self) -> Result<(), Error> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoticeRepository;

    fn repository() -> NoticeRepository {
        let repo = NoticeRepository::new();
        repo.add_notice(
            Notice::new(NoticeKind::CannotParseInteger {
                field_name: "stop_sequence",
                line_number: 3,
                raw_value: "abc".to_owned(),
            })
            .in_file("stop_times.txt")
            .for_entity("trip1"),
        );
        repo.add_notice(
            Notice::new(NoticeKind::NonStandardHeaders {
                extra_headers: vec!["foo".to_owned()],
            })
            .in_file("stops.txt"),
        );
        repo
    }

    #[test]
    fn json_report() {
        let mut exporter = JsonNoticeExporter::new(vec![]);
        repository().export(&mut exporter).unwrap();
        let report: serde_json::Value = serde_json::from_slice(&exporter.into_inner()).unwrap();
        let results = report["results"].as_array().unwrap();
        assert_eq!(2, results.len());
        assert_eq!("E003", results[0]["code"]);
        assert_eq!("ERROR", results[0]["severity"]);
        assert_eq!("stop_times.txt", results[0]["filename"]);
        assert_eq!("trip1", results[0]["entityId"]);
        assert_eq!(3, results[0]["noticeSpecific"]["lineNumber"]);
        assert_eq!("abc", results[0]["noticeSpecific"]["rawValue"]);
        assert_eq!("WARNING", results[1]["severity"]);
        assert_eq!(
            serde_json::json!(["foo"]),
            results[1]["noticeSpecific"]["extraHeaderName"]
        );

        let keys: Vec<&String> = results[0]["noticeSpecific"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(vec!["fieldName", "lineNumber", "rawValue"], keys);
    }

    #[test]
    fn protobuf_report() {
        let mut exporter = ProtobufNoticeExporter::new(vec![]);
        repository().export(&mut exporter).unwrap();
        let bytes = exporter.into_inner();
        let mut buf = bytes.as_slice();
        let first = GtfsProblem::decode_length_delimited(&mut buf).unwrap();
        let second = GtfsProblem::decode_length_delimited(&mut buf).unwrap();
        assert!(buf.is_empty());

        assert_eq!("stop_times.txt", first.csv_file_name);
        assert_eq!(ProblemType::TypeCsvValueError as i32, first.problem_type);
        assert_eq!(ProblemSeverity::Error as i32, first.severity);
        assert_eq!(3, first.entity_row);
        assert_eq!("stop_sequence", first.entity_name);
        assert_eq!("abc", first.entity_value);
        assert_eq!("E003", first.code);
        assert_eq!(ProblemType::TypeCsvUnknownColumn as i32, second.problem_type);
        assert_eq!(ProblemSeverity::SuspiciousWarning as i32, second.severity);
    }

    #[test]
    fn files_are_written_in_the_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report");
        let mut exporter = exporter_for(ExportFormat::Json, &output).unwrap();
        repository().export(exporter.as_mut()).unwrap();
        drop(exporter);
        let content = std::fs::read_to_string(output.join("results.json")).unwrap();
        assert!(content.contains("\"results\""));
    }
}
