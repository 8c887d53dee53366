//! Diagnostics produced while reading and validating a feed.
//!
//! A [Notice] is one finding. Its [NoticeKind] is a closed set: every consumer that needs to
//! know about the individual kinds matches on it exhaustively.
use crate::export::NoticeExporter;
use crate::Error;
use serde::Serialize;

/// Entity id of the notices that are not about one row
pub const NO_ID: &str = "no id";

/// How serious a notice is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Informative, nothing to fix
    Info,
    /// Suspicious data, probably worth a look
    Warning,
    /// The feed does not follow the reference
    Error,
}

/// A value of the type-specific part of a notice
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NoticeValue {
    /// Text
    Text(String),
    /// Integer
    Integer(i64),
    /// Decimal number
    Float(f64),
    /// Several values
    List(Vec<NoticeValue>),
}

impl From<&str> for NoticeValue {
    fn from(s: &str) -> Self {
        NoticeValue::Text(s.to_owned())
    }
}

impl From<String> for NoticeValue {
    fn from(s: String) -> Self {
        NoticeValue::Text(s)
    }
}

impl From<&String> for NoticeValue {
    fn from(s: &String) -> Self {
        NoticeValue::Text(s.clone())
    }
}

impl From<i64> for NoticeValue {
    fn from(i: i64) -> Self {
        NoticeValue::Integer(i)
    }
}

impl From<u32> for NoticeValue {
    fn from(i: u32) -> Self {
        NoticeValue::Integer(i64::from(i))
    }
}

impl From<u64> for NoticeValue {
    fn from(i: u64) -> Self {
        NoticeValue::Integer(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<usize> for NoticeValue {
    fn from(i: usize) -> Self {
        NoticeValue::Integer(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<f64> for NoticeValue {
    fn from(f: f64) -> Self {
        NoticeValue::Float(f)
    }
}

impl<T: Into<NoticeValue>> From<Vec<T>> for NoticeValue {
    fn from(v: Vec<T>) -> Self {
        NoticeValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl std::fmt::Display for NoticeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            NoticeValue::Text(s) => write!(f, "{}", s),
            NoticeValue::Integer(i) => write!(f, "{}", i),
            NoticeValue::Float(x) => write!(f, "{}", x),
            NoticeValue::List(l) => {
                let parts: Vec<String> = l.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(", "))
            }
        }
    }
}

/// Every kind of notice, with the values specific to it
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum NoticeKind {
    MissingRequiredFile,
    MissingRequiredValue {
        field_name: &'static str,
    },
    CannotParseInteger {
        field_name: &'static str,
        line_number: u64,
        raw_value: String,
    },
    IntegerFieldValueOutOfRange {
        field_name: &'static str,
        range_min: i64,
        range_max: i64,
        actual_value: i64,
    },
    CannotParseFloat {
        field_name: &'static str,
        line_number: u64,
        raw_value: String,
    },
    FloatFieldValueOutOfRange {
        field_name: &'static str,
        range_min: f64,
        range_max: f64,
        actual_value: f64,
        /// Fields locating the value when the entity id is not enough, in order
        context: Vec<(&'static str, String)>,
    },
    CannotParseDate {
        field_name: &'static str,
        line_number: u64,
        raw_value: String,
    },
    InvalidColor {
        field_name: &'static str,
        line_number: u64,
        color_value: String,
    },
    InvalidTime {
        field_name: &'static str,
        line_number: u64,
        time_value: String,
    },
    InvalidUrl {
        field_name: &'static str,
        url_value: String,
    },
    InvalidTimezone {
        field_name: &'static str,
        timezone_value: String,
    },
    InvalidCurrencyCode {
        field_name: &'static str,
        currency_code: String,
    },
    InvalidLang {
        field_name: &'static str,
        lang_value: String,
    },
    InvalidEmail {
        field_name: &'static str,
        email_value: String,
    },
    InvalidRowLength {
        row_index: u64,
        expected_length: usize,
        actual_length: usize,
    },
    MissingHeaders {
        expected_headers: Vec<String>,
        actual_headers: Vec<String>,
    },
    DuplicatedHeader {
        duplicated_header_name: String,
    },
    /// A file with a header but no row. Only an error when the file is required
    EmptyFile {
        required: bool,
    },
    UnexpectedEnumValue {
        field_name: &'static str,
        enum_value: String,
    },
    DuplicatedEntity {
        /// Names and values of the fields making the key, at most five
        key: Vec<(&'static str, String)>,
    },
    CannotUnzipInputArchive {
        reason: String,
    },
    CannotConstructDataProvider {
        reason: String,
    },
    CannotDownloadArchive {
        url: String,
        reason: String,
    },
    IllegalFieldValueCombination {
        field_name: &'static str,
        conflicting_field_name: &'static str,
    },
    RouteColorAndTextInsufficientContrast {
        contrast_ratio: f64,
    },
    StationWithParentStation {
        parent_id: String,
    },
    MissingShortAndLongNameForRoute,
    MissingCalendarAndCalendarDateFiles,
    MissingAgencyId,
    InconsistentAgencyTimezone {
        timezones: Vec<String>,
    },
    ParentStationInvalidLocationType {
        child_location_type: i64,
        parent_id: String,
        expected_parent_location_type: i64,
        actual_parent_location_type: i64,
    },
    CalendarEndDateBeforeStartDate {
        start_date: String,
        end_date: String,
    },
    RouteIdNotFound {
        field_name: &'static str,
        unknown_route_id: String,
    },
    ShapeIdNotFound {
        field_name: &'static str,
        unknown_shape_id: String,
    },
    AgencyIdNotFound {
        field_name: &'static str,
        unknown_agency_id: String,
    },
    ServiceIdNotFound {
        field_name: &'static str,
        unknown_service_id: String,
    },
    FeedInfoStartDateAfterEndDate {
        start_date: String,
        end_date: String,
    },
    TripIdNotFound {
        field_name: &'static str,
        unknown_trip_id: String,
    },
    StopIdNotFound {
        field_name: &'static str,
        unknown_stop_id: String,
    },
    FareIdNotFound {
        field_name: &'static str,
        unknown_fare_id: String,
    },
    FeedExpiresInLessThan7Days {
        feed_end_date: String,
        current_date: String,
    },
    DecreasingStopTimeDistance {
        stop_sequence: u32,
        shape_dist_traveled: f64,
        previous_stop_sequence: u32,
        previous_shape_dist_traveled: f64,
    },
    DecreasingShapeDistance {
        shape_pt_sequence: u32,
        shape_dist_traveled: f64,
        previous_shape_pt_sequence: u32,
        previous_shape_dist_traveled: f64,
    },
    MissingTripEdgeStopTime {
        field_name: &'static str,
        stop_sequence: u32,
    },
    StopTimeArrivalTimeAfterDepartureTime {
        stop_sequence: u32,
        arrival_time: String,
        departure_time: String,
    },
    FrequencyStartTimeAfterEndTime {
        start_time: String,
        end_time: String,
    },
    FastTravelBetweenStops {
        speed_kmh: f64,
        stop_sequences: Vec<u32>,
    },
    BackwardsTimeTravelInStop {
        stop_sequence: u32,
        arrival_time: String,
        previous_stop_sequence: u32,
        previous_departure_time: String,
    },
    UnusableTrip,
    StopTooFarFromTripShape {
        stop_id: String,
        stop_sequence: u32,
        shape_id: String,
        distance_meters: f64,
    },
    OverlappingTripFrequencies {
        previous_start_time: String,
        previous_end_time: String,
        start_time: String,
        end_time: String,
    },
    BlockTripsWithOverlappingStopTimes {
        previous_trip_id: String,
        block_id: String,
        trip_first_time: String,
        trip_last_time: String,
        previous_trip_first_time: String,
        previous_trip_last_time: String,
        conflicting_dates: Vec<String>,
    },
    FeedInfoLangAgencyLangMismatch {
        agency_lang: String,
        feed_lang: String,
    },
    ValidatorCrash {
        rule_name: String,
        exception_message: String,
        stack_trace: String,
    },
    OutOfMemory {
        dataset_size_megabytes: f64,
        notice_count: usize,
    },
    NonStandardHeaders {
        extra_headers: Vec<String>,
    },
    NonAsciiOrNonPrintableChar {
        field_name: &'static str,
        raw_value: String,
    },
    InputZipContainsFolder {
        folder_name: String,
    },
    ExtraFileFound,
    RouteShortNameTooLong {
        short_name_length: usize,
    },
    SameNameAndDescriptionForRoute {
        route_desc: String,
        conflicting_field_name: &'static str,
    },
    RouteLongNameContainsShortName,
    SuspiciousMinTransferTime {
        range_min: i64,
        range_max: i64,
        actual_value: i64,
    },
    MissingFeedEndDate,
    MissingFeedStartDate,
    FeedExpiresInLessThan30Days {
        feed_end_date: String,
        current_date: String,
    },
    ShapeNotUsed,
    DuplicateRouteLongName {
        duplicate_long_name: String,
        conflicting_route_id: String,
    },
    DuplicateRouteShortName {
        duplicate_short_name: String,
        conflicting_route_id: String,
    },
    DuplicateRouteLongNameShortNameCombination {
        duplicate_long_name: String,
        duplicate_short_name: String,
        conflicting_route_id: String,
    },
    TripNotUsed,
    RouteLongNameEqualsShortName,
    ValidationProcessInfo {
        input: String,
        processed_files: Vec<String>,
        processing_time_secs: f64,
        error_count: usize,
        warning_count: usize,
    },
}

/// One diagnostic about the feed
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    /// File the notice is about, if any
    pub filename: Option<String>,
    /// Identifier of the row the notice is about, [NO_ID] otherwise
    pub entity_id: String,
    /// What was found
    pub kind: NoticeKind,
}

impl Notice {
    /// A notice about no file and no entity
    pub fn new(kind: NoticeKind) -> Self {
        Notice {
            filename: None,
            entity_id: NO_ID.to_owned(),
            kind,
        }
    }

    /// Sets the file of the notice
    pub fn in_file(mut self, filename: &str) -> Self {
        self.filename = Some(filename.to_owned());
        self
    }

    /// Sets the entity of the notice
    pub fn for_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = entity_id.into();
        self
    }

    /// Stable code of the notice kind, never reused for another kind
    pub fn code(&self) -> &'static str {
        use NoticeKind::*;
        match &self.kind {
            MissingRequiredFile => "E001",
            MissingRequiredValue { .. } => "E002",
            CannotParseInteger { .. } => "E003",
            IntegerFieldValueOutOfRange { .. } => "E004",
            CannotParseFloat { .. } => "E005",
            FloatFieldValueOutOfRange { .. } => "E006",
            CannotParseDate { .. } => "E007",
            InvalidColor { .. } => "E008",
            InvalidTime { .. } => "E009",
            InvalidUrl { .. } => "E010",
            InvalidTimezone { .. } => "E011",
            InvalidCurrencyCode { .. } => "E012",
            InvalidLang { .. } => "E013",
            InvalidEmail { .. } => "E014",
            InvalidRowLength { .. } => "E015",
            MissingHeaders { .. } => "E016",
            DuplicatedHeader { .. } => "E017",
            EmptyFile { required: true } => "E018",
            EmptyFile { required: false } => "W006",
            UnexpectedEnumValue { .. } => "E019",
            DuplicatedEntity { .. } => "E020",
            CannotUnzipInputArchive { .. } => "E021",
            CannotConstructDataProvider { .. } => "E022",
            CannotDownloadArchive { .. } => "E023",
            IllegalFieldValueCombination { .. } => "E024",
            RouteColorAndTextInsufficientContrast { .. } => "E025",
            StationWithParentStation { .. } => "E026",
            MissingShortAndLongNameForRoute => "E027",
            MissingCalendarAndCalendarDateFiles => "E028",
            MissingAgencyId => "E029",
            InconsistentAgencyTimezone { .. } => "E030",
            ParentStationInvalidLocationType { .. } => "E031",
            CalendarEndDateBeforeStartDate { .. } => "E032",
            RouteIdNotFound { .. } => "E033",
            ShapeIdNotFound { .. } => "E034",
            AgencyIdNotFound { .. } => "E035",
            ServiceIdNotFound { .. } => "E036",
            FeedInfoStartDateAfterEndDate { .. } => "E037",
            TripIdNotFound { .. } => "E038",
            StopIdNotFound { .. } => "E039",
            FareIdNotFound { .. } => "E040",
            FeedExpiresInLessThan7Days { .. } => "E041",
            DecreasingStopTimeDistance { .. } => "E042",
            DecreasingShapeDistance { .. } => "E043",
            MissingTripEdgeStopTime { .. } => "E044",
            StopTimeArrivalTimeAfterDepartureTime { .. } => "E045",
            FrequencyStartTimeAfterEndTime { .. } => "E046",
            FastTravelBetweenStops { .. } => "E047",
            BackwardsTimeTravelInStop { .. } => "E048",
            UnusableTrip => "E051",
            StopTooFarFromTripShape { .. } => "E052",
            OverlappingTripFrequencies { .. } => "E053",
            BlockTripsWithOverlappingStopTimes { .. } => "E054",
            FeedInfoLangAgencyLangMismatch { .. } => "E055",
            ValidatorCrash { .. } => "E056",
            OutOfMemory { .. } => "E057",
            NonStandardHeaders { .. } => "W001",
            NonAsciiOrNonPrintableChar { .. } => "W002",
            InputZipContainsFolder { .. } => "W003",
            ExtraFileFound => "W004",
            RouteShortNameTooLong { .. } => "W005",
            SameNameAndDescriptionForRoute { .. } => "W007",
            RouteLongNameContainsShortName => "W008",
            SuspiciousMinTransferTime { .. } => "W009",
            MissingFeedEndDate => "W010",
            MissingFeedStartDate => "W011",
            FeedExpiresInLessThan30Days { .. } => "W012",
            ShapeNotUsed => "W013",
            DuplicateRouteLongName { .. } => "W014",
            DuplicateRouteShortName { .. } => "W015",
            DuplicateRouteLongNameShortNameCombination { .. } => "W016",
            TripNotUsed => "W017",
            RouteLongNameEqualsShortName => "W018",
            ValidationProcessInfo { .. } => "I001",
        }
    }

    /// The severity follows the first letter of the code
    pub fn severity(&self) -> Severity {
        match self.code().as_bytes().first() {
            Some(b'E') => Severity::Error,
            Some(b'W') => Severity::Warning,
            _ => Severity::Info,
        }
    }

    /// Human readable summary of the notice kind
    pub fn title(&self) -> &'static str {
        use NoticeKind::*;
        match &self.kind {
            MissingRequiredFile => "Missing required file",
            MissingRequiredValue { .. } => "Missing required value",
            CannotParseInteger { .. } => "Invalid integer value",
            IntegerFieldValueOutOfRange { .. } => "Out of range integer value",
            CannotParseFloat { .. } => "Invalid float value",
            FloatFieldValueOutOfRange { .. } => "Out of range float value",
            CannotParseDate { .. } => "Invalid date value",
            InvalidColor { .. } => "Invalid color",
            InvalidTime { .. } => "Invalid time",
            InvalidUrl { .. } => "Invalid url",
            InvalidTimezone { .. } => "Invalid timezone",
            InvalidCurrencyCode { .. } => "Invalid currency code",
            InvalidLang { .. } => "Invalid language code",
            InvalidEmail { .. } => "Invalid email",
            InvalidRowLength { .. } => "Invalid row length",
            MissingHeaders { .. } => "Missing required headers",
            DuplicatedHeader { .. } => "Duplicated header",
            EmptyFile { .. } => "Empty file",
            UnexpectedEnumValue { .. } => "Unexpected enum value",
            DuplicatedEntity { .. } => "Duplicate entity",
            CannotUnzipInputArchive { .. } => "Archive can't be unzipped",
            CannotConstructDataProvider { .. } => "Data provider error",
            CannotDownloadArchive { .. } => "Archive can't be downloaded",
            IllegalFieldValueCombination { .. } => "Illegal field value combination",
            RouteColorAndTextInsufficientContrast { .. } => "Insufficient route color contrast",
            StationWithParentStation { .. } => "Station with parent station",
            MissingShortAndLongNameForRoute => "Missing route short name and long name",
            MissingCalendarAndCalendarDateFiles => "Missing both calendar files",
            MissingAgencyId => "Missing agency id",
            InconsistentAgencyTimezone { .. } => "Inconsistent timezone among agencies",
            ParentStationInvalidLocationType { .. } => "Invalid parent location type",
            CalendarEndDateBeforeStartDate { .. } => "Calendar end date before start date",
            RouteIdNotFound { .. } => "Route not found",
            ShapeIdNotFound { .. } => "Shape not found",
            AgencyIdNotFound { .. } => "Agency not found",
            ServiceIdNotFound { .. } => "Service not found",
            FeedInfoStartDateAfterEndDate { .. } => "Feed start date after end date",
            TripIdNotFound { .. } => "Trip not found",
            StopIdNotFound { .. } => "Stop not found",
            FareIdNotFound { .. } => "Fare not found",
            FeedExpiresInLessThan7Days { .. } => "Feed expires in less than 7 days",
            DecreasingStopTimeDistance { .. } => "Decreasing stop time distance",
            DecreasingShapeDistance { .. } => "Decreasing shape distance",
            MissingTripEdgeStopTime { .. } => "Missing trip edge arrival or departure time",
            StopTimeArrivalTimeAfterDepartureTime { .. } => "Arrival time after departure time",
            FrequencyStartTimeAfterEndTime { .. } => "Frequency start time after end time",
            FastTravelBetweenStops { .. } => "Fast travel between stops",
            BackwardsTimeTravelInStop { .. } => "Backwards time travel between stops",
            UnusableTrip => "Trip with less than two stops",
            StopTooFarFromTripShape { .. } => "Stop too far from trip shape",
            OverlappingTripFrequencies { .. } => "Overlapping frequencies for trip",
            BlockTripsWithOverlappingStopTimes { .. } => "Block trips with overlapping stop times",
            FeedInfoLangAgencyLangMismatch { .. } => "Mismatching feed and agency language",
            ValidatorCrash { .. } => "Fatal error",
            OutOfMemory { .. } => "Out of memory",
            NonStandardHeaders { .. } => "Non standard headers",
            NonAsciiOrNonPrintableChar { .. } => "Suspicious id",
            InputZipContainsFolder { .. } => "Input zip contains folder",
            ExtraFileFound => "Extra file found",
            RouteShortNameTooLong { .. } => "Route short name too long",
            SameNameAndDescriptionForRoute { .. } => "Same name and description for route",
            RouteLongNameContainsShortName => "Route long name contains short name",
            SuspiciousMinTransferTime { .. } => "Suspicious minimum transfer time",
            MissingFeedEndDate => "Missing feed end date",
            MissingFeedStartDate => "Missing feed start date",
            FeedExpiresInLessThan30Days { .. } => "Feed expires in less than 30 days",
            ShapeNotUsed => "Shape not used",
            DuplicateRouteLongName { .. } => "Duplicate route long name",
            DuplicateRouteShortName { .. } => "Duplicate route short name",
            DuplicateRouteLongNameShortNameCombination { .. } => {
                "Duplicate combination of route long and short names"
            }
            TripNotUsed => "Trip not used",
            RouteLongNameEqualsShortName => "Route long name equals short name",
            ValidationProcessInfo { .. } => "Validation process information",
        }
    }

    /// The values specific to the kind of notice, with their report names
    pub fn specific_fields(&self) -> Vec<(&'static str, NoticeValue)> {
        use NoticeKind::*;
        fn f(name: &'static str, value: impl Into<NoticeValue>) -> (&'static str, NoticeValue) {
            (name, value.into())
        }
        match &self.kind {
            MissingRequiredFile
            | MissingShortAndLongNameForRoute
            | MissingCalendarAndCalendarDateFiles
            | MissingAgencyId
            | UnusableTrip
            | ExtraFileFound
            | RouteLongNameContainsShortName
            | MissingFeedEndDate
            | MissingFeedStartDate
            | ShapeNotUsed
            | TripNotUsed
            | RouteLongNameEqualsShortName => vec![],
            MissingRequiredValue { field_name } => vec![f("fieldName", *field_name)],
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
            } => vec![
                f("fieldName", *field_name),
                f("lineNumber", *line_number),
                f("rawValue", raw_value),
            ],
            IntegerFieldValueOutOfRange {
                field_name,
                range_min,
                range_max,
                actual_value,
            } => vec![
                f("fieldName", *field_name),
                f("rangeMin", *range_min),
                f("rangeMax", *range_max),
                f("actualValue", *actual_value),
            ],
            FloatFieldValueOutOfRange {
                field_name,
                range_min,
                range_max,
                actual_value,
                context,
            } => {
                let mut fields = vec![
                    f("fieldName", *field_name),
                    f("rangeMin", *range_min),
                    f("rangeMax", *range_max),
                    f("actualValue", *actual_value),
                ];
                fields.extend(composite_key_fields(context));
                fields
            }
            InvalidColor {
                field_name,
                line_number,
                color_value,
            } => vec![
                f("fieldName", *field_name),
                f("lineNumber", *line_number),
                f("colorValue", color_value),
            ],
            InvalidTime {
                field_name,
                line_number,
                time_value,
            } => vec![
                f("fieldName", *field_name),
                f("lineNumber", *line_number),
                f("timeValue", time_value),
            ],
            InvalidUrl {
                field_name,
                url_value,
            } => vec![f("fieldName", *field_name), f("urlValue", url_value)],
            InvalidTimezone {
                field_name,
                timezone_value,
            } => vec![
                f("fieldName", *field_name),
                f("timezoneValue", timezone_value),
            ],
            InvalidCurrencyCode {
                field_name,
                currency_code,
            } => vec![
                f("fieldName", *field_name),
                f("currencyCode", currency_code),
            ],
            InvalidLang {
                field_name,
                lang_value,
            } => vec![f("fieldName", *field_name), f("langValue", lang_value)],
            InvalidEmail {
                field_name,
                email_value,
            } => vec![f("fieldName", *field_name), f("emailValue", email_value)],
            InvalidRowLength {
                row_index,
                expected_length,
                actual_length,
            } => vec![
                f("rowIndex", *row_index),
                f("expectedLength", *expected_length),
                f("actualLength", *actual_length),
            ],
            MissingHeaders {
                expected_headers,
                actual_headers,
            } => vec![
                f("expectedHeaders", expected_headers.clone()),
                f("actualHeaders", actual_headers.clone()),
            ],
            DuplicatedHeader {
                duplicated_header_name,
            } => vec![f("duplicatedHeaderName", duplicated_header_name)],
            EmptyFile { .. } => vec![],
            UnexpectedEnumValue {
                field_name,
                enum_value,
            } => vec![f("fieldName", *field_name), f("enumValue", enum_value)],
            DuplicatedEntity { key } => composite_key_fields(key),
            CannotUnzipInputArchive { reason } | CannotConstructDataProvider { reason } => {
                vec![f("reason", reason)]
            }
            CannotDownloadArchive { url, reason } => vec![f("url", url), f("reason", reason)],
            IllegalFieldValueCombination {
                field_name,
                conflicting_field_name,
            } => vec![
                f("fieldName", *field_name),
                f("conflictingFieldName", *conflicting_field_name),
            ],
            RouteColorAndTextInsufficientContrast { contrast_ratio } => {
                vec![f("contrastRatio", *contrast_ratio)]
            }
            StationWithParentStation { parent_id } => vec![f("parentId", parent_id)],
            InconsistentAgencyTimezone { timezones } => {
                vec![f("timezoneCollection", timezones.clone())]
            }
            ParentStationInvalidLocationType {
                child_location_type,
                parent_id,
                expected_parent_location_type,
                actual_parent_location_type,
            } => vec![
                f("childLocationType", *child_location_type),
                f("parentId", parent_id),
                f("expectedParentLocationType", *expected_parent_location_type),
                f("actualParentLocationType", *actual_parent_location_type),
            ],
            CalendarEndDateBeforeStartDate {
                start_date,
                end_date,
            } => vec![f("startDate", start_date), f("endDate", end_date)],
            RouteIdNotFound {
                field_name,
                unknown_route_id,
            } => vec![
                f("fieldName", *field_name),
                f("unknownRouteId", unknown_route_id),
            ],
            ShapeIdNotFound {
                field_name,
                unknown_shape_id,
            } => vec![
                f("fieldName", *field_name),
                f("unknownShapeId", unknown_shape_id),
            ],
            AgencyIdNotFound {
                field_name,
                unknown_agency_id,
            } => vec![
                f("fieldName", *field_name),
                f("unknownAgencyId", unknown_agency_id),
            ],
            ServiceIdNotFound {
                field_name,
                unknown_service_id,
            } => vec![
                f("fieldName", *field_name),
                f("unknownServiceId", unknown_service_id),
            ],
            FeedInfoStartDateAfterEndDate {
                start_date,
                end_date,
            } => vec![
                f("feedInfoStartDate", start_date),
                f("feedInfoEndDate", end_date),
            ],
            TripIdNotFound {
                field_name,
                unknown_trip_id,
            } => vec![
                f("fieldName", *field_name),
                f("unknownTripId", unknown_trip_id),
            ],
            StopIdNotFound {
                field_name,
                unknown_stop_id,
            } => vec![
                f("fieldName", *field_name),
                f("unknownStopId", unknown_stop_id),
            ],
            FareIdNotFound {
                field_name,
                unknown_fare_id,
            } => vec![
                f("fieldName", *field_name),
                f("unknownFareId", unknown_fare_id),
            ],
            FeedExpiresInLessThan7Days {
                feed_end_date,
                current_date,
            }
            | FeedExpiresInLessThan30Days {
                feed_end_date,
                current_date,
            } => vec![
                f("feedInfoEndDate", feed_end_date),
                f("currentDate", current_date),
            ],
            DecreasingStopTimeDistance {
                stop_sequence,
                shape_dist_traveled,
                previous_stop_sequence,
                previous_shape_dist_traveled,
            } => vec![
                f("stopTimeStopSequence", *stop_sequence),
                f("stopTimeShapeDistTraveled", *shape_dist_traveled),
                f("previousStopSequence", *previous_stop_sequence),
                f(
                    "stopTimeConflictingShapeDistTraveled",
                    *previous_shape_dist_traveled,
                ),
            ],
            DecreasingShapeDistance {
                shape_pt_sequence,
                shape_dist_traveled,
                previous_shape_pt_sequence,
                previous_shape_dist_traveled,
            } => vec![
                f("shapePtSequence", *shape_pt_sequence),
                f("shapeDistTraveled", *shape_dist_traveled),
                f("previousShapePtSequence", *previous_shape_pt_sequence),
                f("previousShapeDistTraveled", *previous_shape_dist_traveled),
            ],
            MissingTripEdgeStopTime {
                field_name,
                stop_sequence,
            } => vec![
                f("fieldName", *field_name),
                f("stopTimeStopSequence", *stop_sequence),
            ],
            StopTimeArrivalTimeAfterDepartureTime {
                stop_sequence,
                arrival_time,
                departure_time,
            } => vec![
                f("stopTimeStopSequence", *stop_sequence),
                f("stopTimeArrivalTime", arrival_time),
                f("stopTimeDepartureTime", departure_time),
            ],
            FrequencyStartTimeAfterEndTime {
                start_time,
                end_time,
            } => vec![
                f("frequencyStartTime", start_time),
                f("frequencyEndTime", end_time),
            ],
            FastTravelBetweenStops {
                speed_kmh,
                stop_sequences,
            } => vec![
                f("speedKmh", *speed_kmh),
                f("stopTimeStopSequenceList", stop_sequences.clone()),
            ],
            BackwardsTimeTravelInStop {
                stop_sequence,
                arrival_time,
                previous_stop_sequence,
                previous_departure_time,
            } => vec![
                f("stopTimeStopSequence", *stop_sequence),
                f("stopTimeArrivalTime", arrival_time),
                f("previousStopSequence", *previous_stop_sequence),
                f("previousStopTimeDepartureTime", previous_departure_time),
            ],
            StopTooFarFromTripShape {
                stop_id,
                stop_sequence,
                shape_id,
                distance_meters,
            } => vec![
                f("stopId", stop_id),
                f("stopTimeStopSequence", *stop_sequence),
                f("shapeId", shape_id),
                f("distanceMeters", *distance_meters),
            ],
            OverlappingTripFrequencies {
                previous_start_time,
                previous_end_time,
                start_time,
                end_time,
            } => vec![
                f("previousFrequencyStartTime", previous_start_time),
                f("previousFrequencyEndTime", previous_end_time),
                f("frequencyStartTime", start_time),
                f("frequencyEndTime", end_time),
            ],
            BlockTripsWithOverlappingStopTimes {
                previous_trip_id,
                block_id,
                trip_first_time,
                trip_last_time,
                previous_trip_first_time,
                previous_trip_last_time,
                conflicting_dates,
            } => vec![
                f("previousTripId", previous_trip_id),
                f("blockId", block_id),
                f("tripFirstTime", trip_first_time),
                f("tripLastTime", trip_last_time),
                f("previousTripFirstTime", previous_trip_first_time),
                f("previousTripLastTime", previous_trip_last_time),
                f("conflictingDateList", conflicting_dates.clone()),
            ],
            FeedInfoLangAgencyLangMismatch {
                agency_lang,
                feed_lang,
            } => vec![
                f("agencyAgencyLang", agency_lang),
                f("feedInfoFeedLang", feed_lang),
            ],
            ValidatorCrash {
                rule_name,
                exception_message,
                stack_trace,
            } => vec![
                f("ruleName", rule_name),
                f("exceptionMessage", exception_message),
                f("stackTrace", stack_trace),
            ],
            OutOfMemory {
                dataset_size_megabytes,
                notice_count,
            } => vec![
                f("datasetSizeMegabytes", *dataset_size_megabytes),
                f("noticeCount", *notice_count),
            ],
            NonStandardHeaders { extra_headers } => {
                vec![f("extraHeaderName", extra_headers.clone())]
            }
            NonAsciiOrNonPrintableChar {
                field_name,
                raw_value,
            } => vec![f("fieldName", *field_name), f("rawValue", raw_value)],
            InputZipContainsFolder { folder_name } => vec![f("folderName", folder_name)],
            RouteShortNameTooLong { short_name_length } => {
                vec![f("shortNameLength", *short_name_length)]
            }
            SameNameAndDescriptionForRoute {
                route_desc,
                conflicting_field_name,
            } => vec![
                f("routeDesc", route_desc),
                f("conflictingFieldName", *conflicting_field_name),
            ],
            SuspiciousMinTransferTime {
                range_min,
                range_max,
                actual_value,
            } => vec![
                f("rangeMin", *range_min),
                f("rangeMax", *range_max),
                f("actualValue", *actual_value),
            ],
            DuplicateRouteLongName {
                duplicate_long_name,
                conflicting_route_id,
            } => vec![
                f("routeDuplicateRouteLongName", duplicate_long_name),
                f("routeConflictingRouteId", conflicting_route_id),
            ],
            DuplicateRouteShortName {
                duplicate_short_name,
                conflicting_route_id,
            } => vec![
                f("routeDuplicateRouteShortName", duplicate_short_name),
                f("routeConflictingRouteId", conflicting_route_id),
            ],
            DuplicateRouteLongNameShortNameCombination {
                duplicate_long_name,
                duplicate_short_name,
                conflicting_route_id,
            } => vec![
                f("routeDuplicateRouteLongName", duplicate_long_name),
                f("routeDuplicateRouteShortName", duplicate_short_name),
                f("routeConflictingRouteId", conflicting_route_id),
            ],
            ValidationProcessInfo {
                input,
                processed_files,
                processing_time_secs,
                error_count,
                warning_count,
            } => vec![
                f("pathOrUrlToGtfsArchive", input),
                f("processedFilenameCollection", processed_files.clone()),
                f("processingTimeSecs", *processing_time_secs),
                f("errorNoticeCount", *error_count),
                f("warningNoticeCount", *warning_count),
            ],
        }
    }

    /// Second half of the double dispatch of the export
    pub fn export(&self, exporter: &mut dyn NoticeExporter) -> Result<(), Error> {
        exporter.export(self)
    }
}

const PART_NAMES: [(&str, &str); 5] = [
    ("compositeKeyFirstPart", "compositeKeyFirstValue"),
    ("compositeKeySecondPart", "compositeKeySecondValue"),
    ("compositeKeyThirdPart", "compositeKeyThirdValue"),
    ("compositeKeyFourthPart", "compositeKeyFourthValue"),
    ("compositeKeyFifthPart", "compositeKeyFifthValue"),
];

fn composite_key_fields(key: &[(&'static str, String)]) -> Vec<(&'static str, NoticeValue)> {
    key.iter()
        .zip(PART_NAMES.iter())
        .flat_map(|((field, value), (part_name, value_name))| {
            [
                (*part_name, NoticeValue::from(*field)),
                (*value_name, NoticeValue::from(value)),
            ]
        })
        .collect()
}
