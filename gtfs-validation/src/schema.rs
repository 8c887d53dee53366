//! Declared shape of every file of a feed: which files must be there, their columns and the type
//! of each column.
//!
//! This is configuration data: the parser and the ingestion only read it.

/// Type of the values of a column, with the constraints the type validation applies
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnType {
    /// Free text, kept as is
    Text,
    /// Identifier, only printable ASCII characters are expected
    Id,
    /// Integer, within the inclusive bounds
    Integer {
        /// Lowest accepted value
        min: i64,
        /// Highest accepted value
        max: i64,
    },
    /// Decimal number, within the inclusive bounds
    Float {
        /// Lowest accepted value
        min: f64,
        /// Highest accepted value
        max: f64,
    },
    /// Date in the `YYYYMMDD` format
    Date,
    /// Time in the `HH:MM:SS` format, may be past midnight
    Time,
    /// Color as six hexadecimal digits
    Color,
    /// Absolute `http` or `https` URL
    Url,
    /// Email address
    Email,
    /// Timezone name of the tz database
    Timezone,
    /// IETF BCP 47 language code
    Language,
    /// ISO 4217 currency code
    CurrencyCode,
    /// Integer whose meaning is an enumeration, checked by the entity builders
    Enum,
}

const NON_NEGATIVE: ColumnType = ColumnType::Integer {
    min: 0,
    max: i64::MAX,
};
const NON_NEGATIVE_FLOAT: ColumnType = ColumnType::Float {
    min: 0.0,
    max: f64::MAX,
};
const LATITUDE: ColumnType = ColumnType::Float {
    min: -90.0,
    max: 90.0,
};
const LONGITUDE: ColumnType = ColumnType::Float {
    min: -180.0,
    max: 180.0,
};
const ANY_FLOAT: ColumnType = ColumnType::Float {
    min: f64::MIN,
    max: f64::MAX,
};
const ANY_INTEGER: ColumnType = ColumnType::Integer {
    min: i64::MIN,
    max: i64::MAX,
};

/// One column of a file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSchema {
    /// Name of the column, as in the header
    pub name: &'static str,
    /// Type of the values
    pub column_type: ColumnType,
    /// The column must be in the header of the file
    pub header_required: bool,
    /// The value of this column identifies the row in the notices
    pub is_id: bool,
}

const fn col(name: &'static str, column_type: ColumnType) -> ColumnSchema {
    ColumnSchema {
        name,
        column_type,
        header_required: false,
        is_id: false,
    }
}

const fn req(name: &'static str, column_type: ColumnType) -> ColumnSchema {
    ColumnSchema {
        name,
        column_type,
        header_required: true,
        is_id: false,
    }
}

const fn id(name: &'static str) -> ColumnSchema {
    ColumnSchema {
        name,
        column_type: ColumnType::Id,
        header_required: true,
        is_id: true,
    }
}

/// Whether a file must be present in the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRequirement {
    /// The feed is invalid without it
    Required,
    /// Can be omitted
    Optional,
    /// At least one of `calendar.txt` and `calendar_dates.txt` must be present
    CalendarGroup,
}

/// One file of the feed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableSchema {
    /// Name of the file, like `stops.txt`
    pub file_name: &'static str,
    /// Whether the file must be there
    pub requirement: FileRequirement,
    /// Known columns, in the order of the reference documentation
    pub columns: &'static [ColumnSchema],
}

impl TableSchema {
    /// The declared column with that name
    pub fn column(&self, name: &str) -> Option<&'static ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Names of the columns that must be present in the header
    pub fn required_headers(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|c| c.header_required)
            .map(|c| c.name)
            .collect()
    }

    /// The column whose value identifies a row
    pub fn id_column(&self) -> Option<&'static str> {
        self.columns.iter().find(|c| c.is_id).map(|c| c.name)
    }

    /// A file without data rows is an error for required files, a warning otherwise
    pub fn is_required(&self) -> bool {
        self.requirement == FileRequirement::Required
    }
}

/// The schema of a file, `None` if the file is not part of a feed
pub fn table_schema(file_name: &str) -> Option<&'static TableSchema> {
    GTFS_SCHEMA.iter().find(|t| t.file_name == file_name)
}

/// Every known file, in the order they are ingested
///
/// Files referenced by others come first, so lookups during ingestion see their targets.
pub static GTFS_SCHEMA: &[TableSchema] = &[
    TableSchema {
        file_name: "agency.txt",
        requirement: FileRequirement::Required,
        columns: &[
            ColumnSchema {
                header_required: false,
                ..id("agency_id")
            },
            req("agency_name", ColumnType::Text),
            req("agency_url", ColumnType::Url),
            req("agency_timezone", ColumnType::Timezone),
            col("agency_lang", ColumnType::Language),
            col("agency_phone", ColumnType::Text),
            col("agency_fare_url", ColumnType::Url),
            col("agency_email", ColumnType::Email),
        ],
    },
    TableSchema {
        file_name: "stops.txt",
        requirement: FileRequirement::Required,
        columns: &[
            id("stop_id"),
            col("stop_code", ColumnType::Text),
            col("stop_name", ColumnType::Text),
            col("stop_desc", ColumnType::Text),
            col("stop_lat", LATITUDE),
            col("stop_lon", LONGITUDE),
            col("zone_id", ColumnType::Id),
            col("stop_url", ColumnType::Url),
            col("location_type", ColumnType::Enum),
            col("parent_station", ColumnType::Id),
            col("stop_timezone", ColumnType::Timezone),
            col("wheelchair_boarding", ColumnType::Enum),
            col("level_id", ColumnType::Id),
            col("platform_code", ColumnType::Text),
        ],
    },
    TableSchema {
        file_name: "routes.txt",
        requirement: FileRequirement::Required,
        columns: &[
            id("route_id"),
            col("agency_id", ColumnType::Id),
            col("route_short_name", ColumnType::Text),
            col("route_long_name", ColumnType::Text),
            col("route_desc", ColumnType::Text),
            req("route_type", ColumnType::Enum),
            col("route_url", ColumnType::Url),
            col("route_color", ColumnType::Color),
            col("route_text_color", ColumnType::Color),
            col("route_sort_order", NON_NEGATIVE),
            col("continuous_pickup", ColumnType::Enum),
            col("continuous_drop_off", ColumnType::Enum),
        ],
    },
    TableSchema {
        file_name: "trips.txt",
        requirement: FileRequirement::Required,
        columns: &[
            req("route_id", ColumnType::Id),
            req("service_id", ColumnType::Id),
            id("trip_id"),
            col("trip_headsign", ColumnType::Text),
            col("trip_short_name", ColumnType::Text),
            col("direction_id", ColumnType::Enum),
            col("block_id", ColumnType::Id),
            col("shape_id", ColumnType::Id),
            col("wheelchair_accessible", ColumnType::Enum),
            col("bikes_allowed", ColumnType::Enum),
        ],
    },
    TableSchema {
        file_name: "calendar.txt",
        requirement: FileRequirement::CalendarGroup,
        columns: &[
            id("service_id"),
            req("monday", ColumnType::Enum),
            req("tuesday", ColumnType::Enum),
            req("wednesday", ColumnType::Enum),
            req("thursday", ColumnType::Enum),
            req("friday", ColumnType::Enum),
            req("saturday", ColumnType::Enum),
            req("sunday", ColumnType::Enum),
            req("start_date", ColumnType::Date),
            req("end_date", ColumnType::Date),
        ],
    },
    TableSchema {
        file_name: "calendar_dates.txt",
        requirement: FileRequirement::CalendarGroup,
        columns: &[
            id("service_id"),
            req("date", ColumnType::Date),
            req("exception_type", ColumnType::Enum),
        ],
    },
    TableSchema {
        file_name: "stop_times.txt",
        requirement: FileRequirement::Required,
        columns: &[
            id("trip_id"),
            col("arrival_time", ColumnType::Time),
            col("departure_time", ColumnType::Time),
            req("stop_id", ColumnType::Id),
            req("stop_sequence", NON_NEGATIVE),
            col("stop_headsign", ColumnType::Text),
            col("pickup_type", ColumnType::Enum),
            col("drop_off_type", ColumnType::Enum),
            col("continuous_pickup", ColumnType::Enum),
            col("continuous_drop_off", ColumnType::Enum),
            col("shape_dist_traveled", NON_NEGATIVE_FLOAT),
            col("timepoint", ColumnType::Enum),
        ],
    },
    TableSchema {
        file_name: "frequencies.txt",
        requirement: FileRequirement::Optional,
        columns: &[
            id("trip_id"),
            req("start_time", ColumnType::Time),
            req("end_time", ColumnType::Time),
            req("headway_secs", NON_NEGATIVE),
            col("exact_times", ColumnType::Enum),
        ],
    },
    TableSchema {
        file_name: "shapes.txt",
        requirement: FileRequirement::Optional,
        columns: &[
            id("shape_id"),
            req("shape_pt_lat", LATITUDE),
            req("shape_pt_lon", LONGITUDE),
            req("shape_pt_sequence", NON_NEGATIVE),
            col("shape_dist_traveled", NON_NEGATIVE_FLOAT),
        ],
    },
    TableSchema {
        file_name: "fare_attributes.txt",
        requirement: FileRequirement::Optional,
        columns: &[
            id("fare_id"),
            req("price", NON_NEGATIVE_FLOAT),
            req("currency_type", ColumnType::CurrencyCode),
            req("payment_method", ColumnType::Enum),
            req("transfers", ColumnType::Enum),
            col("agency_id", ColumnType::Id),
            col("transfer_duration", NON_NEGATIVE),
        ],
    },
    TableSchema {
        file_name: "fare_rules.txt",
        requirement: FileRequirement::Optional,
        columns: &[
            id("fare_id"),
            col("route_id", ColumnType::Id),
            col("origin_id", ColumnType::Id),
            col("destination_id", ColumnType::Id),
            col("contains_id", ColumnType::Id),
        ],
    },
    TableSchema {
        file_name: "transfers.txt",
        requirement: FileRequirement::Optional,
        columns: &[
            id("from_stop_id"),
            req("to_stop_id", ColumnType::Id),
            req("transfer_type", ColumnType::Enum),
            col("min_transfer_time", ANY_INTEGER),
        ],
    },
    TableSchema {
        file_name: "pathways.txt",
        requirement: FileRequirement::Optional,
        columns: &[
            id("pathway_id"),
            req("from_stop_id", ColumnType::Id),
            req("to_stop_id", ColumnType::Id),
            req("pathway_mode", ColumnType::Enum),
            req("is_bidirectional", ColumnType::Enum),
            col("length", NON_NEGATIVE_FLOAT),
            col("traversal_time", NON_NEGATIVE),
            col("stair_count", ANY_INTEGER),
            col("max_slope", ANY_FLOAT),
            col("min_width", NON_NEGATIVE_FLOAT),
            col("signposted_as", ColumnType::Text),
            col("reversed_signposted_as", ColumnType::Text),
        ],
    },
    TableSchema {
        file_name: "levels.txt",
        requirement: FileRequirement::Optional,
        columns: &[
            id("level_id"),
            req("level_index", ANY_FLOAT),
            col("level_name", ColumnType::Text),
        ],
    },
    TableSchema {
        file_name: "feed_info.txt",
        requirement: FileRequirement::Optional,
        columns: &[
            ColumnSchema {
                column_type: ColumnType::Text,
                ..id("feed_publisher_name")
            },
            req("feed_publisher_url", ColumnType::Url),
            req("feed_lang", ColumnType::Language),
            col("default_lang", ColumnType::Language),
            col("feed_start_date", ColumnType::Date),
            col("feed_end_date", ColumnType::Date),
            col("feed_version", ColumnType::Text),
            col("feed_contact_email", ColumnType::Email),
            col("feed_contact_url", ColumnType::Url),
        ],
    },
    TableSchema {
        file_name: "attributions.txt",
        requirement: FileRequirement::Optional,
        columns: &[
            ColumnSchema {
                header_required: false,
                ..id("attribution_id")
            },
            col("agency_id", ColumnType::Id),
            col("route_id", ColumnType::Id),
            col("trip_id", ColumnType::Id),
            req("organization_name", ColumnType::Text),
            col("is_producer", ColumnType::Enum),
            col("is_operator", ColumnType::Enum),
            col("is_authority", ColumnType::Enum),
            col("attribution_url", ColumnType::Url),
            col("attribution_email", ColumnType::Email),
            col("attribution_phone", ColumnType::Text),
        ],
    },
    TableSchema {
        file_name: "translations.txt",
        requirement: FileRequirement::Optional,
        columns: &[
            ColumnSchema {
                column_type: ColumnType::Text,
                ..id("table_name")
            },
            req("field_name", ColumnType::Text),
            req("language", ColumnType::Language),
            req("translation", ColumnType::Text),
            col("record_id", ColumnType::Id),
            col("record_sub_id", ColumnType::Id),
            col("field_value", ColumnType::Text),
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_file_is_declared_once() {
        let mut names: Vec<_> = GTFS_SCHEMA.iter().map(|t| t.file_name).collect();
        assert_eq!(17, names.len());
        names.sort_unstable();
        names.dedup();
        assert_eq!(17, names.len());
    }

    #[test]
    fn required_headers_of_stop_times() {
        let schema = table_schema("stop_times.txt").unwrap();
        assert_eq!(
            vec!["trip_id", "stop_id", "stop_sequence"],
            schema.required_headers()
        );
        assert_eq!(Some("trip_id"), schema.id_column());
        assert!(schema.is_required());
    }

    #[test]
    fn unknown_file() {
        assert!(table_schema("readme.txt").is_none());
        assert!(!table_schema("calendar.txt").unwrap().is_required());
    }
}
