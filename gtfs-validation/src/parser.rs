//! Conversion of the raw string cells into typed values, following the [crate::schema].
//!
//! The parser knows nothing about what the rows mean: it only converts, and reports the cells
//! it cannot convert or that break the declared constraints of their column.
use crate::notice::{Notice, NoticeKind, NO_ID};
use crate::raw_gtfs::RawEntity;
use crate::schema::{ColumnSchema, ColumnType, TableSchema};
use crate::time::parse_time;
use crate::value_helpers::*;
use chrono::NaiveDate;
use rgb::RGB8;
use rustc_hash::FxHashMap;

/// A typed cell
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Text, kept as in the file
    Text(String),
    /// Integer, also used for the enumerations
    Integer(i64),
    /// Decimal number
    Float(f64),
    /// Calendar day
    Date(NaiveDate),
    /// Seconds since midnight, may be more than 24 hours
    Time(u32),
    /// Color
    Color(RGB8),
}

/// A row whose cells were converted to their declared type
///
/// Cells that were empty or that could not be converted are absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntity {
    /// Value of the identifying column of the file, [NO_ID] when there is none
    pub entity_id: String,
    /// File the row comes from
    pub file_name: &'static str,
    /// Line of the row in its file
    pub index: u64,
    values: FxHashMap<&'static str, FieldValue>,
}

impl ParsedEntity {
    /// Builds a row from already typed values
    pub fn new(
        file_name: &'static str,
        index: u64,
        entity_id: impl Into<String>,
        values: impl IntoIterator<Item = (&'static str, FieldValue)>,
    ) -> Self {
        ParsedEntity {
            entity_id: entity_id.into(),
            file_name,
            index,
            values: values.into_iter().collect(),
        }
    }

    /// The typed value of a column
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.values.get(column)
    }

    /// The value of a text column
    pub fn text(&self, column: &str) -> Option<&str> {
        match self.get(column) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// The value of an integer or enumeration column
    pub fn integer(&self, column: &str) -> Option<i64> {
        match self.get(column) {
            Some(FieldValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// The value of a decimal column
    pub fn float(&self, column: &str) -> Option<f64> {
        match self.get(column) {
            Some(FieldValue::Float(f)) => Some(*f),
            _ => None,
        }
    }

    /// The value of a date column
    pub fn date(&self, column: &str) -> Option<NaiveDate> {
        match self.get(column) {
            Some(FieldValue::Date(d)) => Some(*d),
            _ => None,
        }
    }

    /// The value of a time column
    pub fn time(&self, column: &str) -> Option<u32> {
        match self.get(column) {
            Some(FieldValue::Time(t)) => Some(*t),
            _ => None,
        }
    }

    /// The value of a color column
    pub fn color(&self, column: &str) -> Option<RGB8> {
        match self.get(column) {
            Some(FieldValue::Color(c)) => Some(*c),
            _ => None,
        }
    }
}

/// Parses the rows of one file
#[derive(Debug, Clone, Copy)]
pub struct RowParser {
    schema: &'static TableSchema,
}

fn parse_integer(s: &str) -> Option<i64> {
    s.parse().ok()
}

fn parse_float(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

impl RowParser {
    /// Parser for the rows of the file described by the schema
    pub fn new(schema: &'static TableSchema) -> Self {
        RowParser { schema }
    }

    /// The identifier of the row, as used in the notices
    pub fn entity_id(&self, raw: &RawEntity) -> String {
        self.schema
            .id_column()
            .and_then(|c| raw.get(c))
            .unwrap_or(NO_ID)
            .to_owned()
    }

    fn notice(&self, raw_id: &str, kind: NoticeKind) -> Notice {
        Notice::new(kind)
            .in_file(self.schema.file_name)
            .for_entity(raw_id)
    }

    /// Reports every non empty cell that cannot be converted to the type of its column
    pub fn validate_non_string_types(&self, raw: &RawEntity) -> Vec<Notice> {
        let entity_id = self.entity_id(raw);
        let mut notices = vec![];
        for column in self.schema.columns {
            let value = match raw.get(column.name) {
                Some(v) => v,
                None => continue,
            };
            let field_name = column.name;
            let line_number = raw.index;
            let kind = match column.column_type {
                ColumnType::Integer { .. } | ColumnType::Enum if parse_integer(value).is_none() => {
                    NoticeKind::CannotParseInteger {
                        field_name,
                        line_number,
                        raw_value: value.to_owned(),
                    }
                }
                ColumnType::Float { .. } if parse_float(value).is_none() => {
                    NoticeKind::CannotParseFloat {
                        field_name,
                        line_number,
                        raw_value: value.to_owned(),
                    }
                }
                ColumnType::Date if parse_date(value).is_none() => NoticeKind::CannotParseDate {
                    field_name,
                    line_number,
                    raw_value: value.to_owned(),
                },
                ColumnType::Time if parse_time(value).is_err() => NoticeKind::InvalidTime {
                    field_name,
                    line_number,
                    time_value: value.to_owned(),
                },
                ColumnType::Color if parse_color(value).is_err() => NoticeKind::InvalidColor {
                    field_name,
                    line_number,
                    color_value: value.to_owned(),
                },
                _ => continue,
            };
            notices.push(self.notice(&entity_id, kind));
        }
        notices
    }

    fn parse_value(column: &ColumnSchema, value: &str) -> Option<FieldValue> {
        match column.column_type {
            ColumnType::Integer { .. } | ColumnType::Enum => {
                parse_integer(value).map(FieldValue::Integer)
            }
            ColumnType::Float { .. } => parse_float(value).map(FieldValue::Float),
            ColumnType::Date => parse_date(value).map(FieldValue::Date),
            ColumnType::Time => parse_time(value).ok().map(FieldValue::Time),
            ColumnType::Color => parse_color(value).ok().map(FieldValue::Color),
            ColumnType::Text
            | ColumnType::Id
            | ColumnType::Url
            | ColumnType::Email
            | ColumnType::Timezone
            | ColumnType::Language
            | ColumnType::CurrencyCode => Some(FieldValue::Text(value.to_owned())),
        }
    }

    /// Converts the row. A cell that cannot be converted is left absent, it never aborts the row
    pub fn parse(&self, raw: &RawEntity) -> ParsedEntity {
        let values = self
            .schema
            .columns
            .iter()
            .filter_map(|c| {
                raw.get(c.name)
                    .and_then(|v| Self::parse_value(c, v))
                    .map(|v| (c.name, v))
            })
            .collect();
        ParsedEntity {
            entity_id: self.entity_id(raw),
            file_name: self.schema.file_name,
            index: raw.index,
            values,
        }
    }

    /// Applies the per column constraints of the schema to an already converted row
    pub fn validate_types(&self, parsed: &ParsedEntity) -> Vec<Notice> {
        let mut notices = vec![];
        for column in self.schema.columns {
            let field_name = column.name;
            let kind = match (column.column_type, parsed.get(column.name)) {
                (ColumnType::Integer { min, max }, Some(FieldValue::Integer(i)))
                    if is_out_of_range(Some(*i), min, max) =>
                {
                    NoticeKind::IntegerFieldValueOutOfRange {
                        field_name,
                        range_min: min,
                        range_max: max,
                        actual_value: *i,
                    }
                }
                (ColumnType::Float { min, max }, Some(FieldValue::Float(f)))
                    if is_out_of_range(Some(*f), min, max) =>
                {
                    NoticeKind::FloatFieldValueOutOfRange {
                        field_name,
                        range_min: min,
                        range_max: max,
                        actual_value: *f,
                        context: vec![],
                    }
                }
                (ColumnType::Url, Some(FieldValue::Text(s))) if !is_valid_url(s) => {
                    NoticeKind::InvalidUrl {
                        field_name,
                        url_value: s.clone(),
                    }
                }
                (ColumnType::Email, Some(FieldValue::Text(s))) if !is_valid_email(s) => {
                    NoticeKind::InvalidEmail {
                        field_name,
                        email_value: s.clone(),
                    }
                }
                (ColumnType::Timezone, Some(FieldValue::Text(s))) if !is_valid_timezone(s) => {
                    NoticeKind::InvalidTimezone {
                        field_name,
                        timezone_value: s.clone(),
                    }
                }
                (ColumnType::Language, Some(FieldValue::Text(s))) if !is_valid_lang(s) => {
                    NoticeKind::InvalidLang {
                        field_name,
                        lang_value: s.clone(),
                    }
                }
                (ColumnType::CurrencyCode, Some(FieldValue::Text(s)))
                    if !is_valid_currency_code(s) =>
                {
                    NoticeKind::InvalidCurrencyCode {
                        field_name,
                        currency_code: s.clone(),
                    }
                }
                (ColumnType::Id, Some(FieldValue::Text(s))) if !is_printable_ascii(s) => {
                    NoticeKind::NonAsciiOrNonPrintableChar {
                        field_name,
                        raw_value: s.clone(),
                    }
                }
                _ => continue,
            };
            notices.push(
                Notice::new(kind)
                    .in_file(parsed.file_name)
                    .for_entity(parsed.entity_id.clone()),
            );
        }
        notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::Severity;
    use crate::schema::table_schema;

    fn parser(file_name: &str) -> RowParser {
        RowParser::new(table_schema(file_name).unwrap())
    }

    #[test]
    fn unparsable_cells_are_reported_and_left_absent() {
        let raw = RawEntity::new(
            4,
            vec![
                ("trip_id", "t1"),
                ("arrival_time", "25:61:00"),
                ("departure_time", "08:00:00"),
                ("stop_id", "s1"),
                ("stop_sequence", "first"),
                ("shape_dist_traveled", "NaN"),
            ],
        );
        let p = parser("stop_times.txt");
        let notices = p.validate_non_string_types(&raw);
        let codes: Vec<&str> = notices.iter().map(|n| n.code()).collect();
        assert_eq!(vec!["E009", "E003", "E005"], codes);
        assert!(notices.iter().all(|n| n.entity_id == "t1"));
        assert_eq!(
            NoticeKind::CannotParseInteger {
                field_name: "stop_sequence",
                line_number: 4,
                raw_value: "first".to_owned(),
            },
            notices[1].kind
        );

        let parsed = p.parse(&raw);
        assert_eq!(None, parsed.time("arrival_time"));
        assert_eq!(Some(8 * 3600), parsed.time("departure_time"));
        assert_eq!(None, parsed.integer("stop_sequence"));
        assert_eq!(None, parsed.float("shape_dist_traveled"));
        assert_eq!(Some("s1"), parsed.text("stop_id"));
    }

    #[test]
    fn empty_cells_are_absent_values() {
        let raw = RawEntity::new(2, vec![("route_id", "r1"), ("route_type", ""), ("route_color", "")]);
        let p = parser("routes.txt");
        assert!(p.validate_non_string_types(&raw).is_empty());
        let parsed = p.parse(&raw);
        assert_eq!(None, parsed.get("route_type"));
        assert_eq!(None, parsed.get("route_color"));
    }

    #[test]
    fn range_bounds_are_in_range() {
        let p = parser("stops.txt");
        let at_bounds = p.parse(&RawEntity::new(
            2,
            vec![("stop_id", "s"), ("stop_lat", "90"), ("stop_lon", "-180")],
        ));
        assert!(p.validate_types(&at_bounds).is_empty());

        let outside = p.parse(&RawEntity::new(
            3,
            vec![("stop_id", "s"), ("stop_lat", "90.5"), ("stop_lon", "-180")],
        ));
        let notices = p.validate_types(&outside);
        assert_eq!(1, notices.len());
        assert_eq!("E006", notices[0].code());
        assert_eq!(Some("stops.txt".to_owned()), notices[0].filename);
    }

    #[test]
    fn constraints_of_text_columns() {
        let p = parser("agency.txt");
        let parsed = p.parse(&RawEntity::new(
            2,
            vec![
                ("agency_id", "STM\u{e9}"),
                ("agency_name", "STM"),
                ("agency_url", "www.stm.info"),
                ("agency_timezone", "America/Montreal"),
                ("agency_lang", "fr"),
                ("agency_email", "not an email"),
            ],
        ));
        let notices = p.validate_types(&parsed);
        let codes: Vec<&str> = notices.iter().map(|n| n.code()).collect();
        assert_eq!(vec!["W002", "E010", "E014"], codes);
        assert_eq!(Severity::Warning, notices[0].severity());
    }

    #[test]
    fn enumerations_are_integers() {
        let p = parser("stops.txt");
        let parsed = p.parse(&RawEntity::new(2, vec![("stop_id", "s"), ("location_type", "7")]));
        assert_eq!(Some(7), parsed.integer("location_type"));
        assert!(p.validate_types(&parsed).is_empty());
    }
}
