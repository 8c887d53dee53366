//! Construction of the domain objects from the typed rows.
//!
//! A builder either gives a complete object or every problem it found on the row, never a
//! partially filled object.
use crate::notice::{Notice, NoticeKind};
use crate::objects::*;
use crate::parser::ParsedEntity;
use chrono::NaiveDate;
use rgb::RGB8;
use std::convert::TryFrom;

/// A valid object, or the notices explaining why the row is not one. The list is never empty
pub type EntityBuildResult<T> = Result<T, Vec<Notice>>;

/// Objects that can be built from one row of their file
pub trait EntityBuilder: Sized {
    /// Builds the object, checking the fields and their combinations
    fn build(entity: &ParsedEntity) -> EntityBuildResult<Self>;
}

/// Tables that can be referenced by `translations.txt`
pub const TRANSLATABLE_TABLES: &[&str] = &[
    "agency",
    "stops",
    "routes",
    "trips",
    "stop_times",
    "pathways",
    "levels",
    "feed_info",
    "attributions",
];

/// Reads the fields of one row and collects what is wrong with them
struct FieldReader<'a> {
    entity: &'a ParsedEntity,
    notices: Vec<Notice>,
}

impl<'a> FieldReader<'a> {
    fn new(entity: &'a ParsedEntity) -> Self {
        FieldReader {
            entity,
            notices: vec![],
        }
    }

    fn notice(&mut self, kind: NoticeKind) {
        self.notices.push(
            Notice::new(kind)
                .in_file(self.entity.file_name)
                .for_entity(self.entity.entity_id.clone()),
        );
    }

    fn combination(&mut self, field_name: &'static str, conflicting_field_name: &'static str) {
        self.notice(NoticeKind::IllegalFieldValueCombination {
            field_name,
            conflicting_field_name,
        });
    }

    fn missing(&mut self, field_name: &'static str) {
        self.notice(NoticeKind::MissingRequiredValue { field_name });
    }

    fn text(&self, field: &str) -> Option<String> {
        self.entity.text(field).map(str::to_owned)
    }

    fn required_text(&mut self, field: &'static str) -> String {
        self.text(field).unwrap_or_else(|| {
            self.missing(field);
            String::new()
        })
    }

    fn integer(&self, field: &str) -> Option<i64> {
        self.entity.integer(field)
    }

    fn float(&self, field: &str) -> Option<f64> {
        self.entity.float(field)
    }

    fn required_float(&mut self, field: &'static str) -> f64 {
        self.float(field).unwrap_or_else(|| {
            self.missing(field);
            0.0
        })
    }

    fn date(&self, field: &str) -> Option<NaiveDate> {
        self.entity.date(field)
    }

    fn required_date(&mut self, field: &'static str) -> Option<NaiveDate> {
        let date = self.date(field);
        if date.is_none() {
            self.missing(field);
        }
        date
    }

    fn time(&self, field: &str) -> Option<u32> {
        self.entity.time(field)
    }

    fn required_time(&mut self, field: &'static str) -> u32 {
        self.time(field).unwrap_or_else(|| {
            self.missing(field);
            0
        })
    }

    fn color(&self, field: &str) -> Option<RGB8> {
        self.entity.color(field)
    }

    /// Non negative integer stored on 32 bits
    fn required_u32(&mut self, field_name: &'static str) -> u32 {
        match self.integer(field_name) {
            None => {
                self.missing(field_name);
                0
            }
            Some(i) => u32::try_from(i).unwrap_or_else(|_| {
                self.notice(NoticeKind::IntegerFieldValueOutOfRange {
                    field_name,
                    range_min: 0,
                    range_max: i64::from(u32::MAX),
                    actual_value: i,
                });
                0
            }),
        }
    }

    /// `0` or `1`, absent is `false`
    fn flag(&mut self, field_name: &'static str) -> bool {
        match self.integer(field_name) {
            None | Some(0) => false,
            Some(1) => true,
            Some(i) => {
                self.notice(NoticeKind::IntegerFieldValueOutOfRange {
                    field_name,
                    range_min: 0,
                    range_max: 1,
                    actual_value: i,
                });
                false
            }
        }
    }

    fn required_flag(&mut self, field_name: &'static str) -> bool {
        if self.integer(field_name).is_none() {
            self.missing(field_name);
        }
        self.flag(field_name)
    }

    fn optional_enum<E: TryFrom<i64, Error = i64>>(&mut self, field_name: &'static str) -> Option<E> {
        let value = self.integer(field_name)?;
        match E::try_from(value) {
            Ok(e) => Some(e),
            Err(i) => {
                self.notice(NoticeKind::UnexpectedEnumValue {
                    field_name,
                    enum_value: i.to_string(),
                });
                None
            }
        }
    }

    /// An absent value gives the default of the enumeration
    fn enumeration<E: TryFrom<i64, Error = i64> + Default>(&mut self, field_name: &'static str) -> E {
        self.optional_enum(field_name).unwrap_or_default()
    }

    fn required_enum<E: TryFrom<i64, Error = i64>>(&mut self, field_name: &'static str) -> Option<E> {
        if self.integer(field_name).is_none() {
            self.missing(field_name);
            return None;
        }
        self.optional_enum(field_name)
    }

    /// The object, if no notice was collected. `build` is only called in that case
    ///
    /// `build` gives `None` only for a value whose `required_*` read already added a notice
    fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> EntityBuildResult<T> {
        if self.notices.is_empty() {
            let built = build();
            debug_assert!(
                built.is_some(),
                "{} row {} dropped without a notice",
                self.entity.file_name,
                self.entity.entity_id
            );
            if let Some(t) = built {
                return Ok(t);
            }
        }
        Err(self.notices)
    }
}

impl EntityBuilder for Agency {
    fn build(entity: &ParsedEntity) -> EntityBuildResult<Self> {
        let mut r = FieldReader::new(entity);
        let agency = Agency {
            id: r.text("agency_id"),
            name: r.required_text("agency_name"),
            url: r.required_text("agency_url"),
            timezone: r.required_text("agency_timezone"),
            lang: r.text("agency_lang"),
            phone: r.text("agency_phone"),
            fare_url: r.text("agency_fare_url"),
            email: r.text("agency_email"),
        };
        r.finish(|| Some(agency))
    }
}

impl EntityBuilder for Stop {
    fn build(entity: &ParsedEntity) -> EntityBuildResult<Self> {
        let mut r = FieldReader::new(entity);
        let id = r.required_text("stop_id");
        let location_type: LocationType = r.enumeration("location_type");
        let wheelchair_boarding = r.enumeration("wheelchair_boarding");

        let (name, latitude, longitude) = match location_type {
            LocationType::StopPoint | LocationType::StopArea | LocationType::StationEntrance => (
                Some(r.required_text("stop_name")),
                Some(r.required_float("stop_lat")),
                Some(r.required_float("stop_lon")),
            ),
            LocationType::GenericNode | LocationType::BoardingArea => {
                (r.text("stop_name"), r.float("stop_lat"), r.float("stop_lon"))
            }
        };
        let parent_station = match location_type {
            LocationType::StationEntrance
            | LocationType::GenericNode
            | LocationType::BoardingArea => Some(r.required_text("parent_station")),
            LocationType::StopPoint | LocationType::StopArea => r.text("parent_station"),
        };

        let stop = Stop {
            id,
            code: r.text("stop_code"),
            name,
            description: r.text("stop_desc"),
            location_type,
            parent_station,
            zone_id: r.text("zone_id"),
            url: r.text("stop_url"),
            longitude,
            latitude,
            timezone: r.text("stop_timezone"),
            wheelchair_boarding,
            level_id: r.text("level_id"),
            platform_code: r.text("platform_code"),
        };
        r.finish(|| Some(stop))
    }
}

impl EntityBuilder for Route {
    fn build(entity: &ParsedEntity) -> EntityBuildResult<Self> {
        let mut r = FieldReader::new(entity);
        let id = r.required_text("route_id");
        let route_type = r.required_enum("route_type");
        let continuous_pickup = r.enumeration("continuous_pickup");
        let continuous_drop_off = r.enumeration("continuous_drop_off");
        let agency_id = r.text("agency_id");
        let short_name = r.text("route_short_name");
        let long_name = r.text("route_long_name");
        let desc = r.text("route_desc");
        let url = r.text("route_url");
        let order = r.integer("route_sort_order");
        let color = r.color("route_color");
        let text_color = r.color("route_text_color");
        r.finish(|| {
            Some(Route {
                id,
                short_name,
                long_name,
                desc,
                route_type: route_type?,
                url,
                agency_id,
                order,
                color,
                text_color,
                continuous_pickup,
                continuous_drop_off,
            })
        })
    }
}

impl EntityBuilder for Trip {
    fn build(entity: &ParsedEntity) -> EntityBuildResult<Self> {
        let mut r = FieldReader::new(entity);
        let trip = Trip {
            route_id: r.required_text("route_id"),
            service_id: r.required_text("service_id"),
            id: r.required_text("trip_id"),
            trip_headsign: r.text("trip_headsign"),
            trip_short_name: r.text("trip_short_name"),
            direction_id: r.optional_enum("direction_id"),
            block_id: r.text("block_id"),
            shape_id: r.text("shape_id"),
            wheelchair_accessible: r.enumeration("wheelchair_accessible"),
            bikes_allowed: r.enumeration("bikes_allowed"),
        };
        r.finish(|| Some(trip))
    }
}

impl EntityBuilder for StopTime {
    fn build(entity: &ParsedEntity) -> EntityBuildResult<Self> {
        let mut r = FieldReader::new(entity);
        let arrival_time = r.time("arrival_time");
        let departure_time = r.time("departure_time");
        if arrival_time.is_some() != departure_time.is_some() {
            r.combination("arrival_time", "departure_time");
        }
        let stop_time = StopTime {
            trip_id: r.required_text("trip_id"),
            arrival_time,
            departure_time,
            stop_id: r.required_text("stop_id"),
            stop_sequence: r.required_u32("stop_sequence"),
            stop_headsign: r.text("stop_headsign"),
            pickup_type: r.enumeration("pickup_type"),
            drop_off_type: r.enumeration("drop_off_type"),
            continuous_pickup: r.optional_enum("continuous_pickup"),
            continuous_drop_off: r.optional_enum("continuous_drop_off"),
            shape_dist_traveled: r.float("shape_dist_traveled"),
            timepoint: r.enumeration("timepoint"),
        };
        r.finish(|| Some(stop_time))
    }
}

impl EntityBuilder for Calendar {
    fn build(entity: &ParsedEntity) -> EntityBuildResult<Self> {
        let mut r = FieldReader::new(entity);
        let id = r.required_text("service_id");
        let monday = r.required_flag("monday");
        let tuesday = r.required_flag("tuesday");
        let wednesday = r.required_flag("wednesday");
        let thursday = r.required_flag("thursday");
        let friday = r.required_flag("friday");
        let saturday = r.required_flag("saturday");
        let sunday = r.required_flag("sunday");
        let start_date = r.required_date("start_date");
        let end_date = r.required_date("end_date");
        r.finish(|| {
            Some(Calendar {
                id,
                monday,
                tuesday,
                wednesday,
                thursday,
                friday,
                saturday,
                sunday,
                start_date: start_date?,
                end_date: end_date?,
            })
        })
    }
}

impl EntityBuilder for CalendarDate {
    fn build(entity: &ParsedEntity) -> EntityBuildResult<Self> {
        let mut r = FieldReader::new(entity);
        let service_id = r.required_text("service_id");
        let date = r.required_date("date");
        let exception_type = r.required_enum("exception_type");
        r.finish(|| {
            Some(CalendarDate {
                service_id,
                date: date?,
                exception_type: exception_type?,
            })
        })
    }
}

impl EntityBuilder for ShapePoint {
    fn build(entity: &ParsedEntity) -> EntityBuildResult<Self> {
        let mut r = FieldReader::new(entity);
        let point = ShapePoint {
            id: r.required_text("shape_id"),
            latitude: r.required_float("shape_pt_lat"),
            longitude: r.required_float("shape_pt_lon"),
            sequence: r.required_u32("shape_pt_sequence"),
            dist_traveled: r.float("shape_dist_traveled"),
        };
        r.finish(|| Some(point))
    }
}

impl EntityBuilder for Frequency {
    fn build(entity: &ParsedEntity) -> EntityBuildResult<Self> {
        let mut r = FieldReader::new(entity);
        let frequency = Frequency {
            trip_id: r.required_text("trip_id"),
            start_time: r.required_time("start_time"),
            end_time: r.required_time("end_time"),
            headway_secs: r.required_u32("headway_secs"),
            exact_times: r.optional_enum("exact_times"),
        };
        r.finish(|| Some(frequency))
    }
}

impl EntityBuilder for FareAttribute {
    fn build(entity: &ParsedEntity) -> EntityBuildResult<Self> {
        let mut r = FieldReader::new(entity);
        let id = r.required_text("fare_id");
        let price = r.required_float("price");
        let currency = r.required_text("currency_type");
        let payment_method = r.required_enum("payment_method");
        let transfers = r.enumeration("transfers");
        let agency_id = r.text("agency_id");
        let transfer_duration = r.integer("transfer_duration");
        r.finish(|| {
            Some(FareAttribute {
                id,
                price,
                currency,
                payment_method: payment_method?,
                transfers,
                agency_id,
                transfer_duration,
            })
        })
    }
}

impl EntityBuilder for FareRule {
    fn build(entity: &ParsedEntity) -> EntityBuildResult<Self> {
        let mut r = FieldReader::new(entity);
        let rule = FareRule {
            fare_id: r.required_text("fare_id"),
            route_id: r.text("route_id"),
            origin_id: r.text("origin_id"),
            destination_id: r.text("destination_id"),
            contains_id: r.text("contains_id"),
        };
        r.finish(|| Some(rule))
    }
}

impl EntityBuilder for Transfer {
    fn build(entity: &ParsedEntity) -> EntityBuildResult<Self> {
        let mut r = FieldReader::new(entity);
        let transfer = Transfer {
            from_stop_id: r.required_text("from_stop_id"),
            to_stop_id: r.required_text("to_stop_id"),
            transfer_type: r.enumeration("transfer_type"),
            min_transfer_time: r.integer("min_transfer_time"),
        };
        r.finish(|| Some(transfer))
    }
}

impl EntityBuilder for Pathway {
    fn build(entity: &ParsedEntity) -> EntityBuildResult<Self> {
        let mut r = FieldReader::new(entity);
        let id = r.required_text("pathway_id");
        let from_stop_id = r.required_text("from_stop_id");
        let to_stop_id = r.required_text("to_stop_id");
        let mode = r.required_enum("pathway_mode");
        let is_bidirectional = r.required_enum("is_bidirectional");
        let length = r.float("length");
        let traversal_time = r.integer("traversal_time");
        let stair_count = r.integer("stair_count");
        let max_slope = r.float("max_slope");
        let min_width = r.float("min_width");
        let signposted_as = r.text("signposted_as");
        let reversed_signposted_as = r.text("reversed_signposted_as");
        r.finish(|| {
            Some(Pathway {
                id,
                from_stop_id,
                to_stop_id,
                mode: mode?,
                is_bidirectional: is_bidirectional?,
                length,
                traversal_time,
                stair_count,
                max_slope,
                min_width,
                signposted_as,
                reversed_signposted_as,
            })
        })
    }
}

impl EntityBuilder for Level {
    fn build(entity: &ParsedEntity) -> EntityBuildResult<Self> {
        let mut r = FieldReader::new(entity);
        let level = Level {
            id: r.required_text("level_id"),
            index: r.required_float("level_index"),
            name: r.text("level_name"),
        };
        r.finish(|| Some(level))
    }
}

impl EntityBuilder for FeedInfo {
    fn build(entity: &ParsedEntity) -> EntityBuildResult<Self> {
        let mut r = FieldReader::new(entity);
        let start_date = r.date("feed_start_date");
        let end_date = r.date("feed_end_date");
        if start_date.is_some() != end_date.is_some() {
            r.combination("feed_start_date", "feed_end_date");
        }
        let feed_info = FeedInfo {
            name: r.required_text("feed_publisher_name"),
            url: r.required_text("feed_publisher_url"),
            lang: r.required_text("feed_lang"),
            default_lang: r.text("default_lang"),
            start_date,
            end_date,
            version: r.text("feed_version"),
            contact_email: r.text("feed_contact_email"),
            contact_url: r.text("feed_contact_url"),
        };
        r.finish(|| Some(feed_info))
    }
}

impl EntityBuilder for Attribution {
    fn build(entity: &ParsedEntity) -> EntityBuildResult<Self> {
        let mut r = FieldReader::new(entity);
        let attribution = Attribution {
            id: r.text("attribution_id"),
            agency_id: r.text("agency_id"),
            route_id: r.text("route_id"),
            trip_id: r.text("trip_id"),
            organization_name: r.required_text("organization_name"),
            is_producer: r.flag("is_producer"),
            is_operator: r.flag("is_operator"),
            is_authority: r.flag("is_authority"),
            url: r.text("attribution_url"),
            email: r.text("attribution_email"),
            phone: r.text("attribution_phone"),
        };
        if !(attribution.is_producer || attribution.is_operator || attribution.is_authority) {
            r.combination("is_producer", "is_operator; is_authority");
        }
        r.finish(|| Some(attribution))
    }
}

impl EntityBuilder for Translation {
    fn build(entity: &ParsedEntity) -> EntityBuildResult<Self> {
        let mut r = FieldReader::new(entity);
        let table_name = r.required_text("table_name");
        let translation = Translation {
            field_name: r.required_text("field_name"),
            language: r.required_text("language"),
            translation: r.required_text("translation"),
            record_id: r.text("record_id"),
            record_sub_id: r.text("record_sub_id"),
            field_value: r.text("field_value"),
            table_name,
        };
        let table_name = translation.table_name.as_str();
        if !table_name.is_empty() && !TRANSLATABLE_TABLES.contains(&table_name) {
            r.notice(NoticeKind::UnexpectedEnumValue {
                field_name: "table_name",
                enum_value: table_name.to_owned(),
            });
        }
        let record_id = translation.record_id.is_some();
        let record_sub_id = translation.record_sub_id.is_some();
        let field_value = translation.field_value.is_some();
        if table_name == "feed_info" {
            if record_id {
                r.combination("record_id", "table_name");
            }
            if record_sub_id {
                r.combination("record_sub_id", "table_name");
            }
            if field_value {
                r.combination("field_value", "table_name");
            }
        } else {
            if record_id == field_value {
                r.combination("record_id", "field_value");
            }
            if record_sub_id && field_value {
                r.combination("record_sub_id", "field_value");
            }
            if table_name == "stop_times" && record_id && !record_sub_id {
                r.combination("record_sub_id", "table_name");
            }
        }
        r.finish(|| Some(translation))
    }
}
