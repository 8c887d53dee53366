//! Turns the raw tables of a feed into a [DatasetRepository].
//!
//! The files are checked (presence, header, row length), every row is parsed and type checked,
//! then built into its domain object and stored. Everything found on the way is added to the
//! [NoticeRepository]; a row with an error never reaches the dataset.
use crate::builders::EntityBuilder;
use crate::notice::{Notice, NoticeKind, Severity};
use crate::objects::*;
use crate::parser::{ParsedEntity, RowParser};
use crate::raw_gtfs::RowProvider;
use crate::repository::DatasetRepository;
use crate::schema::{table_schema, FileRequirement, TableSchema, GTFS_SCHEMA};
use crate::{NoticeRepository, RawGtfs};
use log::{debug, info};
use std::collections::{BTreeMap, HashSet};

/// What the ingestion produced
#[derive(Debug, Default)]
pub struct IngestedFeed {
    /// Every valid object of the feed
    pub dataset: DatasetRepository,
    /// Files that were read, in the order of the ingestion
    pub processed_files: Vec<String>,
}

/// Reads every known file of the feed, except the excluded ones
pub fn ingest(raw: &RawGtfs, exclude: &[String], notices: &NoticeRepository) -> IngestedFeed {
    check_files(raw, notices);

    let mut feed = IngestedFeed::default();
    for schema in GTFS_SCHEMA {
        if exclude.iter().any(|e| e == schema.file_name) {
            info!("Skipping excluded file {}", schema.file_name);
            continue;
        }
        let provider = match raw.provider_for_file(schema.file_name) {
            Some(p) => p,
            None => continue,
        };
        info!(
            "Validate CSV structure and field types for file: {}",
            schema.file_name
        );
        let rows = read_rows(schema, provider, notices);
        store_rows(schema.file_name, &rows, &mut feed.dataset, notices);
        feed.processed_files.push(schema.file_name.to_owned());
    }
    feed
}

/// Folders, unknown files, unreadable files and missing files of the archive
fn check_files(raw: &RawGtfs, notices: &NoticeRepository) {
    for folder in &raw.folders {
        notices.add_notice(Notice::new(NoticeKind::InputZipContainsFolder {
            folder_name: folder.clone(),
        }));
    }

    let filenames = raw.filenames();
    for name in &filenames {
        if table_schema(name).is_none() {
            notices.add_notice(Notice::new(NoticeKind::ExtraFileFound).in_file(name));
        }
    }
    for (name, e) in &raw.unreadable {
        notices.add_notice(
            Notice::new(NoticeKind::CannotConstructDataProvider {
                reason: e.to_string(),
            })
            .in_file(name),
        );
    }

    let present = |name: &str| filenames.iter().any(|f| f == name);
    for schema in GTFS_SCHEMA {
        if schema.requirement == FileRequirement::Required && !present(schema.file_name) {
            notices.add_notice(Notice::new(NoticeKind::MissingRequiredFile).in_file(schema.file_name));
        }
    }
    let calendar_group: Vec<&str> = GTFS_SCHEMA
        .iter()
        .filter(|s| s.requirement == FileRequirement::CalendarGroup)
        .map(|s| s.file_name)
        .collect();
    if !calendar_group.iter().any(|name| present(name)) {
        notices.add_notice(Notice::new(NoticeKind::MissingCalendarAndCalendarDateFiles));
    }
}

/// Reports the problems of the header line. `false` when the rows cannot be read
fn check_headers(schema: &TableSchema, headers: &[String], notices: &NoticeRepository) -> bool {
    let file_name = schema.file_name;
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for header in headers {
        if !seen.insert(header.as_str()) && reported.insert(header.as_str()) {
            notices.add_notice(
                Notice::new(NoticeKind::DuplicatedHeader {
                    duplicated_header_name: header.clone(),
                })
                .in_file(file_name),
            );
        }
    }

    let required = schema.required_headers();
    let has_all_required = required.iter().all(|r| seen.contains(r));
    if !has_all_required {
        notices.add_notice(
            Notice::new(NoticeKind::MissingHeaders {
                expected_headers: required.iter().map(|r| r.to_string()).collect(),
                actual_headers: headers.to_vec(),
            })
            .in_file(file_name),
        );
    }

    let mut extra_headers: Vec<String> = vec![];
    for header in headers {
        if schema.column(header).is_none() && !extra_headers.contains(header) {
            extra_headers.push(header.clone());
        }
    }
    if !extra_headers.is_empty() {
        notices.add_notice(
            Notice::new(NoticeKind::NonStandardHeaders { extra_headers }).in_file(file_name),
        );
    }
    has_all_required && reported.is_empty()
}

/// The rows of the file that passed the structure and type checks
fn read_rows(
    schema: &'static TableSchema,
    provider: RowProvider<'_>,
    notices: &NoticeRepository,
) -> Vec<ParsedEntity> {
    let header_count = provider.header_count();
    if !check_headers(schema, provider.headers(), notices) {
        debug!("Rows of {} are not read, its header is invalid", schema.file_name);
        return vec![];
    }

    let mut rows = provider.peekable();
    if rows.peek().is_none() {
        notices.add_notice(
            Notice::new(NoticeKind::EmptyFile {
                required: schema.is_required(),
            })
            .in_file(schema.file_name),
        );
        return vec![];
    }

    let parser = RowParser::new(schema);
    let mut valid = vec![];
    for raw in rows {
        if raw.cell_count != header_count {
            notices.add_notice(
                Notice::new(NoticeKind::InvalidRowLength {
                    row_index: raw.index,
                    expected_length: header_count,
                    actual_length: raw.cell_count,
                })
                .in_file(schema.file_name)
                .for_entity(parser.entity_id(&raw)),
            );
            continue;
        }
        let mut row_notices = parser.validate_non_string_types(&raw);
        let parsed = parser.parse(&raw);
        row_notices.extend(parser.validate_types(&parsed));
        let has_error = row_notices.iter().any(|n| n.severity() == Severity::Error);
        notices.add_all(row_notices);
        if !has_error {
            valid.push(parsed);
        }
    }
    valid
}

fn duplicated_entity<T: CompositeKey>(entity: &T, row: &ParsedEntity) -> Notice {
    let key = entity.key_fields().into_iter().take(5).collect();
    Notice::new(NoticeKind::DuplicatedEntity { key })
        .in_file(row.file_name)
        .for_entity(row.entity_id.clone())
}

/// Builds every row and stores the valid objects. `add` gives `true` when the key was taken
fn build_all<T, F>(rows: &[ParsedEntity], notices: &NoticeRepository, mut add: F)
where
    T: EntityBuilder + CompositeKey,
    F: FnMut(T) -> bool,
{
    for row in rows {
        match T::build(row) {
            Ok(entity) => {
                let duplicate = duplicated_entity(&entity, row);
                if add(entity) {
                    notices.add_notice(duplicate);
                }
            }
            Err(errors) => notices.add_all(errors),
        }
    }
}

fn store_rows(
    file_name: &str,
    rows: &[ParsedEntity],
    dataset: &mut DatasetRepository,
    notices: &NoticeRepository,
) {
    let n = notices;
    match file_name {
        "agency.txt" => build_all(rows, n, |e: Agency| dataset.add_agency(e).is_some()),
        "stops.txt" => store_stops(rows, dataset, notices),
        "routes.txt" => build_all(rows, n, |e: Route| dataset.add_route(e).is_some()),
        "trips.txt" => build_all(rows, n, |e: Trip| dataset.add_trip(e).is_some()),
        "stop_times.txt" => build_all(rows, n, |e: StopTime| dataset.add_stop_time(e).is_some()),
        "calendar.txt" => build_all(rows, n, |e: Calendar| dataset.add_calendar(e).is_some()),
        "calendar_dates.txt" => build_all(rows, n, |e: CalendarDate| {
            dataset.add_calendar_date(e).is_some()
        }),
        "shapes.txt" => build_all(rows, n, |e: ShapePoint| dataset.add_shape_point(e).is_some()),
        "frequencies.txt" => build_all(rows, n, |e: Frequency| dataset.add_frequency(e).is_some()),
        "fare_attributes.txt" => build_all(rows, n, |e: FareAttribute| {
            dataset.add_fare_attribute(e).is_some()
        }),
        "fare_rules.txt" => build_all(rows, n, |e: FareRule| dataset.add_fare_rule(e).is_some()),
        "transfers.txt" => build_all(rows, n, |e: Transfer| dataset.add_transfer(e).is_some()),
        "pathways.txt" => build_all(rows, n, |e: Pathway| dataset.add_pathway(e).is_some()),
        "levels.txt" => build_all(rows, n, |e: Level| dataset.add_level(e).is_some()),
        "feed_info.txt" => build_all(rows, n, |e: FeedInfo| dataset.add_feed_info(e).is_some()),
        "attributions.txt" => build_all(rows, n, |e: Attribution| {
            dataset.add_attribution(e).is_some()
        }),
        "translations.txt" => build_all(rows, n, |e: Translation| {
            dataset.add_translation(e).is_some()
        }),
        _ => debug!("No object is built from {}", file_name),
    }
}

/// The location type the parent station of a location must have
fn expected_parent_type(location_type: LocationType) -> Option<LocationType> {
    match location_type {
        LocationType::StopPoint | LocationType::StationEntrance | LocationType::GenericNode => {
            Some(LocationType::StopArea)
        }
        LocationType::BoardingArea => Some(LocationType::StopPoint),
        LocationType::StopArea => None,
    }
}

/// Stops reference each other, so they are all built before the parents are checked
fn store_stops(rows: &[ParsedEntity], dataset: &mut DatasetRepository, notices: &NoticeRepository) {
    let mut stops: BTreeMap<String, (Stop, &ParsedEntity)> = BTreeMap::new();
    let mut order = vec![];
    for row in rows {
        match Stop::build(row) {
            Ok(stop) => {
                if stops.contains_key(&stop.id) {
                    notices.add_notice(duplicated_entity(&stop, row));
                } else {
                    order.push(stop.id.clone());
                    stops.insert(stop.id.clone(), (stop, row));
                }
            }
            Err(errors) => notices.add_all(errors),
        }
    }

    for id in order {
        let (stop, row) = match stops.get(&id) {
            Some(s) => s,
            None => continue,
        };
        let parent = stop.parent_station.as_deref();
        let mut valid = true;
        match (stop.location_type, parent) {
            (LocationType::StopArea, Some(parent_id)) => {
                notices.add_notice(
                    Notice::new(NoticeKind::StationWithParentStation {
                        parent_id: parent_id.to_owned(),
                    })
                    .in_file(row.file_name)
                    .for_entity(stop.id.clone()),
                );
                valid = false;
            }
            (child_type, Some(parent_id)) => {
                let expected = expected_parent_type(child_type);
                let actual = stops.get(parent_id).map(|(p, _)| p.location_type);
                if let (Some(expected), Some(actual)) = (expected, actual) {
                    if expected != actual {
                        notices.add_notice(
                            Notice::new(NoticeKind::ParentStationInvalidLocationType {
                                child_location_type: child_type.code(),
                                parent_id: parent_id.to_owned(),
                                expected_parent_location_type: expected.code(),
                                actual_parent_location_type: actual.code(),
                            })
                            .in_file(row.file_name)
                            .for_entity(stop.id.clone()),
                        );
                        valid = false;
                    }
                }
            }
            (_, None) => {}
        }
        if valid {
            dataset.add_stop(stop.clone());
        }
    }
}
