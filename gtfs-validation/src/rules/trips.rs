use super::{RuleContext, ValidationRule};
use crate::notice::NoticeKind;
use crate::objects::Trip;
use crate::time::{are_periods_overlapping, format_time};
use crate::value_helpers::format_date;
use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use std::collections::{BTreeSet, HashSet};

const TRIPS: &str = "trips.txt";

/// `route_id` of a trip names a route
pub struct TripRoute;

impl ValidationRule for TripRoute {
    fn name(&self) -> &'static str {
        "E033 - Trip route not found"
    }

    fn execute(&self, ctx: &RuleContext) {
        for trip in ctx.dataset.trip_all() {
            if ctx.dataset.route_by_id(&trip.route_id).is_none() {
                ctx.report(
                    TRIPS,
                    trip.id.as_str(),
                    NoticeKind::RouteIdNotFound {
                        field_name: "route_id",
                        unknown_route_id: trip.route_id.clone(),
                    },
                );
            }
        }
    }
}

/// `service_id` of a trip appears in `calendar.txt` or `calendar_dates.txt`
pub struct TripService;

impl ValidationRule for TripService {
    fn name(&self) -> &'static str {
        "E036 - Trip service not found"
    }

    fn execute(&self, ctx: &RuleContext) {
        for trip in ctx.dataset.trip_all() {
            if !ctx.dataset.has_service(&trip.service_id) {
                ctx.report(
                    TRIPS,
                    trip.id.as_str(),
                    NoticeKind::ServiceIdNotFound {
                        field_name: "service_id",
                        unknown_service_id: trip.service_id.clone(),
                    },
                );
            }
        }
    }
}

/// `shape_id` of a trip names a shape, and every shape is used by a trip
pub struct TripShape;

impl ValidationRule for TripShape {
    fn name(&self) -> &'static str {
        "E034 - Trip shape not found"
    }

    fn execute(&self, ctx: &RuleContext) {
        let mut used_shapes = HashSet::new();
        for trip in ctx.dataset.trip_all() {
            if let Some(shape_id) = &trip.shape_id {
                used_shapes.insert(shape_id.as_str());
                if ctx.dataset.shape_by_id(shape_id).is_empty() {
                    ctx.report(
                        TRIPS,
                        trip.id.as_str(),
                        NoticeKind::ShapeIdNotFound {
                            field_name: "shape_id",
                            unknown_shape_id: shape_id.clone(),
                        },
                    );
                }
            }
        }

        for (shape_id, _) in ctx.dataset.shapes() {
            if !used_shapes.contains(shape_id) {
                ctx.report("shapes.txt", shape_id, NoticeKind::ShapeNotUsed);
            }
        }
    }
}

/// A trip is used by at least one stop time
pub struct TripUsage;

impl ValidationRule for TripUsage {
    fn name(&self) -> &'static str {
        "W017 - Trip not used"
    }

    fn execute(&self, ctx: &RuleContext) {
        for trip in ctx.dataset.trip_all() {
            if ctx.dataset.stop_times_by_trip_id(&trip.id).is_empty() {
                ctx.report(TRIPS, trip.id.as_str(), NoticeKind::TripNotUsed);
            }
        }
    }
}

/// A trip serves at least two stops
pub struct TripNumberOfStops;

impl ValidationRule for TripNumberOfStops {
    fn name(&self) -> &'static str {
        "E051 - Unusable trip"
    }

    fn execute(&self, ctx: &RuleContext) {
        for trip in ctx.dataset.trip_all() {
            if ctx.dataset.stop_times_by_trip_id(&trip.id).len() < 2 {
                ctx.report(TRIPS, trip.id.as_str(), NoticeKind::UnusableTrip);
            }
        }
    }
}

/// Trips of a block running on the same day do not overlap in time
pub struct BlockOverlap;

struct BlockTrip<'a> {
    trip: &'a Trip,
    first_time: u32,
    last_time: u32,
}

impl ValidationRule for BlockOverlap {
    fn name(&self) -> &'static str {
        "E054 - Block trips with overlapping stop times"
    }

    fn execute(&self, ctx: &RuleContext) {
        // service days, computed once per service
        let mut dates_by_service: FxHashMap<&str, BTreeSet<NaiveDate>> = FxHashMap::default();
        for block_id in ctx.dataset.block_ids() {
            let trips: Vec<BlockTrip> = ctx
                .dataset
                .trips_by_block_id(block_id)
                .into_iter()
                .filter_map(|trip| {
                    let stop_times = ctx.dataset.stop_times_by_trip_id(&trip.id);
                    let first = stop_times.first()?;
                    let last = stop_times.last()?;
                    Some(BlockTrip {
                        trip,
                        first_time: first.departure_time.or(first.arrival_time)?,
                        last_time: last.arrival_time.or(last.departure_time)?,
                    })
                })
                .collect();
            for t in &trips {
                let service_id = t.trip.service_id.as_str();
                dates_by_service
                    .entry(service_id)
                    .or_insert_with(|| ctx.dataset.service_dates(service_id));
            }

            for (i, previous) in trips.iter().enumerate() {
                for current in &trips[i + 1..] {
                    if !are_periods_overlapping(
                        previous.first_time,
                        previous.last_time,
                        current.first_time,
                        current.last_time,
                    ) {
                        continue;
                    }
                    let (Some(previous_dates), Some(current_dates)) = (
                        dates_by_service.get(previous.trip.service_id.as_str()),
                        dates_by_service.get(current.trip.service_id.as_str()),
                    ) else {
                        continue;
                    };
                    let conflicting_dates: Vec<String> = current_dates
                        .intersection(previous_dates)
                        .map(format_date)
                        .collect();
                    if conflicting_dates.is_empty() {
                        continue;
                    }
                    ctx.report(
                        TRIPS,
                        current.trip.id.as_str(),
                        NoticeKind::BlockTripsWithOverlappingStopTimes {
                            previous_trip_id: previous.trip.id.clone(),
                            block_id: block_id.to_owned(),
                            trip_first_time: format_time(current.first_time),
                            trip_last_time: format_time(current.last_time),
                            previous_trip_first_time: format_time(previous.first_time),
                            previous_trip_last_time: format_time(previous.last_time),
                            conflicting_dates,
                        },
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Calendar, CalendarDate, Route, ShapePoint, StopTime};
    use crate::repository::DatasetRepository;
    use crate::rules::run_rule;
    use crate::Exception;
    use chrono::NaiveDate;

    fn trip(id: &str, route_id: &str, service_id: &str) -> Trip {
        Trip {
            id: id.to_owned(),
            route_id: route_id.to_owned(),
            service_id: service_id.to_owned(),
            ..Default::default()
        }
    }

    fn stop_time(trip_id: &str, sequence: u32, time: u32) -> StopTime {
        StopTime {
            trip_id: trip_id.to_owned(),
            stop_id: format!("stop{}", sequence),
            stop_sequence: sequence,
            arrival_time: Some(time),
            departure_time: Some(time),
            ..Default::default()
        }
    }

    fn weekdays(id: &str) -> Calendar {
        Calendar {
            id: id.to_owned(),
            monday: true,
            tuesday: true,
            wednesday: true,
            thursday: true,
            friday: true,
            saturday: false,
            sunday: false,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        }
    }

    fn codes(notices: &[crate::Notice]) -> Vec<&str> {
        notices.iter().map(|n| n.code()).collect()
    }

    #[test]
    fn route_and_service_references() {
        let mut dataset = DatasetRepository::new();
        dataset.add_route(Route {
            id: "r1".to_owned(),
            short_name: Some("1".to_owned()),
            ..Default::default()
        });
        dataset.add_calendar(weekdays("weekdays"));
        dataset.add_calendar_date(CalendarDate {
            service_id: "holiday".to_owned(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            exception_type: Exception::Added,
        });
        dataset.add_trip(trip("t1", "r1", "weekdays"));
        dataset.add_trip(trip("t2", "r1", "holiday"));
        dataset.add_trip(trip("t3", "r2", "sunday"));

        let notices = run_rule(&TripRoute, &dataset);
        assert_eq!(vec!["E033"], codes(&notices));
        assert_eq!("t3", notices[0].entity_id);

        let notices = run_rule(&TripService, &dataset);
        assert_eq!(vec!["E036"], codes(&notices));
        assert_eq!(
            NoticeKind::ServiceIdNotFound {
                field_name: "service_id",
                unknown_service_id: "sunday".to_owned()
            },
            notices[0].kind
        );
    }

    #[test]
    fn shape_references() {
        let mut dataset = DatasetRepository::new();
        for (id, sequence) in [("used", 1), ("used", 2), ("unused", 1)] {
            dataset.add_shape_point(ShapePoint {
                id: id.to_owned(),
                latitude: 45.5,
                longitude: -73.6,
                sequence,
                dist_traveled: None,
            });
        }
        dataset.add_trip(Trip {
            shape_id: Some("used".to_owned()),
            ..trip("t1", "r1", "s")
        });
        dataset.add_trip(Trip {
            shape_id: Some("ghost".to_owned()),
            ..trip("t2", "r1", "s")
        });

        let notices = run_rule(&TripShape, &dataset);
        assert_eq!(vec!["E034", "W013"], codes(&notices));
        assert_eq!("t2", notices[0].entity_id);
        assert_eq!(Some("shapes.txt".to_owned()), notices[1].filename);
        assert_eq!("unused", notices[1].entity_id);
    }

    #[test]
    fn trip_usage_and_number_of_stops() {
        let mut dataset = DatasetRepository::new();
        dataset.add_trip(trip("empty", "r", "s"));
        dataset.add_trip(trip("single", "r", "s"));
        dataset.add_trip(trip("ok", "r", "s"));
        dataset.add_stop_time(stop_time("single", 1, 100));
        dataset.add_stop_time(stop_time("ok", 1, 100));
        dataset.add_stop_time(stop_time("ok", 2, 200));

        let notices = run_rule(&TripUsage, &dataset);
        assert_eq!(vec!["W017"], codes(&notices));
        assert_eq!("empty", notices[0].entity_id);

        let mut unusable: Vec<String> = run_rule(&TripNumberOfStops, &dataset)
            .into_iter()
            .map(|n| n.entity_id)
            .collect();
        unusable.sort();
        assert_eq!(vec!["empty", "single"], unusable);
    }

    #[test]
    fn block_trips_overlapping_on_same_day() {
        let mut dataset = DatasetRepository::new();
        dataset.add_calendar(weekdays("weekdays"));
        dataset.add_calendar_date(CalendarDate {
            service_id: "saturday".to_owned(),
            date: NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
            exception_type: Exception::Added,
        });
        for (id, service) in [("a", "weekdays"), ("b", "weekdays"), ("c", "saturday")] {
            dataset.add_trip(Trip {
                block_id: Some("block".to_owned()),
                ..trip(id, "r", service)
            });
        }
        // a: 08:00-09:00, b: 08:30-09:30, c: 08:00-09:00 on another day
        dataset.add_stop_time(stop_time("a", 1, 8 * 3600));
        dataset.add_stop_time(stop_time("a", 2, 9 * 3600));
        dataset.add_stop_time(stop_time("b", 1, 8 * 3600 + 1800));
        dataset.add_stop_time(stop_time("b", 2, 9 * 3600 + 1800));
        dataset.add_stop_time(stop_time("c", 1, 8 * 3600));
        dataset.add_stop_time(stop_time("c", 2, 9 * 3600));

        let notices = run_rule(&BlockOverlap, &dataset);
        assert_eq!(1, notices.len());
        assert_eq!("b", notices[0].entity_id);
        match &notices[0].kind {
            NoticeKind::BlockTripsWithOverlappingStopTimes {
                previous_trip_id,
                block_id,
                trip_first_time,
                previous_trip_last_time,
                conflicting_dates,
                ..
            } => {
                assert_eq!("a", previous_trip_id);
                assert_eq!("block", block_id);
                assert_eq!("08:30:00", trip_first_time);
                assert_eq!("09:00:00", previous_trip_last_time);
                assert_eq!(23, conflicting_dates.len());
                assert_eq!("20240101", conflicting_dates[0]);
            }
            kind => panic!("unexpected notice {:?}", kind),
        }
    }

    #[test]
    fn consecutive_block_trips_do_not_overlap() {
        let mut dataset = DatasetRepository::new();
        dataset.add_calendar(weekdays("weekdays"));
        for id in ["a", "b"] {
            dataset.add_trip(Trip {
                block_id: Some("block".to_owned()),
                ..trip(id, "r", "weekdays")
            });
        }
        dataset.add_stop_time(stop_time("a", 1, 8 * 3600));
        dataset.add_stop_time(stop_time("a", 2, 9 * 3600));
        dataset.add_stop_time(stop_time("b", 1, 9 * 3600));
        dataset.add_stop_time(stop_time("b", 2, 10 * 3600));
        assert!(run_rule(&BlockOverlap, &dataset).is_empty());
    }

    #[test]
    fn services_shared_between_blocks() {
        let mut dataset = DatasetRepository::new();
        dataset.add_calendar(weekdays("weekdays"));
        dataset.add_calendar_date(CalendarDate {
            service_id: "special".to_owned(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            exception_type: Exception::Added,
        });
        for (id, service, block) in [
            ("a", "weekdays", "morning"),
            ("b", "special", "morning"),
            ("c", "special", "evening"),
            ("d", "weekdays", "evening"),
        ] {
            dataset.add_trip(Trip {
                block_id: Some(block.to_owned()),
                ..trip(id, "r", service)
            });
            dataset.add_stop_time(stop_time(id, 1, 8 * 3600));
            dataset.add_stop_time(stop_time(id, 2, 9 * 3600));
        }

        let found: Vec<(String, Vec<String>)> = run_rule(&BlockOverlap, &dataset)
            .into_iter()
            .map(|n| match n.kind {
                NoticeKind::BlockTripsWithOverlappingStopTimes {
                    conflicting_dates,
                    ..
                } => (n.entity_id, conflicting_dates),
                kind => panic!("unexpected notice {:?}", kind),
            })
            .collect();
        assert_eq!(
            vec![
                ("d".to_owned(), vec!["20240102".to_owned()]),
                ("b".to_owned(), vec!["20240102".to_owned()]),
            ],
            found
        );
    }
}
