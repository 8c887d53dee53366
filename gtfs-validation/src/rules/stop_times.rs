use super::{RuleContext, ValidationRule};
use crate::geo::{distance_meters, polyline_length_km, ShapeIndex};
use crate::notice::NoticeKind;
use crate::objects::{LocationType, StopTime};
use crate::time::format_time;
use geo_types::Coord;
use std::collections::{HashMap, HashSet};

const STOP_TIMES: &str = "stop_times.txt";

/// About 150 km/h
const MAX_SPEED_METERS_PER_SECOND: f64 = 42.0;
const MAX_DISTANCE_TO_SHAPE_METERS: f64 = 100.0;

/// Trips and stops of the stop times exist, and no stop time is at a station
pub struct StopTimeReferences;

impl ValidationRule for StopTimeReferences {
    fn name(&self) -> &'static str {
        "E038 - Stop time references"
    }

    fn execute(&self, ctx: &RuleContext) {
        for (trip_id, stop_times) in ctx.dataset.stop_times_by_trip() {
            if ctx.dataset.trip_by_id(trip_id).is_none() {
                ctx.report(
                    STOP_TIMES,
                    trip_id,
                    NoticeKind::TripIdNotFound {
                        field_name: "trip_id",
                        unknown_trip_id: trip_id.to_owned(),
                    },
                );
            }
            for stop_time in stop_times {
                match ctx.dataset.stop_by_id(&stop_time.stop_id) {
                    None => ctx.report(
                        STOP_TIMES,
                        trip_id,
                        NoticeKind::StopIdNotFound {
                            field_name: "stop_id",
                            unknown_stop_id: stop_time.stop_id.clone(),
                        },
                    ),
                    Some(stop) if stop.location_type == LocationType::StopArea => ctx.report(
                        STOP_TIMES,
                        trip_id,
                        NoticeKind::IllegalFieldValueCombination {
                            field_name: "stop_id",
                            conflicting_field_name: "location_type",
                        },
                    ),
                    Some(_) => {}
                }
            }
        }
    }
}

/// `shape_dist_traveled` of the stop times needs a shape, and stays within its length
pub struct StopTimeShapeDistance;

impl ValidationRule for StopTimeShapeDistance {
    fn name(&self) -> &'static str {
        "E034 - Stop time shape distance"
    }

    fn execute(&self, ctx: &RuleContext) {
        for (trip_id, stop_times) in ctx.dataset.stop_times_by_trip() {
            if stop_times.iter().all(|st| st.shape_dist_traveled.is_none()) {
                continue;
            }
            let trip = match ctx.dataset.trip_by_id(trip_id) {
                Some(trip) => trip,
                None => continue,
            };
            let shape_id = match &trip.shape_id {
                Some(shape_id) => shape_id,
                None => {
                    ctx.report(
                        "trips.txt",
                        trip_id,
                        NoticeKind::MissingRequiredValue {
                            field_name: "shape_id",
                        },
                    );
                    continue;
                }
            };
            let points: Vec<Coord> = ctx
                .dataset
                .shape_by_id(shape_id)
                .iter()
                .map(|p| p.coord())
                .collect();
            if points.is_empty() {
                ctx.report(
                    STOP_TIMES,
                    trip_id,
                    NoticeKind::ShapeIdNotFound {
                        field_name: "shape_id",
                        unknown_shape_id: shape_id.clone(),
                    },
                );
                continue;
            }

            let shape_length = polyline_length_km(&points);
            for stop_time in stop_times {
                match stop_time.shape_dist_traveled {
                    Some(distance) if distance > shape_length => ctx.report(
                        STOP_TIMES,
                        trip_id,
                        NoticeKind::FloatFieldValueOutOfRange {
                            field_name: "shape_dist_traveled",
                            range_min: 0.0,
                            range_max: shape_length,
                            actual_value: distance,
                            context: vec![
                                ("trip_id", trip_id.to_owned()),
                                ("stop_sequence", stop_time.stop_sequence.to_string()),
                            ],
                        },
                    ),
                    _ => {}
                }
            }
        }
    }
}

/// A vehicle does not leave a stop before reaching it
pub struct ArrivalBeforeDeparture;

impl ValidationRule for ArrivalBeforeDeparture {
    fn name(&self) -> &'static str {
        "E045 - Arrival time after departure time"
    }

    fn execute(&self, ctx: &RuleContext) {
        for (trip_id, stop_times) in ctx.dataset.stop_times_by_trip() {
            for stop_time in stop_times {
                if let (Some(arrival), Some(departure)) =
                    (stop_time.arrival_time, stop_time.departure_time)
                {
                    if departure < arrival {
                        ctx.report(
                            STOP_TIMES,
                            trip_id,
                            NoticeKind::StopTimeArrivalTimeAfterDepartureTime {
                                stop_sequence: stop_time.stop_sequence,
                                arrival_time: format_time(arrival),
                                departure_time: format_time(departure),
                            },
                        );
                    }
                }
            }
        }
    }
}

/// The first and last stop times of a trip are timed
pub struct TripEdgeTimes;

impl TripEdgeTimes {
    fn check_edge(ctx: &RuleContext, trip_id: &str, stop_time: &StopTime) {
        let fields = [
            ("arrival_time", stop_time.arrival_time),
            ("departure_time", stop_time.departure_time),
        ];
        for (field_name, time) in fields {
            if time.is_some() {
                continue;
            }
            ctx.report(
                STOP_TIMES,
                trip_id,
                NoticeKind::MissingTripEdgeStopTime {
                    field_name,
                    stop_sequence: stop_time.stop_sequence,
                },
            );
        }
    }
}

impl ValidationRule for TripEdgeTimes {
    fn name(&self) -> &'static str {
        "E044 - Missing trip edge arrival_time and departure_time"
    }

    fn execute(&self, ctx: &RuleContext) {
        for (trip_id, stop_times) in ctx.dataset.stop_times_by_trip() {
            if let Some(first) = stop_times.first() {
                Self::check_edge(ctx, trip_id, first);
            }
            if stop_times.len() > 1 {
                if let Some(last) = stop_times.last() {
                    Self::check_edge(ctx, trip_id, last);
                }
            }
        }
    }
}

/// Arrival at a stop is not before the departure from the previous timed stop
pub struct BackwardsTimeTravel;

impl ValidationRule for BackwardsTimeTravel {
    fn name(&self) -> &'static str {
        "E048 - Backwards time travel between stops"
    }

    fn execute(&self, ctx: &RuleContext) {
        for (trip_id, stop_times) in ctx.dataset.stop_times_by_trip() {
            let mut previous: Option<(u32, u32)> = None;
            for stop_time in stop_times {
                if let (Some(arrival), Some((previous_sequence, previous_departure))) =
                    (stop_time.arrival_time, previous)
                {
                    if arrival < previous_departure {
                        ctx.report(
                            STOP_TIMES,
                            trip_id,
                            NoticeKind::BackwardsTimeTravelInStop {
                                stop_sequence: stop_time.stop_sequence,
                                arrival_time: format_time(arrival),
                                previous_stop_sequence: previous_sequence,
                                previous_departure_time: format_time(previous_departure),
                            },
                        );
                    }
                }
                if let Some(departure) = stop_time.departure_time {
                    previous = Some((stop_time.stop_sequence, departure));
                }
            }
        }
    }
}

/// Vehicles do not run faster than 150 km/h between stops
///
/// Stops served at the same instant (departure from one equals arrival at the next) are merged
/// with the following hop, and the speed is computed over the whole run
pub struct TravelSpeed;

impl ValidationRule for TravelSpeed {
    fn name(&self) -> &'static str {
        "E047 - Fast travel between stops"
    }

    fn execute(&self, ctx: &RuleContext) {
        for (trip_id, stop_times) in ctx.dataset.stop_times_by_trip() {
            let mut previous: Option<(Coord, Option<u32>)> = None;
            let mut accumulated_meters = 0.0;
            let mut sequences: Vec<u32> = vec![];

            for stop_time in stop_times {
                let coord = match ctx
                    .dataset
                    .stop_by_id(&stop_time.stop_id)
                    .and_then(|s| s.coord())
                {
                    Some(coord) => coord,
                    None => {
                        previous = None;
                        accumulated_meters = 0.0;
                        sequences.clear();
                        continue;
                    }
                };

                let mut same_instant = false;
                if let Some((previous_coord, Some(previous_departure))) = previous {
                    let hop_meters = distance_meters(previous_coord, coord);
                    match stop_time.arrival_time {
                        Some(arrival) if arrival == previous_departure => {
                            same_instant = true;
                            accumulated_meters += hop_meters;
                        }
                        Some(arrival) if arrival > previous_departure => {
                            let speed = (hop_meters + accumulated_meters)
                                / f64::from(arrival - previous_departure);
                            if speed > MAX_SPEED_METERS_PER_SECOND {
                                let mut stop_sequences = sequences.clone();
                                stop_sequences.push(stop_time.stop_sequence);
                                ctx.report(
                                    STOP_TIMES,
                                    trip_id,
                                    NoticeKind::FastTravelBetweenStops {
                                        speed_kmh: speed * 3.6,
                                        stop_sequences,
                                    },
                                );
                            }
                        }
                        _ => {}
                    }
                }

                if !same_instant {
                    accumulated_meters = 0.0;
                    sequences.clear();
                }
                sequences.push(stop_time.stop_sequence);
                previous = Some((coord, stop_time.departure_time));
            }
        }
    }
}

/// Stops of a trip lie within 100 metres of the trip shape
pub struct StopTooFarFromShape;

impl ValidationRule for StopTooFarFromShape {
    fn name(&self) -> &'static str {
        "E052 - Stop too far from trip shape"
    }

    fn execute(&self, ctx: &RuleContext) {
        let mut indexes: HashMap<&str, Option<ShapeIndex>> = HashMap::new();
        let mut reported: HashSet<(&str, &str)> = HashSet::new();

        for trip in ctx.dataset.trip_all() {
            let shape_id = match &trip.shape_id {
                Some(shape_id) => shape_id.as_str(),
                None => continue,
            };
            let index = indexes.entry(shape_id).or_insert_with(|| {
                let points: Vec<Coord> = ctx
                    .dataset
                    .shape_by_id(shape_id)
                    .iter()
                    .map(|p| p.coord())
                    .collect();
                ShapeIndex::new(&points)
            });
            let index = match index {
                Some(index) => index,
                None => continue,
            };

            for stop_time in ctx.dataset.stop_times_by_trip_id(&trip.id) {
                let stop = match ctx.dataset.stop_by_id(&stop_time.stop_id) {
                    Some(stop) => stop,
                    None => continue,
                };
                let coord = match stop.coord() {
                    Some(coord) => coord,
                    None => continue,
                };
                if reported.contains(&(stop.id.as_str(), shape_id)) {
                    continue;
                }
                let distance = index.distance_to_shape_meters(coord);
                if distance > MAX_DISTANCE_TO_SHAPE_METERS {
                    reported.insert((stop.id.as_str(), shape_id));
                    ctx.report(
                        STOP_TIMES,
                        trip.id.as_str(),
                        NoticeKind::StopTooFarFromTripShape {
                            stop_id: stop.id.clone(),
                            stop_sequence: stop_time.stop_sequence,
                            shape_id: shape_id.to_owned(),
                            distance_meters: distance,
                        },
                    );
                }
            }
        }
    }
}

/// `shape_dist_traveled` never decreases along a trip
pub struct DecreasingStopTimeDistance;

impl ValidationRule for DecreasingStopTimeDistance {
    fn name(&self) -> &'static str {
        "E042 - Decreasing stop time distance"
    }

    fn execute(&self, ctx: &RuleContext) {
        for (trip_id, stop_times) in ctx.dataset.stop_times_by_trip() {
            let mut previous: Option<(u32, f64)> = None;
            for stop_time in stop_times {
                let distance = match stop_time.shape_dist_traveled {
                    Some(distance) => distance,
                    None => continue,
                };
                if let Some((previous_sequence, previous_distance)) = previous {
                    if distance < previous_distance {
                        ctx.report(
                            STOP_TIMES,
                            trip_id,
                            NoticeKind::DecreasingStopTimeDistance {
                                stop_sequence: stop_time.stop_sequence,
                                shape_dist_traveled: distance,
                                previous_stop_sequence: previous_sequence,
                                previous_shape_dist_traveled: previous_distance,
                            },
                        );
                    }
                }
                previous = Some((stop_time.stop_sequence, distance));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{ShapePoint, Stop, Trip};
    use crate::repository::DatasetRepository;
    use crate::rules::run_rule;
    use crate::Notice;

    fn stop(id: &str, latitude: f64, longitude: f64) -> Stop {
        Stop {
            id: id.to_owned(),
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..Default::default()
        }
    }

    fn stop_time(trip_id: &str, stop_id: &str, sequence: u32, times: Option<(u32, u32)>) -> StopTime {
        StopTime {
            trip_id: trip_id.to_owned(),
            stop_id: stop_id.to_owned(),
            stop_sequence: sequence,
            arrival_time: times.map(|t| t.0),
            departure_time: times.map(|t| t.1),
            ..Default::default()
        }
    }

    fn trip(id: &str, shape_id: Option<&str>) -> Trip {
        Trip {
            id: id.to_owned(),
            route_id: "r".to_owned(),
            service_id: "s".to_owned(),
            shape_id: shape_id.map(str::to_owned),
            ..Default::default()
        }
    }

    fn add_shape(dataset: &mut DatasetRepository, id: &str, points: &[(f64, f64)]) {
        for (i, (latitude, longitude)) in points.iter().enumerate() {
            dataset.add_shape_point(ShapePoint {
                id: id.to_owned(),
                latitude: *latitude,
                longitude: *longitude,
                sequence: i as u32 + 1,
                dist_traveled: None,
            });
        }
    }

    fn codes(notices: &[Notice]) -> Vec<&str> {
        notices.iter().map(|n| n.code()).collect()
    }

    #[test]
    fn unknown_trips_and_stops() {
        let mut dataset = DatasetRepository::new();
        dataset.add_stop(stop("s1", 45.5, -73.6));
        dataset.add_stop(Stop {
            location_type: LocationType::StopArea,
            ..stop("station", 45.5, -73.6)
        });
        dataset.add_trip(trip("t1", None));
        dataset.add_stop_time(stop_time("t1", "s1", 1, None));
        dataset.add_stop_time(stop_time("t1", "station", 2, None));
        dataset.add_stop_time(stop_time("t1", "nowhere", 3, None));
        dataset.add_stop_time(stop_time("ghost", "s1", 1, None));
        dataset.add_stop_time(stop_time("ghost", "s1", 2, None));

        let notices = run_rule(&StopTimeReferences, &dataset);
        assert_eq!(vec!["E038", "E024", "E039"], codes(&notices));
        assert_eq!("ghost", notices[0].entity_id);
        assert_eq!(
            NoticeKind::StopIdNotFound {
                field_name: "stop_id",
                unknown_stop_id: "nowhere".to_owned()
            },
            notices[2].kind
        );
    }

    #[test]
    fn shape_distance_needs_a_shape() {
        let mut dataset = DatasetRepository::new();
        // about 1.11 km
        add_shape(&mut dataset, "shape", &[(45.0, -73.0), (45.01, -73.0)]);
        dataset.add_trip(trip("no_shape", None));
        dataset.add_trip(trip("missing_shape", Some("ghost")));
        dataset.add_trip(trip("too_far", Some("shape")));
        for trip_id in ["no_shape", "missing_shape", "too_far"] {
            dataset.add_stop_time(StopTime {
                shape_dist_traveled: Some(0.5),
                ..stop_time(trip_id, "s1", 1, None)
            });
        }
        dataset.add_stop_time(StopTime {
            shape_dist_traveled: Some(3.0),
            ..stop_time("too_far", "s2", 2, None)
        });

        let notices = run_rule(&StopTimeShapeDistance, &dataset);
        assert_eq!(vec!["E034", "E002", "E006"], codes(&notices));
        assert_eq!(Some("trips.txt".to_owned()), notices[1].filename);
        match &notices[2].kind {
            NoticeKind::FloatFieldValueOutOfRange {
                range_max,
                actual_value,
                context,
                ..
            } => {
                assert!((range_max - 1.11).abs() < 0.01);
                assert_eq!(3.0, *actual_value);
                assert_eq!(("stop_sequence", "2".to_owned()), context[1]);
            }
            kind => panic!("unexpected notice {:?}", kind),
        }
    }

    #[test]
    fn arrival_after_departure() {
        let mut dataset = DatasetRepository::new();
        dataset.add_stop_time(stop_time("t", "s1", 1, Some((100, 100))));
        dataset.add_stop_time(stop_time("t", "s2", 2, Some((300, 200))));
        let notices = run_rule(&ArrivalBeforeDeparture, &dataset);
        assert_eq!(
            vec![NoticeKind::StopTimeArrivalTimeAfterDepartureTime {
                stop_sequence: 2,
                arrival_time: "00:05:00".to_owned(),
                departure_time: "00:03:20".to_owned(),
            }],
            notices.into_iter().map(|n| n.kind).collect::<Vec<_>>()
        );
    }

    #[test]
    fn edge_times() {
        let mut dataset = DatasetRepository::new();
        dataset.add_stop_time(stop_time("t", "s1", 1, None));
        dataset.add_stop_time(stop_time("t", "s2", 2, None));
        dataset.add_stop_time(StopTime {
            arrival_time: Some(300),
            ..stop_time("t", "s3", 3, None)
        });
        dataset.add_stop_time(stop_time("single", "s1", 1, None));

        let notices = run_rule(&TripEdgeTimes, &dataset);
        let found: Vec<(&str, u32)> = notices
            .iter()
            .filter(|n| n.entity_id == "t")
            .map(|n| match &n.kind {
                NoticeKind::MissingTripEdgeStopTime {
                    field_name,
                    stop_sequence,
                } => (*field_name, *stop_sequence),
                kind => panic!("unexpected notice {:?}", kind),
            })
            .collect();
        assert_eq!(
            vec![("arrival_time", 1), ("departure_time", 1), ("departure_time", 3)],
            found
        );
        assert_eq!(2, notices.iter().filter(|n| n.entity_id == "single").count());
    }

    #[test]
    fn backwards_time_travel() {
        let mut dataset = DatasetRepository::new();
        dataset.add_stop_time(stop_time("t", "s1", 1, Some((100, 200))));
        dataset.add_stop_time(stop_time("t", "s2", 2, None));
        dataset.add_stop_time(stop_time("t", "s3", 3, Some((150, 250))));
        dataset.add_stop_time(stop_time("t", "s4", 4, Some((250, 260))));
        let notices = run_rule(&BackwardsTimeTravel, &dataset);
        assert_eq!(1, notices.len());
        assert_eq!(
            NoticeKind::BackwardsTimeTravelInStop {
                stop_sequence: 3,
                arrival_time: "00:02:30".to_owned(),
                previous_stop_sequence: 1,
                previous_departure_time: "00:03:20".to_owned(),
            },
            notices[0].kind
        );
    }

    #[test]
    fn travel_speed() {
        let mut dataset = DatasetRepository::new();
        // 0.01 degree of latitude is about 1112 m
        dataset.add_stop(stop("a", 45.0, -73.0));
        dataset.add_stop(stop("b", 45.01, -73.0));
        dataset.add_stop(stop("c", 45.02, -73.0));
        dataset.add_trip(trip("slow", None));
        dataset.add_stop_time(stop_time("slow", "a", 1, Some((0, 0))));
        dataset.add_stop_time(stop_time("slow", "b", 2, Some((120, 120))));
        // 1112 m in 20 s
        dataset.add_stop_time(stop_time("fast", "a", 1, Some((0, 0))));
        dataset.add_stop_time(stop_time("fast", "b", 2, Some((20, 20))));
        // 2224 m in 40 s, the first hop takes no time
        dataset.add_stop_time(stop_time("merged", "a", 1, Some((0, 0))));
        dataset.add_stop_time(stop_time("merged", "b", 2, Some((0, 0))));
        dataset.add_stop_time(stop_time("merged", "c", 3, Some((40, 40))));

        let notices = run_rule(&TravelSpeed, &dataset);
        assert_eq!(2, notices.len());
        let by_trip: HashMap<&str, &NoticeKind> = notices
            .iter()
            .map(|n| (n.entity_id.as_str(), &n.kind))
            .collect();
        match by_trip["fast"] {
            NoticeKind::FastTravelBetweenStops {
                speed_kmh,
                stop_sequences,
            } => {
                assert!((speed_kmh - 200.0).abs() < 1.0);
                assert_eq!(&vec![1, 2], stop_sequences);
            }
            kind => panic!("unexpected notice {:?}", kind),
        }
        match by_trip["merged"] {
            NoticeKind::FastTravelBetweenStops { stop_sequences, .. } => {
                assert_eq!(&vec![1, 2, 3], stop_sequences)
            }
            kind => panic!("unexpected notice {:?}", kind),
        }
    }

    #[test]
    fn stop_too_far_from_shape() {
        let mut dataset = DatasetRepository::new();
        add_shape(&mut dataset, "shape", &[(45.0, -73.0), (45.01, -73.0)]);
        dataset.add_stop(stop("near", 45.005, -73.0001));
        // about 790 m east of the shape
        dataset.add_stop(stop("far", 45.005, -72.99));
        for trip_id in ["t1", "t2"] {
            dataset.add_trip(trip(trip_id, Some("shape")));
            dataset.add_stop_time(stop_time(trip_id, "near", 1, None));
            dataset.add_stop_time(stop_time(trip_id, "far", 2, None));
        }

        let notices = run_rule(&StopTooFarFromShape, &dataset);
        assert_eq!(1, notices.len());
        match &notices[0].kind {
            NoticeKind::StopTooFarFromTripShape {
                stop_id,
                stop_sequence,
                shape_id,
                distance_meters,
            } => {
                assert_eq!("far", stop_id);
                assert_eq!(2, *stop_sequence);
                assert_eq!("shape", shape_id);
                assert!((distance_meters - 786.0).abs() < 10.0);
            }
            kind => panic!("unexpected notice {:?}", kind),
        }
    }

    #[test]
    fn decreasing_distance() {
        let mut dataset = DatasetRepository::new();
        for (sequence, distance) in [(1, Some(0.0)), (2, Some(1.5)), (3, None), (4, Some(1.0))] {
            dataset.add_stop_time(StopTime {
                shape_dist_traveled: distance,
                ..stop_time("t", "s", sequence, None)
            });
        }
        let notices = run_rule(&DecreasingStopTimeDistance, &dataset);
        assert_eq!(
            vec![NoticeKind::DecreasingStopTimeDistance {
                stop_sequence: 4,
                shape_dist_traveled: 1.0,
                previous_stop_sequence: 2,
                previous_shape_dist_traveled: 1.5,
            }],
            notices.into_iter().map(|n| n.kind).collect::<Vec<_>>()
        );
    }
}
