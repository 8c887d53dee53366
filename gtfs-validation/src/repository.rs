//! In-memory storage of the valid objects of a feed, and the indices the rules query.
//!
//! Inserting needs `&mut`, so only the ingestion writes. The rules only ever get a
//! `&DatasetRepository`.
use crate::objects::*;
use chrono::NaiveDate;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::mem::size_of;

/// Stores `value` under `key` unless the key is already taken, in which case the stored value is
/// given back and `value` is dropped
fn insert_new<K: Ord, V>(map: &mut BTreeMap<K, V>, key: K, value: V) -> Option<&V> {
    match map.entry(key) {
        Entry::Occupied(e) => Some(e.into_mut()),
        Entry::Vacant(e) => {
            e.insert(value);
            None
        }
    }
}

fn key_values<T: CompositeKey>(entity: &T) -> Vec<String> {
    entity.key_fields().into_iter().map(|(_, v)| v).collect()
}

/// Every valid object of the feed
#[derive(Debug, Default)]
pub struct DatasetRepository {
    agencies: Vec<Agency>,
    stops: BTreeMap<String, Stop>,
    routes: BTreeMap<String, Route>,
    trips: BTreeMap<String, Trip>,
    trips_by_block: BTreeMap<String, Vec<String>>,
    calendars: BTreeMap<String, Calendar>,
    calendar_dates: BTreeMap<String, BTreeMap<NaiveDate, CalendarDate>>,
    stop_times: BTreeMap<String, BTreeMap<u32, StopTime>>,
    shapes: BTreeMap<String, BTreeMap<u32, ShapePoint>>,
    frequencies: BTreeMap<String, BTreeMap<u32, Frequency>>,
    fare_attributes: BTreeMap<String, FareAttribute>,
    fare_rules: BTreeMap<Vec<String>, FareRule>,
    transfers: BTreeMap<(String, String), Transfer>,
    pathways: BTreeMap<String, Pathway>,
    levels: BTreeMap<String, Level>,
    feed_info: BTreeMap<String, FeedInfo>,
    attributions: BTreeMap<Vec<String>, Attribution>,
    translations: BTreeMap<Vec<String>, Translation>,
}

impl DatasetRepository {
    /// Empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an agency, or gives back the agency already stored with the same key
    pub fn add_agency(&mut self, agency: Agency) -> Option<&Agency> {
        let key = agency.key_fields();
        match self.agencies.iter().position(|a| a.key_fields() == key) {
            Some(i) => Some(&self.agencies[i]),
            None => {
                self.agencies.push(agency);
                None
            }
        }
    }

    /// Adds a stop, or gives back the stop already stored with the same id
    pub fn add_stop(&mut self, stop: Stop) -> Option<&Stop> {
        insert_new(&mut self.stops, stop.id.clone(), stop)
    }

    /// Adds a route, or gives back the route already stored with the same id
    pub fn add_route(&mut self, route: Route) -> Option<&Route> {
        insert_new(&mut self.routes, route.id.clone(), route)
    }

    /// Adds a trip, or gives back the trip already stored with the same id
    pub fn add_trip(&mut self, trip: Trip) -> Option<&Trip> {
        if self.trips.contains_key(&trip.id) {
            return self.trips.get(&trip.id);
        }
        if let Some(block_id) = &trip.block_id {
            self.trips_by_block
                .entry(block_id.clone())
                .or_default()
                .push(trip.id.clone());
        }
        insert_new(&mut self.trips, trip.id.clone(), trip)
    }

    /// Adds a calendar, or gives back the calendar already stored with the same service id
    pub fn add_calendar(&mut self, calendar: Calendar) -> Option<&Calendar> {
        insert_new(&mut self.calendars, calendar.id.clone(), calendar)
    }

    /// Adds a calendar date, unless the service already has an exception at that date
    pub fn add_calendar_date(&mut self, calendar_date: CalendarDate) -> Option<&CalendarDate> {
        let dates = self
            .calendar_dates
            .entry(calendar_date.service_id.clone())
            .or_default();
        insert_new(dates, calendar_date.date, calendar_date)
    }

    /// Adds a stop time, unless the trip already has one with the same sequence
    pub fn add_stop_time(&mut self, stop_time: StopTime) -> Option<&StopTime> {
        let trip = self.stop_times.entry(stop_time.trip_id.clone()).or_default();
        insert_new(trip, stop_time.stop_sequence, stop_time)
    }

    /// Adds a shape point, unless the shape already has one with the same sequence
    pub fn add_shape_point(&mut self, point: ShapePoint) -> Option<&ShapePoint> {
        let shape = self.shapes.entry(point.id.clone()).or_default();
        insert_new(shape, point.sequence, point)
    }

    /// Adds a frequency, unless the trip already has one starting at the same time
    pub fn add_frequency(&mut self, frequency: Frequency) -> Option<&Frequency> {
        let trip = self.frequencies.entry(frequency.trip_id.clone()).or_default();
        insert_new(trip, frequency.start_time, frequency)
    }

    /// Adds a fare attribute, or gives back the one already stored with the same id
    pub fn add_fare_attribute(&mut self, fare: FareAttribute) -> Option<&FareAttribute> {
        insert_new(&mut self.fare_attributes, fare.id.clone(), fare)
    }

    /// Adds a fare rule, or gives back the one already stored with the same key
    pub fn add_fare_rule(&mut self, rule: FareRule) -> Option<&FareRule> {
        insert_new(&mut self.fare_rules, key_values(&rule), rule)
    }

    /// Adds a transfer, or gives back the one already stored between the same stops
    pub fn add_transfer(&mut self, transfer: Transfer) -> Option<&Transfer> {
        let key = (transfer.from_stop_id.clone(), transfer.to_stop_id.clone());
        insert_new(&mut self.transfers, key, transfer)
    }

    /// Adds a pathway, or gives back the one already stored with the same id
    pub fn add_pathway(&mut self, pathway: Pathway) -> Option<&Pathway> {
        insert_new(&mut self.pathways, pathway.id.clone(), pathway)
    }

    /// Adds a level, or gives back the one already stored with the same id
    pub fn add_level(&mut self, level: Level) -> Option<&Level> {
        insert_new(&mut self.levels, level.id.clone(), level)
    }

    /// Adds a feed info, or gives back the one already stored for the same publisher
    pub fn add_feed_info(&mut self, feed_info: FeedInfo) -> Option<&FeedInfo> {
        insert_new(&mut self.feed_info, feed_info.name.clone(), feed_info)
    }

    /// Adds an attribution, or gives back the one already stored with the same key
    pub fn add_attribution(&mut self, attribution: Attribution) -> Option<&Attribution> {
        insert_new(&mut self.attributions, key_values(&attribution), attribution)
    }

    /// Adds a translation, or gives back the one already stored with the same key
    pub fn add_translation(&mut self, translation: Translation) -> Option<&Translation> {
        insert_new(&mut self.translations, key_values(&translation), translation)
    }

    /// Agencies, in the order of the file
    pub fn agency_all(&self) -> &[Agency] {
        &self.agencies
    }

    /// The agency with this `agency_id`
    pub fn agency_by_id(&self, id: &str) -> Option<&Agency> {
        self.agencies.iter().find(|a| a.id.as_deref() == Some(id))
    }

    /// Number of agencies
    pub fn agency_count(&self) -> usize {
        self.agencies.len()
    }

    /// Every stop, station, entrance, node and boarding area
    pub fn stop_all(&self) -> impl Iterator<Item = &Stop> {
        self.stops.values()
    }

    /// The location with this `stop_id`
    pub fn stop_by_id(&self, id: &str) -> Option<&Stop> {
        self.stops.get(id)
    }

    /// Every route
    pub fn route_all(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    /// The route with this `route_id`
    pub fn route_by_id(&self, id: &str) -> Option<&Route> {
        self.routes.get(id)
    }

    /// Every trip
    pub fn trip_all(&self) -> impl Iterator<Item = &Trip> {
        self.trips.values()
    }

    /// The trip with this `trip_id`
    pub fn trip_by_id(&self, id: &str) -> Option<&Trip> {
        self.trips.get(id)
    }

    /// Trips of a block, in the order they were added
    pub fn trips_by_block_id(&self, block_id: &str) -> Vec<&Trip> {
        self.trips_by_block
            .get(block_id)
            .map(|ids| ids.iter().filter_map(|id| self.trips.get(id)).collect())
            .unwrap_or_default()
    }

    /// Ids of every block
    pub fn block_ids(&self) -> impl Iterator<Item = &str> {
        self.trips_by_block.keys().map(String::as_str)
    }

    /// Every calendar
    pub fn calendar_all(&self) -> impl Iterator<Item = &Calendar> {
        self.calendars.values()
    }

    /// The calendar of a service
    pub fn calendar_by_service_id(&self, service_id: &str) -> Option<&Calendar> {
        self.calendars.get(service_id)
    }

    /// Exceptions of a service, ordered by date
    pub fn calendar_dates_by_service_id(&self, service_id: &str) -> Vec<&CalendarDate> {
        self.calendar_dates
            .get(service_id)
            .map(|dates| dates.values().collect())
            .unwrap_or_default()
    }

    /// The service appears in `calendar.txt` or in `calendar_dates.txt`
    pub fn has_service(&self, service_id: &str) -> bool {
        self.calendars.contains_key(service_id) || self.calendar_dates.contains_key(service_id)
    }

    /// Every day the service runs
    ///
    /// Uses both the [Calendar] weekdays and the [CalendarDate] exceptions (both added and removed)
    pub fn service_dates(&self, service_id: &str) -> BTreeSet<NaiveDate> {
        let mut result = BTreeSet::new();
        let exceptions = self.calendar_dates_by_service_id(service_id);

        if let Some(calendar) = self.calendars.get(service_id) {
            let mut current_date = Some(calendar.start_date);
            while let Some(date) = current_date.filter(|d| *d <= calendar.end_date) {
                if calendar.valid_weekday(date) {
                    result.insert(date);
                }
                current_date = date.succ_opt();
            }
        }
        for extra_day in exceptions {
            match extra_day.exception_type {
                Exception::Added => result.insert(extra_day.date),
                Exception::Deleted => result.remove(&extra_day.date),
            };
        }
        result
    }

    /// Stop times of a trip, ordered by `stop_sequence`
    pub fn stop_times_by_trip_id(&self, trip_id: &str) -> Vec<&StopTime> {
        self.stop_times
            .get(trip_id)
            .map(|stop_times| stop_times.values().collect())
            .unwrap_or_default()
    }

    /// Every trip id found in `stop_times.txt` with its ordered stop times
    pub fn stop_times_by_trip(&self) -> impl Iterator<Item = (&str, Vec<&StopTime>)> {
        self.stop_times
            .iter()
            .map(|(trip_id, stop_times)| (trip_id.as_str(), stop_times.values().collect()))
    }

    /// Points of a shape, ordered by `shape_pt_sequence`
    pub fn shape_by_id(&self, shape_id: &str) -> Vec<&ShapePoint> {
        self.shapes
            .get(shape_id)
            .map(|points| points.values().collect())
            .unwrap_or_default()
    }

    /// Every shape with its ordered points
    pub fn shapes(&self) -> impl Iterator<Item = (&str, Vec<&ShapePoint>)> {
        self.shapes
            .iter()
            .map(|(shape_id, points)| (shape_id.as_str(), points.values().collect()))
    }

    /// Frequencies of a trip, ordered by start time
    pub fn frequencies_by_trip_id(&self, trip_id: &str) -> Vec<&Frequency> {
        self.frequencies
            .get(trip_id)
            .map(|f| f.values().collect())
            .unwrap_or_default()
    }

    /// Every trip id found in `frequencies.txt` with its frequencies
    pub fn frequencies_by_trip(&self) -> impl Iterator<Item = (&str, Vec<&Frequency>)> {
        self.frequencies
            .iter()
            .map(|(trip_id, f)| (trip_id.as_str(), f.values().collect()))
    }

    /// Every fare attribute
    pub fn fare_attribute_all(&self) -> impl Iterator<Item = &FareAttribute> {
        self.fare_attributes.values()
    }

    /// The fare attribute with this `fare_id`
    pub fn fare_attribute_by_id(&self, fare_id: &str) -> Option<&FareAttribute> {
        self.fare_attributes.get(fare_id)
    }

    /// Every fare rule
    pub fn fare_rule_all(&self) -> impl Iterator<Item = &FareRule> {
        self.fare_rules.values()
    }

    /// The fare rule with this `(fare_id, route_id, origin_id, destination_id, contains_id)`, an
    /// absent value being empty
    pub fn fare_rule_by_key(&self, key: &[&str; 5]) -> Option<&FareRule> {
        let key: Vec<String> = key.iter().map(|s| s.to_string()).collect();
        self.fare_rules.get(&key)
    }

    /// Every transfer
    pub fn transfer_all(&self) -> impl Iterator<Item = &Transfer> {
        self.transfers.values()
    }

    /// The transfer between two stops
    pub fn transfer_by_stop_pair(&self, from_stop_id: &str, to_stop_id: &str) -> Option<&Transfer> {
        self.transfers
            .get(&(from_stop_id.to_owned(), to_stop_id.to_owned()))
    }

    /// Every pathway
    pub fn pathway_all(&self) -> impl Iterator<Item = &Pathway> {
        self.pathways.values()
    }

    /// The pathway with this `pathway_id`
    pub fn pathway_by_id(&self, id: &str) -> Option<&Pathway> {
        self.pathways.get(id)
    }

    /// Every level
    pub fn level_all(&self) -> impl Iterator<Item = &Level> {
        self.levels.values()
    }

    /// The level with this `level_id`
    pub fn level_by_id(&self, id: &str) -> Option<&Level> {
        self.levels.get(id)
    }

    /// Every row of `feed_info.txt`
    pub fn feed_info_all(&self) -> impl Iterator<Item = &FeedInfo> {
        self.feed_info.values()
    }

    /// Publisher of the feed, when `feed_info.txt` has a row
    pub fn feed_publisher_name(&self) -> Option<&str> {
        self.feed_info.keys().next().map(String::as_str)
    }

    /// Every attribution
    pub fn attribution_all(&self) -> impl Iterator<Item = &Attribution> {
        self.attributions.values()
    }

    /// Every translation
    pub fn translation_all(&self) -> impl Iterator<Item = &Translation> {
        self.translations.values()
    }

    /// Rough footprint of the stored objects in bytes
    pub fn estimated_size_bytes(&self) -> usize {
        fn nested<K, V>(map: &BTreeMap<String, BTreeMap<K, V>>) -> usize {
            map.values()
                .map(|m| m.len() * (size_of::<K>() + size_of::<V>()))
                .sum()
        }
        self.agencies.len() * size_of::<Agency>()
            + self.stops.len() * size_of::<Stop>()
            + self.routes.len() * size_of::<Route>()
            + self.trips.len() * size_of::<Trip>()
            + self.calendars.len() * size_of::<Calendar>()
            + nested(&self.calendar_dates)
            + nested(&self.stop_times)
            + nested(&self.shapes)
            + nested(&self.frequencies)
            + self.fare_attributes.len() * size_of::<FareAttribute>()
            + self.fare_rules.len() * size_of::<FareRule>()
            + self.transfers.len() * size_of::<Transfer>()
            + self.pathways.len() * size_of::<Pathway>()
            + self.levels.len() * size_of::<Level>()
            + self.feed_info.len() * size_of::<FeedInfo>()
            + self.attributions.len() * size_of::<Attribution>()
            + self.translations.len() * size_of::<Translation>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop_time(trip_id: &str, stop_sequence: u32, stop_id: &str) -> StopTime {
        StopTime {
            trip_id: trip_id.to_owned(),
            stop_sequence,
            stop_id: stop_id.to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn first_entity_wins() {
        let mut repo = DatasetRepository::new();
        let first = Route {
            id: "r1".to_owned(),
            short_name: Some("first".to_owned()),
            ..Default::default()
        };
        let second = Route {
            short_name: Some("second".to_owned()),
            ..first.clone()
        };
        assert!(repo.add_route(first.clone()).is_none());
        assert_eq!(Some(&first), repo.add_route(second));
        assert_eq!(1, repo.route_all().count());
        assert_eq!(Some("first"), repo.route_by_id("r1").and_then(|r| r.short_name.as_deref()));
    }

    #[test]
    fn agencies_keyed_by_name_without_id() {
        let mut repo = DatasetRepository::new();
        let agency = |id: Option<&str>, name: &str| Agency {
            id: id.map(str::to_owned),
            name: name.to_owned(),
            ..Default::default()
        };
        assert!(repo.add_agency(agency(None, "STM")).is_none());
        assert!(repo.add_agency(agency(None, "STM")).is_some());
        assert!(repo.add_agency(agency(Some("1"), "STM")).is_none());
        assert!(repo.add_agency(agency(None, "RTL")).is_none());
        assert_eq!(3, repo.agency_count());
        assert_eq!(Some("STM"), repo.agency_by_id("1").map(|a| a.name.as_str()));
    }

    #[test]
    fn stop_times_are_ordered_by_sequence() {
        let mut repo = DatasetRepository::new();
        assert!(repo.add_stop_time(stop_time("t1", 10, "c")).is_none());
        assert!(repo.add_stop_time(stop_time("t1", 2, "a")).is_none());
        assert!(repo.add_stop_time(stop_time("t1", 5, "b")).is_none());
        assert_eq!(Some("a"), repo.add_stop_time(stop_time("t1", 2, "z")).map(|s| s.stop_id.as_str()));
        assert!(repo.add_stop_time(stop_time("t2", 2, "z")).is_none());

        let stops: Vec<&str> = repo
            .stop_times_by_trip_id("t1")
            .iter()
            .map(|st| st.stop_id.as_str())
            .collect();
        assert_eq!(vec!["a", "b", "c"], stops);
        assert!(repo.stop_times_by_trip_id("unknown").is_empty());
    }

    #[test]
    fn trips_by_block() {
        let mut repo = DatasetRepository::new();
        let trip = |id: &str, block: Option<&str>| Trip {
            id: id.to_owned(),
            block_id: block.map(str::to_owned),
            ..Default::default()
        };
        repo.add_trip(trip("t1", Some("b1")));
        repo.add_trip(trip("t2", Some("b1")));
        repo.add_trip(trip("t3", None));
        // a duplicate is not indexed twice
        repo.add_trip(trip("t1", Some("b2")));
        let ids: Vec<&str> = repo
            .trips_by_block_id("b1")
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(vec!["t1", "t2"], ids);
        assert_eq!(vec!["b1"], repo.block_ids().collect::<Vec<_>>());
    }

    #[test]
    fn service_dates_use_weekdays_and_exceptions() {
        let mut repo = DatasetRepository::new();
        let date = |d: u32| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        // 2024-01-01 is a monday
        repo.add_calendar(Calendar {
            id: "s".to_owned(),
            monday: true,
            tuesday: false,
            wednesday: true,
            thursday: false,
            friday: false,
            saturday: false,
            sunday: false,
            start_date: date(1),
            end_date: date(10),
        });
        for (d, exception_type) in [(3, Exception::Deleted), (6, Exception::Added)] {
            repo.add_calendar_date(CalendarDate {
                service_id: "s".to_owned(),
                date: date(d),
                exception_type,
            });
        }
        let dates: Vec<NaiveDate> = repo.service_dates("s").into_iter().collect();
        assert_eq!(vec![date(1), date(6), date(8), date(10)], dates);
        assert!(repo.service_dates("unknown").is_empty());
    }

    #[test]
    fn fare_rule_key_includes_absent_values() {
        let mut repo = DatasetRepository::new();
        let rule = FareRule {
            fare_id: "f".to_owned(),
            route_id: Some("r".to_owned()),
            ..Default::default()
        };
        assert!(repo.add_fare_rule(rule.clone()).is_none());
        assert!(repo.add_fare_rule(rule).is_some());
        assert!(repo.fare_rule_by_key(&["f", "r", "", "", ""]).is_some());
        assert!(repo.fare_rule_by_key(&["f", "", "", "", ""]).is_none());
    }
}
