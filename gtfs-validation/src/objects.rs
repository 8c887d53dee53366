pub use crate::enums::*;
use crate::time::format_time;
use chrono::{Datelike, NaiveDate, Weekday};
use rgb::RGB8;

use std::fmt;

/// Objects that have an identifier implement this trait
///
/// Those identifier are technical and should not be shown to travellers
pub trait Id {
    /// Identifier of the object
    fn id(&self) -> &str;
}

/// Objects are unique in the dataset by the values of some of their fields
pub trait CompositeKey {
    /// Names and values of the fields making the key, in order. An absent value is empty
    fn key_fields(&self) -> Vec<(&'static str, String)>;
}

fn or_empty(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// General informations about the agency running the network. See <https://gtfs.org/reference/static/#agencytxt>
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Agency {
    /// Unique technical (not for the traveller) identifier for the Agency
    pub id: Option<String>,
    ///Full name of the transit agency
    pub name: String,
    /// Full name of the transit agency.
    pub url: String,
    /// Timezone where the transit agency is located
    pub timezone: String,
    /// Primary language used by this transit agency
    pub lang: Option<String>,
    /// A voice telephone number for the specified agency
    pub phone: Option<String>,
    /// URL of a web page that allows a rider to purchase tickets or other fare instruments for that agency online
    pub fare_url: Option<String>,
    /// Email address actively monitored by the agency’s customer service department
    pub email: Option<String>,
}

impl Id for Agency {
    fn id(&self) -> &str {
        match &self.id {
            None => "",
            Some(id) => id,
        }
    }
}

impl CompositeKey for Agency {
    fn key_fields(&self) -> Vec<(&'static str, String)> {
        match &self.id {
            Some(id) => vec![("agency_id", id.clone())],
            None => vec![("agency_name", self.name.clone())],
        }
    }
}

impl fmt::Display for Agency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A physical stop, station or area. See <https://gtfs.org/reference/static/#stopstxt>
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stop {
    /// Unique technical identifier (not for the traveller) of the stop
    pub id: String,
    /// Short text or a number that identifies the location for riders
    pub code: Option<String>,
    ///Name of the location. Use a name that people will understand in the local and tourist vernacular
    pub name: Option<String>,
    /// Description of the location that provides useful, quality information
    pub description: Option<String>,
    /// Type of the location
    pub location_type: LocationType,
    /// Defines hierarchy between the different locations
    pub parent_station: Option<String>,
    /// Identifies the fare zone for a stop
    pub zone_id: Option<String>,
    /// URL of a web page about the location
    pub url: Option<String>,
    /// Longitude of the stop
    pub longitude: Option<f64>,
    /// Latitude of the stop
    pub latitude: Option<f64>,
    /// Timezone of the location
    pub timezone: Option<String>,
    /// Indicates whether wheelchair boardings are possible from the location
    pub wheelchair_boarding: Availability,
    /// Level of the location. The same level can be used by multiple unlinked stations
    pub level_id: Option<String>,
    /// Platform identifier for a platform stop (a stop belonging to a station)
    pub platform_code: Option<String>,
}

impl Stop {
    /// Position of the stop, longitude as `x` and latitude as `y`
    pub fn coord(&self) -> Option<geo_types::Coord> {
        Some(geo_types::Coord {
            x: self.longitude?,
            y: self.latitude?,
        })
    }
}

impl Id for Stop {
    fn id(&self) -> &str {
        &self.id
    }
}

impl CompositeKey for Stop {
    fn key_fields(&self) -> Vec<(&'static str, String)> {
        vec![("stop_id", self.id.clone())]
    }
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name.as_deref().unwrap_or(&self.id))
    }
}

/// A route is a commercial line (there can be various stop sequences for a same line). See <https://gtfs.org/reference/static/#routestxt>
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Route {
    /// Unique technical (not for the traveller) identifier for the route
    pub id: String,
    /// Short name of a route. This will often be a short, abstract identifier like "32", "100X", or "Green" that riders use to identify a route, but which doesn't give any indication of what places the route serves
    pub short_name: Option<String>,
    /// Full name of a route. This name is generally more descriptive than the [Route::short_name]] and often includes the route's destination or stop
    pub long_name: Option<String>,
    /// Description of a route that provides useful, quality information
    pub desc: Option<String>,
    /// Indicates the type of transportation used on a route
    pub route_type: RouteType,
    /// URL of a web page about the particular route
    pub url: Option<String>,
    /// Agency for the specified route
    pub agency_id: Option<String>,
    /// Orders the routes in a way which is ideal for presentation to customers. Routes with smaller route_sort_order values should be displayed first.
    pub order: Option<i64>,
    /// Route color designation that matches public facing material
    pub color: Option<RGB8>,
    /// Legible color to use for text drawn against a background of [Route::color]
    pub text_color: Option<RGB8>,
    /// Indicates whether a rider can board the transit vehicle anywhere along the vehicle’s travel path
    pub continuous_pickup: ContinuousPickupDropOff,
    /// Indicates whether a rider can alight from the transit vehicle at any point along the vehicle’s travel path
    pub continuous_drop_off: ContinuousPickupDropOff,
}

impl Id for Route {
    fn id(&self) -> &str {
        &self.id
    }
}

impl CompositeKey for Route {
    fn key_fields(&self) -> Vec<(&'static str, String)> {
        vec![("route_id", self.id.clone())]
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.long_name, &self.short_name) {
            (Some(long_name), _) => write!(f, "{}", long_name),
            (None, Some(short_name)) => write!(f, "{}", short_name),
            (None, None) => write!(f, "{}", self.id),
        }
    }
}

/// A Trip is a vehicle that follows a sequence of [StopTime] on certain days. See <https://gtfs.org/reference/static/#tripstxt>
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Trip {
    /// Unique technical identifier (not for the traveller) for the Trip
    pub id: String,
    /// References the [Calendar] on which this trip runs
    pub service_id: String,
    /// References along which [Route] this trip runs
    pub route_id: String,
    /// Shape of the trip
    pub shape_id: Option<String>,
    /// Text that appears on signage identifying the trip's destination to riders
    pub trip_headsign: Option<String>,
    /// Public facing text used to identify the trip to riders, for instance, to identify train numbers for commuter rail trips
    pub trip_short_name: Option<String>,
    /// Indicates the direction of travel for a trip. This field is not used in routing; it provides a way to separate trips by direction when publishing time tables
    pub direction_id: Option<DirectionType>,
    /// Identifies the block to which the trip belongs. A block consists of a single trip or many sequential trips made using the same vehicle
    pub block_id: Option<String>,
    /// Indicates wheelchair accessibility
    pub wheelchair_accessible: Availability,
    /// Indicates whether bikes are allowed
    pub bikes_allowed: BikesAllowedType,
}

impl Id for Trip {
    fn id(&self) -> &str {
        &self.id
    }
}

impl CompositeKey for Trip {
    fn key_fields(&self) -> Vec<(&'static str, String)> {
        vec![("trip_id", self.id.clone())]
    }
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "route id: {}, service id: {}",
            self.route_id, self.service_id
        )
    }
}

/// The moment where a vehicle, running on [Trip] stops at a [Stop]. See <https://gtfs.org/reference/static/#stopstxt>
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StopTime {
    /// [Trip] to which this stop time belongs to
    pub trip_id: String,
    /// Arrival time of the stop time.
    /// It's an option since the intermediate stops can have have no arrival
    /// and this arrival needs to be interpolated
    pub arrival_time: Option<u32>,
    /// Departure time of the stop time.
    /// It's an option since the intermediate stops can have have no departure
    /// and this departure needs to be interpolated
    pub departure_time: Option<u32>,
    /// Identifier of the [Stop] where the vehicle stops
    pub stop_id: String,
    /// Order of stops for a particular trip. The values must increase along the trip but do not need to be consecutive
    pub stop_sequence: u32,
    /// Text that appears on signage identifying the trip's destination to riders
    pub stop_headsign: Option<String>,
    /// Indicates pickup method
    pub pickup_type: PickupDropOffType,
    /// Indicates drop off method
    pub drop_off_type: PickupDropOffType,
    /// Indicates whether a rider can board the transit vehicle anywhere along the vehicle’s travel path
    pub continuous_pickup: Option<ContinuousPickupDropOff>,
    /// Indicates whether a rider can alight from the transit vehicle at any point along the vehicle’s travel path
    pub continuous_drop_off: Option<ContinuousPickupDropOff>,
    /// Actual distance traveled along the associated shape, from the first stop to the stop specified in this record. This field specifies how much of the shape to draw between any two stops during a trip
    pub shape_dist_traveled: Option<f64>,
    /// Indicates if arrival and departure times for a stop are strictly adhered to by the vehicle or if they are instead approximate and/or interpolated times
    pub timepoint: TimepointType,
}

impl CompositeKey for StopTime {
    fn key_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("trip_id", self.trip_id.clone()),
            ("stop_sequence", self.stop_sequence.to_string()),
        ]
    }
}

/// A calender describes on which days the vehicle runs. See <https://gtfs.org/reference/static/#calendartxt>
#[derive(Debug, Clone, PartialEq)]
pub struct Calendar {
    /// Unique technical identifier (not for the traveller) of this calendar
    pub id: String,
    /// Does the service run on mondays
    pub monday: bool,
    /// Does the service run on tuesdays
    pub tuesday: bool,
    /// Does the service run on wednesdays
    pub wednesday: bool,
    /// Does the service run on thursdays
    pub thursday: bool,
    /// Does the service run on fridays
    pub friday: bool,
    /// Does the service run on saturdays
    pub saturday: bool,
    /// Does the service run on sundays
    pub sunday: bool,
    /// Start service day for the service interval
    pub start_date: NaiveDate,
    /// End service day for the service interval. This service day is included in the interval
    pub end_date: NaiveDate,
}

impl Id for Calendar {
    fn id(&self) -> &str {
        &self.id
    }
}

impl CompositeKey for Calendar {
    fn key_fields(&self) -> Vec<(&'static str, String)> {
        vec![("service_id", self.id.clone())]
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}—{}", self.start_date, self.end_date)
    }
}

impl Calendar {
    /// Returns true if there is a service running on that day
    pub fn valid_weekday(&self, date: NaiveDate) -> bool {
        match date.weekday() {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }
}

/// Defines a specific date that can be added or removed from a [Calendar]. See <https://gtfs.org/reference/static/#calendar_datestxt>
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDate {
    /// Identifier of the service that is modified at this date
    pub service_id: String,
    /// Date where the service will be added or deleted
    pub date: NaiveDate,
    /// Is the service added or deleted
    pub exception_type: Exception,
}

impl CompositeKey for CalendarDate {
    fn key_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("service_id", self.service_id.clone()),
            ("date", crate::value_helpers::format_date(&self.date)),
        ]
    }
}

/// A single geographical point decribing the shape of a [Trip]. See <https://gtfs.org/reference/static/#shapestxt>
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ShapePoint {
    /// Unique technical (not for the traveller) identifier for the Shape
    pub id: String,
    /// Latitude of a shape point
    pub latitude: f64,
    /// Longitude of a shape point
    pub longitude: f64,
    /// Sequence in which the shape points connect to form the shape. Values increase along the trip but do not need to be consecutive.
    pub sequence: u32,
    /// Actual distance traveled along the shape from the first shape point to the point specified in this record
    pub dist_traveled: Option<f64>,
}

impl ShapePoint {
    /// Position of the point, longitude as `x` and latitude as `y`
    pub fn coord(&self) -> geo_types::Coord {
        geo_types::Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }
}

impl Id for ShapePoint {
    fn id(&self) -> &str {
        &self.id
    }
}

impl CompositeKey for ShapePoint {
    fn key_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("shape_id", self.id.clone()),
            ("shape_pt_sequence", self.sequence.to_string()),
        ]
    }
}

/// Timetables can be defined by the frequency of their vehicles. See <<https://gtfs.org/reference/static/#frequenciestxt>>
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Frequency {
    /// References the [Trip] that uses frequency
    pub trip_id: String,
    /// Time at which the first vehicle departs from the first stop of the trip
    pub start_time: u32,
    /// Time at which service changes to a different headway (or ceases) at the first stop in the trip
    pub end_time: u32,
    /// Time, in seconds, between departures from the same stop (headway) for the trip, during the time interval specified by start_time and end_time
    pub headway_secs: u32,
    /// Indicates the type of service for a trip
    pub exact_times: Option<ExactTimes>,
}

impl CompositeKey for Frequency {
    fn key_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("trip_id", self.trip_id.clone()),
            ("start_time", format_time(self.start_time)),
        ]
    }
}

/// A Fare Attribute (price, currency etc.). See <https://gtfs.org/reference/static/#fare_attributestxt>
#[derive(Debug, Clone, PartialEq)]
pub struct FareAttribute {
    /// Unique technical (not for the traveller) identifier for the FareAttribute
    pub id: String,
    /// Fare price, in the unit specified by [FareAttribute::currency]
    pub price: f64,
    /// Currency used to pay the fare.
    pub currency: String,
    ///Indicates when the fare must be paid
    pub payment_method: PaymentMethod,
    /// Indicates the number of transfers permitted on this fare
    pub transfers: Transfers,
    /// Identifies the relevant agency for a fare
    pub agency_id: Option<String>,
    /// Length of time in seconds before a transfer expires
    pub transfer_duration: Option<i64>,
}

impl Id for FareAttribute {
    fn id(&self) -> &str {
        &self.id
    }
}

impl CompositeKey for FareAttribute {
    fn key_fields(&self) -> Vec<(&'static str, String)> {
        vec![("fare_id", self.id.clone())]
    }
}

/// Defines one possible fare. See <https://gtfs.org/reference/static/#fare_rulestxt>
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FareRule {
    /// References the [FareAttribute] of the rule
    pub fare_id: String,
    /// The fare applies to this [Route]
    pub route_id: Option<String>,
    /// The fare applies to departures from this zone
    pub origin_id: Option<String>,
    /// The fare applies to arrivals in this zone
    pub destination_id: Option<String>,
    /// The fare applies to itineraries passing through this zone
    pub contains_id: Option<String>,
}

impl CompositeKey for FareRule {
    fn key_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("fare_id", self.fare_id.clone()),
            ("route_id", or_empty(&self.route_id)),
            ("origin_id", or_empty(&self.origin_id)),
            ("destination_id", or_empty(&self.destination_id)),
            ("contains_id", or_empty(&self.contains_id)),
        ]
    }
}

/// Transfer information between stops. See <https://gtfs.org/reference/static/#transferstxt>
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Transfer {
    /// Stop from which to leave
    pub from_stop_id: String,
    /// Stop which to transfer to
    pub to_stop_id: String,
    /// Type of the transfer
    pub transfer_type: TransferType,
    /// Minimum time needed to make the transfer in seconds
    pub min_transfer_time: Option<i64>,
}

impl CompositeKey for Transfer {
    fn key_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("from_stop_id", self.from_stop_id.clone()),
            ("to_stop_id", self.to_stop_id.clone()),
        ]
    }
}

/// Pathway going from a stop to another. See <https://gtfs.org/reference/static/#pathwaystxt>
#[derive(Debug, Clone, PartialEq)]
pub struct Pathway {
    /// Uniquely identifies the pathway
    pub id: String,
    /// Location at which the pathway begins
    pub from_stop_id: String,
    /// Location at which the pathway ends
    pub to_stop_id: String,
    /// Type of pathway between the specified (from_stop_id, to_stop_id) pair
    pub mode: PathwayMode,
    /// Indicates in which direction the pathway can be used
    pub is_bidirectional: PathwayDirectionType,
    /// Horizontal length in meters of the pathway from the origin location to the destination location
    pub length: Option<f64>,
    /// Average time in seconds needed to walk through the pathway from the origin location to the destination location
    pub traversal_time: Option<i64>,
    /// Number of stairs of the pathway
    pub stair_count: Option<i64>,
    /// Maximum slope ratio of the pathway
    pub max_slope: Option<f64>,
    /// Minimum width of the pathway in meters
    pub min_width: Option<f64>,
    /// String of text from physical signage visible to transit riders
    pub signposted_as: Option<String>,
    /// Same than the signposted_as field, but when the pathways is used backward
    pub reversed_signposted_as: Option<String>,
}

impl Id for Pathway {
    fn id(&self) -> &str {
        &self.id
    }
}

impl CompositeKey for Pathway {
    fn key_fields(&self) -> Vec<(&'static str, String)> {
        vec![("pathway_id", self.id.clone())]
    }
}

/// Level of a station. See <https://gtfs.org/reference/static/#levelstxt>
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Level {
    /// Id of the level that can be referenced from stops.txt
    pub id: String,
    /// Numeric index of the level that indicates relative position of this level in relation to other levels
    pub index: f64,
    /// Optional name of the level
    pub name: Option<String>,
}

impl Id for Level {
    fn id(&self) -> &str {
        &self.id
    }
}

impl CompositeKey for Level {
    fn key_fields(&self) -> Vec<(&'static str, String)> {
        vec![("level_id", self.id.clone())]
    }
}

/// Meta-data about the feed. See <https://gtfs.org/reference/static/#feed_infotxt>
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FeedInfo {
    /// Full name of the organization that publishes the dataset.
    pub name: String,
    /// URL of the dataset publishing organization's website
    pub url: String,
    /// Default language used for the text in this dataset
    pub lang: String,
    /// Defines the language that should be used when the data consumer doesn’t know the language of the rider
    pub default_lang: Option<String>,
    /// The dataset provides complete and reliable schedule information for service in the period from this date
    pub start_date: Option<NaiveDate>,
    ///The dataset provides complete and reliable schedule information for service in the period until this date
    pub end_date: Option<NaiveDate>,
    /// String that indicates the current version of their GTFS dataset
    pub version: Option<String>,
    /// Email address for communication regarding the GTFS dataset and data publishing practices
    pub contact_email: Option<String>,
    /// URL for contact information, a web-form, support desk, or other tools for communication regarding the GTFS dataset and data publishing practices
    pub contact_url: Option<String>,
}

impl CompositeKey for FeedInfo {
    fn key_fields(&self) -> Vec<(&'static str, String)> {
        vec![("feed_publisher_name", self.name.clone())]
    }
}

impl fmt::Display for FeedInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Organization credited for the dataset, a route or a trip. See <https://gtfs.org/reference/static/#attributionstxt>
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Attribution {
    /// Identifies an attribution for the dataset or a subset of it
    pub id: Option<String>,
    /// Agency to which the attribution applies
    pub agency_id: Option<String>,
    /// Route to which the attribution applies
    pub route_id: Option<String>,
    /// Trip to which the attribution applies
    pub trip_id: Option<String>,
    /// Name of the organization that the dataset is attributed to
    pub organization_name: String,
    /// The role of the organization is producer
    pub is_producer: bool,
    /// The role of the organization is operator
    pub is_operator: bool,
    /// The role of the organization is authority
    pub is_authority: bool,
    /// URL of the organization
    pub url: Option<String>,
    /// Email of the organization
    pub email: Option<String>,
    /// Phone number of the organization
    pub phone: Option<String>,
}

impl CompositeKey for Attribution {
    fn key_fields(&self) -> Vec<(&'static str, String)> {
        let first = match &self.id {
            Some(id) => ("attribution_id", id.clone()),
            None => ("organization_name", self.organization_name.clone()),
        };
        vec![
            first,
            ("agency_id", or_empty(&self.agency_id)),
            ("route_id", or_empty(&self.route_id)),
            ("trip_id", or_empty(&self.trip_id)),
        ]
    }
}

/// Translation of a value of the feed. See <https://gtfs.org/reference/static/#translationstxt>
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Translation {
    /// Table containing the field to translate
    pub table_name: String,
    /// Name of the field to translate
    pub field_name: String,
    /// Language of the translation
    pub language: String,
    /// Translated value
    pub translation: String,
    /// Record that contains the field to translate
    pub record_id: Option<String>,
    /// Helps identify the record when the record id is not unique
    pub record_sub_id: Option<String>,
    /// Translates every occurrence of this value in the field, instead of a single record
    pub field_value: Option<String>,
}

impl CompositeKey for Translation {
    fn key_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("table_name", self.table_name.clone()),
            ("field_name", self.field_name.clone()),
            ("language", self.language.clone()),
            ("record_id", or_empty(&self.record_id)),
            ("record_sub_id", or_empty(&self.record_sub_id)),
            ("field_value", or_empty(&self.field_value)),
        ]
    }
}
