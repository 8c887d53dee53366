//! Integer columns that are enumerations.
//!
//! Each enumeration converts from the parsed integer with [TryFrom]. An undefined value is given
//! back as the error, so that the builder can report it.
use std::convert::TryFrom;

/// Describes the kind of [crate::Stop]. See <https://gtfs.org/reference/static/#stopstxt> `location_type`
#[derive(Derivative, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[derivative(Default(bound = ""))]
pub enum LocationType {
    /// Stop (or Platform). A location where passengers board or disembark from a transit vehicle. Is called a platform when defined within a parent_station
    #[derivative(Default)]
    StopPoint,
    /// Station. A physical structure or area that contains one or more platform
    StopArea,
    /// A location where passengers can enter or exit a station from the street
    StationEntrance,
    /// A location within a station, not matching any other location type, which can be used to link together pathways
    GenericNode,
    /// A specific location on a platform, where passengers can board and/or alight vehicles
    BoardingArea,
}

impl TryFrom<i64> for LocationType {
    type Error = i64;

    fn try_from(i: i64) -> Result<Self, i64> {
        Ok(match i {
            0 => LocationType::StopPoint,
            1 => LocationType::StopArea,
            2 => LocationType::StationEntrance,
            3 => LocationType::GenericNode,
            4 => LocationType::BoardingArea,
            _ => return Err(i),
        })
    }
}

impl LocationType {
    /// The value as written in the feed
    pub fn code(&self) -> i64 {
        match self {
            LocationType::StopPoint => 0,
            LocationType::StopArea => 1,
            LocationType::StationEntrance => 2,
            LocationType::GenericNode => 3,
            LocationType::BoardingArea => 4,
        }
    }
}

/// Describes the kind of [crate::Route]. See <https://gtfs.org/reference/static/#routestxt> `route_type`
///
/// Some route types are extended GTFS (<https://developers.google.com/transit/gtfs/reference/extended-route-types>)
#[derive(Debug, Derivative, Copy, Clone, PartialEq, Eq, Hash)]
#[derivative(Default(bound = ""))]
pub enum RouteType {
    /// Tram, Streetcar, Light rail. Any light rail or street level system within a metropolitan area
    Tramway,
    /// Any underground rail system within a metropolitan area
    Subway,
    /// Used for intercity or long-distance travel
    Rail,
    /// Used for short- and long-distance bus routes
    #[derivative(Default)]
    Bus,
    /// Used for short- and long-distance boat service
    Ferry,
    /// Used for street-level rail cars where the cable runs beneath the vehicle, e.g., cable car in San Francisco
    CableCar,
    /// Aerial lift, suspended cable car (e.g., gondola lift, aerial tramway)
    Gondola,
    /// Any rail system designed for steep inclines
    Funicular,
    /// Electric buses that draw power from overhead wires using poles
    Trolleybus,
    /// Railway in which the track consists of a single rail or a beam
    Monorail,
    /// (extended) Used for intercity bus services
    Coach,
    /// (extended) Airplanes
    Air,
    /// (extended) Taxi, Cab
    Taxi,
    /// (extended) any other value of the extended types
    Other(i64),
}

impl TryFrom<i64> for RouteType {
    type Error = i64;

    fn try_from(i: i64) -> Result<Self, i64> {
        if (8..=10).contains(&i) || i < 0 || (13..100).contains(&i) || i > 1799 {
            return Err(i);
        }
        let hundreds = i / 100;
        Ok(match (i, hundreds) {
            (0, _) | (_, 9) => RouteType::Tramway,
            (1, _) | (_, 4) => RouteType::Subway,
            (2, _) | (_, 1) => RouteType::Rail,
            (3, _) | (_, 7) | (_, 8) => RouteType::Bus,
            (4, _) | (_, 10) | (_, 12) => RouteType::Ferry,
            (5, _) => RouteType::CableCar,
            (6, _) | (_, 13) => RouteType::Gondola,
            (7, _) | (_, 14) => RouteType::Funicular,
            (11, _) => RouteType::Trolleybus,
            (12, _) => RouteType::Monorail,
            (_, 2) => RouteType::Coach,
            (_, 11) => RouteType::Air,
            (_, 15) => RouteType::Taxi,
            _ => RouteType::Other(i),
        })
    }
}

/// Describes if and how a traveller can board or alight the vehicle. See <https://gtfs.org/reference/static/#stop_timestxt> `pickup_type` and `dropoff_type`
#[derive(Debug, Derivative, Copy, Clone, PartialEq, Eq, Hash)]
#[derivative(Default(bound = ""))]
pub enum PickupDropOffType {
    /// Regularly scheduled pickup or drop off (default when empty).
    #[derivative(Default)]
    Regular,
    /// No pickup or drop off available.
    NotAvailable,
    /// Must phone agency to arrange pickup or drop off.
    ArrangeByPhone,
    /// Must coordinate with driver to arrange pickup or drop off.
    CoordinateWithDriver,
}

impl TryFrom<i64> for PickupDropOffType {
    type Error = i64;

    fn try_from(i: i64) -> Result<Self, i64> {
        Ok(match i {
            0 => PickupDropOffType::Regular,
            1 => PickupDropOffType::NotAvailable,
            2 => PickupDropOffType::ArrangeByPhone,
            3 => PickupDropOffType::CoordinateWithDriver,
            _ => return Err(i),
        })
    }
}

/// Indicates whether a rider can board the transit vehicle anywhere along the vehicle’s travel path
#[derive(Debug, Derivative, Copy, Clone, PartialEq, Eq, Hash)]
#[derivative(Default(bound = ""))]
pub enum ContinuousPickupDropOff {
    /// Continuous stopping pickup or drop off.
    Continuous,
    /// No continuous stopping pickup or drop off (default when empty).
    #[derivative(Default)]
    NotAvailable,
    /// Must phone agency to arrange continuous stopping pickup or drop off.
    ArrangeByPhone,
    /// Must coordinate with driver to arrange continuous stopping pickup or drop off.
    CoordinateWithDriver,
}

impl TryFrom<i64> for ContinuousPickupDropOff {
    type Error = i64;

    fn try_from(i: i64) -> Result<Self, i64> {
        Ok(match i {
            0 => ContinuousPickupDropOff::Continuous,
            1 => ContinuousPickupDropOff::NotAvailable,
            2 => ContinuousPickupDropOff::ArrangeByPhone,
            3 => ContinuousPickupDropOff::CoordinateWithDriver,
            _ => return Err(i),
        })
    }
}

/// Describes if the stop time is exact or not. See <https://gtfs.org/reference/static/#stop_timestxt> `timepoint`
#[derive(Debug, Derivative, Copy, Clone, PartialEq, Eq, Hash)]
#[derivative(Default(bound = ""))]
pub enum TimepointType {
    /// Times are considered approximate
    Approximate,
    /// Times are considered exact
    #[derivative(Default)]
    Exact,
}

impl TryFrom<i64> for TimepointType {
    type Error = i64;

    fn try_from(i: i64) -> Result<Self, i64> {
        match i {
            0 => Ok(TimepointType::Approximate),
            1 => Ok(TimepointType::Exact),
            _ => Err(i),
        }
    }
}

/// Generic enum to define if a service (like wheelchair access) is available
#[derive(Debug, Derivative, PartialEq, Eq, Hash, Clone, Copy)]
#[derivative(Default)]
pub enum Availability {
    /// No information if the service is available
    #[derivative(Default)]
    InformationNotAvailable,
    /// The service is available
    Available,
    /// The service is not available
    NotAvailable,
}

impl TryFrom<i64> for Availability {
    type Error = i64;

    fn try_from(i: i64) -> Result<Self, i64> {
        Ok(match i {
            0 => Availability::InformationNotAvailable,
            1 => Availability::Available,
            2 => Availability::NotAvailable,
            _ => return Err(i),
        })
    }
}

/// Defines if a [crate::CalendarDate] is added or deleted from a [crate::Calendar]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Exception {
    /// There will be a service on that day
    Added,
    /// There won’t be a service on that day
    Deleted,
}

impl TryFrom<i64> for Exception {
    type Error = i64;

    fn try_from(i: i64) -> Result<Self, i64> {
        match i {
            1 => Ok(Exception::Added),
            2 => Ok(Exception::Deleted),
            _ => Err(i),
        }
    }
}

/// Defines the direction of a [crate::Trip], only for display, not for routing. See <https://gtfs.org/reference/static/#tripstxt> `direction_id`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DirectionType {
    /// Travel in one direction (e.g. outbound travel).
    Outbound,
    /// Travel in the opposite direction (e.g. inbound travel).
    Inbound,
}

impl TryFrom<i64> for DirectionType {
    type Error = i64;

    fn try_from(i: i64) -> Result<Self, i64> {
        match i {
            0 => Ok(DirectionType::Outbound),
            1 => Ok(DirectionType::Inbound),
            _ => Err(i),
        }
    }
}

/// Is the [crate::Trip] accessible with a bike. See <https://gtfs.org/reference/static/#tripstxt> `bikes_allowed`
#[derive(Debug, Derivative, Copy, Clone, PartialEq, Eq, Hash)]
#[derivative(Default())]
pub enum BikesAllowedType {
    /// No bike information for the trip
    #[derivative(Default)]
    NoBikeInfo,
    /// Vehicle being used on this particular trip can accommodate at least one bicycle
    AtLeastOneBike,
    /// No bicycles are allowed on this trip
    NoBikesAllowed,
}

impl TryFrom<i64> for BikesAllowedType {
    type Error = i64;

    fn try_from(i: i64) -> Result<Self, i64> {
        Ok(match i {
            0 => BikesAllowedType::NoBikeInfo,
            1 => BikesAllowedType::AtLeastOneBike,
            2 => BikesAllowedType::NoBikesAllowed,
            _ => return Err(i),
        })
    }
}

/// Defines where a [crate::FareAttribute] can be paid
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    /// Fare is paid on board
    Aboard,
    /// Fare must be paid before boarding
    PreBoarding,
}

impl TryFrom<i64> for PaymentMethod {
    type Error = i64;

    fn try_from(i: i64) -> Result<Self, i64> {
        match i {
            0 => Ok(PaymentMethod::Aboard),
            1 => Ok(PaymentMethod::PreBoarding),
            _ => Err(i),
        }
    }
}

/// Defines if the [crate::Frequency] is exact (the vehicle runs exactly every n minutes) or not
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ExactTimes {
    /// Frequency-based trips
    FrequencyBased,
    /// Schedule-based trips with the exact same headway throughout the day.
    ScheduleBased,
}

impl TryFrom<i64> for ExactTimes {
    type Error = i64;

    fn try_from(i: i64) -> Result<Self, i64> {
        match i {
            0 => Ok(ExactTimes::FrequencyBased),
            1 => Ok(ExactTimes::ScheduleBased),
            _ => Err(i),
        }
    }
}

/// Defines how many transfers can be done with on [crate::FareAttribute]
#[derive(Debug, Derivative, Copy, Clone, PartialEq, Eq, Hash)]
#[derivative(Default(bound = ""))]
pub enum Transfers {
    /// Unlimited transfers are permitted (empty value)
    #[derivative(Default)]
    Unlimited,
    /// No transfers permitted on this fare
    NoTransfer,
    /// Riders may transfer once
    UniqueTransfer,
    /// Riders may transfer twice
    TwoTransfers,
}

impl TryFrom<i64> for Transfers {
    type Error = i64;

    fn try_from(i: i64) -> Result<Self, i64> {
        Ok(match i {
            0 => Transfers::NoTransfer,
            1 => Transfers::UniqueTransfer,
            2 => Transfers::TwoTransfers,
            _ => return Err(i),
        })
    }
}

/// Defines the type of a [crate::Transfer]
#[derive(Debug, Derivative, Copy, Clone, PartialEq, Eq, Hash)]
#[derivative(Default)]
pub enum TransferType {
    /// Recommended transfer point between routes
    #[derivative(Default)]
    Recommended,
    /// Departing vehicle waits for arriving one
    Timed,
    /// Transfer requires a minimum amount of time between arrival and departure to ensure a connection.
    MinTime,
    /// Transfer is not possible at this location
    Impossible,
    /// Passengers can stay onboard the same vehicle
    StayOnBoard,
    /// In-seat transfers are not allowed
    MustAlight,
}

impl TryFrom<i64> for TransferType {
    type Error = i64;

    fn try_from(i: i64) -> Result<Self, i64> {
        Ok(match i {
            0 => TransferType::Recommended,
            1 => TransferType::Timed,
            2 => TransferType::MinTime,
            3 => TransferType::Impossible,
            4 => TransferType::StayOnBoard,
            5 => TransferType::MustAlight,
            _ => return Err(i),
        })
    }
}

/// Type of pathway between [crate::Pathway::from_stop_id] and [crate::Pathway::to_stop_id]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PathwayMode {
    /// A walkway
    Walkway,
    /// Stairs
    Stairs,
    /// Moving sidewalk / travelator
    MovingSidewalk,
    /// Escalator
    Escalator,
    /// Elevator
    Elevator,
    /// A pathway that crosses into an area of the station where a proof of payment is required (usually via a physical payment gate)
    FareGate,
    /// Indicates a pathway exiting an area where proof-of-payment is required into an area where proof-of-payment is no longer required.
    ExitGate,
}

impl TryFrom<i64> for PathwayMode {
    type Error = i64;

    fn try_from(i: i64) -> Result<Self, i64> {
        Ok(match i {
            1 => PathwayMode::Walkway,
            2 => PathwayMode::Stairs,
            3 => PathwayMode::MovingSidewalk,
            4 => PathwayMode::Escalator,
            5 => PathwayMode::Elevator,
            6 => PathwayMode::FareGate,
            7 => PathwayMode::ExitGate,
            _ => return Err(i),
        })
    }
}

/// Indicates in which direction the pathway can be used
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PathwayDirectionType {
    /// Unidirectional pathway, it can only be used from [crate::Pathway::from_stop_id] to [crate::Pathway::to_stop_id].
    Unidirectional,
    /// Bidirectional pathway, it can be used in the two directions.
    Bidirectional,
}

impl TryFrom<i64> for PathwayDirectionType {
    type Error = i64;

    fn try_from(i: i64) -> Result<Self, i64> {
        match i {
            0 => Ok(PathwayDirectionType::Unidirectional),
            1 => Ok(PathwayDirectionType::Bidirectional),
            _ => Err(i),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_types() {
        assert_eq!(Ok(RouteType::Bus), RouteType::try_from(3));
        assert_eq!(Ok(RouteType::Monorail), RouteType::try_from(12));
        assert_eq!(Ok(RouteType::Coach), RouteType::try_from(200));
        assert_eq!(Ok(RouteType::Rail), RouteType::try_from(109));
        assert_eq!(Err(9), RouteType::try_from(9));
        assert_eq!(Err(-1), RouteType::try_from(-1));
        assert_eq!(Err(42), RouteType::try_from(42));
    }

    #[test]
    fn undefined_values_are_given_back() {
        assert_eq!(Err(5), LocationType::try_from(5));
        assert_eq!(Ok(LocationType::BoardingArea), LocationType::try_from(4));
        assert_eq!(Err(0), PathwayMode::try_from(0));
        assert_eq!(Err(3), Exception::try_from(3));
        assert_eq!(Ok(Transfers::TwoTransfers), Transfers::try_from(2));
    }
}
