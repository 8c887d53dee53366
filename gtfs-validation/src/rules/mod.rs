//! Validation rules run on the ingested dataset.
//!
//! Every rule is independent: it reads the [DatasetRepository] and the run parameters, and adds
//! notices. Rules run in the order of [default_rules].
use crate::exec_params::ExecParamRepository;
use crate::notice::{Notice, NoticeKind};
use crate::repository::DatasetRepository;
use crate::NoticeRepository;

mod agency;
mod calendar;
mod fares;
mod feed_info;
mod frequencies;
mod routes;
mod shapes;
mod stop_times;
mod transfers;
mod trips;

pub use agency::{AgencyLanguage, AgencyTimezone};
pub use calendar::CalendarDates;
pub use fares::{FareAttributeAgency, FareRuleReferences};
pub use feed_info::{FeedExpiration7Days, FeedExpiration30Days, FeedInfoDates, MissingFeedDates};
pub use frequencies::{FrequencyTimes, OverlappingFrequencies};
pub use routes::{
    DuplicateRouteLongName, DuplicateRouteNames, DuplicateRouteShortName, RouteAgency,
    RouteColorContrast, RouteDescription, RouteLongName, RouteNamePresence, RouteShortNameLength,
};
pub use shapes::DecreasingShapeDistance;
pub use stop_times::{
    ArrivalBeforeDeparture, BackwardsTimeTravel, DecreasingStopTimeDistance, StopTimeReferences,
    StopTimeShapeDistance, StopTooFarFromShape, TravelSpeed, TripEdgeTimes,
};
pub use transfers::{TransferStops, TransferTime};
pub use trips::{
    BlockOverlap, TripNumberOfStops, TripRoute, TripService, TripShape, TripUsage,
};

/// What a rule can see of the run
pub struct RuleContext<'a> {
    /// The valid objects of the feed
    pub dataset: &'a DatasetRepository,
    /// The parameters of the run
    pub exec_params: &'a ExecParamRepository,
    /// Where the findings go
    pub notices: &'a NoticeRepository,
}

impl<'a> RuleContext<'a> {
    /// Adds a notice about an entity of a file
    pub fn report(&self, file_name: &str, entity_id: impl Into<String>, kind: NoticeKind) {
        self.notices
            .add_notice(Notice::new(kind).in_file(file_name).for_entity(entity_id));
    }
}

/// One check of the dataset
pub trait ValidationRule: Send + Sync {
    /// Code and summary of the rule, used in the logs
    fn name(&self) -> &'static str;

    /// Runs the check. Only the notice repository is written
    fn execute(&self, ctx: &RuleContext);
}

/// Every rule, in the order they run
pub fn default_rules() -> Vec<Box<dyn ValidationRule>> {
    vec![
        Box::new(RouteShortNameLength),
        Box::new(RouteColorContrast),
        Box::new(RouteDescription),
        Box::new(RouteNamePresence),
        Box::new(RouteLongName),
        Box::new(CalendarDates),
        Box::new(AgencyTimezone),
        Box::new(TripRoute),
        Box::new(TripService),
        Box::new(RouteAgency),
        Box::new(FareAttributeAgency),
        Box::new(StopTimeReferences),
        Box::new(StopTimeShapeDistance),
        Box::new(TripShape),
        Box::new(FeedInfoDates),
        Box::new(FeedExpiration7Days),
        Box::new(FeedExpiration30Days),
        Box::new(MissingFeedDates),
        Box::new(ArrivalBeforeDeparture),
        Box::new(TripEdgeTimes),
        Box::new(BackwardsTimeTravel),
        Box::new(TravelSpeed),
        Box::new(TripUsage),
        Box::new(TripNumberOfStops),
        Box::new(FrequencyTimes),
        Box::new(StopTooFarFromShape),
        Box::new(OverlappingFrequencies),
        Box::new(BlockOverlap),
        Box::new(AgencyLanguage),
        Box::new(DuplicateRouteLongName),
        Box::new(DuplicateRouteShortName),
        Box::new(DuplicateRouteNames),
        Box::new(TransferTime),
        Box::new(TransferStops),
        Box::new(FareRuleReferences),
        Box::new(DecreasingShapeDistance),
        Box::new(DecreasingStopTimeDistance),
    ]
}

/// `agency_id` of a route or a fare must name an agency, and can only be omitted when there is
/// a single agency
fn check_agency_reference(
    ctx: &RuleContext,
    file_name: &str,
    entity_id: &str,
    agency_id: Option<&str>,
) {
    match agency_id {
        Some(id) if ctx.dataset.agency_by_id(id).is_none() => ctx.report(
            file_name,
            entity_id,
            NoticeKind::AgencyIdNotFound {
                field_name: "agency_id",
                unknown_agency_id: id.to_owned(),
            },
        ),
        None if ctx.dataset.agency_count() > 1 => {
            ctx.report(file_name, entity_id, NoticeKind::MissingAgencyId)
        }
        _ => {}
    }
}

#[cfg(test)]
pub(crate) fn run_rule_with(
    rule: &dyn ValidationRule,
    dataset: &DatasetRepository,
    exec_params: &ExecParamRepository,
) -> Vec<Notice> {
    let notices = NoticeRepository::new();
    rule.execute(&RuleContext {
        dataset,
        exec_params,
        notices: &notices,
    });
    notices.get_all()
}

#[cfg(test)]
pub(crate) fn run_rule(rule: &dyn ValidationRule, dataset: &DatasetRepository) -> Vec<Notice> {
    run_rule_with(rule, dataset, &ExecParamRepository::new())
}
