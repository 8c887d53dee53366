use super::{check_agency_reference, RuleContext, ValidationRule};
use crate::notice::NoticeKind;

const FARE_RULES: &str = "fare_rules.txt";

/// `agency_id` of a fare names an agency, and is given when there are several agencies
pub struct FareAttributeAgency;

impl ValidationRule for FareAttributeAgency {
    fn name(&self) -> &'static str {
        "E035 - Fare attribute agency"
    }

    fn execute(&self, ctx: &RuleContext) {
        for fare in ctx.dataset.fare_attribute_all() {
            check_agency_reference(
                ctx,
                "fare_attributes.txt",
                &fare.id,
                fare.agency_id.as_deref(),
            );
        }
    }
}

/// Fare rules name an existing fare and route
pub struct FareRuleReferences;

impl ValidationRule for FareRuleReferences {
    fn name(&self) -> &'static str {
        "E040 - Fare rule references"
    }

    fn execute(&self, ctx: &RuleContext) {
        for rule in ctx.dataset.fare_rule_all() {
            if ctx.dataset.fare_attribute_by_id(&rule.fare_id).is_none() {
                ctx.report(
                    FARE_RULES,
                    rule.fare_id.as_str(),
                    NoticeKind::FareIdNotFound {
                        field_name: "fare_id",
                        unknown_fare_id: rule.fare_id.clone(),
                    },
                );
            }
            if let Some(route_id) = &rule.route_id {
                if ctx.dataset.route_by_id(route_id).is_none() {
                    ctx.report(
                        FARE_RULES,
                        rule.fare_id.as_str(),
                        NoticeKind::RouteIdNotFound {
                            field_name: "route_id",
                            unknown_route_id: route_id.clone(),
                        },
                    );
                }
            }
        }
    }
}
