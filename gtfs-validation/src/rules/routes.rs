use super::{check_agency_reference, RuleContext, ValidationRule};
use crate::notice::NoticeKind;
use crate::objects::Route;
use rgb::RGB8;
use std::collections::HashMap;

const ROUTES: &str = "routes.txt";
const MAX_SHORT_NAME_LENGTH: usize = 12;
const MIN_CONTRAST_RATIO: f64 = 4.5;

/// `route_short_name` longer than 12 characters
pub struct RouteShortNameLength;

impl ValidationRule for RouteShortNameLength {
    fn name(&self) -> &'static str {
        "W005 - Route short name too long"
    }

    fn execute(&self, ctx: &RuleContext) {
        for route in ctx.dataset.route_all() {
            let length = route.short_name.as_deref().map_or(0, |s| s.chars().count());
            if length > MAX_SHORT_NAME_LENGTH {
                ctx.report(
                    ROUTES,
                    route.id.as_str(),
                    NoticeKind::RouteShortNameTooLong {
                        short_name_length: length,
                    },
                );
            }
        }
    }
}

fn luminance(c: RGB8) -> f64 {
    0.2126 * f64::from(c.r) + 0.7152 * f64::from(c.g) + 0.0722 * f64::from(c.b)
}

fn contrast_ratio(a: RGB8, b: RGB8) -> f64 {
    let (la, lb) = (luminance(a), luminance(b));
    (la.max(lb) + 0.05) / (la.min(lb) + 0.05)
}

/// The text of a route must be readable on its color
pub struct RouteColorContrast;

impl ValidationRule for RouteColorContrast {
    fn name(&self) -> &'static str {
        "E025 - Insufficient route color contrast"
    }

    fn execute(&self, ctx: &RuleContext) {
        for route in ctx.dataset.route_all() {
            if let (Some(color), Some(text_color)) = (route.color, route.text_color) {
                let ratio = contrast_ratio(color, text_color);
                if ratio < MIN_CONTRAST_RATIO {
                    ctx.report(
                        ROUTES,
                        route.id.as_str(),
                        NoticeKind::RouteColorAndTextInsufficientContrast {
                            contrast_ratio: ratio,
                        },
                    );
                }
            }
        }
    }
}

/// `route_desc` must add something to the names
pub struct RouteDescription;

impl ValidationRule for RouteDescription {
    fn name(&self) -> &'static str {
        "W007 - Same name and description for route"
    }

    fn execute(&self, ctx: &RuleContext) {
        for route in ctx.dataset.route_all() {
            let desc = match &route.desc {
                Some(d) => d,
                None => continue,
            };
            let conflicting_field_name = if route.short_name.as_ref() == Some(desc) {
                "route_short_name"
            } else if route.long_name.as_ref() == Some(desc) {
                "route_long_name"
            } else {
                continue;
            };
            ctx.report(
                ROUTES,
                route.id.as_str(),
                NoticeKind::SameNameAndDescriptionForRoute {
                    route_desc: desc.clone(),
                    conflicting_field_name,
                },
            );
        }
    }
}

/// A route needs at least one name
pub struct RouteNamePresence;

impl ValidationRule for RouteNamePresence {
    fn name(&self) -> &'static str {
        "E027 - Missing route short name and long name"
    }

    fn execute(&self, ctx: &RuleContext) {
        for route in ctx
            .dataset
            .route_all()
            .filter(|r| r.short_name.is_none() && r.long_name.is_none())
        {
            ctx.report(
                ROUTES,
                route.id.as_str(),
                NoticeKind::MissingShortAndLongNameForRoute,
            );
        }
    }
}

/// `route_long_name` should not repeat `route_short_name`
pub struct RouteLongName;

impl ValidationRule for RouteLongName {
    fn name(&self) -> &'static str {
        "W008 - Route long name contains short name"
    }

    fn execute(&self, ctx: &RuleContext) {
        for route in ctx.dataset.route_all() {
            let (short, long) = match (&route.short_name, &route.long_name) {
                (Some(s), Some(l)) => (s.to_lowercase(), l.to_lowercase()),
                _ => continue,
            };
            let kind = if long == short {
                NoticeKind::RouteLongNameEqualsShortName
            } else if long.contains(&short) {
                NoticeKind::RouteLongNameContainsShortName
            } else {
                continue;
            };
            ctx.report(ROUTES, route.id.as_str(), kind);
        }
    }
}

/// `agency_id` of the routes
pub struct RouteAgency;

impl ValidationRule for RouteAgency {
    fn name(&self) -> &'static str {
        "E035 - Route agency not found"
    }

    fn execute(&self, ctx: &RuleContext) {
        for route in ctx.dataset.route_all() {
            check_agency_reference(ctx, ROUTES, &route.id, route.agency_id.as_deref());
        }
    }
}

/// Reports every route whose key was already seen, with the first route having that key
fn report_duplicates<K, F, N>(ctx: &RuleContext, key: F, notice: N)
where
    K: std::hash::Hash + Eq,
    F: Fn(&Route) -> Option<K>,
    N: Fn(&Route, &str) -> NoticeKind,
{
    let mut first_ids: HashMap<K, &str> = HashMap::new();
    for route in ctx.dataset.route_all() {
        let k = match key(route) {
            Some(k) => k,
            None => continue,
        };
        match first_ids.get(&k) {
            Some(first_id) => ctx.report(ROUTES, route.id.as_str(), notice(route, first_id)),
            None => {
                first_ids.insert(k, &route.id);
            }
        }
    }
}

/// Names are only compared within an agency when the feed has several agencies
fn agency_scope<'a>(ctx: &RuleContext, route: &'a Route) -> &'a str {
    if ctx.dataset.agency_count() > 1 {
        route.agency_id.as_deref().unwrap_or_default()
    } else {
        ""
    }
}

/// `route_long_name` is unique
pub struct DuplicateRouteLongName;

impl ValidationRule for DuplicateRouteLongName {
    fn name(&self) -> &'static str {
        "W014 - Duplicate route long name"
    }

    fn execute(&self, ctx: &RuleContext) {
        report_duplicates(
            ctx,
            |r| Some((agency_scope(ctx, r).to_owned(), r.long_name.clone()?)),
            |r, first_id| NoticeKind::DuplicateRouteLongName {
                duplicate_long_name: r.long_name.clone().unwrap_or_default(),
                conflicting_route_id: first_id.to_owned(),
            },
        );
    }
}

/// `route_short_name` is unique
pub struct DuplicateRouteShortName;

impl ValidationRule for DuplicateRouteShortName {
    fn name(&self) -> &'static str {
        "W015 - Duplicate route short name"
    }

    fn execute(&self, ctx: &RuleContext) {
        report_duplicates(
            ctx,
            |r| Some((agency_scope(ctx, r).to_owned(), r.short_name.clone()?)),
            |r, first_id| NoticeKind::DuplicateRouteShortName {
                duplicate_short_name: r.short_name.clone().unwrap_or_default(),
                conflicting_route_id: first_id.to_owned(),
            },
        );
    }
}

/// The pair of `route_long_name` and `route_short_name` is unique in the whole feed
pub struct DuplicateRouteNames;

impl ValidationRule for DuplicateRouteNames {
    fn name(&self) -> &'static str {
        "W016 - Duplicate combination of route long and short names"
    }

    fn execute(&self, ctx: &RuleContext) {
        report_duplicates(
            ctx,
            |r| Some((r.long_name.clone()?, r.short_name.clone()?)),
            |r, first_id| NoticeKind::DuplicateRouteLongNameShortNameCombination {
                duplicate_long_name: r.long_name.clone().unwrap_or_default(),
                duplicate_short_name: r.short_name.clone().unwrap_or_default(),
                conflicting_route_id: first_id.to_owned(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::Notice;
    use crate::objects::Agency;
    use crate::repository::DatasetRepository;
    use crate::rules::run_rule;

    fn route(id: &str, short_name: Option<&str>, long_name: Option<&str>) -> Route {
        Route {
            id: id.to_owned(),
            short_name: short_name.map(str::to_owned),
            long_name: long_name.map(str::to_owned),
            ..Default::default()
        }
    }

    fn dataset(routes: Vec<Route>) -> DatasetRepository {
        let mut dataset = DatasetRepository::new();
        for r in routes {
            dataset.add_route(r);
        }
        dataset
    }

    fn codes(notices: &[Notice]) -> Vec<(&'static str, &str)> {
        notices.iter().map(|n| (n.code(), n.entity_id.as_str())).collect()
    }

    #[test]
    fn short_name_length() {
        let dataset = dataset(vec![
            route("r1", Some("123456789012"), None),
            route("r2", Some("1234567890123"), None),
        ]);
        let notices = run_rule(&RouteShortNameLength, &dataset);
        assert_eq!(vec![("W005", "r2")], codes(&notices));
    }

    #[test]
    fn color_contrast() {
        let white = RGB8::new(255, 255, 255);
        let black = RGB8::new(0, 0, 0);
        let dataset = dataset(vec![
            Route {
                color: Some(white),
                text_color: Some(white),
                ..route("same", Some("1"), None)
            },
            Route {
                color: Some(white),
                text_color: Some(black),
                ..route("contrasted", Some("2"), None)
            },
            Route {
                color: Some(white),
                ..route("no_text_color", Some("3"), None)
            },
        ]);
        let notices = run_rule(&RouteColorContrast, &dataset);
        assert_eq!(vec![("E025", "same")], codes(&notices));
        assert_eq!(
            NoticeKind::RouteColorAndTextInsufficientContrast {
                contrast_ratio: 1.0
            },
            notices[0].kind
        );
        assert!(contrast_ratio(white, black) > 4.5);
    }

    #[test]
    fn description_and_names() {
        let dataset = dataset(vec![
            Route {
                desc: Some("Express".to_owned()),
                ..route("r1", Some("1"), Some("Express"))
            },
            Route {
                desc: Some("Goes downtown".to_owned()),
                ..route("r2", Some("2"), Some("Express"))
            },
        ]);
        let notices = run_rule(&RouteDescription, &dataset);
        assert_eq!(vec![("W007", "r1")], codes(&notices));
    }

    #[test]
    fn missing_names() {
        let dataset = dataset(vec![route("r1", None, None), route("r2", None, Some("Long"))]);
        assert_eq!(
            vec![("E027", "r1")],
            codes(&run_rule(&RouteNamePresence, &dataset))
        );
    }

    #[test]
    fn long_name_repeating_short_name() {
        let dataset = dataset(vec![
            route("equal", Some("Blue"), Some("blue")),
            route("contains", Some("10"), Some("10 Downtown")),
            route("different", Some("11"), Some("Uptown")),
        ]);
        let notices = run_rule(&RouteLongName, &dataset);
        assert_eq!(vec![("W008", "contains"), ("W018", "equal")], codes(&notices));
    }

    #[test]
    fn agency_references() {
        let mut dataset = dataset(vec![
            Route {
                agency_id: Some("a1".to_owned()),
                ..route("known", Some("1"), None)
            },
            Route {
                agency_id: Some("a3".to_owned()),
                ..route("unknown", Some("2"), None)
            },
            route("absent", Some("3"), None),
        ]);
        for id in ["a1", "a2"] {
            dataset.add_agency(Agency {
                id: Some(id.to_owned()),
                name: id.to_owned(),
                ..Default::default()
            });
        }
        let notices = run_rule(&RouteAgency, &dataset);
        assert_eq!(vec![("E029", "absent"), ("E035", "unknown")], codes(&notices));
    }

    #[test]
    fn absent_agency_is_fine_with_one_agency() {
        let mut dataset = dataset(vec![route("absent", Some("3"), None)]);
        dataset.add_agency(Agency::default());
        assert!(run_rule(&RouteAgency, &dataset).is_empty());
    }

    #[test]
    fn duplicate_names() {
        let dataset = dataset(vec![
            route("r1", Some("1"), Some("Downtown")),
            route("r2", Some("1"), Some("Downtown")),
            route("r3", Some("2"), Some("Downtown")),
        ]);
        assert_eq!(
            vec![("W014", "r2"), ("W014", "r3")],
            codes(&run_rule(&DuplicateRouteLongName, &dataset))
        );
        assert_eq!(
            vec![("W015", "r2")],
            codes(&run_rule(&DuplicateRouteShortName, &dataset))
        );
        let combination = run_rule(&DuplicateRouteNames, &dataset);
        assert_eq!(vec![("W016", "r2")], codes(&combination));
        assert_eq!(
            NoticeKind::DuplicateRouteLongNameShortNameCombination {
                duplicate_long_name: "Downtown".to_owned(),
                duplicate_short_name: "1".to_owned(),
                conflicting_route_id: "r1".to_owned(),
            },
            combination[0].kind
        );
    }

    #[test]
    fn names_are_scoped_by_agency() {
        let mut dataset = dataset(vec![
            Route {
                agency_id: Some("a1".to_owned()),
                ..route("r1", Some("1"), None)
            },
            Route {
                agency_id: Some("a2".to_owned()),
                ..route("r2", Some("1"), None)
            },
        ]);
        assert_eq!(1, run_rule(&DuplicateRouteShortName, &dataset).len());
        for id in ["a1", "a2"] {
            dataset.add_agency(Agency {
                id: Some(id.to_owned()),
                ..Default::default()
            });
        }
        assert!(run_rule(&DuplicateRouteShortName, &dataset).is_empty());
    }
}
