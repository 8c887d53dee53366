use super::{RuleContext, ValidationRule};
use crate::notice::{NoticeKind, NO_ID};

const AGENCY: &str = "agency.txt";

/// Every agency runs in the same timezone, and they all have an id when there are several
pub struct AgencyTimezone;

impl ValidationRule for AgencyTimezone {
    fn name(&self) -> &'static str {
        "E030 - Inconsistent timezone among agencies"
    }

    fn execute(&self, ctx: &RuleContext) {
        let agencies = ctx.dataset.agency_all();
        if agencies.len() > 1 {
            for _ in agencies.iter().filter(|a| a.id.is_none()) {
                ctx.report(AGENCY, NO_ID, NoticeKind::MissingAgencyId);
            }
        }

        let mut timezones: Vec<String> = vec![];
        for agency in agencies {
            if !timezones.contains(&agency.timezone) {
                timezones.push(agency.timezone.clone());
            }
        }
        if timezones.len() > 1 {
            ctx.report(AGENCY, NO_ID, NoticeKind::InconsistentAgencyTimezone { timezones });
        }
    }
}

/// `agency_lang` agrees with `feed_lang`, unless the feed is multilingual
pub struct AgencyLanguage;

impl ValidationRule for AgencyLanguage {
    fn name(&self) -> &'static str {
        "E055 - Mismatching feed and agency language"
    }

    fn execute(&self, ctx: &RuleContext) {
        let feed_lang = match ctx.dataset.feed_info_all().next() {
            Some(info) => info.lang.as_str(),
            None => return,
        };
        if feed_lang.eq_ignore_ascii_case("mul") {
            return;
        }
        for agency in ctx.dataset.agency_all() {
            if let Some(lang) = &agency.lang {
                if !lang.eq_ignore_ascii_case(feed_lang) {
                    ctx.report(
                        AGENCY,
                        agency.id.as_deref().unwrap_or(NO_ID),
                        NoticeKind::FeedInfoLangAgencyLangMismatch {
                            agency_lang: lang.clone(),
                            feed_lang: feed_lang.to_owned(),
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
    use crate::objects::{Agency, FeedInfo};
    use crate::repository::DatasetRepository;
    use crate::rules::run_rule;

    fn agency(id: Option<&str>, timezone: &str, lang: Option<&str>) -> Agency {
        Agency {
            id: id.map(str::to_owned),
            name: format!("{:?}", id),
            timezone: timezone.to_owned(),
            lang: lang.map(str::to_owned),
            ..Default::default()
        }
    }

    #[test]
    fn timezones_must_agree() {
        let mut dataset = DatasetRepository::new();
        dataset.add_agency(agency(Some("a"), "America/Montreal", None));
        dataset.add_agency(agency(Some("b"), "America/Toronto", None));
        dataset.add_agency(agency(Some("c"), "America/Montreal", None));
        let notices = run_rule(&AgencyTimezone, &dataset);
        assert_eq!(1, notices.len());
        assert_eq!(
            NoticeKind::InconsistentAgencyTimezone {
                timezones: vec!["America/Montreal".to_owned(), "America/Toronto".to_owned()]
            },
            notices[0].kind
        );
    }

    #[test]
    fn several_agencies_need_ids() {
        let mut dataset = DatasetRepository::new();
        dataset.add_agency(agency(None, "America/Montreal", None));
        assert!(run_rule(&AgencyTimezone, &dataset).is_empty());
        dataset.add_agency(agency(Some("b"), "America/Montreal", None));
        let codes: Vec<&str> = run_rule(&AgencyTimezone, &dataset)
            .iter()
            .map(|n| n.code())
            .collect();
        assert_eq!(vec!["E029"], codes);
    }

    #[test]
    fn agency_language_follows_feed_language() {
        let mut dataset = DatasetRepository::new();
        dataset.add_agency(agency(Some("a"), "America/Montreal", Some("FR")));
        dataset.add_agency(agency(Some("b"), "America/Montreal", Some("en")));
        dataset.add_agency(agency(Some("c"), "America/Montreal", None));
        assert!(run_rule(&AgencyLanguage, &dataset).is_empty());

        dataset.add_feed_info(FeedInfo {
            name: "STM".to_owned(),
            lang: "fr".to_owned(),
            ..Default::default()
        });
        let notices = run_rule(&AgencyLanguage, &dataset);
        assert_eq!(1, notices.len());
        assert_eq!("b", notices[0].entity_id);
    }

    #[test]
    fn multilingual_feed() {
        let mut dataset = DatasetRepository::new();
        dataset.add_agency(agency(Some("a"), "America/Montreal", Some("fr")));
        dataset.add_feed_info(FeedInfo {
            name: "STM".to_owned(),
            lang: "mul".to_owned(),
            ..Default::default()
        });
        assert!(run_rule(&AgencyLanguage, &dataset).is_empty());
    }
}
