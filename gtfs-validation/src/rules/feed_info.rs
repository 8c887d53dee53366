use super::{RuleContext, ValidationRule};
use crate::exec_params::VALIDATION_DATE;
use crate::notice::NoticeKind;
use crate::objects::FeedInfo;
use crate::value_helpers::format_date;
use chrono::{Days, NaiveDate};
use log::warn;

const FEED_INFO: &str = "feed_info.txt";

fn report(ctx: &RuleContext, feed_info: &FeedInfo, kind: NoticeKind) {
    ctx.report(FEED_INFO, feed_info.name.as_str(), kind)
}

/// The day the feed is validated for, and that day shifted by `days`
fn today_plus(ctx: &RuleContext, days: u64) -> Option<(NaiveDate, NaiveDate)> {
    let today = match ctx.exec_params.get_date(VALIDATION_DATE) {
        Ok(today) => today,
        Err(e) => {
            warn!("Cannot check the feed expiration: {}", e);
            return None;
        }
    };
    Some((today, today.checked_add_days(Days::new(days))?))
}

/// `feed_start_date` is not after `feed_end_date`
pub struct FeedInfoDates;

impl ValidationRule for FeedInfoDates {
    fn name(&self) -> &'static str {
        "E037 - Feed start date after end date"
    }

    fn execute(&self, ctx: &RuleContext) {
        for feed_info in ctx.dataset.feed_info_all() {
            if let (Some(start), Some(end)) = (feed_info.start_date, feed_info.end_date) {
                if end < start {
                    report(
                        ctx,
                        feed_info,
                        NoticeKind::FeedInfoStartDateAfterEndDate {
                            start_date: format_date(&start),
                            end_date: format_date(&end),
                        },
                    );
                }
            }
        }
    }
}

/// The feed is valid for at least a week after the validation date
pub struct FeedExpiration7Days;

impl ValidationRule for FeedExpiration7Days {
    fn name(&self) -> &'static str {
        "E041 - Feed expires in less than 7 days"
    }

    fn execute(&self, ctx: &RuleContext) {
        let end_dates: Vec<_> = ctx
            .dataset
            .feed_info_all()
            .filter_map(|f| Some((f, f.end_date?)))
            .collect();
        if end_dates.is_empty() {
            return;
        }
        let (today, in_7_days) = match today_plus(ctx, 7) {
            Some(dates) => dates,
            None => return,
        };
        for (feed_info, end) in end_dates {
            if end < in_7_days {
                report(
                    ctx,
                    feed_info,
                    NoticeKind::FeedExpiresInLessThan7Days {
                        feed_end_date: format_date(&end),
                        current_date: format_date(&today),
                    },
                );
            }
        }
    }
}

/// The feed is valid for at least a month after the validation date
///
/// Feeds expiring within a week are left to [FeedExpiration7Days]
pub struct FeedExpiration30Days;

impl ValidationRule for FeedExpiration30Days {
    fn name(&self) -> &'static str {
        "W012 - Feed expires in less than 30 days"
    }

    fn execute(&self, ctx: &RuleContext) {
        let end_dates: Vec<_> = ctx
            .dataset
            .feed_info_all()
            .filter_map(|f| Some((f, f.end_date?)))
            .collect();
        if end_dates.is_empty() {
            return;
        }
        let (today, in_7_days, in_30_days) = match (today_plus(ctx, 7), today_plus(ctx, 30)) {
            (Some((today, in_7_days)), Some((_, in_30_days))) => (today, in_7_days, in_30_days),
            _ => return,
        };
        for (feed_info, end) in end_dates {
            if end > in_7_days && end < in_30_days {
                report(
                    ctx,
                    feed_info,
                    NoticeKind::FeedExpiresInLessThan30Days {
                        feed_end_date: format_date(&end),
                        current_date: format_date(&today),
                    },
                );
            }
        }
    }
}

/// `feed_start_date` and `feed_end_date` are given
pub struct MissingFeedDates;

impl ValidationRule for MissingFeedDates {
    fn name(&self) -> &'static str {
        "W010 - Missing feed dates"
    }

    fn execute(&self, ctx: &RuleContext) {
        for feed_info in ctx.dataset.feed_info_all() {
            if feed_info.end_date.is_none() {
                report(ctx, feed_info, NoticeKind::MissingFeedEndDate);
            }
            if feed_info.start_date.is_none() {
                report(ctx, feed_info, NoticeKind::MissingFeedStartDate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec_params::ExecParamRepository;
    use crate::repository::DatasetRepository;
    use crate::rules::{run_rule, run_rule_with};

    fn feed_info(start: Option<&str>, end: Option<&str>) -> DatasetRepository {
        let mut dataset = DatasetRepository::new();
        dataset.add_feed_info(FeedInfo {
            name: "STM".to_owned(),
            url: "https://www.stm.info".to_owned(),
            lang: "fr".to_owned(),
            start_date: start.and_then(crate::value_helpers::parse_date),
            end_date: end.and_then(crate::value_helpers::parse_date),
            ..Default::default()
        });
        dataset
    }

    fn on(date: &str) -> ExecParamRepository {
        let mut params = ExecParamRepository::new();
        params.add(VALIDATION_DATE, date).unwrap();
        params
    }

    fn codes_on(date: &str, end: &str) -> Vec<&'static str> {
        let dataset = feed_info(Some("20240101"), Some(end));
        let params = on(date);
        let mut codes = vec![];
        for rule in [&FeedExpiration7Days as &dyn ValidationRule, &FeedExpiration30Days] {
            codes.extend(run_rule_with(rule, &dataset, &params).iter().map(|n| n.code()));
        }
        codes
    }

    #[test]
    fn start_after_end() {
        let dataset = feed_info(Some("20241231"), Some("20240101"));
        let notices = run_rule(&FeedInfoDates, &dataset);
        assert_eq!(1, notices.len());
        assert_eq!("STM", notices[0].entity_id);
        assert_eq!(
            NoticeKind::FeedInfoStartDateAfterEndDate {
                start_date: "20241231".to_owned(),
                end_date: "20240101".to_owned(),
            },
            notices[0].kind
        );
        assert!(run_rule(&FeedInfoDates, &feed_info(Some("20240101"), Some("20240101"))).is_empty());
    }

    #[test]
    fn expiration() {
        assert_eq!(vec!["E041"], codes_on("20240601", "20240603"));
        assert_eq!(vec!["E041"], codes_on("20240601", "20240607"));
        // exactly a week: neither rule
        assert!(codes_on("20240601", "20240608").is_empty());
        assert_eq!(vec!["W012"], codes_on("20240601", "20240609"));
        assert_eq!(vec!["W012"], codes_on("20240601", "20240630"));
        assert!(codes_on("20240601", "20240701").is_empty());
        assert!(codes_on("20240601", "20241231").is_empty());
    }

    #[test]
    fn expiration_notice_values() {
        let notices = run_rule_with(
            &FeedExpiration7Days,
            &feed_info(None, Some("20240603")),
            &on("20240601"),
        );
        assert_eq!(
            NoticeKind::FeedExpiresInLessThan7Days {
                feed_end_date: "20240603".to_owned(),
                current_date: "20240601".to_owned(),
            },
            notices[0].kind
        );
    }

    #[test]
    fn invalid_validation_date() {
        let dataset = feed_info(None, Some("20240603"));
        let mut params = on("20240601");
        assert!(params.add(VALIDATION_DATE, "tomorrow").is_err());
        let codes: Vec<&str> = run_rule_with(&FeedExpiration7Days, &dataset, &params)
            .iter()
            .map(|n| n.code())
            .collect();
        assert_eq!(vec!["E041"], codes);
    }

    #[test]
    fn missing_dates() {
        let codes: Vec<&str> = run_rule(&MissingFeedDates, &feed_info(None, None))
            .iter()
            .map(|n| n.code())
            .collect();
        assert_eq!(vec!["W010", "W011"], codes);
        assert!(run_rule(&MissingFeedDates, &feed_info(Some("20240101"), Some("20241231"))).is_empty());
    }
}
