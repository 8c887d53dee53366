use super::{RuleContext, ValidationRule};
use crate::notice::NoticeKind;
use crate::value_helpers::format_date;

/// `end_date` of a calendar is not before its `start_date`
pub struct CalendarDates;

impl ValidationRule for CalendarDates {
    fn name(&self) -> &'static str {
        "E032 - Calendar end date before start date"
    }

    fn execute(&self, ctx: &RuleContext) {
        for calendar in ctx
            .dataset
            .calendar_all()
            .filter(|c| c.end_date < c.start_date)
        {
            ctx.report(
                "calendar.txt",
                calendar.id.as_str(),
                NoticeKind::CalendarEndDateBeforeStartDate {
                    start_date: format_date(&calendar.start_date),
                    end_date: format_date(&calendar.end_date),
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::Calendar;
    use crate::repository::DatasetRepository;
    use crate::rules::run_rule;
    use chrono::NaiveDate;

    fn calendar(id: &str, start: (i32, u32, u32), end: (i32, u32, u32)) -> Calendar {
        Calendar {
            id: id.to_owned(),
            monday: true,
            tuesday: true,
            wednesday: true,
            thursday: true,
            friday: true,
            saturday: false,
            sunday: false,
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        }
    }

    #[test]
    fn end_before_start() {
        let mut dataset = DatasetRepository::new();
        dataset.add_calendar(calendar("ok", (2024, 1, 1), (2024, 12, 31)));
        dataset.add_calendar(calendar("one_day", (2024, 1, 1), (2024, 1, 1)));
        dataset.add_calendar(calendar("reversed", (2024, 12, 31), (2024, 1, 1)));
        let notices = run_rule(&CalendarDates, &dataset);
        assert_eq!(1, notices.len());
        assert_eq!("reversed", notices[0].entity_id);
        assert_eq!(
            NoticeKind::CalendarEndDateBeforeStartDate {
                start_date: "20241231".to_owned(),
                end_date: "20240101".to_owned(),
            },
            notices[0].kind
        );
    }
}
