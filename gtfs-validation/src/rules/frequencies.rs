use super::{RuleContext, ValidationRule};
use crate::notice::NoticeKind;
use crate::time::{are_periods_overlapping, format_time};

const FREQUENCIES: &str = "frequencies.txt";

/// `end_time` of a frequency is not before its `start_time`
pub struct FrequencyTimes;

impl ValidationRule for FrequencyTimes {
    fn name(&self) -> &'static str {
        "E046 - Frequency start time after end time"
    }

    fn execute(&self, ctx: &RuleContext) {
        for (trip_id, frequencies) in ctx.dataset.frequencies_by_trip() {
            for frequency in frequencies
                .into_iter()
                .filter(|f| f.end_time < f.start_time)
            {
                ctx.report(
                    FREQUENCIES,
                    trip_id,
                    NoticeKind::FrequencyStartTimeAfterEndTime {
                        start_time: format_time(frequency.start_time),
                        end_time: format_time(frequency.end_time),
                    },
                );
            }
        }
    }
}

/// Frequencies of a trip do not overlap. Only the first overlap of each trip is reported
pub struct OverlappingFrequencies;

impl ValidationRule for OverlappingFrequencies {
    fn name(&self) -> &'static str {
        "E053 - Overlapping trip frequencies"
    }

    fn execute(&self, ctx: &RuleContext) {
        for (trip_id, frequencies) in ctx.dataset.frequencies_by_trip() {
            let valid: Vec<_> = frequencies
                .into_iter()
                .filter(|f| f.start_time < f.end_time)
                .collect();
            let overlap = valid.iter().enumerate().find_map(|(i, previous)| {
                valid[i + 1..]
                    .iter()
                    .find(|current| {
                        are_periods_overlapping(
                            previous.start_time,
                            previous.end_time,
                            current.start_time,
                            current.end_time,
                        )
                    })
                    .map(|current| (previous, current))
            });
            if let Some((previous, current)) = overlap {
                ctx.report(
                    FREQUENCIES,
                    trip_id,
                    NoticeKind::OverlappingTripFrequencies {
                        previous_start_time: format_time(previous.start_time),
                        previous_end_time: format_time(previous.end_time),
                        start_time: format_time(current.start_time),
                        end_time: format_time(current.end_time),
                    },
                );
            }
        }
    }
}
