use super::{RuleContext, ValidationRule};
use crate::exec_params::{TRANSFER_MIN_TRANSFER_TIME_RANGE_MAX, TRANSFER_MIN_TRANSFER_TIME_RANGE_MIN};
use crate::notice::NoticeKind;
use crate::value_helpers::is_out_of_range;
use log::warn;

const TRANSFERS: &str = "transfers.txt";

fn transfer_id(from_stop_id: &str, to_stop_id: &str) -> String {
    format!("{}-{}", from_stop_id, to_stop_id)
}

/// `min_transfer_time` lies within the configured bounds
pub struct TransferTime;

impl ValidationRule for TransferTime {
    fn name(&self) -> &'static str {
        "W009 - Suspicious transfer time"
    }

    fn execute(&self, ctx: &RuleContext) {
        let params = ctx.exec_params;
        let bounds = (
            params.get_i64(TRANSFER_MIN_TRANSFER_TIME_RANGE_MIN),
            params.get_i64(TRANSFER_MIN_TRANSFER_TIME_RANGE_MAX),
        );
        let (range_min, range_max) = match bounds {
            (Ok(min), Ok(max)) => (min, max),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Cannot check the transfer times: {}", e);
                return;
            }
        };

        for transfer in ctx.dataset.transfer_all() {
            if !is_out_of_range(transfer.min_transfer_time, range_min, range_max) {
                continue;
            }
            if let Some(actual_value) = transfer.min_transfer_time {
                ctx.report(
                    TRANSFERS,
                    transfer_id(&transfer.from_stop_id, &transfer.to_stop_id),
                    NoticeKind::SuspiciousMinTransferTime {
                        range_min,
                        range_max,
                        actual_value,
                    },
                );
            }
        }
    }
}

/// Both stops of a transfer exist
pub struct TransferStops;

impl ValidationRule for TransferStops {
    fn name(&self) -> &'static str {
        "E039 - Transfer stop not found"
    }

    fn execute(&self, ctx: &RuleContext) {
        for transfer in ctx.dataset.transfer_all() {
            let fields = [
                ("from_stop_id", &transfer.from_stop_id),
                ("to_stop_id", &transfer.to_stop_id),
            ];
            for (field_name, stop_id) in fields {
                if ctx.dataset.stop_by_id(stop_id).is_none() {
                    ctx.report(
                        TRANSFERS,
                        transfer_id(&transfer.from_stop_id, &transfer.to_stop_id),
                        NoticeKind::StopIdNotFound {
                            field_name,
                            unknown_stop_id: stop_id.clone(),
                        },
                    );
                }
            }
        }
    }
}
