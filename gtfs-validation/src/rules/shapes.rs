use super::{RuleContext, ValidationRule};
use crate::notice::NoticeKind;

/// `shape_dist_traveled` never decreases along a shape
pub struct DecreasingShapeDistance;

impl ValidationRule for DecreasingShapeDistance {
    fn name(&self) -> &'static str {
        "E043 - Decreasing shape distance"
    }

    fn execute(&self, ctx: &RuleContext) {
        for (shape_id, points) in ctx.dataset.shapes() {
            let mut previous: Option<(u32, f64)> = None;
            for point in points {
                let distance = match point.dist_traveled {
                    Some(distance) => distance,
                    None => continue,
                };
                if let Some((previous_sequence, previous_distance)) = previous {
                    if distance < previous_distance {
                        ctx.report(
                            "shapes.txt",
                            shape_id,
                            NoticeKind::DecreasingShapeDistance {
                                shape_pt_sequence: point.sequence,
                                shape_dist_traveled: distance,
                                previous_shape_pt_sequence: previous_sequence,
                                previous_shape_dist_traveled: previous_distance,
                            },
                        );
                    }
                }
                previous = Some((point.sequence, distance));
            }
        }
    }
}
