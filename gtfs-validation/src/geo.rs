//! Geographic helpers: great-circle distances and the distance from a point to a polyline.
use geo_types::{Coord, Line};
use rstar::primitives::{GeomWithData, Line as RLine};
use rstar::{PointDistance, RTree};

const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Great-circle distance in metres. `x` is the longitude and `y` the latitude, in degrees
pub fn distance_meters(a: Coord, b: Coord) -> f64 {
    let (lat1, lat2) = (a.y.to_radians(), b.y.to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (b.x - a.x).to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Sum of the great-circle distances between consecutive points, in kilometres
pub fn polyline_length_km(points: &[Coord]) -> f64 {
    points
        .windows(2)
        .map(|w| distance_meters(w[0], w[1]))
        .sum::<f64>()
        / 1000.0
}

/// Segments of a polyline, in metres around a local origin, indexed for nearest lookups
pub struct ShapeIndex {
    origin: Coord,
    meters_per_degree_lon: f64,
    tree: RTree<GeomWithData<RLine<[f64; 2]>, usize>>,
}

const METERS_PER_DEGREE_LAT: f64 = EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0;

impl ShapeIndex {
    /// Indexes the polyline. `None` when there is no point
    pub fn new(points: &[Coord]) -> Option<Self> {
        let origin = *points.first()?;
        let meters_per_degree_lon = METERS_PER_DEGREE_LAT * origin.y.to_radians().cos();
        let mut index = ShapeIndex {
            origin,
            meters_per_degree_lon,
            tree: RTree::new(),
        };

        let projected: Vec<[f64; 2]> = points.iter().map(|p| index.project(*p)).collect();
        let segments: Vec<_> = if projected.len() == 1 {
            vec![GeomWithData::new(RLine::new(projected[0], projected[0]), 0)]
        } else {
            projected
                .windows(2)
                .enumerate()
                .map(|(i, w)| GeomWithData::new(geo_line_to_rstar_line(Line::new(w[0], w[1])), i))
                .collect()
        };
        index.tree = RTree::bulk_load(segments);
        Some(index)
    }

    fn project(&self, p: Coord) -> [f64; 2] {
        [
            (p.x - self.origin.x) * self.meters_per_degree_lon,
            (p.y - self.origin.y) * METERS_PER_DEGREE_LAT,
        ]
    }

    /// Distance in metres from the point to the closest segment of the polyline
    pub fn distance_to_shape_meters(&self, point: Coord) -> f64 {
        let p = self.project(point);
        self.tree
            .nearest_neighbor(&p)
            .map(|segment| segment.distance_2(&p).sqrt())
            .unwrap_or(f64::INFINITY)
    }
}

fn geo_line_to_rstar_line(l: Line) -> RLine<[f64; 2]> {
    RLine::new(l.start.into(), l.end.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::coord;

    #[test]
    fn distance_between_montreal_and_quebec() {
        let montreal = coord! { x: -73.5673, y: 45.5017 };
        let quebec = coord! { x: -71.2080, y: 46.8139 };
        let d = distance_meters(montreal, quebec);
        assert!((d - 233_000.0).abs() < 2_000.0, "{}", d);
        assert_eq!(0.0, distance_meters(montreal, montreal));
    }

    #[test]
    fn polyline_length() {
        let points = [
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 0.0, y: 1.0 },
            coord! { x: 0.0, y: 2.0 },
        ];
        let km = polyline_length_km(&points);
        assert!((km - 222.39).abs() < 0.1, "{}", km);
        assert_eq!(0.0, polyline_length_km(&points[..1]));
    }

    #[test]
    fn point_near_and_far_from_shape() {
        let shape = [
            coord! { x: -73.60, y: 45.50 },
            coord! { x: -73.58, y: 45.50 },
            coord! { x: -73.58, y: 45.52 },
        ];
        let index = ShapeIndex::new(&shape).unwrap();
        // on the first segment
        assert!(index.distance_to_shape_meters(coord! { x: -73.59, y: 45.50 }) < 1.0);
        // roughly 111 m north of the first segment
        let d = index.distance_to_shape_meters(coord! { x: -73.59, y: 45.501 });
        assert!((d - 111.0).abs() < 2.0, "{}", d);
        assert!(index.distance_to_shape_meters(coord! { x: -73.70, y: 45.50 }) > 7_000.0);
        assert!(ShapeIndex::new(&[]).is_none());
    }
}
