//! Geodesic helpers over WGS84 `Point`s (x = longitude, y = latitude)

use geo::{BoundingRect, Coord, HaversineBearing, HaversineDistance, Intersects, LineString, Point, Rect};

/// Meters per degree of latitude
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Great-circle distance in meters
pub fn distance_m(a: Point, b: Point) -> f64 {
    a.haversine_distance(&b)
}

/// Initial great-circle bearing from `a` to `b`, degrees in [0, 360)
pub fn bearing_deg(a: Point, b: Point) -> f64 {
    normalize_deg(a.haversine_bearing(b))
}

/// Wrap any angle into [0, 360)
pub fn normalize_deg(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Smallest absolute angle between two headings, in [0, 180]
pub fn angular_diff_deg(a: f64, b: f64) -> f64 {
    ((b - a + 180.0).rem_euclid(360.0) - 180.0).abs()
}

/// Mean of headings through the sum of unit vectors.
///
/// `None` when empty or when the vectors cancel out.
pub fn circular_mean_deg<I>(headings: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut count = 0;
    let (mut sin, mut cos) = (0.0, 0.0);
    for h in headings {
        let rad = h.to_radians();
        sin += rad.sin();
        cos += rad.cos();
        count += 1;
    }

    if count == 0 || (sin.abs() < 1e-12 && cos.abs() < 1e-12) {
        return None;
    }

    Some(normalize_deg(sin.atan2(cos).to_degrees()))
}

/// Distance in meters from `p` to the segment `a`-`b`.
///
/// The projection runs on a locally flat plane (longitude scaled by the
/// cosine of the segment's mean latitude), clamped onto the segment; the
/// distance to the projected point is great-circle.
pub fn point_to_segment_m(p: Point, a: Point, b: Point) -> f64 {
    let cos_lat = ((a.y() + b.y()) / 2.0).to_radians().cos();

    let dx = (b.x() - a.x()) * cos_lat;
    let dy = b.y() - a.y();
    let px = (p.x() - a.x()) * cos_lat;
    let py = p.y() - a.y();

    let seg_len_sq = dx * dx + dy * dy;
    let t = if seg_len_sq > 0.0 {
        ((px * dx + py * dy) / seg_len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let closest = Point::new(a.x() + t * (b.x() - a.x()), a.y() + t * (b.y() - a.y()));

    distance_m(p, closest)
}

/// Bounding box of `points` expanded on each side by `pad` times its
/// extent, and by at least `min_margin_m` meters.
pub fn padded_bounds(points: &[Point], pad: f64, min_margin_m: f64) -> Option<Rect> {
    let line: LineString = points.iter().copied().collect();
    let rect = line.bounding_rect()?;

    let (min, max) = (rect.min(), rect.max());
    let widest_lat = min.y.abs().max(max.y.abs()).min(89.0);
    let margin_lat = min_margin_m / METERS_PER_DEGREE;
    let margin_lon = min_margin_m / (METERS_PER_DEGREE * widest_lat.to_radians().cos());

    let pad_lat = (rect.height() * pad).max(margin_lat);
    let pad_lon = (rect.width() * pad).max(margin_lon);

    Some(Rect::new(
        Coord {
            x: min.x - pad_lon,
            y: min.y - pad_lat,
        },
        Coord {
            x: max.x + pad_lon,
            y: max.y + pad_lat,
        },
    ))
}

/// Inclusive containment, points on the border count as inside
pub fn bounds_contain(rect: &Rect, p: Point) -> bool {
    rect.intersects(&p.0)
}
