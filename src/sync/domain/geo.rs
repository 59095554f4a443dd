// Geographic value types: points, extents and viewports.

use serde::{Deserialize, Serialize};

/// Web Mercator latitude limit used by the map view.
const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// Pixel size of one tile at zoom 0 (vector tiles).
const TILE_SIZE: f64 = 512.0;

/// A longitude/latitude pair in degrees.
///
/// Serialized as a `[lng, lat]` array, which is how the data endpoints
/// encode coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(p: LngLat) -> Self {
        [p.lng, p.lat]
    }
}

/// Axis-aligned geographic rectangle, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Zero-area extent around a single point. Grown with [`Bounds::extend`].
    pub fn from_point(p: LngLat) -> Self {
        Self::new(p.lng, p.lat, p.lng, p.lat)
    }

    pub fn north_west(&self) -> LngLat {
        LngLat::new(self.west, self.north)
    }

    pub fn south_east(&self) -> LngLat {
        LngLat::new(self.east, self.south)
    }

    /// True for extents with no area (or non-finite edges).
    pub fn is_degenerate(&self) -> bool {
        let finite = [self.west, self.south, self.east, self.north]
            .iter()
            .all(|v| v.is_finite());

        !finite || self.east <= self.west || self.north <= self.south
    }

    /// Inclusive point containment.
    pub fn contains(&self, p: LngLat) -> bool {
        p.lng >= self.west && p.lng <= self.east && p.lat >= self.south && p.lat <= self.north
    }

    /// Corner containment: both the north-west and south-east corners of
    /// `other` lie inside `self`.
    pub fn covers(&self, other: &Bounds) -> bool {
        self.contains(other.north_west()) && self.contains(other.south_east())
    }

    pub fn extend(&mut self, p: LngLat) {
        self.west = self.west.min(p.lng);
        self.south = self.south.min(p.lat);
        self.east = self.east.max(p.lng);
        self.north = self.north.max(p.lat);
    }

    /// Bounding-box query parameters understood by the data endpoints.
    pub fn query_pairs(&self) -> [(&'static str, f64); 4] {
        [
            ("ymax", self.north),
            ("xmax", self.east),
            ("ymin", self.south),
            ("xmin", self.west),
        ]
    }
}

/// Smallest extent holding every point, or `None` when there are none.
pub fn extent<I>(points: I) -> Option<Bounds>
where
    I: IntoIterator<Item = LngLat>,
{
    let mut points = points.into_iter();
    let mut bounds = Bounds::from_point(points.next()?);
    for p in points {
        bounds.extend(p);
    }
    Some(bounds)
}

/// The visible extent of the map plus its zoom level at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub bounds: Bounds,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(bounds: Bounds, zoom: f64) -> Self {
        Self { bounds, zoom }
    }

    /// Extent of a `width` x `height` pixel map centred on `center` at `zoom`,
    /// using the Web Mercator projection.
    pub fn around(center: LngLat, zoom: f64, width: u32, height: u32) -> Self {
        let world = TILE_SIZE * 2f64.powf(zoom);
        let cx = (center.lng + 180.0) / 360.0 * world;
        let cy = lat_to_y(center.lat) * world;

        let half_w = f64::from(width) / 2.0;
        let half_h = f64::from(height) / 2.0;

        let west = (cx - half_w) / world * 360.0 - 180.0;
        let east = (cx + half_w) / world * 360.0 - 180.0;
        let north = y_to_lat((cy - half_h) / world);
        let south = y_to_lat((cy + half_h) / world);

        Self::new(Bounds::new(west, south, east, north), zoom)
    }

    /// Map centre: the midpoint of the extent in projected space, so that
    /// `around` gives back the same extent for it.
    pub fn center(&self) -> LngLat {
        let b = &self.bounds;
        let y = (lat_to_y(b.north) + lat_to_y(b.south)) / 2.0;
        LngLat::new((b.west + b.east) / 2.0, y_to_lat(y))
    }
}

/// Latitude to normalised Mercator y (0 at the north edge, 1 at the south).
fn lat_to_y(lat: f64) -> f64 {
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0
}

fn y_to_lat(y: f64) -> f64 {
    let n = std::f64::consts::PI * (1.0 - 2.0 * y);
    n.sinh().atan().to_degrees()
}
