use geo::{Coord, Geometry, LineString, MapCoords, Polygon};
use std::f64::consts::FRAC_PI_4;
use std::fmt::Write;

/// Web Mercator latitude limit in degrees.
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorProjection {
    pub scale: f64,
    pub translate: [f64; 2],
}

impl MercatorProjection {
    /// Centered horizontally, with the equator two thirds of the way down.
    pub fn for_viewport(scale: f64, width: f64, height: f64) -> Self {
        Self {
            scale,
            translate: [width / 2.0, height / 1.5],
        }
    }

    /// Longitude/latitude in degrees to screen pixels (y grows downwards).
    pub fn project(&self, lon: f64, lat: f64) -> Coord<f64> {
        let lambda = lon.to_radians();
        let phi = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let y = (FRAC_PI_4 + phi / 2.0).tan().ln();
        Coord {
            x: self.translate[0] + self.scale * lambda,
            y: self.translate[1] - self.scale * y,
        }
    }

    pub fn project_geometry(&self, geometry: &Geometry<f64>) -> Geometry<f64> {
        geometry.map_coords(|c| self.project(c.x, c.y))
    }
}

/// SVG path data for a geometry, projected. Points are not drawn.
pub fn path_data(geometry: &Geometry<f64>, projection: &MercatorProjection) -> String {
    let mut d = String::new();
    write_geometry(&mut d, &projection.project_geometry(geometry));
    d
}

fn write_geometry(d: &mut String, geometry: &Geometry<f64>) {
    match geometry {
        Geometry::Polygon(p) => write_polygon(d, p),
        Geometry::MultiPolygon(mp) => mp.iter().for_each(|p| write_polygon(d, p)),
        Geometry::LineString(ls) => write_line(d, ls, false),
        Geometry::MultiLineString(mls) => mls.iter().for_each(|ls| write_line(d, ls, false)),
        Geometry::Rect(r) => write_polygon(d, &r.to_polygon()),
        Geometry::Triangle(t) => write_polygon(d, &t.to_polygon()),
        Geometry::Line(l) => write_line(d, &LineString::from(vec![l.start, l.end]), false),
        Geometry::GeometryCollection(gc) => gc.iter().for_each(|g| write_geometry(d, g)),
        Geometry::Point(_) | Geometry::MultiPoint(_) => {}
    }
}

fn write_polygon(d: &mut String, polygon: &Polygon<f64>) {
    write_line(d, polygon.exterior(), true);
    for ring in polygon.interiors() {
        write_line(d, ring, true);
    }
}

fn write_line(d: &mut String, line: &LineString<f64>, closed: bool) {
    let mut coords: &[Coord<f64>] = &line.0;
    // Closed rings repeat their first point; "Z" already returns there.
    if closed && coords.len() > 1 && coords.first() == coords.last() {
        coords = &coords[..coords.len() - 1];
    }
    if coords.is_empty() {
        return;
    }
    for (i, c) in coords.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{}{},{}", cmd, round1(c.x), round1(c.y));
    }
    if closed {
        d.push('Z');
    }
}

fn round1(v: f64) -> f64 {
    let r = (v * 10.0).round() / 10.0;
    if r == 0.0 {
        0.0
    } else {
        r
    }
}
