//! Projection between geodetic and local metric coordinates.
//!
//! Format handlers receive a [`Projector`] and never look inside it. The
//! spherical mercator projector is the conventional default.

use std::f64::consts::PI;

use crate::primitives::BasicPoint3d;

/// Mean equatorial earth radius in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// A geodetic position: degrees and meters above the ellipsoid.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GpsPoint {
    pub lat: f64,
    pub lon: f64,
    pub ele: f64,
}

impl GpsPoint {
    #[must_use]
    pub fn new(lat: f64, lon: f64, ele: f64) -> Self {
        Self { lat, lon, ele }
    }
}

/// Geodetic anchor of the local frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Origin {
    pub position: GpsPoint,
}

impl Origin {
    #[must_use]
    pub fn new(position: GpsPoint) -> Self {
        Self { position }
    }
}

/// Converts between geodetic and local coordinates.
pub trait Projector: Send + Sync {
    fn forward(&self, gps: GpsPoint) -> BasicPoint3d;

    fn reverse(&self, local: BasicPoint3d) -> GpsPoint;
}

/// Spherical mercator, scaled at and centered on the origin.
#[derive(Debug, Clone, Copy)]
pub struct SphericalMercatorProjector {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl SphericalMercatorProjector {
    #[must_use]
    pub fn new(origin: Origin) -> Self {
        let scale = (origin.position.lat * PI / 180.0).cos();
        let offset_x = scale * mercator_x(origin.position.lon);
        let offset_y = scale * mercator_y(origin.position.lat);
        Self {
            scale,
            offset_x,
            offset_y,
        }
    }
}

impl Default for SphericalMercatorProjector {
    fn default() -> Self {
        Self::new(Origin::default())
    }
}

impl Projector for SphericalMercatorProjector {
    fn forward(&self, gps: GpsPoint) -> BasicPoint3d {
        BasicPoint3d::new(
            self.scale * mercator_x(gps.lon) - self.offset_x,
            self.scale * mercator_y(gps.lat) - self.offset_y,
            gps.ele,
        )
    }

    fn reverse(&self, local: BasicPoint3d) -> GpsPoint {
        let x = (local.x + self.offset_x) / self.scale;
        let y = (local.y + self.offset_y) / self.scale;
        GpsPoint::new(
            360.0 * (y / EARTH_RADIUS).exp().atan() / PI - 90.0,
            x * 180.0 / (PI * EARTH_RADIUS),
            local.z,
        )
    }
}

fn mercator_x(lon: f64) -> f64 {
    EARTH_RADIUS * lon * PI / 180.0
}

fn mercator_y(lat: f64) -> f64 {
    EARTH_RADIUS * ((90.0 + lat) * PI / 360.0).tan().ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_zero() {
        let origin = GpsPoint::new(49.0, 8.4, 0.0);
        let projector = SphericalMercatorProjector::new(Origin::new(origin));
        let local = projector.forward(origin);
        assert!(local.x.abs() < 1e-6);
        assert!(local.y.abs() < 1e-6);
    }

    #[test]
    fn test_round_trip() {
        let projector = SphericalMercatorProjector::new(Origin::new(GpsPoint::new(49.0, 8.4, 0.0)));
        let gps = GpsPoint::new(49.001, 8.402, 115.5);
        let back = projector.reverse(projector.forward(gps));
        assert!((back.lat - gps.lat).abs() < 1e-9);
        assert!((back.lon - gps.lon).abs() < 1e-9);
        assert_eq!(back.ele, 115.5);
    }

    #[test]
    fn test_local_distance_is_metric() {
        let projector = SphericalMercatorProjector::new(Origin::new(GpsPoint::new(49.0, 8.4, 0.0)));
        // One thousandth of a degree of latitude is about 111 m
        let local = projector.forward(GpsPoint::new(49.001, 8.4, 0.0));
        assert!((local.y - 111.2).abs() < 1.0, "got {}", local.y);
    }
}
