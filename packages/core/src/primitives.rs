//! Geometric primitives referenced by regulatory relations.
//!
//! Only identity, topology and attributes live here. Primitives refer to
//! each other by id; the [`LaneletMap`](crate::LaneletMap) owns them.

use serde::{Deserialize, Serialize};

use crate::attributes::AttributeMap;

/// Stable identifier shared by all primitives and relations of a map.
pub type Id = i64;

/// A point in the local metric frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicPoint3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl BasicPoint3d {
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A tagged point.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub id: Id,
    pub position: BasicPoint3d,
    pub attributes: AttributeMap,
}

impl Point {
    #[must_use]
    pub fn new(id: Id, position: BasicPoint3d) -> Self {
        Self {
            id,
            position,
            attributes: AttributeMap::new(),
        }
    }
}

/// An ordered sequence of points.
///
/// Traffic lights and signs are linestrings running from their left to
/// their right edge.
#[derive(Debug, Clone, PartialEq)]
pub struct LineString {
    pub id: Id,
    pub points: Vec<Id>,
    pub attributes: AttributeMap,
}

impl LineString {
    #[must_use]
    pub fn new(id: Id, points: Vec<Id>) -> Self {
        Self {
            id,
            points,
            attributes: AttributeMap::new(),
        }
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key, value);
        self
    }
}

/// A closed ring of points. The last point connects back to the first.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub id: Id,
    pub points: Vec<Id>,
    pub attributes: AttributeMap,
}

impl Polygon {
    #[must_use]
    pub fn new(id: Id, points: Vec<Id>) -> Self {
        Self {
            id,
            points,
            attributes: AttributeMap::new(),
        }
    }
}

/// A lane section bounded by a left and a right linestring.
#[derive(Debug, Clone, PartialEq)]
pub struct Lanelet {
    pub id: Id,
    pub left: Id,
    pub right: Id,
    /// Regulatory elements that apply to this lanelet.
    pub regulatory_elements: Vec<Id>,
    pub attributes: AttributeMap,
}

impl Lanelet {
    #[must_use]
    pub fn new(id: Id, left: Id, right: Id) -> Self {
        Self {
            id,
            left,
            right,
            regulatory_elements: Vec::new(),
            attributes: AttributeMap::new(),
        }
    }
}
