//! The map: one id-ordered layer per primitive kind.

use std::collections::BTreeMap;

use crate::error::{CoreError, Result};
use crate::primitives::{Id, Lanelet, LineString, Point, Polygon};
use crate::regulatory::RegulatoryElement;
use crate::roles::{RoleStore, RuleParameter};

/// Primitives of one kind, keyed by id.
#[derive(Debug)]
pub struct Layer<T> {
    items: BTreeMap<Id, T>,
}

impl<T> Layer<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }

    /// Insert an item, returning the one previously stored under `id`.
    pub fn insert(&mut self, id: Id, item: T) -> Option<T> {
        self.items.insert(id, item)
    }

    #[must_use]
    pub fn get(&self, id: Id) -> Option<&T> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: Id) -> Option<&mut T> {
        self.items.get_mut(&id)
    }

    pub fn remove(&mut self, id: Id) -> Option<T> {
        self.items.remove(&id)
    }

    #[must_use]
    pub fn contains(&self, id: Id) -> bool {
        self.items.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in id order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.items.keys().copied()
    }
}

impl<T> Default for Layer<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A road network map.
///
/// Relations reference primitives by id only; the map is the single owner.
/// The map does not check references on insert, use
/// [`check_references`](Self::check_references) for that.
#[derive(Debug, Default)]
pub struct LaneletMap {
    pub points: Layer<Point>,
    pub line_strings: Layer<LineString>,
    pub polygons: Layer<Polygon>,
    pub lanelets: Layer<Lanelet>,
    pub regulatory_elements: Layer<RegulatoryElement>,
}

impl LaneletMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, point: Point) {
        self.points.insert(point.id, point);
    }

    pub fn add_line_string(&mut self, line_string: LineString) {
        self.line_strings.insert(line_string.id, line_string);
    }

    pub fn add_polygon(&mut self, polygon: Polygon) {
        self.polygons.insert(polygon.id, polygon);
    }

    pub fn add_lanelet(&mut self, lanelet: Lanelet) {
        self.lanelets.insert(lanelet.id, lanelet);
    }

    pub fn add_regulatory_element(&mut self, element: impl Into<RegulatoryElement>) {
        let element = element.into();
        self.regulatory_elements.insert(element.id(), element);
    }

    /// Whether the referenced primitive is in the map.
    #[must_use]
    pub fn contains(&self, param: &RuleParameter) -> bool {
        match *param {
            RuleParameter::Point(id) => self.points.contains(id),
            RuleParameter::LineString(id) => self.line_strings.contains(id),
            RuleParameter::Polygon(id) => self.polygons.contains(id),
            RuleParameter::Lanelet(id) => self.lanelets.contains(id),
            RuleParameter::RegulatoryElement(id) => self.regulatory_elements.contains(id),
        }
    }

    /// Check that every reference of a relation resolves in this map.
    ///
    /// # Errors
    /// `UnresolvedReference` naming the first dangling reference.
    pub fn check_references(&self, data: &RoleStore) -> Result<()> {
        match data.parameters().find(|(_, p)| !self.contains(p)) {
            Some((role, member)) => Err(CoreError::UnresolvedReference {
                id: data.id(),
                role: role.to_string(),
                member: *member,
            }),
            None => Ok(()),
        }
    }

    /// Total number of primitives and relations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
            + self.line_strings.len()
            + self.polygons.len()
            + self.lanelets.len()
            + self.regulatory_elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
