//! Generic relation data: named roles holding ordered primitive references.

use std::collections::BTreeMap;
use std::fmt;

use crate::attributes::AttributeMap;
use crate::config::{ATTR_SUBTYPE, ATTR_TYPE, REGULATORY_ELEMENT};
use crate::error::{CoreError, Result};
use crate::primitives::Id;

/// Non-owning reference from a role to a primitive in the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleParameter {
    Point(Id),
    LineString(Id),
    Polygon(Id),
    Lanelet(Id),
    RegulatoryElement(Id),
}

impl RuleParameter {
    /// Id of the referenced primitive.
    #[must_use]
    pub fn id(&self) -> Id {
        match *self {
            Self::Point(id)
            | Self::LineString(id)
            | Self::Polygon(id)
            | Self::Lanelet(id)
            | Self::RegulatoryElement(id) => id,
        }
    }

    /// Human-readable kind, as used in messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Point(_) => "point",
            Self::LineString(_) => "linestring",
            Self::Polygon(_) => "polygon",
            Self::Lanelet(_) => "lanelet",
            Self::RegulatoryElement(_) => "regulatory element",
        }
    }

    #[must_use]
    pub fn as_line_string(&self) -> Option<Id> {
        match *self {
            Self::LineString(id) => Some(id),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_lanelet(&self) -> Option<Id> {
        match *self {
            Self::Lanelet(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for RuleParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

/// Id, attributes and roles of a relation, independent of its kind.
///
/// Typed relations wrap a `RoleStore` without copying it, so every change
/// made here is immediately visible through them. Roles are kept in name
/// order; the order of references within a role is preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleStore {
    id: Id,
    attributes: AttributeMap,
    roles: BTreeMap<String, Vec<RuleParameter>>,
}

impl RoleStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(id: Id) -> Self {
        Self::with_attributes(id, AttributeMap::new())
    }

    /// Create a store with the given attributes and no roles.
    #[must_use]
    pub fn with_attributes(id: Id, attributes: AttributeMap) -> Self {
        Self {
            id,
            attributes,
            roles: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> Id {
        self.id
    }

    #[must_use]
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeMap {
        &mut self.attributes
    }

    /// The rule name used to resolve the typed relation, i.e. the `subtype`.
    #[must_use]
    pub fn rule_name(&self) -> Option<&str> {
        self.attributes.value(ATTR_SUBTYPE)
    }

    /// Tag this store as a regulatory element of the given rule.
    pub fn stamp_rule(&mut self, rule_name: &str) {
        self.attributes.insert(ATTR_TYPE, REGULATORY_ELEMENT);
        self.attributes.insert(ATTR_SUBTYPE, rule_name);
    }

    /// References held by a role, in order. Empty if the role is absent.
    #[must_use]
    pub fn get(&self, role: &str) -> &[RuleParameter] {
        self.roles.get(role).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether a role holds the given reference.
    #[must_use]
    pub fn contains(&self, role: &str, param: &RuleParameter) -> bool {
        self.get(role).contains(param)
    }

    /// Append a reference to a role.
    ///
    /// # Errors
    /// Returns `DuplicateReference` if the role already holds it.
    pub fn add(&mut self, role: &str, param: RuleParameter) -> Result<()> {
        if self.contains(role, &param) {
            return Err(self.duplicate(role, param));
        }
        self.roles.entry(role.to_string()).or_default().push(param);
        Ok(())
    }

    /// Remove a reference from a role. Returns `true` iff it was present.
    ///
    /// A role that becomes empty is dropped.
    pub fn remove(&mut self, role: &str, param: &RuleParameter) -> bool {
        let Some(params) = self.roles.get_mut(role) else {
            return false;
        };
        let Some(pos) = params.iter().position(|p| p == param) else {
            return false;
        };
        params.remove(pos);
        if params.is_empty() {
            self.roles.remove(role);
        }
        true
    }

    /// Replace the whole role.
    ///
    /// The store is left untouched if `params` contains a duplicate.
    /// Setting an empty sequence drops the role.
    ///
    /// # Errors
    /// Returns `DuplicateReference` on the first repeated reference.
    pub fn set(&mut self, role: &str, params: Vec<RuleParameter>) -> Result<()> {
        for (i, param) in params.iter().enumerate() {
            if params[..i].contains(param) {
                return Err(self.duplicate(role, *param));
            }
        }
        if params.is_empty() {
            self.roles.remove(role);
        } else {
            self.roles.insert(role.to_string(), params);
        }
        Ok(())
    }

    /// Replace the whole role with a single reference.
    pub fn set_single(&mut self, role: &str, param: RuleParameter) {
        self.roles.insert(role.to_string(), vec![param]);
    }

    /// Drop a role entirely.
    pub fn clear(&mut self, role: &str) {
        self.roles.remove(role);
    }

    /// Iterate over roles in name order.
    pub fn roles(&self) -> impl Iterator<Item = (&str, &[RuleParameter])> {
        self.roles.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Iterate over every `(role, reference)` pair.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &RuleParameter)> {
        self.roles
            .iter()
            .flat_map(|(role, params)| params.iter().map(move |p| (role.as_str(), p)))
    }

    fn duplicate(&self, role: &str, member: RuleParameter) -> CoreError {
        CoreError::DuplicateReference {
            id: self.id,
            role: role.to_string(),
            member,
        }
    }
}
