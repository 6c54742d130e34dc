//! Regulatory elements: typed views over generic relation data.
//!
//! Each built-in rule kind wraps a [`RoleStore`] and checks its own role
//! cardinality. Third-party kinds implement [`RegulatoryRule`] and are
//! stored as [`RegulatoryElement::Custom`]. Relations whose rule name has
//! no registered factory stay [`RegulatoryElement::Generic`].

mod right_of_way;
mod traffic_light;
mod traffic_sign;

use std::fmt;

pub use right_of_way::{ManeuverType, RightOfWay};
pub use traffic_light::TrafficLight;
pub use traffic_sign::{sign_type_of, SignGroup, SpeedLimit, TrafficSign};

use crate::attributes::AttributeMap;
use crate::error::{CoreError, Result};
use crate::primitives::Id;
use crate::roles::{RoleStore, RuleParameter};

/// Capabilities shared by all typed relations.
pub trait RegulatoryRule: fmt::Debug + Send + Sync {
    /// The rule name this relation is registered under.
    fn rule_name(&self) -> &str;

    /// The underlying relation data.
    fn roles(&self) -> &RoleStore;

    /// Mutable access to the underlying data.
    ///
    /// Changes made here bypass the typed checks; accessors of mandatory
    /// roles report `InvariantViolated` if a role is emptied this way.
    fn roles_mut(&mut self) -> &mut RoleStore;

    /// Downgrade to the generic relation data. Nothing is lost.
    fn into_roles(self: Box<Self>) -> RoleStore;

    fn id(&self) -> Id {
        self.roles().id()
    }

    fn attributes(&self) -> &AttributeMap {
        self.roles().attributes()
    }

    fn attributes_mut(&mut self) -> &mut AttributeMap {
        self.roles_mut().attributes_mut()
    }
}

/// A regulatory element as stored in the map.
#[derive(Debug)]
pub enum RegulatoryElement {
    TrafficLight(TrafficLight),
    RightOfWay(RightOfWay),
    TrafficSign(TrafficSign),
    SpeedLimit(SpeedLimit),
    /// A rule kind registered by a third party.
    Custom(Box<dyn RegulatoryRule>),
    /// A relation with no registered rule; roles and attributes only.
    Generic(RoleStore),
}

impl RegulatoryElement {
    #[must_use]
    pub fn id(&self) -> Id {
        self.roles().id()
    }

    /// Rule name of the typed relation, or the stored `subtype` if generic.
    #[must_use]
    pub fn rule_name(&self) -> Option<&str> {
        match self.as_rule() {
            Some(rule) => Some(rule.rule_name()),
            None => self.roles().rule_name(),
        }
    }

    #[must_use]
    pub fn roles(&self) -> &RoleStore {
        match self {
            Self::Generic(data) => data,
            Self::TrafficLight(r) => r.roles(),
            Self::RightOfWay(r) => r.roles(),
            Self::TrafficSign(r) => r.roles(),
            Self::SpeedLimit(r) => r.roles(),
            Self::Custom(r) => r.roles(),
        }
    }

    pub fn roles_mut(&mut self) -> &mut RoleStore {
        match self {
            Self::Generic(data) => data,
            Self::TrafficLight(r) => r.roles_mut(),
            Self::RightOfWay(r) => r.roles_mut(),
            Self::TrafficSign(r) => r.roles_mut(),
            Self::SpeedLimit(r) => r.roles_mut(),
            Self::Custom(r) => r.roles_mut(),
        }
    }

    #[must_use]
    pub fn attributes(&self) -> &AttributeMap {
        self.roles().attributes()
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeMap {
        self.roles_mut().attributes_mut()
    }

    /// Downgrade to the generic relation data.
    #[must_use]
    pub fn into_roles(self) -> RoleStore {
        match self {
            Self::Generic(data) => data,
            Self::TrafficLight(r) => Box::new(r).into_roles(),
            Self::RightOfWay(r) => Box::new(r).into_roles(),
            Self::TrafficSign(r) => Box::new(r).into_roles(),
            Self::SpeedLimit(r) => Box::new(r).into_roles(),
            Self::Custom(r) => r.into_roles(),
        }
    }

    /// The typed view, unless the relation is generic.
    #[must_use]
    pub fn as_rule(&self) -> Option<&dyn RegulatoryRule> {
        match self {
            Self::Generic(_) => None,
            Self::TrafficLight(r) => Some(r),
            Self::RightOfWay(r) => Some(r),
            Self::TrafficSign(r) => Some(r),
            Self::SpeedLimit(r) => Some(r),
            Self::Custom(r) => Some(&**r),
        }
    }

    #[must_use]
    pub fn is_generic(&self) -> bool {
        matches!(self, Self::Generic(_))
    }

    #[must_use]
    pub fn as_traffic_light(&self) -> Option<&TrafficLight> {
        match self {
            Self::TrafficLight(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_traffic_light_mut(&mut self) -> Option<&mut TrafficLight> {
        match self {
            Self::TrafficLight(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_right_of_way(&self) -> Option<&RightOfWay> {
        match self {
            Self::RightOfWay(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_right_of_way_mut(&mut self) -> Option<&mut RightOfWay> {
        match self {
            Self::RightOfWay(r) => Some(r),
            _ => None,
        }
    }

    /// Traffic sign view. Speed limits are traffic signs too.
    #[must_use]
    pub fn as_traffic_sign(&self) -> Option<&TrafficSign> {
        match self {
            Self::TrafficSign(r) => Some(r),
            Self::SpeedLimit(r) => Some(r.as_traffic_sign()),
            _ => None,
        }
    }

    pub fn as_traffic_sign_mut(&mut self) -> Option<&mut TrafficSign> {
        match self {
            Self::TrafficSign(r) => Some(r),
            Self::SpeedLimit(r) => Some(r.as_traffic_sign_mut()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_speed_limit(&self) -> Option<&SpeedLimit> {
        match self {
            Self::SpeedLimit(r) => Some(r),
            _ => None,
        }
    }
}

impl From<TrafficLight> for RegulatoryElement {
    fn from(rule: TrafficLight) -> Self {
        Self::TrafficLight(rule)
    }
}

impl From<RightOfWay> for RegulatoryElement {
    fn from(rule: RightOfWay) -> Self {
        Self::RightOfWay(rule)
    }
}

impl From<TrafficSign> for RegulatoryElement {
    fn from(rule: TrafficSign) -> Self {
        Self::TrafficSign(rule)
    }
}

impl From<SpeedLimit> for RegulatoryElement {
    fn from(rule: SpeedLimit) -> Self {
        Self::SpeedLimit(rule)
    }
}

impl From<RoleStore> for RegulatoryElement {
    fn from(data: RoleStore) -> Self {
        Self::Generic(data)
    }
}

/// Check that every member of `role` is of the kind `accept` recognizes.
pub(crate) fn check_kinds(
    data: &RoleStore,
    rule: &str,
    role: &str,
    accept: fn(&RuleParameter) -> Option<Id>,
) -> Result<()> {
    match data.get(role).iter().find(|p| accept(p).is_none()) {
        Some(bad) => Err(CoreError::invalid(
            rule,
            data.id(),
            format!("role '{role}' cannot hold {bad}"),
        )),
        None => Ok(()),
    }
}
