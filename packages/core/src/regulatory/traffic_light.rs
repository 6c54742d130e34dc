//! Traffic light rule.

use super::{check_kinds, RegulatoryRule};
use crate::attributes::AttributeMap;
use crate::config::{ROLE_REFERS, ROLE_REF_LINE};
use crate::error::{CoreError, Result};
use crate::primitives::Id;
use crate::roles::{RoleStore, RuleParameter};

/// A set of traffic lights showing the same signal, plus the stop line.
///
/// The lights are linestrings in the `refers` role, running from the left
/// to the right edge of each light. The `ref_line` role holds exactly one
/// stop line.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficLight {
    data: RoleStore,
}

impl TrafficLight {
    pub const RULE_NAME: &'static str = "traffic_light";

    /// Build a traffic light from its required parameters.
    ///
    /// The `type`/`subtype` attributes are overwritten to match the rule.
    ///
    /// # Errors
    /// `InvalidRelation` if `traffic_lights` is empty or `stop_line` is
    /// unset, `DuplicateReference` if a light is listed twice.
    pub fn make(
        id: Id,
        attributes: AttributeMap,
        traffic_lights: &[Id],
        stop_line: Option<Id>,
    ) -> Result<Self> {
        if traffic_lights.is_empty() {
            return Err(CoreError::invalid(Self::RULE_NAME, id, "no traffic lights"));
        }
        let stop_line =
            stop_line.ok_or_else(|| CoreError::invalid(Self::RULE_NAME, id, "no stop line"))?;

        let mut data = RoleStore::with_attributes(id, attributes);
        data.stamp_rule(Self::RULE_NAME);
        for light in traffic_lights {
            data.add(ROLE_REFERS, RuleParameter::LineString(*light))?;
        }
        data.set_single(ROLE_REF_LINE, RuleParameter::LineString(stop_line));
        Ok(Self { data })
    }

    /// Upgrade generic relation data.
    ///
    /// # Errors
    /// `InvalidRelation` unless `refers` holds at least one linestring and
    /// `ref_line` exactly one.
    pub fn from_roles(data: RoleStore) -> Result<Self> {
        let id = data.id();
        if data.get(ROLE_REFERS).is_empty() {
            return Err(CoreError::invalid(Self::RULE_NAME, id, "no traffic lights"));
        }
        if data.get(ROLE_REF_LINE).len() != 1 {
            return Err(CoreError::invalid(
                Self::RULE_NAME,
                id,
                format!(
                    "expected exactly one stop line, found {}",
                    data.get(ROLE_REF_LINE).len()
                ),
            ));
        }
        check_kinds(&data, Self::RULE_NAME, ROLE_REFERS, RuleParameter::as_line_string)?;
        check_kinds(&data, Self::RULE_NAME, ROLE_REF_LINE, RuleParameter::as_line_string)?;
        Ok(Self { data })
    }

    /// The traffic lights, left to right as stored.
    ///
    /// There may be several but they all show the same signal.
    #[must_use]
    pub fn traffic_lights(&self) -> Vec<Id> {
        self.data
            .get(ROLE_REFERS)
            .iter()
            .filter_map(RuleParameter::as_line_string)
            .collect()
    }

    /// The stop line.
    ///
    /// # Errors
    /// `InvariantViolated` if the stop line was removed through the raw
    /// roles. A relation built by `make` or `from_roles` always has one.
    pub fn stop_line(&self) -> Result<Id> {
        self.data
            .get(ROLE_REF_LINE)
            .iter()
            .find_map(RuleParameter::as_line_string)
            .ok_or_else(|| {
                CoreError::InvariantViolated(format!(
                    "traffic light {} has no stop line",
                    self.data.id()
                ))
            })
    }

    /// Add a traffic light.
    ///
    /// # Errors
    /// `DuplicateReference` if it is already part of this rule.
    pub fn add_traffic_light(&mut self, light: Id) -> Result<()> {
        self.data.add(ROLE_REFERS, RuleParameter::LineString(light))
    }

    /// Remove a traffic light. Returns `true` if it existed and was removed.
    pub fn remove_traffic_light(&mut self, light: Id) -> bool {
        self.data
            .remove(ROLE_REFERS, &RuleParameter::LineString(light))
    }

    /// Replace the stop line.
    pub fn set_stop_line(&mut self, stop_line: Id) {
        self.data
            .set_single(ROLE_REF_LINE, RuleParameter::LineString(stop_line));
    }
}

impl RegulatoryRule for TrafficLight {
    fn rule_name(&self) -> &str {
        Self::RULE_NAME
    }

    fn roles(&self) -> &RoleStore {
        &self.data
    }

    fn roles_mut(&mut self) -> &mut RoleStore {
        &mut self.data
    }

    fn into_roles(self: Box<Self>) -> RoleStore {
        self.data
    }
}
