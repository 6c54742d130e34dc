//! Right of way rule.

use super::{check_kinds, RegulatoryRule};
use crate::attributes::AttributeMap;
use crate::config::{ROLE_REF_LINE, ROLE_RIGHT_OF_WAY, ROLE_YIELD};
use crate::error::{CoreError, Result};
use crate::primitives::Id;
use crate::roles::{RoleStore, RuleParameter};

/// How a lanelet takes part in a right of way rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManeuverType {
    /// The lanelet has right of way.
    RightOfWay,
    /// The lanelet has to yield.
    Yield,
    /// The lanelet is not part of the rule.
    Unknown,
}

/// Right of way between lanelets, with an optional stop line.
///
/// A lanelet is never in both the `right_of_way` and the `yield` role.
/// Without a stop line, yielding traffic stops at the end of its lanelet.
#[derive(Debug, Clone, PartialEq)]
pub struct RightOfWay {
    data: RoleStore,
}

impl RightOfWay {
    pub const RULE_NAME: &'static str = "right_of_way";

    /// Build a right of way rule.
    ///
    /// Empty lanelet lists are accepted.
    ///
    /// # Errors
    /// `ConflictingRole` if a lanelet is in both lists, `DuplicateReference`
    /// if one is listed twice.
    pub fn make(
        id: Id,
        attributes: AttributeMap,
        right_of_way: &[Id],
        yield_lanelets: &[Id],
        stop_line: Option<Id>,
    ) -> Result<Self> {
        let mut data = RoleStore::with_attributes(id, attributes);
        data.stamp_rule(Self::RULE_NAME);
        let mut rule = Self { data };
        for lanelet in right_of_way {
            rule.add_right_of_way_lanelet(*lanelet)?;
        }
        for lanelet in yield_lanelets {
            rule.add_yield_lanelet(*lanelet)?;
        }
        if let Some(stop_line) = stop_line {
            rule.set_stop_line(stop_line);
        }
        Ok(rule)
    }

    /// Upgrade generic relation data.
    ///
    /// # Errors
    /// `InvalidRelation` on wrong member kinds or more than one stop line,
    /// `ConflictingRole` if a lanelet has right of way and yields.
    pub fn from_roles(data: RoleStore) -> Result<Self> {
        check_kinds(&data, Self::RULE_NAME, ROLE_RIGHT_OF_WAY, RuleParameter::as_lanelet)?;
        check_kinds(&data, Self::RULE_NAME, ROLE_YIELD, RuleParameter::as_lanelet)?;
        check_kinds(&data, Self::RULE_NAME, ROLE_REF_LINE, RuleParameter::as_line_string)?;
        if data.get(ROLE_REF_LINE).len() > 1 {
            return Err(CoreError::invalid(
                Self::RULE_NAME,
                data.id(),
                "more than one stop line",
            ));
        }
        if let Some(both) = data
            .get(ROLE_YIELD)
            .iter()
            .find(|p| data.contains(ROLE_RIGHT_OF_WAY, p))
        {
            return Err(CoreError::ConflictingRole {
                id: data.id(),
                lanelet: both.id(),
                role: ROLE_YIELD.to_string(),
                existing: ROLE_RIGHT_OF_WAY.to_string(),
            });
        }
        Ok(Self { data })
    }

    /// Classify a lanelet by role membership.
    #[must_use]
    pub fn get_maneuver(&self, lanelet: Id) -> ManeuverType {
        let param = RuleParameter::Lanelet(lanelet);
        if self.data.contains(ROLE_RIGHT_OF_WAY, &param) {
            ManeuverType::RightOfWay
        } else if self.data.contains(ROLE_YIELD, &param) {
            ManeuverType::Yield
        } else {
            ManeuverType::Unknown
        }
    }

    /// Lanelets that have right of way.
    #[must_use]
    pub fn right_of_way_lanelets(&self) -> Vec<Id> {
        self.lanelets(ROLE_RIGHT_OF_WAY)
    }

    /// Lanelets that have to yield.
    #[must_use]
    pub fn yield_lanelets(&self) -> Vec<Id> {
        self.lanelets(ROLE_YIELD)
    }

    /// The stop line, if any.
    #[must_use]
    pub fn stop_line(&self) -> Option<Id> {
        self.data
            .get(ROLE_REF_LINE)
            .iter()
            .find_map(RuleParameter::as_line_string)
    }

    /// Overwrite the stop line.
    pub fn set_stop_line(&mut self, stop_line: Id) {
        self.data
            .set_single(ROLE_REF_LINE, RuleParameter::LineString(stop_line));
    }

    pub fn remove_stop_line(&mut self) {
        self.data.clear(ROLE_REF_LINE);
    }

    /// Give a lanelet right of way.
    ///
    /// # Errors
    /// `ConflictingRole` if the lanelet yields in this rule.
    pub fn add_right_of_way_lanelet(&mut self, lanelet: Id) -> Result<()> {
        self.add_exclusive(ROLE_RIGHT_OF_WAY, ROLE_YIELD, lanelet)
    }

    /// Make a lanelet yield.
    ///
    /// # Errors
    /// `ConflictingRole` if the lanelet has right of way in this rule.
    pub fn add_yield_lanelet(&mut self, lanelet: Id) -> Result<()> {
        self.add_exclusive(ROLE_YIELD, ROLE_RIGHT_OF_WAY, lanelet)
    }

    /// Returns `true` if the lanelet was removed.
    pub fn remove_right_of_way_lanelet(&mut self, lanelet: Id) -> bool {
        self.data
            .remove(ROLE_RIGHT_OF_WAY, &RuleParameter::Lanelet(lanelet))
    }

    /// Returns `true` if the lanelet was removed.
    pub fn remove_yield_lanelet(&mut self, lanelet: Id) -> bool {
        self.data
            .remove(ROLE_YIELD, &RuleParameter::Lanelet(lanelet))
    }

    fn lanelets(&self, role: &str) -> Vec<Id> {
        self.data
            .get(role)
            .iter()
            .filter_map(RuleParameter::as_lanelet)
            .collect()
    }

    fn add_exclusive(&mut self, role: &str, opposite: &str, lanelet: Id) -> Result<()> {
        let param = RuleParameter::Lanelet(lanelet);
        if self.data.contains(opposite, &param) {
            return Err(CoreError::ConflictingRole {
                id: self.data.id(),
                lanelet,
                role: role.to_string(),
                existing: opposite.to_string(),
            });
        }
        self.data.add(role, param)
    }
}

impl RegulatoryRule for RightOfWay {
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
