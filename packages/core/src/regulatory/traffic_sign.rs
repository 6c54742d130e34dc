//! Traffic sign rules and the speed limit specialization.

use super::{check_kinds, RegulatoryRule};
use crate::attributes::AttributeMap;
use crate::config::{
    ATTR_CANCEL_TYPE, ATTR_SIGN_TYPE, ATTR_SUBTYPE, ATTR_TYPE, ROLE_CANCELS, ROLE_CANCEL_LINE,
    ROLE_REFERS, ROLE_REF_LINE, TRAFFIC_SIGN,
};
use crate::error::{CoreError, Result};
use crate::map::Layer;
use crate::primitives::{Id, LineString};
use crate::roles::{RoleStore, RuleParameter};

/// Signs that show the same symbol, with that symbol's type.
///
/// Types have the form `<country-code><number>`, e.g. `de205`. When
/// `sign_type` is `None` the type is read from the signs themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignGroup<'a> {
    pub traffic_signs: &'a [LineString],
    pub sign_type: Option<&'a str>,
}

impl<'a> SignGroup<'a> {
    #[must_use]
    pub fn new(traffic_signs: &'a [LineString]) -> Self {
        Self {
            traffic_signs,
            sign_type: None,
        }
    }

    #[must_use]
    pub fn with_type(mut self, sign_type: &'a str) -> Self {
        self.sign_type = Some(sign_type);
        self
    }

    /// The explicit type, or the one shared by all tagged signs.
    fn resolve(&self, rule: &str, id: Id) -> Result<Option<String>> {
        if let Some(explicit) = self.sign_type {
            return Ok(Some(explicit.to_string()));
        }
        let mut found: Option<&str> = None;
        for sign in self.traffic_signs {
            let Some(ty) = sign_type_of(sign) else {
                continue;
            };
            match found {
                Some(prev) if prev != ty => {
                    return Err(CoreError::invalid(
                        rule,
                        id,
                        format!("signs disagree on type: '{prev}' and '{ty}'"),
                    ));
                }
                _ => found = Some(ty),
            }
        }
        Ok(found.map(str::to_string))
    }
}

/// Type of a physical sign.
///
/// A linestring tagged `type=traffic_sign` carries its type in `subtype`;
/// otherwise `type` itself is the sign type.
#[must_use]
pub fn sign_type_of(sign: &LineString) -> Option<&str> {
    match sign.attributes.value(ATTR_TYPE) {
        Some(TRAFFIC_SIGN) => sign.attributes.value(ATTR_SUBTYPE),
        other => other,
    }
}

/// A generic traffic sign rule.
///
/// Roles: `refers` holds one or more signs showing the same symbol,
/// `cancels` the signs ending the rule, `ref_line` the lines from where it
/// applies and `cancel_line` the lines after which it no longer applies.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficSign {
    data: RoleStore,
}

impl TrafficSign {
    pub const RULE_NAME: &'static str = "traffic_sign";

    /// Build a traffic sign rule.
    ///
    /// The resolved types are stored in the `sign_type` and `cancel_type`
    /// attributes.
    ///
    /// # Errors
    /// `InvalidRelation` if there are no signs, no type can be resolved
    /// for them, or the signs of a group disagree on their type.
    pub fn make(
        id: Id,
        attributes: AttributeMap,
        signs: SignGroup<'_>,
        cancelling: SignGroup<'_>,
        ref_lines: &[Id],
        cancel_lines: &[Id],
    ) -> Result<Self> {
        build(
            Self::RULE_NAME,
            id,
            attributes,
            signs,
            cancelling,
            ref_lines,
            cancel_lines,
        )
        .map(|data| Self { data })
    }

    /// Upgrade generic relation data.
    ///
    /// # Errors
    /// `InvalidRelation` if `refers` is empty or a role holds something
    /// other than linestrings.
    pub fn from_roles(data: RoleStore) -> Result<Self> {
        validate(Self::RULE_NAME, &data)?;
        Ok(Self { data })
    }

    #[must_use]
    pub fn traffic_signs(&self) -> Vec<Id> {
        self.line_strings(ROLE_REFERS)
    }

    /// Type of the primary signs, as stored on the relation.
    ///
    /// Relations built with [`make`](Self::make) always store it. Relations
    /// read from files usually do not; use
    /// [`resolve_sign_type`](Self::resolve_sign_type) to fall back to the
    /// signs' own `type` tags.
    #[must_use]
    pub fn sign_type(&self) -> Option<&str> {
        self.data.attributes().value(ATTR_SIGN_TYPE)
    }

    /// Type of the primary signs, falling back to the tags of the first
    /// sign when the relation does not store one.
    #[must_use]
    pub fn resolve_sign_type(&self, line_strings: &Layer<LineString>) -> Option<String> {
        if let Some(stored) = self.sign_type() {
            return Some(stored.to_string());
        }
        self.traffic_signs()
            .first()
            .and_then(|id| line_strings.get(*id))
            .and_then(sign_type_of)
            .map(str::to_string)
    }

    /// Lines from where the rule applies. Empty means the whole lanelet.
    #[must_use]
    pub fn ref_lines(&self) -> Vec<Id> {
        self.line_strings(ROLE_REF_LINE)
    }

    #[must_use]
    pub fn cancelling_traffic_signs(&self) -> Vec<Id> {
        self.line_strings(ROLE_CANCELS)
    }

    #[must_use]
    pub fn cancel_type(&self) -> Option<&str> {
        self.data.attributes().value(ATTR_CANCEL_TYPE)
    }

    /// Lines after which the rule no longer applies.
    #[must_use]
    pub fn cancel_lines(&self) -> Vec<Id> {
        self.line_strings(ROLE_CANCEL_LINE)
    }

    /// # Errors
    /// `DuplicateReference` if the sign is already part of the rule.
    pub fn add_traffic_sign(&mut self, sign: Id) -> Result<()> {
        self.data.add(ROLE_REFERS, RuleParameter::LineString(sign))
    }

    pub fn remove_traffic_sign(&mut self, sign: Id) -> bool {
        self.data
            .remove(ROLE_REFERS, &RuleParameter::LineString(sign))
    }

    /// # Errors
    /// `DuplicateReference` if the sign already cancels the rule.
    pub fn add_cancelling_traffic_sign(&mut self, sign: Id) -> Result<()> {
        self.data.add(ROLE_CANCELS, RuleParameter::LineString(sign))
    }

    pub fn remove_cancelling_traffic_sign(&mut self, sign: Id) -> bool {
        self.data
            .remove(ROLE_CANCELS, &RuleParameter::LineString(sign))
    }

    /// # Errors
    /// `DuplicateReference` if the line is already a reference line.
    pub fn add_ref_line(&mut self, line: Id) -> Result<()> {
        self.data.add(ROLE_REF_LINE, RuleParameter::LineString(line))
    }

    pub fn remove_ref_line(&mut self, line: Id) -> bool {
        self.data
            .remove(ROLE_REF_LINE, &RuleParameter::LineString(line))
    }

    /// # Errors
    /// `DuplicateReference` if the line is already a cancel line.
    pub fn add_cancelling_ref_line(&mut self, line: Id) -> Result<()> {
        self.data
            .add(ROLE_CANCEL_LINE, RuleParameter::LineString(line))
    }

    pub fn remove_cancelling_ref_line(&mut self, line: Id) -> bool {
        self.data
            .remove(ROLE_CANCEL_LINE, &RuleParameter::LineString(line))
    }

    fn line_strings(&self, role: &str) -> Vec<Id> {
        self.data
            .get(role)
            .iter()
            .filter_map(RuleParameter::as_line_string)
            .collect()
    }
}

impl RegulatoryRule for TrafficSign {
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

/// A speed limit, defined and cancelled by traffic signs.
///
/// Structurally a [`TrafficSign`]; only the rule name differs.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedLimit(TrafficSign);

impl SpeedLimit {
    pub const RULE_NAME: &'static str = "speed_limit";

    /// Build a speed limit. Same contract as [`TrafficSign::make`].
    ///
    /// # Errors
    /// See [`TrafficSign::make`].
    pub fn make(
        id: Id,
        attributes: AttributeMap,
        signs: SignGroup<'_>,
        cancelling: SignGroup<'_>,
        ref_lines: &[Id],
        cancel_lines: &[Id],
    ) -> Result<Self> {
        build(
            Self::RULE_NAME,
            id,
            attributes,
            signs,
            cancelling,
            ref_lines,
            cancel_lines,
        )
        .map(|data| Self(TrafficSign { data }))
    }

    /// # Errors
    /// See [`TrafficSign::from_roles`].
    pub fn from_roles(data: RoleStore) -> Result<Self> {
        validate(Self::RULE_NAME, &data)?;
        Ok(Self(TrafficSign { data }))
    }

    #[must_use]
    pub fn as_traffic_sign(&self) -> &TrafficSign {
        &self.0
    }

    pub fn as_traffic_sign_mut(&mut self) -> &mut TrafficSign {
        &mut self.0
    }
}

impl RegulatoryRule for SpeedLimit {
    fn rule_name(&self) -> &str {
        Self::RULE_NAME
    }

    fn roles(&self) -> &RoleStore {
        &self.0.data
    }

    fn roles_mut(&mut self) -> &mut RoleStore {
        &mut self.0.data
    }

    fn into_roles(self: Box<Self>) -> RoleStore {
        self.0.data
    }
}

fn build(
    rule: &str,
    id: Id,
    attributes: AttributeMap,
    signs: SignGroup<'_>,
    cancelling: SignGroup<'_>,
    ref_lines: &[Id],
    cancel_lines: &[Id],
) -> Result<RoleStore> {
    if signs.traffic_signs.is_empty() {
        return Err(CoreError::invalid(rule, id, "no traffic signs"));
    }
    let sign_type = signs
        .resolve(rule, id)?
        .ok_or_else(|| CoreError::invalid(rule, id, "traffic sign type is unknown"))?;
    let cancel_type = cancelling.resolve(rule, id)?;

    let mut data = RoleStore::with_attributes(id, attributes);
    data.stamp_rule(rule);
    data.attributes_mut().insert(ATTR_SIGN_TYPE, sign_type);
    if let Some(cancel_type) = cancel_type {
        data.attributes_mut().insert(ATTR_CANCEL_TYPE, cancel_type);
    }

    for sign in signs.traffic_signs {
        data.add(ROLE_REFERS, RuleParameter::LineString(sign.id))?;
    }
    for sign in cancelling.traffic_signs {
        data.add(ROLE_CANCELS, RuleParameter::LineString(sign.id))?;
    }
    for line in ref_lines {
        data.add(ROLE_REF_LINE, RuleParameter::LineString(*line))?;
    }
    for line in cancel_lines {
        data.add(ROLE_CANCEL_LINE, RuleParameter::LineString(*line))?;
    }
    Ok(data)
}

fn validate(rule: &str, data: &RoleStore) -> Result<()> {
    if data.get(ROLE_REFERS).is_empty() {
        return Err(CoreError::invalid(rule, data.id(), "no traffic signs"));
    }
    for role in [ROLE_REFERS, ROLE_CANCELS, ROLE_REF_LINE, ROLE_CANCEL_LINE] {
        check_kinds(data, rule, role, RuleParameter::as_line_string)?;
    }
    Ok(())
}
