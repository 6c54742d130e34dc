//! Registry mapping rule names to typed relation factories.

use std::collections::{HashMap, HashSet};

use crate::error::{CoreError, Result};
use crate::regulatory::{RegulatoryElement, RightOfWay, SpeedLimit, TrafficLight, TrafficSign};
use crate::roles::RoleStore;

/// Upgrades generic relation data into a typed regulatory element.
pub type RelationFactory = Box<dyn Fn(RoleStore) -> Result<RegulatoryElement> + Send + Sync>;

/// Registry of regulatory element kinds, keyed by rule name.
///
/// Populate it once before loading maps; entries are never removed.
pub struct RelationTypeRegistry {
    factories: HashMap<String, RelationFactory>,
}

impl RelationTypeRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory for a rule name.
    ///
    /// # Errors
    /// `DuplicateTypeName` if the name is already registered.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        factory: impl Fn(RoleStore) -> Result<RegulatoryElement> + Send + Sync + 'static,
    ) -> Result<()> {
        let type_name = type_name.into();
        if self.factories.contains_key(&type_name) {
            return Err(CoreError::DuplicateTypeName(type_name));
        }
        tracing::debug!(type_name = %type_name, "Registering relation type");
        self.factories.insert(type_name, Box::new(factory));
        Ok(())
    }

    /// Resolve relation data under an explicit rule name.
    ///
    /// Unknown names are not an error: the data comes back as
    /// [`RegulatoryElement::Generic`].
    ///
    /// # Errors
    /// Whatever the factory reports when the data does not fit the rule.
    pub fn resolve(&self, type_name: &str, data: RoleStore) -> Result<RegulatoryElement> {
        match self.factories.get(type_name) {
            Some(factory) => factory(data),
            None => Ok(RegulatoryElement::Generic(data)),
        }
    }

    /// Resolve relation data under its own rule name (its `subtype`).
    ///
    /// # Errors
    /// See [`resolve`](Self::resolve).
    pub fn upgrade(&self, data: RoleStore) -> Result<RegulatoryElement> {
        match data.rule_name().map(str::to_string) {
            Some(rule) => self.resolve(&rule, data),
            None => Ok(RegulatoryElement::Generic(data)),
        }
    }

    #[must_use]
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Return set of all registered rule names.
    #[must_use]
    pub fn registered_types(&self) -> HashSet<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }
}

impl std::fmt::Debug for RelationTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.registered_types().into_iter().collect();
        types.sort_unstable();
        f.debug_struct("RelationTypeRegistry")
            .field("types", &types)
            .finish()
    }
}

impl Default for RelationTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a registry holding the built-in rule kinds.
#[must_use]
pub fn create_relation_registry() -> RelationTypeRegistry {
    let mut registry = RelationTypeRegistry::new();
    let builtins: [(&str, RelationFactory); 4] = [
        (
            TrafficLight::RULE_NAME,
            Box::new(|data: RoleStore| TrafficLight::from_roles(data).map(RegulatoryElement::from)),
        ),
        (
            RightOfWay::RULE_NAME,
            Box::new(|data: RoleStore| RightOfWay::from_roles(data).map(RegulatoryElement::from)),
        ),
        (
            TrafficSign::RULE_NAME,
            Box::new(|data: RoleStore| TrafficSign::from_roles(data).map(RegulatoryElement::from)),
        ),
        (
            SpeedLimit::RULE_NAME,
            Box::new(|data: RoleStore| SpeedLimit::from_roles(data).map(RegulatoryElement::from)),
        ),
    ];
    for (name, factory) in builtins {
        registry.factories.insert(name.to_string(), factory);
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeMap;
    use crate::regulatory::RegulatoryRule;
    use crate::roles::RuleParameter;

    #[derive(Debug)]
    struct Crosswalk {
        data: RoleStore,
    }

    impl RegulatoryRule for Crosswalk {
        fn rule_name(&self) -> &str {
            "crosswalk"
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

    fn light_data(id: i64) -> RoleStore {
        let mut data = RoleStore::with_attributes(id, AttributeMap::new());
        data.stamp_rule("traffic_light");
        data.add("refers", RuleParameter::LineString(1)).unwrap();
        data.add("ref_line", RuleParameter::LineString(2)).unwrap();
        data
    }

    #[test]
    fn test_builtins_registered() {
        let registry = create_relation_registry();
        for name in ["traffic_light", "right_of_way", "traffic_sign", "speed_limit"] {
            assert!(registry.is_registered(name), "{name} missing");
        }
        assert_eq!(registry.registered_types().len(), 4);
    }

    #[test]
    fn test_register_duplicate_rejected() {
        let mut registry = create_relation_registry();
        let err = registry
            .register("traffic_light", |data| Ok(RegulatoryElement::Generic(data)))
            .unwrap_err();
        assert_eq!(err, CoreError::DuplicateTypeName("traffic_light".to_string()));

        let mut empty = RelationTypeRegistry::new();
        empty
            .register("crosswalk", |data| Ok(RegulatoryElement::Generic(data)))
            .unwrap();
        assert!(empty
            .register("crosswalk", |data| Ok(RegulatoryElement::Generic(data)))
            .is_err());
    }

    #[test]
    fn test_resolve_unknown_is_generic() {
        let registry = create_relation_registry();
        let element = registry.resolve("no_such_rule", RoleStore::new(3)).unwrap();
        assert!(element.is_generic());
        assert_eq!(element.id(), 3);
    }

    #[test]
    fn test_upgrade_by_subtype() {
        let registry = create_relation_registry();
        let element = registry.upgrade(light_data(5)).unwrap();
        assert_eq!(element.as_traffic_light().map(|t| t.traffic_lights()), Some(vec![1]));

        let untagged = registry.upgrade(RoleStore::new(6)).unwrap();
        assert!(untagged.is_generic());
    }

    #[test]
    fn test_upgrade_propagates_factory_error() {
        let registry = create_relation_registry();
        let mut data = light_data(7);
        data.clear("ref_line");
        assert!(matches!(
            registry.upgrade(data),
            Err(CoreError::InvalidRelation { .. })
        ));
    }

    #[test]
    fn test_third_party_rule() {
        let mut registry = create_relation_registry();
        registry
            .register("crosswalk", |data| {
                Ok(RegulatoryElement::Custom(Box::new(Crosswalk { data })))
            })
            .unwrap();

        let mut data = RoleStore::new(8);
        data.stamp_rule("crosswalk");
        let element = registry.upgrade(data.clone()).unwrap();
        assert!(matches!(element, RegulatoryElement::Custom(_)));
        assert_eq!(element.rule_name(), Some("crosswalk"));
        assert_eq!(element.into_roles(), data);
    }
}
