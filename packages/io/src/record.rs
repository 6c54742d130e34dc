//! Format-agnostic record shape.
//!
//! Every handler maps its byte-level grammar onto these records. Positions
//! are already projected into the local frame.

use std::collections::HashSet;

use lanemap_core::{AttributeMap, BasicPoint3d, CoreError, Id, RuleParameter};

use crate::error::{IoError, Result};
use crate::registry::ErrorPolicy;

/// What a relation member points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Node,
    Way,
    Relation,
}

impl MemberKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }

    /// Parse a member type as written in map files.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "node" => Some(Self::Node),
            "way" => Some(Self::Way),
            "relation" => Some(Self::Relation),
            _ => None,
        }
    }
}

impl From<&RuleParameter> for MemberKind {
    fn from(param: &RuleParameter) -> Self {
        match param {
            RuleParameter::Point(_) => Self::Node,
            RuleParameter::LineString(_) | RuleParameter::Polygon(_) => Self::Way,
            RuleParameter::Lanelet(_) | RuleParameter::RegulatoryElement(_) => Self::Relation,
        }
    }
}

/// One (role, reference) pair of a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub role: String,
    pub kind: MemberKind,
    pub id: Id,
}

impl Member {
    #[must_use]
    pub fn new(role: impl Into<String>, kind: MemberKind, id: Id) -> Self {
        Self {
            role: role.into(),
            kind,
            id,
        }
    }

    /// Best guess at the primitive a member names when it cannot be
    /// looked up: ways read as linestrings, relations as regulatory
    /// elements.
    fn placeholder(&self) -> RuleParameter {
        match self.kind {
            MemberKind::Node => RuleParameter::Point(self.id),
            MemberKind::Way => RuleParameter::LineString(self.id),
            MemberKind::Relation => RuleParameter::RegulatoryElement(self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub id: Id,
    pub position: BasicPoint3d,
    pub attributes: AttributeMap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WayRecord {
    pub id: Id,
    pub nodes: Vec<Id>,
    pub attributes: AttributeMap,
}

/// A relation: lanelet or regulatory element.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationRecord {
    pub id: Id,
    pub attributes: AttributeMap,
    /// Members in file order.
    pub members: Vec<Member>,
}

impl RelationRecord {
    /// The rule name (`subtype`) the relation registry resolves.
    #[must_use]
    pub fn rule_name(&self) -> Option<&str> {
        self.attributes.value(lanemap_core::config::ATTR_SUBTYPE)
    }

    /// The relation `type` tag.
    #[must_use]
    pub fn relation_type(&self) -> Option<&str> {
        self.attributes.value(lanemap_core::config::ATTR_TYPE)
    }

    /// Members holding `role`, in order.
    pub fn role<'a>(&'a self, role: &'a str) -> impl Iterator<Item = &'a Member> {
        self.members.iter().filter(move |m| m.role == role)
    }
}

/// Everything read from or written to one map file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    pub nodes: Vec<NodeRecord>,
    pub ways: Vec<WayRecord>,
    pub relations: Vec<RelationRecord>,
}

impl RecordSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() + self.ways.len() + self.relations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every record whose id is not unique within its kind.
    ///
    /// All records sharing the id go, since none of them can be told apart
    /// from the others by reference. Each duplicated id is reported once.
    ///
    /// # Errors
    /// The first duplicate in strict mode.
    pub fn drop_duplicate_ids(&mut self, policy: &mut ErrorPolicy<'_>) -> Result<()> {
        let nodes = drop_duplicates(&mut self.nodes, |n| n.id);
        let ways = drop_duplicates(&mut self.ways, |w| w.id);
        let relations = drop_duplicates(&mut self.relations, |r| r.id);
        let duplicates = [
            (MemberKind::Node, nodes),
            (MemberKind::Way, ways),
            (MemberKind::Relation, relations),
        ];
        for (kind, ids) in duplicates {
            for id in ids {
                policy.record(IoError::malformed(kind.as_str(), Some(id), "duplicate id"))?;
            }
        }
        Ok(())
    }

    /// Remove every record that references a record not in the set.
    ///
    /// Ways lose to missing nodes, relations to missing members of any
    /// kind. Removing a relation can orphan another one, so relations are
    /// pruned until nothing changes. Each removal goes through `policy`.
    ///
    /// # Errors
    /// The first removal in strict mode.
    pub fn prune_dangling(&mut self, policy: &mut ErrorPolicy<'_>) -> Result<Vec<(MemberKind, Id)>> {
        let mut removed = Vec::new();
        let mut failures = Vec::new();

        let nodes: HashSet<Id> = self.nodes.iter().map(|n| n.id).collect();
        self.ways.retain(|way| match way.nodes.iter().find(|n| !nodes.contains(n)) {
            Some(&missing) => {
                failures.push(unresolved(MemberKind::Way, way.id, "nodes", RuleParameter::Point(missing)));
                removed.push((MemberKind::Way, way.id));
                false
            }
            None => true,
        });

        let ways: HashSet<Id> = self.ways.iter().map(|w| w.id).collect();
        loop {
            let relations: HashSet<Id> = self.relations.iter().map(|r| r.id).collect();
            let before = self.relations.len();
            self.relations.retain(|relation| {
                let missing = relation.members.iter().find(|m| match m.kind {
                    MemberKind::Node => !nodes.contains(&m.id),
                    MemberKind::Way => !ways.contains(&m.id),
                    MemberKind::Relation => !relations.contains(&m.id),
                });
                match missing {
                    Some(member) => {
                        failures.push(unresolved(
                            MemberKind::Relation,
                            relation.id,
                            &member.role,
                            member.placeholder(),
                        ));
                        removed.push((MemberKind::Relation, relation.id));
                        false
                    }
                    None => true,
                }
            });
            if self.relations.len() == before {
                break;
            }
        }

        for err in failures {
            policy.record(err)?;
        }
        Ok(removed)
    }
}

/// Drop every item whose id occurs more than once; returns those ids in
/// order of first repetition.
fn drop_duplicates<T>(items: &mut Vec<T>, id_of: fn(&T) -> Id) -> Vec<Id> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for id in items.iter().map(id_of) {
        if !seen.insert(id) && !duplicates.contains(&id) {
            duplicates.push(id);
        }
    }
    if !duplicates.is_empty() {
        items.retain(|item| !duplicates.contains(&id_of(item)));
    }
    duplicates
}

fn unresolved(kind: MemberKind, id: Id, role: &str, member: RuleParameter) -> IoError {
    IoError::failed(
        kind.as_str(),
        id,
        CoreError::UnresolvedReference {
            id,
            role: role.to_string(),
            member,
        },
    )
}
