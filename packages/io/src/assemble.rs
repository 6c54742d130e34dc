//! Conversion between records and the map.
//!
//! Loading never leaves a dangling reference in the map: a record that
//! fails takes every record referencing it down with it, and each failure
//! is reported once through the [`ErrorPolicy`].

use std::collections::{BTreeMap, HashSet};

use lanemap_core::config::ATTR_TYPE;
use lanemap_core::{
    CoreError, Id, Lanelet, LaneletMap, LineString, Point, Polygon, RegulatoryElement,
    RelationTypeRegistry, RoleStore, RuleParameter,
};

use crate::config::{AREA_TAG, LANELET_TYPE, ROLE_LEFT, ROLE_REGULATORY_ELEMENT, ROLE_RIGHT};
use crate::error::{IoError, Result};
use crate::record::{Member, MemberKind, NodeRecord, RecordSet, RelationRecord, WayRecord};
use crate::registry::ErrorPolicy;

enum Built {
    Lanelet(Lanelet),
    Regulatory(RegulatoryElement),
}

/// Build a map from parsed records.
///
/// Relations tagged `type=lanelet` become lanelets. Every other relation
/// is resolved through `relations` by its rule name, and stays generic if
/// no factory is registered for it. Records whose id is taken twice within
/// their kind are dropped before anything is built.
///
/// # Errors
/// The first record failure in strict mode.
pub fn build_map(
    mut records: RecordSet,
    relations: &RelationTypeRegistry,
    policy: &mut ErrorPolicy<'_>,
) -> Result<LaneletMap> {
    records.drop_duplicate_ids(policy)?;
    records.prune_dangling(policy)?;

    let polygons: HashSet<Id> = records
        .ways
        .iter()
        .filter(|w| is_area(w))
        .map(|w| w.id)
        .collect();
    let lanelets: HashSet<Id> = records
        .relations
        .iter()
        .filter(|r| r.relation_type() == Some(LANELET_TYPE))
        .map(|r| r.id)
        .collect();

    let mut built = BTreeMap::new();
    let mut failed = HashSet::new();
    for record in &records.relations {
        let result = if lanelets.contains(&record.id) {
            build_lanelet(record, &polygons, &lanelets).map(Built::Lanelet)
        } else {
            role_store(record, &polygons, &lanelets)
                .and_then(|data| relations.upgrade(data))
                .map(Built::Regulatory)
        };
        match result {
            Ok(element) => {
                built.insert(record.id, element);
            }
            Err(source) => {
                policy.record(IoError::failed("relation", record.id, source))?;
                failed.insert(record.id);
            }
        }
    }
    if !failed.is_empty() {
        records.relations.retain(|r| !failed.contains(&r.id));
        for (kind, id) in records.prune_dangling(policy)? {
            if kind == MemberKind::Relation {
                built.remove(&id);
            }
        }
    }

    let mut map = LaneletMap::new();
    for node in records.nodes {
        map.add_point(Point {
            id: node.id,
            position: node.position,
            attributes: node.attributes,
        });
    }
    for way in records.ways {
        if polygons.contains(&way.id) {
            map.add_polygon(Polygon {
                id: way.id,
                points: way.nodes,
                attributes: way.attributes,
            });
        } else {
            map.add_line_string(LineString {
                id: way.id,
                points: way.nodes,
                attributes: way.attributes,
            });
        }
    }
    for element in built.into_values() {
        match element {
            Built::Lanelet(lanelet) => map.add_lanelet(lanelet),
            Built::Regulatory(element) => map.add_regulatory_element(element),
        }
    }

    tracing::debug!(
        points = map.points.len(),
        line_strings = map.line_strings.len(),
        lanelets = map.lanelets.len(),
        regulatory_elements = map.regulatory_elements.len(),
        "Assembled map"
    );
    Ok(map)
}

fn is_area(way: &WayRecord) -> bool {
    way.attributes
        .get(AREA_TAG)
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

fn build_lanelet(
    record: &RelationRecord,
    polygons: &HashSet<Id>,
    lanelets: &HashSet<Id>,
) -> std::result::Result<Lanelet, CoreError> {
    let bound = |role: &str| -> std::result::Result<Id, CoreError> {
        let mut members = record.role(role);
        match (members.next(), members.next()) {
            (Some(m), None) if m.kind == MemberKind::Way && !polygons.contains(&m.id) => Ok(m.id),
            (Some(m), None) => Err(CoreError::invalid(
                LANELET_TYPE,
                record.id,
                format!("{role} bound {} {} is not a linestring", m.kind.as_str(), m.id),
            )),
            _ => Err(CoreError::invalid(
                LANELET_TYPE,
                record.id,
                format!("needs exactly one {role} bound"),
            )),
        }
    };
    let left = bound(ROLE_LEFT)?;
    let right = bound(ROLE_RIGHT)?;

    let mut regulatory_elements = Vec::new();
    for member in record.role(ROLE_REGULATORY_ELEMENT) {
        if member.kind != MemberKind::Relation || lanelets.contains(&member.id) {
            return Err(CoreError::invalid(
                LANELET_TYPE,
                record.id,
                format!("{} {} is not a regulatory element", member.kind.as_str(), member.id),
            ));
        }
        regulatory_elements.push(member.id);
    }

    let ignored = record
        .members
        .iter()
        .filter(|m| ![ROLE_LEFT, ROLE_RIGHT, ROLE_REGULATORY_ELEMENT].contains(&m.role.as_str()))
        .count();
    if ignored > 0 {
        tracing::debug!(id = record.id, ignored, "Ignoring unknown lanelet members");
    }

    Ok(Lanelet {
        id: record.id,
        left,
        right,
        regulatory_elements,
        attributes: record.attributes.clone(),
    })
}

/// Generic relation data for a record, with members typed by what they
/// point at.
fn role_store(
    record: &RelationRecord,
    polygons: &HashSet<Id>,
    lanelets: &HashSet<Id>,
) -> std::result::Result<RoleStore, CoreError> {
    let mut data = RoleStore::with_attributes(record.id, record.attributes.clone());
    for member in &record.members {
        let param = match member.kind {
            MemberKind::Node => RuleParameter::Point(member.id),
            MemberKind::Way if polygons.contains(&member.id) => RuleParameter::Polygon(member.id),
            MemberKind::Way => RuleParameter::LineString(member.id),
            MemberKind::Relation if lanelets.contains(&member.id) => {
                RuleParameter::Lanelet(member.id)
            }
            MemberKind::Relation => RuleParameter::RegulatoryElement(member.id),
        };
        data.add(&member.role, param)?;
    }
    Ok(data)
}

/// Turn a map into records for writing.
///
/// Elements whose references do not resolve in the map are reported and
/// left out, together with everything that depends on them.
///
/// # Errors
/// The first record failure in strict mode.
pub fn records_from_map(map: &LaneletMap, policy: &mut ErrorPolicy<'_>) -> Result<RecordSet> {
    let mut records = RecordSet::new();

    for point in map.points.iter() {
        records.nodes.push(NodeRecord {
            id: point.id,
            position: point.position,
            attributes: point.attributes.clone(),
        });
    }

    let mut way_ids = HashSet::new();
    let line_strings = map
        .line_strings
        .iter()
        .map(|ls| (ls.id, &ls.points, ls.attributes.clone()));
    let polygons = map.polygons.iter().map(|p| {
        let mut attributes = p.attributes.clone();
        attributes.insert(AREA_TAG, "yes");
        (p.id, &p.points, attributes)
    });
    for (id, points, attributes) in line_strings.chain(polygons) {
        if !way_ids.insert(id) {
            policy.record(IoError::malformed("way", Some(id), "id shared by a linestring and a polygon"))?;
            continue;
        }
        records.ways.push(WayRecord {
            id,
            nodes: points.clone(),
            attributes,
        });
    }

    for lanelet in map.lanelets.iter() {
        match lanelet_record(map, lanelet) {
            Ok(record) => records.relations.push(record),
            Err(source) => policy.record(IoError::failed("relation", lanelet.id, source))?,
        }
    }
    for element in map.regulatory_elements.iter() {
        if map.lanelets.contains(element.id()) {
            policy.record(IoError::malformed(
                "relation",
                Some(element.id()),
                "id shared by a lanelet and a regulatory element",
            ))?;
            continue;
        }
        let data = element.roles();
        if let Err(source) = map.check_references(data) {
            policy.record(IoError::failed("relation", data.id(), source))?;
            continue;
        }
        records.relations.push(RelationRecord {
            id: data.id(),
            attributes: data.attributes().clone(),
            members: data
                .parameters()
                .map(|(role, param)| Member::new(role, MemberKind::from(param), param.id()))
                .collect(),
        });
    }

    records.prune_dangling(policy)?;
    Ok(records)
}

fn lanelet_record(map: &LaneletMap, lanelet: &Lanelet) -> std::result::Result<RelationRecord, CoreError> {
    let mut members = vec![
        (ROLE_LEFT, RuleParameter::LineString(lanelet.left)),
        (ROLE_RIGHT, RuleParameter::LineString(lanelet.right)),
    ];
    members.extend(
        lanelet
            .regulatory_elements
            .iter()
            .map(|id| (ROLE_REGULATORY_ELEMENT, RuleParameter::RegulatoryElement(*id))),
    );
    if let Some((role, member)) = members.iter().find(|(_, p)| !map.contains(p)) {
        return Err(CoreError::UnresolvedReference {
            id: lanelet.id,
            role: (*role).to_string(),
            member: *member,
        });
    }

    let mut attributes = lanelet.attributes.clone();
    attributes.insert(ATTR_TYPE, LANELET_TYPE);
    Ok(RelationRecord {
        id: lanelet.id,
        attributes,
        members: members
            .into_iter()
            .map(|(role, param)| Member::new(role, MemberKind::from(&param), param.id()))
            .collect(),
    })
}
