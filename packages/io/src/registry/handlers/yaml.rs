//! YAML map format.
//!
//! One document with `nodes`, `ways` and `relations` sequences. Node
//! positions are geodetic; tags are plain scalars.

use std::collections::BTreeMap;

use lanemap_core::{AttributeMap, GpsPoint, Id, Projector};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;

use super::project_nodes;
use crate::config::Configuration;
use crate::error::{IoError, Result};
use crate::record::{Member, MemberKind, NodeRecord, RecordSet, RelationRecord, WayRecord};
use crate::registry::{ErrorPolicy, Parser, Writer};

/// Parser factory registered for the `yaml` format.
///
/// # Errors
/// Never; the parser takes no options.
pub fn yaml_parser<'a>(
    projector: &'a dyn Projector,
    _config: &'a Configuration,
) -> Result<Box<dyn Parser + 'a>> {
    Ok(Box::new(YamlParser { projector }))
}

/// Writer factory registered for the `yaml` format.
///
/// # Errors
/// Never; the writer takes no options.
pub fn yaml_writer<'a>(
    projector: &'a dyn Projector,
    _config: &'a Configuration,
) -> Result<Box<dyn Writer + 'a>> {
    Ok(Box::new(YamlWriter { projector }))
}

/// Whole document. Records stay untyped so that one bad record does not
/// fail the rest.
#[derive(Debug, Serialize, Deserialize)]
struct YamlDocument<N, W, R> {
    #[serde(default)]
    nodes: Vec<N>,
    #[serde(default)]
    ways: Vec<W>,
    #[serde(default)]
    relations: Vec<R>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct YamlNode {
    id: Id,
    lat: f64,
    lon: f64,
    #[serde(default)]
    ele: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    tags: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct YamlWay {
    id: Id,
    nodes: Vec<Id>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    tags: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct YamlRelation {
    id: Id,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    tags: BTreeMap<String, Value>,
    #[serde(default)]
    members: Vec<YamlMember>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct YamlMember {
    #[serde(rename = "type")]
    kind: YamlMemberKind,
    #[serde(rename = "ref")]
    id: Id,
    role: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum YamlMemberKind {
    Node,
    Way,
    Relation,
}

impl From<YamlMemberKind> for MemberKind {
    fn from(kind: YamlMemberKind) -> Self {
        match kind {
            YamlMemberKind::Node => Self::Node,
            YamlMemberKind::Way => Self::Way,
            YamlMemberKind::Relation => Self::Relation,
        }
    }
}

impl From<MemberKind> for YamlMemberKind {
    fn from(kind: MemberKind) -> Self {
        match kind {
            MemberKind::Node => Self::Node,
            MemberKind::Way => Self::Way,
            MemberKind::Relation => Self::Relation,
        }
    }
}

struct YamlParser<'a> {
    projector: &'a dyn Projector,
}

impl Parser for YamlParser<'_> {
    fn parse(&self, input: &str, policy: &mut ErrorPolicy<'_>) -> Result<RecordSet> {
        let document: YamlDocument<Value, Value, Value> = serde_yaml_ng::from_str(input)?;
        let mut records = RecordSet::new();

        for value in document.nodes {
            match decode::<YamlNode>("node", value).and_then(|n| self.node_record(n)) {
                Ok(node) => records.nodes.push(node),
                Err(err) => policy.record(err)?,
            }
        }
        for value in document.ways {
            match decode::<YamlWay>("way", value).and_then(way_record) {
                Ok(way) => records.ways.push(way),
                Err(err) => policy.record(err)?,
            }
        }
        for value in document.relations {
            match decode::<YamlRelation>("relation", value).and_then(relation_record) {
                Ok(relation) => records.relations.push(relation),
                Err(err) => policy.record(err)?,
            }
        }

        tracing::debug!(records = records.len(), "Parsed YAML document");
        Ok(records)
    }
}

impl YamlParser<'_> {
    fn node_record(&self, node: YamlNode) -> Result<NodeRecord> {
        Ok(NodeRecord {
            id: node.id,
            position: self
                .projector
                .forward(GpsPoint::new(node.lat, node.lon, node.ele)),
            attributes: attributes_from_tags("node", node.id, node.tags)?,
        })
    }
}

fn way_record(way: YamlWay) -> Result<WayRecord> {
    Ok(WayRecord {
        id: way.id,
        nodes: way.nodes,
        attributes: attributes_from_tags("way", way.id, way.tags)?,
    })
}

fn relation_record(relation: YamlRelation) -> Result<RelationRecord> {
    Ok(RelationRecord {
        id: relation.id,
        attributes: attributes_from_tags("relation", relation.id, relation.tags)?,
        members: relation
            .members
            .into_iter()
            .map(|m| Member::new(m.role, m.kind.into(), m.id))
            .collect(),
    })
}

/// Decode one record, naming it by its `id` if it has a readable one.
fn decode<T: DeserializeOwned>(kind: &'static str, value: Value) -> Result<T> {
    let id = value.get("id").and_then(Value::as_i64);
    serde_yaml_ng::from_value(value).map_err(|err| IoError::malformed(kind, id, err.to_string()))
}

/// Tags are scalars; numbers and booleans keep their textual form.
fn attributes_from_tags(
    kind: &'static str,
    id: Id,
    tags: BTreeMap<String, Value>,
) -> Result<AttributeMap> {
    tags.into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(IoError::malformed(
                        kind,
                        Some(id),
                        format!("tag '{key}' is not a scalar"),
                    ))
                }
            };
            Ok((key, text))
        })
        .collect()
}

fn tags_from_attributes(attributes: &AttributeMap) -> BTreeMap<String, Value> {
    attributes
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.value().to_string())))
        .collect()
}

struct YamlWriter<'a> {
    projector: &'a dyn Projector,
}

impl Writer for YamlWriter<'_> {
    fn write(&self, records: &RecordSet, policy: &mut ErrorPolicy<'_>) -> Result<String> {
        let projected = project_nodes(records, self.projector, policy)?;
        let records = &*projected.records;

        let document = YamlDocument {
            nodes: records
                .nodes
                .iter()
                .zip(&projected.positions)
                .map(|(node, gps)| YamlNode {
                    id: node.id,
                    lat: gps.lat,
                    lon: gps.lon,
                    ele: gps.ele,
                    tags: tags_from_attributes(&node.attributes),
                })
                .collect(),
            ways: records
                .ways
                .iter()
                .map(|way| YamlWay {
                    id: way.id,
                    nodes: way.nodes.clone(),
                    tags: tags_from_attributes(&way.attributes),
                })
                .collect(),
            relations: records
                .relations
                .iter()
                .map(|relation| YamlRelation {
                    id: relation.id,
                    tags: tags_from_attributes(&relation.attributes),
                    members: relation
                        .members
                        .iter()
                        .map(|m| YamlMember {
                            kind: m.kind.into(),
                            id: m.id,
                            role: m.role.clone(),
                        })
                        .collect(),
                })
                .collect(),
        };
        Ok(serde_yaml_ng::to_string(&document)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ErrorMessages;
    use lanemap_core::{Origin, SphericalMercatorProjector};
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
nodes:
  - id: 1
    lat: 49.0
    lon: 8.4
    ele: 3
  - id: 2
    lat: 49.0001
    lon: 8.4
    tags:
      name: corner
      height: 2.5
  - id: 3
    lon: 8.4
ways:
  - id: 10
    nodes: [1, 2]
    tags:
      type: stop_line
relations:
  - id: 20
    tags:
      type: regulatory_element
      subtype: traffic_light
    members:
      - {type: way, ref: 10, role: refers}
  - id: 21
    members:
      - {type: area, ref: 10, role: refers}
"#;

    fn projector() -> SphericalMercatorProjector {
        SphericalMercatorProjector::new(Origin::new(GpsPoint::new(49.0, 8.4, 0.0)))
    }

    #[test]
    fn test_parse_robust() {
        let projector = projector();
        let config = Configuration::new();
        let parser = yaml_parser(&projector, &config).unwrap();
        let mut errors = ErrorMessages::new();
        let records = parser
            .parse(SAMPLE, &mut ErrorPolicy::Robust(&mut errors))
            .unwrap();

        assert_eq!(records.nodes.len(), 2);
        assert_eq!(records.nodes[0].position.z, 3.0);
        assert_eq!(records.nodes[1].attributes.value("height"), Some("2.5"));
        assert_eq!(records.ways[0].attributes.value("type"), Some("stop_line"));
        assert_eq!(records.relations.len(), 1);
        assert_eq!(
            records.relations[0].members,
            vec![Member::new("refers", MemberKind::Way, 10)]
        );

        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("node 3: "), "{}", errors[0]);
        assert!(errors[1].starts_with("relation 21: "), "{}", errors[1]);
    }

    #[test]
    fn test_parse_strict() {
        let projector = projector();
        let config = Configuration::new();
        let parser = yaml_parser(&projector, &config).unwrap();
        let err = parser.parse(SAMPLE, &mut ErrorPolicy::Strict).unwrap_err();
        assert!(matches!(err, IoError::MalformedRecord { id: Some(3), .. }));
    }

    #[test]
    fn test_parse_not_a_document() {
        let projector = projector();
        let config = Configuration::new();
        let parser = yaml_parser(&projector, &config).unwrap();
        let mut errors = ErrorMessages::new();
        let result = parser.parse("42", &mut ErrorPolicy::Robust(&mut errors));
        assert!(matches!(result, Err(IoError::Yaml(_))));
    }

    #[test]
    fn test_write_then_parse() {
        let projector = projector();
        let config = Configuration::new();
        let parser = yaml_parser(&projector, &config).unwrap();
        let mut errors = ErrorMessages::new();
        let records = parser
            .parse(SAMPLE, &mut ErrorPolicy::Robust(&mut errors))
            .unwrap();

        let writer = yaml_writer(&projector, &config).unwrap();
        let text = writer.write(&records, &mut ErrorPolicy::Strict).unwrap();
        let reparsed = parser.parse(&text, &mut ErrorPolicy::Strict).unwrap();

        assert_eq!(reparsed.ways, records.ways);
        assert_eq!(reparsed.relations, records.relations);
        assert_eq!(reparsed.nodes.len(), records.nodes.len());
        assert_eq!(reparsed.nodes[1].attributes, records.nodes[1].attributes);
    }
}
