//! OSM XML format, as written by JOSM.

use std::borrow::Cow;
use std::fmt::Write as _;

use lanemap_core::{AttributeMap, GpsPoint, Id, Projector};
use roxmltree::{Document, Node};

use super::project_nodes;
use crate::config::{
    bool_option, choice_option, Configuration, ELEVATION_TAG, JOSM_FORMAT_ELEVATION,
    JOSM_UPLOAD, JOSM_UPLOAD_VALUES,
};
use crate::error::{IoError, Result};
use crate::record::{Member, MemberKind, NodeRecord, RecordSet, RelationRecord, WayRecord};
use crate::registry::{ErrorPolicy, Parser, Writer};
use crate::xml::{
    collect_tags, escape, find_children, get_tag_name, is_xml_text, parse_attribute,
    required_attribute,
};

const ROOT_TAG: &str = "osm";
const OSM_VERSION: &str = "0.6";
const GENERATOR: &str = "lanemap";

/// Parser factory registered for the `osm` format.
///
/// # Errors
/// Never; the parser takes no options.
pub fn osm_parser<'a>(
    projector: &'a dyn Projector,
    _config: &'a Configuration,
) -> Result<Box<dyn Parser + 'a>> {
    Ok(Box::new(OsmParser { projector }))
}

/// Writer factory registered for the `osm` format.
///
/// # Errors
/// `InvalidConfig` for a bad `josm_upload` or `josm_format_elevation`.
pub fn osm_writer<'a>(
    projector: &'a dyn Projector,
    config: &'a Configuration,
) -> Result<Box<dyn Writer + 'a>> {
    let upload = choice_option(config, JOSM_UPLOAD, &JOSM_UPLOAD_VALUES)?.unwrap_or("false");
    let format_elevation = bool_option(config, JOSM_FORMAT_ELEVATION)?.unwrap_or(false);
    Ok(Box::new(OsmWriter {
        projector,
        upload,
        format_elevation,
    }))
}

struct OsmParser<'a> {
    projector: &'a dyn Projector,
}

impl Parser for OsmParser<'_> {
    fn parse(&self, input: &str, policy: &mut ErrorPolicy<'_>) -> Result<RecordSet> {
        let doc = Document::parse(input)?;
        let root = doc.root_element();
        if get_tag_name(root) != ROOT_TAG {
            return Err(IoError::InvalidDocument(format!(
                "expected <{ROOT_TAG}> root, found <{}>",
                get_tag_name(root)
            )));
        }

        let mut records = RecordSet::new();
        for element in find_children(root, "node").filter(|e| !is_deleted(*e)) {
            match self.parse_node(element) {
                Ok(node) => records.nodes.push(node),
                Err(err) => policy.record(err)?,
            }
        }
        for element in find_children(root, "way").filter(|e| !is_deleted(*e)) {
            match parse_way(element) {
                Ok(way) => records.ways.push(way),
                Err(err) => policy.record(err)?,
            }
        }
        for element in find_children(root, "relation").filter(|e| !is_deleted(*e)) {
            match parse_relation(element) {
                Ok(relation) => records.relations.push(relation),
                Err(err) => policy.record(err)?,
            }
        }

        tracing::debug!(
            nodes = records.nodes.len(),
            ways = records.ways.len(),
            relations = records.relations.len(),
            "Parsed OSM document"
        );
        Ok(records)
    }
}

impl OsmParser<'_> {
    fn parse_node(&self, element: Node<'_, '_>) -> Result<NodeRecord> {
        let id: Id = parse_attribute(element, "id", "node", None)?;
        let lat: f64 = parse_attribute(element, "lat", "node", Some(id))?;
        let lon: f64 = parse_attribute(element, "lon", "node", Some(id))?;
        let mut attributes = collect_tags(element, "node", id)?;
        let ele = match attributes.remove(ELEVATION_TAG) {
            Some(value) => value.as_float().ok_or_else(|| {
                IoError::malformed("node", Some(id), format!("invalid elevation '{value}'"))
            })?,
            None => 0.0,
        };
        Ok(NodeRecord {
            id,
            position: self.projector.forward(GpsPoint::new(lat, lon, ele)),
            attributes,
        })
    }
}

fn parse_way(element: Node<'_, '_>) -> Result<WayRecord> {
    let id: Id = parse_attribute(element, "id", "way", None)?;
    let nodes = find_children(element, "nd")
        .map(|nd| parse_attribute(nd, "ref", "way", Some(id)))
        .collect::<Result<Vec<Id>>>()?;
    Ok(WayRecord {
        id,
        nodes,
        attributes: collect_tags(element, "way", id)?,
    })
}

fn parse_relation(element: Node<'_, '_>) -> Result<RelationRecord> {
    let id: Id = parse_attribute(element, "id", "relation", None)?;
    let members = find_children(element, "member")
        .map(|member| -> Result<Member> {
            let kind_name = required_attribute(member, "type", "relation", Some(id))?;
            let kind = MemberKind::parse(kind_name).ok_or_else(|| {
                IoError::malformed("relation", Some(id), format!("unknown member type '{kind_name}'"))
            })?;
            let ref_id = parse_attribute(member, "ref", "relation", Some(id))?;
            let role = required_attribute(member, "role", "relation", Some(id))?;
            Ok(Member::new(role, kind, ref_id))
        })
        .collect::<Result<Vec<Member>>>()?;
    Ok(RelationRecord {
        id,
        attributes: collect_tags(element, "relation", id)?,
        members,
    })
}

/// JOSM keeps deleted objects in the file until upload.
fn is_deleted(element: Node<'_, '_>) -> bool {
    element.attribute("action") == Some("delete")
}

struct OsmWriter<'a> {
    projector: &'a dyn Projector,
    upload: &'a str,
    format_elevation: bool,
}

impl Writer for OsmWriter<'_> {
    fn write(&self, records: &RecordSet, policy: &mut ErrorPolicy<'_>) -> Result<String> {
        let representable = drop_unrepresentable(records, policy)?;
        let projected = project_nodes(&representable, self.projector, policy)?;
        let records = &*projected.records;

        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            out,
            "<{ROOT_TAG} version=\"{OSM_VERSION}\" upload=\"{}\" generator=\"{GENERATOR}\">",
            self.upload
        );

        for (node, gps) in records.nodes.iter().zip(&projected.positions) {
            let _ = write!(out, "  <node id=\"{}\" lat=\"{}\" lon=\"{}\"", node.id, gps.lat, gps.lon);
            let elevation = self.elevation(gps.ele);
            let elevation_tag = [(ELEVATION_TAG, elevation.as_str())];
            write_body(&mut out, "node", &[], &node.attributes, &elevation_tag);
        }
        for way in &records.ways {
            let _ = write!(out, "  <way id=\"{}\"", way.id);
            let refs: Vec<String> = way
                .nodes
                .iter()
                .map(|id| format!("<nd ref=\"{id}\"/>"))
                .collect();
            write_body(&mut out, "way", &refs, &way.attributes, &[]);
        }
        for relation in &records.relations {
            let _ = write!(out, "  <relation id=\"{}\"", relation.id);
            let members: Vec<String> = relation
                .members
                .iter()
                .map(|m| {
                    format!(
                        "<member type=\"{}\" ref=\"{}\" role=\"{}\"/>",
                        m.kind.as_str(),
                        m.id,
                        escape(&m.role)
                    )
                })
                .collect();
            write_body(&mut out, "relation", &members, &relation.attributes, &[]);
        }

        let _ = writeln!(out, "</{ROOT_TAG}>");
        Ok(out)
    }
}

impl OsmWriter<'_> {
    fn elevation(&self, ele: f64) -> String {
        if self.format_elevation {
            format!("{ele:.2}")
        } else {
            ele.to_string()
        }
    }
}

/// Leave out records whose tags or member roles hold characters XML
/// cannot carry, together with everything that references them.
fn drop_unrepresentable<'r>(
    records: &'r RecordSet,
    policy: &mut ErrorPolicy<'_>,
) -> Result<Cow<'r, RecordSet>> {
    let mut failures = Vec::new();
    for node in &records.nodes {
        if let Some(reason) = unrepresentable_tag(&node.attributes) {
            failures.push((MemberKind::Node, node.id, reason));
        }
    }
    for way in &records.ways {
        if let Some(reason) = unrepresentable_tag(&way.attributes) {
            failures.push((MemberKind::Way, way.id, reason));
        }
    }
    for relation in &records.relations {
        let role = relation.members.iter().find(|m| !is_xml_text(&m.role));
        let reason = match role {
            Some(member) => Some(format!(
                "member role '{}' is not representable in XML",
                member.role.escape_debug()
            )),
            None => unrepresentable_tag(&relation.attributes),
        };
        if let Some(reason) = reason {
            failures.push((MemberKind::Relation, relation.id, reason));
        }
    }
    if failures.is_empty() {
        return Ok(Cow::Borrowed(records));
    }

    let mut kept = records.clone();
    let dropped = |kind: MemberKind, id: Id| failures.iter().any(|f| f.0 == kind && f.1 == id);
    kept.nodes.retain(|n| !dropped(MemberKind::Node, n.id));
    kept.ways.retain(|w| !dropped(MemberKind::Way, w.id));
    kept.relations.retain(|r| !dropped(MemberKind::Relation, r.id));
    for (kind, id, reason) in failures {
        policy.record(IoError::malformed(kind.as_str(), Some(id), reason))?;
    }
    kept.prune_dangling(policy)?;
    Ok(Cow::Owned(kept))
}

fn unrepresentable_tag(attributes: &AttributeMap) -> Option<String> {
    attributes
        .iter()
        .find(|(key, value)| !is_xml_text(key) || !is_xml_text(value.value()))
        .map(|(key, _)| format!("tag '{}' is not representable in XML", key.escape_debug()))
}

/// Close the open start tag and write children, tags and the end tag.
fn write_body(
    out: &mut String,
    tag: &str,
    children: &[String],
    attributes: &AttributeMap,
    extra_tags: &[(&str, &str)],
) {
    if children.is_empty() && attributes.is_empty() && extra_tags.is_empty() {
        out.push_str("/>\n");
        return;
    }
    out.push_str(">\n");
    for child in children {
        let _ = writeln!(out, "    {child}");
    }
    let tags = extra_tags
        .iter()
        .copied()
        .chain(attributes.iter().map(|(k, v)| (k, v.value())));
    for (key, value) in tags {
        let _ = writeln!(out, "    <tag k=\"{}\" v=\"{}\"/>", escape(key), escape(value));
    }
    let _ = writeln!(out, "  </{tag}>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ErrorMessages;
    use lanemap_core::{Origin, SphericalMercatorProjector};
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="JOSM">
  <node id="1" lat="49.0" lon="8.4"><tag k="ele" v="112.5"/></node>
  <node id="2" lat="49.0001" lon="8.4"/>
  <node id="3" lat="49.0002" lon="8.4" action="delete"/>
  <node id="4" lon="8.4"/>
  <way id="10">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="type" v="stop_line"/>
  </way>
  <relation id="20">
    <member type="way" ref="10" role="ref_line"/>
    <member type="way" ref="10" role="refers"/>
    <tag k="type" v="regulatory_element"/>
    <tag k="subtype" v="traffic_light"/>
  </relation>
</osm>"#;

    fn projector() -> SphericalMercatorProjector {
        SphericalMercatorProjector::new(Origin::new(GpsPoint::new(49.0, 8.4, 0.0)))
    }

    #[test]
    fn test_parse_robust_skips_malformed_node() {
        let projector = projector();
        let config = Configuration::new();
        let parser = osm_parser(&projector, &config).unwrap();
        let mut errors = ErrorMessages::new();
        let records = parser
            .parse(SAMPLE, &mut ErrorPolicy::Robust(&mut errors))
            .unwrap();

        assert_eq!(records.nodes.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(errors, vec!["node 4: missing attribute 'lat'".to_string()]);

        let origin = &records.nodes[0];
        assert!(origin.position.x.abs() < 1e-6);
        assert!((origin.position.z - 112.5).abs() < 1e-9);
        assert!(origin.attributes.is_empty());

        assert_eq!(records.ways[0].nodes, vec![1, 2]);
        let relation = &records.relations[0];
        assert_eq!(relation.rule_name(), Some("traffic_light"));
        assert_eq!(relation.members[0], Member::new("ref_line", MemberKind::Way, 10));
    }

    #[test]
    fn test_parse_strict_fails_on_malformed_node() {
        let projector = projector();
        let config = Configuration::new();
        let parser = osm_parser(&projector, &config).unwrap();
        let err = parser.parse(SAMPLE, &mut ErrorPolicy::Strict).unwrap_err();
        assert!(matches!(err, IoError::MalformedRecord { id: Some(4), .. }));
    }

    #[test]
    fn test_parse_rejects_other_documents() {
        let projector = projector();
        let config = Configuration::new();
        let parser = osm_parser(&projector, &config).unwrap();
        let mut errors = ErrorMessages::new();
        let mut policy = ErrorPolicy::Robust(&mut errors);
        assert!(matches!(
            parser.parse("<gpx/>", &mut policy),
            Err(IoError::InvalidDocument(_))
        ));
        assert!(matches!(parser.parse("<osm>", &mut policy), Err(IoError::Xml(_))));
    }

    #[test]
    fn test_writer_rejects_bad_upload_option() {
        let projector = projector();
        let config = Configuration::new().with(JOSM_UPLOAD, "maybe");
        assert!(matches!(
            osm_writer(&projector, &config),
            Err(IoError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_write_layout() {
        let projector = projector();
        let config = Configuration::new()
            .with(JOSM_UPLOAD, "never")
            .with(JOSM_FORMAT_ELEVATION, true);
        let writer = osm_writer(&projector, &config).unwrap();
        let records = RecordSet {
            nodes: vec![NodeRecord {
                id: 1,
                position: lanemap_core::BasicPoint3d::new(0.0, 0.0, 3.0),
                attributes: AttributeMap::new(),
            }],
            ways: vec![WayRecord {
                id: 10,
                nodes: vec![1],
                attributes: AttributeMap::new().with("name", "A & B"),
            }],
            relations: Vec::new(),
        };
        let xml = writer.write(&records, &mut ErrorPolicy::Strict).unwrap();

        assert!(xml.contains(r#"<osm version="0.6" upload="never" generator="lanemap">"#));
        assert!(xml.contains(r#"<tag k="ele" v="3.00"/>"#));
        assert!(xml.contains(r#"<nd ref="1"/>"#));
        assert!(xml.contains(r#"<tag k="name" v="A &amp; B"/>"#));
    }

    #[test]
    fn test_write_leaves_out_tags_xml_cannot_carry() {
        let projector = projector();
        let config = Configuration::new();
        let writer = osm_writer(&projector, &config).unwrap();
        let node = |id: Id, name: &str| NodeRecord {
            id,
            position: lanemap_core::BasicPoint3d::default(),
            attributes: AttributeMap::new().with("name", name),
        };
        let records = RecordSet {
            nodes: vec![node(1, "a\u{1}b"), node(2, "fine"), node(3, "also fine")],
            ways: vec![
                WayRecord {
                    id: 10,
                    nodes: vec![1, 2],
                    attributes: AttributeMap::new(),
                },
                WayRecord {
                    id: 11,
                    nodes: vec![2, 3],
                    attributes: AttributeMap::new(),
                },
            ],
            relations: vec![RelationRecord {
                id: 20,
                attributes: AttributeMap::new(),
                members: vec![Member::new("refers\u{0}", MemberKind::Way, 11)],
            }],
        };

        let err = writer.write(&records, &mut ErrorPolicy::Strict).unwrap_err();
        assert!(matches!(err, IoError::MalformedRecord { id: Some(1), .. }));

        let mut errors = ErrorMessages::new();
        let xml = writer
            .write(&records, &mut ErrorPolicy::Robust(&mut errors))
            .unwrap();
        assert_eq!(
            errors,
            vec![
                "node 1: tag 'name' is not representable in XML".to_string(),
                "relation 20: member role 'refers\\0' is not representable in XML".to_string(),
                "way 10: Role 'nodes' of 10 references missing point 1".to_string(),
            ]
        );

        let parser = osm_parser(&projector, &config).unwrap();
        let reparsed = parser.parse(&xml, &mut ErrorPolicy::Strict).unwrap();
        assert_eq!(reparsed.nodes.iter().map(|n| n.id).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(reparsed.ways.iter().map(|w| w.id).collect::<Vec<_>>(), vec![11]);
        assert!(reparsed.relations.is_empty());
    }

    #[test]
    fn test_write_then_parse_keeps_records() {
        let projector = projector();
        let config = Configuration::new();
        let parser = osm_parser(&projector, &config).unwrap();
        let mut errors = ErrorMessages::new();
        let records = parser
            .parse(SAMPLE, &mut ErrorPolicy::Robust(&mut errors))
            .unwrap();

        let writer = osm_writer(&projector, &config).unwrap();
        let xml = writer.write(&records, &mut ErrorPolicy::Strict).unwrap();
        let reparsed = parser.parse(&xml, &mut ErrorPolicy::Strict).unwrap();

        assert_eq!(reparsed.ways, records.ways);
        assert_eq!(reparsed.relations, records.relations);
        for (a, b) in reparsed.nodes.iter().zip(&records.nodes) {
            assert_eq!(a.id, b.id);
            assert!((a.position.x - b.position.x).abs() < 1e-6);
            assert!((a.position.y - b.position.y).abs() < 1e-6);
            assert!((a.position.z - b.position.z).abs() < 1e-9);
        }
    }
}
