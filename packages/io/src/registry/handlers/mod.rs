//! Bundled format handlers.

mod osm;
mod yaml;

pub use osm::{osm_parser, osm_writer};
pub use yaml::{yaml_parser, yaml_writer};

use std::borrow::Cow;

use lanemap_core::{GpsPoint, Projector};

use super::types::ErrorPolicy;
use crate::error::{IoError, Result};
use crate::record::RecordSet;

/// Records ready to write, with the geodetic position of every node.
pub(crate) struct Projected<'r> {
    pub records: Cow<'r, RecordSet>,
    pub positions: Vec<GpsPoint>,
}

/// Project every node back to geodetic coordinates.
///
/// Nodes that do not land on finite coordinates are reported and dropped,
/// together with everything that references them.
pub(crate) fn project_nodes<'r>(
    records: &'r RecordSet,
    projector: &dyn Projector,
    policy: &mut ErrorPolicy<'_>,
) -> Result<Projected<'r>> {
    let positions: Vec<GpsPoint> = records
        .nodes
        .iter()
        .map(|n| projector.reverse(n.position))
        .collect();
    if positions.iter().all(is_finite) {
        return Ok(Projected {
            records: Cow::Borrowed(records),
            positions,
        });
    }

    let mut kept = records.clone();
    let mut kept_positions = Vec::with_capacity(positions.len());
    let mut nodes = Vec::with_capacity(kept.nodes.len());
    for (node, gps) in kept.nodes.drain(..).zip(positions) {
        if is_finite(&gps) {
            nodes.push(node);
            kept_positions.push(gps);
        } else {
            policy.record(IoError::malformed(
                "node",
                Some(node.id),
                "position does not project to finite coordinates",
            ))?;
        }
    }
    kept.nodes = nodes;
    kept.prune_dangling(policy)?;
    Ok(Projected {
        records: Cow::Owned(kept),
        positions: kept_positions,
    })
}

fn is_finite(gps: &GpsPoint) -> bool {
    gps.lat.is_finite() && gps.lon.is_finite() && gps.ele.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{NodeRecord, WayRecord};
    use crate::registry::ErrorMessages;
    use lanemap_core::{AttributeMap, BasicPoint3d, SphericalMercatorProjector};

    fn records(x: f64) -> RecordSet {
        RecordSet {
            nodes: vec![
                NodeRecord {
                    id: 1,
                    position: BasicPoint3d::new(0.0, 0.0, 0.0),
                    attributes: AttributeMap::new(),
                },
                NodeRecord {
                    id: 2,
                    position: BasicPoint3d::new(x, 0.0, 0.0),
                    attributes: AttributeMap::new(),
                },
            ],
            ways: vec![WayRecord {
                id: 10,
                nodes: vec![1, 2],
                attributes: AttributeMap::new(),
            }],
            relations: Vec::new(),
        }
    }

    #[test]
    fn test_finite_nodes_are_borrowed() {
        let input = records(5.0);
        let projected =
            project_nodes(&input, &SphericalMercatorProjector::default(), &mut ErrorPolicy::Strict)
                .unwrap();
        assert!(matches!(projected.records, Cow::Borrowed(_)));
        assert_eq!(projected.positions.len(), 2);
    }

    #[test]
    fn test_non_finite_node_is_dropped_with_dependents() {
        let input = records(f64::NAN);
        let mut errors = ErrorMessages::new();
        let projected = project_nodes(
            &input,
            &SphericalMercatorProjector::default(),
            &mut ErrorPolicy::Robust(&mut errors),
        )
        .unwrap();
        assert_eq!(projected.records.nodes.len(), 1);
        assert!(projected.records.ways.is_empty());
        assert_eq!(projected.positions.len(), 1);
        assert_eq!(errors.len(), 2);
    }
}
