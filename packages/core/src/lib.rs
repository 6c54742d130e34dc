//! Lanemap Core - road-network regulatory relations.
//!
//! This crate holds the data model shared by every map format:
//!
//! - [`attributes`]: string attributes with soft typed accessors
//! - [`primitives`]: points, linestrings, polygons and lanelets
//! - [`roles`]: generic relation data (named roles of primitive references)
//! - [`regulatory`]: typed regulatory elements over that data
//! - [`registry`]: rule name to typed relation factories
//! - [`map`]: the id-keyed map that owns all primitives
//! - [`projection`]: the geodetic/local projector interface
//!
//! # Example
//!
//! ```
//! use lanemap_core::{AttributeMap, ManeuverType, RightOfWay};
//!
//! let rule = RightOfWay::make(1, AttributeMap::new(), &[10], &[11], None).unwrap();
//! assert_eq!(rule.get_maneuver(11), ManeuverType::Yield);
//! assert_eq!(rule.get_maneuver(12), ManeuverType::Unknown);
//! ```

pub mod attributes;
pub mod config;
pub mod error;
pub mod map;
pub mod primitives;
pub mod projection;
pub mod registry;
pub mod regulatory;
pub mod roles;

// Re-export commonly used items
pub use attributes::{AttributeMap, AttributeValue};
pub use error::{CoreError, Result};
pub use map::{LaneletMap, Layer};
pub use primitives::{BasicPoint3d, Id, Lanelet, LineString, Point, Polygon};
pub use projection::{GpsPoint, Origin, Projector, SphericalMercatorProjector};
pub use registry::{create_relation_registry, RelationFactory, RelationTypeRegistry};
pub use regulatory::{
    ManeuverType, RegulatoryElement, RegulatoryRule, RightOfWay, SignGroup, SpeedLimit,
    TrafficLight, TrafficSign,
};
pub use roles::{RoleStore, RuleParameter};
