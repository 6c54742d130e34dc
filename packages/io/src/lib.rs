//! Lanemap IO - load and save road network maps.
//!
//! Maps are read and written through format handlers registered by name
//! and file extension. Relations found in a file are upgraded to typed
//! regulatory elements through the relation registry of `lanemap-core`.
//!
//! # Example
//!
//! ```
//! use lanemap_core::SphericalMercatorProjector;
//! use lanemap_io::MapIo;
//!
//! let io = MapIo::default();
//! let projector = SphericalMercatorProjector::default();
//! let xml = r#"<osm version="0.6">
//!   <node id="1" lat="0.0" lon="0.0"/>
//!   <node id="2" lat="0.0" lon="0.0001"/>
//!   <way id="10"><nd ref="1"/><nd ref="2"/></way>
//!   <relation id="20">
//!     <member type="way" ref="99" role="refers"/>
//!     <tag k="type" v="regulatory_element"/>
//!   </relation>
//! </osm>"#;
//!
//! let mut errors = Vec::new();
//! let map = io.parse_str(xml, "osm", &projector, Some(&mut errors)).unwrap();
//! assert_eq!(map.line_strings.len(), 1);
//! assert!(map.regulatory_elements.is_empty());
//! assert_eq!(errors.len(), 1);
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants and the handler option bag
//! - [`error`]: Error types and Result alias
//! - [`record`]: Format-agnostic records every handler reads and writes
//! - [`registry`]: Handler registry, parser/writer traits, bundled formats
//! - [`xml`]: XML utilities
//! - [`assemble`]: Conversion between records and the map
//! - [`map_io`]: Load and save entry points
//! - [`cli`]: Command-line interface

pub mod assemble;
pub mod cli;
pub mod config;
pub mod error;
pub mod map_io;
pub mod record;
pub mod registry;
pub mod xml;

pub use config::{ConfigValue, Configuration};
pub use error::{IoError, Result};
pub use map_io::MapIo;
pub use record::{Member, MemberKind, NodeRecord, RecordSet, RelationRecord, WayRecord};
pub use registry::{
    create_handler_registry, ErrorMessages, ErrorPolicy, FormatHandler, HandlerRegistry, Parser,
    Writer,
};
