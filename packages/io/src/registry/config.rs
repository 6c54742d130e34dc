//! Registry configuration for the bundled formats.

use super::core::{FormatHandler, HandlerRegistry};
use super::handlers::{osm_parser, osm_writer, yaml_parser, yaml_writer};
use crate::config::{OSM_EXTENSION, OSM_FORMAT, YAML_EXTENSION, YAML_FORMAT};

/// Create a handler registry holding the OSM XML and YAML formats.
#[must_use]
pub fn create_handler_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    for handler in [
        FormatHandler::new(OSM_FORMAT, OSM_EXTENSION)
            .with_parser(osm_parser)
            .with_writer(osm_writer),
        FormatHandler::new(YAML_FORMAT, YAML_EXTENSION)
            .with_parser(yaml_parser)
            .with_writer(yaml_writer),
    ] {
        if let Err(err) = registry.register(handler) {
            tracing::warn!(error = %err, "Bundled handler not registered");
        }
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_bundled_formats() {
        let registry = create_handler_registry();
        assert!(registry.has_handler("osm"));
        assert!(registry.has_handler("yaml"));
        assert!(registry.select_parser(Path::new("town.osm"), None).is_ok());
        assert!(registry.select_writer(Path::new("town.yaml"), None).is_ok());
        assert!(registry.select_parser(Path::new("town.yml"), None).is_err());
    }
}
