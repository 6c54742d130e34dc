//! Load and save entry points.

use std::fs;
use std::path::Path;

use lanemap_core::{create_relation_registry, LaneletMap, Projector, RelationTypeRegistry};

use crate::assemble::{build_map, records_from_map};
use crate::config::Configuration;
use crate::error::Result;
use crate::registry::{
    create_handler_registry, ErrorMessages, ErrorPolicy, HandlerRegistry, ParserFactory,
    WriterFactory,
};

/// Loads and saves maps through the registered formats.
///
/// Holds the handler registry, the relation registry and the options
/// handed to every handler. Build it once and share it; loading and
/// saving only read from it.
///
/// Every entry point takes an optional error sink. Without one a call is
/// strict and fails on the first bad record. With one it is robust: bad
/// records are described in the sink and left out of the result.
#[derive(Debug)]
pub struct MapIo {
    handlers: HandlerRegistry,
    relations: RelationTypeRegistry,
    config: Configuration,
}

impl MapIo {
    #[must_use]
    pub fn new(handlers: HandlerRegistry, relations: RelationTypeRegistry) -> Self {
        Self {
            handlers,
            relations,
            config: Configuration::new(),
        }
    }

    /// Options passed to every handler.
    #[must_use]
    pub fn with_config(mut self, config: Configuration) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn handlers_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.handlers
    }

    #[must_use]
    pub fn relations(&self) -> &RelationTypeRegistry {
        &self.relations
    }

    pub fn relations_mut(&mut self) -> &mut RelationTypeRegistry {
        &mut self.relations
    }

    #[must_use]
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Load a map, picking the format by file extension.
    ///
    /// # Errors
    /// `UnsupportedFormat`, IO and document errors always; record errors
    /// only without an error sink.
    pub fn load(
        &self,
        path: impl AsRef<Path>,
        projector: &dyn Projector,
        errors: Option<&mut ErrorMessages>,
    ) -> Result<LaneletMap> {
        self.load_with_format(path, None, projector, errors)
    }

    /// Load a map, with an explicit format name overriding the extension.
    ///
    /// # Errors
    /// See [`load`](Self::load).
    pub fn load_with_format(
        &self,
        path: impl AsRef<Path>,
        format: Option<&str>,
        projector: &dyn Projector,
        errors: Option<&mut ErrorMessages>,
    ) -> Result<LaneletMap> {
        let path = path.as_ref();
        let handler = self.handlers.select_parser(path, format)?;
        let input = fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "Loading map");
        self.read_records(handler, &input, projector, errors)
    }

    /// Load a map robustly, returning it with the collected errors.
    ///
    /// # Errors
    /// Only failures that are not about a single record.
    pub fn load_robust(
        &self,
        path: impl AsRef<Path>,
        projector: &dyn Projector,
    ) -> Result<(LaneletMap, ErrorMessages)> {
        let mut errors = ErrorMessages::new();
        let map = self.load(path, projector, Some(&mut errors))?;
        Ok((map, errors))
    }

    /// Parse a map from text in the named format.
    ///
    /// # Errors
    /// See [`load`](Self::load).
    pub fn parse_str(
        &self,
        input: &str,
        format: &str,
        projector: &dyn Projector,
        errors: Option<&mut ErrorMessages>,
    ) -> Result<LaneletMap> {
        let handler = self.handlers.select_parser(Path::new(""), Some(format))?;
        self.read_records(handler, input, projector, errors)
    }

    /// Write a map, picking the format by file extension.
    ///
    /// The file is only created once the whole map has been serialized, so
    /// a failing strict write leaves no partial file behind.
    ///
    /// # Errors
    /// `UnsupportedFormat`, IO errors always; record errors only without
    /// an error sink.
    pub fn write(
        &self,
        path: impl AsRef<Path>,
        map: &LaneletMap,
        projector: &dyn Projector,
        errors: Option<&mut ErrorMessages>,
    ) -> Result<()> {
        self.write_with_format(path, None, map, projector, errors)
    }

    /// Write a map, with an explicit format name overriding the extension.
    ///
    /// # Errors
    /// See [`write`](Self::write).
    pub fn write_with_format(
        &self,
        path: impl AsRef<Path>,
        format: Option<&str>,
        map: &LaneletMap,
        projector: &dyn Projector,
        errors: Option<&mut ErrorMessages>,
    ) -> Result<()> {
        let path = path.as_ref();
        let handler = self.handlers.select_writer(path, format)?;
        let output = self.write_records(handler, map, projector, errors)?;
        fs::write(path, output)?;
        tracing::debug!(path = %path.display(), "Wrote map file");
        Ok(())
    }

    /// Write a map robustly, returning the collected errors.
    ///
    /// # Errors
    /// Only failures that are not about a single record.
    pub fn write_robust(
        &self,
        path: impl AsRef<Path>,
        map: &LaneletMap,
        projector: &dyn Projector,
    ) -> Result<ErrorMessages> {
        let mut errors = ErrorMessages::new();
        self.write(path, map, projector, Some(&mut errors))?;
        Ok(errors)
    }

    /// Serialize a map to text in the named format.
    ///
    /// # Errors
    /// See [`write`](Self::write).
    pub fn write_string(
        &self,
        map: &LaneletMap,
        format: &str,
        projector: &dyn Projector,
        errors: Option<&mut ErrorMessages>,
    ) -> Result<String> {
        let handler = self.handlers.select_writer(Path::new(""), Some(format))?;
        self.write_records(handler, map, projector, errors)
    }

    fn read_records(
        &self,
        handler: ParserFactory,
        input: &str,
        projector: &dyn Projector,
        errors: Option<&mut ErrorMessages>,
    ) -> Result<LaneletMap> {
        let parser = handler(projector, &self.config)?;
        let mut policy = ErrorPolicy::from_sink(errors);
        let records = parser.parse(input, &mut policy)?;
        let map = build_map(records, &self.relations, &mut policy)?;
        log_outcome("Loaded map", &policy);
        Ok(map)
    }

    fn write_records(
        &self,
        handler: WriterFactory,
        map: &LaneletMap,
        projector: &dyn Projector,
        errors: Option<&mut ErrorMessages>,
    ) -> Result<String> {
        let writer = handler(projector, &self.config)?;
        let mut policy = ErrorPolicy::from_sink(errors);
        let records = records_from_map(map, &mut policy)?;
        let output = writer.write(&records, &mut policy)?;
        log_outcome("Wrote map", &policy);
        Ok(output)
    }
}

impl Default for MapIo {
    /// The bundled formats and the built-in rule kinds.
    fn default() -> Self {
        Self::new(create_handler_registry(), create_relation_registry())
    }
}

fn log_outcome(message: &str, policy: &ErrorPolicy<'_>) {
    match policy.recorded() {
        0 => tracing::debug!("{message}"),
        skipped => tracing::warn!(skipped, "{message} with skipped records"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IoError;
    use lanemap_core::SphericalMercatorProjector;

    #[test]
    fn test_unknown_format_name() {
        let io = MapIo::default();
        let projector = SphericalMercatorProjector::default();
        let err = io.parse_str("", "pbf", &projector, None).unwrap_err();
        assert!(matches!(err, IoError::UnsupportedFormat(name) if name == "pbf"));
    }

    #[test]
    fn test_missing_file_is_io_error_even_when_robust() {
        let io = MapIo::default();
        let projector = SphericalMercatorProjector::default();
        let err = io
            .load_robust("/nonexistent/town.osm", &projector)
            .unwrap_err();
        assert!(matches!(err, IoError::Io(_)));
    }

    #[test]
    fn test_empty_map_round_trips_as_text() {
        let io = MapIo::default();
        let projector = SphericalMercatorProjector::default();
        let text = io
            .write_string(&LaneletMap::new(), "osm", &projector, None)
            .unwrap();
        let map = io.parse_str(&text, "osm", &projector, None).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_file_and_text_take_the_same_path() {
        let io = MapIo::default();
        let projector = SphericalMercatorProjector::default();
        let text = r#"<osm><node id="1" lat="0" lon="0"/><node id="1" lat="0" lon="0"/></osm>"#;
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("twice.osm");
        fs::write(&path, text).unwrap();

        let mut from_file = ErrorMessages::new();
        let file_map = io.load(&path, &projector, Some(&mut from_file)).unwrap();
        let mut from_text = ErrorMessages::new();
        let text_map = io
            .parse_str(text, "osm", &projector, Some(&mut from_text))
            .unwrap();

        assert_eq!(from_file, vec!["node 1: duplicate id".to_string()]);
        assert_eq!(from_text, from_file);
        assert!(file_map.is_empty() && text_map.is_empty());

        let written = io.write_string(&text_map, "osm", &projector, None).unwrap();
        io.write(&path, &file_map, &projector, None).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), written);
    }
}
