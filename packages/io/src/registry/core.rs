//! Handler registry mapping format names and extensions to handlers.

use std::collections::HashSet;
use std::path::Path;

use super::handler::{ParserFactory, WriterFactory};
use crate::error::{IoError, Result};

/// Descriptor of one file format.
#[derive(Clone)]
pub struct FormatHandler {
    /// Unique name, used for explicit format selection.
    pub name: String,
    /// Extension with the leading dot, or empty if the format is only
    /// selectable by name.
    pub extension: String,
    pub parser: Option<ParserFactory>,
    pub writer: Option<WriterFactory>,
}

impl FormatHandler {
    #[must_use]
    pub fn new(name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extension: extension.into(),
            parser: None,
            writer: None,
        }
    }

    #[must_use]
    pub fn with_parser(mut self, parser: ParserFactory) -> Self {
        self.parser = Some(parser);
        self
    }

    #[must_use]
    pub fn with_writer(mut self, writer: WriterFactory) -> Self {
        self.writer = Some(writer);
        self
    }

    #[must_use]
    pub fn can_parse(&self) -> bool {
        self.parser.is_some()
    }

    #[must_use]
    pub fn can_write(&self) -> bool {
        self.writer.is_some()
    }
}

impl std::fmt::Debug for FormatHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatHandler")
            .field("name", &self.name)
            .field("extension", &self.extension)
            .field("can_parse", &self.can_parse())
            .field("can_write", &self.can_write())
            .finish()
    }
}

/// Registry of file formats.
///
/// Handlers are kept in registration order; when two share an extension
/// the first one registered is selected.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: Vec<FormatHandler>,
}

impl HandlerRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a format handler.
    ///
    /// # Errors
    /// `DuplicateFormat` if a handler with the same name exists.
    pub fn register(&mut self, handler: FormatHandler) -> Result<()> {
        if self.get(&handler.name).is_some() {
            return Err(IoError::DuplicateFormat(handler.name));
        }
        tracing::debug!(
            format = %handler.name,
            extension = %handler.extension,
            "Registering format handler"
        );
        self.handlers.push(handler);
        Ok(())
    }

    /// Look up a handler by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FormatHandler> {
        self.handlers.iter().find(|h| h.name == name)
    }

    /// Check if a handler is registered under a name.
    #[must_use]
    pub fn has_handler(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Return set of all registered format names.
    #[must_use]
    pub fn registered_formats(&self) -> HashSet<&str> {
        self.handlers.iter().map(|h| h.name.as_str()).collect()
    }

    /// Handlers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FormatHandler> {
        self.handlers.iter()
    }

    /// Pick the parser for a file.
    ///
    /// An explicit `format` is matched by name; otherwise the file's
    /// trailing extension is matched, case-sensitively.
    ///
    /// # Errors
    /// `UnsupportedFormat` if no handler with a parser matches.
    pub fn select_parser(&self, path: &Path, format: Option<&str>) -> Result<ParserFactory> {
        self.select(path, format, |h| h.parser)
    }

    /// Pick the writer for a file. Selection works as for
    /// [`select_parser`](Self::select_parser).
    ///
    /// # Errors
    /// `UnsupportedFormat` if no handler with a writer matches.
    pub fn select_writer(&self, path: &Path, format: Option<&str>) -> Result<WriterFactory> {
        self.select(path, format, |h| h.writer)
    }

    fn select<F>(
        &self,
        path: &Path,
        format: Option<&str>,
        capability: impl Fn(&FormatHandler) -> Option<F>,
    ) -> Result<F> {
        if let Some(name) = format {
            return self
                .get(name)
                .and_then(&capability)
                .ok_or_else(|| IoError::UnsupportedFormat(name.to_string()));
        }

        let extension = file_extension(path)
            .ok_or_else(|| IoError::UnsupportedFormat(path.display().to_string()))?;
        let found = self
            .handlers
            .iter()
            .filter(|h| !h.extension.is_empty() && h.extension == extension)
            .find_map(&capability);
        match found {
            Some(factory) => {
                tracing::debug!(extension = %extension, "Selected handler by extension");
                Ok(factory)
            }
            None => Err(IoError::UnsupportedFormat(extension)),
        }
    }
}

/// Trailing extension of a file name, with the leading dot.
fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::record::RecordSet;
    use crate::registry::{ErrorPolicy, Parser};
    use lanemap_core::Projector;

    struct EmptyParser;

    impl Parser for EmptyParser {
        fn parse(&self, _input: &str, _policy: &mut ErrorPolicy<'_>) -> Result<RecordSet> {
            Ok(RecordSet::new())
        }
    }

    fn empty_parser<'a>(
        _projector: &'a dyn Projector,
        _config: &'a Configuration,
    ) -> Result<Box<dyn Parser + 'a>> {
        Ok(Box::new(EmptyParser))
    }

    fn sample_registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry
            .register(FormatHandler::new("dummy", ".dmy").with_parser(empty_parser))
            .unwrap();
        registry
            .register(FormatHandler::new("named_only", "").with_parser(empty_parser))
            .unwrap();
        registry
    }

    #[test]
    fn test_register_duplicate_rejected() {
        let mut registry = sample_registry();
        let err = registry
            .register(FormatHandler::new("dummy", ".other"))
            .unwrap_err();
        assert!(matches!(err, IoError::DuplicateFormat(name) if name == "dummy"));
        assert_eq!(registry.registered_formats().len(), 2);
    }

    #[test]
    fn test_select_by_extension() {
        let registry = sample_registry();
        assert!(registry.select_parser(Path::new("maps/a.dmy"), None).is_ok());
        assert!(matches!(
            registry.select_parser(Path::new("a.DMY"), None),
            Err(IoError::UnsupportedFormat(ext)) if ext == ".DMY"
        ));
        assert!(registry.select_parser(Path::new("no_extension"), None).is_err());
    }

    #[test]
    fn test_select_by_name_wins_over_extension() {
        let registry = sample_registry();
        assert!(registry
            .select_parser(Path::new("a.txt"), Some("named_only"))
            .is_ok());
        assert!(matches!(
            registry.select_parser(Path::new("a.dmy"), Some("missing")),
            Err(IoError::UnsupportedFormat(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_select_requires_capability() {
        let registry = sample_registry();
        assert!(registry.select_writer(Path::new("a.dmy"), None).is_err());
        assert!(registry.get("dummy").is_some_and(|h| h.can_parse() && !h.can_write()));
    }
}
