use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::decoders::{builtin_decoders, file_extension, normalize_extension, Decoder};
use crate::error::{PipelineError, Result};

/// Registry mapping file extensions to format decoders.
///
/// No extension is ever claimed by more than one decoder.
#[derive(Clone)]
pub struct DecoderRegistry {
    decoders: Vec<Arc<dyn Decoder>>,
    by_extension: HashMap<String, Arc<dyn Decoder>>,
}

impl DecoderRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            decoders: Vec::new(),
            by_extension: HashMap::new(),
        }
    }

    /// Registry holding the eight built-in decoders.
    ///
    /// Panics if the built-ins ever claim overlapping extensions.
    pub fn with_builtin_decoders() -> Self {
        match Self::try_with_builtin_decoders() {
            Ok(registry) => registry,
            Err(e) => panic!("built-in decoders conflict: {}", e),
        }
    }

    pub fn try_with_builtin_decoders() -> Result<Self> {
        let mut registry = Self::new();
        for decoder in builtin_decoders() {
            registry.register(decoder)?;
        }
        Ok(registry)
    }

    /// Register a decoder for every extension it claims.
    ///
    /// Fails with `Conflict`, leaving the registry untouched, if any of those
    /// extensions is already claimed.
    pub fn register(&mut self, decoder: Arc<dyn Decoder>) -> Result<()> {
        let extensions: Vec<String> = decoder
            .supported_extensions()
            .iter()
            .map(|e| normalize_extension(e))
            .collect();

        if let Some(taken) = extensions.iter().find(|e| self.by_extension.contains_key(*e)) {
            let owner = &self.by_extension[taken];
            return Err(PipelineError::Conflict(format!(
                "extension '{}' is already handled by the {} decoder",
                taken,
                owner.format()
            )));
        }

        debug!("Registering {} decoder for {:?}", decoder.format(), extensions);
        for ext in extensions {
            self.by_extension.insert(ext, Arc::clone(&decoder));
        }
        self.decoders.push(decoder);
        Ok(())
    }

    /// Find the decoder for a filename by its extension.
    pub fn resolve(&self, filename: &str) -> Result<Arc<dyn Decoder>> {
        if filename.is_empty() {
            return Err(PipelineError::InvalidInput("filename cannot be empty".to_string()));
        }

        let ext = file_extension(filename);
        if ext.is_empty() {
            return Err(PipelineError::NotFound(format!(
                "no extension found in filename: {}",
                filename
            )));
        }

        self.lookup(&ext)
    }

    /// Find a decoder by extension, with or without the leading dot.
    pub fn resolve_by_extension(&self, extension: &str) -> Result<Arc<dyn Decoder>> {
        if extension.is_empty() {
            return Err(PipelineError::InvalidInput("extension cannot be empty".to_string()));
        }
        self.lookup(&normalize_extension(extension))
    }

    fn lookup(&self, ext: &str) -> Result<Arc<dyn Decoder>> {
        self.by_extension
            .get(ext)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(format!("no decoder found for extension: {}", ext)))
    }

    /// Registered decoders in registration order
    pub fn list_decoders(&self) -> Vec<Arc<dyn Decoder>> {
        self.decoders.clone()
    }

    /// Every claimed extension, sorted
    pub fn list_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.by_extension.keys().cloned().collect();
        extensions.sort();
        extensions
    }

    pub fn count(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    pub fn has(&self, extension: &str) -> bool {
        self.by_extension.contains_key(&normalize_extension(extension))
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::with_builtin_decoders()
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderRegistry")
            .field("decoders", &self.decoders)
            .field("extensions", &self.list_extensions())
            .finish()
    }
}
