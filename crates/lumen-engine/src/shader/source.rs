use std::borrow::Cow;
use std::collections::HashMap;
use std::path::PathBuf;

/// Resolves a shader id to WGSL text.
pub trait ShaderSource {
    fn source(&self, id: &str) -> Option<Cow<'_, str>>;
}

/// Shader text compiled into the binary, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedShaders {
    entries: HashMap<&'static str, &'static str>,
}

impl EmbeddedShaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: &'static str, text: &'static str) -> Self {
        self.entries.insert(id, text);
        self
    }
}

impl ShaderSource for EmbeddedShaders {
    fn source(&self, id: &str) -> Option<Cow<'_, str>> {
        self.entries.get(id).map(|s| Cow::Borrowed(*s))
    }
}

/// Reads `<dir>/<id>.wgsl` on demand.
#[derive(Debug, Clone)]
pub struct ShaderDir {
    dir: PathBuf,
}

impl ShaderDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ShaderSource for ShaderDir {
    fn source(&self, id: &str) -> Option<Cow<'_, str>> {
        // Ids are plain names; refuse anything that could walk out of `dir`.
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return None;
        }

        let path = self.dir.join(format!("{id}.wgsl"));
        match std::fs::read_to_string(&path) {
            Ok(text) => Some(Cow::Owned(text)),
            Err(e) => {
                log::debug!("shader '{id}' not loaded from {}: {e}", path.display());
                None
            }
        }
    }
}

/// Looks ids up in `primary` first, then in `fallback`.
#[derive(Debug, Clone)]
pub struct Overlay<P, F> {
    pub primary: P,
    pub fallback: F,
}

impl<P: ShaderSource, F: ShaderSource> ShaderSource for Overlay<P, F> {
    fn source(&self, id: &str) -> Option<Cow<'_, str>> {
        self.primary.source(id).or_else(|| self.fallback.source(id))
    }
}
