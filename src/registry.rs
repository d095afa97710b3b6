use crate::model::Extension;

/// Admitted extensions in load order, keyed by lower-cased name.
///
/// Built once at startup and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    extensions: Vec<Extension>,
}

/// Result of looking an extension up by (a prefix of) its name.
#[derive(Debug, PartialEq)]
pub enum Lookup<'a> {
    Found(&'a Extension),
    Ambiguous(Vec<&'a Extension>),
    Missing,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `extension`; an extension with the same name is replaced in place.
    pub fn insert(&mut self, extension: Extension) {
        let key = extension.key();
        match self.extensions.iter_mut().find(|e| e.key() == key) {
            Some(existing) => {
                tracing::debug!(name = %extension.name, "replacing extension with duplicate name");
                *existing = extension;
            }
            None => self.extensions.push(extension),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Extension> {
        let key = name.to_lowercase();
        self.extensions.iter().find(|e| e.key() == key)
    }

    /// Exact (case-insensitive) name match first, then a unique name prefix.
    pub fn find(&self, query: &str) -> Lookup<'_> {
        if let Some(extension) = self.get(query) {
            return Lookup::Found(extension);
        }
        let query = query.to_lowercase();
        let mut matches: Vec<&Extension> = self
            .extensions
            .iter()
            .filter(|e| e.key().starts_with(&query))
            .collect();
        match matches.len() {
            0 => Lookup::Missing,
            1 => Lookup::Found(matches.remove(0)),
            _ => Lookup::Ambiguous(matches),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.extensions.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}
