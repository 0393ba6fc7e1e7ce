//! Documents opened by the document strategy, kept for the life of the process.

use std::path::{Path, PathBuf};

use office_core::Identifier;

/// One tracked document
#[derive(Debug)]
pub struct CachedDocument<D> {
    pub path: PathBuf,
    pub document: D,
    /// No edits since the last load or save
    pub saved: bool,
}

impl<D> CachedDocument<D> {
    /// File name shown to callers
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn document_mut(&mut self) -> &mut D {
        self.saved = false;
        &mut self.document
    }
}

/// Insertion-ordered documents keyed by canonical path, with a "current" one.
/// Nothing is ever evicted.
#[derive(Debug)]
pub struct DocumentCache<D> {
    entries: Vec<CachedDocument<D>>,
    current: Option<usize>,
}

impl<D> Default for DocumentCache<D> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            current: None,
        }
    }
}

/// The form a path is tracked under: canonical when the file exists, else
/// made absolute against the working directory
pub fn canonical_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(dir) => dir.join(path),
        Err(_) => path.to_path_buf(),
    }
}

impl<D> DocumentCache<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CachedDocument<D>> {
        self.entries.iter()
    }

    /// 0-based position of the document tracked under `path`
    pub fn position_of(&self, path: &Path) -> Option<usize> {
        let key = canonical_path(path);
        self.entries.iter().position(|e| e.path == key)
    }

    /// Track a document, or return the one already tracked under the same
    /// path; `load` runs only for a new path. The document becomes current.
    pub fn get_or_load<E>(
        &mut self,
        path: &Path,
        load: impl FnOnce(&Path) -> Result<(D, bool), E>,
    ) -> Result<usize, E> {
        let index = match self.position_of(path) {
            Some(index) => index,
            None => {
                let (document, saved) = load(path)?;
                self.entries.push(CachedDocument {
                    path: canonical_path(path),
                    document,
                    saved,
                });
                self.entries.len() - 1
            }
        };
        self.current = Some(index);
        Ok(index)
    }

    /// 0-based position for a caller's identifier: a 1-based position, a file
    /// name (ignoring case) or a full path
    pub fn resolve(&self, id: &Identifier) -> Option<usize> {
        match id {
            Identifier::Index(_) => id.position_in(self.entries.len()),
            Identifier::Name(name) => {
                let wanted = name.trim().to_lowercase();
                self.entries
                    .iter()
                    .position(|e| e.name().to_lowercase() == wanted)
                    .or_else(|| self.position_of(Path::new(name.trim())))
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<&CachedDocument<D>> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut CachedDocument<D>> {
        self.entries.get_mut(index)
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn set_current(&mut self, index: usize) {
        if index < self.entries.len() {
            self.current = Some(index);
        }
    }

    /// Track the document at `index` under a new path (after "save as")
    pub fn rename(&mut self, index: usize, path: &Path) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.path = canonical_path(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn load_named(path: &Path) -> Result<(String, bool), Infallible> {
        Ok((path.display().to_string(), true))
    }

    #[test]
    fn test_loads_once_per_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = DocumentCache::new();
        let path = dir.path().join("Budget.xlsx");

        assert_eq!(cache.get_or_load(&path, load_named).unwrap(), 0);
        let again = cache.get_or_load(&path, |_| -> Result<(String, bool), Infallible> {
            panic!("loaded twice")
        });
        assert_eq!(again.unwrap(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_resolve_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = DocumentCache::new();
        let first = dir.path().join("Budget.xlsx");
        let second = dir.path().join("Forecast.xlsx");
        cache.get_or_load(&first, load_named).unwrap();
        cache.get_or_load(&second, load_named).unwrap();

        assert_eq!(cache.resolve(&Identifier::Index(2)), Some(1));
        assert_eq!(cache.resolve(&Identifier::Index(3)), None);
        assert_eq!(cache.resolve(&Identifier::parse("budget.XLSX")), Some(0));
        let full = first.display().to_string();
        assert_eq!(cache.resolve(&Identifier::parse(&full)), Some(0));
        assert_eq!(cache.resolve(&Identifier::parse("missing.xlsx")), None);
    }

    #[test]
    fn test_current_follows_last_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = DocumentCache::new();
        assert_eq!(cache.current(), None);
        cache.get_or_load(&dir.path().join("a.pptx"), load_named).unwrap();
        cache.get_or_load(&dir.path().join("b.pptx"), load_named).unwrap();
        assert_eq!(cache.current(), Some(1));
        cache.set_current(0);
        assert_eq!(cache.current(), Some(0));
        cache.set_current(9);
        assert_eq!(cache.current(), Some(0));
    }

    #[test]
    fn test_edits_clear_saved_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = DocumentCache::new();
        let index = cache.get_or_load(&dir.path().join("a.pptx"), load_named).unwrap();
        let entry = cache.get_mut(index).unwrap();
        assert!(entry.saved);
        entry.document_mut().push('!');
        assert!(!entry.saved);
        assert_eq!(entry.name(), "a.pptx");
    }
}
