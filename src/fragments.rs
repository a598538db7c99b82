//! Fragment catalogs.
//!
//! A fragment is a JSON document shipped by a third party that contributes new
//! profiles or patches existing ones (`"updates": "{guid}"`), and may add color
//! schemes. Fragments are grouped by the namespace of whoever shipped them;
//! that namespace becomes the `source` of every profile they contribute.
//!
//! On disk, fragments live under `<root>/<namespace>/*.json` for each root
//! returned by [`DirectoryFragmentCatalog::default_roots`].

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// One fragment document.
#[derive(Debug, Clone)]
pub struct FragmentDocument {
    /// Where the text came from, for log messages.
    pub origin: String,
    pub text: String,
}

/// All documents shipped under one namespace.
#[derive(Debug, Clone)]
pub struct FragmentSource {
    pub namespace: String,
    pub documents: Vec<FragmentDocument>,
}

/// Enumerates the fragment sources available to a load.
pub trait FragmentCatalog: Send + Sync {
    /// Every source, in a stable order.
    ///
    /// Problems with individual documents are logged and the document
    /// skipped; an error here means the whole catalog was unavailable.
    fn sources(&self) -> Result<Vec<FragmentSource>>;
}

/// Fragments read from namespace directories under a list of roots.
#[derive(Debug, Clone, Default)]
pub struct DirectoryFragmentCatalog {
    roots: Vec<PathBuf>,
}

impl DirectoryFragmentCatalog {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// `<data_local_dir>/strata-term/Fragments` and
    /// `<config_dir>/strata-term/Fragments`, when the platform has them.
    pub fn default_roots() -> Vec<PathBuf> {
        [dirs::data_local_dir(), dirs::config_dir()]
            .into_iter()
            .flatten()
            .map(|dir| dir.join("strata-term").join("Fragments"))
            .fold(Vec::new(), |mut roots, root| {
                if !roots.contains(&root) {
                    roots.push(root);
                }
                roots
            })
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn read_namespace(dir: &Path) -> Result<Vec<FragmentDocument>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read fragment directory {:?}", dir))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file() && path.extension().is_some_and(|ext| ext == "json")
            })
            .collect();
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            match std::fs::read_to_string(&path) {
                Ok(text) => documents.push(FragmentDocument {
                    origin: path.display().to_string(),
                    text,
                }),
                Err(e) => log::warn!("Skipping unreadable fragment {:?}: {}", path, e),
            }
        }
        Ok(documents)
    }
}

impl FragmentCatalog for DirectoryFragmentCatalog {
    fn sources(&self) -> Result<Vec<FragmentSource>> {
        let mut sources = Vec::new();

        for root in &self.roots {
            if !root.is_dir() {
                debug_trace!("FRAGMENTS", "No fragment root at {:?}", root);
                continue;
            }

            let mut namespaces: Vec<PathBuf> = match std::fs::read_dir(root) {
                Ok(entries) => entries
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|path| path.is_dir())
                    .collect(),
                Err(e) => {
                    log::warn!("Failed to read fragment root {:?}: {}", root, e);
                    continue;
                }
            };
            namespaces.sort();

            for dir in namespaces {
                let Some(namespace) = dir.file_name().map(|n| n.to_string_lossy().to_string())
                else {
                    continue;
                };
                match Self::read_namespace(&dir) {
                    Ok(documents) if !documents.is_empty() => {
                        sources.push(FragmentSource {
                            namespace,
                            documents,
                        });
                    }
                    Ok(_) => {}
                    Err(e) => log::warn!("{:#}", e),
                }
            }
        }

        Ok(sources)
    }
}

/// Fragments held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticFragmentCatalog {
    sources: Vec<FragmentSource>,
}

impl StaticFragmentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document under `namespace`, creating the source if needed.
    pub fn with_document(mut self, namespace: &str, text: impl Into<String>) -> Self {
        let document = FragmentDocument {
            origin: format!("{namespace} (memory)"),
            text: text.into(),
        };
        match self.sources.iter_mut().find(|s| s.namespace == namespace) {
            Some(source) => source.documents.push(document),
            None => self.sources.push(FragmentSource {
                namespace: namespace.to_string(),
                documents: vec![document],
            }),
        }
        self
    }
}

impl FragmentCatalog for StaticFragmentCatalog {
    fn sources(&self) -> Result<Vec<FragmentSource>> {
        Ok(self.sources.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directory_catalog_groups_by_namespace() {
        let temp_dir = TempDir::new().unwrap();
        let acme = temp_dir.path().join("Acme.Tools");
        std::fs::create_dir_all(&acme).unwrap();
        std::fs::write(acme.join("b.json"), "{}").unwrap();
        std::fs::write(acme.join("a.json"), r#"{"profiles": []}"#).unwrap();
        std::fs::write(acme.join("notes.txt"), "ignored").unwrap();
        std::fs::create_dir_all(temp_dir.path().join("Empty.Vendor")).unwrap();

        let catalog = DirectoryFragmentCatalog::new(vec![temp_dir.path().to_path_buf()]);
        let sources = catalog.sources().unwrap();

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].namespace, "Acme.Tools");
        assert_eq!(sources[0].documents.len(), 2);
        assert!(sources[0].documents[0].origin.ends_with("a.json"));
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = DirectoryFragmentCatalog::new(vec![temp_dir.path().join("missing")]);
        assert!(catalog.sources().unwrap().is_empty());
    }

    #[test]
    fn test_static_catalog_appends_to_existing_namespace() {
        let catalog = StaticFragmentCatalog::new()
            .with_document("Acme.Tools", "{}")
            .with_document("Acme.Tools", "{}")
            .with_document("Other", "{}");
        let sources = catalog.sources().unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].documents.len(), 2);
    }
}
