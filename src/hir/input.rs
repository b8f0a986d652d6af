//! Inputs supplied by the driver: resolver configuration, the crate graph,
//! and the collaborator traits the resolver consults.

use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::FileId;
use crate::syntax::NodeId;

use super::db::Workspace;

/// Knobs the resolver treats as "well-known" names and paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveConfig {
    /// Crates injected into every crate root, in priority order.
    pub injected_crates: Vec<SmolStr>,
    /// Crate that hosts the prelude module.
    pub prelude_crate: SmolStr,
    /// Prelude file, relative to the directory of `prelude_crate`'s root.
    pub prelude_path: String,
    /// Extension of module files (`name.<ext>`).
    pub module_extension: SmolStr,
    /// Index file of directory modules (`name/<index>`).
    pub module_index_file: SmolStr,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            injected_crates: vec![SmolStr::new_static("std"), SmolStr::new_static("core")],
            prelude_crate: SmolStr::new_static("std"),
            prelude_path: "prelude/v1.rs".to_owned(),
            module_extension: SmolStr::new_static("rs"),
            module_index_file: SmolStr::new_static("mod.rs"),
        }
    }
}

impl ResolveConfig {
    pub fn with_injected_crates<I, S>(mut self, crates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.injected_crates = crates.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_prelude(mut self, crate_name: impl Into<SmolStr>, path: impl Into<String>) -> Self {
        self.prelude_crate = crate_name.into();
        self.prelude_path = path.into();
        self
    }

    pub fn with_module_layout(mut self, extension: impl Into<SmolStr>, index_file: impl Into<SmolStr>) -> Self {
        self.module_extension = extension.into();
        self.module_index_file = index_file.into();
        self
    }
}

/// One crate of the workspace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrateData {
    pub root: FileId,
    /// `#![no_prelude]`-style opt-out of the implicit prelude import.
    pub no_prelude: bool,
}

// ============================================================================
// COLLABORATORS
// ============================================================================

/// Where crates and module files live.
pub trait ModuleTopology: Send + Sync {
    /// Root file of the crate called `name`.
    fn crate_root(&self, name: &str) -> Option<FileId>;

    /// Whether `file` is the root of some crate.
    fn is_crate_root(&self, file: FileId) -> bool;

    /// Relative paths probed for `mod name;`, in order.
    fn module_file_candidates(&self, name: &str) -> Vec<String>;
}

/// Supplies the module implicitly glob-imported into every module.
pub trait PreludeSupplier: Send + Sync {
    /// The prelude module for modules of the crate rooted at `crate_root`.
    fn prelude_for(&self, db: &Workspace, crate_root: NodeId) -> Option<NodeId>;
}

// ============================================================================
// CRATE GRAPH
// ============================================================================

/// Crate name → crate data. The default [`ModuleTopology`].
#[derive(Clone, Debug, Default)]
pub struct CrateGraph {
    crates: IndexMap<SmolStr, CrateData>,
    layout: Arc<ResolveConfig>,
}

impl CrateGraph {
    pub fn new(config: Arc<ResolveConfig>) -> Self {
        Self { crates: IndexMap::new(), layout: config }
    }

    /// Register (or replace) a crate.
    pub fn insert(&mut self, name: impl Into<SmolStr>, data: CrateData) {
        self.crates.insert(name.into(), data);
    }

    pub fn remove(&mut self, name: &str) -> Option<CrateData> {
        self.crates.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&CrateData> {
        self.crates.get(name)
    }

    /// The crate whose root is `file`.
    pub fn crate_by_root(&self, file: FileId) -> Option<(&SmolStr, &CrateData)> {
        self.crates.iter().find(|(_, data)| data.root == file)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, &CrateData)> + '_ {
        self.crates.iter()
    }

    pub fn len(&self) -> usize {
        self.crates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crates.is_empty()
    }
}

impl ModuleTopology for CrateGraph {
    fn crate_root(&self, name: &str) -> Option<FileId> {
        self.crates.get(name).map(|data| data.root)
    }

    fn is_crate_root(&self, file: FileId) -> bool {
        self.crate_by_root(file).is_some()
    }

    fn module_file_candidates(&self, name: &str) -> Vec<String> {
        vec![
            format!("{name}.{}", self.layout.module_extension),
            format!("{name}/{}", self.layout.module_index_file),
        ]
    }
}

/// Looks up the configured prelude file inside the configured prelude crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdPrelude;

impl PreludeSupplier for StdPrelude {
    fn prelude_for(&self, db: &Workspace, crate_root: NodeId) -> Option<NodeId> {
        if db.crates().crate_by_root(crate_root.file).is_some_and(|(_, data)| data.no_prelude) {
            return None;
        }
        let config = db.config();
        let std_root = db.topology().crate_root(&config.prelude_crate)?;
        let std_path = db.vfs().path(std_root)?;
        let file = db.vfs().find_relative(std_path.parent()?, &config.prelude_path)?;
        db.tree(file).map(|_| NodeId::root(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_graph_topology() {
        let mut graph = CrateGraph::default();
        graph.insert("std", CrateData { root: FileId::new(3), no_prelude: true });

        assert_eq!(graph.crate_root("std"), Some(FileId::new(3)));
        assert_eq!(graph.crate_root("core"), None);
        assert!(graph.is_crate_root(FileId::new(3)));
        assert!(!graph.is_crate_root(FileId::new(4)));
        assert_eq!(graph.module_file_candidates("foo"), vec!["foo.rs", "foo/mod.rs"]);
    }

    #[test]
    fn test_config_builders() {
        let config = ResolveConfig::default()
            .with_injected_crates(["core"])
            .with_prelude("core", "prelude.rs")
            .with_module_layout("ql", "index.ql");
        let graph = CrateGraph::new(Arc::new(config.clone()));

        assert_eq!(config.injected_crates, vec![SmolStr::new("core")]);
        assert_eq!(config.prelude_path, "prelude.rs");
        assert_eq!(graph.module_file_candidates("m"), vec!["m.ql", "m/index.ql"]);
    }
}
