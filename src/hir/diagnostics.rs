//! Diagnostics: unresolved and ambiguous references.
//!
//! [`check_file`] walks every reference-bearing node of a file and reports
//! the ones that do not resolve to exactly one declaration.

use std::sync::Arc;

use crate::base::{FileId, TextRange};
use crate::syntax::{NodeId, NodeKind, UseKind};

use super::resolve::{ResolveResult, Resolver};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// An error with location. Every diagnostic reported here is an error;
/// [`codes`] tells the kinds apart.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub file: FileId,
    pub range: TextRange,
    /// Error code (e.g., "E0001").
    pub code: Option<Arc<str>>,
    pub message: Arc<str>,
    pub related: Vec<RelatedInfo>,
}

/// Related information for a diagnostic.
#[derive(Clone, Debug)]
pub struct RelatedInfo {
    pub file: FileId,
    pub range: TextRange,
    pub message: Arc<str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(file: FileId, range: TextRange, message: impl Into<Arc<str>>) -> Self {
        Self { file, range, code: None, message: message.into(), related: Vec::new() }
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Add related information.
    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Diagnostic codes.
pub mod codes {
    /// Unresolved reference (name not found).
    pub const UNRESOLVED_REFERENCE: &str = "E0001";
    /// Ambiguous reference (multiple candidates).
    pub const AMBIGUOUS_REFERENCE: &str = "E0002";
    /// No file found for a `mod name;` declaration.
    pub const MODULE_FILE_NOT_FOUND: &str = "E0003";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during a check.
#[derive(Clone, Debug, Default)]
struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add an unresolved reference error.
    fn unresolved_reference(&mut self, file: FileId, range: TextRange, name: &str) {
        self.add(
            Diagnostic::error(file, range, format!("unresolved reference: '{name}'"))
                .with_code(codes::UNRESOLVED_REFERENCE),
        );
    }

    /// Add an ambiguous reference error, one related entry per candidate.
    fn ambiguous_reference(&mut self, file: FileId, range: TextRange, name: &str, candidates: &[RelatedInfo]) {
        let mut diag = Diagnostic::error(
            file,
            range,
            format!("ambiguous reference: '{name}' matches {} declarations", candidates.len()),
        )
        .with_code(codes::AMBIGUOUS_REFERENCE);
        for candidate in candidates {
            diag = diag.with_related(candidate.clone());
        }
        self.add(diag);
    }

    /// Add a missing module file error.
    fn module_file_not_found(&mut self, file: FileId, range: TextRange, name: &str) {
        self.add(
            Diagnostic::error(file, range, format!("file not found for module '{name}'"))
                .with_code(codes::MODULE_FILE_NOT_FOUND),
        );
    }

    /// Take all diagnostics, leaving the collector empty.
    fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

// ============================================================================
// REFERENCE CHECKER
// ============================================================================

/// Checks the references of one file.
struct ReferenceChecker<'r, 'db> {
    resolver: &'r Resolver<'db>,
    collector: DiagnosticCollector,
}

impl<'r, 'db> ReferenceChecker<'r, 'db> {
    fn check_file(&mut self, file: FileId) {
        let db = self.resolver.db();
        let Some(tree) = db.tree(file) else { return };
        for local in tree.iter() {
            self.check_node(NodeId::new(file, local));
        }
    }

    fn check_node(&mut self, node: NodeId) {
        let resolver = self.resolver;
        let Some(kind) = resolver.db().kind(node) else { return };
        match kind {
            NodeKind::PathExpr { path } | NodeKind::StructLit { path } => {
                self.report(node, &path.to_string(), resolver.resolve(path, node));
            }
            NodeKind::StructLitField { name } => {
                let literal_resolves = resolver
                    .db()
                    .parent(node)
                    .is_some_and(|literal| resolver.resolve_reference(literal).is_resolved());
                if literal_resolves {
                    self.report(node, name, resolver.resolve_struct_literal_field(node));
                }
            }
            NodeKind::FieldExpr { field } => {
                if self.receiver_is_known(node) {
                    self.report(node, field, resolver.resolve_field_access(node));
                }
            }
            NodeKind::MethodCall { method } => {
                if self.receiver_is_known(node) {
                    self.report(node, method, resolver.resolve_method_call(node));
                }
            }
            NodeKind::ModDecl { name } => {
                if resolver.resolve_mod_decl(node).is_unresolved()
                    && let Some(range) = resolver.db().range(node)
                {
                    self.collector.module_file_not_found(node.file, range, name);
                }
            }
            NodeKind::ExternCrate { name, .. } => {
                self.report(node, name, resolver.resolve_extern_crate(node));
            }
            NodeKind::Use(tree) => {
                let path = tree.path.as_ref().map(ToString::to_string).unwrap_or_default();
                match &tree.kind {
                    UseKind::Single { .. } => self.report(node, &path, resolver.resolve_use_path(node)),
                    UseKind::Glob => self.report(node, &path, resolver.resolve_glob_target(node)),
                    UseKind::Group(items) => {
                        for (index, item) in items.iter().enumerate() {
                            let name = item.name.as_deref().unwrap_or("self");
                            self.report(node, name, resolver.resolve_use_group_item(node, index));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// Field and method lookups on an unknown receiver are not reported;
    /// the receiver already produced its own diagnostic, if any.
    fn receiver_is_known(&self, node: NodeId) -> bool {
        let db = self.resolver.db();
        db.child(node, 0).is_some_and(|receiver| !self.resolver.typify_expr(receiver).is_unknown())
    }

    fn report(&mut self, node: NodeId, name: &str, result: ResolveResult) {
        let db = self.resolver.db();
        let Some(range) = db.range(node) else { return };
        match result {
            ResolveResult::Resolved(_) => {}
            ResolveResult::Unresolved => self.collector.unresolved_reference(node.file, range, name),
            ResolveResult::Ambiguous(candidates) => {
                let related: Vec<RelatedInfo> = candidates
                    .iter()
                    .filter_map(|&candidate| {
                        Some(RelatedInfo {
                            file: candidate.file,
                            range: db.range(candidate)?,
                            message: Arc::from(format!("candidate: '{name}'")),
                        })
                    })
                    .collect();
                self.collector.ambiguous_reference(node.file, range, name, &related);
            }
        }
    }
}

/// Check a file and return diagnostics.
pub fn check_file(resolver: &Resolver<'_>, file: FileId) -> Vec<Diagnostic> {
    let mut checker = ReferenceChecker { resolver, collector: DiagnosticCollector::default() };
    checker.check_file(file);
    let diagnostics = checker.collector.take();
    tracing::debug!(%file, count = diagnostics.len(), "checked file");
    diagnostics
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::base::TextSize;
    use crate::hir::Workspace;
    use crate::syntax::TreeBuilder;

    fn range() -> TextRange {
        TextRange::new(TextSize::from(0), TextSize::from(1))
    }

    #[test]
    fn test_diagnostic_with_code_and_related() {
        let candidate = RelatedInfo { file: FileId::new(1), range: range(), message: Arc::from("candidate") };
        let diag = Diagnostic::error(FileId::new(0), range(), "test")
            .with_code(codes::UNRESOLVED_REFERENCE)
            .with_related(candidate);
        assert_eq!(diag.code.as_deref(), Some("E0001"));
        assert_eq!(diag.related.len(), 1);
        assert_eq!(diag.related[0].file, FileId::new(1));
    }

    #[test]
    fn test_collector_take_empties_it() {
        let mut collector = DiagnosticCollector::default();
        collector.unresolved_reference(FileId::new(0), range(), "x");
        collector.module_file_not_found(FileId::new(0), range(), "m");

        let taken = collector.take();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[1].message.as_ref(), "file not found for module 'm'");
        assert!(collector.take().is_empty());
    }

    #[test]
    fn test_check_file_reports_each_kind() {
        let mut b = TreeBuilder::new();
        b.mod_decl("missing");
        b.module("a", |b| {
            b.fn_item("f", None, |_| {});
        });
        b.module("b", |b| {
            b.fn_item("f", None, |_| {});
        });
        b.use_glob("a");
        b.use_glob("b");
        b.fn_item("main", None, |b| {
            b.block(|b| {
                b.path_expr("f");
                b.path_expr("nope");
                b.path_expr("a::f");
            });
        });
        let mut db = Workspace::new();
        let file = db.set_file(Path::new("/src/lib.rs"), b.finish());
        db.add_crate("demo", file, true).unwrap();

        let resolver = db.resolver();
        let diagnostics = check_file(&resolver, file);
        let codes: Vec<_> = diagnostics.iter().filter_map(|d| d.code.as_deref()).collect();

        assert_eq!(codes, vec!["E0003", "E0002", "E0001"]);
        assert_eq!(diagnostics[1].related.len(), 2);
    }
}
