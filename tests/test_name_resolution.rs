//! Name resolution through the public API.
//!
//! Covers lexical shadowing inside blocks, pattern scopes, imports, glob
//! expansion (including cyclic globs), `self`/`super` chains, module files
//! across the file system, extern crates, injected crates and the prelude.

use quarry::base::FileId;
use quarry::hir::ResolveResult;
use quarry::ide::{goto_definition, AnalysisHost};
use quarry::syntax::{Literal, LocalNodeId, NodeId, TreeBuilder, UnresolvedTy};
use rstest::rstest;

const ROOT: LocalNodeId = LocalNodeId::ROOT;

fn at(file: FileId, local: LocalNodeId) -> NodeId {
    NodeId::new(file, local)
}

// ============================================================================
// LEXICAL SCOPES
// ============================================================================

#[test]
fn test_let_shadowing_and_self_reference() {
    let mut b = TreeBuilder::new();
    let (mut first, mut second, mut init_use, mut later_use) = (ROOT, ROOT, ROOT, ROOT);
    b.fn_item("main", None, |b| {
        b.block(|b| {
            first = b.let_stmt("x", None, |b| {
                b.literal(Literal::Int { suffix: None });
            });
            // let x = x;
            second = b.let_stmt("x", None, |b| {
                init_use = b.path_expr("x");
            });
            later_use = b.path_expr("x");
        });
    });

    let mut host = AnalysisHost::new();
    let file = host.set_file("/src/main.rs", b.finish());
    let analysis = host.analysis();

    assert_eq!(analysis.resolve_reference(at(file, init_use)), ResolveResult::Resolved(at(file, first)));
    assert_eq!(analysis.resolve_reference(at(file, later_use)), ResolveResult::Resolved(at(file, second)));
}

#[test]
fn test_bindings_are_positional_but_items_are_not() {
    let mut b = TreeBuilder::new();
    let (mut early, mut call_site, mut helper) = (ROOT, ROOT, ROOT);
    b.fn_item("main", None, |b| {
        b.block(|b| {
            early = b.path_expr("y");
            call_site = b.path_expr("helper");
            b.let_stmt("y", None, |b| {
                b.literal(Literal::Bool);
            });
            helper = b.fn_item("helper", None, |_| {});
        });
    });

    let mut host = AnalysisHost::new();
    let file = host.set_file("/src/main.rs", b.finish());
    let analysis = host.analysis();

    assert!(analysis.resolve_reference(at(file, early)).is_unresolved());
    assert_eq!(analysis.resolve_reference(at(file, call_site)).single(), Some(at(file, helper)));
}

#[test]
fn test_pattern_scopes() {
    let mut b = TreeBuilder::new();
    let (mut param, mut param_use) = (ROOT, ROOT);
    let (mut closure_param, mut closure_use, mut closure_outside) = (ROOT, ROOT, ROOT);
    let (mut item, mut iterable_use, mut body_use) = (ROOT, ROOT, ROOT);
    let (mut arm_binding, mut arm_use) = (ROOT, ROOT);
    b.fn_item("f", None, |b| {
        param = b.param("a", UnresolvedTy::named("i32"));
        b.block(|b| {
            param_use = b.path_expr("a");
            b.closure(|b| {
                closure_param = b.binding("c");
                b.block(|b| {
                    closure_use = b.path_expr("c");
                });
            });
            closure_outside = b.path_expr("c");
            b.for_expr(|b| {
                item = b.binding("item");
                iterable_use = b.path_expr("item");
                b.block(|b| {
                    body_use = b.path_expr("item");
                });
            });
            b.match_expr(|b| {
                b.path_expr("a");
                b.match_arm(|b| {
                    arm_binding = b.binding("v");
                    b.block(|b| {
                        arm_use = b.path_expr("v");
                    });
                });
            });
        });
    });

    let mut host = AnalysisHost::new();
    let file = host.set_file("/src/lib.rs", b.finish());
    let analysis = host.analysis();
    let resolve = |local| analysis.resolve_reference(at(file, local));

    assert_eq!(resolve(param_use).single(), Some(at(file, param)));
    assert_eq!(resolve(closure_use).single(), Some(at(file, closure_param)));
    assert!(resolve(closure_outside).is_unresolved());
    assert!(resolve(iterable_use).is_unresolved());
    assert_eq!(resolve(body_use).single(), Some(at(file, item)));
    assert_eq!(resolve(arm_use).single(), Some(at(file, arm_binding)));
}

#[test]
fn test_names_in_scope_lists_innermost_first() {
    let mut b = TreeBuilder::new();
    let (mut local, mut pivot) = (ROOT, ROOT);
    let outer = b.fn_item("x", None, |_| {});
    b.fn_item("main", None, |b| {
        b.block(|b| {
            local = b.let_stmt("x", None, |_| {});
            pivot = b.path_expr("x");
        });
    });

    let mut host = AnalysisHost::new();
    let file = host.set_file("/src/lib.rs", b.finish());
    let analysis = host.analysis();

    let names = analysis.names_in_scope(at(file, pivot));
    let x = names.iter().find(|(name, _)| name == "x").map(|&(_, decl)| decl);
    assert_eq!(x, Some(at(file, local)));
    assert_ne!(x, Some(at(file, outer)));
    assert!(names.iter().any(|(name, _)| name == "main"));
}

// ============================================================================
// IMPORTS
// ============================================================================

#[test]
fn test_use_single_alias_and_group() {
    let mut b = TreeBuilder::new();
    let (mut circle, mut square, mut area) = (ROOT, ROOT, ROOT);
    let mut uses = Vec::new();
    b.module("shapes", |b| {
        circle = b.struct_item("Circle", |_| {});
        square = b.struct_item("Square", |_| {});
        area = b.fn_item("area", None, |_| {});
    });
    b.use_path("shapes::Circle", None);
    b.use_path("shapes::Square", Some("Sq"));
    b.use_group(Some("shapes"), &[(None, Some("geometry")), (Some("area"), Some("compute"))]);
    b.fn_item("main", None, |b| {
        b.block(|b| {
            for name in ["Circle", "Sq", "compute", "geometry::area", "Square"] {
                uses.push(b.path_expr(name));
            }
        });
    });

    let mut host = AnalysisHost::new();
    let file = host.set_file("/src/lib.rs", b.finish());
    let analysis = host.analysis();
    let resolved: Vec<_> = uses.iter().map(|&u| analysis.resolve_reference(at(file, u)).single()).collect();

    assert_eq!(
        resolved,
        vec![Some(at(file, circle)), Some(at(file, square)), Some(at(file, area)), Some(at(file, area)), None]
    );
}

#[test]
fn test_direct_item_shadows_glob_import() {
    let mut b = TreeBuilder::new();
    let mut pivot = ROOT;
    b.module("a", |b| {
        b.fn_item("f", None, |_| {});
    });
    b.use_glob("a");
    let local_f = b.fn_item("f", None, |_| {});
    b.fn_item("main", None, |b| {
        pivot = b.path_expr("f");
    });

    let mut host = AnalysisHost::new();
    let file = host.set_file("/src/lib.rs", b.finish());
    let analysis = host.analysis();

    assert_eq!(analysis.resolve_reference(at(file, pivot)).single(), Some(at(file, local_f)));
}

#[test]
fn test_two_globs_exporting_the_same_name_are_ambiguous() {
    let mut b = TreeBuilder::new();
    let (mut a_f, mut b_f, mut pivot) = (ROOT, ROOT, ROOT);
    b.module("a", |b| {
        a_f = b.fn_item("f", None, |_| {});
    });
    b.module("b", |b| {
        b_f = b.fn_item("f", None, |_| {});
    });
    b.use_glob("a");
    b.use_glob("b");
    b.fn_item("main", None, |b| {
        pivot = b.path_expr("f");
    });

    let mut host = AnalysisHost::new();
    let file = host.set_file("/src/lib.rs", b.finish());
    let analysis = host.analysis();

    assert_eq!(
        analysis.resolve_reference(at(file, pivot)),
        ResolveResult::Ambiguous(vec![at(file, a_f), at(file, b_f)])
    );
    let goto = goto_definition(&analysis, at(file, pivot));
    assert!(goto.is_ambiguous());
    assert_eq!(goto.targets.len(), 2);
}

fn ambiguous_candidates(result: ResolveResult) -> Vec<NodeId> {
    match result {
        ResolveResult::Ambiguous(mut candidates) => {
            candidates.sort();
            candidates
        }
        other => panic!("expected an ambiguous result, got {other:?}"),
    }
}

#[rstest]
#[case::a_first(false)]
#[case::b_first(true)]
fn test_glob_ambiguity_ignores_rank_inside_targets(#[case] swapped: bool) {
    let mut b = TreeBuilder::new();
    let (mut a_f, mut b_f, mut pivot, mut helper_use) = (ROOT, ROOT, ROOT, ROOT);
    let mut helper = ROOT;
    b.module("c", |b| {
        b.fn_item("f", None, |_| {});
        helper = b.fn_item("helper", None, |_| {});
    });
    b.module("a", |b| {
        a_f = b.fn_item("f", None, |_| {});
        b.extern_crate("alloc", Some("heap"));
        b.use_path("super::b::f", Some("g"));
        b.use_glob("super::c");
    });
    b.module("b", |b| {
        b.use_path("super::c::helper", Some("h"));
        b_f = b.fn_item("f", None, |_| {});
    });
    if swapped {
        b.use_glob("b");
        b.use_glob("a");
    } else {
        b.use_glob("a");
        b.use_glob("b");
    }
    b.fn_item("main", None, |b| {
        pivot = b.path_expr("f");
        helper_use = b.path_expr("helper");
    });

    let mut host = AnalysisHost::new();
    let file = host.set_file("/src/lib.rs", b.finish());
    let analysis = host.analysis();

    let mut expected = vec![at(file, a_f), at(file, b_f)];
    expected.sort();
    assert_eq!(ambiguous_candidates(analysis.resolve_reference(at(file, pivot))), expected);
    // `helper` reaches the root through `a`'s own glob of `c`.
    assert_eq!(analysis.resolve_reference(at(file, helper_use)).single(), Some(at(file, helper)));
}

#[rstest]
#[case::a_first(false)]
#[case::b_first(true)]
fn test_glob_reexport_and_definition_are_ambiguous(#[case] swapped: bool) {
    let mut b = TreeBuilder::new();
    let (mut c_foo, mut b_foo, mut pivot) = (ROOT, ROOT, ROOT);
    b.module("c", |b| {
        c_foo = b.struct_item("Foo", |_| {});
    });
    b.module("a", |b| {
        b.use_path("super::c::Foo", None);
    });
    b.module("b", |b| {
        b_foo = b.fn_item("Foo", None, |_| {});
    });
    let (first, second) = if swapped { ("b", "a") } else { ("a", "b") };
    b.use_glob(first);
    b.use_glob(second);
    b.fn_item("main", None, |b| {
        pivot = b.path_expr("Foo");
    });

    let mut host = AnalysisHost::new();
    let file = host.set_file("/src/lib.rs", b.finish());
    let analysis = host.analysis();

    let mut expected = vec![at(file, c_foo), at(file, b_foo)];
    expected.sort();
    assert_eq!(ambiguous_candidates(analysis.resolve_reference(at(file, pivot))), expected);
}

#[test]
fn test_cyclic_globs_terminate() {
    let mut b = TreeBuilder::new();
    let (mut fa, mut fb) = (ROOT, ROOT);
    let (mut via_a, mut missing, mut via_b) = (ROOT, ROOT, ROOT);
    b.module("a", |b| {
        b.use_glob("super::b");
        fa = b.fn_item("fa", None, |_| {});
    });
    b.module("b", |b| {
        b.use_glob("super::a");
        fb = b.fn_item("fb", None, |_| {});
    });
    b.fn_item("main", None, |b| {
        b.block(|b| {
            via_a = b.path_expr("a::fb");
            via_b = b.path_expr("b::fa");
            missing = b.path_expr("a::missing");
        });
    });

    let mut host = AnalysisHost::new();
    let file = host.set_file("/src/lib.rs", b.finish());
    let analysis = host.analysis();

    assert_eq!(analysis.resolve_reference(at(file, via_a)).single(), Some(at(file, fb)));
    assert_eq!(analysis.resolve_reference(at(file, via_b)).single(), Some(at(file, fa)));
    assert!(analysis.resolve_reference(at(file, missing)).is_unresolved());
}

// ============================================================================
// MODULE PATHS
// ============================================================================

#[rstest]
#[case("x", Some("b"))]
#[case("self::x", Some("b"))]
#[case("super::x", Some("a"))]
#[case("self::super::x", Some("a"))]
#[case("super::super::x", Some("root"))]
#[case("::x", Some("root"))]
#[case("super::b::x", Some("b"))]
#[case("super::super::super::x", None)]
#[case("super::self::x", None)]
#[case("b::x", None)]
fn test_module_relative_paths(#[case] path: &str, #[case] expected: Option<&str>) {
    let mut b = TreeBuilder::new();
    let (mut a_x, mut b_x, mut pivot) = (ROOT, ROOT, ROOT);
    let root_x = b.fn_item("x", None, |_| {});
    b.module("a", |b| {
        a_x = b.fn_item("x", None, |_| {});
        b.module("b", |b| {
            b_x = b.fn_item("x", None, |_| {});
            b.fn_item("f", None, |b| {
                b.block(|b| {
                    pivot = b.path_expr(path);
                });
            });
        });
    });

    let mut host = AnalysisHost::new();
    let file = host.set_file("/src/lib.rs", b.finish());
    let analysis = host.analysis();

    let expected = expected.map(|module| match module {
        "root" => at(file, root_x),
        "a" => at(file, a_x),
        _ => at(file, b_x),
    });
    assert_eq!(analysis.resolve_reference(at(file, pivot)).single(), expected, "path `{path}`");
}

#[test]
fn test_module_files_across_directories() {
    let mut host = AnalysisHost::new();

    let mut lib = TreeBuilder::new();
    let ghost = lib.mod_decl("ghost");
    lib.mod_decl("net");
    lib.mod_decl("util");
    let top = lib.fn_item("top", None, |_| {});
    let mut trim_use = ROOT;
    lib.fn_item("main", None, |b| {
        trim_use = b.path_expr("util::strings::trim");
    });
    let lib_file = host.set_file("/src/lib.rs", lib.finish());

    let mut net = TreeBuilder::new();
    net.mod_decl("tcp");
    let (mut super_use, mut child_use, mut rooted_use) = (ROOT, ROOT, ROOT);
    net.fn_item("connect", None, |b| {
        b.block(|b| {
            super_use = b.path_expr("super::top");
            child_use = b.path_expr("tcp::open");
            rooted_use = b.path_expr("::util::helper");
        });
    });
    let net_file = host.set_file("/src/net.rs", net.finish());

    let mut tcp = TreeBuilder::new();
    let open = tcp.fn_item("open", None, |_| {});
    let tcp_file = host.set_file("/src/net/tcp.rs", tcp.finish());

    let mut util = TreeBuilder::new();
    util.mod_decl("strings");
    let helper = util.fn_item("helper", None, |_| {});
    let util_file = host.set_file("/src/util/mod.rs", util.finish());

    let mut strings = TreeBuilder::new();
    let trim = strings.fn_item("trim", None, |_| {});
    let strings_file = host.set_file("/src/util/strings.rs", strings.finish());

    host.add_crate("app", lib_file, true).unwrap();
    let analysis = host.analysis();

    assert_eq!(analysis.resolve_reference(at(net_file, super_use)).single(), Some(at(lib_file, top)));
    assert_eq!(analysis.resolve_reference(at(net_file, child_use)).single(), Some(at(tcp_file, open)));
    assert_eq!(analysis.resolve_reference(at(net_file, rooted_use)).single(), Some(at(util_file, helper)));
    assert_eq!(analysis.resolve_reference(at(lib_file, trim_use)).single(), Some(at(strings_file, trim)));
    assert!(analysis.resolve_mod_decl(at(lib_file, ghost)).is_unresolved());

    let codes: Vec<_> = analysis
        .diagnostics(lib_file)
        .into_iter()
        .filter_map(|d| d.code.map(|code| code.to_string()))
        .collect();
    assert_eq!(codes, vec!["E0003"]);

    let links = quarry::ide::document_links(&analysis, lib_file);
    let targets: Vec<_> = links.iter().map(|link| link.target_file).collect();
    assert_eq!(targets, vec![net_file, util_file]);
}

// ============================================================================
// CRATES AND THE PRELUDE
// ============================================================================

struct CrateFixture {
    host: AnalysisHost,
    string: NodeId,
    vec: NodeId,
    helper: NodeId,
    app: FileId,
    bare: FileId,
}

fn crate_fixture(app_uses: &[&str], bare_uses: &[&str]) -> (CrateFixture, Vec<LocalNodeId>, Vec<LocalNodeId>) {
    let mut host = AnalysisHost::new();

    let mut std_lib = TreeBuilder::new();
    let string = std_lib.struct_item("String", |_| {});
    let std_file = host.set_file("/std/lib.rs", std_lib.finish());

    let mut prelude = TreeBuilder::new();
    let vec = prelude.struct_item("Vec", |_| {});
    let prelude_file = host.set_file("/std/prelude/v1.rs", prelude.finish());

    let mut dep = TreeBuilder::new();
    let helper = dep.fn_item("helper", None, |_| {});
    let dep_file = host.set_file("/dep/lib.rs", dep.finish());

    let mut app_locals = Vec::new();
    let mut app = TreeBuilder::new();
    app.extern_crate("dep", None);
    app.extern_crate("dep", Some("d"));
    app.fn_item("main", None, |b| {
        b.block(|b| {
            for path in app_uses {
                app_locals.push(b.path_expr(path));
            }
        });
    });
    app.module("inner", |b| {
        b.fn_item("g", None, |b| {
            b.block(|b| {
                for path in app_uses {
                    app_locals.push(b.path_expr(path));
                }
            });
        });
    });
    let app_file = host.set_file("/app/main.rs", app.finish());

    let mut bare_locals = Vec::new();
    let mut bare = TreeBuilder::new();
    bare.fn_item("main", None, |b| {
        b.block(|b| {
            for path in bare_uses {
                bare_locals.push(b.path_expr(path));
            }
        });
    });
    let bare_file = host.set_file("/bare/lib.rs", bare.finish());

    host.add_crate("std", std_file, true).unwrap();
    host.add_crate("dep", dep_file, false).unwrap();
    host.add_crate("app", app_file, false).unwrap();
    host.add_crate("bare", bare_file, true).unwrap();

    let fixture = CrateFixture {
        host,
        string: at(std_file, string),
        vec: at(prelude_file, vec),
        helper: at(dep_file, helper),
        app: app_file,
        bare: bare_file,
    };
    (fixture, app_locals, bare_locals)
}

#[test]
fn test_extern_crates_injected_crates_and_prelude() {
    let paths = ["dep::helper", "d::helper", "std::String", "::std::String", "Vec", "core::Thing"];
    let (fixture, app, bare) = crate_fixture(&paths, &["Vec", "std::String"]);
    let analysis = fixture.host.analysis();
    let resolve = |file, local| analysis.resolve_reference(at(file, local)).single();

    // At the crate root.
    let root: Vec<_> = app[..paths.len()].iter().map(|&local| resolve(fixture.app, local)).collect();
    assert_eq!(
        root,
        vec![
            Some(fixture.helper),
            Some(fixture.helper),
            Some(fixture.string),
            Some(fixture.string),
            Some(fixture.vec),
            None
        ]
    );

    // In a nested module, extern crates and injected crates need a leading `::`;
    // the prelude is still in scope.
    let nested: Vec<_> = app[paths.len()..].iter().map(|&local| resolve(fixture.app, local)).collect();
    assert_eq!(nested, vec![None, None, None, Some(fixture.string), Some(fixture.vec), None]);

    // A crate that opts out of the prelude keeps its injected crates.
    assert_eq!(resolve(fixture.bare, bare[0]), None);
    assert_eq!(resolve(fixture.bare, bare[1]), Some(fixture.string));
}

// ============================================================================
// INVALIDATION
// ============================================================================

#[test]
fn test_results_follow_mutations() {
    let mut host = AnalysisHost::new();

    let build = |with_item: bool| {
        let mut b = TreeBuilder::new();
        let mut pivot = ROOT;
        b.fn_item("main", None, |b| {
            pivot = b.path_expr("late");
        });
        if with_item {
            b.fn_item("late", None, |_| {});
        }
        (b.finish(), pivot)
    };

    let (tree, pivot) = build(false);
    let file = host.set_file("/src/lib.rs", tree);
    assert!(host.analysis().resolve_reference(at(file, pivot)).is_unresolved());

    let (tree, pivot) = build(true);
    let same = host.set_file("/src/lib.rs", tree);
    assert_eq!(same, file);
    assert!(host.analysis().resolve_reference(at(file, pivot)).is_resolved());

    host.remove_file(file).unwrap();
    assert!(host.analysis().resolve_reference(at(file, pivot)).is_unresolved());
    assert!(host.remove_file(file).is_err());
}

#[test]
fn test_concurrent_sessions_share_one_snapshot() {
    let mut b = TreeBuilder::new();
    let mut pivots = Vec::new();
    let target = b.struct_item("Target", |_| {});
    b.fn_item("main", None, |b| {
        b.block(|b| {
            for _ in 0..8 {
                pivots.push(b.path_expr("Target"));
            }
        });
    });

    let mut host = AnalysisHost::new();
    let file = host.set_file("/src/lib.rs", b.finish());
    let host = &host;

    std::thread::scope(|scope| {
        for &pivot in &pivots {
            scope.spawn(move || {
                let analysis = host.analysis();
                assert_eq!(analysis.resolve_reference(at(file, pivot)).single(), Some(at(file, target)));
            });
        }
    });
}
