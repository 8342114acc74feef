//! Shape of the per-method IR: statements, variables, and the control flow
//! graph over them.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use percolator::analysis::graph::EdgeKind;
use percolator::ir::{Ir, Stmt, StmtId};
use percolator::world::{World, WorldOptions};

fn ir_of(source: &str, signature: &str) -> World {
    let world = World::from_sources(
        [(PathBuf::from("test.c"), source.to_string())],
        &WorldOptions::default(),
    )
    .unwrap();
    assert!(
        world.method_by_signature(signature).is_some(),
        "no method {signature}"
    );
    world
}

fn stmt_map(ir: &Ir) -> HashMap<String, StmtId> {
    ir.stmts()
        .map(|s| (s.rendering().to_string(), s.id()))
        .collect()
}

fn names(ir: &Ir, vars: &BTreeSet<percolator::ir::VarId>) -> BTreeSet<String> {
    vars.iter().map(|&v| ir.var(v).name().to_string()).collect()
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(ToString::to_string).collect()
}

const LOOP_SOURCE: &str = "int loop(int a, int b) {\n\
                           \x20 int c;\n\
                           \x20 while (a > b) {\n\
                           \x20   c = b;\n\
                           \x20   --a;\n\
                           \x20 }\n\
                           \x20 return c;\n\
                           }";

#[test]
fn statements_are_ordered_by_source_position() {
    let world = ir_of(LOOP_SOURCE, "int loop(int, int)");
    let ir = world.method_by_signature("int loop(int, int)").unwrap().ir();
    let renderings: Vec<_> = ir.stmts().map(|s| s.rendering().to_string()).collect();
    assert_eq!(
        renderings,
        vec!["int c;", "a > b", "c = b", "--a", "return c"]
    );
    let lines: Vec<_> = ir.stmts().map(Stmt::start_line).collect();
    let mut sorted = lines.clone();
    sorted.sort_unstable();
    assert_eq!(lines, sorted);
}

#[test]
fn every_statement_is_a_cfg_node_and_nops_bound_the_graph() {
    let world = ir_of(LOOP_SOURCE, "int loop(int, int)");
    let ir = world.method_by_signature("int loop(int, int)").unwrap().ir();
    let cfg = ir.cfg();
    for stmt in ir.stmts() {
        assert!(cfg.has_stmt(stmt.id()), "{stmt} is missing from the cfg");
    }
    assert!(ir.stmt(cfg.entry()).is_nop());
    assert!(ir.stmt(cfg.exit()).is_nop());
    assert_eq!(ir.stmt(cfg.entry()).start_line(), -1);
    assert!(cfg.preds_of(cfg.entry()).is_empty());
    assert!(cfg.succs_of(cfg.exit()).is_empty());
}

#[test]
fn loop_edges_have_the_expected_kinds() {
    let world = ir_of(LOOP_SOURCE, "int loop(int, int)");
    let ir = world.method_by_signature("int loop(int, int)").unwrap().ir();
    let cfg = ir.cfg();
    let stmts = stmt_map(ir);

    let decl = stmts["int c;"];
    let cond = stmts["a > b"];
    let assign = stmts["c = b"];
    let update = stmts["--a"];
    let ret = stmts["return c"];

    // entry -> decl -> cond -> {assign -> update -> cond, ret -> exit}
    assert!(cfg.has_edge(cfg.entry(), decl));
    assert!(cfg.has_edge(decl, cond));
    assert!(cfg.has_edge(cond, assign));
    assert!(cfg.has_edge(assign, update));
    assert!(cfg.has_edge(update, cond), "loop back edge is missing");
    assert!(cfg.has_edge(cond, ret));
    assert!(cfg.has_edge(ret, cfg.exit()));
    assert!(!cfg.has_edge(cond, cfg.entry()));

    let kind_of = |source, target| {
        cfg.out_edges_of(source)
            .find(|edge| edge.target == target)
            .map(|edge| edge.kind)
            .unwrap()
    };
    assert_eq!(kind_of(cfg.entry(), decl), EdgeKind::Entry);
    assert_eq!(kind_of(ret, cfg.exit()), EdgeKind::Exit);
    assert_eq!(kind_of(assign, update), EdgeKind::FallThrough);
    assert_eq!(kind_of(decl, cond), EdgeKind::Jump);
    assert_eq!(kind_of(update, cond), EdgeKind::Jump);
    assert_eq!(kind_of(cond, assign), EdgeKind::Jump);
}

#[test]
fn use_def_extraction_follows_the_value_category_rules() {
    let source = "int f(int n) {\n\
                  \x20 int x;\n\
                  \x20 int y = n;\n\
                  \x20 x = y + n;\n\
                  \x20 x += n;\n\
                  \x20 n++;\n\
                  \x20 return x;\n\
                  }";
    let world = ir_of(source, "int f(int)");
    let ir = world.method_by_signature("int f(int)").unwrap().ir();
    let stmts = stmt_map(ir);

    let check = |rendering: &str, defs: &[&str], uses: &[&str]| {
        let stmt = ir.stmt(stmts[rendering]);
        assert_eq!(names(ir, stmt.defs()), set(defs), "defs of {rendering}");
        assert_eq!(names(ir, stmt.uses()), set(uses), "uses of {rendering}");
    };
    check("int x;", &[], &[]);
    check("int y = n;", &["y"], &["n"]);
    check("x = y + n", &["x"], &["y", "n"]);
    check("x += n", &["x"], &["x", "n"]);
    check("n++", &["n"], &["n"]);
    check("return x", &[], &["x"]);
}

#[test]
fn variable_universe_is_unique_by_identity() {
    let world = ir_of(LOOP_SOURCE, "int loop(int, int)");
    let ir = world.method_by_signature("int loop(int, int)").unwrap().ir();

    let param_names: Vec<_> = ir.params().map(|v| v.name().to_string()).collect();
    assert_eq!(param_names, vec!["a", "b"]);

    let all: Vec<_> = ir.vars().collect();
    assert_eq!(all.len(), 3);
    let identities: BTreeSet<u64> = all.iter().map(|v| v.identity()).collect();
    assert_eq!(identities.len(), all.len());
    for var in ir.vars() {
        assert_eq!(
            ir.var_by_identity(var.identity()).unwrap().name(),
            var.name()
        );
    }
    assert!(ir.var_by_identity(999).is_none());
}

#[test]
fn empty_blocks_get_one_nop_stand_in() {
    // The inner if/else leaves an empty join block between the branches and
    // `return x`; it must surface as a single synthetic nop.
    let source = "int g(int n) {\n\
                  \x20 int x = 0;\n\
                  \x20 if (n > 0) {\n\
                  \x20   if (n > 1) { x = 2; }\n\
                  \x20 }\n\
                  \x20 return x;\n\
                  }";
    let world = ir_of(source, "int g(int)");
    let ir = world.method_by_signature("int g(int)").unwrap().ir();
    let nops: Vec<_> = ir.stmts().filter(|s| s.is_nop()).collect();
    assert_eq!(nops.len(), 1);
    let nop = nops[0];
    let cfg = ir.cfg();
    assert!(!cfg.preds_of(nop.id()).is_empty());
    assert!(!cfg.succs_of(nop.id()).is_empty());
    assert!(nop.defs().is_empty() && nop.uses().is_empty());
    assert!(nop.ast_stmt().is_none());
}

#[cfg(feature = "petgraph")]
#[test]
fn cfg_is_traversable_with_petgraph() {
    use petgraph::visit::{Dfs, Walker};

    let world = ir_of(LOOP_SOURCE, "int loop(int, int)");
    let ir = world.method_by_signature("int loop(int, int)").unwrap().ir();
    let cfg = ir.cfg();
    let reached: BTreeSet<StmtId> = Dfs::new(cfg, cfg.entry()).iter(cfg).collect();
    // Every statement is reachable from the entry.
    assert!(ir.stmts().all(|s| reached.contains(&s.id())));
    assert!(reached.contains(&cfg.exit()));
}
