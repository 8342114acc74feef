//! End-to-end reaching-definitions runs.

use std::collections::HashMap;
use std::path::PathBuf;

use percolator::analysis::dataflow::fact::SetFact;
use percolator::analysis::dataflow::reaching_definition::ReachingDefinition;
use percolator::analysis::{AnalysisConfig, MethodAnalysis};
use percolator::ir::{Ir, StmtId};
use percolator::world::{World, WorldOptions};

fn world_of(source: &str) -> World {
    World::from_sources(
        [(PathBuf::from("test.c"), source.to_string())],
        &WorldOptions::default(),
    )
    .unwrap()
}

fn analysis() -> ReachingDefinition {
    ReachingDefinition::new(AnalysisConfig::new("reaching definition analysis"))
}

fn stmt_map(ir: &Ir) -> HashMap<String, StmtId> {
    ir.stmts()
        .map(|s| (s.rendering().to_string(), s.id()))
        .collect()
}

fn defs(raw: impl IntoIterator<Item = StmtId>) -> SetFact<StmtId> {
    raw.into_iter().collect()
}

#[test]
fn redefinition_kills_branch_definitions() {
    let world = world_of(
        "int foo(int a, int b, int c) {\n\
         \x20 int x;\n\
         \x20 if (a > 0) {\n\
         \x20   x = a;\n\
         \x20 } else {\n\
         \x20   x = b;\n\
         \x20 }\n\
         \x20 int y = x;\n\
         \x20 x = c;\n\
         \x20 return x;\n\
         }",
    );
    let ir = world
        .method_by_signature("int foo(int, int, int)")
        .unwrap()
        .ir();
    let stmts = stmt_map(ir);
    let result = analysis().analyze(ir);

    // Both branch definitions reach the join.
    let at_join = result.in_fact_of(stmts["int y = x;"]).unwrap();
    assert!(at_join.contains(stmts["x = a"]));
    assert!(at_join.contains(stmts["x = b"]));

    // `x = c` kills both of them; only it and the `y` definition remain.
    let at_return = result.out_fact_of(stmts["return x"]).unwrap();
    assert_eq!(
        at_return,
        &defs([stmts["int y = x;"], stmts["x = c"]])
    );
}

#[test]
fn loop_back_edge_reaches_a_fixed_point() {
    let world = world_of(
        "int loop(int a, int b) {\n\
         \x20 int c;\n\
         \x20 while (a > b) {\n\
         \x20   c = b;\n\
         \x20   --a;\n\
         \x20 }\n\
         \x20 return c;\n\
         }",
    );
    let ir = world.method_by_signature("int loop(int, int)").unwrap().ir();
    let stmts = stmt_map(ir);
    let result = analysis().analyze(ir);

    let at_return = result.out_fact_of(stmts["return c"]).unwrap();
    assert_eq!(at_return, &defs([stmts["c = b"], stmts["--a"]]));

    // The loop body sees its own definitions through the back edge.
    let at_cond = result.in_fact_of(stmts["a > b"]).unwrap();
    assert!(at_cond.contains(stmts["c = b"]));
    assert!(at_cond.contains(stmts["--a"]));
}

#[test]
fn boundary_fact_is_empty_and_gen_includes_self() {
    let world = world_of("int f(int n) { int x = n; x = x + 1; return x; }");
    let ir = world.method_by_signature("int f(int)").unwrap().ir();
    let stmts = stmt_map(ir);
    let result = analysis().analyze(ir);

    assert!(result.out_fact_of(ir.cfg().entry()).unwrap().is_empty());
    // Every defining statement generates itself.
    for stmt in ir.stmts().filter(|s| !s.defs().is_empty()) {
        assert!(
            result.out_fact_of(stmt.id()).unwrap().contains(stmt.id()),
            "{stmt} does not reach its own out fact"
        );
    }
    // A later definition of x kills the earlier one.
    let after_second = result.out_fact_of(stmts["x = x + 1"]).unwrap();
    assert!(!after_second.contains(stmts["int x = n;"]));
}

#[test]
fn for_loops_merge_init_and_step_definitions() {
    let world = world_of(
        "int sum(int n) {\n\
         \x20 int s = 0;\n\
         \x20 for (int i = 0; i < n; i++) {\n\
         \x20   s += i;\n\
         \x20 }\n\
         \x20 return s;\n\
         }",
    );
    let ir = world.method_by_signature("int sum(int)").unwrap().ir();
    let stmts = stmt_map(ir);
    let result = analysis().analyze(ir);

    // Both the pre-loop and the in-loop definitions survive the merge at
    // the loop condition, so all four reach the return.
    let at_return = result.out_fact_of(stmts["return s"]).unwrap();
    assert_eq!(
        at_return,
        &defs([
            stmts["int s = 0;"],
            stmts["int i = 0;"],
            stmts["s += i"],
            stmts["i++"],
        ])
    );
}

#[test]
fn switch_arms_each_reach_the_join() {
    let world = world_of(
        "int pick(int n) {\n\
         \x20 int r = 0;\n\
         \x20 switch (n) {\n\
         \x20   case 0:\n\
         \x20     r = 1;\n\
         \x20     break;\n\
         \x20   case 1:\n\
         \x20     r = 2;\n\
         \x20     break;\n\
         \x20   default:\n\
         \x20     r = 3;\n\
         \x20     break;\n\
         \x20 }\n\
         \x20 return r;\n\
         }",
    );
    let ir = world.method_by_signature("int pick(int)").unwrap().ir();
    let stmts = stmt_map(ir);
    let result = analysis().analyze(ir);

    let at_return = result.in_fact_of(stmts["return r"]).unwrap();
    assert!(at_return.contains(stmts["r = 1"]));
    assert!(at_return.contains(stmts["r = 2"]));
    assert!(at_return.contains(stmts["r = 3"]));
    // Every arm redefines r, so the initial definition is killed.
    assert!(!at_return.contains(stmts["int r = 0;"]));
}

#[test]
fn solving_twice_is_idempotent() {
    let world = world_of(
        "int loop(int a, int b) { int c; while (a > b) { c = b; --a; } return c; }",
    );
    let ir = world.method_by_signature("int loop(int, int)").unwrap().ir();
    let first = analysis().analyze(ir);
    let second = analysis().analyze(ir);
    assert_eq!(first, second);
}
