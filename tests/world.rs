//! Indexing a program into a world and looking methods up.

use std::path::PathBuf;

use percolator::world::{World, WorldError, WorldOptions};

fn world_of(sources: &[(&str, &str)]) -> Result<World, WorldError> {
    World::from_sources(
        sources
            .iter()
            .map(|(name, content)| (PathBuf::from(name), (*content).to_string())),
        &WorldOptions::default(),
    )
}

#[test]
fn methods_are_indexed_by_signature() {
    let world = world_of(&[(
        "example.c",
        "int fib(int n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }\n\
         unsigned mix(unsigned a, long b) { return a; }\n\
         int main() { return fib(10); }",
    )])
    .unwrap();

    assert_eq!(world.methods().count(), 3);
    let fib = world.method_by_signature("int fib(int)").unwrap();
    assert_eq!(fib.name(), "fib");
    assert_eq!(fib.return_type().name(), "int");
    assert_eq!(fib.param_count(), 1);
    assert_eq!(fib.param_name(0), "n");
    assert_eq!(fib.param_type(0).name(), "int");
    assert_eq!(fib.containing_file(), PathBuf::from("example.c"));

    let mix = world
        .method_by_signature("unsigned int mix(unsigned int, long)")
        .unwrap();
    assert_eq!(mix.param_type(1).name(), "long");

    assert!(world.method_by_signature("int missing()").is_none());
}

#[test]
fn main_method_is_distinguished() {
    let world = world_of(&[
        ("a.c", "int helper() { return 1; }"),
        ("b.c", "int main() { return 0; }"),
    ])
    .unwrap();
    assert_eq!(world.main_method().unwrap().name(), "main");

    let no_main = world_of(&[("a.c", "int helper() { return 1; }")]).unwrap();
    assert!(no_main.main_method().is_none());
}

#[test]
fn duplicate_main_is_an_error() {
    let result = world_of(&[
        ("a.c", "int main() { return 0; }"),
        ("b.c", "int main() { return 1; }"),
    ]);
    assert!(matches!(result, Err(WorldError::DuplicateMain { .. })));
}

#[test]
fn duplicate_definitions_keep_the_first() {
    let world = world_of(&[
        ("a.c", "int twice(int x) { return 2 * x; }"),
        ("b.c", "int twice(int x) { return x + x; }"),
    ])
    .unwrap();
    assert_eq!(world.methods().count(), 1);
    let ir = world.method_by_signature("int twice(int)").unwrap().ir();
    let renderings: Vec<_> = ir.stmts().map(|s| s.rendering().to_string()).collect();
    assert_eq!(renderings, vec!["return 2 * x"]);
}

#[test]
fn unparseable_units_are_skipped() {
    let world = world_of(&[
        ("bad.c", "int broken( { ???"),
        ("good.c", "int fine() { return 0; }"),
    ])
    .unwrap();
    assert_eq!(world.methods().count(), 1);
    assert!(world.method_by_signature("int fine()").is_some());
}

#[test]
fn ir_is_built_once_and_retained() {
    let world = world_of(&[("a.c", "int f() { int x = 1; return x; }")]).unwrap();
    let method = world.method_by_signature("int f()").unwrap();
    let first = method.ir() as *const _;
    let second = method.ir() as *const _;
    assert_eq!(first, second);
}

#[test]
fn build_scans_directories_recursively_by_extension() {
    let root = std::env::temp_dir().join(format!("percolator-world-test-{}", std::process::id()));
    let nested = root.join("nested");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(root.join("a.c"), "int a() { return 0; }").unwrap();
    std::fs::write(nested.join("b.cpp"), "int b() { return 1; }").unwrap();
    std::fs::write(nested.join("c.cxx"), "int c() { return 2; }").unwrap();
    std::fs::write(nested.join("d.cc"), "int d() { return 3; }").unwrap();
    std::fs::write(root.join("notes.txt"), "not a source file").unwrap();
    std::fs::write(root.join("header.h"), "int ignored();").unwrap();

    let world = World::build(&root, &WorldOptions::default()).unwrap();
    let signatures: Vec<_> = world.methods().map(|m| m.signature().to_string()).collect();
    assert_eq!(
        signatures,
        vec!["int a()", "int b()", "int c()", "int d()"]
    );

    std::fs::remove_dir_all(&root).unwrap();
}
