#![warn(
    clippy::pedantic,
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms
)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Welcome to `percolator`, a library for whole-program dataflow analysis of
//! C/C++ source trees.
//!
//! A [`world::World`] indexes every function definition found under a source
//! directory. For each method, an intermediate representation ([`ir::Ir`])
//! with a statement-level control flow graph is built on demand, and the
//! dataflow analyses in [`analysis::dataflow`] (reaching definitions, live
//! variables, constant propagation) run on it to a fixed point, yielding
//! per-statement in/out facts.

pub mod analysis;
pub mod frontend;
pub mod ir;
pub mod language;
pub mod world;
