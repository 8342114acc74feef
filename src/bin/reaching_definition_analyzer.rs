//! Whole-program reaching-definitions analyzer.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use percolator::analysis::dataflow::fact::{DataflowResult, SetFact};
use percolator::analysis::dataflow::reaching_definition::ReachingDefinition;
use percolator::analysis::{AnalysisConfig, MethodAnalysis};
use percolator::ir::{Ir, StmtId};
use percolator::language::CppMethod;
use percolator::world::{World, WorldError, WorldOptions};

#[derive(Parser)]
#[command(
    name = "reaching-definition-analyzer",
    about = "Runs reaching-definitions analysis over a C/C++ source tree"
)]
struct Args {
    /// Directory scanned recursively for .c/.cc/.cpp/.cxx files.
    #[arg(long = "source-dir")]
    source_dir: PathBuf,

    /// Include directory passed to the front end.
    #[arg(long = "include-dir")]
    include_dir: Option<PathBuf>,

    /// Language standard passed to the front end, e.g. c11.
    #[arg(long = "standard")]
    standard: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), WorldError> {
    let options = WorldOptions {
        include_dir: args.include_dir.clone(),
        standard: args.standard.clone(),
    };
    World::initialize(&args.source_dir, &options)?;
    let world = World::get()?;
    let analysis = ReachingDefinition::new(AnalysisConfig::new("reaching definition analysis"));
    for method in world.methods() {
        let ir = method.ir();
        let result = analysis.analyze(ir);
        print_result(method, ir, &result);
    }
    Ok(())
}

fn print_result(method: &CppMethod, ir: &Ir, result: &DataflowResult<SetFact<StmtId>>) {
    let file = method.containing_file().display();
    for stmt in ir.stmts() {
        println!("* {file} {}: {stmt}", stmt.start_line());
        println!("    In:");
        if let Some(fact) = result.in_fact_of(stmt.id()) {
            for def in fact.iter() {
                println!("        {}", ir.stmt(def));
            }
        }
        println!("    Out:");
        if let Some(fact) = result.out_fact_of(stmt.id()) {
            for def in fact.iter() {
                println!("        {}", ir.stmt(def));
            }
        }
    }
}
