//! Methods and types of the analysed program.

pub mod types;

pub use types::{Type, TypeKind};

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::frontend::FunctionDef;
use crate::frontend::ast::{DeclId, FunctionAst, VarDecl};
use crate::ir::Ir;
use crate::ir::builder::{DefaultIrBuilder, IrBuilder};

/// A method of the analysed program: its signature, parameters, source
/// location, front-end syntax tree, and (lazily) its IR.
#[derive(Debug)]
pub struct CppMethod {
    signature: String,
    name: String,
    return_type: Type,
    params: Vec<DeclId>,
    file: PathBuf,
    ast: Arc<FunctionAst>,
    ir: OnceLock<Ir>,
}

impl CppMethod {
    pub(crate) fn new(file: PathBuf, def: FunctionDef) -> Self {
        let signature = def.signature();
        Self {
            signature,
            name: def.name,
            return_type: def.return_type,
            params: def.params,
            file,
            ast: Arc::new(def.ast),
            ir: OnceLock::new(),
        }
    }

    /// The signature string the program index keys this method by
    /// (return type, qualified name, parameter types).
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The method's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared return type.
    #[must_use]
    pub const fn return_type(&self) -> &Type {
        &self.return_type
    }

    /// The relative path of the file containing this method.
    #[must_use]
    pub fn containing_file(&self) -> &Path {
        &self.file
    }

    /// The number of parameters.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// The name of the `i`-th parameter.
    ///
    /// # Panics
    /// Panics when `i` is out of range.
    #[must_use]
    pub fn param_name(&self, i: usize) -> &str {
        &self.ast.decl(self.params[i]).name
    }

    /// The type of the `i`-th parameter.
    ///
    /// # Panics
    /// Panics when `i` is out of range.
    #[must_use]
    pub fn param_type(&self, i: usize) -> &Type {
        &self.ast.decl(self.params[i]).ty
    }

    /// Iterates over the parameter declarations, in order.
    pub fn params(&self) -> impl Iterator<Item = &VarDecl> {
        self.params.iter().map(|&decl| self.ast.decl(decl))
    }

    pub(crate) fn param_decls(&self) -> &[DeclId] {
        &self.params
    }

    /// The front-end syntax tree of the method body.
    #[must_use]
    pub fn ast(&self) -> &Arc<FunctionAst> {
        &self.ast
    }

    /// The intermediate representation of the method body, built on first
    /// request and retained.
    pub fn ir(&self) -> &Ir {
        self.ir.get_or_init(|| DefaultIrBuilder.build_ir(self))
    }
}
