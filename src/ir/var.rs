//! Identity-keyed program variables.

use crate::frontend::ast::DeclId;
use crate::language::Type;

/// The identity of a [`Var`] within its method.
///
/// Every occurrence of the same declaration resolves to the same id, so the
/// id is the equality key all fact containers use.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    derive_more::Display,
    derive_more::From,
)]
#[display("v{_0}")]
pub struct VarId(u32);

impl VarId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<VarId> for u64 {
    fn from(id: VarId) -> Self {
        Self::from(id.0)
    }
}

/// A method parameter or local variable. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Var {
    id: VarId,
    name: String,
    ty: Type,
    decl: DeclId,
}

impl Var {
    pub(crate) fn new(id: VarId, name: String, ty: Type, decl: DeclId) -> Self {
        Self { id, name, ty, decl }
    }

    /// The identity of this variable.
    #[must_use]
    pub const fn id(&self) -> VarId {
        self.id
    }

    /// The identity of this variable as a plain integer.
    #[must_use]
    pub fn identity(&self) -> u64 {
        self.id.into()
    }

    /// The declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type.
    #[must_use]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    /// The front-end declaration this variable stands for.
    #[must_use]
    pub const fn decl(&self) -> DeclId {
        self.decl
    }
}

impl std::fmt::Display for Var {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
