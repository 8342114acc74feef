//! Name resolution, expression typing, and value-category bookkeeping for
//! the bundled front end.

use crate::language::{Type, TypeKind};

use super::ast::{CastKind, DeclId, Expr, ExprId, ExprKind, FunctionAst};

/// A lexical scope stack mapping names to declarations.
///
/// C requires declaration before use inside a function, so resolution runs
/// while parsing, against whatever has been declared so far.
#[derive(Debug, Default)]
pub(crate) struct Scopes {
    frames: Vec<Vec<(String, DeclId)>>,
}

impl Scopes {
    pub(crate) fn push(&mut self) {
        self.frames.push(Vec::new());
    }

    pub(crate) fn pop(&mut self) {
        self.frames.pop();
    }

    pub(crate) fn declare(&mut self, name: &str, decl: DeclId) {
        self.frames
            .last_mut()
            .expect("a scope is always open while parsing a body")
            .push((name.to_string(), decl));
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<DeclId> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.iter().rev().find(|(n, _)| n == name).map(|(_, d)| *d))
    }
}

/// The type an arithmetic expression takes after the usual arithmetic
/// conversions, simplified to the subset the front end models: both operands
/// are promoted to at least `int`, the wider operand wins, and at equal
/// width unsignedness wins.
pub(crate) fn usual_arithmetic_conversion(lhs: &Type, rhs: &Type) -> Type {
    let lhs = promote(lhs);
    let rhs = promote(rhs);
    let (l, r) = (rank(lhs), rank(rhs));
    Type::builtin(if l >= r { lhs } else { rhs })
}

/// Integer promotion: every integer kind narrower than `int` becomes `int`.
pub(crate) fn promote(ty: &Type) -> TypeKind {
    match ty.kind() {
        TypeKind::Bool
        | TypeKind::Char
        | TypeKind::SChar
        | TypeKind::UChar
        | TypeKind::Short
        | TypeKind::UShort
        | TypeKind::Char16 => TypeKind::Int,
        kind => kind,
    }
}

fn rank(kind: TypeKind) -> u8 {
    match kind {
        TypeKind::Int => 0,
        TypeKind::UInt | TypeKind::Char32 => 1,
        TypeKind::Long => 2,
        TypeKind::ULong => 3,
        TypeKind::LongLong => 4,
        TypeKind::ULongLong => 5,
        // Non-integer operands do not occur in folded arithmetic; give them
        // the lowest rank so the other side's type wins.
        _ => 0,
    }
}

/// Wraps variable references in rvalue position with lvalue-to-rvalue
/// conversions, the way a compiler front end marks loads.
///
/// Assignment and compound-assignment left sides and increment/decrement
/// operands are the places a variable is *named* rather than *read*; every
/// other variable reference gets the wrapper. Use/def extraction and the
/// constant lattice both key off it.
pub(crate) fn insert_loads(ast: &mut FunctionAst, root: ExprId) {
    mark(ast, root, false);
}

fn mark(ast: &mut FunctionAst, id: ExprId, lvalue: bool) {
    let kind = ast.expr(id).kind.clone();
    match kind {
        ExprKind::IntLiteral(_) | ExprKind::CharLiteral(_) | ExprKind::VarRef(_) => {}
        ExprKind::Paren(inner) => {
            // Parentheses are transparent for value category.
            let inner = if lvalue { inner } else { load(ast, inner) };
            ast.expr_mut(id).kind = ExprKind::Paren(inner);
            mark(ast, inner_of(ast, inner), lvalue);
        }
        ExprKind::Unary { op, operand } => {
            let operand = load(ast, operand);
            ast.expr_mut(id).kind = ExprKind::Unary { op, operand };
            mark(ast, inner_of(ast, operand), false);
        }
        ExprKind::Update { operand, .. } => mark(ast, operand, true),
        ExprKind::Cast { kind, operand } => {
            let operand = load(ast, operand);
            ast.expr_mut(id).kind = ExprKind::Cast { kind, operand };
            mark(ast, inner_of(ast, operand), false);
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let lhs = load(ast, lhs);
            let rhs = load(ast, rhs);
            ast.expr_mut(id).kind = ExprKind::Binary { op, lhs, rhs };
            mark(ast, inner_of(ast, lhs), false);
            mark(ast, inner_of(ast, rhs), false);
        }
        ExprKind::Assign { lhs, rhs } => {
            let rhs = load(ast, rhs);
            ast.expr_mut(id).kind = ExprKind::Assign { lhs, rhs };
            mark(ast, lhs, true);
            mark(ast, inner_of(ast, rhs), false);
        }
        ExprKind::CompoundAssign { op, lhs, rhs } => {
            let rhs = load(ast, rhs);
            ast.expr_mut(id).kind = ExprKind::CompoundAssign { op, lhs, rhs };
            mark(ast, lhs, true);
            mark(ast, inner_of(ast, rhs), false);
        }
        ExprKind::Subscript { base, index } => {
            // Array operands decay rather than load.
            let index = load(ast, index);
            ast.expr_mut(id).kind = ExprKind::Subscript { base, index };
            mark(ast, base, false);
            mark(ast, inner_of(ast, index), false);
        }
        ExprKind::Conditional {
            cond,
            then_value,
            else_value,
        } => {
            let cond = load(ast, cond);
            let then_value = load(ast, then_value);
            let else_value = load(ast, else_value);
            ast.expr_mut(id).kind = ExprKind::Conditional {
                cond,
                then_value,
                else_value,
            };
            mark(ast, inner_of(ast, cond), false);
            mark(ast, inner_of(ast, then_value), false);
            mark(ast, inner_of(ast, else_value), false);
        }
        ExprKind::Call { callee, args } => {
            let args: Vec<_> = args.into_iter().map(|a| load(ast, a)).collect();
            let inners: Vec<_> = args.iter().map(|a| inner_of(ast, *a)).collect();
            ast.expr_mut(id).kind = ExprKind::Call { callee, args };
            for inner in inners {
                mark(ast, inner, false);
            }
        }
        ExprKind::Comma { lhs, rhs } => {
            let lhs = load(ast, lhs);
            let rhs = load(ast, rhs);
            ast.expr_mut(id).kind = ExprKind::Comma { lhs, rhs };
            mark(ast, inner_of(ast, lhs), false);
            mark(ast, inner_of(ast, rhs), false);
        }
    }
}

/// Wraps a bare variable reference in a load; leaves anything else alone.
fn load(ast: &mut FunctionAst, id: ExprId) -> ExprId {
    if matches!(ast.expr(id).kind, ExprKind::VarRef(_)) {
        let Expr { ty, span, .. } = ast.expr(id).clone();
        ast.push_expr(Expr {
            kind: ExprKind::Cast {
                kind: CastKind::LvalueToRvalue,
                operand: id,
            },
            ty,
            span,
        })
    } else {
        id
    }
}

/// Reads back through a just-inserted load so recursion continues on the
/// original node.
fn inner_of(ast: &FunctionAst, id: ExprId) -> ExprId {
    match ast.expr(id).kind {
        ExprKind::Cast {
            kind: CastKind::LvalueToRvalue,
            operand,
        } => operand,
        _ => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_shadow_and_unwind() {
        let mut scopes = Scopes::default();
        scopes.push();
        scopes.declare("x", DeclId::from(0));
        scopes.push();
        scopes.declare("x", DeclId::from(1));
        assert_eq!(scopes.resolve("x"), Some(DeclId::from(1)));
        scopes.pop();
        assert_eq!(scopes.resolve("x"), Some(DeclId::from(0)));
        assert_eq!(scopes.resolve("y"), None);
    }

    #[test]
    fn conversions_prefer_width_then_unsignedness() {
        let int = Type::builtin(TypeKind::Int);
        let uint = Type::builtin(TypeKind::UInt);
        let long = Type::builtin(TypeKind::Long);
        let short = Type::builtin(TypeKind::Short);
        assert_eq!(usual_arithmetic_conversion(&int, &long).kind(), TypeKind::Long);
        assert_eq!(usual_arithmetic_conversion(&uint, &int).kind(), TypeKind::UInt);
        assert_eq!(usual_arithmetic_conversion(&short, &short).kind(), TypeKind::Int);
    }
}
