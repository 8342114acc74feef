//! Constant propagation with an explicit UNDEF/CONST/NAC lattice over
//! width- and signedness-aware integer values.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use crate::analysis::graph::Cfg;
use crate::analysis::{AnalysisConfig, MethodAnalysis};
use crate::frontend::ast::{
    AstStmtKind, BinaryOp, CastKind, DeclId, ExprId, ExprKind, UnaryOp, UpdateOp,
};
use crate::ir::{Ir, Stmt, VarId};
use crate::language::Type;

use super::fact::{DataflowResult, MapFact};
use super::solver::{self, Solver};
use super::DataflowAnalysis;

/// A fixed-width two's-complement integer with explicit signedness, the
/// value payload of [`CpValue::Const`].
///
/// Every width the analyser recognises fits in 64 bits, so the bit store is
/// a `u64` kept truncated to `width`. Equality is by bit pattern, width,
/// and signedness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApsInt {
    bits: u64,
    width: u8,
    signed: bool,
}

impl ApsInt {
    /// Creates a value from raw bits, truncating to `width`.
    #[must_use]
    pub const fn new(bits: u64, width: u8, signed: bool) -> Self {
        Self {
            bits: Self::truncate(bits, width),
            width,
            signed,
        }
    }

    /// Creates a value from a signed integer, truncating to `width`.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn from_i64(value: i64, width: u8, signed: bool) -> Self {
        Self::new(value as u64, width, signed)
    }

    const fn truncate(bits: u64, width: u8) -> u64 {
        if width >= 64 {
            bits
        } else {
            bits & ((1u64 << width) - 1)
        }
    }

    /// The bit width of the value.
    #[must_use]
    pub const fn width(&self) -> u8 {
        self.width
    }

    /// Whether the value is of a signed type.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        self.signed
    }

    /// Whether the value is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.bits == 0
    }

    /// The value zero-extended to 64 bits.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.bits
    }

    /// The value sign-extended (when signed) to 64 bits.
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub const fn as_i64(&self) -> i64 {
        if self.signed && self.width < 64 {
            let shift = 64 - self.width as u32;
            ((self.bits << shift) as i64) >> shift
        } else {
            self.bits as i64
        }
    }

    /// Converts the value to another width and signedness, preserving the
    /// numeric value where it fits and truncating where it does not.
    #[must_use]
    pub const fn cast_to(self, width: u8, signed: bool) -> Self {
        if self.signed {
            Self::from_i64(self.as_i64(), width, signed)
        } else {
            Self::new(self.bits, width, signed)
        }
    }

    /// Wrapping negation.
    #[must_use]
    pub const fn wrapping_neg(self) -> Self {
        Self::new(self.bits.wrapping_neg(), self.width, self.signed)
    }

    /// Wrapping addition. Both operands must share width and signedness.
    #[must_use]
    pub const fn wrapping_add(self, rhs: Self) -> Self {
        Self::new(self.bits.wrapping_add(rhs.bits), self.width, self.signed)
    }

    /// Wrapping subtraction.
    #[must_use]
    pub const fn wrapping_sub(self, rhs: Self) -> Self {
        Self::new(self.bits.wrapping_sub(rhs.bits), self.width, self.signed)
    }

    /// Wrapping multiplication.
    #[must_use]
    pub const fn wrapping_mul(self, rhs: Self) -> Self {
        Self::new(self.bits.wrapping_mul(rhs.bits), self.width, self.signed)
    }

    /// Wrapping division.
    ///
    /// # Panics
    /// Panics on division by zero; callers handle zero divisors in the
    /// lattice before folding.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn wrapping_div(self, rhs: Self) -> Self {
        if self.signed {
            Self::from_i64(
                self.as_i64().wrapping_div(rhs.as_i64()),
                self.width,
                self.signed,
            )
        } else {
            Self::new(self.bits / rhs.bits, self.width, self.signed)
        }
    }

    /// Wrapping remainder.
    ///
    /// # Panics
    /// Panics on a zero divisor; callers handle zero divisors in the
    /// lattice before folding.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn wrapping_rem(self, rhs: Self) -> Self {
        if self.signed {
            Self::from_i64(
                self.as_i64().wrapping_rem(rhs.as_i64()),
                self.width,
                self.signed,
            )
        } else {
            Self::new(self.bits % rhs.bits, self.width, self.signed)
        }
    }

    /// Bitwise and.
    #[must_use]
    pub const fn bitand(self, rhs: Self) -> Self {
        Self::new(self.bits & rhs.bits, self.width, self.signed)
    }

    /// Bitwise or.
    #[must_use]
    pub const fn bitor(self, rhs: Self) -> Self {
        Self::new(self.bits | rhs.bits, self.width, self.signed)
    }

    /// Bitwise exclusive or.
    #[must_use]
    pub const fn bitxor(self, rhs: Self) -> Self {
        Self::new(self.bits ^ rhs.bits, self.width, self.signed)
    }

    /// Left shift; amounts at or past the width yield zero.
    #[must_use]
    pub const fn shl(self, amount: u64) -> Self {
        if amount >= self.width as u64 {
            Self::new(0, self.width, self.signed)
        } else {
            Self::new(self.bits << amount, self.width, self.signed)
        }
    }

    /// Right shift: arithmetic for signed values, logical otherwise.
    /// Amounts at or past the width leave only fill bits.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn shr(self, amount: u64) -> Self {
        if self.signed {
            let amount = if amount >= self.width as u64 {
                self.width as u64 - 1
            } else {
                amount
            };
            Self::from_i64(self.as_i64() >> amount, self.width, self.signed)
        } else if amount >= self.width as u64 {
            Self::new(0, self.width, self.signed)
        } else {
            Self::new(self.bits >> amount, self.width, self.signed)
        }
    }
}

impl Display for ApsInt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.signed {
            write!(f, "{}", self.as_i64())
        } else {
            write!(f, "{}", self.as_u64())
        }
    }
}

/// One point of the constant lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CpValue {
    /// Bottom: no assignment has been seen (or the program's behaviour is
    /// undefined here).
    #[default]
    Undef,
    /// A definite integer value.
    Const(ApsInt),
    /// Top: not a constant.
    Nac,
}

impl CpValue {
    /// Wraps a value as a constant.
    #[must_use]
    pub const fn make_constant(value: ApsInt) -> Self {
        Self::Const(value)
    }

    /// Whether this is UNDEF.
    #[must_use]
    pub const fn is_undef(&self) -> bool {
        matches!(self, Self::Undef)
    }

    /// Whether this is a definite constant.
    #[must_use]
    pub const fn is_constant(&self) -> bool {
        matches!(self, Self::Const(_))
    }

    /// Whether this is NAC.
    #[must_use]
    pub const fn is_nac(&self) -> bool {
        matches!(self, Self::Nac)
    }

    /// The constant payload.
    ///
    /// # Panics
    /// Panics when the value is not a constant; asking is a programming
    /// error.
    #[must_use]
    pub const fn constant_value(&self) -> ApsInt {
        match self {
            Self::Const(value) => *value,
            _ => panic!("CpValue is not a constant"),
        }
    }

    /// The join of two lattice points: UNDEF is the identity, NAC
    /// absorbs, and unequal constants clash to NAC.
    #[must_use]
    pub const fn meet(self, other: Self) -> Self {
        match (self, other) {
            (Self::Undef, v) | (v, Self::Undef) => v,
            (Self::Nac, _) | (_, Self::Nac) => Self::Nac,
            (Self::Const(a), Self::Const(b)) => {
                if a.bits == b.bits && a.width == b.width && a.signed == b.signed {
                    Self::Const(a)
                } else {
                    Self::Nac
                }
            }
        }
    }
}

impl Display for CpValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undef => f.write_str("UNDEF"),
            Self::Const(value) => value.fmt(f),
            Self::Nac => f.write_str("NAC"),
        }
    }
}

/// The constant-propagation fact: a variable-to-value map where an absent
/// variable reads as UNDEF, and storing UNDEF removes the binding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpFact {
    values: MapFact<VarId, CpValue>,
}

impl CpFact {
    /// Creates an empty fact (every variable UNDEF).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The value of a variable; absent variables are UNDEF.
    #[must_use]
    pub fn get(&self, var: VarId) -> CpValue {
        self.values.get(var).copied().unwrap_or(CpValue::Undef)
    }

    /// Binds a variable; binding UNDEF removes the entry. Reports whether
    /// the fact changed.
    pub fn update(&mut self, var: VarId, value: CpValue) -> bool {
        if value.is_undef() {
            self.values.remove(var).is_some()
        } else {
            self.values.update(var, value)
        }
    }

    /// Updates this fact pointwise from `other`; reports whether the fact
    /// changed.
    pub fn copy_from(&mut self, other: &Self) -> bool {
        let mut changed = false;
        for (var, &value) in other.values.iter() {
            changed |= self.update(var, value);
        }
        changed
    }

    /// The number of explicitly tracked variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no variable is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over the tracked variables and their values.
    pub fn iter(&self) -> impl Iterator<Item = (VarId, CpValue)> + '_ {
        self.values.iter().map(|(var, &value)| (var, value))
    }
}

/// The result of a constant-propagation run: the per-statement dataflow
/// facts plus the last value computed for every evaluated expression node.
#[derive(Debug)]
pub struct ConstantPropagationResult {
    dataflow: DataflowResult<CpFact>,
    expr_values: BTreeMap<ExprId, CpValue>,
}

impl ConstantPropagationResult {
    /// The per-statement dataflow result.
    #[must_use]
    pub const fn dataflow(&self) -> &DataflowResult<CpFact> {
        &self.dataflow
    }

    /// The fact flowing into a node.
    #[must_use]
    pub fn in_fact_of(&self, node: crate::ir::StmtId) -> Option<&CpFact> {
        self.dataflow.in_fact_of(node)
    }

    /// The fact flowing out of a node.
    #[must_use]
    pub fn out_fact_of(&self, node: crate::ir::StmtId) -> Option<&CpFact> {
        self.dataflow.out_fact_of(node)
    }

    /// The last value computed for an expression node, if the transfer
    /// functions ever evaluated it.
    #[must_use]
    pub fn expr_value(&self, expr: ExprId) -> Option<CpValue> {
        self.expr_values.get(&expr).copied()
    }
}

/// The constant-propagation analysis: forward, with integer parameters NAC
/// at the boundary and everything else initially UNDEF.
#[derive(Debug)]
pub struct ConstantPropagation {
    config: AnalysisConfig,
}

impl ConstantPropagation {
    /// Creates the analysis from its configuration.
    #[must_use]
    pub const fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }
}

impl MethodAnalysis for ConstantPropagation {
    type Output = ConstantPropagationResult;

    fn analyze(&self, ir: &Ir) -> Self::Output {
        let analysis = Analysis::new(ir);
        let dataflow = solver::make_solver().solve(&analysis);
        ConstantPropagationResult {
            dataflow,
            expr_values: analysis.expr_values.into_inner(),
        }
    }

    fn config(&self) -> &AnalysisConfig {
        &self.config
    }
}

struct Analysis<'ir> {
    ir: &'ir Ir,
    var_of_decl: BTreeMap<DeclId, VarId>,
    expr_values: RefCell<BTreeMap<ExprId, CpValue>>,
}

impl<'ir> Analysis<'ir> {
    fn new(ir: &'ir Ir) -> Self {
        let var_of_decl = ir.vars().map(|var| (var.decl(), var.id())).collect();
        Self {
            ir,
            var_of_decl,
            expr_values: RefCell::new(BTreeMap::new()),
        }
    }

    fn tracked_var(&self, decl: DeclId) -> Option<VarId> {
        let var = self.var_of_decl[&decl];
        self.ir.var(var).ty().is_integer().then_some(var)
    }

    /// Evaluates an expression against the evolving state σ, updating σ
    /// through assignment-shaped sub-expressions and recording the value
    /// for the expression-level result.
    fn eval(&self, id: ExprId, sigma: &mut CpFact) -> CpValue {
        let value = self.eval_inner(id, sigma);
        self.expr_values.borrow_mut().insert(id, value);
        value
    }

    #[allow(clippy::too_many_lines)]
    fn eval_inner(&self, id: ExprId, sigma: &mut CpFact) -> CpValue {
        let ast = self.ir.ast();
        let expr = ast.expr(id);
        if !expr.ty.is_integer() {
            return CpValue::Nac;
        }
        match &expr.kind {
            ExprKind::IntLiteral(bits) => CpValue::Const(ApsInt::new(
                *bits,
                expr.ty.bit_width().unwrap_or(32),
                expr.ty.is_signed_integer(),
            )),
            // Character literals evaluate as 32-bit unsigned constants.
            ExprKind::CharLiteral(value) => {
                CpValue::Const(ApsInt::new(u64::from(*value), 32, false))
            }
            ExprKind::VarRef(decl) => match self.tracked_var(*decl) {
                Some(var) => sigma.get(var),
                None => CpValue::Nac,
            },
            ExprKind::Paren(inner) => self.eval(*inner, sigma),
            ExprKind::Unary {
                op: UnaryOp::Plus,
                operand,
            } => self.eval(*operand, sigma),
            ExprKind::Unary {
                op: UnaryOp::Minus,
                operand,
            } => match self.eval(*operand, sigma) {
                CpValue::Const(value) => CpValue::Const(
                    value
                        .cast_to(
                            expr.ty.bit_width().unwrap_or(32),
                            expr.ty.is_signed_integer(),
                        )
                        .wrapping_neg(),
                ),
                other => other,
            },
            ExprKind::Unary { .. } => CpValue::Nac,
            ExprKind::Update {
                op,
                prefix,
                operand,
            } => {
                let Some(var) = ast.as_var_ref(*operand).and_then(|d| self.tracked_var(d))
                else {
                    return CpValue::Nac;
                };
                let old = sigma.get(var);
                let new = match old {
                    CpValue::Const(value) => {
                        let one = ApsInt::new(1, value.width(), value.is_signed());
                        CpValue::Const(match op {
                            UpdateOp::Increment => value.wrapping_add(one),
                            UpdateOp::Decrement => value.wrapping_sub(one),
                        })
                    }
                    other => other,
                };
                sigma.update(var, new);
                if *prefix { new } else { old }
            }
            ExprKind::Cast {
                kind: CastKind::LvalueToRvalue,
                operand,
            } => self.eval(*operand, sigma),
            ExprKind::Cast {
                kind: CastKind::Explicit,
                operand,
            } => {
                let value = self.eval(*operand, sigma);
                if expr.ty == ast.expr(*operand).ty {
                    return value;
                }
                match (expr.ty.bit_width(), value) {
                    (Some(width), CpValue::Const(constant)) => CpValue::Const(
                        constant.cast_to(width, expr.ty.is_signed_integer()),
                    ),
                    (Some(_), other) => other,
                    (None, _) => CpValue::Nac,
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                if op.is_foldable() {
                    let lhs_value = self.eval(*lhs, sigma);
                    let rhs_value = self.eval(*rhs, sigma);
                    fold(*op, lhs_value, rhs_value, &expr.ty)
                } else {
                    CpValue::Nac
                }
            }
            ExprKind::Assign { lhs, rhs } => {
                let value = self.eval(*rhs, sigma);
                self.assign_to(*lhs, value, sigma);
                value
            }
            ExprKind::CompoundAssign { op, lhs, rhs } => {
                let lhs_value = match ast.as_var_ref(*lhs).and_then(|d| self.tracked_var(d)) {
                    Some(var) => sigma.get(var),
                    None => CpValue::Nac,
                };
                let rhs_value = self.eval(*rhs, sigma);
                let value = fold(*op, lhs_value, rhs_value, &expr.ty);
                self.assign_to(*lhs, value, sigma);
                value
            }
            ExprKind::Subscript { base, index } => {
                self.eval(*base, sigma);
                self.eval(*index, sigma);
                CpValue::Nac
            }
            ExprKind::Conditional {
                cond,
                then_value,
                else_value,
            } => {
                self.eval(*cond, sigma);
                self.eval(*then_value, sigma);
                self.eval(*else_value, sigma);
                CpValue::Nac
            }
            ExprKind::Call { args, .. } => {
                for &arg in args {
                    self.eval(arg, sigma);
                }
                CpValue::Nac
            }
            ExprKind::Comma { .. } => CpValue::Nac,
        }
    }

    fn assign_to(&self, lhs: ExprId, value: CpValue, sigma: &mut CpFact) {
        match self.ir.ast().as_var_ref(lhs).and_then(|d| self.tracked_var(d)) {
            Some(var) => {
                sigma.update(var, value);
            }
            None => {
                // Not a tracked variable; still evaluate the target for
                // the side effects of its sub-expressions.
                self.eval(lhs, sigma);
            }
        }
    }
}

/// Folds one arithmetic operator over two lattice values at the type of the
/// enclosing expression.
fn fold(op: BinaryOp, lhs: CpValue, rhs: CpValue, ty: &Type) -> CpValue {
    // Division or modulus by a known zero is the undefined-behaviour
    // sentinel, whatever the other operand is.
    if op.is_division() && matches!(rhs, CpValue::Const(divisor) if divisor.is_zero()) {
        return CpValue::Undef;
    }
    match (lhs, rhs) {
        (CpValue::Nac, _) | (_, CpValue::Nac) => CpValue::Nac,
        (CpValue::Const(lhs), CpValue::Const(rhs)) => {
            let width = ty.bit_width().unwrap_or(32);
            let signed = ty.is_signed_integer();
            let a = lhs.cast_to(width, signed);
            let b = rhs.cast_to(width, signed);
            match op {
                BinaryOp::Add => CpValue::Const(a.wrapping_add(b)),
                BinaryOp::Sub => CpValue::Const(a.wrapping_sub(b)),
                BinaryOp::Mul => CpValue::Const(a.wrapping_mul(b)),
                BinaryOp::Div => CpValue::Const(a.wrapping_div(b)),
                BinaryOp::Rem => CpValue::Const(a.wrapping_rem(b)),
                BinaryOp::And => CpValue::Const(a.bitand(b)),
                BinaryOp::Or => CpValue::Const(a.bitor(b)),
                BinaryOp::Xor => CpValue::Const(a.bitxor(b)),
                BinaryOp::Shl => CpValue::Const(a.shl(b.as_u64())),
                BinaryOp::Shr => CpValue::Const(a.shr(b.as_u64())),
                _ => CpValue::Nac,
            }
        }
        // At least one side is UNDEF and neither is NAC.
        _ => {
            if op.is_division() {
                CpValue::Nac
            } else {
                CpValue::Undef
            }
        }
    }
}

impl DataflowAnalysis for Analysis<'_> {
    type Fact = CpFact;

    fn is_forward(&self) -> bool {
        true
    }

    fn new_boundary_fact(&self) -> Self::Fact {
        let mut fact = CpFact::new();
        for param in self.ir.params() {
            if param.ty().is_integer() {
                fact.update(param.id(), CpValue::Nac);
            }
        }
        fact
    }

    fn new_initial_fact(&self) -> Self::Fact {
        CpFact::new()
    }

    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact) {
        for (var, value) in fact.iter() {
            let merged = value.meet(target.get(var));
            target.update(var, merged);
        }
    }

    fn transfer_node(
        &self,
        stmt: &Stmt,
        in_fact: &mut Self::Fact,
        out_fact: &mut Self::Fact,
    ) -> bool {
        let old_out = out_fact.clone();
        out_fact.copy_from(in_fact);
        if let Some(node) = stmt.ast_stmt() {
            match &self.ir.ast().stmt(node).kind {
                AstStmtKind::Decl {
                    decl,
                    init: Some(init),
                } => {
                    let value = self.eval(*init, out_fact);
                    if let Some(var) = self.tracked_var(*decl) {
                        out_fact.update(var, value);
                    }
                }
                AstStmtKind::Decl { init: None, .. } => {}
                AstStmtKind::Expr { expr } => {
                    self.eval(*expr, out_fact);
                }
                AstStmtKind::Return { value: Some(value) } => {
                    self.eval(*value, out_fact);
                }
                AstStmtKind::Return { value: None } => {}
            }
        }
        *out_fact != old_out
    }

    fn cfg(&self) -> &Cfg {
        self.ir.cfg()
    }

    fn ir(&self) -> &Ir {
        self.ir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn int(value: i64) -> ApsInt {
        ApsInt::from_i64(value, 32, true)
    }

    #[test]
    fn aps_int_round_trips_signed_values() {
        assert_eq!(int(-15).as_i64(), -15);
        assert_eq!(int(-1).as_u64(), 0xffff_ffff);
        assert_eq!(ApsInt::new(0xffff_ffff, 32, false).as_i64(), 0xffff_ffff);
        assert_eq!(int(7).to_string(), "7");
        assert_eq!(int(-7).to_string(), "-7");
    }

    #[test]
    fn aps_int_arithmetic_wraps_at_width() {
        let max = ApsInt::from_i64(i64::from(i32::MAX), 32, true);
        assert_eq!(max.wrapping_add(int(1)).as_i64(), i64::from(i32::MIN));
        assert_eq!(int(15).wrapping_div(int(2)).as_i64(), 7);
        assert_eq!(int(-15).wrapping_div(int(2)).as_i64(), -7);
        assert_eq!(int(15).wrapping_rem(int(2)).as_i64(), 1);
        assert_eq!(int(15).shl(2).as_i64(), 60);
        assert_eq!(int(-16).shr(2).as_i64(), -4);
        assert_eq!(ApsInt::new(0x8000_0000, 32, false).shr(31).as_u64(), 1);
    }

    #[test]
    fn casts_truncate_and_extend() {
        let value = int(0x1ff);
        assert_eq!(value.cast_to(8, false).as_u64(), 0xff);
        assert_eq!(value.cast_to(8, true).as_i64(), -1);
        assert_eq!(int(-1).cast_to(64, true).as_i64(), -1);
        assert_eq!(int(1).cast_to(1, false).as_u64(), 1);
        assert_eq!(int(2).cast_to(1, false).as_u64(), 0);
    }

    #[test]
    fn equality_is_bit_pattern_width_and_signedness() {
        assert_eq!(int(1), int(1));
        assert_ne!(int(1), ApsInt::new(1, 32, false));
        assert_ne!(int(1), ApsInt::from_i64(1, 64, true));
    }

    #[test]
    fn meet_follows_the_lattice() {
        use CpValue::{Const, Nac, Undef};
        assert_eq!(Undef.meet(Const(int(1))), Const(int(1)));
        assert_eq!(Const(int(1)).meet(Undef), Const(int(1)));
        assert_eq!(Const(int(1)).meet(Const(int(1))), Const(int(1)));
        assert_eq!(Const(int(1)).meet(Const(int(2))), Nac);
        assert_eq!(Nac.meet(Undef), Nac);
        assert_eq!(Undef.meet(Undef), Undef);
    }

    #[test]
    fn division_by_known_zero_is_undef() {
        use CpValue::{Const, Nac, Undef};
        let ty = Type::builtin(crate::language::TypeKind::Int);
        assert_eq!(fold(BinaryOp::Div, Nac, Const(int(0)), &ty), Undef);
        assert_eq!(fold(BinaryOp::Rem, Const(int(5)), Const(int(0)), &ty), Undef);
        assert_eq!(fold(BinaryOp::Div, Const(int(5)), Nac, &ty), Nac);
        assert_eq!(fold(BinaryOp::Div, Undef, Const(int(2)), &ty), Nac);
        assert_eq!(fold(BinaryOp::Add, Undef, Const(int(2)), &ty), Undef);
    }

    #[test]
    fn cp_fact_reads_absent_as_undef() {
        let mut fact = CpFact::new();
        let x = VarId::from(0);
        assert!(fact.get(x).is_undef());
        assert!(fact.update(x, CpValue::Const(int(3))));
        assert!(!fact.update(x, CpValue::Const(int(3))));
        assert!(fact.update(x, CpValue::Undef));
        assert!(fact.is_empty());
        assert!(!fact.update(x, CpValue::Undef));
    }

    #[test]
    #[should_panic(expected = "not a constant")]
    fn constant_value_of_nac_panics() {
        let _ = CpValue::Nac.constant_value();
    }
}
