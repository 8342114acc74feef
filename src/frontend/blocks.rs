//! Lowering of structured function bodies to the statement-level block
//! graph consumed by the IR builder.
//!
//! Every block element has already been interned into the function's
//! statement arena; this pass only arranges the element ids into basic
//! blocks and wires successor lists. Branch conditions are block elements of
//! their own, so dataflow sees the reads they perform. Statements that can
//! only be reached by falling past a terminator land in blocks with no
//! predecessors; such unreachable code is kept, not pruned.

use super::ast::{BasicBlock, BlockGraph, BlockId};
use super::parser::{BodyStmt, SwitchArm};

pub(crate) fn lower(body: &[BodyStmt]) -> BlockGraph {
    let mut lowering = Lowering {
        blocks: Vec::new(),
        preds: Vec::new(),
        loops: Vec::new(),
        current: BlockId::from(0),
        exit: BlockId::from(0),
    };
    let entry = lowering.new_block();
    let exit = lowering.new_block();
    let first = lowering.new_block();
    lowering.add_edge(entry, first);
    lowering.current = first;
    lowering.exit = exit;
    lowering.lower_all(body);
    let last = lowering.current;
    lowering.edge_if_live(last, exit);
    BlockGraph {
        blocks: lowering.blocks,
        entry,
        exit,
    }
}

struct Lowering {
    blocks: Vec<BasicBlock>,
    preds: Vec<usize>,
    loops: Vec<LoopCtx>,
    current: BlockId,
    exit: BlockId,
}

/// Break/continue targets of an enclosing loop or switch.
struct LoopCtx {
    break_target: BlockId,
    continue_target: Option<BlockId>,
}

impl Lowering {
    fn new_block(&mut self) -> BlockId {
        let id = BlockId::from(u32::try_from(self.blocks.len()).expect("block count fits u32"));
        self.blocks.push(BasicBlock::default());
        self.preds.push(0);
        id
    }

    fn add_edge(&mut self, from: BlockId, to: BlockId) {
        self.blocks[from.index()].succs.push(to);
        self.preds[to.index()] += 1;
    }

    /// A block is dead when nothing reaches it and it holds nothing.
    /// Edges out of dead blocks are dropped.
    fn is_live(&self, block: BlockId) -> bool {
        self.preds[block.index()] > 0 || !self.blocks[block.index()].elements.is_empty()
    }

    fn edge_if_live(&mut self, from: BlockId, to: BlockId) {
        if self.is_live(from) {
            self.add_edge(from, to);
        }
    }

    fn lower_all(&mut self, stmts: &[BodyStmt]) {
        for stmt in stmts {
            self.lower_stmt(stmt);
        }
    }

    #[allow(clippy::too_many_lines)]
    fn lower_stmt(&mut self, stmt: &BodyStmt) {
        match stmt {
            BodyStmt::Compound(stmts) => self.lower_all(stmts),
            BodyStmt::Empty => {}
            BodyStmt::Decls(elements) => {
                let current = self.current.index();
                self.blocks[current].elements.extend_from_slice(elements);
            }
            BodyStmt::Expr(element) => {
                self.blocks[self.current.index()].elements.push(*element);
            }
            BodyStmt::Return(element) => {
                self.blocks[self.current.index()].elements.push(*element);
                let (current, exit) = (self.current, self.exit);
                self.add_edge(current, exit);
                self.current = self.new_block();
            }
            BodyStmt::Break => {
                let target = self
                    .loops
                    .last()
                    .expect("the parser rejects break outside loops and switches")
                    .break_target;
                let current = self.current;
                self.add_edge(current, target);
                self.current = self.new_block();
            }
            BodyStmt::Continue => {
                let target = self
                    .loops
                    .iter()
                    .rev()
                    .find_map(|ctx| ctx.continue_target)
                    .expect("the parser rejects continue outside loops");
                let current = self.current;
                self.add_edge(current, target);
                self.current = self.new_block();
            }
            BodyStmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.blocks[self.current.index()].elements.push(*cond);
                let head = self.current;
                let join = self.new_block();
                let then_block = self.new_block();
                self.add_edge(head, then_block);
                let else_block = else_branch.as_ref().map(|branch| {
                    let block = self.new_block();
                    self.add_edge(head, block);
                    (block, branch)
                });
                if else_block.is_none() {
                    self.add_edge(head, join);
                }
                self.current = then_block;
                self.lower_stmt(then_branch);
                let then_end = self.current;
                self.edge_if_live(then_end, join);
                if let Some((block, branch)) = else_block {
                    self.current = block;
                    self.lower_stmt(branch);
                    let else_end = self.current;
                    self.edge_if_live(else_end, join);
                }
                self.current = join;
            }
            BodyStmt::While { cond, body } => {
                let head = self.new_block();
                let current = self.current;
                self.edge_if_live(current, head);
                self.blocks[head.index()].elements.push(*cond);
                let body_block = self.new_block();
                let after = self.new_block();
                self.add_edge(head, body_block);
                self.add_edge(head, after);
                self.loops.push(LoopCtx {
                    break_target: after,
                    continue_target: Some(head),
                });
                self.current = body_block;
                self.lower_stmt(body);
                let body_end = self.current;
                self.edge_if_live(body_end, head);
                self.loops.pop();
                self.current = after;
            }
            BodyStmt::DoWhile { body, cond } => {
                let body_block = self.new_block();
                let current = self.current;
                self.edge_if_live(current, body_block);
                let head = self.new_block();
                self.blocks[head.index()].elements.push(*cond);
                let after = self.new_block();
                self.add_edge(head, body_block);
                self.add_edge(head, after);
                self.loops.push(LoopCtx {
                    break_target: after,
                    continue_target: Some(head),
                });
                self.current = body_block;
                self.lower_stmt(body);
                let body_end = self.current;
                self.edge_if_live(body_end, head);
                self.loops.pop();
                self.current = after;
            }
            BodyStmt::For {
                init,
                cond,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.lower_stmt(init);
                }
                let head = self.new_block();
                let current = self.current;
                self.edge_if_live(current, head);
                if let Some(cond) = cond {
                    self.blocks[head.index()].elements.push(*cond);
                }
                let body_block = self.new_block();
                let after = self.new_block();
                self.add_edge(head, body_block);
                if cond.is_some() {
                    self.add_edge(head, after);
                }
                let step_block = (*step).map(|step| {
                    let block = self.new_block();
                    self.blocks[block.index()].elements.push(step);
                    self.add_edge(block, head);
                    block
                });
                self.loops.push(LoopCtx {
                    break_target: after,
                    continue_target: Some(step_block.unwrap_or(head)),
                });
                self.current = body_block;
                self.lower_stmt(body);
                let body_end = self.current;
                self.edge_if_live(body_end, step_block.unwrap_or(head));
                self.loops.pop();
                self.current = after;
            }
            BodyStmt::Switch {
                cond,
                arms,
                has_default,
            } => {
                self.blocks[self.current.index()].elements.push(*cond);
                let head = self.current;
                let after = self.new_block();
                let arm_blocks: Vec<BlockId> = arms.iter().map(|_| self.new_block()).collect();
                for &block in &arm_blocks {
                    self.add_edge(head, block);
                }
                if !has_default {
                    self.add_edge(head, after);
                }
                self.loops.push(LoopCtx {
                    break_target: after,
                    continue_target: None,
                });
                for (i, SwitchArm { body, .. }) in arms.iter().enumerate() {
                    self.current = arm_blocks[i];
                    self.lower_all(body);
                    let end = self.current;
                    let fallthrough = arm_blocks.get(i + 1).copied().unwrap_or(after);
                    self.edge_if_live(end, fallthrough);
                }
                self.loops.pop();
                self.current = after;
            }
        }
    }
}
