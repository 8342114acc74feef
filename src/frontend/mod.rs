//! The front-end contract and the bundled reference front end.
//!
//! The analysis core consumes translation units through the data model in
//! [`ast`]: function definitions with typed parameters, an arena syntax
//! tree, and a statement-level block graph with distinguished entry and
//! exit blocks. Any C/C++ parser can target that model; the bundled front
//! end ([`parse_translation_unit`]) covers the C subset the analyser
//! models, so the analyzer binaries and the end-to-end tests are
//! self-contained.

pub mod ast;
mod blocks;
pub mod lexer;
pub mod parser;
mod sema;

use crate::language::Type;

use self::ast::{DeclId, FunctionAst};
pub use self::parser::ParseError;

/// One function definition, as the front end hands it to the core.
#[derive(Debug)]
pub struct FunctionDef {
    /// The function's name.
    pub name: String,
    /// The declared return type.
    pub return_type: Type,
    /// The parameter declarations, in order; they resolve through
    /// [`FunctionDef::ast`].
    pub params: Vec<DeclId>,
    /// The body: node arenas plus the block graph.
    pub ast: FunctionAst,
}

impl FunctionDef {
    /// The program-wide signature string of the function:
    /// return type, name, and comma-separated parameter types.
    #[must_use]
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|&decl| self.ast.decl(decl).ty.name())
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} {}({})", self.return_type, self.name, params)
    }
}

/// The front-end view of one source file.
#[derive(Debug)]
pub struct TranslationUnit {
    /// Every function definition in the file, in source order.
    pub functions: Vec<FunctionDef>,
}

/// Parses one source file into a [`TranslationUnit`].
///
/// # Errors
/// Returns a [`ParseError`] when the source does not lex, does not parse,
/// or leaves the modelled subset.
pub fn parse_translation_unit(source: &str) -> Result<TranslationUnit, ParseError> {
    let functions = parser::parse(source)?
        .into_iter()
        .map(|parsed| {
            let mut ast = parsed.ast;
            ast.blocks = blocks::lower(&parsed.body);
            FunctionDef {
                name: parsed.name,
                return_type: parsed.return_type,
                params: parsed.params,
                ast,
            }
        })
        .collect();
    Ok(TranslationUnit { functions })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_strings() {
        let unit = parse_translation_unit(
            "int ifElse(int m, int n, unsigned k) { return m + n; }\nvoid nothing() { }",
        )
        .unwrap();
        assert_eq!(
            unit.functions[0].signature(),
            "int ifElse(int, int, unsigned int)"
        );
        assert_eq!(unit.functions[1].signature(), "void nothing()");
    }

    #[test]
    fn straight_line_code_is_one_block() {
        let unit =
            parse_translation_unit("int dummy() { int x; int y; y = x = 1; return y; }").unwrap();
        let ast = &unit.functions[0].ast;
        let graph = ast.blocks();
        let entry = graph.block(graph.entry());
        assert!(entry.elements.is_empty());
        assert_eq!(entry.succs.len(), 1);
        let body = graph.block(entry.succs[0]);
        assert_eq!(body.elements.len(), 4);
        assert_eq!(body.succs, vec![graph.exit()]);
        assert!(graph.block(graph.exit()).succs.is_empty());
    }

    #[test]
    fn if_else_forks_and_joins() {
        let unit = parse_translation_unit(
            "int f(int a, int b, int c) { int x; if (a > 0) x = a; else x = b; int y = x; return y; }",
        )
        .unwrap();
        let ast = &unit.functions[0].ast;
        let graph = ast.blocks();
        let head = graph.block(graph.block(graph.entry()).succs[0]);
        // `int x;` plus the condition element.
        assert_eq!(head.elements.len(), 2);
        assert_eq!(ast.render_stmt(head.elements[1]), "a > 0");
        assert_eq!(head.succs.len(), 2);
        let join_candidates: Vec<_> = head
            .succs
            .iter()
            .map(|&succ| graph.block(succ).succs.clone())
            .collect();
        // Both branches flow to the same join block.
        assert_eq!(join_candidates[0], join_candidates[1]);
    }

    #[test]
    fn while_loops_have_back_edges() {
        let unit = parse_translation_unit(
            "int loop(int a, int b) { int c; while (a > b) { c = b; --a; } return c; }",
        )
        .unwrap();
        let ast = &unit.functions[0].ast;
        let graph = ast.blocks();
        let first = graph.block(graph.entry()).succs[0];
        let head = graph.block(first).succs[0];
        assert_eq!(ast.render_stmt(graph.block(head).elements[0]), "a > b");
        let body = graph.block(head).succs[0];
        assert_eq!(graph.block(body).succs, vec![head]);
    }

    #[test]
    fn code_after_return_is_kept_unreachable() {
        let unit =
            parse_translation_unit("int f() { return 1; int dead = 2; return dead; }").unwrap();
        let graph = unit.functions[0].ast.blocks();
        let reachable_from_entry = graph.block(graph.entry()).succs.len();
        assert_eq!(reachable_from_entry, 1);
        // The dead statements live in a block nothing points to.
        let orphan = graph
            .blocks()
            .filter(|(id, block)| {
                *id != graph.entry()
                    && !block.elements.is_empty()
                    && graph.blocks().all(|(_, b)| !b.succs.contains(id))
            })
            .count();
        assert_eq!(orphan, 1);
    }
}
