//! The lexer of the bundled front end.

use logos::Logos;

/// One lexical token of the C subset.
///
/// Preprocessor directives and comments are skipped wholesale: the bundled
/// front end works on preprocessed-enough sources and does not expand macros.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
#[logos(skip r"#[^\n]*")]
pub enum TokenKind {
    /// `bool` or `_Bool`.
    #[token("bool")]
    #[token("_Bool")]
    KwBool,
    /// `break`
    #[token("break")]
    KwBreak,
    /// `case`
    #[token("case")]
    KwCase,
    /// `char`
    #[token("char")]
    KwChar,
    /// `char16_t`
    #[token("char16_t")]
    KwChar16,
    /// `char32_t`
    #[token("char32_t")]
    KwChar32,
    /// `const`
    #[token("const")]
    KwConst,
    /// `continue`
    #[token("continue")]
    KwContinue,
    /// `default`
    #[token("default")]
    KwDefault,
    /// `do`
    #[token("do")]
    KwDo,
    /// `double`
    #[token("double")]
    KwDouble,
    /// `else`
    #[token("else")]
    KwElse,
    /// `float`
    #[token("float")]
    KwFloat,
    /// `for`
    #[token("for")]
    KwFor,
    /// `if`
    #[token("if")]
    KwIf,
    /// `int`
    #[token("int")]
    KwInt,
    /// `long`
    #[token("long")]
    KwLong,
    /// `return`
    #[token("return")]
    KwReturn,
    /// `short`
    #[token("short")]
    KwShort,
    /// `signed`
    #[token("signed")]
    KwSigned,
    /// `switch`
    #[token("switch")]
    KwSwitch,
    /// `unsigned`
    #[token("unsigned")]
    KwUnsigned,
    /// `void`
    #[token("void")]
    KwVoid,
    /// `while`
    #[token("while")]
    KwWhile,

    /// An identifier.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
    /// An integer literal, with an optional base prefix and suffix.
    #[regex(r"(?:0[xX][0-9a-fA-F]+|[0-9]+)(?:[uU][lL]{0,2}|[lL]{1,2}[uU]?)?")]
    IntLiteral,
    /// A character literal.
    #[regex(r"'(?:[^'\\\n]|\\(?:[nrtvabf0'\x22\\?]|x[0-9a-fA-F]{1,2}|[0-7]{1,3}))'")]
    CharLiteral,

    /// `++`
    #[token("++")]
    PlusPlus,
    /// `--`
    #[token("--")]
    MinusMinus,
    /// `<<=`
    #[token("<<=")]
    ShlAssign,
    /// `>>=`
    #[token(">>=")]
    ShrAssign,
    /// `<<`
    #[token("<<")]
    Shl,
    /// `>>`
    #[token(">>")]
    Shr,
    /// `<=`
    #[token("<=")]
    Le,
    /// `>=`
    #[token(">=")]
    Ge,
    /// `==`
    #[token("==")]
    EqEq,
    /// `!=`
    #[token("!=")]
    Ne,
    /// `&&`
    #[token("&&")]
    AndAnd,
    /// `||`
    #[token("||")]
    OrOr,
    /// `+=`
    #[token("+=")]
    PlusAssign,
    /// `-=`
    #[token("-=")]
    MinusAssign,
    /// `*=`
    #[token("*=")]
    StarAssign,
    /// `/=`
    #[token("/=")]
    SlashAssign,
    /// `%=`
    #[token("%=")]
    PercentAssign,
    /// `&=`
    #[token("&=")]
    AmpAssign,
    /// `|=`
    #[token("|=")]
    PipeAssign,
    /// `^=`
    #[token("^=")]
    CaretAssign,
    /// `=`
    #[token("=")]
    Assign,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `%`
    #[token("%")]
    Percent,
    /// `&`
    #[token("&")]
    Amp,
    /// `|`
    #[token("|")]
    Pipe,
    /// `^`
    #[token("^")]
    Caret,
    /// `~`
    #[token("~")]
    Tilde,
    /// `!`
    #[token("!")]
    Bang,
    /// `<`
    #[token("<")]
    Lt,
    /// `>`
    #[token(">")]
    Gt,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `;`
    #[token(";")]
    Semi,
    /// `,`
    #[token(",")]
    Comma,
    /// `?`
    #[token("?")]
    Question,
    /// `:`
    #[token(":")]
    Colon,
}

/// A token together with its byte range in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// The kind of the token.
    pub kind: TokenKind,
    /// The byte offset the token starts at.
    pub start: usize,
    /// The byte offset just past the token.
    pub end: usize,
}

/// Maps byte offsets to 1-based line/column positions.
#[derive(Debug, Clone)]
pub struct LineMap {
    line_starts: Vec<usize>,
}

impl LineMap {
    /// Builds the map for a source text.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    /// The 1-based `(line, column)` of a byte offset.
    #[must_use]
    pub fn location(&self, offset: usize) -> (i32, i32) {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let column = offset - self.line_starts[line];
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        ((line + 1) as i32, (column + 1) as i32)
    }
}

/// Tokenises a source text.
///
/// # Errors
/// Returns the byte offset of the first character no token matches.
pub fn tokenize(source: &str) -> Result<Vec<Token>, usize> {
    let mut tokens = Vec::new();
    for (result, span) in TokenKind::lexer(source).spanned() {
        match result {
            Ok(kind) => tokens.push(Token {
                kind,
                start: span.start,
                end: span.end,
            }),
            Err(()) => return Err(span.start),
        }
    }
    Ok(tokens)
}
