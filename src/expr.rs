use crate::token::Token;

/// Parse-time identity for expression nodes that the resolver binds.
///
/// Two structurally identical `Variable` nodes must resolve independently,
/// so the side table is keyed by this id rather than by value.  The driver
/// threads the counter across REPL lines to keep ids unique for the
/// lifetime of the interpreter.
pub type ExprId = usize;

#[derive(Debug, Clone)]
pub enum Expr {
    // Variable assignment: `name = value`
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    // Two operands joined by an arithmetic, comparison or equality operator
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    // Callee followed by a parenthesized argument list; `paren` is the
    // closing parenthesis, kept for error locations
    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },

    // Property read: `object.name`
    Get {
        object: Box<Expr>,
        name: Token,
    },

    // Parenthesized expression
    Grouping(Box<Expr>),

    // Literal value carried in the token payload
    Literal(Token),

    // `and` / `or`, short-circuiting
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    // Property write: `object.name = value`
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    // `super.method`
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },

    // `this`
    This {
        id: ExprId,
        keyword: Token,
    },

    // Prefix `!` or `-`
    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    // Variable read
    Variable {
        id: ExprId,
        name: Token,
    },
}
