//! # OpenSCAD AST
//!
//! Syntax tree shared by the text parser (`openscad-parser`) and the
//! scripting front end (`openscad-script`). Both produce [`Statement`]
//! lists consumed by `openscad-eval`.
//!
//! ## Architecture
//!
//! ```text
//! source ─→ openscad-parser ─┐
//!                            ├─→ Vec<Statement> ─→ openscad-eval
//! Solid / dsl ───────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use openscad_ast::{Argument, Expression, Statement, StatementKind};
//!
//! let stmt = Statement::invocation("sphere", vec![Argument::named("r", Expression::number(5.0))], vec![]);
//! assert!(matches!(stmt.kind, StatementKind::Invocation(_)));
//! ```

pub mod ast;
pub mod printer;
pub mod span;

pub use ast::{
    Argument, Assignment, BinaryOp, Element, Expression, ExpressionKind, ForStatement,
    FunctionDef, IfStatement, Invocation, LetStatement, Literal, Modifier, ModuleDef, Parameter,
    Statement, StatementKind, UnaryOp,
};
pub use printer::print_statements;
pub use span::{Position, Span, Spanned};

#[cfg(test)]
mod tests;
