//! # Source Printer
//!
//! Renders AST nodes back to OpenSCAD source. Composite expressions are
//! fully parenthesized so the output re-parses to the same tree.
//!
//! ```rust
//! use openscad_ast::{print_statements, Argument, Expression, Statement};
//!
//! let cube = Statement::invocation("cube", vec![Argument::positional(Expression::number(10.0))], vec![]);
//! assert_eq!(print_statements(&[cube]), "cube(10);\n");
//! ```

use std::fmt::{self, Display, Write};

use crate::ast::*;

/// Print a statement list, one top-level statement per line.
pub fn print_statements(statements: &[Statement]) -> String {
    let mut out = String::new();
    for statement in statements {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{statement}");
    }
    out
}

// =============================================================================
// STATEMENTS
// =============================================================================

impl Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StatementKind::Assignment(a) => write!(f, "{} = {};", a.name, a.value),
            StatementKind::FunctionDef(def) => {
                write!(f, "function {}({}) = {};", def.name, Params(&def.params), def.body)
            }
            StatementKind::ModuleDef(def) => {
                write!(f, "module {}({}) {}", def.name, Params(&def.params), Body(&def.body))
            }
            StatementKind::Invocation(call) => {
                if let Some(modifier) = call.modifier {
                    write!(f, "{}", modifier.sigil())?;
                }
                write!(f, "{}({})", call.name, Args(&call.args))?;
                match call.children.as_slice() {
                    [] => f.write_str(";"),
                    [only] => write!(f, " {only}"),
                    many => write!(f, " {}", Body(many)),
                }
            }
            StatementKind::If(stmt) => {
                write!(f, "if ({}) {}", stmt.condition, Body(&stmt.then_branch))?;
                if let Some(other) = &stmt.else_branch {
                    write!(f, " else {}", Body(other))?;
                }
                Ok(())
            }
            StatementKind::For(stmt) => {
                let keyword = if stmt.intersection { "intersection_for" } else { "for" };
                write!(f, "{keyword} ({}) {}", Bindings(&stmt.bindings), Body(&stmt.body))
            }
            StatementKind::Let(stmt) => {
                write!(f, "let ({}) {}", Bindings(&stmt.bindings), Body(&stmt.body))
            }
            StatementKind::Block(body) => write!(f, "{}", Body(body)),
        }
    }
}

struct Body<'a>(&'a [Statement]);

impl Display for Body<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for statement in self.0 {
            write!(f, " {statement}")?;
        }
        f.write_str(" }")
    }
}

struct Params<'a>(&'a [Parameter]);

impl Display for Params<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, param) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&param.name)?;
            if let Some(default) = &param.default {
                write!(f, " = {default}")?;
            }
        }
        Ok(())
    }
}

struct Args<'a>(&'a [Argument]);

impl Display for Args<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if let Some(name) = &arg.name {
                write!(f, "{name} = ")?;
            }
            write!(f, "{}", arg.value)?;
        }
        Ok(())
    }
}

struct Bindings<'a>(&'a [Assignment]);

impl Display for Bindings<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, binding) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} = {}", binding.name, binding.value)?;
        }
        Ok(())
    }
}

// =============================================================================
// EXPRESSIONS
// =============================================================================

impl Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionKind::Literal(literal) => write!(f, "{literal}"),
            ExpressionKind::Identifier(name) => f.write_str(name),
            ExpressionKind::Unary { op, operand } => write!(f, "({}{})", op.symbol(), operand),
            ExpressionKind::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            ExpressionKind::Ternary { condition, then_expr, else_expr } => {
                write!(f, "({condition} ? {then_expr} : {else_expr})")
            }
            ExpressionKind::Vector(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            ExpressionKind::Range { start, step, end } => match step {
                Some(step) => write!(f, "[{start} : {step} : {end}]"),
                None => write!(f, "[{start} : {end}]"),
            },
            ExpressionKind::Comprehension(elements) => {
                f.write_str("[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str("]")
            }
            ExpressionKind::Index { target, index } => write!(f, "{target}[{index}]"),
            ExpressionKind::Member { target, field } => write!(f, "{target}.{field}"),
            ExpressionKind::Call { callee, args } => write!(f, "{callee}({})", Args(args)),
            ExpressionKind::Let { bindings, body } => {
                write!(f, "(let ({}) {body})", Bindings(bindings))
            }
            ExpressionKind::FunctionLiteral { params, body } => {
                write!(f, "(function ({}) {body})", Params(params))
            }
            ExpressionKind::Echo { args, body } => match body {
                Some(body) => write!(f, "(echo({}) {body})", Args(args)),
                None => write!(f, "echo({})", Args(args)),
            },
            ExpressionKind::Assert { args, body } => match body {
                Some(body) => write!(f, "(assert({}) {body})", Args(args)),
                None => write!(f, "assert({})", Args(args)),
            },
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) if n.is_nan() => f.write_str("(0 / 0)"),
            Literal::Number(n) if n.is_infinite() && *n > 0.0 => f.write_str("(1 / 0)"),
            Literal::Number(n) if n.is_infinite() => f.write_str("(-1 / 0)"),
            Literal::Number(n) if *n < 0.0 => write!(f, "(-{})", -n),
            Literal::Number(n) => write!(f, "{n}"),
            Literal::String(s) => {
                f.write_char('"')?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        '\r' => f.write_str("\\r")?,
                        other => f.write_char(other)?,
                    }
                }
                f.write_char('"')
            }
            Literal::Boolean(b) => write!(f, "{b}"),
            Literal::Undef => f.write_str("undef"),
        }
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Expr(expr) => write!(f, "{expr}"),
            Element::For { bindings, body } => write!(f, "for ({}) {body}", Bindings(bindings)),
            Element::ForC { init, condition, update, body } => write!(
                f,
                "for ({}; {condition}; {}) {body}",
                Bindings(init),
                Bindings(update)
            ),
            Element::If { condition, then_branch, else_branch } => {
                write!(f, "if ({condition}) {then_branch}")?;
                if let Some(other) = else_branch {
                    write!(f, " else {other}")?;
                }
                Ok(())
            }
            Element::Let { bindings, body } => write!(f, "let ({}) {body}", Bindings(bindings)),
            Element::Each(body) => write!(f, "each {body}"),
        }
    }
}
