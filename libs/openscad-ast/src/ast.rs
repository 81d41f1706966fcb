//! # AST Nodes
//!
//! Typed syntax tree produced by the text parser and by the scripting
//! front end. Every node carries a [`Span`]; nodes built in code use
//! [`Span::default`].
//!
//! ## Shape
//!
//! ```text
//! Statement
//! ├── Assignment      name = expr;
//! ├── FunctionDef     function f(params) = expr;
//! ├── ModuleDef       module m(params) { statements }
//! ├── Invocation      [modifier] name(args) children
//! ├── If              if (cond) then [else other]
//! ├── For             for / intersection_for (bindings) body
//! ├── Let             let (bindings) body
//! └── Block           { statements }
//! ```

use serde::{Deserialize, Serialize};

use crate::span::{Span, Spanned};

// =============================================================================
// STATEMENTS
// =============================================================================

/// A statement with its source range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

/// Statement variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementKind {
    /// `name = value;`
    Assignment(Assignment),
    /// `function name(params) = body;`
    FunctionDef(FunctionDef),
    /// `module name(params) { body }`
    ModuleDef(ModuleDef),
    /// `name(args) child` or `name(args) { children }`
    Invocation(Invocation),
    /// `if (condition) then else other`
    If(IfStatement),
    /// `for (bindings) body` or `intersection_for (bindings) body`
    For(ForStatement),
    /// `let (bindings) body`
    Let(LetStatement),
    /// `{ statements }`
    Block(Vec<Statement>),
}

/// `name = value`, used for top-level assignments and for bindings in
/// `for`, `let` and comprehension headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub name: String,
    pub value: Expression,
    pub span: Span,
}

/// A user function. The body is a single pure expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Parameter>,
    pub body: Expression,
}

/// A user module. The body is a statement list that may call `children()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDef {
    pub name: String,
    pub params: Vec<Parameter>,
    pub body: Vec<Statement>,
}

/// Module invocation.
///
/// `children` holds the trailing statement, or the statements of a trailing
/// brace block; it is empty when the invocation ends in `;`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub name: String,
    pub args: Vec<Argument>,
    pub children: Vec<Statement>,
    pub modifier: Option<Modifier>,
}

/// `if` statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_branch: Vec<Statement>,
    pub else_branch: Option<Vec<Statement>>,
}

/// `for` statement. Multiple bindings iterate as nested loops, first
/// binding outermost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForStatement {
    pub bindings: Vec<Assignment>,
    pub body: Vec<Statement>,
    /// `intersection_for` instead of `for`.
    pub intersection: bool,
}

/// `let` statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetStatement {
    pub bindings: Vec<Assignment>,
    pub body: Vec<Statement>,
}

/// Formal parameter with optional default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub default: Option<Expression>,
    pub span: Span,
}

/// Call argument; `name` is set for `name = value` arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Expression,
    pub span: Span,
}

// =============================================================================
// MODIFIERS
// =============================================================================

/// Visualization modifier attached to a module invocation.
///
/// Ordering follows scene precedence: `Disable < Background < Debug < Root`.
///
/// ```rust
/// use openscad_ast::Modifier;
///
/// assert!(Modifier::Root > Modifier::Debug);
/// assert_eq!(Modifier::from_sigil('%'), Some(Modifier::Background));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Modifier {
    /// `*` skip the subtree entirely.
    Disable,
    /// `%` exclude from the result, show as a transparent highlight.
    Background,
    /// `#` keep in the result and also show as a highlight.
    Debug,
    /// `!` render only this subtree.
    Root,
}

impl Modifier {
    /// Map a sigil character to its modifier.
    pub fn from_sigil(sigil: char) -> Option<Self> {
        match sigil {
            '!' => Some(Self::Root),
            '#' => Some(Self::Debug),
            '%' => Some(Self::Background),
            '*' => Some(Self::Disable),
            _ => None,
        }
    }

    /// The sigil for this modifier.
    pub fn sigil(&self) -> char {
        match self {
            Self::Root => '!',
            Self::Debug => '#',
            Self::Background => '%',
            Self::Disable => '*',
        }
    }
}

// =============================================================================
// EXPRESSIONS
// =============================================================================

/// An expression with its source range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: Span,
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionKind {
    /// Number, string, boolean or `undef`.
    Literal(Literal),
    /// Variable reference, including `$`-prefixed special variables.
    Identifier(String),
    /// `-x`, `+x`, `!x`
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    /// `a op b`
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `c ? a : b`
    Ternary {
        condition: Box<Expression>,
        then_expr: Box<Expression>,
        else_expr: Box<Expression>,
    },
    /// `[a, b, c]`
    Vector(Vec<Expression>),
    /// `[start : end]` or `[start : step : end]`
    Range {
        start: Box<Expression>,
        step: Option<Box<Expression>>,
        end: Box<Expression>,
    },
    /// `[ elements ]` containing at least one generator.
    Comprehension(Vec<Element>),
    /// `target[index]`
    Index {
        target: Box<Expression>,
        index: Box<Expression>,
    },
    /// `target.x`, `target.y`, `target.z`
    Member {
        target: Box<Expression>,
        field: String,
    },
    /// `callee(args)`
    Call {
        callee: Box<Expression>,
        args: Vec<Argument>,
    },
    /// `let (bindings) body`
    Let {
        bindings: Vec<Assignment>,
        body: Box<Expression>,
    },
    /// `function (params) body`
    FunctionLiteral {
        params: Vec<Parameter>,
        body: Box<Expression>,
    },
    /// `echo(args) body`
    Echo {
        args: Vec<Argument>,
        body: Option<Box<Expression>>,
    },
    /// `assert(args) body`
    Assert {
        args: Vec<Argument>,
        body: Option<Box<Expression>>,
    },
}

/// Literal constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
    Undef,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Negate,
    Plus,
    Not,
}

impl UnaryOp {
    /// Source symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Negate => "-",
            Self::Plus => "+",
            Self::Not => "!",
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

impl BinaryOp {
    /// Source symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Power => "^",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

// =============================================================================
// LIST COMPREHENSION ELEMENTS
// =============================================================================

/// One element of a list comprehension.
///
/// `[for (i = [0:3]) if (i % 2 == 0) i * i]` is
/// `For { bindings: [i], body: If { condition, then: Expr(i * i) } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Element {
    /// A plain expression producing one value.
    Expr(Expression),
    /// `for (bindings) body`; every binding opens a fresh scope.
    For {
        bindings: Vec<Assignment>,
        body: Box<Element>,
    },
    /// `for (init; condition; update) body`
    ForC {
        init: Vec<Assignment>,
        condition: Expression,
        update: Vec<Assignment>,
        body: Box<Element>,
    },
    /// `if (condition) then [else otherwise]`
    If {
        condition: Expression,
        then_branch: Box<Element>,
        else_branch: Option<Box<Element>>,
    },
    /// `let (bindings) body`
    Let {
        bindings: Vec<Assignment>,
        body: Box<Element>,
    },
    /// `each body`, splicing a list into the enclosing one.
    Each(Box<Element>),
}

// =============================================================================
// CONSTRUCTORS
// =============================================================================

impl Statement {
    /// Create a statement.
    pub fn new(kind: StatementKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Module invocation without source position.
    ///
    /// ```rust
    /// use openscad_ast::{Argument, Expression, Statement};
    ///
    /// let cube = Statement::invocation("cube", vec![Argument::positional(Expression::number(10.0))], vec![]);
    /// assert_eq!(cube.invocation_name(), Some("cube"));
    /// ```
    pub fn invocation(name: impl Into<String>, args: Vec<Argument>, children: Vec<Statement>) -> Self {
        Self::new(
            StatementKind::Invocation(Invocation {
                name: name.into(),
                args,
                children,
                modifier: None,
            }),
            Span::default(),
        )
    }

    /// Assignment without source position.
    pub fn assignment(name: impl Into<String>, value: Expression) -> Self {
        Self::new(
            StatementKind::Assignment(Assignment::new(name, value)),
            Span::default(),
        )
    }

    /// Name of the invoked module, for invocation statements.
    pub fn invocation_name(&self) -> Option<&str> {
        match &self.kind {
            StatementKind::Invocation(call) => Some(call.name.as_str()),
            _ => None,
        }
    }

    /// Same statement with a modifier attached, if it is an invocation.
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        if let StatementKind::Invocation(call) = &mut self.kind {
            call.modifier = Some(modifier);
        }
        self
    }
}

impl Assignment {
    /// Binding without source position.
    pub fn new(name: impl Into<String>, value: Expression) -> Self {
        Self {
            name: name.into(),
            value,
            span: Span::default(),
        }
    }
}

impl Argument {
    /// Positional argument.
    pub fn positional(value: Expression) -> Self {
        Self {
            name: None,
            value,
            span: Span::default(),
        }
    }

    /// `name = value` argument.
    pub fn named(name: impl Into<String>, value: Expression) -> Self {
        Self {
            name: Some(name.into()),
            value,
            span: Span::default(),
        }
    }
}

impl Parameter {
    /// Parameter without source position.
    pub fn new(name: impl Into<String>, default: Option<Expression>) -> Self {
        Self {
            name: name.into(),
            default,
            span: Span::default(),
        }
    }
}

impl Expression {
    /// Create an expression.
    pub fn new(kind: ExpressionKind, span: Span) -> Self {
        Self { kind, span }
    }

    fn synthetic(kind: ExpressionKind) -> Self {
        Self::new(kind, Span::default())
    }

    /// Number literal.
    pub fn number(value: f64) -> Self {
        Self::synthetic(ExpressionKind::Literal(Literal::Number(value)))
    }

    /// String literal.
    pub fn string(value: impl Into<String>) -> Self {
        Self::synthetic(ExpressionKind::Literal(Literal::String(value.into())))
    }

    /// Boolean literal.
    pub fn boolean(value: bool) -> Self {
        Self::synthetic(ExpressionKind::Literal(Literal::Boolean(value)))
    }

    /// `undef`.
    pub fn undef() -> Self {
        Self::synthetic(ExpressionKind::Literal(Literal::Undef))
    }

    /// Variable reference.
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::synthetic(ExpressionKind::Identifier(name.into()))
    }

    /// Vector of expressions.
    pub fn vector(items: Vec<Expression>) -> Self {
        Self::synthetic(ExpressionKind::Vector(items))
    }

    /// Vector of number literals.
    ///
    /// ```rust
    /// use openscad_ast::{Expression, ExpressionKind};
    ///
    /// let v = Expression::numbers(&[1.0, 2.0, 3.0]);
    /// assert!(matches!(v.kind, ExpressionKind::Vector(ref items) if items.len() == 3));
    /// ```
    pub fn numbers(values: &[f64]) -> Self {
        Self::vector(values.iter().copied().map(Self::number).collect())
    }

    /// Range `[start : step : end]`.
    pub fn range(start: Expression, step: Option<Expression>, end: Expression) -> Self {
        Self::synthetic(ExpressionKind::Range {
            start: Box::new(start),
            step: step.map(Box::new),
            end: Box::new(end),
        })
    }

    /// Binary operation.
    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Self::synthetic(ExpressionKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Call of a named function.
    pub fn call(name: impl Into<String>, args: Vec<Argument>) -> Self {
        Self::synthetic(ExpressionKind::Call {
            callee: Box::new(Self::identifier(name)),
            args,
        })
    }

    /// The literal number, if this is one.
    pub fn as_number(&self) -> Option<f64> {
        match self.kind {
            ExpressionKind::Literal(Literal::Number(n)) => Some(n),
            _ => None,
        }
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Self::number(value)
    }
}

impl From<bool> for Expression {
    fn from(value: bool) -> Self {
        Self::boolean(value)
    }
}

impl From<&str> for Expression {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<[f64; 2]> for Expression {
    fn from(value: [f64; 2]) -> Self {
        Self::numbers(&value)
    }
}

impl From<[f64; 3]> for Expression {
    fn from(value: [f64; 3]) -> Self {
        Self::numbers(&value)
    }
}

impl From<Vec<f64>> for Expression {
    fn from(value: Vec<f64>) -> Self {
        Self::numbers(&value)
    }
}

impl Spanned for Statement {
    fn span(&self) -> Span {
        self.span
    }
}

impl Spanned for Expression {
    fn span(&self) -> Span {
        self.span
    }
}
