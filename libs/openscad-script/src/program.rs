//! # Programs
//!
//! An ordered list of top-level assignments and solids. This is what a
//! scripting job carries: the JSON form travels as the request's `code`
//! and [`Program::statements`] turns it into the AST the evaluator runs.
//!
//! ```rust
//! use openscad_script::{Program, Solid};
//!
//! let program = Program::new()
//!     .set("$fn", 48.0)
//!     .add(Solid::sphere(5.0));
//! let json = program.to_json().unwrap();
//! assert_eq!(Program::from_json(&json).unwrap(), program);
//! assert_eq!(program.to_source(), "$fn = 48;\nsphere(r = 5);\n");
//! ```

use openscad_ast::{print_statements, Expression, Statement};
use serde::{Deserialize, Serialize};

use crate::error::{ScriptError, ScriptResult};
use crate::solid::Solid;

/// Top-level entries in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    items: Vec<Item>,
}

/// One top-level entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Item {
    /// `name = value;`, including special variables such as `$fn`.
    Assign { name: String, value: Expression },
    /// A geometry statement; siblings are implicitly unioned.
    Solid { solid: Solid },
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an assignment.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Expression>) -> Self {
        self.items.push(Item::Assign {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Append a solid.
    pub fn add(mut self, solid: Solid) -> Self {
        self.items.push(Item::Solid { solid });
        self
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Check every assignment target is an identifier.
    pub fn validate(&self) -> ScriptResult<()> {
        for item in &self.items {
            if let Item::Assign { name, .. } = item {
                if !is_identifier(name) {
                    return Err(ScriptError::InvalidName(name.clone()));
                }
            }
        }
        Ok(())
    }

    /// The AST consumed by the evaluator.
    pub fn statements(&self) -> Vec<Statement> {
        self.items
            .iter()
            .map(|item| match item {
                Item::Assign { name, value } => Statement::assignment(name.clone(), value.clone()),
                Item::Solid { solid } => solid.statement().clone(),
            })
            .collect()
    }

    /// Equivalent OpenSCAD source.
    pub fn to_source(&self) -> String {
        print_statements(&self.statements())
    }

    pub fn to_json(&self) -> ScriptResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode and validate a program.
    pub fn from_json(json: &str) -> ScriptResult<Self> {
        let program: Self = serde_json::from_str(json)?;
        program.validate()?;
        tracing::debug!(items = program.items.len(), "decoded script program");
        Ok(program)
    }
}

fn is_identifier(name: &str) -> bool {
    let body = name.strip_prefix('$').unwrap_or(name);
    let mut chars = body.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl FromIterator<Solid> for Program {
    fn from_iter<I: IntoIterator<Item = Solid>>(solids: I) -> Self {
        solids.into_iter().fold(Self::new(), Self::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_keep_order() {
        let program = Program::new()
            .add(Solid::cube(1.0))
            .set("size", 3.0)
            .add(Solid::cube(Expression::identifier("size")));
        assert_eq!(program.to_source(), "cube(1);\nsize = 3;\ncube(size);\n");
        assert_eq!(program.statements().len(), 3);
    }

    #[test]
    fn test_json_shape() {
        let program = Program::new().set("$fn", 8.0);
        let value: serde_json::Value = serde_json::from_str(&program.to_json().unwrap()).unwrap();
        assert_eq!(value["items"][0]["type"], "assign");
        assert_eq!(value["items"][0]["name"], "$fn");
    }

    #[test]
    fn test_rejects_bad_names() {
        let program = Program::new().set("2x", 1.0);
        let json = program.to_json().unwrap();
        assert!(matches!(
            Program::from_json(&json),
            Err(ScriptError::InvalidName(name)) if name == "2x"
        ));
        assert!(matches!(Program::from_json("{"), Err(ScriptError::Json(_))));
    }

    #[test]
    fn test_collect_solids() {
        let program: Program = [Solid::cube(1.0), Solid::sphere(1.0)].into_iter().collect();
        assert_eq!(program.items().len(), 2);
        assert!(!program.is_empty());
    }
}
