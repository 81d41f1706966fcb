//! # Scopes
//!
//! Lexical variables and definitions live in an append-only chain of
//! reference-counted frames. Binding a name never mutates an existing
//! frame; it pushes a new one whose parent is the old head. A closure
//! holds the head it saw, so frames form a tree and never a cycle.
//!
//! Special `$` variables follow the call tree instead of the lexical
//! tree and live in a separate chain carried alongside.
//!
//! ## Precedence of special variables
//!
//! ```text
//! call argument  >  local assignment  >  inherited  >  default
//! ```
//!
//! A `$name` passed as a call argument is pinned for the callee's body:
//! local assignments of the same name inside that body are ignored.

use std::collections::HashMap;
use std::rc::Rc;

use openscad_ast::{FunctionDef, ModuleDef, Statement, StatementKind};

use crate::value::Value;

/// Identifies one activation of a block.
pub type BlockId = u64;

/// Head of a lexical frame chain.
pub type Env<'a> = Rc<Frame<'a>>;

// =============================================================================
// DEFINITIONS
// =============================================================================

/// Functions and modules declared directly in one block.
///
/// Definitions are hoisted: every statement of the block sees them,
/// wherever they appear.
#[derive(Debug, Default)]
pub struct Definitions<'a> {
    pub functions: HashMap<&'a str, &'a FunctionDef>,
    pub modules: HashMap<&'a str, &'a ModuleDef>,
}

impl<'a> Definitions<'a> {
    /// Collect the definitions of a block, `None` when it has none.
    pub fn collect(statements: &'a [Statement]) -> Option<Self> {
        let mut defs = Self::default();
        for statement in statements {
            match &statement.kind {
                StatementKind::FunctionDef(def) => {
                    defs.functions.insert(def.name.as_str(), def);
                }
                StatementKind::ModuleDef(def) => {
                    defs.modules.insert(def.name.as_str(), def);
                }
                _ => {}
            }
        }
        (!defs.functions.is_empty() || !defs.modules.is_empty()).then_some(defs)
    }
}

// =============================================================================
// FRAMES
// =============================================================================

/// One link of the lexical chain.
#[derive(Debug)]
pub struct Frame<'a> {
    parent: Option<Env<'a>>,
    block: BlockId,
    binding: Binding<'a>,
}

#[derive(Debug)]
enum Binding<'a> {
    Root,
    Variable(&'a str, Value<'a>),
    Definitions(Rc<Definitions<'a>>),
}

impl<'a> Frame<'a> {
    /// The empty global frame.
    pub fn root() -> Env<'a> {
        Rc::new(Frame {
            parent: None,
            block: 0,
            binding: Binding::Root,
        })
    }

    /// Block this frame belongs to.
    pub fn block(&self) -> BlockId {
        self.block
    }
}

impl<'a> Drop for Frame<'a> {
    /// Free uniquely owned ancestors, and the environments of closures
    /// bound in them, from a work list instead of recursively.
    fn drop(&mut self) {
        let mut pending: Vec<Env<'a>> = Vec::new();
        self.detach(&mut pending);
        while let Some(env) = pending.pop() {
            if let Ok(mut frame) = Rc::try_unwrap(env) {
                frame.detach(&mut pending);
            }
        }
    }
}

impl<'a> Frame<'a> {
    fn detach(&mut self, pending: &mut Vec<Env<'a>>) {
        pending.extend(self.parent.take());
        if let Binding::Variable(_, value) = &mut self.binding {
            if let Value::Function(function) = std::mem::take(value) {
                if let Ok(function) = Rc::try_unwrap(function) {
                    pending.push(function.env);
                }
            }
        }
    }
}

fn chain<'e, 'a>(head: &'e Env<'a>) -> impl Iterator<Item = &'e Env<'a>> {
    std::iter::successors(Some(head), |frame| frame.parent.as_ref())
}

/// A special variable binding.
#[derive(Debug)]
pub struct SpecialFrame<'a> {
    parent: Option<Rc<SpecialFrame<'a>>>,
    name: &'a str,
    value: Value<'a>,
}

impl Drop for SpecialFrame<'_> {
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(frame) = parent {
            parent = match Rc::try_unwrap(frame) {
                Ok(mut frame) => frame.parent.take(),
                Err(_) => None,
            };
        }
    }
}

/// Caller context for `children()` inside a module body.
#[derive(Debug)]
pub struct ChildrenContext<'a> {
    /// The invocation's child statements.
    pub statements: &'a [Statement],
    /// Scope of the invocation site.
    pub caller: Scope<'a>,
}

// =============================================================================
// SCOPE
// =============================================================================

/// Everything visible at one point of evaluation.
///
/// Cloning is cheap; all parts are shared.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    env: Env<'a>,
    block: BlockId,
    specials: Option<Rc<SpecialFrame<'a>>>,
    pinned: Rc<[&'a str]>,
    children: Option<Rc<ChildrenContext<'a>>>,
}

impl<'a> Scope<'a> {
    /// Global scope with no bindings.
    pub fn global() -> Self {
        Self {
            env: Frame::root(),
            block: 0,
            specials: None,
            pinned: Rc::from(Vec::new()),
            children: None,
        }
    }

    /// Scope for a call body: lexical chain from the definition site,
    /// special variables from the caller.
    pub fn for_call(env: Env<'a>, caller: &Scope<'a>, block: BlockId) -> Self {
        Self {
            env,
            block,
            specials: caller.specials.clone(),
            pinned: Rc::from(Vec::new()),
            children: None,
        }
    }

    /// Scope for `children()`: the invocation site's lexical scope and
    /// pinning, with the special variables in effect at the call of
    /// `children()`.
    pub fn for_children(caller: &Scope<'a>, current: &Scope<'a>) -> Self {
        Self {
            specials: current.specials.clone(),
            ..caller.clone()
        }
    }

    /// Current lexical head.
    pub fn env(&self) -> &Env<'a> {
        &self.env
    }

    /// Start a new block activation; frames pushed from here on belong
    /// to it.
    pub fn enter_block(&mut self, block: BlockId) {
        self.block = block;
    }

    pub fn children(&self) -> Option<&Rc<ChildrenContext<'a>>> {
        self.children.as_ref()
    }

    pub fn set_children(&mut self, context: ChildrenContext<'a>) {
        self.children = Some(Rc::new(context));
    }

    /// Names pinned by the current call.
    pub fn set_pinned(&mut self, names: Vec<&'a str>) {
        self.pinned = Rc::from(names);
    }

    pub fn is_pinned(&self, name: &str) -> bool {
        self.pinned.iter().any(|pinned| *pinned == name)
    }

    // =========================================================================
    // BINDING
    // =========================================================================

    /// Bind a name in this scope.
    ///
    /// `$` names go to the special chain. Returns `false` when the name
    /// is pinned by the current call and the binding was ignored.
    pub fn bind(&mut self, name: &'a str, value: Value<'a>) -> bool {
        if is_special(name) {
            if self.is_pinned(name) {
                return false;
            }
            self.bind_special(name, value);
        } else {
            self.env = Rc::new(Frame {
                parent: Some(self.env.clone()),
                block: self.block,
                binding: Binding::Variable(name, value),
            });
        }
        true
    }

    /// Bind a special variable regardless of pinning.
    pub fn bind_special(&mut self, name: &'a str, value: Value<'a>) {
        self.specials = Some(Rc::new(SpecialFrame {
            parent: self.specials.take(),
            name,
            value,
        }));
    }

    /// Make a block's definitions visible.
    pub fn define(&mut self, definitions: Definitions<'a>) {
        self.env = Rc::new(Frame {
            parent: Some(self.env.clone()),
            block: self.block,
            binding: Binding::Definitions(Rc::new(definitions)),
        });
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    /// Value of a variable; special names fall back to `undef`.
    pub fn lookup(&self, name: &str) -> Option<Value<'a>> {
        if is_special(name) {
            return Some(self.lookup_special(name).unwrap_or_default());
        }
        chain(&self.env).find_map(|frame| match &frame.binding {
            Binding::Variable(bound, value) if *bound == name => Some(value.clone()),
            _ => None,
        })
    }

    /// Nearest binding of a special variable, if any.
    pub fn lookup_special(&self, name: &str) -> Option<Value<'a>> {
        let mut frame = self.specials.as_deref();
        while let Some(special) = frame {
            if special.name == name {
                return Some(special.value.clone());
            }
            frame = special.parent.as_deref();
        }
        None
    }

    /// A user function and the environment its body runs in.
    pub fn lookup_function(&self, name: &str) -> Option<(&'a FunctionDef, Env<'a>)> {
        self.lookup_definition(|defs| defs.functions.get(name).copied())
    }

    /// A user module and the environment its body runs in.
    pub fn lookup_module(&self, name: &str) -> Option<(&'a ModuleDef, Env<'a>)> {
        self.lookup_definition(|defs| defs.modules.get(name).copied())
    }

    /// Find a definition and the newest frame of its defining block
    /// visible from here, so the body sees every assignment of that
    /// block made so far.
    fn lookup_definition<T>(
        &self,
        find: impl Fn(&Definitions<'a>) -> Option<T>,
    ) -> Option<(T, Env<'a>)> {
        let (found, block) = chain(&self.env).find_map(|frame| match &frame.binding {
            Binding::Definitions(defs) => find(defs).map(|found| (found, frame.block)),
            _ => None,
        })?;
        let env = chain(&self.env).find(|frame| frame.block == block)?.clone();
        Some((found, env))
    }
}

/// True for `$`-prefixed names.
pub fn is_special(name: &str) -> bool {
    name.starts_with('$')
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadowing_does_not_leak_outward() {
        let mut outer = Scope::global();
        outer.bind("x", Value::Number(1.0));
        let mut inner = outer.clone();
        inner.enter_block(1);
        inner.bind("x", Value::Number(2.0));
        assert_eq!(inner.lookup("x"), Some(Value::Number(2.0)));
        assert_eq!(outer.lookup("x"), Some(Value::Number(1.0)));
        assert_eq!(outer.lookup("y"), None);
    }

    #[test]
    fn test_long_chain_drops_without_recursion() {
        let mut scope = Scope::global();
        for i in 0..1_000_000 {
            scope.bind("i", Value::Number(f64::from(i)));
            scope.bind_special("$i", Value::Number(f64::from(i)));
        }
        assert_eq!(scope.lookup("i"), Some(Value::Number(999_999.0)));
        drop(scope);
    }

    #[test]
    fn test_dropping_a_branch_keeps_shared_ancestors() {
        let mut trunk = Scope::global();
        trunk.bind("a", Value::Number(1.0));
        let mut branch = trunk.clone();
        for i in 0..10 {
            branch.bind("b", Value::Number(f64::from(i)));
        }
        drop(branch);
        assert_eq!(trunk.lookup("a"), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_special_default_is_undef() {
        let scope = Scope::global();
        assert_eq!(scope.lookup("$unset"), Some(Value::Undef));
        assert_eq!(scope.lookup_special("$unset"), None);
    }

    #[test]
    fn test_specials_are_dynamic() {
        let mut caller = Scope::global();
        caller.bind("$fn", Value::Number(8.0));
        let callee = Scope::for_call(Frame::root(), &caller, 2);
        assert_eq!(callee.lookup("$fn"), Some(Value::Number(8.0)));
    }

    #[test]
    fn test_pinned_special_ignores_local_assignment() {
        let mut scope = Scope::global();
        scope.bind_special("$fn", Value::Number(32.0));
        scope.set_pinned(vec!["$fn"]);
        assert!(!scope.bind("$fn", Value::Number(8.0)));
        assert_eq!(scope.lookup("$fn"), Some(Value::Number(32.0)));
    }

    #[test]
    fn test_definition_sees_later_assignments_of_its_block() {
        let ast = vec![Statement::new(
            StatementKind::FunctionDef(FunctionDef {
                name: "f".into(),
                params: vec![],
                body: openscad_ast::Expression::identifier("a"),
            }),
            Default::default(),
        )];
        let mut scope = Scope::global();
        scope.enter_block(1);
        scope.define(Definitions::collect(&ast).unwrap());
        scope.bind("a", Value::Number(5.0));

        let mut nested = scope.clone();
        nested.enter_block(2);
        nested.bind("b", Value::Number(1.0));

        let (def, env) = nested.lookup_function("f").unwrap();
        assert_eq!(def.name, "f");
        assert_eq!(env.block(), 1);
        let body_scope = Scope::for_call(env, &nested, 3);
        assert_eq!(body_scope.lookup("a"), Some(Value::Number(5.0)));
        assert_eq!(body_scope.lookup("b"), None);
    }

    #[test]
    fn test_functions_and_variables_are_disjoint() {
        let ast = vec![Statement::new(
            StatementKind::FunctionDef(FunctionDef {
                name: "f".into(),
                params: vec![],
                body: openscad_ast::Expression::number(1.0),
            }),
            Default::default(),
        )];
        let mut scope = Scope::global();
        scope.define(Definitions::collect(&ast).unwrap());
        scope.bind("f", Value::Number(2.0));
        assert!(scope.lookup_function("f").is_some());
        assert_eq!(scope.lookup("f"), Some(Value::Number(2.0)));
        assert!(scope.lookup_module("f").is_none());
    }
}
