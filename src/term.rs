//! Term and statement model.
//!
//! A [`Statement`] is a predicate name applied to an ordered list of
//! [`Term`]s. Terms are flat: each argument is either an opaque constant or
//! a named variable. Nested structure is not representable, which is what
//! lets matching skip the occurs-check entirely.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single argument position in a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    /// An opaque atomic value.
    Const(String),
    /// A named variable, implicitly universally quantified in rules.
    Var(String),
}

impl Term {
    /// Build a constant term.
    pub fn constant(name: impl Into<String>) -> Self {
        Term::Const(name.into())
    }

    /// Build a variable term. The name is stored without any sigil.
    pub fn var(name: impl Into<String>) -> Self {
        Term::Var(name.into())
    }

    /// Returns `true` if this term is a variable.
    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Const(name) => write!(f, "{name}"),
            Term::Var(name) => write!(f, "?{name}"),
        }
    }
}

/// A predicate name applied to an ordered argument list.
///
/// Structural equality on statements is what drives deduplication in the
/// knowledge base, so `PartialEq`/`Eq`/`Hash` are derived over the full
/// content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    /// The predicate name.
    pub predicate: String,
    /// The ordered arguments.
    pub args: Vec<Term>,
}

impl Statement {
    /// Create a statement from a predicate name and argument list.
    pub fn new(predicate: impl Into<String>, args: Vec<Term>) -> Self {
        Self {
            predicate: predicate.into(),
            args,
        }
    }

    /// Number of arguments.
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// `true` if no argument is a variable.
    pub fn is_ground(&self) -> bool {
        !self.args.iter().any(Term::is_var)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.predicate)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_display() {
        assert_eq!(Term::constant("alice").to_string(), "alice");
        assert_eq!(Term::var("x").to_string(), "?x");
    }

    #[test]
    fn statement_display() {
        let s = Statement::new("loves", vec![Term::constant("alice"), Term::var("y")]);
        assert_eq!(s.to_string(), "(loves alice ?y)");
    }

    #[test]
    fn zero_arity_statement_display() {
        let s = Statement::new("raining", vec![]);
        assert_eq!(s.to_string(), "(raining)");
        assert_eq!(s.arity(), 0);
    }

    #[test]
    fn groundness() {
        let ground = Statement::new("loves", vec![Term::constant("alice"), Term::constant("bob")]);
        let open = Statement::new("loves", vec![Term::var("x"), Term::constant("bob")]);
        assert!(ground.is_ground());
        assert!(!open.is_ground());
    }

    #[test]
    fn structural_equality() {
        let a = Statement::new("loves", vec![Term::constant("alice"), Term::constant("bob")]);
        let b = Statement::new("loves", vec![Term::constant("alice"), Term::constant("bob")]);
        let c = Statement::new("loves", vec![Term::constant("bob"), Term::constant("alice")]);
        assert_eq!(a, b);
        assert_ne!(a, c);

        // Equal statements must hash equal; they are used as dedup keys.
        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }

    #[test]
    fn constants_and_variables_are_distinct() {
        assert_ne!(Term::constant("x"), Term::var("x"));
    }
}
