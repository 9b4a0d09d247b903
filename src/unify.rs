//! Statement matching and substitution.
//!
//! [`match_statements`] unifies two flat statements into a [`Bindings`] set,
//! or `None` when they cannot be reconciled. Failure to unify is normal
//! control flow, never an error. [`instantiate`] applies a binding set to a
//! statement, producing a fresh statement with bound variables replaced.

use std::fmt;

use crate::term::{Statement, Term};

/// A variable → term assignment produced by matching.
///
/// Bindings are kept in first-bound order, which makes query results and
/// rendered output deterministic. The set is tiny (at most one entry per
/// argument position), so lookups are a linear scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    slots: Vec<(String, Term)>,
}

impl Bindings {
    /// Create an empty binding set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the term bound to a variable name.
    pub fn get(&self, name: &str) -> Option<&Term> {
        self.slots
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    /// Bind `name` to `term`.
    ///
    /// Returns `false` (and leaves the set unchanged) if `name` is already
    /// bound to a different term; this is the consistency check that makes
    /// a whole match fail.
    pub fn bind(&mut self, name: &str, term: Term) -> bool {
        match self.get(name) {
            Some(existing) => *existing == term,
            None => {
                self.slots.push((name.to_string(), term));
                true
            }
        }
    }

    /// `true` when no variable is bound (a fully ground match).
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Iterate over bindings in first-bound order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.slots.iter().map(|(n, t)| (n.as_str(), t))
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, term)) in self.slots.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "?{name} = {term}")?;
        }
        write!(f, "}}")
    }
}

/// Match two statements, producing the binding set that reconciles them.
///
/// Predicate name and arity must match exactly. Constants must be equal;
/// a variable on either side binds to the opposing term, checked for
/// consistency against bindings accumulated earlier in the same call.
pub fn match_statements(pattern: &Statement, target: &Statement) -> Option<Bindings> {
    if pattern.predicate != target.predicate || pattern.arity() != target.arity() {
        return None;
    }

    let mut bindings = Bindings::new();
    for (p, t) in pattern.args.iter().zip(target.args.iter()) {
        if !match_terms(p, t, &mut bindings) {
            return None;
        }
    }
    Some(bindings)
}

/// Match one argument pair under the accumulated bindings.
fn match_terms(pattern: &Term, target: &Term, bindings: &mut Bindings) -> bool {
    match (pattern, target) {
        (Term::Const(a), Term::Const(b)) => a == b,
        (Term::Var(name), other) => bindings.bind(name, other.clone()),
        (other, Term::Var(name)) => bindings.bind(name, other.clone()),
    }
}

/// Produce a new statement with every bound variable replaced by its term.
///
/// Variables absent from the bindings pass through unchanged. The input is
/// never mutated.
pub fn instantiate(statement: &Statement, bindings: &Bindings) -> Statement {
    let args = statement
        .args
        .iter()
        .map(|arg| match arg {
            Term::Var(name) => bindings.get(name).cloned().unwrap_or_else(|| arg.clone()),
            Term::Const(_) => arg.clone(),
        })
        .collect();
    Statement::new(statement.predicate.clone(), args)
}

/// Instantiate a list of statements under one binding set.
pub fn instantiate_all(statements: &[Statement], bindings: &Bindings) -> Vec<Statement> {
    statements.iter().map(|s| instantiate(s, bindings)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_statement;

    fn stmt(text: &str) -> Statement {
        parse_statement(text).unwrap()
    }

    #[test]
    fn ground_statements_match_exactly() {
        let bindings = match_statements(&stmt("(loves alice bob)"), &stmt("(loves alice bob)"));
        assert_eq!(bindings, Some(Bindings::new()));

        assert!(match_statements(&stmt("(loves alice bob)"), &stmt("(loves bob alice)")).is_none());
    }

    #[test]
    fn predicate_and_arity_must_agree() {
        assert!(match_statements(&stmt("(loves ?x ?y)"), &stmt("(hates alice bob)")).is_none());
        assert!(match_statements(&stmt("(loves ?x)"), &stmt("(loves alice bob)")).is_none());
    }

    #[test]
    fn variables_bind_to_constants() {
        let bindings = match_statements(&stmt("(loves ?x ?y)"), &stmt("(loves alice bob)")).unwrap();
        assert_eq!(bindings.get("x"), Some(&Term::constant("alice")));
        assert_eq!(bindings.get("y"), Some(&Term::constant("bob")));
        assert_eq!(bindings.len(), 2);
    }

    #[test]
    fn repeated_variable_requires_equal_terms() {
        assert!(match_statements(&stmt("(loves ?x ?x)"), &stmt("(loves alice bob)")).is_none());

        let bindings = match_statements(&stmt("(loves ?x ?x)"), &stmt("(loves alice alice)")).unwrap();
        assert_eq!(bindings.get("x"), Some(&Term::constant("alice")));
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn target_side_variables_bind_too() {
        // Matching against a partially ground fact binds the fact's variable.
        let bindings = match_statements(&stmt("(loves alice bob)"), &stmt("(loves alice ?z)")).unwrap();
        assert_eq!(bindings.get("z"), Some(&Term::constant("bob")));
    }

    #[test]
    fn variable_to_variable_binding() {
        let bindings = match_statements(&stmt("(loves ?x)"), &stmt("(loves ?y)")).unwrap();
        assert_eq!(bindings.get("x"), Some(&Term::var("y")));
    }

    #[test]
    fn instantiate_replaces_bound_variables() {
        let bindings = match_statements(&stmt("(loves ?x ?y)"), &stmt("(loves alice bob)")).unwrap();
        let result = instantiate(&stmt("(happy ?x)"), &bindings);
        assert_eq!(result, stmt("(happy alice)"));
    }

    #[test]
    fn instantiate_passes_unbound_variables_through() {
        let bindings = match_statements(&stmt("(p ?x)"), &stmt("(p a)")).unwrap();
        let result = instantiate(&stmt("(q ?x ?z)"), &bindings);
        assert_eq!(result, stmt("(q a ?z)"));
    }

    #[test]
    fn instantiate_does_not_mutate_input() {
        let template = stmt("(happy ?x)");
        let bindings = match_statements(&stmt("(loves ?x ?y)"), &stmt("(loves alice bob)")).unwrap();
        let _ = instantiate(&template, &bindings);
        assert_eq!(template, stmt("(happy ?x)"));
    }

    #[test]
    fn instantiate_all_applies_one_binding_set() {
        let bindings = match_statements(&stmt("(p ?x)"), &stmt("(p a)")).unwrap();
        let result = instantiate_all(&[stmt("(q ?x)"), stmt("(r ?x b)")], &bindings);
        assert_eq!(result, vec![stmt("(q a)"), stmt("(r a b)")]);
    }

    #[test]
    fn bindings_display_in_first_bound_order() {
        let bindings = match_statements(&stmt("(loves ?x ?y)"), &stmt("(loves alice bob)")).unwrap();
        assert_eq!(bindings.to_string(), "{?x = alice, ?y = bob}");
        assert_eq!(Bindings::new().to_string(), "{}");
    }
}
