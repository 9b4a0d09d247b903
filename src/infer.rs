//! The forward-chaining inference step.
//!
//! [`InferenceEngine::fc_infer`] pairs one fact with one rule: if the fact
//! satisfies the rule's first antecedent, the pairing yields either a new
//! fact (single-antecedent rule) or a partially applied rule (remaining
//! antecedents instantiated). The knowledge base drives these steps to
//! closure and records the support edges when the derived item lands.

use crate::item::{Fact, Rule, Support};
use crate::term::Statement;
use crate::unify::{instantiate, instantiate_all, match_statements};

/// The content of a new item produced by one forward-chaining step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivedItem {
    /// A fully applied rule yields a fact.
    Fact(Statement),
    /// A partially applied rule: remaining antecedents and the consequent,
    /// both instantiated under the step's bindings.
    Rule(Vec<Statement>, Statement),
}

/// One successful forward-chaining step: the derived content plus the
/// (fact, rule) pair that justifies it.
#[derive(Debug, Clone)]
pub struct Derivation {
    pub item: DerivedItem,
    pub support: Support,
}

/// Stateless forward-chaining step engine. All knowledge-base state lives
/// in the caller, which also owns registering the support edges when a
/// derivation lands.
#[derive(Debug, Default)]
pub struct InferenceEngine;

impl InferenceEngine {
    /// Create a new inference engine.
    pub fn new() -> Self {
        Self
    }

    /// One forward-chaining step between `fact` and `rule`.
    ///
    /// Matches the rule's first antecedent against the fact's statement.
    /// On failure the pairing yields nothing, a normal outcome rather than
    /// an error. On success the consequent (and, for rules with more than one
    /// antecedent, the remaining antecedents) are instantiated under the
    /// resulting bindings. Neither input is mutated.
    pub fn fc_infer(&self, fact: &Fact, rule: &Rule) -> Option<Derivation> {
        debug_assert!(!rule.lhs.is_empty(), "rules always carry antecedents");

        let bindings = match_statements(&rule.lhs[0], &fact.statement)?;
        let rhs = instantiate(&rule.rhs, &bindings);

        let item = if rule.lhs.len() == 1 {
            DerivedItem::Fact(rhs)
        } else {
            DerivedItem::Rule(instantiate_all(&rule.lhs[1..], &bindings), rhs)
        };

        tracing::trace!(fact = %fact.statement, rule = %rule, "pairing fired");

        Some(Derivation {
            item,
            support: Support {
                fact: fact.id,
                rule: rule.id,
            },
        })
    }
}
