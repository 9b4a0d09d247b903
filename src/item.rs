//! Knowledge-base items: facts, rules, and their support bookkeeping.
//!
//! Facts and rules live in arenas inside the knowledge base and refer to each
//! other only through stable [`FactId`]/[`RuleId`] identifiers. Support edges
//! are id pairs, never references, so cascading removal can never dangle.

use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::ItemError;
use crate::term::Statement;

/// Unique, niche-optimized identifier for a fact.
///
/// Uses `NonZeroU64` so that `Option<FactId>` is the same size as `FactId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct FactId(NonZeroU64);

/// Unique, niche-optimized identifier for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct RuleId(NonZeroU64);

impl FactId {
    /// Create a `FactId` from a raw `u64`. Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(FactId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl RuleId {
    /// Create a `RuleId` from a raw `u64`. Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(RuleId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f:{}", self.0)
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r:{}", self.0)
    }
}

/// Untyped reference to either kind of item.
///
/// Worklists in the retraction cascade and the closure driver hold these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemRef {
    Fact(FactId),
    Rule(RuleId),
}

/// Id allocator producing monotonically increasing ids starting from 1.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    /// Create a new allocator that starts from id 1.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    fn next_raw(&self) -> Result<NonZeroU64, ItemError> {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        NonZeroU64::new(raw).ok_or(ItemError::AllocatorExhausted)
    }

    /// Allocate the next fact id.
    pub fn next_fact(&self) -> Result<FactId, ItemError> {
        self.next_raw().map(FactId)
    }

    /// Allocate the next rule id.
    pub fn next_rule(&self) -> Result<RuleId, ItemError> {
        self.next_raw().map(RuleId)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// One derivation record: the (fact, rule) pair whose combination produced a
/// derived item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Support {
    /// The triggering fact.
    pub fact: FactId,
    /// The rule whose antecedent the fact satisfied.
    pub rule: RuleId,
}

impl Support {
    /// `true` if this record names the given item as a supporter.
    pub fn mentions(&self, item: ItemRef) -> bool {
        match item {
            ItemRef::Fact(id) => self.fact == id,
            ItemRef::Rule(id) => self.rule == id,
        }
    }
}

/// A statement held by the knowledge base, with provenance bookkeeping.
///
/// A fact stays present exactly as long as it is `asserted` or has at least
/// one support record.
#[derive(Debug, Clone)]
pub struct Fact {
    /// Stable identifier within the owning knowledge base.
    pub id: FactId,
    /// The statement content. Structural equality on this drives dedup.
    pub statement: Statement,
    /// `true` iff a caller directly asserted this fact.
    pub asserted: bool,
    /// Derivation records that justify this fact, in arrival order.
    pub supported_by: Vec<Support>,
    /// Facts this fact helped derive (back-references, never ownership).
    pub supports_facts: Vec<FactId>,
    /// Rules this fact helped derive.
    pub supports_rules: Vec<RuleId>,
}

impl Fact {
    /// Create a fact with no support records.
    pub fn new(id: FactId, statement: Statement, asserted: bool) -> Self {
        Self {
            id,
            statement,
            asserted,
            supported_by: Vec::new(),
            supports_facts: Vec::new(),
            supports_rules: Vec::new(),
        }
    }

    /// `true` if at least one derivation record justifies this fact.
    pub fn is_supported(&self) -> bool {
        !self.supported_by.is_empty()
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.statement)
    }
}

/// An implication held by the knowledge base: antecedents → one consequent.
///
/// Carries the same provenance bookkeeping as [`Fact`]; partially applied
/// rules produced by forward chaining are supported items like any other.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Stable identifier within the owning knowledge base.
    pub id: RuleId,
    /// Antecedent statements, length ≥ 1.
    pub lhs: Vec<Statement>,
    /// The single consequent statement.
    pub rhs: Statement,
    /// `true` iff a caller directly asserted this rule.
    pub asserted: bool,
    /// Derivation records that justify this rule, in arrival order.
    pub supported_by: Vec<Support>,
    /// Facts this rule helped derive.
    pub supports_facts: Vec<FactId>,
    /// Rules this rule helped derive.
    pub supports_rules: Vec<RuleId>,
}

impl Rule {
    /// Create a rule with no support records.
    pub fn new(id: RuleId, lhs: Vec<Statement>, rhs: Statement, asserted: bool) -> Self {
        debug_assert!(!lhs.is_empty(), "rule must have at least one antecedent");
        Self {
            id,
            lhs,
            rhs,
            asserted,
            supported_by: Vec::new(),
            supports_facts: Vec::new(),
            supports_rules: Vec::new(),
        }
    }

    /// `true` if at least one derivation record justifies this rule.
    pub fn is_supported(&self) -> bool {
        !self.supported_by.is_empty()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, statement) in self.lhs.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{statement}")?;
        }
        write!(f, ") -> {}", self.rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Term;

    fn fid(raw: u64) -> FactId {
        FactId::new(raw).unwrap()
    }

    fn rid(raw: u64) -> RuleId {
        RuleId::new(raw).unwrap()
    }

    #[test]
    fn id_niche_optimization() {
        assert_eq!(
            std::mem::size_of::<Option<FactId>>(),
            std::mem::size_of::<FactId>()
        );
        assert!(FactId::new(0).is_none());
        assert_eq!(RuleId::new(42).unwrap().get(), 42);
    }

    #[test]
    fn allocator_produces_sequential_ids() {
        let alloc = IdAllocator::new();
        assert_eq!(alloc.next_fact().unwrap().get(), 1);
        assert_eq!(alloc.next_fact().unwrap().get(), 2);
        assert_eq!(alloc.next_fact().unwrap().get(), 3);
    }

    #[test]
    fn support_mentions() {
        let support = Support {
            fact: fid(1),
            rule: rid(2),
        };
        assert!(support.mentions(ItemRef::Fact(fid(1))));
        assert!(support.mentions(ItemRef::Rule(rid(2))));
        assert!(!support.mentions(ItemRef::Fact(fid(2))));
        assert!(!support.mentions(ItemRef::Rule(rid(1))));
    }

    #[test]
    fn fresh_fact_has_no_support() {
        let fact = Fact::new(
            fid(1),
            Statement::new("loves", vec![Term::constant("alice"), Term::constant("bob")]),
            true,
        );
        assert!(fact.asserted);
        assert!(!fact.is_supported());
        assert!(fact.supports_facts.is_empty());
        assert!(fact.supports_rules.is_empty());
    }

    #[test]
    fn rule_display() {
        let rule = Rule::new(
            rid(1),
            vec![
                Statement::new("parent", vec![Term::var("x"), Term::var("y")]),
                Statement::new("parent", vec![Term::var("y"), Term::var("z")]),
            ],
            Statement::new("grandparent", vec![Term::var("x"), Term::var("z")]),
            true,
        );
        assert_eq!(
            rule.to_string(),
            "((parent ?x ?y) (parent ?y ?z)) -> (grandparent ?x ?z)"
        );
    }

    #[test]
    fn id_display() {
        assert_eq!(fid(7).to_string(), "f:7");
        assert_eq!(rid(7).to_string(), "r:7");
    }
}
