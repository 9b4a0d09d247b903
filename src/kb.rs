//! The knowledge base: arenas, deduplication, forward-chaining closure, and
//! dependency-directed retraction.
//!
//! Every mutation keeps one invariant: an item is present iff it is asserted
//! or carries at least one support record. Assertion pairs the new item
//! against every existing item of the complementary kind and drives the
//! resulting derivations to a fixed point; retraction walks the support
//! graph outward with a worklist, removing exactly the items that lose
//! their last justification.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{InferError, KbError, MaatResult};
use crate::infer::{DerivedItem, InferenceEngine};
use crate::item::{Fact, FactId, IdAllocator, ItemRef, Rule, RuleId, Support};
use crate::term::Statement;
use crate::unify::{Bindings, match_statements};

/// Configuration for closure behavior, threaded through construction.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum derivation-chain depth per top-level assertion (default: 64).
    pub max_chain_depth: usize,
    /// Hard cap on items derived per top-level assertion (default: 10,000).
    pub max_derived: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: 64,
            max_derived: 10_000,
        }
    }
}

/// Dedup key for rules: the antecedent list plus the consequent.
type RuleKey = (Vec<Statement>, Statement);

/// The mutable store of facts and rules.
///
/// Both kinds live in id-keyed arenas with a separate insertion-order list
/// and a structural-equality index, so "is this statement already known" is
/// an average-case O(1) hash lookup rather than a scan.
pub struct KnowledgeBase {
    config: EngineConfig,
    engine: InferenceEngine,
    facts: HashMap<FactId, Fact>,
    fact_order: Vec<FactId>,
    fact_index: HashMap<Statement, FactId>,
    rules: HashMap<RuleId, Rule>,
    rule_order: Vec<RuleId>,
    rule_index: HashMap<RuleKey, RuleId>,
    fact_ids: IdAllocator,
    rule_ids: IdAllocator,
}

impl KnowledgeBase {
    /// Create an empty knowledge base with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            engine: InferenceEngine::new(),
            facts: HashMap::new(),
            fact_order: Vec::new(),
            fact_index: HashMap::new(),
            rules: HashMap::new(),
            rule_order: Vec::new(),
            rule_index: HashMap::new(),
            fact_ids: IdAllocator::new(),
            rule_ids: IdAllocator::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Assertion
    // -----------------------------------------------------------------------

    /// Assert a fact and forward-chain to closure.
    ///
    /// Re-asserting a statement that is already present (even as a purely
    /// derived fact) marks the stored fact as asserted and is never an error.
    /// Returns the id of the stored fact.
    pub fn assert_fact(&mut self, statement: Statement) -> MaatResult<FactId> {
        tracing::debug!(%statement, "asserting fact");
        let mut queue = VecDeque::new();
        let id = self.land_fact(statement, true, None, &mut queue, 0)?;
        self.chain(queue)?;
        debug_assert!(self.invariants_hold());
        Ok(id)
    }

    /// Assert a rule and forward-chain to closure.
    ///
    /// The antecedent list must be non-empty. Returns the id of the stored
    /// rule.
    pub fn assert_rule(&mut self, lhs: Vec<Statement>, rhs: Statement) -> MaatResult<RuleId> {
        if lhs.is_empty() {
            return Err(KbError::EmptyRule.into());
        }
        tracing::debug!(rhs = %rhs, antecedents = lhs.len(), "asserting rule");
        let mut queue = VecDeque::new();
        let id = self.land_rule(lhs, rhs, true, None, &mut queue, 0)?;
        self.chain(queue)?;
        debug_assert!(self.invariants_hold());
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Query
    // -----------------------------------------------------------------------

    /// Match a query statement against every stored fact.
    ///
    /// Returns one binding set per matching fact, in insertion order; a
    /// ground match contributes an empty binding set. Zero matches is an
    /// empty list, not an error. A malformed query (empty predicate name)
    /// is rejected with [`KbError::InvalidQuery`] and leaves the knowledge
    /// base untouched.
    pub fn ask(&self, query: &Statement) -> MaatResult<Vec<Bindings>> {
        if query.predicate.is_empty() {
            return Err(KbError::InvalidQuery {
                reason: "empty predicate name".into(),
            }
            .into());
        }

        Ok(self
            .fact_order
            .iter()
            .filter_map(|id| self.facts.get(id))
            .filter_map(|fact| match_statements(query, &fact.statement))
            .collect())
    }

    // -----------------------------------------------------------------------
    // Retraction
    // -----------------------------------------------------------------------

    /// Retract a fact by statement, cascading through the support graph.
    ///
    /// Retraction targets the asserted status: a fact that is also derived
    /// survives as purely derived (and keeps supporting its dependents), a
    /// purely derived fact is left alone entirely, and retracting an absent
    /// statement is a no-op.
    pub fn retract_fact(&mut self, statement: &Statement) {
        let Some(&id) = self.fact_index.get(statement) else {
            tracing::debug!(%statement, "retract: fact not present, no-op");
            return;
        };
        tracing::debug!(%statement, "retracting fact");
        self.retract_item(ItemRef::Fact(id));
    }

    /// Retract a rule, with the same semantics as [`Self::retract_fact`].
    pub fn retract_rule(&mut self, lhs: &[Statement], rhs: &Statement) {
        let key: RuleKey = (lhs.to_vec(), rhs.clone());
        let Some(&id) = self.rule_index.get(&key) else {
            tracing::debug!(rhs = %rhs, "retract: rule not present, no-op");
            return;
        };
        tracing::debug!(rhs = %rhs, "retracting rule");
        self.retract_item(ItemRef::Rule(id));
    }

    fn retract_item(&mut self, root: ItemRef) {
        let (asserted, supported) = match root {
            ItemRef::Fact(id) => {
                let fact = &self.facts[&id];
                (fact.asserted, fact.is_supported())
            }
            ItemRef::Rule(id) => {
                let rule = &self.rules[&id];
                (rule.asserted, rule.is_supported())
            }
        };

        if !asserted {
            // Purely derived items are owned by their justifications; a
            // direct retraction leaves them alone.
            tracing::debug!(?root, "retract: item is purely derived, no-op");
            return;
        }

        if supported {
            // The item survives on its derivations, so its dependents keep
            // their support and no cascade happens.
            match root {
                ItemRef::Fact(id) => self.facts.get_mut(&id).expect("fact arena out of sync").asserted = false,
                ItemRef::Rule(id) => self.rules.get_mut(&id).expect("rule arena out of sync").asserted = false,
            }
            debug_assert!(self.invariants_hold());
            return;
        }

        self.cascade_remove(root);
        debug_assert!(self.invariants_hold());
    }

    /// Remove an unjustified item and everything downstream that loses its
    /// last justification.
    ///
    /// An explicit worklist with a visited set processes each candidate at
    /// most once, so even a (forbidden) cyclic support graph cannot loop.
    fn cascade_remove(&mut self, root: ItemRef) {
        let mut queue: VecDeque<ItemRef> = VecDeque::new();
        let mut visited: HashSet<ItemRef> = HashSet::new();
        queue.push_back(root);
        visited.insert(root);

        while let Some(item) = queue.pop_front() {
            let (dependent_facts, dependent_rules) = self.unlink_and_remove(item);

            let dependents = dependent_facts
                .into_iter()
                .map(ItemRef::Fact)
                .chain(dependent_rules.into_iter().map(ItemRef::Rule));

            for dependent in dependents {
                let lost_all_support = self.strip_supports_mentioning(dependent, item);
                if lost_all_support && visited.insert(dependent) {
                    queue.push_back(dependent);
                }
            }
        }
    }

    /// Remove one item from its arena, order list, and dedup index, and
    /// detach it from the supporters named in its own support records.
    /// Returns the item's dependents.
    fn unlink_and_remove(&mut self, item: ItemRef) -> (Vec<FactId>, Vec<RuleId>) {
        match item {
            ItemRef::Fact(id) => {
                let Some(fact) = self.facts.remove(&id) else {
                    return (Vec::new(), Vec::new());
                };
                self.fact_order.retain(|x| *x != id);
                self.fact_index.remove(&fact.statement);
                for record in &fact.supported_by {
                    self.unlink_backrefs(item, *record);
                }
                tracing::debug!(statement = %fact.statement, "removed fact");
                (fact.supports_facts, fact.supports_rules)
            }
            ItemRef::Rule(id) => {
                let Some(rule) = self.rules.remove(&id) else {
                    return (Vec::new(), Vec::new());
                };
                self.rule_order.retain(|x| *x != id);
                self.rule_index.remove(&(rule.lhs.clone(), rule.rhs.clone()));
                for record in &rule.supported_by {
                    self.unlink_backrefs(item, *record);
                }
                tracing::debug!(rule = %rule, "removed rule");
                (rule.supports_facts, rule.supports_rules)
            }
        }
    }

    /// Remove `dependent` from the supports lists of both halves of `record`.
    fn unlink_backrefs(&mut self, dependent: ItemRef, record: Support) {
        if let Some(fact) = self.facts.get_mut(&record.fact) {
            match dependent {
                ItemRef::Fact(id) => fact.supports_facts.retain(|x| *x != id),
                ItemRef::Rule(id) => fact.supports_rules.retain(|x| *x != id),
            }
        }
        if let Some(rule) = self.rules.get_mut(&record.rule) {
            match dependent {
                ItemRef::Fact(id) => rule.supports_facts.retain(|x| *x != id),
                ItemRef::Rule(id) => rule.supports_rules.retain(|x| *x != id),
            }
        }
    }

    /// Strip every support record of `dependent` that mentions `gone`, and
    /// clean up the back-references held by the surviving half of each
    /// stripped pair. Returns `true` if the dependent is left with neither
    /// the asserted flag nor any support, the condition for cascading.
    fn strip_supports_mentioning(&mut self, dependent: ItemRef, gone: ItemRef) -> bool {
        let (removed, left_unjustified) = match dependent {
            ItemRef::Fact(id) => {
                let Some(fact) = self.facts.get_mut(&id) else {
                    return false;
                };
                let removed: Vec<Support> = fact
                    .supported_by
                    .iter()
                    .copied()
                    .filter(|s| s.mentions(gone))
                    .collect();
                fact.supported_by.retain(|s| !s.mentions(gone));
                (removed, !fact.asserted && fact.supported_by.is_empty())
            }
            ItemRef::Rule(id) => {
                let Some(rule) = self.rules.get_mut(&id) else {
                    return false;
                };
                let removed: Vec<Support> = rule
                    .supported_by
                    .iter()
                    .copied()
                    .filter(|s| s.mentions(gone))
                    .collect();
                rule.supported_by.retain(|s| !s.mentions(gone));
                (removed, !rule.asserted && rule.supported_by.is_empty())
            }
        };

        // The vanished supporter is dropped wholesale; only the surviving
        // half of each stripped pair still holds a back-reference.
        for record in removed {
            match gone {
                ItemRef::Fact(_) => {
                    if let Some(rule) = self.rules.get_mut(&record.rule) {
                        match dependent {
                            ItemRef::Fact(id) => rule.supports_facts.retain(|x| *x != id),
                            ItemRef::Rule(id) => rule.supports_rules.retain(|x| *x != id),
                        }
                    }
                }
                ItemRef::Rule(_) => {
                    if let Some(fact) = self.facts.get_mut(&record.fact) {
                        match dependent {
                            ItemRef::Fact(id) => fact.supports_facts.retain(|x| *x != id),
                            ItemRef::Rule(id) => fact.supports_rules.retain(|x| *x != id),
                        }
                    }
                }
            }
        }

        left_unjustified
    }

    // -----------------------------------------------------------------------
    // Landing and closure
    // -----------------------------------------------------------------------

    /// Insert a fact or merge it into a structurally equal stored one.
    ///
    /// Only a genuinely new fact is enqueued for pairing; a merge adds the
    /// incoming support record (or sets the asserted flag) without
    /// re-triggering inference.
    fn land_fact(
        &mut self,
        statement: Statement,
        asserted: bool,
        support: Option<Support>,
        queue: &mut VecDeque<(ItemRef, usize)>,
        depth: usize,
    ) -> MaatResult<FactId> {
        if let Some(&id) = self.fact_index.get(&statement) {
            self.merge_into_fact(id, asserted, support);
            return Ok(id);
        }

        let id = self.fact_ids.next_fact()?;
        let mut fact = Fact::new(id, statement.clone(), asserted);
        if let Some(record) = support {
            fact.supported_by.push(record);
        }
        self.fact_index.insert(statement, id);
        self.fact_order.push(id);
        self.facts.insert(id, fact);
        if let Some(record) = support {
            self.link_support(ItemRef::Fact(id), record);
        }
        queue.push_back((ItemRef::Fact(id), depth));
        Ok(id)
    }

    /// Insert a rule or merge it into a structurally equal stored one.
    fn land_rule(
        &mut self,
        lhs: Vec<Statement>,
        rhs: Statement,
        asserted: bool,
        support: Option<Support>,
        queue: &mut VecDeque<(ItemRef, usize)>,
        depth: usize,
    ) -> MaatResult<RuleId> {
        let key: RuleKey = (lhs, rhs);
        if let Some(&id) = self.rule_index.get(&key) {
            self.merge_into_rule(id, asserted, support);
            return Ok(id);
        }
        let (lhs, rhs) = key;

        let id = self.rule_ids.next_rule()?;
        let mut rule = Rule::new(id, lhs, rhs, asserted);
        if let Some(record) = support {
            rule.supported_by.push(record);
        }
        self.rule_index
            .insert((rule.lhs.clone(), rule.rhs.clone()), id);
        self.rule_order.push(id);
        self.rules.insert(id, rule);
        if let Some(record) = support {
            self.link_support(ItemRef::Rule(id), record);
        }
        queue.push_back((ItemRef::Rule(id), depth));
        Ok(id)
    }

    /// Merge an incoming occurrence into the stored fact: a derivation adds
    /// its support record (union semantics), a direct assertion sets the
    /// asserted flag.
    fn merge_into_fact(&mut self, id: FactId, asserted: bool, support: Option<Support>) {
        match support {
            Some(record) => {
                let fact = self.facts.get_mut(&id).expect("fact arena out of sync");
                if !fact.supported_by.contains(&record) {
                    fact.supported_by.push(record);
                    self.link_support(ItemRef::Fact(id), record);
                }
            }
            None => {
                if asserted {
                    self.facts.get_mut(&id).expect("fact arena out of sync").asserted = true;
                }
            }
        }
    }

    fn merge_into_rule(&mut self, id: RuleId, asserted: bool, support: Option<Support>) {
        match support {
            Some(record) => {
                let rule = self.rules.get_mut(&id).expect("rule arena out of sync");
                if !rule.supported_by.contains(&record) {
                    rule.supported_by.push(record);
                    self.link_support(ItemRef::Rule(id), record);
                }
            }
            None => {
                if asserted {
                    self.rules.get_mut(&id).expect("rule arena out of sync").asserted = true;
                }
            }
        }
    }

    /// Register `dependent` in the supports lists of both supporters named
    /// by `record`.
    fn link_support(&mut self, dependent: ItemRef, record: Support) {
        if let Some(fact) = self.facts.get_mut(&record.fact) {
            match dependent {
                ItemRef::Fact(id) => {
                    if !fact.supports_facts.contains(&id) {
                        fact.supports_facts.push(id);
                    }
                }
                ItemRef::Rule(id) => {
                    if !fact.supports_rules.contains(&id) {
                        fact.supports_rules.push(id);
                    }
                }
            }
        }
        if let Some(rule) = self.rules.get_mut(&record.rule) {
            match dependent {
                ItemRef::Fact(id) => {
                    if !rule.supports_facts.contains(&id) {
                        rule.supports_facts.push(id);
                    }
                }
                ItemRef::Rule(id) => {
                    if !rule.supports_rules.contains(&id) {
                        rule.supports_rules.push(id);
                    }
                }
            }
        }
    }

    /// Drive pairings to a fixed point.
    ///
    /// Each queue entry is a newly landed item: a fact is paired against
    /// every current rule, a rule against every current fact. Derived items
    /// land (insert or merge) and, when new, are enqueued one level deeper.
    /// The configured depth and derivation caps bound the loop even if the
    /// acyclicity assumption on the support graph is violated.
    fn chain(&mut self, mut queue: VecDeque<(ItemRef, usize)>) -> MaatResult<()> {
        let mut derived_count = 0usize;

        while let Some((item, depth)) = queue.pop_front() {
            let derivations: Vec<_> = match item {
                ItemRef::Fact(fact_id) => {
                    let Some(fact) = self.facts.get(&fact_id) else {
                        continue;
                    };
                    self.rule_order
                        .iter()
                        .filter_map(|id| self.rules.get(id))
                        .filter_map(|rule| self.engine.fc_infer(fact, rule))
                        .collect()
                }
                ItemRef::Rule(rule_id) => {
                    let Some(rule) = self.rules.get(&rule_id) else {
                        continue;
                    };
                    self.fact_order
                        .iter()
                        .filter_map(|id| self.facts.get(id))
                        .filter_map(|fact| self.engine.fc_infer(fact, rule))
                        .collect()
                }
            };

            let child_depth = depth + 1;
            for derivation in derivations {
                if child_depth > self.config.max_chain_depth {
                    return Err(InferError::ChainDepthExceeded {
                        max_depth: self.config.max_chain_depth,
                    }
                    .into());
                }
                derived_count += 1;
                if derived_count > self.config.max_derived {
                    return Err(InferError::DerivationCapExceeded {
                        max_derived: self.config.max_derived,
                    }
                    .into());
                }

                match derivation.item {
                    DerivedItem::Fact(statement) => {
                        self.land_fact(statement, false, Some(derivation.support), &mut queue, child_depth)?;
                    }
                    DerivedItem::Rule(lhs, rhs) => {
                        self.land_rule(lhs, rhs, false, Some(derivation.support), &mut queue, child_depth)?;
                    }
                }
            }
        }

        if derived_count > 0 {
            tracing::debug!(derived = derived_count, "closure reached");
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// Look up a fact by id.
    pub fn fact(&self, id: FactId) -> Option<&Fact> {
        self.facts.get(&id)
    }

    /// Look up a rule by id.
    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(&id)
    }

    /// Look up a fact id by statement content.
    pub fn fact_id(&self, statement: &Statement) -> Option<FactId> {
        self.fact_index.get(statement).copied()
    }

    /// Look up a rule id by content.
    pub fn rule_id(&self, lhs: &[Statement], rhs: &Statement) -> Option<RuleId> {
        self.rule_index.get(&(lhs.to_vec(), rhs.clone())).copied()
    }

    /// `true` if a structurally equal fact is stored.
    pub fn contains_fact(&self, statement: &Statement) -> bool {
        self.fact_index.contains_key(statement)
    }

    /// `true` if a structurally equal rule is stored.
    pub fn contains_rule(&self, lhs: &[Statement], rhs: &Statement) -> bool {
        self.rule_id(lhs, rhs).is_some()
    }

    /// Iterate over live facts in insertion order.
    pub fn facts(&self) -> impl Iterator<Item = &Fact> {
        self.fact_order.iter().filter_map(|id| self.facts.get(id))
    }

    /// Iterate over live rules in insertion order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rule_order.iter().filter_map(|id| self.rules.get(id))
    }

    /// Number of live facts.
    pub fn fact_count(&self) -> usize {
        self.fact_order.len()
    }

    /// Number of live rules.
    pub fn rule_count(&self) -> usize {
        self.rule_order.len()
    }

    /// The configuration this knowledge base was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Render every live fact, then every live rule, each exactly once.
    pub fn render(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let _ = writeln!(
            out,
            "knowledge base: {} facts, {} rules",
            self.fact_count(),
            self.rule_count()
        );
        for fact in self.facts() {
            let _ = writeln!(
                out,
                "  fact {} {}",
                fact.statement,
                provenance_tag(fact.asserted, fact.supported_by.len())
            );
        }
        for rule in self.rules() {
            let _ = writeln!(
                out,
                "  rule {} {}",
                rule,
                provenance_tag(rule.asserted, rule.supported_by.len())
            );
        }
        out
    }

    /// The presence invariant: every stored item is asserted or supported.
    fn invariants_hold(&self) -> bool {
        self.facts
            .values()
            .all(|f| f.asserted || !f.supported_by.is_empty())
            && self
                .rules
                .values()
                .all(|r| r.asserted || !r.supported_by.is_empty())
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("facts", &self.fact_count())
            .field("rules", &self.rule_count())
            .finish()
    }
}

fn provenance_tag(asserted: bool, supports: usize) -> String {
    match (asserted, supports) {
        (true, 0) => "[asserted]".into(),
        (true, n) => format!("[asserted, {n} supports]"),
        (false, n) => format!("[derived, {n} supports]"),
    }
}
