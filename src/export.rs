//! Export types for serializing knowledge-base state.
//!
//! These types provide flat, rendered representations of facts, rules, and
//! their support links suitable for JSON export. Reloading an exported
//! knowledge base is left to callers.

use serde::{Deserialize, Serialize};

use crate::kb::KnowledgeBase;

/// One support record: the (fact, rule) id pair that justifies an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportExport {
    /// Id of the triggering fact.
    pub fact: u64,
    /// Id of the rule whose antecedent the fact satisfied.
    pub rule: u64,
}

/// Exported fact with rendered statement and full support bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactExport {
    /// Numeric fact id.
    pub id: u64,
    /// Rendered statement, e.g. `(loves alice bob)`.
    pub statement: String,
    /// Whether a caller directly asserted this fact.
    pub asserted: bool,
    /// Derivation records justifying this fact.
    pub supported_by: Vec<SupportExport>,
    /// Ids of facts this fact helped derive.
    pub supports_facts: Vec<u64>,
    /// Ids of rules this fact helped derive.
    pub supports_rules: Vec<u64>,
}

/// Exported rule with rendered statements and full support bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleExport {
    /// Numeric rule id.
    pub id: u64,
    /// Rendered antecedent statements.
    pub lhs: Vec<String>,
    /// Rendered consequent statement.
    pub rhs: String,
    /// Whether a caller directly asserted this rule.
    pub asserted: bool,
    /// Derivation records justifying this rule.
    pub supported_by: Vec<SupportExport>,
    /// Ids of facts this rule helped derive.
    pub supports_facts: Vec<u64>,
    /// Ids of rules this rule helped derive.
    pub supports_rules: Vec<u64>,
}

/// A complete knowledge-base snapshot: all facts, then all rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbExport {
    pub facts: Vec<FactExport>,
    pub rules: Vec<RuleExport>,
}

impl KbExport {
    /// Snapshot a knowledge base in insertion order.
    pub fn from_kb(kb: &KnowledgeBase) -> Self {
        let facts = kb
            .facts()
            .map(|fact| FactExport {
                id: fact.id.get(),
                statement: fact.statement.to_string(),
                asserted: fact.asserted,
                supported_by: fact
                    .supported_by
                    .iter()
                    .map(|s| SupportExport {
                        fact: s.fact.get(),
                        rule: s.rule.get(),
                    })
                    .collect(),
                supports_facts: fact.supports_facts.iter().map(|id| id.get()).collect(),
                supports_rules: fact.supports_rules.iter().map(|id| id.get()).collect(),
            })
            .collect();

        let rules = kb
            .rules()
            .map(|rule| RuleExport {
                id: rule.id.get(),
                lhs: rule.lhs.iter().map(ToString::to_string).collect(),
                rhs: rule.rhs.to_string(),
                asserted: rule.asserted,
                supported_by: rule
                    .supported_by
                    .iter()
                    .map(|s| SupportExport {
                        fact: s.fact.get(),
                        rule: s.rule.get(),
                    })
                    .collect(),
                supports_facts: rule.supports_facts.iter().map(|id| id.get()).collect(),
                supports_rules: rule.supports_rules.iter().map(|id| id.get()).collect(),
            })
            .collect();

        Self { facts, rules }
    }
}
