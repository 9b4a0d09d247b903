//! # maat
//!
//! A forward-chaining inference engine with dependency-directed truth
//! maintenance: asserted facts and implication rules derive new facts and
//! rules, every derived item records why it exists, and retracting a fact
//! cascades removal to everything that depended on it, unless it has
//! independent support.
//!
//! ## Architecture
//!
//! - **Term model** (`term`): flat statements, a predicate applied to
//!   constants and variables
//! - **Matching** (`unify`): statement unification into binding sets, plus
//!   substitution
//! - **Items** (`item`): facts and rules in id-addressed arenas with
//!   support bookkeeping
//! - **Knowledge base** (`kb`): assert/ask/retract, structural dedup,
//!   closure driving, worklist retraction cascade
//! - **Inference** (`infer`): the single forward-chaining step between one
//!   fact and one rule
//! - **Parsing** (`parse`): the textual `fact:`/`rule:` knowledge-file
//!   syntax
//!
//! ## Library usage
//!
//! ```
//! use maat::kb::KnowledgeBase;
//! use maat::parse::parse_statement;
//!
//! let mut kb = KnowledgeBase::default();
//! kb.assert_fact(parse_statement("(loves alice bob)").unwrap()).unwrap();
//! kb.assert_rule(
//!     vec![parse_statement("(loves ?x ?y)").unwrap()],
//!     parse_statement("(happy ?x)").unwrap(),
//! )
//! .unwrap();
//!
//! let results = kb.ask(&parse_statement("(happy ?who)").unwrap()).unwrap();
//! assert_eq!(results.len(), 1);
//! ```

pub mod error;
pub mod export;
pub mod infer;
pub mod item;
pub mod kb;
pub mod parse;
pub mod term;
pub mod unify;
