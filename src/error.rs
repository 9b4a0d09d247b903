//! Rich diagnostic error types for the maat engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so users know exactly what went wrong
//! and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the maat engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum MaatError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Kb(#[from] KbError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Infer(#[from] InferError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Item(#[from] ItemError),
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("line {line}: unbalanced parentheses")]
    #[diagnostic(
        code(maat::parse::unbalanced),
        help("Every statement must be a single `(predicate arg ...)` group with matching parentheses.")
    )]
    UnbalancedParens { line: usize },

    #[error("line {line}: empty statement")]
    #[diagnostic(
        code(maat::parse::empty_statement),
        help("A statement needs at least a predicate name, e.g. `(loves alice bob)`.")
    )]
    EmptyStatement { line: usize },

    #[error("line {line}: nested statement")]
    #[diagnostic(
        code(maat::parse::nested_terms),
        help(
            "Terms are flat: each argument is a constant or a `?`-variable. \
             Nested `(...)` structure inside a statement is not supported."
        )
    )]
    NestedTerms { line: usize },

    #[error("line {line}: predicate position holds `{token}`")]
    #[diagnostic(
        code(maat::parse::bad_predicate),
        help("The first token of a statement is its predicate name and cannot be a variable.")
    )]
    BadPredicate { line: usize, token: String },

    #[error("line {line}: `?` with no variable name")]
    #[diagnostic(
        code(maat::parse::empty_variable),
        help("Variables are written `?name`, e.g. `?x`.")
    )]
    EmptyVariable { line: usize },

    #[error("line {line}: fact contains variable `?{var}`")]
    #[diagnostic(
        code(maat::parse::variable_in_fact),
        help(
            "`fact:` lines must be ground. Variables are only meaningful in \
             `rule:` lines and in queries."
        )
    )]
    VariableInFact { line: usize, var: String },

    #[error("line {line}: rule is missing `->`")]
    #[diagnostic(
        code(maat::parse::missing_arrow),
        help("Rules are written `rule: ((ante ?x) ...) -> (conseq ?x)`.")
    )]
    MissingArrow { line: usize },

    #[error("line {line}: rule has no antecedents")]
    #[diagnostic(
        code(maat::parse::empty_antecedents),
        help("A rule needs at least one antecedent statement on the left of `->`.")
    )]
    EmptyAntecedents { line: usize },

    #[error("line {line}: rule must have exactly one consequent")]
    #[diagnostic(
        code(maat::parse::bad_consequent),
        help("The right of `->` must be a single `(predicate arg ...)` statement.")
    )]
    BadConsequent { line: usize },

    #[error("line {line}: expected a single statement")]
    #[diagnostic(
        code(maat::parse::extra_statement),
        help("`fact:` lines and queries take exactly one `(predicate arg ...)` group.")
    )]
    ExtraStatement { line: usize },

    #[error("line {line}: unrecognized form: {content}")]
    #[diagnostic(
        code(maat::parse::unknown_form),
        help(
            "Knowledge files contain `fact:` and `rule:` lines. \
             Blank lines and `#` comments are ignored."
        )
    )]
    UnknownForm { line: usize, content: String },
}

// ---------------------------------------------------------------------------
// Knowledge-base errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum KbError {
    #[error("invalid query: {reason}")]
    #[diagnostic(
        code(maat::kb::invalid_query),
        help(
            "A query is a single statement, possibly containing `?`-variables. \
             Note that a query matching nothing is not an error: it returns \
             zero binding sets."
        )
    )]
    InvalidQuery { reason: String },

    #[error("rule has no antecedents")]
    #[diagnostic(
        code(maat::kb::empty_rule),
        help("A rule needs at least one antecedent statement on its left-hand side.")
    )]
    EmptyRule,
}

// ---------------------------------------------------------------------------
// Inference errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum InferError {
    #[error("derivation chain exceeded maximum depth of {max_depth}")]
    #[diagnostic(
        code(maat::infer::chain_depth),
        help(
            "Forward chaining followed a derivation chain past the configured \
             depth limit. Raise `max_chain_depth` in EngineConfig if the chain \
             is legitimate, or check the rules for a derivation cycle."
        )
    )]
    ChainDepthExceeded { max_depth: usize },

    #[error("closure produced more than {max_derived} derived items")]
    #[diagnostic(
        code(maat::infer::derivation_cap),
        help(
            "A single assertion derived more items than the configured cap. \
             Raise `max_derived` in EngineConfig for large knowledge bases, \
             or check the rules for a runaway derivation."
        )
    )]
    DerivationCapExceeded { max_derived: usize },
}

// ---------------------------------------------------------------------------
// Item errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ItemError {
    #[error("item id allocator exhausted: cannot allocate more than u64::MAX ids")]
    #[diagnostic(
        code(maat::item::exhausted),
        help(
            "The id space for facts or rules is exhausted. This is extremely \
             unlikely in practice (requires 2^64 allocations). If you see this \
             error, check for an id allocation loop."
        )
    )]
    AllocatorExhausted,
}

/// Convenience alias for functions returning maat results.
pub type MaatResult<T> = std::result::Result<T, MaatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_converts_to_maat_error() {
        let err = ParseError::MissingArrow { line: 3 };
        let maat: MaatError = err.into();
        assert!(matches!(
            maat,
            MaatError::Parse(ParseError::MissingArrow { line: 3 })
        ));
    }

    #[test]
    fn kb_error_converts_to_maat_error() {
        let err = KbError::InvalidQuery {
            reason: "empty predicate".into(),
        };
        let maat: MaatError = err.into();
        assert!(matches!(maat, MaatError::Kb(KbError::InvalidQuery { .. })));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = InferError::ChainDepthExceeded { max_depth: 64 };
        let msg = format!("{err}");
        assert!(msg.contains("64"));

        let err = ParseError::VariableInFact {
            line: 7,
            var: "x".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("7"));
        assert!(msg.contains("?x"));
    }
}
