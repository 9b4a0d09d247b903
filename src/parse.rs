//! Textual fact/rule syntax.
//!
//! Knowledge files are line-oriented:
//!
//! ```text
//! # comment
//! fact: (loves alice bob)
//! rule: ((parent ?x ?y) (parent ?y ?z)) -> (grandparent ?x ?z)
//! rule: ((loves ?x ?y)) -> (happy ?x)
//! ```
//!
//! Statements are flat `(predicate arg ...)` groups; `?`-prefixed tokens are
//! variables, everything else is a constant. `fact:` lines must be ground.
//! Blank lines and `#` comments are ignored.

use crate::error::ParseError;
use crate::term::{Statement, Term};

/// One parsed top-level form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedItem {
    Fact(Statement),
    Rule(Vec<Statement>, Statement),
}

/// Parse a whole knowledge file into its forms, in file order.
pub fn parse_document(text: &str) -> Result<Vec<ParsedItem>, ParseError> {
    let mut items = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("fact:") {
            items.push(ParsedItem::Fact(parse_fact_body(rest, line)?));
        } else if let Some(rest) = trimmed.strip_prefix("rule:") {
            let (lhs, rhs) = parse_rule_body(rest, line)?;
            items.push(ParsedItem::Rule(lhs, rhs));
        } else {
            return Err(ParseError::UnknownForm {
                line,
                content: trimmed.to_string(),
            });
        }
    }

    Ok(items)
}

/// Parse a single statement, e.g. a query string like `"(loves ?x bob)"`.
pub fn parse_statement(text: &str) -> Result<Statement, ParseError> {
    let line = 1;
    let groups = split_groups(text.trim(), line)?;
    match groups.len() {
        // Bare token form without parentheses is accepted for convenience.
        0 => statement_from_group(text.trim(), line),
        1 => statement_from_group(groups[0], line),
        _ => Err(ParseError::ExtraStatement { line }),
    }
}

fn parse_fact_body(rest: &str, line: usize) -> Result<Statement, ParseError> {
    let groups = split_groups(rest, line)?;
    let statement = match groups.len() {
        0 => return Err(ParseError::EmptyStatement { line }),
        1 => statement_from_group(groups[0], line)?,
        _ => return Err(ParseError::ExtraStatement { line }),
    };
    if let Some(Term::Var(var)) = statement.args.iter().find(|t| t.is_var()) {
        return Err(ParseError::VariableInFact {
            line,
            var: var.clone(),
        });
    }
    Ok(statement)
}

fn parse_rule_body(rest: &str, line: usize) -> Result<(Vec<Statement>, Statement), ParseError> {
    let Some((lhs_text, rhs_text)) = rest.split_once("->") else {
        return Err(ParseError::MissingArrow { line });
    };

    let lhs = parse_antecedents(lhs_text, line)?;
    if lhs.is_empty() {
        return Err(ParseError::EmptyAntecedents { line });
    }

    let rhs_groups = split_groups(rhs_text, line)?;
    if rhs_groups.len() != 1 {
        return Err(ParseError::BadConsequent { line });
    }
    let rhs = statement_from_group(rhs_groups[0], line)?;

    Ok((lhs, rhs))
}

/// Antecedents come either wrapped, `((p ?x) (q ?x))`, or as bare
/// statement groups, `(p ?x) (q ?x)`.
fn parse_antecedents(text: &str, line: usize) -> Result<Vec<Statement>, ParseError> {
    let groups = split_groups(text, line)?;

    if groups.len() == 1 {
        let inner = strip_parens(groups[0]);
        let inner_groups = split_groups(inner, line)?;
        if !inner_groups.is_empty() {
            return inner_groups
                .into_iter()
                .map(|g| statement_from_group(g, line))
                .collect();
        }
    }

    groups
        .into_iter()
        .map(|g| statement_from_group(g, line))
        .collect()
}

/// Extract the top-level `(...)` groups from a line fragment.
fn split_groups(text: &str, line: usize) -> Result<Vec<&str>, ParseError> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, ch) in text.char_indices() {
        match ch {
            '(' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            ')' => {
                if depth == 0 {
                    return Err(ParseError::UnbalancedParens { line });
                }
                depth -= 1;
                if depth == 0 {
                    groups.push(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(ParseError::UnbalancedParens { line });
    }
    Ok(groups)
}

fn strip_parens(group: &str) -> &str {
    let trimmed = group.trim();
    trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(trimmed)
}

/// Turn one balanced group into a statement.
fn statement_from_group(group: &str, line: usize) -> Result<Statement, ParseError> {
    let inner = strip_parens(group);
    if inner.contains('(') || inner.contains(')') {
        return Err(ParseError::NestedTerms { line });
    }

    let mut tokens = inner.split_whitespace();
    let Some(predicate) = tokens.next() else {
        return Err(ParseError::EmptyStatement { line });
    };
    if predicate.starts_with('?') {
        return Err(ParseError::BadPredicate {
            line,
            token: predicate.to_string(),
        });
    }

    let args = tokens
        .map(|token| parse_term(token, line))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Statement::new(predicate, args))
}

fn parse_term(token: &str, line: usize) -> Result<Term, ParseError> {
    match token.strip_prefix('?') {
        Some("") => Err(ParseError::EmptyVariable { line }),
        Some(name) => Ok(Term::var(name)),
        None => Ok(Term::constant(token)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ground_fact() {
        let items = parse_document("fact: (loves alice bob)").unwrap();
        assert_eq!(
            items,
            vec![ParsedItem::Fact(Statement::new(
                "loves",
                vec![Term::constant("alice"), Term::constant("bob")]
            ))]
        );
    }

    #[test]
    fn parse_single_antecedent_rule() {
        let items = parse_document("rule: ((loves ?x ?y)) -> (happy ?x)").unwrap();
        let ParsedItem::Rule(lhs, rhs) = &items[0] else {
            panic!("expected a rule");
        };
        assert_eq!(lhs.len(), 1);
        assert_eq!(lhs[0].to_string(), "(loves ?x ?y)");
        assert_eq!(rhs.to_string(), "(happy ?x)");
    }

    #[test]
    fn parse_multi_antecedent_rule() {
        let items =
            parse_document("rule: ((parent ?x ?y) (parent ?y ?z)) -> (grandparent ?x ?z)").unwrap();
        let ParsedItem::Rule(lhs, rhs) = &items[0] else {
            panic!("expected a rule");
        };
        assert_eq!(lhs.len(), 2);
        assert_eq!(rhs.predicate, "grandparent");
    }

    #[test]
    fn unwrapped_antecedent_is_accepted() {
        let items = parse_document("rule: (loves ?x ?y) -> (happy ?x)").unwrap();
        let ParsedItem::Rule(lhs, _) = &items[0] else {
            panic!("expected a rule");
        };
        assert_eq!(lhs.len(), 1);
        assert_eq!(lhs[0].to_string(), "(loves ?x ?y)");
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let text = "\n# a comment\nfact: (p a)\n\nrule: ((p ?x)) -> (q ?x)\n";
        let items = parse_document(text).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn file_order_is_preserved() {
        let text = "fact: (p a)\nrule: ((p ?x)) -> (q ?x)\nfact: (p b)";
        let items = parse_document(text).unwrap();
        assert!(matches!(items[0], ParsedItem::Fact(_)));
        assert!(matches!(items[1], ParsedItem::Rule(..)));
        assert!(matches!(items[2], ParsedItem::Fact(_)));
    }

    #[test]
    fn unknown_form_is_rejected() {
        let err = parse_document("axiom: (p a)").unwrap_err();
        assert!(matches!(err, ParseError::UnknownForm { line: 1, .. }));
    }

    #[test]
    fn variable_in_fact_is_rejected() {
        let err = parse_document("fact: (loves ?x bob)").unwrap_err();
        assert!(matches!(err, ParseError::VariableInFact { line: 1, ref var } if var == "x"));
    }

    #[test]
    fn missing_arrow_is_rejected() {
        let err = parse_document("rule: ((p ?x)) (q ?x)").unwrap_err();
        assert!(matches!(err, ParseError::MissingArrow { line: 1 }));
    }

    #[test]
    fn empty_antecedents_are_rejected() {
        let err = parse_document("rule: () -> (q a)").unwrap_err();
        assert!(matches!(err, ParseError::EmptyStatement { line: 1 }));

        let err = parse_document("rule: -> (q a)").unwrap_err();
        assert!(matches!(err, ParseError::EmptyAntecedents { line: 1 }));
    }

    #[test]
    fn unbalanced_parens_are_rejected() {
        let err = parse_document("fact: (loves alice bob").unwrap_err();
        assert!(matches!(err, ParseError::UnbalancedParens { line: 1 }));

        let err = parse_document("fact: loves alice)").unwrap_err();
        assert!(matches!(err, ParseError::UnbalancedParens { line: 1 }));
    }

    #[test]
    fn error_lines_are_one_based() {
        let text = "fact: (p a)\nfact: (q ?x)";
        let err = parse_document(text).unwrap_err();
        assert!(matches!(err, ParseError::VariableInFact { line: 2, .. }));
    }

    #[test]
    fn parse_statement_accepts_query_forms() {
        let q = parse_statement("(loves ?x bob)").unwrap();
        assert_eq!(q.to_string(), "(loves ?x bob)");
        assert!(!q.is_ground());

        // Bare form without parentheses.
        let q = parse_statement("loves alice bob").unwrap();
        assert_eq!(q.to_string(), "(loves alice bob)");
    }

    #[test]
    fn variable_predicate_is_rejected() {
        let err = parse_statement("(?p alice)").unwrap_err();
        assert!(matches!(err, ParseError::BadPredicate { .. }));
    }

    #[test]
    fn bare_question_mark_is_rejected() {
        let err = parse_statement("(loves ? bob)").unwrap_err();
        assert!(matches!(err, ParseError::EmptyVariable { .. }));
    }

    #[test]
    fn nested_statement_is_rejected() {
        let err = parse_statement("(loves (alice) bob)").unwrap_err();
        assert!(matches!(err, ParseError::NestedTerms { .. }));
    }

    #[test]
    fn zero_arity_fact_parses() {
        let items = parse_document("fact: (raining)").unwrap();
        assert_eq!(
            items,
            vec![ParsedItem::Fact(Statement::new("raining", vec![]))]
        );
    }
}
