//! Boolean queries: `AND`, `OR` and parentheses over index terms.
//!
//! Evaluation uses two stacks (operands are doc-id sets, operators are
//! pending symbols). `AND` binds tighter than `OR`. Malformed input never
//! fails: an operator that finds fewer than two operands does nothing, an
//! unmatched `)` only flushes pending operators, and a leftover `(` is
//! dropped.

use crate::index::InvertedIndex;
use crate::tokenizer::normalize;
use crate::DocId;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

lazy_static! {
    static ref QUERY_TOKEN: Regex = Regex::new(r"\(|\)|\w+").expect("valid regex");
}

pub type DocSet = BTreeSet<DocId>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryToken {
    And,
    Or,
    LParen,
    RParen,
    Term(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    And,
    Or,
    LParen,
}

impl Operator {
    fn precedence(self) -> u8 {
        match self {
            Operator::And => 2,
            Operator::Or => 1,
            Operator::LParen => 0,
        }
    }

    fn is_binary(self) -> bool { matches!(self, Operator::And | Operator::Or) }
}

/// Lowercase the query and split it into operators, parentheses and terms.
/// `and` / `or` are operators only as whole words; any other character is a separator.
pub fn lex(query: &str) -> Vec<QueryToken> {
    let lowered = query.to_lowercase();
    QUERY_TOKEN
        .find_iter(&lowered)
        .map(|m| match m.as_str() {
            "(" => QueryToken::LParen,
            ")" => QueryToken::RParen,
            "and" => QueryToken::And,
            "or" => QueryToken::Or,
            word => QueryToken::Term(word.to_string()),
        })
        .collect()
}

/// Documents matching a single query word. Only the first normalized term is
/// looked up; a word that normalizes to nothing matches no documents.
pub fn term_documents(index: &InvertedIndex, word: &str) -> DocSet {
    normalize(word)
        .first()
        .and_then(|term| index.postings(term))
        .map(|postings| postings.keys().copied().collect())
        .unwrap_or_default()
}

fn apply(operands: &mut Vec<DocSet>, op: Operator) {
    if !op.is_binary() || operands.len() < 2 {
        return;
    }
    let (Some(b), Some(a)) = (operands.pop(), operands.pop()) else {
        return;
    };
    let combined = match op {
        Operator::And => a.intersection(&b).copied().collect(),
        _ => a.union(&b).copied().collect(),
    };
    operands.push(combined);
}

/// Evaluate a lexed query against the index.
pub fn evaluate(tokens: &[QueryToken], index: &InvertedIndex) -> DocSet {
    let mut operands: Vec<DocSet> = Vec::new();
    let mut operators: Vec<Operator> = Vec::new();

    for token in tokens {
        match token {
            QueryToken::LParen => operators.push(Operator::LParen),
            QueryToken::RParen => {
                while let Some(op) = operators.pop() {
                    if op == Operator::LParen {
                        break;
                    }
                    apply(&mut operands, op);
                }
            }
            QueryToken::And | QueryToken::Or => {
                let incoming = if *token == QueryToken::And { Operator::And } else { Operator::Or };
                while let Some(&top) = operators.last() {
                    if !top.is_binary() || top.precedence() < incoming.precedence() {
                        break;
                    }
                    operators.pop();
                    apply(&mut operands, top);
                }
                operators.push(incoming);
            }
            QueryToken::Term(word) => operands.push(term_documents(index, word)),
        }
    }

    while let Some(op) = operators.pop() {
        apply(&mut operands, op);
    }

    // Operands left over from juxtaposed terms ("cat dog") are ignored; the
    // oldest one is the result.
    if operands.is_empty() {
        DocSet::new()
    } else {
        operands.swap_remove(0)
    }
}

/// Lex and evaluate in one step.
pub fn matching_documents(query: &str, index: &InvertedIndex) -> DocSet {
    evaluate(&lex(query), index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> InvertedIndex {
        InvertedIndex::build(&[
            "cat mat",        // 0
            "cat dog",        // 1
            "dog fish",       // 2
            "fish bird cat",  // 3
        ])
    }

    fn set(ids: &[DocId]) -> DocSet { ids.iter().copied().collect() }

    #[test]
    fn lexes_operators_case_insensitively() {
        let toks = lex("Cat AND (mat or Dog)");
        assert_eq!(
            toks,
            vec![
                QueryToken::Term("cat".into()),
                QueryToken::And,
                QueryToken::LParen,
                QueryToken::Term("mat".into()),
                QueryToken::Or,
                QueryToken::Term("dog".into()),
                QueryToken::RParen,
            ]
        );
    }

    #[test]
    fn operator_words_need_word_boundaries() {
        assert_eq!(
            lex("orange android"),
            vec![QueryToken::Term("orange".into()), QueryToken::Term("android".into())]
        );
    }

    #[test]
    fn and_intersects_or_unites() {
        let idx = index();
        assert_eq!(matching_documents("cat AND dog", &idx), set(&[1]));
        assert_eq!(matching_documents("cat OR fish", &idx), set(&[0, 1, 2, 3]));
        assert_eq!(matching_documents("mat OR mat", &idx), matching_documents("mat", &idx));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let idx = index();
        // mat OR (dog AND fish)
        assert_eq!(matching_documents("mat OR dog AND fish", &idx), set(&[0, 2]));
        // (mat OR dog) AND fish
        assert_eq!(matching_documents("(mat OR dog) AND fish", &idx), set(&[2]));
    }

    #[test]
    fn equal_precedence_is_left_associative() {
        let idx = index();
        assert_eq!(matching_documents("mat OR bird OR dog", &idx), set(&[0, 1, 2, 3]));
        assert_eq!(matching_documents("cat AND fish AND bird", &idx), set(&[3]));
    }

    #[test]
    fn unknown_and_stopword_terms_match_nothing() {
        let idx = index();
        assert!(matching_documents("zebra", &idx).is_empty());
        assert!(matching_documents("the", &idx).is_empty());
        assert!(matching_documents("cat AND the", &idx).is_empty());
    }

    #[test]
    fn malformed_queries_degrade_gracefully() {
        let idx = index();
        assert!(matching_documents("", &idx).is_empty());
        assert!(matching_documents("AND", &idx).is_empty());
        assert!(matching_documents("()", &idx).is_empty());
        assert_eq!(matching_documents("cat AND", &idx), set(&[0, 1, 3]));
        assert_eq!(matching_documents("OR mat", &idx), set(&[0]));
        assert_eq!(matching_documents("(cat AND dog", &idx), set(&[1]));
        assert_eq!(matching_documents("cat AND dog)", &idx), set(&[1]));
        assert_eq!(matching_documents("mat dog", &idx), set(&[0]));
        // A leftover "(" is discarded without consuming operands.
        assert_eq!(matching_documents("(cat dog", &idx), set(&[0, 1, 3]));
        assert_eq!(matching_documents("mat (dog", &idx), set(&[0]));
        assert_eq!(matching_documents("((cat OR mat", &idx), set(&[0, 1, 3]));
    }
}
