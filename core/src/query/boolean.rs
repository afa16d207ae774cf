//! Boolean expressions over terms: `not`, `and`, `or` and parentheses.
//!
//! Parsing turns the infix text into postfix tokens with two stacks; evaluation
//! is a single stack pass of set operations over the index.

use std::fmt;

use crate::error::{Result, SearchError};
use crate::index::{DocSet, InvertedIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Not,
    And,
    Or,
}

impl Operator {
    fn from_word(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "not" => Some(Operator::Not),
            "and" => Some(Operator::And),
            "or" => Some(Operator::Or),
            _ => None,
        }
    }

    /// Larger values bind looser and are popped first.
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Not => 0,
            Operator::And => 1,
            Operator::Or => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Not => "not",
            Operator::And => "and",
            Operator::Or => "or",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryToken {
    Term(String),
    Op(Operator),
}

impl QueryToken {
    pub fn term(s: &str) -> Self { QueryToken::Term(s.to_string()) }
}

impl fmt::Display for QueryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryToken::Term(t) => f.write_str(t),
            QueryToken::Op(op) => f.write_str(op.as_str()),
        }
    }
}

enum StackEntry {
    Op(Operator),
    Open,
}

/// Infix → postfix conversion.
///
/// Lenient by default: an unmatched `)` is ignored and an unclosed `(` is drained
/// into the output as the literal term `(`. `strict` turns both into `QuerySyntax` errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanQueryParser {
    pub strict: bool,
}

impl BooleanQueryParser {
    pub fn new(strict: bool) -> Self { Self { strict } }

    pub fn parse(&self, query: &str) -> Result<Vec<QueryToken>> {
        let mut ops: Vec<StackEntry> = Vec::new();
        let mut out: Vec<QueryToken> = Vec::new();
        let mut buf = String::new();

        for c in query.trim().chars() {
            if c != '(' && c != ')' && !c.is_whitespace() {
                buf.push(c);
                continue;
            }
            if !buf.is_empty() {
                push_word(&buf, &mut ops, &mut out);
                buf.clear();
            }
            if c == '(' {
                ops.push(StackEntry::Open);
            } else if c == ')' {
                self.close_group(&mut ops, &mut out)?;
            }
        }
        if !buf.is_empty() {
            push_word(&buf, &mut ops, &mut out);
        }

        while let Some(entry) = ops.pop() {
            match entry {
                StackEntry::Op(op) => out.push(QueryToken::Op(op)),
                StackEntry::Open if self.strict => {
                    return Err(SearchError::QuerySyntax("unclosed '('".into()));
                }
                // An unclosed `(` stays in the output as a literal operand.
                StackEntry::Open => out.push(QueryToken::term("(")),
            }
        }
        Ok(out)
    }

    fn close_group(&self, ops: &mut Vec<StackEntry>, out: &mut Vec<QueryToken>) -> Result<()> {
        while let Some(entry) = ops.pop() {
            match entry {
                StackEntry::Open => return Ok(()),
                StackEntry::Op(op) => out.push(QueryToken::Op(op)),
            }
        }
        if self.strict {
            return Err(SearchError::QuerySyntax("unmatched ')'".into()));
        }
        Ok(())
    }
}

fn push_word(word: &str, ops: &mut Vec<StackEntry>, out: &mut Vec<QueryToken>) {
    let Some(op) = Operator::from_word(word) else {
        out.push(QueryToken::term(word));
        return;
    };
    while let Some(StackEntry::Op(top)) = ops.last() {
        if top.precedence() >= op.precedence() {
            break;
        }
        out.push(QueryToken::Op(*top));
        ops.pop();
    }
    ops.push(StackEntry::Op(op));
}

/// Postfix evaluation against `index`, with `universe` as the complement base for `not`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanQueryEvaluator {
    pub strict: bool,
}

impl BooleanQueryEvaluator {
    pub fn new(strict: bool) -> Self { Self { strict } }

    pub fn evaluate(&self, tokens: &[QueryToken], index: &InvertedIndex, universe: &DocSet) -> Result<DocSet> {
        let mut stack: Vec<DocSet> = Vec::new();
        for token in tokens {
            let set = match token {
                QueryToken::Term(term) => index.posting_set(term),
                QueryToken::Op(Operator::Not) => {
                    let a = pop_operand(&mut stack, Operator::Not)?;
                    universe.difference(&a).cloned().collect()
                }
                QueryToken::Op(Operator::And) => {
                    let a = pop_operand(&mut stack, Operator::And)?;
                    let b = pop_operand(&mut stack, Operator::And)?;
                    a.intersection(&b).cloned().collect()
                }
                QueryToken::Op(Operator::Or) => {
                    let a = pop_operand(&mut stack, Operator::Or)?;
                    let mut b = pop_operand(&mut stack, Operator::Or)?;
                    b.extend(a);
                    b
                }
            };
            stack.push(set);
        }

        if self.strict && stack.len() > 1 {
            return Err(SearchError::QuerySyntax(format!("{} operands left without an operator", stack.len())));
        }
        // Lenient mode keeps the bottom of the stack when operands are left over.
        stack
            .into_iter()
            .next()
            .ok_or_else(|| SearchError::QuerySyntax("empty expression".into()))
    }
}

fn pop_operand(stack: &mut Vec<DocSet>, op: Operator) -> Result<DocSet> {
    stack
        .pop()
        .ok_or_else(|| SearchError::QuerySyntax(format!("'{}' is missing an operand", op.as_str())))
}
