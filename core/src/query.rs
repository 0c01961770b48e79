//! Boolean query parsing.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! or    := and ("OR" and)*
//! and   := unary (["AND"] unary)*      adjacent operands are ANDed
//! unary := "NOT" primary | primary
//! primary := TERM | "(" or ")"
//! ```
//!
//! Operators are the exact uppercase words `AND`, `OR`, `NOT`. Every other
//! whitespace-separated word is run through the index's [`Tokenizer`]; a word
//! that yields several terms (`e-mail`) becomes their conjunction and a word
//! that yields none (a stop word) is dropped.
//!
//! Chains of the same operator fold into a balanced tree, so tree depth grows
//! with parenthesis nesting, not with query length. Nesting deeper than
//! [`MAX_DEPTH`] or more than [`MAX_TERMS`] terms is a malformed query.

use crate::error::{Result, SearchError};
use crate::tokenizer::Tokenizer;
use std::fmt;

/// Deepest parenthesis nesting a query may use.
pub const MAX_DEPTH: usize = 64;

/// Most terms a query may contain after normalization.
pub const MAX_TERMS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryExpr {
    Term(String),
    And(Box<QueryExpr>, Box<QueryExpr>),
    Or(Box<QueryExpr>, Box<QueryExpr>),
    Not(Box<QueryExpr>),
}

impl QueryExpr {
    pub fn term(t: impl Into<String>) -> Self {
        QueryExpr::Term(t.into())
    }

    pub fn and(l: QueryExpr, r: QueryExpr) -> Self {
        QueryExpr::And(Box::new(l), Box::new(r))
    }

    pub fn or(l: QueryExpr, r: QueryExpr) -> Self {
        QueryExpr::Or(Box::new(l), Box::new(r))
    }

    pub fn not(x: QueryExpr) -> Self {
        QueryExpr::Not(Box::new(x))
    }
}

impl fmt::Display for QueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryExpr::Term(t) => write!(f, "{t}"),
            QueryExpr::And(l, r) => write!(f, "({l} AND {r})"),
            QueryExpr::Or(l, r) => write!(f, "({l} OR {r})"),
            QueryExpr::Not(x) => write!(f, "NOT {x}"),
        }
    }
}

/// Join `items` pairwise, level by level. `[a, b, c]` becomes `((a, b), c)`.
fn fold_balanced(items: Vec<QueryExpr>, join: fn(QueryExpr, QueryExpr) -> QueryExpr) -> Option<QueryExpr> {
    let mut level = items;
    while level.len() > 1 {
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        let mut it = level.into_iter();
        while let Some(left) = it.next() {
            next.push(match it.next() {
                Some(right) => join(left, right),
                None => left,
            });
        }
        level = next;
    }
    level.pop()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    And,
    Or,
    Not,
    Open,
    Close,
    Word(QueryExpr),
}

impl Token {
    fn is_binary(&self) -> bool {
        matches!(self, Token::And | Token::Or)
    }

    fn is_operator(&self) -> bool {
        matches!(self, Token::And | Token::Or | Token::Not)
    }

    fn starts_operand(&self) -> bool {
        matches!(self, Token::Not | Token::Open | Token::Word(_))
    }

    fn describe(&self) -> &'static str {
        match self {
            Token::And => "AND",
            Token::Or => "OR",
            Token::Not => "NOT",
            Token::Open => "(",
            Token::Close => ")",
            Token::Word(_) => "term",
        }
    }
}

fn lex(query: &str, tokenizer: &Tokenizer) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut num_terms = 0;
    for chunk in query.split_whitespace() {
        let inner = chunk.trim_start_matches('(');
        tokens.extend(std::iter::repeat(Token::Open).take(chunk.len() - inner.len()));
        let word = inner.trim_end_matches(')');
        let closes = inner.len() - word.len();

        match word {
            "" => {}
            "AND" => tokens.push(Token::And),
            "OR" => tokens.push(Token::Or),
            "NOT" => tokens.push(Token::Not),
            _ => {
                let terms: Vec<QueryExpr> = tokenizer.terms(word).map(QueryExpr::Term).collect();
                num_terms += terms.len();
                if num_terms > MAX_TERMS {
                    return Err(SearchError::malformed(format!("query has more than {MAX_TERMS} terms")));
                }
                if let Some(expr) = fold_balanced(terms, QueryExpr::and) {
                    tokens.push(Token::Word(expr));
                }
            }
        }
        tokens.extend(std::iter::repeat(Token::Close).take(closes));
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn previous(&self) -> Option<&Token> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn parse_or(&mut self) -> Result<QueryExpr> {
        let mut operands = vec![self.parse_and()?];
        while self.peek() == Some(&Token::Or) {
            self.bump();
            operands.push(self.parse_and()?);
        }
        fold_balanced(operands, QueryExpr::or).ok_or_else(|| SearchError::malformed("missing operand"))
    }

    fn parse_and(&mut self) -> Result<QueryExpr> {
        let mut operands = vec![self.parse_unary()?];
        loop {
            match self.peek() {
                Some(Token::And) => {
                    self.bump();
                }
                Some(tok) if tok.starts_operand() => {}
                _ => break,
            }
            operands.push(self.parse_unary()?);
        }
        fold_balanced(operands, QueryExpr::and).ok_or_else(|| SearchError::malformed("missing operand"))
    }

    // NOT is a prefix operator, so `a AND NOT b` and `a OR NOT b` are the only
    // operator pairs allowed back to back. `NOT NOT b` is still rejected.
    fn parse_unary(&mut self) -> Result<QueryExpr> {
        if self.peek() == Some(&Token::Not) {
            self.bump();
            return Ok(QueryExpr::not(self.parse_primary()?));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<QueryExpr> {
        let prev = self.previous().map(Token::describe);
        match self.bump() {
            Some(Token::Word(expr)) => Ok(expr),
            Some(Token::Open) => {
                if self.depth == MAX_DEPTH {
                    return Err(SearchError::malformed(format!("parentheses nested deeper than {MAX_DEPTH}")));
                }
                self.depth += 1;
                let inner = self.parse_or()?;
                self.depth -= 1;
                match self.bump() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(SearchError::malformed("unbalanced parentheses: missing ')'")),
                }
            }
            Some(tok) if tok.is_operator() => match prev {
                Some(p) if p != "(" => Err(SearchError::malformed(format!(
                    "operator {} directly follows {p}",
                    tok.describe()
                ))),
                _ if tok.is_binary() => Err(SearchError::malformed(format!(
                    "operator {} is missing its left operand",
                    tok.describe()
                ))),
                _ => Err(SearchError::malformed("NOT must be followed by a term")),
            },
            Some(_) => Err(SearchError::malformed("empty or unbalanced parentheses")),
            None => Err(SearchError::malformed(match prev {
                Some(p) if p != "term" && p != ")" => format!("operator {p} is missing its right operand"),
                _ => "unexpected end of query".to_string(),
            })),
        }
    }
}

/// Parse `query` into an expression tree, normalizing terms with `tokenizer`.
/// No index lookups happen here.
pub fn parse(query: &str, tokenizer: &Tokenizer) -> Result<QueryExpr> {
    let tokens = lex(query, tokenizer)?;
    if tokens.is_empty() {
        return Err(SearchError::malformed("query is empty after normalization"));
    }
    let mut parser = Parser { tokens, pos: 0, depth: 0 };
    let expr = parser.parse_or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(Token::Close) => Err(SearchError::malformed("unbalanced parentheses: unexpected ')'")),
        Some(tok) => Err(SearchError::malformed(format!("unexpected {} after a complete expression", tok.describe()))),
    }
}
