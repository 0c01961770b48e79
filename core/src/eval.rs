//! Set-algebraic evaluation of a [`QueryExpr`] over an [`InvertedIndex`].
//!
//! Every intermediate result is a strictly ascending slice of doc ids, so each
//! operator is a single linear merge.

use crate::index::{DocId, InvertedIndex, FIRST_DOC_ID};
use crate::query::QueryExpr;
use std::borrow::Cow;
use std::cmp::Ordering;

/// Doc ids present in both inputs.
pub fn intersect(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Doc ids present in either input, deduplicated.
pub fn union(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

/// Doc ids in `a` that are not in `b`.
pub fn difference(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(a.len());
    let mut j = 0;
    for &id in a {
        while j < b.len() && b[j] < id {
            j += 1;
        }
        if j < b.len() && b[j] == id {
            continue;
        }
        out.push(id);
    }
    out
}

/// Every doc id of an index holding `doc_count` documents, minus `excluded`.
pub fn complement(doc_count: u32, excluded: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity((doc_count as usize).saturating_sub(excluded.len()));
    let mut j = 0;
    for id in FIRST_DOC_ID..FIRST_DOC_ID + doc_count {
        while j < excluded.len() && excluded[j] < id {
            j += 1;
        }
        if j < excluded.len() && excluded[j] == id {
            continue;
        }
        out.push(id);
    }
    out
}

/// Evaluate `expr` against `index`. Unknown terms match nothing; the result is
/// ascending by doc id.
pub fn evaluate(index: &InvertedIndex, expr: &QueryExpr) -> Vec<DocId> {
    eval(index, expr).into_owned()
}

fn eval<'a>(index: &'a InvertedIndex, expr: &QueryExpr) -> Cow<'a, [DocId]> {
    match expr {
        QueryExpr::Term(term) => Cow::Borrowed(index.postings(term)),
        QueryExpr::And(..) => eval_and(index, &chain(expr)),
        QueryExpr::Or(..) => {
            let mut acc: Option<Cow<'a, [DocId]>> = None;
            for part in chain(expr) {
                let ids = eval(index, part);
                acc = Some(match acc {
                    None => ids,
                    Some(prev) => Cow::Owned(union(&prev, &ids)),
                });
            }
            acc.unwrap_or_default()
        }
        QueryExpr::Not(x) => Cow::Owned(complement(index.doc_count(), &eval(index, x))),
    }
}

/// Operands of a run of nested nodes of the same kind as `expr`, left to right.
/// Walks with an explicit stack, so a long chain costs no recursion.
fn chain(expr: &QueryExpr) -> Vec<&QueryExpr> {
    let mut out = Vec::new();
    let mut stack = vec![expr];
    while let Some(node) = stack.pop() {
        match (expr, node) {
            (QueryExpr::And(..), QueryExpr::And(l, r)) | (QueryExpr::Or(..), QueryExpr::Or(l, r)) => {
                stack.push(r.as_ref());
                stack.push(l.as_ref());
            }
            _ => out.push(node),
        }
    }
    out
}

/// Intersect the positive operands, then drop everything a `NOT` operand
/// matches. The complement is only materialized when every operand is negated.
fn eval_and<'a>(index: &'a InvertedIndex, parts: &[&QueryExpr]) -> Cow<'a, [DocId]> {
    let mut included: Option<Cow<'a, [DocId]>> = None;
    let mut negated = Vec::new();
    for part in parts {
        match part {
            QueryExpr::Not(x) => negated.push(x.as_ref()),
            other => {
                let ids = eval(index, other);
                let next = match included {
                    None => ids,
                    Some(prev) => Cow::Owned(intersect(&prev, &ids)),
                };
                if next.is_empty() {
                    return next;
                }
                included = Some(next);
            }
        }
    }

    let mut excluded: Vec<DocId> = Vec::new();
    for x in negated {
        excluded = union(&excluded, &eval(index, x));
    }
    match included {
        Some(ids) if excluded.is_empty() => ids,
        Some(ids) => Cow::Owned(difference(&ids, &excluded)),
        None => Cow::Owned(complement(index.doc_count(), &excluded)),
    }
}
