//! Bracket-notation decoding for filter query parameters.
//!
//! Query strings carry nested filters as flat pairs:
//!
//! ```text
//! filter[or][0][title][like]=%rust%
//! filter[or][1][status]=published
//! filter[id][in][]=1&filter[id][in][]=2
//! ```
//!
//! This module rebuilds the nested structure the parser consumes. Integer
//! segments and empty `[]` segments address list positions; leaf values are
//! parsed leniently with [`Scalar::from_query_value`]. A bare `filter=` pair
//! is read as a JSON object.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::ast::Scalar;
use super::parser::DEFAULT_MAX_NESTING;
use crate::error::ParseError;

/// The query parameter name that carries filters.
pub const FILTER_PARAM: &str = "filter";

/// Upper bound on bracket segments in one parameter name.
///
/// Each nesting level takes at most two segments (`[or][0]`), plus a field
/// and an operator at the bottom.
const MAX_SEGMENTS: usize = 2 * DEFAULT_MAX_NESTING + 2;

/// Intermediate tree; lists are kept as index maps until the end.
#[derive(Debug)]
enum Slot {
    Leaf(Value),
    Branch(BTreeMap<SlotKey, Slot>),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SlotKey {
    Index(usize),
    Name(usize, String),
}

/// Returns true if the parameter name belongs to the filter family.
pub fn is_filter_param(name: &str) -> bool {
    name == FILTER_PARAM
        || name
            .strip_prefix(FILTER_PARAM)
            .is_some_and(|rest| rest.starts_with('['))
}

/// Decodes `filter[...]` pairs into a nested JSON structure.
///
/// Returns `Ok(None)` when no filter parameter is present. Pairs that do not
/// belong to the filter family are ignored.
pub fn decode_filter_pairs<'a, I>(pairs: I) -> Result<Option<Value>, ParseError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut root: BTreeMap<SlotKey, Slot> = BTreeMap::new();
    let mut json_form: Option<Value> = None;
    let mut seen = false;
    let mut name_order = 0usize;

    for (name, raw) in pairs {
        if !is_filter_param(name) {
            continue;
        }
        seen = true;

        if name == FILTER_PARAM {
            let parsed: Value = serde_json::from_str(raw)
                .map_err(|e| ParseError::new(FILTER_PARAM, format!("invalid JSON filter: {}", e)))?;
            if json_form.replace(parsed).is_some() {
                return Err(ParseError::new(FILTER_PARAM, "filter given more than once"));
            }
            continue;
        }

        let segments = split_segments(name)?;
        insert(
            &mut root,
            &segments,
            Scalar::from_query_value(raw).to_json(),
            name,
            &mut name_order,
        )?;
    }

    if !seen {
        return Ok(None);
    }

    match (json_form, root.is_empty()) {
        (Some(_), false) => Err(ParseError::new(
            FILTER_PARAM,
            "JSON and bracket filter forms cannot be mixed",
        )),
        (Some(value), true) => Ok(Some(value)),
        (None, _) => Ok(Some(finish(root))),
    }
}

/// Splits `filter[a][b][]` into `["a", "b", ""]`.
fn split_segments(name: &str) -> Result<Vec<String>, ParseError> {
    let mut rest = &name[FILTER_PARAM.len()..];
    let mut segments = Vec::new();
    while !rest.is_empty() {
        if segments.len() >= MAX_SEGMENTS {
            return Err(ParseError::new(name, "filter nested too deeply"));
        }
        let inner = rest
            .strip_prefix('[')
            .and_then(|r| r.find(']').map(|end| (&r[..end], &r[end + 1..])))
            .ok_or_else(|| ParseError::new(name, "malformed bracket notation"))?;
        segments.push(inner.0.to_string());
        rest = inner.1;
    }
    Ok(segments)
}

fn insert(
    node: &mut BTreeMap<SlotKey, Slot>,
    segments: &[String],
    leaf: Value,
    name: &str,
    name_order: &mut usize,
) -> Result<(), ParseError> {
    let (head, tail) = segments
        .split_first()
        .ok_or_else(|| ParseError::new(name, "malformed bracket notation"))?;

    let key = if head.is_empty() {
        SlotKey::Index(node.len())
    } else if let Ok(index) = head.parse::<usize>() {
        SlotKey::Index(index)
    } else if let Some(existing) = node.keys().find(|k| matches!(k, SlotKey::Name(_, n) if n == head)) {
        existing.clone()
    } else {
        *name_order += 1;
        SlotKey::Name(*name_order, head.clone())
    };

    if tail.is_empty() {
        if node.contains_key(&key) {
            return Err(ParseError::new(name, "filter key given more than once"));
        }
        node.insert(key, Slot::Leaf(leaf));
        return Ok(());
    }

    let child = node
        .entry(key)
        .or_insert_with(|| Slot::Branch(BTreeMap::new()));
    match child {
        Slot::Branch(children) => insert(children, tail, leaf, name, name_order),
        Slot::Leaf(_) => Err(ParseError::new(
            name,
            "filter key used both as a value and as a group",
        )),
    }
}

fn finish(node: BTreeMap<SlotKey, Slot>) -> Value {
    let all_indexed = !node.is_empty() && node.keys().all(|k| matches!(k, SlotKey::Index(_)));
    if all_indexed {
        Value::Array(node.into_values().map(finish_slot).collect())
    } else {
        let mut obj = Map::new();
        for (key, slot) in node {
            let name = match key {
                SlotKey::Index(i) => i.to_string(),
                SlotKey::Name(_, n) => n,
            };
            obj.insert(name, finish_slot(slot));
        }
        Value::Object(obj)
    }
}

fn finish_slot(slot: Slot) -> Value {
    match slot {
        Slot::Leaf(value) => value,
        Slot::Branch(children) => finish(children),
    }
}
