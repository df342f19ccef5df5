//! Parent-before-child ordering of a block's calls.
//!
//! Sources enumerate calls children first, while a call's parent must be
//! stored before the call is inserted. The tree is rebuilt from
//! `parent_call_id` and walked in pre-order.

use std::collections::HashMap;

use crate::error::{DomainError, DomainResult};
use crate::ports::RawCall;

/// Reorder `calls` so every call comes after its parent.
///
/// Roots (and siblings) are emitted by `address`, then by enumeration
/// position. A call whose parent is not part of `calls` is treated as a
/// root; linking it will then fail on the parent fetch.
pub fn order_calls_parent_first(calls: Vec<RawCall>) -> DomainResult<Vec<RawCall>> {
    let position: HashMap<&str, usize> = calls
        .iter()
        .enumerate()
        .map(|(i, call)| (call.id.as_str(), i))
        .collect();

    let mut roots = Vec::new();
    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, call) in calls.iter().enumerate() {
        match call
            .parent_call_id
            .as_deref()
            .and_then(|parent| position.get(parent))
        {
            Some(&parent) => children.entry(parent).or_default().push(i),
            None => roots.push(i),
        }
    }

    let by_address = |a: &usize, b: &usize| calls[*a].address.cmp(&calls[*b].address).then(a.cmp(b));
    roots.sort_by(by_address);
    for siblings in children.values_mut() {
        siblings.sort_by(by_address);
    }

    let mut order = Vec::with_capacity(calls.len());
    let mut stack: Vec<usize> = roots.into_iter().rev().collect();
    while let Some(i) = stack.pop() {
        order.push(i);
        if let Some(kids) = children.get(&i) {
            stack.extend(kids.iter().rev());
        }
    }

    if order.len() != calls.len() {
        let unreachable = calls
            .iter()
            .enumerate()
            .find(|(i, _)| !order.contains(i))
            .map(|(_, call)| call.id.clone())
            .unwrap_or_default();
        return Err(DomainError::ValidationError(format!(
            "call tree contains a cycle through {unreachable}"
        )));
    }

    let mut slots: Vec<Option<RawCall>> = calls.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(id: &str, parent: Option<&str>, address: &[u32]) -> RawCall {
        RawCall {
            id: id.to_string(),
            extrinsic_id: "x".to_string(),
            parent_call_id: parent.map(str::to_string),
            name: "Utility.batch".to_string(),
            address: address.to_vec(),
            args: serde_json::Value::Null,
            success: true,
            error: None,
        }
    }

    fn ids(calls: &[RawCall]) -> Vec<&str> {
        calls.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn reverses_child_first_enumeration() {
        let input = vec![
            call("grandchild", Some("child"), &[0, 0]),
            call("child", Some("root"), &[0]),
            call("root", None, &[]),
        ];
        let ordered = order_calls_parent_first(input).unwrap();
        assert_eq!(ids(&ordered), vec!["root", "child", "grandchild"]);
    }

    #[test]
    fn siblings_follow_address_and_subtrees_stay_together() {
        let input = vec![
            call("b1", Some("b"), &[1, 0]),
            call("b", Some("root"), &[1]),
            call("a", Some("root"), &[0]),
            call("root", None, &[]),
            call("other-root", None, &[]),
        ];
        let ordered = order_calls_parent_first(input).unwrap();
        assert_eq!(ids(&ordered), vec!["root", "a", "b", "b1", "other-root"]);
    }

    #[test]
    fn dangling_parent_is_kept_as_root() {
        let input = vec![call("orphan", Some("missing"), &[0])];
        let ordered = order_calls_parent_first(input).unwrap();
        assert_eq!(ids(&ordered), vec!["orphan"]);
    }

    #[test]
    fn cycle_is_rejected() {
        let input = vec![
            call("p", Some("q"), &[0]),
            call("q", Some("p"), &[1]),
        ];
        let err = order_calls_parent_first(input).unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn empty_input() {
        assert!(order_calls_parent_first(Vec::new()).unwrap().is_empty());
    }
}
