//! Structured redactor.
//!
//! Walks a JSON tree depth-first and replaces the scalar value of every
//! object entry whose key is sensitive. Containers are always descended
//! into, whatever their key. Traversal keeps its own work stack, so tree
//! depth is bounded by memory rather than by the call stack.

use crate::error::Result;
use crate::policy::RedactionPolicy;
use serde::Serialize;
use serde_json::{map, Map, Value};
use std::collections::HashSet;
use std::slice;

/// A compiled [`RedactionPolicy`].
#[derive(Debug, Clone)]
pub struct Redactor {
    keys: HashSet<String>,
    mask: String,
    case_insensitive: bool,
}

impl Redactor {
    pub fn new(policy: &RedactionPolicy) -> Result<Self> {
        policy.check()?;
        let keys = policy
            .sensitive_keys
            .iter()
            .map(|k| {
                if policy.case_insensitive {
                    k.to_lowercase()
                } else {
                    k.clone()
                }
            })
            .collect();
        Ok(Self {
            keys,
            mask: policy.mask.clone(),
            case_insensitive: policy.case_insensitive,
        })
    }

    pub fn mask(&self) -> &str {
        &self.mask
    }

    pub fn is_sensitive(&self, key: &str) -> bool {
        if self.case_insensitive {
            self.keys.contains(&key.to_lowercase())
        } else {
            self.keys.contains(key)
        }
    }

    fn masked(&self) -> Value {
        Value::String(self.mask.clone())
    }

    /// Mask sensitive scalars in place.
    pub fn redact_in_place(&self, tree: &mut Value) {
        let mut stack: Vec<&mut Value> = vec![tree];
        let mut masked = 0usize;

        while let Some(node) = stack.pop() {
            match node {
                Value::Object(entries) => {
                    for (key, value) in entries {
                        if value.is_object() || value.is_array() {
                            stack.push(value);
                        } else if self.is_sensitive(key) {
                            *value = self.masked();
                            masked += 1;
                        }
                    }
                }
                Value::Array(items) => {
                    stack.extend(items.iter_mut().filter(|v| v.is_object() || v.is_array()));
                }
                _ => {}
            }
        }

        tracing::trace!(masked, "redacted tree in place");
    }

    /// Return a redacted copy of `tree`. The input is not modified.
    pub fn redact(&self, tree: &Value) -> Value {
        let mut stack = match Frame::open(tree) {
            Some(frame) => vec![frame],
            None => return tree.clone(),
        };

        loop {
            let Some(top) = stack.last_mut() else {
                return Value::Null;
            };
            match top.step(self) {
                Step::Leaf(value) => top.attach(value),
                Step::Descend(child) => {
                    if let Some(frame) = Frame::open(child) {
                        stack.push(frame);
                    }
                }
                Step::Done => {
                    let Some(finished) = stack.pop().map(Frame::finish) else {
                        return Value::Null;
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.attach(finished),
                        None => return finished,
                    }
                }
            }
        }
    }

    /// Serialize `value` and redact the result.
    ///
    /// If serialization fails the whole value is replaced by the mask, so no
    /// partially serialized data can escape.
    pub fn redact_serializable<T: Serialize + ?Sized>(&self, value: &T) -> Value {
        match serde_json::to_value(value) {
            Ok(mut tree) => {
                self.redact_in_place(&mut tree);
                tree
            }
            Err(err) => {
                tracing::warn!(error = %err, "serialization failed, value fully masked");
                self.masked()
            }
        }
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self {
            keys: HashSet::from([crate::policy::DEFAULT_SENSITIVE_KEY.to_string()]),
            mask: crate::policy::DEFAULT_MASK.to_string(),
            case_insensitive: false,
        }
    }
}

/// A container being copied.
enum Frame<'a> {
    Array {
        items: slice::Iter<'a, Value>,
        out: Vec<Value>,
    },
    Object {
        entries: map::Iter<'a>,
        out: Map<String, Value>,
        /// Key of the child currently being produced.
        key: Option<String>,
    },
}

enum Step<'a> {
    Leaf(Value),
    Descend(&'a Value),
    Done,
}

impl<'a> Frame<'a> {
    fn open(value: &'a Value) -> Option<Frame<'a>> {
        match value {
            Value::Array(items) => Some(Frame::Array {
                items: items.iter(),
                out: Vec::with_capacity(items.len()),
            }),
            Value::Object(entries) => Some(Frame::Object {
                entries: entries.iter(),
                out: Map::new(),
                key: None,
            }),
            _ => None,
        }
    }

    fn step(&mut self, redactor: &Redactor) -> Step<'a> {
        match self {
            Frame::Array { items, .. } => match items.next() {
                None => Step::Done,
                Some(v) if v.is_object() || v.is_array() => Step::Descend(v),
                Some(v) => Step::Leaf(v.clone()),
            },
            Frame::Object { entries, key, .. } => match entries.next() {
                None => Step::Done,
                Some((k, v)) => {
                    *key = Some(k.clone());
                    if v.is_object() || v.is_array() {
                        Step::Descend(v)
                    } else if redactor.is_sensitive(k) {
                        Step::Leaf(redactor.masked())
                    } else {
                        Step::Leaf(v.clone())
                    }
                }
            },
        }
    }

    fn attach(&mut self, value: Value) {
        match self {
            Frame::Array { out, .. } => out.push(value),
            Frame::Object { out, key, .. } => {
                if let Some(k) = key.take() {
                    out.insert(k, value);
                }
            }
        }
    }

    fn finish(self) -> Value {
        match self {
            Frame::Array { out, .. } => Value::Array(out),
            Frame::Object { out, .. } => Value::Object(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_masks_every_scalar_kind() {
        let r = Redactor::default();
        let tree = json!([
            {"password": "s"},
            {"password": 12345},
            {"password": true},
            {"password": null}
        ]);
        let out = r.redact(&tree);
        for item in out.as_array().unwrap() {
            assert_eq!(item["password"], json!("**********"));
        }
    }

    #[test]
    fn test_container_under_sensitive_key_is_descended() {
        let r = Redactor::default();
        let tree = json!({"password": {"hint": "pet", "password": "x"}});
        assert_eq!(
            r.redact(&tree),
            json!({"password": {"hint": "pet", "password": "**********"}})
        );
    }

    #[test]
    fn test_top_level_scalar_unchanged() {
        let r = Redactor::default();
        assert_eq!(r.redact(&json!("password")), json!("password"));
        let mut v = json!(42);
        r.redact_in_place(&mut v);
        assert_eq!(v, json!(42));
    }

    #[test]
    fn test_pure_and_in_place_agree() {
        let r = Redactor::default();
        let tree = json!({
            "a": [{"password": "1"}, [{"password": 2}], "password"],
            "b": {"c": {"password": false, "d": "keep"}}
        });
        let copy = r.redact(&tree);
        let mut in_place = tree.clone();
        r.redact_in_place(&mut in_place);
        assert_eq!(copy, in_place);
        // input untouched
        assert_eq!(tree["b"]["c"]["password"], json!(false));
    }

    #[test]
    fn test_key_order_preserved() {
        let r = Redactor::default();
        let tree = json!({"z": 1, "password": "p", "a": 2});
        let out = r.redact(&tree);
        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        let expected: Vec<&String> = tree.as_object().unwrap().keys().collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_case_insensitive_policy() {
        let policy = RedactionPolicy::with_keys(["ApiToken"]).case_insensitive(true);
        let r = Redactor::new(&policy).unwrap();
        let out = r.redact(&json!({"apitoken": "a", "APITOKEN": "b", "password": "c"}));
        assert_eq!(out["apitoken"], json!("**********"));
        assert_eq!(out["APITOKEN"], json!("**********"));
        assert_eq!(out["password"], json!("c"));
    }

    #[test]
    fn test_case_sensitive_by_default() {
        let r = Redactor::default();
        let out = r.redact(&json!({"Password": "kept"}));
        assert_eq!(out["Password"], json!("kept"));
    }

    #[test]
    fn test_custom_mask() {
        let r = Redactor::new(&RedactionPolicy::default().mask("[REDACTED]")).unwrap();
        assert_eq!(r.redact(&json!({"password": "x"}))["password"], json!("[REDACTED]"));
    }

    #[test]
    fn test_serializable_struct() {
        #[derive(Serialize)]
        struct Login<'a> {
            user: &'a str,
            password: &'a str,
        }
        let r = Redactor::default();
        let out = r.redact_serializable(&Login {
            user: "bob",
            password: "hunter2",
        });
        assert_eq!(out, json!({"user": "bob", "password": "**********"}));
    }

    #[test]
    fn test_serialization_failure_fails_closed() {
        use std::collections::HashMap;
        // non-string map keys cannot become JSON object keys
        let mut bad: HashMap<(u8, u8), &str> = HashMap::new();
        bad.insert((1, 2), "secret");
        let r = Redactor::default();
        assert_eq!(r.redact_serializable(&bad), json!("**********"));
    }
}
