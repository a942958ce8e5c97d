//! Integration tests for sg-redact.
//!
//! These tests verify:
//! - Sensitive values never survive at any depth
//! - Non-sensitive data comes back unchanged
//! - Very deep trees terminate without exhausting the stack
//! - Policy files load with defaults filled in

use proptest::prelude::*;
use serde::Serialize;
use serde_json::{json, Map, Value};
use sg_redact::{redact, RedactionPolicy, Redactor};
use std::path::{Path, PathBuf};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("test")
        .join("fixtures")
}

/// Tear a tree down without recursion; dropping a very deep `Value`
/// recursively would overflow the test thread's stack.
fn dismantle(tree: Value) {
    let mut stack = vec![tree];
    while let Some(mut node) = stack.pop() {
        match &mut node {
            Value::Array(items) => stack.extend(std::mem::take(items)),
            Value::Object(entries) => {
                stack.extend(std::mem::take(entries).into_iter().map(|(_, v)| v))
            }
            _ => {}
        }
    }
}

fn deep_tree(depth: usize) -> Value {
    let mut tree = json!({"password": "bottom"});
    for i in 0..depth {
        tree = if i % 2 == 0 {
            // built by hand: `json!` would serialize the subtree recursively
            let mut entries = Map::new();
            entries.insert("password".to_string(), Value::from("level"));
            entries.insert("child".to_string(), tree);
            Value::Object(entries)
        } else {
            Value::Array(vec![tree])
        };
    }
    tree
}

fn contains_string(tree: &Value, needle: &str) -> bool {
    let mut stack = vec![tree];
    while let Some(node) = stack.pop() {
        match node {
            Value::String(s) if s == needle => return true,
            Value::Array(items) => stack.extend(items),
            Value::Object(entries) => stack.extend(entries.values()),
            _ => {}
        }
    }
    false
}

#[test]
fn nested_example_document() {
    let tree = json!({
        "user": "bob",
        "password": "hunter2",
        "meta": {"password": "x", "tags": ["a", "b"]}
    });
    let expected = json!({
        "user": "bob",
        "password": "**********",
        "meta": {"password": "**********", "tags": ["a", "b"]}
    });
    assert_eq!(redact(&tree, &["password"]), expected);
}

#[test]
fn arrays_of_objects_are_each_redacted() {
    let tree = json!([
        {"id": 1, "password": "a"},
        {"id": 2, "password": "b"},
        [{"id": 3, "password": "c"}]
    ]);
    let out = Redactor::default().redact(&tree);
    assert_eq!(
        out,
        json!([
            {"id": 1, "password": "**********"},
            {"id": 2, "password": "**********"},
            [{"id": 3, "password": "**********"}]
        ])
    );
}

#[test]
fn fixture_record_leaks_nothing() {
    let raw = std::fs::read_to_string(fixtures_dir().join("user_record.json")).unwrap();
    let tree: Value = serde_json::from_str(&raw).unwrap();
    let out = Redactor::default().redact(&tree);
    for secret in ["hunter2", "nested-secret", "s1"] {
        assert!(!contains_string(&out, secret), "{secret} survived redaction");
    }
    assert_eq!(out["sessions"][1]["password"], json!("**********"));
    assert_eq!(out["flags"]["password"]["hint"], json!("pet name"));
    assert_eq!(out["profile"]["email"], json!("alice@example.org"));
}

#[test]
fn fixture_policy_loads() {
    let policy = RedactionPolicy::load(fixtures_dir().join("redaction_policy.json")).unwrap();
    assert!(policy.case_insensitive);
    let redactor = Redactor::new(&policy).unwrap();
    let out = redactor.redact(&json!({"APITOKEN": "t", "Secret": "s", "name": "n"}));
    assert_eq!(out, json!({"APITOKEN": "[REDACTED]", "Secret": "[REDACTED]", "name": "n"}));
}

#[test]
fn very_deep_tree_terminates() {
    let depth = 100_000;
    let tree = deep_tree(depth);
    let redactor = Redactor::default();

    let copy = redactor.redact(&tree);
    assert!(!contains_string(&copy, "level"));
    assert!(!contains_string(&copy, "bottom"));

    let mut in_place = tree;
    redactor.redact_in_place(&mut in_place);
    assert!(!contains_string(&in_place, "bottom"));

    dismantle(copy);
    dismantle(in_place);
}

#[test]
fn domain_objects_via_serialize() {
    #[derive(Serialize)]
    struct Account {
        name: String,
        password: String,
        devices: Vec<Device>,
    }
    #[derive(Serialize)]
    struct Device {
        label: String,
        password: Option<String>,
    }

    let account = Account {
        name: "carol".into(),
        password: "pw".into(),
        devices: vec![Device {
            label: "phone".into(),
            password: None,
        }],
    };
    let out = Redactor::default().redact_serializable(&account);
    assert_eq!(
        out,
        json!({
            "name": "carol",
            "password": "**********",
            "devices": [{"label": "phone", "password": "**********"}]
        })
    );
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(6, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Keys that never occur leave the tree unchanged.
    #[test]
    fn no_sensitive_keys_is_identity(tree in arb_json()) {
        // generated keys are lowercase letters only
        let out = redact(&tree, &["PASSWORD_1"]);
        prop_assert_eq!(out, tree);
    }

    /// Redaction is idempotent and the pure and in-place forms agree.
    #[test]
    fn redaction_idempotent(tree in arb_json(), key in "[a-z]{1,2}") {
        let redactor = Redactor::new(&RedactionPolicy::with_keys([key])).unwrap();
        let once = redactor.redact(&tree);
        prop_assert_eq!(redactor.redact(&once), once.clone());

        let mut in_place = tree.clone();
        redactor.redact_in_place(&mut in_place);
        prop_assert_eq!(in_place, once);
    }
}
