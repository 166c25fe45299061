//! Integration tests for attribute access, change tracking, bulk assignment
//! and serialization.

mod common;

use common::{CallLog, RecordingAdapter, user_class};
use modelkit_model::prelude::*;
use proptest::prelude::*;
use serde_json::json;

fn user() -> ModelClass {
    user_class(&RecordingAdapter::new())
}

// ─────────────────────────────────────────────────────────────────────────────
// Change Tracking
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn changed_returns_a_detached_copy() {
    let tobi = user().instance(Attributes::new());
    tobi.set("name", "Tobi").set("age", 22);

    let mut changed = tobi.changed();
    assert_eq!(changed.get("name"), Some(&Value::from("Tobi")));
    assert_eq!(changed.get("age"), Some(&Value::from(22)));

    changed.insert("name", "Loki");
    changed.remove("age");
    assert_eq!(tobi.changed().get("name"), Some(&Value::from("Tobi")));
    assert!(tobi.is_changed("age"));
}

#[test]
fn changed_attr_reports_per_attribute() {
    let tobi = user().instance(Attributes::new().with("name", "Tobi"));
    tobi.set("age", 22);

    assert!(tobi.is_changed("age"));
    assert!(!tobi.is_changed("name"));
}

#[test]
fn set_returns_self_for_chaining() {
    let tobi = user().instance(Attributes::new());
    let same = tobi.set("name", "Tobi");
    assert!(same.ptr_eq(&tobi));
}

#[test]
fn change_events_carry_new_and_previous_values() {
    let tobi = user().instance(Attributes::new().with("name", "Tobi"));
    let log = CallLog::default();

    let sink = log.clone();
    tobi.on("change:name", move |event| {
        if let ModelEvent::Change { value, previous, .. } = event {
            sink.push(format!("{value:?} <- {previous:?}"));
        }
    })
    .unwrap();
    let sink = log.clone();
    tobi.on("change", move |event| {
        if let ModelEvent::Change { attr, .. } = event {
            sink.push(format!("change {attr}"));
        }
    })
    .unwrap();

    tobi.set("name", "Loki");

    assert_eq!(
        log.entries(),
        vec![
            format!("{:?} <- {:?}", Some(Value::from("Loki")), Some(Value::from("Tobi"))),
            "change name".to_owned(),
        ]
    );
}

#[test]
fn class_listeners_see_the_instance() {
    let class = user();
    let tobi = class.instance(Attributes::new());
    let log = CallLog::default();

    let sink = log.clone();
    let target = tobi.downgrade();
    class
        .on("change:age", move |instance, _| {
            let same = target.upgrade().is_some_and(|t| t.ptr_eq(instance));
            sink.push(format!("same={same}"));
        })
        .unwrap();

    tobi.set("age", 3);
    assert_eq!(log.entries(), vec!["same=true"]);
}

#[test]
fn set_same_value_changes_nothing() {
    let tobi = user().instance(Attributes::new().with("age", 22));
    let log = CallLog::default();
    let sink = log.clone();
    tobi.on("change", move |_| sink.push("change")).unwrap();

    tobi.set("age", 22);
    tobi.set("age", 22.0);

    assert!(log.entries().is_empty());
    assert!(tobi.changed().is_empty());
}

#[test]
fn set_distinguishes_large_integers() {
    let tobi = user().instance(Attributes::new().with("id", 9_007_199_254_740_992u64));
    let log = CallLog::default();
    let sink = log.clone();
    tobi.on("change:id", move |_| sink.push("change:id")).unwrap();

    tobi.set("id", 9_007_199_254_740_993u64);

    assert_eq!(tobi.get("id"), Some(Value::from(9_007_199_254_740_993u64)));
    assert!(tobi.is_changed("id"));
    assert_eq!(log.entries(), vec!["change:id"]);
}

#[test]
fn once_listeners_fire_a_single_time() {
    let tobi = user().instance(Attributes::new());
    let log = CallLog::default();
    let sink = log.clone();
    tobi.once("change", move |_| sink.push("once")).unwrap();

    tobi.set("age", 1);
    tobi.set("age", 2);

    assert_eq!(log.entries(), vec!["once"]);
    assert_eq!(tobi.listener_count("change"), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Bulk Assignment
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn assign_sets_and_unsets() {
    let tobi = user().instance(Attributes::new().with("name", "Tobi").with("age", 22));
    tobi.assign(Attributes::new().with("name", "Loki").without("age"));

    assert_eq!(tobi.get("name"), Some(Value::from("Loki")));
    assert!(!tobi.has("age"));
    assert!(tobi.is_changed("age"));
}

#[test]
fn assign_ignores_attributes_outside_the_schema() {
    let tobi = user().instance(Attributes::new());
    tobi.assign(
        Attributes::new()
            .with("name", "Tobi")
            .with("throwError", true)
            .with("save", "oops"),
    );

    assert_eq!(tobi.get("throwError"), None);
    assert_eq!(tobi.get("save"), None);
    assert_eq!(tobi.to_json(), json!({"name": "Tobi"}));
}

#[test]
fn setting_listeners_can_rewrite_the_map() {
    let class = user();
    class
        .on("setting", |_, event| {
            if let ModelEvent::Setting { attrs } = event {
                attrs.insert("age", 99);
            }
        })
        .unwrap();

    let tobi = class.instance(Attributes::new());
    tobi.on("setting", |event| {
        if let ModelEvent::Setting { attrs } = event {
            attrs.remove("name");
        }
    })
    .unwrap();

    tobi.assign(Attributes::new().with("name", "Tobi").with("age", 1));

    assert_eq!(tobi.get("name"), None);
    assert_eq!(tobi.get("age"), Some(Value::from(99)));
}

#[test]
fn replacing_the_setting_payload_assigns_nothing() {
    let tobi = user().instance(Attributes::new().with("name", "Tobi"));
    tobi.on("setting", |event| *event = ModelEvent::Valid).unwrap();

    tobi.assign(Attributes::new().with("name", "Loki").with("age", 3));

    assert_eq!(tobi.get("name"), Some(Value::from("Tobi")));
    assert!(!tobi.has("age"));
    assert!(tobi.changed().is_empty());
}

#[test]
fn instance_off_ignores_ids_from_the_class() {
    let class = user();
    let tobi = class.instance(Attributes::new());
    let class_id = class.on("change", |_, _| {}).unwrap();
    tobi.on("change", |_| {}).unwrap();

    assert!(!tobi.off(class_id));
    assert_eq!(tobi.listener_count("change"), 1);
    assert_eq!(class.listener_count("change"), 1);
}

#[test]
fn instance_refuses_lifecycle_names_as_plain_listeners() {
    let tobi = user().instance(Attributes::new());
    assert_eq!(
        tobi.on("removing", |_| {}),
        Err(RegistrationError::HookEvent("removing".to_owned()))
    );
    assert!(tobi.once("updating", |_| {}).is_err());
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn is_new_tracks_the_primary_key() {
    let tobi = user().instance(Attributes::new());
    assert!(tobi.is_new());
    assert_eq!(tobi.primary(), None);

    tobi.set_primary(123);
    assert!(!tobi.is_new());
    assert_eq!(tobi.primary(), Some(Value::from(123)));
    assert_eq!(tobi.get("id"), Some(Value::from(123)));

    tobi.unset("id");
    assert!(tobi.is_new());
}

#[test]
fn null_primary_key_is_not_new() {
    let tobi = user().instance(Attributes::new().with("id", Value::Null));
    assert!(!tobi.is_new());
}

#[test]
fn model_references_the_class() {
    let class = user();
    let tobi = class.instance(Attributes::new());
    assert!(tobi.model().ptr_eq(&class));
    assert_eq!(tobi.model().name(), "User");
}

// ─────────────────────────────────────────────────────────────────────────────
// Serialization
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn to_json_copies_set_attributes() {
    let tobi = user().instance(Attributes::new().with("name", "Tobi").with("age", 22));
    assert_eq!(tobi.to_json(), json!({"name": "Tobi", "age": 22}));
    assert_eq!(tobi.json(), tobi.to_json());
}

#[test]
fn to_json_snapshots_are_independent() {
    let source = Attributes::new().with("name", "Tobi");
    let tobi = user().instance(source.clone());
    let snapshot = tobi.to_json();

    tobi.set("name", "Loki");
    drop(source);

    assert_eq!(snapshot, json!({"name": "Tobi"}));
}

#[test]
fn to_json_keeps_null_and_drops_unset() {
    let tobi = user().instance(Attributes::new().with("name", Value::Null).without("age"));
    assert_eq!(tobi.to_json(), json!({"name": null}));
}

#[test]
fn to_json_recurses_into_nested_instances() {
    let user = user();
    let post = ModelClass::builder("Post")
        .attr("title", AttrType::String)
        .attr("author", AttrType::Any)
        .build();

    let tobi = user.instance(Attributes::new().with("name", "Tobi"));
    let hello = post.instance(
        Attributes::new()
            .with("title", "Hello")
            .with("author", &tobi),
    );

    assert_eq!(
        hello.to_json(),
        json!({"title": "Hello", "author": {"name": "Tobi"}})
    );

    tobi.set("age", 3);
    assert_eq!(hello.to_json()["author"], json!({"name": "Tobi", "age": 3}));
}

#[test]
fn nested_instances_compare_by_identity() {
    let user = user();
    let a = user.instance(Attributes::new().with("name", "Tobi"));
    let b = user.instance(Attributes::new().with("name", "Tobi"));

    assert_eq!(Value::from(&a), Value::from(a.clone()));
    assert_ne!(Value::from(&a), Value::from(&b));
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Keys outside the schema never reach the store, whatever their value.
    #[test]
    fn prop_undeclared_keys_are_dropped(
        key in "[a-zA-Z_][a-zA-Z0-9_]{0,12}",
        value in any::<i64>(),
    ) {
        prop_assume!(!["id", "name", "age"].contains(&key.as_str()));

        let tobi = user().instance(Attributes::new());
        tobi.assign(Attributes::new().with(key.clone(), value));

        prop_assert_eq!(tobi.get(&key), None);
        prop_assert!(!tobi.is_changed(&key));
        prop_assert_eq!(tobi.to_json(), json!({}));
    }

    /// `to_json` is exactly the set schema attributes.
    #[test]
    fn prop_to_json_mirrors_assigned_attributes(
        name in proptest::option::of("[a-z]{1,8}"),
        age in proptest::option::of(0i64..150),
    ) {
        let mut attrs = Attributes::new();
        let mut expected = serde_json::Map::new();
        if let Some(name) = &name {
            attrs.insert("name", name.as_str());
            expected.insert("name".into(), json!(name));
        }
        if let Some(age) = age {
            attrs.insert("age", age);
            expected.insert("age".into(), json!(age));
        }

        let tobi = user().instance(attrs);
        prop_assert_eq!(tobi.to_json(), serde_json::Value::Object(expected));
    }
}
