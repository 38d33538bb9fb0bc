//! Shared fixtures for the engine integration tests

#![allow(dead_code)]

use std::thread;
use std::time::Duration;

use veneer_sdk::{
    arg, ClassBuilder, ClassRef, FromValue, MemberDescriptor, ObjectRef, Pending, Scope, Value,
};

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `Counter` with internal state `_count`:
///
/// - `increment(n)` adds `n` and returns the receiver
/// - `merge(other)` adds another counter's internal count
/// - `count` getter, `label` accessor, `unit` plain value
/// - static `create()` constructs through the receiver class
/// - static `_registry` and instance `_reset()` are internal
pub fn counter_class() -> ClassRef {
    ClassBuilder::new("Counter")
        .constructor(|class, args| {
            let obj = class.instantiate();
            obj.set_field("_count", arg::<Option<i64>>(args, 0)?.unwrap_or(0));
            Ok(obj.into())
        })
        .method("increment", |this, args| {
            let obj = ObjectRef::from_value(this)?;
            let by: i64 = arg(args, 0)?;
            let count = i64::from_value(&obj.get("_count")?)?;
            obj.set("_count", count + by)?;
            Ok(this.clone())
        })
        .method("merge", |this, args| {
            let obj = ObjectRef::from_value(this)?;
            let other: ObjectRef = arg(args, 0)?;
            let theirs = i64::from_value(&other.get("_count")?)?;
            let ours = i64::from_value(&obj.get("_count")?)?;
            obj.set("_count", ours + theirs)?;
            Ok(Value::int(ours + theirs))
        })
        .method("twin", |this, _| {
            let obj = ObjectRef::from_value(this)?;
            let twin = obj.class().construct(&[obj.get("_count")?])?;
            Ok(Value::sequence([this.clone(), twin]))
        })
        .method("later", |this, args| {
            let delay: i64 = arg(args, 0)?;
            let (pending, resolver) = Pending::new();
            let this = this.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(delay.max(0) as u64));
                resolver.resolve(this);
            });
            Ok(pending.into())
        })
        .method("_reset", |this, _| {
            ObjectRef::from_value(this)?.set("_count", 0i64)?;
            Ok(Value::Undefined)
        })
        .getter("count", |this| ObjectRef::from_value(this)?.get("_count"))
        .accessor(
            "label",
            |this| ObjectRef::from_value(this)?.get("_label"),
            |this, value| ObjectRef::from_value(this)?.set("_label", value),
        )
        .value("unit", "ticks")
        .static_method("create", |receiver, _| {
            ClassRef::from_value(receiver)?.construct(&[])
        })
        .static_value("_registry", Value::Null)
        .static_value("VERSION", 1i64)
        .build()
}

/// `Counter` whose static `create()` returns a plain implementation
/// instance, so façade callers only see it through on-demand wrapping.
///
/// The factory holds its own class, so the class is never freed.
pub fn factory_counter_class() -> ClassRef {
    let class = counter_class();
    let implementation = class.clone();
    class.define(
        Scope::Static,
        MemberDescriptor::method("create", move |_, _| implementation.construct(&[])),
    );
    class
}

/// A class unrelated to `Counter`
pub fn timer_class() -> ClassRef {
    ClassBuilder::new("Timer").default_constructor().build()
}

/// Unwrap an object value
pub fn object(value: Value) -> ObjectRef {
    match value {
        Value::Object(obj) => obj,
        other => panic!("expected an object, got {:?}", other),
    }
}
