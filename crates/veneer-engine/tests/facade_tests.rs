//! Façade behaviour tests
//!
//! End-to-end checks of compiled façades over the `Counter` fixture:
//! - Static factory and fluent instance methods
//! - Encapsulation of internal members
//! - Argument and result translation (entities, sequences, pending results)
//! - Double-wrap rejection, including through the façade constructor
//! - Unrelated instances
//!
//! # Running Tests
//! ```bash
//! cargo test --test facade_tests
//! ```

mod common;

use common::{counter_class, factory_counter_class, init_tracing, object, timer_class};
use veneer_engine::{compile, shared, FacadeError, Registry, Scope, Value};

// ===== Counter Scenario =====

#[test]
fn test_counter_scenario() {
    init_tracing();
    let registry = Registry::isolated();
    let facade = registry.compile(&Value::from(counter_class())).unwrap();

    let c1 = object(facade.invoke_static("create", &[]).unwrap());
    assert_eq!(c1.class(), &facade);

    let returned = c1.invoke("increment", &[Value::int(5)]).unwrap();
    assert_eq!(returned, Value::from(&c1));
    assert_eq!(c1.get("count").unwrap(), Value::int(5));

    assert_eq!(c1.get("_count").unwrap(), Value::Undefined);
    assert!(matches!(
        c1.invoke("_reset", &[]),
        Err(FacadeError::MissingMember { .. })
    ));
}

#[test]
fn test_counter_scenario_factory_returns_implementation() {
    init_tracing();
    let implementation = factory_counter_class();
    let facade = compile(&Value::from(&implementation)).unwrap();

    let c1 = object(facade.invoke_static("create", &[]).unwrap());
    assert_eq!(c1.class(), &facade);
    let inner = shared().implementation_instance_of(&c1).unwrap();
    assert!(inner.is_instance_of(&implementation));

    let returned = c1.invoke("increment", &[Value::int(5)]).unwrap();
    assert_eq!(returned, Value::from(&c1));
    assert_eq!(c1.get("count").unwrap(), Value::int(5));
    assert_eq!(c1.get("_count").unwrap(), Value::Undefined);

    // A second factory call yields a distinct pair
    let c2 = object(facade.invoke_static("create", &[]).unwrap());
    assert_ne!(c2, c1);
}

#[test]
fn test_construct_through_facade() {
    let registry = Registry::isolated();
    let facade = registry.compile(&Value::from(counter_class())).unwrap();

    let c = object(facade.construct(&[Value::int(3)]).unwrap());
    assert_eq!(c.get("count").unwrap(), Value::int(3));
    c.invoke("increment", &[Value::int(2)]).unwrap();
    assert_eq!(c.get("count").unwrap(), Value::int(5));
}

// ===== Encapsulation =====

#[test]
fn test_no_internal_members_on_facade() {
    let registry = Registry::isolated();
    let facade = registry.compile(&Value::from(counter_class())).unwrap();

    for scope in [Scope::Static, Scope::Instance] {
        let names = facade.member_names(scope);
        assert!(!names.is_empty());
        assert!(
            names.iter().all(|n| !n.starts_with('_')),
            "internal member leaked: {:?}",
            names
        );
    }
    assert_eq!(facade.get_static("_registry").unwrap(), Value::Undefined);
    assert_eq!(facade.get_static("VERSION").unwrap(), Value::int(1));
}

#[test]
fn test_facade_rejects_undeclared_writes() {
    let registry = Registry::isolated();
    let facade = registry.compile(&Value::from(counter_class())).unwrap();
    let c = object(facade.construct(&[]).unwrap());

    assert!(matches!(
        c.set("_count", 100i64),
        Err(FacadeError::MissingMember { .. })
    ));
    assert!(matches!(c.set("unit", "s"), Err(FacadeError::ReadOnly { .. })));
    assert!(matches!(
        facade.set_static("VERSION", 2i64),
        Err(FacadeError::ReadOnly { .. })
    ));
    assert_eq!(c.get("count").unwrap(), Value::int(0));
}

#[test]
fn test_accessor_round_trip() {
    let registry = Registry::isolated();
    let implementation = counter_class();
    let facade = registry.compile_class(&implementation).unwrap();
    let c = object(facade.construct(&[]).unwrap());

    c.set("label", "laps").unwrap();
    assert_eq!(c.get("label").unwrap(), Value::string("laps"));

    let inner = registry.implementation_instance_of(&c).unwrap();
    assert_eq!(inner.field("_label"), Some(Value::string("laps")));
}

// ===== Translation =====

#[test]
fn test_arguments_translated_to_private() {
    let registry = Registry::isolated();
    let facade = registry.compile(&Value::from(counter_class())).unwrap();
    let a = object(facade.construct(&[Value::int(2)]).unwrap());
    let b = object(facade.construct(&[Value::int(40)]).unwrap());

    // `merge` reads the internal count of its argument
    assert_eq!(a.invoke("merge", &[Value::from(&b)]).unwrap(), Value::int(42));
    assert_eq!(a.get("count").unwrap(), Value::int(42));
}

#[test]
fn test_sequence_results_translated() {
    let registry = Registry::isolated();
    let facade = registry.compile(&Value::from(counter_class())).unwrap();
    let c = object(facade.construct(&[Value::int(9)]).unwrap());

    let pair = c.invoke("twin", &[]).unwrap();
    let items = pair.as_sequence().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0], Value::from(&c));

    let twin = items[1].as_object().unwrap();
    assert_eq!(twin.class(), &facade);
    assert_ne!(twin, &c);
    assert_eq!(twin.get("count").unwrap(), Value::int(9));
}

#[test]
fn test_pending_results_translated() {
    let registry = Registry::isolated();
    let facade = registry.compile(&Value::from(counter_class())).unwrap();
    let c = object(facade.construct(&[]).unwrap());

    let result = c.invoke("later", &[Value::int(5)]).unwrap();
    let pending = result.as_pending().unwrap();
    assert_eq!(pending.wait(), Ok(Value::from(&c)));
}

#[test]
fn test_scalars_and_foreign_objects_pass_through() {
    let registry = Registry::isolated();
    registry.compile(&Value::from(counter_class())).unwrap();
    let timer = timer_class().instantiate();

    assert_eq!(registry.to_public(&Value::from(&timer)), Value::from(&timer));
    assert_eq!(registry.to_public(&Value::float(1.5)), Value::float(1.5));
    assert_eq!(registry.to_private(&Value::string("x")), Value::string("x"));
}

// ===== Binding Errors =====

#[test]
fn test_double_wrap_rejected() {
    let registry = Registry::isolated();
    let implementation = counter_class();
    let facade = registry.compile_class(&implementation).unwrap();
    let inner = object(implementation.construct(&[]).unwrap());

    let first = registry.wrap(&facade, &inner).unwrap();
    let err = registry.wrap(&facade, &inner).unwrap_err();
    assert_eq!(
        err,
        FacadeError::AlreadyBound {
            class: "Counter".to_string(),
            instance: inner.id().as_u64(),
        }
    );
    assert_eq!(registry.resolve(&facade, &inner).unwrap(), first);
}

#[test]
fn test_construct_with_bound_instance_rejected() {
    let registry = Registry::isolated();
    let implementation = counter_class();
    let facade = registry.compile_class(&implementation).unwrap();
    let inner = object(implementation.construct(&[Value::int(4)]).unwrap());
    let first = registry.wrap(&facade, &inner).unwrap();

    let err = facade.construct(&[Value::from(&inner)]).unwrap_err();
    assert_eq!(
        err,
        FacadeError::AlreadyBound {
            class: "Counter".to_string(),
            instance: inner.id().as_u64(),
        }
    );
    assert_eq!(registry.facade_instance_of(&inner), Some(first));
}

#[test]
fn test_construct_with_unbound_instance_wraps_it() {
    let registry = Registry::isolated();
    let implementation = counter_class();
    let facade = registry.compile_class(&implementation).unwrap();
    let inner = object(implementation.construct(&[Value::int(4)]).unwrap());

    let outer = object(facade.construct(&[Value::from(&inner)]).unwrap());
    assert_eq!(registry.implementation_instance_of(&outer), Some(inner));
    assert_eq!(outer.get("count").unwrap(), Value::int(4));
}

#[test]
fn test_resolve_unrelated_instance() {
    let registry = Registry::isolated();
    let facade = registry.compile(&Value::from(counter_class())).unwrap();
    let timer = timer_class().instantiate();

    assert!(matches!(
        registry.resolve(&facade, &timer),
        Err(FacadeError::UnrelatedInstance { .. })
    ));
}

#[test]
fn test_unbound_facade_object() {
    let registry = Registry::isolated();
    let facade = registry.compile(&Value::from(counter_class())).unwrap();
    let loose = facade.instantiate();

    assert_eq!(loose.invoke("increment", &[Value::int(1)]).unwrap(), Value::Undefined);
    assert_eq!(loose.get("count").unwrap(), Value::Undefined);
    assert!(registry.implementation_instance_of(&loose).is_none());
}
