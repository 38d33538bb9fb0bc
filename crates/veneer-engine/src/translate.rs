//! Value translator
//!
//! Rewrites values crossing the façade boundary. `to_public` maps
//! implementation entities to their façades, `to_private` maps façades back
//! to implementations. Translation never fails: anything without a
//! counterpart passes through unchanged.

use veneer_sdk::{ObjectRef, Value};

use crate::bridge::Binding;
use crate::registry::{Registry, WeakRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Public,
    Private,
}

impl Registry {
    /// Translate a value leaving the implementation
    pub fn to_public(&self, value: &Value) -> Value {
        translate(self, value, Direction::Public)
    }

    /// Translate a value entering the implementation
    pub fn to_private(&self, value: &Value) -> Value {
        translate(self, value, Direction::Private)
    }

    /// Translate an argument list entering the implementation
    pub fn to_private_all(&self, args: &[Value]) -> Vec<Value> {
        args.iter().map(|arg| self.to_private(arg)).collect()
    }

    fn object_to_public(&self, obj: &ObjectRef) -> ObjectRef {
        if let Some(facade) = self.facade_instance_of(obj) {
            return facade;
        }
        let Some(facade_class) = self.nearest_facade(obj.class()) else {
            return obj.clone();
        };
        match self.resolve(&facade_class, obj) {
            Ok(facade) => facade,
            Err(error) => {
                tracing::warn!(
                    class = obj.class().name(),
                    %error,
                    "could not wrap instance on demand, passing through"
                );
                obj.clone()
            }
        }
    }

    fn object_to_private(&self, obj: &ObjectRef) -> ObjectRef {
        match obj.attachment::<Binding>() {
            Some(binding) if binding.belongs_to(self) => binding.implementation().clone(),
            _ => obj.clone(),
        }
    }
}

fn translate(registry: &Registry, value: &Value, direction: Direction) -> Value {
    match value {
        Value::Object(obj) => Value::Object(match direction {
            Direction::Public => registry.object_to_public(obj),
            Direction::Private => registry.object_to_private(obj),
        }),
        Value::Class(class) => {
            let counterpart = match direction {
                Direction::Public => registry.facade_of(class),
                Direction::Private => registry.implementation_of(class),
            };
            Value::Class(counterpart.unwrap_or_else(|| class.clone()))
        }
        Value::Sequence(items) => Value::Sequence(
            items
                .iter()
                .map(|item| translate(registry, item, direction))
                .collect(),
        ),
        Value::Pending(pending) => {
            let scope = registry.downgrade();
            Value::Pending(pending.map(move |settled| settle(&scope, settled, direction)))
        }
        Value::Undefined
        | Value::Null
        | Value::Bool(_)
        | Value::Int(_)
        | Value::Float(_)
        | Value::Str(_) => value.clone(),
    }
}

/// Translate a pending value once it has settled
fn settle(scope: &WeakRegistry, value: Value, direction: Direction) -> Value {
    match scope.upgrade() {
        Some(registry) => {
            tracing::trace!(?direction, "translating settled value");
            translate(&registry, &value, direction)
        }
        None => value,
    }
}
