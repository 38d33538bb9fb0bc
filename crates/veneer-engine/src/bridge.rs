//! Façade instance bridge
//!
//! Every façade instance carries a [`Binding`] in its attachment slot naming
//! the implementation instance it fronts. A binding is set exactly once, when
//! the façade instance is created by [`Registry::wrap`],
//! [`Registry::construct`] or [`Registry::resolve`], and is never replaced.
//!
//! Dropping a façade instance drops its binding, which removes the pair from
//! the registry.
//!
//! [`lookup`] resolves through the registry that compiled a façade class,
//! so callers holding only the class need no registry handle.

use veneer_sdk::{ClassRef, FacadeError, FacadeResult, ObjectId, ObjectRef, Value};

use crate::registry::{Registry, WeakRegistry};

/// Association between a façade instance and its implementation instance
#[derive(Debug)]
pub struct Binding {
    implementation: ObjectRef,
    registry: WeakRegistry,
    facade: ObjectId,
}

impl Binding {
    /// The bound implementation instance
    pub fn implementation(&self) -> &ObjectRef {
        &self.implementation
    }

    /// Check if this binding was made by `registry`
    pub fn belongs_to(&self, registry: &Registry) -> bool {
        self.registry.is(registry)
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let removed = registry
            .inner
            .tables
            .lock()
            .unbind(self.implementation.id(), self.facade);
        if !removed.is_empty() {
            tracing::trace!(
                facade = self.facade.as_u64(),
                implementation = self.implementation.id().as_u64(),
                "facade instance dropped, pair removed"
            );
        }
    }
}

/// Implementation instance behind a façade receiver.
///
/// `None` for anything that is not a bound façade instance.
pub fn bound_implementation(receiver: &Value) -> Option<ObjectRef> {
    receiver
        .as_object()
        .and_then(|obj| obj.attachment::<Binding>())
        .map(|binding| binding.implementation.clone())
}

/// Registry that compiled façade class `facade`.
///
/// Fails with `NotAFacade` for a class no registry compiled and with
/// `ScopeClosed` once that registry is gone.
pub fn registry_of(facade: &ClassRef) -> FacadeResult<Registry> {
    facade
        .attachment::<WeakRegistry>()
        .ok_or_else(|| FacadeError::NotAFacade(facade.name().to_string()))?
        .upgrade()
        .ok_or(FacadeError::ScopeClosed)
}

/// Façade instance for `implementation` in the registry that compiled
/// `facade`, wrapping on demand.
pub fn lookup(facade: &ClassRef, implementation: &ObjectRef) -> FacadeResult<ObjectRef> {
    registry_of(facade)?.resolve(facade, implementation)
}

impl Registry {
    /// Allocate a façade instance bound to `implementation`, not yet registered
    fn bind(&self, facade: &ClassRef, implementation: &ObjectRef) -> ObjectRef {
        let instance = ObjectRef::new(facade);
        let binding = Binding {
            implementation: implementation.clone(),
            registry: self.downgrade(),
            facade: instance.id(),
        };
        // A fresh object has an empty slot
        let _ = instance.attach(binding);
        instance
    }

    /// Bind a new façade instance of `facade` to an existing implementation
    /// instance.
    ///
    /// Fails with `NotAFacade` if `facade` was not compiled by this registry,
    /// `UnrelatedInstance` if `implementation` is not an instance of the
    /// wrapped class, and `AlreadyBound` if it already has a live façade.
    pub fn wrap(&self, facade: &ClassRef, implementation: &ObjectRef) -> FacadeResult<ObjectRef> {
        // Declared before the guard: a rejected candidate drops after unlock
        let candidate = self.bind(facade, implementation);
        let replaced;
        {
            let mut tables = self.inner.tables.lock();
            let target = tables
                .implementation_class(facade.id())
                .ok_or_else(|| FacadeError::NotAFacade(facade.name().to_string()))?;
            if !implementation.is_instance_of(target) {
                return Err(FacadeError::UnrelatedInstance {
                    expected: target.name().to_string(),
                    got: implementation.class().name().to_string(),
                });
            }
            if tables.has_live_facade(implementation.id()) {
                return Err(FacadeError::AlreadyBound {
                    class: implementation.class().name().to_string(),
                    instance: implementation.id().as_u64(),
                });
            }
            replaced = tables.register_instances(implementation, &candidate, self.retention());
        }
        drop(replaced);

        tracing::debug!(
            class = facade.name(),
            facade = candidate.id().as_u64(),
            implementation = implementation.id().as_u64(),
            "bound facade instance"
        );
        Ok(candidate)
    }

    /// Construct through a façade class.
    ///
    /// A single argument that is already an instance of the wrapped class
    /// takes the wrap form and fails with `AlreadyBound` if it has a live
    /// façade. Anything else is translated to private, passed to the
    /// implementation constructor and the result wrapped.
    pub fn construct(&self, facade: &ClassRef, args: &[Value]) -> FacadeResult<ObjectRef> {
        let implementation_class = self
            .implementation_of(facade)
            .ok_or_else(|| FacadeError::NotAFacade(facade.name().to_string()))?;
        if let [Value::Object(existing)] = args {
            if existing.is_instance_of(&implementation_class) {
                return self.wrap(facade, existing);
            }
        }
        let args = self.to_private_all(args);
        let created = implementation_class.construct(&args)?;
        let Value::Object(instance) = created else {
            return Err(FacadeError::TypeMismatch {
                expected: format!("instance of {}", implementation_class.name()),
                got: created.describe(),
            });
        };
        self.wrap(facade, &instance)
    }

    /// The façade instance for `implementation`, wrapping on demand.
    ///
    /// Instances outside the wrapped class hierarchy are rejected with
    /// `UnrelatedInstance`. The check and the wrap are atomic.
    pub fn resolve(&self, facade: &ClassRef, implementation: &ObjectRef) -> FacadeResult<ObjectRef> {
        if let Some(existing) = self.facade_instance_of(implementation) {
            return Ok(existing);
        }

        let candidate = self.bind(facade, implementation);
        let replaced;
        {
            let mut tables = self.inner.tables.lock();
            let target = tables
                .implementation_class(facade.id())
                .ok_or_else(|| FacadeError::NotAFacade(facade.name().to_string()))?;
            if !implementation.is_instance_of(target) {
                return Err(FacadeError::UnrelatedInstance {
                    expected: target.name().to_string(),
                    got: implementation.class().name().to_string(),
                });
            }
            // Another thread may have won the race since the fast path
            if let Some(existing) = tables.facade_instance(implementation.id()) {
                return Ok(existing);
            }
            replaced = tables.register_instances(implementation, &candidate, self.retention());
        }
        drop(replaced);

        tracing::debug!(
            class = facade.name(),
            facade = candidate.id().as_u64(),
            implementation = implementation.id().as_u64(),
            "wrapped instance on demand"
        );
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veneer_sdk::ClassBuilder;

    fn widget() -> ClassRef {
        ClassBuilder::new("Widget")
            .default_constructor()
            .method("ping", |_, _| Ok(Value::string("pong")))
            .build()
    }

    #[test]
    fn test_wrap_binds_once() {
        let registry = Registry::isolated();
        let implementation = widget();
        let facade = registry.compile_class(&implementation).unwrap();
        let instance = implementation.instantiate();

        let wrapped = registry.wrap(&facade, &instance).unwrap();
        assert_eq!(bound_implementation(&Value::from(&wrapped)), Some(instance.clone()));
        assert!(wrapped
            .attachment::<Binding>()
            .is_some_and(|b| b.belongs_to(&registry)));

        assert!(matches!(
            registry.wrap(&facade, &instance),
            Err(FacadeError::AlreadyBound { .. })
        ));
        // The failed attempt leaves the original pairing intact
        assert_eq!(registry.facade_instance_of(&instance), Some(wrapped));
    }

    #[test]
    fn test_wrap_rejects_unknown_and_unrelated() {
        let registry = Registry::isolated();
        let implementation = widget();
        let facade = registry.compile_class(&implementation).unwrap();
        let stranger = ClassBuilder::new("Stranger").default_constructor().build();

        assert!(matches!(
            registry.wrap(&implementation, &implementation.instantiate()),
            Err(FacadeError::NotAFacade(_))
        ));
        assert!(matches!(
            registry.wrap(&facade, &stranger.instantiate()),
            Err(FacadeError::UnrelatedInstance { .. })
        ));
    }

    #[test]
    fn test_construct_requires_object() {
        let registry = Registry::isolated();
        let odd = ClassBuilder::new("Odd")
            .constructor(|_, _| Ok(Value::int(1)))
            .build();
        let facade = registry.compile_class(&odd).unwrap();
        assert!(matches!(
            registry.construct(&facade, &[]),
            Err(FacadeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_construct_with_instance_takes_wrap_form() {
        let registry = Registry::isolated();
        let implementation = widget();
        let facade = registry.compile_class(&implementation).unwrap();
        let instance = implementation.instantiate();

        let wrapped = registry
            .construct(&facade, &[Value::from(&instance)])
            .unwrap();
        assert_eq!(registry.implementation_instance_of(&wrapped), Some(instance.clone()));

        assert!(matches!(
            registry.construct(&facade, &[Value::from(&instance)]),
            Err(FacadeError::AlreadyBound { .. })
        ));
    }

    #[test]
    fn test_resolve_reuses_or_wraps() {
        let registry = Registry::isolated();
        let implementation = widget();
        let facade = registry.compile_class(&implementation).unwrap();
        let instance = implementation.instantiate();

        let first = registry.resolve(&facade, &instance).unwrap();
        let second = registry.resolve(&facade, &instance).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.implementation_instance_of(&first), Some(instance));
    }

    #[test]
    fn test_lookup_finds_compiling_registry() {
        let first = Registry::isolated();
        let second = Registry::isolated();
        let implementation = widget();
        let facade_one = first.compile_class(&implementation).unwrap();
        let facade_two = second.compile_class(&implementation).unwrap();
        let instance = implementation.instantiate();

        assert!(Registry::ptr_eq(&registry_of(&facade_one).unwrap(), &first));
        let outer_one = lookup(&facade_one, &instance).unwrap();
        let outer_two = lookup(&facade_two, &instance).unwrap();
        assert_ne!(outer_one, outer_two);
        assert_eq!(first.facade_instance_of(&instance), Some(outer_one.clone()));
        assert_eq!(lookup(&facade_one, &instance).unwrap(), outer_one);

        assert!(matches!(
            lookup(&implementation, &instance),
            Err(FacadeError::NotAFacade(_))
        ));
        drop(first);
        assert!(matches!(registry_of(&facade_one), Err(FacadeError::ScopeClosed)));
    }

    #[test]
    fn test_unbound_receiver() {
        let implementation = widget();
        assert!(bound_implementation(&Value::from(implementation.instantiate())).is_none());
        assert!(bound_implementation(&Value::int(1)).is_none());
    }
}
