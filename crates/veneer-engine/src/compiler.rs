//! Façade compiler
//!
//! Turns an implementation class into a sealed façade class that exposes only
//! the non-internal members. Each exposed member is rebuilt as a delegate:
//!
//! ```text
//! implementation member      façade member
//! ─────────────────────      ─────────────────────────────────────────────
//! method                     method: args -> private, call, result -> public
//! accessor (get/set)         accessor: result -> public / value -> private
//! plain value                read-only accessor re-reading the live value
//! ```
//!
//! Static members delegate to the implementation class, instance members to
//! the implementation instance bound to the façade receiver. A receiver
//! without a binding reads as `Undefined` and ignores writes.
//!
//! Members are flattened through the class chain (nearest definition wins)
//! and snapshotted at compile time, outside the registry lock. The façade
//! class carries a [`WeakRegistry`] in its attachment slot naming the
//! registry that compiled it.

use std::sync::Arc;

use veneer_sdk::{
    ClassBuilder, ClassRef, FacadeError, FacadeResult, GetterFn, MemberDescriptor, MemberFlags,
    MemberKind, MethodFn, Scope, SetterFn, Value,
};

use crate::bridge::bound_implementation;
use crate::registry::{Registry, WeakRegistry};

impl Registry {
    /// Compile the façade class for `target`.
    ///
    /// `target` must be a class value with a constructor; anything else fails
    /// with `NotAClass`. Repeated calls return the identical class.
    pub fn compile(&self, target: &Value) -> FacadeResult<ClassRef> {
        match target {
            Value::Class(class) => self.compile_class(class),
            other => Err(FacadeError::NotAClass {
                got: other.describe(),
            }),
        }
    }

    /// Compile the façade class for `implementation`
    pub fn compile_class(&self, implementation: &ClassRef) -> FacadeResult<ClassRef> {
        if !implementation.has_constructor() {
            return Err(FacadeError::NotAClass {
                got: format!("class {} without a constructor", implementation.name()),
            });
        }

        {
            let tables = self.inner.tables.lock();
            if let Some(facade) = tables.facade_class(implementation.id()) {
                tracing::trace!(class = implementation.name(), "facade cache hit");
                return Ok(facade.clone());
            }
            // Already a façade of this registry
            if tables.implementation_class(implementation.id()).is_some() {
                return Ok(implementation.clone());
            }
        }

        // Reading members takes the class table locks, which are held while
        // bound values drop. Build unlocked, then register.
        let candidate = FacadeBuilder::new(self, implementation).build();
        let facade = {
            let mut tables = self.inner.tables.lock();
            match tables.facade_class(implementation.id()) {
                Some(existing) => existing.clone(),
                None => {
                    tables.register_classes(implementation, &candidate);
                    candidate.clone()
                }
            }
        };
        if facade != candidate {
            tracing::trace!(class = implementation.name(), "lost compile race, reusing facade");
            return Ok(facade);
        }

        tracing::debug!(
            class = implementation.name(),
            statics = facade.member_names(Scope::Static).len(),
            instance = facade.member_names(Scope::Instance).len(),
            "compiled facade class"
        );
        Ok(facade)
    }
}

/// Builds one façade class from an implementation class
struct FacadeBuilder<'a> {
    registry: &'a Registry,
    implementation: &'a ClassRef,
    scope: WeakRegistry,
}

impl<'a> FacadeBuilder<'a> {
    fn new(registry: &'a Registry, implementation: &'a ClassRef) -> Self {
        Self {
            registry,
            implementation,
            scope: registry.downgrade(),
        }
    }

    fn build(self) -> ClassRef {
        let scope = self.scope.clone();
        let mut builder = ClassBuilder::new(self.implementation.name())
            .constructor(move |facade, args| {
                let registry = upgrade(&scope)?;
                registry.construct(facade, args).map(Value::Object)
            })
            .sealed();

        for scope in [Scope::Static, Scope::Instance] {
            for member in self.implementation.collect_members(scope) {
                if self.registry.config().is_internal(&member.name) {
                    continue;
                }
                builder = builder.member(scope, self.delegate(scope, member));
            }
        }
        let facade = builder.build();
        // A freshly built class has an empty slot
        let _ = facade.attach(self.scope);
        facade
    }

    fn delegate(&self, scope: Scope, member: MemberDescriptor) -> MemberDescriptor {
        let flags = facade_flags(&member);
        let name = member.name;
        let kind = match (scope, member.kind) {
            (Scope::Static, MemberKind::Method(f)) => MemberKind::Method(self.static_method(f)),
            (Scope::Instance, MemberKind::Method(f)) => MemberKind::Method(self.instance_method(f)),
            (Scope::Static, MemberKind::Accessor { get, set }) => MemberKind::Accessor {
                get: get.map(|g| self.static_getter(g)),
                set: set.map(|s| self.static_setter(s)),
            },
            (Scope::Instance, MemberKind::Accessor { get, set }) => MemberKind::Accessor {
                get: get.map(|g| self.instance_getter(g)),
                set: set.map(|s| self.instance_setter(s)),
            },
            (Scope::Static, MemberKind::Value(_)) => MemberKind::Accessor {
                get: Some(self.static_value(name.clone())),
                set: None,
            },
            (Scope::Instance, MemberKind::Value(_)) => MemberKind::Accessor {
                get: Some(self.instance_value(name.clone())),
                set: None,
            },
        };
        MemberDescriptor { name, kind, flags }
    }

    // ========================================================================
    // Static delegates
    // ========================================================================

    fn static_method(&self, f: MethodFn) -> MethodFn {
        let scope = self.scope.clone();
        Arc::new(move |receiver, args| {
            let registry = upgrade(&scope)?;
            let args = registry.to_private_all(args);
            let result = f(receiver, &args)?;
            Ok(registry.to_public(&result))
        })
    }

    fn static_getter(&self, get: GetterFn) -> GetterFn {
        let scope = self.scope.clone();
        let receiver = Value::Class(self.implementation.clone());
        Arc::new(move |_| {
            let registry = upgrade(&scope)?;
            Ok(registry.to_public(&get(&receiver)?))
        })
    }

    fn static_setter(&self, set: SetterFn) -> SetterFn {
        let scope = self.scope.clone();
        let receiver = Value::Class(self.implementation.clone());
        Arc::new(move |_, value| {
            let registry = upgrade(&scope)?;
            set(&receiver, registry.to_private(&value))
        })
    }

    fn static_value(&self, name: String) -> GetterFn {
        let scope = self.scope.clone();
        let implementation = self.implementation.clone();
        Arc::new(move |_| {
            let registry = upgrade(&scope)?;
            Ok(registry.to_public(&implementation.get_static(&name)?))
        })
    }

    // ========================================================================
    // Instance delegates
    // ========================================================================

    fn instance_method(&self, f: MethodFn) -> MethodFn {
        let scope = self.scope.clone();
        Arc::new(move |receiver, args| {
            let Some(target) = bound_implementation(receiver) else {
                return Ok(Value::Undefined);
            };
            let registry = upgrade(&scope)?;
            let args = registry.to_private_all(args);
            let result = f(&Value::Object(target), &args)?;
            Ok(registry.to_public(&result))
        })
    }

    fn instance_getter(&self, get: GetterFn) -> GetterFn {
        let scope = self.scope.clone();
        Arc::new(move |receiver| {
            let Some(target) = bound_implementation(receiver) else {
                return Ok(Value::Undefined);
            };
            let registry = upgrade(&scope)?;
            Ok(registry.to_public(&get(&Value::Object(target))?))
        })
    }

    fn instance_setter(&self, set: SetterFn) -> SetterFn {
        let scope = self.scope.clone();
        Arc::new(move |receiver, value| {
            let Some(target) = bound_implementation(receiver) else {
                return Ok(());
            };
            let registry = upgrade(&scope)?;
            set(&Value::Object(target), registry.to_private(&value))
        })
    }

    fn instance_value(&self, name: String) -> GetterFn {
        let scope = self.scope.clone();
        Arc::new(move |receiver| {
            let Some(target) = bound_implementation(receiver) else {
                return Ok(Value::Undefined);
            };
            let registry = upgrade(&scope)?;
            Ok(registry.to_public(&target.get(&name)?))
        })
    }
}

fn upgrade(scope: &WeakRegistry) -> FacadeResult<Registry> {
    scope.upgrade().ok_or(FacadeError::ScopeClosed)
}

/// Flags carried over to the façade member. Plain values become read-only.
fn facade_flags(member: &MemberDescriptor) -> MemberFlags {
    let source = member.flags;
    MemberFlags::NONE
        .configurable(source.configurable)
        .enumerable(source.enumerable)
        .writable(source.writable && member.kind.is_method())
}
