//! Identity registry
//!
//! A [`Registry`] owns four mappings:
//!
//! ```text
//! facade_classes:           implementation ClassId -> façade class
//! implementation_classes:   façade ClassId         -> implementation class
//! facade_instances:         implementation ObjectId -> façade instance
//! implementation_instances: façade ObjectId         -> implementation instance
//! ```
//!
//! Class entries live as long as the registry. Instance entries follow the
//! registry's [`Retention`] policy: strong slots keep both instances alive,
//! weak slots keep neither and are removed when the façade instance drops.
//!
//! All tables sit behind one mutex, which is always taken last. A façade
//! instance can drop while a class member table is write-locked (replacing a
//! static value), and its binding then takes the mutex. So no class table
//! lock is taken while the mutex is held, and no user code runs under it.
//! Handles that may be the last reference to a façade instance are returned
//! from the table methods and dropped after unlocking.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use veneer_sdk::{ClassId, ClassRef, ObjectId, ObjectRef, WeakObjectRef};

use crate::config::{FacadeConfig, Retention};
use crate::error::ConfigError;

/// Handle held by one side of an instance pair
#[derive(Debug)]
enum Handle {
    Strong(ObjectRef),
    Weak(WeakObjectRef),
}

/// One instance-table entry; `id` names the object the handle points at
#[derive(Debug)]
pub(crate) struct InstanceSlot {
    id: ObjectId,
    handle: Handle,
}

impl InstanceSlot {
    fn new(object: &ObjectRef, retention: Retention) -> Self {
        let handle = match retention {
            Retention::Strong => Handle::Strong(object.clone()),
            Retention::Weak => Handle::Weak(object.downgrade()),
        };
        Self {
            id: object.id(),
            handle,
        }
    }

    fn get(&self) -> Option<ObjectRef> {
        match &self.handle {
            Handle::Strong(obj) => Some(obj.clone()),
            Handle::Weak(weak) => weak.upgrade(),
        }
    }

    fn is_alive(&self) -> bool {
        match &self.handle {
            Handle::Strong(_) => true,
            Handle::Weak(weak) => weak.is_alive(),
        }
    }
}

/// Registry tables, guarded by the registry mutex
#[derive(Debug, Default)]
pub(crate) struct Tables {
    facade_classes: FxHashMap<ClassId, ClassRef>,
    implementation_classes: FxHashMap<ClassId, ClassRef>,
    facade_instances: FxHashMap<ObjectId, InstanceSlot>,
    implementation_instances: FxHashMap<ObjectId, InstanceSlot>,
}

impl Tables {
    pub(crate) fn facade_class(&self, implementation: ClassId) -> Option<&ClassRef> {
        self.facade_classes.get(&implementation)
    }

    pub(crate) fn implementation_class(&self, facade: ClassId) -> Option<&ClassRef> {
        self.implementation_classes.get(&facade)
    }

    pub(crate) fn register_classes(&mut self, implementation: &ClassRef, facade: &ClassRef) {
        self.facade_classes
            .insert(implementation.id(), facade.clone());
        self.implementation_classes
            .insert(facade.id(), implementation.clone());
    }

    /// Live façade instance paired with an implementation instance
    pub(crate) fn facade_instance(&self, implementation: ObjectId) -> Option<ObjectRef> {
        self.facade_instances.get(&implementation).and_then(InstanceSlot::get)
    }

    pub(crate) fn has_live_facade(&self, implementation: ObjectId) -> bool {
        self.facade_instances
            .get(&implementation)
            .is_some_and(InstanceSlot::is_alive)
    }

    pub(crate) fn implementation_instance(&self, facade: ObjectId) -> Option<ObjectRef> {
        self.implementation_instances.get(&facade).and_then(InstanceSlot::get)
    }

    /// Record an instance pair. Returns replaced (dead) slots so the caller
    /// can drop them after releasing the lock.
    pub(crate) fn register_instances(
        &mut self,
        implementation: &ObjectRef,
        facade: &ObjectRef,
        retention: Retention,
    ) -> Vec<InstanceSlot> {
        let mut replaced = Vec::new();
        replaced.extend(
            self.facade_instances
                .insert(implementation.id(), InstanceSlot::new(facade, retention)),
        );
        replaced.extend(
            self.implementation_instances
                .insert(facade.id(), InstanceSlot::new(implementation, retention)),
        );
        replaced
    }

    /// Remove the pair owned by façade instance `facade`.
    ///
    /// The implementation-side entry is only removed while it still points
    /// at `facade`; a newer pairing for the same implementation instance is
    /// left alone.
    pub(crate) fn unbind(&mut self, implementation: ObjectId, facade: ObjectId) -> Vec<InstanceSlot> {
        let mut removed = Vec::new();
        if self
            .facade_instances
            .get(&implementation)
            .is_some_and(|slot| slot.id == facade)
        {
            removed.extend(self.facade_instances.remove(&implementation));
        }
        removed.extend(self.implementation_instances.remove(&facade));
        removed
    }

    /// Remove every entry whose handle is dead
    fn prune(&mut self) -> Vec<InstanceSlot> {
        let mut dead = Vec::new();
        for table in [&mut self.facade_instances, &mut self.implementation_instances] {
            let keys: Vec<ObjectId> = table
                .iter()
                .filter(|(_, slot)| !slot.is_alive())
                .map(|(id, _)| *id)
                .collect();
            dead.extend(keys.iter().filter_map(|id| table.remove(id)));
        }
        dead
    }

    fn live_pairs(&self) -> usize {
        self.facade_instances
            .values()
            .filter(|slot| slot.is_alive())
            .count()
    }
}

pub(crate) struct RegistryInner {
    pub(crate) config: FacadeConfig,
    pub(crate) tables: Mutex<Tables>,
}

/// Identity registry: façade scope for classes and instances.
///
/// Cheap to clone; clones share the same tables.
#[derive(Clone)]
pub struct Registry {
    pub(crate) inner: Arc<RegistryInner>,
}

/// Non-owning registry handle, held by synthesized façade members
#[derive(Clone)]
pub struct WeakRegistry(Weak<RegistryInner>);

/// Registry size snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Compiled façade classes
    pub classes: usize,
    /// Live instance pairs
    pub instances: usize,
    /// Instance table entries, including dead weak entries
    pub entries: usize,
}

impl Registry {
    /// Create a registry with a validated configuration
    pub fn new(config: FacadeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    /// Create an isolated registry that retains every instance pair
    pub fn isolated() -> Self {
        Self::with_valid_config(FacadeConfig::default().with_retention(Retention::Strong))
    }

    pub(crate) fn with_valid_config(config: FacadeConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                config,
                tables: Mutex::new(Tables::default()),
            }),
        }
    }

    /// Registry configuration
    pub fn config(&self) -> &FacadeConfig {
        &self.inner.config
    }

    /// Instance retention policy
    pub fn retention(&self) -> Retention {
        self.inner.config.retention
    }

    /// Create a non-owning handle
    pub fn downgrade(&self) -> WeakRegistry {
        WeakRegistry(Arc::downgrade(&self.inner))
    }

    /// Check two handles refer to the same registry
    pub fn ptr_eq(a: &Registry, b: &Registry) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Façade class compiled for `implementation`, if any
    pub fn facade_of(&self, implementation: &ClassRef) -> Option<ClassRef> {
        self.inner
            .tables
            .lock()
            .facade_class(implementation.id())
            .cloned()
    }

    /// Implementation class behind façade class `facade`, if any
    pub fn implementation_of(&self, facade: &ClassRef) -> Option<ClassRef> {
        self.inner
            .tables
            .lock()
            .implementation_class(facade.id())
            .cloned()
    }

    /// Check if `class` is a façade class of this registry
    pub fn is_facade(&self, class: &ClassRef) -> bool {
        self.inner
            .tables
            .lock()
            .implementation_class(class.id())
            .is_some()
    }

    /// Live façade instance paired with `implementation`, if any
    pub fn facade_instance_of(&self, implementation: &ObjectRef) -> Option<ObjectRef> {
        self.inner.tables.lock().facade_instance(implementation.id())
    }

    /// Implementation instance bound to façade instance `facade`, if any
    pub fn implementation_instance_of(&self, facade: &ObjectRef) -> Option<ObjectRef> {
        self.inner.tables.lock().implementation_instance(facade.id())
    }

    /// Nearest class in `class`'s chain that has a façade, with that façade
    pub(crate) fn nearest_facade(&self, class: &ClassRef) -> Option<ClassRef> {
        let tables = self.inner.tables.lock();
        class
            .hierarchy()
            .iter()
            .find_map(|c| tables.facade_class(c.id()).cloned())
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Size snapshot
    pub fn stats(&self) -> RegistryStats {
        let tables = self.inner.tables.lock();
        RegistryStats {
            classes: tables.facade_classes.len(),
            instances: tables.live_pairs(),
            entries: tables.facade_instances.len(),
        }
    }

    /// Drop instance entries whose objects are gone; returns how many were removed
    pub fn prune(&self) -> usize {
        let dead = self.inner.tables.lock().prune();
        let count = dead.len();
        drop(dead);
        if count > 0 {
            tracing::trace!(count, "pruned dead instance entries");
        }
        count
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_valid_config(FacadeConfig::default())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("retention", &self.retention())
            .field("stats", &self.stats())
            .finish()
    }
}

impl WeakRegistry {
    /// Upgrade if the registry is still alive
    pub fn upgrade(&self) -> Option<Registry> {
        self.0.upgrade().map(|inner| Registry { inner })
    }

    /// Check if this handle refers to `registry`
    pub fn is(&self, registry: &Registry) -> bool {
        std::ptr::eq(self.0.as_ptr(), Arc::as_ptr(&registry.inner))
    }
}

impl fmt::Debug for WeakRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakRegistry(alive: {})", self.0.strong_count() > 0)
    }
}
