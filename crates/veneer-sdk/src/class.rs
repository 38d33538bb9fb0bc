//! Classes and the class builder
//!
//! A [`Class`] is a named constructor plus two member tables (static and
//! instance). Classes are shared through [`ClassRef`], whose equality is
//! pointer identity. Member tables stay mutable after construction so that
//! members can be defined or removed at run time.
//!
//! Like objects, classes have a set-once attachment slot for host data.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use crate::error::{FacadeError, FacadeResult};
use crate::member::{
    ConstructorFn, GetterFn, MemberDescriptor, MemberFlags, MemberKind, MemberTable, SetterFn,
};
use crate::object::ObjectRef;
use crate::value::Value;

/// Unique identifier for a class
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u64);

static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);

impl ClassId {
    fn next() -> Self {
        ClassId(NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric ID value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Which member table an operation targets
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Class-level members
    Static,
    /// Instance-level (prototype) members
    Instance,
}

/// Runtime class
pub struct Class {
    id: ClassId,
    name: String,
    parent: Option<ClassRef>,
    constructor: Option<ConstructorFn>,
    statics: RwLock<MemberTable>,
    prototype: RwLock<MemberTable>,
    sealed: bool,
    attachment: OnceCell<Box<dyn Any + Send + Sync>>,
}

impl Class {
    /// Class ID
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent class (None for root classes)
    pub fn parent(&self) -> Option<&ClassRef> {
        self.parent.as_ref()
    }

    /// Whether writes to undeclared names are rejected
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Whether the class can be constructed
    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    fn table(&self, scope: Scope) -> &RwLock<MemberTable> {
        match scope {
            Scope::Static => &self.statics,
            Scope::Instance => &self.prototype,
        }
    }

    /// Get an own member (not inherited)
    pub fn member(&self, scope: Scope, name: &str) -> Option<MemberDescriptor> {
        self.table(scope).read().get(name).cloned()
    }

    /// Own members in definition order (snapshot)
    pub fn members(&self, scope: Scope) -> Vec<MemberDescriptor> {
        self.table(scope).read().iter().cloned().collect()
    }

    /// Own member names in definition order
    pub fn member_names(&self, scope: Scope) -> Vec<String> {
        self.table(scope).read().names()
    }

    /// Define or replace an own member
    pub fn define(&self, scope: Scope, member: MemberDescriptor) {
        self.table(scope).write().insert(member);
    }

    /// Remove an own member
    pub fn remove(&self, scope: Scope, name: &str) -> Option<MemberDescriptor> {
        self.table(scope).write().remove(name)
    }

    /// Attach host data for the class's lifetime.
    ///
    /// Returns the data back if something is already attached.
    pub fn attach<T: Any + Send + Sync>(&self, data: T) -> Result<(), T> {
        let mut data = Some(data);
        self.attachment.get_or_init(|| match data.take() {
            Some(d) => Box::new(d),
            None => Box::new(()),
        });
        match data {
            None => Ok(()),
            Some(rejected) => Err(rejected),
        }
    }

    /// Borrow the attachment if it is a `T`
    pub fn attachment<T: Any>(&self) -> Option<&T> {
        self.attachment.get().and_then(|b| b.downcast_ref::<T>())
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name().to_string()))
            .field("statics", &self.statics.read().names())
            .field("prototype", &self.prototype.read().names())
            .field("sealed", &self.sealed)
            .field("attached", &self.attachment.get().is_some())
            .finish()
    }
}

/// Shared handle to a class; equality is identity
#[derive(Clone)]
pub struct ClassRef(Arc<Class>);

impl Deref for ClassRef {
    type Target = Class;

    fn deref(&self) -> &Class {
        &self.0
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ClassRef {}

impl Hash for ClassRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl ClassRef {
    /// Check two handles refer to the same class
    pub fn ptr_eq(a: &ClassRef, b: &ClassRef) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// The class chain from this class up to the root
    pub fn hierarchy(&self) -> Vec<ClassRef> {
        let mut chain = vec![self.clone()];
        let mut current = self.parent.clone();
        while let Some(class) = current {
            current = class.parent.clone();
            chain.push(class);
        }
        chain
    }

    /// Check if this class is `ancestor` or derives from it
    pub fn is_subclass_of(&self, ancestor: &ClassRef) -> bool {
        let mut current = Some(self.clone());
        while let Some(class) = current {
            if class == *ancestor {
                return true;
            }
            current = class.parent.clone();
        }
        false
    }

    /// Look up a member through the class chain; the nearest definition wins
    pub fn lookup(&self, scope: Scope, name: &str) -> Option<MemberDescriptor> {
        let mut current = Some(self.clone());
        while let Some(class) = current {
            if let Some(member) = class.member(scope, name) {
                return Some(member);
            }
            current = class.parent.clone();
        }
        None
    }

    /// Flatten own and inherited members.
    ///
    /// Nearer definitions shadow ancestors; order is nearest class first,
    /// then each ancestor's remaining members in definition order.
    pub fn collect_members(&self, scope: Scope) -> Vec<MemberDescriptor> {
        let mut seen = FxHashSet::default();
        let mut members = Vec::new();
        for class in self.hierarchy() {
            for member in class.members(scope) {
                if seen.insert(member.name.clone()) {
                    members.push(member);
                }
            }
        }
        members
    }

    /// Run the constructor with `args`
    pub fn construct(&self, args: &[Value]) -> FacadeResult<Value> {
        match &self.constructor {
            Some(ctor) => ctor(self, args),
            None => Err(FacadeError::NotConstructible(self.name.clone())),
        }
    }

    /// Allocate a bare instance without running the constructor
    pub fn instantiate(&self) -> ObjectRef {
        ObjectRef::new(self)
    }

    // ========================================================================
    // Static member protocol
    // ========================================================================

    /// Read a static member; missing members read as undefined
    pub fn get_static(&self, name: &str) -> FacadeResult<Value> {
        let receiver = Value::Class(self.clone());
        match self.lookup(Scope::Static, name) {
            None => Ok(Value::Undefined),
            Some(member) => read_member(&receiver, &self.name, member),
        }
    }

    /// Write a static member
    pub fn set_static(&self, name: &str, value: impl Into<Value>) -> FacadeResult<()> {
        let value = value.into();
        let receiver = Value::Class(self.clone());
        match self.lookup(Scope::Static, name) {
            Some(MemberDescriptor {
                kind: MemberKind::Accessor { set: Some(set), .. },
                ..
            }) => set(&receiver, value),
            Some(MemberDescriptor {
                kind: MemberKind::Value(_),
                flags,
                ..
            }) if flags.writable => {
                self.define(
                    Scope::Static,
                    MemberDescriptor::value(name, value).with_flags(flags),
                );
                Ok(())
            }
            Some(_) => Err(FacadeError::ReadOnly {
                class: self.name.clone(),
                name: name.to_string(),
            }),
            None if self.sealed => Err(FacadeError::MissingMember {
                class: self.name.clone(),
                name: name.to_string(),
            }),
            None => {
                self.define(Scope::Static, MemberDescriptor::value(name, value));
                Ok(())
            }
        }
    }

    /// Invoke a static method
    pub fn invoke_static(&self, name: &str, args: &[Value]) -> FacadeResult<Value> {
        let receiver = Value::Class(self.clone());
        match self.lookup(Scope::Static, name) {
            Some(MemberDescriptor {
                kind: MemberKind::Method(f),
                ..
            }) => f(&receiver, args),
            Some(_) => Err(FacadeError::NotCallable {
                class: self.name.clone(),
                name: name.to_string(),
            }),
            None => Err(FacadeError::MissingMember {
                class: self.name.clone(),
                name: name.to_string(),
            }),
        }
    }
}

/// Read a member on behalf of `receiver`
pub(crate) fn read_member(
    receiver: &Value,
    class_name: &str,
    member: MemberDescriptor,
) -> FacadeResult<Value> {
    match member.kind {
        MemberKind::Value(v) => Ok(v),
        MemberKind::Accessor { get: Some(get), .. } => get(receiver),
        MemberKind::Accessor { get: None, .. } => Ok(Value::Undefined),
        MemberKind::Method(_) => Err(FacadeError::TypeMismatch {
            expected: format!("readable member '{}' of {}", member.name, class_name),
            got: "method".to_string(),
        }),
    }
}

// ============================================================================
// Class builder
// ============================================================================

/// Builder for declaring a class manifest
pub struct ClassBuilder {
    name: String,
    parent: Option<ClassRef>,
    constructor: Option<ConstructorFn>,
    statics: MemberTable,
    prototype: MemberTable,
    sealed: bool,
}

impl ClassBuilder {
    /// Start a class with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            constructor: None,
            statics: MemberTable::new(),
            prototype: MemberTable::new(),
            sealed: false,
        }
    }

    /// Derive from `parent`
    pub fn extends(mut self, parent: &ClassRef) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Set the constructor
    pub fn constructor<F>(mut self, f: F) -> Self
    where
        F: Fn(&ClassRef, &[Value]) -> FacadeResult<Value> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(f));
        self
    }

    /// Constructor that allocates a bare instance and ignores arguments
    pub fn default_constructor(self) -> Self {
        self.constructor(|class, _args| Ok(Value::Object(class.instantiate())))
    }

    /// Reject writes to undeclared names on the class and its instances
    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }

    /// Add an instance method
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> FacadeResult<Value> + Send + Sync + 'static,
    {
        self.prototype.insert(MemberDescriptor::method(name, f));
        self
    }

    /// Add a static method
    pub fn static_method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> FacadeResult<Value> + Send + Sync + 'static,
    {
        self.statics.insert(MemberDescriptor::method(name, f));
        self
    }

    /// Add an instance getter-only accessor
    pub fn getter<G>(mut self, name: impl Into<String>, get: G) -> Self
    where
        G: Fn(&Value) -> FacadeResult<Value> + Send + Sync + 'static,
    {
        let get: GetterFn = Arc::new(get);
        self.prototype
            .insert(MemberDescriptor::accessor(name, Some(get), None));
        self
    }

    /// Add an instance accessor pair
    pub fn accessor<G, S>(mut self, name: impl Into<String>, get: G, set: S) -> Self
    where
        G: Fn(&Value) -> FacadeResult<Value> + Send + Sync + 'static,
        S: Fn(&Value, Value) -> FacadeResult<()> + Send + Sync + 'static,
    {
        let get: GetterFn = Arc::new(get);
        let set: SetterFn = Arc::new(set);
        self.prototype
            .insert(MemberDescriptor::accessor(name, Some(get), Some(set)));
        self
    }

    /// Add a static accessor pair
    pub fn static_accessor<G, S>(mut self, name: impl Into<String>, get: G, set: S) -> Self
    where
        G: Fn(&Value) -> FacadeResult<Value> + Send + Sync + 'static,
        S: Fn(&Value, Value) -> FacadeResult<()> + Send + Sync + 'static,
    {
        let get: GetterFn = Arc::new(get);
        let set: SetterFn = Arc::new(set);
        self.statics
            .insert(MemberDescriptor::accessor(name, Some(get), Some(set)));
        self
    }

    /// Add an instance (prototype) plain value
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.prototype.insert(MemberDescriptor::value(name, value));
        self
    }

    /// Add a static plain value
    pub fn static_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.statics.insert(MemberDescriptor::value(name, value));
        self
    }

    /// Add a member with explicit kind and flags
    pub fn member(mut self, scope: Scope, member: MemberDescriptor) -> Self {
        match scope {
            Scope::Static => self.statics.insert(member),
            Scope::Instance => self.prototype.insert(member),
        }
        self
    }

    /// Finish the class
    pub fn build(self) -> ClassRef {
        ClassRef(Arc::new(Class {
            id: ClassId::next(),
            name: self.name,
            parent: self.parent,
            constructor: self.constructor,
            statics: RwLock::new(self.statics),
            prototype: RwLock::new(self.prototype),
            sealed: self.sealed,
            attachment: OnceCell::new(),
        }))
    }
}

/// Flags of a member, or none when missing
pub fn member_flags(class: &ClassRef, scope: Scope, name: &str) -> Option<MemberFlags> {
    class.lookup(scope, name).map(|m| m.flags)
}
