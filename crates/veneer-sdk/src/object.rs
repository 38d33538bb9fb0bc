//! Class instances
//!
//! An [`Object`] has an identity, a class, a table of own fields and one
//! set-once attachment slot. Member access follows the usual order: own
//! fields first, then instance members through the class chain.
//!
//! The attachment slot holds host data bound to the object for its whole
//! lifetime (the façade engine stores an instance's binding there). Once
//! set it can never be replaced, and it is dropped together with the object.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::class::{read_member, ClassRef, Scope};
use crate::error::{FacadeError, FacadeResult};
use crate::member::{MemberDescriptor, MemberKind};
use crate::value::Value;

/// Unique identifier for an object
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

impl ObjectId {
    fn next() -> Self {
        ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric ID value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Class instance
pub struct Object {
    id: ObjectId,
    class: ClassRef,
    fields: RwLock<FxHashMap<String, Value>>,
    attachment: OnceCell<Box<dyn Any + Send + Sync>>,
}

/// Shared handle to an object; equality is identity
#[derive(Clone)]
pub struct ObjectRef(Arc<Object>);

/// Non-owning handle to an object
#[derive(Clone)]
pub struct WeakObjectRef(Weak<Object>);

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ObjectRef {}

impl Hash for ObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.0.id)
            .field("class", &self.0.class.name())
            .field("fields", &*self.0.fields.read())
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl ObjectRef {
    /// Allocate a bare instance of `class` (no constructor runs)
    pub fn new(class: &ClassRef) -> Self {
        ObjectRef(Arc::new(Object {
            id: ObjectId::next(),
            class: class.clone(),
            fields: RwLock::new(FxHashMap::default()),
            attachment: OnceCell::new(),
        }))
    }

    /// Object ID
    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    /// The object's class
    pub fn class(&self) -> &ClassRef {
        &self.0.class
    }

    /// Check two handles refer to the same object
    pub fn ptr_eq(a: &ObjectRef, b: &ObjectRef) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Create a non-owning handle
    pub fn downgrade(&self) -> WeakObjectRef {
        WeakObjectRef(Arc::downgrade(&self.0))
    }

    /// Check if the object's class is `class` or derives from it
    pub fn is_instance_of(&self, class: &ClassRef) -> bool {
        self.0.class.is_subclass_of(class)
    }

    // ========================================================================
    // Own fields
    // ========================================================================

    /// Read an own field
    pub fn field(&self, name: &str) -> Option<Value> {
        self.0.fields.read().get(name).cloned()
    }

    /// Write an own field, bypassing the member protocol
    pub fn set_field(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.fields.write().insert(name.into(), value.into());
    }

    /// Check if an own field exists
    pub fn has_field(&self, name: &str) -> bool {
        self.0.fields.read().contains_key(name)
    }

    /// Own field names (unordered)
    pub fn field_names(&self) -> Vec<String> {
        self.0.fields.read().keys().cloned().collect()
    }

    // ========================================================================
    // Member protocol
    // ========================================================================

    /// Check if a name resolves to an own field or an instance member
    pub fn has(&self, name: &str) -> bool {
        self.has_field(name) || self.0.class.lookup(Scope::Instance, name).is_some()
    }

    /// Read a member; missing names read as undefined
    pub fn get(&self, name: &str) -> FacadeResult<Value> {
        if let Some(value) = self.field(name) {
            return Ok(value);
        }
        match self.0.class.lookup(Scope::Instance, name) {
            None => Ok(Value::Undefined),
            Some(member) => read_member(&Value::Object(self.clone()), self.0.class.name(), member),
        }
    }

    /// Write a member
    ///
    /// Accessors run their setter; writable values are shadowed by an own
    /// field; everything else declared is read-only. Undeclared names become
    /// own fields unless the class is sealed.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> FacadeResult<()> {
        let value = value.into();
        if self.has_field(name) {
            self.set_field(name, value);
            return Ok(());
        }
        match self.0.class.lookup(Scope::Instance, name) {
            Some(MemberDescriptor {
                kind: MemberKind::Accessor { set: Some(set), .. },
                ..
            }) => set(&Value::Object(self.clone()), value),
            Some(MemberDescriptor {
                kind: MemberKind::Value(_),
                flags,
                ..
            }) if flags.writable && !self.0.class.is_sealed() => {
                self.set_field(name, value);
                Ok(())
            }
            Some(_) => Err(FacadeError::ReadOnly {
                class: self.0.class.name().to_string(),
                name: name.to_string(),
            }),
            None if self.0.class.is_sealed() => Err(FacadeError::MissingMember {
                class: self.0.class.name().to_string(),
                name: name.to_string(),
            }),
            None => {
                self.set_field(name, value);
                Ok(())
            }
        }
    }

    /// Invoke an instance method
    pub fn invoke(&self, name: &str, args: &[Value]) -> FacadeResult<Value> {
        match self.0.class.lookup(Scope::Instance, name) {
            Some(MemberDescriptor {
                kind: MemberKind::Method(f),
                ..
            }) => f(&Value::Object(self.clone()), args),
            Some(_) => Err(FacadeError::NotCallable {
                class: self.0.class.name().to_string(),
                name: name.to_string(),
            }),
            None => Err(FacadeError::MissingMember {
                class: self.0.class.name().to_string(),
                name: name.to_string(),
            }),
        }
    }

    // ========================================================================
    // Attachment slot
    // ========================================================================

    /// Attach host data for the object's lifetime.
    ///
    /// Returns the data back if something is already attached.
    pub fn attach<T: Any + Send + Sync>(&self, data: T) -> Result<(), T> {
        let mut data = Some(data);
        self.0.attachment.get_or_init(|| match data.take() {
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
        self.0.attachment.get().and_then(|b| b.downcast_ref::<T>())
    }

    /// Check if anything is attached
    pub fn is_attached(&self) -> bool {
        self.0.attachment.get().is_some()
    }
}

impl WeakObjectRef {
    /// Upgrade to a strong handle if the object is still alive
    pub fn upgrade(&self) -> Option<ObjectRef> {
        self.0.upgrade().map(ObjectRef)
    }

    /// Check if the object is still alive
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl fmt::Debug for WeakObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakObjectRef(alive: {})", self.is_alive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassBuilder;
    use crate::convert::arg;
    use crate::member::MemberFlags;

    fn counter() -> ClassRef {
        ClassBuilder::new("Counter")
            .constructor(|class, _| {
                let obj = class.instantiate();
                obj.set_field("_count", 0i64);
                Ok(obj.into())
            })
            .method("increment", |this, args| {
                let obj = this.as_object().ok_or("receiver is not an object")?;
                let by = arg::<i64>(args, 0)?;
                let current = obj.field("_count").and_then(|v| v.as_int()).unwrap_or(0);
                obj.set_field("_count", current + by);
                Ok(this.clone())
            })
            .getter("count", |this| {
                let obj = this.as_object().ok_or("receiver is not an object")?;
                Ok(obj.field("_count").unwrap_or_default())
            })
            .value("unit", "ticks")
            .build()
    }

    #[test]
    fn test_object_ids_are_unique() {
        let class = counter();
        let a = class.instantiate();
        let b = class.instantiate();
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
        assert!(ObjectRef::ptr_eq(&a, &a.clone()));
    }

    #[test]
    fn test_member_protocol() {
        let class = counter();
        let obj = class.construct(&[]).unwrap();
        let obj = obj.as_object().unwrap();

        let result = obj.invoke("increment", &[Value::int(5)]).unwrap();
        assert_eq!(result, Value::Object(obj.clone()));
        assert_eq!(obj.get("count").unwrap(), Value::int(5));
        assert_eq!(obj.get("_count").unwrap(), Value::int(5));
        assert_eq!(obj.get("unit").unwrap(), Value::string("ticks"));
        assert_eq!(obj.get("missing").unwrap(), Value::Undefined);
        assert!(obj.get("increment").is_err());
    }

    #[test]
    fn test_set_rules() {
        let class = counter();
        let obj = class.instantiate();

        assert!(matches!(obj.set("count", 3i64), Err(FacadeError::ReadOnly { .. })));
        assert!(matches!(obj.set("increment", 3i64), Err(FacadeError::ReadOnly { .. })));

        obj.set("unit", "seconds").unwrap();
        assert_eq!(obj.get("unit").unwrap(), Value::string("seconds"));
        assert_eq!(class.member(Scope::Instance, "unit").map(|m| m.flags), Some(MemberFlags::DATA));

        obj.set("extra", true).unwrap();
        assert_eq!(obj.field("extra"), Some(Value::bool(true)));
    }

    #[test]
    fn test_sealed_rejects_undeclared() {
        let class = ClassBuilder::new("Locked").sealed().build();
        let obj = class.instantiate();
        assert!(matches!(
            obj.set("anything", 1i64),
            Err(FacadeError::MissingMember { .. })
        ));
    }

    #[test]
    fn test_invoke_errors() {
        let class = counter();
        let obj = class.instantiate();
        assert!(matches!(obj.invoke("count", &[]), Err(FacadeError::NotCallable { .. })));
        assert!(matches!(obj.invoke("nope", &[]), Err(FacadeError::MissingMember { .. })));
        assert!(matches!(
            obj.invoke("increment", &[Value::string("x")]),
            Err(FacadeError::ArgumentError(_))
        ));
    }

    #[test]
    fn test_attach_once() {
        let class = counter();
        let obj = class.instantiate();
        assert!(!obj.is_attached());
        assert_eq!(obj.attach(7u32), Ok(()));
        assert_eq!(obj.attach(8u32), Err(8));
        assert_eq!(obj.attachment::<u32>(), Some(&7));
        assert_eq!(obj.attachment::<String>(), None);
    }

    #[test]
    fn test_weak_handle() {
        let class = counter();
        let obj = class.instantiate();
        let weak = obj.downgrade();
        assert!(weak.is_alive());
        assert_eq!(weak.upgrade(), Some(obj.clone()));
        drop(obj);
        assert!(!weak.is_alive());
        assert!(weak.upgrade().is_none());
    }
}
