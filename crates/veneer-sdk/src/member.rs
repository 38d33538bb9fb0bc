//! Member descriptors: the manifest of a class
//!
//! A class carries two member tables, one for static members and one for
//! instance (prototype) members. Each entry is a [`MemberDescriptor`]:
//! a name, a [`MemberKind`] (plain value, accessor pair or method) and
//! [`MemberFlags`]. The façade compiler reads these tables to decide what
//! to expose and how to delegate.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::class::ClassRef;
use crate::error::FacadeResult;
use crate::value::Value;

// ============================================================================
// Callable signatures
// ============================================================================

/// Method body: `(receiver, args) -> result`.
///
/// The receiver is `Value::Object` for instance methods and `Value::Class`
/// for static methods.
pub type MethodFn = Arc<dyn Fn(&Value, &[Value]) -> FacadeResult<Value> + Send + Sync>;

/// Accessor getter: `(receiver) -> value`
pub type GetterFn = Arc<dyn Fn(&Value) -> FacadeResult<Value> + Send + Sync>;

/// Accessor setter: `(receiver, value)`
pub type SetterFn = Arc<dyn Fn(&Value, Value) -> FacadeResult<()> + Send + Sync>;

/// Constructor: `(class being constructed, args) -> instance`
pub type ConstructorFn = Arc<dyn Fn(&ClassRef, &[Value]) -> FacadeResult<Value> + Send + Sync>;

// ============================================================================
// Flags
// ============================================================================

/// Visibility and mutability flags of a member.
///
/// The default is maximally restrictive: every flag off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MemberFlags {
    /// Member may be redefined or removed
    pub configurable: bool,
    /// Member shows up in enumeration
    pub enumerable: bool,
    /// Plain value may be reassigned
    pub writable: bool,
}

impl MemberFlags {
    /// All flags off
    pub const NONE: MemberFlags = MemberFlags {
        configurable: false,
        enumerable: false,
        writable: false,
    };

    /// All flags on (ordinary data property)
    pub const DATA: MemberFlags = MemberFlags {
        configurable: true,
        enumerable: true,
        writable: true,
    };

    /// Defaults for a declared method: configurable and writable, not enumerable
    pub const METHOD: MemberFlags = MemberFlags {
        configurable: true,
        enumerable: false,
        writable: true,
    };

    /// Defaults for a declared accessor: configurable only
    pub const ACCESSOR: MemberFlags = MemberFlags {
        configurable: true,
        enumerable: false,
        writable: false,
    };

    /// Set the configurable flag
    pub const fn configurable(mut self, on: bool) -> Self {
        self.configurable = on;
        self
    }

    /// Set the enumerable flag
    pub const fn enumerable(mut self, on: bool) -> Self {
        self.enumerable = on;
        self
    }

    /// Set the writable flag
    pub const fn writable(mut self, on: bool) -> Self {
        self.writable = on;
        self
    }
}

// ============================================================================
// Member kind
// ============================================================================

/// What a member is
#[derive(Clone)]
pub enum MemberKind {
    /// Plain value
    Value(Value),
    /// Getter/setter pair; either half may be missing
    Accessor {
        /// Getter (reads yield undefined when missing)
        get: Option<GetterFn>,
        /// Setter (writes are rejected when missing)
        set: Option<SetterFn>,
    },
    /// Callable
    Method(MethodFn),
}

impl MemberKind {
    /// Kind name for diagnostics
    pub const fn kind_name(&self) -> &'static str {
        match self {
            MemberKind::Value(_) => "value",
            MemberKind::Accessor { .. } => "accessor",
            MemberKind::Method(_) => "method",
        }
    }

    /// Check if this is a method
    pub const fn is_method(&self) -> bool {
        matches!(self, MemberKind::Method(_))
    }

    /// Check if this is an accessor pair
    pub const fn is_accessor(&self) -> bool {
        matches!(self, MemberKind::Accessor { .. })
    }
}

impl fmt::Debug for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Value(v) => write!(f, "Value({:?})", v),
            MemberKind::Accessor { get, set } => write!(
                f,
                "Accessor {{ get: {}, set: {} }}",
                get.is_some(),
                set.is_some()
            ),
            MemberKind::Method(_) => write!(f, "Method"),
        }
    }
}

// ============================================================================
// Descriptor
// ============================================================================

/// One entry of a class manifest
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    /// Member name
    pub name: String,
    /// Member kind
    pub kind: MemberKind,
    /// Flags
    pub flags: MemberFlags,
}

impl MemberDescriptor {
    /// Create a plain value member with data flags
    pub fn value(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Value(value.into()),
            flags: MemberFlags::DATA,
        }
    }

    /// Create a method member with method flags
    pub fn method<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> FacadeResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: MemberKind::Method(Arc::new(f)),
            flags: MemberFlags::METHOD,
        }
    }

    /// Create an accessor member with accessor flags
    pub fn accessor(
        name: impl Into<String>,
        get: Option<GetterFn>,
        set: Option<SetterFn>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Accessor { get, set },
            flags: MemberFlags::ACCESSOR,
        }
    }

    /// Replace the flags
    pub fn with_flags(mut self, flags: MemberFlags) -> Self {
        self.flags = flags;
        self
    }
}

// ============================================================================
// Member table
// ============================================================================

/// Ordered member table with name lookup
#[derive(Debug, Clone, Default)]
pub struct MemberTable {
    members: Vec<MemberDescriptor>,
    indices: FxHashMap<String, usize>,
}

impl MemberTable {
    /// Create new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a member, replacing any member of the same name in place
    pub fn insert(&mut self, member: MemberDescriptor) {
        if let Some(&index) = self.indices.get(&member.name) {
            self.members[index] = member;
        } else {
            self.indices.insert(member.name.clone(), self.members.len());
            self.members.push(member);
        }
    }

    /// Remove a member by name
    pub fn remove(&mut self, name: &str) -> Option<MemberDescriptor> {
        let index = self.indices.remove(name)?;
        let removed = self.members.remove(index);
        for member in &self.members[index..] {
            if let Some(slot) = self.indices.get_mut(&member.name) {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    /// Get member by name
    pub fn get(&self, name: &str) -> Option<&MemberDescriptor> {
        self.indices.get(name).map(|&i| &self.members[i])
    }

    /// Get mutable member by name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut MemberDescriptor> {
        match self.indices.get(name) {
            Some(&i) => self.members.get_mut(i),
            None => None,
        }
    }

    /// Check if member exists
    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    /// Member names in definition order
    pub fn names(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name.clone()).collect()
    }

    /// Iterate members in definition order
    pub fn iter(&self) -> impl Iterator<Item = &MemberDescriptor> {
        self.members.iter()
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if table is empty
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
