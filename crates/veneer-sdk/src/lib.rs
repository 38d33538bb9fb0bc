//! Veneer SDK - the object model that façades are compiled over
//!
//! This crate provides the runtime types the façade engine operates on:
//! dynamically typed [`Value`]s, [`ClassRef`] classes with static and
//! instance member manifests, [`ObjectRef`] instances and settle-once
//! [`Pending`] results. It has no knowledge of façades itself.
//!
//! # Example
//!
//! ```ignore
//! use veneer_sdk::{arg, ClassBuilder, Value};
//!
//! let counter = ClassBuilder::new("Counter")
//!     .constructor(|class, _args| {
//!         let obj = class.instantiate();
//!         obj.set_field("_count", 0i64);
//!         Ok(Value::Object(obj))
//!     })
//!     .method("increment", |this, args| {
//!         let this = this.as_object().cloned().ok_or("receiver is not an object")?;
//!         let by: i64 = arg(args, 0)?;
//!         let count = this.get("_count")?.as_int().unwrap_or(0);
//!         this.set("_count", count + by)?;
//!         Ok(Value::Object(this))
//!     })
//!     .build();
//! ```

#![warn(missing_docs)]

pub mod class;
pub mod convert;
pub mod error;
pub mod member;
pub mod object;
pub mod pending;
pub mod value;

pub use class::{member_flags, Class, ClassBuilder, ClassId, ClassRef, Scope};
pub use convert::{arg, FromValue};
pub use error::{FacadeError, FacadeResult};
pub use member::{
    ConstructorFn, GetterFn, MemberDescriptor, MemberFlags, MemberKind, MemberTable, MethodFn,
    SetterFn,
};
pub use object::{Object, ObjectId, ObjectRef, WeakObjectRef};
pub use pending::{Outcome, Pending, PendingId, Resolver};
pub use value::Value;
