//! Veneer Engine
//!
//! Derives restricted *façade* classes from implementation classes and
//! bridges values between the two:
//! - **Compiler**: synthesizes one sealed façade class per implementation
//!   class and registry (`compiler` module)
//! - **Bridge**: binds façade instances to implementation instances
//!   (`bridge` module)
//! - **Translator**: rewrites arguments and results crossing the boundary,
//!   through sequences and pending results (`translate` module)
//! - **Registry**: the identity tables behind all of the above (`registry`
//!   module), process-wide (`shared`) or isolated
//!
//! # Example
//!
//! ```rust,ignore
//! use veneer_engine::{compile, Value};
//!
//! let facade = compile(&Value::from(&counter_impl))?;
//! let c1 = facade.invoke_static("create", &[])?;
//! let c1 = c1.as_object().unwrap();
//! assert_eq!(c1.invoke("increment", &[Value::int(5)])?, Value::from(c1));
//! assert!(c1.get("_count")?.is_undefined());
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bridge;
pub mod compiler;
pub mod config;
pub mod error;
pub mod registry;
pub mod shared;
pub mod translate;

pub use bridge::{bound_implementation, lookup, registry_of, Binding};
pub use config::{FacadeConfig, Retention, DEFAULT_INTERNAL_MARKER, DEFAULT_RESERVED_NAMES};
pub use error::{ConfigError, FacadeError, FacadeResult};
pub use registry::{Registry, RegistryStats, WeakRegistry};
pub use shared::{compile, resolve, shared, to_private, to_public, wrap};

pub use veneer_sdk::{ClassBuilder, ClassRef, ObjectRef, Pending, Scope, Value};
