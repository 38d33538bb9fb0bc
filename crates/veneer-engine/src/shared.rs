//! Process-wide façade scope
//!
//! One lazily created registry with weak instance retention, used by the
//! free functions of this module. Isolated scopes use [`Registry`] directly.

use once_cell::sync::Lazy;
use veneer_sdk::{ClassRef, FacadeResult, ObjectRef, Value};

use crate::registry::Registry;

static SHARED: Lazy<Registry> = Lazy::new(|| {
    tracing::debug!("initializing shared facade registry");
    Registry::default()
});

/// The process-wide registry
pub fn shared() -> &'static Registry {
    &SHARED
}

/// Compile `target` in the process-wide scope
pub fn compile(target: &Value) -> FacadeResult<ClassRef> {
    shared().compile(target)
}

/// Façade instance for `implementation`, wrapping on demand, process-wide scope
pub fn resolve(facade: &ClassRef, implementation: &ObjectRef) -> FacadeResult<ObjectRef> {
    shared().resolve(facade, implementation)
}

/// Bind a new façade instance to `implementation`, process-wide scope
pub fn wrap(facade: &ClassRef, implementation: &ObjectRef) -> FacadeResult<ObjectRef> {
    shared().wrap(facade, implementation)
}

/// Translate a value leaving the implementation, process-wide scope
pub fn to_public(value: &Value) -> Value {
    shared().to_public(value)
}

/// Translate a value entering the implementation, process-wide scope
pub fn to_private(value: &Value) -> Value {
    shared().to_private(value)
}
