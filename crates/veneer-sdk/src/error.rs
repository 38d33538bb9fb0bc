//! Error types for the Veneer object model and façade engine

/// Result type for object model and façade operations
pub type FacadeResult<T> = Result<T, FacadeError>;

/// Façade and object model error types
///
/// `Clone` because a settled [`Pending`](crate::Pending) hands the same
/// outcome to every observer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FacadeError {
    /// Compilation requested on something that is not a constructible class
    #[error("Not a class: expected a constructible class, got {got}")]
    NotAClass {
        /// Description of the offending value
        got: String,
    },

    /// Wrap attempted on an implementation instance that already has a façade
    #[error("Implementation instance #{instance} of {class} is already bound to a facade")]
    AlreadyBound {
        /// Implementation class name
        class: String,
        /// Implementation instance id
        instance: u64,
    },

    /// Lookup or wrap of an instance outside the wrapped class hierarchy
    #[error("Unrelated instance: expected an instance of {expected}, got {got}")]
    UnrelatedInstance {
        /// Wrapped implementation class name
        expected: String,
        /// Class name of the offending instance
        got: String,
    },

    /// Bridge operation on a class that is not a façade of this registry
    #[error("Class {0} is not a facade in this registry")]
    NotAFacade(String),

    /// Class has no constructor
    #[error("Class {0} cannot be constructed")]
    NotConstructible(String),

    /// No member with that name on the class or instance
    #[error("{class} has no member named '{name}'")]
    MissingMember {
        /// Class name
        class: String,
        /// Member name
        name: String,
    },

    /// Invoke on a member that is not a method
    #[error("Member '{name}' of {class} is not callable")]
    NotCallable {
        /// Class name
        class: String,
        /// Member name
        name: String,
    },

    /// Write to a member without a setter or without the writable flag
    #[error("Member '{name}' of {class} is read-only")]
    ReadOnly {
        /// Class name
        class: String,
        /// Member name
        name: String,
    },

    /// Type mismatch during conversion
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Invalid argument
    #[error("Argument error: {0}")]
    ArgumentError(String),

    /// The isolated registry that produced a façade has been dropped
    #[error("Facade scope has been dropped")]
    ScopeClosed,

    /// Failure raised by user code inside a method, accessor or constructor
    #[error("{0}")]
    Thrown(String),
}

impl From<String> for FacadeError {
    fn from(s: String) -> Self {
        FacadeError::Thrown(s)
    }
}

impl From<&str> for FacadeError {
    fn from(s: &str) -> Self {
        FacadeError::Thrown(s.to_string())
    }
}
