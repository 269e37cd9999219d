//! Error types for roof-core
//!
//! Every variant is `Clone`: an error raised by a pipeline stage or an action
//! body travels back to the caller as the very same value, never re-wrapped.

use crate::conflict::ConflictReport;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error(transparent)]
    Naming(#[from] NamingError),

    /// Two namespaces claim the same name
    ///
    /// Boxed to keep the error small while propagating through futures.
    #[error("namespace conflict: {0}")]
    NamespaceConflict(Box<ConflictReport>),

    #[error("\"{key}\" of model {model} is read only")]
    ReadOnly { model: String, key: String },

    #[error("Undefined method \"{method}\" on model {model}")]
    UndefinedMethod { model: String, method: String },

    #[error("model {model} has no field \"{key}\"")]
    UnknownField { model: String, key: String },

    #[error("field \"{key}\" of model {model} is not a list or map")]
    NotAContainer { model: String, key: String },

    #[error("no model provided under context key \"{0}\"")]
    UnknownContextKey(String),

    /// An error raised by user code (a stage, an action, a hook)
    #[error("{0}")]
    Raised(RaisedError),
}

/// Problems with model or member names
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamingError {
    #[error("model need a name")]
    MissingName,

    #[error("private member \"{0}\" must start with '_'")]
    PrivateKey(String),
}

impl Error {
    /// Raise a user error
    pub fn raise<E: std::error::Error + 'static>(error: E) -> Self {
        Error::Raised(RaisedError::new(error))
    }

    /// Raise a user error from a plain message
    pub fn msg(message: impl Into<String>) -> Self {
        Error::Raised(RaisedError::new(Message(message.into())))
    }

    /// Wrap a conflict report
    pub fn conflicts(report: ConflictReport) -> Self {
        Error::NamespaceConflict(Box::new(report))
    }

    /// Get the conflict report if this is a NamespaceConflict error
    pub fn conflict_report(&self) -> Option<&ConflictReport> {
        match self {
            Error::NamespaceConflict(report) => Some(report),
            _ => None,
        }
    }

    /// Whether two errors are the same error
    ///
    /// Raised errors compare by identity; every other variant compares by
    /// kind and message.
    pub fn same_as(&self, other: &Error) -> bool {
        match (self, other) {
            (Error::Raised(a), Error::Raised(b)) => a.ptr_eq(b),
            (Error::Raised(_), _) | (_, Error::Raised(_)) => false,
            _ => {
                std::mem::discriminant(self) == std::mem::discriminant(other)
                    && self.to_string() == other.to_string()
            }
        }
    }
}

/// A reference-counted user error
///
/// Cloning shares the underlying error, so identity survives propagation.
#[derive(Clone)]
pub struct RaisedError(Rc<dyn std::error::Error + 'static>);

impl RaisedError {
    pub fn new<E: std::error::Error + 'static>(error: E) -> Self {
        Self(Rc::new(error))
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &RaisedError) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Access the concrete error
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }
}

impl fmt::Debug for RaisedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for RaisedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Message {}
