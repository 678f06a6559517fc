//! Error types for the dependency injection container.

use thiserror::Error;

/// Boxed error returned by user hooks (disposal, async entry points).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependency injection errors
///
/// Every failure of registration, compilation, resolution or scope management
/// surfaces as one of these variants. None of them are retried: wiring mistakes
/// are programming errors.
///
/// # Examples
///
/// ```rust
/// use arbor_di::{ContainerBuilder, DiError, Resolver};
///
/// let scope = ContainerBuilder::new().build_scope().unwrap();
/// match scope.get::<String>() {
///     Err(DiError::Unresolved { contract, .. }) => {
///         assert_eq!(contract, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// Bad registration or compile-time policy violation
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    /// No registration satisfies the contract anywhere in the container chain
    #[error("no registration for {contract} (resolution path: {})", render_path(.path))]
    Unresolved {
        contract: &'static str,
        path: Vec<&'static str>,
    },
    /// Circular dependency detected (the cycle, first element repeated last)
    #[error("circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// More than one constructor qualifies and none is marked for injection
    #[error("ambiguous constructors for {implementation}: {}", .candidates.join(", "))]
    AmbiguousConstructor {
        implementation: &'static str,
        candidates: Vec<&'static str>,
    },
    /// Resolution or child creation attempted on a disposed scope
    #[error("scope '{0}' has been disposed")]
    DisposedScope(String),
    /// Stored instance or argument could not be downcast
    #[error("type mismatch for {0}")]
    TypeMismatch(&'static str),
    /// Maximum resolution depth exceeded
    #[error("max resolution depth {0} exceeded")]
    DepthExceeded(usize),
    /// A user factory or injection method reported a failure
    #[error("factory for {contract} failed: {message}")]
    Factory {
        contract: &'static str,
        message: String,
    },
}

impl DiError {
    /// Wraps an arbitrary error raised by user construction code.
    pub fn factory(contract: &'static str, err: impl std::fmt::Display) -> Self {
        DiError::Factory {
            contract,
            message: err.to_string(),
        }
    }
}

fn render_path(path: &[&'static str]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join(" -> ")
    }
}

/// Registration and compilation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A registration was attempted after the builder was compiled
    #[error("registry has already been compiled; cannot register {0}")]
    Frozen(&'static str),
    /// An implementation plan declares no constructors
    #[error("{0} declares no constructors")]
    NoConstructor(&'static str),
    /// More than one constructor is marked for injection
    #[error("{implementation} marks several constructors for injection: {}", .constructors.join(", "))]
    MultipleInjectConstructors {
        implementation: &'static str,
        constructors: Vec<&'static str>,
    },
    /// A constructor hint names a constructor the plan does not have
    #[error("{implementation} has no constructor named '{constructor}'")]
    UnknownConstructor {
        implementation: &'static str,
        constructor: &'static str,
    },
    /// A compile-time checked dependency has no registration in the chain
    #[error("{implementation} parameter '{parameter}' requires {contract}, which is not registered")]
    MissingDependency {
        implementation: &'static str,
        parameter: &'static str,
        contract: &'static str,
    },
    /// A singleton captures a transient that the container would otherwise dispose
    #[error("singleton {implementation} captures disposable transient {dependency}")]
    CaptiveDisposable {
        implementation: &'static str,
        dependency: &'static str,
    },
    /// A singleton captures a scoped dependency
    #[error("singleton {implementation} captures scoped {dependency}")]
    CaptiveScoped {
        implementation: &'static str,
        dependency: &'static str,
    },
    /// Injection points were attached to a pre-built instance registration
    #[error("{0} is registered as an instance and cannot receive member injection")]
    InjectIntoInstance(&'static str),
}

/// A single instance whose release logic failed during scope disposal.
#[derive(Debug, Error)]
#[error("disposing {contract} in scope '{scope}' failed: {source}")]
pub struct DisposeFailure {
    /// Contract the instance was resolved under
    pub contract: &'static str,
    /// Name of the scope that owned the instance
    pub scope: String,
    /// Error returned (or panic raised) by the instance
    #[source]
    pub source: BoxError,
}

/// Aggregate of every failure raised while disposing a scope tree.
///
/// Disposal keeps going after a failing instance; every failure is collected
/// here in the order the instances were released.
#[derive(Debug, Error)]
#[error("{} instance(s) failed to dispose: {}", .failures.len(), summarize(.failures))]
pub struct DisposeError {
    pub failures: Vec<DisposeFailure>,
}

fn summarize(failures: &[DisposeFailure]) -> String {
    failures
        .iter()
        .map(|f| f.contract)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for DI operations
///
/// ```rust
/// use arbor_di::{DiResult, DiError};
///
/// fn failing_operation() -> DiResult<()> {
///     Err(DiError::TypeMismatch("some_service"))
/// }
/// assert!(failing_operation().is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
