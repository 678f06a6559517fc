//! Container-wide options.

/// Default limit on nested resolutions before `DepthExceeded` is reported.
///
/// Every level costs several native stack frames (resolve, activate, the
/// factory or plan, and the context call back in), so the limit has to trip
/// well before a 2 MiB thread stack runs out in an unoptimized build.
/// Raise it with [`ContainerOptions::with_max_depth`] only on threads with
/// a larger stack.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Options applied when a registry is compiled and its container resolved.
///
/// Child scopes inherit the options of their parent container unless the
/// child builder is given its own.
///
/// # Examples
///
/// ```rust
/// use arbor_di::{ContainerBuilder, ContainerOptions};
///
/// let options = ContainerOptions::default()
///     .with_max_depth(64)
///     .validate_all_dependencies(true);
///
/// let builder = ContainerBuilder::with_options(options);
/// assert_eq!(builder.options().max_depth, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ContainerOptions {
    /// Maximum depth of nested resolutions within one request
    pub max_depth: usize,
    /// Check every plan parameter at compile time, not only those marked `checked`
    pub validate_all_dependencies: bool,
    /// Report singletons that capture disposable transient dependencies
    pub captive_dependency_check: bool,
    /// Also report singletons that capture scoped dependencies; needs
    /// `captive_dependency_check`
    pub reject_captive_scoped: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            validate_all_dependencies: false,
            captive_dependency_check: true,
            reject_captive_scoped: false,
        }
    }
}

impl ContainerOptions {
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn validate_all_dependencies(mut self, enabled: bool) -> Self {
        self.validate_all_dependencies = enabled;
        self
    }

    pub fn captive_dependency_check(mut self, enabled: bool) -> Self {
        self.captive_dependency_check = enabled;
        self
    }

    pub fn reject_captive_scoped(mut self, enabled: bool) -> Self {
        self.reject_captive_scoped = enabled;
        self
    }
}
