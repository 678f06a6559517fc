//! Installers and scope templates for modular registration.

use crate::collection::ContainerBuilder;
use crate::error::DiResult;

/// A unit of configuration applied once to a registry.
///
/// Implemented for any `FnOnce(&mut ContainerBuilder) -> DiResult<()>`, so
/// closures can be passed wherever an installer is expected.
///
/// # Example
///
/// ```rust
/// use arbor_di::{ContainerBuilder, DiResult, Installer, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct UserConfig;
///
/// struct UserService {
///     config: Arc<UserConfig>,
/// }
///
/// struct UserModule;
///
/// impl Installer for UserModule {
///     fn install(self: Box<Self>, builder: &mut ContainerBuilder) -> DiResult<()> {
///         builder.register_instance(UserConfig::default())?;
///         builder.register_factory(Lifetime::Scoped, |ctx| {
///             Ok(UserService { config: ctx.get::<UserConfig>()? })
///         })?;
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let mut builder = ContainerBuilder::new();
/// builder.install(UserModule)?;
/// let scope = builder.build_scope()?;
/// let _service = scope.get::<UserService>()?;
/// # Ok(())
/// # }
/// ```
pub trait Installer {
    /// Register this installer's services with the builder.
    fn install(self: Box<Self>, builder: &mut ContainerBuilder) -> DiResult<()>;
}

impl<F> Installer for F
where
    F: FnOnce(&mut ContainerBuilder) -> DiResult<()>,
{
    fn install(self: Box<Self>, builder: &mut ContainerBuilder) -> DiResult<()> {
        (*self)(builder)
    }
}

/// Reusable configuration for child scopes.
///
/// Unlike an [`Installer`], a template is borrowed and can configure any
/// number of scopes.
///
/// ```rust
/// use arbor_di::{ContainerBuilder, DiResult, Lifetime, Resolver, ScopeTemplate};
///
/// struct RequestId(u64);
///
/// struct RequestTemplate;
///
/// impl ScopeTemplate for RequestTemplate {
///     fn configure(&self, builder: &mut ContainerBuilder) -> DiResult<()> {
///         builder.register_factory(Lifetime::Scoped, |_| Ok(RequestId(1)))?;
///         Ok(())
///     }
/// }
///
/// let root = ContainerBuilder::new().build_scope().unwrap();
/// let a = root.create_child_from(&RequestTemplate).unwrap();
/// let b = root.create_child_from(&RequestTemplate).unwrap();
/// assert_eq!(a.get_required::<RequestId>().0, b.get_required::<RequestId>().0);
/// ```
pub trait ScopeTemplate {
    fn configure(&self, builder: &mut ContainerBuilder) -> DiResult<()>;
}
