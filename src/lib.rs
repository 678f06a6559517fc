//! # arbor-di
//!
//! Dependency injection built around compiled containers and a tree of
//! disposable lifetime scopes.
//!
//! ## Features
//!
//! - **Lifetimes**: Singleton, Scoped and Transient registrations
//! - **Injection plans**: constructor selection, parameter overrides, method and field injection
//! - **Scope tree**: child scopes extend their parent's registrations and dispose in reverse order
//! - **Circular dependency detection** with the full resolution path in the error
//! - **Compile-time validation** of missing and captive dependencies
//! - **Entry points**: startable services handed to the host after a scope is built
//!
//! ## Quick Start
//!
//! ```rust
//! use arbor_di::{ContainerBuilder, Lifetime, Resolver};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let mut builder = ContainerBuilder::new();
//! builder
//!     .register_instance(Database {
//!         connection_string: "postgres://localhost".to_string(),
//!     })
//!     .unwrap();
//! builder
//!     .register_factory(Lifetime::Transient, |ctx| {
//!         Ok(UserService { db: ctx.get::<Database>()? })
//!     })
//!     .unwrap();
//!
//! let root = builder.build_scope().unwrap();
//! let users = root.get_required::<UserService>();
//! assert_eq!(users.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Scopes
//!
//! ```rust
//! use arbor_di::{ContainerBuilder, DiResult, Lifetime, Resolver};
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//!
//! struct RequestId(u32);
//!
//! let counter = Arc::new(AtomicU32::new(0));
//! let root = ContainerBuilder::new().build_scope().unwrap();
//!
//! let make_child = |counter: Arc<AtomicU32>| {
//!     root.create_child_with(move |b: &mut ContainerBuilder| -> DiResult<()> {
//!         b.register_factory(Lifetime::Scoped, move |_| {
//!             Ok(RequestId(counter.fetch_add(1, Ordering::SeqCst)))
//!         })?;
//!         Ok(())
//!     })
//! };
//!
//! let first = make_child(counter.clone()).unwrap();
//! let second = make_child(counter.clone()).unwrap();
//! assert_ne!(first.get_required::<RequestId>().0, second.get_required::<RequestId>().0);
//!
//! root.dispose().unwrap();
//! assert!(first.is_disposed() && second.is_disposed());
//! ```

pub mod ambient;
pub mod cancellation;
pub mod collection;
pub mod descriptors;
pub mod entry_points;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod options;
pub mod plan;
pub mod provider;
pub mod traits;

mod compiler;
mod container;
mod internal;
mod registration;

pub use cancellation::CancellationToken;
pub use collection::{ContainerBuilder, Installer, RegistrationBuilder, ScopeTemplate};
pub use container::Container;
pub use descriptors::{Activation, ServiceDescriptor};
pub use entry_points::{EntryPoint, EntryPoints};
pub use error::{BoxError, ConfigurationError, DiError, DiResult, DisposeError, DisposeFailure};
pub use key::{key_of_trait, key_of_type, Key};
pub use lifetime::Lifetime;
pub use options::{ContainerOptions, DEFAULT_MAX_DEPTH};
pub use plan::{Args, Constructor, Injectable, InjectionPoint, MemberKind, Param, ParamKind, TypePlan};
pub use provider::{ChildScopeBuilder, LifetimeScope, ResolverContext};
pub use traits::{AsyncStartable, Dispose, Resolver, ResolverCore, Startable};
