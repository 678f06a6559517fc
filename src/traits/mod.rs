//! Core traits for the dependency injection container.

mod dispose;
mod resolver;
mod startable;

pub use dispose::Dispose;
pub use resolver::{Resolver, ResolverCore};
pub use startable::{AsyncStartable, Startable};
