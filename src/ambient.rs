//! Ambient pending-scope queue.
//!
//! Code that cannot pass a parent or installers to the place where a scope
//! is created (for example a loader that builds a scope deep inside a call
//! chain) can enqueue them here instead. Each scope creation on the same
//! thread consumes at most the most recently enqueued entry.
//!
//! The queue is thread-local and entries are owned by an [`EnqueueGuard`]:
//! dropping the guard removes its entry if no scope consumed it.
//!
//! # Examples
//!
//! ```
//! use arbor_di::{ambient, ContainerBuilder, DiResult, Resolver};
//!
//! let mut root = ContainerBuilder::new();
//! root.register_instance(String::from("shared")).unwrap();
//! let root = root.build_scope().unwrap();
//!
//! let guard = ambient::PendingScope::new()
//!     .parent(&root)
//!     .installer(|b: &mut ContainerBuilder| -> DiResult<()> {
//!         b.register_instance(3u8)?;
//!         Ok(())
//!     })
//!     .enqueue();
//!
//! // A root build elsewhere picks up the queued parent and installer
//! let scope = ContainerBuilder::new().build_scope().unwrap();
//! assert!(!guard.is_pending());
//! assert!(scope.parent().unwrap().ptr_eq(&root));
//! assert_eq!(*scope.get_required::<u8>(), 3);
//! assert_eq!(&*scope.get_required::<String>(), "shared");
//! ```

use std::cell::{Cell, RefCell};
use std::marker::PhantomData;

use crate::collection::Installer;
use crate::provider::LifetimeScope;

thread_local! {
    static PENDING: RefCell<Vec<(u64, Pending)>> = const { RefCell::new(Vec::new()) };
    static NEXT_ID: Cell<u64> = const { Cell::new(1) };
}

pub(crate) struct Pending {
    pub(crate) parent: Option<LifetimeScope>,
    pub(crate) installers: Vec<Box<dyn Installer>>,
}

/// A pending entry under construction.
#[derive(Default)]
pub struct PendingScope {
    parent: Option<LifetimeScope>,
    installers: Vec<Box<dyn Installer>>,
}

impl PendingScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parent the next root build attaches under.
    pub fn parent(mut self, parent: &LifetimeScope) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Installer applied to the next scope's registry, in call order.
    pub fn installer(mut self, installer: impl Installer + 'static) -> Self {
        self.installers.push(Box::new(installer));
        self
    }

    /// Pushes the entry onto this thread's queue.
    pub fn enqueue(self) -> EnqueueGuard {
        let id = NEXT_ID.with(|n| {
            let id = n.get();
            n.set(id + 1);
            id
        });
        PENDING.with(|q| {
            q.borrow_mut().push((
                id,
                Pending {
                    parent: self.parent,
                    installers: self.installers,
                },
            ))
        });
        tracing::trace!(entry = id, "enqueued pending scope");
        EnqueueGuard { id, _not_send: PhantomData }
    }
}

/// Enqueues a parent for the next scope built on this thread.
pub fn enqueue_parent(parent: &LifetimeScope) -> EnqueueGuard {
    PendingScope::new().parent(parent).enqueue()
}

/// Enqueues an installer for the next scope built on this thread.
pub fn enqueue_installer(installer: impl Installer + 'static) -> EnqueueGuard {
    PendingScope::new().installer(installer).enqueue()
}

/// Owns one queued entry; removes it on drop if still unconsumed.
///
/// Not `Send`: the entry lives in the creating thread's queue.
#[must_use = "the pending entry is removed when the guard is dropped"]
pub struct EnqueueGuard {
    id: u64,
    _not_send: PhantomData<*const ()>,
}

impl EnqueueGuard {
    /// Whether the entry is still waiting to be consumed.
    pub fn is_pending(&self) -> bool {
        PENDING.with(|q| q.borrow().iter().any(|(id, _)| *id == self.id))
    }
}

impl Drop for EnqueueGuard {
    fn drop(&mut self) {
        // Remove outside the borrow so dropping the entry cannot re-enter the queue
        let removed = PENDING.with(|q| {
            let mut q = q.borrow_mut();
            q.iter().position(|(id, _)| *id == self.id).map(|i| q.remove(i))
        });
        if removed.is_some() {
            tracing::trace!(entry = self.id, "pending scope discarded unconsumed");
        }
    }
}

/// Pops the most recently enqueued entry.
pub(crate) fn take_pending() -> Option<Pending> {
    let (id, pending) = PENDING.with(|q| q.borrow_mut().pop())?;
    tracing::trace!(entry = id, "consumed pending scope");
    Some(pending)
}

/// Number of entries queued on this thread.
pub fn pending_len() -> usize {
    PENDING.with(|q| q.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::ContainerBuilder;
    use crate::error::DiResult;

    #[test]
    fn guard_removes_unconsumed_entry() {
        {
            let guard = enqueue_installer(|_: &mut ContainerBuilder| -> DiResult<()> { Ok(()) });
            assert!(guard.is_pending());
            assert_eq!(pending_len(), 1);
        }
        assert_eq!(pending_len(), 0);
    }

    #[test]
    fn consumption_is_lifo_and_single() {
        let first = enqueue_installer(|b: &mut ContainerBuilder| -> DiResult<()> {
            b.register_instance(1u8)?;
            Ok(())
        });
        let second = enqueue_installer(|b: &mut ContainerBuilder| -> DiResult<()> {
            b.register_instance(2u8)?;
            Ok(())
        });

        let taken = take_pending().unwrap();
        assert_eq!(taken.installers.len(), 1);
        assert!(!second.is_pending());
        assert!(first.is_pending());

        drop(second);
        assert!(first.is_pending());
        drop(first);
        assert!(take_pending().is_none());
    }
}
