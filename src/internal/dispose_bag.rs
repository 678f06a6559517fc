//! Internal disposal bag for tracked instances.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::{BoxError, DisposeFailure};
use crate::registration::{AnyArc, DisposeHook};

struct Tracked {
    contract: &'static str,
    instance: AnyArc,
    hook: DisposeHook,
}

/// Disposable instances in construction order, released LIFO.
#[derive(Default)]
pub(crate) struct DisposeBag {
    entries: Vec<Tracked>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, contract: &'static str, instance: AnyArc, hook: DisposeHook) {
        self.entries.push(Tracked { contract, instance, hook });
    }

    /// Runs every hook in reverse order, collecting failures and panics.
    pub(crate) fn run_all_reverse(&mut self, scope: &str) -> Vec<DisposeFailure> {
        let mut failures = Vec::new();
        while let Some(entry) = self.entries.pop() {
            let outcome = catch_unwind(AssertUnwindSafe(|| (entry.hook)(&entry.instance)));
            let error = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(payload) => panic_message(payload),
            };
            tracing::warn!(contract = entry.contract, scope, error = %error, "dispose failed");
            failures.push(DisposeFailure {
                contract: entry.contract,
                scope: scope.to_string(),
                source: error,
            });
        }
        failures
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> BoxError {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        format!("panicked: {s}").into()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}").into()
    } else {
        "panicked".into()
    }
}
