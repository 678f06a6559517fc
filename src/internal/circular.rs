//! Circular dependency detection for a single resolution request.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};
use crate::key::Key;

/// In-progress path of one top-level resolution.
///
/// Holds the contracts currently being resolved and the registrations
/// currently under construction. A scope creates a fresh path per call and
/// hands it down through `ResolverContext`, so concurrent requests on other
/// threads never see each other's frames.
pub(crate) struct ResolutionPath {
    max_depth: usize,
    contracts: RefCell<Vec<Key>>,
    // (registration id, index of the contract that reached it)
    building: RefCell<Vec<(u64, usize)>>,
}

impl ResolutionPath {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            contracts: RefCell::new(Vec::new()),
            building: RefCell::new(Vec::new()),
        }
    }

    /// Contract names on the path, outermost first.
    pub(crate) fn names(&self) -> Vec<&'static str> {
        self.contracts.borrow().iter().map(Key::display_name).collect()
    }

    pub(crate) fn depth(&self) -> usize {
        self.contracts.borrow().len()
    }

    /// Pushes a contract, failing on re-entry or when the depth limit is hit.
    pub(crate) fn enter(&self, key: &Key) -> DiResult<PathFrame<'_>> {
        let mut contracts = self.contracts.borrow_mut();

        // Circular detection before pushing
        if let Some(start) = contracts.iter().position(|k| k == key) {
            let mut cycle: Vec<&'static str> = contracts[start..].iter().map(Key::display_name).collect();
            cycle.push(key.display_name());
            return Err(DiError::Circular(cycle));
        }

        if contracts.len() >= self.max_depth {
            return Err(DiError::DepthExceeded(self.max_depth));
        }

        contracts.push(key.clone());
        Ok(PathFrame { path: self, kind: FrameKind::Contract })
    }

    /// Marks a registration as under construction.
    ///
    /// Catches cycles that pass through different contracts of the same
    /// registration, which contract tracking alone cannot see.
    pub(crate) fn enter_registration(&self, id: u64) -> DiResult<PathFrame<'_>> {
        let mut building = self.building.borrow_mut();
        let contracts = self.contracts.borrow();
        let current = contracts.len().saturating_sub(1);

        if let Some(&(_, start)) = building.iter().find(|(b, _)| *b == id) {
            let mut cycle: Vec<&'static str> = contracts[start..].iter().map(Key::display_name).collect();
            if let Some(first) = contracts.get(start) {
                cycle.push(first.display_name());
            }
            return Err(DiError::Circular(cycle));
        }

        building.push((id, current));
        Ok(PathFrame { path: self, kind: FrameKind::Registration })
    }
}

enum FrameKind {
    Contract,
    Registration,
}

/// Pops its frame when dropped, including on early return with `?`.
pub(crate) struct PathFrame<'a> {
    path: &'a ResolutionPath,
    kind: FrameKind,
}

impl Drop for PathFrame<'_> {
    fn drop(&mut self) {
        match self.kind {
            FrameKind::Contract => {
                self.path.contracts.borrow_mut().pop();
            }
            FrameKind::Registration => {
                self.path.building.borrow_mut().pop();
            }
        }
    }
}
