//! Autorelease list and the per-collection finalization sweep.

use crate::ObjRef;

/// Boxes that own foreign storage or carry a host finalize hook.
#[derive(Default, Debug)]
pub(crate) struct FinalizerList {
    entries: Vec<ObjRef>,
}

impl FinalizerList {
    /// Register `r` for release at the first collection it does not survive.
    pub(crate) fn add(&mut self, r: ObjRef) {
        self.entries.push(r);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn contains(&self, r: ObjRef) -> bool {
        self.entries.contains(&r)
    }

    /// Sweep once. `survives` reports whether an entry lived through the
    /// collection, releasing it if not. Survivors are compacted to the front
    /// in one forward pass. Returns the number of entries dropped.
    pub(crate) fn sweep(&mut self, mut survives: impl FnMut(ObjRef) -> bool) -> usize {
        let mut kept = 0;
        for i in 0..self.entries.len() {
            let r = self.entries[i];
            if survives(r) {
                self.entries.swap(kept, i);
                kept += 1;
            }
        }
        let dropped = self.entries.len() - kept;
        self.entries.truncate(kept);
        dropped
    }

    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, ObjRef> {
        self.entries.drain(..)
    }
}

#[cfg(test)]
mod tests;
