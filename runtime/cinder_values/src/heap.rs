//! Managed heap: a copying semispace arena behind a handle table.
//!
//! Objects live in cells addressed by [`Location`]. Callers hold [`ObjRef`]
//! handles, which the slot table maps to the object's current location, so
//! a collection moves objects without patching any reference. Each
//! collection copies everything reachable from the roots into a fresh
//! space (Cheney scan), leaving forwarding marks in the old one, then sweeps
//! the finalizer list against those marks.

mod foreign;
mod object;

use cinder_ir::Name;
use cinder_types::TypeRegistry;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

pub use foreign::{ForeignBuf, POISON_BYTE};
pub use object::StorageKind;
pub(crate) use object::{InlineBytes, NativeBox, Object, ScalarBox, Storage};

use crate::finalize::FinalizerList;
use crate::host::{HostType, Relocation};
use crate::{argument_error, stale_handle, type_error, EngineResult, ObjRef, Value};

/// Position of an object within the current space.
///
/// Only meaningful until the next collection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Location(u32);

impl Location {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

enum Cell {
    Live { handle: u32, object: Object },
    Forwarded(Location),
}

/// One half of the copying arena.
pub(crate) struct Semispace {
    cells: Vec<Cell>,
}

impl Semispace {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Semispace {
            cells: Vec::with_capacity(capacity),
        }
    }

    /// Bump-allocate a cell.
    fn push(&mut self, handle: u32, object: Object) -> Location {
        let loc = Location(self.cells.len() as u32);
        self.cells.push(Cell::Live { handle, object });
        loc
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn is_forwarded(&self, loc: Location) -> bool {
        matches!(self.cells.get(loc.index()), Some(Cell::Forwarded(_)))
    }

    /// Where a forwarded cell's object went.
    pub(crate) fn forwarding(&self, loc: Location) -> Option<Location> {
        match self.cells.get(loc.index()) {
            Some(Cell::Forwarded(to)) => Some(*to),
            _ => None,
        }
    }

    /// Mark `loc` as moved to `to`, handing back its contents.
    ///
    /// `None` if the cell was already forwarded.
    pub(crate) fn forward(&mut self, loc: Location, to: Location) -> Option<(u32, Object)> {
        let cell = self.cells.get_mut(loc.index())?;
        if matches!(cell, Cell::Forwarded(_)) {
            return None;
        }
        match std::mem::replace(cell, Cell::Forwarded(to)) {
            Cell::Live { handle, object } => Some((handle, object)),
            Cell::Forwarded(_) => None,
        }
    }

    fn get(&self, loc: Location) -> Option<&Object> {
        match self.cells.get(loc.index()) {
            Some(Cell::Live { object, .. }) => Some(object),
            _ => None,
        }
    }

    fn get_mut(&mut self, loc: Location) -> Option<&mut Object> {
        match self.cells.get_mut(loc.index()) {
            Some(Cell::Live { object, .. }) => Some(object),
            _ => None,
        }
    }

    fn children_of(&self, index: usize, out: &mut SmallVec<[ObjRef; 8]>) {
        if let Some(Cell::Live { object, .. }) = self.cells.get(index) {
            object.children(out);
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct Slot {
    generation: u32,
    loc: Option<Location>,
}

/// Outcome of one collection.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Objects that survived.
    pub live: usize,
    /// Objects reclaimed.
    pub freed: usize,
    /// Finalizer-list entries that were released.
    pub finalized: usize,
    /// Foreign bytes returned to the allocator.
    pub released_bytes: usize,
}

pub(crate) struct Heap {
    space: Semispace,
    slots: Vec<Slot>,
    free: Vec<u32>,
    pub(crate) roots: Vec<Value>,
    globals: FxHashMap<Name, Value>,
    statics: Vec<ObjRef>,
    pub(crate) finalizers: FinalizerList,
}

impl Heap {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Heap {
            space: Semispace::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            roots: Vec::new(),
            globals: FxHashMap::default(),
            statics: Vec::new(),
            finalizers: FinalizerList::default(),
        }
    }

    /// Place `object` in the current space and hand out a handle for it.
    pub(crate) fn alloc(&mut self, object: Object) -> ObjRef {
        let index = match self.free.pop() {
            Some(i) => i,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    loc: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let loc = self.space.push(index, object);
        let slot = &mut self.slots[index as usize];
        slot.loc = Some(loc);
        ObjRef::new(index, slot.generation)
    }

    fn locate(&self, r: ObjRef) -> Option<Location> {
        let slot = self.slots.get(r.index())?;
        if slot.generation != r.generation() {
            return None;
        }
        slot.loc
    }

    /// Current location of a live handle.
    pub(crate) fn location(&self, r: ObjRef) -> EngineResult<Location> {
        self.locate(r).ok_or_else(stale_handle)
    }

    pub(crate) fn is_live(&self, r: ObjRef) -> bool {
        self.locate(r).is_some()
    }

    pub(crate) fn get(&self, r: ObjRef) -> EngineResult<&Object> {
        self.locate(r)
            .and_then(|loc| self.space.get(loc))
            .ok_or_else(stale_handle)
    }

    pub(crate) fn get_mut(&mut self, r: ObjRef) -> EngineResult<&mut Object> {
        match self.locate(r) {
            Some(loc) => self.space.get_mut(loc).ok_or_else(stale_handle),
            None => Err(stale_handle()),
        }
    }

    /// Number of objects in the current space.
    pub(crate) fn object_count(&self) -> usize {
        self.space.len()
    }

    pub(crate) fn set_global(&mut self, name: Name, value: Value) {
        self.globals.insert(name, value);
    }

    pub(crate) fn global(&self, name: Name) -> Option<Value> {
        self.globals.get(&name).copied()
    }

    /// Root `r` for the heap's lifetime.
    pub(crate) fn add_static(&mut self, r: ObjRef) {
        self.statics.push(r);
    }

    /// Payload bytes of a scalar or native box.
    ///
    /// A view resolves through its parent, which always owns its storage.
    pub(crate) fn payload(&self, r: ObjRef) -> EngineResult<&[u8]> {
        match self.get(r)? {
            Object::Scalar(s) => Ok(s.bytes()),
            Object::Native(NativeBox {
                storage: Storage::Parent { parent, offset },
                len,
                ..
            }) => {
                let end = offset + len;
                match self.get(*parent)? {
                    Object::Native(p) => p
                        .storage
                        .own_bytes(end)
                        .map(|b| &b[*offset..])
                        .ok_or_else(stale_handle),
                    _ => Err(stale_handle()),
                }
            }
            Object::Native(nb) => nb.storage.own_bytes(nb.len).ok_or_else(stale_handle),
            Object::Pair(..) => Err(type_error("c-value", "native value", 1, "pair")),
            Object::Vector(_) => Err(type_error("c-value", "native value", 1, "vector")),
        }
    }

    pub(crate) fn payload_mut(&mut self, r: ObjRef) -> EngineResult<&mut [u8]> {
        let (target, offset, len) = match self.get(r)? {
            Object::Native(NativeBox {
                storage: Storage::Parent { parent, offset },
                len,
                ..
            }) => (*parent, *offset, *len),
            Object::Native(nb) => (r, 0, nb.len),
            Object::Scalar(_) => return Err(argument_error("c-value: scalar values are immutable")),
            Object::Pair(..) => return Err(type_error("c-value", "native value", 1, "pair")),
            Object::Vector(_) => return Err(type_error("c-value", "native value", 1, "vector")),
        };
        match self.get_mut(target)? {
            Object::Native(nb) => nb
                .storage
                .own_bytes_mut(offset + len)
                .map(|b| &mut b[offset..])
                .ok_or_else(stale_handle),
            _ => Err(stale_handle()),
        }
    }

    /// Copy every object reachable from the roots into a fresh space, then
    /// release unreachable finalizer-list entries.
    pub(crate) fn collect(&mut self, types: &TypeRegistry<dyn HostType>, poison: bool) -> CollectStats {
        let capacity = self.space.len().max(16);
        let mut from = std::mem::replace(&mut self.space, Semispace::with_capacity(capacity));

        let mut pending: Vec<ObjRef> = self.roots.iter().filter_map(|v| v.as_object()).collect();
        pending.extend(self.globals.values().filter_map(|v| v.as_object()));
        pending.extend_from_slice(&self.statics);
        for r in pending {
            self.evacuate(&mut from, r, types);
        }

        let mut scan = 0;
        let mut children = SmallVec::new();
        while scan < self.space.len() {
            children.clear();
            self.space.children_of(scan, &mut children);
            for child in children.drain(..) {
                self.evacuate(&mut from, child, types);
            }
            scan += 1;
        }

        let mut released_bytes = 0;
        let slots = &self.slots;
        let finalized = self.finalizers.sweep(|r| {
            let Some(loc) = slots
                .get(r.index())
                .filter(|s| s.generation == r.generation())
                .and_then(|s| s.loc)
            else {
                return false;
            };
            if from.is_forwarded(loc) {
                return true;
            }
            if let Some(Object::Native(nb)) = from.get_mut(loc) {
                released_bytes += release_native(nb, types, poison);
            }
            false
        });

        let mut stats = CollectStats {
            finalized,
            released_bytes,
            ..CollectStats::default()
        };
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(loc) = slot.loc else { continue };
            match from.forwarding(loc) {
                Some(to) => {
                    slot.loc = Some(to);
                    stats.live += 1;
                }
                None => {
                    slot.loc = None;
                    slot.generation = slot.generation.wrapping_add(1);
                    self.free.push(index as u32);
                    stats.freed += 1;
                }
            }
        }
        stats
    }

    fn evacuate(&mut self, from: &mut Semispace, r: ObjRef, types: &TypeRegistry<dyn HostType>) {
        let Some(loc) = self.locate(r) else { return };
        let to = Location(self.space.len() as u32);
        let Some((handle, mut object)) = from.forward(loc, to) else {
            return;
        };
        if let Object::Native(nb) = &mut object {
            if let Some(host) = types.desc(nb.ty).host() {
                if let Some(payload) = nb.storage.own_bytes_mut(nb.len) {
                    let event = Relocation {
                        object: r,
                        from: loc,
                        to,
                    };
                    host.relocate(&event, payload);
                }
            }
        }
        self.space.push(handle, object);
    }

    /// Finalize every remaining finalizer-list entry. Returns the count.
    pub(crate) fn release_all(&mut self, types: &TypeRegistry<dyn HostType>, poison: bool) -> usize {
        let entries: Vec<ObjRef> = self.finalizers.drain().collect();
        let mut released = 0;
        for r in entries {
            let Some(loc) = self.locate(r) else { continue };
            if let Some(Object::Native(nb)) = self.space.get_mut(loc) {
                release_native(nb, types, poison);
                released += 1;
            }
        }
        released
    }
}

/// Run the host finalize hook, then free owned storage.
fn release_native(nb: &mut NativeBox, types: &TypeRegistry<dyn HostType>, poison: bool) -> usize {
    if let Some(host) = types.desc(nb.ty).host() {
        if host.has_finalizer() {
            if let Some(payload) = nb.storage.own_bytes_mut(nb.len) {
                host.finalize(payload);
            }
        }
    }
    nb.storage.release(poison)
}
