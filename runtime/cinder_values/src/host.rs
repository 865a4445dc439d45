//! Hooks for host-implemented opaque types.

use std::fmt;

use crate::heap::Location;
use crate::{type_error, Engine, EngineResult, ObjRef, Value};

/// A native box moved by the collector.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Relocation {
    pub object: ObjRef,
    pub from: Location,
    pub to: Location,
}

/// Behavior of an opaque type defined by the host (ports, tables, handles).
///
/// Hooks receive the value's payload bytes. Every method has a default, so
/// a host type only overrides what it needs.
pub trait HostType {
    fn print(&self, payload: &[u8], out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "#<opaque {} bytes>", payload.len())
    }

    /// Called after the collector moves a value with its own storage.
    ///
    /// Host structures that point into the payload repoint themselves here.
    fn relocate(&self, _event: &Relocation, _payload: &mut [u8]) {}

    /// Whether values need [`finalize`](HostType::finalize) when reclaimed.
    fn has_finalizer(&self) -> bool {
        false
    }

    /// Called once for a reclaimed value, before its storage is released.
    fn finalize(&self, _payload: &mut [u8]) {}

    /// Populate `dest` from `source`. Only called for types registered as
    /// plain data.
    fn init(&self, _engine: &Engine, _source: Value, _dest: &mut [u8]) -> EngineResult<()> {
        Err(type_error("c-value", "plain-old-data type", 1, "opaque"))
    }
}
