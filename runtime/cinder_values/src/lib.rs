//! Native value engine for the Cinder runtime.
//!
//! An [`Engine`] owns the type registry, a copying heap and the finalizer
//! list. Values are [`Value`]s: immediates, or [`ObjRef`] handles that stay
//! valid while the collector moves objects.
//!
//! # Modules
//!
//! - `alloc`/`init`/`access`: boxed value construction and element access
//! - `arith`/`bitwise`: the numeric operators
//! - `heap`/`finalize`: storage, collection and autorelease
//! - `io`/`print`: typed binary I/O and printed representation
//!
//! # Debug Environment Variables
//!
//! - `RUST_LOG=cinder_values=debug`: collections and registry misses.
//! - `RUST_LOG=cinder_values=trace`: every foreign buffer allocation.
//! - `CINDER_INLINE_MAX`, `CINDER_GC_TRIGGER`: read by
//!   [`EngineConfig::from_env`].

mod access;
mod alloc;
mod arith;
mod bitwise;
mod config;
mod engine;
mod error;
mod finalize;
pub mod heap;
pub mod host;
mod init;
mod io;
mod print;
mod value;

use std::sync::Once;

pub use access::TypeOf;
pub use alloc::ViewSource;
pub use config::{EngineConfig, DEFAULT_ALLOC_LIMIT_TRIGGER, DEFAULT_INLINE_THRESHOLD};
pub use engine::{Engine, EngineStats};
pub use error::{
    argument_error, bounds_error, divide_by_zero, io_error, memory_error, stale_handle, type_error,
    EngineError, EngineResult, ErrorKind,
};
pub use heap::{CollectStats, ForeignBuf, Location, StorageKind, POISON_BYTE};
pub use host::{HostType, Relocation};
pub use value::{ObjRef, Value};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
