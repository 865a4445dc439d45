//! The engine: one owner for the type registry, the heap and the finalizer
//! list.

use std::rc::Rc;
use std::sync::Arc;

use cinder_ir::{parse_type, Name, StringInterner, SharedInterner, TypeExpr};
use cinder_types::{TypeId, TypeRegistry};
use tracing::debug;

use crate::heap::{CollectStats, Heap, InlineBytes, Location, NativeBox, Object, Storage};
use crate::host::HostType;
use crate::{argument_error, type_error, EngineConfig, EngineResult, ObjRef, Value};

/// Running totals since the engine was created.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub collections: usize,
    /// Collections forced by foreign-allocation pressure.
    pub pressure_collections: usize,
    pub finalized: usize,
    pub foreign_bytes: usize,
}

pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) interner: SharedInterner,
    pub(crate) types: TypeRegistry<dyn HostType>,
    pub(crate) heap: Heap,
    /// Foreign bytes allocated since the last collection.
    pub(crate) pressure: usize,
    pub(crate) stats: EngineStats,
    pub(crate) empty_text: ObjRef,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_interner(config, Arc::new(StringInterner::new()))
    }

    /// Share an existing interner, so symbols agree with the caller's.
    pub fn with_interner(config: EngineConfig, interner: SharedInterner) -> Self {
        let mut heap = Heap::with_capacity(config.initial_heap_capacity);
        let empty_text = heap.alloc(Object::Native(NativeBox {
            ty: TypeId::TEXT,
            len: 0,
            storage: Storage::Inline(InlineBytes::from_elem(0, 1)),
        }));
        heap.add_static(empty_text);
        Engine {
            types: TypeRegistry::new(Arc::clone(&interner)),
            config,
            interner,
            heap,
            pressure: 0,
            stats: EngineStats::default(),
            empty_text,
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    #[inline]
    pub fn types(&self) -> &TypeRegistry<dyn HostType> {
        &self.types
    }

    #[inline]
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Foreign bytes allocated since the last collection.
    #[inline]
    pub fn pressure(&self) -> usize {
        self.pressure
    }

    pub fn intern(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    pub fn symbol(&self, s: &str) -> Value {
        Value::Symbol(self.intern(s))
    }

    pub fn parse_type(&self, src: &str) -> EngineResult<TypeExpr> {
        Ok(parse_type(src, &self.interner)?)
    }

    /// Resolve a type expression, registering its descriptor on first use.
    pub fn get_type(&mut self, expr: &TypeExpr) -> EngineResult<TypeId> {
        Ok(self.types.get_type(expr)?)
    }

    pub fn get_array_type(&mut self, elem: TypeId) -> EngineResult<TypeId> {
        Ok(self.types.get_array_type(elem)?)
    }

    pub fn define_opaque_type(
        &mut self,
        name: &str,
        size: usize,
        host: Rc<dyn HostType>,
        plain_data: bool,
    ) -> EngineResult<TypeId> {
        let name = self.interner.intern(name);
        Ok(self.types.define_opaque_type(name, size, host, plain_data)?)
    }

    pub fn push_root(&mut self, v: Value) {
        self.heap.roots.push(v);
    }

    pub fn pop_root(&mut self) -> Option<Value> {
        self.heap.roots.pop()
    }

    /// Run `f` with `roots` kept alive for its duration.
    pub fn with_roots<R>(&mut self, roots: &[Value], f: impl FnOnce(&mut Self) -> R) -> R {
        let base = self.heap.roots.len();
        self.heap.roots.extend_from_slice(roots);
        let out = f(self);
        self.heap.roots.truncate(base);
        out
    }

    /// Bind a global, which roots `value`.
    pub fn set_global(&mut self, name: &str, value: Value) {
        let name = self.interner.intern(name);
        self.heap.set_global(name, value);
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.interner.get(name).and_then(|n| self.heap.global(n))
    }

    /// Whether `v` is an immediate or a handle to a live object.
    pub fn is_live(&self, v: Value) -> bool {
        v.as_object().map_or(true, |r| self.heap.is_live(r))
    }

    /// Where `v`'s object currently sits. Changes at every collection.
    pub fn location(&self, v: Value) -> EngineResult<Location> {
        let r = v
            .as_object()
            .ok_or_else(|| type_error("location", "heap object", 1, self.type_name(v)))?;
        self.heap.location(r)
    }

    /// Whether `v` is on the finalizer list.
    pub fn is_autoreleased(&self, v: Value) -> bool {
        v.as_object().is_some_and(|r| self.heap.finalizers.contains(r))
    }

    /// Number of values waiting on the finalizer list.
    pub fn autorelease_count(&self) -> usize {
        self.heap.finalizers.len()
    }

    /// Number of objects in the current space, live or not yet collected.
    pub fn object_count(&self) -> usize {
        self.heap.object_count()
    }

    pub fn cons(&mut self, car: Value, cdr: Value) -> Value {
        Value::Object(self.heap.alloc(Object::Pair(car, cdr)))
    }

    pub fn list(&mut self, items: &[Value]) -> Value {
        items
            .iter()
            .rev()
            .fold(Value::Nil, |tail, &item| self.cons(item, tail))
    }

    pub fn vector(&mut self, items: Vec<Value>) -> Value {
        Value::Object(self.heap.alloc(Object::Vector(items)))
    }

    pub fn car(&self, v: Value) -> EngineResult<Value> {
        match self.object(v)? {
            Some(Object::Pair(a, _)) => Ok(*a),
            _ => Err(type_error("car", "pair", 1, self.type_name(v))),
        }
    }

    pub fn cdr(&self, v: Value) -> EngineResult<Value> {
        match self.object(v)? {
            Some(Object::Pair(_, d)) => Ok(*d),
            _ => Err(type_error("cdr", "pair", 1, self.type_name(v))),
        }
    }

    /// Elements of a proper list or a vector.
    pub(crate) fn sequence_items(&self, v: Value) -> EngineResult<Option<Vec<Value>>> {
        match v {
            Value::Nil => Ok(Some(Vec::new())),
            Value::Object(r) => match self.heap.get(r)? {
                Object::Vector(items) => Ok(Some(items.clone())),
                Object::Pair(..) => {
                    let mut items = Vec::new();
                    let mut cur = v;
                    while let Value::Object(r) = cur {
                        match self.heap.get(r)? {
                            Object::Pair(a, d) => {
                                items.push(*a);
                                cur = *d;
                            }
                            _ => return Err(argument_error("improper list")),
                        }
                    }
                    if !cur.is_nil() {
                        return Err(argument_error("improper list"));
                    }
                    Ok(Some(items))
                }
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    /// The heap object behind `v`, if it is a handle.
    pub(crate) fn object(&self, v: Value) -> EngineResult<Option<&Object>> {
        match v {
            Value::Object(r) => self.heap.get(r).map(Some),
            _ => Ok(None),
        }
    }

    /// Collect now. Resets the allocation pressure.
    pub fn collect(&mut self) -> CollectStats {
        let stats = self.heap.collect(&self.types, self.config.poison_freed);
        self.stats.collections += 1;
        self.stats.finalized += stats.finalized;
        debug!(
            live = stats.live,
            freed = stats.freed,
            finalized = stats.finalized,
            released_bytes = stats.released_bytes,
            pressure = self.pressure,
            "collection finished"
        );
        self.pressure = 0;
        stats
    }

    /// Short name of a value's type, for diagnostics.
    pub fn type_name(&self, v: Value) -> String {
        match v {
            Value::Nil => "nil".to_owned(),
            Value::Bool(_) => "boolean".to_owned(),
            Value::Fixnum(_) => "fixnum".to_owned(),
            Value::Symbol(_) => "symbol".to_owned(),
            Value::Object(r) => match self.heap.get(r) {
                Ok(Object::Pair(..)) => "pair".to_owned(),
                Ok(Object::Vector(_)) => "vector".to_owned(),
                Ok(Object::Scalar(s)) => self.types.expr(s.ty).display(&self.interner).to_string(),
                Ok(Object::Native(nb)) => self.types.expr(nb.ty).display(&self.interner).to_string(),
                Err(_) => "stale handle".to_owned(),
            },
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        let released = self.heap.release_all(&self.types, self.config.poison_freed);
        debug!(released, "engine shut down");
    }
}

#[cfg(test)]
mod tests;
