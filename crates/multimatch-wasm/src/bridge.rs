//! Host side of the guest memory protocol.
//!
//! A [`GuestBridge`] owns one instantiated guest: its store, its exported
//! memory and its resolved entry points. It moves bytes across the boundary
//! with explicit allocate/write/free steps, checks every access against the
//! guest's current memory size, and converts traps into [`Error`] values.
//!
//! The bridge is not synchronized. Callers that share one across threads
//! must hold a lock for the full allocate → write → call → free sequence.

use crate::abi;
use crate::monitor::BridgeMonitor;
use crate::sandbox::GuestState;
use multimatch_core::{Error, Result};
use std::fmt;
use std::sync::Arc;
use wasmtime::{Instance, Memory, Store, Trap, TypedFunc, WasmParams, WasmResults};

/// A byte range allocated by the guest allocator.
///
/// Neither `Clone` nor `Copy`: [`GuestBridge::free`] consumes it, so a
/// buffer cannot be freed twice.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "guest buffers must be released with GuestBridge::free"]
pub struct GuestBuffer {
    offset: u32,
    len: u32,
}

impl GuestBuffer {
    /// Start offset in guest memory.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset as usize
    }

    /// Length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether the buffer is zero-length.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    const fn abi_offset(&self) -> i32 {
        self.offset.cast_signed()
    }

    const fn abi_len(&self) -> i32 {
        self.len.cast_signed()
    }
}

/// Resolved guest entry points.
struct GuestExports {
    alloc: TypedFunc<i32, i32>,
    free: TypedFunc<i32, ()>,
    init: TypedFunc<(i32, i32), i32>,
    find: TypedFunc<(i32, i32), i32>,
    pattern_count: TypedFunc<(), i32>,
    close: TypedFunc<(), ()>,
    get_error: Option<TypedFunc<(), i32>>,
    error_index: Option<TypedFunc<(), i32>>,
    check_platform: Option<TypedFunc<(), i32>>,
    initialize: Option<TypedFunc<(), ()>>,
}

impl GuestExports {
    fn resolve(instance: &Instance, store: &mut Store<GuestState>) -> Result<Self> {
        Ok(Self {
            alloc: required(instance, store, abi::ALLOC)?,
            free: required(instance, store, abi::FREE)?,
            init: required(instance, store, abi::INIT)?,
            find: required(instance, store, abi::MATCH)?,
            pattern_count: required(instance, store, abi::PATTERN_COUNT)?,
            close: required(instance, store, abi::CLOSE)?,
            get_error: optional(instance, store, abi::GET_ERROR)?,
            error_index: optional(instance, store, abi::ERROR_INDEX)?,
            check_platform: optional(instance, store, abi::CHECK_PLATFORM)?,
            initialize: optional(instance, store, abi::INITIALIZE)?,
        })
    }
}

fn expected_signature(name: &str) -> String {
    abi::EXPORTS
        .iter()
        .find(|spec| spec.name == name)
        .map_or("unknown", |spec| spec.signature)
        .to_string()
}

fn required<P, R>(
    instance: &Instance,
    store: &mut Store<GuestState>,
    name: &str,
) -> Result<TypedFunc<P, R>>
where
    P: WasmParams,
    R: WasmResults,
{
    optional(instance, store, name)?.ok_or_else(|| Error::MissingExport {
        name: name.to_string(),
    })
}

fn optional<P, R>(
    instance: &Instance,
    store: &mut Store<GuestState>,
    name: &str,
) -> Result<Option<TypedFunc<P, R>>>
where
    P: WasmParams,
    R: WasmResults,
{
    let Some(func) = instance.get_func(&mut *store, name) else {
        return Ok(None);
    };
    func.typed::<P, R>(&*store)
        .map(Some)
        .map_err(|_| Error::ExportSignature {
            name: name.to_string(),
            expected: expected_signature(name),
        })
}

/// Converts a failed guest call into [`Error::GuestTrap`].
fn trap_error(operation: &str, error: &wasmtime::Error) -> Error {
    match error.downcast_ref::<Trap>() {
        Some(trap) => Error::guest_trap(operation, format!("{trap} ({error:#})")),
        None => Error::guest_trap(operation, format!("{error:#}")),
    }
}

/// Calls a guest function, counting the call and converting failures.
fn invoke<P, R>(
    store: &mut Store<GuestState>,
    monitor: &BridgeMonitor,
    operation: &str,
    func: &TypedFunc<P, R>,
    params: P,
) -> Result<R>
where
    P: WasmParams,
    R: WasmResults,
{
    let result = func.call(store, params);
    monitor.record_call(result.is_err());
    result.map_err(|e| {
        let error = trap_error(operation, &e);
        tracing::debug!(operation, error = %error, "guest call failed");
        error
    })
}

/// One instantiated guest and the protocol primitives over it.
pub struct GuestBridge {
    store: Store<GuestState>,
    memory: Memory,
    exports: GuestExports,
    monitor: Arc<BridgeMonitor>,
}

impl fmt::Debug for GuestBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuestBridge")
            .field("memory_size", &self.memory_size())
            .field("has_diagnostics", &self.exports.get_error.is_some())
            .field("stats", &self.monitor.snapshot())
            .finish_non_exhaustive()
    }
}

impl GuestBridge {
    /// Resolves the guest's memory and entry points.
    ///
    /// Required exports are resolved eagerly; optional ones are recorded
    /// when present.
    pub(crate) fn new(
        instance: &Instance,
        mut store: Store<GuestState>,
        monitor: Arc<BridgeMonitor>,
    ) -> Result<Self> {
        let memory = instance
            .get_memory(&mut store, abi::MEMORY)
            .ok_or_else(|| Error::MissingExport {
                name: abi::MEMORY.to_string(),
            })?;
        let exports = GuestExports::resolve(instance, &mut store)?;
        Ok(Self {
            store,
            memory,
            exports,
            monitor,
        })
    }

    /// Counters shared with the owning matcher.
    #[must_use]
    pub fn monitor(&self) -> &Arc<BridgeMonitor> {
        &self.monitor
    }

    /// Current size of guest linear memory in bytes.
    #[must_use]
    pub fn memory_size(&self) -> usize {
        self.memory.data_size(&self.store)
    }

    fn check_bounds(&self, offset: usize, length: usize) -> Result<()> {
        let memory_size = self.memory_size();
        match offset.checked_add(length) {
            Some(end) if end <= memory_size => Ok(()),
            _ => Err(Error::MemoryBounds {
                offset,
                length,
                memory_size,
            }),
        }
    }

    /// Requests `size` bytes from the guest allocator.
    ///
    /// # Errors
    ///
    /// - [`Error::GuestAllocation`] if the guest returns 0 or `size` is 0 or
    ///   does not fit an `i32`
    /// - [`Error::MemoryBounds`] if the returned range lies outside guest
    ///   memory (the range is released before returning)
    /// - [`Error::GuestTrap`] if the allocator traps
    pub fn allocate(&mut self, size: usize) -> Result<GuestBuffer> {
        let len = i32::try_from(size)
            .ok()
            .filter(|&len| len > 0)
            .ok_or(Error::GuestAllocation { size })?;

        let offset = invoke(
            &mut self.store,
            &self.monitor,
            abi::ALLOC,
            &self.exports.alloc,
            len,
        )?;
        if offset == 0 {
            return Err(Error::GuestAllocation { size });
        }

        let buffer = GuestBuffer {
            offset: offset.cast_unsigned(),
            len: len.cast_unsigned(),
        };
        self.monitor.record_allocation(size);

        if let Err(e) = self.check_bounds(buffer.offset(), buffer.len()) {
            self.free(buffer)?;
            return Err(e);
        }
        Ok(buffer)
    }

    /// Copies `bytes` to the start of `buffer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemoryBounds`] if `bytes` is longer than `buffer` or
    /// the range no longer fits guest memory.
    pub fn write(&mut self, buffer: &GuestBuffer, bytes: &[u8]) -> Result<()> {
        if bytes.len() > buffer.len() {
            return Err(Error::MemoryBounds {
                offset: buffer.offset(),
                length: bytes.len(),
                memory_size: buffer.len(),
            });
        }
        self.check_bounds(buffer.offset(), bytes.len())?;
        self.memory
            .write(&mut self.store, buffer.offset(), bytes)
            .map_err(|_| Error::MemoryBounds {
                offset: buffer.offset(),
                length: bytes.len(),
                memory_size: self.memory.data_size(&self.store),
            })?;
        self.monitor.record_write(bytes.len());
        Ok(())
    }

    /// Copies `length` bytes starting at `offset` out of guest memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemoryBounds`] if the range does not fit guest
    /// memory.
    pub fn read(&self, offset: usize, length: usize) -> Result<Vec<u8>> {
        self.check_bounds(offset, length)?;
        let mut bytes = vec![0; length];
        self.memory
            .read(&self.store, offset, &mut bytes)
            .map_err(|_| Error::MemoryBounds {
                offset,
                length,
                memory_size: self.memory_size(),
            })?;
        Ok(bytes)
    }

    /// Returns `buffer` to the guest allocator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GuestTrap`] if the deallocator traps.
    pub fn free(&mut self, buffer: GuestBuffer) -> Result<()> {
        self.monitor.record_free();
        invoke(
            &mut self.store,
            &self.monitor,
            abi::FREE,
            &self.exports.free,
            buffer.abi_offset(),
        )
    }

    /// Copies `bytes` into a fresh guest buffer, runs `f` with the buffer's
    /// `(offset, length)`, and frees the buffer whatever the outcome.
    ///
    /// An error from the write or from `f` takes precedence over an error
    /// from the free.
    ///
    /// # Errors
    ///
    /// Any error from allocation, the write, `f`, or the free.
    pub fn with_guest_bytes<T>(
        &mut self,
        bytes: &[u8],
        f: impl FnOnce(&mut Self, i32, i32) -> Result<T>,
    ) -> Result<T> {
        let buffer = self.allocate(bytes.len())?;
        let (offset, len) = (buffer.abi_offset(), buffer.abi_len());
        let outcome = self.write(&buffer, bytes).and_then(|()| f(self, offset, len));
        let freed = self.free(buffer);
        let value = outcome?;
        freed?;
        Ok(value)
    }

    /// Calls `_initialize` if the guest exports it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GuestTrap`] if the initializer traps.
    pub fn initialize(&mut self) -> Result<()> {
        if let Some(initialize) = &self.exports.initialize {
            tracing::debug!("calling guest reactor initializer");
            invoke(&mut self.store, &self.monitor, abi::INITIALIZE, initialize, ())?;
        }
        Ok(())
    }

    /// Runs the platform probe; `None` if the guest has none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GuestTrap`] if the probe traps.
    pub fn check_platform(&mut self) -> Result<Option<i32>> {
        match &self.exports.check_platform {
            Some(check) => {
                invoke(&mut self.store, &self.monitor, abi::CHECK_PLATFORM, check, ()).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Invokes `matcher_init` on a payload already in guest memory.
    pub(crate) fn init(&mut self, offset: i32, len: i32) -> Result<i32> {
        invoke(
            &mut self.store,
            &self.monitor,
            abi::INIT,
            &self.exports.init,
            (offset, len),
        )
    }

    /// Invokes `matcher_match` on an input already in guest memory.
    pub(crate) fn find(&mut self, offset: i32, len: i32) -> Result<i32> {
        invoke(
            &mut self.store,
            &self.monitor,
            abi::MATCH,
            &self.exports.find,
            (offset, len),
        )
    }

    /// Asks the guest how many patterns it compiled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GuestTrap`] if the call traps.
    pub fn pattern_count(&mut self) -> Result<i32> {
        invoke(
            &mut self.store,
            &self.monitor,
            abi::PATTERN_COUNT,
            &self.exports.pattern_count,
            (),
        )
    }

    /// Index of the pattern that failed compilation, if the guest reports
    /// one.
    pub fn error_index(&mut self) -> Option<usize> {
        let error_index = self.exports.error_index.as_ref()?;
        let index = invoke(&mut self.store, &self.monitor, abi::ERROR_INDEX, error_index, ()).ok()?;
        usize::try_from(index).ok()
    }

    /// Reads the guest's current diagnostic string.
    ///
    /// Returns `None` if the guest has no diagnostics export, reports no
    /// error, or points outside its memory. At most
    /// [`abi::MAX_DIAGNOSTIC_LEN`] bytes are read; the string ends at the
    /// first NUL.
    pub fn read_diagnostic(&mut self) -> Option<String> {
        let get_error = self.exports.get_error.as_ref()?;
        let offset = invoke(&mut self.store, &self.monitor, abi::GET_ERROR, get_error, ()).ok()?;
        if offset == 0 {
            return None;
        }
        let offset = usize::try_from(offset.cast_unsigned()).ok()?;
        let available = self.memory_size().checked_sub(offset)?;
        let bytes = self
            .read(offset, available.min(abi::MAX_DIAGNOSTIC_LEN))
            .ok()?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Releases guest-side matcher state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GuestTrap`] if `matcher_close` traps.
    pub fn close_guest(&mut self) -> Result<()> {
        invoke(
            &mut self.store,
            &self.monitor,
            abi::CLOSE,
            &self.exports.close,
            (),
        )
    }
}
