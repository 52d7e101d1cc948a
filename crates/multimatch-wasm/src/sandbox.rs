//! Store data, resource limits and import linking for guest instances.
//!
//! Every guest instance gets its own [`Store`] whose data is a
//! [`GuestState`]. Imports are satisfied in three tiers:
//!
//! 1. `wasi_snapshot_preview1`: a WASI preview1 context with nothing
//!    inherited from the host (when [`GuestConfig::link_wasi`] is set)
//! 2. `env.emscripten_notify_memory_growth`: a no-op
//! 3. anything else: a stub that traps if the guest ever calls it

use crate::abi;
use crate::config::GuestConfig;
use multimatch_core::Error;
use serde::Serialize;
use std::fmt;
use wasmtime::{Engine, ExternType, Linker, Module, ResourceLimiter, Store};
use wasmtime_wasi::WasiCtxBuilder;
use wasmtime_wasi::p1::{self, WasiP1Ctx};

/// Data owned by each guest store.
pub struct GuestState {
    limiter: MemoryLimiter,
    wasi: WasiP1Ctx,
}

impl fmt::Debug for GuestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuestState")
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

/// Creates a store with the configured memory limit installed.
pub(crate) fn new_store(engine: &Engine, config: &GuestConfig) -> Store<GuestState> {
    let state = GuestState {
        limiter: MemoryLimiter {
            max_memory_bytes: config.memory_limit_bytes(),
        },
        wasi: WasiCtxBuilder::new().build_p1(),
    };
    let mut store = Store::new(engine, state);
    store.limiter(|state| &mut state.limiter);
    store
}

/// Builds the import linker shared by every module of one runtime.
pub(crate) fn base_linker(
    engine: &Engine,
    config: &GuestConfig,
) -> multimatch_core::Result<Linker<GuestState>> {
    let mut linker = Linker::new(engine);

    if config.link_wasi {
        p1::add_to_linker_sync(&mut linker, |state: &mut GuestState| &mut state.wasi)
            .map_err(|e| load_error("failed to link WASI preview1", e))?;
    }

    linker
        .func_wrap(
            abi::EMSCRIPTEN_MODULE,
            abi::EMSCRIPTEN_NOTIFY_MEMORY_GROWTH,
            |memory_index: i32| {
                tracing::trace!(memory_index, "guest memory grew");
            },
        )
        .map_err(|e| load_error("failed to link emscripten memory growth hook", e))?;

    tracing::debug!(wasi = config.link_wasi, "guest linker prepared");
    Ok(linker)
}

/// Specializes the base linker for `module`, stubbing unknown imports.
pub(crate) fn module_linker(
    base: &Linker<GuestState>,
    module: &Module,
    config: &GuestConfig,
) -> multimatch_core::Result<Linker<GuestState>> {
    let mut linker = base.clone();
    for import in module.imports() {
        if classify_import(import.module(), import.name(), config) == ImportBinding::TrapStub {
            tracing::warn!(
                module = import.module(),
                name = import.name(),
                "guest import is not provided; calls will trap"
            );
        }
    }
    linker
        .define_unknown_imports_as_traps(module)
        .map_err(|e| load_error("failed to stub unknown imports", e))?;
    Ok(linker)
}

/// How a guest import is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportBinding {
    /// Provided by the WASI preview1 context.
    Wasi,
    /// The emscripten memory growth no-op.
    Emscripten,
    /// Defined as a function that traps when called.
    TrapStub,
}

/// Decides which tier satisfies an import.
#[must_use]
pub fn classify_import(module: &str, name: &str, config: &GuestConfig) -> ImportBinding {
    if module == abi::WASI_MODULE && config.link_wasi {
        ImportBinding::Wasi
    } else if module == abi::EMSCRIPTEN_MODULE && name == abi::EMSCRIPTEN_NOTIFY_MEMORY_GROWTH {
        ImportBinding::Emscripten
    } else {
        ImportBinding::TrapStub
    }
}

/// Short kind name of an import or export type.
pub(crate) const fn extern_kind(ty: &ExternType) -> &'static str {
    match ty {
        ExternType::Func(_) => "func",
        ExternType::Memory(_) => "memory",
        ExternType::Table(_) => "table",
        ExternType::Global(_) => "global",
        #[allow(unreachable_patterns)]
        _ => "tag",
    }
}

/// Wraps a runtime error as [`Error::ModuleLoad`].
pub(crate) fn load_error(context: &str, error: wasmtime::Error) -> Error {
    Error::ModuleLoad {
        message: format!("{context}: {error:#}"),
        source: Some(error.into()),
    }
}

/// Caps guest linear memory growth.
#[derive(Debug)]
struct MemoryLimiter {
    max_memory_bytes: usize,
}

impl ResourceLimiter for MemoryLimiter {
    fn memory_growing(
        &mut self,
        current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> std::result::Result<bool, anyhow::Error> {
        if desired > self.max_memory_bytes {
            tracing::warn!(
                current,
                desired,
                limit = self.max_memory_bytes,
                "guest memory growth denied"
            );
            Ok(false)
        } else {
            tracing::trace!(current, desired, "guest memory growing");
            Ok(true)
        }
    }

    fn table_growing(
        &mut self,
        _current: usize,
        _desired: usize,
        _maximum: Option<usize>,
    ) -> std::result::Result<bool, anyhow::Error> {
        Ok(true)
    }
}
