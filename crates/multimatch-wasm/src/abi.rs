//! Guest module ABI: export names, signatures and status codes.
//!
//! A matcher guest is a WASM module exporting a small allocator, a compile
//! entry point and a match entry point over its own linear memory. All
//! integers crossing the boundary are `i32`.

/// Guest allocator: `(size) -> offset`, 0 on failure.
pub const ALLOC: &str = "wasm_alloc";
/// Guest deallocator: `(offset) -> ()`.
pub const FREE: &str = "wasm_free";
/// Pattern compilation: `(offset, length) -> status`, 0 on success.
pub const INIT: &str = "matcher_init";
/// Matching: `(offset, length) -> index`, negative for no match.
pub const MATCH: &str = "matcher_match";
/// Pattern count of the compiled matcher: `() -> count`.
pub const PATTERN_COUNT: &str = "matcher_pattern_count";
/// Guest-side teardown: `() -> ()`, idempotent.
pub const CLOSE: &str = "matcher_close";
/// Optional diagnostic: `() -> offset` of a NUL-terminated string, 0 if none.
pub const GET_ERROR: &str = "matcher_get_error";
/// Optional failing pattern index: `() -> index`, negative if unknown.
pub const ERROR_INDEX: &str = "matcher_error_index";
/// Optional platform probe: `() -> code`, 0 if supported.
pub const CHECK_PLATFORM: &str = "matcher_check_platform";
/// Optional reactor initializer: `() -> ()`.
pub const INITIALIZE: &str = "_initialize";
/// Exported linear memory.
pub const MEMORY: &str = "memory";

/// Record separator of the pattern payload.
pub const PATTERN_SEPARATOR: char = '\n';

/// Upper bound on a diagnostic string, terminator included.
pub const MAX_DIAGNOSTIC_LEN: usize = 512;

/// Import module of WASI preview1.
pub const WASI_MODULE: &str = "wasi_snapshot_preview1";

/// Import module used by emscripten-built guests.
pub const EMSCRIPTEN_MODULE: &str = "env";
/// Memory growth notification imported by emscripten-built guests.
pub const EMSCRIPTEN_NOTIFY_MEMORY_GROWTH: &str = "emscripten_notify_memory_growth";

/// Whether an export must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Requirement {
    /// Construction fails without it.
    Required,
    /// Used when present.
    Optional,
}

/// One entry of the export contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSpec {
    /// Export name.
    pub name: &'static str,
    /// Human-readable signature.
    pub signature: &'static str,
    /// Whether the export is required.
    pub requirement: Requirement,
}

/// The full export contract, required entries first.
pub const EXPORTS: &[ExportSpec] = &[
    ExportSpec {
        name: ALLOC,
        signature: "(i32) -> i32",
        requirement: Requirement::Required,
    },
    ExportSpec {
        name: FREE,
        signature: "(i32) -> ()",
        requirement: Requirement::Required,
    },
    ExportSpec {
        name: INIT,
        signature: "(i32, i32) -> i32",
        requirement: Requirement::Required,
    },
    ExportSpec {
        name: MATCH,
        signature: "(i32, i32) -> i32",
        requirement: Requirement::Required,
    },
    ExportSpec {
        name: PATTERN_COUNT,
        signature: "() -> i32",
        requirement: Requirement::Required,
    },
    ExportSpec {
        name: CLOSE,
        signature: "() -> ()",
        requirement: Requirement::Required,
    },
    ExportSpec {
        name: MEMORY,
        signature: "memory",
        requirement: Requirement::Required,
    },
    ExportSpec {
        name: GET_ERROR,
        signature: "() -> i32",
        requirement: Requirement::Optional,
    },
    ExportSpec {
        name: ERROR_INDEX,
        signature: "() -> i32",
        requirement: Requirement::Optional,
    },
    ExportSpec {
        name: CHECK_PLATFORM,
        signature: "() -> i32",
        requirement: Requirement::Optional,
    },
    ExportSpec {
        name: INITIALIZE,
        signature: "() -> ()",
        requirement: Requirement::Optional,
    },
];

/// Describes a non-zero `matcher_init` status.
///
/// # Examples
///
/// ```
/// use multimatch_wasm::abi::describe_init_status;
///
/// assert_eq!(describe_init_status(-4), "pattern compilation failed");
/// assert_eq!(describe_init_status(-99), "unknown failure");
/// ```
#[must_use]
pub const fn describe_init_status(status: i32) -> &'static str {
    match status {
        -1 => "no patterns supplied",
        -2 => "pattern table allocation failed",
        -3 => "pattern storage allocation failed",
        -4 => "pattern compilation failed",
        -5 => "scratch space allocation failed",
        _ => "unknown failure",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_exports_listed_first() {
        let first_optional = EXPORTS
            .iter()
            .position(|e| e.requirement == Requirement::Optional)
            .unwrap();
        assert!(
            EXPORTS[first_optional..]
                .iter()
                .all(|e| e.requirement == Requirement::Optional)
        );
    }

    #[test]
    fn test_export_names_unique() {
        let mut names: Vec<_> = EXPORTS.iter().map(|e| e.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), EXPORTS.len());
    }

    #[test]
    fn test_status_descriptions() {
        assert_eq!(describe_init_status(-1), "no patterns supplied");
        assert_eq!(describe_init_status(-5), "scratch space allocation failed");
        assert_eq!(describe_init_status(7), "unknown failure");
    }
}
