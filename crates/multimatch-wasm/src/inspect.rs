//! Static conformance report for guest modules.

use crate::abi::{self, Requirement};
use crate::config::GuestConfig;
use crate::sandbox::{ImportBinding, classify_import, extern_kind};
use serde::Serialize;
use std::fmt;
use wasmtime::{ExternType, FuncType, Module};

/// What a guest module imports and exports, checked against the matcher
/// ABI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleReport {
    /// Size of the module bytes.
    pub size_bytes: usize,
    /// Declared imports and how each would be satisfied.
    pub imports: Vec<ImportInfo>,
    /// Declared exports.
    pub exports: Vec<ExportInfo>,
    /// One entry per ABI export.
    pub abi: Vec<AbiCheck>,
    /// True when every required ABI export is present with the right type.
    pub conforms: bool,
}

/// A module import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportInfo {
    /// Import module name.
    pub module: String,
    /// Import field name.
    pub name: String,
    /// `func`, `memory`, `table` or `global`.
    pub kind: &'static str,
    /// How the runtime satisfies it.
    pub binding: ImportBinding,
}

/// A module export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportInfo {
    /// Export name.
    pub name: String,
    /// `func`, `memory`, `table` or `global`.
    pub kind: &'static str,
    /// Signature in ABI notation.
    pub signature: String,
}

/// Result of checking one ABI export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbiCheck {
    /// Export name.
    pub name: &'static str,
    /// Expected signature.
    pub signature: &'static str,
    /// Whether the export is required.
    pub requirement: Requirement,
    /// What the module actually provides.
    pub status: AbiStatus,
}

/// Presence of an ABI export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AbiStatus {
    /// Exported with the expected signature.
    Present,
    /// Not exported.
    Missing,
    /// Exported with another signature.
    WrongSignature {
        /// The signature found.
        found: String,
    },
}

impl AbiCheck {
    /// True unless a required export is missing or mistyped.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.requirement == Requirement::Optional || self.status == AbiStatus::Present
    }
}

impl fmt::Display for AbiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => f.write_str("present"),
            Self::Missing => f.write_str("missing"),
            Self::WrongSignature { found } => write!(f, "wrong signature: {found}"),
        }
    }
}

impl ModuleReport {
    /// Required ABI exports that are missing or mistyped.
    pub fn violations(&self) -> impl Iterator<Item = &AbiCheck> {
        self.abi.iter().filter(|check| !check.is_satisfied())
    }

    /// Imports that would trap when called.
    pub fn stubbed_imports(&self) -> impl Iterator<Item = &ImportInfo> {
        self.imports
            .iter()
            .filter(|import| import.binding == ImportBinding::TrapStub)
    }
}

pub(crate) fn report(module: &Module, size_bytes: usize, config: &GuestConfig) -> ModuleReport {
    let imports = module
        .imports()
        .map(|import| ImportInfo {
            module: import.module().to_string(),
            name: import.name().to_string(),
            kind: extern_kind(&import.ty()),
            binding: classify_import(import.module(), import.name(), config),
        })
        .collect();

    let exports: Vec<ExportInfo> = module
        .exports()
        .map(|export| {
            let ty = export.ty();
            ExportInfo {
                name: export.name().to_string(),
                kind: extern_kind(&ty),
                signature: describe_extern(&ty),
            }
        })
        .collect();

    let abi: Vec<AbiCheck> = abi::EXPORTS
        .iter()
        .map(|spec| {
            let status = match exports.iter().find(|e| e.name == spec.name) {
                None => AbiStatus::Missing,
                Some(found) if found.signature == spec.signature => AbiStatus::Present,
                Some(found) => AbiStatus::WrongSignature {
                    found: found.signature.clone(),
                },
            };
            AbiCheck {
                name: spec.name,
                signature: spec.signature,
                requirement: spec.requirement,
                status,
            }
        })
        .collect();

    let conforms = abi.iter().all(AbiCheck::is_satisfied);
    ModuleReport {
        size_bytes,
        imports,
        exports,
        abi,
        conforms,
    }
}

/// Formats an extern type the way [`abi::EXPORTS`] spells signatures.
pub(crate) fn describe_extern(ty: &ExternType) -> String {
    match ty {
        ExternType::Func(func) => describe_func(func),
        other => extern_kind(other).to_string(),
    }
}

fn describe_func(func: &FuncType) -> String {
    let params: Vec<String> = func.params().map(|p| p.to_string()).collect();
    let results: Vec<String> = func.results().map(|r| r.to_string()).collect();
    let results = match results.as_slice() {
        [] => "()".to_string(),
        [single] => single.clone(),
        many => format!("({})", many.join(", ")),
    };
    format!("({}) -> {results}", params.join(", "))
}
