//! Shared guests for the integration tests.

#![allow(dead_code)]

use multimatch_wasm::{GuestConfig, GuestRuntime};

/// The literal substring guest, as WAT text.
pub const LITERAL_MATCHER: &str = include_str!("../guests/literal_matcher.wat");

pub fn literal_matcher() -> Vec<u8> {
    wat::parse_str(LITERAL_MATCHER).unwrap()
}

pub fn runtime() -> GuestRuntime {
    GuestRuntime::new(GuestConfig::default()).unwrap()
}

pub fn runtime_with(config: GuestConfig) -> GuestRuntime {
    GuestRuntime::new(config).unwrap()
}

/// A minimal ABI guest whose entry points can be swapped for misbehaving
/// ones.
///
/// The default guest accepts any payload, reports `count` patterns and
/// never matches. Function bodies are WAT instruction sequences.
#[derive(Debug, Clone)]
pub struct StubGuest {
    pub imports: Vec<String>,
    pub memory_pages: u32,
    pub alloc: String,
    pub init: String,
    pub find: String,
    pub count: i32,
    pub omit: Vec<&'static str>,
    pub extra: Vec<String>,
}

const BUMP_ALLOC: &str = "
    (local $p i32)
    (local.set $p (global.get $heap))
    (global.set $heap
      (i32.add (global.get $heap)
        (i32.and (i32.add (local.get $size) (i32.const 7)) (i32.const -8))))
    (global.set $live (i32.add (global.get $live) (i32.const 1)))
    (local.get $p)";

impl Default for StubGuest {
    fn default() -> Self {
        Self {
            imports: Vec::new(),
            memory_pages: 1,
            alloc: BUMP_ALLOC.to_string(),
            init: "i32.const 0".to_string(),
            find: "i32.const -1".to_string(),
            count: 1,
            omit: Vec::new(),
            extra: Vec::new(),
        }
    }
}

impl StubGuest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(mut self, count: i32) -> Self {
        self.count = count;
        self
    }

    pub fn alloc(mut self, body: &str) -> Self {
        self.alloc = body.to_string();
        self
    }

    pub fn init(mut self, body: &str) -> Self {
        self.init = body.to_string();
        self
    }

    pub fn find(mut self, body: &str) -> Self {
        self.find = body.to_string();
        self
    }

    pub fn memory_pages(mut self, pages: u32) -> Self {
        self.memory_pages = pages;
        self
    }

    pub fn import(mut self, line: &str) -> Self {
        self.imports.push(line.to_string());
        self
    }

    pub fn without(mut self, export: &'static str) -> Self {
        self.omit.push(export);
        self
    }

    pub fn with(mut self, item: &str) -> Self {
        self.extra.push(item.to_string());
        self
    }

    pub fn to_wat(&self) -> String {
        let functions = [
            (
                "wasm_alloc",
                format!(
                    r#"(func (export "wasm_alloc") (param $size i32) (result i32) {})"#,
                    self.alloc
                ),
            ),
            (
                "wasm_free",
                r#"(func (export "wasm_free") (param $ptr i32)
                    (global.set $live (i32.sub (global.get $live) (i32.const 1)))
                    (if (i32.eqz (global.get $live))
                      (then (global.set $heap (i32.const 1024)))))"#
                    .to_string(),
            ),
            (
                "matcher_init",
                format!(
                    r#"(func (export "matcher_init") (param $ptr i32) (param $len i32) (result i32) {})"#,
                    self.init
                ),
            ),
            (
                "matcher_match",
                format!(
                    r#"(func (export "matcher_match") (param $ptr i32) (param $len i32) (result i32) {})"#,
                    self.find
                ),
            ),
            (
                "matcher_pattern_count",
                format!(
                    r#"(func (export "matcher_pattern_count") (result i32) i32.const {})"#,
                    self.count
                ),
            ),
            ("matcher_close", r#"(func (export "matcher_close"))"#.to_string()),
        ];

        let mut wat = String::from("(module\n");
        for import in &self.imports {
            wat.push_str(import);
            wat.push('\n');
        }
        if !self.omit.contains(&"memory") {
            wat.push_str(&format!(
                "(memory (export \"memory\") {})\n",
                self.memory_pages
            ));
        }
        wat.push_str("(global $heap (mut i32) (i32.const 1024))\n");
        wat.push_str("(global $live (mut i32) (i32.const 0))\n");
        for (name, function) in functions {
            if !self.omit.contains(&name) {
                wat.push_str(&function);
                wat.push('\n');
            }
        }
        for item in &self.extra {
            wat.push_str(item);
            wat.push('\n');
        }
        wat.push(')');
        wat
    }

    pub fn wasm(&self) -> Vec<u8> {
        wat::parse_str(self.to_wat()).unwrap()
    }
}
