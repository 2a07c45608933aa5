#![allow(dead_code)]
use std::path::Path;

use gpc::Toolchain;
use gpc::ast::ParseNode;
use test_support::{Case, bench_cases};

pub const PROGRAMS_DIR: &str = "tests/programs";

/// Fixture programs tagged for the given bench, as `(name, source)` pairs.
pub fn workloads(tag: &str) -> Vec<(String, String)> {
    let cases = bench_cases(Path::new(PROGRAMS_DIR), tag)
        .unwrap_or_else(|err| panic!("load bench cases: {err:#}"));
    cases
        .iter()
        .map(|case: &Case| {
            let source = case
                .read_program()
                .unwrap_or_else(|err| panic!("read {}: {err:#}", case.name));
            (case.name.clone(), source)
        })
        .collect()
}

pub fn toolchain() -> Toolchain {
    Toolchain::builtin().unwrap_or_else(|err| panic!("load bundled tables: {err}"))
}

pub fn load_program(toolchain: &Toolchain, label: &str, source: &str) -> ParseNode {
    toolchain
        .parse(source)
        .unwrap_or_else(|err| panic!("parse {label}: {err}"))
}
