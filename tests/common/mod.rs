//! This module contains common utilities for simplifying the writing of
//! integration tests for this library.

#![cfg(test)]

use word_arithmetic_core::{
    fixture::{self, Report},
    opcode::Opcode,
    vm::{pool::PoolCache, word::Word, Config, ExecutionContext},
};

/// The directory that holds the conformance fixtures.
pub const FIXTURE_DIRECTORY: &str = "./asset";

/// Loads the fixture for `opcode` from [`FIXTURE_DIRECTORY`] and runs it
/// using a pool from `cache`.
#[allow(unused)] // It is actually
pub fn run_fixture(opcode: Opcode, cache: &mut PoolCache) -> anyhow::Result<Report> {
    let cases = fixture::load_named(FIXTURE_DIRECTORY, opcode)?;
    assert!(!cases.is_empty(), "The fixture for {opcode} has no cases");

    Ok(fixture::run(opcode, &cases, cache)?)
}

/// Pushes `operands` in order onto a fresh execution context, executes
/// `opcode`, and pops the single result.
///
/// The context's pool is checked for consistency after execution and the
/// context is finished, so a leaked slot fails the calling test.
#[allow(unused)] // It is actually
pub fn execute_on(opcode: Opcode, operands: &[Word], cache: &mut PoolCache) -> anyhow::Result<Word> {
    let mut context = ExecutionContext::new(Config::default(), cache);
    for operand in operands {
        context.push_word(*operand)?;
    }

    context.execute(opcode)?;
    context.check_consistency()?;
    assert_eq!(context.stack().size(), 1);

    let result = context.pop_word()?;
    context.finish(cache)?;

    Ok(result)
}
