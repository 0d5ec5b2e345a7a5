//! This module contains the loader and runner for conformance fixtures.
//!
//! A fixture file is a JSON array of two-operand cases, each holding the
//! hex-encoded big-endian `X` (left) and `Y` (right) operands and the
//! `Expected` result.
//!
//! ```json
//! [
//!   { "X": "0000000000000000000000000000000000000000000000000000000000000005",
//!     "Y": "0000000000000000000000000000000000000000000000000000000000000003",
//!     "Expected": "0000000000000000000000000000000000000000000000000000000000000008" }
//! ]
//! ```
//!
//! The runner drives each case through a real execution context, so a fixture
//! exercises the stack and pool protocol of the opcode as well as its
//! arithmetic.

use std::{fs, path::Path};

use itertools::Itertools;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::{
    constant::{STALE_SEED_SLOT_COUNT, STALE_SEED_VALUE},
    error::{self, container::Locatable, fixture::Error},
    opcode::Opcode,
    vm::{pool::PoolCache, word::Word, Config, ExecutionContext},
};

/// A single conformance case for an opcode of two operands.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct TwoOperandCase {
    /// The left operand, pushed first.
    #[serde(rename = "X", alias = "left", deserialize_with = "deserialize_word")]
    pub left: Word,

    /// The right operand, pushed second and hence on top of the stack.
    #[serde(rename = "Y", alias = "right", deserialize_with = "deserialize_word")]
    pub right: Word,

    /// The result the opcode is expected to leave on the stack.
    #[serde(rename = "Expected", alias = "expected", deserialize_with = "deserialize_word")]
    pub expected: Word,
}

impl TwoOperandCase {
    /// Creates a new case from its operands and expected result.
    #[must_use]
    pub fn new(left: Word, right: Word, expected: Word) -> Self {
        Self {
            left,
            right,
            expected,
        }
    }
}

/// A case whose actual result differed from the expected one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Mismatch {
    /// The position of the case in the fixture.
    pub index: usize,

    /// The case that failed.
    pub case: TwoOperandCase,

    /// The result the opcode actually produced.
    pub actual: Word,
}

/// The outcome of running a fixture against an opcode.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Report {
    opcode:     Opcode,
    cases:      usize,
    mismatches: Vec<Mismatch>,
}

impl Report {
    /// Gets the opcode that the fixture was run against.
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Gets the number of cases that were run.
    #[must_use]
    pub fn cases(&self) -> usize {
        self.cases
    }

    /// Gets the cases that did not produce their expected result.
    #[must_use]
    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    /// Checks whether every case produced its expected result.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.mismatches.is_empty()
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{}: {} of {} cases passed",
            self.opcode,
            self.cases - self.mismatches.len(),
            self.cases
        )?;
        for mismatch in &self.mismatches {
            writeln!(
                f,
                "  case {}: {}({}, {}): expected {}, got {}",
                mismatch.index,
                self.opcode,
                mismatch.case.left,
                mismatch.case.right,
                mismatch.case.expected,
                mismatch.actual
            )?;
        }

        Ok(())
    }
}

/// Parses a hex-encoded big-endian operand of at most
/// [`crate::constant::WORD_SIZE_BYTES`] bytes.
///
/// The `0x` prefix is optional, and an odd number of digits is treated as
/// having an implicit leading zero.
///
/// # Errors
///
/// If `value` is not valid hex, or if it encodes too many bytes to fit into a
/// word.
pub fn parse_word(value: &str) -> Result<Word, Error> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    let decoded = if digits.len() % 2 == 0 {
        hex::decode(digits)
    } else {
        hex::decode(format!("0{digits}"))
    };
    let bytes = decoded.map_err(|e| Error::InvalidHex {
        value:   value.to_string(),
        message: e.to_string(),
    })?;

    Word::from_be_slice(&bytes).ok_or(Error::TooWide { bytes: bytes.len() })
}

fn deserialize_word<'de, D>(deserializer: D) -> Result<Word, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_word(&value).map_err(serde::de::Error::custom)
}

/// Parses the cases out of the JSON text of a fixture.
///
/// # Errors
///
/// If `json` is not an array of well-formed cases.
pub fn parse(json: &str) -> Result<Vec<TwoOperandCase>, Error> {
    Ok(serde_json::from_str(json)?)
}

/// Loads the cases from the fixture file at `path`.
///
/// # Errors
///
/// If the file cannot be read or does not contain well-formed cases.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<TwoOperandCase>, Error> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|e| Error::Io {
        path:    path.display().to_string(),
        message: e.to_string(),
    })?;

    parse(&json)
}

/// Gets the name of the fixture file that holds the cases for `opcode`.
#[must_use]
pub fn file_name(opcode: Opcode) -> String {
    format!("testcases_{}.json", opcode.as_text_code().to_ascii_lowercase())
}

/// Loads the cases for `opcode` from its fixture file in `directory`.
///
/// # Errors
///
/// If the file cannot be read or does not contain well-formed cases.
pub fn load_named(directory: impl AsRef<Path>, opcode: Opcode) -> Result<Vec<TwoOperandCase>, Error> {
    load(directory.as_ref().join(file_name(opcode)))
}

/// Runs `cases` against `opcode` using the default configuration and a pool
/// checked out of `cache`.
///
/// # Errors
///
/// See [`run_with_config`].
pub fn run(opcode: Opcode, cases: &[TwoOperandCase], cache: &mut PoolCache) -> error::Result<Report> {
    run_with_config(opcode, cases, Config::default(), cache)
}

/// Runs `cases` against `opcode` in a single execution context configured by
/// `config`, with its pool checked out of `cache`.
///
/// Before any case runs, the pool is seeded with free slots holding a stale
/// nonzero value, so that an opcode relying on fresh slots being zeroed is
/// caught. Each case then pushes its left and right operands, executes the
/// opcode at a program counter equal to the index of the case, and pops the
/// result. The pool's consistency is checked against the result slot before
/// it is popped.
///
/// A wrong result is recorded in the returned [`Report`] rather than being
/// treated as an error.
///
/// # Errors
///
/// If `opcode` does not take two operands, if execution fails, or if the pool
/// is found to be inconsistent. Such errors are located at the index of the
/// failing case.
pub fn run_with_config(
    opcode: Opcode,
    cases: &[TwoOperandCase],
    config: Config,
    cache: &mut PoolCache,
) -> error::Result<Report> {
    if opcode.arg_count() != 2 {
        return Err(Error::UnsupportedArity {
            opcode:    opcode.to_string(),
            arg_count: opcode.arg_count(),
        }
        .into());
    }

    let mut context = ExecutionContext::new(config, cache);
    seed_stale_slots(&mut context)?;

    let mut mismatches = Vec::new();
    for (index, case) in cases.iter().enumerate() {
        let program_counter = u32::try_from(index)
            .unwrap_or_else(|_| panic!("Fixture case count should not exceed {}", u32::MAX));
        context.set_program_counter(program_counter);

        context.push_word(case.left)?;
        context.push_word(case.right)?;
        context.execute(opcode)?;
        context
            .check_consistency()
            .map_err(|violation| violation.locate(program_counter))?;

        let actual = context.pop_word()?;
        if actual != case.expected {
            mismatches.push(Mismatch {
                index,
                case: case.clone(),
                actual,
            });
        }
    }

    context.finish(cache)?;

    let failures = mismatches.iter().map(|m| m.index).join(",");
    debug!(%opcode, cases = cases.len(), %failures, "Ran fixture");

    Ok(Report {
        opcode,
        cases: cases.len(),
        mismatches,
    })
}

/// Leaves [`STALE_SEED_SLOT_COUNT`] free slots holding [`STALE_SEED_VALUE`] in
/// the pool of `context`.
fn seed_stale_slots(context: &mut ExecutionContext) -> error::Result<()> {
    let pool = context.pool_mut();
    let stale = Word::from_be_bytes(STALE_SEED_VALUE);
    let slots = (0..STALE_SEED_SLOT_COUNT).map(|_| pool.acquire_with(stale)).collect_vec();
    for slot in slots {
        pool.release(slot).map_err(|violation| violation.locate(0))?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use ethnum::I256;

    use crate::{
        error::{self, fixture::Error},
        fixture::{self, parse_word, TwoOperandCase},
        opcode::Opcode,
        vm::{pool::PoolCache, word::Word},
    };

    #[test]
    fn parses_words_with_and_without_prefix() -> anyhow::Result<()> {
        assert_eq!(parse_word("0x05")?, Word::from(5));
        assert_eq!(parse_word("05")?, Word::from(5));
        assert_eq!(parse_word("5")?, Word::from(5));
        assert_eq!(parse_word("")?, Word::zero());
        assert_eq!(parse_word(&"ff".repeat(32))?, Word::max());

        Ok(())
    }

    #[test]
    fn rejects_bad_words() {
        let error = parse_word("0xzz").expect_err("Parsed invalid hex");
        assert!(matches!(error, Error::InvalidHex { .. }));

        let error = parse_word(&"01".repeat(33)).expect_err("Parsed an over-wide word");
        assert_eq!(error, Error::TooWide { bytes: 33 });
    }

    #[test]
    fn parses_cases_under_either_field_naming() -> anyhow::Result<()> {
        let json = r#"[
            { "X": "01", "Y": "02", "Expected": "03" },
            { "left": "0x0a", "right": "0x03", "expected": "0x07" }
        ]"#;
        let cases = fixture::parse(json)?;

        assert_eq!(cases.len(), 2);
        assert_eq!(
            cases[0],
            TwoOperandCase::new(Word::from(1), Word::from(2), Word::from(3))
        );
        assert_eq!(
            cases[1],
            TwoOperandCase::new(Word::from(10), Word::from(3), Word::from(7))
        );

        Ok(())
    }

    #[test]
    fn rejects_malformed_json() {
        let error = fixture::parse(r#"[{ "X": "01" }]"#).expect_err("Parsed an incomplete case");
        assert!(matches!(error, Error::Json(_)));
    }

    #[test]
    fn reports_missing_files() {
        let error = fixture::load("./asset/does_not_exist.json").expect_err("Loaded a missing file");
        assert!(matches!(error, Error::Io { .. }));
    }

    #[test]
    fn names_fixture_files_by_mnemonic() {
        assert_eq!(fixture::file_name(Opcode::Add), "testcases_add.json");
        assert_eq!(fixture::file_name(Opcode::SignExtend), "testcases_signextend.json");
    }

    #[test]
    fn runs_passing_and_failing_cases() -> anyhow::Result<()> {
        let minus_one = Word::from_signed(I256::from(-1));
        let cases = vec![
            TwoOperandCase::new(Word::from(10), Word::from(3), Word::from(7)),
            TwoOperandCase::new(Word::zero(), Word::one(), minus_one),
            TwoOperandCase::new(Word::from(1), Word::from(1), Word::from(1)),
        ];
        let mut cache = PoolCache::default();
        let report = fixture::run(Opcode::Sub, &cases, &mut cache)?;

        assert_eq!(report.cases(), 3);
        assert!(!report.is_success());
        assert_eq!(report.mismatches().len(), 1);
        assert_eq!(report.mismatches()[0].index, 2);
        assert_eq!(report.mismatches()[0].actual, Word::zero());
        assert_eq!(cache.len(), 1);

        Ok(())
    }

    #[test]
    fn refuses_opcodes_without_two_operands() {
        let mut cache = PoolCache::default();
        let failure = fixture::run(Opcode::AddMod, &[], &mut cache)
            .expect_err("Ran a ternary opcode on two-operand cases");
        assert!(matches!(
            failure,
            error::Error::Fixture(Error::UnsupportedArity { arg_count: 3, .. })
        ));
    }
}
