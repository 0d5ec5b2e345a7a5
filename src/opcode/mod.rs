//! This module contains the [`Opcode`] enumeration of the supported arithmetic
//! opcodes, and the static dispatch table that maps each of them to its
//! executor.
//!
//! # Executors
//!
//! Every opcode is implemented by a plain function of type [`ExecutionFn`].
//! It is handed the program counter it is executing at and a [`CallContext`]
//! borrowing the state of the execution context. It returns the program
//! counter of the next opcode to execute.
//!
//! # Terminology
//!
//! When referring to stack slots, we treat index 1 as being the top of the
//! stack.

pub mod arithmetic;
pub mod logic;
pub mod util;

use std::{fmt, str::FromStr};

use tracing::trace;

use crate::{
    error::{execution::Result, parse},
    vm::CallContext,
};

/// The signature shared by every opcode executor.
pub type ExecutionFn = fn(u32, &mut CallContext<'_>) -> Result<u32>;

/// The arithmetic opcodes supported by the virtual machine.
///
/// The variants are declared in the same order as [`OPCODES`], which is sorted
/// by byte value.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Opcode {
    Add,
    Mul,
    Sub,
    Div,
    SDiv,
    Mod,
    SMod,
    AddMod,
    MulMod,
    Exp,
    SignExtend,
    Lt,
    Gt,
    SLt,
    SGt,
    Eq,
    IsZero,
    And,
    Or,
    Xor,
    Not,
    Byte,
    Shl,
    Shr,
    Sar,
}

/// The static description of an opcode.
#[derive(Clone, Copy, Debug)]
pub struct OpcodeInfo {
    /// The opcode being described.
    pub opcode: Opcode,

    /// The byte that encodes the opcode in bytecode.
    pub byte: u8,

    /// The textual name of the opcode.
    pub mnemonic: &'static str,

    /// The number of operands the opcode pops from the stack.
    pub arg_count: usize,

    /// The function that executes the opcode.
    pub execute: ExecutionFn,
}

impl OpcodeInfo {
    const fn new(
        opcode: Opcode,
        byte: u8,
        mnemonic: &'static str,
        arg_count: usize,
        execute: ExecutionFn,
    ) -> Self {
        Self {
            opcode,
            byte,
            mnemonic,
            arg_count,
            execute,
        }
    }
}

/// The dispatch table, indexed by the declaration order of [`Opcode`].
pub const OPCODES: [OpcodeInfo; 25] = [
    OpcodeInfo::new(Opcode::Add, 0x01, "ADD", 2, arithmetic::add),
    OpcodeInfo::new(Opcode::Mul, 0x02, "MUL", 2, arithmetic::mul),
    OpcodeInfo::new(Opcode::Sub, 0x03, "SUB", 2, arithmetic::sub),
    OpcodeInfo::new(Opcode::Div, 0x04, "DIV", 2, arithmetic::div),
    OpcodeInfo::new(Opcode::SDiv, 0x05, "SDIV", 2, arithmetic::sdiv),
    OpcodeInfo::new(Opcode::Mod, 0x06, "MOD", 2, arithmetic::modulo),
    OpcodeInfo::new(Opcode::SMod, 0x07, "SMOD", 2, arithmetic::smod),
    OpcodeInfo::new(Opcode::AddMod, 0x08, "ADDMOD", 3, arithmetic::addmod),
    OpcodeInfo::new(Opcode::MulMod, 0x09, "MULMOD", 3, arithmetic::mulmod),
    OpcodeInfo::new(Opcode::Exp, 0x0a, "EXP", 2, arithmetic::exp),
    OpcodeInfo::new(Opcode::SignExtend, 0x0b, "SIGNEXTEND", 2, arithmetic::signextend),
    OpcodeInfo::new(Opcode::Lt, 0x10, "LT", 2, logic::lt),
    OpcodeInfo::new(Opcode::Gt, 0x11, "GT", 2, logic::gt),
    OpcodeInfo::new(Opcode::SLt, 0x12, "SLT", 2, logic::slt),
    OpcodeInfo::new(Opcode::SGt, 0x13, "SGT", 2, logic::sgt),
    OpcodeInfo::new(Opcode::Eq, 0x14, "EQ", 2, logic::eq),
    OpcodeInfo::new(Opcode::IsZero, 0x15, "ISZERO", 1, logic::iszero),
    OpcodeInfo::new(Opcode::And, 0x16, "AND", 2, logic::and),
    OpcodeInfo::new(Opcode::Or, 0x17, "OR", 2, logic::or),
    OpcodeInfo::new(Opcode::Xor, 0x18, "XOR", 2, logic::xor),
    OpcodeInfo::new(Opcode::Not, 0x19, "NOT", 1, logic::not),
    OpcodeInfo::new(Opcode::Byte, 0x1a, "BYTE", 2, logic::byte),
    OpcodeInfo::new(Opcode::Shl, 0x1b, "SHL", 2, logic::shl),
    OpcodeInfo::new(Opcode::Shr, 0x1c, "SHR", 2, logic::shr),
    OpcodeInfo::new(Opcode::Sar, 0x1d, "SAR", 2, logic::sar),
];

/// The dispatch table, with a fixed address so that entries can be borrowed
/// for `'static`.
static TABLE: [OpcodeInfo; 25] = OPCODES;

/// The opcodes indexed by their byte value.
const BY_BYTE: [Option<Opcode>; 256] = {
    let mut table = [None; 256];
    let mut index = 0;
    while index < OPCODES.len() {
        table[OPCODES[index].byte as usize] = Some(OPCODES[index].opcode);
        index += 1;
    }
    table
};

impl Opcode {
    /// Every supported opcode, in order of byte value.
    pub const ALL: [Opcode; 25] = {
        let mut all = [Opcode::Add; 25];
        let mut index = 0;
        while index < OPCODES.len() {
            all[index] = OPCODES[index].opcode;
            index += 1;
        }
        all
    };

    /// Gets the opcode encoded by `byte`, if it is a supported arithmetic
    /// opcode.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        BY_BYTE[byte as usize]
    }

    /// Gets the static description of the opcode.
    #[must_use]
    pub fn info(self) -> &'static OpcodeInfo {
        &TABLE[self as usize]
    }

    /// Gets the byte representation of the opcode.
    #[must_use]
    pub fn as_byte(self) -> u8 {
        self.info().byte
    }

    /// Gets a textual representation of the opcode to aid in debugging.
    #[must_use]
    pub fn as_text_code(self) -> &'static str {
        self.info().mnemonic
    }

    /// Gets the number of arguments that the opcode accepts from the stack.
    #[must_use]
    pub fn arg_count(self) -> usize {
        self.info().arg_count
    }
}

impl TryFrom<u8> for Opcode {
    type Error = parse::Error;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Self::from_byte(value).ok_or(parse::Error::InvalidOpcode(value))
    }
}

impl FromStr for Opcode {
    type Err = parse::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        TABLE
            .iter()
            .find(|info| info.mnemonic.eq_ignore_ascii_case(s))
            .map(|info| info.opcode)
            .ok_or_else(|| parse::Error::UnknownMnemonic(s.to_string()))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text_code())
    }
}

/// Executes `opcode` at `program_counter` against the state borrowed by
/// `context`.
///
/// Returns the program counter of the next opcode to execute.
///
/// # Errors
///
/// If the stack does not hold enough operands for the opcode, or if the pool
/// detects misuse of one of its slots.
pub fn execute(opcode: Opcode, program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    trace!(%opcode, program_counter, depth = context.stack.size(), "Executing opcode");
    (opcode.info().execute)(program_counter, context)
}

#[cfg(test)]
mod test {
    use itertools::Itertools;

    use crate::{
        error::parse,
        opcode::{Opcode, OPCODES},
    };

    #[test]
    fn table_is_indexed_by_declaration_order() {
        for (index, info) in OPCODES.iter().enumerate() {
            assert_eq!(info.opcode as usize, index);
            assert_eq!(info.opcode.info().byte, info.byte);
        }
    }

    #[test]
    fn table_is_sorted_by_unique_byte() {
        assert!(OPCODES.iter().tuple_windows().all(|(a, b)| a.byte < b.byte));
        assert_eq!(Opcode::ALL.iter().unique().count(), OPCODES.len());
    }

    #[test]
    fn can_look_up_by_byte() {
        assert_eq!(Opcode::from_byte(0x01), Some(Opcode::Add));
        assert_eq!(Opcode::from_byte(0x0b), Some(Opcode::SignExtend));
        assert_eq!(Opcode::from_byte(0x1d), Some(Opcode::Sar));
        assert_eq!(Opcode::from_byte(0x00), None);
        assert_eq!(Opcode::from_byte(0x0c), None);
        assert_eq!(Opcode::from_byte(0x20), None);

        for opcode in Opcode::ALL {
            assert_eq!(Opcode::from_byte(opcode.as_byte()), Some(opcode));
        }
    }

    #[test]
    fn rejects_unsupported_bytes() {
        let error = Opcode::try_from(0x56).expect_err("Decoded a control-flow opcode");
        assert_eq!(error, parse::Error::InvalidOpcode(0x56));
    }

    #[test]
    fn can_look_up_by_mnemonic() -> anyhow::Result<()> {
        assert_eq!("ADD".parse::<Opcode>()?, Opcode::Add);
        assert_eq!("signextend".parse::<Opcode>()?, Opcode::SignExtend);
        assert_eq!("sMoD".parse::<Opcode>()?, Opcode::SMod);

        let error = "SHA3".parse::<Opcode>().expect_err("Parsed an unknown mnemonic");
        assert_eq!(error, parse::Error::UnknownMnemonic("SHA3".into()));

        Ok(())
    }

    #[test]
    fn reports_arity() {
        assert_eq!(Opcode::IsZero.arg_count(), 1);
        assert_eq!(Opcode::Not.arg_count(), 1);
        assert_eq!(Opcode::AddMod.arg_count(), 3);
        assert_eq!(Opcode::MulMod.arg_count(), 3);
        assert_eq!(Opcode::Sub.arg_count(), 2);
        assert_eq!(Opcode::Sub.to_string(), "SUB");
    }
}
