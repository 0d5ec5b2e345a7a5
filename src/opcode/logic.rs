//! Opcodes that perform comparisons and bitwise logic on words.
//!
//! Comparisons produce `1` when they hold and `0` otherwise. As with the
//! arithmetic opcodes, stack index 1 is the top of the stack and holds the
//! _right_ operand.

use crate::{
    error::execution::Result,
    opcode::util::{binary_op, unary_op},
    vm::CallContext,
};

/// The `LT` opcode performs a less-than comparison.
///
/// # Semantics
///
/// | Stack Index | Input   | Output         |
/// | :---------: | :-----: | :------------: |
/// | 1           | `right` | `left < right` |
/// | 2           | `left`  |                |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn lt(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left.less_than(right))
}

/// The `GT` opcode performs a greater-than comparison.
///
/// # Semantics
///
/// | Stack Index | Input   | Output         |
/// | :---------: | :-----: | :------------: |
/// | 1           | `right` | `left > right` |
/// | 2           | `left`  |                |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn gt(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left.greater_than(right))
}

/// The `SLT` opcode performs a less-than comparison, treating both operands as
/// signed two's complement integers.
///
/// # Semantics
///
/// | Stack Index | Input   | Output         |
/// | :---------: | :-----: | :------------: |
/// | 1           | `right` | `left < right` |
/// | 2           | `left`  |                |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn slt(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left.signed_less_than(right))
}

/// The `SGT` opcode performs a greater-than comparison, treating both operands
/// as signed two's complement integers.
///
/// # Semantics
///
/// | Stack Index | Input   | Output         |
/// | :---------: | :-----: | :------------: |
/// | 1           | `right` | `left > right` |
/// | 2           | `left`  |                |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn sgt(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left.signed_greater_than(right))
}

/// The `EQ` opcode performs an equality comparison.
///
/// # Semantics
///
/// | Stack Index | Input   | Output          |
/// | :---------: | :-----: | :-------------: |
/// | 1           | `right` | `left == right` |
/// | 2           | `left`  |                 |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn eq(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left.equals(right))
}

/// The `ISZERO` opcode checks if the provided operand is zero.
///
/// # Semantics
///
/// | Stack Index | Input | Output   |
/// | :---------: | :---: | :------: |
/// | 1           | `x`   | `x == 0` |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn iszero(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    unary_op(program_counter, context, |operand| operand.is_zero_word())
}

/// The `AND` opcode performs bitwise conjunction.
///
/// # Semantics
///
/// | Stack Index | Input   | Output         |
/// | :---------: | :-----: | :------------: |
/// | 1           | `right` | `left & right` |
/// | 2           | `left`  |                |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn and(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left & right)
}

/// The `OR` opcode performs bitwise disjunction.
///
/// # Semantics
///
/// | Stack Index | Input   | Output         |
/// | :---------: | :-----: | :------------: |
/// | 1           | `right` | `left \| right` |
/// | 2           | `left`  |                |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn or(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left | right)
}

/// The `XOR` opcode performs bitwise exclusive disjunction.
///
/// # Semantics
///
/// | Stack Index | Input   | Output         |
/// | :---------: | :-----: | :------------: |
/// | 1           | `right` | `left ^ right` |
/// | 2           | `left`  |                |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn xor(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left ^ right)
}

/// The `NOT` opcode performs bitwise negation.
///
/// # Semantics
///
/// | Stack Index | Input | Output |
/// | :---------: | :---: | :----: |
/// | 1           | `x`   | `~x`   |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn not(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    unary_op(program_counter, context, |operand| !operand)
}

/// The `BYTE` opcode retrieves a single byte from a word.
///
/// The byte index counts from the most-significant byte, and any index past
/// the end of the word produces zero.
///
/// # Semantics
///
/// | Stack Index | Input   | Output                        |
/// | :---------: | :-----: | :---------------------------: |
/// | 1           | `right` | the `right`th byte of `left`  |
/// | 2           | `left`  |                               |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn byte(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left.byte(right))
}

/// The `SHL` opcode performs a left shift.
///
/// # Semantics
///
/// | Stack Index | Input   | Output          |
/// | :---------: | :-----: | :-------------: |
/// | 1           | `right` | `left << right` |
/// | 2           | `left`  |                 |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn shl(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left << right)
}

/// The `SHR` opcode performs a logical right shift.
///
/// # Semantics
///
/// | Stack Index | Input   | Output          |
/// | :---------: | :-----: | :-------------: |
/// | 1           | `right` | `left >> right` |
/// | 2           | `left`  |                 |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn shr(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left >> right)
}

/// The `SAR` opcode performs an arithmetic right shift, preserving the sign of
/// `left`.
///
/// # Semantics
///
/// | Stack Index | Input   | Output          |
/// | :---------: | :-----: | :-------------: |
/// | 1           | `right` | `left >> right` |
/// | 2           | `left`  |                 |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn sar(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left.sar(right))
}

#[cfg(test)]
mod test {
    use ethnum::I256;

    use crate::{
        opcode::{execute, Opcode},
        vm::{pool::PoolCache, word::Word, Config, ExecutionContext},
    };

    /// Pushes `operands` in order, executes `opcode`, and pops the result.
    fn run(opcode: Opcode, operands: &[Word]) -> anyhow::Result<Word> {
        let mut cache = PoolCache::default();
        let mut context = ExecutionContext::new(Config::default(), &mut cache);
        for operand in operands {
            context.push_word(*operand)?;
        }

        execute(opcode, 0, &mut context.call_context(&[], &[]))?;
        let result = context.pop_word()?;
        assert!(context.stack().is_empty());

        Ok(result)
    }

    #[test]
    fn comparisons_treat_the_top_as_the_right_operand() -> anyhow::Result<()> {
        assert_eq!(run(Opcode::Lt, &[Word::from(1), Word::from(2)])?, Word::one());
        assert_eq!(run(Opcode::Gt, &[Word::from(1), Word::from(2)])?, Word::zero());

        let minus_one = Word::from_signed(I256::from(-1));
        assert_eq!(run(Opcode::SLt, &[minus_one, Word::zero()])?, Word::one());
        assert_eq!(run(Opcode::SGt, &[minus_one, Word::zero()])?, Word::zero());
        assert_eq!(run(Opcode::Eq, &[minus_one, Word::max()])?, Word::one());

        Ok(())
    }

    #[test]
    fn unary_logic() -> anyhow::Result<()> {
        assert_eq!(run(Opcode::IsZero, &[Word::zero()])?, Word::one());
        assert_eq!(run(Opcode::IsZero, &[Word::max()])?, Word::zero());
        assert_eq!(run(Opcode::Not, &[Word::zero()])?, Word::max());

        Ok(())
    }

    #[test]
    fn bitwise_logic() -> anyhow::Result<()> {
        assert_eq!(run(Opcode::And, &[Word::from(0b1100), Word::from(0b1010)])?, Word::from(0b1000));
        assert_eq!(run(Opcode::Or, &[Word::from(0b1100), Word::from(0b1010)])?, Word::from(0b1110));
        assert_eq!(run(Opcode::Xor, &[Word::from(0b1100), Word::from(0b1010)])?, Word::from(0b0110));

        Ok(())
    }

    #[test]
    fn byte_and_shifts() -> anyhow::Result<()> {
        assert_eq!(run(Opcode::Byte, &[Word::from(0xab), Word::from(31)])?, Word::from(0xab));
        assert_eq!(run(Opcode::Shl, &[Word::one(), Word::from(4)])?, Word::from(16));
        assert_eq!(run(Opcode::Shr, &[Word::from(16), Word::from(4)])?, Word::one());
        assert_eq!(run(Opcode::Sar, &[Word::max(), Word::from(4)])?, Word::max());

        Ok(())
    }
}
