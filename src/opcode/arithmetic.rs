//! Opcodes that perform arithmetic operations on words.
//!
//! In the semantics tables below, stack index 1 is the top of the stack. As
//! operands are pushed in source order, the top of the stack always holds the
//! _right_ operand.

use crate::{
    error::execution::Result,
    opcode::util::{binary_op, ternary_op},
    vm::CallContext,
};

/// The `ADD` opcode performs addition.
///
/// # Semantics
///
/// | Stack Index | Input   | Output                     |
/// | :---------: | :-----: | :------------------------: |
/// | 1           | `right` | `(left + right) % 2**256`  |
/// | 2           | `left`  |                            |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn add(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left + right)
}

/// The `MUL` opcode performs multiplication.
///
/// # Semantics
///
/// | Stack Index | Input   | Output                     |
/// | :---------: | :-----: | :------------------------: |
/// | 1           | `right` | `(left * right) % 2**256`  |
/// | 2           | `left`  |                            |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn mul(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left * right)
}

/// The `SUB` opcode performs subtraction.
///
/// # Semantics
///
/// | Stack Index | Input   | Output                     |
/// | :---------: | :-----: | :------------------------: |
/// | 1           | `right` | `(left - right) % 2**256`  |
/// | 2           | `left`  |                            |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn sub(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left - right)
}

/// The `DIV` opcode performs integer division.
///
/// # Semantics
///
/// | Stack Index | Input   | Output                                    |
/// | :---------: | :-----: | :---------------------------------------: |
/// | 1           | `right` | `if right == 0 then 0 else left // right` |
/// | 2           | `left`  |                                           |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn div(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left / right)
}

/// The `SDIV` opcode performs signed integer division.
///
/// Both operands and the result are treated as two's complement signed 256-bit
/// integers.
///
/// # Semantics
///
/// | Stack Index | Input   | Output                                    |
/// | :---------: | :-----: | :---------------------------------------: |
/// | 1           | `right` | `if right == 0 then 0 else left // right` |
/// | 2           | `left`  |                                           |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn sdiv(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left.signed_div(right))
}

/// The `MOD` opcode performs integer modulo.
///
/// # Semantics
///
/// | Stack Index | Input   | Output                                   |
/// | :---------: | :-----: | :--------------------------------------: |
/// | 1           | `right` | `if right == 0 then 0 else left % right` |
/// | 2           | `left`  |                                          |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn modulo(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left % right)
}

/// The `SMOD` opcode performs signed integer modulo.
///
/// Both operands and the result are treated as two's complement signed 256-bit
/// integers.
///
/// # Semantics
///
/// | Stack Index | Input   | Output                                   |
/// | :---------: | :-----: | :--------------------------------------: |
/// | 1           | `right` | `if right == 0 then 0 else left % right` |
/// | 2           | `left`  |                                          |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn smod(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left.signed_rem(right))
}

/// The `ADDMOD` opcode performs addition followed by modulo.
///
/// # Note
///
/// The intermediate sum **is not** computed modulo 2**256.
///
/// # Semantics
///
/// | Stack Index | Input     | Output                                        |
/// | :---------: | :-------: | :-------------------------------------------: |
/// | 1           | `modulus` | `if modulus == 0 then 0 else (left + right) % modulus` |
/// | 2           | `right`   |                                               |
/// | 3           | `left`    |                                               |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn addmod(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    ternary_op(program_counter, context, |left, right, modulus| {
        left.add_mod(right, modulus)
    })
}

/// The `MULMOD` opcode performs multiplication followed by modulo.
///
/// # Note
///
/// The intermediate product **is not** computed modulo 2**256.
///
/// # Semantics
///
/// | Stack Index | Input     | Output                                        |
/// | :---------: | :-------: | :-------------------------------------------: |
/// | 1           | `modulus` | `if modulus == 0 then 0 else (left * right) % modulus` |
/// | 2           | `right`   |                                               |
/// | 3           | `left`    |                                               |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn mulmod(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    ternary_op(program_counter, context, |left, right, modulus| {
        left.mul_mod(right, modulus)
    })
}

/// The `EXP` opcode performs exponentiation.
///
/// # Semantics
///
/// | Stack Index | Input   | Output                      |
/// | :---------: | :-----: | :-------------------------: |
/// | 1           | `right` | `(left ** right) % 2**256`  |
/// | 2           | `left`  |                             |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn exp(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left.pow(right))
}

/// The `SIGNEXTEND` opcode extends the length of a two's complement signed
/// integer.
///
/// The byte index counts from the least-significant byte of `left`.
///
/// # Semantics
///
/// | Stack Index | Input   | Output                                      |
/// | :---------: | :-----: | :-----------------------------------------: |
/// | 1           | `right` | `left` sign-extended from byte `right`      |
/// | 2           | `left`  |                                             |
///
/// # Errors
///
/// If there are not enough operands on the stack.
pub fn signextend(program_counter: u32, context: &mut CallContext<'_>) -> Result<u32> {
    binary_op(program_counter, context, |left, right| left.sign_extend(right))
}

#[cfg(test)]
mod test {
    use ethnum::I256;

    use crate::{
        opcode::arithmetic,
        vm::{pool::PoolCache, word::Word, Config, ExecutionContext},
    };

    /// The signature shared by the executors in this module.
    type Executor = fn(u32, &mut crate::vm::CallContext<'_>) -> crate::error::execution::Result<u32>;

    /// Pushes `operands` in order, runs `executor`, and pops the single
    /// result.
    fn run(executor: Executor, operands: &[Word]) -> anyhow::Result<Word> {
        let mut cache = PoolCache::default();
        let mut context = ExecutionContext::new(Config::default(), &mut cache);
        for operand in operands {
            context.push_word(*operand)?;
        }

        let next = executor(0, &mut context.call_context(&[], &[]))?;
        assert_eq!(next, 1);
        assert_eq!(context.stack().size(), 1);
        context.check_consistency()?;

        let result = context.pop_word()?;
        context.finish(&mut cache)?;

        Ok(result)
    }

    fn signed(value: i64) -> Word {
        Word::from_signed(I256::from(value))
    }

    #[test]
    fn add_of_zeros_is_zero() -> anyhow::Result<()> {
        let result = run(arithmetic::add, &[Word::zero(), Word::zero()])?;
        assert_eq!(result, Word::zero());

        Ok(())
    }

    #[test]
    fn add_wraps_fully() -> anyhow::Result<()> {
        let result = run(arithmetic::add, &[Word::max(), Word::one()])?;
        assert_eq!(result, Word::zero());

        Ok(())
    }

    #[test]
    fn sub_underflow_wraps_to_max() -> anyhow::Result<()> {
        let result = run(arithmetic::sub, &[Word::zero(), Word::one()])?;
        assert_eq!(result, Word::max());

        Ok(())
    }

    #[test]
    fn sub_subtracts_the_top_from_the_second() -> anyhow::Result<()> {
        let result = run(arithmetic::sub, &[Word::from(10), Word::from(3)])?;
        assert_eq!(result, Word::from(7));

        Ok(())
    }

    #[test]
    fn mul_of_small_values() -> anyhow::Result<()> {
        let result = run(arithmetic::mul, &[Word::from(2), Word::from(3)])?;
        assert_eq!(result, Word::from(6));

        Ok(())
    }

    #[test]
    fn mul_truncates_to_the_word() -> anyhow::Result<()> {
        let result = run(arithmetic::mul, &[Word::max(), Word::from(2)])?;
        assert_eq!(result, Word::max() - Word::one());

        Ok(())
    }

    #[test]
    fn division_family() -> anyhow::Result<()> {
        assert_eq!(run(arithmetic::div, &[Word::from(10), Word::from(3)])?, Word::from(3));
        assert_eq!(run(arithmetic::div, &[Word::from(10), Word::zero()])?, Word::zero());
        assert_eq!(run(arithmetic::sdiv, &[signed(-10), Word::from(2)])?, signed(-5));
        assert_eq!(run(arithmetic::modulo, &[Word::from(10), Word::from(3)])?, Word::one());
        assert_eq!(run(arithmetic::smod, &[signed(-10), Word::from(3)])?, signed(-1));

        Ok(())
    }

    #[test]
    fn modular_family() -> anyhow::Result<()> {
        let addmod = run(
            arithmetic::addmod,
            &[Word::from(10), Word::from(10), Word::from(8)],
        )?;
        assert_eq!(addmod, Word::from(4));

        let mulmod = run(
            arithmetic::mulmod,
            &[Word::max(), Word::max(), Word::from(12)],
        )?;
        assert_eq!(mulmod, Word::from(9));

        Ok(())
    }

    #[test]
    fn exp_and_signextend() -> anyhow::Result<()> {
        assert_eq!(run(arithmetic::exp, &[Word::from(3), Word::from(4)])?, Word::from(81));
        assert_eq!(
            run(arithmetic::signextend, &[Word::from(0x80), Word::zero()])?,
            signed(-128)
        );

        Ok(())
    }
}
