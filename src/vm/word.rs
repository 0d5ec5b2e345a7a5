//! This module contains the representation of the fixed-width words that the
//! virtual machine computes on.
//!
//! # Wraparound
//!
//! Every operation on a [`Word`] is total. Results are reduced modulo
//! `2**256`, and operations that would otherwise be undefined (such as
//! division by zero) produce zero, so no arithmetic on a word can fail.

use std::fmt::{Display, Formatter};

use ethnum::{I256, U256};

use crate::constant::{BYTE_SIZE_BITS, WORD_SIZE_BITS, WORD_SIZE_BYTES};

/// A 256-bit unsigned word.
///
/// # Representation
///
/// At the level at which the arithmetic core works, every value is just a bag
/// of bits in a 256-bit word. Operations on a `Word` may treat this word
/// numerically in a signed (two's complement) or unsigned fashion. Unsigned
/// operations are implemented in terms of the standard operators where one
/// exists, while the signed variants are explicit methods.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Word {
    value: U256,
}

impl Word {
    /// Creates a word representing zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self { value: U256::ZERO }
    }

    /// Creates a word representing one.
    #[must_use]
    pub const fn one() -> Self {
        Self { value: U256::ONE }
    }

    /// Creates the largest representable word, `2**256 - 1`.
    #[must_use]
    pub const fn max() -> Self {
        Self { value: U256::MAX }
    }

    /// Constructs a new word from the provided unsigned `value`.
    #[must_use]
    pub fn new(value: impl Into<U256>) -> Self {
        let value = value.into();
        Self { value }
    }

    /// Constructs a word by reinterpreting the bit pattern of the signed
    /// `value`.
    #[must_use]
    pub fn from_signed(value: I256) -> Self {
        let value = U256::from_ne_bytes(value.to_ne_bytes());
        Self { value }
    }

    /// Constructs a word from exactly [`WORD_SIZE_BYTES`] big-endian `bytes`.
    #[must_use]
    pub fn from_be_bytes(bytes: [u8; WORD_SIZE_BYTES]) -> Self {
        let value = U256::from_be_bytes(bytes);
        Self { value }
    }

    /// Constructs a word from a big-endian byte string of _at most_
    /// [`WORD_SIZE_BYTES`] bytes, treating missing high-order bytes as zero.
    ///
    /// Returns [`None`] if `bytes` is too wide to fit into a word.
    #[must_use]
    pub fn from_be_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > WORD_SIZE_BYTES {
            return None;
        }

        let mut buf = [0u8; WORD_SIZE_BYTES];
        buf[WORD_SIZE_BYTES - bytes.len()..].copy_from_slice(bytes);

        Some(Self::from_be_bytes(buf))
    }

    /// Gets the unsigned value of the word.
    #[must_use]
    pub fn value(&self) -> U256 {
        self.value
    }

    /// Gets the value of the word with its bit pattern interpreted as a two's
    /// complement signed number.
    #[must_use]
    pub fn value_signed(&self) -> I256 {
        I256::from_ne_bytes(self.value.to_ne_bytes())
    }

    /// Gets the bytes of this word in big-endian ordering.
    #[must_use]
    pub fn to_be_bytes(&self) -> [u8; WORD_SIZE_BYTES] {
        self.value.to_be_bytes()
    }

    /// Checks if `self` is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.value == U256::ZERO
    }

    /// Checks if the sign bit of `self` is set.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.value_signed() < I256::ZERO
    }

    /// Performs signed division, producing zero if `rhs` is zero.
    ///
    /// Dividing the most negative word by `-1` overflows, and wraps back
    /// around to the most negative word.
    #[must_use]
    pub fn signed_div(self, rhs: Self) -> Self {
        if rhs.is_zero() {
            return Self::zero();
        }

        Self::from_signed(self.value_signed().wrapping_div(rhs.value_signed()))
    }

    /// Performs signed modulo, producing zero if `rhs` is zero.
    ///
    /// The sign of a nonzero result always matches the sign of `self`.
    #[must_use]
    pub fn signed_rem(self, rhs: Self) -> Self {
        if rhs.is_zero() {
            return Self::zero();
        }

        Self::from_signed(self.value_signed().wrapping_rem(rhs.value_signed()))
    }

    /// Computes `(self + rhs) % modulus` without wrapping the intermediate
    /// sum, producing zero if `modulus` is zero.
    #[must_use]
    pub fn add_mod(self, rhs: Self, modulus: Self) -> Self {
        if modulus.is_zero() {
            return Self::zero();
        }

        // Both reduced operands are below the modulus, so the true sum is below
        // `2 * modulus` and a single subtraction brings it back into range.
        let left = self.value.wrapping_rem(modulus.value);
        let right = rhs.value.wrapping_rem(modulus.value);
        let (sum, overflowed) = left.overflowing_add(right);

        if overflowed || sum >= modulus.value {
            Self::new(sum.wrapping_sub(modulus.value))
        } else {
            Self::new(sum)
        }
    }

    /// Computes `(self * rhs) % modulus` without wrapping the intermediate
    /// product, producing zero if `modulus` is zero.
    #[must_use]
    pub fn mul_mod(self, rhs: Self, modulus: Self) -> Self {
        if modulus.is_zero() {
            return Self::zero();
        }

        // Double-and-add over the bits of `rhs`, keeping every partial result
        // reduced so that it never needs more than 257 bits.
        let base = self % modulus;
        let significant_bits = WORD_SIZE_BITS as u32 - rhs.value.leading_zeros();
        let mut result = Self::zero();
        for bit in (0..significant_bits).rev() {
            result = result.add_mod(result, modulus);
            if (rhs.value >> bit) & U256::ONE != U256::ZERO {
                result = result.add_mod(base, modulus);
            }
        }

        result
    }

    /// Computes `self ** exponent` modulo `2**256`.
    #[must_use]
    pub fn pow(self, exponent: Self) -> Self {
        let mut result = U256::ONE;
        let mut base = self.value;
        let mut exponent = exponent.value;

        while exponent != U256::ZERO {
            if exponent & U256::ONE != U256::ZERO {
                result = result.wrapping_mul(base);
            }
            base = base.wrapping_mul(base);
            exponent = exponent >> 1u32;
        }

        Self::new(result)
    }

    /// Sign-extends `self` from the byte at `byte_index`, counting from the
    /// least-significant byte.
    ///
    /// If `byte_index` addresses the top byte or beyond, `self` is returned
    /// unchanged.
    #[must_use]
    pub fn sign_extend(self, byte_index: Self) -> Self {
        if byte_index.value >= U256::from((WORD_SIZE_BYTES - 1) as u64) {
            return self;
        }

        let sign_bit = byte_index.value.as_u32() * BYTE_SIZE_BITS as u32 + 7;
        let mask = (U256::ONE << (sign_bit + 1)) - U256::ONE;

        if (self.value >> sign_bit) & U256::ONE == U256::ZERO {
            Self::new(self.value & mask)
        } else {
            Self::new(self.value | !mask)
        }
    }

    /// Gets the byte at `index` in `self`, counting from the most-significant
    /// byte, or zero if `index` is out of range.
    #[must_use]
    pub fn byte(self, index: Self) -> Self {
        if index.value >= U256::from(WORD_SIZE_BYTES as u64) {
            return Self::zero();
        }

        let index = index.value.as_u32() as usize;
        Self::new(self.to_be_bytes()[index])
    }

    /// Computes the arithmetic right shift of `self` by `shift` bits.
    ///
    /// Shifting by the full word width or more saturates to all ones for
    /// negative values and to zero otherwise.
    #[must_use]
    pub fn sar(self, shift: Self) -> Self {
        match shift.as_shift_amount() {
            Some(shift) => Self::from_signed(self.value_signed() >> shift),
            None if self.is_negative() => Self::max(),
            None => Self::zero(),
        }
    }

    /// Computes unsigned less-than.
    #[must_use]
    pub fn less_than(self, rhs: Self) -> Self {
        Self::from(self.value < rhs.value)
    }

    /// Computes unsigned greater-than.
    #[must_use]
    pub fn greater_than(self, rhs: Self) -> Self {
        Self::from(self.value > rhs.value)
    }

    /// Computes signed less-than.
    #[must_use]
    pub fn signed_less_than(self, rhs: Self) -> Self {
        Self::from(self.value_signed() < rhs.value_signed())
    }

    /// Computes signed greater-than.
    #[must_use]
    pub fn signed_greater_than(self, rhs: Self) -> Self {
        Self::from(self.value_signed() > rhs.value_signed())
    }

    /// Computes equality as a word.
    #[must_use]
    pub fn equals(self, rhs: Self) -> Self {
        Self::from(self.value == rhs.value)
    }

    /// Checks if `self` is zero, producing the answer as a word.
    #[must_use]
    pub fn is_zero_word(self) -> Self {
        Self::from(self.is_zero())
    }

    /// Gets `self` as a shift amount, or [`None`] if shifting by it would move
    /// every bit out of the word.
    fn as_shift_amount(self) -> Option<u32> {
        if self.value >= U256::from(WORD_SIZE_BITS as u64) {
            None
        } else {
            Some(self.value.as_u32())
        }
    }
}

impl std::ops::Add<Word> for Word {
    type Output = Word;

    /// Performs wrapping addition of two words.
    fn add(self, rhs: Word) -> Self::Output {
        Word::new(self.value.wrapping_add(rhs.value))
    }
}

impl std::ops::Sub<Word> for Word {
    type Output = Word;

    /// Performs wrapping subtraction of two words.
    fn sub(self, rhs: Word) -> Self::Output {
        Word::new(self.value.wrapping_sub(rhs.value))
    }
}

impl std::ops::Mul<Word> for Word {
    type Output = Word;

    /// Performs wrapping multiplication of two words, discarding the high half
    /// of the product.
    fn mul(self, rhs: Word) -> Self::Output {
        Word::new(self.value.wrapping_mul(rhs.value))
    }
}

impl std::ops::Div<Word> for Word {
    type Output = Word;

    /// Performs unsigned division, producing zero if `rhs` is zero.
    fn div(self, rhs: Word) -> Self::Output {
        if rhs.is_zero() {
            Word::zero()
        } else {
            Word::new(self.value.wrapping_div(rhs.value))
        }
    }
}

impl std::ops::Rem<Word> for Word {
    type Output = Word;

    /// Performs unsigned modulo, producing zero if `rhs` is zero.
    fn rem(self, rhs: Word) -> Self::Output {
        if rhs.is_zero() {
            Word::zero()
        } else {
            Word::new(self.value.wrapping_rem(rhs.value))
        }
    }
}

impl std::ops::BitAnd<Word> for Word {
    type Output = Word;

    fn bitand(self, rhs: Word) -> Self::Output {
        Word::new(self.value & rhs.value)
    }
}

impl std::ops::BitOr<Word> for Word {
    type Output = Word;

    fn bitor(self, rhs: Word) -> Self::Output {
        Word::new(self.value | rhs.value)
    }
}

impl std::ops::BitXor<Word> for Word {
    type Output = Word;

    fn bitxor(self, rhs: Word) -> Self::Output {
        Word::new(self.value ^ rhs.value)
    }
}

impl std::ops::Not for Word {
    type Output = Word;

    fn not(self) -> Self::Output {
        Word::new(!self.value)
    }
}

impl std::ops::Shl<Word> for Word {
    type Output = Word;

    /// Computes the left shift of `self` by `rhs` bits, producing zero if every
    /// bit is shifted out.
    fn shl(self, rhs: Word) -> Self::Output {
        match rhs.as_shift_amount() {
            Some(shift) => Word::new(self.value << shift),
            None => Word::zero(),
        }
    }
}

impl std::ops::Shr<Word> for Word {
    type Output = Word;

    /// Computes the logical right shift of `self` by `rhs` bits, producing zero
    /// if every bit is shifted out.
    fn shr(self, rhs: Word) -> Self::Output {
        match rhs.as_shift_amount() {
            Some(shift) => Word::new(self.value >> shift),
            None => Word::zero(),
        }
    }
}

impl From<bool> for Word {
    /// Booleans become one for `true` and zero for `false`.
    fn from(value: bool) -> Self {
        if value {
            Self::one()
        } else {
            Self::zero()
        }
    }
}

impl From<u64> for Word {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<U256> for Word {
    fn from(value: U256) -> Self {
        Self::new(value)
    }
}

impl From<Word> for U256 {
    fn from(value: Word) -> Self {
        value.value
    }
}

/// Displays the word as a `0x`-prefixed, zero-padded, big-endian hex string.
impl Display for Word {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_be_bytes()))
    }
}
