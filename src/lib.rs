// This software is licensed under a dual license model:
//
// GNU Affero General Public License v3 (AGPLv3): You may use, modify, and
// distribute this software under the terms of the AGPLv3.
//
// Elastic License v2 (ELv2): You may also use, modify, and distribute this
// software under the Elastic License v2, which has specific restrictions.
//
// We welcome any commercial collaboration or support. For inquiries
// regarding the licenses, please contact us at:
// vectorchord-inquiry@tensorchord.ai
//
// Copyright (c) 2025 TensorChord Inc.

//! In-place bitwise combination of two equal-length `u64` word buffers.
//!
//! This is the primitive under bitset and bitmap containers: with bit `i` of
//! word `j` standing for element `64 * j + i`, [`and`] is set intersection,
//! [`or`] is union, [`and_not`] is difference and [`xor`] is symmetric
//! difference. The result is written into `destination`; `source` is only
//! read. Buffers of different lengths are rejected with [`LengthMismatch`]
//! before anything is written.
//!
//! The kernels use the widest vector instructions the CPU supports, detected
//! once, and process any words that do not fill a whole block one at a time.
//! Use an [`Engine`] to pin a specific [`Target`].

mod engine;
mod target;

pub use engine::{Engine, EngineError, EngineOptions, TargetOption};
pub use target::{Target, capability};

pub type Word = u64;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
    /// `destination & !source`. Not commutative.
    AndNot,
    Xor,
}

impl Operator {
    pub const ALL: [Operator; 4] = [
        Operator::And,
        Operator::Or,
        Operator::AndNot,
        Operator::Xor,
    ];

    /// The operator on a single pair of words.
    pub const fn scalar(self, x: Word, y: Word) -> Word {
        match self {
            Operator::And => x & y,
            Operator::Or => x | y,
            Operator::AndNot => x & !y,
            Operator::Xor => x ^ y,
        }
    }

    pub const fn is_commutative(self) -> bool {
        !matches!(self, Operator::AndNot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("length mismatch: destination has {destination_len} words but source has {source_len}")]
pub struct LengthMismatch {
    pub destination_len: usize,
    pub source_len: usize,
}

#[inline(always)]
fn check(destination: &[Word], source: &[Word]) -> Result<(), LengthMismatch> {
    if destination.len() != source.len() {
        return Err(LengthMismatch {
            destination_len: destination.len(),
            source_len: source.len(),
        });
    }
    Ok(())
}

/// `destination[i] &= source[i]`
#[inline]
pub fn and(destination: &mut [Word], source: &[Word]) -> Result<(), LengthMismatch> {
    check(destination, source)?;
    simd::bitwise::and(destination, source);
    Ok(())
}

/// `destination[i] |= source[i]`
#[inline]
pub fn or(destination: &mut [Word], source: &[Word]) -> Result<(), LengthMismatch> {
    check(destination, source)?;
    simd::bitwise::or(destination, source);
    Ok(())
}

/// `destination[i] &= !source[i]`
#[inline]
pub fn and_not(destination: &mut [Word], source: &[Word]) -> Result<(), LengthMismatch> {
    check(destination, source)?;
    simd::bitwise::andnot(destination, source);
    Ok(())
}

/// `destination[i] ^= source[i]`
#[inline]
pub fn xor(destination: &mut [Word], source: &[Word]) -> Result<(), LengthMismatch> {
    check(destination, source)?;
    simd::bitwise::xor(destination, source);
    Ok(())
}

/// Runs the kernel of `op`.
pub fn apply(
    op: Operator,
    destination: &mut [Word],
    source: &[Word],
) -> Result<(), LengthMismatch> {
    match op {
        Operator::And => and(destination, source),
        Operator::Or => or(destination, source),
        Operator::AndNot => and_not(destination, source),
        Operator::Xor => xor(destination, source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn random(n: usize) -> Vec<Word> {
        (0..n).map(|_| rand::random::<Word>()).collect()
    }

    fn reference(op: Operator, lhs: &[Word], rhs: &[Word]) -> Vec<Word> {
        lhs.iter().zip(rhs).map(|(&x, &y)| op.scalar(x, y)).collect()
    }

    fn lengths() -> Vec<usize> {
        let mut result = vec![0, 1];
        for target in Target::ALL {
            let block = target.block_words();
            for k in 1..=3 {
                result.extend([k * block - 1, k * block, k * block + 1]);
            }
        }
        let mut rng = rand::rng();
        result.extend((0..32).map(|_| rng.random_range(0..2048)));
        result
    }

    #[test]
    fn matches_reference() {
        for n in lengths() {
            let lhs = random(n);
            let rhs = random(n);
            for op in Operator::ALL {
                let mut destination = lhs.clone();
                apply(op, &mut destination, &rhs).unwrap();
                assert_eq!(destination, reference(op, &lhs, &rhs), "{op:?} n={n}");
            }
        }
    }

    #[test]
    fn source_is_unchanged() {
        for n in [0, 3, 8, 17, 200] {
            let source = random(n);
            let snapshot = source.clone();
            for op in Operator::ALL {
                let mut destination = random(n);
                apply(op, &mut destination, &source).unwrap();
                assert_eq!(source, snapshot);
            }
        }
    }

    #[test]
    fn self_operation() {
        let a = random(123);
        let mut x = a.clone();
        and(&mut x, &a).unwrap();
        assert_eq!(x, a);
        let mut x = a.clone();
        or(&mut x, &a).unwrap();
        assert_eq!(x, a);
        let mut x = a.clone();
        xor(&mut x, &a).unwrap();
        assert!(x.iter().all(|&w| w == 0));
        let mut x = a.clone();
        and_not(&mut x, &a).unwrap();
        assert!(x.iter().all(|&w| w == 0));
    }

    #[test]
    fn commutativity() {
        let a = random(77);
        let b = random(77);
        for op in Operator::ALL.into_iter().filter(|op| op.is_commutative()) {
            let mut ab = a.clone();
            apply(op, &mut ab, &b).unwrap();
            let mut ba = b.clone();
            apply(op, &mut ba, &a).unwrap();
            assert_eq!(ab, ba, "{op:?}");
        }
    }

    #[test]
    fn and_not_is_asymmetric() {
        let a = vec![0b110];
        let b = vec![0b011];
        let mut ab = a.clone();
        and_not(&mut ab, &b).unwrap();
        assert_eq!(ab, [0b100]);
        let mut ba = b.clone();
        and_not(&mut ba, &a).unwrap();
        assert_eq!(ba, [0b001]);
        assert!(!Operator::AndNot.is_commutative());
    }

    #[test]
    fn length_mismatch() {
        let mut destination = vec![7, 8, 9];
        let source = vec![1, 2, 3, 4];
        for op in Operator::ALL {
            let err = apply(op, &mut destination, &source).unwrap_err();
            assert_eq!(
                err,
                LengthMismatch {
                    destination_len: 3,
                    source_len: 4
                }
            );
        }
        assert_eq!(destination, [7, 8, 9]);
        assert_eq!(
            LengthMismatch {
                destination_len: 3,
                source_len: 4
            }
            .to_string(),
            "length mismatch: destination has 3 words but source has 4"
        );
    }

    #[test]
    fn empty_is_noop() {
        let mut destination: Vec<Word> = Vec::new();
        for op in Operator::ALL {
            apply(op, &mut destination, &[]).unwrap();
        }
        assert!(destination.is_empty());
    }

    #[test]
    fn block_and_tail() {
        // eight words fill one v3 block, the ninth goes through the tail
        let lhs = random(9);
        let rhs = random(9);
        for op in Operator::ALL {
            let mut destination = lhs.clone();
            apply(op, &mut destination, &rhs).unwrap();
            for i in 0..9 {
                assert_eq!(destination[i], op.scalar(lhs[i], rhs[i]));
            }
        }
    }

    #[test]
    fn xor_example() {
        let mut destination = vec![0xff, 0x0f];
        xor(&mut destination, &[0x0f, 0xff]).unwrap();
        assert_eq!(destination, [0xf0, 0xf0]);
    }

    #[test]
    fn set_semantics() {
        // {0, 1, 64, 130} and {1, 2, 130}
        let a = vec![0b11, 1, 1 << 2];
        let b = vec![0b110, 0, 1 << 2];
        let mut x = a.clone();
        and(&mut x, &b).unwrap();
        assert_eq!(x, [0b10, 0, 1 << 2]);
        let mut x = a.clone();
        or(&mut x, &b).unwrap();
        assert_eq!(x, [0b111, 1, 1 << 2]);
        let mut x = a.clone();
        and_not(&mut x, &b).unwrap();
        assert_eq!(x, [0b1, 1, 0]);
        let mut x = a.clone();
        xor(&mut x, &b).unwrap();
        assert_eq!(x, [0b101, 1, 0]);
    }
}
