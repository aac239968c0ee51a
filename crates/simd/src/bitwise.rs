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

//! In-place bitwise kernels over `u64` words.
//!
//! Every kernel computes `lhs[i] = op(lhs[i], rhs[i])` for all `i`. The
//! specializations walk the slices in blocks of two unrolled vector lanes and
//! finish the remaining `0..block` words one at a time. The result does not
//! depend on the block size, so any specialization agrees with `fallback`.
//!
//! All kernels panic if `lhs.len() != rhs.len()`.

/// Words per block for each specialization: lane width times an unroll of two.
pub const BLOCK_V4: usize = 16;
pub const BLOCK_V3: usize = 8;
pub const BLOCK_V2: usize = 4;
pub const BLOCK_A2: usize = 4;

macro_rules! define_bitwise {
    (
        $name:ident,
        scalar: |$x:ident, $y:ident| $scalar:expr,
        v4: |$x4:ident, $y4:ident| $v4:expr,
        v3: |$x3:ident, $y3:ident| $v3:expr,
        v2: |$x2:ident, $y2:ident| $v2:expr,
        a2: |$xa:ident, $ya:ident| $a2:expr $(,)?
    ) => {
        paste::paste! {
            #[inline(always)]
            pub fn $name(lhs: &mut [u64], rhs: &[u64]) {
                $name::$name(lhs, rhs)
            }

            pub mod $name {
                #[inline]
                #[cfg(target_arch = "x86_64")]
                #[crate::target_cpu(enable = "v4")]
                pub fn [<$name _v4>](lhs: &mut [u64], rhs: &[u64]) {
                    assert!(lhs.len() == rhs.len());
                    use std::arch::x86_64::*;
                    let mut a = lhs.as_mut_ptr();
                    let mut b = rhs.as_ptr();
                    let mut n = lhs.len();
                    while n >= super::BLOCK_V4 {
                        let x_0 = unsafe { _mm512_loadu_si512(a.cast_const().cast()) };
                        let x_1 = unsafe { _mm512_loadu_si512(a.add(8).cast_const().cast()) };
                        let y_0 = unsafe { _mm512_loadu_si512(b.cast()) };
                        let y_1 = unsafe { _mm512_loadu_si512(b.add(8).cast()) };
                        let r_0 = {
                            let ($x4, $y4) = (x_0, y_0);
                            $v4
                        };
                        let r_1 = {
                            let ($x4, $y4) = (x_1, y_1);
                            $v4
                        };
                        unsafe { _mm512_storeu_si512(a.cast(), r_0) };
                        unsafe { _mm512_storeu_si512(a.add(8).cast(), r_1) };
                        a = unsafe { a.add(super::BLOCK_V4) };
                        b = unsafe { b.add(super::BLOCK_V4) };
                        n -= super::BLOCK_V4;
                    }
                    // this hint is used to disable loop unrolling
                    while std::hint::black_box(n) > 0 {
                        let $x = unsafe { a.read() };
                        let $y = unsafe { b.read() };
                        unsafe { a.write($scalar) };
                        a = unsafe { a.add(1) };
                        b = unsafe { b.add(1) };
                        n -= 1;
                    }
                }

                #[cfg(all(target_arch = "x86_64", test, not(miri)))]
                #[test]
                fn [<$name _v4_test>]() {
                    if !crate::is_cpu_detected!("v4") {
                        println!("test {} ... skipped (v4)", module_path!());
                        return;
                    }
                    super::tests::check(|lhs, rhs| unsafe { [<$name _v4>](lhs, rhs) }, fallback);
                }

                #[inline]
                #[cfg(target_arch = "x86_64")]
                #[crate::target_cpu(enable = "v3")]
                pub fn [<$name _v3>](lhs: &mut [u64], rhs: &[u64]) {
                    assert!(lhs.len() == rhs.len());
                    use std::arch::x86_64::*;
                    let mut a = lhs.as_mut_ptr();
                    let mut b = rhs.as_ptr();
                    let mut n = lhs.len();
                    while n >= super::BLOCK_V3 {
                        let x_0 = unsafe { _mm256_loadu_si256(a.cast_const().cast()) };
                        let x_1 = unsafe { _mm256_loadu_si256(a.add(4).cast_const().cast()) };
                        let y_0 = unsafe { _mm256_loadu_si256(b.cast()) };
                        let y_1 = unsafe { _mm256_loadu_si256(b.add(4).cast()) };
                        let r_0 = {
                            let ($x3, $y3) = (x_0, y_0);
                            $v3
                        };
                        let r_1 = {
                            let ($x3, $y3) = (x_1, y_1);
                            $v3
                        };
                        unsafe { _mm256_storeu_si256(a.cast(), r_0) };
                        unsafe { _mm256_storeu_si256(a.add(4).cast(), r_1) };
                        a = unsafe { a.add(super::BLOCK_V3) };
                        b = unsafe { b.add(super::BLOCK_V3) };
                        n -= super::BLOCK_V3;
                    }
                    // this hint is used to disable loop unrolling
                    while std::hint::black_box(n) > 0 {
                        let $x = unsafe { a.read() };
                        let $y = unsafe { b.read() };
                        unsafe { a.write($scalar) };
                        a = unsafe { a.add(1) };
                        b = unsafe { b.add(1) };
                        n -= 1;
                    }
                }

                #[cfg(all(target_arch = "x86_64", test, not(miri)))]
                #[test]
                fn [<$name _v3_test>]() {
                    if !crate::is_cpu_detected!("v3") {
                        println!("test {} ... skipped (v3)", module_path!());
                        return;
                    }
                    super::tests::check(|lhs, rhs| unsafe { [<$name _v3>](lhs, rhs) }, fallback);
                }

                #[inline]
                #[cfg(target_arch = "x86_64")]
                #[crate::target_cpu(enable = "v2")]
                pub fn [<$name _v2>](lhs: &mut [u64], rhs: &[u64]) {
                    assert!(lhs.len() == rhs.len());
                    use std::arch::x86_64::*;
                    let mut a = lhs.as_mut_ptr();
                    let mut b = rhs.as_ptr();
                    let mut n = lhs.len();
                    while n >= super::BLOCK_V2 {
                        let x_0 = unsafe { _mm_loadu_si128(a.cast_const().cast()) };
                        let x_1 = unsafe { _mm_loadu_si128(a.add(2).cast_const().cast()) };
                        let y_0 = unsafe { _mm_loadu_si128(b.cast()) };
                        let y_1 = unsafe { _mm_loadu_si128(b.add(2).cast()) };
                        let r_0 = {
                            let ($x2, $y2) = (x_0, y_0);
                            $v2
                        };
                        let r_1 = {
                            let ($x2, $y2) = (x_1, y_1);
                            $v2
                        };
                        unsafe { _mm_storeu_si128(a.cast(), r_0) };
                        unsafe { _mm_storeu_si128(a.add(2).cast(), r_1) };
                        a = unsafe { a.add(super::BLOCK_V2) };
                        b = unsafe { b.add(super::BLOCK_V2) };
                        n -= super::BLOCK_V2;
                    }
                    // this hint is used to disable loop unrolling
                    while std::hint::black_box(n) > 0 {
                        let $x = unsafe { a.read() };
                        let $y = unsafe { b.read() };
                        unsafe { a.write($scalar) };
                        a = unsafe { a.add(1) };
                        b = unsafe { b.add(1) };
                        n -= 1;
                    }
                }

                #[cfg(all(target_arch = "x86_64", test, not(miri)))]
                #[test]
                fn [<$name _v2_test>]() {
                    if !crate::is_cpu_detected!("v2") {
                        println!("test {} ... skipped (v2)", module_path!());
                        return;
                    }
                    super::tests::check(|lhs, rhs| unsafe { [<$name _v2>](lhs, rhs) }, fallback);
                }

                #[inline]
                #[cfg(target_arch = "aarch64")]
                #[crate::target_cpu(enable = "a2")]
                pub fn [<$name _a2>](lhs: &mut [u64], rhs: &[u64]) {
                    assert!(lhs.len() == rhs.len());
                    use std::arch::aarch64::*;
                    let mut a = lhs.as_mut_ptr();
                    let mut b = rhs.as_ptr();
                    let mut n = lhs.len();
                    while n >= super::BLOCK_A2 {
                        let x_0 = unsafe { vld1q_u64(a) };
                        let x_1 = unsafe { vld1q_u64(a.add(2)) };
                        let y_0 = unsafe { vld1q_u64(b) };
                        let y_1 = unsafe { vld1q_u64(b.add(2)) };
                        let r_0 = {
                            let ($xa, $ya) = (x_0, y_0);
                            $a2
                        };
                        let r_1 = {
                            let ($xa, $ya) = (x_1, y_1);
                            $a2
                        };
                        unsafe { vst1q_u64(a, r_0) };
                        unsafe { vst1q_u64(a.add(2), r_1) };
                        a = unsafe { a.add(super::BLOCK_A2) };
                        b = unsafe { b.add(super::BLOCK_A2) };
                        n -= super::BLOCK_A2;
                    }
                    // this hint is used to disable loop unrolling
                    while std::hint::black_box(n) > 0 {
                        let $x = unsafe { a.read() };
                        let $y = unsafe { b.read() };
                        unsafe { a.write($scalar) };
                        a = unsafe { a.add(1) };
                        b = unsafe { b.add(1) };
                        n -= 1;
                    }
                }

                #[cfg(all(target_arch = "aarch64", test, not(miri)))]
                #[test]
                fn [<$name _a2_test>]() {
                    if !crate::is_cpu_detected!("a2") {
                        println!("test {} ... skipped (a2)", module_path!());
                        return;
                    }
                    super::tests::check(|lhs, rhs| unsafe { [<$name _a2>](lhs, rhs) }, fallback);
                }

                #[crate::multiversion(@"v4", @"v3", @"v2", @"a2")]
                pub fn $name(lhs: &mut [u64], rhs: &[u64]) {
                    assert_eq!(lhs.len(), rhs.len());
                    for (l, &r) in lhs.iter_mut().zip(rhs) {
                        let ($x, $y) = (*l, r);
                        *l = $scalar;
                    }
                }
            }
        }
    };
}

define_bitwise!(
    and,
    scalar: |x, y| x & y,
    v4: |x, y| _mm512_and_si512(x, y),
    v3: |x, y| _mm256_and_si256(x, y),
    v2: |x, y| _mm_and_si128(x, y),
    a2: |x, y| vandq_u64(x, y),
);

define_bitwise!(
    or,
    scalar: |x, y| x | y,
    v4: |x, y| _mm512_or_si512(x, y),
    v3: |x, y| _mm256_or_si256(x, y),
    v2: |x, y| _mm_or_si128(x, y),
    a2: |x, y| vorrq_u64(x, y),
);

// `_mm*_andnot_*(a, b)` computes `!a & b` while `vbicq_u64(a, b)` computes
// `a & !b`, so the operands are swapped on x86 only.
define_bitwise!(
    andnot,
    scalar: |x, y| x & !y,
    v4: |x, y| _mm512_andnot_si512(y, x),
    v3: |x, y| _mm256_andnot_si256(y, x),
    v2: |x, y| _mm_andnot_si128(y, x),
    a2: |x, y| vbicq_u64(x, y),
);

define_bitwise!(
    xor,
    scalar: |x, y| x ^ y,
    v4: |x, y| _mm512_xor_si512(x, y),
    v3: |x, y| _mm256_xor_si256(x, y),
    v2: |x, y| _mm_xor_si128(x, y),
    a2: |x, y| veorq_u64(x, y),
);
