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

#![allow(unsafe_code)]

use criterion::{Criterion, criterion_group, criterion_main};

// not a multiple of any block size, so the tail loop is measured too
const N: usize = 4095;

fn words() -> (Vec<u64>, Vec<u64>) {
    let x = (0..N).map(|_| rand::random::<u64>()).collect::<Vec<_>>();
    let y = (0..N).map(|_| rand::random::<u64>()).collect::<Vec<_>>();
    (x, y)
}

macro_rules! bench_bitwise {
    ($fn:ident, $name:ident) => {
        paste::paste! {
            fn $fn(c: &mut Criterion) {
                let (mut x, y) = words();
                #[cfg(target_arch = "x86_64")]
                if simd::is_cpu_detected!("v4") {
                    c.bench_function(concat!("bitwise::", stringify!($name), "::v4"), |b| {
                        b.iter(|| unsafe { simd::bitwise::$name::[<$name _v4>](&mut x, &y) })
                    });
                }
                #[cfg(target_arch = "x86_64")]
                if simd::is_cpu_detected!("v3") {
                    c.bench_function(concat!("bitwise::", stringify!($name), "::v3"), |b| {
                        b.iter(|| unsafe { simd::bitwise::$name::[<$name _v3>](&mut x, &y) })
                    });
                }
                #[cfg(target_arch = "x86_64")]
                if simd::is_cpu_detected!("v2") {
                    c.bench_function(concat!("bitwise::", stringify!($name), "::v2"), |b| {
                        b.iter(|| unsafe { simd::bitwise::$name::[<$name _v2>](&mut x, &y) })
                    });
                }
                #[cfg(target_arch = "aarch64")]
                if simd::is_cpu_detected!("a2") {
                    c.bench_function(concat!("bitwise::", stringify!($name), "::a2"), |b| {
                        b.iter(|| unsafe { simd::bitwise::$name::[<$name _a2>](&mut x, &y) })
                    });
                }
                c.bench_function(concat!("bitwise::", stringify!($name), "::dispatch"), |b| {
                    b.iter(|| simd::bitwise::$name(&mut x, &y))
                });
            }
        }
    };
}

bench_bitwise!(bitwise_and, and);
bench_bitwise!(bitwise_or, or);
bench_bitwise!(bitwise_andnot, andnot);
bench_bitwise!(bitwise_xor, xor);

criterion_group!(
    benches,
    bitwise_and,
    bitwise_or,
    bitwise_andnot,
    bitwise_xor
);
criterion_main!(benches);
