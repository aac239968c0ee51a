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

use std::fmt::{Display, Formatter};
use std::sync::OnceLock;

/// A code path of the kernels.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Portable word-at-a-time code, left to the compiler to vectorize.
    Fallback,
    /// x86-64-v2: SSE4.2, 128-bit lanes.
    V2,
    /// x86-64-v3: AVX2, 256-bit lanes.
    V3,
    /// x86-64-v4: AVX-512, 512-bit lanes.
    V4,
    /// ARMv8 with NEON, 128-bit lanes.
    A2,
}

impl Target {
    pub const ALL: [Target; 5] = [
        Target::Fallback,
        Target::V2,
        Target::V3,
        Target::V4,
        Target::A2,
    ];

    // widest lanes first
    const PROBE: [Target; 4] = [Target::V4, Target::V3, Target::V2, Target::A2];

    /// Words per vector lane.
    pub const fn lane_words(self) -> usize {
        match self {
            Target::Fallback => 1,
            Target::V2 => 2,
            Target::V3 => 4,
            Target::V4 => 8,
            Target::A2 => 2,
        }
    }

    /// Lanes processed per block iteration.
    pub const fn unroll(self) -> usize {
        match self {
            Target::Fallback => 1,
            _ => 2,
        }
    }

    /// Words consumed per block iteration. Shorter inputs, and the last
    /// `len % block_words()` words of longer ones, go through the scalar tail.
    pub const fn block_words(self) -> usize {
        self.lane_words() * self.unroll()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Target::Fallback => "fallback",
            Target::V2 => "v2",
            Target::V3 => "v3",
            Target::V4 => "v4",
            Target::A2 => "a2",
        }
    }

    /// Whether the target belongs to the architecture this crate is compiled for.
    pub const fn is_native_arch(self) -> bool {
        match self {
            Target::Fallback => true,
            Target::V2 | Target::V3 | Target::V4 => cfg!(target_arch = "x86_64"),
            Target::A2 => cfg!(target_arch = "aarch64"),
        }
    }

    /// Whether the running CPU can execute this target.
    pub fn is_supported(self) -> bool {
        match self {
            Target::Fallback => true,
            #[cfg(target_arch = "x86_64")]
            Target::V4 => simd::is_cpu_detected!("v4"),
            #[cfg(target_arch = "x86_64")]
            Target::V3 => simd::is_cpu_detected!("v3"),
            #[cfg(target_arch = "x86_64")]
            Target::V2 => simd::is_cpu_detected!("v2"),
            #[cfg(target_arch = "aarch64")]
            Target::A2 => simd::is_cpu_detected!("a2"),
            #[allow(unreachable_patterns)]
            _ => false,
        }
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The widest target supported by the running CPU.
///
/// The CPU is probed on the first call only.
pub fn capability() -> Target {
    static CAPABILITY: OnceLock<Target> = OnceLock::new();
    *CAPABILITY.get_or_init(|| {
        let target = Target::PROBE
            .into_iter()
            .find(|target| target.is_supported())
            .unwrap_or(Target::Fallback);
        log::debug!(
            "bitwise kernels: detected target {target} ({} words per block)",
            target.block_words()
        );
        target
    })
}
