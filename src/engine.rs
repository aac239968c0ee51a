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

use crate::target::{Target, capability};
use crate::{LengthMismatch, Operator, check};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to parse engine options: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid engine options: {0}")]
    InvalidOptions(#[from] validator::ValidationErrors),
    #[error("target `{0}` is not supported by this CPU")]
    Unsupported(Target),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetOption {
    /// The widest target the CPU supports.
    #[default]
    Auto,
    Fallback,
    V2,
    V3,
    V4,
    A2,
}

impl TargetOption {
    pub fn target(self) -> Option<Target> {
        match self {
            TargetOption::Auto => None,
            TargetOption::Fallback => Some(Target::Fallback),
            TargetOption::V2 => Some(Target::V2),
            TargetOption::V3 => Some(Target::V3),
            TargetOption::V4 => Some(Target::V4),
            TargetOption::A2 => Some(Target::A2),
        }
    }
}

impl From<Target> for TargetOption {
    fn from(target: Target) -> Self {
        match target {
            Target::Fallback => TargetOption::Fallback,
            Target::V2 => TargetOption::V2,
            Target::V3 => TargetOption::V3,
            Target::V4 => TargetOption::V4,
            Target::A2 => TargetOption::A2,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "Self::validate_self"))]
pub struct EngineOptions {
    #[serde(default)]
    pub target: TargetOption,
}

impl EngineOptions {
    pub fn validate_self(&self) -> Result<(), ValidationError> {
        match self.target.target() {
            Some(target) if !target.is_native_arch() => Err(ValidationError::new(
                "target is not available on this architecture",
            )),
            _ => Ok(()),
        }
    }

    pub fn from_toml(s: &str) -> Result<Self, EngineError> {
        let options = toml::from_str::<Self>(s)?;
        options.validate()?;
        Ok(options)
    }
}

type Kernel = unsafe fn(&mut [u64], &[u64]);

#[derive(Debug, Clone, Copy)]
struct Kernels {
    and: Kernel,
    or: Kernel,
    andnot: Kernel,
    xor: Kernel,
}

impl Kernels {
    fn of(target: Target) -> Self {
        use simd::bitwise::{and, andnot, or, xor};
        match target {
            #[cfg(target_arch = "x86_64")]
            Target::V4 => Self {
                and: and::and_v4,
                or: or::or_v4,
                andnot: andnot::andnot_v4,
                xor: xor::xor_v4,
            },
            #[cfg(target_arch = "x86_64")]
            Target::V3 => Self {
                and: and::and_v3,
                or: or::or_v3,
                andnot: andnot::andnot_v3,
                xor: xor::xor_v3,
            },
            #[cfg(target_arch = "x86_64")]
            Target::V2 => Self {
                and: and::and_v2,
                or: or::or_v2,
                andnot: andnot::andnot_v2,
                xor: xor::xor_v2,
            },
            #[cfg(target_arch = "aarch64")]
            Target::A2 => Self {
                and: and::and_a2,
                or: or::or_a2,
                andnot: andnot::andnot_a2,
                xor: xor::xor_a2,
            },
            _ => Self {
                and: and::fallback,
                or: or::fallback,
                andnot: andnot::fallback,
                xor: xor::fallback,
            },
        }
    }
}

/// Kernels pinned to one target.
///
/// The target is resolved once, in [`Engine::new`]. The free functions of the
/// crate root pick their own target on first use; an engine is for callers that
/// want to choose or know it, e.g. to compare code paths.
#[derive(Debug, Clone, Copy)]
pub struct Engine {
    target: Target,
    kernels: Kernels,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Result<Self, EngineError> {
        options.validate()?;
        let target = match options.target.target() {
            None => capability(),
            Some(target) if target.is_supported() => target,
            Some(target) => return Err(EngineError::Unsupported(target)),
        };
        log::info!(
            "bitwise engine: target {target}, {} words per block",
            target.block_words()
        );
        Ok(Self {
            target,
            kernels: Kernels::of(target),
        })
    }

    pub fn from_toml(s: &str) -> Result<Self, EngineError> {
        Self::new(EngineOptions::from_toml(s)?)
    }

    pub fn target(&self) -> Target {
        self.target
    }

    #[allow(unsafe_code)]
    fn run(
        &self,
        kernel: Kernel,
        destination: &mut [u64],
        source: &[u64],
    ) -> Result<(), LengthMismatch> {
        check(destination, source)?;
        // `new` only builds engines for supported targets
        unsafe { kernel(destination, source) };
        Ok(())
    }

    pub fn and(&self, destination: &mut [u64], source: &[u64]) -> Result<(), LengthMismatch> {
        self.run(self.kernels.and, destination, source)
    }

    pub fn or(&self, destination: &mut [u64], source: &[u64]) -> Result<(), LengthMismatch> {
        self.run(self.kernels.or, destination, source)
    }

    pub fn and_not(&self, destination: &mut [u64], source: &[u64]) -> Result<(), LengthMismatch> {
        self.run(self.kernels.andnot, destination, source)
    }

    pub fn xor(&self, destination: &mut [u64], source: &[u64]) -> Result<(), LengthMismatch> {
        self.run(self.kernels.xor, destination, source)
    }

    pub fn apply(
        &self,
        op: Operator,
        destination: &mut [u64],
        source: &[u64],
    ) -> Result<(), LengthMismatch> {
        match op {
            Operator::And => self.and(destination, source),
            Operator::Or => self.or(destination, source),
            Operator::AndNot => self.and_not(destination, source),
            Operator::Xor => self.xor(destination, source),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        let target = capability();
        Self {
            target,
            kernels: Kernels::of(target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random(n: usize) -> Vec<u64> {
        (0..n).map(|_| rand::random::<u64>()).collect()
    }

    #[test]
    fn options_default_to_auto() {
        let options = EngineOptions::from_toml("").unwrap();
        assert_eq!(options.target, TargetOption::Auto);
        let engine = Engine::new(options).unwrap();
        assert_eq!(engine.target(), capability());
        assert_eq!(Engine::default().target(), capability());
    }

    #[test]
    fn options_parse_target() {
        let options = EngineOptions::from_toml("target = \"fallback\"").unwrap();
        assert_eq!(options.target, TargetOption::Fallback);
        let engine = Engine::from_toml("target = \"fallback\"").unwrap();
        assert_eq!(engine.target(), Target::Fallback);
    }

    #[test]
    fn options_reject_unknown_fields_and_values() {
        assert!(matches!(
            EngineOptions::from_toml("unroll = 4"),
            Err(EngineError::Parse(_))
        ));
        assert!(matches!(
            EngineOptions::from_toml("target = \"avx1024\""),
            Err(EngineError::Parse(_))
        ));
    }

    #[test]
    fn options_reject_foreign_architecture() {
        for target in Target::ALL {
            let options = EngineOptions {
                target: target.into(),
            };
            if target.is_native_arch() {
                assert!(options.validate().is_ok());
            } else {
                assert!(matches!(
                    Engine::new(options),
                    Err(EngineError::InvalidOptions(_))
                ));
            }
        }
    }

    #[test]
    fn unsupported_target() {
        for target in Target::ALL {
            if !target.is_native_arch() || target.is_supported() {
                continue;
            }
            let options = EngineOptions {
                target: target.into(),
            };
            assert!(matches!(
                Engine::new(options),
                Err(EngineError::Unsupported(t)) if t == target
            ));
        }
    }

    #[test]
    fn every_supported_target_matches_scalar() {
        for target in Target::ALL.into_iter().filter(|t| t.is_supported()) {
            let engine = Engine::new(EngineOptions {
                target: target.into(),
            })
            .unwrap();
            assert_eq!(engine.target(), target);
            let block = target.block_words();
            for n in [0, 1, block - 1, block, block + 1, 2 * block, 3 * block + 5, 1000] {
                let lhs = random(n);
                let rhs = random(n);
                for op in Operator::ALL {
                    let mut r = lhs.clone();
                    engine.apply(op, &mut r, &rhs).unwrap();
                    for i in 0..n {
                        assert_eq!(r[i], op.scalar(lhs[i], rhs[i]), "{target} {op:?} n={n}");
                    }
                }
            }
        }
    }

    #[test]
    fn engine_length_mismatch() {
        let engine = Engine::default();
        let mut destination = vec![1u64, 2, 3];
        let source = vec![0u64; 4];
        for op in Operator::ALL {
            assert_eq!(
                engine.apply(op, &mut destination, &source),
                Err(LengthMismatch {
                    destination_len: 3,
                    source_len: 4
                })
            );
        }
        assert_eq!(destination, [1, 2, 3]);
    }
}
