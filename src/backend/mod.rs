//! Instruction-set backends and the kernel handle bound to one of them.
//!
//! Every kernel body lives once in [`crate::kernels`], written against the
//! [`lane::Lane`] abstraction. Each backend instantiates those bodies with its
//! own lane type inside `#[target_feature]` entry points, and [`KernelSet`]
//! routes calls to the entry points of the backend it was built for.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{KernelError, KernelResult};
use crate::kernels::{Conv1dArgs, LinearArgs, PoolArgs, SoftmaxArgs};

/// Generates one entry point per kernel body for a lane type, each carrying
/// the given attribute (usually a `target_feature`).
macro_rules! kernel_entry_points {
    (#[$attr:meta] $lane:ty) => {
        use crate::kernels::{self, Conv1dArgs, LinearArgs, PoolArgs, SoftmaxArgs};

        #[$attr]
        pub(crate) unsafe fn linear_row_major(args: LinearArgs<'_>) {
            unsafe { kernels::linear::row_major::<$lane>(args) }
        }

        #[$attr]
        pub(crate) unsafe fn linear_transposed(args: LinearArgs<'_>) {
            unsafe { kernels::linear::transposed::<$lane>(args) }
        }

        #[$attr]
        pub(crate) unsafe fn conv1d(args: Conv1dArgs<'_>) {
            unsafe { kernels::conv1d::conv1d::<$lane>(args) }
        }

        #[$attr]
        pub(crate) unsafe fn softmax_general(args: SoftmaxArgs<'_>) {
            unsafe { kernels::softmax::general::<$lane>(args) }
        }

        #[$attr]
        pub(crate) unsafe fn softmax_laughter(args: SoftmaxArgs<'_>) {
            unsafe { kernels::softmax::laughter::<$lane>(args) }
        }

        #[$attr]
        pub(crate) unsafe fn avg_pool(args: PoolArgs<'_>) {
            unsafe { kernels::pool::avg_pool::<$lane>(args) }
        }
    };
}

pub(crate) mod lane;

#[cfg(target_arch = "aarch64")]
mod neon;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod x86;

mod scalar {
    kernel_entry_points!(#[inline] super::lane::ScalarLane);
}

/// Instruction-set family a model session runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Backend {
    /// Portable reference, one value per lane.
    Scalar,
    /// 128-bit x86 vectors, 4 lanes.
    Sse3,
    /// 256-bit x86 vectors, 8 lanes.
    Avx,
    /// 128-bit ARM vectors, 4 lanes.
    Neon,
}

impl Backend {
    pub const ALL: [Backend; 4] = [Backend::Scalar, Backend::Sse3, Backend::Avx, Backend::Neon];

    /// Picks the widest backend the running CPU supports.
    pub fn detect() -> Self {
        let backend = [Backend::Avx, Backend::Sse3, Backend::Neon]
            .into_iter()
            .find(|backend| backend.is_supported())
            .unwrap_or(Backend::Scalar);
        debug!("Detected {} kernel backend", backend.name());
        backend
    }

    pub fn is_supported(self) -> bool {
        match self {
            Backend::Scalar => true,
            Backend::Sse3 => sse3_detected(),
            Backend::Avx => avx_detected(),
            Backend::Neon => neon_detected(),
        }
    }

    /// Every backend usable on this CPU, scalar first.
    pub fn supported() -> Vec<Backend> {
        Backend::ALL
            .into_iter()
            .filter(|backend| backend.is_supported())
            .collect()
    }

    /// Number of `f32` values one vector register holds.
    pub const fn lane_width(self) -> usize {
        match self {
            Backend::Scalar => 1,
            Backend::Sse3 | Backend::Neon => 4,
            Backend::Avx => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Backend::Scalar => "scalar",
            Backend::Sse3 => "sse3",
            Backend::Avx => "avx",
            Backend::Neon => "neon",
        }
    }

    /// Get backend by lowercase name.
    pub fn get_by_name(name: &str) -> Option<Self> {
        let map: HashMap<&str, Backend> = Backend::ALL
            .iter()
            .map(|backend| (backend.name(), *backend))
            .collect();

        map.get(name).copied()
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn sse3_detected() -> bool {
    std::is_x86_feature_detected!("sse3")
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn sse3_detected() -> bool {
    false
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn avx_detected() -> bool {
    std::is_x86_feature_detected!("avx")
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn avx_detected() -> bool {
    false
}

#[cfg(target_arch = "aarch64")]
fn neon_detected() -> bool {
    std::arch::is_aarch64_feature_detected!("neon")
}

#[cfg(not(target_arch = "aarch64"))]
fn neon_detected() -> bool {
    false
}

/// Routes a kernel call to the entry point of the bound backend.
///
/// SAFETY: a `KernelSet` only exists for backends the CPU supports, and the
/// layers check every buffer length against their shape before dispatching.
macro_rules! dispatch {
    ($set:expr, $entry:ident, $args:expr) => {
        match $set.backend {
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Backend::Sse3 => unsafe { x86::sse3::$entry($args) },
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Backend::Avx => unsafe { x86::avx::$entry($args) },
            #[cfg(target_arch = "aarch64")]
            Backend::Neon => unsafe { neon::entry::$entry($args) },
            _ => unsafe { scalar::$entry($args) },
        }
    };
}

/// A validated handle to the kernels of one backend.
///
/// Built once per model session and passed by value to every layer call, so
/// every kernel of the session runs on the same instruction-set family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelSet {
    backend: Backend,
}

impl KernelSet {
    /// Binds the kernels of `backend`, failing when the CPU lacks it.
    pub fn new(backend: Backend) -> KernelResult<Self> {
        if !backend.is_supported() {
            return Err(KernelError::UnsupportedBackend { backend });
        }
        debug!("Using {} kernels ({} lanes)", backend.name(), backend.lane_width());
        Ok(Self { backend })
    }

    pub fn detect() -> Self {
        Self {
            backend: Backend::detect(),
        }
    }

    pub const fn scalar() -> Self {
        Self {
            backend: Backend::Scalar,
        }
    }

    pub const fn backend(&self) -> Backend {
        self.backend
    }

    pub(crate) fn linear_row_major(self, args: LinearArgs<'_>) {
        dispatch!(self, linear_row_major, args)
    }

    pub(crate) fn linear_transposed(self, args: LinearArgs<'_>) {
        dispatch!(self, linear_transposed, args)
    }

    pub(crate) fn conv1d(self, args: Conv1dArgs<'_>) {
        dispatch!(self, conv1d, args)
    }

    pub(crate) fn softmax_general(self, args: SoftmaxArgs<'_>) {
        dispatch!(self, softmax_general, args)
    }

    pub(crate) fn softmax_laughter(self, args: SoftmaxArgs<'_>) {
        dispatch!(self, softmax_laughter, args)
    }

    pub(crate) fn avg_pool(self, args: PoolArgs<'_>) {
        dispatch!(self, avg_pool, args)
    }
}

impl Default for KernelSet {
    fn default() -> Self {
        Self::detect()
    }
}
