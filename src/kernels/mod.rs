//! Generic kernel bodies.
//!
//! Each primitive is written once against [`Lane`] and instantiated per
//! backend by the entry points in [`crate::backend`]. Bodies take raw views of
//! buffers whose lengths the calling layer has already checked, so they do no
//! bounds logic of their own beyond debug assertions.

pub(crate) mod conv1d;
pub(crate) mod linear;
pub(crate) mod pool;
pub(crate) mod softmax;

use crate::activation::hard_swish;
use crate::backend::lane::Lane;
use crate::params::BatchNorm;
use crate::shapes::{Conv1dShape, LinearShape, PoolShape};

pub use softmax::SoftmaxNumerics;

/// What a layer does to each value after the bias (and skip) add.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Epilogue<'a> {
    None,
    HardSwish,
    /// Batch-norm at the given index, then hard-swish.
    BatchNormHardSwish(&'a BatchNorm),
}

impl Epilogue<'_> {
    #[inline(always)]
    pub(crate) fn apply(&self, index: usize, value: f32) -> f32 {
        match self {
            Epilogue::None => value,
            Epilogue::HardSwish => hard_swish(value),
            Epilogue::BatchNormHardSwish(batch_norm) => hard_swish(batch_norm.apply(index, value)),
        }
    }
}

pub(crate) struct LinearArgs<'a> {
    pub shape: LinearShape,
    pub weights: &'a [f32],
    pub bias: &'a [f32],
    pub skip: bool,
    pub epilogue: Epilogue<'a>,
    pub input: &'a [f32],
    pub output: &'a mut [f32],
}

pub(crate) struct Conv1dArgs<'a> {
    pub shape: Conv1dShape,
    pub output_len: usize,
    pub weights: &'a [f32],
    pub bias: &'a [f32],
    pub epilogue: Epilogue<'a>,
    pub input: &'a [f32],
    pub output: &'a mut [f32],
}

pub(crate) struct SoftmaxArgs<'a> {
    pub shape: LinearShape,
    pub weights: &'a [f32],
    pub bias: &'a [f32],
    pub numerics: SoftmaxNumerics,
    pub input: &'a [f32],
    pub output: &'a mut [f32],
}

pub(crate) struct PoolArgs<'a> {
    pub shape: PoolShape,
    pub output_len: usize,
    pub input: &'a [f32],
    pub output: &'a mut [f32],
    /// At least `lin + 1` values for the per-channel prefix sums.
    pub scratch: &'a mut [f32],
}

/// Dot product of two `len`-long vectors.
///
/// Lanes accumulate independently and are reduced once, followed by a scalar
/// tail in index order.
#[inline(always)]
pub(crate) unsafe fn dot<L: Lane>(a: *const f32, b: *const f32, len: usize) -> f32 {
    let mut acc = unsafe { L::zero() };
    let mut i = 0usize;
    while i + L::WIDTH <= len {
        unsafe {
            acc = L::load(a.add(i)).mul_add(L::load(b.add(i)), acc);
        }
        i += L::WIDTH;
    }

    let mut sum = unsafe { acc.hsum() };
    while i < len {
        unsafe {
            sum += *a.add(i) * *b.add(i);
        }
        i += 1;
    }
    sum
}
