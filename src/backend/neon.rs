//! 128-bit ARM NEON lane.

use core::arch::aarch64::*;

use super::lane::Lane;

#[derive(Clone, Copy)]
pub(crate) struct NeonLane(float32x4_t);

impl Lane for NeonLane {
    const WIDTH: usize = 4;

    #[inline(always)]
    unsafe fn zero() -> Self {
        NeonLane(unsafe { vdupq_n_f32(0.0) })
    }

    #[inline(always)]
    unsafe fn splat(value: f32) -> Self {
        NeonLane(unsafe { vdupq_n_f32(value) })
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        NeonLane(unsafe { vld1q_f32(ptr) })
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32) {
        unsafe { vst1q_f32(ptr, self.0) }
    }

    #[inline(always)]
    unsafe fn add(self, rhs: Self) -> Self {
        NeonLane(unsafe { vaddq_f32(self.0, rhs.0) })
    }

    #[inline(always)]
    unsafe fn sub(self, rhs: Self) -> Self {
        NeonLane(unsafe { vsubq_f32(self.0, rhs.0) })
    }

    #[inline(always)]
    unsafe fn mul(self, rhs: Self) -> Self {
        NeonLane(unsafe { vmulq_f32(self.0, rhs.0) })
    }

    #[inline(always)]
    unsafe fn hsum(self) -> f32 {
        unsafe { vaddvq_f32(self.0) }
    }
}

pub(crate) mod entry {
    kernel_entry_points!(#[target_feature(enable = "neon")] super::NeonLane);
}
