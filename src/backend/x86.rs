//! 128-bit SSE3 and 256-bit AVX lanes.

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use super::lane::Lane;

#[derive(Clone, Copy)]
pub(crate) struct Sse3Lane(__m128);

impl Lane for Sse3Lane {
    const WIDTH: usize = 4;

    #[inline(always)]
    unsafe fn zero() -> Self {
        Sse3Lane(unsafe { _mm_setzero_ps() })
    }

    #[inline(always)]
    unsafe fn splat(value: f32) -> Self {
        Sse3Lane(unsafe { _mm_set1_ps(value) })
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        Sse3Lane(unsafe { _mm_loadu_ps(ptr) })
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32) {
        unsafe { _mm_storeu_ps(ptr, self.0) }
    }

    #[inline(always)]
    unsafe fn add(self, rhs: Self) -> Self {
        Sse3Lane(unsafe { _mm_add_ps(self.0, rhs.0) })
    }

    #[inline(always)]
    unsafe fn sub(self, rhs: Self) -> Self {
        Sse3Lane(unsafe { _mm_sub_ps(self.0, rhs.0) })
    }

    #[inline(always)]
    unsafe fn mul(self, rhs: Self) -> Self {
        Sse3Lane(unsafe { _mm_mul_ps(self.0, rhs.0) })
    }

    #[inline(always)]
    unsafe fn hsum(self) -> f32 {
        unsafe {
            let pairs = _mm_hadd_ps(self.0, self.0);
            let total = _mm_hadd_ps(pairs, pairs);
            _mm_cvtss_f32(total)
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AvxLane(__m256);

impl Lane for AvxLane {
    const WIDTH: usize = 8;

    #[inline(always)]
    unsafe fn zero() -> Self {
        AvxLane(unsafe { _mm256_setzero_ps() })
    }

    #[inline(always)]
    unsafe fn splat(value: f32) -> Self {
        AvxLane(unsafe { _mm256_set1_ps(value) })
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        AvxLane(unsafe { _mm256_loadu_ps(ptr) })
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32) {
        unsafe { _mm256_storeu_ps(ptr, self.0) }
    }

    #[inline(always)]
    unsafe fn add(self, rhs: Self) -> Self {
        AvxLane(unsafe { _mm256_add_ps(self.0, rhs.0) })
    }

    #[inline(always)]
    unsafe fn sub(self, rhs: Self) -> Self {
        AvxLane(unsafe { _mm256_sub_ps(self.0, rhs.0) })
    }

    #[inline(always)]
    unsafe fn mul(self, rhs: Self) -> Self {
        AvxLane(unsafe { _mm256_mul_ps(self.0, rhs.0) })
    }

    #[inline(always)]
    unsafe fn hsum(self) -> f32 {
        unsafe {
            let high = _mm256_extractf128_ps::<1>(self.0);
            let low = _mm256_castps256_ps128(self.0);
            let quad = _mm_add_ps(high, low);
            let dual = _mm_add_ps(quad, _mm_movehl_ps(quad, quad));
            let single = _mm_add_ss(dual, _mm_shuffle_ps::<1>(dual, dual));
            _mm_cvtss_f32(single)
        }
    }
}

pub(crate) mod sse3 {
    kernel_entry_points!(#[target_feature(enable = "sse3")] super::Sse3Lane);
}

pub(crate) mod avx {
    kernel_entry_points!(#[target_feature(enable = "avx")] super::AvxLane);
}
