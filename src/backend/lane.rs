//! The lane abstraction every kernel body is written against.

/// Widest lane any backend provides, in `f32` values.
pub(crate) const MAX_LANE_WIDTH: usize = 8;

/// A packed register of `WIDTH` `f32` values.
///
/// # Safety
///
/// Implementations wrap instruction-set intrinsics. Callers must only invoke
/// them on a CPU that supports the backing instruction set, and every pointer
/// handed to `load`/`store`/`load_strided` must be valid for the whole lane.
pub(crate) trait Lane: Copy {
    const WIDTH: usize;

    unsafe fn zero() -> Self;
    unsafe fn splat(value: f32) -> Self;
    unsafe fn load(ptr: *const f32) -> Self;
    unsafe fn store(self, ptr: *mut f32);
    unsafe fn add(self, rhs: Self) -> Self;
    unsafe fn sub(self, rhs: Self) -> Self;
    unsafe fn mul(self, rhs: Self) -> Self;

    /// Sums all slots into one scalar.
    unsafe fn hsum(self) -> f32;

    /// `acc + self * rhs`, kept unfused so every backend rounds like the
    /// scalar reference.
    #[inline(always)]
    unsafe fn mul_add(self, rhs: Self, acc: Self) -> Self {
        unsafe { acc.add(self.mul(rhs)) }
    }

    /// Loads `WIDTH` values spaced `stride` apart, starting at `ptr`.
    #[inline(always)]
    unsafe fn load_strided(ptr: *const f32, stride: usize) -> Self {
        if stride == 1 {
            return unsafe { Self::load(ptr) };
        }
        let mut gathered = [0.0f32; MAX_LANE_WIDTH];
        for (i, slot) in gathered.iter_mut().take(Self::WIDTH).enumerate() {
            *slot = unsafe { *ptr.add(i * stride) };
        }
        unsafe { Self::load(gathered.as_ptr()) }
    }
}

/// Portable one-slot lane. Instantiating a kernel body with it yields the
/// scalar reference implementation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScalarLane(f32);

impl Lane for ScalarLane {
    const WIDTH: usize = 1;

    #[inline(always)]
    unsafe fn zero() -> Self {
        ScalarLane(0.0)
    }

    #[inline(always)]
    unsafe fn splat(value: f32) -> Self {
        ScalarLane(value)
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        ScalarLane(unsafe { *ptr })
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32) {
        unsafe { *ptr = self.0 }
    }

    #[inline(always)]
    unsafe fn add(self, rhs: Self) -> Self {
        ScalarLane(self.0 + rhs.0)
    }

    #[inline(always)]
    unsafe fn sub(self, rhs: Self) -> Self {
        ScalarLane(self.0 - rhs.0)
    }

    #[inline(always)]
    unsafe fn mul(self, rhs: Self) -> Self {
        ScalarLane(self.0 * rhs.0)
    }

    #[inline(always)]
    unsafe fn hsum(self) -> f32 {
        self.0
    }

    #[inline(always)]
    unsafe fn load_strided(ptr: *const f32, _stride: usize) -> Self {
        ScalarLane(unsafe { *ptr })
    }
}
