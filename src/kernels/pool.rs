//! 1-D average pooling over prefix sums.

use super::PoolArgs;
use crate::backend::lane::Lane;

/// Input `(ch, lin)`, output `(ch, output_len)`.
///
/// Each channel gets one scalar prefix-sum pass, then windows are extracted
/// as `(prefix[start + k] - prefix[start]) / k`, a lane of windows at a time.
#[inline(always)]
pub(crate) unsafe fn avg_pool<L: Lane>(args: PoolArgs<'_>) {
    let PoolArgs {
        shape,
        output_len,
        input,
        output,
        scratch,
    } = args;
    let lin = shape.lin;
    let kernel_size = shape.kernel_size;
    let stride = shape.stride;
    debug_assert_eq!(input.len(), shape.input_len());
    debug_assert_eq!(output.len(), shape.ch * output_len);
    debug_assert!(scratch.len() > lin);
    debug_assert!((output_len - 1) * stride + kernel_size <= lin);

    let inv_scale = 1.0 / kernel_size as f32;
    let prefix = &mut scratch[..lin + 1];

    for (channel, out_row) in input
        .chunks_exact(lin)
        .zip(output.chunks_exact_mut(output_len))
    {
        prefix[0] = 0.0;
        let mut sum = 0.0f32;
        for (value, slot) in channel.iter().zip(prefix[1..].iter_mut()) {
            sum += value;
            *slot = sum;
        }

        let prefix_ptr = prefix.as_ptr();
        let out_ptr = out_row.as_mut_ptr();
        let mut i = 0usize;
        unsafe {
            let scale = L::splat(inv_scale);
            while i + L::WIDTH <= output_len {
                let start = prefix_ptr.add(i * stride);
                let end = L::load_strided(start.add(kernel_size), stride);
                end.sub(L::load_strided(start, stride)).mul(scale).store(out_ptr.add(i));
                i += L::WIDTH;
            }
        }
        for window in i..output_len {
            let start = window * stride;
            out_row[window] = (prefix[start + kernel_size] - prefix[start]) * inv_scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::lane::ScalarLane;
    use crate::shapes::PoolShape;

    #[test]
    fn test_pairs() {
        let shape = PoolShape::new(6, 1, 2, 2, 0);
        let input = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut output = [0.0f32; 3];
        let mut scratch = [0.0f32; 7];
        unsafe {
            avg_pool::<ScalarLane>(PoolArgs {
                shape,
                output_len: 3,
                input: &input,
                output: &mut output,
                scratch: &mut scratch,
            });
        }
        assert_eq!(output, [1.5, 3.5, 5.5]);
    }

    #[test]
    fn test_overlapping_windows_per_channel() {
        let shape = PoolShape::new(4, 2, 3, 1, 0);
        let input = [3.0f32, 6.0, 9.0, 0.0, 1.0, 1.0, 1.0, 4.0];
        let mut output = [0.0f32; 4];
        let mut scratch = [0.0f32; 5];
        unsafe {
            avg_pool::<ScalarLane>(PoolArgs {
                shape,
                output_len: 2,
                input: &input,
                output: &mut output,
                scratch: &mut scratch,
            });
        }
        assert_eq!(output, [6.0, 5.0, 1.0, 2.0]);
    }
}
