//! 1-D convolution with fused bias and activation.

use super::{Conv1dArgs, Epilogue};
use crate::backend::lane::Lane;
use crate::shapes::KernelSize;

#[inline(always)]
pub(crate) unsafe fn conv1d<L: Lane>(args: Conv1dArgs<'_>) {
    match args.shape.kernel_size {
        KernelSize::One => unsafe { conv1d_window::<L, 1>(args) },
        KernelSize::Three => unsafe { conv1d_window::<L, 3>(args) },
        KernelSize::Five => unsafe { conv1d_window::<L, 5>(args) },
    }
}

/// Input `(in_ch, in_phi + 2 * padding)`, weights `(o_ch, in_ch, K)`,
/// output `(o_ch, output_len)`.
///
/// A lane covers `WIDTH` consecutive output positions; their input taps sit
/// `stride` apart, so each tap is one strided load.
#[inline(always)]
unsafe fn conv1d_window<L: Lane, const K: usize>(args: Conv1dArgs<'_>) {
    let Conv1dArgs {
        shape,
        output_len,
        weights,
        bias,
        epilogue,
        input,
        output,
    } = args;
    let row_len = shape.padded_len();
    let stride = shape.stride;
    let in_ch = shape.in_ch;
    debug_assert_eq!(input.len(), shape.input_len());
    debug_assert_eq!(output.len(), shape.o_ch * output_len);
    debug_assert_eq!(weights.len(), shape.weights_len());
    debug_assert!((output_len - 1) * stride + K <= row_len);

    let input_ptr = input.as_ptr();
    for (j, out_row) in output.chunks_exact_mut(output_len).enumerate() {
        let filter = &weights[j * in_ch * K..(j + 1) * in_ch * K];
        let out_ptr = out_row.as_mut_ptr();

        let mut m = 0usize;
        while m + L::WIDTH <= output_len {
            unsafe {
                let mut acc = L::zero();
                for (k, taps) in filter.chunks_exact(K).enumerate() {
                    let window = input_ptr.add(k * row_len + m * stride);
                    for (t, &weight) in taps.iter().enumerate() {
                        acc = L::load_strided(window.add(t), stride).mul_add(L::splat(weight), acc);
                    }
                }
                acc.store(out_ptr.add(m));
            }
            m += L::WIDTH;
        }
        for position in m..output_len {
            let mut acc = 0.0f32;
            for (k, taps) in filter.chunks_exact(K).enumerate() {
                let window = &input[k * row_len + position * stride..][..K];
                for (value, weight) in window.iter().zip(taps) {
                    acc += value * weight;
                }
            }
            out_row[position] = acc;
        }

        finish_row(out_row, bias[j], &epilogue);
    }
}

/// Bias add then activation, the activation indexed by output position.
#[inline(always)]
fn finish_row(row: &mut [f32], bias: f32, epilogue: &Epilogue<'_>) {
    for (position, value) in row.iter_mut().enumerate() {
        *value = epilogue.apply(position, *value + bias);
    }
}
