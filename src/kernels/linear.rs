//! Fully-connected kernels in row-major and transposed layouts.

use super::{LinearArgs, dot};
use crate::backend::lane::Lane;

/// Row-major layout: input `(n_ch, in_nodes)`, output `(n_ch, o_nodes)`,
/// weights `(o_nodes, in_nodes)`. One dot product per output value.
#[inline(always)]
pub(crate) unsafe fn row_major<L: Lane>(args: LinearArgs<'_>) {
    let LinearArgs {
        shape,
        weights,
        bias,
        skip,
        epilogue,
        input,
        output,
    } = args;
    debug_assert_eq!(input.len(), shape.input_len());
    debug_assert_eq!(output.len(), shape.output_len());
    debug_assert_eq!(weights.len(), shape.weights_len());

    let in_nodes = shape.in_nodes;
    for (row, out_row) in input
        .chunks_exact(in_nodes)
        .zip(output.chunks_exact_mut(shape.o_nodes))
    {
        for (j, out) in out_row.iter_mut().enumerate() {
            let weight_row = &weights[j * in_nodes..(j + 1) * in_nodes];
            let mut value = unsafe { dot::<L>(row.as_ptr(), weight_row.as_ptr(), in_nodes) };
            value += bias[j];
            if skip {
                value += row[j];
            }
            *out = epilogue.apply(j, value);
        }
    }
}

/// Transposed layout: input `(in_nodes, n_ch)`, output `(o_nodes, n_ch)`.
/// Each weight is broadcast and accumulated across a lane of columns, so
/// every column sums its products in input order on all backends.
#[inline(always)]
pub(crate) unsafe fn transposed<L: Lane>(args: LinearArgs<'_>) {
    let LinearArgs {
        shape,
        weights,
        bias,
        skip,
        epilogue,
        input,
        output,
    } = args;
    debug_assert_eq!(input.len(), shape.input_len());
    debug_assert_eq!(output.len(), shape.output_len());
    debug_assert_eq!(weights.len(), shape.weights_len());

    let n_ch = shape.n_ch;
    let in_nodes = shape.in_nodes;
    let input_ptr = input.as_ptr();

    for (j, out_row) in output.chunks_exact_mut(n_ch).enumerate() {
        let weight_row = &weights[j * in_nodes..(j + 1) * in_nodes];
        let out_ptr = out_row.as_mut_ptr();

        let mut c = 0usize;
        while c + L::WIDTH <= n_ch {
            unsafe {
                let mut acc = L::zero();
                for (k, &weight) in weight_row.iter().enumerate() {
                    acc = L::load(input_ptr.add(k * n_ch + c)).mul_add(L::splat(weight), acc);
                }
                acc.store(out_ptr.add(c));
            }
            c += L::WIDTH;
        }
        for column in c..n_ch {
            let mut acc = 0.0f32;
            for (k, &weight) in weight_row.iter().enumerate() {
                acc += input[k * n_ch + column] * weight;
            }
            out_row[column] = acc;
        }

        let skip_row = skip.then(|| &input[j * n_ch..(j + 1) * n_ch]);
        for (column, out) in out_row.iter_mut().enumerate() {
            let mut value = *out + bias[j];
            if let Some(skip_row) = skip_row {
                value += skip_row[column];
            }
            *out = epilogue.apply(j, value);
        }
    }
}
