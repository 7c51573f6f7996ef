//! Softmax classifier heads: a linear projection followed by normalization.

use serde::{Deserialize, Serialize};

use super::{SoftmaxArgs, dot};
use crate::backend::lane::Lane;

/// How logits are turned into probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SoftmaxNumerics {
    /// `exp(logit)` without a max shift. Overflows to NaN once a logit
    /// exceeds ~88, which trained heads stay far below.
    #[default]
    Legacy,
    /// Subtracts the largest logit before exponentiating.
    MaxShifted,
}

/// Input-major projection over `(n_ch, in_nodes)` rows: each input value is
/// broadcast and accumulated into a lane of output logits at once, reading
/// the weight column with a strided load. Suited to heads with many classes
/// (visemes).
#[inline(always)]
pub(crate) unsafe fn general<L: Lane>(args: SoftmaxArgs<'_>) {
    let SoftmaxArgs {
        shape,
        weights,
        bias,
        numerics,
        input,
        output,
    } = args;
    debug_assert_eq!(input.len(), shape.input_len());
    debug_assert_eq!(output.len(), shape.output_len());
    debug_assert_eq!(weights.len(), shape.weights_len());

    let in_nodes = shape.in_nodes;
    let o_nodes = shape.o_nodes;
    let weights_ptr = weights.as_ptr();

    for (row, out_row) in input
        .chunks_exact(in_nodes)
        .zip(output.chunks_exact_mut(o_nodes))
    {
        out_row.copy_from_slice(bias);
        let out_ptr = out_row.as_mut_ptr();

        let mut j = 0usize;
        while j + L::WIDTH <= o_nodes {
            unsafe {
                let mut acc = L::load(out_ptr.add(j));
                for (k, &value) in row.iter().enumerate() {
                    let column = L::load_strided(weights_ptr.add(j * in_nodes + k), in_nodes);
                    acc = column.mul_add(L::splat(value), acc);
                }
                acc.store(out_ptr.add(j));
            }
            j += L::WIDTH;
        }
        for class in j..o_nodes {
            let weight_row = &weights[class * in_nodes..(class + 1) * in_nodes];
            let mut acc = out_row[class];
            for (value, weight) in row.iter().zip(weight_row) {
                acc += weight * value;
            }
            out_row[class] = acc;
        }

        normalize(out_row, numerics);
    }
}

/// Output-major projection: one vectorized dot product per class and row.
/// Suited to the two-class laughter head with a wide input.
#[inline(always)]
pub(crate) unsafe fn laughter<L: Lane>(args: SoftmaxArgs<'_>) {
    let SoftmaxArgs {
        shape,
        weights,
        bias,
        numerics,
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
        for (class, logit) in out_row.iter_mut().enumerate() {
            let weight_row = &weights[class * in_nodes..(class + 1) * in_nodes];
            let projection = unsafe { dot::<L>(row.as_ptr(), weight_row.as_ptr(), in_nodes) };
            *logit = bias[class] + projection;
        }

        normalize(out_row, numerics);
    }
}

/// Replaces logits with their softmax in place.
#[inline(always)]
pub(crate) fn normalize(logits: &mut [f32], numerics: SoftmaxNumerics) {
    let shift = match numerics {
        SoftmaxNumerics::Legacy => 0.0,
        SoftmaxNumerics::MaxShifted => logits.iter().copied().fold(f32::NEG_INFINITY, f32::max),
    };

    let mut sum = 0.0f32;
    for logit in logits.iter_mut() {
        *logit = (*logit - shift).exp();
        sum += *logit;
    }
    for prob in logits.iter_mut() {
        *prob /= sum;
    }
}
