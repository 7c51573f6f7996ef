use lipsync_inference::activation::hard_swish;
use lipsync_inference::{
    Activation, AvgPool1dLayer, BatchNorm, ClassifierHead, Conv1dLayer, Conv1dShape, KernelSet,
    Layer, LinearLayer, LinearLayout, LinearOptions, LinearShape, ParameterBundle, PoolShape,
    SoftmaxLayer, output_len,
};

const DELTA: f32 = 1e-5;

fn generate_values(len: usize, phase: f32) -> Vec<f32> {
    (0..len).map(|i| ((i as f32 + phase) * 0.29).cos()).collect()
}

fn forward(layer: &dyn Layer, input: &[f32]) -> Vec<f32> {
    let mut output = vec![0.0f32; layer.output_len()];
    let mut scratch = vec![0.0f32; layer.scratch_len()];
    layer
        .forward(KernelSet::detect(), input, &mut output, &mut scratch)
        .expect("Forward pass should succeed");
    output
}

fn assert_close(actual: &[f32], expected: &[f32], delta: f32) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).abs() < delta, "index {}: {} vs {}", i, a, e);
    }
}

#[test]
fn test_output_len_examples() {
    assert_eq!(output_len(16, 1, 3, 1), Some(16));
    assert_eq!(output_len(10, 0, 5, 2), Some(3));
}

#[test]
fn test_skip_identity() {
    for layout in [LinearLayout::RowMajor, LinearLayout::Transposed] {
        let shape = LinearShape::new(11, 11, 6);
        let layer = LinearLayer::new(
            shape,
            ParameterBundle::new(vec![0.0; shape.weights_len()], vec![0.0; 11]),
            LinearOptions {
                layout,
                skip_connection: true,
                activation: Activation::None,
            },
        )
        .unwrap();
        let input = generate_values(shape.input_len(), 0.0);
        assert_eq!(forward(&layer, &input), input);
    }
}

#[test]
fn test_transposed_agrees_with_row_major() {
    let shape = LinearShape::new(10, 10, 7);
    let params = ParameterBundle::new(
        generate_values(shape.weights_len(), 1.0),
        generate_values(10, 2.0),
    );
    let options = |layout| LinearOptions {
        layout,
        skip_connection: true,
        activation: Activation::HardSwish,
    };
    let row_major =
        LinearLayer::new(shape, params.clone(), options(LinearLayout::RowMajor)).unwrap();
    let transposed = LinearLayer::new(shape, params, options(LinearLayout::Transposed)).unwrap();

    let rows = generate_values(shape.input_len(), 3.0);
    let mut columns = vec![0.0f32; rows.len()];
    for i in 0..shape.n_ch {
        for k in 0..shape.in_nodes {
            columns[k * shape.n_ch + i] = rows[i * shape.in_nodes + k];
        }
    }

    let row_output = forward(&row_major, &rows);
    let column_output = forward(&transposed, &columns);
    for i in 0..shape.n_ch {
        for j in 0..shape.o_nodes {
            let a = row_output[i * shape.o_nodes + j];
            let b = column_output[j * shape.n_ch + i];
            assert!((a - b).abs() < 1e-4, "row {} node {}: {} vs {}", i, j, a, b);
        }
    }
}

#[test]
fn test_laughter_head_applies_batch_norm_then_hard_swish() {
    let shape = LinearShape::new(2, 2, 1);
    let batch_norm = BatchNorm::new(
        vec![1.0, 0.0],
        vec![2.0, 1.0],
        vec![1.0, 4.0],
        vec![0.5, -1.0],
    )
    .unwrap();
    let layer = LinearLayer::laughter_head(
        shape,
        ParameterBundle::new(vec![1.0, 1.0, 1.0, -1.0], vec![0.0, 0.5])
            .with_batch_norm(batch_norm.clone()),
    )
    .unwrap();

    let output = forward(&layer, &[2.0, 1.0]);
    // Affine outputs: [3, 1.5]
    let expected = [
        hard_swish(batch_norm.apply(0, 3.0)),
        hard_swish(batch_norm.apply(1, 1.5)),
    ];
    assert_close(&output, &expected, DELTA);
}

#[test]
fn test_conv1d_pointwise_equals_matrix_multiply() {
    let (in_ch, o_ch, in_phi) = (3, 4, 9);
    let shape = Conv1dShape::new(in_ch, o_ch, in_phi, 1, 1, 0).unwrap();
    let weights = generate_values(o_ch * in_ch, 4.0);
    let bias = generate_values(o_ch, 5.0);
    let layer = Conv1dLayer::new(
        shape,
        ParameterBundle::new(weights.clone(), bias.clone()),
        Activation::None,
    )
    .unwrap();

    let input = generate_values(in_ch * in_phi, 6.0);
    let output = forward(&layer, &input);

    let mut expected = vec![0.0f32; o_ch * in_phi];
    for j in 0..o_ch {
        for m in 0..in_phi {
            let mut acc = bias[j];
            for k in 0..in_ch {
                acc += weights[j * in_ch + k] * input[k * in_phi + m];
            }
            expected[j * in_phi + m] = acc;
        }
    }
    assert_close(&output, &expected, 1e-4);
}

#[test]
fn test_conv1d_position_indexed_batch_norm() {
    let shape = Conv1dShape::new(1, 2, 3, 1, 1, 0).unwrap();
    let batch_norm =
        BatchNorm::new(vec![0.0, 1.0, 2.0], vec![1.0; 3], vec![1.0; 3], vec![0.0; 3]).unwrap();
    let layer = Conv1dLayer::new(
        shape,
        ParameterBundle::new(vec![1.0, 2.0], vec![0.0, 0.0]).with_batch_norm(batch_norm.clone()),
        Activation::BatchNormHardSwish,
    )
    .unwrap();

    let output = forward(&layer, &[1.0, 2.0, 3.0]);
    let mut expected = Vec::new();
    for scale in [1.0f32, 2.0] {
        for (m, x) in [1.0f32, 2.0, 3.0].into_iter().enumerate() {
            expected.push(hard_swish(batch_norm.apply(m, scale * x)));
        }
    }
    assert_close(&output, &expected, DELTA);
}

#[test]
fn test_conv1d_hard_swish_clamps_negative() {
    let shape = Conv1dShape::new(1, 1, 5, 3, 1, 0).unwrap();
    let layer = Conv1dLayer::new(
        shape,
        ParameterBundle::new(vec![-1.0; 3], vec![0.0]),
        Activation::HardSwish,
    )
    .unwrap();
    let output = forward(&layer, &[1.0, 1.0, 1.0, 1.0, 1.0]);
    // -3 sits exactly on the hard-swish floor
    assert_eq!(output, vec![0.0, 0.0, 0.0]);
}

#[test]
fn test_softmax_rows_sum_to_one() {
    for head in [ClassifierHead::General, ClassifierHead::Laughter] {
        let layer = SoftmaxLayer::new(
            LinearShape::new(24, 14, 1),
            ParameterBundle::new(generate_values(24 * 14, 7.0), generate_values(14, 8.0)),
            head,
        )
        .unwrap();
        let output = forward(&layer, &generate_values(24, 9.0));
        let sum: f32 = output.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "{:?} sums to {}", head, sum);
        assert!(output.iter().all(|p| (0.0..=1.0).contains(p)));
    }
}

#[test]
fn test_softmax_normalizes_every_row() {
    for head in [ClassifierHead::General, ClassifierHead::Laughter] {
        let shape = LinearShape::new(4, 3, 3);
        let layer = SoftmaxLayer::new(
            shape,
            ParameterBundle::new(generate_values(12, 13.0), generate_values(3, 14.0)),
            head,
        )
        .unwrap();
        assert_eq!(layer.input_len(), 12);
        assert_eq!(layer.output_len(), 9);

        let input = generate_values(shape.input_len(), 15.0);
        let output = forward(&layer, &input);
        for (row, probabilities) in output.chunks_exact(3).enumerate() {
            let sum: f32 = probabilities.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "{:?} row {} sums to {}", head, row, sum);
        }

        // Each row matches a single-row classifier run on that row alone
        let single = SoftmaxLayer::new(
            LinearShape::new(4, 3, 1),
            ParameterBundle::new(generate_values(12, 13.0), generate_values(3, 14.0)),
            head,
        )
        .unwrap();
        for (row, expected) in input.chunks_exact(4).zip(output.chunks_exact(3)) {
            assert_close(&forward(&single, row), expected, DELTA);
        }
    }
}

#[test]
fn test_softmax_heads_agree() {
    let params = ParameterBundle::new(generate_values(33 * 2, 10.0), generate_values(2, 11.0));
    let shape = LinearShape::new(33, 2, 3);
    let general = SoftmaxLayer::new(shape, params.clone(), ClassifierHead::General).unwrap();
    let laughter = SoftmaxLayer::new(shape, params, ClassifierHead::Laughter).unwrap();
    let input = generate_values(shape.input_len(), 12.0);
    assert_close(&forward(&general, &input), &forward(&laughter, &input), DELTA);
}

#[test]
fn test_avg_pool_pairs() {
    let layer = AvgPool1dLayer::new(PoolShape::new(6, 1, 2, 2, 0)).unwrap();
    let output = forward(&layer, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_close(&output, &[1.5, 3.5, 5.5], DELTA);
}

#[test]
fn test_output_is_overwritten() {
    let layer = AvgPool1dLayer::new(PoolShape::new(4, 2, 2, 1, 0)).unwrap();
    let mut output = vec![100.0f32; layer.output_len()];
    let mut scratch = vec![-5.0f32; layer.scratch_len()];
    layer
        .forward(
            KernelSet::scalar(),
            &[1.0, 1.0, 1.0, 1.0, 2.0, 4.0, 6.0, 8.0],
            &mut output,
            &mut scratch,
        )
        .unwrap();
    assert_close(&output, &[1.0, 1.0, 1.0, 3.0, 5.0, 7.0], DELTA);
}
