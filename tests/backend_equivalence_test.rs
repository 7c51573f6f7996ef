//! Every supported backend must reproduce the scalar reference within a
//! relative tolerance of 1e-4, for odd sizes that exercise the lane tails.

use lipsync_inference::{
    Activation, AvgPool1dLayer, Backend, BatchNorm, ClassifierHead, Conv1dLayer, Conv1dShape,
    KernelSet, Layer, LinearLayer, LinearLayout, LinearOptions, LinearShape, ParameterBundle,
    PoolShape, SoftmaxLayer, SoftmaxNumerics,
};

const RELATIVE_DELTA: f32 = 1e-4;

fn generate_values(len: usize, phase: f32, scale: f32) -> Vec<f32> {
    (0..len)
        .map(|i| ((i as f32 + phase) * 0.61).sin() * scale)
        .collect()
}

fn generate_bundle(weights_len: usize, bias_len: usize, phase: f32) -> ParameterBundle {
    ParameterBundle::new(
        generate_values(weights_len, phase, 0.5),
        generate_values(bias_len, phase + 7.0, 0.2),
    )
}

fn generate_batch_norm(len: usize) -> BatchNorm {
    BatchNorm::new(
        generate_values(len, 1.0, 0.1),
        generate_values(len, 2.0, 0.3).iter().map(|v| v + 1.0).collect(),
        generate_values(len, 3.0, 0.3).iter().map(|v| v.abs() + 0.5).collect(),
        generate_values(len, 4.0, 0.1),
    )
    .expect("Batch norm statistics have equal lengths")
}

fn run(layer: &dyn Layer, kernels: KernelSet, input: &[f32]) -> Vec<f32> {
    let mut output = vec![0.0f32; layer.output_len()];
    let mut scratch = vec![0.0f32; layer.scratch_len()];
    layer
        .forward(kernels, input, &mut output, &mut scratch)
        .expect("Forward pass should succeed");
    output
}

/// Runs `layer` on every supported backend and compares against scalar.
fn assert_backends_match(label: &str, layer: &dyn Layer) {
    let input = generate_values(layer.input_len(), 0.3, 1.5);
    let reference = run(layer, KernelSet::scalar(), &input);

    for backend in Backend::supported() {
        let kernels = KernelSet::new(backend).expect("Supported backend should bind");
        let output = run(layer, kernels, &input);
        assert_eq!(output.len(), reference.len());
        for (index, (expected, computed)) in reference.iter().zip(&output).enumerate() {
            let tolerance = RELATIVE_DELTA * expected.abs().max(1.0);
            assert!(
                (expected - computed).abs() <= tolerance,
                "{} on {}: output {} differs, scalar {} vs {}",
                label,
                backend.name(),
                index,
                expected,
                computed
            );
        }
    }
}

#[test]
fn test_linear_layouts_match_scalar() {
    for (in_nodes, o_nodes, n_ch) in [(13, 13, 3), (17, 9, 11), (1, 5, 8), (32, 32, 1)] {
        let shape = LinearShape::new(in_nodes, o_nodes, n_ch);
        for layout in [LinearLayout::RowMajor, LinearLayout::Transposed] {
            for activation in [Activation::None, Activation::HardSwish] {
                let layer = LinearLayer::new(
                    shape,
                    generate_bundle(shape.weights_len(), o_nodes, 0.0),
                    LinearOptions {
                        layout,
                        skip_connection: in_nodes == o_nodes,
                        activation,
                    },
                )
                .unwrap();
                assert_backends_match(&format!("linear {:?} {:?}", shape, layout), &layer);
            }
        }
    }
}

#[test]
fn test_fused_batch_norm_linear_matches_scalar() {
    let shape = LinearShape::new(19, 7, 5);
    for layout in [LinearLayout::RowMajor, LinearLayout::Transposed] {
        let layer = LinearLayer::new(
            shape,
            generate_bundle(shape.weights_len(), 7, 1.0).with_batch_norm(generate_batch_norm(7)),
            LinearOptions {
                layout,
                skip_connection: false,
                activation: Activation::BatchNormHardSwish,
            },
        )
        .unwrap();
        assert_backends_match("linear batch-norm hard-swish", &layer);
    }
}

#[test]
fn test_conv1d_matches_scalar() {
    for kernel_size in [1, 3, 5] {
        for stride in [1, 2, 3] {
            for padding in [0, 1, 2] {
                let shape = Conv1dShape::new(3, 5, 23, kernel_size, stride, padding).unwrap();
                let layer = Conv1dLayer::new(
                    shape,
                    generate_bundle(shape.weights_len(), 5, kernel_size as f32),
                    Activation::HardSwish,
                )
                .unwrap();
                assert_backends_match(
                    &format!("conv1d k{} s{} p{}", kernel_size, stride, padding),
                    &layer,
                );
            }
        }
    }
}

#[test]
fn test_pointwise_conv1d_batch_norm_matches_scalar() {
    let shape = Conv1dShape::new(4, 6, 21, 1, 1, 0).unwrap();
    let layer = Conv1dLayer::new(
        shape,
        generate_bundle(shape.weights_len(), 6, 2.0).with_batch_norm(generate_batch_norm(21)),
        Activation::BatchNormHardSwish,
    )
    .unwrap();
    assert_backends_match("pointwise conv1d batch-norm", &layer);
}

#[test]
fn test_softmax_heads_match_scalar() {
    for (in_nodes, o_nodes, n_ch) in [(29, 14, 1), (64, 2, 3), (5, 9, 4), (8, 8, 1), (13, 14, 5)] {
        let shape = LinearShape::new(in_nodes, o_nodes, n_ch);
        for head in [ClassifierHead::General, ClassifierHead::Laughter] {
            for numerics in [SoftmaxNumerics::Legacy, SoftmaxNumerics::MaxShifted] {
                let layer = SoftmaxLayer::new(
                    shape,
                    generate_bundle(shape.weights_len(), o_nodes, 3.0),
                    head,
                )
                .unwrap()
                .with_numerics(numerics);
                assert_backends_match(&format!("softmax {:?} {:?}", head, shape), &layer);
            }
        }
    }
}

#[test]
fn test_avg_pool_matches_scalar() {
    for (lin, kernel_size, stride) in [(37, 2, 2), (37, 3, 1), (40, 4, 3), (9, 9, 1)] {
        let layer = AvgPool1dLayer::new(PoolShape::new(lin, 3, kernel_size, stride, 0)).unwrap();
        assert_backends_match(&format!("avg_pool1d {} k{} s{}", lin, kernel_size, stride), &layer);
    }
}
