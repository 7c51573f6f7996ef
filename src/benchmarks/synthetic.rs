//! Deterministic synthetic models and inputs for the benchmarks.

use super::benchmark_types::{KernelsConfig, LipsyncGraphConfig};
use crate::activation::Activation;
use crate::errors::{KernelError, KernelResult};
use crate::layers::{
    AvgPool1dLayer, ClassifierHead, Conv1dLayer, Layer, LinearLayer, LinearLayout, LinearOptions,
    SoftmaxLayer,
};
use crate::model_info::{
    AvgPool1dLayerInfo, Conv1dLayerInfo, LayerInfo, LinearLayerInfo, ModelInfo, SoftmaxLayerInfo,
};
use crate::params::{BatchNorm, ParameterBundle};
use crate::shapes::{LinearShape, output_len};

/// `len` values of a sine wave scaled by `scale`, shifted by `phase`.
pub fn synthetic_values(len: usize, phase: f32, scale: f32) -> Vec<f32> {
    (0..len)
        .map(|i| ((i as f32 + phase) * 0.37).sin() * scale)
        .collect()
}

/// Weights scaled by `1 / sqrt(fan_in)` so activations stay of order one
/// through the whole graph.
fn synthetic_bundle(
    weights_len: usize,
    fan_in: usize,
    bias_len: usize,
    phase: f32,
) -> ParameterBundle {
    let scale = 1.0 / (fan_in as f32).sqrt();
    ParameterBundle::new(
        synthetic_values(weights_len, phase, scale),
        synthetic_values(bias_len, phase + 0.5, 0.1),
    )
}

fn synthetic_batch_norm(len: usize, phase: f32) -> KernelResult<BatchNorm> {
    BatchNorm::new(
        synthetic_values(len, phase, 0.1),
        synthetic_values(len, phase + 1.0, 0.2).into_iter().map(|v| v + 1.0).collect(),
        synthetic_values(len, phase + 2.0, 0.2).into_iter().map(|v| v.abs() + 0.5).collect(),
        synthetic_values(len, phase + 3.0, 0.1),
    )
}

/// Frames stored back to back, each `feature_size` values.
pub fn create_frame_inputs(feature_size: usize, num_frames: usize) -> Vec<f32> {
    (0..num_frames)
        .flat_map(|frame| synthetic_values(feature_size, frame as f32 * 1.3, 1.0))
        .collect()
}

/// Builds the benchmark graph: two hard-swish convolutions (the second
/// strided), average pooling, a residual linear block, a batch-norm fused
/// projection and the viseme softmax.
pub fn build_lipsync_graph(
    config: &LipsyncGraphConfig,
) -> KernelResult<(ModelInfo, Vec<ParameterBundle>)> {
    let channels = config.feature_channels;
    let hidden = config.hidden_channels;
    let len = config.feature_len;
    let strided_len = stage_len(len, 2, 5, 2)?;
    let pooled_len = stage_len(strided_len, 0, 2, 2)?;
    let flat = hidden * pooled_len;

    let layers = vec![
        LayerInfo::Conv1d(Conv1dLayerInfo {
            in_ch: channels,
            o_ch: hidden,
            in_phi: len,
            kernel_size: 3,
            stride: 1,
            padding_size: 1,
            activation: Activation::HardSwish,
            parameters: 0,
        }),
        LayerInfo::Conv1d(Conv1dLayerInfo {
            in_ch: hidden,
            o_ch: hidden,
            in_phi: len,
            kernel_size: 5,
            stride: 2,
            padding_size: 2,
            activation: Activation::HardSwish,
            parameters: 1,
        }),
        LayerInfo::AvgPool1d(AvgPool1dLayerInfo {
            lin: strided_len,
            ch: hidden,
            kernel_size: 2,
            stride: 2,
            padding: 0,
        }),
        LayerInfo::Linear(LinearLayerInfo {
            in_nodes: flat,
            o_nodes: flat,
            n_ch: 1,
            layout: LinearLayout::RowMajor,
            skip_connection: true,
            activation: Activation::None,
            parameters: 2,
        }),
        LayerInfo::Linear(LinearLayerInfo {
            in_nodes: flat,
            o_nodes: hidden,
            n_ch: 1,
            layout: LinearLayout::RowMajor,
            skip_connection: false,
            activation: Activation::BatchNormHardSwish,
            parameters: 3,
        }),
        LayerInfo::Softmax(SoftmaxLayerInfo {
            in_nodes: hidden,
            o_nodes: config.visemes,
            n_ch: 1,
            head: ClassifierHead::General,
            numerics: Default::default(),
            parameters: 4,
        }),
    ];

    let parameters = vec![
        synthetic_bundle(hidden * channels * 3, channels * 3, hidden, 0.0),
        synthetic_bundle(hidden * hidden * 5, hidden * 5, hidden, 1.0),
        synthetic_bundle(flat * flat, flat, flat, 2.0),
        synthetic_bundle(hidden * flat, flat, hidden, 3.0)
            .with_batch_norm(synthetic_batch_norm(hidden, 4.0)?),
        synthetic_bundle(config.visemes * hidden, hidden, config.visemes, 5.0),
    ];

    Ok((
        ModelInfo {
            backend: None,
            layers,
            validation_data: None,
        },
        parameters,
    ))
}

/// Output length of one graph stage, failing on shapes the config cannot build.
fn stage_len(
    in_len: usize,
    padding: usize,
    kernel_size: usize,
    stride: usize,
) -> KernelResult<usize> {
    output_len(in_len, padding, kernel_size, stride).ok_or(
        KernelError::NonPositiveOutputLength {
            in_len,
            padding,
            kernel_size,
            stride,
        },
    )
}

/// One layer per kernel variant the kernels benchmark times.
pub fn build_kernel_layers(
    config: &KernelsConfig,
) -> KernelResult<Vec<(String, Box<dyn Layer>)>> {
    let mut layers: Vec<(String, Box<dyn Layer>)> = Vec::new();

    let linear = config.linear;
    let skip_connection = linear.in_nodes == linear.o_nodes;
    for layout in [LinearLayout::RowMajor, LinearLayout::Transposed] {
        let layer = LinearLayer::new(
            linear,
            synthetic_bundle(linear.weights_len(), linear.in_nodes, linear.o_nodes, 0.0),
            LinearOptions {
                layout,
                skip_connection,
                activation: Activation::HardSwish,
            },
        )?;
        let label = format!(
            "linear {:?} {}x{}x{}",
            layout, linear.in_nodes, linear.o_nodes, linear.n_ch
        );
        layers.push((label, Box::new(layer)));
    }

    let fused = LinearLayer::laughter_head(
        LinearShape::new(linear.in_nodes, linear.o_nodes, linear.n_ch),
        synthetic_bundle(linear.weights_len(), linear.in_nodes, linear.o_nodes, 0.5)
            .with_batch_norm(synthetic_batch_norm(linear.o_nodes, 0.5)?),
    )?;
    layers.push(("linear batch-norm hard-swish".to_string(), Box::new(fused)));

    for shape in &config.conv1d {
        let params = synthetic_bundle(
            shape.weights_len(),
            shape.in_ch * shape.kernel_size.get(),
            shape.o_ch,
            1.0,
        );
        let layer = Conv1dLayer::new(*shape, params, Activation::HardSwish)?;
        layers.push((
            format!(
                "conv1d k{} s{} p{}",
                shape.kernel_size.get(),
                shape.stride,
                shape.padding_size
            ),
            Box::new(layer),
        ));
    }

    layers.push((
        format!("avg_pool1d k{} s{}", config.avg_pool.kernel_size, config.avg_pool.stride),
        Box::new(AvgPool1dLayer::new(config.avg_pool)?),
    ));

    let softmax = config.softmax;
    for head in [ClassifierHead::General, ClassifierHead::Laughter] {
        let params = synthetic_bundle(
            softmax.weights_len(),
            softmax.in_nodes,
            softmax.o_nodes,
            2.0,
        );
        let layer = SoftmaxLayer::new(softmax, params, head)?;
        let label = format!("softmax {:?} {} rows", head, softmax.n_ch);
        layers.push((label, Box::new(layer)));
    }

    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::KernelSet;
    use crate::model::LipsyncModel;

    #[test]
    fn test_default_graph_builds_and_predicts() {
        let config = LipsyncGraphConfig::default();
        let (info, parameters) = build_lipsync_graph(&config).unwrap();
        let model =
            LipsyncModel::from_info_with_kernels(&info, &parameters, KernelSet::scalar()).unwrap();

        assert_eq!(model.get_feature_size(), config.feature_channels * config.feature_len);
        assert_eq!(model.get_output_size(), config.visemes);

        let inputs = create_frame_inputs(model.get_feature_size(), 1);
        let probabilities = model.predict(&inputs).unwrap();
        let sum: f32 = probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_graph_rejects_too_short_features() {
        let config = LipsyncGraphConfig {
            feature_len: 1,
            ..LipsyncGraphConfig::default()
        };
        // The strided conv leaves one sample, too short for the pooling window
        assert!(matches!(
            build_lipsync_graph(&config),
            Err(KernelError::NonPositiveOutputLength {
                in_len: 1,
                kernel_size: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_default_kernel_layers_build() {
        let layers = build_kernel_layers(&KernelsConfig::default()).unwrap();
        // 3 linear, 3 conv, 1 pool, 2 softmax
        assert_eq!(layers.len(), 9);
    }
}
