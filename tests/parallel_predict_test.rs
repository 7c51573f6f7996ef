use lipsync_inference::errors::ParallelPredictError;
use lipsync_inference::{
    Activation, AvgPool1dLayer, ClassifierHead, Conv1dLayer, Conv1dShape, KernelSet, Layer,
    LinearShape, LipsyncModel, ParameterBundle, PoolShape, PredictConfig, SoftmaxLayer,
};

const DELTA: f32 = 1e-6;

fn create_test_model() -> LipsyncModel {
    let conv_shape = Conv1dShape::new(2, 3, 8, 3, 1, 0).unwrap();
    let conv_weights: Vec<f32> = (0..conv_shape.weights_len())
        .map(|i| (i as f32 * 0.4).sin() * 0.5)
        .collect();
    let conv = Conv1dLayer::new(
        conv_shape,
        ParameterBundle::new(conv_weights, vec![0.1, -0.1, 0.0]),
        Activation::HardSwish,
    )
    .unwrap();
    let pool = AvgPool1dLayer::new(PoolShape::new(6, 3, 2, 2, 0)).unwrap();
    let softmax_weights: Vec<f32> = (0..9 * 4).map(|i| (i as f32 * 0.7).cos() * 0.3).collect();
    let softmax = SoftmaxLayer::new(
        LinearShape::new(9, 4, 1),
        ParameterBundle::new(softmax_weights, vec![0.0, 0.1, 0.2, 0.3]),
        ClassifierHead::General,
    )
    .unwrap();

    let layers: Vec<Box<dyn Layer>> = vec![Box::new(conv), Box::new(pool), Box::new(softmax)];
    LipsyncModel::new(layers, KernelSet::detect()).expect("Model creation should succeed")
}

fn generate_test_inputs(num_frames: usize, feature_size: usize) -> Vec<f32> {
    let mut inputs = Vec::with_capacity(num_frames * feature_size);
    for i in 0..num_frames {
        for j in 0..feature_size {
            let value = ((i * feature_size + j) as f32 * 0.01).sin();
            inputs.push(value);
        }
    }
    inputs
}

#[test]
fn test_parallel_predict_matches_sequential() {
    let model = create_test_model();
    let num_frames = 400;
    let feature_size = model.get_feature_size();
    let output_size = model.get_output_size();

    let inputs = generate_test_inputs(num_frames, feature_size);

    let mut expected_results = Vec::with_capacity(num_frames * output_size);
    for frame in inputs.chunks_exact(feature_size) {
        let result = model.predict(frame).expect("Sequential predict should succeed");
        expected_results.extend(result);
    }

    let config = PredictConfig::new().with_threads(4);
    let parallel_result = model
        .predict_parallel(&inputs, &config)
        .expect("Parallel predict should succeed");

    assert_eq!(parallel_result.num_frames(), num_frames);
    assert_eq!(parallel_result.output_size(), output_size);

    let parallel_buffer = parallel_result.as_slice();
    assert_eq!(parallel_buffer.len(), expected_results.len());

    for (i, (expected, actual)) in expected_results
        .iter()
        .zip(parallel_buffer.iter())
        .enumerate()
    {
        assert!(
            (expected - actual).abs() < DELTA,
            "Mismatch at index {}: expected {}, got {}",
            i,
            expected,
            actual
        );
    }
}

#[test]
fn test_parallel_predict_copy_results() {
    let model = create_test_model();
    let num_frames = 10;
    let output_size = model.get_output_size();
    let inputs = generate_test_inputs(num_frames, model.get_feature_size());

    let result = model
        .predict_parallel(&inputs, &PredictConfig::new())
        .expect("Parallel predict should succeed");

    let mut dest = vec![0.0f32; num_frames * output_size];
    result.copy_results(&mut dest).expect("Copy should succeed");
    assert_eq!(dest, result.as_slice());

    let mut short = vec![0.0f32; 3];
    assert!(matches!(
        result.copy_results(&mut short),
        Err(ParallelPredictError::DestinationBufferSizeMismatch { actual: 3, .. })
    ));

    let vec_results = result.copy_results_to_vec();
    assert_eq!(vec_results.len(), num_frames);
    for probabilities in &vec_results {
        assert_eq!(probabilities.len(), output_size);
        let sum: f32 = probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }
}

#[test]
fn test_parallel_predict_get_result() {
    let model = create_test_model();
    let num_frames = 5;
    let inputs = generate_test_inputs(num_frames, model.get_feature_size());

    let result = model
        .predict_parallel(&inputs, &PredictConfig::new())
        .expect("Parallel predict should succeed");

    for i in 0..num_frames {
        let frame_result = result.get_result(i).expect("Get result should succeed");
        assert_eq!(frame_result.len(), model.get_output_size());
    }

    assert!(matches!(
        result.get_result(num_frames),
        Err(ParallelPredictError::FrameIndexOutOfBounds { index: 5, num_frames: 5 })
    ));
}

#[test]
fn test_parallel_predict_more_threads_than_frames() {
    let model = create_test_model();
    let inputs = generate_test_inputs(3, model.get_feature_size());

    let result = model
        .predict_parallel(&inputs, &PredictConfig::new().with_threads(16))
        .expect("Oversubscribed predict should succeed");

    assert_eq!(result.num_frames(), 3);
    for (i, frame) in inputs.chunks_exact(model.get_feature_size()).enumerate() {
        assert_eq!(result.get_result(i).unwrap(), model.predict(frame).unwrap().as_slice());
    }
}

#[test]
fn test_parallel_predict_single_thread() {
    let model = create_test_model();
    let inputs = generate_test_inputs(50, model.get_feature_size());

    let result = model
        .predict_parallel(&inputs, &PredictConfig::new().with_threads(1))
        .expect("Single-thread parallel predict should succeed");

    assert_eq!(result.num_frames(), 50);
}

#[test]
fn test_parallel_predict_empty_input() {
    let model = create_test_model();
    let inputs: Vec<f32> = vec![];

    let result = model
        .predict_parallel(&inputs, &PredictConfig::new())
        .expect("Empty input should succeed");

    assert_eq!(result.num_frames(), 0);
    assert!(result.as_slice().is_empty());
}

#[test]
fn test_parallel_predict_input_size_mismatch() {
    let model = create_test_model();
    let inputs = vec![1.0; model.get_feature_size() + 7];

    let result = model.predict_parallel(&inputs, &PredictConfig::new());

    assert!(matches!(
        result,
        Err(ParallelPredictError::InputBufferSizeMismatch { num_frames: 1, .. })
    ));
}

#[test]
fn test_parallel_predict_zero_threads() {
    let model = create_test_model();
    let inputs = generate_test_inputs(4, model.get_feature_size());

    let result = model.predict_parallel(&inputs, &PredictConfig::new().with_threads(0));
    assert!(matches!(
        result,
        Err(ParallelPredictError::InvalidThreadCount { count: 0 })
    ));
}
