//! Prediction over many frames on scoped worker threads.

use std::thread;

use crate::errors::{ParallelPredictError, ParallelPredictResult};
use crate::model::LipsyncModel;

#[derive(Debug, Clone, Default)]
pub struct PredictConfig {
    threads: Option<usize>,
}

impl PredictConfig {
    pub fn new() -> Self {
        Self { threads: None }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Requested worker count, or the available parallelism when unset.
    pub fn get_threads(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// Model outputs of every frame, stored back to back in frame order.
#[derive(Debug, Clone)]
pub struct ParallelPredictOutput {
    buffer: Vec<f32>,
    num_frames: usize,
    output_size: usize,
}

impl ParallelPredictOutput {
    fn new(buffer: Vec<f32>, num_frames: usize, output_size: usize) -> Self {
        Self {
            buffer,
            num_frames,
            output_size,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.buffer
    }

    pub fn copy_results(&self, dest: &mut [f32]) -> ParallelPredictResult<()> {
        if dest.len() != self.buffer.len() {
            return Err(ParallelPredictError::DestinationBufferSizeMismatch {
                expected: self.buffer.len(),
                actual: dest.len(),
            });
        }
        dest.copy_from_slice(&self.buffer);
        Ok(())
    }

    pub fn copy_results_to_vec(&self) -> Vec<Vec<f32>> {
        self.buffer
            .chunks_exact(self.output_size.max(1))
            .map(<[f32]>::to_vec)
            .collect()
    }

    pub fn get_result(&self, index: usize) -> ParallelPredictResult<&[f32]> {
        if index >= self.num_frames {
            return Err(ParallelPredictError::FrameIndexOutOfBounds {
                index,
                num_frames: self.num_frames,
            });
        }
        let start = index * self.output_size;
        Ok(&self.buffer[start..start + self.output_size])
    }

    pub fn into_buffer(self) -> Vec<f32> {
        self.buffer
    }
}

/// Runs `model` on every frame of `inputs` (frames stored back to back).
///
/// Each worker owns one unified computation buffer and a contiguous run of
/// frames; frame cost depends only on the model shapes, so runs of equal
/// length keep the workers evenly loaded.
pub fn predict_parallel(
    model: &LipsyncModel,
    inputs: &[f32],
    config: &PredictConfig,
) -> ParallelPredictResult<ParallelPredictOutput> {
    let feature_size = model.get_feature_size();
    let output_size = model.get_output_size();
    let required_memory = model.required_memory();

    if !inputs.len().is_multiple_of(feature_size) {
        let num_frames = inputs.len() / feature_size;
        return Err(ParallelPredictError::InputBufferSizeMismatch {
            expected: (num_frames + 1) * feature_size,
            actual: inputs.len(),
            num_frames,
            feature_size,
        });
    }

    let num_frames = inputs.len() / feature_size;
    if num_frames == 0 {
        return Ok(ParallelPredictOutput::new(Vec::new(), 0, output_size));
    }

    let num_threads = config.get_threads();
    if num_threads == 0 {
        return Err(ParallelPredictError::InvalidThreadCount { count: 0 });
    }

    let frames_per_thread = num_frames.div_ceil(num_threads);
    let mut output_buffer = vec![0.0f32; num_frames * output_size];

    thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .chunks(frames_per_thread * feature_size)
            .zip(output_buffer.chunks_mut(frames_per_thread * output_size))
            .enumerate()
            .map(|(worker, (frame_inputs, frame_outputs))| {
                scope.spawn(move || -> ParallelPredictResult<()> {
                    let mut computation_buffer = vec![0.0f32; required_memory];
                    let output_start = model.get_output_index_start();

                    for (offset, (input, output)) in frame_inputs
                        .chunks_exact(feature_size)
                        .zip(frame_outputs.chunks_exact_mut(output_size))
                        .enumerate()
                    {
                        computation_buffer[..feature_size].copy_from_slice(input);
                        model
                            .predict_with_buffer(&mut computation_buffer)
                            .map_err(|e| ParallelPredictError::PredictionFailed {
                                frame_index: worker * frames_per_thread + offset,
                                message: e.to_string(),
                            })?;
                        output.copy_from_slice(
                            &computation_buffer[output_start..output_start + output_size],
                        );
                    }

                    Ok(())
                })
            })
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(result) => result?,
                Err(_) => return Err(ParallelPredictError::ThreadPanicked),
            }
        }

        Ok(())
    })?;

    Ok(ParallelPredictOutput::new(output_buffer, num_frames, output_size))
}

impl LipsyncModel {
    /// Runs the model on many frames in parallel, see [`predict_parallel`].
    pub fn predict_parallel(
        &self,
        inputs: &[f32],
        config: &PredictConfig,
    ) -> ParallelPredictResult<ParallelPredictOutput> {
        predict_parallel(self, inputs, config)
    }
}
