//! Layer shape descriptors.
//!
//! Shapes are plain integer records built once when a model is assembled.
//! Derived lengths (conv/pool output length, buffer sizes) are always
//! computed from the stored fields and never cached.

use serde::{Deserialize, Serialize};

use crate::errors::{KernelError, KernelResult};

/// Computes `(in_len + 2 * padding - (kernel_size - 1) - 1) / stride + 1` with
/// dilation fixed at 1. Returns `None` when the result would not be a positive
/// integer (window larger than the padded input, or a zero stride).
pub fn output_len(
    in_len: usize,
    padding: usize,
    kernel_size: usize,
    stride: usize,
) -> Option<usize> {
    if stride == 0 || kernel_size == 0 {
        return None;
    }
    let padded = in_len + 2 * padding;
    if padded < kernel_size {
        return None;
    }
    Some((padded - kernel_size) / stride + 1)
}

/// Convolution window sizes the kernels are specialized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum KernelSize {
    One,
    Three,
    Five,
}

impl KernelSize {
    pub const fn get(self) -> usize {
        match self {
            KernelSize::One => 1,
            KernelSize::Three => 3,
            KernelSize::Five => 5,
        }
    }
}

impl TryFrom<usize> for KernelSize {
    type Error = KernelError;

    fn try_from(size: usize) -> Result<Self, Self::Error> {
        match size {
            1 => Ok(KernelSize::One),
            3 => Ok(KernelSize::Three),
            5 => Ok(KernelSize::Five),
            _ => Err(KernelError::UnsupportedKernelSize { size }),
        }
    }
}

impl From<KernelSize> for usize {
    fn from(size: KernelSize) -> Self {
        size.get()
    }
}

/// Shape of a fully-connected layer processing `n_ch` independent rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinearShape {
    pub in_nodes: usize,
    pub o_nodes: usize,
    pub n_ch: usize,
}

impl LinearShape {
    pub const fn new(in_nodes: usize, o_nodes: usize, n_ch: usize) -> Self {
        Self {
            in_nodes,
            o_nodes,
            n_ch,
        }
    }

    pub const fn input_len(&self) -> usize {
        self.in_nodes * self.n_ch
    }

    pub const fn output_len(&self) -> usize {
        self.o_nodes * self.n_ch
    }

    pub const fn weights_len(&self) -> usize {
        self.o_nodes * self.in_nodes
    }

    pub(crate) fn validate(&self, layer: &'static str) -> KernelResult<()> {
        for (field, value) in [
            ("in_nodes", self.in_nodes),
            ("o_nodes", self.o_nodes),
            ("n_ch", self.n_ch),
        ] {
            if value == 0 {
                return Err(KernelError::InvalidDimension { layer, field });
            }
        }
        Ok(())
    }
}

/// Shape of a 1-D convolution over `in_ch` channels of `in_phi` samples.
///
/// With a non-zero `padding_size` the layer consumes the materialized padded
/// input: `in_ch` rows of `in_phi + 2 * padding_size` values, see
/// [`Conv1dShape::pad_input`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Conv1dShape {
    pub in_ch: usize,
    pub o_ch: usize,
    pub in_phi: usize,
    pub kernel_size: KernelSize,
    pub stride: usize,
    #[serde(default)]
    pub padding_size: usize,
}

impl Conv1dShape {
    /// Builds a shape, rejecting kernel sizes outside {1, 3, 5}.
    pub fn new(
        in_ch: usize,
        o_ch: usize,
        in_phi: usize,
        kernel_size: usize,
        stride: usize,
        padding_size: usize,
    ) -> KernelResult<Self> {
        Ok(Self {
            in_ch,
            o_ch,
            in_phi,
            kernel_size: KernelSize::try_from(kernel_size)?,
            stride,
            padding_size,
        })
    }

    /// Length of one input row as laid out in the buffer the kernel reads.
    pub const fn padded_len(&self) -> usize {
        self.in_phi + 2 * self.padding_size
    }

    /// Output samples per channel, `None` when the shape is inconsistent.
    pub fn output_len(&self) -> Option<usize> {
        output_len(
            self.in_phi,
            self.padding_size,
            self.kernel_size.get(),
            self.stride,
        )
    }

    pub const fn input_len(&self) -> usize {
        self.in_ch * self.padded_len()
    }

    pub const fn weights_len(&self) -> usize {
        self.o_ch * self.in_ch * self.kernel_size.get()
    }

    /// Copies an unpadded `(in_ch, in_phi)` tensor into a `(in_ch, in_phi + 2 * padding)`
    /// buffer with zeroed borders.
    pub fn pad_input(&self, unpadded: &[f32], padded: &mut [f32]) -> KernelResult<()> {
        let expected = self.in_ch * self.in_phi;
        if unpadded.len() != expected {
            return Err(KernelError::InputBufferSizeMismatch {
                layer: "conv1d padding",
                expected,
                actual: unpadded.len(),
            });
        }
        if padded.len() != self.input_len() {
            return Err(KernelError::OutputBufferSizeMismatch {
                layer: "conv1d padding",
                expected: self.input_len(),
                actual: padded.len(),
            });
        }

        padded.fill(0.0);
        if self.in_phi == 0 {
            return Ok(());
        }
        for (src, dst) in unpadded
            .chunks_exact(self.in_phi)
            .zip(padded.chunks_exact_mut(self.padded_len()))
        {
            dst[self.padding_size..self.padding_size + self.in_phi].copy_from_slice(src);
        }
        Ok(())
    }

    pub(crate) fn validate(&self, layer: &'static str) -> KernelResult<usize> {
        for (field, value) in [
            ("in_ch", self.in_ch),
            ("o_ch", self.o_ch),
            ("in_phi", self.in_phi),
            ("stride", self.stride),
        ] {
            if value == 0 {
                return Err(KernelError::InvalidDimension { layer, field });
            }
        }
        self.output_len()
            .ok_or(KernelError::NonPositiveOutputLength {
                in_len: self.in_phi,
                padding: self.padding_size,
                kernel_size: self.kernel_size.get(),
                stride: self.stride,
            })
    }
}

/// Shape of a 1-D average pooling over `ch` channels of `lin` samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolShape {
    pub lin: usize,
    pub ch: usize,
    pub kernel_size: usize,
    pub stride: usize,
    #[serde(default)]
    pub padding: usize,
}

impl PoolShape {
    pub const fn new(
        lin: usize,
        ch: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
    ) -> Self {
        Self {
            lin,
            ch,
            kernel_size,
            stride,
            padding,
        }
    }

    pub fn output_len(&self) -> Option<usize> {
        output_len(self.lin, self.padding, self.kernel_size, self.stride)
    }

    pub const fn input_len(&self) -> usize {
        self.ch * self.lin
    }

    pub(crate) fn validate(&self, layer: &'static str) -> KernelResult<usize> {
        for (field, value) in [
            ("lin", self.lin),
            ("ch", self.ch),
            ("kernel_size", self.kernel_size),
            ("stride", self.stride),
        ] {
            if value == 0 {
                return Err(KernelError::InvalidDimension { layer, field });
            }
        }
        // Prefix-sum windows never see the implied zero border.
        if self.padding != 0 {
            return Err(KernelError::UnsupportedPoolPadding {
                padding: self.padding,
            });
        }
        self.output_len()
            .ok_or(KernelError::NonPositiveOutputLength {
                in_len: self.lin,
                padding: self.padding,
                kernel_size: self.kernel_size,
                stride: self.stride,
            })
    }
}
