//! Host-resident tensors.
//!
//! Elements are held as `f64` and rounded to the tensor's element type on
//! construction, so an `f32` tensor only ever holds `f32`-representable
//! values. Byte conversion uses the native layout of each element type.

use half::{bf16, f16};
use snafu::ensure;
use tessera_dtype::DType;
use tessera_dtype::ext::HasDType;
use tessera_ir::TensorType;
use tessera_ir::shape::Shape;

use crate::error::*;

/// Native scalar convertible into a host tensor element.
pub trait Element: HasDType + Copy {
    fn to_f64(self) -> f64;
}

macro_rules! impl_element {
    ($($ty:ty),* $(,)?) => {
        $(impl Element for $ty {
            fn to_f64(self) -> f64 {
                self as f64
            }
        })*
    };
}

impl_element!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl Element for f16 {
    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }
}

impl Element for bf16 {
    fn to_f64(self) -> f64 {
        bf16::to_f64(self)
    }
}

impl Element for bool {
    fn to_f64(self) -> f64 {
        if self { 1.0 } else { 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostTensor {
    ty: TensorType,
    data: Vec<f64>,
}

impl HostTensor {
    /// Tensor of type `ty`; values are rounded to `ty.dtype`.
    pub fn from_type(ty: TensorType, data: Vec<f64>) -> Result<Self> {
        let dtype = ty.dtype;
        ensure!(dtype.is_static(), UnsupportedDTypeSnafu { dtype });
        let expected = ty.num_elements();
        ensure!(data.len() == expected, DataLengthSnafu { ty: ty.clone(), expected, actual: data.len() });
        let data = data.into_iter().map(|value| round_to(dtype, value)).collect();
        Ok(Self { ty, data })
    }

    pub fn new(dtype: DType, shape: impl IntoIterator<Item = usize>, data: Vec<f64>) -> Result<Self> {
        Self::from_type(TensorType::new(dtype, shape), data)
    }

    /// ```ignore
    /// let t = HostTensor::from_slice([2, 2], &[1.0f32, 2.0, 3.0, 4.0])?;
    /// assert_eq!(t.dtype(), DType::Float32);
    /// ```
    pub fn from_slice<T: Element>(shape: impl IntoIterator<Item = usize>, values: &[T]) -> Result<Self> {
        Self::new(T::DTYPE, shape, values.iter().map(|value| value.to_f64()).collect())
    }

    pub fn splat(dtype: DType, shape: impl IntoIterator<Item = usize>, value: f64) -> Result<Self> {
        let ty = TensorType::new(dtype, shape);
        let count = ty.num_elements();
        Self::from_type(ty, vec![value; count])
    }

    pub fn zeros(dtype: DType, shape: impl IntoIterator<Item = usize>) -> Result<Self> {
        Self::splat(dtype, shape, 0.0)
    }

    /// Decodes native-layout elements.
    pub fn from_bytes(dtype: DType, shape: impl IntoIterator<Item = usize>, bytes: &[u8]) -> Result<Self> {
        ensure!(dtype.is_static(), UnsupportedDTypeSnafu { dtype });
        let ty = TensorType::new(dtype, shape);
        let width = dtype.bytes();
        let expected = ty.num_elements() * width;
        ensure!(bytes.len() == expected, ByteLengthSnafu { dtype, expected, actual: bytes.len() });
        let data = bytes.chunks_exact(width).map(|chunk| decode(dtype, chunk)).collect();
        Ok(Self { ty, data })
    }

    /// Encodes elements in their native layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.data.len() * self.dtype().bytes());
        for &value in &self.data {
            encode(self.dtype(), value, &mut bytes);
        }
        bytes
    }

    pub fn ty(&self) -> &TensorType {
        &self.ty
    }

    pub fn dtype(&self) -> DType {
        self.ty.dtype
    }

    pub fn shape(&self) -> &Shape {
        &self.ty.shape
    }

    pub fn num_elements(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Same elements under a new shape of equal size.
    pub fn reshaped(&self, ty: TensorType) -> Result<Self> {
        Self::from_type(ty, self.data.clone())
    }

    /// Largest absolute elementwise difference to `other`.
    ///
    /// Returns infinity when the shapes differ.
    pub fn max_abs_diff(&self, other: &HostTensor) -> f64 {
        if self.shape() != other.shape() {
            return f64::INFINITY;
        }
        self.data.iter().zip(&other.data).map(|(a, b)| (a - b).abs()).fold(0.0, f64::max)
    }
}

/// Nearest value of `dtype`. Integer conversion truncates toward zero and
/// saturates.
pub fn round_to(dtype: DType, value: f64) -> f64 {
    match dtype {
        DType::Bool => (value != 0.0) as u8 as f64,
        DType::Int8 => value as i8 as f64,
        DType::Int16 => value as i16 as f64,
        DType::Int32 => value as i32 as f64,
        DType::Int64 => value as i64 as f64,
        DType::UInt8 => value as u8 as f64,
        DType::UInt16 => value as u16 as f64,
        DType::UInt32 => value as u32 as f64,
        DType::UInt64 => value as u64 as f64,
        DType::Float16 => f16::from_f64(value).to_f64(),
        DType::BFloat16 => bf16::from_f64(value).to_f64(),
        DType::Float32 => value as f32 as f64,
        DType::Float64 | DType::Dynamic | DType::Undefined => value,
    }
}

fn raw<const N: usize>(chunk: &[u8]) -> [u8; N] {
    let mut raw = [0u8; N];
    raw.copy_from_slice(chunk);
    raw
}

fn decode(dtype: DType, chunk: &[u8]) -> f64 {
    match dtype {
        DType::Bool => (chunk[0] != 0) as u8 as f64,
        DType::Int8 => i8::from_ne_bytes(raw(chunk)) as f64,
        DType::Int16 => i16::from_ne_bytes(raw(chunk)) as f64,
        DType::Int32 => i32::from_ne_bytes(raw(chunk)) as f64,
        DType::Int64 => i64::from_ne_bytes(raw(chunk)) as f64,
        DType::UInt8 => chunk[0] as f64,
        DType::UInt16 => u16::from_ne_bytes(raw(chunk)) as f64,
        DType::UInt32 => u32::from_ne_bytes(raw(chunk)) as f64,
        DType::UInt64 => u64::from_ne_bytes(raw(chunk)) as f64,
        DType::Float16 => f16::from_bits(u16::from_ne_bytes(raw(chunk))).to_f64(),
        DType::BFloat16 => bf16::from_bits(u16::from_ne_bytes(raw(chunk))).to_f64(),
        DType::Float32 => f32::from_ne_bytes(raw(chunk)) as f64,
        DType::Float64 => f64::from_ne_bytes(raw(chunk)),
        DType::Dynamic | DType::Undefined => unreachable!("placeholder types have no byte layout"),
    }
}

fn encode(dtype: DType, value: f64, out: &mut Vec<u8>) {
    match dtype {
        DType::Bool => out.push((value != 0.0) as u8),
        DType::Int8 => out.extend((value as i8).to_ne_bytes()),
        DType::Int16 => out.extend((value as i16).to_ne_bytes()),
        DType::Int32 => out.extend((value as i32).to_ne_bytes()),
        DType::Int64 => out.extend((value as i64).to_ne_bytes()),
        DType::UInt8 => out.push(value as u8),
        DType::UInt16 => out.extend((value as u16).to_ne_bytes()),
        DType::UInt32 => out.extend((value as u32).to_ne_bytes()),
        DType::UInt64 => out.extend((value as u64).to_ne_bytes()),
        DType::Float16 => out.extend(f16::from_f64(value).to_bits().to_ne_bytes()),
        DType::BFloat16 => out.extend(bf16::from_f64(value).to_bits().to_ne_bytes()),
        DType::Float32 => out.extend((value as f32).to_ne_bytes()),
        DType::Float64 => out.extend(value.to_ne_bytes()),
        DType::Dynamic | DType::Undefined => unreachable!("placeholder types have no byte layout"),
    }
}
