//! TensorType → MLIR type syntax.

use snafu::OptionExt;
use tessera_dtype::DType;
use tessera_ir::TensorType;

use crate::error::*;

pub fn element_type(dtype: DType) -> Result<&'static str> {
    let name = match dtype {
        DType::Bool => Some("i1"),
        DType::Int8 => Some("i8"),
        DType::Int16 => Some("i16"),
        DType::Int32 => Some("i32"),
        DType::Int64 => Some("i64"),
        DType::UInt8 => Some("ui8"),
        DType::UInt16 => Some("ui16"),
        DType::UInt32 => Some("ui32"),
        DType::UInt64 => Some("ui64"),
        DType::Float16 => Some("f16"),
        DType::BFloat16 => Some("bf16"),
        DType::Float32 => Some("f32"),
        DType::Float64 => Some("f64"),
        DType::Dynamic | DType::Undefined => None,
    };
    name.context(UnsupportedTypeSnafu { dtype })
}

/// `tensor<2x3xf32>`, or `tensor<f32>` for scalars.
pub fn tensor_type(ty: &TensorType) -> Result<String> {
    let element = element_type(ty.dtype)?;
    let dims: String = ty.shape.iter().map(|dim| format!("{dim}x")).collect();
    Ok(format!("tensor<{dims}{element}>"))
}

/// Result type list: bare for one type, parenthesized otherwise.
pub fn result_types(types: &[String]) -> String {
    match types {
        [single] => single.clone(),
        _ => format!("({})", types.join(", ")),
    }
}
