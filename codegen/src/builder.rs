//! Contract between the lowering pass and the target IR.

use std::fmt;

use smallvec::SmallVec;
use tessera_ir::TensorType;

use crate::Result;

/// Operation attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
}

impl Attribute {
    pub fn usizes(values: &[usize]) -> Self {
        Self::Ints(values.iter().map(|&v| v as i64).collect())
    }
}

/// Float literal that always carries a decimal point.
fn float_literal(value: f64) -> String {
    let text = format!("{value:?}");
    if !value.is_finite() || text.contains('.') {
        return text;
    }
    match text.find('e') {
        Some(exponent) => format!("{}.0{}", &text[..exponent], &text[exponent..]),
        None => format!("{text}.0"),
    }
}

fn join<T>(values: &[T], render: impl Fn(&T) -> String) -> String {
    values.iter().map(render).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value} : i64"),
            Self::Float(value) => write!(f, "{} : f64", float_literal(*value)),
            Self::Str(value) => write!(f, "{value:?}"),
            Self::Ints(values) if values.is_empty() => write!(f, "array<i64>"),
            Self::Ints(values) => write!(f, "array<i64: {}>", join(values, i64::to_string)),
            Self::Floats(values) if values.is_empty() => write!(f, "array<f64>"),
            Self::Floats(values) => write!(f, "array<f64: {}>", join(values, |v| float_literal(*v))),
        }
    }
}

/// Injected target-IR builder.
///
/// The lowering pass only issues structured construction calls; the target
/// IR owns its type system and verification.
pub trait DialectBuilder {
    type Value: Clone;

    /// Declares function argument `index`. Arguments arrive in index order.
    fn argument(&mut self, index: usize, ty: &TensorType) -> Result<Self::Value>;

    /// Appends one operation and returns its results, one per `results` entry.
    fn operation(
        &mut self,
        name: &str,
        operands: &[Self::Value],
        attributes: &[(&'static str, Attribute)],
        results: &[TensorType],
    ) -> Result<SmallVec<[Self::Value; 2]>>;

    /// Terminates the function, returning `values`.
    fn ret(&mut self, values: &[Self::Value]) -> Result<()>;
}
