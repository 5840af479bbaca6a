//! Text-form target module.
//!
//! Emits MLIR in generic operation form as plain strings, one line per
//! operation, inside a single `func.func`.

pub mod types;

use smallvec::SmallVec;
use snafu::ensure;
use tessera_ir::TensorType;

use crate::builder::{Attribute, DialectBuilder};
use crate::error::*;
use types::{result_types, tensor_type};

/// SSA value of a [`TextModule`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextValue {
    pub name: String,
    pub ty: TensorType,
}

#[derive(Debug, Clone)]
pub struct TextModule {
    function: String,
    arguments: Vec<TextValue>,
    body: Vec<String>,
    results: Option<Vec<TextValue>>,
    next_id: usize,
}

impl TextModule {
    pub fn new(function: impl Into<String>) -> Self {
        Self { function: function.into(), arguments: Vec::new(), body: Vec::new(), results: None, next_id: 0 }
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn arguments(&self) -> &[TextValue] {
        &self.arguments
    }

    /// Emitted operation lines, without the terminator.
    pub fn body(&self) -> &[String] {
        &self.body
    }

    pub fn is_terminated(&self) -> bool {
        self.results.is_some()
    }

    fn fresh(&mut self, ty: &TensorType) -> TextValue {
        let value = TextValue { name: format!("%{}", self.next_id), ty: ty.clone() };
        self.next_id += 1;
        value
    }

    pub fn render(&self) -> Result<String> {
        let arguments = self
            .arguments
            .iter()
            .map(|arg| Ok(format!("{}: {}", arg.name, tensor_type(&arg.ty)?)))
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        let results = self.results.as_deref().unwrap_or_default();
        let result_types = results.iter().map(|value| tensor_type(&value.ty)).collect::<Result<Vec<_>>>()?;
        let names: Vec<&str> = results.iter().map(|value| value.name.as_str()).collect();

        let mut out = String::from("module {\n");
        out.push_str(&format!(
            "  func.func @{}({arguments}) -> ({}) {{\n",
            self.function,
            result_types.join(", ")
        ));
        for line in &self.body {
            out.push_str("    ");
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&format!(
            "    \"func.return\"({}) : ({}) -> ()\n",
            names.join(", "),
            result_types.join(", ")
        ));
        out.push_str("  }\n}\n");
        Ok(out)
    }
}

impl DialectBuilder for TextModule {
    type Value = TextValue;

    fn argument(&mut self, index: usize, ty: &TensorType) -> Result<TextValue> {
        let expected = self.arguments.len();
        ensure!(index == expected, ArgumentOrderSnafu { index, expected });
        tensor_type(ty)?;
        let value = TextValue { name: format!("%arg{index}"), ty: ty.clone() };
        self.arguments.push(value.clone());
        Ok(value)
    }

    fn operation(
        &mut self,
        name: &str,
        operands: &[TextValue],
        attributes: &[(&'static str, Attribute)],
        results: &[TensorType],
    ) -> Result<SmallVec<[TextValue; 2]>> {
        let operand_types = operands.iter().map(|value| tensor_type(&value.ty)).collect::<Result<Vec<_>>>()?;
        let output_types = results.iter().map(tensor_type).collect::<Result<Vec<_>>>()?;
        let values: SmallVec<[TextValue; 2]> = results.iter().map(|ty| self.fresh(ty)).collect();

        let mut line = String::new();
        if !values.is_empty() {
            let names: Vec<&str> = values.iter().map(|value| value.name.as_str()).collect();
            line.push_str(&format!("{} = ", names.join(", ")));
        }
        let operand_names: Vec<&str> = operands.iter().map(|value| value.name.as_str()).collect();
        line.push_str(&format!("\"{name}\"({})", operand_names.join(", ")));
        if !attributes.is_empty() {
            let attrs: Vec<String> = attributes.iter().map(|(key, value)| format!("{key} = {value}")).collect();
            line.push_str(&format!(" {{{}}}", attrs.join(", ")));
        }
        line.push_str(&format!(" : ({}) -> {}", operand_types.join(", "), result_types(&output_types)));

        self.body.push(line);
        Ok(values)
    }

    fn ret(&mut self, values: &[TextValue]) -> Result<()> {
        self.results = Some(values.to_vec());
        Ok(())
    }
}
