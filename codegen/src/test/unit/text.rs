use tessera_dtype::DType;
use tessera_ir::{Graph, Output, TensorType};
use test_case::test_case;

use crate::error::Error;
use crate::text::types::tensor_type;
use crate::{ConverterTable, DialectBuilder, TextModule, lower_graph};

#[test_case(DType::Float32, &[2, 3], "tensor<2x3xf32>"; "matrix")]
#[test_case(DType::BFloat16, &[8], "tensor<8xbf16>"; "vector")]
#[test_case(DType::Bool, &[], "tensor<i1>"; "scalar")]
#[test_case(DType::UInt16, &[1, 1, 4], "tensor<1x1x4xui16>"; "unsigned")]
fn test_tensor_type(dtype: DType, shape: &[usize], expected: &str) {
    assert_eq!(tensor_type(&TensorType::new(dtype, shape.iter().copied())).unwrap(), expected);
}

#[test]
fn test_placeholder_types_are_rejected() {
    let ty = TensorType::new(DType::Dynamic, [2]);
    assert!(matches!(tensor_type(&ty), Err(Error::UnsupportedType { dtype: DType::Dynamic })));
}

#[test]
fn test_arguments_in_order() {
    let mut module = TextModule::new("f");
    let ty = TensorType::new(DType::Float32, [2]);
    assert!(matches!(module.argument(1, &ty), Err(Error::ArgumentOrder { index: 1, expected: 0 })));
    assert_eq!(module.argument(0, &ty).unwrap().name, "%arg0");
}

#[test]
fn test_render_module() {
    let x = Output::parameter(0, DType::Float32, [2, 3]);
    let graph = Graph::new(vec![x.clone()], vec![x.try_relu().unwrap()]).unwrap();

    let mut module = TextModule::new("main");
    lower_graph(&graph, &mut module, &ConverterTable::standard(), None).unwrap();

    let expected = "\
module {
  func.func @main(%arg0: tensor<2x3xf32>) -> (tensor<2x3xf32>) {
    %0 = \"tg.relu\"(%arg0) : (tensor<2x3xf32>) -> tensor<2x3xf32>
    \"func.return\"(%0) : (tensor<2x3xf32>) -> ()
  }
}
";
    assert_eq!(module.render().unwrap(), expected);
}

#[test]
fn test_operation_with_attributes() {
    let mut module = TextModule::new("main");
    let ty = TensorType::new(DType::Float64, [4]);
    let arg = module.argument(0, &ty).unwrap();
    let attrs = [("min", crate::Attribute::Float(-1.0)), ("max", crate::Attribute::Float(1.0))];
    let results = module.operation("tg.clamp", &[arg], &attrs, &[ty]).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(
        module.body(),
        &["%0 = \"tg.clamp\"(%arg0) {min = -1.0 : f64, max = 1.0 : f64} : (tensor<4xf64>) -> tensor<4xf64>".to_string()]
    );
}
