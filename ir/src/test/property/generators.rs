//! Proptest strategies for LSTM cell parameters.

use proptest::prelude::*;

use crate::activation::ActivationKind;
use crate::fused::LstmCellConfig;
use crate::test::fixtures::LstmDims;

pub fn lstm_dims() -> impl Strategy<Value = LstmDims> {
    (1usize..4, 1usize..6, 1usize..9).prop_map(|(batch, input_size, hidden)| LstmDims::new(batch, input_size, hidden))
}

pub fn activation_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(ActivationKind::Sigmoid),
        Just(ActivationKind::Tanh),
        Just(ActivationKind::Relu),
        Just(ActivationKind::HardSigmoid),
    ]
    .prop_map(|kind| kind.to_string())
}

/// Valid configuration; `hidden_size` is overwritten by the graph fixture.
pub fn lstm_config() -> impl Strategy<Value = LstmCellConfig> {
    (
        prop::collection::vec(activation_name(), 3),
        prop_oneof![Just(0.0f32), 0.5f32..4.0],
        any::<bool>(),
    )
        .prop_map(|(activations, clip, input_forget)| {
            LstmCellConfig::builder()
                .hidden_size(1)
                .activations(activations)
                .clip(clip)
                .input_forget(input_forget)
                .build()
        })
}
