//! Fused operators: composite operations that are rewritten into primitive
//! subgraphs before lowering.

mod lstm_cell;

use smallvec::SmallVec;

pub use lstm_cell::{DEFAULT_ACTIVATIONS, LstmCell, LstmCellConfig, LstmCellInputs};

use crate::error::Result;
use crate::node::Output;

pub trait FusedOp {
    /// Declared inputs, in order. A decomposition may reference no other
    /// graph inputs.
    fn fused_inputs(&self) -> &[Output];

    /// Builds the equivalent primitive subgraph and returns its outputs in
    /// the order the fused operator declares them.
    fn decompose(&self) -> Result<SmallVec<[Output; 2]>>;
}
