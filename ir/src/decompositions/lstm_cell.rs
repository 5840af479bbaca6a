//! LSTM cell decomposition (ONNX equations, gate order i, o, f, c).
//!
//! ```text
//! gates = X * W^T + H * R^T + (Wb + Rb)
//! i  = f(clip(gates_i + P_i * C))
//! f  = f(clip(gates_f + P_f * C))      or 1 - i with input_forget
//! c  = g(clip(gates_c))
//! C' = f * C + i * c
//! o  = f(clip(gates_o + P_o * C'))
//! H' = o * h(C')
//! ```
//!
//! The output gate peephole reads the updated cell state `C'`.

use smallvec::{SmallVec, smallvec};

use super::helpers::{clip, one_minus, split};
use crate::error::Result;
use crate::fused::{FusedOp, LstmCell};
use crate::node::Output;

impl FusedOp for LstmCell {
    fn fused_inputs(&self) -> &[Output] {
        self.inputs()
    }

    fn decompose(&self) -> Result<SmallVec<[Output; 2]>> {
        let [f, g, h] = self.activations();
        let bound = self.clip();
        let c_prev = self.c();

        let xt_w = self.x().try_dot(&self.w().try_t()?)?;
        let ht_r = self.h().try_dot(&self.r().try_t()?)?;
        let [wb, rb] = split::<2>(self.b(), 0)?;
        let gates = xt_w.try_add(&ht_r)?.try_add(&wb.try_add(&rb)?)?;

        let [i_t, o_t, f_t, c_t] = split::<4>(&gates, 1)?;
        let [p_i, p_o, p_f] = split::<3>(self.p(), 0)?;

        let i = f.apply(&clip(&i_t.try_add(&p_i.try_mul(c_prev)?)?, bound)?)?;
        let forget = if self.input_forget() {
            one_minus(&i)?
        } else {
            f.apply(&clip(&f_t.try_add(&p_f.try_mul(c_prev)?)?, bound)?)?
        };
        let cell_input = g.apply(&clip(&c_t, bound)?)?;

        let c_next = forget.try_mul(c_prev)?.try_add(&i.try_mul(&cell_input)?)?;
        let o = f.apply(&clip(&o_t.try_add(&p_o.try_mul(&c_next)?)?, bound)?)?;
        let h_next = o.try_mul(&h.apply(&c_next)?)?;

        Ok(smallvec![h_next, c_next])
    }
}
