//! Congruence theorems.
//!
//! A congruence theorem describes, for one head symbol, how to rebuild
//! an equality proof of a full application from per-argument proofs,
//! and which arguments are simplified under an extra hypothesis taken
//! from a sibling argument (contextual rewriting).

use crate::error::Result;
use crate::errorstr;
use crate::kernel::Expr;

/// Hypothesis derivation for one argument.
#[derive(Debug, Clone)]
pub struct CongrContext {
    /// Position (in the application) of the argument the hypothesis is
    /// derived from.
    pub arg_pos: usize,
    /// Use the post-simplification value of that argument.
    pub use_new_val: bool,
    /// When false, the hypothesis is the negation of the argument.
    pub is_pos_dep: bool,
}

/// Per-argument description.
#[derive(Debug, Clone)]
pub struct CongrArg {
    /// Position in the application (the head is position 0).
    pub arg_pos: usize,
    /// Whether this argument is rewritten at all.
    pub should_simplify: bool,
    /// Present when the argument is simplified under a hypothesis.
    pub context: Option<CongrContext>,
    /// Slot of the original value in the proof-argument buffer.
    pub pos_at_proof: usize,
    /// Slot of the simplified value; required when `should_simplify`.
    pub new_pos_at_proof: Option<usize>,
    /// Slot of the equality proof (or the hypothesis-abstracted proof);
    /// required when `should_simplify`.
    pub proof_pos_at_proof: Option<usize>,
}

/// A congruence theorem for one head symbol.
#[derive(Debug, Clone)]
pub struct CongrTheorem {
    fun_: Expr,
    proof: Expr,
    num_proof_args: usize,
    args: Vec<CongrArg>,
}

impl CongrTheorem {
    /// Build a congruence theorem, checking that the argument
    /// descriptions fill each slot of the proof-argument buffer
    /// exactly once.
    pub fn new(
        fun_: Expr,
        proof: Expr,
        num_proof_args: usize,
        args: Vec<CongrArg>,
    ) -> Result<Self> {
        if fun_.as_const().is_none() {
            return Err(errorstr!(
                "congruence theorem head must be a constant, got `{}`",
                fun_
            ));
        }
        let mut filled = vec![false; num_proof_args];
        let mut fill = |slot: usize| -> Result<()> {
            if slot >= num_proof_args {
                return Err(errorstr!("congruence proof slot {} out of range", slot));
            }
            if filled[slot] {
                return Err(errorstr!("congruence proof slot {} filled twice", slot));
            }
            filled[slot] = true;
            Ok(())
        };
        for a in &args {
            fill(a.pos_at_proof)?;
            if a.should_simplify {
                match (a.new_pos_at_proof, a.proof_pos_at_proof) {
                    (Some(np), Some(pp)) => {
                        fill(np)?;
                        fill(pp)?;
                    }
                    _ => {
                        return Err(errorstr!(
                            "argument {} is simplified but lacks proof slots",
                            a.arg_pos
                        ))
                    }
                }
            } else if a.context.is_some() {
                return Err(errorstr!(
                    "argument {} has a context but is not simplified",
                    a.arg_pos
                ));
            }
        }
        if let Some(slot) = filled.iter().position(|f| !f) {
            return Err(errorstr!("congruence proof slot {} never filled", slot));
        }
        Ok(Self {
            fun_,
            proof,
            num_proof_args,
            args,
        })
    }

    /// The head symbol this theorem applies to.
    pub fn fun(&self) -> &Expr {
        &self.fun_
    }

    pub fn proof(&self) -> &Expr {
        &self.proof
    }

    pub fn num_proof_args(&self) -> usize {
        self.num_proof_args
    }

    pub fn args(&self) -> &[CongrArg] {
        &self.args
    }
}
