//! # certisimp
//!
//! A proof-producing term simplifier for a small dependently-typed
//! expression language.
//!
//! The crate contains:
//! - a kernel: hash-consed expressions, an environment of declared
//!   constants, a type checker and equality proof-term builders
//!   (in `kernel`)
//! - the simplifier and its supporting algorithms: rule matching,
//!   a structural term order, rewrite-rule sets, congruence theorems
//!   and contextual rewriting (in `algo`)
//!
//! The main entry point is [`algo::simplify`]: given a term, a local
//! context, options and rewrite-rule sets, it returns a simplified
//! term together with a proof that both are equal.

#![deny(unsafe_code)]

pub mod algo;
pub mod error;
pub mod kernel;
pub mod options;

pub use algo::{
    simplify, simplify_with_namespaces, CongrArg, CongrContext, CongrTheorem, RewriteRule,
    RewriteRuleSet, SimpConfig, SimpResult, Simplifier,
};
pub use error::{Error, Result};
pub use kernel::{Ctx, Expr, ExprView, Exprs, Locals, Symbol, Type, Value, ValueRepr};
pub use options::Options;

pub(crate) mod macros {
    #[allow(unused_macros)]
    #[macro_export]
    macro_rules! ignore{
        () => { () };
        ($t :expr) => {{
            let _ = &$t;
        } };
        ($t0: expr, $($t:expr),*) => {{
            let _ = &$t0;
            $crate::ignore!($($t),*)
        }}
    }

    #[macro_export]
    macro_rules! logtrace{
        ($($t:expr),*) => {{
            {
                #[cfg(feature="logging")]
                log::trace!($($t),*)
            }

            {
                #[cfg(not(feature="logging"))]
                $crate::ignore!($($t),*)
            }
        }}
    }

    #[macro_export]
    macro_rules! logdebug{
        ($($t:expr),*) => {{
            {
                #[cfg(feature="logging")]
                log::debug!($($t),*)
            }

            {
                #[cfg(not(feature="logging"))]
                $crate::ignore!($($t),*)
            }
        }}
    }
}
