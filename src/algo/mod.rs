//! Algorithms built on top of the kernel: matching, term ordering,
//! rewrite rules and the simplifier itself.

pub mod congr;
pub mod matching;
pub mod order;
pub mod rw_rule;
pub mod simp;

pub use congr::{CongrArg, CongrContext, CongrTheorem};
pub use matching::hop_match;
pub use order::{compare, is_lt};
pub use rw_rule::{RewriteRule, RewriteRuleSet};
pub use simp::{simplify, simplify_with_namespaces, SimpConfig, SimpResult, Simplifier};
