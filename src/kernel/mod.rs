//! Kernel: expressions, the hash-consing context, typing and proof terms.

pub type Ref<T> = std::rc::Rc<T>;
pub type WeakRef<T> = std::rc::Weak<T>;

pub use crate::error::{Error, Result};

pub mod ctx;
pub mod expr;
pub mod proofs;
pub mod symbol;
pub mod tc;

pub use ctx::{BuiltinFn, Ctx, Object};
pub use expr::{DbIndex, Expr, ExprView, Exprs, Type, Value, ValueRepr};
pub use symbol::Symbol;
pub use tc::Locals;
pub use ExprView::*;
