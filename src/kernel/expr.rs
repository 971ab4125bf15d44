//! # Expressions.
//!
//! Expressions form a persistent tree with maximal structural sharing:
//! nodes are refcounted, produced only by the hash-consing [`Ctx`],
//! and compared by pointer. Bound variables are de Bruijn indices;
//! binder names are kept for printing but ignored by structural
//! equality (terms are identified up to alpha).
//!
//! [`Ctx`]: super::Ctx

use super::symbol::Symbol;
use super::{Ref, WeakRef};
use smallvec::SmallVec;
use std::fmt;

/// De Bruijn indices.
pub type DbIndex = u32;

/// An expression.
///
/// The expression is refcounted and is thus cheaply clonable.
#[derive(Clone)]
pub struct Expr(pub(super) Ref<ExprImpl>);

/// Small vector of exprs.
pub type Exprs = SmallVec<[Expr; 4]>;

/// Types and terms share one representation.
pub type Type = Expr;

/// A weak reference to an expression.
///
/// This is only used in the hashconsing table, so that it is not
/// the only reference keeping a term alive.
#[derive(Clone)]
pub(super) struct WExpr(pub(super) WeakRef<ExprImpl>);

/// The public view of an expression's root.
#[derive(Clone, Debug)]
pub enum ExprView {
    /// The universe of types.
    EType,
    /// A bound variable.
    EVar(DbIndex),
    /// A declared constant.
    EConst(Symbol),
    /// An opaque metavariable. The simplifier never solves these.
    EMeta(Symbol),
    /// An irreducible semantic value.
    EValue(Value),
    /// An application. `args[0]` is the head; arity is at least 2.
    EApp(Exprs),
    /// `λ (name : domain), body`
    ELambda(Symbol, Expr, Expr),
    /// `Π (name : domain), body`
    EPi(Symbol, Expr, Expr),
    /// `let name [: ty] := value in body`
    ELet(Symbol, Option<Expr>, Expr, Expr),
}

pub use ExprView::*;

/// A semantic value: a literal the environment treats as irreducible
/// data, suitable for built-in evaluation.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Value {
    /// Type of the literal (a closed term).
    pub ty: Expr,
    pub repr: ValueRepr,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub enum ValueRepr {
    Num(i64),
}

/// The content of an expression.
pub(super) struct ExprImpl {
    /// Unique ID of the context responsible for creating this expr.
    pub(super) ctx_uid: u32,
    /// The view of the expression.
    pub(super) view: ExprView,
    /// Maximum loose de Bruijn index, plus one. 0 means the term is closed.
    pub(super) db_depth: DbIndex,
}

#[inline]
fn pred_db_idx(n: DbIndex) -> DbIndex {
    if n == 0 {
        0
    } else {
        n - 1
    }
}

// compute the deepest loose index
fn compute_db_depth(e: &ExprView) -> DbIndex {
    match e {
        EType | EConst(..) | EMeta(..) => 0u32,
        EValue(v) => v.ty.db_depth(),
        EVar(idx) => idx + 1,
        EApp(args) => {
            let mut d = 0;
            for a in &args[..] {
                d = d.max(a.db_depth())
            }
            d
        }
        ELambda(_, ty, body) | EPi(_, ty, body) => {
            // the body's depth is decremented here
            ty.db_depth().max(pred_db_idx(body.db_depth()))
        }
        ELet(_, ty, v, body) => {
            let dty = ty.as_ref().map_or(0, |t| t.db_depth());
            dty.max(v.db_depth()).max(pred_db_idx(body.db_depth()))
        }
    }
}

impl ExprView {
    /// Binder-name-insensitive structural equality of the root, given
    /// that sub-expressions are compared by pointer.
    fn alpha_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (EType, EType) => true,
            (EVar(i), EVar(j)) => i == j,
            (EConst(a), EConst(b)) => a == b,
            (EMeta(a), EMeta(b)) => a == b,
            (EValue(a), EValue(b)) => a == b,
            (EApp(a), EApp(b)) => a == b,
            (ELambda(_, ty1, b1), ELambda(_, ty2, b2)) => ty1 == ty2 && b1 == b2,
            (EPi(_, ty1, b1), EPi(_, ty2, b2)) => ty1 == ty2 && b1 == b2,
            (ELet(_, ty1, v1, b1), ELet(_, ty2, v2, b2)) => ty1 == ty2 && v1 == v2 && b1 == b2,
            _ => false,
        }
    }
}

mod view_impls {
    use super::*;
    use std::hash::{Hash, Hasher};

    impl PartialEq for ExprView {
        fn eq(&self, other: &Self) -> bool {
            self.alpha_eq(other)
        }
    }
    impl Eq for ExprView {}

    // must agree with `alpha_eq`: binder names are not hashed.
    impl Hash for ExprView {
        fn hash<H: Hasher>(&self, h: &mut H) {
            match self {
                EType => 0u8.hash(h),
                EVar(i) => {
                    1u8.hash(h);
                    i.hash(h)
                }
                EConst(s) => {
                    2u8.hash(h);
                    s.hash(h)
                }
                EMeta(s) => {
                    3u8.hash(h);
                    s.hash(h)
                }
                EValue(v) => {
                    4u8.hash(h);
                    v.hash(h)
                }
                EApp(args) => {
                    5u8.hash(h);
                    args.hash(h)
                }
                ELambda(_, ty, b) => {
                    6u8.hash(h);
                    ty.hash(h);
                    b.hash(h)
                }
                EPi(_, ty, b) => {
                    7u8.hash(h);
                    ty.hash(h);
                    b.hash(h)
                }
                ELet(_, ty, v, b) => {
                    8u8.hash(h);
                    ty.hash(h);
                    v.hash(h);
                    b.hash(h)
                }
            }
        }
    }
}

impl Expr {
    /// View the expression's root.
    #[inline]
    pub fn view(&self) -> &ExprView {
        &self.0.view
    }

    pub(super) fn ctx_uid(&self) -> u32 {
        self.0.ctx_uid
    }

    /// Is this the representation of `Type`?
    #[inline]
    pub fn is_type(&self) -> bool {
        matches!(self.0.view, EType)
    }

    /// Is this a semantic value?
    #[inline]
    pub fn is_value(&self) -> bool {
        matches!(self.0.view, EValue(..))
    }

    /// Is this an application?
    #[inline]
    pub fn is_app(&self) -> bool {
        matches!(self.0.view, EApp(..))
    }

    /// View as a bound variable.
    pub fn as_var(&self) -> Option<DbIndex> {
        if let EVar(i) = self.0.view {
            Some(i)
        } else {
            None
        }
    }

    /// View as a constant.
    pub fn as_const(&self) -> Option<&Symbol> {
        if let EConst(ref s) = self.0.view {
            Some(s)
        } else {
            None
        }
    }

    /// View as a value.
    pub fn as_value(&self) -> Option<&Value> {
        if let EValue(ref v) = self.0.view {
            Some(v)
        } else {
            None
        }
    }

    /// View as an application: all arguments, head first.
    pub fn as_app(&self) -> Option<&[Expr]> {
        if let EApp(ref args) = self.0.view {
            Some(&args[..])
        } else {
            None
        }
    }

    /// View as a lambda-expression.
    pub fn as_lambda(&self) -> Option<(&Symbol, &Expr, &Expr)> {
        if let ELambda(ref n, ref ty, ref bod) = self.0.view {
            Some((n, ty, bod))
        } else {
            None
        }
    }

    /// View as a dependent product.
    pub fn as_pi(&self) -> Option<(&Symbol, &Expr, &Expr)> {
        if let EPi(ref n, ref ty, ref bod) = self.0.view {
            Some((n, ty, bod))
        } else {
            None
        }
    }

    /// Head of an application, or the expression itself.
    pub fn head(&self) -> &Expr {
        match self.0.view {
            EApp(ref args) => &args[0],
            _ => self,
        }
    }

    /// Is this a non-dependent product `a -> b`?
    pub fn is_arrow(&self) -> bool {
        match self.view() {
            EPi(_, _, body) => !body.has_loose_bvar(0),
            _ => false,
        }
    }

    /// `(eq A a b).unfold_eq()` returns `Some((A, a, b))`.
    pub fn unfold_eq(&self) -> Option<(&Expr, &Expr, &Expr)> {
        let args = self.as_app()?;
        if args.len() == 4 && args[0].as_const().map_or(false, |c| c.name() == "eq") {
            Some((&args[1], &args[2], &args[3]))
        } else {
            None
        }
    }

    /// `(not p).unfold_not()` returns `Some(p)`.
    pub fn unfold_not(&self) -> Option<&Expr> {
        let args = self.as_app()?;
        if args.len() == 2 && args[0].as_const().map_or(false, |c| c.name() == "not") {
            Some(&args[1])
        } else {
            None
        }
    }

    /// Is this an application of `cast A B H a`?
    pub fn is_cast(&self) -> bool {
        match self.as_app() {
            Some(args) => {
                args.len() == 5 && args[0].as_const().map_or(false, |c| c.name() == "cast")
            }
            None => false,
        }
    }

    /// Deepest loose variable in the expr, plus one.
    ///
    /// 0 means it's a closed term.
    #[inline]
    pub fn db_depth(&self) -> DbIndex {
        self.0.db_depth
    }

    /// Is this a closed term?
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.db_depth() == 0
    }

    /// Does variable `idx` occur loose in this term?
    pub fn has_loose_bvar(&self, idx: DbIndex) -> bool {
        fn rec(e: &Expr, idx: DbIndex) -> bool {
            if e.db_depth() <= idx {
                return false; // shortcut: no variable that deep
            }
            match e.view() {
                EVar(j) => *j == idx,
                EType | EConst(..) | EMeta(..) => false,
                EValue(v) => rec(&v.ty, idx),
                EApp(args) => args.iter().any(|a| rec(a, idx)),
                ELambda(_, ty, b) | EPi(_, ty, b) => rec(ty, idx) || rec(b, idx + 1),
                ELet(_, ty, v, b) => {
                    ty.as_ref().map_or(false, |t| rec(t, idx)) || rec(v, idx) || rec(b, idx + 1)
                }
            }
        }
        rec(self, idx)
    }

    /// Obtain a weak reference to this expression.
    #[inline]
    pub(super) fn weak(&self) -> WExpr {
        WExpr(Ref::downgrade(&self.0))
    }

    // helper for building expressions
    pub(super) fn make_(v: ExprView, ctx_uid: u32) -> Self {
        let db_depth = compute_db_depth(&v);
        Expr(Ref::new(ExprImpl {
            view: v,
            ctx_uid,
            db_depth,
        }))
    }

    // pretty print, with the stack of binder names traversed so far
    fn pp_(&self, names: &mut Vec<Symbol>, out: &mut fmt::Formatter) -> fmt::Result {
        match self.view() {
            EType => write!(out, "Type"),
            EConst(c) => write!(out, "{}", c),
            EMeta(m) => write!(out, "?{}", m),
            EValue(v) => match &v.repr {
                ValueRepr::Num(n) => write!(out, "{}", n),
            },
            EVar(i) => {
                let i = *i as usize;
                if i < names.len() {
                    write!(out, "{}", names[names.len() - 1 - i])
                } else {
                    // loose variable
                    write!(out, "#{}", i - names.len())
                }
            }
            EApp(args) => {
                write!(out, "(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(out, " ")?;
                    }
                    a.pp_(names, out)?;
                }
                write!(out, ")")
            }
            ELambda(n, ty, body) => {
                write!(out, "(\\{} : ", n)?;
                ty.pp_(names, out)?;
                write!(out, ". ")?;
                names.push(n.clone());
                body.pp_(names, out)?;
                names.pop();
                write!(out, ")")
            }
            EPi(n, ty, body) => {
                if self.is_arrow() {
                    write!(out, "(")?;
                    ty.pp_(names, out)?;
                    write!(out, " -> ")?;
                    names.push(n.clone());
                    body.pp_(names, out)?;
                    names.pop();
                    write!(out, ")")
                } else {
                    write!(out, "(pi {} : ", n)?;
                    ty.pp_(names, out)?;
                    write!(out, ". ")?;
                    names.push(n.clone());
                    body.pp_(names, out)?;
                    names.pop();
                    write!(out, ")")
                }
            }
            ELet(n, _, v, body) => {
                write!(out, "(let {} := ", n)?;
                v.pp_(names, out)?;
                write!(out, " in ")?;
                names.push(n.clone());
                body.pp_(names, out)?;
                names.pop();
                write!(out, ")")
            }
        }
    }
}

mod impls {
    use super::*;

    impl fmt::Debug for Expr {
        fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
            let mut names = vec![];
            self.pp_(&mut names, out)
        }
    }

    impl fmt::Display for Expr {
        fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
            let mut names = vec![];
            self.pp_(&mut names, out)
        }
    }

    impl Eq for Expr {}
    impl PartialEq for Expr {
        fn eq(&self, other: &Self) -> bool {
            // simple pointer equality
            std::ptr::eq(
                self.0.as_ref() as *const ExprImpl,
                other.0.as_ref() as *const _,
            )
        }
    }

    impl PartialOrd for Expr {
        fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
            // simple pointer comparison
            std::cmp::PartialOrd::partial_cmp(
                &(self.0.as_ref() as *const ExprImpl),
                &(other.0.as_ref() as *const _),
            )
        }
    }
    impl Ord for Expr {
        fn cmp(&self, other: &Self) -> std::cmp::Ordering {
            // simple pointer comparison
            std::cmp::Ord::cmp(
                &(self.0.as_ref() as *const ExprImpl),
                &(other.0.as_ref() as *const ExprImpl),
            )
        }
    }

    impl std::hash::Hash for Expr {
        fn hash<H: std::hash::Hasher>(&self, h: &mut H) {
            // hash pointer
            std::ptr::hash(self.0.as_ref() as *const ExprImpl, h)
        }
    }

    // used to be able to lookup in the hashconsing map using an `ExprView`
    impl std::borrow::Borrow<ExprView> for Expr {
        fn borrow(&self) -> &ExprView {
            &self.0.view
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_sizeof_expr() {
        let sz = std::mem::size_of::<Expr>();
        assert_eq!(8, sz);
    }
}
