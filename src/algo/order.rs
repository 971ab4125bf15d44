//! Structural term order.
//!
//! A strict total order on expressions, used to guard permutation
//! rewrite rules: a rule whose sides are permutations of each other
//! only fires when it makes the term strictly smaller, so chains of
//! commutativity steps terminate at the order-minimal form.

use crate::kernel::{Expr, ExprView::*};
use std::cmp::Ordering;

fn kind_rank(e: &Expr) -> u8 {
    match e.view() {
        EType => 0,
        EVar(..) => 1,
        EConst(..) => 2,
        EMeta(..) => 3,
        EValue(..) => 4,
        EApp(..) => 5,
        ELambda(..) => 6,
        EPi(..) => 7,
        ELet(..) => 8,
    }
}

/// Compare two expressions structurally. Binder names are ignored,
/// consistent with expression equality.
pub fn compare(a: &Expr, b: &Expr) -> Ordering {
    if a == b {
        return Ordering::Equal; // pointer shortcut
    }
    let r = kind_rank(a).cmp(&kind_rank(b));
    if r != Ordering::Equal {
        return r;
    }
    match (a.view(), b.view()) {
        (EType, EType) => Ordering::Equal,
        (EVar(i), EVar(j)) => i.cmp(j),
        (EConst(x), EConst(y)) | (EMeta(x), EMeta(y)) => x.cmp(y),
        (EValue(x), EValue(y)) => x
            .repr
            .cmp(&y.repr)
            .then_with(|| compare(&x.ty, &y.ty)),
        (EApp(xs), EApp(ys)) => {
            let r = xs.len().cmp(&ys.len());
            if r != Ordering::Equal {
                return r;
            }
            for (x, y) in xs.iter().zip(ys.iter()) {
                let r = compare(x, y);
                if r != Ordering::Equal {
                    return r;
                }
            }
            Ordering::Equal
        }
        (ELambda(_, ty1, b1), ELambda(_, ty2, b2)) | (EPi(_, ty1, b1), EPi(_, ty2, b2)) => {
            compare(ty1, ty2).then_with(|| compare(b1, b2))
        }
        (ELet(_, ty1, v1, b1), ELet(_, ty2, v2, b2)) => {
            let r = match (ty1, ty2) {
                (None, None) => Ordering::Equal,
                (None, Some(..)) => Ordering::Less,
                (Some(..), None) => Ordering::Greater,
                (Some(t1), Some(t2)) => compare(t1, t2),
            };
            r.then_with(|| compare(v1, v2)).then_with(|| compare(b1, b2))
        }
        _ => unreachable!("kinds already compared"),
    }
}

/// Is `a` strictly smaller than `b`?
pub fn is_lt(a: &Expr, b: &Expr) -> bool {
    compare(a, b) == Ordering::Less
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kernel::Ctx;

    #[test]
    fn test_total_order() {
        let mut ctx = Ctx::new();
        let ty = ctx.mk_type();
        let nat = ctx.declare_const("Nat", ty).unwrap();
        let a = ctx.declare_const("a", nat.clone()).unwrap();
        let b = ctx.declare_const("b", nat.clone()).unwrap();
        assert_eq!(compare(&a, &a), Ordering::Equal);
        assert!(is_lt(&a, &b));
        assert!(!is_lt(&b, &a));

        let add_ty = {
            let arr = ctx.mk_arrow(nat.clone(), nat.clone());
            ctx.mk_arrow(nat.clone(), arr)
        };
        let add = ctx.declare_builtin("add", add_ty, |_| None).unwrap();
        let ab = ctx.mk_app_l(&add, &[a.clone(), b.clone()]);
        let ba = ctx.mk_app_l(&add, &[b, a.clone()]);
        // first differing argument decides
        assert!(is_lt(&ab, &ba));
        // a constant is smaller than an application
        assert!(is_lt(&a, &ab));
    }
}
