//! Pattern matching for rewrite rules.
//!
//! The left-hand side of a rule lives under the rule's quantifier spine:
//! `Var(i)` occurrences (adjusted for binders crossed during matching)
//! are open pattern variables. `hop_match` fills a substitution buffer
//! indexed by binder position, outermost binder first; non-linear
//! occurrences must match the same sub-term, and a sub-term that
//! references a binder crossed during matching never escapes into the
//! substitution.

use crate::kernel::{Ctx, DbIndex, Expr, ExprView::*};

/// Match `pattern` (with `num` open pattern variables) against `target`.
///
/// On success, `subst[i]` holds the instantiation of the spine's `i`-th
/// binder (outermost first); entries that the pattern does not mention
/// remain `None`. Returns `false` (leaving `subst` in an unspecified
/// state) when the match fails.
pub fn hop_match(
    ctx: &mut Ctx,
    num: usize,
    pattern: &Expr,
    target: &Expr,
    subst: &mut [Option<Expr>],
) -> bool {
    debug_assert_eq!(subst.len(), num);
    rec(ctx, num, pattern, target, 0, subst)
}

fn rec(
    ctx: &mut Ctx,
    num: usize,
    p: &Expr,
    t: &Expr,
    k: DbIndex,
    subst: &mut [Option<Expr>],
) -> bool {
    if let EVar(i) = p.view() {
        if *i >= k {
            // open pattern variable
            let pidx = (*i - k) as usize;
            if pidx >= num {
                return false; // outside the quantifier spine
            }
            let si = num - 1 - pidx;
            let cand = if k == 0 {
                t.clone()
            } else {
                // reject locally-bound captures, unshift the rest
                match ctx.lower_free_vars(t, k, k) {
                    Ok(c) => c,
                    Err(..) => return false,
                }
            };
            return match &subst[si] {
                Some(prev) => *prev == cand,
                None => {
                    subst[si] = Some(cand);
                    true
                }
            };
        }
    }
    match (p.view(), t.view()) {
        (EApp(ps), EApp(ts)) => {
            ps.len() == ts.len()
                && ps
                    .iter()
                    .zip(ts.iter())
                    .all(|(pa, ta)| rec(ctx, num, pa, ta, k, subst))
        }
        (ELambda(_, ty1, b1), ELambda(_, ty2, b2)) | (EPi(_, ty1, b1), EPi(_, ty2, b2)) => {
            rec(ctx, num, ty1, ty2, k, subst) && rec(ctx, num, b1, b2, k + 1, subst)
        }
        (ELet(_, ty1, v1, b1), ELet(_, ty2, v2, b2)) => {
            let tys_ok = match (ty1, ty2) {
                (None, None) => true,
                (Some(x), Some(y)) => rec(ctx, num, x, y, k, subst),
                _ => false,
            };
            tys_ok && rec(ctx, num, v1, v2, k, subst) && rec(ctx, num, b1, b2, k + 1, subst)
        }
        // leaves (and mismatched kinds): structural equality of the roots
        _ => p.view() == t.view(),
    }
}
