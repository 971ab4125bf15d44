//! Rewrite rules and rule sets.
//!
//! A rule is created from a (possibly conditional) equation: a chain of
//! dependent products ending in `lhs = rhs`, together with a proof term
//! of the whole chain. Binders whose variable occurs in `lhs` are
//! instantiated by matching; the remaining ones become premises
//! discharged by the conditional-rewriting machinery.
//!
//! Rule sets index their rules by the head symbol of the left-hand
//! side; candidate iteration preserves insertion order, and the first
//! accepted rule wins.

use super::congr::CongrTheorem;
use crate::error::{Error, Result};
use crate::errorstr;
use crate::kernel::{Ctx, DbIndex, Expr, ExprView::*, Exprs, Symbol};
use fnv::FnvHashMap;
use smallvec::{smallvec, SmallVec};

/// A rewrite rule.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    name: Symbol,
    /// Left/right-hand sides, under `num_args` binders.
    lhs: Expr,
    rhs: Expr,
    /// The fully quantified conditional equation.
    ceq: Expr,
    /// Proof term of `ceq`.
    proof: Expr,
    num_args: usize,
    is_permutation: bool,
    /// Head symbol of `lhs`, for indexing.
    head: Symbol,
}

impl RewriteRule {
    /// Create a rule from a conditional equation and its proof.
    pub fn new(name: impl Into<Symbol>, ceq: &Expr, proof: Expr) -> Result<Self> {
        let mut body = ceq.clone();
        let mut num = 0usize;
        while let EPi(_, _, b) = body.view() {
            let b = b.clone();
            body = b;
            num += 1;
        }
        let (_, lhs, rhs) = body
            .unfold_eq()
            .ok_or_else(|| Error::new("rewrite rule conclusion must be an equation"))?;
        let head = match lhs.head().as_const() {
            Some(s) => s.clone(),
            None => {
                return Err(errorstr!(
                    "cannot index rewrite rule: head of `{}` is not a constant",
                    lhs
                ))
            }
        };
        let is_permutation = is_permutation_pair(lhs, rhs, num);
        Ok(Self {
            name: name.into(),
            lhs: lhs.clone(),
            rhs: rhs.clone(),
            ceq: ceq.clone(),
            proof,
            num_args: num,
            is_permutation,
            head,
        })
    }

    pub fn name(&self) -> &Symbol {
        &self.name
    }

    pub fn lhs(&self) -> &Expr {
        &self.lhs
    }

    pub fn rhs(&self) -> &Expr {
        &self.rhs
    }

    pub fn ceq(&self) -> &Expr {
        &self.ceq
    }

    pub fn proof(&self) -> &Expr {
        &self.proof
    }

    pub fn num_args(&self) -> usize {
        self.num_args
    }

    /// Do the two sides differ only by a renaming of the rule's
    /// variables? Such rules are guarded by the term order.
    pub fn is_permutation(&self) -> bool {
        self.is_permutation
    }
}

// check that `a` and `b` are equal up to a bijective renaming of the
// `num` open pattern variables
fn is_permutation_pair(a: &Expr, b: &Expr, num: usize) -> bool {
    let mut m1: Vec<Option<usize>> = vec![None; num];
    let mut m2: Vec<Option<usize>> = vec![None; num];
    perm_rec(a, b, 0, num, &mut m1, &mut m2)
}

fn perm_rec(
    a: &Expr,
    b: &Expr,
    k: DbIndex,
    num: usize,
    m1: &mut [Option<usize>],
    m2: &mut [Option<usize>],
) -> bool {
    if let (EVar(i), EVar(j)) = (a.view(), b.view()) {
        if *i >= k && *j >= k {
            let pi = (*i - k) as usize;
            let pj = (*j - k) as usize;
            if pi >= num || pj >= num {
                return pi == pj;
            }
            let ok1 = m1[pi].map_or(true, |x| x == pj);
            let ok2 = m2[pj].map_or(true, |x| x == pi);
            if ok1 && ok2 {
                m1[pi] = Some(pj);
                m2[pj] = Some(pi);
                return true;
            }
            return false;
        }
        return i == j;
    }
    match (a.view(), b.view()) {
        (EApp(xs), EApp(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys.iter())
                    .all(|(x, y)| perm_rec(x, y, k, num, m1, m2))
        }
        (ELambda(_, ty1, b1), ELambda(_, ty2, b2)) | (EPi(_, ty1, b1), EPi(_, ty2, b2)) => {
            perm_rec(ty1, ty2, k, num, m1, m2) && perm_rec(b1, b2, k + 1, num, m1, m2)
        }
        (ELet(_, ty1, v1, b1), ELet(_, ty2, v2, b2)) => {
            let tys_ok = match (ty1, ty2) {
                (None, None) => true,
                (Some(x), Some(y)) => perm_rec(x, y, k, num, m1, m2),
                _ => false,
            };
            tys_ok
                && perm_rec(v1, v2, k, num, m1, m2)
                && perm_rec(b1, b2, k + 1, num, m1, m2)
        }
        _ => a.view() == b.view(),
    }
}

/// A set of rewrite rules, indexed by head symbol, plus the congruence
/// theorems registered alongside them.
#[derive(Debug, Clone, Default)]
pub struct RewriteRuleSet {
    rules: Vec<RewriteRule>,
    by_head: FnvHashMap<Symbol, SmallVec<[usize; 4]>>,
    congrs: Vec<CongrTheorem>,
}

impl RewriteRuleSet {
    /// New rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single rule.
    pub fn add_rule(&mut self, r: RewriteRule) {
        let idx = self.rules.len();
        self.by_head
            .entry(r.head.clone())
            .or_insert_with(SmallVec::new)
            .push(idx);
        self.rules.push(r);
    }

    /// Insert a fact with its proof, converting it into rules:
    /// an equation is used directly; a negation `not p` becomes
    /// `p = False` via `eqf_intro`; any other proposition becomes
    /// `p = True` via `eqt_intro`.
    pub fn insert(
        &mut self,
        ctx: &mut Ctx,
        name: impl Into<Symbol>,
        fact: &Expr,
        proof: Expr,
    ) -> Result<()> {
        let name = name.into();
        // strip the quantifier spine, keeping the binders for rebuilding
        let mut spine: Vec<(Symbol, Expr)> = vec![];
        let mut body = fact.clone();
        while let EPi(n, ty, b) = body.view() {
            spine.push((n.clone(), ty.clone()));
            let b = b.clone();
            body = b;
        }

        if body.unfold_eq().is_some() {
            let rule = RewriteRule::new(name, fact, proof)?;
            self.add_rule(rule);
            return Ok(());
        }

        // the stripped proof: the given proof applied to the spine's variables
        let inner_proof = if spine.is_empty() {
            proof
        } else {
            let mut args: Exprs = smallvec![proof];
            for i in (0..spine.len()).rev() {
                args.push(ctx.mk_var(i as DbIndex));
            }
            ctx.mk_app(args)
        };

        let (eqn, eq_proof) = match body.unfold_not() {
            Some(p) => {
                let p = p.clone();
                let pr = ctx.mk_eqf_intro_th(p.clone(), inner_proof)?;
                let f = ctx.mk_false();
                (ctx.mk_eq(ctx.mk_bool(), p, f), pr)
            }
            None => {
                let pr = ctx.mk_eqt_intro_th(body.clone(), inner_proof)?;
                let t = ctx.mk_true();
                (ctx.mk_eq(ctx.mk_bool(), body, t), pr)
            }
        };

        // rebuild the quantifier spine around the equation and wrap the
        // proof in matching lambdas
        let mut ceq = eqn;
        let mut pr = eq_proof;
        for (n, ty) in spine.into_iter().rev() {
            ceq = ctx.mk_pi(n.clone(), ty.clone(), ceq);
            pr = ctx.mk_lambda(n, ty, pr);
        }
        let rule = RewriteRule::new(name, &ceq, pr)?;
        self.add_rule(rule);
        Ok(())
    }

    /// Register a congruence theorem.
    pub fn add_congr(&mut self, c: CongrTheorem) {
        self.congrs.push(c);
    }

    /// Enumerate the registered congruence theorems.
    pub fn for_each_congr(&self, mut f: impl FnMut(&CongrTheorem)) {
        for c in &self.congrs {
            f(c);
        }
    }

    /// Candidate rules for the given target, in insertion order.
    ///
    /// Rules are cheap clones; callers may freely mutate the set (or
    /// recurse through the simplifier) while iterating the result.
    pub fn candidates(&self, target: &Expr) -> SmallVec<[RewriteRule; 4]> {
        let head = match target.head().as_const() {
            Some(s) => s,
            None => return smallvec![],
        };
        match self.by_head.get(head) {
            Some(idxs) => idxs.iter().map(|&i| self.rules[i].clone()).collect(),
            None => smallvec![],
        }
    }

    /// Is the set of rules empty?
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of rules in the set.
    pub fn size(&self) -> usize {
        self.rules.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn nat_setup(ctx: &mut Ctx) -> (Expr, Expr) {
        let ty = ctx.mk_type();
        let nat = ctx.declare_const("Nat", ty).unwrap();
        let add_ty = {
            let arr = ctx.mk_arrow(nat.clone(), nat.clone());
            ctx.mk_arrow(nat.clone(), arr)
        };
        let add = ctx.declare_const("add", add_ty).unwrap();
        (nat, add)
    }

    #[test]
    fn test_rule_from_equation() {
        let mut ctx = Ctx::new();
        let (nat, add) = nat_setup(&mut ctx);
        // Π x:Nat, add x 0 = x
        let ceq = {
            let v0 = ctx.mk_var(0);
            let zero = ctx.mk_num(nat.clone(), 0);
            let lhs = ctx.mk_app_l(&add, &[v0.clone(), zero]);
            let body = ctx.mk_eq(nat.clone(), lhs, v0);
            ctx.mk_pi("x", nat.clone(), body)
        };
        let pr = ctx.declare_const("add_zero", ceq.clone()).unwrap();
        let r = RewriteRule::new("add_zero", &ceq, pr).unwrap();
        assert_eq!(r.num_args(), 1);
        assert!(!r.is_permutation());
    }

    #[test]
    fn test_permutation_detected() {
        let mut ctx = Ctx::new();
        let (nat, add) = nat_setup(&mut ctx);
        // Π x y:Nat, add x y = add y x
        let ceq = {
            let v1 = ctx.mk_var(1);
            let v0 = ctx.mk_var(0);
            let lhs = ctx.mk_app_l(&add, &[v1.clone(), v0.clone()]);
            let rhs = ctx.mk_app_l(&add, &[v0, v1]);
            let body = ctx.mk_eq(nat.clone(), lhs, rhs);
            let pi = ctx.mk_pi("y", nat.clone(), body);
            ctx.mk_pi("x", nat.clone(), pi)
        };
        let pr = ctx.declare_const("add_comm", ceq.clone()).unwrap();
        let r = RewriteRule::new("add_comm", &ceq, pr).unwrap();
        assert_eq!(r.num_args(), 2);
        assert!(r.is_permutation());
    }

    #[test]
    fn test_trivial_equation_is_permutation() {
        let mut ctx = Ctx::new();
        let mut rs = RewriteRuleSet::new();
        // inserting the bare fact `True` produces the rule `True = True`,
        // which the permutation flag must neutralize
        let t = ctx.mk_true();
        let pr = ctx.mk_trivial_th().unwrap();
        rs.insert(&mut ctx, "h", &t, pr).unwrap();
        assert_eq!(rs.size(), 1);
        let cands = rs.candidates(&t);
        assert_eq!(cands.len(), 1);
        assert!(cands[0].is_permutation());
    }

    #[test]
    fn test_insert_negation() {
        let mut ctx = Ctx::new();
        let b = ctx.mk_bool();
        let p = ctx.declare_const("p", b).unwrap();
        let notp = ctx.mk_not(p.clone());
        let h = ctx.declare_const("h", notp.clone()).unwrap();
        let mut rs = RewriteRuleSet::new();
        rs.insert(&mut ctx, "h", &notp, h).unwrap();
        let cands = rs.candidates(&p);
        assert_eq!(cands.len(), 1);
        // the produced rule rewrites p to False
        assert_eq!(cands[0].rhs(), &ctx.mk_false());
        assert_eq!(cands[0].num_args(), 0);
    }

    #[test]
    fn test_candidates_in_insertion_order() {
        let mut ctx = Ctx::new();
        let (nat, add) = nat_setup(&mut ctx);
        let mk_rule = |ctx: &mut Ctx, name: &str, n: i64| {
            let v0 = ctx.mk_var(0);
            let k = ctx.mk_num(nat.clone(), n);
            let lhs = ctx.mk_app_l(&add, &[v0.clone(), k]);
            let body = ctx.mk_eq(nat.clone(), lhs, v0);
            let ceq = ctx.mk_pi("x", nat.clone(), body);
            let pr = ctx.declare_const(name, ceq.clone()).unwrap();
            RewriteRule::new(name, &ceq, pr).unwrap()
        };
        let mut rs = RewriteRuleSet::new();
        let r1 = mk_rule(&mut ctx, "r1", 0);
        let r2 = mk_rule(&mut ctx, "r2", 1);
        rs.add_rule(r1);
        rs.add_rule(r2);
        let zero = ctx.mk_num(nat.clone(), 0);
        let a = ctx.declare_const("a", nat).unwrap();
        let t = ctx.mk_app_l(&add, &[a, zero]);
        let cands = rs.candidates(&t);
        assert_eq!(cands.len(), 2);
        assert_eq!(cands[0].name().name(), "r1");
        assert_eq!(cands[1].name().name(), "r2");
    }
}
