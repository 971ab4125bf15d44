//! The simplifier.
//!
//! Given a term, a local context and a collection of rewrite-rule sets,
//! produce a simplified term together with an optional proof that both
//! are equal. The traversal is recursive and memoized; applications are
//! rebuilt argument by argument under congruence proofs, rules are
//! matched against each rebuilt node (with conditional premises proved
//! by recursive simplification), and congruence theorems may install a
//! local hypothesis while one argument is simplified (contextual
//! rewriting).
//!
//! Proofs use homogeneous equality where possible; when simplifying an
//! argument changes its type, the heterogeneous connective takes over,
//! provided the environment imported it.

use super::congr::CongrTheorem;
use super::matching::hop_match;
use super::order;
use super::rw_rule::{RewriteRule, RewriteRuleSet};
use crate::error::{Error, Result};
use crate::errorstr;
use crate::kernel::{tc, Ctx, Expr, ExprView::*, Exprs, Locals, Symbol};
use crate::options::Options;
use crate::{logdebug, logtrace};
use fnv::FnvHashMap;
use smallvec::smallvec;
use std::cell::Cell;
use std::mem;
use std::rc::Rc;

/// Simplifier configuration. Read from [`Options`] under the
/// `simplifier.` prefix; see [`SimpConfig::from_options`].
#[derive(Debug, Clone)]
pub struct SimpConfig {
    /// Generate proof terms.
    pub proofs: bool,
    /// Congruence-driven contextual hypothesis introduction.
    pub contextual: bool,
    /// Do not re-simplify after a successful rewrite.
    pub single_pass: bool,
    /// Head-beta reduce during rewriting.
    pub beta: bool,
    /// Eta-reduce lambdas.
    pub eta: bool,
    /// Normalize applications whose arguments are all values.
    pub eval: bool,
    /// Unfold non-opaque constants.
    pub unfold: bool,
    /// Conditional rewriting (propositional premises).
    pub conditional: bool,
    /// Cache intermediate results.
    pub memoize: bool,
    /// Step bound; exceeding it raises an exhaustion error.
    pub max_steps: u64,
}

impl Default for SimpConfig {
    fn default() -> Self {
        Self {
            proofs: true,
            contextual: true,
            single_pass: false,
            beta: true,
            eta: true,
            eval: true,
            unfold: false,
            conditional: true,
            memoize: true,
            max_steps: u64::MAX,
        }
    }
}

impl SimpConfig {
    /// Read the `simplifier.*` option block.
    pub fn from_options(o: &Options) -> Self {
        let d = Self::default();
        Self {
            proofs: o.get_bool("simplifier.proofs", d.proofs),
            contextual: o.get_bool("simplifier.contextual", d.contextual),
            single_pass: o.get_bool("simplifier.single_pass", d.single_pass),
            beta: o.get_bool("simplifier.beta", d.beta),
            eta: o.get_bool("simplifier.eta", d.eta),
            eval: o.get_bool("simplifier.eval", d.eval),
            unfold: o.get_bool("simplifier.unfold", d.unfold),
            conditional: o.get_bool("simplifier.conditional", d.conditional),
            memoize: o.get_bool("simplifier.memoize", d.memoize),
            max_steps: o.get_unsigned("simplifier.max_steps", d.max_steps),
        }
    }
}

/// Result of a simplification step.
///
/// Without a proof, `out` is definitionally equal to the input (the
/// elided proof is reflexivity). With `heq_proof`, the proof uses
/// heterogeneous equality and the types of input and output need not
/// be definitionally equal.
#[derive(Debug, Clone)]
pub struct SimpResult {
    pub out: Expr,
    pub proof: Option<Expr>,
    pub heq_proof: bool,
}

impl SimpResult {
    pub fn new(out: Expr) -> Self {
        Self {
            out,
            proof: None,
            heq_proof: false,
        }
    }

    pub fn with_proof(out: Expr, proof: Expr, heq_proof: bool) -> Self {
        Self {
            out,
            proof: Some(proof),
            heq_proof,
        }
    }
}

/// The simplifier. One value per top-level call family; owns its rule
/// sets, cache, local context and step counter.
pub struct Simplifier<'a> {
    ctx: &'a mut Ctx,
    cfg: SimpConfig,
    has_heq: bool,
    has_cast: bool,
    locals: Locals,
    /// Index 0 is reserved for contextual additions when contextual
    /// rewriting is enabled.
    rule_sets: Vec<RewriteRuleSet>,
    cache: FnvHashMap<Expr, SimpResult>,
    /// First congruence theorem per head symbol, over all rule sets.
    congr_thms: Vec<CongrTheorem>,
    /// Nesting level of contextual hypotheses, for unique placeholder
    /// names.
    contextual_depth: u32,
    num_steps: u64,
    interrupt: Option<Rc<Cell<bool>>>,
}

impl<'a> Simplifier<'a> {
    pub fn new(ctx: &'a mut Ctx, cfg: SimpConfig, rule_sets: Vec<RewriteRuleSet>) -> Self {
        let has_heq = ctx.imported("heq");
        let has_cast = ctx.imported("cast");
        let mut sets = Vec::with_capacity(rule_sets.len() + 1);
        if cfg.contextual {
            // rule set for contextual additions
            sets.push(RewriteRuleSet::new());
        }
        sets.extend(rule_sets);
        let mut congr_thms: Vec<CongrTheorem> = vec![];
        if cfg.contextual {
            for rs in &sets {
                rs.for_each_congr(|info| {
                    if congr_thms.iter().all(|c| c.fun() != info.fun()) {
                        congr_thms.push(info.clone());
                    }
                });
            }
        }
        Self {
            ctx,
            cfg,
            has_heq,
            has_cast,
            locals: Locals::new(),
            rule_sets: sets,
            cache: FnvHashMap::default(),
            congr_thms,
            contextual_depth: 0,
            num_steps: 0,
            interrupt: None,
        }
    }

    /// Install a cooperative interruption flag; raising it aborts the
    /// current traversal with an interruption error.
    pub fn set_interrupt_flag(&mut self, flag: Rc<Cell<bool>>) {
        self.interrupt = Some(flag);
    }

    /// Simplify `e` in the given local context. Returns the simplified
    /// term and a proof of equality; the proof is reflexivity when no
    /// rewriting step required one.
    pub fn run(&mut self, e: &Expr, locals: &Locals) -> Result<(Expr, Expr)> {
        self.locals = locals.clone();
        self.cache.clear();
        self.num_steps = 0;
        let r = self.simplify(e)?;
        let pr = self.get_proof(&r)?;
        Ok((r.out, pr))
    }

    // ### driver

    fn simplify(&mut self, e: &Expr) -> Result<SimpResult> {
        self.check_interrupt()?;
        self.num_steps += 1;
        if self.num_steps > self.cfg.max_steps {
            return Err(Error::exhausted());
        }
        if self.cfg.memoize {
            // terms are hash-consed, so the key is already maximally shared
            if let Some(r) = self.cache.get(e) {
                return Ok(r.clone());
            }
        }
        logtrace!("simplify {}", e);
        let r = match e.view() {
            EVar(..) => SimpResult::new(e.clone()),
            EConst(..) => self.simplify_constant(e)?,
            EType | EMeta(..) | EValue(..) => SimpResult::new(e.clone()),
            EApp(..) => self.simplify_app(e)?,
            ELambda(..) => self.simplify_lambda(e)?,
            EPi(..) => self.simplify_pi(e)?,
            ELet(_, _, v, body) => {
                let (v, body) = (v.clone(), body.clone());
                let inlined = self.ctx.instantiate(&body, &v);
                self.simplify(&inlined)?
            }
        };
        Ok(self.save(e, r))
    }

    fn save(&mut self, e: &Expr, r: SimpResult) -> SimpResult {
        if self.cfg.memoize {
            self.cache.insert(e.clone(), r.clone());
        }
        r
    }

    fn check_interrupt(&self) -> Result<()> {
        if let Some(f) = &self.interrupt {
            if f.get() {
                return Err(Error::interrupted());
            }
        }
        Ok(())
    }

    // ### typing helpers

    fn infer_type(&mut self, e: &Expr) -> Result<Expr> {
        tc::infer_type(self.ctx, &self.locals, e)
    }

    fn is_proposition(&mut self, e: &Expr) -> Result<bool> {
        tc::is_proposition(self.ctx, &self.locals, e)
    }

    fn is_definitionally_equal(&mut self, a: &Expr, b: &Expr) -> Result<bool> {
        tc::is_def_eq(self.ctx, a, b)
    }

    fn is_convertible(&mut self, a: &Expr, b: &Expr) -> Result<bool> {
        tc::is_convertible(self.ctx, a, b)
    }

    // ### scoped state

    // run `f` with the local context extended by one binder; the cache
    // is reset for the duration, since cached results depend on the
    // surrounding context
    fn in_binder<T>(
        &mut self,
        name: &Symbol,
        ty: &Expr,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let saved_cache = mem::take(&mut self.cache);
        self.locals.push(name.clone(), ty.clone());
        let r = f(self);
        self.locals.pop();
        self.cache = saved_cache;
        r
    }

    // simplify `a` with the hypothesis `h` installed in rule set 0 and
    // a fresh placeholder constant standing for its proof. Returns
    // `None` when the hypothesis cannot be turned into a rule.
    fn simplify_in_hypothesis(
        &mut self,
        h: &Expr,
        a: &Expr,
    ) -> Result<Option<(SimpResult, Expr, u32)>> {
        self.contextual_depth += 1;
        let depth = self.contextual_depth;
        let placeholder = self.ctx.mk_const(format!("#hyp{}", depth));
        let saved_rs = self.rule_sets[0].clone();
        if self
            .rule_sets[0]
            .insert(self.ctx, "local", h, placeholder.clone())
            .is_err()
        {
            self.rule_sets[0] = saved_rs;
            self.contextual_depth -= 1;
            return Ok(None);
        }
        logdebug!("contextual hypothesis {} at depth {}", h, depth);
        // the rule set changed, so cached results no longer apply
        let saved_cache = mem::take(&mut self.cache);
        let r = self.simplify(a);
        self.cache = saved_cache;
        self.rule_sets[0] = saved_rs;
        self.contextual_depth -= 1;
        Ok(Some((r?, placeholder, depth)))
    }

    // ### constants

    fn simplify_constant(&mut self, e: &Expr) -> Result<SimpResult> {
        let name = match e.as_const() {
            Some(s) => s.clone(),
            None => return Err(Error::new("simplify_constant: expected a constant")),
        };
        if self.cfg.unfold || self.cfg.eval {
            let (should_unfold, value) = match self.ctx.find_object(name.name()) {
                Some(obj) => (obj.should_unfold(), obj.value.clone()),
                None => (false, None),
            };
            if self.cfg.unfold && should_unfold {
                if let Some(v) = value {
                    return if self.cfg.single_pass {
                        Ok(SimpResult::new(v))
                    } else {
                        self.simplify(&v)
                    };
                }
            }
            if self.cfg.eval {
                // a constant defined to be a literal reduces to it
                if let Some(v) = &value {
                    if v.is_value() {
                        return Ok(SimpResult::new(v.clone()));
                    }
                }
            }
        }
        self.rewrite(e, SimpResult::new(e.clone()))
    }

    // ### applications

    fn simplify_app(&mut self, e: &Expr) -> Result<SimpResult> {
        if self.has_cast && e.is_cast() {
            return self.simplify_cast(e);
        }
        if self.cfg.contextual {
            let head = e.head().clone();
            let cg = self
                .congr_thms
                .iter()
                .find(|c| *c.fun() == head)
                .cloned();
            if let Some(cg) = cg {
                return self.simplify_app_congr(e, &cg);
            }
        }
        self.simplify_app_default(e)
    }

    // `e` is `cast A B H a`: simplify `a` and erase the cast, with a
    // heterogeneous proof through `cast_heq`
    fn simplify_cast(&mut self, e: &Expr) -> Result<SimpResult> {
        let (a_ty, b_ty, h, a) = match e.as_app() {
            Some(args) if args.len() == 5 => (
                args[1].clone(),
                args[2].clone(),
                args[3].clone(),
                args[4].clone(),
            ),
            _ => return Err(Error::new("simplify_cast: malformed cast")),
        };
        if !self.cfg.proofs {
            return self.simplify(&a);
        }
        let res_a = self.simplify(&a)?;
        let c = res_a.out.clone();
        // cast A B H a == a
        let h_cast = self.ctx.mk_cast_heq_th(a_ty.clone(), b_ty.clone(), h, a.clone())?;
        match &res_a.proof {
            None => {
                // c is definitionally equal to a
                Ok(SimpResult::with_proof(c, h_cast, true))
            }
            Some(h_ac) => {
                let h_ec = if !res_a.heq_proof {
                    let h_ac = self
                        .ctx
                        .mk_to_heq_th(a_ty.clone(), a.clone(), c.clone(), h_ac.clone())?;
                    self.ctx.mk_htrans_th(
                        b_ty,
                        a_ty.clone(),
                        a_ty,
                        e.clone(),
                        a,
                        c.clone(),
                        h_cast,
                        h_ac,
                    )?
                } else {
                    let c_ty = self.infer_type(&c)?;
                    self.ctx.mk_htrans_th(
                        b_ty,
                        a_ty,
                        c_ty,
                        e.clone(),
                        a,
                        c.clone(),
                        h_cast,
                        h_ac.clone(),
                    )?
                };
                Ok(SimpResult::with_proof(c, h_ec, true))
            }
        }
    }

    /// Simplify `e` using a congruence theorem registered for its head.
    fn simplify_app_congr(&mut self, e: &Expr, cg: &CongrTheorem) -> Result<SimpResult> {
        let args: Exprs = match e.as_app() {
            Some(a) => a.iter().cloned().collect(),
            None => return Err(Error::new("simplify_app_congr: expected an application")),
        };
        debug_assert_eq!(&args[0], cg.fun());
        let use_proofs = self.cfg.proofs;
        let mut new_args = args.clone();
        let mut changed = false;
        let mut proof_slots: Vec<Option<Expr>> = vec![None; cg.num_proof_args()];

        for info in cg.args() {
            let pos = info.arg_pos;
            if pos >= args.len() {
                // arity mismatch with the registered description
                return self.simplify_app_default(e);
            }
            let a = args[pos].clone();
            if !info.should_simplify {
                new_args[pos] = a.clone();
                if use_proofs {
                    proof_slots[info.pos_at_proof] = Some(a);
                }
                continue;
            }
            let (np, pp) = match (info.new_pos_at_proof, info.proof_pos_at_proof) {
                (Some(np), Some(pp)) => (np, pp),
                _ => return self.simplify_app_default(e),
            };
            match &info.context {
                None => {
                    let mut res_a = self.simplify(&a)?;
                    if use_proofs && !self.ensure_homogeneous(&a, &mut res_a)? {
                        // fall back to default congruence
                        return self.simplify_app_default(e);
                    }
                    new_args[pos] = res_a.out.clone();
                    if use_proofs {
                        proof_slots[info.pos_at_proof] = Some(a.clone());
                        proof_slots[np] = Some(res_a.out.clone());
                        let prf = self.get_proof(&res_a)?;
                        proof_slots[pp] = Some(prf);
                    }
                }
                Some(cctx) => {
                    if cctx.arg_pos >= args.len() {
                        return self.simplify_app_default(e);
                    }
                    let mut h = if cctx.use_new_val {
                        new_args[cctx.arg_pos].clone()
                    } else {
                        args[cctx.arg_pos].clone()
                    };
                    if !cctx.is_pos_dep {
                        h = self.ctx.mk_not(h);
                    }
                    let (mut res_a, placeholder, depth) =
                        match self.simplify_in_hypothesis(&h, &a)? {
                            Some(t) => t,
                            None => return self.simplify_app_default(e),
                        };
                    if use_proofs && !self.ensure_homogeneous(&a, &mut res_a)? {
                        return self.simplify_app_default(e);
                    }
                    new_args[pos] = res_a.out.clone();
                    if use_proofs {
                        proof_slots[info.pos_at_proof] = Some(a.clone());
                        proof_slots[np] = Some(res_a.out.clone());
                        // bind the hypothesis: the placeholder becomes a
                        // lambda-bound proof variable
                        let prf = self.get_proof(&res_a)?;
                        let abstracted = self.ctx.abstract_const(&prf, &placeholder);
                        let lam =
                            self.ctx
                                .mk_lambda(format!("C{}", depth), h.clone(), abstracted);
                        proof_slots[pp] = Some(lam);
                    }
                }
            }
            if new_args[pos] != a {
                changed = true;
            }
        }

        if !changed {
            return self.rewrite_app(e, SimpResult::new(e.clone()));
        }
        if !use_proofs {
            let out = self.ctx.mk_app(new_args);
            return self.rewrite_app(e, SimpResult::new(out));
        }
        let mut proof_args: Exprs = smallvec![cg.proof().clone()];
        for s in proof_slots {
            match s {
                Some(x) => proof_args.push(x),
                None => return self.simplify_app_default(e),
            }
        }
        let proof = self.ctx.mk_app(proof_args);
        let out = self.ctx.mk_app(new_args);
        self.rewrite_app(e, SimpResult::with_proof(out, proof, false))
    }

    fn simplify_app_default(&mut self, e: &Expr) -> Result<SimpResult> {
        let args: Exprs = match e.as_app() {
            Some(a) => a.iter().cloned().collect(),
            None => return Err(Error::new("simplify_app: expected an application")),
        };
        let num = args.len();
        let mut new_args: Exprs = smallvec![];
        let mut proofs_v: Vec<Option<Expr>> = vec![];
        let mut heq_flags: Vec<bool> = vec![];
        // parallel spines: the original type of each prefix and its
        // post-simplification counterpart (they drift apart once a
        // heterogeneous step changes a type)
        let mut f_types: Vec<Expr> = vec![];
        let mut new_f_types: Vec<Expr> = vec![];
        let mut changed = false;

        let f = args[0].clone();
        let mut f_type = self.infer_type(&f)?;
        let res_f = self.simplify(&f)?;
        let new_f = res_f.out.clone();
        if new_f != f {
            changed = true;
        }
        new_args.push(new_f.clone());
        let mut new_f_type = f_type.clone();
        if self.cfg.proofs {
            proofs_v.push(res_f.proof.clone());
            heq_flags.push(res_f.heq_proof);
            f_types.push(f_type.clone());
            new_f_type = if res_f.heq_proof {
                self.infer_type(&new_f)?
            } else {
                f_type.clone()
            };
            new_f_types.push(new_f_type.clone());
        }

        for i in 1..num {
            f_type = tc::ensure_pi(self.ctx, &f_type)?;
            let f_arrow = f_type.is_arrow();
            let a = args[i].clone();
            // a changed argument in a dependent position can only be
            // accounted for with heterogeneous equality
            let res_a = if self.has_heq || f_arrow {
                let r = self.simplify(&a)?;
                if r.out != a {
                    changed = true;
                }
                r
            } else {
                SimpResult::new(a.clone())
            };
            let new_a = res_a.out.clone();
            new_args.push(new_a.clone());

            // descend both spines
            let body = match f_type.as_pi() {
                Some((_, _, b)) => b.clone(),
                None => unreachable!("ensure_pi"),
            };
            if self.cfg.proofs {
                proofs_v.push(res_a.proof.clone());
                heq_flags.push(res_a.heq_proof);
                let changed_f_type = f_type != new_f_type;
                if f_arrow {
                    f_type = self.ctx.lower_free_vars(&body, 1, 1)?;
                    new_f_type = if changed_f_type {
                        let nfp = tc::ensure_pi(self.ctx, &new_f_type)?;
                        let nb = match nfp.as_pi() {
                            Some((_, _, b)) => b.clone(),
                            None => unreachable!("ensure_pi"),
                        };
                        self.ctx.lower_free_vars(&nb, 1, 1)?
                    } else {
                        f_type.clone()
                    };
                } else if a == new_a {
                    f_type = self.ctx.instantiate(&body, &a);
                    new_f_type = if changed_f_type {
                        let nfp = tc::ensure_pi(self.ctx, &new_f_type)?;
                        let nb = match nfp.as_pi() {
                            Some((_, _, b)) => b.clone(),
                            None => unreachable!("ensure_pi"),
                        };
                        self.ctx.instantiate(&nb, &a)
                    } else {
                        f_type.clone()
                    };
                } else {
                    f_type = self.ctx.instantiate(&body, &a);
                    let nfp = tc::ensure_pi(self.ctx, &new_f_type)?;
                    let nb = match nfp.as_pi() {
                        Some((_, _, b)) => b.clone(),
                        None => unreachable!("ensure_pi"),
                    };
                    new_f_type = self.ctx.instantiate(&nb, &new_a);
                }
                f_types.push(f_type.clone());
                new_f_types.push(new_f_type.clone());
            } else {
                f_type = if f_arrow {
                    self.ctx.lower_free_vars(&body, 1, 1)?
                } else {
                    self.ctx.instantiate(&body, &new_a)
                };
            }
        }

        if !changed {
            return self.rewrite_app(e, SimpResult::new(e.clone()));
        }
        if !self.cfg.proofs {
            let out = self.ctx.mk_app(new_args);
            return self.rewrite_app(e, SimpResult::new(out));
        }

        let out = self.ctx.mk_app(new_args.clone());
        // skip the leading reflexive steps
        let mut i = 0;
        while i < num && proofs_v[i].is_none() {
            i += 1;
        }
        if i == num {
            return self.rewrite_app(e, SimpResult::new(out));
        }

        let mut pr: Expr;
        let mut heq_proof = false;
        if i == 0 {
            pr = match proofs_v[0].clone() {
                Some(p) => p,
                None => unreachable!(),
            };
            heq_proof = self.has_heq && heq_flags[0];
        } else if self.has_heq && (heq_flags[i] || !f_types[i - 1].is_arrow()) {
            let fpre = self.mk_app_prefix(i, &new_args);
            let pr_i = match proofs_v[i].clone() {
                Some(p) => p,
                None => unreachable!(),
            };
            let hrefl = self
                .ctx
                .mk_hrefl_th(f_types[i - 1].clone(), fpre.clone())?;
            let f_ty = f_types[i - 1].clone();
            match self.mk_hcongr_th(
                &f_ty, &f_ty, &fpre, &fpre, &args[i], &new_args[i], hrefl, pr_i, heq_flags[i],
            ) {
                Ok(Some(p)) => {
                    pr = p;
                    heq_proof = true;
                }
                // failed to create a congruence proof
                _ => return self.rewrite_app(e, SimpResult::new(e.clone())),
            }
        } else {
            let fpre = self.mk_app_prefix(i, &new_args);
            let pr_i = match proofs_v[i].clone() {
                Some(p) => p,
                None => unreachable!(),
            };
            let f_ty = f_types[i - 1].clone();
            match self.mk_congr2_th(&f_ty, &args[i], &new_args[i], &fpre, pr_i) {
                Ok(p) => pr = p,
                Err(..) => return self.rewrite_app(e, SimpResult::new(e.clone())),
            }
        }

        i += 1;
        while i < num {
            let f_old = self.mk_app_prefix(i, &args);
            let f_new = self.mk_app_prefix(i, &new_args);
            let f_ty = f_types[i - 1].clone();
            let new_f_ty = new_f_types[i - 1].clone();
            let heq_i = self.has_heq && heq_flags[i];
            if let Some(pr_i) = proofs_v[i].clone() {
                if heq_i {
                    if !heq_proof {
                        pr = self.ctx.mk_to_heq_th(
                            f_ty.clone(),
                            f_old.clone(),
                            f_new.clone(),
                            pr,
                        )?;
                    }
                    match self.mk_hcongr_th(
                        &f_ty, &new_f_ty, &f_old, &f_new, &args[i], &new_args[i], pr.clone(),
                        pr_i, true,
                    ) {
                        Ok(Some(p)) => {
                            pr = p;
                            heq_proof = true;
                        }
                        _ => return self.rewrite_app(e, SimpResult::new(e.clone())),
                    }
                } else if heq_proof {
                    match self.mk_hcongr_th(
                        &f_ty, &new_f_ty, &f_old, &f_new, &args[i], &new_args[i], pr.clone(),
                        pr_i, heq_i,
                    ) {
                        Ok(Some(p)) => pr = p,
                        _ => return self.rewrite_app(e, SimpResult::new(e.clone())),
                    }
                } else {
                    match self.mk_congr_th(
                        &f_ty, &f_old, &f_new, &args[i], &new_args[i], pr.clone(), pr_i,
                    ) {
                        Ok(p) => pr = p,
                        Err(..) => return self.rewrite_app(e, SimpResult::new(e.clone())),
                    }
                }
            } else if heq_proof {
                let a_ty = self.infer_type(&args[i])?;
                let refl_i = self.ctx.mk_refl_th(a_ty, args[i].clone())?;
                match self.mk_hcongr_th(
                    &f_ty, &new_f_ty, &f_old, &f_new, &args[i], &args[i], pr.clone(), refl_i,
                    false,
                ) {
                    Ok(Some(p)) => pr = p,
                    _ => return self.rewrite_app(e, SimpResult::new(e.clone())),
                }
            } else {
                match self.mk_congr1_th(&f_ty, &f_old, &f_new, &args[i], pr.clone()) {
                    Ok(p) => pr = p,
                    Err(..) => return self.rewrite_app(e, SimpResult::new(e.clone())),
                }
            }
            i += 1;
        }

        self.rewrite_app(e, SimpResult { out, proof: Some(pr), heq_proof })
    }

    // first `i` arguments of the buffer, as a term
    fn mk_app_prefix(&mut self, i: usize, args: &Exprs) -> Expr {
        debug_assert!(i > 0);
        if i == 1 {
            args[0].clone()
        } else {
            let v: Exprs = args[..i].iter().cloned().collect();
            self.ctx.mk_app(v)
        }
    }

    // ### proof plumbing

    /// Make sure the proof in `res` uses homogeneous equality. Returns
    /// `false` when the conversion is impossible (the types differ).
    fn ensure_homogeneous(&mut self, lhs: &Expr, res: &mut SimpResult) -> Result<bool> {
        if !res.heq_proof {
            return Ok(true);
        }
        let lhs_ty = self.infer_type(lhs)?;
        let rhs_ty = self.infer_type(&res.out)?;
        if !self.is_definitionally_equal(&lhs_ty, &rhs_ty)? {
            return Ok(false);
        }
        let p = match res.proof.clone() {
            Some(p) => p,
            None => return Err(Error::new("heterogeneous result without proof")),
        };
        let p = self
            .ctx
            .mk_to_eq_th(lhs_ty, lhs.clone(), res.out.clone(), p)?;
        res.proof = Some(p);
        res.heq_proof = false;
        Ok(true)
    }

    fn get_proof(&mut self, res: &SimpResult) -> Result<Expr> {
        match &res.proof {
            Some(p) => Ok(p.clone()),
            None => {
                // lhs and rhs are definitionally equal
                let ty = self.infer_type(&res.out)?;
                self.ctx.mk_refl_th(ty, res.out.clone())
            }
        }
    }

    // convert a proof `h : eq A a b` into `eq B a b` when the types are
    // convertible but not definitionally equal
    fn translate_eq_proof(
        &mut self,
        a_ty: Expr,
        a: Expr,
        b: Expr,
        h: Expr,
        b_ty: Expr,
    ) -> Result<Expr> {
        // λ (x : A), eq B a x
        let pred = {
            let b_ty_l = self.ctx.lift(&b_ty, 1);
            let a_l = self.ctx.lift(&a, 1);
            let v0 = self.ctx.mk_var(0);
            let body = self.ctx.mk_eq(b_ty_l, a_l, v0);
            self.ctx.mk_lambda("x", a_ty.clone(), body)
        };
        let refl = self.ctx.mk_refl_th(b_ty, a.clone())?;
        self.ctx.mk_subst_th(a_ty, a, b, pred, refl, h)
    }

    fn mk_congr1_th(
        &mut self,
        f_type: &Expr,
        f: &Expr,
        new_f: &Expr,
        a: &Expr,
        heq_f: Expr,
    ) -> Result<Expr> {
        let f_type = tc::ensure_pi(self.ctx, f_type)?;
        let (dom, body) = pi_parts(&f_type);
        let b_ty = self.ctx.lower_free_vars(&body, 1, 1)?;
        self.ctx
            .mk_congr1_base_th(dom, b_ty, f.clone(), new_f.clone(), a.clone(), heq_f)
    }

    fn mk_congr2_th(
        &mut self,
        f_type: &Expr,
        a: &Expr,
        new_a: &Expr,
        f: &Expr,
        heq_a: Expr,
    ) -> Result<Expr> {
        let f_type = tc::ensure_pi(self.ctx, f_type)?;
        let (dom, body) = pi_parts(&f_type);
        let b_ty = self.ctx.lower_free_vars(&body, 1, 1)?;
        let a_ty = self.infer_type(a)?;
        let mut heq_a = heq_a;
        if !self.is_definitionally_equal(&dom, &a_ty)? {
            heq_a =
                self.translate_eq_proof(a_ty, a.clone(), new_a.clone(), heq_a, dom.clone())?;
        }
        self.ctx
            .mk_congr2_base_th(dom, b_ty, f.clone(), a.clone(), new_a.clone(), heq_a)
    }

    #[allow(clippy::too_many_arguments)]
    fn mk_congr_th(
        &mut self,
        f_type: &Expr,
        f: &Expr,
        new_f: &Expr,
        a: &Expr,
        new_a: &Expr,
        heq_f: Expr,
        heq_a: Expr,
    ) -> Result<Expr> {
        let f_type = tc::ensure_pi(self.ctx, f_type)?;
        let (dom, body) = pi_parts(&f_type);
        let b_ty = self.ctx.lower_free_vars(&body, 1, 1)?;
        let a_ty = self.infer_type(a)?;
        let mut heq_a = heq_a;
        if !self.is_definitionally_equal(&dom, &a_ty)? {
            heq_a =
                self.translate_eq_proof(a_ty, a.clone(), new_a.clone(), heq_a, dom.clone())?;
        }
        self.ctx.mk_congr_base_th(
            dom,
            b_ty,
            f.clone(),
            new_f.clone(),
            a.clone(),
            new_a.clone(),
            heq_f,
            heq_a,
        )
    }

    // heterogeneous congruence; `None` when the domains cannot be
    // reconciled, which the callers treat as a local fallback
    #[allow(clippy::too_many_arguments)]
    fn mk_hcongr_th(
        &mut self,
        f_type: &Expr,
        new_f_type: &Expr,
        f: &Expr,
        new_f: &Expr,
        a: &Expr,
        new_a: &Expr,
        heq_f: Expr,
        heq_a: Expr,
        heq_a_is_heq: bool,
    ) -> Result<Option<Expr>> {
        let f_type = tc::ensure_pi(self.ctx, f_type)?;
        let new_f_type = tc::ensure_pi(self.ctx, new_f_type)?;
        let (dom, _) = pi_parts(&f_type);
        let (new_dom, _) = pi_parts(&new_f_type);
        let a_ty = self.infer_type(a)?;
        let new_a_ty = self.infer_type(new_a)?;
        if !self.is_convertible(&new_a_ty, &new_dom)? {
            return Ok(None);
        }
        let mut heq_a = heq_a;
        let mut is_heq = heq_a_is_heq;
        if !self.is_definitionally_equal(&dom, &a_ty)?
            || !self.is_definitionally_equal(&new_dom, &new_a_ty)?
        {
            if is_heq {
                if self.is_definitionally_equal(&a_ty, &new_a_ty)?
                    && self.is_definitionally_equal(&dom, &new_dom)?
                {
                    heq_a = self
                        .ctx
                        .mk_to_eq_th(a_ty.clone(), a.clone(), new_a.clone(), heq_a)?;
                    is_heq = false;
                } else {
                    return Ok(None); // no way to reconcile the types
                }
            }
            heq_a =
                self.translate_eq_proof(a_ty, a.clone(), new_a.clone(), heq_a, dom.clone())?;
        }
        if !is_heq {
            heq_a = self
                .ctx
                .mk_to_heq_th(dom.clone(), a.clone(), new_a.clone(), heq_a)?;
        }
        let b_fam = lambda_of_pi(self.ctx, &f_type);
        let new_b_fam = lambda_of_pi(self.ctx, &new_f_type);
        let th = self.ctx.mk_hcongr_base_th(
            dom,
            new_dom,
            b_fam,
            new_b_fam,
            f.clone(),
            new_f.clone(),
            a.clone(),
            new_a.clone(),
            heq_f,
            heq_a,
        )?;
        Ok(Some(th))
    }

    /// Chain `a = b_res.out` (with `b_res`'s proof) and
    /// `b_res.out = c` (with proof `h_bc`) into a result for `c`.
    fn mk_trans_result(
        &mut self,
        a: &Expr,
        b_res: &SimpResult,
        c: Expr,
        h_bc: Option<Expr>,
    ) -> Result<SimpResult> {
        if !self.cfg.proofs {
            return Ok(SimpResult::new(c));
        }
        let b_proof = match &b_res.proof {
            None => {
                // the proof of a = b is reflexivity
                return Ok(match h_bc {
                    Some(h) => SimpResult::with_proof(c, h, false),
                    None => SimpResult::new(c),
                });
            }
            Some(p) => p.clone(),
        };
        let h_bc = match h_bc {
            Some(h) => h,
            None => return Ok(SimpResult::with_proof(c, b_proof, b_res.heq_proof)),
        };
        let b = b_res.out.clone();
        if b_res.heq_proof {
            let a_ty = self.infer_type(a)?;
            let b_ty = self.infer_type(&b)?;
            // b and c have the same type
            let h_bc = self
                .ctx
                .mk_to_heq_th(b_ty.clone(), b.clone(), c.clone(), h_bc)?;
            let pr = self.ctx.mk_htrans_th(
                a_ty,
                b_ty.clone(),
                b_ty,
                a.clone(),
                b,
                c.clone(),
                b_proof,
                h_bc,
            )?;
            Ok(SimpResult::with_proof(c, pr, true))
        } else {
            let a_ty = self.infer_type(a)?;
            let pr = self
                .ctx
                .mk_trans_th(a_ty, a.clone(), b, c.clone(), b_proof, h_bc)?;
            Ok(SimpResult::with_proof(c, pr, false))
        }
    }

    /// Chain two results: `a = b_res.out` and `b_res.out = c_res.out`.
    fn mk_trans_result2(
        &mut self,
        a: &Expr,
        b_res: &SimpResult,
        c_res: &SimpResult,
    ) -> Result<SimpResult> {
        if !self.cfg.proofs {
            return Ok(c_res.clone());
        }
        let b_proof = match &b_res.proof {
            None => return Ok(c_res.clone()),
            Some(p) => p.clone(),
        };
        let c_proof = match &c_res.proof {
            None => {
                return Ok(SimpResult {
                    out: c_res.out.clone(),
                    proof: Some(b_proof),
                    heq_proof: b_res.heq_proof,
                })
            }
            Some(p) => p.clone(),
        };
        let (b, c) = (b_res.out.clone(), c_res.out.clone());
        let heq = b_res.heq_proof || c_res.heq_proof;
        if heq {
            let a_ty = self.infer_type(a)?;
            let b_ty = self.infer_type(&b)?;
            let c_ty = self.infer_type(&c)?;
            let h_ab = if b_res.heq_proof {
                b_proof
            } else {
                self.ctx
                    .mk_to_heq_th(a_ty.clone(), a.clone(), b.clone(), b_proof)?
            };
            let h_bc = if c_res.heq_proof {
                c_proof
            } else {
                self.ctx
                    .mk_to_heq_th(b_ty.clone(), b.clone(), c.clone(), c_proof)?
            };
            let pr = self
                .ctx
                .mk_htrans_th(a_ty, b_ty, c_ty, a.clone(), b, c.clone(), h_ab, h_bc)?;
            Ok(SimpResult::with_proof(c, pr, true))
        } else {
            let a_ty = self.infer_type(a)?;
            let pr = self
                .ctx
                .mk_trans_th(a_ty, a.clone(), b, c.clone(), b_proof, c_proof)?;
            Ok(SimpResult::with_proof(c, pr, false))
        }
    }

    // ### the rewrite engine

    // values, for the purpose of deciding whether evaluation finished:
    // literals and the truth constants
    fn is_simp_value(&self, e: &Expr) -> bool {
        e.is_value() || *e == self.ctx.mk_true() || *e == self.ctx.mk_false()
    }

    // should the normalizer evaluate this application?
    fn evaluate_app(&self, e: &Expr) -> bool {
        if !self.cfg.eval {
            return false;
        }
        let args = match e.as_app() {
            Some(a) => a,
            None => return false,
        };
        let head_builtin = args[0]
            .as_const()
            .and_then(|s| self.ctx.find_object(s.name()))
            .map_or(false, |o| o.is_builtin());
        if head_builtin && args[1..].iter().all(|a| a.is_value()) {
            return true;
        }
        // the equality connectives take types first; evaluate as soon as
        // the compared operands are values
        let n = args.len();
        let head_eq = matches!(
            args[0].as_const().map(|s| s.name()),
            Some("eq") | Some("neq") | Some("heq")
        );
        head_eq && n >= 2 && args[n - 2].is_value() && args[n - 1].is_value()
    }

    /// Rewrite an application: evaluation and head-beta first, then the
    /// rule sets. `lhs = rhs.out` with proof `rhs.proof` on entry.
    fn rewrite_app(&mut self, lhs: &Expr, rhs: SimpResult) -> Result<SimpResult> {
        if rhs.out.is_app() {
            if self.evaluate_app(&rhs.out) {
                let v = tc::normalize(self.ctx, &rhs.out, true)?;
                if self.is_simp_value(&v) {
                    // definitionally equal, no proof step needed
                    let r = SimpResult {
                        out: v,
                        proof: rhs.proof.clone(),
                        heq_proof: rhs.heq_proof,
                    };
                    return self.rewrite(lhs, r);
                }
            }
            let head_is_lambda = rhs
                .out
                .as_app()
                .map_or(false, |args| args[0].as_lambda().is_some());
            if self.cfg.beta && head_is_lambda {
                let new_out = self.ctx.head_beta_reduce(&rhs.out);
                let r = SimpResult {
                    out: new_out,
                    proof: rhs.proof.clone(),
                    heq_proof: rhs.heq_proof,
                };
                return self.rewrite(lhs, r);
            }
        }
        self.rewrite(lhs, rhs)
    }

    /// Try the rule sets on `rhs.out`; compose proofs through
    /// transitivity, and re-simplify unless in single-pass mode.
    fn rewrite(&mut self, lhs: &Expr, rhs: SimpResult) -> Result<SimpResult> {
        let target = rhs.out.clone();
        for si in 0..self.rule_sets.len() {
            let cands = self.rule_sets[si].candidates(&target);
            for rule in cands {
                if let Some((new_rhs, new_proof)) = self.try_rule(&rule, &target)? {
                    logdebug!("rule {} fired: {} => {}", rule.name(), target, new_rhs);
                    let r1 = self.mk_trans_result(lhs, &rhs, new_rhs, new_proof)?;
                    if self.cfg.single_pass {
                        return Ok(r1);
                    }
                    let r2 = self.simplify(&r1.out)?;
                    return self.mk_trans_result2(lhs, &r1, &r2);
                }
            }
        }
        if !self.cfg.single_pass && lhs != &rhs.out {
            // something changed upstream; stabilize the new term
            let r2 = self.simplify(&rhs.out)?;
            return self.mk_trans_result2(lhs, &rhs, &r2);
        }
        Ok(rhs)
    }

    // attempt one rule against `target`; `Ok(None)` rejects silently
    fn try_rule(
        &mut self,
        rule: &RewriteRule,
        target: &Expr,
    ) -> Result<Option<(Expr, Option<Expr>)>> {
        let num = rule.num_args();
        let mut subst: Vec<Option<Expr>> = vec![None; num];
        if !hop_match(self.ctx, num, rule.lhs(), target, &mut subst) {
            return Ok(None);
        }

        if subst.iter().all(|s| s.is_some()) {
            // easy case: all arguments found
            let mut inst: Vec<Expr> = Vec::with_capacity(num);
            for j in 0..num {
                match &subst[num - 1 - j] {
                    Some(v) => inst.push(v.clone()),
                    None => unreachable!(),
                }
            }
            let new_rhs = self.ctx.instantiate_args(rule.rhs(), &inst);
            if rule.is_permutation() && !order::is_lt(&new_rhs, target) {
                return Ok(None); // would not decrease in the term order
            }
            let proof = if self.cfg.proofs {
                let mut pargs: Exprs = smallvec![rule.proof().clone()];
                for s in &subst {
                    match s {
                        Some(v) => pargs.push(v.clone()),
                        None => unreachable!(),
                    }
                }
                Some(self.ctx.mk_app(pargs))
            } else {
                None
            };
            return Ok(Some((new_rhs, proof)));
        }

        // conditional rewriting: fill the missing arguments by proving
        // the propositional premises
        if !self.cfg.conditional {
            return Ok(None);
        }
        let mut ceq = rule.ceq().clone();
        let mut proof_args: Exprs = smallvec![];
        if self.cfg.proofs {
            proof_args.push(rule.proof().clone());
        }
        for i in 0..num {
            let (dom, body) = match ceq.as_pi() {
                Some((_, d, b)) => (d.clone(), b.clone()),
                None => return Err(Error::new("malformed conditional equation")),
            };
            match subst[i].clone() {
                Some(v) => {
                    ceq = self.ctx.instantiate(&body, &v);
                    if self.cfg.proofs {
                        proof_args.push(v);
                    }
                }
                None => {
                    if !self.is_proposition(&dom)? {
                        return Ok(None); // the argument is not a premise
                    }
                    let d_res = self.simplify(&dom)?;
                    if d_res.out != self.ctx.mk_true() {
                        return Ok(None); // failed to prove the premise
                    }
                    if self.cfg.proofs {
                        let d_proof = match &d_res.proof {
                            // the premise is definitionally `True`
                            None => self.ctx.mk_trivial_th()?,
                            Some(p) => self.ctx.mk_eqt_elim_th(dom.clone(), p.clone())?,
                        };
                        ceq = self.ctx.instantiate(&body, &d_proof);
                        proof_args.push(d_proof);
                    } else if ceq.is_arrow() {
                        ceq = self.ctx.lower_free_vars(&body, 1, 1)?;
                    } else {
                        // the equation depends on this premise's proof,
                        // which we are not building
                        return Ok(None);
                    }
                }
            }
        }
        let new_rhs = match ceq.unfold_eq() {
            Some((_, _, r)) => r.clone(),
            None => return Err(Error::new("malformed conditional equation")),
        };
        if rule.is_permutation() && !order::is_lt(&new_rhs, target) {
            return Ok(None);
        }
        let proof = if self.cfg.proofs {
            Some(self.ctx.mk_app(proof_args))
        } else {
            None
        };
        Ok(Some((new_rhs, proof)))
    }

    // ### abstractions

    fn simplify_lambda(&mut self, e: &Expr) -> Result<SimpResult> {
        let (name, dom, body) = match e.as_lambda() {
            Some((n, d, b)) => (n.clone(), d.clone(), b.clone()),
            None => return Err(Error::new("simplify_lambda: expected a lambda")),
        };
        if self.has_heq {
            // rewriting under a binder can change the body's type, which
            // homogeneous funext cannot express; stay conservative
            return Ok(SimpResult::new(e.clone()));
        }
        let res_body = self.in_binder(&name, &dom, |s| s.simplify(&body))?;
        debug_assert!(!res_body.heq_proof);
        if res_body.out == body {
            return self.rewrite_lambda(e, SimpResult::new(e.clone()));
        }
        let out = self
            .ctx
            .mk_lambda(name.clone(), dom.clone(), res_body.out.clone());
        let body_proof = match (&res_body.proof, self.cfg.proofs) {
            (Some(p), true) => p.clone(),
            _ => return self.rewrite_lambda(e, SimpResult::new(out)),
        };
        let body_ty = {
            let mut locals = self.locals.clone();
            locals.push(name.clone(), dom.clone());
            tc::infer_type(self.ctx, &locals, &body)?
        };
        let b_fam = self.ctx.mk_lambda(name.clone(), dom.clone(), body_ty);
        let pr_lam = self.ctx.mk_lambda(name.clone(), dom.clone(), body_proof);
        let pr = self
            .ctx
            .mk_funext_th(dom, b_fam, e.clone(), out.clone(), pr_lam)?;
        self.rewrite_lambda(e, SimpResult::with_proof(out, pr, false))
    }

    /// Rewrite a lambda: eta reduction first, then the rule sets.
    fn rewrite_lambda(&mut self, lhs: &Expr, rhs: SimpResult) -> Result<SimpResult> {
        if self.cfg.eta {
            if let Some(new_rhs) = self.eta_candidate(&rhs.out) {
                let (name, lam_dom) = match rhs.out.as_lambda() {
                    Some((n, d, _)) => (n.clone(), d.clone()),
                    None => return Err(Error::new("rewrite_lambda: expected a lambda")),
                };
                let nr_ty = self.infer_type(&new_rhs)?;
                if let Ok(pi) = tc::ensure_pi(self.ctx, &nr_ty) {
                    let (ndom, nbody) = pi_parts(&pi);
                    // the contracted function's domain must agree with
                    // the binder's domain, or the proof will not check
                    if self.is_definitionally_equal(&ndom, &lam_dom)? {
                        logdebug!("eta: {} => {}", rhs.out, new_rhs);
                        if self.cfg.proofs {
                            let b_fam = self.ctx.mk_lambda(name, lam_dom.clone(), nbody);
                            let pr = self.ctx.mk_eta_th(lam_dom, b_fam, new_rhs.clone())?;
                            let r1 = self.mk_trans_result(lhs, &rhs, new_rhs, Some(pr))?;
                            return self.rewrite(lhs, r1);
                        } else {
                            return self.rewrite(lhs, SimpResult::new(new_rhs));
                        }
                    }
                }
            }
        }
        self.rewrite(lhs, rhs)
    }

    // `λ x, f … x` with `x` absent from `f …` contracts to `f …`
    fn eta_candidate(&mut self, e: &Expr) -> Option<Expr> {
        let (_, _, body) = e.as_lambda()?;
        let args = body.as_app()?;
        let n = args.len();
        if args[n - 1].as_var() != Some(0) || args[..n - 1].iter().any(|a| a.has_loose_bvar(0)) {
            return None;
        }
        let prefix = if n == 2 {
            args[0].clone()
        } else {
            let v: Exprs = args[..n - 1].iter().cloned().collect();
            self.ctx.mk_app(v)
        };
        self.ctx.lower_free_vars(&prefix, 1, 1).ok()
    }

    fn simplify_pi(&mut self, e: &Expr) -> Result<SimpResult> {
        let (name, dom, body) = match e.as_pi() {
            Some((n, d, b)) => (n.clone(), d.clone(), b.clone()),
            None => return Err(Error::new("simplify_pi: expected a Pi")),
        };
        if self.has_heq {
            return Ok(SimpResult::new(e.clone()));
        }
        if !self.is_proposition(e)? {
            // without heterogeneous equality there is no way to state
            // the equality of two rewritten non-propositional products
            return Ok(SimpResult::new(e.clone()));
        }
        let res_body = self.in_binder(&name, &dom, |s| s.simplify(&body))?;
        debug_assert!(!res_body.heq_proof);
        if res_body.out == body {
            return self.rewrite(e, SimpResult::new(e.clone()));
        }
        let out = self
            .ctx
            .mk_pi(name.clone(), dom.clone(), res_body.out.clone());
        let body_proof = match (&res_body.proof, self.cfg.proofs) {
            (Some(p), true) => p.clone(),
            _ => return self.rewrite(e, SimpResult::new(out)),
        };
        let p_old = self.ctx.mk_lambda(name.clone(), dom.clone(), body.clone());
        let p_new = self
            .ctx
            .mk_lambda(name.clone(), dom.clone(), res_body.out.clone());
        let h = self.ctx.mk_lambda(name.clone(), dom.clone(), body_proof);
        let pr = self.ctx.mk_allext_th(dom, p_old, p_new, h)?;
        self.rewrite(e, SimpResult::with_proof(out, pr, false))
    }
}

// domain and body of a Pi, cloned
fn pi_parts(pi: &Expr) -> (Expr, Expr) {
    match pi.as_pi() {
        Some((_, d, b)) => (d.clone(), b.clone()),
        None => unreachable!("caller ensured a Pi"),
    }
}

// `Π x:A, B` as the type family `λ x:A, B`
fn lambda_of_pi(ctx: &mut Ctx, pi: &Expr) -> Expr {
    match pi.as_pi() {
        Some((n, d, b)) => {
            let (n, d, b) = (n.clone(), d.clone(), b.clone());
            ctx.mk_lambda(n, d, b)
        }
        None => unreachable!("caller ensured a Pi"),
    }
}

/// Simplify `e` under `locals`, using the given rule sets and the
/// `simplifier.*` options. Returns the simplified term and a proof of
/// equality (reflexivity when nothing changed or proofs are disabled).
pub fn simplify(
    ctx: &mut Ctx,
    e: &Expr,
    locals: &Locals,
    opts: &Options,
    rule_sets: &[RewriteRuleSet],
) -> Result<(Expr, Expr)> {
    let cfg = SimpConfig::from_options(opts);
    let mut s = Simplifier::new(ctx, cfg, rule_sets.to_vec());
    s.run(e, locals)
}

/// Like [`simplify`], with rule sets resolved by namespace against the
/// context's registry.
pub fn simplify_with_namespaces(
    ctx: &mut Ctx,
    e: &Expr,
    locals: &Locals,
    opts: &Options,
    namespaces: &[&str],
) -> Result<(Expr, Expr)> {
    let mut sets = Vec::with_capacity(namespaces.len());
    for ns in namespaces {
        match ctx.find_rule_set(ns) {
            Some(rs) => sets.push(rs.clone()),
            None => return Err(errorstr!("unknown rewrite-rule namespace `{}`", ns)),
        }
    }
    simplify(ctx, e, locals, opts, &sets)
}
