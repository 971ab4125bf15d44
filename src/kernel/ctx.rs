//! # Context for expressions and the environment.
//!
//! The context is responsible for creating terms with perfect sharing
//! (hash-consing), for the de Bruijn manipulations the rest of the crate
//! relies on, and for the environment: declared constants, definitions,
//! builtin functions, imported theories and named rewrite-rule sets.

use super::expr::{DbIndex, Exprs, Value, WExpr};
use super::symbol::Symbol;
use super::{Expr, ExprView, Type, WeakRef};
use crate::algo::rw_rule::RewriteRuleSet;
use crate::error::{Error, Result};
use crate::errorstr;
use fnv::{FnvHashMap, FnvHashSet};
use smallvec::smallvec;
use std::sync::atomic;

use ExprView::*;

/// Evaluation function of a builtin constant.
///
/// Receives the (non-head) arguments once they are all values; returns
/// `None` when the builtin does not apply to these arguments.
pub type BuiltinFn = fn(&[Value]) -> Option<Value>;

/// An environment object: a declared constant together with what the
/// environment knows about it.
pub struct Object {
    pub name: Symbol,
    pub ty: Type,
    /// Definiens, for defined constants.
    pub value: Option<Expr>,
    /// Opaque definitions are never unfolded.
    pub opaque: bool,
    /// Evaluation function, for builtin constants.
    pub builtin: Option<BuiltinFn>,
}

impl Object {
    /// Should the simplifier's `unfold` step replace this constant by
    /// its definiens?
    pub fn should_unfold(&self) -> bool {
        self.value.is_some() && !self.opaque && self.builtin.is_none()
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin.is_some()
    }
}

/// Global manager for expressions and the environment.
pub struct Ctx(Box<CtxImpl>);

struct CtxImpl {
    /// Hashconsing table, with weak semantics.
    tbl: FnvHashMap<ExprView, WExpr>,
    next_cleanup: usize,
    uid: u32, // unique to this ctx
    /// Declared environment objects.
    objects: FnvHashMap<Symbol, Object>,
    /// Imported theories ("eq", "heq", "cast").
    imports: FnvHashSet<Symbol>,
    /// Named rewrite-rule sets.
    rule_sets: FnvHashMap<Symbol, RewriteRuleSet>,
    // frequently used terms, built once
    e_type: Option<Expr>,
    e_bool: Option<Expr>,
    e_true: Option<Expr>,
    e_false: Option<Expr>,
    c_eq: Option<Expr>,
    c_not: Option<Expr>,
}

/// Period between 2 cleanups.
///
/// The cleanup of dead entries from the hashconsing table is done
/// every time `CLEANUP_PERIOD` new terms are added.
const CLEANUP_PERIOD: usize = 5_000;

// used to allocate unique ctx IDs
static CTX_ID: atomic::AtomicUsize = atomic::AtomicUsize::new(0);

impl Ctx {
    /// Create a new context with the base equality theory declared.
    pub fn new() -> Self {
        let uid = CTX_ID.fetch_add(1, atomic::Ordering::SeqCst);
        if uid > u32::MAX as usize {
            panic!("allocated more than u32::MAX contexts, cannot allocate more");
        }
        let mut ctx = Ctx(Box::new(CtxImpl {
            tbl: FnvHashMap::default(),
            next_cleanup: CLEANUP_PERIOD,
            uid: uid as u32,
            objects: FnvHashMap::default(),
            imports: FnvHashSet::default(),
            rule_sets: FnvHashMap::default(),
            e_type: None,
            e_bool: None,
            e_true: None,
            e_false: None,
            c_eq: None,
            c_not: None,
        }));
        let ty = ctx.hashcons_(EType);
        ctx.0.e_type = Some(ty);
        ctx.declare_eq_theory();
        ctx
    }

    /// Add to the internal table, return the canonical representant.
    fn hashcons_(&mut self, ev: ExprView) -> Expr {
        let CtxImpl {
            tbl, next_cleanup, ..
        } = &mut *self.0;
        if let Some(v) = tbl.get(&ev) {
            if let Some(t) = WeakRef::upgrade(&v.0) {
                return Expr(t); // still alive!
            }
        }

        // every n new terms, cleanup dead weak entries
        if *next_cleanup == 0 {
            self.cleanup();
        } else {
            *next_cleanup -= 1;
        }

        let key = ev.clone();
        let e = Expr::make_(ev, self.0.uid);
        self.0.tbl.insert(key, e.weak());
        e
    }

    #[inline]
    pub(crate) fn check_uid_(&self, e: &Expr) {
        assert!(self.0.uid == e.ctx_uid()); // term should belong to this ctx
    }

    /// Cleanup terms that are only referenced by the hashconsing table.
    pub fn cleanup(&mut self) {
        self.0.next_cleanup = CLEANUP_PERIOD;
        self.0.tbl.retain(|_, v| WeakRef::strong_count(&v.0) > 0);
    }

    // ### constructors

    /// The universe of types.
    #[inline]
    pub fn mk_type(&self) -> Expr {
        self.0.e_type.as_ref().expect("`Type` not initialized").clone()
    }

    /// The type of propositions.
    #[inline]
    pub fn mk_bool(&self) -> Expr {
        self.0.e_bool.as_ref().expect("`Bool` not initialized").clone()
    }

    #[inline]
    pub fn mk_true(&self) -> Expr {
        self.0.e_true.as_ref().expect("`True` not initialized").clone()
    }

    #[inline]
    pub fn mk_false(&self) -> Expr {
        self.0.e_false.as_ref().expect("`False` not initialized").clone()
    }

    /// Make a bound variable.
    pub fn mk_var(&mut self, idx: DbIndex) -> Expr {
        self.hashcons_(EVar(idx))
    }

    /// Make a constant term. The constant need not be declared: the
    /// simplifier mints scoped placeholder constants this way.
    pub fn mk_const(&mut self, name: impl Into<Symbol>) -> Expr {
        self.hashcons_(EConst(name.into()))
    }

    /// Make a metavariable term.
    pub fn mk_meta(&mut self, name: impl Into<Symbol>) -> Expr {
        self.hashcons_(EMeta(name.into()))
    }

    /// Make a value term.
    pub fn mk_value(&mut self, v: Value) -> Expr {
        self.check_uid_(&v.ty);
        self.hashcons_(EValue(v))
    }

    /// A numeric literal of the given type.
    pub fn mk_num(&mut self, ty: Type, n: i64) -> Expr {
        use super::expr::ValueRepr;
        self.mk_value(Value {
            ty,
            repr: ValueRepr::Num(n),
        })
    }

    /// Make an application from all arguments, head first.
    ///
    /// A head that is itself an application is flattened, so that the
    /// arity invariant (`args[0]` is never an application) holds.
    /// A singleton argument list returns the head itself.
    pub fn mk_app(&mut self, args: Exprs) -> Expr {
        assert!(!args.is_empty());
        for a in &args[..] {
            self.check_uid_(a);
        }
        let mut args = args;
        if args[0].is_app() {
            let mut flat: Exprs = smallvec![];
            flat.extend(args[0].as_app().unwrap().iter().cloned());
            flat.extend(args.drain(1..));
            args = flat;
        }
        if args.len() == 1 {
            return args.into_iter().next().unwrap();
        }
        self.hashcons_(EApp(args))
    }

    /// Apply `f` to the given arguments.
    pub fn mk_app_l(&mut self, f: &Expr, args: &[Expr]) -> Expr {
        let mut v: Exprs = smallvec![f.clone()];
        v.extend(args.iter().cloned());
        self.mk_app(v)
    }

    /// Make a lambda; `body` uses de Bruijn index 0 for the binder.
    pub fn mk_lambda(&mut self, name: impl Into<Symbol>, ty: Type, body: Expr) -> Expr {
        self.check_uid_(&ty);
        self.check_uid_(&body);
        self.hashcons_(ELambda(name.into(), ty, body))
    }

    /// Make a dependent product; `body` uses de Bruijn index 0 for the binder.
    pub fn mk_pi(&mut self, name: impl Into<Symbol>, ty: Type, body: Expr) -> Expr {
        self.check_uid_(&ty);
        self.check_uid_(&body);
        self.hashcons_(EPi(name.into(), ty, body))
    }

    /// Make a non-dependent product `a -> b`.
    pub fn mk_arrow(&mut self, a: Type, b: Type) -> Expr {
        let b = self.lift(&b, 1);
        self.mk_pi("_", a, b)
    }

    /// Make a let binding; `body` uses de Bruijn index 0 for the binder.
    pub fn mk_let(
        &mut self,
        name: impl Into<Symbol>,
        ty: Option<Type>,
        value: Expr,
        body: Expr,
    ) -> Expr {
        self.check_uid_(&value);
        self.check_uid_(&body);
        self.hashcons_(ELet(name.into(), ty, value, body))
    }

    /// The equality head constant.
    pub fn mk_c_eq(&self) -> Expr {
        self.0.c_eq.as_ref().expect("`eq` not initialized").clone()
    }

    /// Build the proposition `a = b` at type `ty`.
    pub fn mk_eq(&mut self, ty: Type, a: Expr, b: Expr) -> Expr {
        let eq = self.mk_c_eq();
        self.mk_app(smallvec![eq, ty, a, b])
    }

    /// Build the proposition `a == b` with `a : ty_a` and `b : ty_b`.
    ///
    /// Fails if the `heq` theory was not imported.
    pub fn mk_heq(&mut self, ty_a: Type, ty_b: Type, a: Expr, b: Expr) -> Result<Expr> {
        if !self.imported("heq") {
            return Err(Error::new("mk_heq: theory `heq` is not imported"));
        }
        let heq = self.mk_const("heq");
        Ok(self.mk_app(smallvec![heq, ty_a, ty_b, a, b]))
    }

    /// Build the proposition `not p`.
    pub fn mk_not(&mut self, p: Expr) -> Expr {
        let not = self.0.c_not.as_ref().expect("`not` not initialized").clone();
        self.mk_app(smallvec![not, p])
    }

    // ### de Bruijn manipulations

    /// Shift loose variables of `t` by `n`, under `k` intermediate binders.
    fn shift_(&mut self, t: &Expr, n: DbIndex, k: DbIndex) -> Expr {
        if n == 0 || t.db_depth() <= k {
            return t.clone(); // shortcut: nothing loose to shift
        }
        match t.view() {
            EType | EConst(..) | EMeta(..) => t.clone(),
            EValue(..) => t.clone(), // value types are closed
            EVar(idx) => {
                if *idx >= k {
                    self.hashcons_(EVar(idx + n))
                } else {
                    t.clone()
                }
            }
            EApp(args) => {
                let args = args.clone();
                let new_args: Exprs = args.iter().map(|a| self.shift_(a, n, k)).collect();
                self.hashcons_(EApp(new_args))
            }
            ELambda(name, ty, body) => {
                let (name, ty, body) = (name.clone(), ty.clone(), body.clone());
                let ty2 = self.shift_(&ty, n, k);
                let body2 = self.shift_(&body, n, k + 1);
                self.hashcons_(ELambda(name, ty2, body2))
            }
            EPi(name, ty, body) => {
                let (name, ty, body) = (name.clone(), ty.clone(), body.clone());
                let ty2 = self.shift_(&ty, n, k);
                let body2 = self.shift_(&body, n, k + 1);
                self.hashcons_(EPi(name, ty2, body2))
            }
            ELet(name, ty, v, body) => {
                let (name, ty, v, body) = (name.clone(), ty.clone(), v.clone(), body.clone());
                let ty2 = match ty {
                    None => None,
                    Some(ty) => Some(self.shift_(&ty, n, k)),
                };
                let v2 = self.shift_(&v, n, k);
                let body2 = self.shift_(&body, n, k + 1);
                self.hashcons_(ELet(name, ty2, v2, body2))
            }
        }
    }

    /// Shift all loose variables of `e` by `n`.
    pub fn lift(&mut self, e: &Expr, n: DbIndex) -> Expr {
        self.shift_(e, n, 0)
    }

    /// Replace `Var(k + i)` in `t` by `args[i]`, under `k` intermediate
    /// binders; variables above the substituted range are lowered by
    /// `args.len()`.
    fn subst_db_(&mut self, t: &Expr, k: DbIndex, args: &[Expr]) -> Expr {
        let len = args.len() as DbIndex;
        if t.db_depth() <= k || len == 0 {
            return t.clone(); // shortcut
        }
        match t.view() {
            EType | EConst(..) | EMeta(..) | EValue(..) => t.clone(),
            EVar(idx) => {
                let idx = *idx;
                if idx >= k && idx < k + len {
                    // refers to a substituted variable; shift its image
                    // past the `k` binders we traversed
                    let u = args[(idx - k) as usize].clone();
                    self.shift_(&u, k, 0)
                } else if idx >= k + len {
                    // loose above the range: lower past the removed binders
                    self.hashcons_(EVar(idx - len))
                } else {
                    t.clone()
                }
            }
            EApp(a) => {
                let a = a.clone();
                let new_args: Exprs = a.iter().map(|x| self.subst_db_(x, k, args)).collect();
                // the head may have become an application (or a lambda):
                // re-flatten through `mk_app`
                self.mk_app(new_args)
            }
            ELambda(name, ty, body) => {
                let (name, ty, body) = (name.clone(), ty.clone(), body.clone());
                let ty2 = self.subst_db_(&ty, k, args);
                let body2 = self.subst_db_(&body, k + 1, args);
                self.hashcons_(ELambda(name, ty2, body2))
            }
            EPi(name, ty, body) => {
                let (name, ty, body) = (name.clone(), ty.clone(), body.clone());
                let ty2 = self.subst_db_(&ty, k, args);
                let body2 = self.subst_db_(&body, k + 1, args);
                self.hashcons_(EPi(name, ty2, body2))
            }
            ELet(name, ty, v, body) => {
                let (name, ty, v, body) = (name.clone(), ty.clone(), v.clone(), body.clone());
                let ty2 = match ty {
                    None => None,
                    Some(ty) => Some(self.subst_db_(&ty, k, args)),
                };
                let v2 = self.subst_db_(&v, k, args);
                let body2 = self.subst_db_(&body, k + 1, args);
                self.hashcons_(ELet(name, ty2, v2, body2))
            }
        }
    }

    /// Replace variable 0 of `body` by `v` (the standard beta step).
    pub fn instantiate(&mut self, body: &Expr, v: &Expr) -> Expr {
        self.subst_db_(body, 0, std::slice::from_ref(v))
    }

    /// Replace `Var(i)` of `e` by `args[i]` for every `i < args.len()`.
    pub fn instantiate_args(&mut self, e: &Expr, args: &[Expr]) -> Expr {
        self.subst_db_(e, 0, args)
    }

    /// Lower loose variables `>= s` by `n`.
    ///
    /// Fails if a variable in the removed range `[s - n, s)` occurs.
    pub fn lower_free_vars(&mut self, e: &Expr, s: DbIndex, n: DbIndex) -> Result<Expr> {
        assert!(s >= n);
        fn rec(ctx: &mut Ctx, e: &Expr, s: DbIndex, n: DbIndex, k: DbIndex) -> Result<Expr> {
            if e.db_depth() <= s + k - n {
                // every loose variable is below the removed range
                return Ok(e.clone());
            }
            Ok(match e.view() {
                EType | EConst(..) | EMeta(..) | EValue(..) => e.clone(),
                EVar(idx) => {
                    let idx = *idx;
                    if idx >= s + k {
                        ctx.hashcons_(EVar(idx - n))
                    } else if idx >= s + k - n {
                        return Err(Error::new("lower_free_vars: variable in removed range"));
                    } else {
                        e.clone()
                    }
                }
                EApp(args) => {
                    let args = args.clone();
                    let mut new_args: Exprs = smallvec![];
                    for a in args.iter() {
                        new_args.push(rec(ctx, a, s, n, k)?);
                    }
                    ctx.hashcons_(EApp(new_args))
                }
                ELambda(name, ty, body) => {
                    let (name, ty, body) = (name.clone(), ty.clone(), body.clone());
                    let ty2 = rec(ctx, &ty, s, n, k)?;
                    let body2 = rec(ctx, &body, s, n, k + 1)?;
                    ctx.hashcons_(ELambda(name, ty2, body2))
                }
                EPi(name, ty, body) => {
                    let (name, ty, body) = (name.clone(), ty.clone(), body.clone());
                    let ty2 = rec(ctx, &ty, s, n, k)?;
                    let body2 = rec(ctx, &body, s, n, k + 1)?;
                    ctx.hashcons_(EPi(name, ty2, body2))
                }
                ELet(name, ty, v, body) => {
                    let (name, ty, v, body) = (name.clone(), ty.clone(), v.clone(), body.clone());
                    let ty2 = match ty {
                        None => None,
                        Some(ty) => Some(rec(ctx, &ty, s, n, k)?),
                    };
                    let v2 = rec(ctx, &v, s, n, k)?;
                    let body2 = rec(ctx, &body, s, n, k + 1)?;
                    ctx.hashcons_(ELet(name, ty2, v2, body2))
                }
            })
        }
        rec(self, e, s, n, 0)
    }

    /// Replace every occurrence of the constant `c` in `e` by variable 0,
    /// lifting the other loose variables of `e` by one, so that the result
    /// can be placed under one new binder.
    pub fn abstract_const(&mut self, e: &Expr, c: &Expr) -> Expr {
        debug_assert!(c.as_const().is_some());
        fn rec(ctx: &mut Ctx, e: &Expr, c: &Expr, k: DbIndex) -> Expr {
            if e == c {
                return ctx.mk_var(k);
            }
            match e.view() {
                EType | EConst(..) | EMeta(..) | EValue(..) => e.clone(),
                EVar(idx) => {
                    if *idx >= k {
                        ctx.hashcons_(EVar(idx + 1))
                    } else {
                        e.clone()
                    }
                }
                EApp(args) => {
                    let args = args.clone();
                    let new_args: Exprs = args.iter().map(|a| rec(ctx, a, c, k)).collect();
                    ctx.hashcons_(EApp(new_args))
                }
                ELambda(name, ty, body) => {
                    let (name, ty, body) = (name.clone(), ty.clone(), body.clone());
                    let ty2 = rec(ctx, &ty, c, k);
                    let body2 = rec(ctx, &body, c, k + 1);
                    ctx.hashcons_(ELambda(name, ty2, body2))
                }
                EPi(name, ty, body) => {
                    let (name, ty, body) = (name.clone(), ty.clone(), body.clone());
                    let ty2 = rec(ctx, &ty, c, k);
                    let body2 = rec(ctx, &body, c, k + 1);
                    ctx.hashcons_(EPi(name, ty2, body2))
                }
                ELet(name, ty, v, body) => {
                    let (name, ty, v, body) = (name.clone(), ty.clone(), v.clone(), body.clone());
                    let ty2 = ty.map(|ty| rec(ctx, &ty, c, k));
                    let v2 = rec(ctx, &v, c, k);
                    let body2 = rec(ctx, &body, c, k + 1);
                    ctx.hashcons_(ELet(name, ty2, v2, body2))
                }
            }
        }
        rec(self, e, c, 0)
    }

    /// Reduce the leading beta-redexes of an application, repeatedly.
    pub fn head_beta_reduce(&mut self, e: &Expr) -> Expr {
        let mut cur = e.clone();
        loop {
            let args = match cur.as_app() {
                Some(args) => args.to_vec(),
                None => return cur,
            };
            if args[0].as_lambda().is_none() {
                return cur;
            }
            let mut f = args[0].clone();
            let mut i = 1;
            while i < args.len() {
                match f.as_lambda() {
                    Some((_, _, body)) => {
                        let body = body.clone();
                        f = self.instantiate(&body, &args[i]);
                        i += 1;
                    }
                    None => break,
                }
            }
            cur = if i == args.len() {
                f
            } else {
                let mut v: Exprs = smallvec![f];
                v.extend(args[i..].iter().cloned());
                self.mk_app(v)
            };
        }
    }

    // ### environment

    /// Declare a new opaque constant with the given type; returns its term.
    pub fn declare_const(&mut self, name: impl Into<Symbol>, ty: Type) -> Result<Expr> {
        let name = name.into();
        self.check_uid_(&ty);
        if self.0.objects.contains_key(&name) {
            return Err(errorstr!("declare_const: `{}` is already declared", name));
        }
        self.0.objects.insert(
            name.clone(),
            Object {
                name: name.clone(),
                ty,
                value: None,
                opaque: true,
                builtin: None,
            },
        );
        Ok(self.mk_const(name))
    }

    /// Define a constant with the given type and definiens.
    pub fn define(
        &mut self,
        name: impl Into<Symbol>,
        ty: Type,
        value: Expr,
        opaque: bool,
    ) -> Result<Expr> {
        let name = name.into();
        self.check_uid_(&ty);
        self.check_uid_(&value);
        if self.0.objects.contains_key(&name) {
            return Err(errorstr!("define: `{}` is already declared", name));
        }
        if !value.is_closed() {
            return Err(Error::new("define: definiens must be closed"));
        }
        self.0.objects.insert(
            name.clone(),
            Object {
                name: name.clone(),
                ty,
                value: Some(value),
                opaque,
                builtin: None,
            },
        );
        Ok(self.mk_const(name))
    }

    /// Declare a builtin constant with an evaluation function.
    pub fn declare_builtin(
        &mut self,
        name: impl Into<Symbol>,
        ty: Type,
        f: BuiltinFn,
    ) -> Result<Expr> {
        let name = name.into();
        self.check_uid_(&ty);
        if self.0.objects.contains_key(&name) {
            return Err(errorstr!("declare_builtin: `{}` is already declared", name));
        }
        self.0.objects.insert(
            name.clone(),
            Object {
                name: name.clone(),
                ty,
                value: None,
                opaque: true,
                builtin: Some(f),
            },
        );
        Ok(self.mk_const(name))
    }

    /// Find an environment object by name.
    pub fn find_object(&self, name: &str) -> Option<&Object> {
        self.0.objects.get(name)
    }

    /// Was the given theory imported? `"eq"` always holds.
    pub fn imported(&self, name: &str) -> bool {
        self.0.imports.contains(name)
    }

    // ### named rule sets

    /// The rewrite-rule set registered under `ns`, creating it if needed.
    pub fn rule_set_mut(&mut self, ns: impl Into<Symbol>) -> &mut RewriteRuleSet {
        self.0.rule_sets.entry(ns.into()).or_insert_with(RewriteRuleSet::new)
    }

    /// Find a rewrite-rule set by namespace.
    pub fn find_rule_set(&self, ns: &str) -> Option<&RewriteRuleSet> {
        self.0.rule_sets.get(ns)
    }
}

// theory declarations
impl Ctx {
    /// Declare the base equality theory: `Bool`, `True`, `False`, `not`,
    /// `eq`, `neq` and the homogeneous proof constants.
    fn declare_eq_theory(&mut self) {
        let ty = self.mk_type();

        let bool_ = self.declare_const("Bool", ty.clone()).unwrap();
        self.0.e_bool = Some(bool_.clone());
        let e_true = self.declare_const("True", bool_.clone()).unwrap();
        self.0.e_true = Some(e_true.clone());
        let e_false = self.declare_const("False", bool_.clone()).unwrap();
        self.0.e_false = Some(e_false);

        // not : Bool -> Bool
        let not_ty = self.mk_arrow(bool_.clone(), bool_.clone());
        let c_not = self.declare_const("not", not_ty).unwrap();
        self.0.c_not = Some(c_not);

        // eq : Π (A : Type), A -> A -> Bool
        let eq_ty = {
            let v0 = self.mk_var(0);
            let v1 = self.mk_var(1);
            let inner = self.mk_pi("y", v1, bool_.clone());
            let mid = self.mk_pi("x", v0, inner);
            self.mk_pi("A", ty.clone(), mid)
        };
        let c_eq = self.declare_const("eq", eq_ty.clone()).unwrap();
        self.0.c_eq = Some(c_eq);

        // neq : Π (A : Type), A -> A -> Bool
        self.declare_const("neq", eq_ty).unwrap();

        // refl : Π (A : Type) (a : A), eq A a a
        let refl_ty = {
            let v0 = self.mk_var(0);
            let v1 = self.mk_var(1);
            let body = self.mk_eq(v1, v0.clone(), v0.clone());
            let pi_a = self.mk_pi("a", v0, body);
            self.mk_pi("A", ty.clone(), pi_a)
        };
        self.declare_const("refl", refl_ty).unwrap();

        // trans : Π (A : Type) (a b c : A), eq A a b -> eq A b c -> eq A a c
        let trans_ty = {
            let v = |ctx: &mut Self, i| ctx.mk_var(i);
            let (v1, v2) = (v(self, 1), v(self, 2));
            let h2 = {
                let (a, b, c) = (v(self, 4), v(self, 2), v(self, 1));
                self.mk_eq(a, b, c)
            };
            let h1 = {
                let (a, b, c) = (v(self, 3), v(self, 2), v(self, 1));
                self.mk_eq(a, b, c)
            };
            let body = {
                let (a, b, c) = (v(self, 5), v(self, 4), v(self, 2));
                self.mk_eq(a, b, c)
            };
            let e = self.mk_pi("H2", h2, body);
            let e = self.mk_pi("H1", h1, e);
            let e = self.mk_pi("c", v2, e);
            let e = self.mk_pi("b", v1, e);
            let v0 = v(self, 0);
            let e = self.mk_pi("a", v0, e);
            self.mk_pi("A", ty.clone(), e)
        };
        self.declare_const("trans", trans_ty).unwrap();

        // subst : Π (A : Type) (a b : A) (P : A -> Bool), P a -> eq A a b -> P b
        let subst_ty = {
            let p_dom = {
                let v2 = self.mk_var(2);
                self.mk_pi("x", v2, bool_.clone())
            };
            let h1 = {
                let (p, a) = (self.mk_var(0), self.mk_var(2));
                self.mk_app(smallvec![p, a])
            };
            let h2 = {
                let (a_ty, a, b) = (self.mk_var(4), self.mk_var(3), self.mk_var(2));
                self.mk_eq(a_ty, a, b)
            };
            let body = {
                let (p, b) = (self.mk_var(2), self.mk_var(3));
                self.mk_app(smallvec![p, b])
            };
            let e = self.mk_pi("H2", h2, body);
            let e = self.mk_pi("H1", h1, e);
            let e = self.mk_pi("P", p_dom, e);
            let v1 = self.mk_var(1);
            let e = self.mk_pi("b", v1, e);
            let v0 = self.mk_var(0);
            let e = self.mk_pi("a", v0, e);
            self.mk_pi("A", ty.clone(), e)
        };
        self.declare_const("subst", subst_ty).unwrap();

        // congr1 : Π (A B : Type) (f g : A -> B) (a : A),
        //          eq (A -> B) f g -> eq B (f a) (g a)
        let congr1_ty = {
            let f_dom = {
                let (a, b) = (self.mk_var(1), self.mk_var(0));
                self.mk_arrow(a, b)
            };
            let g_dom = {
                let (a, b) = (self.mk_var(2), self.mk_var(1));
                self.mk_arrow(a, b)
            };
            let h = {
                let (a, b) = (self.mk_var(4), self.mk_var(3));
                let fg_ty = self.mk_arrow(a, b);
                let (f, g) = (self.mk_var(2), self.mk_var(1));
                self.mk_eq(fg_ty, f, g)
            };
            let body = {
                let b_ty = self.mk_var(4);
                let (f, g, a) = (self.mk_var(3), self.mk_var(2), self.mk_var(1));
                let fa = self.mk_app(smallvec![f, a.clone()]);
                let ga = self.mk_app(smallvec![g, a]);
                self.mk_eq(b_ty, fa, ga)
            };
            let e = self.mk_pi("H", h, body);
            let v3 = self.mk_var(3);
            let e = self.mk_pi("a", v3, e);
            let e = self.mk_pi("g", g_dom, e);
            let e = self.mk_pi("f", f_dom, e);
            let e = self.mk_pi("B", ty.clone(), e);
            self.mk_pi("A", ty.clone(), e)
        };
        self.declare_const("congr1", congr1_ty).unwrap();

        // congr2 : Π (A B : Type) (f : A -> B) (a b : A),
        //          eq A a b -> eq B (f a) (f b)
        let congr2_ty = {
            let f_dom = {
                let (a, b) = (self.mk_var(1), self.mk_var(0));
                self.mk_arrow(a, b)
            };
            let h = {
                let (a_ty, a, b) = (self.mk_var(4), self.mk_var(1), self.mk_var(0));
                self.mk_eq(a_ty, a, b)
            };
            let body = {
                let b_ty = self.mk_var(4);
                let (f, a, b) = (self.mk_var(3), self.mk_var(2), self.mk_var(1));
                let fa = self.mk_app(smallvec![f.clone(), a]);
                let fb = self.mk_app(smallvec![f, b]);
                self.mk_eq(b_ty, fa, fb)
            };
            let e = self.mk_pi("H", h, body);
            let v3 = self.mk_var(3);
            let e = self.mk_pi("b", v3, e);
            let v2 = self.mk_var(2);
            let e = self.mk_pi("a", v2, e);
            let e = self.mk_pi("f", f_dom, e);
            let e = self.mk_pi("B", ty.clone(), e);
            self.mk_pi("A", ty.clone(), e)
        };
        self.declare_const("congr2", congr2_ty).unwrap();

        // congr : Π (A B : Type) (f g : A -> B) (a b : A),
        //         eq (A -> B) f g -> eq A a b -> eq B (f a) (g b)
        let congr_ty = {
            let f_dom = {
                let (a, b) = (self.mk_var(1), self.mk_var(0));
                self.mk_arrow(a, b)
            };
            let g_dom = {
                let (a, b) = (self.mk_var(2), self.mk_var(1));
                self.mk_arrow(a, b)
            };
            let hf = {
                let (a, b) = (self.mk_var(5), self.mk_var(4));
                let fg_ty = self.mk_arrow(a, b);
                let (f, g) = (self.mk_var(3), self.mk_var(2));
                self.mk_eq(fg_ty, f, g)
            };
            let ha = {
                let (a_ty, a, b) = (self.mk_var(6), self.mk_var(2), self.mk_var(1));
                self.mk_eq(a_ty, a, b)
            };
            let body = {
                let b_ty = self.mk_var(6);
                let (f, g, a, b) = (
                    self.mk_var(5),
                    self.mk_var(4),
                    self.mk_var(3),
                    self.mk_var(2),
                );
                let fa = self.mk_app(smallvec![f, a]);
                let gb = self.mk_app(smallvec![g, b]);
                self.mk_eq(b_ty, fa, gb)
            };
            let e = self.mk_pi("Ha", ha, body);
            let e = self.mk_pi("Hf", hf, e);
            let v4 = self.mk_var(4);
            let e = self.mk_pi("b", v4, e);
            let v3 = self.mk_var(3);
            let e = self.mk_pi("a", v3, e);
            let e = self.mk_pi("g", g_dom, e);
            let e = self.mk_pi("f", f_dom, e);
            let e = self.mk_pi("B", ty.clone(), e);
            self.mk_pi("A", ty.clone(), e)
        };
        self.declare_const("congr", congr_ty).unwrap();

        // funext : Π (A : Type) (B : A -> Type) (f g : Π x:A, B x),
        //          (Π x:A, eq (B x) (f x) (g x)) -> eq (Π x:A, B x) f g
        let funext_ty = {
            let b_dom = {
                let v0 = self.mk_var(0);
                self.mk_arrow(v0, ty.clone())
            };
            let f_dom = {
                let (a, b) = (self.mk_var(1), self.mk_var(1));
                let app = {
                    let x = self.mk_var(0);
                    self.mk_app(smallvec![b, x])
                };
                self.mk_pi("x", a, app)
            };
            let g_dom = {
                let a = self.mk_var(2);
                let app = {
                    let (b, x) = (self.mk_var(2), self.mk_var(0));
                    self.mk_app(smallvec![b, x])
                };
                self.mk_pi("x", a, app)
            };
            let h_dom = {
                let a = self.mk_var(3);
                let inner = {
                    let (b, f, g, x) = (
                        self.mk_var(3),
                        self.mk_var(2),
                        self.mk_var(1),
                        self.mk_var(0),
                    );
                    let bx = self.mk_app(smallvec![b, x.clone()]);
                    let fx = self.mk_app(smallvec![f, x.clone()]);
                    let gx = self.mk_app(smallvec![g, x]);
                    self.mk_eq(bx, fx, gx)
                };
                self.mk_pi("x", a, inner)
            };
            let body = {
                let a = self.mk_var(4);
                let fam = {
                    let (b, x) = (self.mk_var(4), self.mk_var(0));
                    self.mk_app(smallvec![b, x])
                };
                let pi_ty = self.mk_pi("x", a, fam);
                let (f, g) = (self.mk_var(2), self.mk_var(1));
                self.mk_eq(pi_ty, f, g)
            };
            let e = self.mk_pi("H", h_dom, body);
            let e = self.mk_pi("g", g_dom, e);
            let e = self.mk_pi("f", f_dom, e);
            let e = self.mk_pi("B", b_dom, e);
            self.mk_pi("A", ty.clone(), e)
        };
        self.declare_const("funext", funext_ty).unwrap();

        // allext : Π (A : Type) (P Q : A -> Bool),
        //          (Π x:A, eq Bool (P x) (Q x))
        //          -> eq Bool (Π x:A, P x) (Π x:A, Q x)
        let allext_ty = {
            let p_dom = {
                let v0 = self.mk_var(0);
                self.mk_arrow(v0, bool_.clone())
            };
            let q_dom = {
                let v1 = self.mk_var(1);
                self.mk_arrow(v1, bool_.clone())
            };
            let h_dom = {
                let a = self.mk_var(2);
                let inner = {
                    let (p, q, x) = (self.mk_var(2), self.mk_var(1), self.mk_var(0));
                    let px = self.mk_app(smallvec![p, x.clone()]);
                    let qx = self.mk_app(smallvec![q, x]);
                    self.mk_eq(bool_.clone(), px, qx)
                };
                self.mk_pi("x", a, inner)
            };
            let body = {
                let a = self.mk_var(3);
                let lhs = {
                    let (p, x) = (self.mk_var(3), self.mk_var(0));
                    let px = self.mk_app(smallvec![p, x]);
                    self.mk_pi("x", a.clone(), px)
                };
                let rhs = {
                    let (q, x) = (self.mk_var(2), self.mk_var(0));
                    let qx = self.mk_app(smallvec![q, x]);
                    self.mk_pi("x", a, qx)
                };
                self.mk_eq(bool_.clone(), lhs, rhs)
            };
            let e = self.mk_pi("H", h_dom, body);
            let e = self.mk_pi("Q", q_dom, e);
            let e = self.mk_pi("P", p_dom, e);
            self.mk_pi("A", ty.clone(), e)
        };
        self.declare_const("allext", allext_ty).unwrap();

        // eta : Π (A : Type) (B : A -> Type) (f : Π x:A, B x),
        //       eq (Π x:A, B x) (λ x:A, f x) f
        let eta_ty = {
            let b_dom = {
                let v0 = self.mk_var(0);
                self.mk_arrow(v0, ty.clone())
            };
            let f_dom = {
                let a = self.mk_var(1);
                let app = {
                    let (b, x) = (self.mk_var(1), self.mk_var(0));
                    self.mk_app(smallvec![b, x])
                };
                self.mk_pi("x", a, app)
            };
            let body = {
                let a = self.mk_var(2);
                let pi_ty = {
                    let (b, x) = (self.mk_var(2), self.mk_var(0));
                    let bx = self.mk_app(smallvec![b, x]);
                    self.mk_pi("x", a.clone(), bx)
                };
                let lam = {
                    let (f, x) = (self.mk_var(1), self.mk_var(0));
                    let fx = self.mk_app(smallvec![f, x]);
                    self.mk_lambda("x", a, fx)
                };
                let f = self.mk_var(0);
                self.mk_eq(pi_ty, lam, f)
            };
            let e = self.mk_pi("f", f_dom, body);
            let e = self.mk_pi("B", b_dom, e);
            self.mk_pi("A", ty.clone(), e)
        };
        self.declare_const("eta", eta_ty).unwrap();

        // eqt_elim : Π (p : Bool), eq Bool p True -> p
        let eqt_elim_ty = {
            let h = {
                let p = self.mk_var(0);
                let t = self.mk_true();
                self.mk_eq(bool_.clone(), p, t)
            };
            let body = self.mk_var(1);
            let e = self.mk_pi("H", h, body);
            self.mk_pi("p", bool_.clone(), e)
        };
        self.declare_const("eqt_elim", eqt_elim_ty).unwrap();

        // eqt_intro : Π (p : Bool), p -> eq Bool p True
        let eqt_intro_ty = {
            let h = self.mk_var(0);
            let body = {
                let p = self.mk_var(1);
                let t = self.mk_true();
                self.mk_eq(bool_.clone(), p, t)
            };
            let e = self.mk_pi("H", h, body);
            self.mk_pi("p", bool_.clone(), e)
        };
        self.declare_const("eqt_intro", eqt_intro_ty).unwrap();

        // eqf_intro : Π (p : Bool), not p -> eq Bool p False
        let eqf_intro_ty = {
            let h = {
                let p = self.mk_var(0);
                self.mk_not(p)
            };
            let body = {
                let p = self.mk_var(1);
                let f = self.mk_false();
                self.mk_eq(bool_.clone(), p, f)
            };
            let e = self.mk_pi("H", h, body);
            self.mk_pi("p", bool_.clone(), e)
        };
        self.declare_const("eqf_intro", eqf_intro_ty).unwrap();

        // trivial : True
        let t = self.mk_true();
        self.declare_const("trivial", t).unwrap();

        self.0.imports.insert(Symbol::from_str("eq"));
    }

    /// Import the heterogeneous-equality theory: `heq` and its proof
    /// constants. Idempotent.
    pub fn import_heq(&mut self) -> Result<()> {
        if self.imported("heq") {
            return Ok(());
        }
        let ty = self.mk_type();
        let bool_ = self.mk_bool();

        // heq : Π (A B : Type), A -> B -> Bool
        let heq_ty = {
            let v1a = self.mk_var(1);
            let v1b = self.mk_var(1);
            let e = self.mk_pi("b", v1b, bool_);
            let e = self.mk_pi("a", v1a, e);
            let e = self.mk_pi("B", ty.clone(), e);
            self.mk_pi("A", ty.clone(), e)
        };
        self.declare_const("heq", heq_ty)?;
        // mark now so `mk_heq` is usable below
        self.0.imports.insert(Symbol::from_str("heq"));

        // to_eq : Π (A : Type) (a b : A), heq A A a b -> eq A a b
        let to_eq_ty = {
            let h = {
                let (a_ty, a, b) = (self.mk_var(2), self.mk_var(1), self.mk_var(0));
                self.mk_heq(a_ty.clone(), a_ty, a, b)?
            };
            let body = {
                let (a_ty, a, b) = (self.mk_var(3), self.mk_var(2), self.mk_var(1));
                self.mk_eq(a_ty, a, b)
            };
            let e = self.mk_pi("H", h, body);
            let v1 = self.mk_var(1);
            let e = self.mk_pi("b", v1, e);
            let v0 = self.mk_var(0);
            let e = self.mk_pi("a", v0, e);
            self.mk_pi("A", ty.clone(), e)
        };
        self.declare_const("to_eq", to_eq_ty)?;

        // to_heq : Π (A : Type) (a b : A), eq A a b -> heq A A a b
        let to_heq_ty = {
            let h = {
                let (a_ty, a, b) = (self.mk_var(2), self.mk_var(1), self.mk_var(0));
                self.mk_eq(a_ty, a, b)
            };
            let body = {
                let (a_ty, a, b) = (self.mk_var(3), self.mk_var(2), self.mk_var(1));
                self.mk_heq(a_ty.clone(), a_ty, a, b)?
            };
            let e = self.mk_pi("H", h, body);
            let v1 = self.mk_var(1);
            let e = self.mk_pi("b", v1, e);
            let v0 = self.mk_var(0);
            let e = self.mk_pi("a", v0, e);
            self.mk_pi("A", ty.clone(), e)
        };
        self.declare_const("to_heq", to_heq_ty)?;

        // hrefl : Π (A : Type) (a : A), heq A A a a
        let hrefl_ty = {
            let body = {
                let (a_ty, a) = (self.mk_var(1), self.mk_var(0));
                self.mk_heq(a_ty.clone(), a_ty, a.clone(), a)?
            };
            let v0 = self.mk_var(0);
            let e = self.mk_pi("a", v0, body);
            self.mk_pi("A", ty.clone(), e)
        };
        self.declare_const("hrefl", hrefl_ty)?;

        // htrans : Π (A B C : Type) (a : A) (b : B) (c : C),
        //          heq A B a b -> heq B C b c -> heq A C a c
        let htrans_ty = {
            let h2 = {
                let (b_ty, c_ty, b, c) = (
                    self.mk_var(5),
                    self.mk_var(4),
                    self.mk_var(2),
                    self.mk_var(1),
                );
                self.mk_heq(b_ty, c_ty, b, c)?
            };
            let h1 = {
                let (a_ty, b_ty, a, b) = (
                    self.mk_var(5),
                    self.mk_var(4),
                    self.mk_var(2),
                    self.mk_var(1),
                );
                self.mk_heq(a_ty, b_ty, a, b)?
            };
            let body = {
                let (a_ty, c_ty, a, c) = (
                    self.mk_var(7),
                    self.mk_var(5),
                    self.mk_var(4),
                    self.mk_var(2),
                );
                self.mk_heq(a_ty, c_ty, a, c)?
            };
            let e = self.mk_pi("H2", h2, body);
            let e = self.mk_pi("H1", h1, e);
            let v2 = self.mk_var(2);
            let e = self.mk_pi("c", v2, e);
            let v2 = self.mk_var(2);
            let e = self.mk_pi("b", v2, e);
            let v2 = self.mk_var(2);
            let e = self.mk_pi("a", v2, e);
            let e = self.mk_pi("C", ty.clone(), e);
            let e = self.mk_pi("B", ty.clone(), e);
            self.mk_pi("A", ty.clone(), e)
        };
        self.declare_const("htrans", htrans_ty)?;

        // hcongr : Π (A A' : Type) (B : A -> Type) (B' : A' -> Type)
        //            (f : Π x:A, B x) (f' : Π x:A', B' x) (a : A) (a' : A'),
        //          heq (Π x:A, B x) (Π x:A', B' x) f f' -> heq A A' a a'
        //          -> heq (B a) (B' a') (f a) (f' a')
        let hcongr_ty = {
            let b_dom = {
                let v1 = self.mk_var(1);
                self.mk_arrow(v1, ty.clone())
            };
            let b2_dom = {
                let v1 = self.mk_var(1);
                self.mk_arrow(v1, ty.clone())
            };
            let f_dom = {
                let a = self.mk_var(3);
                let bx = {
                    let (b, x) = (self.mk_var(2), self.mk_var(0));
                    self.mk_app(smallvec![b, x])
                };
                self.mk_pi("x", a, bx)
            };
            let f2_dom = {
                let a2 = self.mk_var(3);
                let bx = {
                    let (b2, x) = (self.mk_var(2), self.mk_var(0));
                    self.mk_app(smallvec![b2, x])
                };
                self.mk_pi("x", a2, bx)
            };
            let h1 = {
                let ty_l = {
                    let a = self.mk_var(7);
                    let bx = {
                        let (b, x) = (self.mk_var(6), self.mk_var(0));
                        self.mk_app(smallvec![b, x])
                    };
                    self.mk_pi("x", a, bx)
                };
                let ty_r = {
                    let a2 = self.mk_var(6);
                    let bx = {
                        let (b2, x) = (self.mk_var(5), self.mk_var(0));
                        self.mk_app(smallvec![b2, x])
                    };
                    self.mk_pi("x", a2, bx)
                };
                let (f, f2) = (self.mk_var(3), self.mk_var(2));
                self.mk_heq(ty_l, ty_r, f, f2)?
            };
            let h2 = {
                let (a_ty, a2_ty, a, a2) = (
                    self.mk_var(8),
                    self.mk_var(7),
                    self.mk_var(2),
                    self.mk_var(1),
                );
                self.mk_heq(a_ty, a2_ty, a, a2)?
            };
            let body = {
                let (b, b2, f, f2, a, a2) = (
                    self.mk_var(7),
                    self.mk_var(6),
                    self.mk_var(5),
                    self.mk_var(4),
                    self.mk_var(3),
                    self.mk_var(2),
                );
                let ba = self.mk_app(smallvec![b, a.clone()]);
                let b2a2 = self.mk_app(smallvec![b2, a2.clone()]);
                let fa = self.mk_app(smallvec![f, a]);
                let f2a2 = self.mk_app(smallvec![f2, a2]);
                self.mk_heq(ba, b2a2, fa, f2a2)?
            };
            let e = self.mk_pi("H2", h2, body);
            let e = self.mk_pi("H1", h1, e);
            let v5 = self.mk_var(5);
            let e = self.mk_pi("a'", v5, e);
            let v5 = self.mk_var(5);
            let e = self.mk_pi("a", v5, e);
            let e = self.mk_pi("f'", f2_dom, e);
            let e = self.mk_pi("f", f_dom, e);
            let e = self.mk_pi("B'", b2_dom, e);
            let e = self.mk_pi("B", b_dom, e);
            let e = self.mk_pi("A'", ty.clone(), e);
            self.mk_pi("A", ty.clone(), e)
        };
        self.declare_const("hcongr", hcongr_ty)?;

        Ok(())
    }

    /// Import the cast theory: `cast` and `cast_heq`.
    /// Imports `heq` if it was not imported yet. Idempotent.
    pub fn import_cast(&mut self) -> Result<()> {
        if self.imported("cast") {
            return Ok(());
        }
        self.import_heq()?;
        let ty = self.mk_type();

        // cast : Π (A B : Type), eq Type A B -> A -> B
        let cast_ty = {
            let h = {
                let (a, b) = (self.mk_var(1), self.mk_var(0));
                self.mk_eq(ty.clone(), a, b)
            };
            let body = self.mk_var(2);
            let v2 = self.mk_var(2);
            let e = self.mk_pi("a", v2, body);
            let e = self.mk_pi("H", h, e);
            let e = self.mk_pi("B", ty.clone(), e);
            self.mk_pi("A", ty.clone(), e)
        };
        let c_cast = self.declare_const("cast", cast_ty)?;

        // cast_heq : Π (A B : Type) (H : eq Type A B) (a : A),
        //            heq B A (cast A B H a) a
        let cast_heq_ty = {
            let h = {
                let (a, b) = (self.mk_var(1), self.mk_var(0));
                self.mk_eq(ty.clone(), a, b)
            };
            let body = {
                let (a_ty, b_ty, h, a) = (
                    self.mk_var(3),
                    self.mk_var(2),
                    self.mk_var(1),
                    self.mk_var(0),
                );
                let cast_app =
                    self.mk_app(smallvec![c_cast.clone(), a_ty.clone(), b_ty.clone(), h, a.clone()]);
                self.mk_heq(b_ty, a_ty, cast_app, a)?
            };
            let v2 = self.mk_var(2);
            let e = self.mk_pi("a", v2, body);
            let e = self.mk_pi("H", h, e);
            let e = self.mk_pi("B", ty.clone(), e);
            self.mk_pi("A", ty.clone(), e)
        };
        self.declare_const("cast_heq", cast_heq_ty)?;

        self.0.imports.insert(Symbol::from_str("cast"));
        Ok(())
    }
}

mod impls {
    use super::*;
    use std::fmt;

    impl std::default::Default for Ctx {
        fn default() -> Self {
            Ctx::new()
        }
    }

    impl fmt::Debug for Ctx {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "<expression context>")
        }
    }
}
