//! # Type checker.
//!
//! Type inference and definitional equality for the expression language.
//! Unlike simply-typed settings, the type of a bound variable comes from
//! the local binder stack, so inference threads a [`Locals`] context.
//!
//! Definitional equality is normalize-and-compare: beta, let-inlining,
//! unfolding of non-opaque definitions and builtin evaluation, with
//! optional eta contraction. Recursive definitions must be declared
//! opaque.

use super::expr::DbIndex;
use super::symbol::Symbol;
use super::{Ctx, Expr, Exprs, Type};
use crate::error::Result;
use crate::errorstr;
use crate::kernel::ExprView::*;
use smallvec::smallvec;

/// Local typing context: an ordered stack of `(name, type)` entries,
/// innermost binder last.
#[derive(Clone, Default, Debug)]
pub struct Locals {
    entries: Vec<(Symbol, Type)>,
}

impl Locals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Enter a binder.
    pub fn push(&mut self, name: Symbol, ty: Type) {
        self.entries.push((name, ty));
    }

    /// Leave the innermost binder.
    pub fn pop(&mut self) {
        self.entries.pop();
    }

    /// Type of `Var(idx)`, shifted to the current depth.
    pub fn var_ty(&self, ctx: &mut Ctx, idx: DbIndex) -> Result<Expr> {
        let i = idx as usize;
        if i >= self.entries.len() {
            return Err(errorstr!("unbound variable #{}", idx));
        }
        let ty = self.entries[self.entries.len() - 1 - i].1.clone();
        Ok(ctx.lift(&ty, idx + 1))
    }
}

/// Infer the type of `e` in the given local context.
pub fn infer_type(ctx: &mut Ctx, locals: &Locals, e: &Expr) -> Result<Expr> {
    let mut tc = TypeChecker {
        ctx,
        locals: locals.clone(),
    };
    tc.infer(e)
}

/// Is `e` a proposition, i.e. does it have type `Bool`?
pub fn is_proposition(ctx: &mut Ctx, locals: &Locals, e: &Expr) -> Result<bool> {
    let ty = infer_type(ctx, locals, e)?;
    let ty = whnf(ctx, &ty)?;
    Ok(ty == ctx.mk_bool())
}

/// Reduce `ty` until it is a dependent product; fail otherwise.
pub fn ensure_pi(ctx: &mut Ctx, ty: &Expr) -> Result<Expr> {
    let ty = whnf(ctx, ty)?;
    match ty.as_pi() {
        Some(..) => Ok(ty),
        None => Err(errorstr!("expected a Pi type, got `{}`", ty)),
    }
}

/// Are `a` and `b` definitionally equal?
pub fn is_def_eq(ctx: &mut Ctx, a: &Expr, b: &Expr) -> Result<bool> {
    if a == b {
        return Ok(true);
    }
    let na = normalize(ctx, a, true)?;
    let nb = normalize(ctx, b, true)?;
    Ok(na == nb)
}

/// Is `a` convertible to `b`? Definitional equality, plus the
/// `Bool <= Type` cumulativity step.
pub fn is_convertible(ctx: &mut Ctx, a: &Expr, b: &Expr) -> Result<bool> {
    if is_def_eq(ctx, a, b)? {
        return Ok(true);
    }
    let na = normalize(ctx, a, true)?;
    let nb = normalize(ctx, b, true)?;
    Ok(na == ctx.mk_bool() && nb.is_type())
}

struct TypeChecker<'a> {
    ctx: &'a mut Ctx,
    locals: Locals,
}

impl<'a> TypeChecker<'a> {
    fn infer(&mut self, e: &Expr) -> Result<Expr> {
        self.ctx.check_uid_(e);
        Ok(match e.view() {
            EType => self.ctx.mk_type(),
            EVar(idx) => self.locals.var_ty(self.ctx, *idx)?,
            EConst(name) => match self.ctx.find_object(name.name()) {
                Some(obj) => obj.ty.clone(),
                None => return Err(errorstr!("unknown constant `{}`", name)),
            },
            EMeta(name) => {
                return Err(errorstr!("cannot infer the type of metavariable ?{}", name))
            }
            EValue(v) => v.ty.clone(),
            EApp(args) => {
                let args = args.clone();
                let mut ty = self.infer(&args[0])?;
                for a in &args[1..] {
                    ty = ensure_pi(self.ctx, &ty)?;
                    let body = match ty.as_pi() {
                        Some((_, _, body)) => body.clone(),
                        None => unreachable!(),
                    };
                    ty = self.ctx.instantiate(&body, a);
                }
                ty
            }
            ELambda(name, ty, body) => {
                let (name, ty, body) = (name.clone(), ty.clone(), body.clone());
                self.locals.push(name.clone(), ty.clone());
                let body_ty = self.infer(&body);
                self.locals.pop();
                self.ctx.mk_pi(name, ty, body_ty?)
            }
            EPi(name, ty, body) => {
                let (name, ty, body) = (name.clone(), ty.clone(), body.clone());
                self.locals.push(name, ty);
                let body_sort = self.infer(&body);
                self.locals.pop();
                let body_sort = whnf(self.ctx, &body_sort?)?;
                // a product into a proposition is a proposition
                if body_sort == self.ctx.mk_bool() {
                    self.ctx.mk_bool()
                } else {
                    self.ctx.mk_type()
                }
            }
            ELet(_, _, v, body) => {
                let (v, body) = (v.clone(), body.clone());
                let inlined = self.ctx.instantiate(&body, &v);
                self.infer(&inlined)?
            }
        })
    }
}

/// Weak head normal form: beta, let-inlining, unfolding of non-opaque
/// definitions, builtin evaluation, and literal `eq`/`neq`/`heq`
/// decisions at the head.
pub fn whnf(ctx: &mut Ctx, e: &Expr) -> Result<Expr> {
    let mut e = e.clone();
    loop {
        match e.view() {
            ELet(_, _, v, body) => {
                let (v, body) = (v.clone(), body.clone());
                e = ctx.instantiate(&body, &v);
            }
            EConst(name) => {
                let value = match ctx.find_object(name.name()) {
                    Some(obj) if obj.should_unfold() => obj.value.clone(),
                    _ => None,
                };
                match value {
                    Some(v) => e = v,
                    None => break,
                }
            }
            EApp(args) => {
                let head = &args[0];
                if head.as_lambda().is_some() {
                    e = ctx.head_beta_reduce(&e);
                    continue;
                }
                let name = match head.as_const() {
                    Some(s) => s.clone(),
                    None => break,
                };
                let args = args.clone();
                if let Some(r) = step_const_app(ctx, &name, &args)? {
                    e = r;
                    continue;
                }
                break;
            }
            _ => break,
        }
    }
    Ok(e)
}

// one head step of an application whose head is the constant `name`,
// or `None` if stuck
fn step_const_app(ctx: &mut Ctx, name: &Symbol, args: &Exprs) -> Result<Option<Expr>> {
    // literal decision of the equality connectives
    match name.name() {
        "eq" | "neq" if args.len() == 4 => {
            if let (Some(a), Some(b)) = (args[2].as_value(), args[3].as_value()) {
                let holds = (a == b) == (name.name() == "eq");
                return Ok(Some(if holds { ctx.mk_true() } else { ctx.mk_false() }));
            }
        }
        "heq" if args.len() == 5 => {
            if let (Some(a), Some(b)) = (args[3].as_value(), args[4].as_value()) {
                return Ok(Some(if a == b { ctx.mk_true() } else { ctx.mk_false() }));
            }
        }
        _ => {}
    }
    let (unfold, builtin) = match ctx.find_object(name.name()) {
        Some(obj) => (
            if obj.should_unfold() { obj.value.clone() } else { None },
            obj.builtin,
        ),
        None => (None, None),
    };
    if let Some(v) = unfold {
        let mut new_args: Exprs = smallvec![v];
        new_args.extend(args[1..].iter().cloned());
        return Ok(Some(ctx.mk_app(new_args)));
    }
    if let Some(f) = builtin {
        let mut vals = Vec::with_capacity(args.len() - 1);
        for a in &args[1..] {
            match a.as_value() {
                Some(v) => vals.push(v.clone()),
                None => return Ok(None),
            }
        }
        if let Some(v) = f(&vals) {
            return Ok(Some(ctx.mk_value(v)));
        }
    }
    Ok(None)
}

/// Full normalization. With `eta`, lambdas are eta-contracted.
pub fn normalize(ctx: &mut Ctx, e: &Expr, eta: bool) -> Result<Expr> {
    let e = whnf(ctx, e)?;
    Ok(match e.view() {
        EType | EVar(..) | EConst(..) | EMeta(..) | EValue(..) => e.clone(),
        EApp(args) => {
            let args = args.clone();
            let mut new_args: Exprs = smallvec![];
            for a in args.iter() {
                new_args.push(normalize(ctx, a, eta)?);
            }
            let rebuilt = ctx.mk_app(new_args);
            if rebuilt != e {
                // normalizing the arguments may expose new head redexes
                normalize(ctx, &rebuilt, eta)?
            } else {
                e
            }
        }
        ELambda(name, ty, body) => {
            let (name, ty, body) = (name.clone(), ty.clone(), body.clone());
            let ty2 = normalize(ctx, &ty, eta)?;
            let body2 = normalize(ctx, &body, eta)?;
            let lam = ctx.mk_lambda(name, ty2, body2);
            if eta {
                eta_contract(ctx, &lam)?
            } else {
                lam
            }
        }
        EPi(name, ty, body) => {
            let (name, ty, body) = (name.clone(), ty.clone(), body.clone());
            let ty2 = normalize(ctx, &ty, eta)?;
            let body2 = normalize(ctx, &body, eta)?;
            ctx.mk_pi(name, ty2, body2)
        }
        ELet(..) => unreachable!("whnf inlines let bindings"),
    })
}

// contract `λ x, f x` to `f` when `x` does not occur in `f`
fn eta_contract(ctx: &mut Ctx, lam: &Expr) -> Result<Expr> {
    let (_, _, body) = match lam.as_lambda() {
        Some(t) => t,
        None => return Ok(lam.clone()),
    };
    let args = match body.as_app() {
        Some(args) => args,
        None => return Ok(lam.clone()),
    };
    let n = args.len();
    let last_is_var0 = args[n - 1].as_var() == Some(0);
    if !last_is_var0 || args[..n - 1].iter().any(|a| a.has_loose_bvar(0)) {
        return Ok(lam.clone());
    }
    let prefix = if n == 2 {
        args[0].clone()
    } else {
        let v: Exprs = args[..n - 1].iter().cloned().collect();
        ctx.mk_app(v)
    };
    ctx.lower_free_vars(&prefix, 1, 1)
}
