//! End-to-end simplifier scenarios.

use certisimp::kernel::tc;
use certisimp::{
    simplify, CongrArg, CongrContext, CongrTheorem, Ctx, Expr, Locals, Options, RewriteRule,
    RewriteRuleSet, SimpConfig, Simplifier, Value, ValueRepr,
};
use std::cell::Cell;
use std::rc::Rc;

fn add_eval(vals: &[Value]) -> Option<Value> {
    match vals {
        [Value {
            ty,
            repr: ValueRepr::Num(a),
        }, Value {
            repr: ValueRepr::Num(b),
            ..
        }] => Some(Value {
            ty: ty.clone(),
            repr: ValueRepr::Num(a + b),
        }),
        _ => None,
    }
}

/// A context with `Nat`, a builtin `add` and two `Nat` constants.
fn setup() -> (Ctx, Expr, Expr, Expr) {
    let mut ctx = Ctx::new();
    let ty = ctx.mk_type();
    let nat = ctx.declare_const("Nat", ty).unwrap();
    let add_ty = {
        let arr = ctx.mk_arrow(nat.clone(), nat.clone());
        ctx.mk_arrow(nat.clone(), arr)
    };
    ctx.declare_builtin("add", add_ty, add_eval).unwrap();
    let a = ctx.declare_const("a", nat.clone()).unwrap();
    let b = ctx.declare_const("b", nat.clone()).unwrap();
    (ctx, nat, a, b)
}

fn num(ctx: &mut Ctx, nat: &Expr, n: i64) -> Expr {
    ctx.mk_num(nat.clone(), n)
}

/// `Π x:Nat, add x 0 = x`, proved by an axiom constant.
fn add_zero_rule(ctx: &mut Ctx, nat: &Expr) -> RewriteRule {
    let add = ctx.mk_const("add");
    let ceq = {
        let v0 = ctx.mk_var(0);
        let zero = ctx.mk_num(nat.clone(), 0);
        let lhs = ctx.mk_app_l(&add, &[v0.clone(), zero]);
        let body = ctx.mk_eq(nat.clone(), lhs, v0);
        ctx.mk_pi("x", nat.clone(), body)
    };
    let pr = ctx.declare_const("add_zero", ceq.clone()).unwrap();
    RewriteRule::new("add_zero", &ceq, pr).unwrap()
}

// the proof must establish the equality of input and output
fn check_proof(ctx: &mut Ctx, input: &Expr, out: &Expr, proof: &Expr) {
    let got = tc::infer_type(ctx, &Locals::new(), proof).unwrap();
    let in_ty = tc::infer_type(ctx, &Locals::new(), input).unwrap();
    let expect = ctx.mk_eq(in_ty, input.clone(), out.clone());
    assert!(
        tc::is_def_eq(ctx, &got, &expect).unwrap(),
        "proof proves `{}`, expected `{}`",
        got,
        expect
    );
}

#[test]
fn test_beta_reduction() {
    let (mut ctx, nat, _, _) = setup();
    let five = num(&mut ctx, &nat, 5);
    let id = {
        let v0 = ctx.mk_var(0);
        ctx.mk_lambda("x", nat.clone(), v0)
    };
    let e = ctx.mk_app_l(&id, &[five.clone()]);

    let (out, pr) = simplify(&mut ctx, &e, &Locals::new(), &Options::new(), &[]).unwrap();
    assert_eq!(out, five);
    let refl = ctx.mk_refl_th(nat.clone(), five.clone()).unwrap();
    assert_eq!(pr, refl);

    // with beta disabled the redex survives
    let mut opts = Options::new();
    opts.set_bool("simplifier.beta", false);
    let (out, _) = simplify(&mut ctx, &e, &Locals::new(), &opts, &[]).unwrap();
    assert_eq!(out, e);
}

#[test]
fn test_evaluation() {
    let (mut ctx, nat, _, _) = setup();
    let add = ctx.mk_const("add");
    let two = num(&mut ctx, &nat, 2);
    let three = num(&mut ctx, &nat, 3);
    let e = ctx.mk_app_l(&add, &[two, three]);

    let (out, pr) = simplify(&mut ctx, &e, &Locals::new(), &Options::new(), &[]).unwrap();
    let five = num(&mut ctx, &nat, 5);
    assert_eq!(out, five);
    // the step is definitional, so the proof is reflexivity
    let refl = ctx.mk_refl_th(nat, five).unwrap();
    assert_eq!(pr, refl);

    // with eval disabled nothing happens
    let mut opts = Options::new();
    opts.set_bool("simplifier.eval", false);
    let (out, _) = simplify(&mut ctx, &e, &Locals::new(), &opts, &[]).unwrap();
    assert_eq!(out, e);
}

#[test]
fn test_simple_rewrite() {
    let (mut ctx, nat, a, _) = setup();
    let rule = add_zero_rule(&mut ctx, &nat);
    let mut rs = RewriteRuleSet::new();
    rs.add_rule(rule);

    let add = ctx.mk_const("add");
    let zero = num(&mut ctx, &nat, 0);
    let e = ctx.mk_app_l(&add, &[a.clone(), zero]);
    let (out, pr) = simplify(&mut ctx, &e, &Locals::new(), &Options::new(), &[rs]).unwrap();
    assert_eq!(out, a);
    // the proof is the rule's proof term, instantiated
    let add_zero = ctx.mk_const("add_zero");
    let expect = ctx.mk_app_l(&add_zero, &[a.clone()]);
    assert_eq!(pr, expect);
    check_proof(&mut ctx, &e, &out, &pr);
}

#[test]
fn test_conditional_rewrite() {
    let (mut ctx, nat, _, _) = setup();
    let arr = ctx.mk_arrow(nat.clone(), nat.clone());
    let binop = ctx.mk_arrow(nat.clone(), arr);
    let div = ctx.declare_const("div", binop.clone()).unwrap();
    let mul = ctx.declare_const("mul", binop).unwrap();
    let y = ctx.declare_const("y", nat.clone()).unwrap();

    // Π (n m : Nat), not (n = 0) -> div (mul n m) n = m
    let ceq = {
        let zero = num(&mut ctx, &nat, 0);
        let premise = {
            let v1 = ctx.mk_var(1);
            let eq0 = ctx.mk_eq(nat.clone(), v1, zero.clone());
            ctx.mk_not(eq0)
        };
        let body = {
            let (n, m) = (ctx.mk_var(2), ctx.mk_var(1));
            let nm = ctx.mk_app_l(&mul, &[n.clone(), m.clone()]);
            let lhs = ctx.mk_app_l(&div, &[nm, n]);
            ctx.mk_eq(nat.clone(), lhs, m)
        };
        let pi_h = ctx.mk_pi("H", premise, body);
        let pi_m = ctx.mk_pi("m", nat.clone(), pi_h);
        ctx.mk_pi("n", nat.clone(), pi_m)
    };
    let pr_c = ctx.declare_const("div_mul_cancel", ceq.clone()).unwrap();
    let rule = RewriteRule::new("div_mul_cancel", &ceq, pr_c).unwrap();

    // not False = True, to close the premise after evaluation
    let nf_eq = {
        let f = ctx.mk_false();
        let nf = ctx.mk_not(f);
        let t = ctx.mk_true();
        ctx.mk_eq(ctx.mk_bool(), nf, t)
    };
    let pr_nf = ctx.declare_const("not_false", nf_eq.clone()).unwrap();
    let nf_rule = RewriteRule::new("not_false", &nf_eq, pr_nf).unwrap();

    let mut rs = RewriteRuleSet::new();
    rs.add_rule(rule);
    rs.add_rule(nf_rule);

    let three = num(&mut ctx, &nat, 3);
    let e = {
        let m3y = ctx.mk_app_l(&mul, &[three.clone(), y.clone()]);
        ctx.mk_app_l(&div, &[m3y, three])
    };
    let (out, pr) =
        simplify(&mut ctx, &e, &Locals::new(), &Options::new(), &[rs.clone()]).unwrap();
    assert_eq!(out, y);
    check_proof(&mut ctx, &e, &out, &pr);

    // with conditional rewriting disabled the rule cannot fire
    let mut opts = Options::new();
    opts.set_bool("simplifier.conditional", false);
    let (out, _) = simplify(&mut ctx, &e, &Locals::new(), &opts, &[rs]).unwrap();
    assert_eq!(out, e);
}

#[test]
fn test_eta() {
    let (mut ctx, nat, _, _) = setup();
    let arr = ctx.mk_arrow(nat.clone(), nat.clone());
    let f = ctx.declare_const("f", arr.clone()).unwrap();
    let e = {
        let v0 = ctx.mk_var(0);
        let fx = ctx.mk_app_l(&f, &[v0]);
        ctx.mk_lambda("x", nat.clone(), fx)
    };
    let (out, pr) = simplify(&mut ctx, &e, &Locals::new(), &Options::new(), &[]).unwrap();
    assert_eq!(out, f);
    let got = tc::infer_type(&mut ctx, &Locals::new(), &pr).unwrap();
    let expect = ctx.mk_eq(arr, e.clone(), f);
    assert!(tc::is_def_eq(&mut ctx, &got, &expect).unwrap());

    // with eta disabled the lambda survives
    let mut opts = Options::new();
    opts.set_bool("simplifier.eta", false);
    let (out, _) = simplify(&mut ctx, &e, &Locals::new(), &opts, &[]).unwrap();
    assert_eq!(out, e);
}

#[test]
fn test_lambda_body_rewrite() {
    let (mut ctx, nat, _, _) = setup();
    let rule = add_zero_rule(&mut ctx, &nat);
    let mut rs = RewriteRuleSet::new();
    rs.add_rule(rule);

    // λ x:Nat, add x 0  ~~>  λ x:Nat, x  via funext
    let add = ctx.mk_const("add");
    let e = {
        let v0 = ctx.mk_var(0);
        let zero = num(&mut ctx, &nat, 0);
        let body = ctx.mk_app_l(&add, &[v0, zero]);
        ctx.mk_lambda("x", nat.clone(), body)
    };
    let (out, pr) = simplify(&mut ctx, &e, &Locals::new(), &Options::new(), &[rs]).unwrap();
    let expect = {
        let v0 = ctx.mk_var(0);
        ctx.mk_lambda("x", nat.clone(), v0)
    };
    assert_eq!(out, expect);
    let got = tc::infer_type(&mut ctx, &Locals::new(), &pr).unwrap();
    let arr = ctx.mk_arrow(nat.clone(), nat.clone());
    let want = ctx.mk_eq(arr, e, out);
    assert!(tc::is_def_eq(&mut ctx, &got, &want).unwrap());
}

#[test]
fn test_pi_body_rewrite() {
    let (mut ctx, nat, _, _) = setup();
    let rule = add_zero_rule(&mut ctx, &nat);
    let mut rs = RewriteRuleSet::new();
    rs.add_rule(rule);

    // Π x:Nat, add x 0 = x  ~~>  Π x:Nat, x = x  via allext
    let add = ctx.mk_const("add");
    let e = {
        let v0 = ctx.mk_var(0);
        let zero = num(&mut ctx, &nat, 0);
        let lhs = ctx.mk_app_l(&add, &[v0.clone(), zero]);
        let body = ctx.mk_eq(nat.clone(), lhs, v0);
        ctx.mk_pi("x", nat.clone(), body)
    };
    let (out, pr) = simplify(&mut ctx, &e, &Locals::new(), &Options::new(), &[rs]).unwrap();
    let expect = {
        let v0 = ctx.mk_var(0);
        let body = ctx.mk_eq(nat.clone(), v0.clone(), v0);
        ctx.mk_pi("x", nat.clone(), body)
    };
    assert_eq!(out, expect);
    let got = tc::infer_type(&mut ctx, &Locals::new(), &pr).unwrap();
    let want = ctx.mk_eq(ctx.mk_bool(), e, out);
    assert!(tc::is_def_eq(&mut ctx, &got, &want).unwrap());
}

#[test]
fn test_congruence_proof_assembly() {
    let (mut ctx, nat, a, _) = setup();
    let rule = add_zero_rule(&mut ctx, &nat);
    let mut rs = RewriteRuleSet::new();
    rs.add_rule(rule);

    // both arguments rewrite: add (add a 0) (add a 0) ~~> add a a
    let add = ctx.mk_const("add");
    let zero = num(&mut ctx, &nat, 0);
    let x = ctx.mk_app_l(&add, &[a.clone(), zero]);
    let e = ctx.mk_app_l(&add, &[x.clone(), x.clone()]);
    let (out, pr) = simplify(&mut ctx, &e, &Locals::new(), &Options::new(), &[rs]).unwrap();
    let expect = ctx.mk_app_l(&add, &[a.clone(), a.clone()]);
    assert_eq!(out, expect);
    check_proof(&mut ctx, &e, &out, &pr);
}

#[test]
fn test_contextual_rewrite() {
    let mut ctx = Ctx::new();
    let ty = ctx.mk_type();
    let bool_ = ctx.mk_bool();
    let tt = ctx.declare_const("T", ty.clone()).unwrap();
    // ite : Π (A : Type), Bool -> A -> A -> A
    let ite = {
        let ite_ty = {
            let v3 = ctx.mk_var(3);
            let v2 = ctx.mk_var(2);
            let v1 = ctx.mk_var(1);
            let e = ctx.mk_pi("b", v2, v3);
            let e = ctx.mk_pi("a", v1, e);
            let e = ctx.mk_pi("p", bool_.clone(), e);
            ctx.mk_pi("A", ty.clone(), e)
        };
        ctx.declare_const("ite", ite_ty).unwrap()
    };
    // if_true : Π (A : Type) (a b : A), ite A True a b = a
    let if_true_ceq = {
        let body = {
            let (a_ty, a, b) = (ctx.mk_var(2), ctx.mk_var(1), ctx.mk_var(0));
            let t = ctx.mk_true();
            let lhs = ctx.mk_app_l(&ite, &[a_ty.clone(), t, a.clone(), b]);
            ctx.mk_eq(a_ty, lhs, a)
        };
        let v1 = ctx.mk_var(1);
        let e = ctx.mk_pi("b", v1, body);
        let v0 = ctx.mk_var(0);
        let e = ctx.mk_pi("a", v0, e);
        ctx.mk_pi("A", ty.clone(), e)
    };
    let if_true_pr = ctx.declare_const("if_true", if_true_ceq.clone()).unwrap();
    let if_true = RewriteRule::new("if_true", &if_true_ceq, if_true_pr).unwrap();

    // if_congr : Π (A : Type) (p1 p2 : Bool) (a1 a2 b1 b2 : A),
    //            p1 = p2 -> (p2 -> a1 = a2) -> (not p2 -> b1 = b2)
    //            -> ite A p1 a1 b1 = ite A p2 a2 b2
    let if_congr_ty = {
        let h1 = {
            let (p1, p2) = (ctx.mk_var(5), ctx.mk_var(4));
            ctx.mk_eq(bool_.clone(), p1, p2)
        };
        let h2 = {
            let p2 = ctx.mk_var(5);
            let (a_ty, a1, a2) = (ctx.mk_var(7), ctx.mk_var(4), ctx.mk_var(3));
            let eq = ctx.mk_eq(a_ty, a1, a2);
            ctx.mk_arrow(p2, eq)
        };
        let h3 = {
            let p2 = ctx.mk_var(6);
            let np2 = ctx.mk_not(p2);
            let (a_ty, b1, b2) = (ctx.mk_var(8), ctx.mk_var(3), ctx.mk_var(2));
            let eq = ctx.mk_eq(a_ty, b1, b2);
            ctx.mk_arrow(np2, eq)
        };
        let body = {
            let a_ty = ctx.mk_var(9);
            let (p1, p2) = (ctx.mk_var(8), ctx.mk_var(7));
            let (a1, a2) = (ctx.mk_var(6), ctx.mk_var(5));
            let (b1, b2) = (ctx.mk_var(4), ctx.mk_var(3));
            let lhs = ctx.mk_app_l(&ite, &[a_ty.clone(), p1, a1, b1]);
            let rhs = ctx.mk_app_l(&ite, &[a_ty.clone(), p2, a2, b2]);
            ctx.mk_eq(a_ty, lhs, rhs)
        };
        let e = ctx.mk_pi("H3", h3, body);
        let e = ctx.mk_pi("H2", h2, e);
        let e = ctx.mk_pi("H1", h1, e);
        let v5 = ctx.mk_var(5);
        let e = ctx.mk_pi("b2", v5, e);
        let v4 = ctx.mk_var(4);
        let e = ctx.mk_pi("b1", v4, e);
        let v3 = ctx.mk_var(3);
        let e = ctx.mk_pi("a2", v3, e);
        let v2 = ctx.mk_var(2);
        let e = ctx.mk_pi("a1", v2, e);
        let e = ctx.mk_pi("p2", bool_.clone(), e);
        let e = ctx.mk_pi("p1", bool_.clone(), e);
        ctx.mk_pi("A", ty.clone(), e)
    };
    let if_congr_pr = ctx.declare_const("if_congr", if_congr_ty).unwrap();
    let congr = CongrTheorem::new(
        ite.clone(),
        if_congr_pr,
        10,
        vec![
            CongrArg {
                arg_pos: 1,
                should_simplify: false,
                context: None,
                pos_at_proof: 0,
                new_pos_at_proof: None,
                proof_pos_at_proof: None,
            },
            CongrArg {
                arg_pos: 2,
                should_simplify: true,
                context: None,
                pos_at_proof: 1,
                new_pos_at_proof: Some(2),
                proof_pos_at_proof: Some(7),
            },
            CongrArg {
                arg_pos: 3,
                should_simplify: true,
                context: Some(CongrContext {
                    arg_pos: 2,
                    use_new_val: true,
                    is_pos_dep: true,
                }),
                pos_at_proof: 3,
                new_pos_at_proof: Some(4),
                proof_pos_at_proof: Some(8),
            },
            CongrArg {
                arg_pos: 4,
                should_simplify: true,
                context: Some(CongrContext {
                    arg_pos: 2,
                    use_new_val: true,
                    is_pos_dep: false,
                }),
                pos_at_proof: 5,
                new_pos_at_proof: Some(6),
                proof_pos_at_proof: Some(9),
            },
        ],
    )
    .unwrap();

    let mut rs = RewriteRuleSet::new();
    rs.add_rule(if_true);
    rs.add_congr(congr);

    let p = ctx.declare_const("p", bool_).unwrap();
    let a = ctx.declare_const("a", tt.clone()).unwrap();
    let b = ctx.declare_const("b", tt.clone()).unwrap();
    let c = ctx.declare_const("c", tt.clone()).unwrap();

    // ite T p (ite T p a b) c  ~~>  ite T p a c
    let inner = ctx.mk_app_l(&ite, &[tt.clone(), p.clone(), a.clone(), b.clone()]);
    let e = ctx.mk_app_l(&ite, &[tt.clone(), p.clone(), inner, c.clone()]);
    let (out, pr) = simplify(&mut ctx, &e, &Locals::new(), &Options::new(), &[rs.clone()]).unwrap();
    let expect = ctx.mk_app_l(&ite, &[tt.clone(), p.clone(), a, c]);
    assert_eq!(out, expect);
    check_proof(&mut ctx, &e, &out, &pr);

    // with contextual rewriting off the hypothesis is never available,
    // so the inner conditional survives
    let mut opts = Options::new();
    opts.set_bool("simplifier.contextual", false);
    let (out, _) = simplify(&mut ctx, &e, &Locals::new(), &opts, &[rs]).unwrap();
    assert_eq!(out, e);
}

#[test]
fn test_cast_erasure() {
    let mut ctx = Ctx::new();
    ctx.import_cast().unwrap();
    let ty = ctx.mk_type();
    let a_ty = ctx.declare_const("A", ty.clone()).unwrap();
    let b_ty = ctx.declare_const("B", ty.clone()).unwrap();
    let h = {
        let eq_ab = ctx.mk_eq(ty, a_ty.clone(), b_ty.clone());
        ctx.declare_const("H", eq_ab).unwrap()
    };
    let a0 = ctx.declare_const("a0", a_ty.clone()).unwrap();
    let a1 = ctx.declare_const("a1", a_ty.clone()).unwrap();

    // rule: a0 = a1
    let fact = ctx.mk_eq(a_ty.clone(), a0.clone(), a1.clone());
    let h01 = ctx.declare_const("h01", fact.clone()).unwrap();
    let mut rs = RewriteRuleSet::new();
    rs.insert(&mut ctx, "h01", &fact, h01).unwrap();

    let cast = ctx.mk_const("cast");
    let e = ctx.mk_app_l(&cast, &[a_ty.clone(), b_ty.clone(), h, a0]);
    let (out, pr) = simplify(&mut ctx, &e, &Locals::new(), &Options::new(), &[rs]).unwrap();
    assert_eq!(out, a1);
    // the proof is heterogeneous: e == a1 at types B and A
    let got = tc::infer_type(&mut ctx, &Locals::new(), &pr).unwrap();
    let want = ctx.mk_heq(b_ty, a_ty, e, a1).unwrap();
    assert!(tc::is_def_eq(&mut ctx, &got, &want).unwrap());
}

#[test]
fn test_heterogeneous_congruence() {
    let mut ctx = Ctx::new();
    ctx.import_heq().unwrap();
    let ty = ctx.mk_type();
    let bool_ = ctx.mk_bool();
    // T : Bool -> Type,  g : Π (b : Bool), T b
    let t_fam = {
        let arr = ctx.mk_arrow(bool_.clone(), ty);
        ctx.declare_const("T", arr).unwrap()
    };
    let g = {
        let g_ty = {
            let v0 = ctx.mk_var(0);
            let tb = ctx.mk_app_l(&t_fam, &[v0]);
            ctx.mk_pi("b", bool_.clone(), tb)
        };
        ctx.declare_const("g", g_ty).unwrap()
    };
    let p = ctx.declare_const("p", bool_).unwrap();
    let hp = ctx.declare_const("hp", p.clone()).unwrap();
    let mut rs = RewriteRuleSet::new();
    // the fact `p` becomes the rule `p = True`
    rs.insert(&mut ctx, "hp", &p, hp).unwrap();

    // g p ~~> g True; the argument's type family forces hcongr
    let e = ctx.mk_app_l(&g, &[p.clone()]);
    let (out, pr) = simplify(&mut ctx, &e, &Locals::new(), &Options::new(), &[rs]).unwrap();
    let t = ctx.mk_true();
    let expect = ctx.mk_app_l(&g, &[t.clone()]);
    assert_eq!(out, expect);
    let got = tc::infer_type(&mut ctx, &Locals::new(), &pr).unwrap();
    let want = {
        let tp = ctx.mk_app_l(&t_fam, &[p]);
        let tt = ctx.mk_app_l(&t_fam, &[t]);
        ctx.mk_heq(tp, tt, e, expect).unwrap()
    };
    assert!(tc::is_def_eq(&mut ctx, &got, &want).unwrap());
}

#[test]
fn test_permutation_guard() {
    let (mut ctx, nat, a, b) = setup();
    let add = ctx.mk_const("add");
    // Π (x y : Nat), add x y = add y x
    let ceq = {
        let body = {
            let (x, y) = (ctx.mk_var(1), ctx.mk_var(0));
            let lhs = ctx.mk_app_l(&add, &[x.clone(), y.clone()]);
            let rhs = ctx.mk_app_l(&add, &[y, x]);
            ctx.mk_eq(nat.clone(), lhs, rhs)
        };
        let pi = ctx.mk_pi("y", nat.clone(), body);
        ctx.mk_pi("x", nat.clone(), pi)
    };
    let pr_c = ctx.declare_const("add_comm", ceq.clone()).unwrap();
    let rule = RewriteRule::new("add_comm", &ceq, pr_c).unwrap();
    assert!(rule.is_permutation());
    let mut rs = RewriteRuleSet::new();
    rs.add_rule(rule);

    // `a` precedes `b` in the term order: add a b is already minimal
    let ab = ctx.mk_app_l(&add, &[a.clone(), b.clone()]);
    let (out, _) = simplify(&mut ctx, &ab, &Locals::new(), &Options::new(), &[rs.clone()]).unwrap();
    assert_eq!(out, ab);

    // add b a rewrites to add a b, and the guard stops the loop
    let ba = ctx.mk_app_l(&add, &[b.clone(), a.clone()]);
    let (out, pr) = simplify(&mut ctx, &ba, &Locals::new(), &Options::new(), &[rs]).unwrap();
    assert_eq!(out, ab);
    check_proof(&mut ctx, &ba, &out, &pr);
}

#[test]
fn test_step_bound() {
    let (mut ctx, nat, a, _) = setup();
    let rule = add_zero_rule(&mut ctx, &nat);
    let mut rs = RewriteRuleSet::new();
    rs.add_rule(rule);

    let add = ctx.mk_const("add");
    let mut e = a;
    for _ in 0..8 {
        let zero = num(&mut ctx, &nat, 0);
        e = ctx.mk_app_l(&add, &[e, zero]);
    }
    let mut opts = Options::new();
    opts.set_unsigned("simplifier.max_steps", 3);
    let err = simplify(&mut ctx, &e, &Locals::new(), &opts, &[rs]).unwrap_err();
    assert!(err.is_exhausted());
}

#[test]
fn test_proof_elision() {
    let (mut ctx, nat, a, _) = setup();
    let rule = add_zero_rule(&mut ctx, &nat);
    let mut rs = RewriteRuleSet::new();
    rs.add_rule(rule);

    let add = ctx.mk_const("add");
    let zero = num(&mut ctx, &nat, 0);
    let e = ctx.mk_app_l(&add, &[a.clone(), zero]);
    let mut opts = Options::new();
    opts.set_bool("simplifier.proofs", false);
    let (out, pr) = simplify(&mut ctx, &e, &Locals::new(), &opts, &[rs]).unwrap();
    assert_eq!(out, a);
    // with proofs disabled the returned proof is syntactically refl
    let refl = ctx.mk_refl_th(nat, a).unwrap();
    assert_eq!(pr, refl);
}

#[test]
fn test_idempotence() {
    let (mut ctx, nat, a, _) = setup();
    let rule = add_zero_rule(&mut ctx, &nat);
    let mut rs = RewriteRuleSet::new();
    rs.add_rule(rule);

    let add = ctx.mk_const("add");
    let zero = num(&mut ctx, &nat, 0);
    let inner = ctx.mk_app_l(&add, &[a.clone(), zero.clone()]);
    let e = ctx.mk_app_l(&add, &[inner, zero]);
    let (out, _) = simplify(&mut ctx, &e, &Locals::new(), &Options::new(), &[rs.clone()]).unwrap();
    assert_eq!(out, a);
    let (out2, pr2) =
        simplify(&mut ctx, &out, &Locals::new(), &Options::new(), &[rs]).unwrap();
    assert_eq!(out2, out);
    let refl = ctx.mk_refl_th(nat, out).unwrap();
    assert_eq!(pr2, refl);
}

#[test]
fn test_single_pass() {
    let (mut ctx, nat, _, _) = setup();
    let c0 = ctx.declare_const("c0", nat.clone()).unwrap();
    let c1 = ctx.declare_const("c1", nat.clone()).unwrap();
    let c2 = ctx.declare_const("c2", nat.clone()).unwrap();
    let mut rs = RewriteRuleSet::new();
    let f01 = ctx.mk_eq(nat.clone(), c0.clone(), c1.clone());
    let h01 = ctx.declare_const("h01", f01.clone()).unwrap();
    rs.insert(&mut ctx, "h01", &f01, h01).unwrap();
    let f12 = ctx.mk_eq(nat.clone(), c1.clone(), c2.clone());
    let h12 = ctx.declare_const("h12", f12.clone()).unwrap();
    rs.insert(&mut ctx, "h12", &f12, h12).unwrap();

    let mut opts = Options::new();
    opts.set_bool("simplifier.single_pass", true);
    let (out, _) = simplify(&mut ctx, &c0, &Locals::new(), &opts, &[rs.clone()]).unwrap();
    assert_eq!(out, c1);

    // multi-pass chains both rules, with a transitivity proof
    let (out, pr) = simplify(&mut ctx, &c0, &Locals::new(), &Options::new(), &[rs]).unwrap();
    assert_eq!(out, c2);
    check_proof(&mut ctx, &c0, &out, &pr);
}

#[test]
fn test_unfold() {
    let (mut ctx, nat, _, _) = setup();
    let add = ctx.mk_const("add");
    // double := λ x:Nat, add x x   (transparent)
    let double = {
        let v0 = ctx.mk_var(0);
        let body = ctx.mk_app_l(&add, &[v0.clone(), v0]);
        let lam = ctx.mk_lambda("x", nat.clone(), body);
        let arr = ctx.mk_arrow(nat.clone(), nat.clone());
        ctx.define("double", arr, lam, false).unwrap()
    };
    let two = num(&mut ctx, &nat, 2);
    let e = ctx.mk_app_l(&double, &[two]);

    // without unfolding, the call is stuck
    let (out, _) = simplify(&mut ctx, &e, &Locals::new(), &Options::new(), &[]).unwrap();
    assert_eq!(out, e);

    let mut opts = Options::new();
    opts.set_bool("simplifier.unfold", true);
    let (out, pr) = simplify(&mut ctx, &e, &Locals::new(), &opts, &[]).unwrap();
    let four = num(&mut ctx, &nat, 4);
    assert_eq!(out, four);
    // unfold + beta + evaluation are all definitional
    let refl = ctx.mk_refl_th(nat, four).unwrap();
    assert_eq!(pr, refl);
}

#[test]
fn test_let_inlining() {
    let (mut ctx, nat, a, _) = setup();
    let add = ctx.mk_const("add");
    // let x := a in add x 0, with the add_zero rule
    let rule = add_zero_rule(&mut ctx, &nat);
    let mut rs = RewriteRuleSet::new();
    rs.add_rule(rule);
    let e = {
        let v0 = ctx.mk_var(0);
        let zero = num(&mut ctx, &nat, 0);
        let body = ctx.mk_app_l(&add, &[v0, zero]);
        ctx.mk_let("x", Some(nat.clone()), a.clone(), body)
    };
    let (out, pr) = simplify(&mut ctx, &e, &Locals::new(), &Options::new(), &[rs]).unwrap();
    assert_eq!(out, a);
    // the let step itself is definitional; the rule proof survives
    let got = tc::infer_type(&mut ctx, &Locals::new(), &pr).unwrap();
    let inlined = {
        let zero = num(&mut ctx, &nat, 0);
        ctx.mk_app_l(&add, &[a.clone(), zero])
    };
    let want = ctx.mk_eq(nat, inlined, a);
    assert!(tc::is_def_eq(&mut ctx, &got, &want).unwrap());
}

#[test]
fn test_simplify_under_locals() {
    let (mut ctx, nat, _, _) = setup();
    let rule = add_zero_rule(&mut ctx, &nat);
    let mut rs = RewriteRuleSet::new();
    rs.add_rule(rule);

    let mut locals = Locals::new();
    locals.push("x".into(), nat.clone());
    let add = ctx.mk_const("add");
    let e = {
        let v0 = ctx.mk_var(0);
        let zero = num(&mut ctx, &nat, 0);
        ctx.mk_app_l(&add, &[v0, zero])
    };
    let (out, pr) = simplify(&mut ctx, &e, &locals, &Options::new(), &[rs]).unwrap();
    assert_eq!(out, ctx.mk_var(0));
    let got = tc::infer_type(&mut ctx, &locals, &pr).unwrap();
    let v0 = ctx.mk_var(0);
    let want = ctx.mk_eq(nat, e, v0);
    assert!(tc::is_def_eq(&mut ctx, &got, &want).unwrap());
}

#[test]
fn test_interruption() {
    let (mut ctx, nat, a, _) = setup();
    let add = ctx.mk_const("add");
    let zero = num(&mut ctx, &nat, 0);
    let e = ctx.mk_app_l(&add, &[a, zero]);
    let flag = Rc::new(Cell::new(true));
    let mut s = Simplifier::new(&mut ctx, SimpConfig::default(), vec![]);
    s.set_interrupt_flag(flag);
    let err = s.run(&e, &Locals::new()).unwrap_err();
    assert!(err.is_interrupted());
}

#[test]
fn test_namespace_resolution() {
    let (mut ctx, nat, a, _) = setup();
    let rule = add_zero_rule(&mut ctx, &nat);
    ctx.rule_set_mut("arith").add_rule(rule);

    let add = ctx.mk_const("add");
    let zero = num(&mut ctx, &nat, 0);
    let e = ctx.mk_app_l(&add, &[a.clone(), zero]);
    let (out, _) = certisimp::simplify_with_namespaces(
        &mut ctx,
        &e,
        &Locals::new(),
        &Options::new(),
        &["arith"],
    )
    .unwrap();
    assert_eq!(out, a);
    assert!(certisimp::simplify_with_namespaces(
        &mut ctx,
        &e,
        &Locals::new(),
        &Options::new(),
        &["nosuch"],
    )
    .is_err());
}

#[test]
fn test_memoization_transparent() {
    let (mut ctx, nat, a, _) = setup();
    let rule = add_zero_rule(&mut ctx, &nat);
    let mut rs = RewriteRuleSet::new();
    rs.add_rule(rule);

    let add = ctx.mk_const("add");
    let zero = num(&mut ctx, &nat, 0);
    let x = ctx.mk_app_l(&add, &[a.clone(), zero]);
    let e = ctx.mk_app_l(&add, &[x.clone(), x]);

    let (out1, _) = simplify(&mut ctx, &e, &Locals::new(), &Options::new(), &[rs.clone()]).unwrap();
    let mut opts = Options::new();
    opts.set_bool("simplifier.memoize", false);
    let (out2, _) = simplify(&mut ctx, &e, &Locals::new(), &opts, &[rs]).unwrap();
    assert_eq!(out1, out2);
}
