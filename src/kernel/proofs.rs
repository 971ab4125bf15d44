//! # Equality proof-term builders.
//!
//! Thin constructors applying the proof constants of the imported
//! theories. Argument orders follow the declared axiom types in
//! [`Ctx`]; builders fail when the constant's theory has not been
//! imported.

use super::{Ctx, Expr, Type};
use crate::error::Result;
use crate::errorstr;

impl Ctx {
    fn proof_const(&mut self, name: &'static str) -> Result<Expr> {
        if self.find_object(name).is_none() {
            return Err(errorstr!("proof constant `{}` is not available", name));
        }
        Ok(self.mk_const(name))
    }

    /// `refl A a : eq A a a`
    pub fn mk_refl_th(&mut self, a_ty: Type, a: Expr) -> Result<Expr> {
        let c = self.proof_const("refl")?;
        Ok(self.mk_app_l(&c, &[a_ty, a]))
    }

    /// `trans A a b c H1 H2 : eq A a c`
    pub fn mk_trans_th(
        &mut self,
        a_ty: Type,
        a: Expr,
        b: Expr,
        c: Expr,
        h1: Expr,
        h2: Expr,
    ) -> Result<Expr> {
        let th = self.proof_const("trans")?;
        Ok(self.mk_app_l(&th, &[a_ty, a, b, c, h1, h2]))
    }

    /// `subst A a b P H1 H2 : P b`
    pub fn mk_subst_th(
        &mut self,
        a_ty: Type,
        a: Expr,
        b: Expr,
        pred: Expr,
        h_pa: Expr,
        h_ab: Expr,
    ) -> Result<Expr> {
        let th = self.proof_const("subst")?;
        Ok(self.mk_app_l(&th, &[a_ty, a, b, pred, h_pa, h_ab]))
    }

    /// `congr1 A B f g a H : eq B (f a) (g a)`
    pub fn mk_congr1_base_th(
        &mut self,
        a_ty: Type,
        b_ty: Type,
        f: Expr,
        g: Expr,
        a: Expr,
        h: Expr,
    ) -> Result<Expr> {
        let th = self.proof_const("congr1")?;
        Ok(self.mk_app_l(&th, &[a_ty, b_ty, f, g, a, h]))
    }

    /// `congr2 A B f a b H : eq B (f a) (f b)`
    pub fn mk_congr2_base_th(
        &mut self,
        a_ty: Type,
        b_ty: Type,
        f: Expr,
        a: Expr,
        b: Expr,
        h: Expr,
    ) -> Result<Expr> {
        let th = self.proof_const("congr2")?;
        Ok(self.mk_app_l(&th, &[a_ty, b_ty, f, a, b, h]))
    }

    /// `congr A B f g a b Hf Ha : eq B (f a) (g b)`
    pub fn mk_congr_base_th(
        &mut self,
        a_ty: Type,
        b_ty: Type,
        f: Expr,
        g: Expr,
        a: Expr,
        b: Expr,
        hf: Expr,
        ha: Expr,
    ) -> Result<Expr> {
        let th = self.proof_const("congr")?;
        Ok(self.mk_app_l(&th, &[a_ty, b_ty, f, g, a, b, hf, ha]))
    }

    /// `funext A B f g H : eq (Π x:A, B x) f g`
    pub fn mk_funext_th(
        &mut self,
        a_ty: Type,
        b_fam: Expr,
        f: Expr,
        g: Expr,
        h: Expr,
    ) -> Result<Expr> {
        let th = self.proof_const("funext")?;
        Ok(self.mk_app_l(&th, &[a_ty, b_fam, f, g, h]))
    }

    /// `allext A P Q H : eq Bool (Π x:A, P x) (Π x:A, Q x)`
    pub fn mk_allext_th(&mut self, a_ty: Type, p: Expr, q: Expr, h: Expr) -> Result<Expr> {
        let th = self.proof_const("allext")?;
        Ok(self.mk_app_l(&th, &[a_ty, p, q, h]))
    }

    /// `eta A B f : eq (Π x:A, B x) (λ x:A, f x) f`
    pub fn mk_eta_th(&mut self, a_ty: Type, b_fam: Expr, f: Expr) -> Result<Expr> {
        let th = self.proof_const("eta")?;
        Ok(self.mk_app_l(&th, &[a_ty, b_fam, f]))
    }

    /// `eqt_elim p H : p`
    pub fn mk_eqt_elim_th(&mut self, p: Expr, h: Expr) -> Result<Expr> {
        let th = self.proof_const("eqt_elim")?;
        Ok(self.mk_app_l(&th, &[p, h]))
    }

    /// `eqt_intro p H : eq Bool p True`
    pub fn mk_eqt_intro_th(&mut self, p: Expr, h: Expr) -> Result<Expr> {
        let th = self.proof_const("eqt_intro")?;
        Ok(self.mk_app_l(&th, &[p, h]))
    }

    /// `eqf_intro p H : eq Bool p False`
    pub fn mk_eqf_intro_th(&mut self, p: Expr, h: Expr) -> Result<Expr> {
        let th = self.proof_const("eqf_intro")?;
        Ok(self.mk_app_l(&th, &[p, h]))
    }

    /// `trivial : True`
    pub fn mk_trivial_th(&mut self) -> Result<Expr> {
        self.proof_const("trivial")
    }

    /// `hrefl A a : heq A A a a`
    pub fn mk_hrefl_th(&mut self, a_ty: Type, a: Expr) -> Result<Expr> {
        let th = self.proof_const("hrefl")?;
        Ok(self.mk_app_l(&th, &[a_ty, a]))
    }

    /// `htrans A B C a b c H1 H2 : heq A C a c`
    #[allow(clippy::too_many_arguments)]
    pub fn mk_htrans_th(
        &mut self,
        a_ty: Type,
        b_ty: Type,
        c_ty: Type,
        a: Expr,
        b: Expr,
        c: Expr,
        h1: Expr,
        h2: Expr,
    ) -> Result<Expr> {
        let th = self.proof_const("htrans")?;
        Ok(self.mk_app_l(&th, &[a_ty, b_ty, c_ty, a, b, c, h1, h2]))
    }

    /// `to_eq A a b H : eq A a b` from `H : heq A A a b`
    pub fn mk_to_eq_th(&mut self, a_ty: Type, a: Expr, b: Expr, h: Expr) -> Result<Expr> {
        let th = self.proof_const("to_eq")?;
        Ok(self.mk_app_l(&th, &[a_ty, a, b, h]))
    }

    /// `to_heq A a b H : heq A A a b` from `H : eq A a b`
    pub fn mk_to_heq_th(&mut self, a_ty: Type, a: Expr, b: Expr, h: Expr) -> Result<Expr> {
        let th = self.proof_const("to_heq")?;
        Ok(self.mk_app_l(&th, &[a_ty, a, b, h]))
    }

    /// `hcongr A A' B B' f f' a a' Hf Ha : heq (B a) (B' a') (f a) (f' a')`
    #[allow(clippy::too_many_arguments)]
    pub fn mk_hcongr_base_th(
        &mut self,
        a_ty: Type,
        new_a_ty: Type,
        b_fam: Expr,
        new_b_fam: Expr,
        f: Expr,
        new_f: Expr,
        a: Expr,
        new_a: Expr,
        hf: Expr,
        ha: Expr,
    ) -> Result<Expr> {
        let th = self.proof_const("hcongr")?;
        Ok(self.mk_app_l(
            &th,
            &[a_ty, new_a_ty, b_fam, new_b_fam, f, new_f, a, new_a, hf, ha],
        ))
    }

    /// `cast_heq A B H a : heq B A (cast A B H a) a`
    pub fn mk_cast_heq_th(&mut self, a_ty: Type, b_ty: Type, h: Expr, a: Expr) -> Result<Expr> {
        let th = self.proof_const("cast_heq")?;
        Ok(self.mk_app_l(&th, &[a_ty, b_ty, h, a]))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kernel::tc::{infer_type, Locals};

    #[test]
    fn test_refl_type_checks() {
        let mut ctx = Ctx::new();
        let ty = ctx.mk_type();
        let nat = ctx.declare_const("Nat", ty).unwrap();
        let x = ctx.declare_const("x", nat.clone()).unwrap();
        let pr = ctx.mk_refl_th(nat.clone(), x.clone()).unwrap();
        let got = infer_type(&mut ctx, &Locals::new(), &pr).unwrap();
        let expect = ctx.mk_eq(nat, x.clone(), x);
        assert_eq!(got, expect);
    }

    #[test]
    fn test_heq_builders_need_import() {
        let mut ctx = Ctx::new();
        let b = ctx.mk_bool();
        let t = ctx.mk_true();
        assert!(ctx.mk_hrefl_th(b.clone(), t.clone()).is_err());
        ctx.import_heq().unwrap();
        assert!(ctx.mk_hrefl_th(b, t).is_ok());
    }
}
