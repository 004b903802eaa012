use crate::core::{Prob, ProbDomain, Var, VarSet};
use crate::Error;

use super::utils::assert_close;

#[test]
fn varset_sorts_and_dedups() {
    let x0 = Var::new(0, 2);
    let x3 = Var::new(3, 4);
    let x7 = Var::new(7, 3);
    let set = VarSet::new([x7, x0, x3, x0]);
    assert_eq!(set.len(), 3);
    assert_eq!(set.as_slice(), &[x0, x3, x7]);
    assert_eq!(set.nr_states(), 24);
    assert_eq!(set.to_string(), "{x0, x3, x7}");
}

#[test]
fn varset_algebra() {
    let x0 = Var::new(0, 2);
    let x1 = Var::new(1, 2);
    let x2 = Var::new(2, 2);
    let lhs = VarSet::new([x0, x1]);
    let rhs = VarSet::new([x1, x2]);
    let union = &lhs | &rhs;
    assert_eq!(union.as_slice(), &[x0, x1, x2]);
    assert!(lhs.is_subset_of(&union));
    assert!(!union.is_subset_of(&lhs));
    assert!(rhs.contains(&x2));
    let mut grown = lhs;
    grown.insert(x2);
    grown.insert(x2);
    assert_eq!(grown.as_slice(), &[x0, x1, x2]);
}

#[test]
fn decode_is_mixed_radix_smallest_label_fastest() {
    let set = VarSet::new([Var::new(0, 2), Var::new(1, 3), Var::new(2, 2)]);
    assert_eq!(set.decode(0), vec![0, 0, 0]);
    assert_eq!(set.decode(1), vec![1, 0, 0]);
    assert_eq!(set.decode(2), vec![0, 1, 0]);
    assert_eq!(set.decode(7), vec![1, 0, 1]);
    assert_eq!(set.decode(11), vec![1, 2, 1]);
}

// Every projection entry must agree with the divmod decomposition of
// the joint state.
#[test]
fn projection_consistent_with_decode() {
    let set = VarSet::new([Var::new(0, 2), Var::new(2, 3), Var::new(5, 2), Var::new(9, 4)]);
    let sub = VarSet::new([Var::new(2, 3), Var::new(9, 4)]);
    let index = set.projection(&sub);
    assert_eq!(index.len(), set.nr_states());
    for (s, &t) in index.iter().enumerate() {
        let states = set.decode(s);
        let sub_states = sub.decode(t);
        // set order: x0, x2, x5, x9; sub order: x2, x9
        assert_eq!(sub_states[0], states[1]);
        assert_eq!(sub_states[1], states[3]);
    }
}

#[test]
fn projection_onto_self_and_empty() {
    let set = VarSet::new([Var::new(1, 3), Var::new(4, 2)]);
    let identity = set.projection(&set);
    assert_eq!(identity, (0..6).collect::<Vec<_>>());
    let trivial = set.projection(&VarSet::empty());
    assert!(trivial.iter().all(|&t| t == 0));
}

#[test]
fn prob_normalization_both_domains() {
    let mut p = Prob::from_vec(vec![1f64, 3f64]);
    let norm = p.normalize().unwrap();
    assert_close(norm, 4f64, 1e-12);
    assert_close(p.get(0), 0.25, 1e-12);

    let mut q = Prob::from_vec(vec![1f64, 3f64]);
    q.take_log();
    let log_norm = q.normalize().unwrap();
    assert_close(log_norm, 4f64.ln(), 1e-12);
    q.take_exp();
    assert_close(q.get(1), 0.75, 1e-12);
}

#[test]
fn prob_log_normalization_is_overflow_safe() {
    let mut p = Prob::from_vec(vec![1f64, 1f64]);
    p.take_log();
    p.sub_scalar(-2000f64);
    // raw entries of 2000 overflow a naive exp-sum
    let norm = p.normalize().unwrap();
    assert_close(norm, 2000f64 + 2f64.ln(), 1e-9);
}

#[test]
fn prob_zero_mass_is_not_normalizable() {
    let mut p = Prob::from_vec(vec![0f64, 0f64]);
    assert!(matches!(p.normalize(), Err(Error::NotNormalizable)));
    let mut q = Prob::from_vec(vec![0f64, 0f64]);
    q.take_log();
    assert!(matches!(q.normalize(), Err(Error::NotNormalizable)));
    let mut r = Prob::from_vec(vec![f64::NAN, 1f64]);
    assert!(r.normalize().is_err());
}

#[test]
fn prob_pointwise_ops() {
    let mut p = Prob::from_vec(vec![0.5, 0.25]);
    p.mul_assign(&Prob::from_vec(vec![2f64, 4f64]));
    assert_close(p.get(0), 1f64, 1e-12);
    assert_close(p.get(1), 1f64, 1e-12);

    let quotient = Prob::from_vec(vec![0f64, 1f64]).quotient(&Prob::from_vec(vec![0f64, 2f64]));
    assert_close(quotient.get(0), 0f64, 1e-12);
    assert_close(quotient.get(1), 0.5, 1e-12);

    let mut pow = Prob::from_vec(vec![4f64, 9f64]);
    pow.pow(0.5);
    assert_close(pow.get(1), 3f64, 1e-12);

    let mut log_pow = Prob::from_vec(vec![4f64, 9f64]);
    log_pow.take_log();
    log_pow.pow(0.5);
    log_pow.take_exp();
    assert_close(log_pow.get(0), 2f64, 1e-12);

    assert_close(
        Prob::from_vec(vec![0.1, 0.7]).dist_linf(&Prob::from_vec(vec![0.2, 0.4])),
        0.3,
        1e-12,
    );
}

#[test]
fn prob_entropy_and_kl() {
    let uniform = Prob::uniform(4, ProbDomain::Linear);
    assert_close(uniform.entropy(), 4f64.ln(), 1e-12);
    let point = Prob::from_vec(vec![1f64, 0f64]);
    assert_close(point.entropy(), 0f64, 1e-12);

    let p = Prob::from_vec(vec![0.5, 0.5]);
    assert_close(p.kl_divergence(&p).unwrap(), 0f64, 1e-12);
    // a zero in the reference under positive mass diverges
    let q = Prob::from_vec(vec![1f64, 0f64]);
    assert!(matches!(
        p.kl_divergence(&q),
        Err(Error::NotNormalizable)
    ));
    // both zero is fine
    assert_close(q.kl_divergence(&q).unwrap(), 0f64, 1e-12);
}
