use ndarray::Array1;

use crate::error::{Error, Result};

/// Representation domain of a [`Prob`] vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbDomain {
    /// Entries are non-negative weights
    Linear,
    /// Entries are logarithms of weights
    Log,
}

/// A dense non-negative vector, stored either as weights or as their
/// logarithms
///
/// All pointwise operations require both operands to share length and
/// domain. In the log domain a product becomes a sum, a scalar power
/// becomes a scalar multiply and normalization subtracts the
/// log-sum-exp.
#[derive(Debug, Clone)]
pub struct Prob {
    domain: ProbDomain,
    values: Array1<f64>,
}

impl Prob {
    /// Creates a linear-domain vector from raw weights
    pub fn from_vec(values: Vec<f64>) -> Self {
        Prob {
            domain: ProbDomain::Linear,
            values: Array1::from_vec(values),
        }
    }

    /// Creates the uniform distribution of a given length: `1/n` entries
    /// in the linear domain, zero entries in the log domain
    pub fn uniform(len: usize, domain: ProbDomain) -> Self {
        let fill = match domain {
            ProbDomain::Linear => 1f64 / len as f64,
            ProbDomain::Log => 0f64,
        };
        Prob {
            domain,
            values: Array1::from_elem(len, fill),
        }
    }

    /// Creates the multiplicative identity of a given length: ones in the
    /// linear domain, zeros in the log domain
    pub fn ones(len: usize, domain: ProbDomain) -> Self {
        let fill = match domain {
            ProbDomain::Linear => 1f64,
            ProbDomain::Log => 0f64,
        };
        Prob {
            domain,
            values: Array1::from_elem(len, fill),
        }
    }

    /// Creates the additive identity of a given length (linear domain)
    pub fn zeros(len: usize) -> Self {
        Prob {
            domain: ProbDomain::Linear,
            values: Array1::zeros(len),
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline(always)]
    pub fn domain(&self) -> ProbDomain {
        self.domain
    }

    #[inline(always)]
    pub fn get(&self, i: usize) -> f64 {
        self.values[i]
    }

    #[inline(always)]
    pub fn set(&mut self, i: usize, value: f64) {
        self.values[i] = value;
    }

    /// Returns a view of the raw entries
    #[inline(always)]
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Resets to the uniform distribution in the current domain
    pub fn fill_uniform(&mut self) {
        let fill = match self.domain {
            ProbDomain::Linear => 1f64 / self.len() as f64,
            ProbDomain::Log => 0f64,
        };
        self.values.fill(fill);
    }

    /// Pointwise product with another vector of the same length and domain
    pub fn mul_assign(&mut self, other: &Prob) {
        debug_assert_eq!(self.len(), other.len());
        debug_assert_eq!(self.domain, other.domain);
        match self.domain {
            ProbDomain::Linear => self.values *= &other.values,
            ProbDomain::Log => self.values += &other.values,
        }
    }

    /// Pointwise quotient with the convention `0/0 = 0`
    pub fn quotient(&self, other: &Prob) -> Prob {
        debug_assert_eq!(self.len(), other.len());
        debug_assert_eq!(self.domain, other.domain);
        let pairs = self.values.iter().zip(other.values.iter());
        let values: Vec<f64> = match self.domain {
            ProbDomain::Linear => pairs
                .map(|(&a, &b)| if a == 0f64 && b == 0f64 { 0f64 } else { a / b })
                .collect(),
            // log(0)/log(0) is (-inf) - (-inf); keep it at log(0)
            ProbDomain::Log => pairs
                .map(|(&a, &b)| {
                    if a == f64::NEG_INFINITY && b == f64::NEG_INFINITY {
                        f64::NEG_INFINITY
                    } else {
                        a - b
                    }
                })
                .collect(),
        };
        Prob {
            domain: self.domain,
            values: Array1::from_vec(values),
        }
    }

    /// Pointwise power by a real exponent
    pub fn pow(&mut self, exponent: f64) {
        match self.domain {
            ProbDomain::Linear => self.values.mapv_inplace(|x| x.powf(exponent)),
            ProbDomain::Log => self.values.mapv_inplace(|x| x * exponent),
        }
    }

    /// Sum of the raw entries
    #[inline]
    pub fn sum(&self) -> f64 {
        self.values.sum()
    }

    /// Maximum of the raw entries
    #[inline]
    pub fn max(&self) -> f64 {
        self.values.fold(f64::NEG_INFINITY, |a, &b| a.max(b))
    }

    /// Log-sum-exp of the raw entries with the maximum factored out
    pub fn log_sum_exp(&self) -> f64 {
        let max = self.max();
        if max == f64::NEG_INFINITY {
            return f64::NEG_INFINITY;
        }
        max + self.values.fold(0f64, |a, &b| a + (b - max).exp()).ln()
    }

    /// Normalizes in place: to sum one in the linear domain, to
    /// log-sum-exp zero in the log domain
    ///
    /// # Notes
    ///
    /// Returns the normalization constant (the sum, resp. its logarithm).
    /// Fails with [`Error::NotNormalizable`] if the mass is zero or not
    /// finite.
    pub fn normalize(&mut self) -> Result<f64> {
        match self.domain {
            ProbDomain::Linear => {
                let norm = self.sum();
                if norm <= 0f64 || !norm.is_finite() {
                    return Err(Error::NotNormalizable);
                }
                self.values.mapv_inplace(|x| x / norm);
                Ok(norm)
            }
            ProbDomain::Log => {
                let norm = self.log_sum_exp();
                if !norm.is_finite() {
                    return Err(Error::NotNormalizable);
                }
                self.values.mapv_inplace(|x| x - norm);
                Ok(norm)
            }
        }
    }

    /// L-infinity distance between the raw entries of two vectors of the
    /// same length and domain
    pub fn dist_linf(&self, other: &Prob) -> f64 {
        debug_assert_eq!(self.len(), other.len());
        debug_assert_eq!(self.domain, other.domain);
        self.values
            .iter()
            .zip(other.values.iter())
            .fold(0f64, |a, (&x, &y)| a.max((x - y).abs()))
    }

    /// Converts the entries to their logarithms in place
    pub fn take_log(&mut self) {
        debug_assert_eq!(self.domain, ProbDomain::Linear);
        self.values.mapv_inplace(f64::ln);
        self.domain = ProbDomain::Log;
    }

    /// Exponentiates the entries in place
    pub fn take_exp(&mut self) {
        debug_assert_eq!(self.domain, ProbDomain::Log);
        self.values.mapv_inplace(f64::exp);
        self.domain = ProbDomain::Linear;
    }

    /// Shifts log entries by the maximum and exponentiates, for a
    /// numerically stable reduction to the linear domain
    pub fn shift_max_take_exp(&mut self) {
        debug_assert_eq!(self.domain, ProbDomain::Log);
        let max = self.max();
        self.values.mapv_inplace(|x| (x - max).exp());
        self.domain = ProbDomain::Linear;
    }

    /// Subtracts a scalar from every entry (log domain)
    pub fn sub_scalar(&mut self, scalar: f64) {
        self.values.mapv_inplace(|x| x - scalar);
    }

    /// Entropy `-sum p ln p` of a normalized linear-domain vector, with
    /// the convention `0 ln 0 = 0`
    pub fn entropy(&self) -> f64 {
        debug_assert_eq!(self.domain, ProbDomain::Linear);
        -self
            .values
            .fold(0f64, |a, &p| if p > 0f64 { a + p * p.ln() } else { a })
    }

    /// Kullback-Leibler divergence `sum p ln(p/q)` of a normalized
    /// linear-domain vector against an unnormalized non-negative
    /// reference
    ///
    /// # Notes
    ///
    /// Terms with `p = 0` contribute nothing, in particular when `q` is
    /// also zero. A term with `p > 0` and `q = 0` diverges and fails with
    /// [`Error::NotNormalizable`].
    pub fn kl_divergence(&self, reference: &Prob) -> Result<f64> {
        debug_assert_eq!(self.len(), reference.len());
        debug_assert_eq!(self.domain, ProbDomain::Linear);
        debug_assert_eq!(reference.domain, ProbDomain::Linear);
        let mut sum = 0f64;
        for (&p, &q) in self.values.iter().zip(reference.values.iter()) {
            if p > 0f64 {
                if q <= 0f64 {
                    return Err(Error::NotNormalizable);
                }
                sum += p * (p.ln() - q.ln());
            }
        }
        if sum.is_finite() {
            Ok(sum)
        } else {
            Err(Error::NotNormalizable)
        }
    }
}
