use conv::prelude::*;
use ndarray::{Array1, Zip};

/// Data to fit: abscissa `t` and observed values `m` of the same length
#[derive(Clone, Debug)]
pub struct Data {
    pub t: Array1<f64>,
    pub m: Array1<f64>,
}

impl Data {
    pub fn new(t: Array1<f64>, m: Array1<f64>) -> Self {
        assert_eq!(t.len(), m.len(), "t and m should have the same size");
        Self { t, m }
    }

    #[inline]
    pub fn lenu(&self) -> usize {
        self.t.len()
    }

    /// Sum of squared residuals of `model` with `params`
    pub fn chi2<F, const NPARAMS: usize>(&self, model: &F, params: &[f64; NPARAMS]) -> f64
    where
        F: Fn(f64, &[f64; NPARAMS]) -> f64,
    {
        Zip::from(&self.t)
            .and(&self.m)
            .fold(0.0, |acc, &t, &m| acc + (model(t, params) - m).powi(2))
    }

    /// `chi2` divided by the number of degrees of freedom, NaN if there are none
    pub fn reduce_chi2(&self, chi2: f64, nparams: usize) -> f64 {
        match self.lenu().checked_sub(nparams) {
            Some(dof) if dof > 0 => chi2 / dof.approx_as::<f64>().unwrap_or(f64::NAN),
            _ => f64::NAN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chi2_of_line() {
        let data = Data::new(Array1::from(vec![0.0, 1.0, 2.0]), Array1::from(vec![1.0, 2.0, 4.0]));
        let line = |t: f64, p: &[f64; 2]| p[0] + p[1] * t;
        assert_eq!(data.chi2(&line, &[1.0, 1.0]), 1.0);
        assert_eq!(data.reduce_chi2(1.0, 2), 1.0);
        assert!(data.reduce_chi2(1.0, 3).is_nan());
    }
}
