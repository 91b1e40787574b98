use crate::grid::Grid;

use macro_const::macro_const;
use std::f64::consts::PI;

/// Number of harmonic model parameters
pub const NPARAMS: usize = 5;

macro_const! {
    const DOC: &str = r#"
Harmonic model of the grid-scan light curve

$$
f(t) = A_0 + A_1 \cos\left(\tau - \phi\right) + (A_2 + A_3) \cos\left(2(\tau - \phi)\right),
\quad \tau = \frac{\pi v}{L} t, \quad \phi = \pi \tanh A_4,
$$

where $v$ is the grid velocity and $L$ is the slit interval. The phase $\phi$ is bounded to
$(-\pi, \pi)$ while the optimizer searches $A_4$ over the whole real line, so the fit never
has to wrap the phase.

The modulation period $L/v$ corresponds to the second harmonic of $\tau$, so a pixel shift
$\delta$ along the scan direction changes the phase by $\pi\delta/L$.

Both $A_2$ and $A_3$ multiply the second harmonic, so only their sum is constrained by data.
"#;
}

#[doc = DOC!()]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HarmonicModel {
    /// $\pi v / L$ factor converting time to $\tau$
    tic_scale: f64,
}

impl HarmonicModel {
    pub fn new(grid: &Grid) -> Self {
        Self {
            tic_scale: PI / grid.slit_interval() * grid.velocity(),
        }
    }

    pub fn doc() -> &'static str {
        DOC
    }

    /// Time to the model abscissa $\tau$
    #[inline]
    pub fn tic(&self, t: f64) -> f64 {
        self.tic_scale * t
    }

    /// Physical phase from the internal phase parameter $A_4$
    #[inline]
    pub fn phase(internal: f64) -> f64 {
        PI * internal.tanh()
    }

    /// Internal phase parameter $A_4$ for a phase within $(-\pi, \pi)$
    #[inline]
    pub fn internal_phase(phase: f64) -> f64 {
        (phase / PI).atanh()
    }

    /// Model value at abscissa `tic`
    pub fn model(tic: f64, param: &[f64; NPARAMS]) -> f64 {
        let u = tic - Self::phase(param[4]);
        param[0] + param[1] * u.cos() + param[2] * (2.0 * u).cos() + param[3] * (2.0 * u).cos()
    }

    /// Gradient of [HarmonicModel::model] over the parameters
    pub fn derivatives(tic: f64, param: &[f64; NPARAMS], jac: &mut [f64; NPARAMS]) {
        let tanh = param[4].tanh();
        let u = tic - PI * tanh;
        let (sin_1, cos_1) = u.sin_cos();
        let (sin_2, cos_2) = (2.0 * u).sin_cos();

        jac[0] = 1.0;
        jac[1] = cos_1;
        jac[2] = cos_2;
        jac[3] = cos_2;
        // d(u)/d(A4) = -pi * sech^2(A4)
        jac[4] = (param[1] * sin_1 + 2.0 * (param[2] + param[3]) * sin_2) * PI * (1.0 - tanh * tanh);
    }
}
