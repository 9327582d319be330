//! Built-in surrogate FEM for a stiffened panel: three design variables
//! (skin thickness, stringer thickness, stringer width, all mm) mapped to a
//! total weight and 255 reserve factors (element strength, panel stability,
//! stiffener buckling, three load cases each).
//!
//! This is a stand-in with the same contract and roughly the same response
//! surface as the real simulation: thicker designs are heavier and safer,
//! thin designs trip strength and buckling margins. Noise is seeded from the
//! design itself so repeated evaluation of one design is reproducible while
//! nearby designs still scatter.

use crate::eval::{EvalError, EvaluationResult, Evaluator};
use crate::rng::Rng;

pub const PANEL_NUM_VARS: usize = 3;

const N_ELEMENTS: usize = 66;
const N_PANELS: usize = 10;
const N_STIFFENERS: usize = 9;
const LOAD_CASES: usize = 3;

/// 66*3 strength + 10*3 stability + 9*3 buckling reserve factors.
pub const PANEL_RF_COUNT: usize = (N_ELEMENTS + N_PANELS + N_STIFFENERS) * LOAD_CASES;

const SKIN_AREA_MM2: f64 = 10_000.0;
const STRINGER_LENGTH_MM: f64 = 1_000.0;
const DENSITY_G_PER_MM3: f64 = 2.7e-3;

#[derive(Debug, Clone, Copy)]
pub struct PanelEvaluator {
    seed: u64,
}

impl PanelEvaluator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl Default for PanelEvaluator {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Evaluator for PanelEvaluator {
    fn evaluate(&self, design: &[f64]) -> Result<EvaluationResult, EvalError> {
        if design.len() != PANEL_NUM_VARS {
            return Err(EvalError::Backend(format!(
                "panel model expects {PANEL_NUM_VARS} variables, got {}",
                design.len()
            )));
        }
        let [t_skin, t_stringer, w_stringer] = [design[0], design[1], design[2]];

        let skin_weight = DENSITY_G_PER_MM3 * SKIN_AREA_MM2 * t_skin;
        let stringer_weight = DENSITY_G_PER_MM3
            * N_STIFFENERS as f64
            * 3.0
            * w_stringer
            * t_stringer
            * STRINGER_LENGTH_MM;
        let mass = skin_weight + stringer_weight;

        // Mild nonlinear coupling between the variables.
        let thickness_ratio = t_skin / t_stringer.max(1e-3);
        let geometry_factor = (0.1 * w_stringer).sin() + t_stringer.ln_1p();

        let mut noise = Rng::new(self.seed ^ design_hash(design));
        let mut reserve_factors = Vec::with_capacity(PANEL_RF_COUNT);

        let base_strength = 0.8 + 4.0 * (t_skin + 0.3 * t_stringer) + 0.5 * thickness_ratio.cos();
        for _ in 0..N_ELEMENTS * LOAD_CASES {
            reserve_factors.push((base_strength + noise.normal(0.0, 0.6)).clamp(0.2, 25.0));
        }

        let base_stability =
            0.5 + 2.2 * t_skin - 0.3 * w_stringer.sqrt() + 0.2 * t_stringer.sin();
        for _ in 0..N_PANELS * LOAD_CASES {
            reserve_factors.push((base_stability + noise.normal(0.0, 0.08)).clamp(0.25, 2.0));
        }

        let interaction = (t_stringer * w_stringer).powf(0.8);
        let base_buckling =
            0.4 + 1.5 * interaction - 0.1 * thickness_ratio + 0.1 * geometry_factor;
        for _ in 0..N_STIFFENERS * LOAD_CASES {
            reserve_factors.push((base_buckling + noise.normal(0.0, 0.12)).clamp(0.2, 1.8));
        }

        Ok(EvaluationResult {
            mass,
            reserve_factors,
        })
    }
}

/// FNV-1a over the raw bits of the design vector, for seeding per-design noise.
fn design_hash(design: &[f64]) -> u64 {
    design
        .iter()
        .flat_map(|v| v.to_bits().to_le_bytes())
        .fold(14695981039346656037u64, |acc, b| {
            (acc ^ u64::from(b)).wrapping_mul(1099511628211)
        })
}
