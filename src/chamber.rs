use serde::{Deserialize, Serialize};

use crate::errors::SimError;
use crate::grid_field::GridField;

/// Geometric and electrical descriptor of one heated micro chamber.
///
/// Diameter is immutable per run. Power follows a square wave: `q_high_w`
/// while the phase within `period_s` is below `duty`, `q_low_w` otherwise.
/// A duty of 1.0 means constant `q_high_w`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChamberSource {
    pub center_x_m: f64,
    pub center_y_m: f64,
    pub diameter_m: f64,
    pub q_high_w: f64,
    #[serde(default)]
    pub q_low_w: f64,
    #[serde(default = "default_duty")]
    pub duty: f64,
    #[serde(default = "default_period_s")]
    pub period_s: f64,
}

fn default_duty() -> f64 {
    1.0
}

fn default_period_s() -> f64 {
    3600.0
}

impl ChamberSource {
    /// Constant-power chamber at (cx, cy).
    pub fn constant(center_x_m: f64, center_y_m: f64, diameter_m: f64, power_w: f64) -> Self {
        ChamberSource {
            center_x_m,
            center_y_m,
            diameter_m,
            q_high_w: power_w,
            q_low_w: power_w,
            duty: 1.0,
            period_s: default_period_s(),
        }
    }

    pub fn radius_m(&self) -> f64 {
        self.diameter_m / 2.0
    }

    /// Electrical input power at simulated time `t_s`.
    pub fn power_at(&self, t_s: f64) -> f64 {
        if self.duty >= 1.0 {
            return self.q_high_w;
        }
        let phase = (t_s % self.period_s) / self.period_s;
        if phase < self.duty {
            self.q_high_w
        } else {
            self.q_low_w
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.diameter_m <= 0.0 {
            return Err(SimError::InvalidConfiguration(format!(
                "chamber diameter must be positive, got {}",
                self.diameter_m
            )));
        }
        if self.q_high_w < 0.0 || self.q_low_w < 0.0 {
            return Err(SimError::InvalidConfiguration(
                "chamber power levels must be non-negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.duty) {
            return Err(SimError::InvalidConfiguration(format!(
                "duty cycle must lie in [0, 1], got {}",
                self.duty
            )));
        }
        if self.period_s <= 0.0 {
            return Err(SimError::InvalidConfiguration(
                "duty period must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Grid footprint of a chamber, resolved once per run.
#[derive(Debug, Clone)]
pub struct ChamberFootprint {
    pub cells: Vec<usize>,
    pub volume_m3: f64,
    pub center_cell: usize,
}

impl ChamberFootprint {
    /// Resolve a chamber against a field. Fails when the disc covers no cell
    /// centers or its center lies outside the domain.
    pub fn resolve(
        chamber: &ChamberSource,
        field: &GridField,
        thickness_m: f64,
    ) -> Result<Self, SimError> {
        let lx = field.nx as f64 * field.dx_m;
        let ly = field.ny as f64 * field.dy_m;
        if chamber.center_x_m < 0.0
            || chamber.center_y_m < 0.0
            || chamber.center_x_m > lx
            || chamber.center_y_m > ly
        {
            return Err(SimError::InvalidConfiguration(format!(
                "chamber center ({:.4}, {:.4}) m lies outside the {:.4} x {:.4} m domain",
                chamber.center_x_m, chamber.center_y_m, lx, ly
            )));
        }
        let cells =
            field.cells_within_radius(chamber.center_x_m, chamber.center_y_m, chamber.radius_m());
        if cells.is_empty() {
            return Err(SimError::InvalidConfiguration(format!(
                "chamber diameter {:.4} m resolves to zero grid cells at spacing {:.4} m",
                chamber.diameter_m, field.dx_m
            )));
        }
        let ci = ((chamber.center_x_m / field.dx_m - 0.5).round().max(0.0) as usize)
            .min(field.nx - 1);
        let cj = ((chamber.center_y_m / field.dy_m - 0.5).round().max(0.0) as usize)
            .min(field.ny - 1);
        let volume_m3 = cells.len() as f64 * field.dx_m * field.dy_m * thickness_m;
        Ok(ChamberFootprint {
            cells,
            volume_m3,
            center_cell: field.idx(ci, cj),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn chamber_4mm() -> ChamberSource {
        ChamberSource::constant(0.025, 0.025, 4.0e-3, 8.0)
    }

    #[test]
    fn constant_chamber_power_is_flat() {
        let c = chamber_4mm();
        assert_relative_eq!(c.power_at(0.0), 8.0);
        assert_relative_eq!(c.power_at(1234.5), 8.0);
    }

    #[test]
    fn duty_cycle_switches_between_levels() {
        let mut c = chamber_4mm();
        c.q_high_w = 180.0;
        c.q_low_w = 10.0;
        c.duty = 0.5;
        c.period_s = 3600.0;
        assert_relative_eq!(c.power_at(0.0), 180.0);
        assert_relative_eq!(c.power_at(1799.0), 180.0);
        assert_relative_eq!(c.power_at(1801.0), 10.0);
        assert_relative_eq!(c.power_at(3601.0), 180.0);
    }

    #[test]
    fn negative_diameter_is_invalid() {
        let mut c = chamber_4mm();
        c.diameter_m = -4.0e-3;
        assert!(c.validate().is_err());
    }

    #[test]
    fn footprint_resolves_centered_disc() {
        let field = GridField::new(50, 50, 1e-3, 1e-3, 298.0);
        let c = chamber_4mm();
        let fp = ChamberFootprint::resolve(&c, &field, 5e-3).unwrap();
        assert!(!fp.cells.is_empty());
        assert!(fp.cells.contains(&fp.center_cell));
        assert_relative_eq!(
            fp.volume_m3,
            fp.cells.len() as f64 * 1e-6 * 5e-3
        );
    }

    #[test]
    fn footprint_rejects_center_outside_domain() {
        let field = GridField::new(10, 10, 1e-3, 1e-3, 298.0);
        let c = ChamberSource::constant(0.5, 0.5, 4.0e-3, 8.0);
        assert!(ChamberFootprint::resolve(&c, &field, 5e-3).is_err());
    }
}
