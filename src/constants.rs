// Physical defaults shared by the chamber simulations (resolution-independent)
pub const AMBIENT_LAB_K: f64 = 298.0; // bench ambient used by all protocols
pub const DEFAULT_DOMAIN_M: f64 = 0.08; // 80 mm square test slab
pub const DEFAULT_SLAB_THICKNESS_M: f64 = 5.0e-3; // energy accounting thickness
pub const DEFAULT_CONVECTIVE_H_W_M2_K: f64 = 150.0;

// Explicit scheme: dt must stay under 1 / (2 alpha (1/dx^2 + 1/dy^2)).
// Auto-selected steps use 96% of the bound (0.24 dx^2/alpha on square cells).
pub const STABILITY_SAFETY_FACTOR: f64 = 0.96;

// Energy accounting
pub const LOCAL_ANNULUS_FACTOR: f64 = 1.5; // local capture region = 1.5 x chamber radius
pub const EFFICIENCY_TOLERANCE: f64 = 0.01; // beyond [0-tol, 1+tol] a run is implausible
pub const PEAK_FRACTION_FOR_RISE_TIME: f64 = 0.9;

// Run termination
pub const DEFAULT_PEAK_CEILING_K: f64 = 600.0;
pub const MAX_SIM_TIME_S: f64 = 1800.0; // 30 min simulated-equivalent cap

// Multi-chamber spacing analysis
pub const OVERLAP_GAIN_THRESHOLD: f64 = 0.05;

// Output records
pub const METRICS_SCHEMA_VERSION: u32 = 1;
