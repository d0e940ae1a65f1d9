//! Calorie models.
//!
//! Energy burned is derived from accumulated distance only. The session
//! holds a boxed [`CalorieModel`] so hosts can swap in a body-weight based
//! estimate without touching the accumulator.

use std::fmt::Debug;

/// Maps total distance to total energy burned.
pub trait CalorieModel: Debug + Send + Sync {
    /// Total kilocalories for `distance_km` of running.
    fn calories_for(&self, distance_km: f64) -> f64;
}

/// A fixed number of kilocalories per kilometer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRateCalories {
    pub kcal_per_km: f64,
}

impl FixedRateCalories {
    pub const DEFAULT_KCAL_PER_KM: f64 = 65.0;

    pub fn new(kcal_per_km: f64) -> Self {
        Self { kcal_per_km }
    }
}

impl Default for FixedRateCalories {
    fn default() -> Self {
        Self::new(Self::DEFAULT_KCAL_PER_KM)
    }
}

impl CalorieModel for FixedRateCalories {
    fn calories_for(&self, distance_km: f64) -> f64 {
        distance_km * self.kcal_per_km
    }
}

/// Net running cost scaled by body weight: ~1.036 kcal per kg per km.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightBasedCalories {
    pub weight_kg: f64,
}

impl WeightBasedCalories {
    pub const KCAL_PER_KG_KM: f64 = 1.036;

    pub fn new(weight_kg: f64) -> Self {
        Self { weight_kg }
    }
}

impl CalorieModel for WeightBasedCalories {
    fn calories_for(&self, distance_km: f64) -> f64 {
        distance_km * self.weight_kg * Self::KCAL_PER_KG_KM
    }
}
