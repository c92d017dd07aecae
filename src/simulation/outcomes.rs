//! Per-individual outcome aggregation and discounting

use serde::{Deserialize, Serialize};

use super::state::{DnhState, HsState, Trajectory};
use crate::assumptions::{ModelParameters, OutcomeWeights, TreatmentArm, TreatmentCosts};
use crate::cohort::Individual;

/// Annual discount factors `v[t] = (1 + r)^(-t)` for cycles 0..=cycles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountVector {
    rate: f64,
    factors: Vec<f64>,
}

impl DiscountVector {
    pub fn new(rate: f64, cycles: usize) -> Self {
        let v = 1.0 / (1.0 + rate);
        let factors = (0..=cycles).map(|t| v.powi(t as i32)).collect();
        Self { rate, factors }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Discount factor for cycle `t`
    pub fn factor(&self, t: usize) -> f64 {
        match self.factors.get(t) {
            Some(f) => *f,
            None => (1.0 + self.rate).powi(-(t as i32)),
        }
    }

    /// Present value of a per-cycle stream starting at cycle 0
    pub fn present_value(&self, values: impl IntoIterator<Item = f64>) -> f64 {
        values
            .into_iter()
            .enumerate()
            .map(|(t, value)| value * self.factor(t))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

/// Scalar outcomes for one individual under one arm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub years_to_death: u32,
    pub discounted_ly: f64,
    pub qaly: f64,
    pub discounted_qaly: f64,
    pub cost: f64,
    pub discounted_cost: f64,
    /// Treatment share of `cost`, undiscounted
    pub treatment_cost: f64,
    pub death_age: u32,
    pub years_sick: u32,
    pub years_sick_treated: u32,
    pub years_sick_untreated: u32,
    pub was_sick: bool,
    pub was_treated: bool,
}

/// Reduces trajectories to outcome records
#[derive(Debug, Clone)]
pub struct OutcomeAggregator {
    discount: DiscountVector,
    weights: OutcomeWeights,
    treatment_costs: TreatmentCosts,
}

impl OutcomeAggregator {
    pub fn new(params: &ModelParameters) -> Self {
        Self {
            discount: DiscountVector::new(params.discount_rate, params.cycles()),
            weights: params.weights.clone(),
            treatment_costs: params.treatment_cost.clone(),
        }
    }

    pub fn discount(&self) -> &DiscountVector {
        &self.discount
    }

    /// Summarize a completed trajectory
    pub fn aggregate(&self, person: &Individual, trajectory: &Trajectory, arm: TreatmentArm) -> OutcomeRecord {
        let dnh = trajectory.dnh();
        let hs = trajectory.hs();
        let treatment_cost = self.treatment_costs.for_arm(arm);

        let life_years: Vec<f64> = dnh.iter().map(|s| if s.is_alive() { 1.0 } else { 0.0 }).collect();
        let qalys: Vec<f64> = dnh.iter().map(|s| self.weights.qaly.get(*s)).collect();
        let costs: Vec<f64> = dnh
            .iter()
            .zip(hs)
            .map(|(d, h)| {
                let state_cost = self.weights.cost.get(*d);
                if treated_while_sick(*d, *h) {
                    state_cost + treatment_cost
                } else {
                    state_cost
                }
            })
            .collect();

        let years_to_death = dnh.iter().filter(|s| s.is_alive()).count() as u32;
        let years_sick = dnh.iter().filter(|s| **s == DnhState::Sick).count() as u32;
        let years_sick_treated = dnh
            .iter()
            .zip(hs)
            .filter(|(d, h)| treated_while_sick(**d, **h))
            .count() as u32;
        let was_treated = hs.iter().any(|h| *h == HsState::DetectedTreated);

        OutcomeRecord {
            years_to_death,
            discounted_ly: self.discount.present_value(life_years.iter().copied()),
            qaly: qalys.iter().sum(),
            discounted_qaly: self.discount.present_value(qalys.iter().copied()),
            cost: costs.iter().sum(),
            discounted_cost: self.discount.present_value(costs.iter().copied()),
            treatment_cost: years_sick_treated as f64 * treatment_cost,
            death_age: person.starting_age + years_to_death,
            years_sick,
            years_sick_treated,
            years_sick_untreated: years_sick - years_sick_treated,
            was_sick: years_sick > 0,
            was_treated,
        }
    }
}

fn treated_while_sick(dnh: DnhState, hs: HsState) -> bool {
    dnh == DnhState::Sick && hs == HsState::DetectedTreated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::{Insurance, Race, Sex};
    use approx::assert_relative_eq;

    use crate::simulation::state::DnhState::{Dead as D, Healthy as H, Sick as S};
    use crate::simulation::state::HsState::{DetectedTreated as DT, DetectedUntreated as DUT, InSystem as IHS};

    fn person() -> Individual {
        Individual::new(3, 77, 40, Race::Nhw, Sex::Female, Insurance::Insured, IHS)
    }

    fn treated_twice() -> Trajectory {
        Trajectory::from_parts(vec![H, S, S, S, S, D], vec![IHS, IHS, DT, DT, DUT, DUT]).unwrap()
    }

    #[test]
    fn test_discount_vector() {
        let v = DiscountVector::new(0.03, 3);
        assert_eq!(v.len(), 4);
        assert_eq!(v.factor(0), 1.0);
        assert_relative_eq!(v.factor(2), 1.0 / 1.0609, epsilon = 1e-12);
        assert_relative_eq!(v.factor(10), 1.03_f64.powi(-10), epsilon = 1e-12);
        assert_relative_eq!(v.present_value([1.0, 1.0]), 1.0 + 1.0 / 1.03, epsilon = 1e-12);
    }

    #[test]
    fn test_treatment_cost_by_arm() {
        let params = ModelParameters::default();
        let agg = OutcomeAggregator::new(&params);
        let traj = treated_twice();

        let sc = agg.aggregate(&person(), &traj, TreatmentArm::StandardOfCare);
        let nt = agg.aggregate(&person(), &traj, TreatmentArm::NewTreatment);

        // 1 healthy + 4 sick cycles of state cost, plus 2 treated-sick cycles
        assert_relative_eq!(sc.cost, 100.0 + 4.0 * 500.0 + 480.0, epsilon = 1e-9);
        assert_relative_eq!(nt.cost, 100.0 + 4.0 * 500.0 + 12_000.0, epsilon = 1e-9);
        assert_relative_eq!(sc.treatment_cost, 480.0, epsilon = 1e-12);
        assert_relative_eq!(nt.treatment_cost, 12_000.0, epsilon = 1e-12);
    }

    #[test]
    fn test_counters() {
        let agg = OutcomeAggregator::new(&ModelParameters::default());
        let out = agg.aggregate(&person(), &treated_twice(), TreatmentArm::StandardOfCare);

        assert_eq!(out.years_to_death, 5);
        assert_eq!(out.death_age, 45);
        assert_eq!(out.years_sick, 4);
        assert_eq!(out.years_sick_treated, 2);
        assert_eq!(out.years_sick_untreated, 2);
        assert!(out.was_sick);
        assert!(out.was_treated);
        assert_relative_eq!(out.qaly, 1.0 + 4.0 * 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_discounted_never_exceeds_raw() {
        let agg = OutcomeAggregator::new(&ModelParameters::default());
        let out = agg.aggregate(&person(), &treated_twice(), TreatmentArm::NewTreatment);
        assert!(out.discounted_ly <= out.years_to_death as f64);
        assert!(out.discounted_qaly <= out.qaly);
        assert!(out.discounted_cost <= out.cost);
        assert!(out.discounted_ly > 0.0);
    }

    #[test]
    fn test_never_sick() {
        let agg = OutcomeAggregator::new(&ModelParameters::default());
        let traj = Trajectory::from_parts(vec![H, H, D], vec![IHS, IHS, IHS]).unwrap();
        let out = agg.aggregate(&person(), &traj, TreatmentArm::StandardOfCare);
        assert_eq!(out.years_sick, 0);
        assert!(!out.was_sick);
        assert!(!out.was_treated);
        assert_relative_eq!(out.cost, 200.0, epsilon = 1e-12);
        assert_relative_eq!(out.discounted_ly, 1.0 + 1.0 / 1.03, epsilon = 1e-12);
    }
}
