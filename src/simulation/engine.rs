//! Per-individual simulation engine
//!
//! Walks one individual's joint (DNH, HS) state through yearly cycles using
//! the individual's own random stream, then reduces the path to outcomes.

use rayon::prelude::*;

use super::outcomes::{OutcomeAggregator, OutcomeRecord};
use super::sampling::IndividualRng;
use super::state::{DnhState, Trajectory};
use super::transitions::TransitionModel;
use crate::assumptions::{ModelFramework, TreatmentArm};
use crate::cohort::Individual;
use crate::error::SimResult;

/// Everything produced by running one arm over a cohort.
///
/// `trajectories[i]` and `outcomes[i]` belong to `cohort[i]`.
#[derive(Debug, Clone)]
pub struct ArmResult {
    pub framework: ModelFramework,
    pub arm: TreatmentArm,
    pub cohort: Vec<Individual>,
    pub trajectories: Vec<Trajectory>,
    pub outcomes: Vec<OutcomeRecord>,
}

impl ArmResult {
    pub fn len(&self) -> usize {
        self.cohort.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cohort.is_empty()
    }
}

/// Simulation engine bound to one transition model
pub struct SimulationEngine<'m, M: TransitionModel> {
    model: &'m M,
    aggregator: OutcomeAggregator,
}

impl<'m, M: TransitionModel> SimulationEngine<'m, M> {
    pub fn new(model: &'m M) -> Self {
        Self {
            model,
            aggregator: OutcomeAggregator::new(model.parameters()),
        }
    }

    pub fn model(&self) -> &M {
        self.model
    }

    pub fn aggregator(&self) -> &OutcomeAggregator {
        &self.aggregator
    }

    /// Simulate one individual under one arm.
    ///
    /// Each cycle consumes exactly two uniforms (HS first, then DNH), so two
    /// arms of the same individual stay on the same stream position until
    /// their states first differ in a way that changes the vectors.
    pub fn simulate_individual(&self, person: &Individual, arm: TreatmentArm) -> SimResult<Trajectory> {
        let mut rng = IndividualRng::new(person.seed);
        let trajectory = self.walk(person, arm, &mut rng)?;

        log::trace!(
            "Individual {} ({}): {} draws, death cycle {:?}",
            person.id,
            arm.code(),
            rng.draws(),
            trajectory.death_cycle()
        );
        Ok(trajectory)
    }

    /// Advance one individual through every cycle on the given stream
    fn walk(&self, person: &Individual, arm: TreatmentArm, rng: &mut IndividualRng) -> SimResult<Trajectory> {
        let params = self.model.parameters();
        let terminal_age = params.terminal_age;
        let cycles = params.cycles();

        let mut dnh = if person.starting_age >= terminal_age {
            DnhState::Dead
        } else {
            DnhState::Healthy
        };
        let mut hs = self.model.initial_hs_state(person);
        let mut age = person.starting_age;

        let mut trajectory = Trajectory::start(dnh, hs, cycles);

        for _ in 0..cycles {
            let hs_vector = self.model.hs_transitions(hs, dnh, person)?;
            let dnh_vector = self.model.dnh_transitions(hs, dnh, age, person, arm)?;

            let next_hs = rng.draw(&hs_vector);
            let mut next_dnh = rng.draw(&dnh_vector);

            age += 1;
            if age >= terminal_age {
                next_dnh = DnhState::Dead;
            }

            trajectory.push(next_dnh, next_hs);
            hs = next_hs;
            dnh = next_dnh;
        }
        Ok(trajectory)
    }

    /// Simulate and aggregate one individual
    pub fn run_individual(&self, person: &Individual, arm: TreatmentArm) -> SimResult<(Trajectory, OutcomeRecord)> {
        let trajectory = self.simulate_individual(person, arm)?;
        let outcome = self.aggregator.aggregate(person, &trajectory, arm);
        Ok((trajectory, outcome))
    }

    /// Run a whole cohort under one arm in parallel; output order follows
    /// the cohort order.
    pub fn run_arm(&self, cohort: &[Individual], arm: TreatmentArm) -> SimResult<ArmResult> {
        log::debug!(
            "Simulating {} individuals ({} / {})",
            cohort.len(),
            self.model.framework().code(),
            arm.code()
        );

        let runs: Vec<(Trajectory, OutcomeRecord)> = cohort
            .par_iter()
            .map(|person| self.run_individual(person, arm))
            .collect::<SimResult<_>>()?;

        let (trajectories, outcomes) = runs.into_iter().unzip();
        Ok(ArmResult {
            framework: self.model.framework(),
            arm,
            cohort: cohort.to_vec(),
            trajectories,
            outcomes,
        })
    }
}
