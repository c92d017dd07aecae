//! Transition-probability generators for the two Markov layers
//!
//! Both model variants share the same state machine; they differ only in
//! where the care-pathway rates and the baseline death probability come
//! from. The shared shapes live in `hs_vector` and `dnh_vector` so the
//! variants cannot drift apart.

use super::sampling::TransitionVector;
use super::state::{DnhState, HsState};
use crate::assumptions::{
    CareRates, InsuranceMortalityTables, ModelFramework, ModelParameters, MortalityTables,
    TreatmentArm, MAX_TABLE_AGE,
};
use crate::cohort::{Individual, Insurance};
use crate::error::SimResult;

pub type HsTransition = TransitionVector<HsState, 4>;
pub type DnhTransition = TransitionVector<DnhState, 3>;

/// Source of per-cycle transition vectors for one policy variant
pub trait TransitionModel: Sync {
    fn framework(&self) -> ModelFramework;

    fn parameters(&self) -> &ModelParameters;

    /// HS state at cohort entry
    fn initial_hs_state(&self, person: &Individual) -> HsState;

    /// Next-cycle HS distribution from the current joint state
    fn hs_transitions(&self, hs: HsState, dnh: DnhState, person: &Individual) -> SimResult<HsTransition>;

    /// Next-cycle DNH distribution from the current joint state at `age`
    fn dnh_transitions(
        &self,
        hs: HsState,
        dnh: DnhState,
        age: u32,
        person: &Individual,
        arm: TreatmentArm,
    ) -> SimResult<DnhTransition>;
}

/// HS distribution given resolved care-pathway rates.
///
/// Dead individuals freeze their HS state. Detection (IHS -> DT) and
/// discontinuation only happen while sick.
pub fn hs_vector(hs: HsState, dnh: DnhState, rates: CareRates) -> SimResult<HsTransition> {
    match dnh {
        DnhState::Dead => Ok(HsTransition::certain(hs)),
        DnhState::Sick => match hs {
            HsState::OutOfSystem => HsTransition::from_entries(&[
                (HsState::OutOfSystem, 1.0 - rates.p_oi),
                (HsState::InSystem, rates.p_oi),
            ]),
            HsState::InSystem => HsTransition::from_entries(&[
                (HsState::InSystem, 1.0 - rates.p_dt),
                (HsState::DetectedTreated, rates.p_dt),
            ]),
            HsState::DetectedTreated => HsTransition::from_entries(&[
                (HsState::DetectedTreated, 1.0 - rates.p_dtut),
                (HsState::DetectedUntreated, rates.p_dtut),
            ]),
            HsState::DetectedUntreated => Ok(HsTransition::certain(HsState::DetectedUntreated)),
        },
        DnhState::Healthy => match hs {
            HsState::OutOfSystem => HsTransition::from_entries(&[
                (HsState::OutOfSystem, 1.0 - rates.p_oi),
                (HsState::InSystem, rates.p_oi),
            ]),
            HsState::InSystem | HsState::DetectedTreated | HsState::DetectedUntreated => {
                Ok(HsTransition::certain(hs))
            }
        },
    }
}

/// DNH distribution given the baseline death probability `p_hd` at `age`.
///
/// At or beyond `params.terminal_age`, or the last life-table age if that
/// comes first, death is certain and `p_hd` is never consulted. Sick mortality scales `p_hd` by the untreated relative risk,
/// reduced by the arm's hazard ratio while detected/treated.
pub fn dnh_vector(
    hs: HsState,
    dnh: DnhState,
    age: u32,
    p_hd: impl FnOnce() -> SimResult<f64>,
    params: &ModelParameters,
    arm: TreatmentArm,
) -> SimResult<DnhTransition> {
    if age >= params.terminal_age.min(MAX_TABLE_AGE) {
        return Ok(DnhTransition::certain(DnhState::Dead));
    }
    let p_hd = p_hd()?;

    let sickness = &params.sickness;
    let rr = match hs {
        HsState::DetectedTreated => sickness.treatment_hr(arm) * sickness.rr_sick_untreated,
        HsState::OutOfSystem | HsState::InSystem | HsState::DetectedUntreated => sickness.rr_sick_untreated,
    };

    match dnh {
        DnhState::Healthy => {
            let p_hs = params.transitions.p_hs;
            DnhTransition::from_entries(&[
                (DnhState::Healthy, 1.0 - p_hs - p_hd),
                (DnhState::Sick, p_hs),
                (DnhState::Dead, p_hd),
            ])
        }
        DnhState::Sick => {
            let p_sd = sickness.conversion.scale(p_hd, rr);
            DnhTransition::from_entries(&[(DnhState::Sick, 1.0 - p_sd), (DnhState::Dead, p_sd)])
        }
        DnhState::Dead => Ok(DnhTransition::certain(DnhState::Dead)),
    }
}

/// Insurance-blind model; every individual enters in the health system
pub struct StandardModel<'a> {
    params: &'a ModelParameters,
    mortality: &'a MortalityTables,
}

impl<'a> StandardModel<'a> {
    pub fn new(params: &'a ModelParameters, mortality: &'a MortalityTables) -> Self {
        Self { params, mortality }
    }
}

impl TransitionModel for StandardModel<'_> {
    fn framework(&self) -> ModelFramework {
        ModelFramework::Standard
    }

    fn parameters(&self) -> &ModelParameters {
        self.params
    }

    fn initial_hs_state(&self, _person: &Individual) -> HsState {
        HsState::InSystem
    }

    fn hs_transitions(&self, hs: HsState, dnh: DnhState, _person: &Individual) -> SimResult<HsTransition> {
        hs_vector(hs, dnh, self.params.care_rates())
    }

    fn dnh_transitions(
        &self,
        hs: HsState,
        dnh: DnhState,
        age: u32,
        person: &Individual,
        arm: TreatmentArm,
    ) -> SimResult<DnhTransition> {
        dnh_vector(
            hs,
            dnh,
            age,
            || self.mortality.lookup(person.race, person.sex, age),
            self.params,
            arm,
        )
    }
}

/// Insurance-differential model.
///
/// Care entry, detection and discontinuation use insured or uninsured rates,
/// and baseline mortality comes from insurance-stratified tables derived
/// once at construction. Individuals start in their recorded HS state.
pub struct SocialFrameworkModel<'a> {
    params: &'a ModelParameters,
    mortality: InsuranceMortalityTables,
    insured_rates: CareRates,
    uninsured_rates: CareRates,
}

impl<'a> SocialFrameworkModel<'a> {
    pub fn new(params: &'a ModelParameters, baseline: &MortalityTables) -> Self {
        let fx = &params.insurance;
        let mortality = baseline.stratify_by_insurance(|race| fx.uninsured_prevalence(race), fx.mortality_hazard_ratio);
        Self {
            params,
            mortality,
            insured_rates: params.care_rates_for(Insurance::Insured),
            uninsured_rates: params.care_rates_for(Insurance::Uninsured),
        }
    }

    fn rates(&self, insurance: Insurance) -> CareRates {
        match insurance {
            Insurance::Insured => self.insured_rates,
            Insurance::Uninsured => self.uninsured_rates,
        }
    }
}

impl TransitionModel for SocialFrameworkModel<'_> {
    fn framework(&self) -> ModelFramework {
        ModelFramework::SocialFramework
    }

    fn parameters(&self) -> &ModelParameters {
        self.params
    }

    fn initial_hs_state(&self, person: &Individual) -> HsState {
        person.place
    }

    fn hs_transitions(&self, hs: HsState, dnh: DnhState, person: &Individual) -> SimResult<HsTransition> {
        hs_vector(hs, dnh, self.rates(person.insurance))
    }

    fn dnh_transitions(
        &self,
        hs: HsState,
        dnh: DnhState,
        age: u32,
        person: &Individual,
        arm: TreatmentArm,
    ) -> SimResult<DnhTransition> {
        dnh_vector(
            hs,
            dnh,
            age,
            || self.mortality.lookup(person.race, person.sex, person.insurance, age),
            self.params,
            arm,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{to_probability, to_rate, SickMortalityConversion};
    use crate::cohort::{Race, Sex};
    use crate::error::SimError;
    use approx::assert_relative_eq;

    fn person(insurance: Insurance) -> Individual {
        Individual::new(1, 11, 40, Race::Nhb, Sex::Male, insurance, HsState::OutOfSystem)
    }

    #[test]
    fn test_dead_freezes_hs() {
        let rates = ModelParameters::default().care_rates();
        for hs in [HsState::OutOfSystem, HsState::InSystem, HsState::DetectedTreated, HsState::DetectedUntreated] {
            let v = hs_vector(hs, DnhState::Dead, rates).unwrap();
            assert_eq!(v.prob(hs), 1.0);
        }
    }

    #[test]
    fn test_sick_pathway() {
        let rates = ModelParameters::default().care_rates();
        let v = hs_vector(HsState::InSystem, DnhState::Sick, rates).unwrap();
        assert_eq!(v.as_array(), [0.0, 0.8, 0.2, 0.0]);
        let v = hs_vector(HsState::DetectedTreated, DnhState::Sick, rates).unwrap();
        assert_eq!(v.as_array(), [0.0, 0.0, 0.98, 0.02]);
        let v = hs_vector(HsState::DetectedUntreated, DnhState::Sick, rates).unwrap();
        assert_eq!(v.as_array(), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_healthy_cannot_be_detected() {
        let rates = ModelParameters::default().care_rates();
        let v = hs_vector(HsState::InSystem, DnhState::Healthy, rates).unwrap();
        assert_eq!(v.as_array(), [0.0, 1.0, 0.0, 0.0]);
        let v = hs_vector(HsState::OutOfSystem, DnhState::Healthy, rates).unwrap();
        assert_eq!(v.as_array(), [0.95, 0.05, 0.0, 0.0]);
    }

    #[test]
    fn test_zero_care_entry_keeps_sick_out_of_system() {
        let mut params = ModelParameters::default();
        params.transitions.p_oi = 0.0;
        let v = hs_vector(HsState::OutOfSystem, DnhState::Sick, params.care_rates()).unwrap();
        assert_eq!(v.as_array(), [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_forced_death_at_terminal_age() {
        let params = ModelParameters::default();
        for dnh in [DnhState::Healthy, DnhState::Sick, DnhState::Dead] {
            let v = dnh_vector(HsState::InSystem, dnh, 100, || unreachable!(), &params, TreatmentArm::NewTreatment)
                .unwrap();
            assert_eq!(v.as_array(), [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_forced_death_at_table_end_when_terminal_age_is_later() {
        let mut params = ModelParameters::default();
        params.terminal_age = 105;
        for age in [100, 101, 104] {
            let v = dnh_vector(HsState::InSystem, DnhState::Healthy, age, || Ok(1.0), &params, TreatmentArm::StandardOfCare)
                .unwrap();
            assert_eq!(v.as_array(), [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_healthy_row() {
        let params = ModelParameters::default();
        let v = dnh_vector(HsState::InSystem, DnhState::Healthy, 60, || Ok(0.01), &params, TreatmentArm::StandardOfCare)
            .unwrap();
        assert_relative_eq!(v.prob(DnhState::Healthy), 0.94, epsilon = 1e-12);
        assert_eq!(v.prob(DnhState::Sick), 0.05);
        assert_eq!(v.prob(DnhState::Dead), 0.01);
    }

    #[test]
    fn test_sick_mortality_by_hs_and_arm() {
        let params = ModelParameters::default();
        let p_hd = 0.02;
        let sick = |hs, arm| {
            dnh_vector(hs, DnhState::Sick, 70, || Ok(p_hd), &params, arm)
                .unwrap()
                .prob(DnhState::Dead)
        };

        let untreated = to_probability(to_probability(p_hd) * 4.0);
        assert_relative_eq!(sick(HsState::OutOfSystem, TreatmentArm::StandardOfCare), untreated, epsilon = 1e-12);
        assert_relative_eq!(sick(HsState::DetectedUntreated, TreatmentArm::NewTreatment), untreated, epsilon = 1e-12);
        assert_relative_eq!(sick(HsState::InSystem, TreatmentArm::StandardOfCare), 0.0761497677, epsilon = 1e-9);

        let sc = sick(HsState::DetectedTreated, TreatmentArm::StandardOfCare);
        let nt = sick(HsState::DetectedTreated, TreatmentArm::NewTreatment);
        assert_relative_eq!(sc, to_probability(to_probability(p_hd) * 2.0), epsilon = 1e-12);
        assert_relative_eq!(nt, to_probability(to_probability(p_hd) * 1.0), epsilon = 1e-12);
        assert!(nt < sc && sc < untreated);
    }

    #[test]
    fn test_hazard_conversion_option() {
        let mut params = ModelParameters::default();
        params.sickness.conversion = SickMortalityConversion::Hazard;
        let v = dnh_vector(HsState::InSystem, DnhState::Sick, 70, || Ok(0.02), &params, TreatmentArm::StandardOfCare)
            .unwrap();
        let expected = to_probability(to_rate(0.02) * 4.0);
        assert_relative_eq!(v.prob(DnhState::Dead), expected, epsilon = 1e-15);
        assert_relative_eq!(v.prob(DnhState::Dead), 0.0776318400, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_table_surfaces() {
        let params = ModelParameters::default();
        let tables = MortalityTables::new();
        let model = StandardModel::new(&params, &tables);
        let err = model
            .dnh_transitions(HsState::InSystem, DnhState::Healthy, 50, &person(Insurance::Insured), TreatmentArm::StandardOfCare)
            .unwrap_err();
        assert!(matches!(err, SimError::MissingMortalityTable { .. }));
    }

    #[test]
    fn test_social_framework_uses_insurance() {
        let params = ModelParameters::default();
        let tables = MortalityTables::uniform(0.01).unwrap();
        let model = SocialFrameworkModel::new(&params, &tables);

        let insured = person(Insurance::Insured);
        let uninsured = person(Insurance::Uninsured);

        let hs_ins = model.hs_transitions(HsState::OutOfSystem, DnhState::Sick, &insured).unwrap();
        let hs_unins = model.hs_transitions(HsState::OutOfSystem, DnhState::Sick, &uninsured).unwrap();
        assert_eq!(hs_ins.prob(HsState::InSystem), 0.05);
        assert!(hs_unins.prob(HsState::InSystem) < 0.05);

        let d_ins = model
            .dnh_transitions(HsState::InSystem, DnhState::Healthy, 50, &insured, TreatmentArm::StandardOfCare)
            .unwrap();
        let d_unins = model
            .dnh_transitions(HsState::InSystem, DnhState::Healthy, 50, &uninsured, TreatmentArm::StandardOfCare)
            .unwrap();
        assert!(d_ins.prob(DnhState::Dead) < 0.01);
        assert!(d_unins.prob(DnhState::Dead) > 0.01);

        assert_eq!(model.initial_hs_state(&insured), HsState::OutOfSystem);
        assert_eq!(StandardModel::new(&params, &tables).initial_hs_state(&insured), HsState::InSystem);
    }
}
