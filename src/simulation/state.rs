//! Markov state layers and per-individual trajectories

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// A closed set of Markov states with a fixed slot in every transition vector
pub trait StateSpace<const N: usize>: Copy + PartialEq + std::fmt::Debug + 'static {
    /// States in probability-vector order
    const ALL: [Self; N];

    /// Layer name used in diagnostics
    const LAYER: &'static str;

    /// Slot of this state in a transition vector
    fn index(self) -> usize;
}

/// Disease natural history layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DnhState {
    #[serde(rename = "H")]
    Healthy,
    #[serde(rename = "S")]
    Sick,
    #[serde(rename = "D")]
    Dead,
}

impl DnhState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DnhState::Healthy => "H",
            DnhState::Sick => "S",
            DnhState::Dead => "D",
        }
    }

    pub fn is_alive(&self) -> bool {
        !matches!(self, DnhState::Dead)
    }
}

impl StateSpace<3> for DnhState {
    const ALL: [Self; 3] = [DnhState::Healthy, DnhState::Sick, DnhState::Dead];
    const LAYER: &'static str = "DNH";

    fn index(self) -> usize {
        match self {
            DnhState::Healthy => 0,
            DnhState::Sick => 1,
            DnhState::Dead => 2,
        }
    }
}

/// Health-system utilization layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HsState {
    /// No routine place for care
    #[serde(rename = "OHS")]
    OutOfSystem,
    /// Routine place for care
    #[serde(rename = "IHS")]
    InSystem,
    #[serde(rename = "DT")]
    DetectedTreated,
    #[serde(rename = "DUT")]
    DetectedUntreated,
}

impl HsState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HsState::OutOfSystem => "OHS",
            HsState::InSystem => "IHS",
            HsState::DetectedTreated => "DT",
            HsState::DetectedUntreated => "DUT",
        }
    }

    pub fn parse(value: &str) -> SimResult<Self> {
        match value.trim() {
            "OHS" => Ok(HsState::OutOfSystem),
            "IHS" => Ok(HsState::InSystem),
            "DT" => Ok(HsState::DetectedTreated),
            "DUT" => Ok(HsState::DetectedUntreated),
            other => Err(SimError::InvalidCovariate {
                field: "place",
                value: other.to_string(),
            }),
        }
    }
}

impl StateSpace<4> for HsState {
    const ALL: [Self; 4] = [
        HsState::OutOfSystem,
        HsState::InSystem,
        HsState::DetectedTreated,
        HsState::DetectedUntreated,
    ];
    const LAYER: &'static str = "HS";

    fn index(self) -> usize {
        match self {
            HsState::OutOfSystem => 0,
            HsState::InSystem => 1,
            HsState::DetectedTreated => 2,
            HsState::DetectedUntreated => 3,
        }
    }
}

/// Full state path of one individual under one arm.
///
/// Both layers always hold `cycles + 1` entries; index 0 is the state at
/// cohort entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    dnh: Vec<DnhState>,
    hs: Vec<HsState>,
}

impl Trajectory {
    /// Start a trajectory with room for `cycles` transitions
    pub(crate) fn start(initial_dnh: DnhState, initial_hs: HsState, cycles: usize) -> Self {
        let mut dnh = Vec::with_capacity(cycles + 1);
        let mut hs = Vec::with_capacity(cycles + 1);
        dnh.push(initial_dnh);
        hs.push(initial_hs);
        Self { dnh, hs }
    }

    pub(crate) fn push(&mut self, dnh: DnhState, hs: HsState) {
        self.dnh.push(dnh);
        self.hs.push(hs);
    }

    /// Build a trajectory from already-known sequences (used by tests and
    /// re-aggregation of stored traces)
    pub fn from_parts(dnh: Vec<DnhState>, hs: Vec<HsState>) -> SimResult<Self> {
        if dnh.len() != hs.len() || dnh.is_empty() {
            return Err(SimError::InvalidParameter {
                name: "trajectory_length",
                value: dnh.len() as f64,
                reason: "DNH and HS sequences must be non-empty and of equal length",
            });
        }
        Ok(Self { dnh, hs })
    }

    pub fn dnh(&self) -> &[DnhState] {
        &self.dnh
    }

    pub fn hs(&self) -> &[HsState] {
        &self.hs
    }

    /// Number of entries (cycles + 1)
    pub fn len(&self) -> usize {
        self.dnh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dnh.is_empty()
    }

    /// Joint state at a cycle, if the trajectory reaches it
    pub fn at(&self, cycle: usize) -> Option<(DnhState, HsState)> {
        Some((*self.dnh.get(cycle)?, *self.hs.get(cycle)?))
    }

    /// First cycle spent in DT, if any
    pub fn first_treated_cycle(&self) -> Option<usize> {
        self.hs.iter().position(|s| *s == HsState::DetectedTreated)
    }

    /// First cycle spent dead, if any
    pub fn death_cycle(&self) -> Option<usize> {
        self.dnh.iter().position(|s| *s == DnhState::Dead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_vector_order() {
        for (i, state) in DnhState::ALL.iter().enumerate() {
            assert_eq!(state.index(), i);
        }
        for (i, state) in HsState::ALL.iter().enumerate() {
            assert_eq!(state.index(), i);
        }
    }

    #[test]
    fn test_hs_labels() {
        for state in HsState::ALL {
            assert_eq!(HsState::parse(state.as_str()).unwrap(), state);
        }
        assert!(HsState::parse("ER").is_err());
    }

    #[test]
    fn test_trajectory_accessors() {
        let mut traj = Trajectory::start(DnhState::Healthy, HsState::InSystem, 3);
        traj.push(DnhState::Sick, HsState::InSystem);
        traj.push(DnhState::Sick, HsState::DetectedTreated);
        traj.push(DnhState::Dead, HsState::DetectedTreated);

        assert_eq!(traj.len(), 4);
        assert_eq!(traj.at(1), Some((DnhState::Sick, HsState::InSystem)));
        assert_eq!(traj.at(4), None);
        assert_eq!(traj.first_treated_cycle(), Some(2));
        assert_eq!(traj.death_cycle(), Some(3));
    }

    #[test]
    fn test_from_parts_rejects_mismatched_lengths() {
        let result = Trajectory::from_parts(
            vec![DnhState::Healthy, DnhState::Dead],
            vec![HsState::InSystem],
        );
        assert!(result.is_err());
    }
}
