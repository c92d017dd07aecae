//! Per-cycle state occupancy across a cohort

use crate::simulation::{StateSpace, Trajectory};

/// Fraction of the cohort in H, S, D at each cycle.
///
/// Row `t` sums to 1 for a non-empty cohort.
pub fn dnh_occupancy(trajectories: &[Trajectory]) -> Vec<[f64; 3]> {
    let cycles = trajectories.iter().map(Trajectory::len).max().unwrap_or(0);
    let n = trajectories.len() as f64;

    (0..cycles)
        .map(|t| {
            let mut counts = [0usize; 3];
            for traj in trajectories.iter().filter(|traj| t < traj.len()) {
                counts[traj.dnh()[t].index()] += 1;
            }
            counts.map(|c| c as f64 / n)
        })
        .collect()
}

/// Fraction of the living in OHS, IHS, DT, DUT at each cycle; all zeros once
/// nobody is alive.
pub fn hs_occupancy(trajectories: &[Trajectory]) -> Vec<[f64; 4]> {
    let cycles = trajectories.iter().map(Trajectory::len).max().unwrap_or(0);

    (0..cycles)
        .map(|t| {
            let mut counts = [0usize; 4];
            let mut alive = 0usize;
            for (dnh, hs) in trajectories.iter().filter_map(|traj| traj.at(t)) {
                if dnh.is_alive() {
                    counts[hs.index()] += 1;
                    alive += 1;
                }
            }
            if alive == 0 {
                [0.0; 4]
            } else {
                counts.map(|c| c as f64 / alive as f64)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    use crate::simulation::DnhState::{Dead as D, Healthy as H, Sick as S};
    use crate::simulation::HsState::{DetectedTreated as DT, InSystem as IHS, OutOfSystem as OHS};

    fn trajectories() -> Vec<Trajectory> {
        vec![
            Trajectory::from_parts(vec![H, S, D], vec![IHS, DT, DT]).unwrap(),
            Trajectory::from_parts(vec![H, H, S], vec![OHS, IHS, IHS]).unwrap(),
        ]
    }

    #[test]
    fn test_dnh_occupancy() {
        let occ = dnh_occupancy(&trajectories());
        assert_eq!(occ.len(), 3);
        assert_eq!(occ[0], [1.0, 0.0, 0.0]);
        assert_eq!(occ[1], [0.5, 0.5, 0.0]);
        assert_eq!(occ[2], [0.0, 0.5, 0.5]);
        for row in &occ {
            assert_relative_eq!(row.iter().sum::<f64>(), 1.0);
        }
    }

    #[test]
    fn test_hs_occupancy_among_living() {
        let occ = hs_occupancy(&trajectories());
        assert_eq!(occ[0], [0.5, 0.5, 0.0, 0.0]);
        assert_eq!(occ[1], [0.0, 0.5, 0.5, 0.0]);
        // only the second individual is alive at cycle 2
        assert_eq!(occ[2], [0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_hs_occupancy_all_dead() {
        let all_dead = vec![Trajectory::from_parts(vec![D, D], vec![IHS, IHS]).unwrap()];
        assert_eq!(hs_occupancy(&all_dead), vec![[0.0; 4], [0.0; 4]]);
        assert!(dnh_occupancy(&[]).is_empty());
    }
}
