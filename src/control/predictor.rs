//! Distance-weighted nearest-neighbor relay predictor.
//!
//! Every remote relay command becomes a [`TrainingExample`].  Offline,
//! the predictor answers "what would the operator have done here?" with
//! a majority vote of the `k` closest examples.
//!
//! ## Distance
//!
//! ```text
//! object flag differs  →  mismatch_distance            (99 999)
//! otherwise            →  |ΔT| + humidity_weight·|ΔH|  (weight 0.5)
//! ```
//!
//! ## Vote
//!
//! The `k_eff = min(k, samples)` closest examples are selected.  Any of
//! them further than `rejection_distance` cannot vote ON, but still counts
//! in `k_eff`, so a neighborhood of mostly distant examples leans OFF.
//! The relay is ON only on a strict majority: `votes_on > k_eff / 2`.

use heapless::Vec;

use crate::config::SystemConfig;

use super::context::Observation;
use super::sample_store::{SampleStore, TrainingExample};

/// Tuning knobs, lifted out of [`SystemConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictorParams {
    /// Upper bound on neighbors consulted (k).
    pub neighbor_count: usize,
    pub humidity_weight: f32,
    pub mismatch_distance: f32,
    pub rejection_distance: f32,
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self::from_config(&SystemConfig::default())
    }
}

impl PredictorParams {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            neighbor_count: config.neighbor_count as usize,
            humidity_weight: config.humidity_weight,
            mismatch_distance: config.mismatch_distance,
            rejection_distance: config.rejection_distance,
        }
    }
}

/// Outcome of one vote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recommendation {
    pub relay_on: bool,
    /// Neighbors that voted ON.
    pub votes_on: usize,
    /// Neighbors in the denominator (`min(k, samples)`).
    pub neighbors: usize,
    /// Share of `neighbors` backing the outcome, in `[0, 1]`.
    /// Zero when there is nothing to vote with.
    pub confidence: f32,
}

impl Recommendation {
    const UNTRAINED: Self = Self {
        relay_on: false,
        votes_on: 0,
        neighbors: 0,
        confidence: 0.0,
    };
}

/// k-NN classifier that owns its sample memory.
#[derive(Debug)]
pub struct Predictor<const N: usize> {
    store: SampleStore<N>,
    params: PredictorParams,
}

impl<const N: usize> Predictor<N> {
    pub const fn new(params: PredictorParams) -> Self {
        Self {
            store: SampleStore::new(),
            params,
        }
    }

    /// Remember an example.
    pub fn train(&mut self, example: TrainingExample) {
        self.store.push(example);
    }

    /// Number of examples available to vote.
    pub fn sample_count(&self) -> usize {
        self.store.len()
    }

    /// Read-only view of the sample memory.
    pub fn samples(&self) -> &SampleStore<N> {
        &self.store
    }

    /// Relay recommendation for `query`.  `false` when untrained.
    pub fn predict(&self, query: &Observation) -> bool {
        self.recommend(query).relay_on
    }

    /// Full vote for `query`, including confidence.
    pub fn recommend(&self, query: &Observation) -> Recommendation {
        if self.store.is_empty() {
            return Recommendation::UNTRAINED;
        }

        let mut scored: Vec<(f32, bool), N> = self
            .store
            .iter_valid()
            .map(|ex| (self.distance(ex, query), ex.relay_on))
            .collect();
        scored.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        // k_eff ≥ 1 here: the store is non-empty and k ≥ 1 is a config invariant.
        let k_eff = self.params.neighbor_count.min(scored.len());
        let votes_on = scored[..k_eff]
            .iter()
            .filter(|(distance, relay_on)| *distance <= self.params.rejection_distance && *relay_on)
            .count();

        let relay_on = votes_on > k_eff / 2;
        let backing = if relay_on { votes_on } else { k_eff - votes_on };
        let confidence = if k_eff == 0 {
            0.0
        } else {
            backing as f32 / k_eff as f32
        };

        Recommendation {
            relay_on,
            votes_on,
            neighbors: k_eff,
            confidence,
        }
    }

    fn distance(&self, example: &TrainingExample, query: &Observation) -> f32 {
        if example.object_present != query.object_present {
            return self.params.mismatch_distance;
        }
        let dt = (example.temperature_c - query.temperature_c).abs();
        let dh = (example.humidity_pct - query.humidity_pct).abs();
        dt + self.params.humidity_weight * dh
    }
}

impl<const N: usize> Default for Predictor<N> {
    fn default() -> Self {
        Self::new(PredictorParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trained(examples: &[TrainingExample]) -> Predictor<20> {
        let mut p = Predictor::default();
        for ex in examples {
            p.train(*ex);
        }
        p
    }

    #[test]
    fn untrained_predicts_off() {
        let p: Predictor<20> = Predictor::default();
        assert_eq!(p.sample_count(), 0);
        assert!(!p.predict(&Observation::new(25.0, 40.0, true)));
        assert_eq!(p.recommend(&Observation::default()).neighbors, 0);
    }

    #[test]
    fn unanimous_neighbors_predict_on() {
        let p = trained(&[
            TrainingExample::new(20.0, 40.0, true, true),
            TrainingExample::new(21.0, 40.0, true, true),
            TrainingExample::new(22.0, 40.0, true, true),
        ]);
        let rec = p.recommend(&Observation::new(21.0, 41.0, true));
        assert!(rec.relay_on);
        assert_eq!(rec.votes_on, 3);
        assert!((rec.confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn nearest_neighbors_outvote_distant_ones() {
        let p = trained(&[
            TrainingExample::new(100.0, 40.0, true, true),
            TrainingExample::new(101.0, 40.0, true, true),
            TrainingExample::new(150.0, 40.0, true, false),
            TrainingExample::new(151.0, 40.0, true, false),
            TrainingExample::new(152.0, 40.0, true, false),
        ]);
        assert!(!p.predict(&Observation::new(150.0, 40.0, true)));
        // k=3 around 100: two ON at distance ≤1, one OFF at 49 → ON.
        assert!(p.predict(&Observation::new(100.5, 40.0, true)));
    }

    #[test]
    fn humidity_counts_half() {
        let mut p = Predictor::<20>::new(PredictorParams {
            neighbor_count: 1,
            ..PredictorParams::default()
        });
        // 10 %RH away (weighted 5) beats 6 °C away; at weight 1.0 it would not.
        p.train(TrainingExample::new(30.0, 40.0, true, true));
        p.train(TrainingExample::new(36.0, 50.0, true, false));
        assert!(p.predict(&Observation::new(30.0, 50.0, true)));
    }

    #[test]
    fn object_mismatch_never_votes() {
        let p = trained(&[
            TrainingExample::new(25.0, 40.0, false, true),
            TrainingExample::new(25.0, 40.0, false, true),
            TrainingExample::new(25.0, 40.0, false, true),
        ]);
        let rec = p.recommend(&Observation::new(25.0, 40.0, true));
        assert!(!rec.relay_on);
        assert_eq!(rec.votes_on, 0);
        assert_eq!(rec.neighbors, 3, "rejected neighbors still count toward k_eff");
    }

    #[test]
    fn rejected_neighbors_dilute_majority() {
        // One close ON example and two mismatched ON examples: k_eff = 3,
        // only one vote counts, 1 > 3/2 is false.
        let p = trained(&[
            TrainingExample::new(25.0, 40.0, true, true),
            TrainingExample::new(25.0, 40.0, false, true),
            TrainingExample::new(25.0, 40.0, false, true),
        ]);
        assert!(!p.predict(&Observation::new(25.0, 40.0, true)));
    }

    #[test]
    fn tie_votes_off() {
        let mut p = Predictor::<20>::new(PredictorParams {
            neighbor_count: 2,
            ..PredictorParams::default()
        });
        p.train(TrainingExample::new(25.0, 40.0, true, true));
        p.train(TrainingExample::new(26.0, 40.0, true, false));
        let rec = p.recommend(&Observation::new(25.5, 40.0, true));
        assert_eq!(rec.votes_on, 1);
        assert!(!rec.relay_on);
    }

    #[test]
    fn single_sample_decides_alone() {
        let p = trained(&[TrainingExample::new(25.0, 40.0, true, true)]);
        let rec = p.recommend(&Observation::new(60.0, 10.0, true));
        assert_eq!(rec.neighbors, 1);
        assert!(rec.relay_on);
    }

    #[test]
    fn unreadable_sentinel_is_just_a_number() {
        let p = trained(&[
            TrainingExample::new(-1.0, -1.0, true, true),
            TrainingExample::new(-1.0, -1.0, true, true),
        ]);
        assert!(p.predict(&Observation::new(-1.0, -1.0, true)));
    }

    #[test]
    fn nan_query_does_not_panic() {
        let p = trained(&[
            TrainingExample::new(25.0, 40.0, true, true),
            TrainingExample::new(30.0, 40.0, true, false),
        ]);
        let _ = p.predict(&Observation::new(f32::NAN, 40.0, true));
    }
}
