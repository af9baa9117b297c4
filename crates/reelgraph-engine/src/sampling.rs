//! Weighted categorical sampling.
//!
//! Both stochastic choices of the walk engine — the start-node draw and the
//! per-step neighbor draw — go through this one primitive: given a weight
//! vector, draw an index with probability proportional to its weight. The
//! cumulative sums are computed once at construction, so a cached sampler
//! never recomputes them across draws.

use rand::Rng;

/// A categorical distribution over indices `0..len`, sampled by weight.
#[derive(Clone, Debug)]
pub struct WeightedSampler {
    cumulative: Vec<f64>,
    total: f64,
}

impl WeightedSampler {
    /// Builds a sampler from a weight slice. Returns `None` for an empty
    /// slice. Non-positive weights are treated as zero; if the total weight
    /// is zero, sampling falls back to a uniform choice.
    pub fn new(weights: &[f64]) -> Option<Self> {
        if weights.is_empty() {
            return None;
        }
        let mut cumulative = Vec::with_capacity(weights.len());
        let mut total = 0.0;
        for &w in weights {
            if w.is_finite() && w > 0.0 {
                total += w;
            }
            cumulative.push(total);
        }
        Some(Self { cumulative, total })
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    /// Whether the sampler has no categories.
    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    /// Draws one index with probability proportional to its weight.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        if self.total > 0.0 {
            let x = rng.gen::<f64>() * self.total;
            // First index whose cumulative weight exceeds x; zero-weight
            // entries form plateaus and are never selected.
            self.cumulative
                .partition_point(|&c| c <= x)
                .min(self.cumulative.len() - 1)
        } else {
            rng.gen_range(0..self.cumulative.len())
        }
    }
}
