use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::catalog::FoodItem;

/// Anything the sampler can weight by glycemic index.
pub trait GlycemicWeighted {
    fn glycemic_index(&self) -> u16;
}

impl GlycemicWeighted for FoodItem {
    fn glycemic_index(&self) -> u16 {
        self.effective_gi()
    }
}

impl<T: GlycemicWeighted> GlycemicWeighted for &T {
    fn glycemic_index(&self) -> u16 {
        (**self).glycemic_index()
    }
}

/// `max(1, 50 - gi)`.
pub fn weight_for(gi: u16) -> f64 {
    f64::from((50 - i32::from(gi)).max(1))
}

/// Result of one selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<T> {
    /// Chosen items, ascending by glycemic index.
    pub selected: Vec<T>,
    /// Whether the generator was used at all.
    pub sampled: bool,
    pub draw_pool: usize,
    pub draws: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeightedSampler {
    pool_multiplier: usize,
    draws_per_item: usize,
}

impl Default for WeightedSampler {
    fn default() -> Self {
        Self::new(3)
    }
}

impl WeightedSampler {
    pub fn new(pool_multiplier: usize) -> Self {
        Self {
            pool_multiplier: pool_multiplier.max(1),
            draws_per_item: 32,
        }
    }

    /// Picks `min(k, candidates.len())` distinct items from the leading
    /// `min(len, pool_multiplier * k)` candidates.
    ///
    /// Draws with replacement and discards repeats. Once the draw budget runs out the remaining
    /// slots are filled by draws that exclude already-picked items, so the count is exact.
    /// The generator is created here from `seed` and never shared.
    pub fn select<T>(&self, candidates: &[T], k: usize, seed: u32) -> Sample<T>
    where
        T: GlycemicWeighted + Clone,
    {
        if candidates.len() <= k {
            let mut selected = candidates.to_vec();
            selected.sort_by_key(|item| item.glycemic_index());
            return Sample {
                selected,
                sampled: false,
                draw_pool: candidates.len(),
                draws: 0,
            };
        }

        let pool = &candidates[..candidates.len().min(self.pool_multiplier.saturating_mul(k))];
        let mut weights: Vec<f64> = pool
            .iter()
            .map(|item| weight_for(item.glycemic_index()))
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(u64::from(seed));
        let mut picked = vec![false; pool.len()];
        let mut order = Vec::with_capacity(k);
        let mut draws = 0;

        if let Ok(distribution) = WeightedIndex::new(&weights) {
            let budget = self.draws_per_item.saturating_mul(k);
            while order.len() < k && draws < budget {
                let index = distribution.sample(&mut rng);
                draws += 1;
                if !picked[index] {
                    picked[index] = true;
                    order.push(index);
                }
            }
        }

        while order.len() < k.min(pool.len()) {
            for (weight, taken) in weights.iter_mut().zip(&picked) {
                if *taken {
                    *weight = 0.0;
                }
            }
            let Ok(distribution) = WeightedIndex::new(&weights) else {
                break;
            };
            let index = distribution.sample(&mut rng);
            draws += 1;
            picked[index] = true;
            order.push(index);
        }

        let mut selected: Vec<T> = order.into_iter().map(|index| pool[index].clone()).collect();
        selected.sort_by_key(|item| item.glycemic_index());

        Sample {
            selected,
            sampled: true,
            draw_pool: pool.len(),
            draws,
        }
    }
}
