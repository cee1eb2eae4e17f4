// Content popularity sampler
//
// Zipf-Mandelbrot law over N ranks. Ranks are returned 0-based; the law is
// evaluated on the 1-based rank so that a shift of q = 0 is well defined:
//
//     P(rank = i) = (i + 1 + q)^-s / H,   H = sum over k in 1..=N of (k + q)^-s

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::ndn_error::{require_positive, SimError, SimResult};
use crate::ndn_interface::ContentId;

pub struct PopularitySampler {
    num_items: u64,
    shift: f64,
    exponent: f64,
    probabilities: Vec<f64>,
    index: WeightedIndex<f64>,
    rng: StdRng,
}

impl PopularitySampler {
    /// Sampler drawing from OS entropy
    pub fn new(num_items: u64, shift: f64, exponent: f64) -> SimResult<Self> {
        Self::with_rng(num_items, shift, exponent, StdRng::from_entropy())
    }

    /// Sampler with a fixed seed, for reproducible runs
    pub fn seeded(num_items: u64, shift: f64, exponent: f64, seed: u64) -> SimResult<Self> {
        Self::with_rng(num_items, shift, exponent, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(num_items: u64, shift: f64, exponent: f64, rng: StdRng) -> SimResult<Self> {
        if num_items == 0 {
            return Err(SimError::InvalidDomain {
                parameter: "num_contents",
                value: 0.0,
            });
        }
        if !shift.is_finite() || shift < 0.0 {
            return Err(SimError::InvalidDomain {
                parameter: "zipf_shift",
                value: shift,
            });
        }
        require_positive("zipf_exponent", exponent)?;

        let weights: Vec<f64> = (1..=num_items)
            .map(|rank| (rank as f64 + shift).powf(-exponent))
            .collect();
        let total: f64 = weights.iter().sum();
        let probabilities = weights.iter().map(|w| w / total).collect();

        let index = WeightedIndex::new(&weights).map_err(|_| SimError::InvalidDomain {
            parameter: "zipf_exponent",
            value: exponent,
        })?;

        Ok(Self {
            num_items,
            shift,
            exponent,
            probabilities,
            index,
            rng,
        })
    }

    /// Draw one content rank in [0, N)
    pub fn next(&mut self) -> ContentId {
        self.index.sample(&mut self.rng) as ContentId
    }

    /// Normalised probability of drawing `rank`
    pub fn probability(&self, rank: ContentId) -> f64 {
        self.probabilities.get(rank as usize).copied().unwrap_or(0.0)
    }

    pub fn num_items(&self) -> u64 {
        self.num_items
    }

    pub fn shift(&self) -> f64 {
        self.shift
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_item_always_rank_zero() {
        for (shift, exponent) in [(0.0, 0.1), (0.0, 0.8), (7.5, 2.0), (100.0, 5.0)] {
            let mut sampler = PopularitySampler::seeded(1, shift, exponent, 3).unwrap();
            for _ in 0..200 {
                assert_eq!(sampler.next(), 0);
            }
            assert!((sampler.probability(0) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_items_rejected() {
        assert!(matches!(
            PopularitySampler::new(0, 0.0, 0.8),
            Err(SimError::InvalidDomain { parameter: "num_contents", .. })
        ));
    }

    #[test]
    fn test_bad_parameters_rejected() {
        assert!(PopularitySampler::new(10, -1.0, 0.8).is_err());
        assert!(PopularitySampler::new(10, 0.0, 0.0).is_err());
        assert!(PopularitySampler::new(10, 0.0, -0.5).is_err());
        assert!(PopularitySampler::new(10, 0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_probabilities_follow_law() {
        let sampler = PopularitySampler::seeded(4, 1.0, 1.0, 0).unwrap();
        // weights 1/2, 1/3, 1/4, 1/5
        let h = 1.0 / 2.0 + 1.0 / 3.0 + 1.0 / 4.0 + 1.0 / 5.0;
        assert!((sampler.probability(0) - 0.5 / h).abs() < 1e-12);
        assert!((sampler.probability(3) - 0.2 / h).abs() < 1e-12);
        assert_eq!(sampler.probability(4), 0.0);

        let total: f64 = (0..4).map(|r| sampler.probability(r)).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_draws_in_range_and_skewed() {
        let mut sampler = PopularitySampler::seeded(50, 0.0, 1.2, 42).unwrap();
        let mut counts = vec![0usize; 50];
        for _ in 0..20_000 {
            let rank = sampler.next();
            assert!(rank < 50);
            counts[rank as usize] += 1;
        }

        // rank 0 carries ~30% of the mass, the tail far less
        assert!(counts[0] > counts[1]);
        assert!(counts[1] > counts[10]);
        assert!(counts[0] > 4_000);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = PopularitySampler::seeded(100, 0.0, 0.8, 9).unwrap();
        let mut b = PopularitySampler::seeded(100, 0.0, 0.8, 9).unwrap();
        let xs: Vec<_> = (0..50).map(|_| a.next()).collect();
        let ys: Vec<_> = (0..50).map(|_| b.next()).collect();
        assert_eq!(xs, ys);
    }
}
