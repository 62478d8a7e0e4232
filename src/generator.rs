//! Random vector generation.
//!
//! Components are drawn independently from a standard normal distribution and
//! cast to single precision. A seed makes the whole workload reproducible.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

pub type Vector = Vec<f32>;

pub struct VectorGenerator {
    rng: StdRng,
}

impl VectorGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// One vector of exactly `dimension` components.
    pub fn generate(&mut self, dimension: usize) -> Vector {
        (0..dimension)
            .map(|_| {
                let x: f64 = StandardNormal.sample(&mut self.rng);
                x as f32
            })
            .collect()
    }

    pub fn generate_many(&mut self, count: usize, dimension: usize) -> Vec<Vector> {
        (0..count).map(|_| self.generate(dimension)).collect()
    }
}

/// Key under which the `index`-th vector is inserted.
pub fn vector_key(index: usize) -> String {
    format!("vec_{}", index)
}
