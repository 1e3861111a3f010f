use rand::Rng;
use serde::{Deserialize, Serialize};

use super::features::{Feature, FEATURE_COUNT, features};
use super::PolicyError;

/// Integer gene weights, one per entry of the fixed feature list.
///
/// The length is checked on construction and never changes afterwards, so
/// every weighted policy can be scored by the same evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<i32>", into = "Vec<i32>")]
pub struct WeightedPolicy {
    genes: Vec<i32>,
}

impl WeightedPolicy {
    pub fn new(genes: Vec<i32>) -> Result<Self, PolicyError> {
        if genes.len() != FEATURE_COUNT {
            return Err(PolicyError::GeneLength { expected: FEATURE_COUNT, found: genes.len() });
        }
        Ok(WeightedPolicy { genes })
    }

    /// Uniform genes in `-span..=span`.
    pub fn random<R: Rng + ?Sized>(span: i32, rng: &mut R) -> Self {
        let span = span.abs();
        WeightedPolicy { genes: (0..FEATURE_COUNT).map(|_| rng.gen_range(-span..=span)).collect() }
    }

    /// A hand-tuned starting point: value empty space, reward score.
    pub fn hand_tuned() -> Self {
        let genes = features()
            .iter()
            .map(|f| match f {
                Feature::EmptyCount => 8,
                Feature::Score => 1,
                Feature::CellLog2(idx) if *idx < 4 => 2,
                _ => 0,
            })
            .collect();
        WeightedPolicy { genes }
    }

    #[inline]
    pub fn genes(&self) -> &[i32] { &self.genes }

    /// Per gene, with probability `rate`, add +1 or -1.
    pub fn mutate<R: Rng + ?Sized>(&mut self, rate: f64, rng: &mut R) {
        for gene in &mut self.genes {
            if rng.gen_bool(rate) {
                *gene += if rng.gen_bool(0.5) { 1 } else { -1 };
            }
        }
    }
}

impl TryFrom<Vec<i32>> for WeightedPolicy {
    type Error = PolicyError;

    fn try_from(genes: Vec<i32>) -> Result<Self, Self::Error> { WeightedPolicy::new(genes) }
}

impl From<WeightedPolicy> for Vec<i32> {
    fn from(policy: WeightedPolicy) -> Self { policy.genes }
}
