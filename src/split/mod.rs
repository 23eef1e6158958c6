//! Train/validation/test partitioning of whole images.

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

use crate::coco::ImageId;
use crate::error::ConvertError;

/// Default seed, so repeated runs split identically unless asked otherwise.
pub const DEFAULT_SEED: u64 = 33;

/// One partition of the output dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    /// Directory name under `images/` and `labels/`, also the `data.yaml` key.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

/// Fractions of the images that go to validation and test; train gets
/// the rest.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitRatios {
    pub val: f64,
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            val: 0.1,
            test: 0.2,
        }
    }
}

impl SplitRatios {
    /// No validation or test split; every image goes to train.
    pub fn train_only() -> Self {
        Self {
            val: 0.0,
            test: 0.0,
        }
    }

    /// Checks both fractions lie in `[0, 1]` and sum to at most 1.
    pub fn validate(&self) -> Result<(), ConvertError> {
        for (name, value) in [("val", self.val), ("test", self.test)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConvertError::InvalidSplit {
                    message: format!("{name} fraction {value} must be in [0.0, 1.0]"),
                });
            }
        }
        if self.val + self.test > 1.0 {
            return Err(ConvertError::InvalidSplit {
                message: format!(
                    "val ({}) + test ({}) must not exceed 1.0",
                    self.val, self.test
                ),
            });
        }
        Ok(())
    }

    /// Splits that get directories: train always, val/test when non-zero.
    pub fn active_splits(&self) -> Vec<Split> {
        let mut splits = vec![Split::Train];
        if self.val > 0.0 {
            splits.push(Split::Val);
        }
        if self.test > 0.0 {
            splits.push(Split::Test);
        }
        splits
    }
}

/// Image ids per split, each list in ascending order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitAssignment {
    pub train: Vec<ImageId>,
    pub val: Vec<ImageId>,
    pub test: Vec<ImageId>,
}

impl SplitAssignment {
    pub fn ids(&self, split: Split) -> &[ImageId] {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
            Split::Test => &self.test,
        }
    }

    pub fn split_of(&self, id: ImageId) -> Option<Split> {
        [Split::Train, Split::Val, Split::Test]
            .into_iter()
            .find(|split| self.ids(*split).binary_search(&id).is_ok())
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Number of images a fraction asks for, rounded up and capped at `available`.
fn portion(total: usize, fraction: f64, available: usize) -> usize {
    if fraction <= 0.0 {
        return 0;
    }
    ((total as f64 * fraction).ceil() as usize).min(available)
}

/// Partitions image ids with a seeded shuffle.
///
/// Ids are deduplicated and sorted before shuffling, so the result depends
/// only on the id set, the ratios and the seed. The first `ceil(n * test)`
/// shuffled ids go to test, the next `ceil(n * val)` to val, the rest to
/// train.
pub fn split_image_ids(
    ids: &[ImageId],
    ratios: SplitRatios,
    seed: u64,
) -> Result<SplitAssignment, ConvertError> {
    ratios.validate()?;

    let mut shuffled = ids.to_vec();
    shuffled.sort();
    shuffled.dedup();

    let mut rng = StdRng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);

    let total = shuffled.len();
    let n_test = portion(total, ratios.test, total);
    let n_val = portion(total, ratios.val, total - n_test);

    let mut test: Vec<ImageId> = shuffled.drain(..n_test).collect();
    let mut val: Vec<ImageId> = shuffled.drain(..n_val).collect();
    let mut train = shuffled;

    test.sort();
    val.sort();
    train.sort();

    Ok(SplitAssignment { train, val, test })
}
