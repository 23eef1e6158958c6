//! Lookup tables built once after loading.

use std::collections::BTreeMap;

use super::ids::ImageId;
use super::model::{Annotation, Dataset, Image};

/// Image-by-id table plus the image → annotations grouping.
///
/// Holds positions into the borrowed [`Dataset`] rather than copies, so the
/// records stay owned in one place.
#[derive(Debug)]
pub struct DatasetIndex<'a> {
    dataset: &'a Dataset,
    images: BTreeMap<ImageId, usize>,
    by_image: BTreeMap<ImageId, Vec<usize>>,
    duplicate_images: Vec<usize>,
    orphans: Vec<usize>,
}

impl<'a> DatasetIndex<'a> {
    /// Builds the index. For a duplicated image id the first entry wins and
    /// later ones are listed by [`duplicate_images`](Self::duplicate_images).
    pub fn build(dataset: &'a Dataset) -> Self {
        let mut images = BTreeMap::new();
        let mut duplicate_images = Vec::new();
        for (pos, image) in dataset.images.iter().enumerate() {
            if images.contains_key(&image.id) {
                duplicate_images.push(pos);
            } else {
                images.insert(image.id, pos);
            }
        }

        let mut by_image: BTreeMap<ImageId, Vec<usize>> = BTreeMap::new();
        let mut orphans = Vec::new();
        for (pos, ann) in dataset.annotations.iter().enumerate() {
            if images.contains_key(&ann.image_id) {
                by_image.entry(ann.image_id).or_default().push(pos);
            } else {
                orphans.push(pos);
            }
        }

        Self {
            dataset,
            images,
            by_image,
            duplicate_images,
            orphans,
        }
    }

    pub fn image(&self, id: ImageId) -> Option<&'a Image> {
        self.images.get(&id).map(|&pos| &self.dataset.images[pos])
    }

    /// Unique image ids in ascending order.
    pub fn image_ids(&self) -> Vec<ImageId> {
        self.images.keys().copied().collect()
    }

    /// Annotations of one image, in document order.
    pub fn annotations_for(&self, id: ImageId) -> impl Iterator<Item = &'a Annotation> + '_ {
        let dataset = self.dataset;
        self.by_image
            .get(&id)
            .into_iter()
            .flatten()
            .map(move |&pos| &dataset.annotations[pos])
    }

    /// Image entries shadowed by an earlier entry with the same id.
    pub fn duplicate_images(&self) -> impl Iterator<Item = &'a Image> + '_ {
        let dataset = self.dataset;
        self.duplicate_images
            .iter()
            .map(move |&pos| &dataset.images[pos])
    }

    /// Annotations whose `image_id` matches no image.
    pub fn orphan_annotations(&self) -> impl Iterator<Item = &'a Annotation> + '_ {
        let dataset = self.dataset;
        self.orphans.iter().map(move |&pos| &dataset.annotations[pos])
    }
}
