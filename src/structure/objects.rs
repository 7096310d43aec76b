//! Reused embedded objects: the same image resource painted twice on a page,
//! and distinct image objects that carry the same picture.

use std::collections::BTreeMap;

use anyhow::Result;
use image::DynamicImage;
use image_hasher::{HashAlg, Hasher, HasherConfig, ImageHash};
use lopdf::content::Operation;
use lopdf::{Object, ObjectId};

use super::container::{format_object_id, ImageRef};
use crate::models::{DuplicateImage, StructuralClone};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "docforensics::structure";

use crate::log_debug;

/// Images of one page referenced more than once, counting both extra
/// resource names and repeated `Do` paints.
pub fn find_structural_clones(
    page_number: u32,
    images: &[ImageRef],
    operations: &[Operation],
) -> Vec<StructuralClone> {
    let mut paints: BTreeMap<&str, u32> = BTreeMap::new();
    for op in operations.iter().filter(|op| op.operator == "Do") {
        if let Some(Object::Name(name)) = op.operands.first() {
            if let Some(image) = images.iter().find(|image| image.name.as_bytes() == name.as_slice()) {
                *paints.entry(image.name.as_str()).or_default() += 1;
            }
        }
    }

    let mut by_object: BTreeMap<ObjectId, Vec<&ImageRef>> = BTreeMap::new();
    for image in images {
        by_object.entry(image.object_id).or_default().push(image);
    }

    by_object
        .into_iter()
        .filter_map(|(object_id, names)| {
            let count: u32 = names
                .iter()
                .map(|image| paints.get(image.name.as_str()).copied().unwrap_or(0).max(1))
                .sum();
            (count > 1).then(|| StructuralClone {
                page: page_number,
                object_id: format_object_id(object_id),
                count,
                usage_names: names.iter().map(|image| image.name.clone()).collect(),
            })
        })
        .collect()
}

/// Perceptual hashing of embedded pictures (double-gradient, 8×8).
pub struct PictureHasher {
    hasher: Hasher,
}

impl PictureHasher {
    pub fn new() -> Self {
        let hasher = HasherConfig::new()
            .hash_alg(HashAlg::DoubleGradient)
            .hash_size(8, 8)
            .to_hasher();
        Self { hasher }
    }

    pub fn hash(&self, image: &DynamicImage) -> ImageHash {
        self.hasher.hash_image(image)
    }
}

impl Default for PictureHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Pairs of distinct objects whose hashes are within `max_distance` bits.
pub fn find_duplicates(
    hashes: &[(ObjectId, ImageHash)],
    max_distance: u32,
) -> Vec<DuplicateImage> {
    let mut duplicates = Vec::new();
    for (i, (first_id, first_hash)) in hashes.iter().enumerate() {
        for (second_id, second_hash) in &hashes[i + 1..] {
            if first_id == second_id {
                continue;
            }
            let distance = first_hash.dist(second_hash);
            if distance <= max_distance {
                duplicates.push(DuplicateImage {
                    first_object: format_object_id(*first_id),
                    second_object: format_object_id(*second_id),
                    hamming_distance: distance,
                });
            }
        }
    }
    duplicates
}

/// Hash every decodable picture, skipping the ones that fail.
pub fn hash_pictures<F>(ids: &[ObjectId], mut decode: F) -> Vec<(ObjectId, ImageHash)>
where
    F: FnMut(ObjectId) -> Result<DynamicImage>,
{
    let hasher = PictureHasher::new();
    ids.iter()
        .filter_map(|id| match decode(*id) {
            Ok(picture) => Some((*id, hasher.hash(&picture))),
            Err(err) => {
                log_debug!("skipping picture {}: {err:#}", format_object_id(*id));
                None
            }
        })
        .collect()
}
