// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Classification aggregator
//!
//! Turns per-face classification bytes into recognized objects. Each anchor's
//! faces are grouped by class; a group large enough to not be noise yields one
//! candidate whose centroid is the centre of the group's world-space bounds.
//!
//! Candidates are deduplicated against everything seen so far: same label and
//! centroids closer than the proximity threshold means the same object. The
//! detection with more supporting triangles wins; on a tie the earlier one is
//! kept. A late detection that beats every stored neighbour replaces the first
//! of them in place and absorbs the rest.

use crate::platform::PlaneObservation;
use roomscan_core::{AnchorId, RecognizedObject, SemanticLabel};
use roomscan_geometry::transform::transform_point;
use roomscan_geometry::{Aabb, MeshAnchor, Point3};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Triangles of one class within one anchor
#[derive(Debug)]
struct ClassGroup {
    class: u8,
    triangles: usize,
    bounds: Aabb,
}

/// Objects an ingest call added or upgraded
#[derive(Debug, Clone, Default)]
pub struct ClassificationOutcome {
    pub added: Vec<RecognizedObject>,
    pub refined: Vec<RecognizedObject>,
}

impl ClassificationOutcome {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.refined.is_empty()
    }
}

/// Running object list and floor accumulator for one scan
#[derive(Debug)]
pub struct ClassificationAggregator {
    proximity_threshold: f32,
    min_group_triangles: usize,
    min_confidence: f32,
    objects: Vec<RecognizedObject>,
    /// Floor samples per source, in first-seen order
    floor: Vec<(AnchorId, Vec<Point3<f32>>)>,
    floor_index: FxHashMap<AnchorId, usize>,
}

impl ClassificationAggregator {
    pub fn new(proximity_threshold: f32, min_group_triangles: usize, min_confidence: f32) -> Self {
        Self {
            proximity_threshold,
            min_group_triangles,
            min_confidence,
            objects: Vec::new(),
            floor: Vec::new(),
            floor_index: FxHashMap::default(),
        }
    }

    /// Classify one anchor's geometry.
    ///
    /// Anchors without usable classification data are skipped silently.
    pub fn classify(&mut self, anchor: &MeshAnchor) -> ClassificationOutcome {
        let mut outcome = ClassificationOutcome::default();
        let Some(classes) = anchor.classification_data() else {
            tracing::trace!(anchor = %anchor.id, "No classification data");
            return outcome;
        };

        let world: Vec<Point3<f32>> = anchor
            .vertices
            .iter()
            .map(|v| transform_point(&anchor.transform, v))
            .collect();

        // Rooms rarely show more than a handful of classes per anchor
        let mut groups: SmallVec<[ClassGroup; 8]> = SmallVec::new();
        for (face, &class) in anchor.faces.iter().zip(classes) {
            let slot = match groups.iter().position(|g| g.class == class) {
                Some(slot) => slot,
                None => {
                    groups.push(ClassGroup {
                        class,
                        triangles: 0,
                        bounds: Aabb::empty(),
                    });
                    groups.len() - 1
                }
            };
            let group = &mut groups[slot];
            group.triangles += 1;
            for &i in face {
                if let Some(p) = world.get(i as usize) {
                    group.bounds.expand(p);
                }
            }
        }

        let total = anchor.faces.len();
        let min_triangles = self.min_group_triangles;
        let mut floor_centroid = None;

        for group in groups
            .iter()
            .filter(|g| g.triangles > min_triangles && g.bounds.is_valid())
        {
            let label = SemanticLabel::from_raw(group.class);
            let centroid = group.bounds.center();
            if label == SemanticLabel::Floor {
                floor_centroid = Some(centroid);
            }

            let confidence = (2.0 * group.triangles as f32 / total as f32).min(1.0);
            if confidence < self.min_confidence {
                tracing::trace!(
                    anchor = %anchor.id,
                    %label,
                    confidence,
                    "Below confidence threshold"
                );
                continue;
            }

            let candidate = RecognizedObject {
                label,
                category: label.category(),
                confidence,
                centroid: [centroid.x, centroid.y, centroid.z],
                bounds: group.bounds.to_bounding_box(),
                classification: group.class,
                support: group.triangles,
                source: anchor.id,
            };
            self.offer(candidate, &mut outcome);
        }

        self.set_floor_points(anchor.id, floor_centroid.into_iter().collect());
        outcome
    }

    /// Record a detected plane. Floor planes feed the outline with their
    /// boundary; every plane becomes an object with full confidence.
    pub fn observe_plane(&mut self, plane: &PlaneObservation) -> ClassificationOutcome {
        let mut outcome = ClassificationOutcome::default();
        let polygon = plane.world_polygon();
        let bounds = Aabb::from_points(polygon.iter());
        if !bounds.is_valid() {
            tracing::debug!(plane = %plane.id, "Plane without usable boundary");
            return outcome;
        }

        let centroid = bounds.center();
        let candidate = RecognizedObject {
            label: plane.label,
            category: plane.label.category(),
            confidence: 1.0,
            centroid: [centroid.x, centroid.y, centroid.z],
            bounds: bounds.to_bounding_box(),
            classification: plane.label.raw(),
            support: polygon.len(),
            source: plane.id,
        };
        self.offer(candidate, &mut outcome);

        if plane.label == SemanticLabel::Floor {
            self.set_floor_points(plane.id, polygon);
        }
        outcome
    }

    fn offer(&mut self, candidate: RecognizedObject, outcome: &mut ClassificationOutcome) {
        let threshold = self.proximity_threshold;
        let duplicates: SmallVec<[usize; 4]> = self
            .objects
            .iter()
            .enumerate()
            .filter(|(_, existing)| candidate.is_duplicate_of(existing, threshold))
            .map(|(slot, _)| slot)
            .collect();

        let Some(&first) = duplicates.first() else {
            tracing::debug!(
                label = %candidate.label,
                confidence = candidate.confidence,
                "Recognized object"
            );
            self.objects.push(candidate.clone());
            outcome.added.push(candidate);
            return;
        };

        // Every duplicate must be outranked
        if !duplicates
            .iter()
            .all(|&slot| candidate.outranks(&self.objects[slot]))
        {
            return;
        }

        tracing::debug!(
            label = %candidate.label,
            support = candidate.support,
            previous = self.objects[first].support,
            absorbed = duplicates.len() - 1,
            "Refined object"
        );
        self.objects[first] = candidate.clone();
        for &slot in duplicates[1..].iter().rev() {
            self.objects.remove(slot);
        }
        outcome.refined.push(candidate);
    }

    fn set_floor_points(&mut self, source: AnchorId, points: Vec<Point3<f32>>) {
        match self.floor_index.get(&source) {
            Some(&slot) => self.floor[slot].1 = points,
            None if points.is_empty() => {}
            None => {
                self.floor_index.insert(source, self.floor.len());
                self.floor.push((source, points));
            }
        }
    }

    pub fn objects(&self) -> &[RecognizedObject] {
        &self.objects
    }

    /// All floor samples, grouped by source in first-seen order
    pub fn floor_points(&self) -> Vec<Point3<f32>> {
        self.floor
            .iter()
            .flat_map(|(_, points)| points.iter().copied())
            .collect()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.floor.clear();
        self.floor_index.clear();
    }
}

/// List-level dedup: no two results share a label within `threshold`.
///
/// Greedy suppression by rank: the strongest detection is kept first, and
/// anything within `threshold` of a kept entry is dropped. Equal rank keeps
/// the earlier entry. Survivors come back in input order.
pub fn dedup_objects(objects: Vec<RecognizedObject>, threshold: f32) -> Vec<RecognizedObject> {
    let mut ranked: Vec<(usize, RecognizedObject)> = objects.into_iter().enumerate().collect();
    // Stable sort, ties stay in input order
    ranked.sort_by(|(_, a), (_, b)| {
        b.support
            .cmp(&a.support)
            .then(b.confidence.total_cmp(&a.confidence))
    });

    let mut kept: Vec<(usize, RecognizedObject)> = Vec::with_capacity(ranked.len());
    for (index, candidate) in ranked {
        if !kept
            .iter()
            .any(|(_, existing)| candidate.is_duplicate_of(existing, threshold))
        {
            kept.push((index, candidate));
        }
    }

    kept.sort_unstable_by_key(|(index, _)| *index);
    kept.into_iter().map(|(_, object)| object).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use roomscan_geometry::transform::translation;
    use roomscan_geometry::{Matrix4, Vector3};

    /// Strip of `n` triangles along +x, centred on the origin in x and z
    fn strip(id: u128, n: usize, class: u8, transform: Matrix4<f32>) -> MeshAnchor {
        let mut vertices = Vec::new();
        let mut faces = Vec::new();
        for i in 0..=n {
            let x = i as f32 - n as f32 / 2.0;
            vertices.push(Point3::new(x, 0.0, -0.5));
            vertices.push(Point3::new(x, 0.0, 0.5));
        }
        for i in 0..n as u32 {
            faces.push([2 * i, 2 * i + 1, 2 * i + 2]);
        }
        let normals = vec![Vector3::y(); vertices.len()];
        MeshAnchor::new(AnchorId::from_u128(id), transform, vertices, normals, faces)
            .with_classifications(vec![class; n])
    }

    fn aggregator() -> ClassificationAggregator {
        ClassificationAggregator::new(0.5, 10, 0.0)
    }

    const FLOOR: u8 = 2;
    const TABLE: u8 = 4;

    #[test]
    fn test_single_group_is_recognized() {
        let mut agg = aggregator();
        let outcome = agg.classify(&strip(1, 12, FLOOR, translation(0.0, -1.0, 3.0)));

        assert_eq!(outcome.added.len(), 1);
        let floor = &agg.objects()[0];
        assert_eq!(floor.label, SemanticLabel::Floor);
        assert_eq!(floor.support, 12);
        assert_relative_eq!(floor.confidence, 1.0);
        assert_eq!(floor.centroid, [0.0, -1.0, 3.0]);
        assert_eq!(agg.floor_points(), vec![Point3::new(0.0, -1.0, 3.0)]);
    }

    #[test]
    fn test_small_groups_are_noise() {
        let mut agg = aggregator();
        let outcome = agg.classify(&strip(1, 10, FLOOR, Matrix4::identity()));
        assert!(outcome.is_empty());
        assert!(agg.objects().is_empty());
        assert!(agg.floor_points().is_empty());
    }

    #[test]
    fn test_confidence_is_doubled_share() {
        let mut anchor = strip(1, 40, FLOOR, Matrix4::identity());
        let mut classes = vec![FLOOR; 40];
        for c in classes.iter_mut().take(12) {
            *c = TABLE;
        }
        anchor.classifications = Some(classes);

        let mut agg = aggregator();
        agg.classify(&anchor);

        let table = agg
            .objects()
            .iter()
            .find(|o| o.label == SemanticLabel::Table)
            .unwrap();
        assert_relative_eq!(table.confidence, 0.6);
        let floor = agg
            .objects()
            .iter()
            .find(|o| o.label == SemanticLabel::Floor)
            .unwrap();
        assert_relative_eq!(floor.confidence, 1.0);
    }

    #[test]
    fn test_without_classification_is_noop() {
        let mut anchor = strip(1, 20, FLOOR, Matrix4::identity());
        anchor.classifications = None;
        let mut agg = aggregator();
        assert!(agg.classify(&anchor).is_empty());

        // Misaligned buffer is treated the same way
        anchor.classifications = Some(vec![FLOOR; 3]);
        assert!(agg.classify(&anchor).is_empty());
    }

    #[test]
    fn test_same_anchor_twice_is_idempotent() {
        let anchor = strip(1, 20, FLOOR, Matrix4::identity());
        let mut agg = aggregator();
        agg.classify(&anchor);
        let second = agg.classify(&anchor);

        assert!(second.is_empty());
        assert_eq!(agg.objects().len(), 1);
        assert_eq!(agg.floor_points().len(), 1);
    }

    #[test]
    fn test_nearby_floor_detections_merge() {
        let mut agg = aggregator();
        agg.classify(&strip(1, 20, FLOOR, Matrix4::identity()));
        agg.classify(&strip(2, 20, FLOOR, translation(0.2, 0.0, 0.0)));

        let floors: Vec<_> = agg
            .objects()
            .iter()
            .filter(|o| o.label == SemanticLabel::Floor)
            .collect();
        assert_eq!(floors.len(), 1);
        assert_eq!(floors[0].source, AnchorId::from_u128(1));
    }

    #[test]
    fn test_stronger_detection_refines_in_place() {
        let mut agg = aggregator();
        agg.classify(&strip(1, 12, TABLE, Matrix4::identity()));
        agg.classify(&strip(2, 14, FLOOR, translation(5.0, 0.0, 0.0)));
        let outcome = agg.classify(&strip(3, 30, TABLE, translation(0.1, 0.0, 0.0)));

        assert!(outcome.added.is_empty());
        assert_eq!(outcome.refined.len(), 1);
        assert_eq!(agg.objects().len(), 2);
        assert_eq!(agg.objects()[0].source, AnchorId::from_u128(3));
        assert_eq!(agg.objects()[0].support, 30);
    }

    #[test]
    fn test_min_confidence_filter() {
        let mut anchor = strip(1, 100, FLOOR, Matrix4::identity());
        let mut classes = vec![FLOOR; 100];
        for c in classes.iter_mut().take(11) {
            *c = TABLE;
        }
        anchor.classifications = Some(classes);

        let mut agg = ClassificationAggregator::new(0.5, 10, 0.5);
        agg.classify(&anchor);
        assert_eq!(agg.objects().len(), 1);
        assert_eq!(agg.objects()[0].label, SemanticLabel::Floor);
    }

    #[test]
    fn test_floor_points_replace_per_anchor() {
        let mut agg = aggregator();
        agg.classify(&strip(1, 20, FLOOR, Matrix4::identity()));
        agg.classify(&strip(1, 20, FLOOR, translation(0.0, 0.0, 2.0)));
        assert_eq!(agg.floor_points(), vec![Point3::new(0.0, 0.0, 2.0)]);
    }

    #[test]
    fn test_floor_plane_adds_polygon() {
        let plane = PlaneObservation {
            id: AnchorId::from_u128(9),
            label: SemanticLabel::Floor,
            center_pose: translation(0.0, -1.0, 0.0),
            polygon: vec![[-2.0, -1.0], [2.0, -1.0], [2.0, 1.0], [-2.0, 1.0]],
        };
        let mut agg = aggregator();
        let outcome = agg.observe_plane(&plane);

        assert_eq!(outcome.added.len(), 1);
        assert_eq!(outcome.added[0].confidence, 1.0);
        assert_eq!(outcome.added[0].centroid, [0.0, -1.0, 0.0]);
        assert_eq!(agg.floor_points().len(), 4);
    }

    #[test]
    fn test_dedup_objects_list_pass() {
        let object = |label: SemanticLabel, x: f32, support: usize| RecognizedObject {
            label,
            category: label.category(),
            confidence: 0.5,
            centroid: [x, 0.0, 0.0],
            bounds: roomscan_core::BoundingBox3::new([x, 0.0, 0.0], [x, 0.0, 0.0]),
            classification: label.raw(),
            support,
            source: AnchorId::from_u128(support as u128),
        };
        let list = vec![
            object(SemanticLabel::Floor, 0.0, 20),
            object(SemanticLabel::Floor, 0.2, 20),
            object(SemanticLabel::Wall, 0.1, 15),
            object(SemanticLabel::Floor, 3.0, 11),
            object(SemanticLabel::Wall, 0.3, 40),
        ];
        let deduped = dedup_objects(list, 0.5);

        assert_eq!(deduped.len(), 3);
        assert_eq!(deduped[0].centroid[0], 0.0);
        assert_eq!(deduped[1].centroid[0], 3.0);
        assert_eq!(deduped[2].support, 40);

        for (i, a) in deduped.iter().enumerate() {
            for b in &deduped[i + 1..] {
                assert!(!a.is_duplicate_of(b, 0.5));
            }
        }
    }

    fn assert_no_duplicates(objects: &[RecognizedObject], threshold: f32) {
        for (i, a) in objects.iter().enumerate() {
            for b in &objects[i + 1..] {
                assert!(
                    !a.is_duplicate_of(b, threshold),
                    "{:?} and {:?} are {} apart",
                    a.centroid,
                    b.centroid,
                    a.centroid_distance(b)
                );
            }
        }
    }

    fn floor_object(centroid: [f32; 3], support: usize) -> RecognizedObject {
        RecognizedObject {
            label: SemanticLabel::Floor,
            category: SemanticLabel::Floor.category(),
            confidence: 0.5,
            centroid,
            bounds: roomscan_core::BoundingBox3::new(centroid, centroid),
            classification: FLOOR,
            support,
            source: AnchorId::from_u128(support as u128),
        }
    }

    #[test]
    fn test_weaker_detection_between_neighbours_is_dropped() {
        let mut agg = aggregator();
        agg.classify(&strip(1, 15, FLOOR, translation(-0.4, 0.0, 0.0)));
        agg.classify(&strip(2, 15, FLOOR, translation(1.0, 0.0, 0.0)));
        agg.classify(&strip(3, 30, FLOOR, translation(0.3, 0.0, 0.1)));
        // Each beats one neighbour but not the 30-triangle one
        assert!(agg.classify(&strip(4, 20, FLOOR, Matrix4::identity())).is_empty());
        assert!(agg
            .classify(&strip(5, 20, FLOOR, translation(0.6, 0.0, 0.0)))
            .is_empty());

        let supports: Vec<usize> = agg.objects().iter().map(|o| o.support).collect();
        assert_eq!(supports, vec![15, 15, 30]);
        assert_no_duplicates(agg.objects(), 0.5);
        assert_eq!(dedup_objects(agg.objects().to_vec(), 0.5).len(), 3);
    }

    #[test]
    fn test_refinement_absorbs_every_neighbour() {
        let mut agg = aggregator();
        agg.classify(&strip(1, 15, FLOOR, translation(-0.3, 0.0, 0.0)));
        agg.classify(&strip(2, 15, FLOOR, translation(0.3, 0.0, 0.0)));
        assert_eq!(agg.objects().len(), 2);

        let outcome = agg.classify(&strip(3, 20, FLOOR, Matrix4::identity()));
        assert_eq!(outcome.refined.len(), 1);
        assert_eq!(agg.objects().len(), 1);
        assert_eq!(agg.objects()[0].source, AnchorId::from_u128(3));
    }

    #[test]
    fn test_dedup_objects_rechecks_moved_winners() {
        let list = vec![
            floor_object([-0.4, 0.0, 0.0], 15),
            floor_object([1.0, 0.0, 0.0], 15),
            floor_object([0.3, 0.0, 0.1], 30),
            floor_object([0.0, 0.0, 0.0], 20),
            floor_object([0.6, 0.0, 0.0], 20),
        ];
        let deduped = dedup_objects(list, 0.5);

        assert_no_duplicates(&deduped, 0.5);
        let centroids: Vec<[f32; 3]> = deduped.iter().map(|o| o.centroid).collect();
        assert_eq!(
            centroids,
            vec![[-0.4, 0.0, 0.0], [1.0, 0.0, 0.0], [0.3, 0.0, 0.1]]
        );
    }

    #[test]
    fn test_dedup_objects_tie_keeps_earlier() {
        let deduped = dedup_objects(
            vec![
                floor_object([0.0, 0.0, 0.0], 12),
                floor_object([0.1, 0.0, 0.0], 12),
            ],
            0.5,
        );
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].centroid, [0.0, 0.0, 0.0]);
    }
}
