// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Frame ingestion
//!
//! Keeps the latest geometry of every live anchor. Anchors are held behind
//! `Arc` so finalize can take a snapshot without copying vertex buffers.

use roomscan_core::AnchorId;
use roomscan_geometry::MeshAnchor;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// What an ingest call did with the anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    Inserted,
    Replaced,
    /// Geometry failed validation; previous data (if any) was kept
    Rejected,
}

impl Ingested {
    #[inline]
    pub fn accepted(self) -> bool {
        !matches!(self, Ingested::Rejected)
    }
}

/// Working set of anchors, in first-seen order
#[derive(Debug, Default)]
pub struct FrameIngestion {
    anchors: Vec<Arc<MeshAnchor>>,
    index: FxHashMap<AnchorId, usize>,
}

impl FrameIngestion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a newly reported anchor. An id that is already known is
    /// treated as an update.
    pub fn on_added(&mut self, anchor: MeshAnchor) -> Ingested {
        self.upsert(anchor)
    }

    /// Replace an anchor's geometry. Unknown ids are inserted, since the
    /// runtime may report an update before the add reaches us.
    pub fn on_updated(&mut self, anchor: MeshAnchor) -> Ingested {
        self.upsert(anchor)
    }

    /// Drop an anchor. Returns false for unknown ids.
    pub fn on_removed(&mut self, id: &AnchorId) -> bool {
        let Some(slot) = self.index.remove(id) else {
            return false;
        };
        self.anchors.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        true
    }

    fn upsert(&mut self, anchor: MeshAnchor) -> Ingested {
        if let Err(err) = anchor.validate() {
            tracing::warn!(anchor = %anchor.id, error = %err, "Skipping invalid anchor geometry");
            return Ingested::Rejected;
        }

        match self.index.get(&anchor.id) {
            Some(&slot) => {
                self.anchors[slot] = Arc::new(anchor);
                Ingested::Replaced
            }
            None => {
                self.index.insert(anchor.id, self.anchors.len());
                self.anchors.push(Arc::new(anchor));
                Ingested::Inserted
            }
        }
    }

    pub fn get(&self, id: &AnchorId) -> Option<&Arc<MeshAnchor>> {
        self.index.get(id).map(|&slot| &self.anchors[slot])
    }

    pub fn contains(&self, id: &AnchorId) -> bool {
        self.index.contains_key(id)
    }

    /// Current anchors, cheap to clone into a background job
    pub fn snapshot(&self) -> Vec<Arc<MeshAnchor>> {
        self.anchors.clone()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn clear(&mut self) {
        self.anchors.clear();
        self.index.clear();
    }
}
