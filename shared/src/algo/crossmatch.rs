//! Sky cross-matching between a measured and a reference catalog.
//!
//! Matching runs on unit vectors through [`KdTree`]; reported separations
//! are recomputed with the great-circle formula so they keep full precision
//! at milliarcsecond scales.

use crate::algo::kdtree::KdTree;
use crate::sky::{chord_for_angle, Equatorial};
use crate::units::{Angle, AngleExt};
use log::debug;

/// Nearest reference source found for one measured source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestMatch {
    pub reference_index: usize,
    pub separation: Angle,
}

/// A measured/reference pair that are each other's nearest neighbour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedPair {
    pub measured_index: usize,
    pub reference_index: usize,
    pub separation: Angle,
}

/// Outcome of a mutual nearest-neighbour match
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    pub pairs: Vec<MatchedPair>,
    /// Measured indices with no accepted partner
    pub unmatched_measured: Vec<usize>,
    /// Reference indices with no accepted partner
    pub unmatched_reference: Vec<usize>,
}

impl MatchResult {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pair separations in milliarcseconds, in pair order
    pub fn separations_mas(&self) -> Vec<f64> {
        self.pairs
            .iter()
            .map(|p| p.separation.as_milliarcseconds())
            .collect()
    }
}

fn build_tree(positions: &[Equatorial]) -> KdTree {
    KdTree::build(positions.iter().map(|p| p.to_unit_vector()).collect())
}

fn nearest_indices(tree: &KdTree, queries: &[Equatorial]) -> Vec<Option<usize>> {
    queries
        .iter()
        .map(|q| tree.nearest(&q.to_unit_vector()).map(|(idx, _)| idx))
        .collect()
}

/// For every measured position, the nearest reference position.
///
/// Returns one entry per measured position; entries are `None` only when
/// the reference list is empty.
pub fn match_to_catalog(
    measured: &[Equatorial],
    reference: &[Equatorial],
) -> Vec<Option<NearestMatch>> {
    let tree = build_tree(reference);
    nearest_indices(&tree, measured)
        .into_iter()
        .zip(measured)
        .map(|(nearest, m)| {
            nearest.map(|j| NearestMatch {
                reference_index: j,
                separation: m.angular_distance(&reference[j]),
            })
        })
        .collect()
}

/// Mutual nearest-neighbour match limited to `max_separation`.
///
/// A pair is kept only when the reference source is the measured source's
/// nearest neighbour and vice versa, so every source appears in at most one
/// pair. Pairs are ordered by measured index.
pub fn mutual_matches(
    measured: &[Equatorial],
    reference: &[Equatorial],
    max_separation: Angle,
) -> MatchResult {
    let forward = match_to_catalog(measured, reference);
    let backward = nearest_indices(&build_tree(measured), reference);
    let max_rad = max_separation.as_radians();

    let mut pairs = Vec::new();
    let mut reference_used = vec![false; reference.len()];
    let mut unmatched_measured = Vec::new();

    for (i, candidate) in forward.into_iter().enumerate() {
        let accepted = candidate.filter(|c| {
            backward[c.reference_index] == Some(i) && c.separation.as_radians() <= max_rad
        });
        match accepted {
            Some(c) => {
                reference_used[c.reference_index] = true;
                pairs.push(MatchedPair {
                    measured_index: i,
                    reference_index: c.reference_index,
                    separation: c.separation,
                });
            }
            None => unmatched_measured.push(i),
        }
    }

    let unmatched_reference: Vec<usize> = reference_used
        .iter()
        .enumerate()
        .filter(|(_, used)| !**used)
        .map(|(j, _)| j)
        .collect();

    debug!(
        "mutual match: {} measured, {} reference, {} pairs within {:.1} mas",
        measured.len(),
        reference.len(),
        pairs.len(),
        max_separation.as_milliarcseconds()
    );

    MatchResult {
        pairs,
        unmatched_measured,
        unmatched_reference,
    }
}

/// For each query position, whether any target lies within `radius`.
///
/// Unlike [`mutual_matches`] this does not require exclusivity: it answers
/// "is there anything real here" for false-positive and completeness counts.
pub fn has_counterpart(queries: &[Equatorial], targets: &[Equatorial], radius: Angle) -> Vec<bool> {
    let tree = build_tree(targets);
    let chord = chord_for_angle(radius);
    let chord_sq = chord * chord;
    queries
        .iter()
        .map(|q| {
            tree.nearest(&q.to_unit_vector())
                .is_some_and(|(_, dist_sq)| dist_sq <= chord_sq)
        })
        .collect()
}
