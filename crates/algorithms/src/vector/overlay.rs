//! Overlay union of two labeled polygon layers
//!
//! The result partitions the combined extent into pieces that lie in both
//! layers, in the left layer only, or in the right layer only. Which side a
//! piece came from is carried by [`Overlap`], so a missing side is `None`-like
//! by construction instead of a placeholder value that could collide with a
//! real label.

use geo::{BooleanOps, BoundingRect, Intersects, MultiPolygon, Rect};

use super::dissolve::union_all;
use super::measurements::is_sliver;

/// A labeled polygon region
#[derive(Debug, Clone, PartialEq)]
pub struct Region<L> {
    pub label: L,
    pub geometry: MultiPolygon<f64>,
}

impl<L> Region<L> {
    pub fn new(label: L, geometry: MultiPolygon<f64>) -> Self {
        Self { label, geometry }
    }

    /// Replace the label, keeping the geometry
    pub fn relabel<M>(self, label: M) -> Region<M> {
        Region::new(label, self.geometry)
    }
}

/// Which inputs an overlay piece lies in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap<A, B> {
    Both(A, B),
    LeftOnly(A),
    RightOnly(B),
}

impl<A, B> Overlap<A, B> {
    pub fn left(&self) -> Option<&A> {
        match self {
            Overlap::Both(a, _) | Overlap::LeftOnly(a) => Some(a),
            Overlap::RightOnly(_) => None,
        }
    }

    pub fn right(&self) -> Option<&B> {
        match self {
            Overlap::Both(_, b) | Overlap::RightOnly(b) => Some(b),
            Overlap::LeftOnly(_) => None,
        }
    }
}

/// One piece of an overlay union
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPiece<A, B> {
    pub sides: Overlap<A, B>,
    pub geometry: MultiPolygon<f64>,
}

/// Overlay union of two labeled layers.
///
/// Every pair of intersecting regions yields an `Both` piece; the part of
/// each region outside the whole opposite layer yields a `LeftOnly` or
/// `RightOnly` piece. Pieces whose area does not exceed `min_area` are
/// dropped as slivers.
///
/// Regions within one layer may overlap each other; their pieces then
/// overlap too, exactly as the inputs did.
///
/// # Arguments
/// * `left` - First layer
/// * `right` - Second layer
/// * `min_area` - Sliver threshold in CRS units squared
pub fn overlay_union<A, B>(left: &[Region<A>], right: &[Region<B>], min_area: f64) -> Vec<OverlayPiece<A, B>>
where
    A: Clone,
    B: Clone,
{
    let left_all = union_all(left.iter().map(|r| r.geometry.clone()));
    let right_all = union_all(right.iter().map(|r| r.geometry.clone()));
    let right_bounds: Vec<Option<Rect<f64>>> = right.iter().map(|r| r.geometry.bounding_rect()).collect();

    let mut pieces = Vec::new();
    let mut keep = |sides: Overlap<A, B>, geometry: MultiPolygon<f64>| {
        if !is_sliver(&geometry, min_area) {
            pieces.push(OverlayPiece { sides, geometry });
        }
    };

    for l in left {
        let l_bounds = l.geometry.bounding_rect();
        for (r, r_bounds) in right.iter().zip(&right_bounds) {
            let may_touch = match (l_bounds, r_bounds) {
                (Some(a), Some(b)) => a.intersects(b),
                _ => false,
            };
            if may_touch {
                keep(
                    Overlap::Both(l.label.clone(), r.label.clone()),
                    l.geometry.intersection(&r.geometry),
                );
            }
        }
        keep(Overlap::LeftOnly(l.label.clone()), l.geometry.difference(&right_all));
    }

    for r in right {
        keep(Overlap::RightOnly(r.label.clone()), r.geometry.difference(&left_all));
    }

    pieces
}
