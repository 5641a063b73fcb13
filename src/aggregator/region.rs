//! Named rectangles and the cumulative set of ids seen inside each.

use std::collections::HashSet;

use nalgebra::Point2;

use super::rect::Rect;

/// A named, fixed rectangle in frame-pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    pub rect: Rect,
}

impl Region {
    pub fn new(name: impl Into<String>, top_left: (i32, i32), bottom_right: (i32, i32)) -> Self {
        Self {
            name: name.into(),
            rect: Rect::from_corners(top_left, bottom_right),
        }
    }

    /// Display name for on-frame totals, e.g. `entry` -> `Entry`.
    pub fn display_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        }
    }
}

/// Membership sets for every configured region, in configuration order.
///
/// Sets only grow: an id counted in a region stays counted for the rest of
/// the run, whether or not it is still inside.
#[derive(Debug, Clone, Default)]
pub struct RegionCounter {
    regions: Vec<(Region, HashSet<u64>)>,
}

impl RegionCounter {
    pub fn new(regions: Vec<Region>) -> Self {
        Self {
            regions: regions.into_iter().map(|r| (r, HashSet::new())).collect(),
        }
    }

    /// Record `object_id` in every region whose rectangle contains `centroid`.
    ///
    /// Overlapping regions all receive the id. Returns the names of the
    /// regions the centroid is inside on this call.
    pub fn count(&mut self, object_id: u64, centroid: &Point2<f32>) -> Vec<String> {
        let mut inside = Vec::new();
        for (region, members) in &mut self.regions {
            if region.rect.contains(centroid) {
                members.insert(object_id);
                inside.push(region.name.clone());
            }
        }
        inside
    }

    /// Names of the regions containing `centroid`, without counting anything.
    pub fn containing(&self, centroid: &Point2<f32>) -> Vec<String> {
        self.regions()
            .filter(|region| region.rect.contains(centroid))
            .map(|region| region.name.clone())
            .collect()
    }

    /// Names of the regions that have ever counted `object_id`.
    pub fn memberships(&self, object_id: u64) -> Vec<String> {
        self.memberships_with(object_id, None)
    }

    /// Memberships of `object_id` as they would be after counting it at `centroid`.
    pub fn memberships_with(&self, object_id: u64, centroid: Option<&Point2<f32>>) -> Vec<String> {
        self.regions
            .iter()
            .filter(|(region, members)| {
                members.contains(&object_id) || centroid.is_some_and(|c| region.rect.contains(c))
            })
            .map(|(region, _)| region.name.clone())
            .collect()
    }

    /// `(region, unique ids counted)` pairs in configuration order.
    pub fn counts(&self) -> impl Iterator<Item = (&Region, usize)> {
        self.regions.iter().map(|(region, members)| (region, members.len()))
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter().map(|(region, _)| region)
    }
}
