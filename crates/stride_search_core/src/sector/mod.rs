//! # Sectors
//!
//! A [`Sector`] is the basic unit of work of a stride search. It has a center
//! point on the sphere and a radius, keeps a record of every data point
//! (coordinate and data handle) inside that radius, and owns one
//! [`Workspace`] per registered criterion.
//!
//! Sectors are responsible for:
//! 1. Receiving their membership from a spatial query at setup time
//! 2. Evaluating a set of identification criteria against that membership
//!    at each time step
//!
//! Sectors share no mutable state, so a [`SectorList`] can evaluate them in
//! parallel.

mod list;
mod workspace;

pub use list::{SearchRegion, SectorList, MAX_SECTORS};
pub use workspace::{Workspace, WorkspaceEntry};

use crate::arena::PointArena;
use crate::criteria::{Criterion, Sample};
use crate::error::{Result, StrideError};
use crate::event::Event;
use crate::spatial::{DistanceMetric, SpatialIndex};
use crate::sphere::arc_to_chord;
use crate::types::{DataHandle, GeoPoint};
use chrono::NaiveDateTime;
use tracing::trace;

/// One data point assigned to a sector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectorPoint {
    pub coord: GeoPoint,
    pub handle: DataHandle,
}

/// A spatial partition and its per-criterion workspace.
#[derive(Debug, Clone)]
pub struct Sector {
    center: GeoPoint,
    radius: f64,
    members: Vec<SectorPoint>,
    workspace: Vec<Workspace>,
}

impl Sector {
    /// Creates a sector over points already known to lie inside it.
    ///
    /// Allocates `n_criteria` unlabelled workspace slots; call
    /// [`Sector::alloc_workspace`] with the actual criteria list before the
    /// first evaluation.
    pub fn new(
        center: GeoPoint,
        radius: f64,
        members: Vec<(GeoPoint, DataHandle)>,
        n_criteria: usize,
    ) -> Self {
        Self {
            center,
            radius,
            members: members
                .into_iter()
                .map(|(coord, handle)| SectorPoint { coord, handle })
                .collect(),
            workspace: (0..n_criteria)
                .map(|_| Workspace::unallocated())
                .collect(),
        }
    }

    /// Creates a sector with its workspace allocated for `criteria`.
    pub fn with_criteria(
        center: GeoPoint,
        radius: f64,
        members: Vec<(GeoPoint, DataHandle)>,
        criteria: &[Box<dyn Criterion>],
    ) -> Self {
        let mut sector = Self::new(center, radius, members, criteria.len());
        sector.alloc_workspace(criteria);
        sector
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    /// Radius of the sector's area of responsibility
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Points assigned to this sector, in assignment order
    pub fn members(&self) -> &[SectorPoint] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Workspace slot of the criterion at `position`
    pub fn workspace(&self, position: usize) -> Option<&Workspace> {
        self.workspace.get(position)
    }

    pub fn workspace_len(&self) -> usize {
        self.workspace.len()
    }

    /// Appends one point to the membership.
    pub fn push_member(&mut self, coord: GeoPoint, handle: DataHandle) {
        self.members.push(SectorPoint { coord, handle });
    }

    /// Drops every member, keeping center, radius and workspace.
    pub fn clear_members(&mut self) {
        self.members.clear();
    }

    /// Appends every arena point within this sector's radius, in arena order.
    ///
    /// The radius is an arc length; against a chord index it is converted to
    /// the chord subtending that arc. Returns the number of points added.
    pub fn link(&mut self, index: &SpatialIndex, arena: &PointArena) -> usize {
        let radius = match index.metric() {
            DistanceMetric::GreatCircle => self.radius,
            DistanceMetric::Chord => arc_to_chord(self.radius, index.sphere_radius()),
        };
        let matches = index.radius_search(&self.center, radius);
        let before = self.members.len();
        for neighbor in matches {
            if let Some((coord, handle)) = arena.get(neighbor.index) {
                self.push_member(coord, handle);
            }
        }
        self.members.len() - before
    }

    /// (Re)initializes the workspace to one freshly labelled slot per
    /// criterion. Calling it twice with the same list leaves the same state.
    pub fn alloc_workspace(&mut self, criteria: &[Box<dyn Criterion>]) {
        self.workspace = criteria
            .iter()
            .map(|criterion| Workspace::for_criterion(criterion.as_ref()))
            .collect();
    }

    /// Evaluates every criterion against this sector's points.
    ///
    /// For each criterion in order the workspace slot is reset, every member
    /// is accumulated, and a positive verdict becomes one [`Event`]. The
    /// returned events follow criteria order. Membership and center are left
    /// untouched.
    ///
    /// Fails with [`StrideError::CriterionWorkspaceMismatch`] if `criteria`
    /// is not the list the workspace was allocated for.
    pub fn evaluate_criteria_at_timestep(
        &mut self,
        criteria: &[Box<dyn Criterion>],
        timestamp: NaiveDateTime,
        source: &str,
        time_index: usize,
    ) -> Result<Vec<Event>> {
        self.check_workspace(criteria)?;

        let mut events = Vec::new();
        for (criterion, workspace) in criteria.iter().zip(self.workspace.iter_mut()) {
            workspace.reset();
            for member in &self.members {
                let sample = Sample {
                    coord: member.coord,
                    handle: member.handle,
                    time_index,
                };
                criterion.accumulate(&sample, workspace);
            }

            if let Some(detection) = criterion.verdict(workspace) {
                events.push(Event::new(
                    timestamp,
                    source,
                    time_index,
                    self.center,
                    criterion.id(),
                    detection,
                ));
            }
        }

        trace!(
            center = %self.center,
            points = self.members.len(),
            events = events.len(),
            "Evaluated sector"
        );
        Ok(events)
    }

    fn check_workspace(&self, criteria: &[Box<dyn Criterion>]) -> Result<()> {
        if criteria.len() != self.workspace.len() {
            return Err(StrideError::CriterionWorkspaceMismatch {
                expected: self.workspace.len(),
                found: criteria.len(),
                reason: "criteria list length changed".to_string(),
            });
        }
        for (position, (criterion, workspace)) in
            criteria.iter().zip(&self.workspace).enumerate()
        {
            if workspace.criterion_id() != Some(criterion.id()) {
                return Err(StrideError::CriterionWorkspaceMismatch {
                    expected: self.workspace.len(),
                    found: criteria.len(),
                    reason: format!(
                        "slot {position} was allocated for '{}' but criterion is '{}'",
                        workspace.criterion_id().unwrap_or("<unallocated>"),
                        criterion.id()
                    ),
                });
            }
        }
        Ok(())
    }

    /// Multi-line description of this sector, indented by `tab_level` tabs.
    pub fn info_string(&self, tab_level: usize) -> String {
        let tabs = "\t".repeat(tab_level);
        let mut out = format!(
            "{tabs}Sector record:\n\
             {tabs}\tcenter = {}\n\
             {tabs}\tradius = {:.2}\n\
             {tabs}\tnPoints = {}\n\
             {tabs}\tworkspace:\n",
            self.center,
            self.radius,
            self.members.len()
        );
        for workspace in &self.workspace {
            let variables: Vec<&str> = workspace.variables().collect();
            out.push_str(&format!(
                "{tabs}\t\t{}: [{}]\n",
                workspace.criterion_id().unwrap_or("<unallocated>"),
                variables.join(", ")
            ));
        }
        out
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sector at {} (radius {:.2}, {} points, {} criteria)",
            self.center,
            self.radius,
            self.members.len(),
            self.workspace.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::Detection;
    use crate::types::GridIndex;
    use chrono::NaiveDate;

    /// Fires with the number of points seen when at least `min` points were seen.
    #[derive(Debug)]
    struct CountAtLeast {
        id: String,
        min: usize,
    }

    impl Criterion for CountAtLeast {
        fn id(&self) -> &str {
            &self.id
        }

        fn required_variables(&self) -> Vec<String> {
            vec!["count".to_string()]
        }

        fn accumulate(&self, _sample: &Sample, workspace: &mut Workspace) {
            workspace.increment("count");
        }

        fn verdict(&self, workspace: &Workspace) -> Option<Detection> {
            let count = workspace.count("count");
            (count >= self.min).then(|| Detection::new(count as f64, "count"))
        }
    }

    fn count_at_least(id: &str, min: usize) -> Box<dyn Criterion> {
        Box::new(CountAtLeast {
            id: id.to_string(),
            min,
        })
    }

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2001, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn three_point_sector(n_criteria: usize) -> Sector {
        let members = (0..3)
            .map(|n| {
                (
                    GeoPoint::new(n as f64, 0.0).unwrap(),
                    DataHandle::new(n, GridIndex::Unstructured(n)),
                )
            })
            .collect();
        Sector::new(GeoPoint::new(0.0, 0.0).unwrap(), 500.0, members, n_criteria)
    }

    #[test]
    fn test_events_follow_criteria_order() {
        let criteria = vec![
            count_at_least("b", 1),
            count_at_least("never", 10),
            count_at_least("a", 3),
        ];
        let mut sector = three_point_sector(criteria.len());
        sector.alloc_workspace(&criteria);

        let events = sector
            .evaluate_criteria_at_timestep(&criteria, timestamp(), "src", 4)
            .unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.criterion_id()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(events[0].detection().intensity, 3.0);
        assert_eq!(events[0].time_index(), 4);
        assert_eq!(events[0].source(), "src");
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let criteria = vec![count_at_least("c", 2)];
        let mut sector = three_point_sector(1);
        sector.alloc_workspace(&criteria);

        let first = sector
            .evaluate_criteria_at_timestep(&criteria, timestamp(), "src", 0)
            .unwrap();
        let second = sector
            .evaluate_criteria_at_timestep(&criteria, timestamp(), "src", 0)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(sector.len(), 3);
    }

    #[test]
    fn test_length_mismatch_is_reported() {
        let criteria = vec![count_at_least("a", 1), count_at_least("b", 1)];
        let mut sector = three_point_sector(1);
        sector.alloc_workspace(&criteria[..1]);

        let err = sector
            .evaluate_criteria_at_timestep(&criteria, timestamp(), "src", 0)
            .unwrap_err();
        assert!(matches!(
            err,
            StrideError::CriterionWorkspaceMismatch { expected: 1, found: 2, .. }
        ));
    }

    #[test]
    fn test_reordered_criteria_are_a_mismatch() {
        let criteria = vec![count_at_least("a", 1), count_at_least("b", 1)];
        let mut sector = three_point_sector(2);
        sector.alloc_workspace(&criteria);

        let swapped = vec![count_at_least("b", 1), count_at_least("a", 1)];
        let err = sector
            .evaluate_criteria_at_timestep(&swapped, timestamp(), "src", 0)
            .unwrap_err();
        assert!(matches!(err, StrideError::CriterionWorkspaceMismatch { .. }));
    }

    #[test]
    fn test_unallocated_workspace_is_a_mismatch() {
        let criteria = vec![count_at_least("a", 1)];
        let mut sector = three_point_sector(1);
        assert!(sector
            .evaluate_criteria_at_timestep(&criteria, timestamp(), "src", 0)
            .is_err());
    }

    #[test]
    fn test_unlabelled_slot_rejects_empty_id() {
        let criteria = vec![count_at_least("", 1)];
        let mut sector = three_point_sector(1);
        assert!(matches!(
            sector.evaluate_criteria_at_timestep(&criteria, timestamp(), "src", 0),
            Err(StrideError::CriterionWorkspaceMismatch { .. })
        ));

        sector.alloc_workspace(&criteria);
        let events = sector
            .evaluate_criteria_at_timestep(&criteria, timestamp(), "src", 0)
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_link_uses_arc_radius_for_both_metrics() {
        use crate::sphere::{km_to_degrees, sphere_distance, EARTH_RADIUS_KM};

        let lats = [km_to_degrees(499.95), km_to_degrees(500.05)];
        let arena = PointArena::unstructured(&lats, &[0.0, 0.0]).unwrap();
        assert!(sphere_distance(0.0, 0.0, lats[1], 0.0) > 500.0);

        for metric in [DistanceMetric::GreatCircle, DistanceMetric::Chord] {
            let index = arena.build_index(metric, EARTH_RADIUS_KM).unwrap();
            let mut sector = Sector::new(GeoPoint::new(0.0, 0.0).unwrap(), 500.0, Vec::new(), 0);

            assert_eq!(sector.link(&index, &arena), 1, "{metric:?}");
            assert_eq!(sector.members()[0].handle.arena_index, 0);
        }
    }

    #[test]
    fn test_alloc_workspace_is_idempotent() {
        let criteria = vec![count_at_least("a", 1), count_at_least("b", 1)];
        let mut sector = three_point_sector(2);
        sector.alloc_workspace(&criteria);
        let once: Vec<Workspace> = sector.workspace.clone();
        sector.alloc_workspace(&criteria);
        assert_eq!(sector.workspace, once);
    }

    #[test]
    fn test_info_string_lists_workspace() {
        let criteria = vec![count_at_least("a", 1)];
        let sector = Sector::with_criteria(
            GeoPoint::new(10.0, 20.0).unwrap(),
            250.0,
            Vec::new(),
            &criteria,
        );
        let info = sector.info_string(1);
        assert!(info.starts_with("\tSector record:"));
        assert!(info.contains("nPoints = 0"));
        assert!(info.contains("a: [count]"));
        assert_eq!(
            sector.to_string(),
            "Sector at (10.0000, 20.0000) (radius 250.00, 0 points, 1 criteria)"
        );
    }
}
