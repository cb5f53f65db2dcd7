/*
 * Copyright (C) 2023 Asim Ihsan
 * SPDX-License-Identifier: AGPL-3.0-only
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU Affero General Public License as published by the Free
 * Software Foundation, version 3.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A
 * PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License along
 * with this program. If not, see <https://www.gnu.org/licenses/>
 */

//! Bounded continuous street space.
//!
//! The space owns one [`Body`] per live agent: its kind tag and its position. Agent-specific
//! state lives elsewhere, keyed by the same [`AgentId`]. Because ids come from a generational
//! slot map, an id held after its body was removed resolves to nothing instead of to whatever
//! agent reuses the slot.

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::Float;

new_key_type! {
    /// Generation-checked handle to a live agent.
    pub struct AgentId;
}

/// A point in the street plane. `x` runs along the street, `y` across it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: Float,
    pub y: Float,
}

impl Point {
    pub fn new(x: Float, y: Float) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> Float {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Kind tag carried by every body. Neighbor lists are filtered by this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    Pedestrian,
    Robot,
    Sweeper,
    Trash,
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentKind::Pedestrian => write!(f, "pedestrian"),
            AgentKind::Robot => write!(f, "robot"),
            AgentKind::Sweeper => write!(f, "sweeper"),
            AgentKind::Trash => write!(f, "trash"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub kind: AgentKind,
    pub position: Point,
}

/// Non-toroidal rectangle `[0, width] x [0, height]`.
///
/// Positions are not clamped here. Pedestrians and the robot leave the rectangle along the
/// street axis on purpose, and the vertical clamp belongs to the steering primitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuousSpace {
    width: Float,
    height: Float,
    bodies: SlotMap<AgentId, Body>,
}

impl ContinuousSpace {
    pub fn new(width: Float, height: Float) -> Self {
        Self {
            width,
            height,
            bodies: SlotMap::with_key(),
        }
    }

    pub fn width(&self) -> Float {
        self.width
    }

    pub fn height(&self) -> Float {
        self.height
    }

    pub fn insert(&mut self, kind: AgentKind, position: Point) -> AgentId {
        self.bodies.insert(Body { kind, position })
    }

    pub fn remove(&mut self, id: AgentId) -> Option<Body> {
        self.bodies.remove(id)
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.bodies.contains_key(id)
    }

    pub fn body(&self, id: AgentId) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn position(&self, id: AgentId) -> Option<Point> {
        self.bodies.get(id).map(|body| body.position)
    }

    /// Move a body. Returns false if the id no longer refers to a live body.
    pub fn set_position(&mut self, id: AgentId, position: Point) -> bool {
        match self.bodies.get_mut(id) {
            Some(body) => {
                body.position = position;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn count(&self, kind: AgentKind) -> usize {
        self.bodies.values().filter(|body| body.kind == kind).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &Body)> {
        self.bodies.iter()
    }

    /// All live bodies within `radius` (inclusive) of `point`, except `exclude`.
    ///
    /// The result is a snapshot of the live set at call time. Its order is not meaningful and
    /// callers must not rely on it being stable across calls.
    pub fn neighbors_within(
        &self,
        point: Point,
        radius: Float,
        exclude: Option<AgentId>,
    ) -> Vec<AgentId> {
        self.bodies
            .iter()
            .filter(|(id, body)| {
                Some(*id) != exclude && body.position.distance_to(&point) <= radius
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Like [`ContinuousSpace::neighbors_within`], restricted to one kind.
    pub fn neighbors_of_kind(
        &self,
        point: Point,
        radius: Float,
        kind: AgentKind,
        exclude: Option<AgentId>,
    ) -> Vec<AgentId> {
        self.bodies
            .iter()
            .filter(|(id, body)| {
                body.kind == kind
                    && Some(*id) != exclude
                    && body.position.distance_to(&point) <= radius
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Nearest body of `kind` within `radius` of `point` that also passes `accept`.
    pub fn nearest_of_kind<F>(
        &self,
        point: Point,
        radius: Float,
        kind: AgentKind,
        exclude: Option<AgentId>,
        accept: F,
    ) -> Option<(AgentId, Point)>
    where
        F: Fn(&Point) -> bool,
    {
        let mut best: Option<(AgentId, Point, Float)> = None;
        for id in self.neighbors_of_kind(point, radius, kind, exclude) {
            let position = self.bodies[id].position;
            if !accept(&position) {
                continue;
            }
            let distance = position.distance_to(&point);
            match best {
                Some((_, _, best_distance)) if best_distance <= distance => {}
                _ => best = Some((id, position, distance)),
            }
        }
        best.map(|(id, position, _)| (id, position))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn space_with_three() -> (ContinuousSpace, AgentId, AgentId, AgentId) {
        let mut space = ContinuousSpace::new(10.0, 5.0);
        let a = space.insert(AgentKind::Pedestrian, Point::new(1.0, 1.0));
        let b = space.insert(AgentKind::Trash, Point::new(2.0, 1.0));
        let c = space.insert(AgentKind::Trash, Point::new(8.0, 4.0));
        (space, a, b, c)
    }

    #[test]
    fn test_distance() {
        assert_abs_diff_eq!(
            Point::new(0.0, 0.0).distance_to(&Point::new(3.0, 4.0)),
            5.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_neighbors_within_excludes_querying_agent() {
        let (space, a, b, _) = space_with_three();
        let neighbors = space.neighbors_within(Point::new(1.0, 1.0), 1.5, Some(a));
        assert_eq!(neighbors, vec![b]);
    }

    #[test]
    fn test_neighbors_within_radius_is_inclusive() {
        let (space, a, b, _) = space_with_three();
        let mut neighbors = space.neighbors_within(Point::new(1.5, 1.0), 0.5, None);
        neighbors.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(neighbors, expected);
    }

    #[test]
    fn test_removed_body_disappears_from_queries() {
        let (mut space, a, b, _) = space_with_three();
        assert!(space.remove(b).is_some());
        assert!(space
            .neighbors_within(Point::new(1.0, 1.0), 20.0, Some(a))
            .iter()
            .all(|id| *id != b));
        assert!(!space.contains(b));
        assert_eq!(space.position(b), None);
    }

    #[test]
    fn test_stale_id_does_not_resolve_to_reused_slot() {
        let (mut space, _, b, _) = space_with_three();
        space.remove(b);
        let fresh = space.insert(AgentKind::Trash, Point::new(9.0, 9.0));
        assert_ne!(fresh, b);
        assert!(!space.set_position(b, Point::new(0.0, 0.0)));
        assert_eq!(space.position(fresh), Some(Point::new(9.0, 9.0)));
    }

    #[test]
    fn test_neighbors_of_kind_filters_by_tag() {
        let (space, _, b, c) = space_with_three();
        let mut trash =
            space.neighbors_of_kind(Point::new(5.0, 2.5), 10.0, AgentKind::Trash, None);
        trash.sort();
        let mut expected = vec![b, c];
        expected.sort();
        assert_eq!(trash, expected);
        assert_eq!(space.count(AgentKind::Trash), 2);
        assert_eq!(space.count(AgentKind::Robot), 0);
    }

    #[test]
    fn test_nearest_of_kind_respects_filter() {
        let (space, _, b, c) = space_with_three();
        let nearest = space.nearest_of_kind(
            Point::new(0.0, 0.0),
            20.0,
            AgentKind::Trash,
            None,
            |_| true,
        );
        assert_eq!(nearest.map(|(id, _)| id), Some(b));

        let east_of_five = space.nearest_of_kind(
            Point::new(0.0, 0.0),
            20.0,
            AgentKind::Trash,
            None,
            |position| position.x > 5.0,
        );
        assert_eq!(east_of_five.map(|(id, _)| id), Some(c));
    }

    #[test]
    fn test_nearest_of_kind_none_outside_radius() {
        let (space, a, _, _) = space_with_three();
        assert!(space
            .nearest_of_kind(Point::new(1.0, 1.0), 0.5, AgentKind::Trash, Some(a), |_| true)
            .is_none());
    }
}
