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

//! Pedestrians walk along the street, keep their distance from each other and the street edges,
//! and now and then drop trash, either on an existing pile nearby or on the spot.

use rand::Rng as _;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::space::{AgentId, AgentKind, Point};
use crate::steering::{Steering, EAST, WEST};
use crate::street::Street;
use crate::{Float, Rng};

/// How close to the top or bottom edge a pedestrian gets before turning away from it.
pub const DIST_FROM_EDGE: Float = 1.0;
/// Radius in which a pedestrian looks for a pile to add their trash to.
pub const LITTER_SEEK_RADIUS: Float = 3.0;
/// Radius in which a pedestrian steers around someone walking ahead of them.
pub const PERSONAL_SPACE_RADIUS: Float = 2.5;
/// Ticks a pedestrian stands still after adding to a pile.
pub const TIME_TO_PRODUCE_TRASH: u32 = 20;
/// Average heading change per tick; the jitter is up to five times this either way.
pub const AVERAGE_ROTATION: Float = 1.0;
/// Heading change used to avoid an edge or another pedestrian.
pub const AVOIDANCE_TURN: Float = 30.0;
pub const MAX_TURN: Float = 5.0;

/// End of the street a pedestrian is walking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    West,
    East,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::West => Side::East,
            Side::East => Side::West,
        }
    }

    /// `x` of this end of a street of the given length.
    pub fn x(&self, street_length: Float) -> Float {
        match self {
            Side::West => 0.0,
            Side::East => street_length,
        }
    }

    pub fn heading(&self) -> Float {
        match self {
            Side::West => WEST,
            Side::East => EAST,
        }
    }

    /// Whether `other_x` lies further along the way towards this side than `x`.
    fn is_ahead(&self, x: Float, other_x: Float) -> bool {
        match self {
            Side::West => other_x < x,
            Side::East => other_x > x,
        }
    }
}

/// What happened to a pedestrian during its step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PedestrianStep {
    OnStreet,
    /// Walked past the given end of the street plus the boundary offset.
    LeftStreet(Side),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pedestrian {
    pub steering: Steering,
    /// Metres per tick.
    pub speed: Float,
    pub destination: Side,
    pub wants_to_litter: bool,
    /// Pile the pedestrian is walking to. Only meaningful while `wants_to_litter`.
    pub nearest_trash: Option<AgentId>,
    /// Ticks left standing still after littering.
    pub producing_wait: u32,
}

impl Pedestrian {
    pub fn new(destination: Side, speed: Float) -> Self {
        Self {
            steering: Steering::new(destination.heading(), MAX_TURN),
            speed,
            destination,
            wants_to_litter: false,
            nearest_trash: None,
            producing_wait: 0,
        }
    }

    /// A pedestrian somewhere on the street, walking to a random end.
    pub fn scattered(street: &Street, speed: Float, rng: &mut Rng) -> (Self, Point) {
        let destination = if rng.gen_bool(0.5) {
            Side::East
        } else {
            Side::West
        };
        let position = Point::new(
            rng.gen_range(0.0..=street.length()),
            rng.gen_range(0.0..=street.width()),
        );
        (Self::new(destination, speed), position)
    }

    /// A pedestrian entering the street from the end opposite to `destination`, just outside
    /// of it.
    pub fn entering(
        street: &Street,
        destination: Side,
        speed: Float,
        boundary_offset: Float,
        rng: &mut Rng,
    ) -> (Self, Point) {
        let x = match destination {
            Side::East => -boundary_offset,
            Side::West => street.length() + boundary_offset,
        };
        let position = Point::new(x, rng.gen_range(0.0..=street.width()));
        (Self::new(destination, speed), position)
    }

    /// Forget a pile that has been removed from the street.
    pub fn forget_trash(&mut self, trash: AgentId) {
        if self.nearest_trash == Some(trash) {
            self.nearest_trash = None;
        }
    }

    /// Drop any littering intention and target.
    pub fn cancel_littering(&mut self) {
        self.wants_to_litter = false;
        self.nearest_trash = None;
    }

    pub fn step(
        &mut self,
        id: AgentId,
        street: &mut Street,
        littering_probability: Float,
        boundary_offset: Float,
        rng: &mut Rng,
    ) -> PedestrianStep {
        let Some(mut position) = street.space().position(id) else {
            return PedestrianStep::OnStreet;
        };

        if self.producing_wait > 0 {
            self.producing_wait -= 1;
        } else if self.wants_to_litter {
            match self.nearest_trash.and_then(|trash| street.trash_position(trash)) {
                Some(trash_position) => {
                    self.approach_trash(&mut position, trash_position, street);
                }
                None => {
                    // The pile was collected before we got there.
                    self.nearest_trash = None;
                    self.seek_or_deposit(id, position, street);
                    self.walk(id, &mut position, street, rng);
                }
            }
        } else {
            self.walk(id, &mut position, street, rng);
        }
        street.space_mut().set_position(id, position);

        if rng.gen::<Float>() < littering_probability {
            self.wants_to_litter = true;
            self.seek_or_deposit(id, position, street);
        }

        if position.x < -boundary_offset || position.x > street.length() + boundary_offset {
            let exited = if position.x < 0.0 {
                Side::West
            } else {
                Side::East
            };
            PedestrianStep::LeftStreet(exited)
        } else {
            PedestrianStep::OnStreet
        }
    }

    /// Pick the nearest pile within reach as the target, or drop new trash right here if there
    /// is none.
    fn seek_or_deposit(&mut self, id: AgentId, position: Point, street: &mut Street) {
        self.nearest_trash = street
            .space()
            .nearest_of_kind(
                position,
                LITTER_SEEK_RADIUS,
                AgentKind::Trash,
                Some(id),
                |_| true,
            )
            .map(|(trash, _)| trash);
        if self.nearest_trash.is_none() {
            street.deposit(position);
            self.wants_to_litter = false;
        }
    }

    /// Wander towards the destination with a bit of jitter, staying off the edges and out of the
    /// way of whoever walks ahead.
    fn walk(&mut self, id: AgentId, position: &mut Point, street: &Street, rng: &mut Rng) {
        let jitter_range = 5.0 * AVERAGE_ROTATION;
        let jitter = rng.gen_range(-jitter_range..=jitter_range);

        let height = street.width();
        let near_bottom = position.y < DIST_FROM_EDGE;
        let near_top = position.y > height - DIST_FROM_EDGE;
        let mut bias = 0.0;
        match self.destination {
            Side::West => {
                if near_bottom {
                    bias -= AVOIDANCE_TURN;
                }
                if near_top {
                    bias += AVOIDANCE_TURN;
                }
            }
            Side::East => {
                if near_top {
                    bias -= AVOIDANCE_TURN;
                }
                if near_bottom {
                    bias += AVOIDANCE_TURN;
                }
            }
        }

        let x = position.x;
        let destination = self.destination;
        let neighbor = street.space().nearest_of_kind(
            *position,
            PERSONAL_SPACE_RADIUS,
            AgentKind::Pedestrian,
            Some(id),
            |other| destination.is_ahead(x, other.x),
        );
        if let Some((_, other)) = neighbor {
            let lateral = match destination {
                Side::East => position.y - other.y,
                Side::West => other.y - position.y,
            };
            bias = AVOIDANCE_TURN.copysign(lateral);
        }

        self.steering.heading = (destination.heading() + jitter + bias).rem_euclid(360.0);
        self.steering.move_straight(position, self.speed, height);
    }

    /// Walk straight at the target pile; on arrival add to it and stand still for a while.
    fn approach_trash(&mut self, position: &mut Point, trash_position: Point, street: &mut Street) {
        let distance = position.distance_to(&trash_position);
        if distance <= self.speed {
            *position = trash_position;
            if let Some(trash) = self.nearest_trash.take() {
                street.add_to_pile(trash);
                trace!(x = position.x, y = position.y, "added to pile");
            }
            self.wants_to_litter = false;
            self.producing_wait = TIME_TO_PRODUCE_TRASH;
        } else {
            let direction = (trash_position.y - position.y).atan2(trash_position.x - position.x);
            self.steering.heading = direction.to_degrees();
            position.x += direction.cos() * self.speed;
            position.y += direction.sin() * self.speed;
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;

    use super::*;

    fn rng() -> Rng {
        rand_pcg::Pcg64::seed_from_u64(7)
    }

    fn place(street: &mut Street, pedestrian_position: Point) -> AgentId {
        street
            .space_mut()
            .insert(AgentKind::Pedestrian, pedestrian_position)
    }

    #[test]
    fn test_side_helpers() {
        assert_eq!(Side::East.opposite(), Side::West);
        assert_eq!(Side::West.x(50.0), 0.0);
        assert_eq!(Side::East.x(50.0), 50.0);
        assert_eq!(Side::East.heading(), EAST);
        assert_eq!(Side::West.heading(), WEST);
    }

    #[test]
    fn test_walks_towards_destination() {
        let mut street = Street::new(50.0, 10.0);
        let id = place(&mut street, Point::new(10.0, 5.0));
        let mut pedestrian = Pedestrian::new(Side::East, 0.5);
        let mut rng = rng();
        for _ in 0..10 {
            pedestrian.step(id, &mut street, 0.0, 10.0, &mut rng);
        }
        let position = street.space().position(id).expect("pedestrian is on the street");
        // Jitter is at most 5 degrees, so each step covers at least cos(5) of the speed.
        assert!(position.x > 10.0 + 10.0 * 0.5 * 5.0_f64.to_radians().cos() - 1e-9);
    }

    #[test]
    fn test_turns_away_from_bottom_edge() {
        let mut street = Street::new(50.0, 10.0);
        let id = place(&mut street, Point::new(10.0, 0.5));
        let mut pedestrian = Pedestrian::new(Side::East, 0.5);
        pedestrian.step(id, &mut street, 0.0, 10.0, &mut rng());
        let heading = pedestrian.steering.heading;
        assert!((25.0..=35.0).contains(&heading), "heading: {}", heading);
    }

    #[test]
    fn test_turns_away_from_top_edge_walking_west() {
        let mut street = Street::new(50.0, 10.0);
        let id = place(&mut street, Point::new(10.0, 9.5));
        let mut pedestrian = Pedestrian::new(Side::West, 0.5);
        pedestrian.step(id, &mut street, 0.0, 10.0, &mut rng());
        let heading = pedestrian.steering.heading;
        assert!((205.0..=215.0).contains(&heading), "heading: {}", heading);
    }

    #[test]
    fn test_avoids_pedestrian_ahead() {
        let mut street = Street::new(50.0, 10.0);
        let id = place(&mut street, Point::new(10.0, 5.0));
        // Someone slightly above and ahead.
        place(&mut street, Point::new(11.0, 5.5));
        let mut pedestrian = Pedestrian::new(Side::East, 0.5);
        pedestrian.step(id, &mut street, 0.0, 10.0, &mut rng());
        let heading = pedestrian.steering.heading;
        // Turned clockwise, i.e. downwards and away.
        assert!((325.0..=335.0).contains(&heading), "heading: {}", heading);
    }

    #[test]
    fn test_ignores_pedestrian_behind() {
        let mut street = Street::new(50.0, 10.0);
        let id = place(&mut street, Point::new(10.0, 5.0));
        place(&mut street, Point::new(9.0, 5.5));
        let mut pedestrian = Pedestrian::new(Side::East, 0.5);
        pedestrian.step(id, &mut street, 0.0, 10.0, &mut rng());
        let heading = normalize_signed(pedestrian.steering.heading);
        assert!((-5.0..=5.0).contains(&heading), "heading: {}", heading);
    }

    #[test]
    fn test_neighbor_avoidance_overrides_edge_avoidance() {
        let mut street = Street::new(50.0, 10.0);
        let id = place(&mut street, Point::new(10.0, 0.5));
        // Ahead and below, so the neighbor pushes upwards; the edge pushes upwards too but the
        // bias is not doubled.
        place(&mut street, Point::new(11.0, 0.2));
        let mut pedestrian = Pedestrian::new(Side::East, 0.5);
        pedestrian.step(id, &mut street, 0.0, 10.0, &mut rng());
        let heading = pedestrian.steering.heading;
        assert!((25.0..=35.0).contains(&heading), "heading: {}", heading);
    }

    fn normalize_signed(heading: Float) -> Float {
        crate::steering::normalize_angle(heading)
    }

    #[test]
    fn test_litters_on_the_spot_without_nearby_trash() {
        let mut street = Street::new(50.0, 10.0);
        let id = place(&mut street, Point::new(10.0, 5.0));
        let mut pedestrian = Pedestrian::new(Side::East, 0.5);
        pedestrian.step(id, &mut street, 1.0, 10.0, &mut rng());

        let position = street.space().position(id).expect("pedestrian is on the street");
        let piles: Vec<_> = street.piles().collect();
        assert_eq!(piles.len(), 1);
        assert_eq!(piles[0].1, position);
        assert_eq!(piles[0].2.size, 1);
        assert!(!pedestrian.wants_to_litter);
        assert_eq!(pedestrian.nearest_trash, None);
    }

    #[test]
    fn test_walks_to_nearby_trash_and_adds_to_it() {
        let mut street = Street::new(50.0, 10.0);
        let trash = street.deposit(Point::new(11.0, 5.0));
        let id = place(&mut street, Point::new(10.0, 5.0));
        let mut pedestrian = Pedestrian::new(Side::East, 0.3);
        let mut rng = rng();

        // Decide to litter; the pile is within reach so intent stays set.
        pedestrian.step(id, &mut street, 1.0, 10.0, &mut rng);
        assert!(pedestrian.wants_to_litter);
        assert_eq!(pedestrian.nearest_trash, Some(trash));

        let mut ticks = 0;
        while pedestrian.wants_to_litter && ticks < 20 {
            pedestrian.step(id, &mut street, 0.0, 10.0, &mut rng);
            ticks += 1;
        }
        assert!(!pedestrian.wants_to_litter);
        assert_eq!(pedestrian.nearest_trash, None);
        assert_eq!(street.trash(trash).map(|t| t.size), Some(2));
        assert_eq!(street.space().position(id), Some(Point::new(11.0, 5.0)));
        assert_eq!(pedestrian.producing_wait, TIME_TO_PRODUCE_TRASH);
        assert_eq!(street.trash_produced(), 2);
    }

    #[test]
    fn test_stands_still_while_producing() {
        let mut street = Street::new(50.0, 10.0);
        let id = place(&mut street, Point::new(10.0, 5.0));
        let mut pedestrian = Pedestrian::new(Side::East, 0.5);
        pedestrian.producing_wait = 2;
        let mut rng = rng();
        pedestrian.step(id, &mut street, 0.0, 10.0, &mut rng);
        pedestrian.step(id, &mut street, 0.0, 10.0, &mut rng);
        assert_eq!(street.space().position(id), Some(Point::new(10.0, 5.0)));
        assert_eq!(pedestrian.producing_wait, 0);
        pedestrian.step(id, &mut street, 0.0, 10.0, &mut rng);
        let position = street.space().position(id).expect("pedestrian is on the street");
        assert!(position.x > 10.0);
    }

    #[test]
    fn test_lost_target_litters_on_the_spot() {
        let mut street = Street::new(50.0, 10.0);
        let trash = street.deposit(Point::new(12.0, 5.0));
        let id = place(&mut street, Point::new(10.0, 5.0));
        let mut pedestrian = Pedestrian::new(Side::East, 0.1);
        pedestrian.wants_to_litter = true;
        pedestrian.nearest_trash = Some(trash);
        street.collect(trash);

        pedestrian.step(id, &mut street, 0.0, 10.0, &mut rng());
        assert!(!pedestrian.wants_to_litter);
        assert_eq!(pedestrian.nearest_trash, None);
        assert_eq!(street.pile_count(), 1);
    }

    #[test]
    fn test_reports_leaving_the_street() {
        let mut street = Street::new(50.0, 10.0);
        let id = place(&mut street, Point::new(59.9, 5.0));
        let mut pedestrian = Pedestrian::new(Side::East, 0.5);
        let step = pedestrian.step(id, &mut street, 0.0, 10.0, &mut rng());
        assert_eq!(step, PedestrianStep::LeftStreet(Side::East));

        let id = place(&mut street, Point::new(-9.9, 5.0));
        let mut pedestrian = Pedestrian::new(Side::West, 0.5);
        let step = pedestrian.step(id, &mut street, 0.0, 10.0, &mut rng());
        assert_eq!(step, PedestrianStep::LeftStreet(Side::West));
    }

    #[test]
    fn test_entering_pedestrian_starts_outside_the_far_end() {
        let street = Street::new(50.0, 10.0);
        let mut rng = rng();
        let (pedestrian, position) = Pedestrian::entering(&street, Side::East, 0.4, 10.0, &mut rng);
        assert_eq!(position.x, -10.0);
        assert!((0.0..=10.0).contains(&position.y));
        assert_eq!(pedestrian.destination, Side::East);
        assert_abs_diff_eq!(pedestrian.speed, 0.4, epsilon = 1e-12);

        let (pedestrian, position) = Pedestrian::entering(&street, Side::West, 0.4, 10.0, &mut rng);
        assert_eq!(position.x, 60.0);
        assert_eq!(pedestrian.steering.heading, WEST);
    }

    #[test]
    fn test_forget_trash_only_forgets_matching_pile() {
        let mut street = Street::new(50.0, 10.0);
        let a = street.deposit(Point::new(1.0, 1.0));
        let b = street.deposit(Point::new(2.0, 1.0));
        let mut pedestrian = Pedestrian::new(Side::East, 0.5);
        pedestrian.nearest_trash = Some(a);
        pedestrian.forget_trash(b);
        assert_eq!(pedestrian.nearest_trash, Some(a));
        pedestrian.forget_trash(a);
        assert_eq!(pedestrian.nearest_trash, None);
    }
}
