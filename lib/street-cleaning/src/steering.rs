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

//! Heading-and-speed steering shared by every directional agent.
//!
//! Headings are in degrees, 0 is east (towards growing `x`) and angles grow counter-clockwise.

use serde::{Deserialize, Serialize};

use crate::space::Point;
use crate::Float;

pub const EAST: Float = 0.0;
pub const WEST: Float = 180.0;

/// Normalize an angle difference into `(-180, 180]`.
pub fn normalize_angle(degrees: Float) -> Float {
    let wrapped = (degrees + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 {
        180.0
    } else {
        wrapped
    }
}

/// Bearing from `from` to `to` in degrees, in `(-180, 180]`.
pub fn bearing_degrees(from: &Point, to: &Point) -> Float {
    (to.y - from.y).atan2(to.x - from.x).to_degrees()
}

/// Positive or zero maps to 1, negative to -1.
fn sign(value: Float) -> Float {
    if value >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Steering component: a heading and a per-tick turn limit. Agents that move with a heading
/// hold one of these next to their body in the space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Steering {
    pub heading: Float,
    pub max_turn: Float,
}

impl Steering {
    pub fn new(heading: Float, max_turn: Float) -> Self {
        Self { heading, max_turn }
    }

    /// Advance `position` by `speed` along the heading.
    ///
    /// Only `y` is bounded. When the step would cross `0` or `height` the position is clamped
    /// to that edge and the heading is mirrored, i.e. the agent bounces off the street edge.
    pub fn move_straight(&mut self, position: &mut Point, speed: Float, height: Float) {
        let radians = self.heading.to_radians();
        position.x += radians.cos() * speed;

        let mut new_y = position.y + radians.sin() * speed;
        if new_y < 0.0 {
            new_y = 0.0;
            self.heading = -self.heading;
        }
        if new_y > height {
            new_y = height;
            self.heading = -self.heading;
        }
        position.y = new_y;
    }

    /// Rotate towards `target` by at most `max_turn` degrees, taking the short way round.
    pub fn turn_toward(&mut self, position: &Point, target: &Point) {
        let diff = normalize_angle(bearing_degrees(position, target) - self.heading);
        self.heading += sign(diff) * diff.abs().min(self.max_turn);
    }

    /// Angle between the heading and the bearing to `target`, in `[0, 180]`.
    pub fn off_heading(&self, position: &Point, target: &Point) -> Float {
        normalize_angle(bearing_degrees(position, target) - self.heading).abs()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_move_straight_east() {
        let mut steering = Steering::new(EAST, 2.0);
        let mut position = Point::new(1.0, 1.0);
        steering.move_straight(&mut position, 0.5, 10.0);
        assert_abs_diff_eq!(position.x, 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(position.y, 1.0, epsilon = 1e-12);
        assert_eq!(steering.heading, EAST);
    }

    #[test]
    fn test_move_straight_leaves_street_horizontally() {
        let mut steering = Steering::new(WEST, 2.0);
        let mut position = Point::new(0.2, 1.0);
        steering.move_straight(&mut position, 1.0, 10.0);
        assert_abs_diff_eq!(position.x, -0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_move_straight_bounces_off_top_edge() {
        let mut steering = Steering::new(90.0, 2.0);
        let mut position = Point::new(1.0, 9.5);
        steering.move_straight(&mut position, 1.0, 10.0);
        assert_eq!(position.y, 10.0);
        assert_eq!(steering.heading, -90.0);
    }

    #[test]
    fn test_move_straight_bounces_off_bottom_edge() {
        let mut steering = Steering::new(-45.0, 2.0);
        let mut position = Point::new(1.0, 0.1);
        steering.move_straight(&mut position, 1.0, 10.0);
        assert_eq!(position.y, 0.0);
        assert_eq!(steering.heading, 45.0);
    }

    #[test]
    fn test_turn_toward_limited_by_max_turn() {
        let mut steering = Steering::new(EAST, 2.0);
        steering.turn_toward(&Point::new(0.0, 0.0), &Point::new(0.0, 10.0));
        assert_abs_diff_eq!(steering.heading, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_turn_toward_small_difference_is_exact() {
        let mut steering = Steering::new(EAST, 5.0);
        let target = Point::new(10.0, 10.0 * 1.0_f64.to_radians().tan());
        steering.turn_toward(&Point::new(0.0, 0.0), &target);
        assert_abs_diff_eq!(steering.heading, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_turn_toward_takes_short_way_across_180() {
        // Heading 170, target bearing -170: the short way is +20 degrees, not -340.
        let mut steering = Steering::new(170.0, 2.0);
        let origin = Point::new(0.0, 0.0);
        let target = Point::new(-10.0, -10.0 * 10.0_f64.to_radians().tan());
        steering.turn_toward(&origin, &target);
        assert_abs_diff_eq!(steering.heading, 172.0, epsilon = 1e-9);
    }

    #[test]
    fn test_normalize_angle_edges() {
        assert_eq!(normalize_angle(180.0), 180.0);
        assert_eq!(normalize_angle(-180.0), 180.0);
        assert_abs_diff_eq!(normalize_angle(350.0), -10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_angle(-350.0), 10.0, epsilon = 1e-12);
        assert_eq!(normalize_angle(0.0), 0.0);
    }

    #[test]
    fn test_off_heading() {
        let steering = Steering::new(EAST, 2.0);
        let origin = Point::new(0.0, 0.0);
        assert_abs_diff_eq!(
            steering.off_heading(&origin, &Point::new(0.0, 1.0)),
            90.0,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            steering.off_heading(&origin, &Point::new(-1.0, 0.0)),
            180.0,
            epsilon = 1e-9
        );
    }

    proptest! {
        #[test]
        fn test_normalize_angle_range(angle in -2000.0..2000.0f64) {
            let normalized = normalize_angle(angle);
            prop_assert!(normalized > -180.0 && normalized <= 180.0);
            let turns = (angle - normalized) / 360.0;
            prop_assert!((turns - turns.round()).abs() < 1e-9);
        }

        #[test]
        fn test_move_straight_stays_within_street_width(
            heading in -720.0..720.0f64,
            y in 0.0..10.0f64,
            speed in 0.0..5.0f64,
        ) {
            let mut steering = Steering::new(heading, 2.0);
            let mut position = Point::new(0.0, y);
            let projected = y + heading.to_radians().sin() * speed;
            steering.move_straight(&mut position, speed, 10.0);
            prop_assert!(position.y >= 0.0 && position.y <= 10.0);
            if !(0.0..=10.0).contains(&projected) {
                prop_assert_eq!(steering.heading, -heading);
            } else {
                prop_assert_eq!(steering.heading, heading);
            }
        }

        #[test]
        fn test_turn_toward_never_exceeds_max_turn(
            heading in -180.0..180.0f64,
            tx in -10.0..10.0f64,
            ty in -10.0..10.0f64,
            max_turn in 0.0..30.0f64,
        ) {
            let mut steering = Steering::new(heading, max_turn);
            steering.turn_toward(&Point::new(0.0, 0.0), &Point::new(tx, ty));
            prop_assert!((steering.heading - heading).abs() <= max_turn + 1e-9);
        }
    }
}
