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

//! Target scoring for the cleaning robot.
//!
//! A pile is worth collecting if the robot does not have to swerve for it, if it is big, and if
//! collecting it keeps the robot on schedule both in time and in how full it gets relative to
//! how far along the street it is. Each consideration scores roughly in `[0, 1]` and the total
//! is their weighted sum.

use serde::{Deserialize, Serialize};

use crate::space::{AgentId, Point};
use crate::steering::bearing_degrees;
use crate::Float;

/// Extra travel time per pedestrian on the street, as a fraction of the free-flow time.
pub const CROWD_SLOWDOWN_PER_PEDESTRIAN: Float = 0.05;

/// Multiplier on free-flow travel time for a street with `pedestrian_count` people on it.
pub fn crowd_factor(pedestrian_count: usize) -> Float {
    1.0 + CROWD_SLOWDOWN_PER_PEDESTRIAN * pedestrian_count as Float
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub angle: Float,
    pub amount: Float,
    pub time: Float,
    pub fullness: Float,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            angle: 1.0,
            amount: 2.0,
            time: 1.0,
            fullness: 1.0,
        }
    }
}

/// What the scoring needs to know about the robot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotView {
    pub position: Point,
    pub max_speed: Float,
    pub fullness: u32,
    pub capacity: u32,
    /// Ticks since the robot left the depot.
    pub time_passed: u64,
    /// Ticks one pass along the street is expected to take.
    pub expected_total_time: Float,
    pub crowd_factor: Float,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub id: AgentId,
    pub position: Point,
    pub size: u32,
}

/// The four unweighted score terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreComponents {
    pub angle: Float,
    pub amount: Float,
    pub time: Float,
    pub fullness: Float,
}

impl ScoreComponents {
    pub fn total(&self, weights: &ScoreWeights) -> Float {
        weights.angle * self.angle
            + weights.amount * self.amount
            + weights.time * self.time
            + weights.fullness * self.fullness
    }
}

/// Score terms for one candidate. `max_trash_size` is the biggest pile anywhere on the street,
/// zero when the street is clean.
pub fn score_components(
    robot: &RobotView,
    candidate: &Candidate,
    max_trash_size: u32,
    street_length: Float,
) -> ScoreComponents {
    // Bearing relative to east, in degrees.
    let angle = 1.0 - bearing_degrees(&robot.position, &candidate.position).abs() / 180.0;

    let amount = if max_trash_size == 0 {
        0.0
    } else {
        Float::from(candidate.size) / Float::from(max_trash_size)
    };

    let distance_part_covered = candidate.position.x / street_length;

    let distance = robot.position.distance_to(&candidate.position);
    let travel_time = if robot.max_speed > 0.0 {
        robot.crowd_factor * distance / robot.max_speed
    } else {
        0.0
    };
    let time_part_passed = if robot.expected_total_time > 0.0 {
        (robot.time_passed as Float + travel_time) / robot.expected_total_time
    } else {
        0.0
    };
    let time = 1.0 - (distance_part_covered - time_part_passed).abs();

    let capacity_part_filled =
        Float::from(robot.fullness + candidate.size) / Float::from(robot.capacity.max(1));
    let fullness = 1.0 - (distance_part_covered - capacity_part_filled).abs();

    ScoreComponents {
        angle,
        amount,
        time,
        fullness,
    }
}

/// Weighted score of one candidate with the default weights.
pub fn score(
    robot: &RobotView,
    candidate: &Candidate,
    max_trash_size: u32,
    street_length: Float,
) -> Float {
    score_components(robot, candidate, max_trash_size, street_length)
        .total(&ScoreWeights::default())
}

/// Highest scoring candidate.
///
/// When several candidates share the top score the first one in iteration order wins. The
/// order candidates come in is not specified, so such ties are effectively arbitrary.
pub fn select_target<I>(
    robot: &RobotView,
    candidates: I,
    max_trash_size: u32,
    street_length: Float,
) -> Option<Candidate>
where
    I: IntoIterator<Item = Candidate>,
{
    let mut best: Option<(Candidate, Float)> = None;
    for candidate in candidates {
        let candidate_score = score(robot, &candidate, max_trash_size, street_length);
        match best {
            Some((_, best_score)) if best_score >= candidate_score => {}
            _ => best = Some((candidate, candidate_score)),
        }
    }
    best.map(|(candidate, _)| candidate)
}
