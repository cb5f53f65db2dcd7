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

//! The patrolling cleaning robot.
//!
//! The robot starts at the depot on the west end of the street and works its way east. Each
//! tick it either charges at the depot, or picks the best pile ahead of it (see
//! [`crate::scoring`]), drives to it and sweeps it up. It slows down or stops for pedestrians in
//! front of it. Once it has driven off the east end it goes back to the depot, empties its tank
//! and charges before starting the next pass.

use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use tracing::{debug, trace};

use crate::config::SimulationConfig;
use crate::pedestrian::Pedestrian;
use crate::scoring::{crowd_factor, select_target, Candidate, RobotView};
use crate::space::{AgentId, AgentKind, ContinuousSpace, Point};
use crate::steering::{Steering, EAST};
use crate::street::Street;
use crate::Float;

/// Sweeping speed as a fraction of the top speed.
pub const SLOW_SPEED_FACTOR: Float = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RobotState {
    /// Off the street at the depot.
    Charging,
    /// No target, cruising east.
    Seeking,
    /// Driving to a target that is not yet in sweeping range.
    Approaching,
    /// Within one top-speed step of the target, sweeping at slow speed.
    Sweeping,
}

/// How much the robot bothers the pedestrians around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disturbance {
    /// No robot on the street.
    Absent,
    /// Nobody in the robot's personal space.
    Far,
    /// Somebody in front of the robot within the personal-space radius.
    Near,
    /// Somebody in front of the robot within the contact radius; the robot stops.
    Contact,
}

impl Disturbance {
    /// Numeric code used in exported time series: -1 absent, 0 far, 1 near, 2 contact.
    pub fn code(&self) -> i8 {
        match self {
            Disturbance::Absent => -1,
            Disturbance::Far => 0,
            Disturbance::Near => 1,
            Disturbance::Contact => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Robot {
    pub steering: Steering,
    pub max_speed: Float,
    pub slow_speed: Float,
    pub capacity: u32,
    /// Trash units in the tank. Emptied at the depot.
    pub fullness: u32,
    pub visibility: Float,
    pub target_trash: Option<AgentId>,
    /// Trash units collected over the whole run.
    pub trash_cleaned: u64,
    pub time_to_charge: u64,
    pub close_to_human: bool,
    pub disturbance: Disturbance,
    pub state: RobotState,
    /// Ticks since the robot last left the depot.
    pub time_passed: u64,
    /// Ticks one pass along the street is expected to take.
    pub expected_total_time: Float,
    pub crowd_factor: Float,
    contact_radius: Float,
    personal_space_radius: Float,
    depot_duration: u64,
    boundary_offset: Float,
}

impl Robot {
    pub fn new(config: &SimulationConfig) -> Self {
        let crowd_factor = crowd_factor(config.pedestrian_count);
        let expected_total_time = if config.robot_max_speed > 0.0 {
            crowd_factor * config.street_length / config.robot_max_speed
        } else {
            Float::INFINITY
        };
        Self {
            steering: Steering::new(EAST, config.robot_max_turn),
            max_speed: config.robot_max_speed,
            slow_speed: SLOW_SPEED_FACTOR * config.robot_max_speed,
            capacity: config.robot_capacity,
            fullness: 0,
            visibility: config.robot_visibility,
            target_trash: None,
            trash_cleaned: 0,
            time_to_charge: 0,
            close_to_human: false,
            disturbance: Disturbance::Far,
            state: RobotState::Seeking,
            time_passed: 0,
            expected_total_time,
            crowd_factor,
            contact_radius: config.contact_radius,
            personal_space_radius: config.personal_space_radius,
            depot_duration: config.depot_duration,
            boundary_offset: config.boundary_offset(),
        }
    }

    /// Where the robot starts every pass: the middle of the west end.
    pub fn depot(street: &Street) -> Point {
        Point::new(0.0, street.width() / 2.0)
    }

    /// On the street, as opposed to charging at the depot.
    pub fn is_present(&self) -> bool {
        self.state != RobotState::Charging
    }

    pub fn has_capacity(&self) -> bool {
        self.fullness < self.capacity
    }

    pub fn view(&self, position: Point) -> RobotView {
        RobotView {
            position,
            max_speed: self.max_speed,
            fullness: self.fullness,
            capacity: self.capacity,
            time_passed: self.time_passed,
            expected_total_time: self.expected_total_time,
            crowd_factor: self.crowd_factor,
        }
    }

    pub fn step(
        &mut self,
        id: AgentId,
        street: &mut Street,
        pedestrians: &mut SecondaryMap<AgentId, Pedestrian>,
    ) {
        if self.time_to_charge > 0 {
            self.time_to_charge -= 1;
            self.state = RobotState::Charging;
            self.close_to_human = false;
            self.disturbance = Disturbance::Absent;
            if self.time_to_charge == 0 {
                self.leave_depot(id, street);
            }
            return;
        }

        let Some(mut position) = street.space().position(id) else {
            return;
        };

        if let Some(target) = self.target_trash {
            if !street.is_trash(target) {
                self.target_trash = None;
            }
        }
        if self.target_trash.is_none() && self.has_capacity() {
            self.target_trash = self.choose_target(id, position, street);
        }

        let target_position = self
            .target_trash
            .and_then(|target| street.trash_position(target));
        let (aim, speed) = match target_position {
            None => {
                self.state = RobotState::Seeking;
                (
                    Point::new(2.0 * street.length(), position.y),
                    self.max_speed,
                )
            }
            Some(target_position) if position.distance_to(&target_position) < self.max_speed => {
                self.state = RobotState::Sweeping;
                (target_position, self.slow_speed)
            }
            Some(target_position) => {
                self.state = RobotState::Approaching;
                (target_position, self.max_speed)
            }
        };
        let speed = self.yield_to_pedestrians(id, position, street.space(), speed);

        self.steering.turn_toward(&position, &aim);
        self.steering.move_straight(&mut position, speed, street.width());
        street.space_mut().set_position(id, position);

        if self.state == RobotState::Sweeping {
            self.sweep(id, position, street, pedestrians);
        }

        // Turning too slowly to reach the target; give up on it and pick another next tick.
        if let Some(target_position) = self
            .target_trash
            .and_then(|target| street.trash_position(target))
        {
            if position.x > target_position.x {
                trace!(x = position.x, target_x = target_position.x, "missed target");
                self.target_trash = None;
            }
        }

        self.time_passed += 1;

        if position.x > street.length() + self.boundary_offset {
            self.enter_depot(id, street);
        }
    }

    /// Best visible pile ahead of the robot.
    fn choose_target(&self, id: AgentId, position: Point, street: &Street) -> Option<AgentId> {
        let candidates: Vec<Candidate> = street
            .space()
            .neighbors_of_kind(position, self.visibility, AgentKind::Trash, Some(id))
            .into_iter()
            .filter_map(|trash| {
                let trash_position = street.trash_position(trash)?;
                let size = street.trash(trash)?.size;
                Some(Candidate {
                    id: trash,
                    position: trash_position,
                    size,
                })
            })
            .filter(|candidate| candidate.position.x > position.x)
            .collect();
        let chosen = select_target(
            &self.view(position),
            candidates,
            street.max_trash_size(),
            street.length(),
        )?;
        debug!(
            x = chosen.position.x,
            y = chosen.position.y,
            size = chosen.size,
            "robot chose target"
        );
        Some(chosen.id)
    }

    /// Cap `speed` for pedestrians in front of the robot and record the disturbance.
    fn yield_to_pedestrians(
        &mut self,
        id: AgentId,
        position: Point,
        space: &ContinuousSpace,
        speed: Float,
    ) -> Float {
        let radius = self.contact_radius.max(self.personal_space_radius);
        let mut disturbance = Disturbance::Far;
        let nearby = space.neighbors_of_kind(position, radius, AgentKind::Pedestrian, Some(id));
        for pedestrian in nearby {
            let Some(pedestrian_position) = space.position(pedestrian) else {
                continue;
            };
            if self.steering.off_heading(&position, &pedestrian_position) > 90.0 {
                continue;
            }
            let distance = position.distance_to(&pedestrian_position);
            if distance <= self.contact_radius {
                disturbance = Disturbance::Contact;
                break;
            }
            if distance <= self.personal_space_radius {
                disturbance = Disturbance::Near;
            }
        }

        self.disturbance = disturbance;
        self.close_to_human = disturbance != Disturbance::Far;
        match disturbance {
            Disturbance::Contact => 0.0,
            Disturbance::Near => speed.min(self.slow_speed),
            _ => speed,
        }
    }

    /// Collect every pile within sweeping reach of `position`.
    fn sweep(
        &mut self,
        id: AgentId,
        position: Point,
        street: &mut Street,
        pedestrians: &mut SecondaryMap<AgentId, Pedestrian>,
    ) {
        let nearby = street.space().neighbors_of_kind(
            position,
            self.slow_speed,
            AgentKind::Trash,
            Some(id),
        );
        for trash in nearby {
            let Some(size) = street.collect(trash) else {
                continue;
            };
            self.trash_cleaned += u64::from(size);
            self.fullness += size;
            for pedestrian in pedestrians.values_mut() {
                pedestrian.forget_trash(trash);
            }
            self.target_trash = None;
            trace!(size, fullness = self.fullness, "robot swept trash");
        }
    }

    fn enter_depot(&mut self, id: AgentId, street: &mut Street) {
        debug!(
            fullness = self.fullness,
            trash_cleaned = self.trash_cleaned,
            "robot reached the depot"
        );
        self.fullness = 0;
        self.target_trash = None;
        self.state = RobotState::Charging;
        self.close_to_human = false;
        self.disturbance = Disturbance::Absent;
        self.time_to_charge = self.depot_duration;
        if self.time_to_charge == 0 {
            self.leave_depot(id, street);
        }
    }

    fn leave_depot(&mut self, id: AgentId, street: &mut Street) {
        let depot = Robot::depot(street);
        street.space_mut().set_position(id, depot);
        self.steering.heading = EAST;
        self.time_passed = 0;
        self.state = RobotState::Seeking;
        self.disturbance = Disturbance::Far;
        debug!("robot left the depot");
    }
}
