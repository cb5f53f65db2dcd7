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

//! The world: owns the street, every agent, the random source and the metrics, and advances
//! them one tick at a time.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use tracing::{debug, info};

use crate::config::{ConfigError, SimulationConfig, Strategy};
use crate::metrics::{MetricsLog, TickMetrics};
use crate::pedestrian::{Pedestrian, PedestrianStep, Side};
use crate::robot::{Disturbance, Robot};
use crate::space::{AgentId, AgentKind, Point};
use crate::street::{Street, Trash, TrashCategory};
use crate::sweeper::Sweeper;
use crate::Rng;

/// The collection strategy running in a world. Exactly one of the two runs.
#[derive(Debug, Clone)]
pub enum Collector {
    Robot { id: AgentId, robot: Robot },
    Sweeper { id: AgentId, sweeper: Sweeper },
}

/// What a viewer needs to draw one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub id: AgentId,
    pub kind: AgentKind,
    pub position: Point,
    /// Pile size for trash, fullness for the robot, zero for everything else.
    pub magnitude: u64,
    /// Size class, for trash only.
    pub category: Option<TrashCategory>,
}

#[derive(Debug, Clone)]
pub struct World {
    config: SimulationConfig,
    street: Street,
    pedestrians: SecondaryMap<AgentId, Pedestrian>,
    collector: Collector,
    rng: Rng,
    tick: u64,
    metrics: MetricsLog,
}

impl World {
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = Rng::seed_from_u64(config.seed);
        let mut street = Street::new(config.street_length, config.street_width);

        let depot = Robot::depot(&street);
        let collector = match config.strategy {
            Strategy::Robot => Collector::Robot {
                id: street.space_mut().insert(AgentKind::Robot, depot),
                robot: Robot::new(&config),
            },
            Strategy::Sweeper => Collector::Sweeper {
                id: street.space_mut().insert(AgentKind::Sweeper, depot),
                sweeper: Sweeper::new(config.time_until_first_sweep, config.time_between_sweeps),
            },
        };

        let mut pedestrians = SecondaryMap::new();
        for _ in 0..config.pedestrian_count {
            let (pedestrian, position) =
                Pedestrian::scattered(&street, config.pedestrian_speed, &mut rng);
            let id = street.space_mut().insert(AgentKind::Pedestrian, position);
            pedestrians.insert(id, pedestrian);
        }

        info!(
            street_length = config.street_length,
            street_width = config.street_width,
            pedestrians = config.pedestrian_count,
            strategy = %config.strategy,
            seed = config.seed,
            "world created"
        );

        let mut world = Self {
            config,
            street,
            pedestrians,
            collector,
            rng,
            tick: 0,
            metrics: MetricsLog::new(),
        };
        world.record_metrics();
        Ok(world)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Ticks simulated so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn is_running(&self) -> bool {
        self.tick < self.config.total_ticks
    }

    /// Advance one tick: every pedestrian in a fresh random order, then the collection
    /// strategy, then metrics.
    pub fn step(&mut self) {
        self.tick += 1;
        let littering_probability = self.config.littering_probability_at(self.tick);
        let boundary_offset = self.config.boundary_offset();

        let mut order: Vec<AgentId> = self.pedestrians.keys().collect();
        order.shuffle(&mut self.rng);
        for id in order {
            let Some(pedestrian) = self.pedestrians.get_mut(id) else {
                continue;
            };
            let outcome = pedestrian.step(
                id,
                &mut self.street,
                littering_probability,
                boundary_offset,
                &mut self.rng,
            );
            if let PedestrianStep::LeftStreet(exited) = outcome {
                self.recycle_pedestrian(id, exited);
            }
        }

        match &mut self.collector {
            Collector::Robot { id, robot } => {
                robot.step(*id, &mut self.street, &mut self.pedestrians);
            }
            Collector::Sweeper { sweeper, .. } => {
                sweeper.step(&mut self.street, &mut self.pedestrians);
            }
        }

        self.record_metrics();
    }

    /// Replace a pedestrian that walked off one end with a fresh one entering from the other.
    fn recycle_pedestrian(&mut self, id: AgentId, exited: Side) {
        let Some(old) = self.pedestrians.remove(id) else {
            return;
        };
        self.street.space_mut().remove(id);

        let (pedestrian, position) = Pedestrian::entering(
            &self.street,
            exited,
            old.speed,
            self.config.boundary_offset(),
            &mut self.rng,
        );
        let new_id = self.street.space_mut().insert(AgentKind::Pedestrian, position);
        self.pedestrians.insert(new_id, pedestrian);
        debug!(tick = self.tick, x = position.x, "pedestrian recycled");
    }

    fn record_metrics(&mut self) {
        let row = self.current_metrics();
        self.metrics.record(row);
    }

    /// Metrics for the current state of the world.
    pub fn current_metrics(&self) -> TickMetrics {
        let (disturbance, strategy_present) = match &self.collector {
            Collector::Robot { robot, .. } if robot.is_present() => (robot.disturbance, true),
            Collector::Robot { .. } => (Disturbance::Absent, false),
            Collector::Sweeper { .. } => (Disturbance::Absent, true),
        };
        TickMetrics {
            tick: self.tick,
            trash_on_street: self.street.trash_on_street(),
            trash_produced: self.street.trash_produced(),
            trash_cleaned: self.street.trash_cleaned(),
            disturbance,
            strategy_present,
        }
    }

    pub fn metrics(&self) -> &MetricsLog {
        &self.metrics
    }

    pub fn street(&self) -> &Street {
        &self.street
    }

    pub fn strategy(&self) -> Strategy {
        match self.collector {
            Collector::Robot { .. } => Strategy::Robot,
            Collector::Sweeper { .. } => Strategy::Sweeper,
        }
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    pub fn robot(&self) -> Option<&Robot> {
        match &self.collector {
            Collector::Robot { robot, .. } => Some(robot),
            Collector::Sweeper { .. } => None,
        }
    }

    pub fn robot_mut(&mut self) -> Option<&mut Robot> {
        match &mut self.collector {
            Collector::Robot { robot, .. } => Some(robot),
            Collector::Sweeper { .. } => None,
        }
    }

    pub fn robot_id(&self) -> Option<AgentId> {
        match self.collector {
            Collector::Robot { id, .. } => Some(id),
            Collector::Sweeper { .. } => None,
        }
    }

    pub fn sweeper(&self) -> Option<&Sweeper> {
        match &self.collector {
            Collector::Sweeper { sweeper, .. } => Some(sweeper),
            Collector::Robot { .. } => None,
        }
    }

    pub fn pedestrians(&self) -> impl Iterator<Item = (AgentId, &Pedestrian)> {
        self.pedestrians.iter()
    }

    pub fn pedestrian(&self, id: AgentId) -> Option<&Pedestrian> {
        self.pedestrians.get(id)
    }

    pub fn pedestrian_mut(&mut self, id: AgentId) -> Option<&mut Pedestrian> {
        self.pedestrians.get_mut(id)
    }

    pub fn pedestrian_count(&self) -> usize {
        self.pedestrians.len()
    }

    pub fn trash(&self) -> impl Iterator<Item = (AgentId, Point, &Trash)> {
        self.street.piles()
    }

    pub fn position(&self, id: AgentId) -> Option<Point> {
        self.street.space().position(id)
    }

    /// Put a pile on the street, e.g. to set up a scenario. Counts as produced trash.
    pub fn place_trash(&mut self, position: Point, size: u32) -> AgentId {
        self.street.deposit_pile(position, size)
    }

    /// Add a pedestrian at a given spot, walking to `destination`.
    pub fn spawn_pedestrian_at(&mut self, position: Point, destination: Side) -> AgentId {
        let id = self.street.space_mut().insert(AgentKind::Pedestrian, position);
        self.pedestrians
            .insert(id, Pedestrian::new(destination, self.config.pedestrian_speed));
        id
    }

    /// Every live agent as a viewer sees it.
    pub fn agents(&self) -> Vec<AgentView> {
        self.street
            .space()
            .iter()
            .map(|(id, body)| {
                let pile = match body.kind {
                    AgentKind::Trash => self.street.trash(id),
                    _ => None,
                };
                let magnitude = match body.kind {
                    AgentKind::Trash => pile.map(|trash| u64::from(trash.size)).unwrap_or(0),
                    AgentKind::Robot => self
                        .robot()
                        .map(|robot| u64::from(robot.fullness))
                        .unwrap_or(0),
                    AgentKind::Pedestrian | AgentKind::Sweeper => 0,
                };
                AgentView {
                    id,
                    kind: body.kind,
                    position: body.position,
                    magnitude,
                    category: pile.map(Trash::category),
                }
            })
            .collect()
    }
}
