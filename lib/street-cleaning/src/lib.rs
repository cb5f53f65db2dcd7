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

//! Street littering and cleaning simulation.
//!
//! Pedestrians walk along a street and litter; either a patrolling robot or a periodic sweeper
//! cleans up after them. The aim is to compare the two strategies on how much trash stays on the
//! street, how much gets collected, and how much the robot gets in people's way.
//!
//! One tick is a tenth of a second. A [`world::World`] advances the agents tick by tick; a
//! [`Simulation`] runs a world for its configured duration and hands every tick to an optional
//! observer, e.g. a viewer or an exporter.

pub mod config;
pub mod metrics;
pub mod pedestrian;
pub mod robot;
pub mod scoring;
pub mod space;
pub mod steering;
pub mod street;
pub mod sweeper;
pub mod world;

pub use config::{ConfigError, SimulationConfig, Strategy};
pub use metrics::{MetricsLog, TickMetrics};
pub use space::{AgentId, AgentKind, Point};
pub use world::{AgentView, World};

pub type Float = f64;
pub type Rng = rand_pcg::Pcg64;

/// Runs a [`World`] from its first tick to `total_ticks`.
pub struct Simulation {
    world: World,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            world: World::new(config)?,
        })
    }

    pub fn run(&mut self) -> &MetricsLog {
        self.run_with(|_| {})
    }

    /// Run to the end, calling `observe` with the world after every tick.
    pub fn run_with<F>(&mut self, mut observe: F) -> &MetricsLog
    where
        F: FnMut(&World),
    {
        while self.world.is_running() {
            self.world.step();
            observe(&self.world);
        }
        if let Some(last) = self.world.metrics().last() {
            tracing::info!(
                ticks = last.tick,
                trash_on_street = last.trash_on_street,
                trash_produced = last.trash_produced,
                trash_cleaned = last.trash_cleaned,
                "simulation finished"
            );
        }
        self.world.metrics()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn into_world(self) -> World {
        self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SimulationConfig {
        SimulationConfig {
            street_length: 30.0,
            street_width: 8.0,
            pedestrian_count: 10,
            littering_probability: 0.02,
            robot_max_speed: 0.5,
            total_ticks: 250,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_simulation_runs_to_total_ticks() {
        let mut simulation = Simulation::new(config()).expect("valid config");
        let metrics = simulation.run();
        assert_eq!(metrics.len(), 251);
        assert_eq!(metrics.last().map(|row| row.tick), Some(250));
        assert!(!simulation.world().is_running());
    }

    #[test]
    fn test_observer_sees_every_tick() {
        let mut simulation = Simulation::new(config()).expect("valid config");
        let mut seen = Vec::new();
        simulation.run_with(|world| {
            seen.push(world.tick());
            assert_eq!(world.pedestrian_count(), 10);
        });
        assert_eq!(seen, (1..=250).collect::<Vec<u64>>());
    }

    #[test]
    fn test_produces_trash() {
        let mut simulation = Simulation::new(config()).expect("valid config");
        simulation.run();
        let world = simulation.into_world();
        let last = world.metrics().last().copied().expect("metrics recorded");
        // 10 pedestrians * 250 ticks * 0.02 is about 50 decisions to litter.
        assert!(last.trash_produced > 0);
        assert_eq!(
            last.trash_on_street,
            last.trash_produced - last.trash_cleaned
        );
    }

    #[test]
    fn test_invalid_config() {
        let config = SimulationConfig {
            street_length: -3.0,
            ..config()
        };
        assert!(Simulation::new(config).is_err());
    }
}
