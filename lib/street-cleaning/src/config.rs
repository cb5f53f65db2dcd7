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

//! Simulation configuration, supplied once when the world is built.
//!
//! Every value is in simulation units: metres, ticks (a tick is a tenth of a second) and trash
//! units. Use [`km_h_to_per_tick`] and [`per_hour_to_per_tick`] to convert from everyday units.

use serde::{Deserialize, Serialize};

use crate::Float;

/// Ticks in one real second.
pub const TICKS_PER_SECOND: u64 = 10;
/// Ticks in one hour.
pub const TICKS_PER_HOUR: u64 = 3600 * TICKS_PER_SECOND;
/// Ticks in one day.
pub const TICKS_PER_DAY: u64 = 24 * TICKS_PER_HOUR;

/// Convert a speed in km/h to metres per tick.
pub fn km_h_to_per_tick(km_h: Float) -> Float {
    km_h / 36.0
}

/// Convert an hourly rate into a per-tick probability.
pub fn per_hour_to_per_tick(per_hour: Float) -> Float {
    per_hour / TICKS_PER_HOUR as Float
}

/// Configuration error. Returned by [`SimulationConfig::validate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Street length or width is not a positive finite number.
    #[error("street dimension must be positive and finite: {name} = {value}")]
    InvalidDimension { name: &'static str, value: Float },

    /// A speed, radius, turn rate or factor is negative or not finite.
    #[error("{name} must be non-negative and finite, got {value}")]
    Negative { name: &'static str, value: Float },

    /// A probability is negative or not finite.
    #[error("{name} must be a non-negative probability, got {value}")]
    InvalidProbability { name: &'static str, value: Float },

    /// Robot capacity is zero.
    #[error("robot capacity must be at least 1")]
    ZeroCapacity,

    /// A period that must be at least one tick is zero.
    #[error("{0} must be at least one tick")]
    ZeroPeriod(&'static str),

    /// A tick window ends before it starts.
    #[error("tick window ends before it starts: {start}..{end}")]
    InvalidWindow { start: u64, end: u64 },
}

/// Which collection strategy cleans the street. Exactly one runs per world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    Robot,
    Sweeper,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Robot => write!(f, "robot"),
            Strategy::Sweeper => write!(f, "sweeper"),
        }
    }
}

/// Half-open window `[start, end)` of ticks within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickWindow {
    pub start: u64,
    pub end: u64,
}

impl TickWindow {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, tick_of_day: u64) -> bool {
        self.start <= tick_of_day && tick_of_day < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Length of the street in metres, the `x` extent.
    pub street_length: Float,
    /// Width of the street in metres, the `y` extent.
    pub street_width: Float,

    pub pedestrian_count: usize,
    /// Walking speed in metres per tick.
    pub pedestrian_speed: Float,
    /// Per-pedestrian probability of deciding to litter on a tick.
    pub littering_probability: Float,
    /// Windows of the day (a simulation starts at 06:00) when people eat and litter more.
    pub meal_windows: [TickWindow; 2],
    pub meal_littering_factor: Float,
    pub ticks_per_day: u64,

    /// Metres per tick.
    pub robot_max_speed: Float,
    pub robot_capacity: u32,
    /// Radius in metres in which the robot can see trash.
    pub robot_visibility: Float,
    /// Degrees per tick.
    pub robot_max_turn: Float,
    /// Ticks the robot spends off the street emptying and charging.
    pub depot_duration: u64,
    /// Pedestrians closer than this in front of the robot stop it.
    pub contact_radius: Float,
    /// Pedestrians closer than this in front of the robot slow it down.
    pub personal_space_radius: Float,

    pub time_until_first_sweep: u64,
    pub time_between_sweeps: u64,

    pub total_ticks: u64,
    pub strategy: Strategy,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            street_length: 100.0,
            street_width: 30.0,
            pedestrian_count: 20,
            pedestrian_speed: km_h_to_per_tick(10.0),
            littering_probability: 10.0 / 720_000.0,
            // 12:00-13:30 and 18:00-19:30 with the clock starting at 06:00.
            meal_windows: [
                TickWindow::new(6 * TICKS_PER_HOUR, 6 * TICKS_PER_HOUR + TICKS_PER_HOUR * 3 / 2),
                TickWindow::new(
                    12 * TICKS_PER_HOUR,
                    12 * TICKS_PER_HOUR + TICKS_PER_HOUR * 3 / 2,
                ),
            ],
            meal_littering_factor: 3.0,
            ticks_per_day: TICKS_PER_DAY,
            robot_max_speed: km_h_to_per_tick(10.0),
            robot_capacity: 100,
            robot_visibility: 10.0,
            robot_max_turn: 2.0,
            depot_duration: 5 * 60 * TICKS_PER_SECOND,
            contact_radius: 1.0,
            personal_space_radius: 2.5,
            time_until_first_sweep: TICKS_PER_DAY - 100,
            time_between_sweeps: TICKS_PER_DAY,
            total_ticks: TICKS_PER_DAY,
            strategy: Strategy::Robot,
            seed: 42,
        }
    }
}

fn check_dimension(name: &'static str, value: Float) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidDimension { name, value })
    }
}

fn check_non_negative(name: &'static str, value: Float) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}

impl SimulationConfig {
    /// Reject configurations the simulation cannot run meaningfully.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_dimension("street_length", self.street_length)?;
        check_dimension("street_width", self.street_width)?;

        check_non_negative("pedestrian_speed", self.pedestrian_speed)?;
        check_non_negative("meal_littering_factor", self.meal_littering_factor)?;
        check_non_negative("robot_max_speed", self.robot_max_speed)?;
        check_non_negative("robot_visibility", self.robot_visibility)?;
        check_non_negative("robot_max_turn", self.robot_max_turn)?;
        check_non_negative("contact_radius", self.contact_radius)?;
        check_non_negative("personal_space_radius", self.personal_space_radius)?;

        if !(self.littering_probability.is_finite() && self.littering_probability >= 0.0) {
            return Err(ConfigError::InvalidProbability {
                name: "littering_probability",
                value: self.littering_probability,
            });
        }
        if self.robot_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.time_between_sweeps == 0 {
            return Err(ConfigError::ZeroPeriod("time_between_sweeps"));
        }
        if self.ticks_per_day == 0 {
            return Err(ConfigError::ZeroPeriod("ticks_per_day"));
        }
        for window in &self.meal_windows {
            if window.end < window.start {
                return Err(ConfigError::InvalidWindow {
                    start: window.start,
                    end: window.end,
                });
            }
        }
        Ok(())
    }

    /// Distance beyond either end of the street at which agents leave the simulation.
    pub fn boundary_offset(&self) -> Float {
        (self.street_length / 5.0).floor()
    }

    /// Littering probability at `tick`, raised inside the meal windows.
    pub fn littering_probability_at(&self, tick: u64) -> Float {
        let tick_of_day = tick % self.ticks_per_day.max(1);
        if self
            .meal_windows
            .iter()
            .any(|window| window.contains(tick_of_day))
        {
            self.littering_probability * self.meal_littering_factor
        } else {
            self.littering_probability
        }
    }
}
