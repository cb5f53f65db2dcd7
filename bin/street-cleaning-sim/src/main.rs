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

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use street_cleaning::config::{km_h_to_per_tick, per_hour_to_per_tick};
use street_cleaning::{Simulation, SimulationConfig, Strategy};
use tracing::info;

/// Simulate pedestrians littering a street and a robot or a sweeper cleaning it up.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON file with a full or partial configuration. Flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Number of ticks (tenths of a second) to simulate.
    #[arg(long)]
    ticks: Option<u64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Street length in metres.
    #[arg(long)]
    street_length: Option<f64>,

    /// Street width in metres.
    #[arg(long)]
    street_width: Option<f64>,

    #[arg(long)]
    pedestrians: Option<usize>,

    #[arg(long)]
    pedestrian_speed_km_h: Option<f64>,

    /// Trash units each pedestrian drops per hour.
    #[arg(long)]
    littering_per_hour: Option<f64>,

    #[arg(long)]
    robot_speed_km_h: Option<f64>,

    /// Robot capacity in trash units.
    #[arg(long)]
    robot_capacity: Option<u32>,

    /// Radius in metres in which the robot sees trash.
    #[arg(long)]
    robot_visibility: Option<f64>,

    /// Print the metrics of every n-th tick as a JSON line.
    #[arg(long)]
    print_every: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Robot,
    Sweeper,
}

impl From<StrategyArg> for Strategy {
    fn from(strategy: StrategyArg) -> Self {
        match strategy {
            StrategyArg::Robot => Strategy::Robot,
            StrategyArg::Sweeper => Strategy::Sweeper,
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };

    if let Some(strategy) = args.strategy {
        config.strategy = strategy.into();
    }
    if let Some(ticks) = args.ticks {
        config.total_ticks = ticks;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(length) = args.street_length {
        config.street_length = length;
    }
    if let Some(width) = args.street_width {
        config.street_width = width;
    }
    if let Some(pedestrians) = args.pedestrians {
        config.pedestrian_count = pedestrians;
    }
    if let Some(speed) = args.pedestrian_speed_km_h {
        config.pedestrian_speed = km_h_to_per_tick(speed);
    }
    if let Some(rate) = args.littering_per_hour {
        config.littering_probability = per_hour_to_per_tick(rate);
    }
    if let Some(speed) = args.robot_speed_km_h {
        config.robot_max_speed = km_h_to_per_tick(speed);
    }
    if let Some(capacity) = args.robot_capacity {
        config.robot_capacity = capacity;
    }
    if let Some(visibility) = args.robot_visibility {
        config.robot_visibility = visibility;
    }
    Ok(config)
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = load_config(&args)?;
    info!(strategy = %config.strategy, ticks = config.total_ticks, "starting");

    let mut simulation = Simulation::new(config).context("invalid configuration")?;
    let print_every = args.print_every.filter(|n| *n > 0);
    let mut write_error = None;
    simulation.run_with(|world| {
        if let Some(every) = print_every {
            if world.tick() % every == 0 && write_error.is_none() {
                match serde_json::to_string(&world.current_metrics()) {
                    Ok(line) => println!("{}", line),
                    Err(e) => write_error = Some(e),
                }
            }
        }
    });
    if let Some(e) = write_error {
        return Err(e).context("serializing metrics");
    }

    let world = simulation.world();
    let metrics = world.metrics();
    if let Some(last) = metrics.last() {
        println!("ticks: {}", last.tick);
        println!("trash on street: {}", last.trash_on_street);
        println!("trash produced: {}", last.trash_produced);
        println!("trash cleaned: {}", last.trash_cleaned);
    }
    if let Some(robot) = world.robot() {
        let disturbance = metrics.disturbance_summary();
        let present = metrics.ticks_present().max(1) as f64;
        println!("robot present: {} ticks", metrics.ticks_present());
        println!(
            "robot disturbance: contact {:.1}%, near {:.1}%, far {:.1}%",
            100.0 * disturbance.contact as f64 / present,
            100.0 * disturbance.near as f64 / present,
            100.0 * disturbance.far as f64 / present,
        );
        println!("robot cleaned: {}", robot.trash_cleaned);
    }
    if let Some(sweeper) = world.sweeper() {
        println!("sweeps: {}", sweeper.sweeps);
    }
    Ok(())
}
