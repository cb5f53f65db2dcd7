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

//! Per-tick metrics for export and plotting.

use serde::{Deserialize, Serialize};

use crate::robot::Disturbance;

/// One row of the metrics time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickMetrics {
    pub tick: u64,
    /// Sum of the sizes of all piles on the street.
    pub trash_on_street: u64,
    /// Trash units produced since the start of the run.
    pub trash_produced: u64,
    /// Trash units cleaned since the start of the run.
    pub trash_cleaned: u64,
    pub disturbance: Disturbance,
    /// The robot is on the street, or the sweeper strategy is running.
    pub strategy_present: bool,
}

/// Tick counts per disturbance class, over ticks where the robot was present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisturbanceSummary {
    pub far: u64,
    pub near: u64,
    pub contact: u64,
}

/// Ordered sequence of per-tick metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsLog {
    rows: Vec<TickMetrics>,
}

impl MetricsLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, row: TickMetrics) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[TickMetrics] {
        &self.rows
    }

    pub fn last(&self) -> Option<&TickMetrics> {
        self.rows.last()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn disturbance_summary(&self) -> DisturbanceSummary {
        let mut summary = DisturbanceSummary::default();
        for row in self.rows.iter().filter(|row| row.strategy_present) {
            match row.disturbance {
                Disturbance::Far => summary.far += 1,
                Disturbance::Near => summary.near += 1,
                Disturbance::Contact => summary.contact += 1,
                Disturbance::Absent => {}
            }
        }
        summary
    }

    /// Ticks where the collection strategy was present.
    pub fn ticks_present(&self) -> u64 {
        self.rows.iter().filter(|row| row.strategy_present).count() as u64
    }
}
