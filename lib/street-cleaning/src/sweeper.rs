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

//! Periodic street sweeper, the non-patrolling baseline.
//!
//! The sweeper does nothing but count down. When the countdown runs out it clears the whole
//! street at once, including every littering intention that was still on its way to a pile.

use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use tracing::debug;

use crate::pedestrian::Pedestrian;
use crate::space::AgentId;
use crate::street::Street;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sweeper {
    /// Ticks left until the next sweep.
    pub time_until_sweep: u64,
    pub time_between_sweeps: u64,
    pub trash_cleaned: u64,
    pub sweeps: u64,
}

impl Sweeper {
    pub fn new(time_until_first_sweep: u64, time_between_sweeps: u64) -> Self {
        Self {
            time_until_sweep: time_until_first_sweep,
            time_between_sweeps,
            trash_cleaned: 0,
            sweeps: 0,
        }
    }

    /// Count down one tick and sweep when the countdown reaches zero. Returns whether a sweep
    /// happened.
    pub fn step(
        &mut self,
        street: &mut Street,
        pedestrians: &mut SecondaryMap<AgentId, Pedestrian>,
    ) -> bool {
        self.time_until_sweep = self.time_until_sweep.saturating_sub(1);
        if self.time_until_sweep > 0 {
            return false;
        }
        self.sweep(street, pedestrians);
        self.time_until_sweep = self.time_between_sweeps;
        true
    }

    fn sweep(&mut self, street: &mut Street, pedestrians: &mut SecondaryMap<AgentId, Pedestrian>) {
        let collected = street.collect_all();
        for pedestrian in pedestrians.values_mut() {
            pedestrian.cancel_littering();
        }
        self.trash_cleaned += collected;
        self.sweeps += 1;
        debug!(collected, sweeps = self.sweeps, "street swept");
    }
}
