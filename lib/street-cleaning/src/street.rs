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

//! Trash piles and the ledger of what was produced and cleaned.

use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use tracing::trace;

use crate::space::{AgentId, AgentKind, ContinuousSpace, Point};
use crate::Float;

pub const MEDIUM_TRASH: u32 = 4;
pub const BIG_TRASH: u32 = 10;

/// Size class of a pile, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrashCategory {
    Small,
    Medium,
    Big,
}

/// A pile of trash. Its position lives in the space and never changes after creation.
/// One unit of size is roughly one cup or one piece of food packaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trash {
    pub size: u32,
}

impl Trash {
    pub fn new() -> Self {
        Self { size: 1 }
    }

    pub fn increase(&mut self) {
        self.size += 1;
    }

    pub fn category(&self) -> TrashCategory {
        if self.size >= BIG_TRASH {
            TrashCategory::Big
        } else if self.size >= MEDIUM_TRASH {
            TrashCategory::Medium
        } else {
            TrashCategory::Small
        }
    }
}

impl Default for Trash {
    fn default() -> Self {
        Self::new()
    }
}

/// The street: the shared space plus every trash pile on it.
///
/// All trash creation and destruction goes through here so the produced and cleaned
/// counters always agree with what is lying on the street.
#[derive(Debug, Clone)]
pub struct Street {
    space: ContinuousSpace,
    trash: SecondaryMap<AgentId, Trash>,
    produced: u64,
    cleaned: u64,
}

impl Street {
    pub fn new(length: Float, width: Float) -> Self {
        Self {
            space: ContinuousSpace::new(length, width),
            trash: SecondaryMap::new(),
            produced: 0,
            cleaned: 0,
        }
    }

    pub fn space(&self) -> &ContinuousSpace {
        &self.space
    }

    pub fn space_mut(&mut self) -> &mut ContinuousSpace {
        &mut self.space
    }

    pub fn length(&self) -> Float {
        self.space.width()
    }

    pub fn width(&self) -> Float {
        self.space.height()
    }

    /// Drop a new pile of size one at `position`.
    pub fn deposit(&mut self, position: Point) -> AgentId {
        self.deposit_pile(position, 1)
    }

    /// Drop a new pile of the given size. A zero size is treated as one.
    pub fn deposit_pile(&mut self, position: Point, size: u32) -> AgentId {
        let size = size.max(1);
        let id = self.space.insert(AgentKind::Trash, position);
        self.trash.insert(id, Trash { size });
        self.produced += u64::from(size);
        trace!(x = position.x, y = position.y, size, "trash deposited");
        id
    }

    /// Add one unit to an existing pile. Returns false if the pile is gone.
    pub fn add_to_pile(&mut self, id: AgentId) -> bool {
        match self.trash.get_mut(id) {
            Some(trash) => {
                trash.increase();
                self.produced += 1;
                true
            }
            None => false,
        }
    }

    /// Remove a pile, counting it as cleaned. Returns its size if it was still there.
    pub fn collect(&mut self, id: AgentId) -> Option<u32> {
        let trash = self.trash.remove(id)?;
        self.space.remove(id);
        self.cleaned += u64::from(trash.size);
        Some(trash.size)
    }

    /// Remove every pile. Returns the total size removed.
    pub fn collect_all(&mut self) -> u64 {
        let ids: Vec<AgentId> = self.trash.keys().collect();
        ids.into_iter()
            .filter_map(|id| self.collect(id))
            .map(u64::from)
            .sum()
    }

    pub fn trash(&self, id: AgentId) -> Option<&Trash> {
        self.trash.get(id)
    }

    pub fn trash_position(&self, id: AgentId) -> Option<Point> {
        if self.trash.contains_key(id) {
            self.space.position(id)
        } else {
            None
        }
    }

    pub fn is_trash(&self, id: AgentId) -> bool {
        self.trash.contains_key(id)
    }

    /// Every pile with its position.
    pub fn piles(&self) -> impl Iterator<Item = (AgentId, Point, &Trash)> {
        self.trash.iter().filter_map(move |(id, trash)| {
            self.space
                .position(id)
                .map(|position| (id, position, trash))
        })
    }

    pub fn pile_count(&self) -> usize {
        self.trash.len()
    }

    /// Largest pile size on the street, zero when the street is clean.
    pub fn max_trash_size(&self) -> u32 {
        self.trash.values().map(|trash| trash.size).max().unwrap_or(0)
    }

    /// Sum of all pile sizes.
    pub fn trash_on_street(&self) -> u64 {
        self.trash.values().map(|trash| u64::from(trash.size)).sum()
    }

    pub fn trash_produced(&self) -> u64 {
        self.produced
    }

    pub fn trash_cleaned(&self) -> u64 {
        self.cleaned
    }
}
