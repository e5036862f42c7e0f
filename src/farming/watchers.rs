//! Per-cell growth watchers.
//!
//! Each occupied cell gets one `GrowthWatcher` entity. A single system polls
//! all of them on their own interval instead of running a task per cell.
//! Bookkeeping in `GrowthWatcherPool` is dropped whenever a watcher ends,
//! whatever the reason.

use bevy::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

use super::grid::FarmGrid;
use super::growth;
use crate::config::CoreConfig;
use crate::data::CropCatalog;
use crate::shared::*;

#[derive(Component, Debug, Clone)]
pub struct GrowthWatcher {
    pub cell: GridPos,
    pub crop_id: CropId,
    pub planted_at: Timestamp,
    last_stage: Option<u32>,
    next_poll: Option<Timestamp>,
}

/// What one poll decided.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchStep {
    /// Still growing. `stage` is set when the visual stage moved.
    Continue { stage: Option<(u32, f64)> },
    /// Mature. The watcher ends after this.
    Ready { stage: Option<(u32, f64)> },
    /// The cell no longer holds the crop this watcher was started for.
    Stale,
}

impl GrowthWatcher {
    pub fn new(cell: GridPos, crop_id: CropId, planted_at: Timestamp) -> Self {
        Self {
            cell,
            crop_id,
            planted_at,
            last_stage: None,
            next_poll: None,
        }
    }

    fn due(&self, now: Timestamp) -> bool {
        self.next_poll.map_or(true, |at| now >= at)
    }

    /// Reads the cell and the clock. Only the watcher's own stage memory changes.
    pub fn poll(
        &mut self,
        grid: &FarmGrid,
        catalog: &CropCatalog,
        now: Timestamp,
    ) -> Result<WatchStep, FarmError> {
        let cell = grid.get(self.cell)?;
        let current = match cell.crop() {
            Some(crop) if crop.crop_id == self.crop_id && crop.planted_at == self.planted_at => {
                crop
            }
            _ => return Ok(WatchStep::Stale),
        };

        let def = catalog.get(current.crop_id.as_str())?;
        let reading = growth::phase(current.planted_at, def.growth_time_secs, now);
        let stage = growth::stage(reading.fraction, def.stage_count);

        let changed = if self.last_stage != Some(stage) {
            self.last_stage = Some(stage);
            Some((stage, reading.fraction))
        } else {
            None
        };

        if reading.is_ready() {
            Ok(WatchStep::Ready { stage: changed })
        } else {
            Ok(WatchStep::Continue { stage: changed })
        }
    }
}

#[derive(Debug, Clone)]
struct WatcherHandle {
    entity: Entity,
    crop_id: CropId,
    planted_at: Timestamp,
}

/// At most one watcher per cell, keyed by coordinate.
#[derive(Resource, Debug, Default)]
pub struct GrowthWatcherPool {
    active: HashMap<GridPos, WatcherHandle>,
}

impl GrowthWatcherPool {
    /// Starts watching `cell`. Registering the same crop twice returns the
    /// existing watcher; a leftover watcher for an older crop is replaced.
    pub fn register(
        &mut self,
        commands: &mut Commands,
        cell: GridPos,
        crop_id: CropId,
        planted_at: Timestamp,
    ) -> Entity {
        if let Some(existing) = self.active.get(&cell) {
            if existing.crop_id == crop_id && existing.planted_at == planted_at {
                return existing.entity;
            }
            let stale = existing.entity;
            despawn(commands, stale);
        }

        let entity = commands
            .spawn(GrowthWatcher::new(cell, crop_id.clone(), planted_at))
            .id();
        debug!("[Farming] Watching {} ({}) with {:?}", cell, crop_id, entity);
        self.active.insert(
            cell,
            WatcherHandle {
                entity,
                crop_id,
                planted_at,
            },
        );
        entity
    }

    /// Stops the watcher for `cell`, if one is running.
    pub fn cancel(&mut self, commands: &mut Commands, cell: GridPos) -> bool {
        match self.active.remove(&cell) {
            Some(handle) => {
                despawn(commands, handle.entity);
                debug!("[Farming] Cancelled watcher at {}", cell);
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self, commands: &mut Commands) {
        for (_, handle) in self.active.drain() {
            despawn(commands, handle.entity);
        }
    }

    /// Drops the entry for `cell` only if it still belongs to `entity`, so a
    /// watcher ending late cannot evict its replacement.
    fn release(&mut self, cell: GridPos, entity: Entity) {
        if self.active.get(&cell).is_some_and(|h| h.entity == entity) {
            self.active.remove(&cell);
        }
    }

    pub fn is_watching(&self, cell: GridPos) -> bool {
        self.active.contains_key(&cell)
    }

    pub fn watcher(&self, cell: GridPos) -> Option<Entity> {
        self.active.get(&cell).map(|h| h.entity)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

fn despawn(commands: &mut Commands, entity: Entity) {
    if let Some(mut entity_commands) = commands.get_entity(entity) {
        entity_commands.despawn();
    }
}

/// Watches every planted cell. Used after a restore so crops that matured
/// while the game was closed report ready on the first poll.
pub fn watch_all_planted(commands: &mut Commands, pool: &mut GrowthWatcherPool, grid: &FarmGrid) {
    pool.cancel_all(commands);
    for (cell, crop) in grid.planted() {
        pool.register(commands, cell, crop.crop_id.clone(), crop.planted_at);
    }
}

const FALLBACK_POLL: Duration = Duration::from_secs(1);

/// `None` for NaN, negative, zero, or unrepresentable intervals.
fn poll_interval(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|interval| !interval.is_zero())
}

#[allow(clippy::too_many_arguments)]
pub fn poll_growth_watchers(
    mut commands: Commands,
    clock: Res<SimClock>,
    config: Res<CoreConfig>,
    grid: Res<FarmGrid>,
    catalog: Res<CropCatalog>,
    mut pool: ResMut<GrowthWatcherPool>,
    mut watchers: Query<(Entity, &mut GrowthWatcher)>,
    mut stage_events: EventWriter<CropStageChangedEvent>,
    mut ready_events: EventWriter<CropReadyEvent>,
    mut warned: Local<bool>,
) {
    let now = clock.now();
    // A config inserted directly by the host skips validation.
    let interval = poll_interval(config.watcher_poll_secs).unwrap_or_else(|| {
        if !*warned {
            warn!(
                "[Farming] Invalid watcher poll interval {}s; polling every second",
                config.watcher_poll_secs
            );
            *warned = true;
        }
        FALLBACK_POLL
    });

    for (entity, mut watcher) in watchers.iter_mut() {
        if !watcher.due(now) {
            continue;
        }
        watcher.next_poll = Some(now + interval);

        let finished = match watcher.poll(&grid, &catalog, now) {
            Ok(WatchStep::Continue { stage }) => {
                if let Some((stage, fraction)) = stage {
                    stage_events.send(CropStageChangedEvent {
                        cell: watcher.cell,
                        crop_id: watcher.crop_id.clone(),
                        stage,
                        fraction,
                    });
                }
                false
            }
            Ok(WatchStep::Ready { stage }) => {
                if let Some((stage, fraction)) = stage {
                    stage_events.send(CropStageChangedEvent {
                        cell: watcher.cell,
                        crop_id: watcher.crop_id.clone(),
                        stage,
                        fraction,
                    });
                }
                info!("[Farming] {} at {} is ready to harvest", watcher.crop_id, watcher.cell);
                ready_events.send(CropReadyEvent {
                    cell: watcher.cell,
                    crop_id: watcher.crop_id.clone(),
                });
                true
            }
            Ok(WatchStep::Stale) => {
                debug!("[Farming] Watcher at {} found its crop gone", watcher.cell);
                true
            }
            Err(err) => {
                warn!("[Farming] Watcher at {} failed: {}", watcher.cell, err);
                true
            }
        };

        if finished {
            pool.release(watcher.cell, entity);
            despawn(&mut commands, entity);
        }
    }
}
