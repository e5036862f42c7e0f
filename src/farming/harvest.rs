//! Harvest and out-of-band clearing.
//!
//! Both stop the cell's watcher in the same step that removes the crop, so a
//! watcher never sees a half-cleared cell.

use bevy::prelude::*;

use super::grid::FarmGrid;
use super::watchers::GrowthWatcherPool;
use crate::data::CropCatalog;
use crate::shared::*;

pub fn handle_harvest_requests(
    mut commands: Commands,
    mut harvest_events: EventReader<HarvestCropEvent>,
    clock: Res<SimClock>,
    catalog: Res<CropCatalog>,
    mut grid: ResMut<FarmGrid>,
    mut pool: ResMut<GrowthWatcherPool>,
    mut notifier: Notifier,
    mut harvested_events: EventWriter<CropHarvestedEvent>,
) {
    let now = clock.now();
    for ev in harvest_events.read() {
        match grid.harvest(ev.cell, &catalog, now) {
            Ok(crop_id) => {
                pool.cancel(&mut commands, ev.cell);
                info!("[Farming] Harvested {} at {}", crop_id, ev.cell);
                harvested_events.send(CropHarvestedEvent {
                    cell: ev.cell,
                    crop_id,
                });
            }
            Err(err) => notifier.reject("harvest", err),
        }
    }
}

pub fn handle_clear_requests(
    mut commands: Commands,
    mut clear_events: EventReader<ClearCropEvent>,
    mut grid: ResMut<FarmGrid>,
    mut pool: ResMut<GrowthWatcherPool>,
    mut notifier: Notifier,
) {
    for ev in clear_events.read() {
        match grid.clear_crop(ev.cell) {
            Ok(Some(crop)) => {
                pool.cancel(&mut commands, ev.cell);
                info!("[Farming] Cleared {} from {}", crop.crop_id, ev.cell);
                notifier.crop_cleared.send(CropClearedEvent {
                    cell: ev.cell,
                    crop_id: crop.crop_id,
                });
            }
            Ok(None) => debug!("[Farming] Nothing to clear at {}", ev.cell),
            Err(err) => notifier.reject("clear crop", err),
        }
    }
}
