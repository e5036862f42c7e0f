//! Planting requests from the host.

use bevy::prelude::*;

use super::Planter;
use crate::shared::*;

pub fn handle_plant_requests(
    mut plant_events: EventReader<PlantCropEvent>,
    mut planter: Planter,
    mut failed_events: EventWriter<PlantingFailedEvent>,
) {
    for ev in plant_events.read() {
        if let Err(reason) = planter.plant_from_inventory(ev.cell, &ev.crop_id) {
            warn!(
                "[Farming] Could not plant {} at {}: {}",
                ev.crop_id, ev.cell, reason
            );
            failed_events.send(PlantingFailedEvent {
                cell: Some(ev.cell),
                crop_id: ev.crop_id.clone(),
                reason,
            });
        }
    }
}
