//! Interaction domain: turns pointer and popup input into selection,
//! planting, and harvest actions.
//!
//! Systems run in FarmSet::Interaction, chained in this order: popup
//! transitions, planting start/cancel, pointer hover, clicks.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::config::CoreConfig;
use crate::farming::{FarmGrid, Planter, SelectionChange};
use crate::shared::*;

mod machine;

pub use machine::{InteractionMachine, InteractionState, PlantingEnded};

pub struct InteractionPlugin;

impl Plugin for InteractionPlugin {
    fn build(&self, app: &mut App) {
        let debounce = app
            .world()
            .get_resource::<CoreConfig>()
            .map_or(0.5, |config| config.click_debounce_secs);

        app.insert_resource(InteractionMachine::new(debounce))
            .add_systems(
                Update,
                (
                    handle_popup_events,
                    handle_planting_requests,
                    handle_pointer_moves,
                    handle_cell_clicks,
                )
                    .chain()
                    .in_set(FarmSet::Interaction),
            );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output bundle
// ─────────────────────────────────────────────────────────────────────────────

#[derive(SystemParam)]
pub struct InteractionOutput<'w> {
    pub started: EventWriter<'w, PlantingModeStartedEvent>,
    pub ended: EventWriter<'w, PlantingModeEndedEvent>,
    pub hovered: EventWriter<'w, CellHoveredEvent>,
    pub hover_cleared: EventWriter<'w, HoverClearedEvent>,
    pub failed: EventWriter<'w, PlantingFailedEvent>,
    pub popup_requested: EventWriter<'w, PlantingPopupRequestedEvent>,
    pub info_requested: EventWriter<'w, CropInfoRequestedEvent>,
    pub harvest: EventWriter<'w, HarvestCropEvent>,
}

impl InteractionOutput<'_> {
    /// Clears hover feedback and announces the end of planting mode, if it ended.
    pub fn planting_ended(&mut self, ended: Option<PlantingEnded>) {
        let Some(ended) = ended else {
            return;
        };
        if ended.hovered.is_some() {
            self.hover_cleared.send(HoverClearedEvent);
        }
        info!("[Interaction] Planting mode ended ({})", ended.crop_id);
        self.ended.send(PlantingModeEndedEvent);
    }

    fn fail(&mut self, cell: Option<GridPos>, crop_id: &str, reason: FarmError) {
        warn!("[Interaction] Planting {} failed: {}", crop_id, reason);
        self.failed.send(PlantingFailedEvent {
            cell,
            crop_id: crop_id.to_string(),
            reason,
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Systems
// ─────────────────────────────────────────────────────────────────────────────

pub fn handle_popup_events(
    mut opened: EventReader<PopupOpenedEvent>,
    mut closed: EventReader<PopupClosedEvent>,
    mut machine: ResMut<InteractionMachine>,
    mut output: InteractionOutput,
) {
    for _ in opened.read() {
        let ended = machine.open_popup();
        output.planting_ended(ended);
    }
    for _ in closed.read() {
        let ended = machine.close_popup();
        output.planting_ended(ended);
    }
}

pub fn handle_planting_requests(
    mut start_events: EventReader<StartPlantingEvent>,
    mut cancel_events: EventReader<CancelPlantingEvent>,
    mut machine: ResMut<InteractionMachine>,
    mut planter: Planter,
    mut output: InteractionOutput,
) {
    for ev in start_events.read() {
        let crop_id = match planter.catalog.resolve(&ev.crop_id) {
            Ok(id) => id,
            Err(err) => {
                output.fail(None, &ev.crop_id, err);
                continue;
            }
        };

        let previous = machine.start_planting(crop_id.clone());
        output.planting_ended(previous);

        let deselected = planter.grid.clear_selection();
        planter.notifier.deselected(deselected);

        info!("[Interaction] Planting mode started ({})", crop_id);
        output.started.send(PlantingModeStartedEvent { crop_id });
    }

    for _ in cancel_events.read() {
        let ended = machine.end_planting();
        output.planting_ended(ended);
    }
}

pub fn handle_pointer_moves(
    mut moves: EventReader<PointerMovedEvent>,
    mut machine: ResMut<InteractionMachine>,
    grid: Res<FarmGrid>,
    mut output: InteractionOutput,
) {
    for ev in moves.read() {
        if machine.planting_crop().is_none() {
            continue;
        }
        let cell = ev.cell.filter(|pos| grid.contains(*pos));
        if !machine.set_hover(cell) {
            continue;
        }
        match cell {
            Some(cell) => {
                let valid = grid.get(cell).is_ok_and(|c| c.is_plantable());
                output.hovered.send(CellHoveredEvent { cell, valid });
            }
            None => {
                output.hover_cleared.send(HoverClearedEvent);
            }
        }
    }
}

pub fn handle_cell_clicks(
    mut clicks: EventReader<CellClickedEvent>,
    mut machine: ResMut<InteractionMachine>,
    mut planter: Planter,
    mut output: InteractionOutput,
) {
    for ev in clicks.read() {
        match machine.state().clone() {
            InteractionState::PopupOpen => {
                debug!("[Interaction] Click ignored while a popup is open");
            }
            InteractionState::PlantingMode { crop_id } => {
                // A miss while planting does nothing.
                let Some(cell) = ev.cell else {
                    continue;
                };
                confirm_planting(cell, &crop_id, &mut machine, &mut planter, &mut output);
            }
            InteractionState::Idle => {
                if !machine.accept_click(planter.now()) {
                    debug!("[Interaction] Click debounced");
                    continue;
                }
                select_cell(ev.cell, &mut planter, &mut output);
            }
        }
    }
}

fn confirm_planting(
    cell: GridPos,
    crop_id: &CropId,
    machine: &mut InteractionMachine,
    planter: &mut Planter,
    output: &mut InteractionOutput,
) {
    if let Err(err) = planter.grid.check_plantable(cell) {
        output.fail(Some(cell), crop_id.as_str(), err);
        return;
    }
    match planter.plant_from_inventory(cell, crop_id.as_str()) {
        Ok(_) => {
            let ended = machine.end_planting();
            output.planting_ended(ended);
        }
        Err(err) => {
            let out_of_seeds = matches!(err, FarmError::InsufficientQuantity { .. });
            output.fail(Some(cell), crop_id.as_str(), err);
            if out_of_seeds {
                let ended = machine.end_planting();
                output.planting_ended(ended);
            }
        }
    }
}

fn select_cell(cell: Option<GridPos>, planter: &mut Planter, output: &mut InteractionOutput) {
    let Some(cell) = cell else {
        let deselected = planter.grid.clear_selection();
        planter.notifier.deselected(deselected);
        return;
    };

    match planter.grid.select(cell) {
        Ok(SelectionChange::Changed { previous, current }) => {
            planter.notifier.deselected(previous);
            planter.notifier.cell_selected.send(CellSelectedEvent { cell: current });
        }
        Ok(SelectionChange::Unchanged) => {}
        Err(err) => {
            planter.notifier.reject("select cell", err);
            return;
        }
    }

    let now = planter.now();
    let Ok(target) = planter.grid.get(cell) else {
        return;
    };
    if target.kind() != CellKind::Farm {
        return;
    }

    match target.crop() {
        None => {
            output
                .popup_requested
                .send(PlantingPopupRequestedEvent { cell });
        }
        Some(crop) => match crop.reading(&planter.catalog, now) {
            Ok(reading) if reading.is_ready() => {
                output.harvest.send(HarvestCropEvent { cell });
            }
            Ok(reading) => {
                output.info_requested.send(CropInfoRequestedEvent {
                    cell,
                    crop_id: crop.crop_id.clone(),
                    planted_at: crop.planted_at,
                    fraction: reading.fraction,
                    remaining_secs: reading.remaining_secs,
                });
            }
            Err(err) => warn!("[Interaction] Cannot read crop at {}: {}", cell, err),
        },
    }
}
