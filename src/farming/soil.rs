//! Cell kind changes (digging farmland, flooding, filling in).

use bevy::prelude::*;

use super::grid::FarmGrid;
use crate::shared::*;

pub fn handle_switch_kind(
    mut switch_events: EventReader<SwitchCellKindEvent>,
    mut grid: ResMut<FarmGrid>,
    mut notifier: Notifier,
) {
    for ev in switch_events.read() {
        match grid.switch_kind(ev.cell, ev.kind) {
            Ok(Some(from)) => {
                info!("[Farming] {} changed {:?} -> {:?}", ev.cell, from, ev.kind);
                notifier.kind_changed.send(CellKindChangedEvent {
                    cell: ev.cell,
                    from,
                    to: ev.kind,
                });
            }
            Ok(None) => {}
            Err(err) => notifier.reject("switch cell kind", err),
        }
    }
}
