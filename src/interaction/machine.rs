use bevy::prelude::*;

use crate::shared::*;

/// What a click on the grid currently means.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InteractionState {
    /// Clicks select cells.
    #[default]
    Idle,
    /// Clicks try to plant `crop_id`; selection is off.
    PlantingMode { crop_id: CropId },
    /// A popup owns input; clicks on cells are ignored.
    PopupOpen,
}

/// Returned when planting mode ends, so the caller can clear hover feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantingEnded {
    pub crop_id: CropId,
    pub hovered: Option<GridPos>,
}

#[derive(Resource, Debug, Clone)]
pub struct InteractionMachine {
    state: InteractionState,
    hovered: Option<GridPos>,
    last_click: Option<Timestamp>,
    debounce_secs: f64,
}

impl Default for InteractionMachine {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl InteractionMachine {
    pub fn new(debounce_secs: f64) -> Self {
        Self {
            state: InteractionState::Idle,
            hovered: None,
            last_click: None,
            debounce_secs,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn planting_crop(&self) -> Option<&CropId> {
        match &self.state {
            InteractionState::PlantingMode { crop_id } => Some(crop_id),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == InteractionState::Idle
    }

    pub fn hovered(&self) -> Option<GridPos> {
        self.hovered
    }

    /// Idle-only click gate. Accepts at most one click per debounce window.
    pub fn accept_click(&mut self, now: Timestamp) -> bool {
        if !self.is_idle() {
            return false;
        }
        if let Some(last) = self.last_click {
            // A clock that stepped backwards does not hold clicks back.
            let elapsed = now.seconds_since(last);
            if (0.0..self.debounce_secs).contains(&elapsed) {
                return false;
            }
        }
        self.last_click = Some(now);
        true
    }

    /// Enters planting mode. If another crop was being planted its mode ends
    /// first and is returned.
    pub fn start_planting(&mut self, crop_id: CropId) -> Option<PlantingEnded> {
        let previous = self.end_planting();
        self.state = InteractionState::PlantingMode { crop_id };
        previous
    }

    /// Back to Idle if planting; `None` when not in planting mode.
    pub fn end_planting(&mut self) -> Option<PlantingEnded> {
        match std::mem::take(&mut self.state) {
            InteractionState::PlantingMode { crop_id } => Some(PlantingEnded {
                crop_id,
                hovered: self.hovered.take(),
            }),
            other => {
                self.state = other;
                None
            }
        }
    }

    pub fn open_popup(&mut self) -> Option<PlantingEnded> {
        let ended = self.end_planting();
        self.state = InteractionState::PopupOpen;
        ended
    }

    /// Any state returns to Idle.
    pub fn close_popup(&mut self) -> Option<PlantingEnded> {
        let ended = self.end_planting();
        self.state = InteractionState::Idle;
        ended
    }

    /// Records the hovered cell; returns false if it did not change.
    pub fn set_hover(&mut self, cell: Option<GridPos>) -> bool {
        if self.hovered == cell {
            return false;
        }
        self.hovered = cell;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: f64) -> Timestamp {
        Timestamp::from_secs_f64(secs)
    }

    #[test]
    fn debounce_window_blocks_rapid_clicks() {
        let mut machine = InteractionMachine::new(0.5);
        assert!(machine.accept_click(t(10.0)));
        assert!(!machine.accept_click(t(10.2)));
        assert!(!machine.accept_click(t(10.49)));
        assert!(machine.accept_click(t(10.5)));
    }

    #[test]
    fn clock_stepping_back_does_not_block_clicks() {
        let mut machine = InteractionMachine::new(0.5);
        assert!(machine.accept_click(t(100.0)));
        assert!(machine.accept_click(t(40.0)));
        assert!(!machine.accept_click(t(40.1)));
    }

    #[test]
    fn clicks_only_accepted_while_idle() {
        let mut machine = InteractionMachine::new(0.0);
        machine.start_planting(CropId::new("carrot"));
        assert!(!machine.accept_click(t(1.0)));
        machine.end_planting();
        machine.open_popup();
        assert!(!machine.accept_click(t(2.0)));
        machine.close_popup();
        assert!(machine.accept_click(t(3.0)));
    }

    #[test]
    fn restarting_planting_reports_previous_crop() {
        let mut machine = InteractionMachine::default();
        assert_eq!(machine.start_planting(CropId::new("carrot")), None);
        machine.set_hover(Some(GridPos::new(4, 4)));
        let ended = machine.start_planting(CropId::new("corn")).unwrap();
        assert_eq!(ended.crop_id, CropId::new("carrot"));
        assert_eq!(ended.hovered, Some(GridPos::new(4, 4)));
        assert_eq!(machine.planting_crop(), Some(&CropId::new("corn")));
        assert_eq!(machine.hovered(), None);
    }

    #[test]
    fn popup_ends_planting_and_close_returns_to_idle() {
        let mut machine = InteractionMachine::default();
        machine.start_planting(CropId::new("carrot"));
        assert!(machine.open_popup().is_some());
        assert_eq!(machine.state(), &InteractionState::PopupOpen);
        assert!(machine.close_popup().is_none());
        assert!(machine.is_idle());
    }

    #[test]
    fn end_planting_outside_planting_mode_is_a_no_op() {
        let mut machine = InteractionMachine::default();
        machine.open_popup();
        assert!(machine.end_planting().is_none());
        assert_eq!(machine.state(), &InteractionState::PopupOpen);
    }

    #[test]
    fn hover_changes_are_reported_once() {
        let mut machine = InteractionMachine::default();
        assert!(machine.set_hover(Some(GridPos::new(1, 1))));
        assert!(!machine.set_hover(Some(GridPos::new(1, 1))));
        assert!(machine.set_hover(None));
    }
}
