use std::collections::HashMap;

use eframe::egui::Vec2;

/// Pinned star coordinates, kept for the lifetime of the process. The layout
/// engine is the only writer; the hierarchy transformer only reads.
#[derive(Clone, Debug, Default)]
pub struct PinStore {
    pins: HashMap<String, Vec2>,
}

impl PinStore {
    pub fn get(&self, id: &str) -> Option<Vec2> {
        self.pins.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Stores `position` unless the existing pin is already within `tolerance`.
    /// Returns whether the store changed.
    pub fn pin(&mut self, id: &str, position: Vec2, tolerance: f32) -> bool {
        if !position.x.is_finite() || !position.y.is_finite() {
            return false;
        }

        match self.pins.get_mut(id) {
            Some(existing) if (*existing - position).length() <= tolerance => false,
            Some(existing) => {
                *existing = position;
                true
            }
            None => {
                self.pins.insert(id.to_owned(), position);
                true
            }
        }
    }

    pub fn clear(&mut self) {
        self.pins.clear();
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    #[test]
    fn pin_respects_tolerance() {
        let mut pins = PinStore::default();
        assert!(pins.pin("s", vec2(10.0, 10.0), 0.5));
        assert!(!pins.pin("s", vec2(10.2, 10.1), 0.5));
        assert_eq!(pins.get("s"), Some(vec2(10.0, 10.0)));
        assert!(pins.pin("s", vec2(12.0, 10.0), 0.5));
        assert_eq!(pins.get("s"), Some(vec2(12.0, 10.0)));
        assert_eq!(pins.len(), 1);
    }

    #[test]
    fn non_finite_positions_are_ignored() {
        let mut pins = PinStore::default();
        assert!(!pins.pin("s", vec2(f32::NAN, 0.0), 0.5));
        assert!(pins.is_empty());
    }
}
