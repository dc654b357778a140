use swipe_common::Decision;

/// Offset at which the LIKE / NOPE stamp shows on the card.
const INDICATOR_OFFSET: f64 = 50.0;

/// Drag state of the top card.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging { start_x: f64, offset: f64 },
}

/// Stamp drawn over the card while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Like,
    Nope,
}

/// Purely presentational transform of the top card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardTransform {
    pub translate_x: f64,
    pub rotation_deg: f64,
    pub opacity: f64,
    pub indicator: Option<Indicator>,
    /// Animate back to rest (true whenever no drag is active).
    pub animate: bool,
}

impl Gesture {
    pub fn press(&mut self, x: f64) {
        *self = Gesture::Dragging {
            start_x: x,
            offset: 0.0,
        };
    }

    /// Pointer motion; ignored unless a drag is active.
    pub fn motion(&mut self, x: f64) {
        if let Gesture::Dragging { start_x, offset } = self {
            *offset = x - *start_x;
        }
    }

    /// Pointer up or leave. Returns the decision if the drag went far enough.
    pub fn release(&mut self, threshold: f64) -> Option<Decision> {
        let decision = match *self {
            Gesture::Dragging { offset, .. } => Decision::from_offset(offset, threshold),
            Gesture::Idle => None,
        };
        *self = Gesture::Idle;
        decision
    }

    pub fn reset(&mut self) {
        *self = Gesture::Idle;
    }

    pub fn offset(&self) -> f64 {
        match self {
            Gesture::Dragging { offset, .. } => *offset,
            Gesture::Idle => 0.0,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, Gesture::Dragging { .. })
    }

    pub fn transform(&self) -> CardTransform {
        let offset = self.offset();
        let indicator = if offset > INDICATOR_OFFSET {
            Some(Indicator::Like)
        } else if offset < -INDICATOR_OFFSET {
            Some(Indicator::Nope)
        } else {
            None
        };
        CardTransform {
            translate_x: offset,
            rotation_deg: offset / 20.0,
            opacity: (1.0 - offset.abs() / 300.0).clamp(0.0, 1.0),
            indicator,
            animate: !self.is_dragging(),
        }
    }
}
