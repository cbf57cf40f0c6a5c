// orientation.rs — pointer/touch/wheel input to yaw, pitch and zoom radius

use crate::config::ViewerConfig;
use crate::panorama::OrientationState;

/// Tunables for the orientation controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationLimits {
    /// Degrees per pixel of drag.
    pub sensitivity: f32,
    pub pitch_limit: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Radius change per unit of wheel delta.
    pub wheel_factor: f32,
}

impl Default for OrientationLimits {
    fn default() -> Self {
        Self::from(&ViewerConfig::default())
    }
}

impl From<&ViewerConfig> for OrientationLimits {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            sensitivity: config.sensitivity,
            pitch_limit: config.pitch_limit,
            min_radius: config.min_radius,
            max_radius: config.max_radius,
            wheel_factor: config.wheel_factor,
        }
    }
}

impl OrientationLimits {
    pub fn clamp_pitch(&self, pitch: f32) -> f32 {
        pitch.clamp(-self.pitch_limit, self.pitch_limit)
    }

    pub fn clamp_radius(&self, radius: f32) -> f32 {
        radius.clamp(self.min_radius, self.max_radius)
    }
}

/// Which physical pointer produced an event. Only one is tracked at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerId {
    Mouse,
    Touch(u64),
}

/// Input as seen by the viewer surface, in surface pixels.
///
/// `on_control` is set by the host when the pointer is over an overlay
/// control (e.g. a tag button); such events never start or move a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Down {
        pointer: PointerId,
        x: f32,
        y: f32,
        on_control: bool,
    },
    Move {
        pointer: PointerId,
        x: f32,
        y: f32,
        on_control: bool,
    },
    Up {
        pointer: PointerId,
    },
    /// Pointer left the tracked surface.
    Leave,
    /// Scroll with browser-style sign: positive = scroll down = zoom out.
    Wheel {
        delta_y: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragAnchor {
    pointer: PointerId,
    start_x: f32,
    start_y: f32,
    start_yaw: f32,
    start_pitch: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    Dragging(DragAnchor),
}

/// Idle/Dragging state machine that owns the viewer's [`OrientationState`].
///
/// Drags are anchored at the pointer-down position: every move recomputes the
/// orientation from the anchor, so dropped move events never accumulate error.
#[derive(Debug, Clone)]
pub struct OrientationController {
    state: OrientationState,
    limits: OrientationLimits,
    drag: DragState,
}

impl OrientationController {
    pub fn new(limits: OrientationLimits, initial: OrientationState) -> Self {
        let state = OrientationState {
            yaw: initial.yaw,
            pitch: limits.clamp_pitch(initial.pitch),
            radius: limits.clamp_radius(initial.radius),
        };
        Self {
            state,
            limits,
            drag: DragState::Idle,
        }
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(
            OrientationLimits::from(config),
            OrientationState {
                radius: config.initial_radius,
                ..OrientationState::default()
            },
        )
    }

    pub fn state(&self) -> OrientationState {
        self.state
    }

    pub fn limits(&self) -> &OrientationLimits {
        &self.limits
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging(_))
    }

    /// Feed one input event. Returns true when the orientation changed.
    pub fn handle(&mut self, input: PointerInput) -> bool {
        match input {
            PointerInput::Down {
                pointer,
                x,
                y,
                on_control,
            } => {
                self.pointer_down(pointer, x, y, on_control);
                false
            }
            PointerInput::Move {
                pointer,
                x,
                y,
                on_control,
            } => self.pointer_move(pointer, x, y, on_control),
            PointerInput::Up { pointer } => {
                self.pointer_up(pointer);
                false
            }
            PointerInput::Leave => {
                self.drag = DragState::Idle;
                false
            }
            PointerInput::Wheel { delta_y } => self.wheel(delta_y),
        }
    }

    fn pointer_down(&mut self, pointer: PointerId, x: f32, y: f32, on_control: bool) {
        if on_control {
            return;
        }
        // second finger while one is already dragging
        if self.is_dragging() {
            return;
        }
        self.drag = DragState::Dragging(DragAnchor {
            pointer,
            start_x: x,
            start_y: y,
            start_yaw: self.state.yaw,
            start_pitch: self.state.pitch,
        });
    }

    fn pointer_move(&mut self, pointer: PointerId, x: f32, y: f32, on_control: bool) -> bool {
        let DragState::Dragging(anchor) = self.drag else {
            return false;
        };
        if anchor.pointer != pointer || on_control {
            return false;
        }

        let s = self.limits.sensitivity;
        // dragging left looks right; dragging down raises pitch
        let yaw = anchor.start_yaw + (anchor.start_x - x) * s;
        let pitch = self
            .limits
            .clamp_pitch(anchor.start_pitch + (y - anchor.start_y) * s);

        let changed = yaw != self.state.yaw || pitch != self.state.pitch;
        self.state.yaw = yaw;
        self.state.pitch = pitch;
        changed
    }

    fn pointer_up(&mut self, pointer: PointerId) {
        if let DragState::Dragging(anchor) = self.drag {
            if anchor.pointer == pointer {
                self.drag = DragState::Idle;
            }
        }
    }

    fn wheel(&mut self, delta_y: f32) -> bool {
        let radius = self
            .limits
            .clamp_radius(self.state.radius + delta_y * self.limits.wheel_factor);
        let changed = radius != self.state.radius;
        self.state.radius = radius;
        changed
    }

    /// Back to the initial look direction, keeping the current limits.
    pub fn reset(&mut self, initial: OrientationState) {
        *self = Self::new(self.limits, initial);
    }
}
