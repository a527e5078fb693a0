use freehand::{config::CommandVerb, math::Vec2f};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cmd {
    /// A pointer went down. Pointer 0 is the one that can draw.
    PointerDown {
        index: usize,
        /// Position in window pixels.
        position: Vec2f,
    },
    PointerMove {
        position: Vec2f,
        /// Number of pointers down, including the one that moved.
        active_pointers: usize,
    },
    PointerUp,

    /// Moves the image across the window.
    Pan {
        delta: Vec2f,
    },
    /// Zooms by `factor` while keeping `center` stationary.
    Zoom {
        center: Vec2f,
        factor: f32,
    },

    Clear,
    Undo,
    Redo,
    Export,
    Fit,
}

impl From<CommandVerb> for Cmd {
    fn from(verb: CommandVerb) -> Self {
        match verb {
            CommandVerb::Clear => Cmd::Clear,
            CommandVerb::Undo => Cmd::Undo,
            CommandVerb::Redo => Cmd::Redo,
            CommandVerb::Export => Cmd::Export,
            CommandVerb::Fit => Cmd::Fit,
        }
    }
}
