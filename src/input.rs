//! Translates raw window input into [`Cmd`]s.

use std::collections::HashMap;

use freehand::{
    config::{CommandVerb, Key},
    math::{vec2, Vec2f},
};

use crate::cmd::Cmd;

/// Zoom factor per scrolled line.
const ZOOM_PER_LINE: f32 = 1.1;

/// Pinches with fingers closer than this (in pixels) don't zoom; the ratio gets too jumpy.
const MIN_PINCH_SPREAD: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Draws, like a single finger.
    Draw,
    /// Pans the image while held.
    Pan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Started,
    Moved,
    Ended,
}

pub struct Input {
    cursor: Vec2f,
    mouse_drawing: bool,
    mouse_panning: bool,
    /// Active touches, in the order they went down.
    touches: Vec<(u64, Vec2f)>,
    bind: HashMap<Key, CommandVerb>,
}

impl Input {
    pub fn new(bind: HashMap<Key, CommandVerb>) -> Self {
        Self {
            cursor: vec2(0.0, 0.0),
            mouse_drawing: false,
            mouse_panning: false,
            touches: Vec::new(),
            bind,
        }
    }

    pub fn cursor_moved(&mut self, position: Vec2f, send_cmd: &mut impl FnMut(Cmd)) {
        let delta = position - self.cursor;
        self.cursor = position;
        if self.mouse_drawing {
            send_cmd(Cmd::PointerMove {
                position,
                active_pointers: self.active_pointers(),
            });
        }
        if self.mouse_panning {
            send_cmd(Cmd::Pan { delta });
        }
    }

    pub fn button(&mut self, button: Button, pressed: bool, send_cmd: &mut impl FnMut(Cmd)) {
        match button {
            Button::Draw => {
                if pressed && !self.mouse_drawing {
                    let index = self.active_pointers();
                    self.mouse_drawing = true;
                    send_cmd(Cmd::PointerDown {
                        index,
                        position: self.cursor,
                    });
                } else if !pressed && self.mouse_drawing {
                    self.mouse_drawing = false;
                    send_cmd(Cmd::PointerUp);
                }
            }
            Button::Pan => self.mouse_panning = pressed,
        }
    }

    pub fn scrolled(&mut self, lines: f32, send_cmd: &mut impl FnMut(Cmd)) {
        if lines != 0.0 && lines.is_finite() {
            send_cmd(Cmd::Zoom {
                center: self.cursor,
                factor: ZOOM_PER_LINE.powf(lines),
            });
        }
    }

    pub fn touch(
        &mut self,
        id: u64,
        phase: TouchPhase,
        position: Vec2f,
        send_cmd: &mut impl FnMut(Cmd),
    ) {
        match phase {
            TouchPhase::Started => {
                let index = self.active_pointers();
                self.touches.push((id, position));
                send_cmd(Cmd::PointerDown { index, position });
            }
            TouchPhase::Moved => {
                let Some(i) = self.touches.iter().position(|&(t, _)| t == id) else {
                    return;
                };
                let (centroid_before, spread_before) = (self.centroid(), self.spread());
                self.touches[i].1 = position;

                send_cmd(Cmd::PointerMove {
                    position,
                    active_pointers: self.active_pointers(),
                });
                if self.touches.len() < 2 {
                    return;
                }

                // More than one finger: the host pans and zooms.
                let centroid = self.centroid();
                send_cmd(Cmd::Pan {
                    delta: centroid - centroid_before,
                });
                if let (Some(before), Some(after)) = (spread_before, self.spread()) {
                    if before >= MIN_PINCH_SPREAD && after >= MIN_PINCH_SPREAD {
                        send_cmd(Cmd::Zoom {
                            center: centroid,
                            factor: after / before,
                        });
                    }
                }
            }
            TouchPhase::Ended => {
                let Some(i) = self.touches.iter().position(|&(t, _)| t == id) else {
                    return;
                };
                self.touches.remove(i);
                send_cmd(Cmd::PointerUp);
            }
        }
    }

    pub fn key_pressed(&mut self, key: &Key, send_cmd: &mut impl FnMut(Cmd)) {
        if let Some(&verb) = self.bind.get(key) {
            log::debug!("{key:?} -> {verb:?}");
            send_cmd(verb.into());
        }
    }

    /// Touches plus the mouse, while its draw button is held.
    fn active_pointers(&self) -> usize {
        self.touches.len() + usize::from(self.mouse_drawing)
    }

    fn centroid(&self) -> Vec2f {
        let sum = self
            .touches
            .iter()
            .fold(vec2(0.0, 0.0), |acc, &(_, p)| acc + p);
        sum / self.touches.len().max(1) as f32
    }

    /// Distance between the first two touches.
    fn spread(&self) -> Option<f32> {
        match &*self.touches {
            [(_, a), (_, b), ..] => Some((*b - *a).length()),
            _ => None,
        }
    }
}
