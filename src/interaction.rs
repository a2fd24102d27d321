//! Hover interaction and the per-map session state.
//!
//! Features are addressed by their position in the bound list. Ids repeat
//! (`-99`) or are missing in real boundary data, so they only identify a
//! country for display.
//!
//! The detail panel is never patched in place: it is recomputed from the
//! hovered country (or its absence) every time the state changes.

use crate::render::BoundCountry;
use crate::viewport::{Transform, ViewportController, ViewportEvent};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Shown in place of a count that is missing or zero.
pub const NO_DATA: &str = "¯\\_(ツ)_/¯";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureStyle {
    pub stroke: Option<&'static str>,
    pub stroke_width: f64,
    pub cursor: Option<&'static str>,
}

pub const BASE_STYLE: FeatureStyle = FeatureStyle {
    stroke: None,
    stroke_width: 0.25,
    cursor: None,
};

impl FeatureStyle {
    pub const fn highlighted() -> Self {
        Self {
            stroke: Some("white"),
            stroke_width: 1.0,
            cursor: Some("pointer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HoverState {
    #[default]
    Idle,
    Hovered(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoverEvent {
    Enter(usize),
    /// Leaving always returns to idle, whichever feature it names.
    Exit(Option<usize>),
}

/// Idle ⇄ Hovered. At most one feature is hovered at a time.
#[derive(Debug, Clone, Default)]
pub struct HoverMachine {
    state: HoverState,
}

impl HoverMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<usize> {
        match self.state {
            HoverState::Hovered(index) => Some(index),
            HoverState::Idle => None,
        }
    }

    pub fn handle(&mut self, event: HoverEvent) -> &HoverState {
        self.state = match event {
            HoverEvent::Enter(index) => HoverState::Hovered(index),
            HoverEvent::Exit(_) => HoverState::Idle,
        };
        &self.state
    }

    /// Style for a feature given the current state.
    pub fn style_for(&self, index: usize) -> FeatureStyle {
        if self.hovered() == Some(index) {
            FeatureStyle::highlighted()
        } else {
            BASE_STYLE
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailPanel {
    pub visible: bool,
    pub country: String,
    pub females: String,
    pub males: String,
}

impl DetailPanel {
    pub fn hidden() -> Self {
        Self {
            visible: false,
            country: String::new(),
            females: String::new(),
            males: String::new(),
        }
    }

    pub fn for_hovered(country: Option<&BoundCountry>) -> Self {
        let Some(country) = country else {
            return Self::hidden();
        };
        let details = &country.details;
        Self {
            visible: true,
            country: country.name.clone(),
            females: details
                .females()
                .map(|n| format!("Female {}", n))
                .unwrap_or_else(|| NO_DATA.to_string()),
            males: details
                .males()
                .map(|n| format!("Male {}", n))
                .unwrap_or_else(|| NO_DATA.to_string()),
        }
    }
}

/// Pointer and gesture input forwarded by the page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    HoverEnter { index: usize },
    HoverExit {
        #[serde(default)]
        index: Option<usize>,
    },
    Pan { dx: f64, dy: f64 },
    Zoom { factor: f64, x: f64, y: f64 },
}

/// Everything the page needs to redraw after an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub hovered: Option<usize>,
    pub panel: DetailPanel,
    pub transform: Transform,
}

/// Interactive state for one rendered map: hover plus viewport.
pub struct MapSession {
    countries: Vec<BoundCountry>,
    hover: HoverMachine,
    viewport: ViewportController,
}

impl MapSession {
    pub fn new(countries: Vec<BoundCountry>) -> Self {
        Self {
            countries,
            hover: HoverMachine::new(),
            viewport: ViewportController::new(),
        }
    }

    pub fn countries(&self) -> &[BoundCountry] {
        &self.countries
    }

    pub fn country(&self, index: usize) -> Option<&BoundCountry> {
        self.countries.get(index)
    }

    pub fn hover(&self) -> &HoverMachine {
        &self.hover
    }

    pub fn transform(&self) -> &Transform {
        self.viewport.transform()
    }

    pub fn apply(&mut self, event: SessionEvent) -> ViewState {
        match event {
            SessionEvent::HoverEnter { index } => {
                if index < self.countries.len() {
                    self.hover.handle(HoverEvent::Enter(index));
                } else {
                    debug!("Ignoring hover on unknown feature #{}", index);
                }
            }
            SessionEvent::HoverExit { index } => {
                self.hover.handle(HoverEvent::Exit(index));
            }
            SessionEvent::Pan { dx, dy } => {
                self.viewport.apply(ViewportEvent::Pan { dx, dy });
            }
            SessionEvent::Zoom { factor, x, y } => {
                self.viewport.apply(ViewportEvent::Zoom {
                    factor,
                    anchor: [x, y],
                });
            }
        }
        self.view_state()
    }

    pub fn view_state(&self) -> ViewState {
        let hovered = self.hover.hovered();
        ViewState {
            hovered,
            panel: DetailPanel::for_hovered(hovered.and_then(|i| self.country(i))),
            transform: *self.viewport.transform(),
        }
    }
}
