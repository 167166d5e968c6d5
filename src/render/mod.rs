//! PNG rendering of attribution artifacts
//!
//! Two artifact families, matching the report contract:
//! - beeswarm summary: per-feature score distribution, importance-ordered
//! - bar chart: mean |score| per feature, descending

mod bar;
mod beeswarm;
mod palette;

pub use bar::render_bar;
pub use beeswarm::render_beeswarm;

use serde::{Deserialize, Serialize};

/// Fixed output geometry for the two artifact families.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Beeswarm summary pixel dimensions
    pub summary_size: (u32, u32),
    /// Bar chart pixel dimensions
    pub bar_size: (u32, u32),
    /// Most-important-first display cap for both plots
    pub max_display: usize,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            summary_size: (1600, 1000),
            bar_size: (1400, 900),
            max_display: 20,
        }
    }
}

impl PlotConfig {
    /// Set the beeswarm dimensions
    pub fn with_summary_size(mut self, width: u32, height: u32) -> Self {
        self.summary_size = (width, height);
        self
    }

    /// Set the bar chart dimensions
    pub fn with_bar_size(mut self, width: u32, height: u32) -> Self {
        self.bar_size = (width, height);
        self
    }

    /// Set the display cap
    pub fn with_max_display(mut self, max_display: usize) -> Self {
        self.max_display = max_display.max(1);
        self
    }
}
