//! Layout Module
//!
//! Geometry of a resolved node tree, computed with
//! [Taffy](https://github.com/DioxusLabs/taffy) flexbox.
//!
//! The bridge:
//!
//! 1. Converts node flags (expand, align, visibility) into Taffy styles
//! 2. Builds a Taffy tree from the visible subtree
//! 3. Measures labels, entries and icons as leaves
//! 4. Extracts absolute rectangles per node
//!
//! # Example
//!
//! ```ignore
//! use spark_shell::layout::compute_layout;
//!
//! let layout = compute_layout(bar, 1920.0, 32.0)?;
//! let clock = layout.get(clock_label).unwrap();
//! assert!(clock.x > 1800.0);
//! ```

mod taffy_bridge;
mod text_measure;

pub use taffy_bridge::compute_layout;
pub use text_measure::*;

use std::collections::HashMap;

use thiserror::Error;

use crate::engine::NodeId;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout engine failed: {0}")]
    Taffy(taffy::TaffyError),
}

/// Absolute position and size in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Result of a layout pass. Hidden nodes have no entry.
#[derive(Clone, Debug, Default)]
pub struct ComputedLayout {
    rects: HashMap<NodeId, Rect>,
}

impl ComputedLayout {
    pub fn get(&self, node: NodeId) -> Option<Rect> {
        self.rects.get(&node).copied()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.rects.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    fn insert(&mut self, node: NodeId, rect: Rect) {
        self.rects.insert(node, rect);
    }
}
