//! Taffy Bridge - Integration with Taffy layout engine
//!
//! Converts a node subtree into a Taffy tree, runs flexbox layout and
//! extracts absolute rectangles.
//!
//! Node flags map onto flex properties:
//! - containers lay out along their orientation (`Row` / `Column`)
//! - `hexpand` / `vexpand` grow a child along its parent's main axis
//! - `halign` / `valign` position a child on the parent's cross axis
//! - homogeneous containers give every child an equal share
//! - hidden nodes take no space and their subtrees are skipped

use std::collections::HashMap;

use taffy::{
    AlignSelf as TaffyAlignSelf, AvailableSpace, Dimension, Display, FlexDirection, NodeId as TaffyNodeId,
    Size, Style, TaffyTree,
};

use crate::engine::{KindState, LabelState, NodeId};
use crate::types::{Align, Orientation};

use super::text_measure::{CELL_WIDTH, LINE_HEIGHT, measure_text_height, string_width};
use super::{ComputedLayout, LayoutError, Rect};

// =============================================================================
// STYLE BUILDING
// =============================================================================

fn main_axis(node: NodeId) -> Orientation {
    match node.state() {
        Some(KindState::Container { orientation, .. }) => orientation,
        Some(KindState::Slider(slider)) => slider.orientation,
        Some(KindState::ProgressBar { orientation, .. }) => orientation,
        _ => Orientation::Horizontal,
    }
}

fn is_homogeneous(node: NodeId) -> bool {
    matches!(node.state(), Some(KindState::Container { homogeneous: true, .. }))
}

fn to_taffy_align(align: Align) -> TaffyAlignSelf {
    match align {
        Align::Fill => TaffyAlignSelf::Stretch,
        Align::Start => TaffyAlignSelf::FlexStart,
        Align::Center => TaffyAlignSelf::Center,
        Align::End => TaffyAlignSelf::FlexEnd,
    }
}

/// Style of `node` as a child of a container laid out along `parent_axis`.
fn build_style(node: NodeId, parent_axis: Orientation, parent_homogeneous: bool) -> Style {
    let (expand, cross) = match parent_axis {
        Orientation::Horizontal => (node.hexpand(), node.valign()),
        Orientation::Vertical => (node.vexpand(), node.halign()),
    };

    let mut style = Style {
        display: Display::Flex,
        flex_direction: match main_axis(node) {
            Orientation::Horizontal => FlexDirection::Row,
            Orientation::Vertical => FlexDirection::Column,
        },
        flex_grow: if expand { 1.0 } else { 0.0 },
        flex_shrink: 1.0,
        align_self: Some(to_taffy_align(cross)),
        ..Default::default()
    };

    if parent_homogeneous {
        style.flex_basis = Dimension::Length(0.0);
        style.flex_grow = 1.0;
    }

    style
}

// =============================================================================
// MEASUREMENT
// =============================================================================

/// Intrinsic content of a leaf.
#[derive(Clone, Debug)]
enum Measure {
    Text { text: String, wrap: bool },
    Square(f32),
}

fn measure_of(node: NodeId) -> Option<Measure> {
    match node.state()? {
        KindState::Label(LabelState { text, wrap, .. }) => Some(Measure::Text { text, wrap }),
        KindState::Entry { text, placeholder, .. } => Some(Measure::Text {
            text: if text.is_empty() { placeholder } else { text },
            wrap: false,
        }),
        KindState::Icon(icon) => Some(Measure::Square(icon.size as f32)),
        _ => None,
    }
}

fn measure(measure: &Measure, known: Size<Option<f32>>, available: Size<AvailableSpace>) -> Size<f32> {
    match measure {
        Measure::Square(side) => Size {
            width: known.width.unwrap_or(*side),
            height: known.height.unwrap_or(*side),
        },
        Measure::Text { text, wrap } => {
            if text.is_empty() {
                return Size::ZERO;
            }

            let natural = string_width(text);
            let cells = match (*wrap, known.width, available.width) {
                (true, Some(width), _) | (true, None, AvailableSpace::Definite(width)) => {
                    ((width / CELL_WIDTH) as u16).max(1)
                }
                _ => natural,
            };
            let lines = if *wrap {
                measure_text_height(text, cells)
            } else {
                text.split('\n').count() as u16
            };

            Size {
                width: known.width.unwrap_or(f32::from(natural.min(cells)) * CELL_WIDTH),
                height: known.height.unwrap_or(f32::from(lines) * LINE_HEIGHT),
            }
        }
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

struct Bridge {
    tree: TaffyTree<Measure>,
    nodes: Vec<(NodeId, TaffyNodeId)>,
}

impl Bridge {
    fn insert(
        &mut self,
        node: NodeId,
        parent_axis: Orientation,
        parent_homogeneous: bool,
    ) -> Result<TaffyNodeId, LayoutError> {
        let style = build_style(node, parent_axis, parent_homogeneous);
        let id = match measure_of(node) {
            Some(measure) => self.tree.new_leaf_with_context(style, measure),
            None => self.tree.new_leaf(style),
        }
        .map_err(LayoutError::Taffy)?;
        self.nodes.push((node, id));

        let axis = main_axis(node);
        let homogeneous = is_homogeneous(node);
        for child in node.children().into_iter().filter(|c| c.is_visible()) {
            let child_id = self.insert(child, axis, homogeneous)?;
            self.tree.add_child(id, child_id).map_err(LayoutError::Taffy)?;
        }
        Ok(id)
    }
}

/// Lay out the visible subtree under `root` in a `width` x `height` area.
///
/// Rectangles are absolute, with the root at the origin. A hidden root
/// yields an empty layout.
pub fn compute_layout(root: NodeId, width: f32, height: f32) -> Result<ComputedLayout, LayoutError> {
    let mut layout = ComputedLayout::default();
    if !root.is_alive() || !root.is_visible() {
        return Ok(layout);
    }

    let mut bridge = Bridge {
        tree: TaffyTree::new(),
        nodes: Vec::new(),
    };
    let root_id = bridge.insert(root, Orientation::Horizontal, false)?;

    let mut root_style = bridge.tree.style(root_id).map_err(LayoutError::Taffy)?.clone();
    root_style.size = Size {
        width: Dimension::Length(width),
        height: Dimension::Length(height),
    };
    bridge.tree.set_style(root_id, root_style).map_err(LayoutError::Taffy)?;

    let available = Size {
        width: AvailableSpace::Definite(width),
        height: AvailableSpace::Definite(height),
    };
    bridge
        .tree
        .compute_layout_with_measure(root_id, available, |known, available, _id, context, _style| {
            context.map_or(Size::ZERO, |m| measure(m, known, available))
        })
        .map_err(LayoutError::Taffy)?;

    // Parents are inserted before their children, so offsets are known in order.
    let mut origins: HashMap<NodeId, (f32, f32)> = HashMap::new();
    for (node, id) in &bridge.nodes {
        let computed = bridge.tree.layout(*id).map_err(LayoutError::Taffy)?;
        let (ox, oy) = node
            .parent()
            .and_then(|parent| origins.get(&parent).copied())
            .unwrap_or((0.0, 0.0));
        let rect = Rect {
            x: ox + computed.location.x,
            y: oy + computed.location.y,
            width: computed.size.width,
            height: computed.size.height,
        };
        origins.insert(*node, (rect.x, rect.y));
        layout.insert(*node, rect);
    }

    tracing::trace!(root = ?root, nodes = layout.len(), "computed layout");
    Ok(layout)
}
