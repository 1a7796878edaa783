//! Core types shared by the engine, the builders and the renderers.
//!
//! Most enums here mirror a toolkit enumeration and are parsed from the
//! lowercase tokens authors write in specs (`"start"`, `"vertical"`, ...).
//! Parsing is case-insensitive and returns `None` for unknown tokens so the
//! caller can decide how to report the problem.

use std::fmt;

// =============================================================================
// Node Kind
// =============================================================================

/// The concrete kind of a node, chosen by the builder that created it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Box,
    Button,
    CenterBox,
    Dynamic,
    Entry,
    EventBox,
    Icon,
    Label,
    Overlay,
    ProgressBar,
    Revealer,
    Scrollable,
    Slider,
    Stack,
    Switch,
    MenuButton,
    Popover,
    Menu,
    MenuItem,
}

impl NodeKind {
    /// Whether nodes of this kind lay their children out along an axis.
    pub fn is_container(self) -> bool {
        !matches!(
            self,
            NodeKind::Icon | NodeKind::Label | NodeKind::ProgressBar
                | NodeKind::Slider | NodeKind::Entry | NodeKind::Switch
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Box => "box",
            NodeKind::Button => "button",
            NodeKind::CenterBox => "centerbox",
            NodeKind::Dynamic => "dynamic",
            NodeKind::Entry => "entry",
            NodeKind::EventBox => "eventbox",
            NodeKind::Icon => "icon",
            NodeKind::Label => "label",
            NodeKind::Overlay => "overlay",
            NodeKind::ProgressBar => "progressbar",
            NodeKind::Revealer => "revealer",
            NodeKind::Scrollable => "scrollable",
            NodeKind::Slider => "slider",
            NodeKind::Stack => "stack",
            NodeKind::Switch => "switch",
            NodeKind::MenuButton => "menubutton",
            NodeKind::Popover => "popover",
            NodeKind::Menu => "menu",
            NodeKind::MenuItem => "menuitem",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Node Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Boolean node attributes packed into one field.
    ///
    /// Freshly allocated nodes carry `VISIBLE | SENSITIVE`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeFlags: u8 {
        const VISIBLE = 1 << 0;
        const HEXPAND = 1 << 1;
        const VEXPAND = 1 << 2;
        const SENSITIVE = 1 << 3;
        /// Pointer is over the node (eventbox prelight state).
        const PRELIGHT = 1 << 4;
        /// A pointer button is held on the node.
        const ACTIVE = 1 << 5;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        NodeFlags::VISIBLE | NodeFlags::SENSITIVE
    }
}

// =============================================================================
// Alignment
// =============================================================================

/// Placement of a node inside the space its parent allocates to it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Align {
    #[default]
    Fill,
    Start,
    Center,
    End,
}

impl Align {
    /// Parse `start|center|end|fill`, ignoring case.
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "fill" => Some(Align::Fill),
            "start" => Some(Align::Start),
            "center" => Some(Align::Center),
            "end" => Some(Align::End),
            _ => None,
        }
    }
}

// =============================================================================
// Orientation
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Parse `horizontal|vertical`, accepting `h` and `v` as shorthands.
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "h" | "horizontal" => Some(Orientation::Horizontal),
            "v" | "vertical" => Some(Orientation::Vertical),
            _ => None,
        }
    }
}

// =============================================================================
// Label Justification
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Justification {
    Left,
    Right,
    #[default]
    Center,
    Fill,
}

impl Justification {
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "left" => Some(Justification::Left),
            "right" => Some(Justification::Right),
            "center" => Some(Justification::Center),
            "fill" => Some(Justification::Fill),
            _ => None,
        }
    }
}

// =============================================================================
// Transitions
// =============================================================================

/// Animation used by stacks and revealers when switching content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Transition {
    #[default]
    None,
    Crossfade,
    SlideRight,
    SlideLeft,
    SlideUp,
    SlideDown,
    SlideLeftRight,
    SlideUpDown,
    OverUp,
    OverDown,
    OverLeft,
    OverRight,
}

impl Transition {
    /// Parse a transition name such as `slide_left` (case-insensitive).
    pub fn parse(token: &str) -> Option<Self> {
        let transition = match token.to_ascii_lowercase().as_str() {
            "none" => Transition::None,
            "crossfade" => Transition::Crossfade,
            "slide_right" => Transition::SlideRight,
            "slide_left" => Transition::SlideLeft,
            "slide_up" => Transition::SlideUp,
            "slide_down" => Transition::SlideDown,
            "slide_left_right" => Transition::SlideLeftRight,
            "slide_up_down" => Transition::SlideUpDown,
            "over_up" => Transition::OverUp,
            "over_down" => Transition::OverDown,
            "over_left" => Transition::OverLeft,
            "over_right" => Transition::OverRight,
            _ => return None,
        };
        Some(transition)
    }
}

// =============================================================================
// Scroll Policy / Popover Position
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollPolicy {
    Always,
    #[default]
    Automatic,
    Never,
    External,
}

impl ScrollPolicy {
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "always" => Some(ScrollPolicy::Always),
            "automatic" => Some(ScrollPolicy::Automatic),
            "never" => Some(ScrollPolicy::Never),
            "external" => Some(ScrollPolicy::External),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Position {
    Left,
    Right,
    Top,
    #[default]
    Bottom,
}

impl Position {
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "left" => Some(Position::Left),
            "right" => Some(Position::Right),
            "top" => Some(Position::Top),
            "bottom" => Some(Position::Bottom),
            _ => None,
        }
    }
}

// =============================================================================
// Pointer Input
// =============================================================================

/// Pointer button, numbered like X11/GDK buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Primary,
    Middle,
    Secondary,
}

impl MouseButton {
    pub fn number(self) -> u64 {
        match self {
            MouseButton::Primary => 1,
            MouseButton::Middle => 2,
            MouseButton::Secondary => 3,
        }
    }

    pub fn from_number(number: u64) -> Option<Self> {
        match number {
            1 => Some(MouseButton::Primary),
            2 => Some(MouseButton::Middle),
            3 => Some(MouseButton::Secondary),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_parse_ignores_case() {
        assert_eq!(Align::parse("START"), Some(Align::Start));
        assert_eq!(Align::parse("Center"), Some(Align::Center));
        assert_eq!(Align::parse("fill"), Some(Align::Fill));
        assert_eq!(Align::parse("baseline"), None);
    }

    #[test]
    fn test_orientation_shorthands() {
        assert_eq!(Orientation::parse("v"), Some(Orientation::Vertical));
        assert_eq!(Orientation::parse("h"), Some(Orientation::Horizontal));
        assert_eq!(Orientation::parse("diagonal"), None);
    }

    #[test]
    fn test_default_flags() {
        let flags = NodeFlags::default();
        assert!(flags.contains(NodeFlags::VISIBLE));
        assert!(flags.contains(NodeFlags::SENSITIVE));
        assert!(!flags.contains(NodeFlags::HEXPAND));
    }

    #[test]
    fn test_mouse_button_numbers() {
        for button in [MouseButton::Primary, MouseButton::Middle, MouseButton::Secondary] {
            assert_eq!(MouseButton::from_number(button.number()), Some(button));
        }
        assert_eq!(MouseButton::from_number(8), None);
    }
}
