//! Handles of located controls

use crate::node::{InputKind, NodeCategory, NodeId, PageTree};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of control an identifier produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlKind {
    Anchor,
    Button,
    InputButton,
    ImageButton,
    Image,
    CheckBox,
    RadioButton,
    Option,
    OptionGroup,
    TextField,
    PasswordField,
    TextArea,
    FileField,
    Select,
    Unspecified,
}

impl ControlKind {
    /// Kind matching a node category; `Unspecified` for plain elements
    pub fn for_category(category: NodeCategory) -> Self {
        match category {
            NodeCategory::Anchor => ControlKind::Anchor,
            NodeCategory::Button => ControlKind::Button,
            NodeCategory::Image => ControlKind::Image,
            NodeCategory::Option => ControlKind::Option,
            NodeCategory::OptionGroup => ControlKind::OptionGroup,
            NodeCategory::TextArea => ControlKind::TextArea,
            NodeCategory::Select => ControlKind::Select,
            NodeCategory::Input(kind) => match kind {
                InputKind::Submit | InputKind::Reset | InputKind::Button => ControlKind::InputButton,
                InputKind::Image => ControlKind::ImageButton,
                InputKind::Checkbox => ControlKind::CheckBox,
                InputKind::Radio => ControlKind::RadioButton,
                InputKind::Password => ControlKind::PasswordField,
                InputKind::File => ControlKind::FileField,
                InputKind::Text | InputKind::Other => ControlKind::TextField,
                InputKind::Hidden => ControlKind::Unspecified,
            },
            _ => ControlKind::Unspecified,
        }
    }

    /// Whether the kind is one of the known controls
    pub fn is_known(&self) -> bool {
        *self != ControlKind::Unspecified
    }
}

/// Opaque control handle; identity is the backing node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Control {
    node: NodeId,
    kind: ControlKind,
    description: String,
}

impl Control {
    pub fn new(node: NodeId, kind: ControlKind, description: impl Into<String>) -> Self {
        Self {
            node,
            kind,
            description: description.into(),
        }
    }

    /// Control for `node`, described by the tree
    pub fn from_tree<T: PageTree + ?Sized>(tree: &T, node: NodeId, kind: ControlKind) -> Self {
        Self::new(node, kind, tree.describe(node))
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Both handles refer to the same page node
    pub fn has_same_node(&self, other: &Control) -> bool {
        self.node == other.node
    }
}

impl PartialEq for Control {
    fn eq(&self, other: &Self) -> bool {
        self.has_same_node(other)
    }
}

impl Eq for Control {}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}
