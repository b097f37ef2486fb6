//! Page tree collaborator interface
//!
//! The engine never owns or mutates the page. It reads a rendered tree
//! through [`PageTree`] and derives everything else (form membership, label
//! association, table grids) itself.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle of a node inside a [`PageTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// `type` of an `<input>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputKind {
    Text,
    Password,
    Hidden,
    File,
    Submit,
    Reset,
    Button,
    Checkbox,
    Radio,
    Image,
    Other,
}

impl InputKind {
    /// Resolve from the `type` attribute; missing or empty means text
    pub fn from_type(input_type: Option<&str>) -> Self {
        match input_type
            .map(|t| t.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("") | Some("text") => InputKind::Text,
            Some("password") => InputKind::Password,
            Some("hidden") => InputKind::Hidden,
            Some("file") => InputKind::File,
            Some("submit") => InputKind::Submit,
            Some("reset") => InputKind::Reset,
            Some("button") => InputKind::Button,
            Some("checkbox") => InputKind::Checkbox,
            Some("radio") => InputKind::Radio,
            Some("image") => InputKind::Image,
            Some(_) => InputKind::Other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::Password => "password",
            InputKind::Hidden => "hidden",
            InputKind::File => "file",
            InputKind::Submit => "submit",
            InputKind::Reset => "reset",
            InputKind::Button => "button",
            InputKind::Checkbox => "checkbox",
            InputKind::Radio => "radio",
            InputKind::Image => "image",
            InputKind::Other => "other",
        }
    }

    /// Inputs whose `value` is rendered as a caption
    pub fn is_button_like(&self) -> bool {
        matches!(self, InputKind::Submit | InputKind::Reset | InputKind::Button)
    }
}

/// Closed set of node categories, resolved once per node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCategory {
    Document,
    Body,
    Head,
    Title,
    Script,
    Style,
    Applet,
    Comment,
    Text,
    LineBreak,
    InlineFrame,
    Image,
    Anchor,
    Form,
    Label,
    Legend,
    Span,
    Button,
    Select,
    OptionGroup,
    Option,
    TextArea,
    Input(InputKind),
    OrderedList,
    UnorderedList,
    ListItem,
    Division,
    Paragraph,
    Heading(u8),
    Table,
    TableRow,
    TableCell,
    Element,
}

impl NodeCategory {
    /// Resolve an element category from its tag name and `type` attribute
    pub fn from_tag(tag: &str, input_type: Option<&str>) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "body" => NodeCategory::Body,
            "head" => NodeCategory::Head,
            "title" => NodeCategory::Title,
            "script" | "noscript" => NodeCategory::Script,
            "style" => NodeCategory::Style,
            "applet" | "object" => NodeCategory::Applet,
            "br" => NodeCategory::LineBreak,
            "iframe" | "frame" => NodeCategory::InlineFrame,
            "img" => NodeCategory::Image,
            "a" => NodeCategory::Anchor,
            "form" => NodeCategory::Form,
            "label" => NodeCategory::Label,
            "legend" => NodeCategory::Legend,
            "span" => NodeCategory::Span,
            "button" => NodeCategory::Button,
            "select" => NodeCategory::Select,
            "optgroup" => NodeCategory::OptionGroup,
            "option" => NodeCategory::Option,
            "textarea" => NodeCategory::TextArea,
            "input" => NodeCategory::Input(InputKind::from_type(input_type)),
            "ol" => NodeCategory::OrderedList,
            "ul" => NodeCategory::UnorderedList,
            "li" => NodeCategory::ListItem,
            "div" => NodeCategory::Division,
            "p" => NodeCategory::Paragraph,
            "h1" => NodeCategory::Heading(1),
            "h2" => NodeCategory::Heading(2),
            "h3" => NodeCategory::Heading(3),
            "h4" => NodeCategory::Heading(4),
            "h5" => NodeCategory::Heading(5),
            "h6" => NodeCategory::Heading(6),
            "table" => NodeCategory::Table,
            "tr" => NodeCategory::TableRow,
            "td" | "th" => NodeCategory::TableCell,
            _ => NodeCategory::Element,
        }
    }

    /// Everything except document, text and comment nodes
    pub fn is_element(&self) -> bool {
        !matches!(
            self,
            NodeCategory::Document | NodeCategory::Text | NodeCategory::Comment
        )
    }

    /// Controls taking part in form submission
    pub fn is_submittable(&self) -> bool {
        matches!(
            self,
            NodeCategory::Input(_)
                | NodeCategory::Button
                | NodeCategory::Select
                | NodeCategory::TextArea
        )
    }

    pub fn is_hidden_input(&self) -> bool {
        matches!(self, NodeCategory::Input(InputKind::Hidden))
    }

    /// Block containers padded with blanks in the page text
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            NodeCategory::Division
                | NodeCategory::Paragraph
                | NodeCategory::Table
                | NodeCategory::TableRow
                | NodeCategory::TableCell
                | NodeCategory::UnorderedList
                | NodeCategory::ListItem
                | NodeCategory::Heading(_)
        )
    }

    /// Short name used in control descriptions
    pub fn name(&self) -> &'static str {
        match self {
            NodeCategory::Document => "Document",
            NodeCategory::Body => "Body",
            NodeCategory::Head => "Head",
            NodeCategory::Title => "Title",
            NodeCategory::Script => "Script",
            NodeCategory::Style => "Style",
            NodeCategory::Applet => "Applet",
            NodeCategory::Comment => "Comment",
            NodeCategory::Text => "Text",
            NodeCategory::LineBreak => "LineBreak",
            NodeCategory::InlineFrame => "InlineFrame",
            NodeCategory::Image => "Image",
            NodeCategory::Anchor => "Anchor",
            NodeCategory::Form => "Form",
            NodeCategory::Label => "Label",
            NodeCategory::Legend => "Legend",
            NodeCategory::Span => "Span",
            NodeCategory::Button => "Button",
            NodeCategory::Select => "Select",
            NodeCategory::OptionGroup => "OptionGroup",
            NodeCategory::Option => "Option",
            NodeCategory::TextArea => "TextArea",
            NodeCategory::Input(kind) => match kind {
                InputKind::Text => "TextInput",
                InputKind::Password => "PasswordInput",
                InputKind::Hidden => "HiddenInput",
                InputKind::File => "FileInput",
                InputKind::Submit => "SubmitInput",
                InputKind::Reset => "ResetInput",
                InputKind::Button => "ButtonInput",
                InputKind::Checkbox => "CheckBox",
                InputKind::Radio => "RadioButton",
                InputKind::Image => "ImageInput",
                InputKind::Other => "Input",
            },
            NodeCategory::OrderedList => "OrderedList",
            NodeCategory::UnorderedList => "UnorderedList",
            NodeCategory::ListItem => "ListItem",
            NodeCategory::Division => "Division",
            NodeCategory::Paragraph => "Paragraph",
            NodeCategory::Heading(_) => "Heading",
            NodeCategory::Table => "Table",
            NodeCategory::TableRow => "TableRow",
            NodeCategory::TableCell => "TableCell",
            NodeCategory::Element => "Element",
        }
    }
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only access to a rendered page
///
/// Implementations must be shareable across the matcher worker threads.
pub trait PageTree: Sync {
    /// Document node
    fn root(&self) -> NodeId;

    fn category(&self, node: NodeId) -> NodeCategory;

    /// Attribute value by name
    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    /// Character data of text and comment nodes
    fn text(&self, node: NodeId) -> Option<&str>;

    /// Children in document order
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Whether the node is rendered
    fn is_displayed(&self, node: NodeId) -> bool;

    fn element_by_id(&self, id: &str) -> Option<NodeId>;

    /// Document node of an inline frame
    fn frame_content(&self, node: NodeId) -> Option<NodeId>;

    /// Human readable description used in logs and entry output
    fn describe(&self, node: NodeId) -> String;

    /// All descendants in pre-order
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.children(current).into_iter().rev());
        }
        result
    }

    /// Nearest ancestor (excluding the node) satisfying `predicate`
    fn ancestor_where(&self, node: NodeId, predicate: &dyn Fn(NodeCategory) -> bool) -> Option<NodeId> {
        let mut current = self.parent(node);
        while let Some(candidate) = current {
            if predicate(self.category(candidate)) {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }

    /// Enclosing `<form>`
    fn enclosing_form(&self, node: NodeId) -> Option<NodeId> {
        self.ancestor_where(node, &|category| category == NodeCategory::Form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_tag() {
        assert_eq!(NodeCategory::from_tag("DIV", None), NodeCategory::Division);
        assert_eq!(NodeCategory::from_tag("th", None), NodeCategory::TableCell);
        assert_eq!(NodeCategory::from_tag("h3", None), NodeCategory::Heading(3));
        assert_eq!(
            NodeCategory::from_tag("input", None),
            NodeCategory::Input(InputKind::Text)
        );
        assert_eq!(
            NodeCategory::from_tag("input", Some("CheckBox")),
            NodeCategory::Input(InputKind::Checkbox)
        );
        assert_eq!(
            NodeCategory::from_tag("input", Some("email")),
            NodeCategory::Input(InputKind::Other)
        );
        assert_eq!(NodeCategory::from_tag("custom-widget", None), NodeCategory::Element);
    }

    #[test]
    fn test_category_predicates() {
        assert!(NodeCategory::Select.is_submittable());
        assert!(!NodeCategory::Anchor.is_submittable());
        assert!(NodeCategory::Input(InputKind::Hidden).is_hidden_input());
        assert!(NodeCategory::Heading(1).is_block());
        assert!(!NodeCategory::OrderedList.is_block());
        assert!(!NodeCategory::Text.is_element());
        assert_eq!(NodeCategory::Input(InputKind::Checkbox).to_string(), "CheckBox");
    }
}
