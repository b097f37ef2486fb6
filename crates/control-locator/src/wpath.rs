//! Parsed locator path
//!
//! A raw locator like `Login form > [Name;2] > Username` is split on the
//! separator into trimmed fragments. Fragments of the form `[...]` are table
//! coordinates; at most one contiguous group of them is allowed.

use crate::config::LocatorConfig;
use crate::errors::LocatorError;
use crate::pattern::SearchPattern;
use std::fmt;

/// Column / row qualifier; an omitted axis matches any cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCoordinate {
    x: Option<String>,
    y: Option<String>,
    x_pattern: Option<SearchPattern>,
    y_pattern: Option<SearchPattern>,
}

impl TableCoordinate {
    /// Parse `[x;y]`, `[x]`, `[;y]` or `[x;]`
    pub fn parse(fragment: &str) -> Result<Self, LocatorError> {
        let inner = fragment
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| LocatorError::InvalidTableCoordinate(fragment.to_string()))?;

        let parts: Vec<&str> = inner.split(';').collect();
        let (x, y) = match parts.as_slice() {
            [x] => (non_empty(x), None),
            [x, y] => (non_empty(x), non_empty(y)),
            _ => return Err(LocatorError::InvalidTableCoordinate(fragment.to_string())),
        };

        Ok(Self {
            x_pattern: x.as_deref().map(SearchPattern::compile).transpose()?,
            y_pattern: y.as_deref().map(SearchPattern::compile).transpose()?,
            x,
            y,
        })
    }

    pub fn x(&self) -> Option<&str> {
        self.x.as_deref()
    }

    pub fn y(&self) -> Option<&str> {
        self.y.as_deref()
    }

    pub fn x_pattern(&self) -> Option<&SearchPattern> {
        self.x_pattern.as_ref()
    }

    pub fn y_pattern(&self) -> Option<&SearchPattern> {
        self.y_pattern.as_ref()
    }
}

impl fmt::Display for TableCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{};{}]",
            self.x.as_deref().unwrap_or_default(),
            self.y.as_deref().unwrap_or_default()
        )
    }
}

fn non_empty(part: &str) -> Option<String> {
    let trimmed = part.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn is_coordinate(fragment: &str) -> bool {
    fragment.starts_with('[') && fragment.ends_with(']') && !fragment.ends_with("\\]")
}

/// Locator split into path prefix, last node and table coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WPath {
    raw_path: Vec<String>,
    path_nodes: Vec<String>,
    last_node: Option<String>,
    table_coordinates: Vec<TableCoordinate>,
    path_pattern: Option<SearchPattern>,
    last_node_pattern: Option<SearchPattern>,
    whole_path_pattern: Option<SearchPattern>,
}

impl WPath {
    /// Parse using the default `>` separator
    pub fn parse(raw: &str) -> Result<Self, LocatorError> {
        Self::parse_with(raw, &LocatorConfig::default())
    }

    pub fn parse_with(raw: &str, config: &LocatorConfig) -> Result<Self, LocatorError> {
        let fragments = split_fragments(raw, config.path_separator);
        Self::from_fragments(fragments).map_err(|e| match e {
            LocatorError::InvalidPath { reason, .. } => LocatorError::invalid_path(raw, reason),
            other => other,
        })
    }

    /// Build from already split fragments
    pub fn from_fragments(raw_path: Vec<String>) -> Result<Self, LocatorError> {
        let mut path_nodes = Vec::new();
        let mut table_coordinates = Vec::new();
        let mut last_node = None;

        if let Some((last, leading)) = raw_path.split_last() {
            let mut group_finished = false;
            for fragment in leading {
                if is_coordinate(fragment) {
                    if group_finished {
                        return Err(LocatorError::invalid_path(
                            raw_path.join(" > "),
                            "Only one group of table coordinates allowed",
                        ));
                    }
                    table_coordinates.push(TableCoordinate::parse(fragment)?);
                } else {
                    if !table_coordinates.is_empty() {
                        group_finished = true;
                    }
                    path_nodes.push(fragment.clone());
                }
            }

            if is_coordinate(last) {
                if group_finished {
                    return Err(LocatorError::invalid_path(
                        raw_path.join(" > "),
                        "Only one group of table coordinates allowed",
                    ));
                }
                table_coordinates.push(TableCoordinate::parse(last)?);
            } else {
                last_node = Some(last.clone());
            }
        }

        let path_pattern = if path_nodes.is_empty() {
            None
        } else {
            Some(SearchPattern::from_fragments(&path_nodes)?)
        };
        let last_node_pattern = last_node.as_deref().map(SearchPattern::compile).transpose()?;
        let whole_path_pattern = match &last_node {
            Some(last) => {
                let mut all = path_nodes.clone();
                all.push(last.clone());
                Some(SearchPattern::from_fragments(&all)?)
            }
            None => None,
        };

        Ok(Self {
            raw_path,
            path_nodes,
            last_node,
            table_coordinates,
            path_pattern,
            last_node_pattern,
            whole_path_pattern,
        })
    }

    pub fn raw_path(&self) -> &[String] {
        &self.raw_path
    }

    pub fn path_nodes(&self) -> &[String] {
        &self.path_nodes
    }

    pub fn last_node(&self) -> Option<&str> {
        self.last_node.as_deref()
    }

    pub fn table_coordinates(&self) -> &[TableCoordinate] {
        &self.table_coordinates
    }

    /// Coordinates innermost first
    pub fn table_coordinates_reversed(&self) -> Vec<&TableCoordinate> {
        self.table_coordinates.iter().rev().collect()
    }

    pub fn has_table_coordinates(&self) -> bool {
        !self.table_coordinates.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_path.is_empty()
    }

    /// Path nodes joined with `*`; `None` without path nodes
    pub fn path_pattern(&self) -> Option<&SearchPattern> {
        self.path_pattern.as_ref()
    }

    pub fn last_node_pattern(&self) -> Option<&SearchPattern> {
        self.last_node_pattern.as_ref()
    }

    /// Path nodes and last node joined with `*`
    pub fn whole_path_pattern(&self) -> Option<&SearchPattern> {
        self.whole_path_pattern.as_ref()
    }
}

impl fmt::Display for WPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_path.join(" > "))
    }
}

/// Split on `separator`; `\` in front of the separator makes it literal,
/// every other escape is kept for the pattern compiler
fn split_fragments(raw: &str, separator: char) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let mut fragments = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.peek().copied() {
                Some(next) if next == separator => {
                    chars.next();
                    current.push(next);
                }
                Some(next) => {
                    chars.next();
                    current.push('\\');
                    current.push(next);
                }
                None => current.push('\\'),
            }
        } else if ch == separator {
            fragments.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(ch);
        }
    }
    fragments.push(current.trim().to_string());
    fragments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path() {
        let path = WPath::parse("Login form > Username").unwrap();
        assert_eq!(path.path_nodes(), ["Login form".to_string()]);
        assert_eq!(path.last_node(), Some("Username"));
        assert!(!path.has_table_coordinates());
        assert_eq!(path.path_pattern().unwrap().source(), "Login form");
        assert_eq!(
            path.whole_path_pattern().unwrap().source(),
            "Login form*Username"
        );
        assert_eq!(path.to_string(), "Login form > Username");
    }

    #[test]
    fn test_only_last_node() {
        let path = WPath::parse("  Username ").unwrap();
        assert!(path.path_nodes().is_empty());
        assert!(path.path_pattern().is_none());
        assert_eq!(path.last_node(), Some("Username"));
    }

    #[test]
    fn test_empty_path() {
        let path = WPath::parse("   ").unwrap();
        assert!(path.is_empty());
        assert!(path.last_node().is_none());
        assert!(path.whole_path_pattern().is_none());
    }

    #[test]
    fn test_table_coordinates_in_the_middle() {
        let path = WPath::parse("Table > [header_3; row_2] > [x] > Input").unwrap();
        assert_eq!(path.path_nodes(), ["Table".to_string()]);
        assert_eq!(path.last_node(), Some("Input"));
        let coordinates = path.table_coordinates();
        assert_eq!(coordinates.len(), 2);
        assert_eq!(coordinates[0].x(), Some("header_3"));
        assert_eq!(coordinates[0].y(), Some("row_2"));
        assert_eq!(coordinates[1].x(), Some("x"));
        assert_eq!(coordinates[1].y(), None);
        assert_eq!(path.table_coordinates_reversed()[0].x(), Some("x"));
    }

    #[test]
    fn test_trailing_coordinate_replaces_last_node() {
        let path = WPath::parse("Table > [;row_2]").unwrap();
        assert_eq!(path.last_node(), None);
        assert!(path.last_node_pattern().is_none());
        assert_eq!(path.table_coordinates()[0].x(), None);
        assert_eq!(path.table_coordinates()[0].y(), Some("row_2"));
        assert_eq!(path.table_coordinates()[0].to_string(), "[;row_2]");
    }

    #[test]
    fn test_two_coordinate_groups_fail() {
        let err = WPath::parse("[a] > b > [c] > d").unwrap_err();
        match err {
            LocatorError::InvalidPath { raw, reason } => {
                assert_eq!(raw, "[a] > b > [c] > d");
                assert_eq!(reason, "Only one group of table coordinates allowed");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(WPath::parse("[a] > b > [c]").is_err());
    }

    #[test]
    fn test_invalid_coordinate() {
        let err = WPath::parse("[a;b;c] > d").unwrap_err();
        assert_eq!(err, LocatorError::InvalidTableCoordinate("[a;b;c]".to_string()));
        assert!(TableCoordinate::parse("a;b").is_err());
    }

    #[test]
    fn test_coordinate_with_empty_y() {
        let coordinate = TableCoordinate::parse("[x; ]").unwrap();
        assert_eq!(coordinate.x(), Some("x"));
        assert_eq!(coordinate.y(), None);
        assert!(coordinate.y_pattern().is_none());
        assert_eq!(coordinate.to_string(), "[x;]");
    }

    #[test]
    fn test_escaped_separator_and_bracket() {
        let path = WPath::parse("a \\> b > [text\\] > c").unwrap();
        assert_eq!(path.raw_path()[0], "a > b");
        assert_eq!(path.path_nodes()[1], "[text\\]");
        assert!(!path.has_table_coordinates());
    }

    #[test]
    fn test_custom_separator() {
        let config = LocatorConfig::default().with_path_separator('/');
        let path = WPath::parse_with("Form / Name > x", &config).unwrap();
        assert_eq!(path.path_nodes(), ["Form".to_string()]);
        assert_eq!(path.last_node(), Some("Name > x"));
    }
}
