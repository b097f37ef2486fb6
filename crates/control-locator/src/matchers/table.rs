//! Table coordinate strategy
//!
//! `[x;y]` selects the cell whose column contains a cell reading `x` and whose
//! row contains a cell reading `y`. Spans are honoured by laying every table
//! out on a grid first.

use super::{MatchContext, Matcher};
use crate::node::{NodeCategory, NodeId, PageTree};
use crate::page_index::PageTextIndex;
use crate::pattern::SearchPattern;
use crate::types::{FoundType, MatchResult, PathSpot};
use crate::wpath::TableCoordinate;
use std::collections::HashMap;

/// Cell placement of one table
struct TableGrid {
    slots: Vec<Vec<Option<NodeId>>>,
    placements: HashMap<NodeId, Placement>,
    row_count: usize,
    width: usize,
}

#[derive(Debug, Clone, Copy)]
struct Placement {
    row: usize,
    column: usize,
    row_span: usize,
    column_span: usize,
}

fn span(tree: &dyn PageTree, cell: NodeId, attribute: &str) -> usize {
    tree.attribute(cell, attribute)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(1)
}

impl TableGrid {
    fn build(tree: &dyn PageTree, table: NodeId) -> Self {
        let rows: Vec<NodeId> = tree
            .descendants(table)
            .into_iter()
            .filter(|row| {
                tree.category(*row) == NodeCategory::TableRow
                    && tree.ancestor_where(*row, &|category| category == NodeCategory::Table)
                        == Some(table)
            })
            .collect();

        let mut grid = TableGrid {
            slots: vec![Vec::new(); rows.len()],
            placements: HashMap::new(),
            row_count: rows.len(),
            width: 0,
        };

        for (row_index, row) in rows.iter().enumerate() {
            let mut column = 0;
            for cell in tree
                .children(*row)
                .into_iter()
                .filter(|cell| tree.category(*cell) == NodeCategory::TableCell)
            {
                while grid.at(row_index, column).is_some() {
                    column += 1;
                }
                let placement = Placement {
                    row: row_index,
                    column,
                    row_span: span(tree, cell, "rowspan"),
                    column_span: span(tree, cell, "colspan"),
                };
                grid.occupy(cell, placement);
                column += placement.column_span;
            }
        }
        grid
    }

    fn occupy(&mut self, cell: NodeId, placement: Placement) {
        let last_row = (placement.row + placement.row_span).min(self.row_count);
        for row in placement.row..last_row {
            let slots = &mut self.slots[row];
            let needed = placement.column + placement.column_span;
            if slots.len() < needed {
                slots.resize(needed, None);
            }
            for slot in &mut slots[placement.column..needed] {
                *slot = Some(cell);
            }
            self.width = self.width.max(needed);
        }
        self.placements.insert(cell, placement);
    }

    fn at(&self, row: usize, column: usize) -> Option<NodeId> {
        self.slots.get(row)?.get(column).copied().flatten()
    }

    /// Cells sharing a column with `cell`
    fn column_cells(&self, placement: Placement) -> Vec<NodeId> {
        let mut cells = Vec::new();
        for column in placement.column..placement.column + placement.column_span {
            for row in 0..self.row_count {
                cells.extend(self.at(row, column));
            }
        }
        cells
    }

    /// Cells sharing a row with `cell`
    fn row_cells(&self, placement: Placement) -> Vec<NodeId> {
        let mut cells = Vec::new();
        let last_row = (placement.row + placement.row_span).min(self.row_count);
        for row in placement.row..last_row {
            for column in 0..self.width {
                cells.extend(self.at(row, column));
            }
        }
        cells
    }
}

fn enclosing_cell(tree: &dyn PageTree, node: NodeId) -> Option<NodeId> {
    if tree.category(node) == NodeCategory::TableCell {
        return Some(node);
    }
    tree.ancestor_where(node, &|category| category == NodeCategory::TableCell)
}

fn cell_reads(
    index: &PageTextIndex,
    cell: NodeId,
    pattern: &SearchPattern,
    path_spot: PathSpot,
) -> bool {
    let Some(spot) = index.position(cell) else {
        return false;
    };
    let behind_path = match path_spot {
        PathSpot::Unconstrained => true,
        PathSpot::NotFound => false,
        PathSpot::Found(path) => path.end < spot.start,
    };
    behind_path && pattern.matches(&index.as_text(cell).unwrap_or_default())
}

/// Whether `node` sits inside all `coordinates` (innermost first)
///
/// Each satisfied coordinate continues the search at the row holding the
/// matching cell, so the next one has to be fulfilled by an enclosing table.
pub fn is_in_table_coordinates(
    tree: &dyn PageTree,
    index: &PageTextIndex,
    node: NodeId,
    coordinates: &[TableCoordinate],
    path_spot: PathSpot,
) -> bool {
    let mut current = node;
    for coordinate in coordinates {
        let Some(mut cell) = enclosing_cell(tree, current) else {
            return false;
        };
        let mut found_x = coordinate.x_pattern().is_none();
        let mut found_y = coordinate.y_pattern().is_none();

        loop {
            let Some(row) = tree.ancestor_where(cell, &|category| category == NodeCategory::TableRow)
            else {
                return false;
            };
            let Some(table) = tree.ancestor_where(row, &|category| category == NodeCategory::Table)
            else {
                return false;
            };
            let grid = TableGrid::build(tree, table);
            let Some(placement) = grid.placements.get(&cell).copied() else {
                return false;
            };

            if let (false, Some(x)) = (found_x, coordinate.x_pattern()) {
                found_x = grid
                    .column_cells(placement)
                    .into_iter()
                    .any(|other| cell_reads(index, other, x, path_spot));
            }
            if let (false, Some(y)) = (found_y, coordinate.y_pattern()) {
                found_y = grid
                    .row_cells(placement)
                    .into_iter()
                    .any(|other| cell_reads(index, other, y, path_spot));
            }

            if found_x && found_y {
                current = row;
                break;
            }

            match enclosing_cell(tree, row) {
                Some(outer) => cell = outer,
                None => return false,
            }
        }
    }
    true
}

/// Controls addressed by table coordinates alone
#[derive(Debug, Clone, Copy)]
pub struct ByTableCoordinates {
    target: fn(NodeCategory) -> bool,
}

impl ByTableCoordinates {
    pub const fn new(target: fn(NodeCategory) -> bool) -> Self {
        Self { target }
    }
}

impl Matcher for ByTableCoordinates {
    fn name(&self) -> &'static str {
        "by-table-coordinates"
    }

    fn matches(&self, ctx: &MatchContext<'_>, node: NodeId) -> Vec<MatchResult> {
        if !(self.target)(ctx.tree.category(node)) {
            return Vec::new();
        }
        let Some(spot) = ctx.candidate_spot(node) else {
            return Vec::new();
        };
        if !is_in_table_coordinates(ctx.tree, ctx.index, node, ctx.table_coordinates, ctx.path_spot)
        {
            return Vec::new();
        }
        let Some(distance) = ctx.distance_to(node) else {
            return Vec::new();
        };
        vec![MatchResult::new(
            node,
            FoundType::ByTableCoordinate,
            0,
            distance,
            spot.start,
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers::fixture::Fixture;
    use crate::node::InputKind;

    fn is_text_input(category: NodeCategory) -> bool {
        category == NodeCategory::Input(InputKind::Text)
    }

    const INPUTS: [&str; 4] = ["InputText_1_2", "InputText_1_3", "InputText_2_2", "InputText_2_3"];

    fn table(header_3: &str, row_2: &str, cell_2_3: &str) -> String {
        format!(
            "<table>\
               <thead><tr>\
                 <th id='header_1'>header_1</th><th id='header_2'>header_2</th><th id='header_3'>{}</th>\
               </tr></thead>\
               <tbody>\
                 <tr>\
                   <td id='cell_1_1'>row_1</td>\
                   <td id='cell_1_2'><input type='text' id='InputText_1_2'/></td>\
                   <td id='cell_1_3'><input type='text' id='InputText_1_3'/></td>\
                 </tr>\
                 <tr>\
                   <td id='cell_2_1'>{}</td>\
                   <td id='cell_2_2'><input type='text' id='InputText_2_2'/></td>\
                   <td id='cell_2_3'>{}</td>\
                 </tr>\
               </tbody>\
             </table>",
            header_3, row_2, cell_2_3
        )
    }

    fn only_match(fixture: &Fixture, locator: &str) -> Vec<NodeId> {
        let matcher = ByTableCoordinates::new(is_text_input);
        fixture
            .run(&matcher, locator, &INPUTS)
            .into_iter()
            .map(|result| {
                assert_eq!(result.found_type, FoundType::ByTableCoordinate);
                assert_eq!(result.deviation, 0);
                result.node
            })
            .collect()
    }

    #[test]
    fn test_plain_table() {
        let fixture = Fixture::new(&table(
            "header_3",
            "row_2",
            "<input type='text' id='InputText_2_3'/>",
        ));
        assert_eq!(
            only_match(&fixture, "[header_3; row_2]"),
            vec![fixture.node("InputText_2_3")]
        );
    }

    #[test]
    fn test_single_axis() {
        let fixture = Fixture::new(&table(
            "header_3",
            "row_2",
            "<input type='text' id='InputText_2_3'/>",
        ));
        assert_eq!(
            only_match(&fixture, "[header_3]"),
            vec![fixture.node("InputText_1_3"), fixture.node("InputText_2_3")]
        );
        assert_eq!(
            only_match(&fixture, "[; row_2]"),
            vec![fixture.node("InputText_2_2"), fixture.node("InputText_2_3")]
        );
    }

    #[test]
    fn test_nested_header() {
        let fixture = Fixture::new(&table(
            "<table><tr><td id='header_i_3'>header_3</td></tr></table>",
            "row_2",
            "<input type='text' id='InputText_2_3'/>",
        ));
        assert_eq!(
            only_match(&fixture, "[header_3; row_2]"),
            vec![fixture.node("InputText_2_3")]
        );
    }

    #[test]
    fn test_nested_row_label() {
        let fixture = Fixture::new(&table(
            "header_3",
            "<table><tr><td id='cell_i_2_1'>row_2</td></tr></table>",
            "<input type='text' id='InputText_2_3'/>",
        ));
        assert_eq!(
            only_match(&fixture, "[header_3; row_2]"),
            vec![fixture.node("InputText_2_3")]
        );
    }

    #[test]
    fn test_nested_cell() {
        let fixture = Fixture::new(&table(
            "header_3",
            "row_2",
            "<table><tr><td id='cell_i_2_3'><input type='text' id='InputText_2_3'/></td></tr></table>",
        ));
        assert_eq!(
            only_match(&fixture, "[header_3; row_2]"),
            vec![fixture.node("InputText_2_3")]
        );
    }

    #[test]
    fn test_unknown_coordinate() {
        let fixture = Fixture::new(&table(
            "header_3",
            "row_2",
            "<input type='text' id='InputText_2_3'/>",
        ));
        assert!(only_match(&fixture, "[header_9; row_2]").is_empty());
    }

    #[test]
    fn test_column_span() {
        let fixture = Fixture::new(
            "<table>\
               <tr><th colspan='2'>wide</th><th>narrow</th></tr>\
               <tr>\
                 <td>row_1</td>\
                 <td><input id='a' type='text'></td>\
                 <td><input id='b' type='text'></td>\
               </tr>\
             </table>",
        );
        let matcher = ByTableCoordinates::new(is_text_input);
        let matches = fixture.run(&matcher, "[wide; row_1]", &["a", "b"]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].node, fixture.node("a"));
    }

    #[test]
    fn test_outer_and_inner_coordinates() {
        let inner = "<table>\
               <tr><th>in_x</th></tr>\
               <tr><td><input id='inner' type='text'></td></tr>\
             </table>";
        let fixture = Fixture::new(&format!(
            "<table>\
               <tr><th>out_x</th><th>other</th></tr>\
               <tr><td>{}</td><td><input id='outside' type='text'></td></tr>\
             </table>",
            inner
        ));
        let matcher = ByTableCoordinates::new(is_text_input);
        let matches = fixture.run(&matcher, "[out_x] > [in_x]", &["inner", "outside"]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].node, fixture.node("inner"));

        assert!(fixture
            .run(&matcher, "[other] > [in_x]", &["inner", "outside"])
            .is_empty());
    }
}
