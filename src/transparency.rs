//! Page transparency analysis for the firmware partial-redraw compositor.
//!
//! A composition tree mirroring the runtime display is walked to collect the
//! absolute rects of opaque widgets; a grid split at every opaque edge is then
//! merged back into maximal transparent rectangles.
//!
//! The merge is greedy (grow right, then down, column-major) and runs in time
//! proportional to the grid cell count. It never leaves gaps or overlaps but
//! does not minimize the rectangle count.

use crate::model::{DataItem, ListDirection, Page, Project, Widget, WidgetKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.left + other.width
            && other.left < self.left + self.width
            && self.top < other.top + other.height
            && other.top < self.top + self.height
    }
}

/// Computes the transparent rectangles beneath a page's opaque widgets.
pub fn page_transparent_rectangles(page: &Page, project: &Project) -> Vec<Rect> {
    let page_rect = Rect {
        left: page.left as i32,
        top: page.top as i32,
        width: page.width as i32,
        height: page.height as i32,
    };

    let mut opaque = Vec::new();
    for widget in &page.widgets {
        collect_opaque_rects(
            widget,
            page_rect.left,
            page_rect.top,
            project,
            &mut opaque,
        );
    }

    let mut grid = TransparencyGrid::new(page_rect);
    for rect in &opaque {
        grid.add_opaque_rect(*rect);
    }
    grid.into_transparent_rectangles()
}

/// Pre-order walk of the composition tree, mirroring what the runtime
/// actually displays. Pure layout containers (Container, List, Select) are
/// transparent holes; every other widget kind is treated as fully opaque over
/// its own rect — a conservative approximation.
fn collect_opaque_rects(widget: &Widget, x: i32, y: i32, project: &Project, out: &mut Vec<Rect>) {
    let x = x + widget.left as i32;
    let y = y + widget.top as i32;
    let rect = Rect {
        left: x,
        top: y,
        width: widget.width as i32,
        height: widget.height as i32,
    };

    match &widget.kind {
        WidgetKind::Container { widgets, .. } => {
            for child in widgets {
                collect_opaque_rects(child, x, y, project, out);
            }
        }
        WidgetKind::Select { widgets } => {
            if !widgets.is_empty() {
                let bound = widget.data.as_deref().and_then(|n| project.find_data_item(n));
                let mut index = bound.map_or(0, data_item_enum_value);
                if index >= widgets.len() {
                    index = 0;
                }
                collect_opaque_rects(&widgets[index], x, y, project, out);
            }
        }
        WidgetKind::List {
            list_type,
            item_widget,
            ..
        } => {
            if let Some(item) = item_widget {
                let count = widget
                    .data
                    .as_deref()
                    .and_then(|n| project.find_data_item(n))
                    .and_then(|d| d.value.as_array().map(Vec::len))
                    .unwrap_or(0);

                let mut ix = x;
                let mut iy = y;
                for _ in 0..count {
                    collect_opaque_rects(item, ix, iy, project, out);
                    match list_type {
                        ListDirection::Vertical => iy += item.height as i32,
                        ListDirection::Horizontal => ix += item.width as i32,
                    }
                }
            }
        }
        _ => out.push(rect),
    }
}

/// Currently selected branch index of a Select-bound data item, 0 when the
/// preview value does not resolve.
fn data_item_enum_value(item: &DataItem) -> usize {
    match &item.value {
        serde_json::Value::Bool(b) => usize::from(*b),
        serde_json::Value::Number(n) => n.as_u64().unwrap_or(0) as usize,
        _ => 0,
    }
}

struct GridRow {
    y: i32,
    height: i32,
    opaque: bool,
}

struct GridCol {
    x: i32,
    width: i32,
    rows: Vec<GridRow>,
}

/// Grid decomposition of a page rect. Column boundaries are split at every
/// opaque rect's left/right edge and row boundaries at its top/bottom edge;
/// row lists stay congruent across all columns.
pub struct TransparencyGrid {
    cols: Vec<GridCol>,
}

impl TransparencyGrid {
    pub fn new(rect: Rect) -> Self {
        Self {
            cols: vec![GridCol {
                x: rect.left,
                width: rect.width,
                rows: vec![GridRow {
                    y: rect.top,
                    height: rect.height,
                    opaque: false,
                }],
            }],
        }
    }

    fn add_col(&mut self, x: i32) {
        // Columns are sorted by x; locate the column containing x.
        let idx = self.cols.partition_point(|c| c.x < x);
        if idx == 0 {
            return;
        }
        let col = &mut self.cols[idx - 1];
        if x <= col.x || x >= col.x + col.width {
            return;
        }

        let new_col = GridCol {
            x,
            width: col.x + col.width - x,
            rows: col
                .rows
                .iter()
                .map(|r| GridRow {
                    y: r.y,
                    height: r.height,
                    opaque: r.opaque,
                })
                .collect(),
        };
        col.width = x - col.x;
        self.cols.insert(idx, new_col);
    }

    fn add_row(&mut self, y: i32) {
        for col in &mut self.cols {
            let idx = col.rows.partition_point(|r| r.y < y);
            if idx == 0 {
                continue;
            }
            let row = &mut col.rows[idx - 1];
            if y <= row.y || y >= row.y + row.height {
                continue;
            }

            let new_row = GridRow {
                y,
                height: row.y + row.height - y,
                opaque: row.opaque,
            };
            row.height = y - row.y;
            col.rows.insert(idx, new_row);
        }
    }

    pub fn add_opaque_rect(&mut self, rect: Rect) {
        if rect.width <= 0 && rect.height <= 0 {
            return;
        }

        self.add_col(rect.left);
        self.add_col(rect.left + rect.width);
        self.add_row(rect.top);
        self.add_row(rect.top + rect.height);

        for col in &mut self.cols {
            if col.x >= rect.left && col.x + col.width <= rect.left + rect.width {
                for row in &mut col.rows {
                    if row.y >= rect.top && row.y + row.height <= rect.top + rect.height {
                        row.opaque = true;
                    }
                }
            }
        }
    }

    /// Greedy merge: each still-transparent cell grows rightward along its
    /// row, then the strip grows downward while every covered cell is
    /// transparent, consuming cells as it goes.
    pub fn into_transparent_rectangles(mut self) -> Vec<Rect> {
        let mut rects = Vec::new();

        for i_col in 0..self.cols.len() {
            for i_row in 0..self.cols[i_col].rows.len() {
                if !self.cols[i_col].rows[i_row].opaque {
                    rects.push(self.max_rect_at_cell(i_col, i_row));
                }
            }
        }

        rects
    }

    fn max_rect_at_cell(&mut self, i_col_start: usize, i_row_start: usize) -> Rect {
        let mut i_col_end = i_col_start;
        for i_col in (i_col_start + 1)..self.cols.len() {
            if self.cols[i_col].rows[i_row_start].opaque {
                break;
            }
            self.cols[i_col].rows[i_row_start].opaque = true;
            i_col_end = i_col;
        }

        let mut i_row_end = i_row_start;
        'down: for i_row in (i_row_start + 1)..self.cols[i_col_start].rows.len() {
            for i_col in i_col_start..=i_col_end {
                if self.cols[i_col].rows[i_row].opaque {
                    break 'down;
                }
            }
            for i_col in i_col_start..=i_col_end {
                self.cols[i_col].rows[i_row].opaque = true;
            }
            i_row_end = i_row;
        }

        let col_start = &self.cols[i_col_start];
        let col_end = &self.cols[i_col_end];
        let row_start = &col_start.rows[i_row_start];
        let row_end = &col_end.rows[i_row_end];

        Rect {
            left: col_start.x,
            top: row_start.y,
            width: col_end.x + col_end.width - col_start.x,
            height: row_end.y + row_end.height - row_start.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Widget;

    fn leaf(left: i16, top: i16, width: u16, height: u16) -> Widget {
        Widget {
            left,
            top,
            width,
            height,
            style: None,
            active_style: None,
            data: None,
            action: None,
            kind: WidgetKind::Rectangle {
                invert_colors: false,
                ignore_luminosity: false,
            },
        }
    }

    fn page_with(widgets: Vec<Widget>) -> Page {
        Page {
            name: "main".to_string(),
            left: 0,
            top: 0,
            width: 100,
            height: 100,
            style: None,
            widgets,
            close_page_if_touched_outside: false,
            used_as_custom_widget: false,
            used_in: vec![],
        }
    }

    #[test]
    fn single_opaque_widget_leaves_complement_covered_exactly_once() {
        let page = page_with(vec![leaf(10, 10, 20, 20)]);
        let rects = page_transparent_rectangles(&page, &Project::default());

        let opaque = Rect {
            left: 10,
            top: 10,
            width: 20,
            height: 20,
        };
        let total: i64 = rects.iter().map(Rect::area).sum();
        assert_eq!(total, 100 * 100 - 20 * 20);
        for r in &rects {
            assert!(!r.intersects(&opaque), "{r:?} overlaps the opaque rect");
        }
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn fully_transparent_page_is_one_rectangle() {
        let page = page_with(vec![]);
        let rects = page_transparent_rectangles(&page, &Project::default());
        assert_eq!(
            rects,
            vec![Rect {
                left: 0,
                top: 0,
                width: 100,
                height: 100
            }]
        );
    }

    #[test]
    fn fully_opaque_page_has_no_transparent_rectangles() {
        let page = page_with(vec![leaf(0, 0, 100, 100)]);
        let rects = page_transparent_rectangles(&page, &Project::default());
        assert!(rects.is_empty());
    }

    #[test]
    fn container_offsets_accumulate() {
        let container = Widget {
            left: 30,
            top: 30,
            width: 50,
            height: 50,
            style: None,
            active_style: None,
            data: None,
            action: None,
            kind: WidgetKind::Container {
                widgets: vec![leaf(5, 5, 10, 10)],
                overlay: None,
            },
        };
        let page = page_with(vec![container]);
        let rects = page_transparent_rectangles(&page, &Project::default());

        let opaque = Rect {
            left: 35,
            top: 35,
            width: 10,
            height: 10,
        };
        for r in &rects {
            assert!(!r.intersects(&opaque));
        }
        let total: i64 = rects.iter().map(Rect::area).sum();
        assert_eq!(total, 100 * 100 - 10 * 10);
    }

    #[test]
    fn select_uses_bound_enum_value_and_list_repeats_items() {
        let mut project = Project::default();
        project.data_items.push(crate::model::DataItem {
            name: "mode".to_string(),
            data_type: "enum".to_string(),
            enum_items: vec!["a".to_string(), "b".to_string()],
            value: serde_json::json!(1),
            used_in: vec![],
        });
        project.data_items.push(crate::model::DataItem {
            name: "items".to_string(),
            data_type: "array".to_string(),
            enum_items: vec![],
            value: serde_json::json!([0, 0, 0]),
            used_in: vec![],
        });

        let select = Widget {
            data: Some("mode".to_string()),
            kind: WidgetKind::Select {
                widgets: vec![leaf(0, 0, 10, 10), leaf(50, 50, 10, 10)],
            },
            ..leaf(0, 0, 0, 0)
        };
        let list = Widget {
            left: 0,
            top: 0,
            width: 10,
            height: 60,
            data: Some("items".to_string()),
            kind: WidgetKind::List {
                list_type: ListDirection::Vertical,
                item_widget: Some(Box::new(leaf(80, 0, 10, 20))),
                gap: 0,
            },
            ..leaf(0, 0, 0, 0)
        };

        let page = page_with(vec![select, list]);
        let rects = page_transparent_rectangles(&page, &project);

        // Selected branch 1 at (50,50); list item repeated 3x down from y=0.
        let total: i64 = rects.iter().map(Rect::area).sum();
        assert_eq!(total, 100 * 100 - 10 * 10 - 3 * (10 * 20));
        let covered = [
            Rect {
                left: 50,
                top: 50,
                width: 10,
                height: 10,
            },
            Rect {
                left: 80,
                top: 0,
                width: 10,
                height: 60,
            },
        ];
        for r in &rects {
            for c in &covered {
                assert!(!r.intersects(c), "{r:?} overlaps opaque {c:?}");
            }
        }
    }

    #[test]
    fn zero_sized_rect_is_ignored() {
        let mut grid = TransparencyGrid::new(Rect {
            left: 0,
            top: 0,
            width: 10,
            height: 10,
        });
        grid.add_opaque_rect(Rect {
            left: 3,
            top: 3,
            width: 0,
            height: 0,
        });
        let rects = grid.into_transparent_rectangles();
        assert_eq!(rects.len(), 1);
    }
}
