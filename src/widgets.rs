//! Document region serializer.
//!
//! The document is one object graph: a root struct holding the custom-widget
//! list and the page list. Pages serialize as Container widgets whose
//! specific part additionally carries the page's transparent rectangles and
//! the touch-outside-closes flag.
//!
//! Every widget starts with the same 10-field header; the kind-specific part
//! hangs off the header's final pointer. Unresolved asset references encode
//! as index 0 and a diagnostic; a missing mandatory sub-object encodes as a
//! null pointer and a diagnostic. Neither aborts the build.

use crate::assets::BuildContext;
use crate::field::{Arena, Field, ObjectId};
use crate::linker::link_and_pack;
use crate::model::{
    BarGraphOrientation, GridFlow, ListDirection, NeedlePosition, Page, Widget, WidgetKind,
};
use crate::transparency::page_transparent_rectangles;

pub const WIDGET_TYPE_NONE: u8 = 0;
pub const WIDGET_TYPE_CONTAINER: u8 = 1;
pub const WIDGET_TYPE_LIST: u8 = 2;
pub const WIDGET_TYPE_GRID: u8 = 3;
pub const WIDGET_TYPE_SELECT: u8 = 4;
pub const WIDGET_TYPE_DISPLAY_DATA: u8 = 5;
pub const WIDGET_TYPE_TEXT: u8 = 6;
pub const WIDGET_TYPE_MULTILINE_TEXT: u8 = 7;
pub const WIDGET_TYPE_RECTANGLE: u8 = 8;
pub const WIDGET_TYPE_BITMAP: u8 = 9;
pub const WIDGET_TYPE_BUTTON: u8 = 10;
pub const WIDGET_TYPE_TOGGLE_BUTTON: u8 = 11;
pub const WIDGET_TYPE_BUTTON_GROUP: u8 = 12;
pub const WIDGET_TYPE_SCALE: u8 = 13;
pub const WIDGET_TYPE_BAR_GRAPH: u8 = 14;
pub const WIDGET_TYPE_LAYOUT_VIEW: u8 = 15;
pub const WIDGET_TYPE_YT_GRAPH: u8 = 16;
pub const WIDGET_TYPE_UP_DOWN: u8 = 17;
pub const WIDGET_TYPE_LIST_GRAPH: u8 = 18;
pub const WIDGET_TYPE_APP_VIEW: u8 = 19;

const LIST_TYPE_VERTICAL: u8 = 1;
const LIST_TYPE_HORIZONTAL: u8 = 2;

const GRID_FLOW_ROW: u8 = 1;
const GRID_FLOW_COLUMN: u8 = 2;

const SCALE_NEEDLE_POSITION_LEFT: u8 = 1;
const SCALE_NEEDLE_POSITION_RIGHT: u8 = 2;
const SCALE_NEEDLE_POSITION_TOP: u8 = 3;
const SCALE_NEEDLE_POSITION_BOTTOM: u8 = 4;

const BAR_GRAPH_ORIENTATION_LEFT_RIGHT: u8 = 1;
const BAR_GRAPH_ORIENTATION_RIGHT_LEFT: u8 = 2;
const BAR_GRAPH_ORIENTATION_TOP_BOTTOM: u8 = 3;
const BAR_GRAPH_ORIENTATION_BOTTOM_TOP: u8 = 4;

/// Serializes the whole document region.
pub fn build_document(ctx: &mut BuildContext) -> Vec<u8> {
    let mut arena = Arena::new();

    let custom_widget_pages: Vec<&Page> = ctx
        .included_pages()
        .filter(|p| p.used_as_custom_widget)
        .collect();
    let pages: Vec<&Page> = ctx
        .included_pages()
        .filter(|p| !p.used_as_custom_widget)
        .collect();

    let custom_widgets: Vec<ObjectId> = custom_widget_pages
        .iter()
        .map(|page| build_custom_widget(ctx, &mut arena, page))
        .collect();

    let page_objects: Vec<ObjectId> = pages
        .iter()
        .map(|page| build_page(ctx, &mut arena, page))
        .collect();

    let root = arena.add_struct(vec![
        Field::List(custom_widgets),
        Field::List(page_objects),
    ]);

    link_and_pack(&mut arena, root)
}

/// A custom widget is just its child list; position and size come from the
/// LayoutView widget that instantiates it.
fn build_custom_widget(ctx: &mut BuildContext, arena: &mut Arena, page: &Page) -> ObjectId {
    let children: Vec<ObjectId> = page
        .widgets
        .iter()
        .map(|w| build_widget(ctx, arena, w, &page.name))
        .collect();
    arena.add_struct(vec![Field::List(children)])
}

/// Pages share the Container widget encoding; their specific part adds the
/// precomputed transparent rectangles and the close-on-outside-touch flag.
pub fn build_page(ctx: &mut BuildContext, arena: &mut Arena, page: &Page) -> ObjectId {
    let children: Vec<ObjectId> = page
        .widgets
        .iter()
        .map(|w| build_widget(ctx, arena, w, &page.name))
        .collect();

    let rects: Vec<ObjectId> = page_transparent_rectangles(page, ctx.project)
        .iter()
        .map(|r| {
            arena.add_struct(vec![
                Field::Int16(r.left as i16),
                Field::Int16(r.top as i16),
                Field::UInt16(r.width as u16),
                Field::UInt16(r.height as u16),
            ])
        })
        .collect();

    let specific = arena.add_struct(vec![
        Field::List(children),
        Field::List(rects),
        Field::UInt8(u8::from(page.close_page_if_touched_outside)),
    ]);

    let style = match page.style.as_deref() {
        Some(name) => ctx.style_index(&page.name, Some(name)),
        None => ctx.default_style_index(),
    };

    arena.add_struct(vec![
        Field::UInt8(WIDGET_TYPE_CONTAINER),
        Field::UInt16(0), // data
        Field::UInt16(0), // action
        Field::Int16(page.left),
        Field::Int16(page.top),
        Field::Int16(page.width as i16),
        Field::Int16(page.height as i16),
        Field::UInt16(style),
        Field::UInt16(0), // active style
        Field::Ptr(Some(specific)),
    ])
}

pub fn build_widget(
    ctx: &mut BuildContext,
    arena: &mut Arena,
    widget: &Widget,
    owner: &str,
) -> ObjectId {
    let data = ctx.data_item_index(owner, widget.data.as_deref());
    let action = ctx.action_index(owner, widget.action.as_deref());

    let style = match widget.style.as_deref() {
        Some(name) => ctx.style_index(owner, Some(name)),
        None => ctx.default_style_index(),
    };
    let active_style = ctx.style_index(owner, widget.active_style.as_deref());

    let specific = build_specific(ctx, arena, widget, style, owner);

    arena.add_struct(vec![
        Field::UInt8(widget_type(&widget.kind)),
        Field::UInt16(data),
        Field::UInt16(action),
        Field::Int16(widget.left),
        Field::Int16(widget.top),
        Field::Int16(widget.width as i16),
        Field::Int16(widget.height as i16),
        Field::UInt16(style),
        Field::UInt16(active_style),
        Field::Ptr(specific),
    ])
}

pub fn widget_type(kind: &WidgetKind) -> u8 {
    match kind {
        WidgetKind::Container { .. } => WIDGET_TYPE_CONTAINER,
        WidgetKind::List { .. } => WIDGET_TYPE_LIST,
        WidgetKind::Grid { .. } => WIDGET_TYPE_GRID,
        WidgetKind::Select { .. } => WIDGET_TYPE_SELECT,
        WidgetKind::DisplayData { .. } => WIDGET_TYPE_DISPLAY_DATA,
        WidgetKind::Text { .. } => WIDGET_TYPE_TEXT,
        WidgetKind::MultilineText { .. } => WIDGET_TYPE_MULTILINE_TEXT,
        WidgetKind::Rectangle { .. } => WIDGET_TYPE_RECTANGLE,
        WidgetKind::Bitmap { .. } => WIDGET_TYPE_BITMAP,
        WidgetKind::Button { .. } => WIDGET_TYPE_BUTTON,
        WidgetKind::ToggleButton { .. } => WIDGET_TYPE_TOGGLE_BUTTON,
        WidgetKind::Scale { .. } => WIDGET_TYPE_SCALE,
        WidgetKind::BarGraph { .. } => WIDGET_TYPE_BAR_GRAPH,
        WidgetKind::LayoutView { .. } => WIDGET_TYPE_LAYOUT_VIEW,
        WidgetKind::YTGraph { .. } => WIDGET_TYPE_YT_GRAPH,
        WidgetKind::UpDown { .. } => WIDGET_TYPE_UP_DOWN,
        WidgetKind::ListGraph { .. } => WIDGET_TYPE_LIST_GRAPH,
        WidgetKind::AppView => WIDGET_TYPE_APP_VIEW,
    }
}

fn build_specific(
    ctx: &mut BuildContext,
    arena: &mut Arena,
    widget: &Widget,
    style: u16,
    owner: &str,
) -> Option<ObjectId> {
    let fields = match &widget.kind {
        WidgetKind::Container { widgets, overlay } => {
            let children: Vec<ObjectId> = widgets
                .iter()
                .map(|w| build_widget(ctx, arena, w, owner))
                .collect();
            let overlay = ctx.data_item_index(owner, overlay.as_deref());
            vec![Field::List(children), Field::UInt16(overlay)]
        }
        WidgetKind::Select { widgets } => {
            if let Some(expected) = select_expected_children(ctx, widget) {
                if expected > widgets.len() {
                    ctx.diags
                        .error("Some select children are missing", Some(owner));
                }
            }
            let children: Vec<ObjectId> = widgets
                .iter()
                .map(|w| build_widget(ctx, arena, w, owner))
                .collect();
            vec![Field::List(children)]
        }
        WidgetKind::List {
            list_type,
            item_widget,
            gap,
        } => {
            let direction = match list_type {
                ListDirection::Vertical => LIST_TYPE_VERTICAL,
                ListDirection::Horizontal => LIST_TYPE_HORIZONTAL,
            };
            let item = build_item_widget(ctx, arena, item_widget.as_deref(), owner, "List");
            vec![
                Field::UInt8(direction),
                Field::Ptr(item),
                Field::UInt8(*gap),
            ]
        }
        WidgetKind::Grid {
            grid_flow,
            item_widget,
        } => {
            let flow = match grid_flow {
                GridFlow::Row => GRID_FLOW_ROW,
                GridFlow::Column => GRID_FLOW_COLUMN,
            };
            let item = build_item_widget(ctx, arena, item_widget.as_deref(), owner, "Grid");
            vec![Field::UInt8(flow), Field::Ptr(item)]
        }
        WidgetKind::DisplayData {
            focus_style,
            display_option,
        } => {
            let mut focus = ctx.style_index(owner, focus_style.as_deref());
            if focus == 0 {
                focus = style;
            }
            vec![Field::UInt16(focus), Field::UInt8(*display_option)]
        }
        WidgetKind::Text {
            text,
            ignore_luminosity,
        } => {
            let s = arena.add_string(&widget_text(text));
            let flags = u8::from(*ignore_luminosity);
            vec![Field::Ptr(Some(s)), Field::UInt8(flags)]
        }
        WidgetKind::MultilineText {
            text,
            first_line_indent,
            hanging_indent,
        } => {
            let s = arena.add_string(&widget_text(text));
            vec![
                Field::Ptr(Some(s)),
                Field::Int16(*first_line_indent),
                Field::Int16(*hanging_indent),
            ]
        }
        WidgetKind::Rectangle {
            invert_colors,
            ignore_luminosity,
        } => {
            let flags = u8::from(*invert_colors) | (u8::from(*ignore_luminosity) << 1);
            vec![Field::UInt8(flags)]
        }
        WidgetKind::Bitmap { bitmap } => {
            let index = ctx.bitmap_index(owner, bitmap.as_deref());
            vec![Field::UInt8(index as u8)]
        }
        WidgetKind::Button {
            text,
            enabled,
            disabled_style,
        } => {
            let s = arena.add_string(&widget_text(text));
            let enabled = ctx.data_item_index(owner, enabled.as_deref());
            let disabled_style = ctx.style_index(owner, disabled_style.as_deref());
            vec![
                Field::Ptr(Some(s)),
                Field::UInt16(enabled),
                Field::UInt16(disabled_style),
            ]
        }
        WidgetKind::ToggleButton { text1, text2 } => {
            let s1 = arena.add_string(&widget_text(text1));
            let s2 = arena.add_string(&widget_text(text2));
            vec![Field::Ptr(Some(s1)), Field::Ptr(Some(s2))]
        }
        WidgetKind::Scale {
            needle_position,
            needle_width,
            needle_height,
        } => {
            let position = match needle_position {
                NeedlePosition::Left => SCALE_NEEDLE_POSITION_LEFT,
                NeedlePosition::Right => SCALE_NEEDLE_POSITION_RIGHT,
                NeedlePosition::Top => SCALE_NEEDLE_POSITION_TOP,
                NeedlePosition::Bottom => SCALE_NEEDLE_POSITION_BOTTOM,
            };
            vec![
                Field::UInt8(position),
                Field::UInt8(*needle_width),
                Field::UInt8(*needle_height),
            ]
        }
        WidgetKind::BarGraph {
            orientation,
            text_style,
            line1_data,
            line1_style,
            line2_data,
            line2_style,
        } => {
            let orientation = match orientation {
                BarGraphOrientation::LeftRight => BAR_GRAPH_ORIENTATION_LEFT_RIGHT,
                BarGraphOrientation::RightLeft => BAR_GRAPH_ORIENTATION_RIGHT_LEFT,
                BarGraphOrientation::TopBottom => BAR_GRAPH_ORIENTATION_TOP_BOTTOM,
                BarGraphOrientation::BottomTop => BAR_GRAPH_ORIENTATION_BOTTOM_TOP,
            };
            vec![
                Field::UInt8(orientation),
                Field::UInt16(ctx.style_index(owner, text_style.as_deref())),
                Field::UInt16(ctx.data_item_index(owner, line1_data.as_deref())),
                Field::UInt16(ctx.style_index(owner, line1_style.as_deref())),
                Field::UInt16(ctx.data_item_index(owner, line2_data.as_deref())),
                Field::UInt16(ctx.style_index(owner, line2_style.as_deref())),
            ]
        }
        WidgetKind::YTGraph {
            y1_style,
            y2_data,
            y2_style,
        } => vec![
            Field::UInt16(ctx.style_index(owner, y1_style.as_deref())),
            Field::UInt16(ctx.data_item_index(owner, y2_data.as_deref())),
            Field::UInt16(ctx.style_index(owner, y2_style.as_deref())),
        ],
        WidgetKind::UpDown {
            buttons_style,
            down_button_text,
            up_button_text,
        } => {
            let buttons_style = ctx.style_index(owner, buttons_style.as_deref());
            let down = match down_button_text {
                Some(text) => widget_text(text),
                None => "<".to_string(),
            };
            let up = match up_button_text {
                Some(text) => widget_text(text),
                None => ">".to_string(),
            };
            let down = arena.add_string(&down);
            let up = arena.add_string(&up);
            vec![
                Field::UInt16(buttons_style),
                Field::Ptr(Some(down)),
                Field::Ptr(Some(up)),
            ]
        }
        WidgetKind::ListGraph {
            dwell_data,
            y1_data,
            y1_style,
            y2_data,
            y2_style,
            cursor_data,
            cursor_style,
        } => vec![
            Field::UInt16(ctx.data_item_index(owner, dwell_data.as_deref())),
            Field::UInt16(ctx.data_item_index(owner, y1_data.as_deref())),
            Field::UInt16(ctx.style_index(owner, y1_style.as_deref())),
            Field::UInt16(ctx.data_item_index(owner, y2_data.as_deref())),
            Field::UInt16(ctx.style_index(owner, y2_style.as_deref())),
            Field::UInt16(ctx.data_item_index(owner, cursor_data.as_deref())),
            Field::UInt16(ctx.style_index(owner, cursor_style.as_deref())),
        ],
        WidgetKind::LayoutView { layout, context } => vec![
            Field::UInt16(ctx.custom_widget_index(owner, layout.as_deref())),
            Field::UInt16(ctx.data_item_index(owner, context.as_deref())),
        ],
        WidgetKind::AppView => return None,
    };

    Some(arena.add_struct(fields))
}

fn build_item_widget(
    ctx: &mut BuildContext,
    arena: &mut Arena,
    item: Option<&Widget>,
    owner: &str,
    kind: &str,
) -> Option<ObjectId> {
    match item {
        Some(item) => Some(build_widget(ctx, arena, item, owner)),
        None => {
            ctx.diags
                .error(format!("{kind} item widget is missing"), Some(owner));
            None
        }
    }
}

/// Number of Select branches the bound data item implies, when determinable.
fn select_expected_children(ctx: &BuildContext, widget: &Widget) -> Option<usize> {
    let item = ctx.project.find_data_item(widget.data.as_deref()?)?;
    match item.data_type.as_str() {
        "enum" => Some(item.enum_items.len()),
        "boolean" => Some(2),
        _ => None,
    }
}

/// Widget text is authored with JSON string escapes ("°" and friends);
/// text that fails to unescape is emitted verbatim.
pub fn widget_text(text: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{text}\"")).unwrap_or_else(|_| text.to_string())
}
