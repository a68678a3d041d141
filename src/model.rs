//! Read-only project object model consumed by the build pipeline.
//!
//! The surrounding editor owns and mutates these objects; the build sees a
//! snapshot. Every named asset carries an optional `used_in` list naming the
//! build configurations it participates in (empty = all).

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub data_items: Vec<DataItem>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub styles: Vec<Style>,
    #[serde(default)]
    pub fonts: Vec<Font>,
    #[serde(default)]
    pub bitmaps: Vec<Bitmap>,
    #[serde(default)]
    pub configurations: Vec<BuildConfiguration>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildConfiguration {
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataItem {
    pub name: String,
    /// "integer", "float", "boolean", "enum", "string", "array", ...
    #[serde(default)]
    pub data_type: String,
    /// Value labels for "enum" typed items.
    #[serde(default)]
    pub enum_items: Vec<String>,
    /// Designer-supplied preview value, used by the transparency analyzer to
    /// pick Select branches and List repeat counts.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub value: serde_json::Value,
    #[serde(default)]
    pub used_in: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub used_in: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Style {
    pub name: String,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default)]
    pub align_horizontal: HorzAlign,
    #[serde(default)]
    pub align_vertical: VertAlign,
    #[serde(default)]
    pub blink: bool,
    /// RGB565 colors, raw as the firmware consumes them.
    #[serde(default)]
    pub background_color: u16,
    #[serde(default)]
    pub color: u16,
    #[serde(default)]
    pub border_color: u16,
    #[serde(default)]
    pub border_size: Edges,
    #[serde(default)]
    pub border_radius: u16,
    #[serde(default = "default_opacity")]
    pub opacity: u8,
    #[serde(default)]
    pub padding: Edges,
    #[serde(default)]
    pub margin: Edges,
    /// Styles marked always-build are emitted even if no widget references them.
    #[serde(default)]
    pub always_build: bool,
}

fn default_opacity() -> u8 {
    255
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorzAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VertAlign {
    Top,
    #[default]
    Center,
    Bottom,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Edges {
    #[serde(default)]
    pub top: u8,
    #[serde(default)]
    pub right: u8,
    #[serde(default)]
    pub bottom: u8,
    #[serde(default)]
    pub left: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Font {
    pub name: String,
    pub ascent: u8,
    pub descent: u8,
    /// 1 or 8 bits per pixel.
    pub bpp: u8,
    #[serde(default)]
    pub glyphs: Vec<Glyph>,
    #[serde(default)]
    pub always_build: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Glyph {
    pub encoding: u32,
    /// Advance width.
    pub dx: i8,
    pub width: u8,
    pub height: u8,
    pub x: i8,
    pub y: i8,
    /// Raster rows, packed per the font's bpp. `None` means empty glyph.
    #[serde(default)]
    pub pixels: Option<Vec<u8>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bitmap {
    pub name: String,
    /// Path to the source image, relative to the project root.
    pub source: String,
    /// 16 (RGB565) or 32 (BGRA8888).
    #[serde(default = "default_bitmap_bpp")]
    pub bpp: u8,
    #[serde(default)]
    pub always_build: bool,
}

fn default_bitmap_bpp() -> u8 {
    16
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page {
    pub name: String,
    #[serde(default)]
    pub left: i16,
    #[serde(default)]
    pub top: i16,
    pub width: u16,
    pub height: u16,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(default)]
    pub close_page_if_touched_outside: bool,
    /// Custom-widget pages are emitted in the document's first ObjectList and
    /// referenced from LayoutView widgets instead of being shown standalone.
    #[serde(default)]
    pub used_as_custom_widget: bool,
    #[serde(default)]
    pub used_in: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Widget {
    #[serde(default)]
    pub left: i16,
    #[serde(default)]
    pub top: i16,
    #[serde(default)]
    pub width: u16,
    #[serde(default)]
    pub height: u16,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub active_style: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(flatten)]
    pub kind: WidgetKind,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WidgetKind {
    Container {
        #[serde(default)]
        widgets: Vec<Widget>,
        #[serde(default)]
        overlay: Option<String>,
    },
    List {
        #[serde(default)]
        list_type: ListDirection,
        #[serde(default)]
        item_widget: Option<Box<Widget>>,
        #[serde(default)]
        gap: u8,
    },
    Grid {
        #[serde(default)]
        grid_flow: GridFlow,
        #[serde(default)]
        item_widget: Option<Box<Widget>>,
    },
    Select {
        #[serde(default)]
        widgets: Vec<Widget>,
    },
    DisplayData {
        #[serde(default)]
        focus_style: Option<String>,
        #[serde(default)]
        display_option: u8,
    },
    Text {
        #[serde(default)]
        text: String,
        #[serde(default)]
        ignore_luminosity: bool,
    },
    MultilineText {
        #[serde(default)]
        text: String,
        #[serde(default)]
        first_line_indent: i16,
        #[serde(default)]
        hanging_indent: i16,
    },
    Rectangle {
        #[serde(default)]
        invert_colors: bool,
        #[serde(default)]
        ignore_luminosity: bool,
    },
    Bitmap {
        #[serde(default)]
        bitmap: Option<String>,
    },
    Button {
        #[serde(default)]
        text: String,
        #[serde(default)]
        enabled: Option<String>,
        #[serde(default)]
        disabled_style: Option<String>,
    },
    ToggleButton {
        #[serde(default)]
        text1: String,
        #[serde(default)]
        text2: String,
    },
    Scale {
        #[serde(default)]
        needle_position: NeedlePosition,
        #[serde(default)]
        needle_width: u8,
        #[serde(default)]
        needle_height: u8,
    },
    BarGraph {
        #[serde(default)]
        orientation: BarGraphOrientation,
        #[serde(default)]
        text_style: Option<String>,
        #[serde(default)]
        line1_data: Option<String>,
        #[serde(default)]
        line1_style: Option<String>,
        #[serde(default)]
        line2_data: Option<String>,
        #[serde(default)]
        line2_style: Option<String>,
    },
    YTGraph {
        #[serde(default)]
        y1_style: Option<String>,
        #[serde(default)]
        y2_data: Option<String>,
        #[serde(default)]
        y2_style: Option<String>,
    },
    UpDown {
        #[serde(default)]
        buttons_style: Option<String>,
        #[serde(default)]
        down_button_text: Option<String>,
        #[serde(default)]
        up_button_text: Option<String>,
    },
    ListGraph {
        #[serde(default)]
        dwell_data: Option<String>,
        #[serde(default)]
        y1_data: Option<String>,
        #[serde(default)]
        y1_style: Option<String>,
        #[serde(default)]
        y2_data: Option<String>,
        #[serde(default)]
        y2_style: Option<String>,
        #[serde(default)]
        cursor_data: Option<String>,
        #[serde(default)]
        cursor_style: Option<String>,
    },
    LayoutView {
        #[serde(default)]
        layout: Option<String>,
        #[serde(default)]
        context: Option<String>,
    },
    AppView,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListDirection {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridFlow {
    #[default]
    Row,
    Column,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeedlePosition {
    Left,
    Right,
    Top,
    #[default]
    Bottom,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BarGraphOrientation {
    LeftRight,
    RightLeft,
    TopBottom,
    #[default]
    BottomTop,
}

impl Project {
    pub fn find_style(&self, name: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.name == name)
    }

    pub fn find_font(&self, name: &str) -> Option<&Font> {
        self.fonts.iter().find(|f| f.name == name)
    }

    pub fn find_bitmap(&self, name: &str) -> Option<&Bitmap> {
        self.bitmaps.iter().find(|b| b.name == name)
    }

    pub fn find_data_item(&self, name: &str) -> Option<&DataItem> {
        self.data_items.iter().find(|d| d.name == name)
    }
}

/// `used_in` filter shared by data items, actions and pages: an object with an
/// empty list belongs to every configuration.
pub fn used_in_configuration(used_in: &[String], config: Option<&BuildConfiguration>) -> bool {
    match config {
        None => true,
        Some(config) => used_in.is_empty() || used_in.iter().any(|n| n == &config.name),
    }
}
