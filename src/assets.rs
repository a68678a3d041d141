//! Asset index tables and reference discovery.
//!
//! Every named asset the firmware can reference gets a stable 1-based index;
//! index 0 always means "none". Data items, actions and pages are indexed in
//! project order (filtered by the active build configuration). Styles, fonts
//! and bitmaps are indexed in discovery order: only assets actually reachable
//! from an included page (or marked always-build) are emitted.
//!
//! Discovery runs to a fixpoint with an explicit work queue: registering a
//! style enqueues it, and draining the queue registers the style's font. New
//! reference chains (e.g. a future style-in-style) extend the same queue.

use crate::diag::Diagnostics;
use crate::model::{
    BuildConfiguration, Page, Project, Widget, WidgetKind, used_in_configuration,
};

/// One category of 1-based asset indices.
#[derive(Debug, Default)]
pub struct NameTable {
    names: Vec<String>,
}

impl NameTable {
    /// Registers `name`, returning whether it was newly added.
    pub fn register(&mut self, name: &str) -> bool {
        if self.names.iter().any(|n| n == name) {
            false
        } else {
            self.names.push(name.to_string());
            true
        }
    }

    /// 1-based index of `name`, or `None` when not registered.
    pub fn get(&self, name: &str) -> Option<u16> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| (i + 1) as u16)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// All index tables for one build invocation.
#[derive(Debug, Default)]
pub struct AssetTable {
    pub data_items: NameTable,
    pub actions: NameTable,
    pub pages: NameTable,
    /// Subset of pages referenced through LayoutView widgets.
    pub custom_widgets: NameTable,
    pub styles: NameTable,
    pub fonts: NameTable,
    pub bitmaps: NameTable,
}

/// Everything one build invocation reads and writes while serializing.
pub struct BuildContext<'a> {
    pub project: &'a Project,
    pub config: Option<&'a BuildConfiguration>,
    pub assets: AssetTable,
    pub diags: &'a mut Diagnostics,
    style_queue: Vec<String>,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        project: &'a Project,
        config: Option<&'a BuildConfiguration>,
        diags: &'a mut Diagnostics,
    ) -> Self {
        Self {
            project,
            config,
            assets: AssetTable::default(),
            diags,
            style_queue: Vec::new(),
        }
    }

    /// Pages participating in the active configuration, in project order.
    pub fn included_pages(&self) -> impl Iterator<Item = &'a Page> {
        let config = self.config;
        self.project
            .pages
            .iter()
            .filter(move |p| used_in_configuration(&p.used_in, config))
    }

    /// Walks the project once and registers every reachable asset, then
    /// drains the style queue until no new registrations appear.
    pub fn discover(&mut self) {
        for item in &self.project.data_items {
            if used_in_configuration(&item.used_in, self.config) {
                self.assets.data_items.register(&item.name);
            }
        }
        for action in &self.project.actions {
            if used_in_configuration(&action.used_in, self.config) {
                self.assets.actions.register(&action.name);
            }
        }

        let pages: Vec<&Page> = self.included_pages().collect();
        for page in &pages {
            if page.used_as_custom_widget {
                self.assets.custom_widgets.register(&page.name);
            } else {
                self.assets.pages.register(&page.name);
            }
        }

        // Widgets without an explicit style fall back to a style named
        // "default" when the project has one.
        self.register_style("default");

        for style in &self.project.styles {
            if style.always_build {
                self.register_style(&style.name);
            }
        }
        for font in &self.project.fonts {
            if font.always_build {
                self.assets.fonts.register(&font.name);
            }
        }
        for bitmap in &self.project.bitmaps {
            if bitmap.always_build {
                self.assets.bitmaps.register(&bitmap.name);
            }
        }

        for page in pages {
            if let Some(style) = &page.style {
                self.register_style(style);
            }
            for widget in &page.widgets {
                self.discover_widget(widget);
            }
        }

        while let Some(style_name) = self.style_queue.pop() {
            if let Some(style) = self.project.find_style(&style_name) {
                if let Some(font) = &style.font {
                    if self.project.find_font(font).is_some() {
                        self.assets.fonts.register(font);
                    }
                }
            }
        }
    }

    /// Registers a style reference; only styles that exist in the project
    /// enter the table (missing names are diagnosed at serialization time).
    fn register_style(&mut self, name: &str) {
        if self.project.find_style(name).is_some() && self.assets.styles.register(name) {
            self.style_queue.push(name.to_string());
        }
    }

    fn register_bitmap(&mut self, name: &str) {
        if self.project.find_bitmap(name).is_some() {
            self.assets.bitmaps.register(name);
        }
    }

    fn discover_widget(&mut self, widget: &Widget) {
        if let Some(style) = &widget.style {
            self.register_style(style);
        }
        if let Some(style) = &widget.active_style {
            self.register_style(style);
        }

        match &widget.kind {
            WidgetKind::Container { widgets, .. } | WidgetKind::Select { widgets } => {
                for child in widgets {
                    self.discover_widget(child);
                }
            }
            WidgetKind::List { item_widget, .. } | WidgetKind::Grid { item_widget, .. } => {
                if let Some(item) = item_widget {
                    self.discover_widget(item);
                }
            }
            WidgetKind::DisplayData { focus_style, .. } => {
                self.register_style_ref(focus_style);
            }
            WidgetKind::Bitmap { bitmap } => {
                if let Some(name) = bitmap {
                    self.register_bitmap(name);
                }
            }
            WidgetKind::Button { disabled_style, .. } => {
                self.register_style_ref(disabled_style);
            }
            WidgetKind::BarGraph {
                text_style,
                line1_style,
                line2_style,
                ..
            } => {
                self.register_style_ref(text_style);
                self.register_style_ref(line1_style);
                self.register_style_ref(line2_style);
            }
            WidgetKind::YTGraph {
                y1_style, y2_style, ..
            } => {
                self.register_style_ref(y1_style);
                self.register_style_ref(y2_style);
            }
            WidgetKind::UpDown { buttons_style, .. } => {
                self.register_style_ref(buttons_style);
            }
            WidgetKind::ListGraph {
                y1_style,
                y2_style,
                cursor_style,
                ..
            } => {
                self.register_style_ref(y1_style);
                self.register_style_ref(y2_style);
                self.register_style_ref(cursor_style);
            }
            WidgetKind::LayoutView { layout, .. } => {
                if let Some(name) = layout {
                    if self
                        .project
                        .pages
                        .iter()
                        .any(|p| p.used_as_custom_widget && p.name == *name)
                    {
                        self.assets.custom_widgets.register(name);
                    }
                }
            }
            WidgetKind::Text { .. }
            | WidgetKind::MultilineText { .. }
            | WidgetKind::Rectangle { .. }
            | WidgetKind::ToggleButton { .. }
            | WidgetKind::Scale { .. }
            | WidgetKind::AppView => {}
        }
    }

    fn register_style_ref(&mut self, name: &Option<String>) {
        if let Some(name) = name {
            self.register_style(name);
        }
    }

    /// INFO diagnostics for assets the build left out.
    pub fn report_unused(&mut self) {
        for style in &self.project.styles {
            if !self.assets.styles.contains(&style.name) {
                self.diags
                    .info(format!("unused style: {}", style.name), Some(&style.name));
            }
        }
        for font in &self.project.fonts {
            if !self.assets.fonts.contains(&font.name) {
                self.diags
                    .info(format!("unused font: {}", font.name), Some(&font.name));
            }
        }
        for bitmap in &self.project.bitmaps {
            if !self.assets.bitmaps.contains(&bitmap.name) {
                self.diags.info(
                    format!("unused bitmap: {}", bitmap.name),
                    Some(&bitmap.name),
                );
            }
        }
    }

    // Serialization-time resolvers. `None` is a legitimate "no asset" and
    // resolves to 0 silently; a named asset that cannot be found is an ERROR
    // that also resolves to 0, so one bad reference never aborts the build.

    pub fn style_index(&mut self, object: &str, name: Option<&str>) -> u16 {
        self.resolve(object, name, "style", |t| &t.styles)
    }

    pub fn font_index(&mut self, object: &str, name: Option<&str>) -> u16 {
        self.resolve(object, name, "font", |t| &t.fonts)
    }

    pub fn bitmap_index(&mut self, object: &str, name: Option<&str>) -> u16 {
        self.resolve(object, name, "bitmap", |t| &t.bitmaps)
    }

    pub fn data_item_index(&mut self, object: &str, name: Option<&str>) -> u16 {
        self.resolve(object, name, "data item", |t| &t.data_items)
    }

    pub fn action_index(&mut self, object: &str, name: Option<&str>) -> u16 {
        self.resolve(object, name, "action", |t| &t.actions)
    }

    pub fn page_index(&mut self, object: &str, name: Option<&str>) -> u16 {
        self.resolve(object, name, "page", |t| &t.pages)
    }

    pub fn custom_widget_index(&mut self, object: &str, name: Option<&str>) -> u16 {
        self.resolve(object, name, "custom widget", |t| &t.custom_widgets)
    }

    /// Fallback style for objects without an explicit one; 0 when the project
    /// has no style named "default".
    pub fn default_style_index(&self) -> u16 {
        self.assets.styles.get("default").unwrap_or(0)
    }

    fn resolve(
        &mut self,
        object: &str,
        name: Option<&str>,
        category: &str,
        table: impl Fn(&AssetTable) -> &NameTable,
    ) -> u16 {
        let Some(name) = name else {
            return 0;
        };
        match table(&self.assets).get(name) {
            Some(index) => index,
            None => {
                self.diags
                    .error(format!("{category} not found: {name}"), Some(object));
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Severity;
    use crate::model::{Action, Bitmap, DataItem, Font, Style};

    fn style(name: &str, font: Option<&str>) -> Style {
        serde_json::from_value(serde_json::json!({ "name": name, "font": font })).unwrap()
    }

    fn project_with_page(widgets: Vec<Widget>) -> Project {
        let mut project = Project::default();
        project.pages.push(Page {
            name: "main".to_string(),
            left: 0,
            top: 0,
            width: 100,
            height: 100,
            style: Some("page".to_string()),
            widgets,
            close_page_if_touched_outside: false,
            used_as_custom_widget: false,
            used_in: vec![],
        });
        project
    }

    fn text_widget(style: &str) -> Widget {
        Widget {
            left: 0,
            top: 0,
            width: 10,
            height: 10,
            style: Some(style.to_string()),
            active_style: None,
            data: None,
            action: None,
            kind: WidgetKind::Text {
                text: "x".to_string(),
                ignore_luminosity: false,
            },
        }
    }

    #[test]
    fn style_reference_pulls_in_its_font() {
        let mut project = project_with_page(vec![text_widget("header")]);
        project.styles.push(style("page", None));
        project.styles.push(style("header", Some("main_font")));
        project.styles.push(style("orphan", Some("orphan_font")));
        project.fonts.push(Font {
            name: "main_font".to_string(),
            ascent: 10,
            descent: 2,
            bpp: 8,
            glyphs: vec![],
            always_build: false,
        });
        project.fonts.push(Font {
            name: "orphan_font".to_string(),
            ascent: 10,
            descent: 2,
            bpp: 8,
            glyphs: vec![],
            always_build: false,
        });

        let mut diags = Diagnostics::new();
        let mut ctx = BuildContext::new(&project, None, &mut diags);
        ctx.discover();

        assert_eq!(ctx.assets.styles.get("header"), Some(2));
        assert_eq!(ctx.assets.fonts.get("main_font"), Some(1));
        assert!(ctx.assets.fonts.get("orphan_font").is_none());
        assert!(ctx.assets.styles.get("orphan").is_none());

        ctx.report_unused();
        assert_eq!(diags.count(Severity::Info), 2); // orphan style + orphan font
    }

    #[test]
    fn indices_are_one_based_and_zero_means_none() {
        let mut project = project_with_page(vec![]);
        project.data_items.push(DataItem {
            name: "volts".to_string(),
            data_type: "float".to_string(),
            enum_items: vec![],
            value: serde_json::Value::Null,
            used_in: vec![],
        });
        project.actions.push(Action {
            name: "reset".to_string(),
            used_in: vec![],
        });

        let mut diags = Diagnostics::new();
        let mut ctx = BuildContext::new(&project, None, &mut diags);
        ctx.discover();

        assert_eq!(ctx.data_item_index("w", Some("volts")), 1);
        assert_eq!(ctx.action_index("w", Some("reset")), 1);
        assert_eq!(ctx.page_index("w", Some("main")), 1);
        assert_eq!(ctx.style_index("w", None), 0);
        assert!(!diags.has_errors());
    }

    #[test]
    fn unresolved_reference_resolves_to_zero_with_error() {
        let project = project_with_page(vec![]);
        let mut diags = Diagnostics::new();
        let mut ctx = BuildContext::new(&project, None, &mut diags);
        ctx.discover();

        assert_eq!(ctx.style_index("widget 3", Some("missing")), 0);
        assert!(diags.has_errors());
        assert_eq!(diags.entries()[0].message, "style not found: missing");
        assert_eq!(diags.entries()[0].object.as_deref(), Some("widget 3"));
    }

    #[test]
    fn configuration_filters_pages_and_data_items() {
        let mut project = project_with_page(vec![]);
        project.pages[0].used_in = vec!["release".to_string()];
        project.data_items.push(DataItem {
            name: "debug_only".to_string(),
            data_type: "integer".to_string(),
            enum_items: vec![],
            value: serde_json::Value::Null,
            used_in: vec!["debug".to_string()],
        });
        project.configurations.push(BuildConfiguration {
            name: "release".to_string(),
        });

        let mut diags = Diagnostics::new();
        let config = project.configurations[0].clone();
        let mut ctx = BuildContext::new(&project, Some(&config), &mut diags);
        ctx.discover();

        assert_eq!(ctx.assets.pages.get("main"), Some(1));
        assert!(ctx.assets.data_items.get("debug_only").is_none());
    }

    #[test]
    fn always_build_assets_are_registered_without_references() {
        let mut project = project_with_page(vec![]);
        project.bitmaps.push(Bitmap {
            name: "logo".to_string(),
            source: "logo.png".to_string(),
            bpp: 16,
            always_build: true,
        });

        let mut diags = Diagnostics::new();
        let mut ctx = BuildContext::new(&project, None, &mut diags);
        ctx.discover();
        assert_eq!(ctx.assets.bitmaps.get("logo"), Some(1));
    }
}
