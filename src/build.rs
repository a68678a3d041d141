//! Build entry point: assembles the four firmware regions, compresses the
//! combined image and renders the generated C source sections.

use std::collections::BTreeMap;
use std::path::Path;

use crate::assets::BuildContext;
use crate::bitmap::load_bitmap;
use crate::diag::Diagnostics;
use crate::error::BuildResult;
use crate::field::{Arena, Field};
use crate::font::font_data;
use crate::guard::{detect_mega_bootloader_hazard, fix_data_for_mega_bootloader};
use crate::linker::link_and_pack;
use crate::model::{BuildConfiguration, Project, Style};
use crate::naming::{IdentCase, dump_bytes, ident};
use crate::regions::pack_regions;
use crate::widgets::build_document;

const STYLE_FLAGS_HORZ_ALIGN_LEFT: u16 = 0 << 1;
const STYLE_FLAGS_HORZ_ALIGN_RIGHT: u16 = 1 << 1;
const STYLE_FLAGS_HORZ_ALIGN_CENTER: u16 = 2 << 1;
const STYLE_FLAGS_VERT_ALIGN_TOP: u16 = 0 << 3;
const STYLE_FLAGS_VERT_ALIGN_BOTTOM: u16 = 1 << 3;
const STYLE_FLAGS_VERT_ALIGN_CENTER: u16 = 2 << 3;
const STYLE_FLAGS_BLINK: u16 = 1 << 5;

/// Output sections a build can produce. The assets image is emitted both raw
/// and LZ4-compressed; firmware with enough flash links the raw form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum Section {
    DataEnum,
    ActionsEnum,
    PagesEnum,
    StylesEnum,
    FontsEnum,
    BitmapsEnum,
    AssetsDecl,
    AssetsDef,
    AssetsDeclCompressed,
    AssetsDefCompressed,
}

impl Section {
    pub const ALL: [Section; 10] = [
        Section::DataEnum,
        Section::ActionsEnum,
        Section::PagesEnum,
        Section::StylesEnum,
        Section::FontsEnum,
        Section::BitmapsEnum,
        Section::AssetsDecl,
        Section::AssetsDef,
        Section::AssetsDeclCompressed,
        Section::AssetsDefCompressed,
    ];
}

/// One emitted section: generated C source, plus the raw payload for the
/// sections that carry one.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub source: String,
    pub binary: Option<Vec<u8>>,
}

impl Artifact {
    fn source(source: String) -> Self {
        Self {
            source,
            binary: None,
        }
    }
}

/// Builds the requested sections (all of them when `requested` is `None`).
///
/// Bitmap sources are resolved against `project_dir`. Unresolved references
/// and fixable encoding hazards are reported through `diags` and never abort
/// the build; only I/O and image decode failures do.
#[tracing::instrument(skip_all, fields(config = config.map(|c| c.name.as_str())))]
pub fn build(
    project: &Project,
    project_dir: &Path,
    requested: Option<&[Section]>,
    config: Option<&BuildConfiguration>,
    diags: &mut Diagnostics,
) -> BuildResult<BTreeMap<Section, Artifact>> {
    let mut ctx = BuildContext::new(project, config, diags);
    ctx.discover();

    let document = build_document(&mut ctx);
    detect_mega_bootloader_hazard(&document, "document", ctx.diags);

    let styles = build_styles_data(&mut ctx);
    detect_mega_bootloader_hazard(&styles, "styles", ctx.diags);

    let fonts = build_fonts_data(&mut ctx);
    let bitmaps = build_bitmaps_data(&mut ctx, project_dir)?;

    let assets = pack_regions(&[document, styles, fonts, bitmaps]);
    let compressed = lz4_flex::block::compress_prepend_size(&assets);

    ctx.diags
        .info(format!("Uncompressed size: {}", assets.len()), None);
    ctx.diags
        .info(format!("Compressed size: {}", compressed.len() - 4), None);
    tracing::debug!(
        uncompressed = assets.len(),
        compressed = compressed.len() - 4,
        "assets image packed"
    );

    ctx.report_unused();

    let tables = ctx.assets;
    let mut artifacts = BTreeMap::new();
    for &section in requested.unwrap_or(&Section::ALL) {
        let artifact = match section {
            Section::DataEnum => {
                Artifact::source(build_enum("DataEnum", "DATA_ID_", tables.data_items.names()))
            }
            Section::ActionsEnum => Artifact::source(build_enum(
                "ActionsEnum",
                "ACTION_ID_",
                tables.actions.names(),
            )),
            Section::PagesEnum => {
                Artifact::source(build_enum("PagesEnum", "PAGE_ID_", tables.pages.names()))
            }
            Section::StylesEnum => {
                Artifact::source(build_enum("StylesEnum", "STYLE_ID_", tables.styles.names()))
            }
            Section::FontsEnum => {
                Artifact::source(build_enum("FontsEnum", "FONT_ID_", tables.fonts.names()))
            }
            Section::BitmapsEnum => Artifact::source(build_enum(
                "BitmapsEnum",
                "BITMAP_ID_",
                tables.bitmaps.names(),
            )),
            Section::AssetsDecl => Artifact::source(assets_decl(&assets)),
            Section::AssetsDef => Artifact {
                source: assets_def(&assets),
                binary: Some(assets.clone()),
            },
            Section::AssetsDeclCompressed => Artifact::source(assets_decl(&compressed)),
            Section::AssetsDefCompressed => Artifact {
                source: assets_def(&compressed),
                binary: Some(compressed.clone()),
            },
        };
        artifacts.insert(section, artifact);
    }

    Ok(artifacts)
}

/// Styles region: one object list of fixed-size style records.
fn build_styles_data(ctx: &mut BuildContext) -> Vec<u8> {
    let mut arena = Arena::new();

    let names: Vec<String> = ctx.assets.styles.names().to_vec();
    let records: Vec<_> = names
        .iter()
        .filter_map(|name| ctx.project.find_style(name).cloned())
        .collect();

    let items: Vec<_> = records
        .iter()
        .map(|style| {
            let fields = style_fields(ctx, style);
            arena.add_struct(fields)
        })
        .collect();

    let root = arena.add_struct(vec![Field::List(items)]);
    link_and_pack(&mut arena, root)
}

fn style_fields(ctx: &mut BuildContext, style: &Style) -> Vec<Field> {
    use crate::model::{HorzAlign, VertAlign};

    let mut flags = match style.align_horizontal {
        HorzAlign::Left => STYLE_FLAGS_HORZ_ALIGN_LEFT,
        HorzAlign::Right => STYLE_FLAGS_HORZ_ALIGN_RIGHT,
        HorzAlign::Center => STYLE_FLAGS_HORZ_ALIGN_CENTER,
    };
    flags |= match style.align_vertical {
        VertAlign::Top => STYLE_FLAGS_VERT_ALIGN_TOP,
        VertAlign::Bottom => STYLE_FLAGS_VERT_ALIGN_BOTTOM,
        VertAlign::Center => STYLE_FLAGS_VERT_ALIGN_CENTER,
    };
    if style.blink {
        flags |= STYLE_FLAGS_BLINK;
    }

    let font = ctx.font_index(&style.name, style.font.as_deref());

    vec![
        Field::UInt16(flags),
        Field::UInt16(style.background_color),
        Field::UInt16(style.color),
        Field::UInt8(style.border_size.top),
        Field::UInt8(style.border_size.right),
        Field::UInt8(style.border_size.bottom),
        Field::UInt8(style.border_size.left),
        Field::UInt16(style.border_radius),
        Field::UInt16(style.border_color),
        Field::UInt8(font as u8),
        Field::UInt8(style.opacity),
        Field::UInt8(style.padding.top),
        Field::UInt8(style.padding.right),
        Field::UInt8(style.padding.bottom),
        Field::UInt8(style.padding.left),
        Field::UInt8(style.margin.top),
        Field::UInt8(style.margin.right),
        Field::UInt8(style.margin.bottom),
        Field::UInt8(style.margin.left),
    ]
}

/// Fonts region: per-font blobs behind an offset header. Each blob is hazard
/// filtered before concatenation so padding cannot mask a run.
fn build_fonts_data(ctx: &mut BuildContext) -> Vec<u8> {
    let names: Vec<String> = ctx.assets.fonts.names().to_vec();
    let blobs: Vec<Vec<u8>> = names
        .iter()
        .filter_map(|name| ctx.project.find_font(name).cloned())
        .map(|font| {
            let data = font_data(&font);
            fix_data_for_mega_bootloader(&data, &font.name, ctx.diags)
        })
        .collect();

    if blobs.is_empty() {
        return Vec::new();
    }
    pack_regions(&blobs)
}

/// Bitmaps region: per-bitmap records behind an offset header.
fn build_bitmaps_data(ctx: &mut BuildContext, project_dir: &Path) -> BuildResult<Vec<u8>> {
    let names: Vec<String> = ctx.assets.bitmaps.names().to_vec();
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let mut blobs = Vec::with_capacity(names.len());
    for name in &names {
        let Some(bitmap) = ctx.project.find_bitmap(name).cloned() else {
            continue;
        };
        let data = load_bitmap(&bitmap, project_dir)?;

        let mut arena = Arena::new();
        let record = arena.add_struct(vec![
            Field::Int16(data.width as i16),
            Field::Int16(data.height as i16),
            Field::Int16(data.bpp as i16),
            Field::Int16(0),
            Field::Bytes(data.pixels),
        ]);
        arena.finish(record);
        let packed = arena.pack_object(record);

        blobs.push(fix_data_for_mega_bootloader(&packed, &bitmap.name, ctx.diags));
    }

    Ok(pack_regions(&blobs))
}

fn build_enum(enum_name: &str, prefix: &str, names: &[String]) -> String {
    let mut entries = vec![format!("\t{prefix}NONE = 0")];
    entries.extend(names.iter().enumerate().map(|(i, name)| {
        format!("\t{} = {}", ident(prefix, name, IdentCase::UpperSnake), i + 1)
    }));
    format!("enum {enum_name} {{\n{}\n}};", entries.join(",\n"))
}

fn assets_decl(data: &[u8]) -> String {
    format!("extern const uint8_t assets[{}];", data.len())
}

fn assets_def(data: &[u8]) -> String {
    format!(
        "// ASSETS DEFINITION\nconst uint8_t assets[{}] = {{{}}};",
        data.len(),
        dump_bytes(data)
    )
}
