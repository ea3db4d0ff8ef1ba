use anyhow::{Context, Result};
use clap::{value_parser, Arg, Command};
use std::path::PathBuf;
use std::sync::Arc;

use ui_text::assets::FontSource;
use ui_text::config::Config;
use ui_text::foundation::logging;
use ui_text::render::backends::HeadlessGpu;
use ui_text::render::systems::text::{
    CharacterRange, FontDefinition, FontResourceCache, FontdueRasterizer, GlyphRasterizer, TextConfig,
};

#[derive(Debug)]
struct DumpConfig {
    font_path: PathBuf,
    output: PathBuf,
    size_in_points: f32,
    range: CharacterRange,
    text: TextConfig,
}

fn main() -> Result<()> {
    logging::init();

    let matches = Command::new("atlas_dump")
        .about("Rasterizes a font into a glyph atlas PNG and reports packing statistics")
        .arg(
            Arg::new("font")
                .value_name("FONT")
                .help("TrueType/OpenType font file")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("PNG file to write")
                .default_value("atlas.png"),
        )
        .arg(
            Arg::new("size")
                .short('s')
                .long("size")
                .value_name("POINTS")
                .help("Font size in points (rasterized 1:1 as pixels)")
                .value_parser(value_parser!(f32))
                .default_value("16"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Text config (.toml or .ron) providing atlas size and padding"),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .value_name("PIXELS")
                .help("Atlas width, overrides the config")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .value_name("PIXELS")
                .help("Atlas height, overrides the config")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("range")
                .short('r')
                .long("range")
                .value_name("FIRST-LAST")
                .help("Character range such as A-Z (defaults to printable ASCII)"),
        )
        .get_matches();

    let mut text = match matches.get_one::<String>("config") {
        Some(path) => TextConfig::load_from_file(path).with_context(|| format!("Failed to load config {}", path))?,
        None => TextConfig::default(),
    };
    if let Some(width) = matches.get_one::<u32>("width") {
        text.atlas_width = *width;
    }
    if let Some(height) = matches.get_one::<u32>("height") {
        text.atlas_height = *height;
    }

    let range = match matches.get_one::<String>("range") {
        Some(range) => parse_range(range)?,
        None => CharacterRange::AsciiPrintable,
    };

    let config = DumpConfig {
        font_path: PathBuf::from(matches.get_one::<String>("font").context("FONT is required")?),
        output: PathBuf::from(matches.get_one::<String>("output").context("missing --output")?),
        size_in_points: *matches.get_one::<f32>("size").context("missing --size")?,
        range,
        text,
    };

    dump_atlas(&config)
}

fn parse_range(text: &str) -> Result<CharacterRange> {
    let mut chars = text.chars();
    let (Some(first), Some('-'), Some(last), None) = (chars.next(), chars.next(), chars.next(), chars.next()) else {
        anyhow::bail!("Range must look like A-Z, got '{}'", text);
    };
    let range = CharacterRange::Span { first, last };
    range.validate()?;
    Ok(range)
}

fn dump_atlas(config: &DumpConfig) -> Result<()> {
    let source = FontSource::file(&config.font_path);
    let definition = FontDefinition::with_range(source.clone(), config.size_in_points, config.range)?;

    println!("Font:   {}", definition.key());
    println!("Atlas:  {}x{} (padding {})", config.text.atlas_width, config.text.atlas_height, config.text.glyph_padding);

    // Pack once directly to get at the pixels
    let font_data = source.load_font_data()?;
    let rasterized = FontdueRasterizer::new().rasterize_font(&font_data, config.size_in_points, config.range)?;
    let atlas = config.text.packer().pack(&rasterized.glyphs)?;
    atlas
        .save_png(&config.output)
        .with_context(|| format!("Failed to write {}", config.output.display()))?;

    let blank = rasterized.glyphs.iter().filter(|g| g.is_blank()).count();
    let covered: usize = rasterized.glyphs.iter().map(|g| g.width * g.height).sum();
    let total = atlas.pixels.len().max(1);
    println!("Glyphs: {} ({} blank)", rasterized.glyphs.len(), blank);
    println!("Usage:  {:.1}% of atlas pixels covered", covered as f64 * 100.0 / total as f64);
    println!(
        "Metrics: ascender {:.1}, descender {:.1}, line height {:.1}",
        rasterized.metrics.ascender, rasterized.metrics.descender, rasterized.metrics.line_height
    );

    // Run the same definition through the cache to check the GPU-facing side
    let gpu = Arc::new(HeadlessGpu::new());
    let cache = FontResourceCache::new(gpu.clone(), &config.text);
    let resource = cache.get_or_create(&definition)?;
    println!(
        "Geometry: {} vertices in shared buffer '{}'",
        resource.shared_geometry().vertex_count,
        resource.name()
    );
    cache.release(&resource);
    log::debug!("Live textures after release: {}", gpu.texture_count());

    println!("Wrote {}", config.output.display());
    Ok(())
}
