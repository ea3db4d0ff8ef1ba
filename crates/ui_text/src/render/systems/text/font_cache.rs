//! Reference-counted cache of font resources
//!
//! Every text element that uses the same font definition shares one atlas
//! texture and one quad buffer. The cache hands out `Arc<FontResource>`s but
//! GPU lifetime is decided by its own explicit counter: the atlas and the
//! geometry reference are released when the last user calls
//! [`FontResourceCache::release`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::atlas_packer::AtlasPacker;
use super::error::FontResult;
use super::font_definition::{FontDefinition, FontKey};
use super::font_resource::{FontResource, GlyphInfo};
use super::glyph_rasterizer::{FontdueRasterizer, GlyphRasterizer};
use super::shared_geometry::SharedGeometryBuilder;
use super::text_config::TextConfig;
use crate::render::api::{GeometryDefinition, GpuServices, TextureFormat};

struct CacheEntry {
    resource: Arc<FontResource>,
    ref_count: usize,
}

/// Shares font atlases and glyph geometry between text elements
pub struct FontResourceCache {
    services: Arc<dyn GpuServices>,
    rasterizer: Box<dyn GlyphRasterizer>,
    packer: AtlasPacker,
    entries: Mutex<HashMap<FontKey, CacheEntry>>,
}

impl FontResourceCache {
    /// Cache rasterizing with `fontdue`
    pub fn new(services: Arc<dyn GpuServices>, config: &TextConfig) -> Self {
        Self::with_rasterizer(services, FontdueRasterizer::new(), config)
    }

    /// Cache using a custom rasterizer
    pub fn with_rasterizer(
        services: Arc<dyn GpuServices>,
        rasterizer: impl GlyphRasterizer + 'static,
        config: &TextConfig,
    ) -> Self {
        Self {
            services,
            rasterizer: Box::new(rasterizer),
            packer: config.packer(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// GPU services the cache allocates from
    pub fn services(&self) -> &Arc<dyn GpuServices> {
        &self.services
    }

    /// Return the resource for `definition`, building it on first use
    ///
    /// Each successful call takes one reference that must be returned with
    /// [`FontResourceCache::release`].
    pub fn get_or_create(&self, definition: &FontDefinition) -> FontResult<Arc<FontResource>> {
        let key = definition.key();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = entries.get_mut(&key) {
            entry.ref_count += 1;
            log::debug!("Font cache hit for '{}' (refs: {})", key, entry.ref_count);
            return Ok(Arc::clone(&entry.resource));
        }

        let resource = Arc::new(self.build_resource(key.clone(), definition)?);
        log::info!(
            "Created font resource '{}': {} glyphs in {}x{} atlas",
            resource.name(),
            resource.glyph_count(),
            resource.atlas_size().0,
            resource.atlas_size().1
        );
        entries.insert(key, CacheEntry { resource: Arc::clone(&resource), ref_count: 1 });
        Ok(resource)
    }

    /// Return one reference to `resource`
    ///
    /// The atlas texture and geometry are released with the last reference.
    /// Resources the cache does not know (or no longer holds) are ignored.
    pub fn release(&self, resource: &FontResource) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(entry) = entries.get_mut(resource.key()) else {
            log::debug!("Release of uncached font resource '{}' ignored", resource.name());
            return;
        };
        if !std::ptr::eq(Arc::as_ptr(&entry.resource), resource) {
            log::debug!("Release of stale font resource '{}' ignored", resource.name());
            return;
        }

        entry.ref_count -= 1;
        if entry.ref_count > 0 {
            log::debug!("Released font resource '{}' (refs: {})", resource.name(), entry.ref_count);
            return;
        }

        if let Some(entry) = entries.remove(resource.key()) {
            self.destroy_gpu_resources(&entry.resource);
            log::info!("Evicted font resource '{}'", entry.resource.name());
        }
    }

    /// Number of distinct resources currently cached
    pub fn cached_resource_count(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Outstanding references for `definition` (0 if not cached)
    pub fn reference_count(&self, definition: &FontDefinition) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&definition.key())
            .map_or(0, |entry| entry.ref_count)
    }

    /// Release every cached resource regardless of outstanding references
    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, entry) in entries.drain() {
            log::warn!("Font resource '{}' still had {} reference(s) at clear", key, entry.ref_count);
            self.destroy_gpu_resources(&entry.resource);
        }
    }

    fn build_resource(&self, key: FontKey, definition: &FontDefinition) -> FontResult<FontResource> {
        let font_data = definition.source().load_font_data()?;
        let range = definition.character_range();
        let rasterized = self
            .rasterizer
            .rasterize_font(&font_data, definition.size_in_points(), range)?;
        let atlas = self.packer.pack(&rasterized.glyphs)?;

        let atlas_texture = self
            .services
            .create_texture(&atlas.pixels, atlas.width, atlas.height, TextureFormat::R8Unorm)?;

        let geometry_name = format!("{}#{}x{}+{}", key, atlas.width, atlas.height, self.packer.padding());
        let vertices = SharedGeometryBuilder::build(&atlas.uv_rects);
        let geometry = GeometryDefinition::from_vertices(geometry_name.clone(), &vertices);
        let shared_geometry = match self.services.get_or_create_geometry(&geometry) {
            Ok(handle) => handle,
            Err(e) => {
                self.services.destroy_texture(atlas_texture);
                return Err(e.into());
            }
        };

        let glyph_table: HashMap<char, GlyphInfo> = rasterized
            .glyphs
            .iter()
            .zip(&atlas.uv_rects)
            .enumerate()
            .map(|(index, (glyph, uv))| {
                let info = GlyphInfo {
                    glyph_index: index as u32,
                    uv_top_left: uv.top_left,
                    uv_bottom_right: uv.bottom_right,
                    width: glyph.width as f32,
                    height: glyph.height as f32,
                    bearing_x: glyph.bearing_x,
                    bearing_y: glyph.bearing_y,
                    advance: glyph.advance,
                };
                log::trace!("Glyph '{}' -> index {} at {:?}", glyph.ch, index, uv.top_left);
                (glyph.ch, info)
            })
            .collect();

        Ok(FontResource::new(
            key,
            geometry_name,
            atlas_texture,
            (atlas.width, atlas.height),
            shared_geometry,
            glyph_table,
            rasterized.metrics,
        ))
    }

    fn destroy_gpu_resources(&self, resource: &FontResource) {
        self.services.release_geometry(resource.geometry_name());
        self.services.destroy_texture(resource.atlas_texture());
    }
}

impl Drop for FontResourceCache {
    fn drop(&mut self) {
        if self.cached_resource_count() > 0 {
            self.clear();
        }
    }
}
