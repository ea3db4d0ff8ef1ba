//! Text element lifecycle and draw emission
//!
//! A [`TextRenderable`] owns no GPU memory of its own besides a descriptor
//! set. While active it holds one reference to a cached [`FontResource`] and
//! emits one draw per visible glyph into the font's shared quad buffer.

use std::sync::Arc;

use super::error::{FontError, FontResult};
use super::font_cache::FontResourceCache;
use super::font_definition::FontDefinition;
use super::font_resource::{FontResource, GlyphInfo};
use super::shared_geometry::GLYPH_TOPOLOGY;
use super::text_layout::{ElementTransform, GlyphLayoutEngine, TextSize};
use crate::foundation::math::{Vec2, Vec4};
use crate::render::api::{DescriptorSetHandle, SamplerMode};
use crate::render::commands::{DrawCommand, GlyphPushConstants, RenderContext};

/// Descriptor binding the atlas is written to
pub const ATLAS_BINDING: u32 = 0;

/// Lifecycle of a text renderable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextState {
    /// No GPU resources held
    Inactive,
    /// Acquiring font resource and descriptor set
    Activating,
    /// Ready to draw
    Active,
    /// Returning resources
    Deactivating,
}

/// Single line of text drawn from a shared font atlas
pub struct TextRenderable {
    cache: Arc<FontResourceCache>,
    default_font: FontDefinition,
    font_definition: Option<FontDefinition>,
    text: String,
    element: ElementTransform,
    size: TextSize,
    tint: Vec4,
    state: TextState,
    font_resource: Option<Arc<FontResource>>,
    descriptor_set: Option<DescriptorSetHandle>,
}

impl TextRenderable {
    /// Inactive renderable using `default_font` until another font is set
    pub fn new(cache: Arc<FontResourceCache>, default_font: FontDefinition) -> Self {
        Self {
            cache,
            default_font,
            font_definition: None,
            text: String::new(),
            element: ElementTransform::default(),
            size: TextSize::default(),
            tint: Vec4::from(GlyphPushConstants::OPAQUE_WHITE),
            state: TextState::Inactive,
            font_resource: None,
            descriptor_set: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> TextState {
        self.state
    }

    /// Whether draws can be emitted
    pub fn is_active(&self) -> bool {
        self.state == TextState::Active
    }

    /// Displayed string
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Font in use, falling back to the default
    pub fn font_definition(&self) -> &FontDefinition {
        self.font_definition.as_ref().unwrap_or(&self.default_font)
    }

    /// Font resource held while active
    pub fn font_resource(&self) -> Option<&Arc<FontResource>> {
        self.font_resource.as_ref()
    }

    /// Descriptor set held while active
    pub fn descriptor_set(&self) -> Option<DescriptorSetHandle> {
        self.descriptor_set
    }

    /// Measured text size (updated on activation and text changes)
    pub fn size(&self) -> TextSize {
        self.size
    }

    /// Element placement
    pub fn element(&self) -> &ElementTransform {
        &self.element
    }

    /// Replace the element placement
    pub fn set_element(&mut self, element: ElementTransform) {
        self.element = element;
    }

    /// Move the anchor point to `position`
    pub fn set_position(&mut self, position: Vec2) {
        self.element.position = position;
    }

    /// Tint multiplied with atlas coverage
    pub fn tint_color(&self) -> Vec4 {
        self.tint
    }

    /// Set the tint color
    pub fn set_tint_color(&mut self, tint: Vec4) {
        self.tint = tint;
    }

    /// Replace the displayed string; no GPU work is done
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        if let Some(resource) = &self.font_resource {
            self.size = GlyphLayoutEngine::measure(&self.text, resource.glyph_table(), resource.metrics());
        }
    }

    /// Choose the font used on the next activation
    ///
    /// Fails with [`FontError::ConfigurationLocked`] unless inactive.
    pub fn set_font_definition(&mut self, definition: FontDefinition) -> FontResult<()> {
        if self.state != TextState::Inactive {
            return Err(FontError::ConfigurationLocked);
        }
        self.font_definition = Some(definition);
        Ok(())
    }

    /// Acquire the font resource and bind its atlas
    ///
    /// On failure the renderable stays inactive and holds nothing.
    pub fn activate(&mut self) -> FontResult<()> {
        if self.state != TextState::Inactive {
            log::warn!("activate() on text renderable in state {:?} ignored", self.state);
            return Ok(());
        }

        self.state = TextState::Activating;
        let (resource, descriptor_set) = match self.acquire_resources() {
            Ok(acquired) => acquired,
            Err(e) => {
                self.state = TextState::Inactive;
                return Err(e);
            }
        };

        self.size = GlyphLayoutEngine::measure(&self.text, resource.glyph_table(), resource.metrics());
        log::debug!("Text renderable activated with '{}'", resource.name());
        self.font_resource = Some(resource);
        self.descriptor_set = Some(descriptor_set);
        self.state = TextState::Active;
        Ok(())
    }

    /// Free the descriptor set and release the font resource
    pub fn deactivate(&mut self) {
        if self.state != TextState::Active {
            return;
        }

        self.state = TextState::Deactivating;
        if let Some(set) = self.descriptor_set.take() {
            self.cache.services().free_descriptor_set(set);
        }
        if let Some(resource) = self.font_resource.take() {
            self.cache.release(&resource);
        }
        self.state = TextState::Inactive;
    }

    /// Lazily emit one draw per visible glyph
    ///
    /// Nothing is emitted while inactive or for empty text. Each command's
    /// transform is the context's view projection times the glyph's world
    /// transform.
    pub fn draw_commands<'a>(&'a self, context: &'a RenderContext) -> impl Iterator<Item = DrawCommand> + 'a {
        let bound = match (&self.font_resource, self.descriptor_set) {
            (Some(resource), Some(set)) if self.state == TextState::Active && !self.text.is_empty() => {
                Some((resource, set))
            }
            _ => None,
        };

        bound.into_iter().flat_map(move |(resource, descriptor_set)| {
            let vertex_buffer = resource.shared_geometry().vertex_buffer;
            GlyphLayoutEngine::compute_glyph_transforms(
                &self.text,
                resource.glyph_table(),
                resource.metrics(),
                &self.element,
            )
            .filter(|placement| !placement.glyph.is_blank())
            .map(move |placement| DrawCommand {
                pipeline: context.pipeline,
                vertex_buffer,
                first_vertex: placement.glyph.first_vertex(),
                vertex_count: GlyphInfo::VERTICES_PER_GLYPH,
                topology: GLYPH_TOPOLOGY,
                push_constants: GlyphPushConstants::new(
                    &(context.view_projection * placement.world_transform),
                    self.tint,
                ),
                descriptor_set,
                render_pass_mask: context.render_pass_mask,
                priority: context.priority,
            })
        })
    }

    fn acquire_resources(&self) -> FontResult<(Arc<FontResource>, DescriptorSetHandle)> {
        let resource = self.cache.get_or_create(self.font_definition())?;
        match self.bind_atlas(&resource) {
            Ok(set) => Ok((resource, set)),
            Err(e) => {
                self.cache.release(&resource);
                Err(e)
            }
        }
    }

    fn bind_atlas(&self, resource: &FontResource) -> FontResult<DescriptorSetHandle> {
        let services = self.cache.services();
        let set = services.allocate_descriptor_set()?;
        let bound = services.update_descriptor_set(set, resource.atlas_texture(), SamplerMode::Nearest, ATLAS_BINDING);
        if let Err(e) = bound {
            services.free_descriptor_set(set);
            return Err(e.into());
        }
        Ok(set)
    }
}

impl Drop for TextRenderable {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4;
    use crate::render::api::PipelineHandle;
    use crate::render::backends::HeadlessGpu;
    use crate::render::commands::RenderPassMask;
    use crate::render::systems::text::font_definition::CharacterRange;
    use crate::render::systems::text::test_support::{test_font, test_source, FixedRasterizer};
    use crate::render::systems::text::TextConfig;
    use ash::vk;

    struct Fixture {
        gpu: Arc<HeadlessGpu>,
        cache: Arc<FontResourceCache>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_rasterizer(FixedRasterizer::new())
        }

        fn with_rasterizer(rasterizer: FixedRasterizer) -> Self {
            let gpu = Arc::new(HeadlessGpu::new());
            let cache = FontResourceCache::with_rasterizer(gpu.clone(), rasterizer, &TextConfig::default());
            Self { gpu, cache: Arc::new(cache) }
        }

        fn renderable(&self) -> TextRenderable {
            TextRenderable::new(Arc::clone(&self.cache), test_font("default", 16.0))
        }
    }

    #[test]
    fn starts_inactive_with_empty_text() {
        let fixture = Fixture::new();
        let text = fixture.renderable();
        assert_eq!(text.state(), TextState::Inactive);
        assert_eq!(text.text(), "");
        assert!(text.font_resource().is_none());
        assert!(text.descriptor_set().is_none());
        assert_eq!(text.font_definition(), &test_font("default", 16.0));
    }

    #[test]
    fn activation_binds_atlas_with_nearest_sampling() {
        let fixture = Fixture::new();
        let mut text = fixture.renderable();
        text.activate().unwrap();

        assert_eq!(text.state(), TextState::Active);
        let set = text.descriptor_set().unwrap();
        let binding = fixture.gpu.descriptor_binding(set).unwrap();
        assert_eq!(binding.texture, text.font_resource().unwrap().atlas_texture());
        assert_eq!(binding.sampler, SamplerMode::Nearest);
        assert_eq!(binding.binding, ATLAS_BINDING);
    }

    #[test]
    fn renderables_share_default_font() {
        let fixture = Fixture::new();
        let mut first = fixture.renderable();
        let mut second = fixture.renderable();

        first.activate().unwrap();
        second.activate().unwrap();
        assert_eq!(fixture.cache.cached_resource_count(), 1);
        assert!(Arc::ptr_eq(first.font_resource().unwrap(), second.font_resource().unwrap()));
        assert_eq!(fixture.gpu.descriptor_set_count(), 2);

        first.deactivate();
        assert_eq!(fixture.cache.cached_resource_count(), 1);
        second.deactivate();
        assert_eq!(fixture.cache.cached_resource_count(), 0);
        assert_eq!(fixture.gpu.descriptor_set_count(), 0);
        assert_eq!(fixture.gpu.texture_count(), 0);
    }

    #[test]
    fn one_draw_per_glyph_at_its_quad() {
        let fixture = Fixture::new();
        let mut text = fixture.renderable();
        text.set_text("AB");
        text.activate().unwrap();

        let resource = Arc::clone(text.font_resource().unwrap());
        let context = RenderContext {
            pipeline: PipelineHandle(9),
            render_pass_mask: RenderPassMask::UI_OVERLAY | RenderPassMask::OFFSCREEN,
            priority: 3,
            ..RenderContext::default()
        };
        let commands: Vec<_> = text.draw_commands(&context).collect();

        assert_eq!(commands.len(), 2);
        let a = resource.glyph('A').unwrap().first_vertex();
        assert_eq!(commands[0].first_vertex, a);
        assert_eq!(commands[1].first_vertex, a + 4);
        for command in &commands {
            assert_eq!(command.vertex_count, 4);
            assert_eq!(command.topology, vk::PrimitiveTopology::TRIANGLE_STRIP);
            assert_eq!(command.vertex_buffer, resource.shared_geometry().vertex_buffer);
            assert_eq!(command.descriptor_set, text.descriptor_set().unwrap());
            assert_eq!(command.pipeline, PipelineHandle(9));
            assert_eq!(command.render_pass_mask, context.render_pass_mask);
            assert_eq!(command.priority, 3);
            assert_eq!(command.push_constants.tint_color, GlyphPushConstants::OPAQUE_WHITE);
            assert_eq!(command.push_constants.uv_rect, GlyphPushConstants::IDENTITY_UV_RECT);
        }
    }

    #[test]
    fn dense_indices_map_to_vertex_offsets() {
        // Range "A".."B" gives A index 0 and B index 1
        let fixture = Fixture::new();
        let range = CharacterRange::Span { first: 'A', last: 'B' };
        let definition = FontDefinition::with_range(test_source("ab"), 16.0, range).unwrap();
        let mut text = TextRenderable::new(Arc::clone(&fixture.cache), definition);
        text.set_text("AB");
        text.activate().unwrap();

        let offsets: Vec<_> = text
            .draw_commands(&RenderContext::default())
            .map(|c| (c.first_vertex, c.vertex_count))
            .collect();
        assert_eq!(offsets, vec![(0, 4), (4, 4)]);
    }

    #[test]
    fn transform_is_view_projection_times_world() {
        let fixture = Fixture::new();
        let mut text = fixture.renderable();
        text.set_text("A");
        text.set_position(Vec2::new(20.0, 30.0));
        text.activate().unwrap();

        let resource = Arc::clone(text.font_resource().unwrap());
        let world = GlyphLayoutEngine::compute_glyph_transforms(
            "A",
            resource.glyph_table(),
            resource.metrics(),
            text.element(),
        )
        .next()
        .unwrap()
        .world_transform;

        let view_projection = Mat4::new_scaling(0.5);
        let context = RenderContext { view_projection, ..RenderContext::default() };
        let command = text.draw_commands(&context).next().unwrap();
        assert_eq!(command.push_constants, GlyphPushConstants::new(&(view_projection * world), text.tint_color()));
    }

    #[test]
    fn blank_glyphs_emit_no_draws() {
        let fixture = Fixture::new();
        let mut text = fixture.renderable();
        text.set_text("A B");
        text.activate().unwrap();
        assert_eq!(text.draw_commands(&RenderContext::default()).count(), 2);
    }

    #[test]
    fn draw_commands_are_repeatable() {
        let fixture = Fixture::new();
        let mut text = fixture.renderable();
        text.set_text("Hello, world!");
        text.activate().unwrap();

        let context = RenderContext::screen_space(PipelineHandle(1), 800.0, 600.0);
        let first: Vec<_> = text.draw_commands(&context).collect();
        let second: Vec<_> = text.draw_commands(&context).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 12);
    }

    #[test]
    fn empty_text_activates_but_draws_nothing() {
        let fixture = Fixture::new();
        let mut text = fixture.renderable();
        text.activate().unwrap();
        assert!(text.is_active());
        assert_eq!(text.draw_commands(&RenderContext::default()).count(), 0);
        assert_eq!(text.size().width, 0.0);
    }

    #[test]
    fn inactive_renderable_draws_nothing() {
        let fixture = Fixture::new();
        let mut text = fixture.renderable();
        text.set_text("idle");
        assert_eq!(text.draw_commands(&RenderContext::default()).count(), 0);
    }

    #[test]
    fn set_text_remeasures_while_active() {
        let rasterizer = FixedRasterizer::new()
            .with_glyph('H', 8, 12, 1.0, 10.0)
            .with_glyph('i', 2, 10, 0.0, 4.0);
        let fixture = Fixture::with_rasterizer(rasterizer);
        let mut text = fixture.renderable();
        text.set_text("H");
        text.activate().unwrap();
        assert_eq!(text.size().width, 10.0);

        text.set_text("Hi");
        assert_eq!(text.size().width, 14.0);
        assert_eq!(text.size().height, 20.0);
        assert_eq!(text.draw_commands(&RenderContext::default()).count(), 2);
    }

    #[test]
    fn font_is_locked_while_active() {
        let fixture = Fixture::new();
        let mut text = fixture.renderable();
        text.set_font_definition(test_font("other", 12.0)).unwrap();
        text.activate().unwrap();
        assert_eq!(text.font_resource().unwrap().key(), &test_font("other", 12.0).key());

        let err = text.set_font_definition(test_font("third", 12.0)).unwrap_err();
        assert!(matches!(err, FontError::ConfigurationLocked));

        text.deactivate();
        text.set_font_definition(test_font("third", 12.0)).unwrap();
    }

    #[test]
    fn activate_and_deactivate_are_idempotent() {
        let fixture = Fixture::new();
        let mut text = fixture.renderable();
        text.deactivate();

        text.activate().unwrap();
        text.activate().unwrap();
        assert_eq!(fixture.cache.reference_count(text.font_definition()), 1);

        text.deactivate();
        text.deactivate();
        assert_eq!(fixture.cache.cached_resource_count(), 0);
    }

    #[test]
    fn failed_font_load_leaves_renderable_inactive() {
        let fixture = Fixture::new();
        let missing = FontDefinition::new(crate::assets::FontSource::file("/missing/font.ttf"), 16.0).unwrap();
        let mut text = TextRenderable::new(Arc::clone(&fixture.cache), missing);

        assert!(matches!(text.activate(), Err(FontError::Load { .. })));
        assert_eq!(text.state(), TextState::Inactive);
        assert!(text.font_resource().is_none());
    }

    #[test]
    fn failed_descriptor_allocation_releases_font() {
        let fixture = Fixture::new();
        fixture.gpu.set_fail_descriptor_allocation(true);
        let mut text = fixture.renderable();

        assert!(matches!(text.activate(), Err(FontError::Graphics(_))));
        assert_eq!(text.state(), TextState::Inactive);
        assert!(text.descriptor_set().is_none());
        assert_eq!(fixture.cache.cached_resource_count(), 0);
        assert_eq!(fixture.gpu.texture_count(), 0);

        fixture.gpu.set_fail_descriptor_allocation(false);
        text.activate().unwrap();
        assert!(text.is_active());
    }

    #[test]
    fn dropping_an_active_renderable_releases_resources() {
        let fixture = Fixture::new();
        {
            let mut text = fixture.renderable();
            text.activate().unwrap();
        }
        assert_eq!(fixture.cache.cached_resource_count(), 0);
        assert_eq!(fixture.gpu.descriptor_set_count(), 0);
    }
}
