//! Album overview tile
//!
//! A tile shows one album: a dark rounded card, the album art once it has
//! loaded, the album name and its release date. Three timelines animate it:
//!
//! - **shown**: the whole tile fades in when it is attached to a hierarchy
//! - **rollover**: a blue outline pulses while the pointer is over the tile
//! - **image fade**: the art fades in as the last stage of the load pipeline
//!
//! The load pipeline is a sequence scenario: fetch and decode the art on a
//! worker, scale it to fit (skipped when there is no art), then fade it in.
//! A failed fetch leaves the tile showing text only.

use crate::album::Album;
use crate::config::{OnyxConfig, TileConfig};
use onyx_animation::{
    AsyncActor, Easing, PropertyBinding, RepeatMode, Result, Scenario, SchedulerHandle, Timeline,
};
use onyx_core::events::event_types;
use onyx_core::{
    Animatable, Color, CornerRadius, DrawContext, ElementId, Event, Gradient, OpacityScope, Point,
    PropertyValue, Rect,
};
use onyx_image::{ArtImage, ArtSource, ScaleQuality};
use onyx_text::{layout_multiline, TextMeasurer};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

/// Gap between the card edge and its content
pub const INSETS: f32 = 7.0;

/// Corner radius of the card (an 18px arc)
pub const CORNER_RADIUS: f32 = 9.0;

pub const CAPTION_FONT_SIZE: f32 = 11.0;

/// Rollover outline color
pub const HIGHLIGHT: Color = Color::rgb(64.0 / 255.0, 140.0 / 255.0, 1.0);

/// Animated properties of a tile
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileProperty {
    /// Opacity of the whole tile
    Alpha,
    /// Opacity of the art, multiplied with `Alpha`
    ImageAlpha,
    /// Opacity of the rollover outline
    BorderAlpha,
}

/// Paintable state of a tile, written by its timelines
#[derive(Debug)]
pub struct TileModel {
    id: ElementId,
    caption: String,
    release_date: String,
    alpha: f32,
    image_alpha: f32,
    border_alpha: f32,
    art: Option<ArtImage>,
}

impl TileModel {
    fn new(album: &Album) -> Self {
        Self {
            id: ElementId::next(),
            caption: album.name.clone(),
            release_date: album.release_date.clone(),
            alpha: 0.0,
            image_alpha: 0.0,
            border_alpha: 0.0,
            art: None,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn image_alpha(&self) -> f32 {
        self.image_alpha
    }

    pub fn border_alpha(&self) -> f32 {
        self.border_alpha
    }

    pub fn art(&self) -> Option<&ArtImage> {
        self.art.as_ref()
    }
}

impl Animatable for TileModel {
    type Property = TileProperty;

    fn element_id(&self) -> ElementId {
        self.id
    }

    fn set_property(&mut self, property: TileProperty, value: PropertyValue) {
        let Some(v) = value.as_float() else {
            return;
        };
        match property {
            TileProperty::Alpha => self.alpha = v,
            TileProperty::ImageAlpha => self.image_alpha = v,
            TileProperty::BorderAlpha => self.border_alpha = v,
        }
    }

    fn property(&self, property: TileProperty) -> PropertyValue {
        match property {
            TileProperty::Alpha => self.alpha.into(),
            TileProperty::ImageAlpha => self.image_alpha.into(),
            TileProperty::BorderAlpha => self.border_alpha.into(),
        }
    }
}

/// Overview tile for one album
pub struct AlbumTile {
    scheduler: SchedulerHandle,
    album: Album,
    config: TileConfig,
    quality: ScaleQuality,
    model: Rc<RefCell<TileModel>>,
    rollover: Timeline,
    shown: RefCell<Option<Timeline>>,
    load: RefCell<Option<Scenario>>,
}

impl AlbumTile {
    pub fn new(scheduler: &SchedulerHandle, album: Album, config: &OnyxConfig) -> Result<Self> {
        let tile = config.tile.clone();
        let model = Rc::new(RefCell::new(TileModel::new(&album)));

        let rollover = Timeline::builder(scheduler)
            .label(format!("rollover:{}", album.asin))
            .duration(Duration::from_millis(tile.rollover_ms))
            .easing(Easing::spline(tile.rollover_tension)?)
            .bind(PropertyBinding::new(
                &model,
                TileProperty::BorderAlpha,
                0.0f32,
                tile.rollover_peak_alpha,
            ))
            .build()?;

        Ok(Self {
            scheduler: scheduler.clone(),
            album,
            config: tile,
            quality: config.image.quality,
            model,
            rollover,
            shown: RefCell::new(None),
            load: RefCell::new(None),
        })
    }

    pub fn id(&self) -> ElementId {
        self.model.borrow().id
    }

    pub fn album(&self) -> &Album {
        &self.album
    }

    pub fn model(&self) -> &Rc<RefCell<TileModel>> {
        &self.model
    }

    pub fn alpha(&self) -> f32 {
        self.model.borrow().alpha
    }

    pub fn image_alpha(&self) -> f32 {
        self.model.borrow().image_alpha
    }

    pub fn border_alpha(&self) -> f32 {
        self.model.borrow().border_alpha
    }

    /// Size of the loaded art, once scaled
    pub fn art_size(&self) -> Option<(u32, u32)> {
        self.model.borrow().art.as_ref().map(|a| (a.width(), a.height()))
    }

    pub fn rollover(&self) -> &Timeline {
        &self.rollover
    }

    /// The pipeline started by [`load_art`](Self::load_art), if any
    pub fn load(&self) -> Option<Scenario> {
        self.load.borrow().clone()
    }

    /// The tile joined a displayed hierarchy: fade it in
    pub fn attach(&self) -> Result<()> {
        let shown = Timeline::builder(&self.scheduler)
            .label(format!("shown:{}", self.album.asin))
            .duration(Duration::from_millis(self.config.shown_fade_ms))
            .bind(PropertyBinding::new(&self.model, TileProperty::Alpha, 0.0f32, 1.0))
            .build()?;
        shown.play()?;

        if let Some(previous) = self.shown.replace(Some(shown)) {
            previous.cancel();
        }
        Ok(())
    }

    /// The tile left the hierarchy: stop everything it started
    pub fn detach(&self) {
        if let Some(shown) = self.shown.take() {
            shown.cancel();
        }
        if let Some(load) = self.load.take() {
            load.cancel();
        }
        self.rollover.reset();
        self.clear_outline();
    }

    /// Drop the outline a reset rollover left behind
    fn clear_outline(&self) {
        let id = {
            let mut model = self.model.borrow_mut();
            if model.border_alpha == 0.0 {
                return;
            }
            model.set_property(TileProperty::BorderAlpha, 0.0f32.into());
            model.id
        };
        self.scheduler.request_repaint(id);
    }

    /// Start pulsing the outline
    pub fn pointer_entered(&self) -> Result<()> {
        if self.rollover.state().is_terminal() {
            self.rollover.reset();
        }
        self.rollover.play_loop(RepeatMode::LoopReverse)
    }

    /// Fade the outline out from wherever the pulse is
    pub fn pointer_exited(&self) -> Result<()> {
        if self.rollover.is_playing() {
            self.rollover.play_reverse()?;
        }
        Ok(())
    }

    /// Fade a pulsing outline out
    pub fn resized(&self) -> Result<()> {
        if self.rollover.is_playing() {
            self.rollover.play_reverse()?;
        }
        Ok(())
    }

    /// Route a host event to the matching hook.
    ///
    /// Returns `false` for events this tile does not react to.
    pub fn handle_event(&self, event: &Event) -> Result<bool> {
        match event.event_type {
            event_types::MOUNT => self.attach()?,
            event_types::UNMOUNT => self.detach(),
            event_types::POINTER_ENTER => self.pointer_entered()?,
            event_types::POINTER_LEAVE => self.pointer_exited()?,
            event_types::RESIZE => self.resized()?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Build the fetch, scale and fade pipeline for this tile's art
    pub fn load_scenario(&self, source: Arc<dyn ArtSource>) -> Result<Scenario> {
        let decoded: Rc<RefCell<Option<ArtImage>>> = Rc::new(RefCell::new(None));

        let asin = self.album.asin.clone();
        let slot = Rc::clone(&decoded);
        let fetch = AsyncActor::new(&self.scheduler, move || {
            let bytes = source.fetch_art(&asin)?;
            ArtImage::decode(&bytes)
        })
        .with_label("fetch-art")
        .on_complete(move |result| match result {
            Ok(image) => *slot.borrow_mut() = Some(image),
            Err(err) => tracing::debug!("AlbumTile: no art ({})", err),
        });

        let (art_dim, quality) = (self.config.art_dim, self.quality);
        let model = Rc::downgrade(&self.model);
        let scale = AsyncActor::deferred(&self.scheduler, move || {
            let image = decoded.borrow_mut().take()?;
            Some(move || image.scale_to_fit(art_dim, quality))
        })
        .with_label("scale-art")
        .on_complete(move |result| {
            if let (Some(model), Ok(image)) = (model.upgrade(), result) {
                model.borrow_mut().art = Some(image);
            }
        });

        let fade = Timeline::builder(&self.scheduler)
            .label(format!("image-fade:{}", self.album.asin))
            .duration(Duration::from_millis(self.config.image_fade_ms))
            .bind(PropertyBinding::new(
                &self.model,
                TileProperty::ImageAlpha,
                0.0f32,
                1.0,
            ))
            .build()?;

        Ok(Scenario::sequence(&self.scheduler)
            .with_label(format!("load:{}", self.album.asin))
            .then(fetch)
            .then(scale)
            .then(fade))
    }

    /// Build and start the load pipeline
    pub fn load_art(&self, source: Arc<dyn ArtSource>) -> Result<Scenario> {
        let scenario = self.load_scenario(source)?;
        scenario.play()?;
        if let Some(previous) = self.load.replace(Some(scenario.clone())) {
            previous.cancel();
        }
        Ok(scenario)
    }

    pub fn size(&self) -> (f32, f32) {
        (self.config.width as f32, self.config.height as f32)
    }

    pub fn paint(&self, ctx: &mut dyn DrawContext, measurer: &dyn TextMeasurer) {
        let model = self.model.borrow();
        let (width, height) = self.size();
        let art_dim = self.config.art_dim as f32;
        let bounds = Rect::new(0.0, 0.0, width - 1.0, height - 1.0);
        let radius = CornerRadius::uniform(CORNER_RADIUS);

        let mut ctx = OpacityScope::new(ctx, model.alpha);

        let card = Gradient::linear(
            Point::ZERO,
            Color::from_rgba8(0, 0, 0, 196),
            Point::new(0.0, height),
            Color::TRANSPARENT,
        );
        ctx.fill_rounded_rect(bounds, radius, card.clone().into());
        ctx.stroke_rounded_rect(bounds, radius, 1.0, card.into());

        if model.border_alpha > 0.0 {
            let mut outline = OpacityScope::new(&mut *ctx, model.border_alpha);
            let pulse = Gradient::linear(
                Point::ZERO,
                HIGHLIGHT.with_alpha(196.0 / 255.0),
                Point::new(0.0, height),
                HIGHLIGHT.with_alpha(0.0),
            );
            outline.stroke_rounded_rect(bounds, radius, 2.0, pulse.into());
        }

        if let Some(art) = &model.art {
            let (w, h) = (art.width() as f32, art.height() as f32);
            let x = ((width - w) / 2.0).floor();
            let y = INSETS + ((art_dim - h) / 2.0).floor();
            let mut image = OpacityScope::new(&mut *ctx, model.image_alpha);
            image.draw_image(Rect::new(x, y, w, h), art.pixels(), art.width(), art.height());
        }

        let metrics = measurer.line_metrics(CAPTION_FONT_SIZE);
        let text_x = INSETS;
        let text_y = INSETS + art_dim + metrics.height();
        let text_width = width - INSETS - text_x;

        let caption = layout_multiline(
            &model.caption,
            measurer,
            CAPTION_FONT_SIZE,
            text_x,
            text_width,
            text_y,
            Some(2),
        );
        for line in &caption.lines {
            ctx.draw_text(line.text(&model.caption), line.baseline, CAPTION_FONT_SIZE, Color::WHITE);
        }

        let release = layout_multiline(
            &model.release_date,
            measurer,
            CAPTION_FONT_SIZE,
            text_x,
            text_width,
            text_y + 2.0 * metrics.ascent,
            Some(1),
        );
        for line in &release.lines {
            ctx.draw_text(line.text(&model.release_date), line.baseline, CAPTION_FONT_SIZE, HIGHLIGHT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onyx_animation::{AnimationScheduler, TimelineState};
    use onyx_image::MemoryArtSource;

    fn tile(scheduler: &AnimationScheduler) -> AlbumTile {
        let album = Album::new("Abbey Road", "The Beatles", "1969-09-26", "B000002UAL");
        AlbumTile::new(&scheduler.handle(), album, &OnyxConfig::default()).unwrap()
    }

    fn run(scheduler: &AnimationScheduler, ms: u64) {
        for _ in 0..ms / 16 {
            scheduler.tick(Duration::from_millis(16));
        }
    }

    #[test]
    fn test_property_writes() {
        let scheduler = AnimationScheduler::new();
        let tile = tile(&scheduler);
        let mut model = tile.model().borrow_mut();
        model.set_property(TileProperty::BorderAlpha, 0.3.into());
        model.set_property(TileProperty::Alpha, Color::WHITE.into());
        assert_eq!(model.property(TileProperty::BorderAlpha).as_float(), Some(0.3));
        assert_eq!(model.alpha(), 0.0);
    }

    #[test]
    fn test_attach_fades_in() {
        let scheduler = AnimationScheduler::new();
        let tile = tile(&scheduler);
        tile.attach().unwrap();
        run(&scheduler, 496);
        assert!(tile.alpha() > 0.4 && tile.alpha() < 0.6);
        run(&scheduler, 600);
        assert_eq!(tile.alpha(), 1.0);
    }

    #[test]
    fn test_rollover_pulses_then_fades_out() {
        let scheduler = AnimationScheduler::new();
        let tile = tile(&scheduler);

        tile.pointer_entered().unwrap();
        run(&scheduler, 800);
        assert!(tile.border_alpha() > 0.55);
        // The pulse keeps going past the first boundary
        run(&scheduler, 400);
        assert!(tile.rollover().is_playing());

        tile.pointer_exited().unwrap();
        run(&scheduler, 1000);
        assert_eq!(tile.rollover().state(), TimelineState::Done);
        assert_eq!(tile.border_alpha(), 0.0);

        // Entering again re-arms the finished pulse
        tile.pointer_entered().unwrap();
        assert!(tile.rollover().is_playing());
    }

    #[test]
    fn test_exit_without_enter_does_nothing() {
        let scheduler = AnimationScheduler::new();
        let tile = tile(&scheduler);
        tile.pointer_exited().unwrap();
        tile.resized().unwrap();
        assert_eq!(tile.rollover().state(), TimelineState::Idle);
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_handle_event_routes_hooks() {
        let scheduler = AnimationScheduler::new();
        let tile = tile(&scheduler);
        let id = tile.id();
        assert!(tile.handle_event(&Event::pointer_enter(id, 3.0, 4.0)).unwrap());
        assert!(tile.rollover().is_playing());
        assert!(!tile.handle_event(&Event::new(999, id)).unwrap());
        assert!(tile.handle_event(&Event::new(event_types::UNMOUNT, id)).unwrap());
        assert_eq!(tile.rollover().state(), TimelineState::Idle);
    }

    #[test]
    fn test_detach_mid_pulse_clears_outline() {
        let scheduler = AnimationScheduler::new();
        let tile = tile(&scheduler);

        tile.pointer_entered().unwrap();
        run(&scheduler, 320);
        assert!(tile.border_alpha() > 0.0);

        tile.detach();
        assert_eq!(tile.border_alpha(), 0.0);
        run(&scheduler, 1600);
        assert_eq!(tile.border_alpha(), 0.0);

        // A later resize has no pulse to reverse
        tile.resized().unwrap();
        run(&scheduler, 16);
        assert_eq!(tile.rollover().state(), TimelineState::Idle);
        assert_eq!(tile.border_alpha(), 0.0);

        // Re-entering starts the pulse from nothing
        tile.pointer_entered().unwrap();
        assert_eq!(tile.rollover().elapsed(), Duration::ZERO);
        assert!(tile.rollover().is_playing());
    }

    #[test]
    fn test_failed_fetch_skips_scale_and_still_fades() {
        let scheduler = AnimationScheduler::new();
        let tile = tile(&scheduler);
        let scenario = tile.load_art(Arc::new(MemoryArtSource::new())).unwrap();
        run(&scheduler, 800);
        assert!(scenario.state().is_terminal());
        assert_eq!(tile.art_size(), None);
        assert_eq!(tile.image_alpha(), 1.0);
    }
}
