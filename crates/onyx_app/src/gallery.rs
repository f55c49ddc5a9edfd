//! Grid of album tiles sharing one scheduler

use crate::album::Album;
use crate::config::OnyxConfig;
use crate::tile::AlbumTile;
use anyhow::{Context, Result};
use onyx_animation::{AnimationScheduler, FrameClock, WorkerPool};
use onyx_core::{DrawContext, ElementId, Event, RepaintSink};
use onyx_image::ArtSource;
use onyx_text::TextMeasurer;
use std::sync::Arc;

/// Owns the scheduler, the frame clock and every tile
pub struct Gallery {
    config: OnyxConfig,
    scheduler: AnimationScheduler,
    clock: FrameClock,
    source: Arc<dyn ArtSource>,
    tiles: Vec<AlbumTile>,
}

impl Gallery {
    /// Gallery whose art loads on a worker pool sized by the config
    pub fn new(config: OnyxConfig, source: Arc<dyn ArtSource>) -> Result<Self> {
        let pool = WorkerPool::new(config.animation.workers)
            .with_context(|| format!("Failed to start {} art workers", config.animation.workers))?;
        Ok(Self::with_scheduler(config, source, AnimationScheduler::with_dispatcher(pool)))
    }

    /// Gallery driven by a caller-provided scheduler
    pub fn with_scheduler(
        config: OnyxConfig,
        source: Arc<dyn ArtSource>,
        scheduler: AnimationScheduler,
    ) -> Self {
        let clock = FrameClock::new(config.animation.frame_interval());
        Self {
            config,
            scheduler,
            clock,
            source,
            tiles: Vec::new(),
        }
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    pub fn set_repaint_sink(&self, sink: impl RepaintSink + 'static) {
        self.scheduler.set_repaint_sink(sink);
    }

    /// Add a tile, fade it in and start loading its art
    pub fn add_album(&mut self, album: Album) -> Result<ElementId> {
        let name = album.name.clone();
        let tile = AlbumTile::new(&self.scheduler.handle(), album, &self.config)
            .with_context(|| format!("Failed to create tile for '{}'", name))?;
        tile.attach()?;
        tile.load_art(Arc::clone(&self.source))?;

        let id = tile.id();
        tracing::debug!("Gallery: added '{}' as {}", name, id);
        self.tiles.push(tile);
        Ok(id)
    }

    pub fn tiles(&self) -> &[AlbumTile] {
        &self.tiles
    }

    pub fn tile(&self, id: ElementId) -> Option<&AlbumTile> {
        self.tiles.iter().find(|t| t.id() == id)
    }

    /// Deliver an event to the tile it targets
    pub fn dispatch_event(&self, event: &Event) -> Result<bool> {
        match self.tile(event.target) {
            Some(tile) => Ok(tile.handle_event(event)?),
            None => Ok(false),
        }
    }

    /// Remove a tile, stopping its animations
    pub fn remove(&mut self, id: ElementId) -> bool {
        let Some(index) = self.tiles.iter().position(|t| t.id() == id) else {
            return false;
        };
        self.tiles.remove(index).detach();
        true
    }

    /// Wait for the next frame and advance all animations
    pub fn frame(&mut self) -> bool {
        let dt = self.clock.next_frame();
        self.scheduler.tick(dt)
    }

    /// Run frames until nothing is animating; returns the frame count
    pub fn run_until_idle(&mut self) -> u64 {
        self.clock.run_until_idle(&self.scheduler)
    }

    /// Paint one tile at its own origin
    pub fn paint_tile(
        &self,
        id: ElementId,
        ctx: &mut dyn DrawContext,
        measurer: &dyn TextMeasurer,
    ) -> bool {
        match self.tile(id) {
            Some(tile) => {
                tile.paint(ctx, measurer);
                true
            }
            None => false,
        }
    }
}
