//! Onyx album browser
//!
//! Tiles and listings built on the Onyx animation engine:
//!
//! - [`AlbumTile`]: overview tile with fade-in, rollover pulse and a staged
//!   art pipeline (fetch, scale, fade)
//! - [`TrackListing`]: scrollable detail view of one album
//! - [`window`]: fade-out-and-dispose for top-level windows
//! - [`Gallery`]: owns the scheduler, frame clock and tiles
//! - [`OnyxConfig`]: timings and sizes loaded from `onyx.toml`

pub mod album;
pub mod config;
pub mod gallery;
pub mod tile;
pub mod track_listing;
pub mod window;

pub use album::{Album, Track};
pub use config::{AnimationConfig, ImageConfig, OnyxConfig, TileConfig};
pub use gallery::Gallery;
pub use tile::{AlbumTile, TileModel, TileProperty};
pub use track_listing::TrackListing;
pub use window::{
    fade_out_and_dispose, set_window_non_opaque, Capabilities, NoWindowOpacity, Window,
    WindowOpacity,
};
