pub mod color;
pub mod config;
pub mod error;
pub mod export;
pub mod frame;
pub mod label;
pub mod loader;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod player;
pub mod reconcile;
pub mod scale;
pub mod scene;
pub mod sparkline;
pub mod timeline;
pub mod treemap;

pub use config::RenderConfig;
pub use error::*;
pub use loader::*;
pub use model::*;
pub use timeline::{Controller, Frame, SelectionState, SurfaceFrame};
