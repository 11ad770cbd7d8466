//! Application root.
//!
//! [`App`] is built once from a [`Config`] and owns everything the tools
//! share: the navigator that tracks the active tool and one session per
//! tool. Nothing is global; the navigation value only changes through
//! [`App::select_tool`] and [`App::tick`].

use std::rc::Rc;
use std::time::Instant;

use crate::config::Config;
use crate::raster::{self, Rasterizer};
use crate::session::{
    ArrangeSession, DocumentSession, DrawSession, EditSession, ImageSession, MergeSession,
    SplitSession,
};
use crate::tool::{Navigator, ToolId};

pub struct App {
    config: Config,
    navigator: Navigator,
    pub draw: DrawSession,
    pub edit: EditSession,
    pub split: SplitSession,
    pub merge: MergeSession,
    pub arrange: ArrangeSession,
    pub to_image: ImageSession,
}

impl App {
    /// App using the build's default rasterizer.
    pub fn new(config: Config) -> Self {
        Self::with_rasterizer(config, Rc::from(raster::default_rasterizer()))
    }

    pub fn with_rasterizer(config: Config, rasterizer: Rc<dyn Rasterizer>) -> Self {
        let navigator = Navigator::new(config.default_tool, config.navigation_throttle());
        Self::build(config, navigator, rasterizer)
    }

    /// App restored from a navigation query string such as `tool=merge`.
    pub fn from_query(config: Config, query: &str) -> Self {
        let navigator =
            Navigator::from_query(query, config.default_tool, config.navigation_throttle());
        Self::build(config, navigator, Rc::from(raster::default_rasterizer()))
    }

    fn build(config: Config, navigator: Navigator, rasterizer: Rc<dyn Rasterizer>) -> Self {
        Self {
            draw: DocumentSession::new(config.clone(), Rc::clone(&rasterizer)),
            edit: DocumentSession::new(config.clone(), Rc::clone(&rasterizer)),
            split: DocumentSession::new(config.clone(), Rc::clone(&rasterizer)),
            merge: MergeSession::new(),
            arrange: DocumentSession::new(config.clone(), Rc::clone(&rasterizer)),
            to_image: DocumentSession::new(config.clone(), rasterizer),
            navigator,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn active_tool(&self) -> ToolId {
        self.navigator.active()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Switch tools. Sessions keep their state when they are not shown.
    pub fn select_tool(&mut self, tool: ToolId, now: Instant) {
        self.navigator.select(tool, now);
    }

    /// Write a deferred navigation change once its window has passed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.navigator.flush(now)
    }

    pub fn query_string(&self) -> String {
        self.navigator.query_string()
    }
}
