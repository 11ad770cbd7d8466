//! Document sessions
//!
//! Every single-document tool (Arrange, Split, Draw, Edit, To Image) shares
//! the same lifecycle: load a file, edit tool state that is sized to the
//! document, export an [`Artifact`]. [`DocumentSession`] implements that
//! lifecycle once and delegates the tool-specific parts to a [`Tool`].
//!
//! ```text
//! Empty --load ok--> Loaded --edit--> Editing --export ok--> Exported
//!   ^                                    ^                       |
//!   |                                    +---------edit----------+
//!   +---------------------- reset (from any state) ---------------
//! any state --load error--> Failed
//! ```
//!
//! All operations take `&mut self`, so two operations can never overlap on
//! one session. A failed export leaves both the state and the tool data as
//! they were.
//!
//! Merge works on a list of files rather than on one document and has its
//! own [`MergeSession`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use image::RgbaImage;
use uuid::Uuid;

use crate::color::Rgb;
use crate::config::Config;
use crate::document::SourceDocument;
use crate::drag::DragController;
use crate::error::{Error, Result};
use crate::export::{self, Artifact, ImageExport, ImageFormat};
use crate::geometry::{CanvasBox, Point, Viewport};
use crate::ink::{Brush, InkCanvas};
use crate::merge::{MergeEntry, MergeList};
use crate::order::{PageIndex, PageOrder, SelectionSet};
use crate::raster::{self, Rasterizer};
use crate::text::{TextBlock, TextBlockPatch, TextBlocks, DEFAULT_FONT_SIZE};
use crate::tool::ToolId;

/// Scale of the large page preview in Arrange.
pub const PREVIEW_SCALE: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Empty,
    Loaded,
    Editing,
    Exported,
    /// The last load attempt failed; holds the reason.
    Failed(String),
}

impl SessionState {
    pub fn has_document(&self) -> bool {
        matches!(
            self,
            SessionState::Loaded | SessionState::Editing | SessionState::Exported
        )
    }
}

/// What a tool may read while exporting.
pub struct ToolEnv<'a> {
    pub config: &'a Config,
    pub rasterizer: &'a dyn Rasterizer,
}

/// Tool-specific half of a [`DocumentSession`].
pub trait Tool: Default {
    const ID: ToolId;

    /// Fresh state for a newly loaded document.
    fn init(source: &SourceDocument, config: &Config) -> Self;

    fn export(&self, source: &SourceDocument, env: &ToolEnv<'_>) -> Result<Artifact>;
}

/// One loaded document plus the state of the tool working on it.
pub struct DocumentSession<T: Tool> {
    config: Config,
    rasterizer: Rc<dyn Rasterizer>,
    state: SessionState,
    source: Option<SourceDocument>,
    tool: T,
}

impl<T: Tool + fmt::Debug> fmt::Debug for DocumentSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentSession")
            .field("tool", &T::ID)
            .field("state", &self.state)
            .field("source", &self.source.as_ref().map(SourceDocument::name))
            .field("data", &self.tool)
            .finish()
    }
}

impl<T: Tool> DocumentSession<T> {
    pub fn new(config: Config, rasterizer: Rc<dyn Rasterizer>) -> Self {
        Self {
            config,
            rasterizer,
            state: SessionState::Empty,
            source: None,
            tool: T::default(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn source(&self) -> Option<&SourceDocument> {
        self.source.as_ref()
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the current document. Tool state is rebuilt for the new page
    /// count. On failure the session moves to [`SessionState::Failed`] and
    /// the previous document is dropped.
    pub fn load(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<()> {
        self.accept(SourceDocument::load(name, bytes))
    }

    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.accept(SourceDocument::open(path))
    }

    fn accept(&mut self, loaded: Result<SourceDocument>) -> Result<()> {
        match loaded {
            Ok(source) => {
                log::info!(
                    "{}: loaded {} ({} pages)",
                    T::ID,
                    source.name(),
                    source.page_count()
                );
                self.tool = T::init(&source, &self.config);
                self.source = Some(source);
                self.state = SessionState::Loaded;
                Ok(())
            }
            Err(e) => {
                log::warn!("{}: load failed: {e}", T::ID);
                self.tool = T::default();
                self.source = None;
                self.state = SessionState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Drop the document and all tool state.
    pub fn reset(&mut self) {
        self.tool = T::default();
        self.source = None;
        self.state = SessionState::Empty;
    }

    /// Mutate tool state. Fails with [`Error::NoDocument`] when nothing is
    /// loaded.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut T, &SourceDocument) -> R) -> Result<R> {
        let source = self.source.as_ref().ok_or(Error::NoDocument)?;
        let out = f(&mut self.tool, source);
        self.state = SessionState::Editing;
        Ok(out)
    }

    /// Thumbnails of every page, one page at a time.
    pub fn thumbnails(&self) -> Result<Vec<RgbaImage>> {
        let source = self.source.as_ref().ok_or(Error::NoDocument)?;
        raster::thumbnails(self.rasterizer.as_ref(), source, self.config.thumbnail_scale)
    }

    /// Render one page of the loaded document, e.g. the canvas background
    /// of Draw and Edit at the edit scale.
    pub fn render(&self, page: PageIndex, scale: f64) -> Result<RgbaImage> {
        let source = self.source.as_ref().ok_or(Error::NoDocument)?;
        self.rasterizer.render_page(source, page, scale)
    }

    pub fn export(&mut self) -> Result<Artifact> {
        let source = self.source.as_ref().ok_or(Error::NoDocument)?;
        let env = ToolEnv {
            config: &self.config,
            rasterizer: self.rasterizer.as_ref(),
        };
        let artifact = self.tool.export(source, &env)?;
        self.state = SessionState::Exported;
        Ok(artifact)
    }
}

impl DocumentSession<ArrangeTool> {
    /// Large rendering of the page at position `pos` of the current order.
    pub fn preview(&self, pos: usize) -> Result<RgbaImage> {
        let source = self.source.as_ref().ok_or(Error::NoDocument)?;
        let order = &self.tool.order;
        let page = order.get(pos).ok_or(Error::PageOutOfRange {
            page: pos,
            page_count: order.len(),
        })?;
        self.rasterizer.render_page(source, page, PREVIEW_SCALE)
    }
}

/// Reorder, duplicate and delete pages.
#[derive(Debug, Clone, Default)]
pub struct ArrangeTool {
    order: PageOrder,
    drag: DragController,
}

impl ArrangeTool {
    pub fn order(&self) -> &PageOrder {
        &self.order
    }

    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        self.order.reorder(from, to)
    }

    pub fn delete_at(&mut self, pos: usize) -> bool {
        self.order.delete_at(pos)
    }

    pub fn duplicate_at(&mut self, pos: usize) -> bool {
        self.order.duplicate_at(pos)
    }

    pub fn drag_start(&mut self, pos: usize) {
        self.drag.start(pos);
    }

    pub fn drag_over(&mut self, pos: usize) -> bool {
        self.drag.over(self.order.items_mut(), pos)
    }

    pub fn drag_end(&mut self) {
        self.drag.end();
    }
}

impl Tool for ArrangeTool {
    const ID: ToolId = ToolId::Arrange;

    fn init(source: &SourceDocument, _config: &Config) -> Self {
        Self {
            order: PageOrder::identity(source.page_count()),
            drag: DragController::new(),
        }
    }

    fn export(&self, source: &SourceDocument, _env: &ToolEnv<'_>) -> Result<Artifact> {
        export::export_arrange(source, &self.order)
    }
}

/// Extract selected pages.
#[derive(Debug, Clone, Default)]
pub struct SplitTool {
    selection: SelectionSet,
}

impl SplitTool {
    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionSet {
        &mut self.selection
    }
}

impl Tool for SplitTool {
    const ID: ToolId = ToolId::Split;

    fn init(source: &SourceDocument, _config: &Config) -> Self {
        Self {
            selection: SelectionSet::new(source.page_count()),
        }
    }

    fn export(&self, source: &SourceDocument, _env: &ToolEnv<'_>) -> Result<Artifact> {
        export::export_split(source, &self.selection)
    }
}

/// Freehand ink over pages.
///
/// Points are in canvas pixels of the current page at the edit scale; use
/// [`CanvasBox::to_device`] to convert pointer positions first.
#[derive(Debug, Clone, Default)]
pub struct DrawTool {
    current_page: PageIndex,
    viewports: Vec<Viewport>,
    brush: Brush,
    overlays: BTreeMap<PageIndex, RgbaImage>,
    canvas: Option<InkCanvas>,
}

impl DrawTool {
    pub fn current_page(&self) -> PageIndex {
        self.current_page
    }

    pub fn page_count(&self) -> usize {
        self.viewports.len()
    }

    /// Canvas size of the current page.
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewports.get(self.current_page).copied()
    }

    pub fn brush(&self) -> Brush {
        self.brush
    }

    pub fn set_color(&mut self, color: Rgb) {
        self.brush.color = color;
    }

    pub fn set_size(&mut self, size: f64) {
        self.brush.size = size;
    }

    pub fn canvas(&self) -> Option<&InkCanvas> {
        self.canvas.as_ref()
    }

    pub fn overlay(&self, page: PageIndex) -> Option<&RgbaImage> {
        self.overlays.get(&page)
    }

    pub fn overlays(&self) -> &BTreeMap<PageIndex, RgbaImage> {
        &self.overlays
    }

    /// Show `page`, restoring any ink already drawn on it. A stroke in
    /// progress is finished first.
    pub fn go_to_page(&mut self, page: PageIndex) -> bool {
        if page >= self.page_count() || page == self.current_page {
            return false;
        }
        self.end_stroke();
        self.current_page = page;
        self.canvas = Some(self.canvas_for(page));
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.current_page + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        match self.current_page.checked_sub(1) {
            Some(page) => self.go_to_page(page),
            None => false,
        }
    }

    pub fn begin_stroke(&mut self, at: Point) {
        let brush = self.brush;
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.begin_stroke(at, brush);
        }
    }

    pub fn extend_stroke(&mut self, to: Point) {
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.extend_stroke(to);
        }
    }

    /// Finish the stroke and snapshot the whole canvas as the page overlay.
    pub fn end_stroke(&mut self) -> bool {
        let Some(canvas) = self.canvas.as_mut() else {
            return false;
        };
        if !canvas.end_stroke() {
            return false;
        }
        self.overlays
            .insert(self.current_page, canvas.image().clone());
        true
    }

    /// Replace the overlay of `page` with a prepared raster, e.g. one read
    /// from a file. The raster is stretched over the page at export.
    pub fn set_overlay(&mut self, page: PageIndex, image: RgbaImage) -> Result<()> {
        if page >= self.page_count() {
            return Err(Error::PageOutOfRange {
                page,
                page_count: self.page_count(),
            });
        }
        if page == self.current_page {
            self.canvas = Some(InkCanvas::from_image(image.clone()));
        }
        self.overlays.insert(page, image);
        Ok(())
    }

    /// Erase all ink on the current page.
    pub fn clear_page(&mut self) {
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.clear();
        }
        self.overlays.remove(&self.current_page);
    }

    fn canvas_for(&self, page: PageIndex) -> InkCanvas {
        match self.overlays.get(&page) {
            Some(image) => InkCanvas::from_image(image.clone()),
            None => InkCanvas::new(self.viewports[page]),
        }
    }
}

impl Tool for DrawTool {
    const ID: ToolId = ToolId::Draw;

    fn init(source: &SourceDocument, config: &Config) -> Self {
        let viewports: Vec<Viewport> = source
            .page_boxes()
            .iter()
            .map(|b| b.viewport(config.edit_scale))
            .collect();
        let canvas = viewports.first().map(|&v| InkCanvas::new(v));
        Self {
            current_page: 0,
            viewports,
            brush: Brush::default(),
            overlays: BTreeMap::new(),
            canvas,
        }
    }

    fn export(&self, source: &SourceDocument, _env: &ToolEnv<'_>) -> Result<Artifact> {
        export::export_draw(source, &self.overlays)
    }
}

/// Text placement over pages.
///
/// Positions and font sizes are in canvas pixels of the page at the edit
/// scale.
#[derive(Debug, Clone)]
pub struct EditTool {
    current_page: PageIndex,
    page_count: usize,
    font_size: f64,
    color: Rgb,
    blocks: TextBlocks,
    selected: Option<Uuid>,
}

impl Default for EditTool {
    fn default() -> Self {
        Self {
            current_page: 0,
            page_count: 0,
            font_size: DEFAULT_FONT_SIZE,
            color: Rgb::BLACK,
            blocks: TextBlocks::new(),
            selected: None,
        }
    }
}

impl EditTool {
    pub fn current_page(&self) -> PageIndex {
        self.current_page
    }

    pub fn go_to_page(&mut self, page: PageIndex) -> bool {
        if page >= self.page_count || page == self.current_page {
            return false;
        }
        self.current_page = page;
        self.selected = None;
        true
    }

    /// Font size given to new blocks.
    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    pub fn set_font_size(&mut self, size: f64) {
        self.font_size = size;
    }

    /// Color given to new blocks.
    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn set_color(&mut self, color: Rgb) {
        self.color = color;
    }

    pub fn blocks(&self) -> &TextBlocks {
        &self.blocks
    }

    pub fn current_blocks(&self) -> &[TextBlock] {
        self.blocks.on_page(self.current_page)
    }

    pub fn selected(&self) -> Option<Uuid> {
        self.selected
    }

    pub fn select(&mut self, id: Uuid) -> bool {
        if self.blocks.get(id).is_none() {
            return false;
        }
        self.selected = Some(id);
        true
    }

    /// New block with the default text at `at` on the current page. The new
    /// block becomes the selection.
    pub fn place(&mut self, at: Point) -> Uuid {
        let block = TextBlock::new(self.current_page, at, self.font_size, self.color);
        let id = self.blocks.add(block);
        self.selected = Some(id);
        id
    }

    /// [`EditTool::place`] at a pointer position over `canvas`.
    pub fn place_at_client(&mut self, canvas: &CanvasBox, client: Point) -> Uuid {
        self.place(canvas.to_device(client))
    }

    pub fn update(&mut self, id: Uuid, patch: TextBlockPatch) -> bool {
        self.blocks.update(id, patch)
    }

    pub fn set_text(&mut self, id: Uuid, text: impl Into<String>) -> bool {
        self.update(
            id,
            TextBlockPatch {
                text: Some(text.into()),
                ..Default::default()
            },
        )
    }

    pub fn delete(&mut self, id: Uuid) -> bool {
        let removed = self.blocks.remove(id).is_some();
        if self.selected == Some(id) {
            self.selected = None;
        }
        removed
    }

    /// Add a fully specified block, e.g. one read from a file. Blocks on
    /// pages outside the document are refused.
    pub fn insert(&mut self, block: TextBlock) -> Result<Uuid> {
        if block.page >= self.page_count {
            return Err(Error::PageOutOfRange {
                page: block.page,
                page_count: self.page_count,
            });
        }
        Ok(self.blocks.add(block))
    }
}

impl Tool for EditTool {
    const ID: ToolId = ToolId::Edit;

    fn init(source: &SourceDocument, _config: &Config) -> Self {
        Self {
            page_count: source.page_count(),
            ..Self::default()
        }
    }

    fn export(&self, source: &SourceDocument, env: &ToolEnv<'_>) -> Result<Artifact> {
        export::export_edit(source, &self.blocks, env.config.edit_scale)
    }
}

/// Rasterize selected pages.
#[derive(Debug, Clone, Default)]
pub struct ImageTool {
    selection: SelectionSet,
    format: ImageFormat,
}

impl ImageTool {
    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionSet {
        &mut self.selection
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn set_format(&mut self, format: ImageFormat) {
        self.format = format;
    }
}

impl Tool for ImageTool {
    const ID: ToolId = ToolId::ToImage;

    fn init(source: &SourceDocument, _config: &Config) -> Self {
        Self {
            selection: SelectionSet::new(source.page_count()),
            format: ImageFormat::default(),
        }
    }

    fn export(&self, source: &SourceDocument, env: &ToolEnv<'_>) -> Result<Artifact> {
        if env.rasterizer.is_placeholder() {
            return Err(Error::Render(
                "no page renderer available; build with --features pdfium".into(),
            ));
        }
        let settings = ImageExport {
            format: self.format,
            scale: env.config.export_scale,
            quality: env.config.jpeg_quality,
        };
        export::export_images(env.rasterizer, source, &self.selection, settings)
    }
}

pub type ArrangeSession = DocumentSession<ArrangeTool>;
pub type SplitSession = DocumentSession<SplitTool>;
pub type DrawSession = DocumentSession<DrawTool>;
pub type EditSession = DocumentSession<EditTool>;
pub type ImageSession = DocumentSession<ImageTool>;

/// The Merge tool's list of files.
#[derive(Debug, Default)]
pub struct MergeSession {
    list: MergeList,
    state: SessionState,
}

impl MergeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn list(&self) -> &MergeList {
        &self.list
    }

    pub fn entries(&self) -> &[MergeEntry] {
        self.list.entries()
    }

    /// Append files. Either every file loads and all are appended, or the
    /// list is left unchanged.
    pub fn add_files(&mut self, files: Vec<(String, Vec<u8>)>) -> Result<Vec<Uuid>> {
        let documents = files
            .into_iter()
            .map(|(name, bytes)| SourceDocument::load(name, bytes))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.add_documents(documents))
    }

    /// Append already loaded documents.
    pub fn add_documents(&mut self, documents: Vec<SourceDocument>) -> Vec<Uuid> {
        let ids = self.list.add(documents);
        if !ids.is_empty() {
            self.touch();
        }
        ids
    }

    pub fn remove(&mut self, id: Uuid) -> bool {
        let removed = self.list.remove(id);
        if removed {
            self.touch();
        }
        removed
    }

    pub fn drag_start(&mut self, pos: usize) {
        self.list.drag_start(pos);
    }

    pub fn drag_over(&mut self, pos: usize) -> bool {
        let moved = self.list.drag_over(pos);
        if moved {
            self.touch();
        }
        moved
    }

    pub fn drag_end(&mut self) {
        self.list.drag_end();
    }

    pub fn can_merge(&self) -> bool {
        self.list.can_merge()
    }

    pub fn export(&mut self) -> Result<Artifact> {
        let artifact = export::export_merge(self.list.entries())?;
        self.state = SessionState::Exported;
        Ok(artifact)
    }

    pub fn reset(&mut self) {
        self.list.clear();
        self.state = SessionState::Empty;
    }

    fn touch(&mut self) {
        self.state = if self.list.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Editing
        };
    }
}
