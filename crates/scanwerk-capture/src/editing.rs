// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Post-capture page edits on a finished session's pages.
//
// Every edit checks the page out, works on the copy, and checks it back in.
// A failed edit releases the handle and leaves the stored page untouched.

use std::sync::Arc;

use image::Rgba;
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::geometry::{Quadrilateral, Rect, Size};
use scanwerk_core::{DetectorConfig, Page, Session};
use scanwerk_document::{EditorViewport, PageEditor, Rectifier};
use tracing::{info, instrument, warn};

/// Applies rotate / re-crop / redact / delete to pages of a [`Session`].
#[derive(Clone)]
pub struct SessionEditor {
    editor: PageEditor,
}

impl SessionEditor {
    pub fn new(rectifier: Arc<dyn Rectifier>, config: &DetectorConfig) -> Self {
        Self {
            editor: PageEditor::new(rectifier, config.collinearity_tolerance),
        }
    }

    /// Quarter turn counter-clockwise.
    #[instrument(skip(self, session))]
    pub fn rotate(&self, session: &mut Session, index: usize) -> Result<()> {
        self.edit(session, index, |editor, page| Ok(editor.rotate(page)))
    }

    /// Seed the adjust-corners editor: the page's stored quad (or the default
    /// quad) scaled into a view of `view_size`.
    pub fn initial_view_quad(&self, session: &Session, index: usize, view_size: Size) -> Result<Quadrilateral> {
        let page = session
            .page(index)
            .ok_or(ScanwerkError::PageNotFound(index))?;
        let viewport = EditorViewport::new(view_size, raw_size(page))?;
        Ok(viewport.initial_view_quad(page.quad.as_ref()))
    }

    /// Re-rectify with corners the user adjusted in a view of `view_size`.
    #[instrument(skip(self, session, view_quad))]
    pub fn recrop(&self, session: &mut Session, index: usize, view_quad: &Quadrilateral, view_size: Size) -> Result<()> {
        self.edit(session, index, |editor, page| {
            let viewport = EditorViewport::new(view_size, raw_size(&page))?;
            editor.recrop(page, view_quad, &viewport)
        })
    }

    /// Paint `rects` (image pixels) with `colour`.
    #[instrument(skip(self, session, rects, colour), fields(regions = rects.len()))]
    pub fn redact(&self, session: &mut Session, index: usize, rects: &[Rect], colour: Rgba<u8>) -> Result<()> {
        self.edit(session, index, |editor, page| Ok(editor.redact(page, rects, colour)))
    }

    /// Remove a page; later pages move down one index.
    #[instrument(skip(self, session))]
    pub fn delete(&self, session: &mut Session, index: usize) -> Result<Page> {
        let removed = session.remove(index)?;
        info!(remaining = session.len(), "page deleted");
        Ok(removed)
    }

    fn edit(
        &self,
        session: &mut Session,
        index: usize,
        apply: impl FnOnce(&PageEditor, Page) -> Result<Page>,
    ) -> Result<()> {
        let (handle, page) = session.checkout(index)?;
        match apply(&self.editor, page) {
            Ok(edited) => session.checkin(handle, edited),
            Err(err) => {
                warn!(%err, index, "page edit failed; keeping the stored page");
                session.release(handle)?;
                Err(err)
            }
        }
    }
}

fn raw_size(page: &Page) -> Size {
    Size::from_pixels(page.raw_image.width(), page.raw_image.height())
}
