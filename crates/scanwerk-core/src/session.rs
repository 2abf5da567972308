// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ordered page collection produced by one scan flow.
//
// Edit collaborators never share a mutable page: a page is checked out (the
// caller receives its own copy plus a handle), mutated, and checked back in.
// While a page is out, nobody else can check it out or remove it.

use std::collections::HashMap;

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{Result, ScanwerkError};
use crate::types::{Page, SessionId};

/// Proof of an outstanding check-out; consumed by [`Session::checkin`].
#[derive(Debug, PartialEq, Eq)]
pub struct PageHandle {
    session: SessionId,
    index: usize,
    token: Uuid,
}

impl PageHandle {
    /// Index of the checked-out page.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Ordered sequence of pages with check-out bookkeeping.
#[derive(Debug, Default)]
pub struct Session {
    id: SessionId,
    pages: Vec<Page>,
    /// Page index -> token of the handle currently holding it.
    checked_out: HashMap<usize, Uuid>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt pages handed over by a finished capture session, renumbering
    /// them by position.
    pub fn from_pages(pages: Vec<Page>) -> Self {
        let mut session = Self::new();
        for page in pages {
            session.push(page);
        }
        session
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// Index the next appended page will receive.
    pub fn next_index(&self) -> usize {
        self.pages.len()
    }

    /// Append a page, assigning it the next index.
    pub fn push(&mut self, mut page: Page) -> usize {
        let index = self.pages.len();
        page.index = index;
        self.pages.push(page);
        index
    }

    /// Replace the page at `index` wholesale, returning the old one.
    pub fn replace(&mut self, index: usize, mut page: Page) -> Result<Page> {
        self.ensure_available(index)?;
        page.index = index;
        Ok(std::mem::replace(&mut self.pages[index], page))
    }

    /// Remove the most recently appended page, if any.
    pub fn remove_last(&mut self) -> Result<Option<Page>> {
        match self.pages.len() {
            0 => Ok(None),
            n => {
                self.ensure_available(n - 1)?;
                Ok(self.pages.pop())
            }
        }
    }

    /// Remove the page at `index` and renumber the pages after it.
    ///
    /// Refused while any page is checked out, since outstanding handles
    /// refer to pages by index.
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn remove(&mut self, index: usize) -> Result<Page> {
        if index >= self.pages.len() {
            return Err(ScanwerkError::PageNotFound(index));
        }
        if let Some(&busy) = self.checked_out.keys().min() {
            return Err(ScanwerkError::PageCheckedOut(busy));
        }
        let removed = self.pages.remove(index);
        for (i, page) in self.pages.iter_mut().enumerate().skip(index) {
            page.index = i;
        }
        debug!(index, remaining = self.pages.len(), "page removed");
        Ok(removed)
    }

    /// Check a page out for editing.
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn checkout(&mut self, index: usize) -> Result<(PageHandle, Page)> {
        self.ensure_available(index)?;
        let token = Uuid::new_v4();
        self.checked_out.insert(index, token);
        debug!(index, "page checked out");
        Ok((
            PageHandle {
                session: self.id,
                index,
                token,
            },
            self.pages[index].clone(),
        ))
    }

    /// Return an edited page. The page keeps the handle's index.
    #[instrument(skip(self, handle, page), fields(session = %self.id, index = handle.index))]
    pub fn checkin(&mut self, handle: PageHandle, mut page: Page) -> Result<()> {
        self.redeem(&handle)?;
        page.index = handle.index;
        self.pages[handle.index] = page;
        debug!("page checked in");
        Ok(())
    }

    /// Give a page back unchanged.
    pub fn release(&mut self, handle: PageHandle) -> Result<()> {
        self.redeem(&handle)
    }

    pub fn is_checked_out(&self, index: usize) -> bool {
        self.checked_out.contains_key(&index)
    }

    /// Hand the pages over by value.
    pub fn into_pages(self) -> Vec<Page> {
        self.pages
    }

    fn ensure_available(&self, index: usize) -> Result<()> {
        if index >= self.pages.len() {
            return Err(ScanwerkError::PageNotFound(index));
        }
        if self.checked_out.contains_key(&index) {
            return Err(ScanwerkError::PageCheckedOut(index));
        }
        Ok(())
    }

    fn redeem(&mut self, handle: &PageHandle) -> Result<()> {
        if handle.session != self.id || self.checked_out.get(&handle.index) != Some(&handle.token) {
            return Err(ScanwerkError::StaleHandle);
        }
        self.checked_out.remove(&handle.index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn page() -> Page {
        Page::new(99, DynamicImage::ImageRgb8(RgbImage::new(4, 4)))
    }

    fn session_with(n: usize) -> Session {
        Session::from_pages((0..n).map(|_| page()).collect())
    }

    #[test]
    fn push_assigns_sequential_indices() {
        let session = session_with(3);
        let indices: Vec<_> = session.pages().iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(session.next_index(), 3);
    }

    #[test]
    fn checkout_then_checkin_replaces_page() {
        let mut session = session_with(2);
        let (handle, mut copy) = session.checkout(1).expect("checkout");
        copy.is_edited = true;
        copy.index = 42;
        session.checkin(handle, copy).expect("checkin");

        let stored = session.page(1).expect("page");
        assert!(stored.is_edited);
        assert_eq!(stored.index, 1);
        assert!(!session.is_checked_out(1));
    }

    #[test]
    fn double_checkout_is_refused() {
        let mut session = session_with(1);
        let _held = session.checkout(0).expect("first");
        assert!(matches!(
            session.checkout(0),
            Err(ScanwerkError::PageCheckedOut(0))
        ));
    }

    #[test]
    fn foreign_handle_is_rejected() {
        let mut a = session_with(1);
        let mut b = session_with(1);
        let (handle, copy) = a.checkout(0).expect("checkout");
        assert!(matches!(b.checkin(handle, copy), Err(ScanwerkError::StaleHandle)));
    }

    #[test]
    fn release_frees_the_page() {
        let mut session = session_with(1);
        let (handle, _) = session.checkout(0).expect("checkout");
        session.release(handle).expect("release");
        assert!(session.checkout(0).is_ok());
    }

    #[test]
    fn remove_renumbers_and_respects_checkouts() {
        let mut session = session_with(3);
        let (handle, _) = session.checkout(2).expect("checkout");
        assert!(session.remove(0).is_err());
        session.release(handle).expect("release");

        session.remove(0).expect("remove");
        let indices: Vec<_> = session.pages().iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert!(matches!(session.remove(5), Err(ScanwerkError::PageNotFound(5))));
    }

    #[test]
    fn remove_last_and_replace() {
        let mut session = session_with(2);
        assert!(session.remove_last().expect("remove").is_some());
        assert_eq!(session.len(), 1);

        let mut fresh = page();
        fresh.is_edited = true;
        let old = session.replace(0, fresh).expect("replace");
        assert!(!old.is_edited);
        assert!(session.page(0).expect("page").is_edited);
        assert!(Session::new().remove_last().expect("empty").is_none());
    }
}
