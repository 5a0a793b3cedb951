//! Page cache over a single on-disk file.
//!
//! The pager lazily loads pages from disk into `RefCell<Page>` slots,
//! counts the total number of pages, and flushes dirty slots back to
//! disk on request. It knows nothing about B+ trees or rows — it is
//! purely bytes in, bytes out.

use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use heapless::Vec as HVec;
use tracing::{debug, trace, warn};

use crate::errors::Error;
use crate::storage::node::{Page, PAGE_SIZE, TABLE_MAX_PAGES};

/// A page slot: `None` until the page has been read from disk or
/// allocated fresh. `RefCell` lets a single mutable borrow scope around
/// one page's mutation while other pages stay readable, matching the
/// engine's single-threaded execution model.
#[derive(Debug)]
pub struct Pager {
    file: File,
    file_length: u64,
    num_pages: u32,
    pages: HVec<Option<RefCell<Page>>, TABLE_MAX_PAGES>,
}

impl Pager {
    /// Opens (creating if absent) the backing file and primes the page
    /// count from its length. A file whose length is not a whole number
    /// of pages is corrupt.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Pager, Error> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path.as_ref())?;
        let file_length = file.seek(SeekFrom::End(0))?;
        if file_length % PAGE_SIZE as u64 != 0 {
            return Err(Error::CorruptFile(format!(
                "database file length {} is not a multiple of the page size {}",
                file_length, PAGE_SIZE
            )));
        }
        let num_pages = (file_length / PAGE_SIZE as u64) as u32;
        debug!(path = %path.as_ref().display(), num_pages, "opened pager");

        let mut pages = HVec::new();
        for _ in 0..TABLE_MAX_PAGES {
            let _ = pages.push(None);
        }

        Ok(Pager {
            file,
            file_length,
            num_pages,
            pages,
        })
    }

    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// Returns the given page, loading it from disk on first access. A
    /// page number at exactly `num_pages` allocates a fresh zeroed page
    /// and bumps the count; anything further out is a programmer error.
    pub fn get_page(&mut self, page_num: u32) -> Result<&RefCell<Page>, Error> {
        let page_num = page_num as usize;
        if page_num >= TABLE_MAX_PAGES {
            return Err(Error::PageOutOfBounds(format!(
                "page number {} exceeds the maximum of {} pages",
                page_num, TABLE_MAX_PAGES
            )));
        }

        if self.pages[page_num].is_none() {
            let page = if (page_num as u32) < self.num_pages {
                trace!(page_num, "loading page from disk");
                self.read_page_from_disk(page_num as u32)?
            } else {
                trace!(page_num, "allocating fresh page");
                Page::zeroed()
            };
            self.pages[page_num] = Some(RefCell::new(page));
            if page_num as u32 >= self.num_pages {
                self.num_pages = page_num as u32 + 1;
            }
        }

        Ok(self.pages[page_num].as_ref().unwrap())
    }

    /// Allocates the next unused page number without loading anything
    /// into it; the caller is expected to initialize it immediately.
    pub fn allocate_page(&mut self) -> Result<u32, Error> {
        let page_num = self.num_pages;
        self.get_page(page_num)?;
        Ok(page_num)
    }

    fn read_page_from_disk(&mut self, page_num: u32) -> Result<Page, Error> {
        let mut buf = [0u8; PAGE_SIZE];
        self.file
            .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
        self.file.read_exact(&mut buf)?;
        Ok(Page::from_bytes(buf))
    }

    /// Writes one page's current contents back to disk.
    pub fn flush_page(&mut self, page_num: u32) -> Result<(), Error> {
        let slot = self.pages[page_num as usize]
            .as_ref()
            .ok_or_else(|| Error::PageOutOfBounds(format!("page {} was never loaded", page_num)))?;
        let bytes = *slot.borrow().as_bytes();
        self.file
            .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
        self.file.write_all(&bytes)?;
        let end = (page_num as u64 + 1) * PAGE_SIZE as u64;
        if end > self.file_length {
            self.file_length = end;
        }
        Ok(())
    }

    /// Flushes every loaded page, then syncs the file to disk. Called
    /// once, at `.exit`.
    pub fn flush_all(&mut self) -> Result<(), Error> {
        for page_num in 0..self.num_pages {
            if self.pages[page_num as usize].is_some() {
                self.flush_page(page_num)?;
            }
        }
        self.file.sync_all()?;
        warn_if_unflushed(self);
        Ok(())
    }
}

fn warn_if_unflushed(pager: &Pager) {
    if pager.num_pages == 0 {
        warn!("closing a pager with no pages written");
    }
}
