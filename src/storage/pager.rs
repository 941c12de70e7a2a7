use std::{
    fs::File,
    io::{Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    storage::header::DatabaseHeader,
    types::{HEADER_SIZE, PageNumber, error::DatabaseError, page::Page},
};

/// Byte-level access to an open database file.
///
/// The pager is the only holder of the reader. Every read seeks to an absolute offset
/// first, so reads are correctly sequenced but must not be interleaved across threads;
/// `&mut self` on every read enforces that.
pub struct Pager<R = File> {
    reader: R,
    header: DatabaseHeader,
    file_size: u64,
    path: Option<PathBuf>,
}

impl Pager<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        info!("Opening database at path: {}", path.display());
        let file = File::open(path)?;
        let mut pager = Self::new(file)?;
        pager.path = Some(path.to_path_buf());
        Ok(pager)
    }
}

impl<R: Read + Seek> Pager<R> {
    /// Read and validate the database header from `reader`.
    pub fn new(mut reader: R) -> Result<Self, DatabaseError> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        if file_size < HEADER_SIZE as u64 {
            return Err(DatabaseError::InvalidHeader {
                reason: format!("File too small: {} bytes", file_size),
            });
        }

        let mut header_buffer = vec![0u8; HEADER_SIZE];
        reader.seek(SeekFrom::Start(0))?;
        reader.read_exact(&mut header_buffer)?;
        let header = DatabaseHeader::from_bytes(&header_buffer)?;
        debug!(
            page_size = header.page_size,
            file_size, "Read database header"
        );

        Ok(Self {
            reader,
            header,
            file_size,
            path: None,
        })
    }

    pub fn header(&self) -> &DatabaseHeader {
        &self.header
    }

    pub fn page_size(&self) -> u32 {
        self.header.page_size
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of whole pages in the file.
    pub fn page_count(&self) -> u64 {
        self.file_size / self.page_size() as u64
    }

    /// Absolute file offset of the first byte of `page`.
    pub fn page_start(&self, page: PageNumber) -> u64 {
        (page as u64 - 1) * self.page_size() as u64
    }

    /// Absolute file offset of the page header of `page`, skipping the database header on page 1.
    pub fn page_body_start(&self, page: PageNumber) -> u64 {
        let start = self.page_start(page);
        if page == 1 {
            start + HEADER_SIZE as u64
        } else {
            start
        }
    }

    /// Seek to `offset` and read exactly `len` bytes.
    pub fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>, DatabaseError> {
        let mut buffer = vec![0u8; len];
        self.reader.seek(SeekFrom::Start(offset))?;
        self.reader.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Load `page` into memory.
    ///
    /// Returns `Ok(None)` when the page exists but is not a B-tree page.
    pub fn read_page(&mut self, page: PageNumber) -> Result<Option<Page>, DatabaseError> {
        if page == 0 || page as u64 > self.page_count() {
            return Err(DatabaseError::PageOutOfRange {
                page,
                page_count: self.page_count(),
            });
        }
        let data = self.read_at(self.page_start(page), self.page_size() as usize)?;
        Ok(Page::from_bytes(page, data))
    }
}
