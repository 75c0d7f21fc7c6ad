//! A catalogued title with a finite number of physical copies.
//!
//! The ledger keeps `copies_available` within `0..=copies_total` at all times.
//! The lower bound is carried by the unsigned type; the upper bound is checked
//! by [`Book::copies_within_bounds`] whenever a book is written.
//!
//! See the [`ledger`](crate::ledger) module for how a book is stored and the
//! [`lending`](crate::lending) module for the only code paths that move its
//! counters after registration.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Longest ISBN accepted (ISBN-13).
pub const MAX_ISBN_LEN: usize = 13;

/// Type-safe identifier for Books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookId(pub u32);

impl From<u32> for BookId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "book_{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub published_date: Option<NaiveDate>,
    pub copies_total: u32,
    pub copies_available: u32,
}

impl Book {
    /// Creates a new Book instance.
    ///
    /// # Arguments
    /// * `id` - Unique identifier (assigned by the ledger)
    /// * `params` - Registration payload, validated by the caller
    pub fn from_create(id: BookId, params: BookCreate) -> Self {
        Self {
            id,
            title: params.title,
            author: params.author,
            isbn: params.isbn,
            published_date: params.published_date,
            copies_total: params.copies_total,
            copies_available: params.copies_available,
        }
    }

    pub fn copies_within_bounds(&self) -> bool {
        self.copies_available <= self.copies_total
    }

    pub fn is_available(&self) -> bool {
        self.copies_available > 0
    }

    /// Number of copies currently lent out.
    pub fn copies_on_loan(&self) -> u32 {
        self.copies_total.saturating_sub(self.copies_available)
    }

    /// Applies an update and re-validates the merged result.
    ///
    /// The book is left untouched when validation fails.
    pub fn apply_update(&mut self, update: BookUpdate) -> Result<(), String> {
        let mut next = self.clone();
        if let Some(title) = update.title {
            next.title = title;
        }
        if let Some(author) = update.author {
            next.author = author;
        }
        if let Some(published_date) = update.published_date {
            next.published_date = Some(published_date);
        }
        if let Some(copies_total) = update.copies_total {
            next.copies_total = copies_total;
        }
        if let Some(copies_available) = update.copies_available {
            next.copies_available = copies_available;
        }
        if !next.copies_within_bounds() {
            return Err(format!(
                "Copies available cannot exceed total copies ({} > {})",
                next.copies_available, next.copies_total
            ));
        }
        *self = next;
        Ok(())
    }
}

impl Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} by {}", self.title, self.author)
    }
}

/// Payload for registering a new book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookCreate {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub published_date: Option<NaiveDate>,
    pub copies_total: u32,
    pub copies_available: u32,
}

impl BookCreate {
    /// A single-copy registration, matching the catalogue defaults.
    pub fn new(title: impl Into<String>, author: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            published_date: None,
            copies_total: 1,
            copies_available: 1,
        }
    }

    /// Sets both counters to `copies`.
    pub fn with_copies(mut self, copies: u32) -> Self {
        self.copies_total = copies;
        self.copies_available = copies;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.isbn.is_empty() || self.isbn.chars().count() > MAX_ISBN_LEN {
            return Err(format!(
                "ISBN must be 1 to {} characters, got {:?}",
                MAX_ISBN_LEN, self.isbn
            ));
        }
        if self.copies_available > self.copies_total {
            return Err(format!(
                "Copies available cannot exceed total copies ({} > {})",
                self.copies_available, self.copies_total
            ));
        }
        Ok(())
    }
}

/// Payload for catalogue maintenance. Absent fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub published_date: Option<NaiveDate>,
    pub copies_total: Option<u32>,
    pub copies_available: Option<u32>,
}
