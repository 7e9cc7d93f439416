//! Record store module
//!
//! Owns the ordered book collection and the identifier counter.
//! A single mutex covers each operation's read-modify-write, so identifiers
//! stay unique and no caller observes a half-applied change.

mod book;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use book::{seed_books, Book, BookPatch, NewBook};

/// Collection plus the next identifier to hand out
#[derive(Debug)]
struct Catalog {
    books: Vec<Book>,
    next_id: u64,
}

/// In-memory book store
#[derive(Debug)]
pub struct BookStore {
    catalog: Mutex<Catalog>,
}

impl BookStore {
    /// Empty store; the first created book gets id "1"
    pub const fn new() -> Self {
        Self {
            catalog: Mutex::new(Catalog {
                books: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Store pre-populated with `books`
    ///
    /// The counter starts one above the highest numeric seed id so seeded
    /// identifiers are never handed out again.
    pub fn with_books(books: Vec<Book>) -> Self {
        let next_id = books
            .iter()
            .filter_map(|b| b.id.parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1);
        Self {
            catalog: Mutex::new(Catalog { books, next_id }),
        }
    }

    /// Store holding the default startup records
    pub fn seeded() -> Self {
        Self::with_books(seed_books())
    }

    // Every mutation is a single step, so a poisoned lock still guards consistent data
    fn lock(&self) -> MutexGuard<'_, Catalog> {
        self.catalog.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All books in insertion order
    pub fn list(&self) -> Vec<Book> {
        self.lock().books.clone()
    }

    pub fn get(&self, id: &str) -> Option<Book> {
        self.lock().books.iter().find(|b| b.id == id).cloned()
    }

    /// Assign the next id, append, and return the stored record
    pub fn create(&self, new: NewBook) -> Book {
        let mut catalog = self.lock();
        let book = Book::from_new(catalog.next_id.to_string(), new);
        catalog.books.push(book.clone());
        catalog.next_id += 1;
        book
    }

    /// Overlay `patch` onto the book with `id`; `None` if there is no such book
    pub fn update(&self, id: &str, patch: BookPatch) -> Option<Book> {
        let mut catalog = self.lock();
        let book = catalog.books.iter_mut().find(|b| b.id == id)?;
        book.apply(patch);
        Some(book.clone())
    }

    /// Remove the book with `id`, reporting whether one was removed
    pub fn delete(&self, id: &str) -> bool {
        let mut catalog = self.lock();
        match catalog.books.iter().position(|b| b.id == id) {
            Some(index) => {
                catalog.books.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().books.len()
    }
}

impl Default for BookStore {
    fn default() -> Self {
        Self::new()
    }
}
