//! Iterator adapter over a cursor
//!
//! Yields the record at the cursor's current position, then steps in the
//! chosen direction. Ends when the cursor runs off either end of the
//! index. Single pass: to restart, reposition the cursor and build a new
//! adapter.

use std::iter::FusedIterator;

use super::cursor::Cursor;
use crate::store::{ObjectStore, Record};

/// Step direction for [`CursorIter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `next()` after each item
    Forward,
    /// `prev()` after each item
    Reverse,
}

/// Lazy record sequence driven by a cursor.
pub struct CursorIter<'c, 'a, S: ObjectStore + ?Sized> {
    cursor: &'c mut Cursor<'a, S>,
    direction: Direction,
}

impl<'c, 'a, S: ObjectStore + ?Sized> CursorIter<'c, 'a, S> {
    pub fn new(cursor: &'c mut Cursor<'a, S>, direction: Direction) -> Self {
        Self { cursor, direction }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl<'c, 'a, S: ObjectStore + ?Sized> Iterator for CursorIter<'c, 'a, S> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        // Entries whose record is gone from the store are skipped.
        while self.cursor.is_positioned() {
            let record = self.cursor.item();
            match self.direction {
                Direction::Forward => self.cursor.next(),
                Direction::Reverse => self.cursor.prev(),
            };
            if record.is_some() {
                return record;
            }
        }
        None
    }
}

impl<'c, 'a, S: ObjectStore + ?Sized> FusedIterator for CursorIter<'c, 'a, S> {}
