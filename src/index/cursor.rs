//! Attribute index cursor
//!
//! A cursor is either unpositioned or positioned at (key, duplicate index)
//! within one [`AttrIndex`]. Seeks and steps report "not found" as `false`
//! and leave the cursor unpositioned; only malformed input (tokens, option
//! names) produces an [`IndexError`].
//!
//! # Operations
//!
//! - `begin` / `end` - first duplicate of the smallest key, last duplicate
//!   of the largest key
//! - `next` / `prev` - step within a duplicate chain, then across keys; no
//!   wraparound
//! - `find_exact` / `find_inf` / `find_sup` - exact, floor and ceiling seeks
//! - `get_pos` / `set_pos` - capture and restore a [`PositionToken`]
//! - `item` - materialize the current record through the object store
//!
//! The cursor borrows its index immutably, so the index cannot change while
//! any cursor on it is alive. Tokens outlive cursors and are checked against
//! the index id and generation when restored.

use super::btree::AttrIndex;
use super::errors::{IndexError, IndexResult};
use super::iter::{CursorIter, Direction};
use super::key::Key;
use super::position::PositionToken;
use crate::config::CursorOptions;
use crate::observability::{log_event, Event};
use crate::store::{ObjRef, ObjectStore, Record};

/// Cursor position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorState {
    Unpositioned,
    Positioned { key: Key, dup: usize },
}

/// Traversal handle over one attribute index.
pub struct Cursor<'a, S: ObjectStore + ?Sized> {
    index: &'a AttrIndex,
    store: &'a S,
    state: CursorState,
    options: CursorOptions,
}

impl<'a, S: ObjectStore + ?Sized> Cursor<'a, S> {
    /// New unpositioned cursor with default options.
    pub fn new(index: &'a AttrIndex, store: &'a S) -> Self {
        Self::with_options(index, store, CursorOptions::default())
    }

    pub fn with_options(index: &'a AttrIndex, store: &'a S, options: CursorOptions) -> Self {
        Self {
            index,
            store,
            state: CursorState::Unpositioned,
            options,
        }
    }

    pub fn index(&self) -> &'a AttrIndex {
        self.index
    }

    pub fn state(&self) -> &CursorState {
        &self.state
    }

    pub fn options(&self) -> CursorOptions {
        self.options
    }

    pub fn is_positioned(&self) -> bool {
        matches!(self.state, CursorState::Positioned { .. })
    }

    /// Key at the current position
    pub fn key(&self) -> Option<&Key> {
        match &self.state {
            CursorState::Positioned { key, .. } => Some(key),
            CursorState::Unpositioned => None,
        }
    }

    /// Position within the current key's duplicate chain
    pub fn dup_index(&self) -> Option<usize> {
        match &self.state {
            CursorState::Positioned { dup, .. } => Some(*dup),
            CursorState::Unpositioned => None,
        }
    }

    /// Object reference at the current position
    pub fn obj_ref(&self) -> Option<ObjRef> {
        match &self.state {
            CursorState::Positioned { key, dup } => {
                self.index.chain(key).and_then(|chain| chain.get(*dup)).copied()
            }
            CursorState::Unpositioned => None,
        }
    }

    /// Record at the current position, resolved through the object store.
    ///
    /// `None` when unpositioned or when the store no longer has the record.
    pub fn item(&self) -> Option<Record> {
        self.obj_ref().and_then(|obj| self.store.resolve(obj))
    }

    /// Forget the current position.
    pub fn reset(&mut self) {
        self.state = CursorState::Unpositioned;
    }

    fn land(&mut self, key: &Key, dup: usize) -> bool {
        self.state = CursorState::Positioned {
            key: key.clone(),
            dup,
        };
        true
    }

    fn miss(&mut self) -> bool {
        self.state = CursorState::Unpositioned;
        false
    }

    /// First duplicate of the smallest key.
    pub fn begin(&mut self) -> bool {
        match self.index.first() {
            Some((key, _)) => self.land(key, 0),
            None => self.miss(),
        }
    }

    /// Last duplicate of the largest key.
    pub fn end(&mut self) -> bool {
        match self.index.last() {
            Some((key, chain)) => self.land(key, chain.len() - 1),
            None => self.miss(),
        }
    }

    /// Advance one entry. Returns false and unpositions at the end.
    pub fn next(&mut self) -> bool {
        let (key, dup) = match &self.state {
            CursorState::Positioned { key, dup } => (key, *dup),
            CursorState::Unpositioned => return false,
        };
        let chain_len = self.index.chain(key).map_or(0, <[ObjRef]>::len);
        if dup + 1 < chain_len {
            self.state = CursorState::Positioned {
                key: key.clone(),
                dup: dup + 1,
            };
            return true;
        }
        match self.index.next_after(key) {
            Some((next, _)) => self.land(next, 0),
            None => self.miss(),
        }
    }

    /// Retreat one entry. Returns false and unpositions at the start.
    pub fn prev(&mut self) -> bool {
        let (key, dup) = match &self.state {
            CursorState::Positioned { key, dup } => (key, *dup),
            CursorState::Unpositioned => return false,
        };
        let chain_len = self.index.chain(key).map_or(0, <[ObjRef]>::len);
        if dup > 0 && chain_len > 0 {
            self.state = CursorState::Positioned {
                key: key.clone(),
                dup: (dup - 1).min(chain_len - 1),
            };
            return true;
        }
        match self.index.prev_before(key) {
            Some((prev, chain)) => self.land(prev, chain.len() - 1),
            None => self.miss(),
        }
    }

    /// Seek keys must have the index's width; anything else misses.
    fn accepts(&self, key: &Key) -> bool {
        match self.index.check_key(key) {
            Ok(()) => true,
            Err(err) => {
                if self.index.config().log_events {
                    log_event(
                        Event::SeekKeyRejected,
                        &[("attr", self.index.name()), ("reason", err.message())],
                    );
                }
                false
            }
        }
    }

    fn seek_done(&mut self, found: bool) -> bool {
        self.index.metrics().record_seek(found);
        found
    }

    /// First duplicate of the entry equal to `key`.
    pub fn find_exact(&mut self, key: &Key) -> bool {
        let found = self.accepts(key)
            && match self.index.chain(key) {
                Some(_) => self.land(key, 0),
                None => self.miss(),
            };
        if !found {
            self.reset();
        }
        self.seek_done(found)
    }

    /// Greatest entry <= `key`.
    ///
    /// Lands on the first duplicate of the floor key, or on its last
    /// duplicate when `inf_last_dup` is set.
    pub fn find_inf(&mut self, key: &Key) -> bool {
        let index = self.index;
        let last_dup = self.options.inf_last_dup;
        let found = self.accepts(key)
            && match index.floor(key) {
                Some((floor, chain)) => {
                    let dup = if last_dup { chain.len() - 1 } else { 0 };
                    self.land(floor, dup)
                }
                None => self.miss(),
            };
        if !found {
            self.reset();
        }
        self.seek_done(found)
    }

    /// Smallest entry >= `key`, always on its first duplicate.
    pub fn find_sup(&mut self, key: &Key) -> bool {
        let index = self.index;
        let found = self.accepts(key)
            && match index.ceiling(key) {
                Some((ceiling, _)) => self.land(ceiling, 0),
                None => self.miss(),
            };
        if !found {
            self.reset();
        }
        self.seek_done(found)
    }

    /// Capture the current position.
    pub fn get_pos(&self) -> IndexResult<PositionToken> {
        let (key, dup) = match &self.state {
            CursorState::Positioned { key, dup } => (key, *dup),
            CursorState::Unpositioned => {
                return Err(IndexError::invalid_position("cursor is not positioned"))
            }
        };
        let token = PositionToken::encode(self.index.id(), self.index.generation(), key, dup)?;
        self.index.metrics().increment_positions_captured();
        Ok(token)
    }

    /// Restore a captured position. On failure the cursor is unpositioned.
    pub fn set_pos(&mut self, token: &PositionToken) -> IndexResult<()> {
        match self.resolve_token(token) {
            Ok((key, dup)) => {
                self.state = CursorState::Positioned { key, dup };
                self.index.metrics().increment_positions_restored();
                if self.index.config().log_events {
                    log_event(
                        Event::PositionRestored,
                        &[
                            ("attr", self.index.name()),
                            ("dup", dup.to_string().as_str()),
                        ],
                    );
                }
                Ok(())
            }
            Err(err) => {
                self.reset();
                self.index.metrics().increment_positions_rejected();
                if self.index.config().log_events {
                    log_event(
                        Event::PositionRejected,
                        &[("attr", self.index.name()), ("reason", err.message())],
                    );
                }
                Err(err)
            }
        }
    }

    fn resolve_token(&self, token: &PositionToken) -> IndexResult<(Key, usize)> {
        let parts = token.decode()?;
        if parts.index_id != self.index.id() {
            return Err(IndexError::invalid_position(format!(
                "token belongs to index {}, not {}",
                parts.index_id,
                self.index.id()
            )));
        }
        if parts.generation != self.index.generation() {
            return Err(IndexError::invalid_position(format!(
                "stale token: generation {} != {}",
                parts.generation,
                self.index.generation()
            )));
        }
        self.index
            .check_key(&parts.key)
            .map_err(|e| IndexError::invalid_position(e.message().to_string()))?;
        match self.index.chain(&parts.key) {
            Some(chain) if parts.dup < chain.len() => Ok((parts.key, parts.dup)),
            _ => Err(IndexError::invalid_position("token slot no longer exists")),
        }
    }

    /// Set a cursor option by name. Unknown names fail with
    /// `AERO_UNKNOWN_OPTION`.
    pub fn prop_set(&mut self, name: &str, value: bool) -> IndexResult<()> {
        match name {
            CursorOptions::INF_LAST_DUP => {
                self.options.inf_last_dup = value;
                Ok(())
            }
            _ => {
                if self.index.config().log_events {
                    log_event(
                        Event::OptionRejected,
                        &[("attr", self.index.name()), ("option", name)],
                    );
                }
                Err(IndexError::unknown_option(name))
            }
        }
    }

    /// Read a cursor option by name.
    pub fn prop_get(&self, name: &str) -> IndexResult<bool> {
        match name {
            CursorOptions::INF_LAST_DUP => Ok(self.options.inf_last_dup),
            _ => Err(IndexError::unknown_option(name)),
        }
    }

    /// Lazy iterator over records from the current position.
    pub fn iter(&mut self, direction: Direction) -> CursorIter<'_, 'a, S> {
        CursorIter::new(self, direction)
    }
}
