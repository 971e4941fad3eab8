//! Filtered reconstruction of an EXIF directory tree.
//!
//! The rebuild walks the parsed tree depth first, chain before children, and
//! produces an [`IfdBuilder`] tree with the same topology:
//!
//! - every directory of every chain is recreated, in order, even when none of
//!   its tags survive
//! - pointer entries are recreated as builder-to-builder links to the rebuilt
//!   child, never as raw offsets
//! - value entries are copied byte for byte when allowed and dropped otherwise
//! - thumbnail offset/length markers are always dropped
//!
//! The source tree is only borrowed.

use tracing::{trace, warn};

use crate::error::ScrubError;
use crate::exif::{EntryValue, Ifd, IfdBuilder, TagEntry};

use super::allow::AllowList;

/// Counters collected during one rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildStats {
    /// Value entries copied to the output
    pub kept: usize,

    /// Value entries left out by the allow-list
    pub dropped: usize,

    /// Directories recreated, including empty ones
    pub directories: usize,
}

/// Rebuild `root` and its whole tree, keeping only allowed tags.
///
/// # Errors
/// `StructuralInconsistency` when a pointer entry does not correspond to
/// exactly one recorded child directory.
pub fn rebuild(root: &Ifd, allow: &AllowList) -> Result<(IfdBuilder, RebuildStats), ScrubError> {
    let mut rebuilder = Rebuilder {
        allow,
        stats: RebuildStats::default(),
    };
    let builder = rebuilder.rebuild_chain(root)?;
    Ok((builder, rebuilder.stats))
}

struct Rebuilder<'a> {
    allow: &'a AllowList,
    stats: RebuildStats,
}

impl Rebuilder<'_> {
    fn rebuild_chain(&mut self, first: &Ifd) -> Result<IfdBuilder, ScrubError> {
        let mut builder = self.rebuild_ifd(first)?;
        if let Some(next) = first.next.as_deref() {
            builder.set_next(self.rebuild_chain(next)?);
        }
        Ok(builder)
    }

    fn rebuild_ifd(&mut self, ifd: &Ifd) -> Result<IfdBuilder, ScrubError> {
        let mut builder = IfdBuilder::new(ifd.identity, ifd.byte_order);
        self.stats.directories += 1;

        for (position, entry) in ifd.entries.iter().enumerate() {
            if entry.is_thumbnail_marker() {
                trace!(ifd = %ifd.identity, tag_id = entry.tag_id, "Dropping thumbnail marker");
                continue;
            }

            match &entry.value {
                EntryValue::ChildIfd(_) => {
                    let child = Self::matching_child(ifd, position, entry)?;
                    let filtered = self.rebuild_chain(child)?;
                    builder.add_child(entry.tag_id, filtered);
                }
                EntryValue::Bytes(value) => {
                    if self.allow.allows(entry) {
                        builder.add_value(entry.tag_id, entry.field_type, value.clone());
                        self.stats.kept += 1;
                    } else {
                        trace!(path = %entry.path(), "Dropping tag");
                        self.stats.dropped += 1;
                    }
                }
            }
        }

        Ok(builder)
    }

    /// Find the one child recorded for the pointer entry at `position`.
    fn matching_child<'t>(
        ifd: &'t Ifd,
        position: usize,
        entry: &TagEntry,
    ) -> Result<&'t Ifd, ScrubError> {
        let mut candidates = ifd.children_at(position);
        let first = candidates.next();
        let others = candidates.count();

        match first {
            Some(child) if others == 0 => {
                if child.identity.parent_tag() != Some(entry.tag_id) {
                    warn!(
                        ifd = %ifd.identity,
                        tag_id = entry.tag_id,
                        child = %child.identity,
                        "Child directory was reached through a different pointer tag"
                    );
                }
                Ok(child)
            }
            _ => {
                let matches = usize::from(first.is_some()) + others;
                warn!(
                    ifd = %ifd.identity,
                    tag_id = entry.tag_id,
                    position,
                    matches,
                    "Cannot match directory pointer to a child directory"
                );
                Err(ScrubError::StructuralInconsistency {
                    ifd: ifd.identity.to_string(),
                    tag_id: entry.tag_id,
                    position,
                    matches,
                })
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
