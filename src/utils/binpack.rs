// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Generic first-fit bin packing over an abstract [`Binner`] capability.
//!
//! The packer never inspects items or bins itself; sizing, allocation and
//! close-out effects all belong to the binner. The one strategy implemented
//! here, [`NaivePacker`], fills the current bin and spills to a fresh one
//! when an item does not fit.

use thiserror::Error;

/// Units of capacity inside a bin.
pub type Space = u64;

#[derive(Debug, Error)]
pub enum Error {
    /// The item exceeds the bin capacity itself and can never be packed.
    #[error("item too large for bin")]
    ItemTooLarge,
    #[error(transparent)]
    Binner(#[from] anyhow::Error),
}

/// Capability over which a packer stages items into capacity-bounded bins.
///
/// Closing a bin is where implementations hang their side effects (a sector
/// builder seals and commits the sector, say); the packer only promises to
/// close bins that are full or rolled over.
pub trait Binner {
    type Item;
    type Bin;

    /// Capacity shared by every bin this binner allocates.
    fn bin_size(&self) -> Space;
    fn item_size(&self, item: &Self::Item) -> Space;
    fn space_available(&self, bin: &Self::Bin) -> Space;
    fn add_item(&mut self, item: Self::Item, bin: &mut Self::Bin) -> anyhow::Result<()>;
    fn close_bin(&mut self, bin: Self::Bin) -> anyhow::Result<()>;
    fn new_bin(&mut self) -> anyhow::Result<Self::Bin>;
}

/// Where a packed item ended up relative to the bin lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackResult {
    /// Added to the bin that remains current.
    Added,
    /// Filled the current bin exactly; that bin was closed and a fresh one
    /// opened. The item lives in the closed bin.
    Filled,
    /// Did not fit the remaining space; the previous bin was closed and the
    /// item landed in the fresh bin now current.
    Spilled,
}

/// First-fit packer with rollover.
pub struct NaivePacker<B: Binner> {
    binner: B,
    current: B::Bin,
}

impl<B: Binner> NaivePacker<B> {
    /// Opens the initial bin and wraps the binner.
    pub fn new(mut binner: B) -> Result<Self, Error> {
        let current = binner.new_bin()?;
        Ok(Self { binner, current })
    }

    pub fn binner(&self) -> &B {
        &self.binner
    }

    pub fn current_bin(&self) -> &B::Bin {
        &self.current
    }

    /// Packs one item, closing and reopening bins as needed.
    ///
    /// Oversized items fail with [`Error::ItemTooLarge`] before any bin is
    /// touched, so a failed pack leaves the current bin exactly as it was.
    pub fn pack(&mut self, item: B::Item) -> Result<PackResult, Error> {
        let size = self.binner.item_size(&item);
        if size > self.binner.bin_size() {
            return Err(Error::ItemTooLarge);
        }
        let available = self.binner.space_available(&self.current);
        if size < available {
            self.binner.add_item(item, &mut self.current)?;
            Ok(PackResult::Added)
        } else if size == available {
            self.binner.add_item(item, &mut self.current)?;
            self.rollover()?;
            Ok(PackResult::Filled)
        } else {
            self.rollover()?;
            self.binner.add_item(item, &mut self.current)?;
            Ok(PackResult::Spilled)
        }
    }

    /// Retires the current bin and opens a fresh one.
    fn rollover(&mut self) -> Result<(), Error> {
        let fresh = self.binner.new_bin()?;
        let full = std::mem::replace(&mut self.current, fresh);
        self.binner.close_bin(full)?;
        Ok(())
    }
}
