use ::core::cell::UnsafeCell;

/// Unsynchronized result slot. All accesses must be sequenced by the owning
/// task's completion protocol: the producer writes once before the `Release`
/// store of the completed state, and consumers read only after an `Acquire`
/// load has observed it.
pub(crate)
struct ResultCell<T> {
    slot: UnsafeCell<Option<T>>,
}

unsafe impl<T : Send> Send for ResultCell<T> {}
unsafe impl<T : Send> Sync for ResultCell<T> {}

impl<T> ResultCell<T> {
    pub(crate)
    const
    fn empty ()
      -> Self
    {
        Self { slot: UnsafeCell::new(None) }
    }

    /// # Safety
    ///
    /// Must be the unique access to the cell: called at most once, by the
    /// producer, before completion is published.
    pub(crate)
    unsafe
    fn put (self: &'_ Self, value: T)
    {
        // SAFETY: sole writer per the caller contract, no concurrent reader
        // since completion has not been published yet.
        unsafe {
            *self.slot.get() = Some(value);
        }
    }

    /// # Safety
    ///
    /// Completion must have been observed with `Acquire` ordering, and no
    /// call to `take` may be concurrent with this one.
    pub(crate)
    unsafe
    fn get (self: &'_ Self)
      -> Option<&'_ T>
    {
        // SAFETY: the producer no longer touches the cell once completion is
        // published, and the caller guarantees no concurrent `take`.
        unsafe {
            (*self.slot.get()).as_ref()
        }
    }

    /// # Safety
    ///
    /// Completion must have been observed with `Acquire` ordering, and this
    /// must be the unique consumer access from this point on.
    pub(crate)
    unsafe
    fn take (self: &'_ Self)
      -> Option<T>
    {
        // SAFETY: unique consumer access per the caller contract.
        unsafe {
            (*self.slot.get()).take()
        }
    }
}
