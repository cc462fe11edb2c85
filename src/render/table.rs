use super::{ChartHandle, SlotId};
use crate::error::{DashError, DashResult};
use log::debug;
use std::collections::BTreeMap;

/// Live chart handles, at most one per slot.
#[derive(Default)]
pub struct RenderTable {
    handles: BTreeMap<SlotId, Box<dyn ChartHandle>>,
}

impl RenderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release whatever occupies `slot`, then install the handle built by
    /// `make`. The old handle is always gone before `make` runs.
    pub fn replace<F>(&mut self, slot: SlotId, make: F) -> DashResult<()>
    where
        F: FnOnce() -> DashResult<Box<dyn ChartHandle>>,
    {
        self.release(slot)?;
        let handle = make()?;
        if handle.slot() != slot {
            let other = handle.slot();
            handle.release()?;
            return Err(DashError::Render(
                format!("chart for {} came back bound to {}", slot.name(), other.name())
            ));
        }
        self.handles.insert(slot, handle);
        Ok(())
    }

    pub fn release(&mut self, slot: SlotId) -> DashResult<()> {
        if let Some(handle) = self.handles.remove(&slot) {
            debug!("Releasing chart in {}", slot.name());
            handle.release()?;
        }
        Ok(())
    }

    /// Release every handle. All slots are attempted; the first error is returned.
    pub fn release_all(&mut self) -> DashResult<()> {
        let mut first_err = None;
        for (slot, handle) in std::mem::take(&mut self.handles) {
            debug!("Releasing chart in {}", slot.name());
            if let Err(e) = handle.release() {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    #[cfg(test)]
    pub fn contains(&self, slot: SlotId) -> bool {
        self.handles.contains_key(&slot)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
