pub mod table;
pub mod dashboard;

use crate::derive::{CgiDistribution, SeriesView};
use crate::error::DashResult;
use serde::Serialize;

pub use table::RenderTable;
pub use dashboard::{Dashboard, View};

/// Visual slots a chart can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SlotId {
    BpComparison,
    BpImprovement,
    MeqComparison,
    CgiDistribution,
}

impl SlotId {
    #[cfg(test)]
    pub const ALL: [SlotId; 4] = [
        SlotId::BpComparison,
        SlotId::BpImprovement,
        SlotId::MeqComparison,
        SlotId::CgiDistribution,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SlotId::BpComparison => "chart-bp",
            SlotId::BpImprovement => "chart-hr",
            SlotId::MeqComparison => "chart-meq",
            SlotId::CgiDistribution => "chart-cgi",
        }
    }
}

/// Text elements that display the headline statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StatSlot {
    PreDrop,
    PostDrop,
    MeqReduction,
}

impl StatSlot {
    pub const ALL: [StatSlot; 3] = [StatSlot::PreDrop, StatSlot::PostDrop, StatSlot::MeqReduction];

    pub fn name(&self) -> &'static str {
        match self {
            StatSlot::PreDrop => "stat-pre-drop",
            StatSlot::PostDrop => "stat-post-drop",
            StatSlot::MeqReduction => "stat-meq-rec",
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            StatSlot::PreDrop | StatSlot::PostDrop => " mmHg",
            StatSlot::MeqReduction => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartPayload {
    Bar(SeriesView),
    Line(SeriesView),
    Doughnut(CgiDistribution),
}

/// A live chart occupying a slot. Releasing it removes the chart.
pub trait ChartHandle {
    fn slot(&self) -> SlotId;
    fn release(self: Box<Self>) -> DashResult<()>;
}

/// External renderer fed by the dashboard.
pub trait RenderTarget {
    fn has_slot(&self, slot: SlotId) -> bool;
    fn draw(&mut self, slot: SlotId, payload: &ChartPayload) -> DashResult<Box<dyn ChartHandle>>;
    /// Returns false when the text element does not exist.
    fn set_stat(&mut self, slot: StatSlot, text: &str) -> bool;
}
