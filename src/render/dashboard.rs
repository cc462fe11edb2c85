use super::{ChartPayload, RenderTable, RenderTarget, SlotId, StatSlot};
use crate::config::Config;
use crate::datasets::LoadedData;
use crate::derive::{derive_all, DerivedResults};
use crate::error::DashResult;
use log::{debug, info};

/// Result tabs. Switching re-renders every chart so animations replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Hemodynamics,
    Medication,
    Clinical,
}

/// Owns the loaded tables, the live chart handles and the render target, and
/// turns visibility events into derive-and-publish passes.
pub struct Dashboard<T: RenderTarget> {
    config: Config,
    data: Option<LoadedData>,
    target: T,
    table: RenderTable,
    view: View,
}

impl<T: RenderTarget> Dashboard<T> {
    pub fn new(config: Config, data: Option<LoadedData>, target: T) -> Self {
        Self {
            config,
            data,
            target,
            table: RenderTable::new(),
            view: View::default(),
        }
    }

    /// Entry point for the viewport observer. Returns the published results
    /// when a render happened.
    pub fn on_visibility_changed(&mut self, visible: bool) -> DashResult<Option<DerivedResults>> {
        if visible {
            self.render_all()
        } else {
            self.clear()?;
            Ok(None)
        }
    }

    pub fn switch_view(&mut self, view: View) -> DashResult<Option<DerivedResults>> {
        debug!("Switching to {:?}", view);
        self.view = view;
        self.render_all()
    }

    /// Derive everything from the loaded tables and publish it. Nothing is
    /// drawn when no data was loaded.
    pub fn render_all(&mut self) -> DashResult<Option<DerivedResults>> {
        let Some(data) = &self.data else {
            debug!("No data loaded, leaving placeholders");
            return Ok(None);
        };

        let results = derive_all(data, &self.config);

        let bp_ready = !results.bp.is_empty();
        self.publish(SlotId::BpComparison, bp_ready.then(|| ChartPayload::Bar(results.bp.grouped_comparison())))?;
        self.publish(SlotId::BpImprovement, bp_ready.then(|| ChartPayload::Line(results.bp.improvement_trend())))?;
        self.publish(
            SlotId::MeqComparison,
            (!results.meq.is_empty()).then(|| ChartPayload::Bar(results.meq.grouped_comparison())),
        )?;
        self.publish(
            SlotId::CgiDistribution,
            (!results.cgi.is_empty()).then(|| ChartPayload::Doughnut(results.cgi.clone())),
        )?;

        let stats = results.summary.stats;
        self.show_stat(StatSlot::PreDrop, stats.avg_pre_drop);
        self.show_stat(StatSlot::PostDrop, stats.avg_post_drop);
        self.show_stat(StatSlot::MeqReduction, stats.avg_meq_reduction);

        info!("Rendered {} chart(s) for {:?}", self.table.len(), self.view);
        Ok(Some(results))
    }

    /// Release every chart and reset the stat texts.
    pub fn clear(&mut self) -> DashResult<()> {
        self.table.release_all()?;
        for slot in StatSlot::ALL {
            self.target.set_stat(slot, &self.config.display.placeholder);
        }
        Ok(())
    }

    fn publish(&mut self, slot: SlotId, payload: Option<ChartPayload>) -> DashResult<()> {
        let Self { table, target, .. } = self;

        let Some(payload) = payload else {
            return table.release(slot);
        };
        if !target.has_slot(slot) {
            debug!("Slot {} is not present, skipping", slot.name());
            return table.release(slot);
        }

        table.replace(slot, || target.draw(slot, &payload))
    }

    fn show_stat(&mut self, slot: StatSlot, value: f64) {
        let text = format!("{:.*}{}", self.config.display.decimals, value, slot.suffix());
        if !self.target.set_stat(slot, &text) {
            debug!("Stat element {} is not present", slot.name());
        }
    }

    #[cfg(test)]
    pub fn table(&self) -> &RenderTable {
        &self.table
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ChartHandle;
    use std::cell::RefCell;
    use std::collections::{BTreeMap, BTreeSet};
    use std::rc::Rc;

    #[derive(Default)]
    struct Canvas {
        live: BTreeMap<SlotId, ChartPayload>,
        draws: usize,
    }

    struct CanvasHandle {
        slot: SlotId,
        canvas: Rc<RefCell<Canvas>>,
    }

    impl ChartHandle for CanvasHandle {
        fn slot(&self) -> SlotId {
            self.slot
        }

        fn release(self: Box<Self>) -> DashResult<()> {
            self.canvas.borrow_mut().live.remove(&self.slot);
            Ok(())
        }
    }

    /// In-memory page with a configurable set of chart slots.
    struct MemoryTarget {
        canvas: Rc<RefCell<Canvas>>,
        slots: BTreeSet<SlotId>,
        stats: BTreeMap<StatSlot, String>,
    }

    impl MemoryTarget {
        fn with_slots(slots: &[SlotId]) -> Self {
            Self {
                canvas: Rc::new(RefCell::new(Canvas::default())),
                slots: slots.iter().copied().collect(),
                stats: BTreeMap::new(),
            }
        }
    }

    impl RenderTarget for MemoryTarget {
        fn has_slot(&self, slot: SlotId) -> bool {
            self.slots.contains(&slot)
        }

        fn draw(&mut self, slot: SlotId, payload: &ChartPayload) -> DashResult<Box<dyn ChartHandle>> {
            let mut canvas = self.canvas.borrow_mut();
            assert!(!canvas.live.contains_key(&slot), "slot {} drawn twice", slot.name());
            canvas.live.insert(slot, payload.clone());
            canvas.draws += 1;
            Ok(Box::new(CanvasHandle { slot, canvas: Rc::clone(&self.canvas) }))
        }

        fn set_stat(&mut self, slot: StatSlot, text: &str) -> bool {
            self.stats.insert(slot, text.to_string());
            true
        }
    }

    fn dashboard(slots: &[SlotId]) -> Dashboard<MemoryTarget> {
        let config = Config::default();
        let data = LoadedData::embedded(&config).ok();
        Dashboard::new(config, data, MemoryTarget::with_slots(slots))
    }

    #[test]
    fn test_visible_renders_all_slots_and_stats() {
        let mut dash = dashboard(&SlotId::ALL);
        let results = dash.on_visibility_changed(true).unwrap().unwrap();

        assert_eq!(dash.table().len(), 4);
        assert_eq!(dash.target().canvas.borrow().live.len(), 4);
        assert_eq!(dash.target().stats[&StatSlot::PreDrop], "37.3 mmHg");
        assert_eq!(dash.target().stats[&StatSlot::PostDrop], "25.1 mmHg");
        assert_eq!(dash.target().stats[&StatSlot::MeqReduction], "68.7%");
        assert_eq!(results.bp.len(), 37);
    }

    #[test]
    fn test_hidden_releases_and_resets() {
        let mut dash = dashboard(&SlotId::ALL);
        dash.on_visibility_changed(true).unwrap();
        assert!(dash.on_visibility_changed(false).unwrap().is_none());

        assert!(dash.table().is_empty());
        assert!(dash.target().canvas.borrow().live.is_empty());
        assert!(dash.target().stats.values().all(|t| t == "---"));
    }

    #[test]
    fn test_rerender_is_idempotent() {
        let mut dash = dashboard(&SlotId::ALL);
        let first = dash.on_visibility_changed(true).unwrap();
        let payloads = dash.target().canvas.borrow().live.clone();

        let second = dash.switch_view(View::Clinical).unwrap();

        assert_eq!(first, second);
        assert_eq!(dash.view(), View::Clinical);
        assert_eq!(dash.table().len(), 4);
        assert_eq!(dash.target().canvas.borrow().live, payloads);
        assert_eq!(dash.target().canvas.borrow().draws, 8);
    }

    #[test]
    fn test_missing_slot_is_skipped() {
        let mut dash = dashboard(&[SlotId::BpComparison, SlotId::CgiDistribution]);
        dash.on_visibility_changed(true).unwrap();

        assert_eq!(dash.table().len(), 2);
        assert!(dash.table().contains(SlotId::BpComparison));
        assert!(dash.table().contains(SlotId::CgiDistribution));
        assert!(dash.target().stats.contains_key(&StatSlot::MeqReduction));
    }

    #[test]
    fn test_no_data_leaves_placeholders() {
        let mut dash = Dashboard::new(Config::default(), None, MemoryTarget::with_slots(&SlotId::ALL));
        dash.clear().unwrap();

        assert!(dash.on_visibility_changed(true).unwrap().is_none());
        assert!(dash.table().is_empty());
        assert!(dash.target().stats.values().all(|t| t == "---"));
        assert!(!dash.has_data());
    }

    #[test]
    fn test_empty_tables_draw_nothing() {
        let config = Config::default();
        let data = LoadedData::from_texts("", "", "", &config).unwrap();
        let mut dash = Dashboard::new(config, Some(data), MemoryTarget::with_slots(&SlotId::ALL));

        dash.on_visibility_changed(true).unwrap();
        assert!(dash.table().is_empty());
        assert_eq!(dash.target().stats[&StatSlot::PreDrop], "0.0 mmHg");
    }
}
