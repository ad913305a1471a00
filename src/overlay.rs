//! Overlay coordination.
//!
//! Five surfaces compete for the screen: the route list, the layer menu,
//! the report menu, the search-results panel and the chat sidebar. At most
//! one of them is open at a time. The traffic layer and the map style are
//! separate toggles layered underneath and survive every overlay change.

use log::debug;
use serde::{Deserialize, Serialize};

/// The overlay surface currently holding the screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overlay {
    #[default]
    None,
    RouteList,
    LayerMenu,
    ReportMenu,
    SearchResults,
    ChatSidebar,
}

/// Base map look, chosen from the layer menu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapStyle {
    #[default]
    Navpal,
    Dark,
    Street,
    Satellite,
}

impl MapStyle {
    pub const ALL: [MapStyle; 4] = [
        MapStyle::Navpal,
        MapStyle::Dark,
        MapStyle::Street,
        MapStyle::Satellite,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverlayState {
    pub active: Overlay,
    pub traffic_layer_on: bool,
    pub map_style: MapStyle,
}

/// Where the surrounding navigation session stands. Guards a few
/// transitions that only make sense during (or outside) a trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationPhase {
    #[default]
    Idle,
    Navigating,
    Exiting,
}

/// Single writer for [`OverlayState`]. Every change goes through one of
/// the named transitions below; rejected transitions are silent no-ops.
#[derive(Debug, Clone, Default)]
pub struct OverlayCoordinator {
    state: OverlayState,
    phase: NavigationPhase,
}

impl OverlayCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn active(&self) -> Overlay {
        self.state.active
    }

    pub fn is_open(&self, overlay: Overlay) -> bool {
        overlay != Overlay::None && self.state.active == overlay
    }

    pub fn phase(&self) -> NavigationPhase {
        self.phase
    }

    pub fn is_navigating(&self) -> bool {
        self.phase == NavigationPhase::Navigating
    }

    /// Close `overlay` if open, otherwise open it in place of whatever
    /// was showing. Returns whether the state changed.
    pub fn toggle(&mut self, overlay: Overlay) -> bool {
        if self.is_open(overlay) {
            self.transition(Overlay::None)
        } else {
            self.open(overlay)
        }
    }

    /// Open `overlay`, replacing the current one.
    pub fn open(&mut self, overlay: Overlay) -> bool {
        if !self.permits(overlay) {
            debug!("overlay {overlay:?} rejected in phase {:?}", self.phase);
            return false;
        }
        self.transition(overlay)
    }

    pub fn open_report(&mut self) -> bool {
        self.open(Overlay::ReportMenu)
    }

    pub fn close(&mut self) -> bool {
        self.transition(Overlay::None)
    }

    /// Close only if `overlay` is the one showing.
    pub fn close_if(&mut self, overlay: Overlay) -> bool {
        if self.is_open(overlay) {
            self.transition(Overlay::None)
        } else {
            false
        }
    }

    /// Flip the traffic layer. Returns the new value.
    pub fn toggle_traffic(&mut self) -> bool {
        self.state.traffic_layer_on = !self.state.traffic_layer_on;
        debug!("traffic layer {}", if self.state.traffic_layer_on { "on" } else { "off" });
        self.state.traffic_layer_on
    }

    pub fn set_style(&mut self, style: MapStyle) {
        debug!("map style {:?} -> {style:?}", self.state.map_style);
        self.state.map_style = style;
    }

    pub fn start_navigation(&mut self) {
        self.phase = NavigationPhase::Navigating;
    }

    /// Enter the exit phase. Report and route-list surfaces are refused
    /// until [`finish_exit`](Self::finish_exit).
    pub fn begin_exit(&mut self) {
        self.phase = NavigationPhase::Exiting;
    }

    /// Leave navigation and drop whatever overlay was showing.
    pub fn finish_exit(&mut self) {
        self.phase = NavigationPhase::Idle;
        self.close();
    }

    fn permits(&self, overlay: Overlay) -> bool {
        match overlay {
            Overlay::RouteList => self.phase == NavigationPhase::Navigating,
            Overlay::ReportMenu => self.phase != NavigationPhase::Exiting,
            _ => true,
        }
    }

    fn transition(&mut self, to: Overlay) -> bool {
        let from = self.state.active;
        if from == to {
            return false;
        }
        debug!("overlay {from:?} -> {to:?}");
        self.state.active = to;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn navigating() -> OverlayCoordinator {
        let mut coordinator = OverlayCoordinator::new();
        coordinator.start_navigation();
        coordinator
    }

    #[test]
    fn starts_closed_with_defaults() {
        let coordinator = OverlayCoordinator::new();
        assert_eq!(coordinator.active(), Overlay::None);
        assert!(!coordinator.state().traffic_layer_on);
        assert_eq!(coordinator.state().map_style, MapStyle::Navpal);
        assert_eq!(coordinator.phase(), NavigationPhase::Idle);
    }

    #[test]
    fn toggle_twice_returns_to_none() {
        for overlay in [
            Overlay::RouteList,
            Overlay::LayerMenu,
            Overlay::ReportMenu,
            Overlay::SearchResults,
            Overlay::ChatSidebar,
        ] {
            let mut coordinator = navigating();
            assert!(coordinator.toggle(overlay));
            assert_eq!(coordinator.active(), overlay);
            assert!(coordinator.toggle(overlay));
            assert_eq!(coordinator.active(), Overlay::None, "{overlay:?}");
        }
    }

    #[test]
    fn toggle_replaces_open_overlay() {
        let mut coordinator = navigating();
        coordinator.toggle(Overlay::LayerMenu);
        coordinator.toggle(Overlay::ReportMenu);
        assert_eq!(coordinator.active(), Overlay::ReportMenu);
        coordinator.toggle(Overlay::ChatSidebar);
        assert_eq!(coordinator.active(), Overlay::ChatSidebar);
    }

    #[test]
    fn route_list_needs_navigation() {
        let mut coordinator = OverlayCoordinator::new();
        assert!(!coordinator.toggle(Overlay::RouteList));
        assert_eq!(coordinator.active(), Overlay::None);
        assert!(!coordinator.open(Overlay::RouteList));
        assert_eq!(coordinator.active(), Overlay::None);
    }

    #[test]
    fn rejected_route_list_keeps_current_overlay() {
        let mut coordinator = OverlayCoordinator::new();
        coordinator.toggle(Overlay::LayerMenu);
        coordinator.toggle(Overlay::RouteList);
        assert_eq!(coordinator.active(), Overlay::LayerMenu);
    }

    #[test]
    fn report_refused_while_exiting() {
        let mut coordinator = navigating();
        coordinator.begin_exit();
        assert!(!coordinator.open_report());
        assert_eq!(coordinator.active(), Overlay::None);

        coordinator.finish_exit();
        assert!(coordinator.open_report());
        assert_eq!(coordinator.active(), Overlay::ReportMenu);
    }

    #[test]
    fn close_from_any_state() {
        let mut coordinator = navigating();
        coordinator.open(Overlay::SearchResults);
        assert!(coordinator.close());
        assert_eq!(coordinator.active(), Overlay::None);
        assert!(!coordinator.close());
    }

    #[test]
    fn close_if_only_closes_matching() {
        let mut coordinator = navigating();
        coordinator.open(Overlay::ChatSidebar);
        assert!(!coordinator.close_if(Overlay::SearchResults));
        assert_eq!(coordinator.active(), Overlay::ChatSidebar);
        assert!(coordinator.close_if(Overlay::ChatSidebar));
        assert_eq!(coordinator.active(), Overlay::None);
    }

    #[test]
    fn toggle_none_closes() {
        let mut coordinator = navigating();
        coordinator.open(Overlay::LayerMenu);
        coordinator.toggle(Overlay::None);
        assert_eq!(coordinator.active(), Overlay::None);
        assert!(!coordinator.toggle(Overlay::None));
        assert_eq!(coordinator.active(), Overlay::None);
    }

    #[test]
    fn layer_toggles_survive_overlay_changes() {
        let mut coordinator = navigating();
        coordinator.open(Overlay::LayerMenu);
        assert!(coordinator.toggle_traffic());
        coordinator.set_style(MapStyle::Satellite);
        coordinator.close();
        coordinator.toggle(Overlay::RouteList);
        coordinator.finish_exit();

        assert!(coordinator.state().traffic_layer_on);
        assert_eq!(coordinator.state().map_style, MapStyle::Satellite);
        assert_eq!(coordinator.active(), Overlay::None);
    }

    #[test]
    fn finish_exit_closes_route_list() {
        let mut coordinator = navigating();
        coordinator.toggle(Overlay::RouteList);
        coordinator.begin_exit();
        coordinator.finish_exit();
        assert_eq!(coordinator.active(), Overlay::None);
        assert!(!coordinator.is_navigating());
    }
}
