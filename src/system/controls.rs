use crate::system::api::{DataService, MapImage};
use crate::system::body::BodyId;
use crate::system::panel::escape_html;
use std::fmt::Write;

/// How a body's map viewport is currently drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ViewMode {
    #[default]
    Map,
    Globe,
    Stretched,
}

impl ViewMode {
    /// Order of the buttons in the toggle.
    pub const ALL: [ViewMode; 3] = [ViewMode::Map, ViewMode::Globe, ViewMode::Stretched];

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Map => "Map",
            ViewMode::Globe => "Globe",
            ViewMode::Stretched => "Stretched",
        }
    }

    pub fn value(self) -> &'static str {
        match self {
            ViewMode::Map => "map",
            ViewMode::Globe => "globe",
            ViewMode::Stretched => "stretch",
        }
    }

    pub fn from_value(value: &str) -> Option<ViewMode> {
        ViewMode::ALL.into_iter().find(|m| m.value() == value)
    }
}

/// Map/Globe/Stretched selector. Starts on the flat map and never terminates;
/// every click selects a mode, including the current one.
#[derive(Clone, Debug, Default)]
pub struct MapToggle {
    mode: ViewMode,
}

impl MapToggle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn select(&mut self, mode: ViewMode) -> ViewMode {
        self.mode = mode;
        mode
    }

    /// Button labels, with the selected one active.
    pub fn render_buttons(&self) -> String {
        let mut html = String::new();
        for mode in ViewMode::ALL {
            let (active, checked) = if mode == self.mode {
                (" active", " checked")
            } else {
                ("", "")
            };
            let _ = write!(
                html,
                "<label class=\"btn btn-secondary btn-sm{active}\" data-mode=\"{value}\"><input type=\"radio\" value=\"{value}\"{checked}/>{label}</label>",
                value = mode.value(),
                label = mode.label()
            );
        }
        html
    }
}

pub fn controls_id(id: BodyId) -> String {
    format!("ctrls-{}", id)
}

pub fn controls_html(id: BodyId, toggle: &MapToggle) -> String {
    format!(
        "<div id=\"{}\" class=\"btn-group planet-controls\" data-toggle=\"buttons\">{}</div>",
        controls_id(id),
        toggle.render_buttons()
    )
}

/// Viewport content for the flat modes. The globe draws into an empty viewport.
pub fn viewport_html(id: BodyId, mode: ViewMode, service: &DataService) -> String {
    let image = match mode {
        ViewMode::Map => MapImage::flat(id),
        ViewMode::Stretched => MapImage::stretched(id),
        ViewMode::Globe => return String::new(),
    };
    format!(
        "<img src=\"{}\" width=\"100%\"/>",
        escape_html(&service.map_url(&image))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_flat_map() {
        let toggle = MapToggle::new();
        assert_eq!(toggle.mode(), ViewMode::Map);
        let html = toggle.render_buttons();
        assert!(html.starts_with(
            "<label class=\"btn btn-secondary btn-sm active\" data-mode=\"map\"><input type=\"radio\" value=\"map\" checked/>Map</label>"
        ));
        assert_eq!(html.matches(" active").count(), 1);
    }

    #[test]
    fn any_mode_reachable_from_any_other() {
        let mut toggle = MapToggle::new();
        for from in ViewMode::ALL {
            for to in ViewMode::ALL {
                toggle.select(from);
                assert_eq!(toggle.select(to), to);
                assert_eq!(toggle.mode(), to);
            }
        }
    }

    #[test]
    fn mode_values_round_trip_from_markup() {
        for mode in ViewMode::ALL {
            assert_eq!(ViewMode::from_value(mode.value()), Some(mode));
        }
        assert_eq!(ViewMode::from_value("stretch"), Some(ViewMode::Stretched));
        assert_eq!(ViewMode::from_value("3d"), None);
    }

    #[test]
    fn globe_then_map_leaves_only_flat_image() {
        let service = DataService::default();
        let id = BodyId(8);
        let mut toggle = MapToggle::new();

        toggle.select(ViewMode::Globe);
        assert_eq!(viewport_html(id, toggle.mode(), &service), "");

        toggle.select(ViewMode::Map);
        let html = viewport_html(id, toggle.mode(), &service);
        assert_eq!(html, "<img src=\"/api/planet/8/map\" width=\"100%\"/>");
        assert!(!html.contains("canvas"));
    }

    #[test]
    fn stretched_viewport_requests_stretched_map() {
        let html = viewport_html(BodyId(8), ViewMode::Stretched, &DataService::default());
        assert_eq!(
            html,
            "<img src=\"/api/planet/8/map?stretch=true\" width=\"100%\"/>"
        );
        assert!(controls_html(BodyId(8), &MapToggle::new()).starts_with("<div id=\"ctrls-8\""));
    }
}
