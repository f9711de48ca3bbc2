pub mod api;
pub mod body;
pub mod controls;
pub mod globe;
pub mod panel;
pub mod three;

use crate::error::{ViewerError, ViewerResult};
use api::DataService;
use body::{BodyId, CelestialBody, MapLayers, StarId};
use controls::{controls_html, controls_id, viewport_html, MapToggle, ViewMode};
use globe::{GlobeHandle, GlobeSpec};
use log::LevelFilter;
use panel::{
    content_id, map_viewport_id, menu_id, pane_html, pane_id, placeholder_html, tab_html,
    BodyPanel,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event};

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    /// Prefix for every API and icon URL; empty means same origin.
    pub api_base: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Width requested for globe textures.
    pub texture_width: u32,
    pub icon_width: u32,
    pub log_level: LevelFilter,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            viewport_width: 800,
            viewport_height: 400,
            texture_width: 1024,
            icon_width: 64,
            log_level: LevelFilter::Info,
        }
    }
}

/// Bodies that get their own tab. Moons are left out.
pub fn top_level(bodies: Vec<CelestialBody>) -> Vec<CelestialBody> {
    bodies.into_iter().filter(|b| !b.is_moon()).collect()
}

fn document() -> ViewerResult<Document> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| ViewerError::Js("no document".to_string()))
}

fn element(document: &Document, id: &str) -> ViewerResult<Element> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| ViewerError::MissingElement(id.to_string()))
}

pub struct Presenter {
    config: Rc<ViewerConfig>,
    service: Rc<DataService>,
    views: RefCell<HashMap<BodyId, Rc<BodyView>>>,
}

impl Presenter {
    pub fn new(config: ViewerConfig) -> Rc<Self> {
        Rc::new(Self {
            service: Rc::new(DataService::new(&config.api_base)),
            config: Rc::new(config),
            views: RefCell::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Fetch the bodies orbiting `star` and give each top-level one a tab.
    pub async fn load_body_list(self: Rc<Self>, star: StarId) -> ViewerResult<()> {
        let document = document()?;
        let menu = element(&document, &menu_id(star))?;
        let content = element(&document, &content_id(star))?;

        let bodies = match self.service.planets(star).await {
            Ok(bodies) => bodies,
            Err(err) => {
                log::error!("star {}: {}", star, err);
                content
                    .insert_adjacent_html("beforeend", &placeholder_html("planets", &err.to_string()))
                    .map_err(ViewerError::js)?;
                return Err(err);
            }
        };

        let total = bodies.len();
        let shown = top_level(bodies);
        log::info!("star {}: {} bodies, {} shown", star, total, shown.len());

        for body in shown {
            menu.insert_adjacent_html("beforeend", &tab_html(&body))
                .map_err(ViewerError::js)?;
            content
                .insert_adjacent_html("beforeend", &pane_html(body.id))
                .map_err(ViewerError::js)?;
            self.render_body(star, body)?;
        }
        Ok(())
    }

    /// Rebuild the body's pane from scratch, then fetch its map layers.
    pub fn render_body(&self, star: StarId, body: CelestialBody) -> ViewerResult<()> {
        let view = self.mount_body(star, body)?;
        let id = view.body.id;
        let weak = Rc::downgrade(&view);
        let service = self.service.clone();

        wasm_bindgen_futures::spawn_local(async move {
            let layers = service.map_layers(id).await;
            // A view replaced while the fetch was in flight ignores the result.
            if let Some(view) = weak.upgrade() {
                if let Err(err) = view.maps_loaded(layers) {
                    log::error!("body {}: {}", id, err);
                }
            }
        });
        Ok(())
    }

    fn mount_body(&self, star: StarId, body: CelestialBody) -> ViewerResult<Rc<BodyView>> {
        let document = document()?;
        let pane = element(&document, &pane_id(body.id))?;

        // Dropping the old view stops its globe before the markup goes.
        self.views.borrow_mut().remove(&body.id);

        let panel = BodyPanel::new(&body, &self.service, self.config.icon_width);
        pane.set_inner_html(&panel.render());
        let viewport = element(&document, &map_viewport_id(body.id))?;

        let view = Rc::new(BodyView {
            star,
            body,
            viewport,
            toggle: RefCell::new(MapToggle::new()),
            layers: RefCell::new(MapLayers::default()),
            controls: RefCell::new(None),
            globe: RefCell::new(None),
            service: self.service.clone(),
            config: self.config.clone(),
        });
        self.views.borrow_mut().insert(view.body.id, view.clone());
        Ok(view)
    }

    /// Release every view belonging to `star`.
    pub fn teardown(&self, star: StarId) {
        let mut views = self.views.borrow_mut();
        let before = views.len();
        views.retain(|_, view| view.star != star);
        log::debug!("star {}: released {} views", star, before - views.len());
    }
}

struct ControlsBinding {
    element: Element,
    on_click: Closure<dyn FnMut(Event)>,
}

impl Drop for ControlsBinding {
    fn drop(&mut self) {
        let _ = self
            .element
            .remove_event_listener_with_callback("click", self.on_click.as_ref().unchecked_ref());
    }
}

/// One body's rendered pane and the state behind its map viewport.
pub struct BodyView {
    star: StarId,
    body: CelestialBody,
    viewport: Element,
    toggle: RefCell<MapToggle>,
    layers: RefCell<MapLayers>,
    controls: RefCell<Option<ControlsBinding>>,
    globe: RefCell<Option<GlobeHandle>>,
    service: Rc<DataService>,
    config: Rc<ViewerConfig>,
}

impl BodyView {
    fn maps_loaded(self: &Rc<Self>, layers: ViewerResult<MapLayers>) -> ViewerResult<()> {
        let id = self.body.id;
        let layers = match layers {
            Ok(layers) => layers,
            Err(err) => {
                log::warn!("body {}: no maps: {}", id, err);
                self.viewport
                    .set_inner_html(&placeholder_html("map", &err.to_string()));
                return Ok(());
            }
        };

        if !layers.has_main() {
            log::debug!("body {}: no main map", id);
            return Ok(());
        }
        log::debug!(
            "body {}: main map with {} cloud layers",
            id,
            layers.cloud_layer_count()
        );
        *self.layers.borrow_mut() = layers;

        self.viewport
            .insert_adjacent_html("beforebegin", &controls_html(id, &self.toggle.borrow()))
            .map_err(ViewerError::js)?;
        let controls = element(&document()?, &controls_id(id))?;

        let weak: Weak<BodyView> = Rc::downgrade(self);
        let on_click = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let (Some(view), Some(mode)) = (weak.upgrade(), clicked_mode(&event)) else {
                return;
            };
            if let Err(err) = view.show(mode) {
                log::error!("body {}: cannot show {}: {}", view.body.id, mode.label(), err);
                view.viewport
                    .set_inner_html(&placeholder_html(mode.label(), &err.to_string()));
            }
        });
        controls
            .add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
            .map_err(ViewerError::js)?;
        *self.controls.borrow_mut() = Some(ControlsBinding {
            element: controls,
            on_click,
        });

        self.show(ViewMode::Map)
    }

    /// Switch the viewport to `mode`, tearing down any running globe first.
    pub fn show(&self, mode: ViewMode) -> ViewerResult<()> {
        let id = self.body.id;
        let previous = self.globe.borrow_mut().take();
        drop(previous);

        let mode = self.toggle.borrow_mut().select(mode);
        if let Some(binding) = self.controls.borrow().as_ref() {
            binding
                .element
                .set_inner_html(&self.toggle.borrow().render_buttons());
        }
        self.viewport
            .set_inner_html(&viewport_html(id, mode, &self.service));

        if mode == ViewMode::Globe {
            let spec = GlobeSpec::new(&self.body, &self.layers.borrow(), &self.service, &self.config);
            let handle = globe::start(&self.viewport, &spec)?;
            *self.globe.borrow_mut() = Some(handle);
        }
        log::debug!("body {}: showing {}", id, mode.label());
        Ok(())
    }
}

fn clicked_mode(event: &Event) -> Option<ViewMode> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    let label = target.closest("label[data-mode]").ok().flatten()?;
    ViewMode::from_value(&label.get_attribute("data-mode")?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(id: u32, moon_of: u32) -> CelestialBody {
        CelestialBody {
            id: BodyId(id),
            name: format!("Body {}", id),
            moon_of: BodyId(moon_of),
            ..CelestialBody::default()
        }
    }

    #[test]
    fn moons_do_not_get_tabs() {
        let shown = top_level(vec![body(1, 0), body(2, 1), body(3, 0), body(4, 3)]);
        let ids: Vec<BodyId> = shown.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![BodyId(1), BodyId(3)]);
    }

    #[test]
    fn default_config_matches_viewport_layout() {
        let config = ViewerConfig::default();
        assert_eq!((config.viewport_width, config.viewport_height), (800, 400));
        assert_eq!(config.texture_width, 1024);
        assert_eq!(config.icon_width, 64);
        assert!(config.api_base.is_empty());
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use js_sys::{Function, Reflect};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn layers(names: &[&str]) -> MapLayers {
        MapLayers::new(names.iter().map(|s| s.to_string()).collect())
    }

    fn mount(id: u32) -> (Rc<Presenter>, Rc<BodyView>) {
        let document = document().expect("document");
        let host = document.create_element("div").expect("div");
        host.set_inner_html(&pane_html(BodyId(id)));
        document
            .body()
            .expect("body")
            .append_child(&host)
            .expect("attached");

        let presenter = Presenter::new(ViewerConfig::default());
        let planet = CelestialBody {
            id: BodyId(id),
            name: "Tellus".to_string(),
            ..CelestialBody::default()
        };
        let view = presenter.mount_body(StarId(1), planet).expect("mounted");
        (presenter, view)
    }

    #[wasm_bindgen_test]
    fn toggle_swaps_viewport_content() {
        let (_presenter, view) = mount(901);
        view.maps_loaded(Ok(layers(&["main"]))).expect("controls");

        assert_eq!(view.toggle.borrow().mode(), ViewMode::Map);
        assert!(view.viewport.inner_html().contains("/api/planet/901/map\""));

        view.show(ViewMode::Stretched).expect("stretched");
        assert!(view.viewport.inner_html().contains("map?stretch=true"));

        view.show(ViewMode::Map).expect("map");
        let html = view.viewport.inner_html();
        assert!(html.contains("<img"));
        assert!(!html.contains("canvas"));
    }

    /// Just enough of `THREE` for a globe to build, draw and be disposed.
    fn install_three() {
        let factory = Function::new_no_args(
            r#"
            function node() {
                return { rotation: { x: 0, y: 0 }, position: { set: function () {} }, add: function () {} };
            }
            function Renderer() {
                this.domElement = document.createElement('canvas');
                this.setSize = function () {};
                this.render = function () {};
                this.dispose = function () { this.disposed = true; };
            }
            function TextureLoader() {
                this.load = function (url) { return { url: url }; };
            }
            function Plain() {}
            return {
                Scene: node, PerspectiveCamera: node, Mesh: node, AmbientLight: node, PointLight: node,
                WebGLRenderer: Renderer, TextureLoader: TextureLoader,
                SphereGeometry: Plain, MeshPhongMaterial: Plain
            };
            "#,
        );
        let three = factory.call0(&JsValue::NULL).expect("three");
        let window = web_sys::window().expect("window");
        Reflect::set(&window, &JsValue::from_str("THREE"), &three).expect("installed");
    }

    #[wasm_bindgen_test]
    fn globe_then_map_removes_canvas() {
        install_three();
        let (_presenter, view) = mount(903);
        view.maps_loaded(Ok(layers(&["main", "cloud-0"]))).expect("controls");

        view.show(ViewMode::Globe).expect("globe");
        assert_eq!(view.toggle.borrow().mode(), ViewMode::Globe);
        assert!(view.globe.borrow().is_some());
        assert!(view.viewport.inner_html().contains("<canvas"));

        view.show(ViewMode::Map).expect("map");
        let html = view.viewport.inner_html();
        assert!(html.contains("<img"));
        assert!(!html.contains("<canvas"));
        assert!(view.globe.borrow().is_none());
    }

    #[wasm_bindgen_test]
    fn no_main_layer_means_no_controls() {
        let (_presenter, view) = mount(902);
        view.maps_loaded(Ok(layers(&["height"]))).expect("ok");

        let document = document().expect("document");
        assert!(document.get_element_by_id(&controls_id(BodyId(902))).is_none());
        assert!(view.viewport.inner_html().is_empty());
    }
}
