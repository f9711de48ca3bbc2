use crate::error::{ViewerError, ViewerResult};
use crate::system::api::{DataService, MapImage};
use crate::system::body::{CelestialBody, MapLayers, DEFORM_LAYER, HEIGHT_LAYER};
use crate::system::three::{
    AmbientLight, Mesh, MeshPhongMaterial, PerspectiveCamera, PointLight, Scene, SphereGeometry,
    TextureLoader, WebGLRenderer,
};
use crate::system::ViewerConfig;
use js_sys::{Object, Reflect};
use std::cell::{Cell, RefCell};
use std::f64::consts::TAU;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, MouseEvent};

pub const GLOBE_RADIUS: f64 = 2.5;
pub const GLOBE_SEGMENTS: u32 = 32;
const CLOUD_SHELL_GAP: f64 = 0.02;

/// Frames after a pointer move before auto-rotation resumes.
pub const SETTLE_FRAMES: u32 = 200;
/// Auto-rotation per frame, radians about x and y.
pub const SPIN: (f64, f64) = (0.001, 0.004);
/// Per-frame drift of cloud shell `i` against the surface is `-(i + 1) * CLOUD_DRIFT`.
pub const CLOUD_DRIFT: f64 = 0.0005;

const CAMERA_FOV: f64 = 75.0;
const CAMERA_NEAR: f64 = 0.1;
const CAMERA_FAR: f64 = 2000.0;
const CAMERA_Z: f64 = 5.0;
const AMBIENT_COLOUR: u32 = 0x888888;
const STAR_COLOUR: u32 = 0xffffff;
const SPECULAR_COLOUR: u32 = 0xaaaaaa;
const BUMP_SCALE: f64 = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub struct CloudShell {
    pub radius: f64,
    pub texture_url: String,
}

/// Everything needed to build a body's globe scene.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobeSpec {
    pub width: u32,
    pub height: u32,
    pub radius: f64,
    pub segments: u32,
    pub main_url: String,
    pub height_url: String,
    pub deform_url: String,
    /// The star light sits this far out along z.
    pub star_distance: f64,
    pub clouds: Vec<CloudShell>,
}

impl GlobeSpec {
    pub fn new(
        body: &CelestialBody,
        layers: &MapLayers,
        service: &DataService,
        config: &ViewerConfig,
    ) -> Self {
        let texture = |layer: Option<&str>| {
            let mut image = MapImage::stretched(body.id).width(config.texture_width);
            image.layer = layer;
            service.map_url(&image)
        };

        let clouds = layers
            .cloud_layers()
            .into_iter()
            .enumerate()
            .map(|(i, name)| CloudShell {
                radius: GLOBE_RADIUS + CLOUD_SHELL_GAP * (i + 1) as f64,
                texture_url: texture(Some(name)),
            })
            .collect();

        Self {
            width: config.viewport_width,
            height: config.viewport_height,
            radius: GLOBE_RADIUS,
            segments: GLOBE_SEGMENTS,
            main_url: texture(None),
            height_url: texture(Some(HEIGHT_LAYER)),
            deform_url: texture(Some(DEFORM_LAYER)),
            star_distance: body.distance as f64,
            clouds,
        }
    }
}

/// Rotation and cloud state, advanced once per frame.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobeMotion {
    pub rotation_x: f64,
    pub rotation_y: f64,
    settle: u32,
    cloud_drift: Vec<f64>,
}

impl GlobeMotion {
    pub fn new(cloud_layers: usize) -> Self {
        Self {
            rotation_x: 0.0,
            rotation_y: 0.0,
            settle: 0,
            cloud_drift: vec![0.0; cloud_layers],
        }
    }

    /// `dx`/`dy` are the cursor's offset from the viewport centre as a fraction
    /// of its size, so crossing the viewport is one full turn.
    pub fn pointer_moved(&mut self, dx: f64, dy: f64) {
        self.rotation_y = dx * TAU;
        self.rotation_x = dy * TAU;
        self.settle = SETTLE_FRAMES;
    }

    pub fn advance(&mut self) {
        if self.settle > 0 {
            self.settle -= 1;
            return;
        }
        self.rotation_x += SPIN.0;
        self.rotation_y += SPIN.1;
        for (i, drift) in self.cloud_drift.iter_mut().enumerate() {
            *drift -= CLOUD_DRIFT * (i + 1) as f64;
        }
    }

    pub fn settling(&self) -> bool {
        self.settle > 0
    }

    pub fn cloud_opacity(&self) -> f64 {
        1.0 - f64::from(self.settle) / f64::from(SETTLE_FRAMES)
    }

    pub fn cloud_rotation_y(&self, layer: usize) -> f64 {
        self.rotation_y + self.cloud_drift.get(layer).copied().unwrap_or_default()
    }
}

struct CloudMesh {
    mesh: Mesh,
    material: MeshPhongMaterial,
}

struct GlobeScene {
    scene: Scene,
    camera: PerspectiveCamera,
    renderer: WebGLRenderer,
    world: Mesh,
    clouds: Vec<CloudMesh>,
    motion: GlobeMotion,
}

impl GlobeScene {
    fn build(spec: &GlobeSpec) -> ViewerResult<Self> {
        let scene = Scene::new();
        let camera = PerspectiveCamera::new(
            CAMERA_FOV,
            f64::from(spec.width) / f64::from(spec.height.max(1)),
            CAMERA_NEAR,
            CAMERA_FAR,
        );
        camera.position().set_xyz(0.0, 0.0, CAMERA_Z);

        let renderer = WebGLRenderer::new();
        renderer.set_size(spec.width, spec.height);

        let loader = TextureLoader::new();
        let surface = Object::new();
        set_param(&surface, "map", &loader.load(&spec.main_url))?;
        set_param(&surface, "bumpMap", &loader.load(&spec.height_url))?;
        set_param(&surface, "bumpScale", &JsValue::from_f64(BUMP_SCALE))?;
        set_param(&surface, "displacementMap", &loader.load(&spec.deform_url))?;
        set_param(&surface, "shininess", &JsValue::from_f64(0.0))?;
        set_param(&surface, "specular", &JsValue::from(SPECULAR_COLOUR))?;

        let world = Mesh::new(
            &SphereGeometry::new(spec.radius, spec.segments, spec.segments),
            &MeshPhongMaterial::new(&surface),
        );

        scene.add(&AmbientLight::new(AMBIENT_COLOUR));
        let star = PointLight::new(STAR_COLOUR, 1.0, 1000.0, 2.0);
        star.position().set_xyz(0.5, 0.0, spec.star_distance);
        scene.add(&star);
        scene.add(&world);

        let mut clouds = Vec::with_capacity(spec.clouds.len());
        for shell in &spec.clouds {
            let params = Object::new();
            set_param(&params, "map", &loader.load(&shell.texture_url))?;
            set_param(&params, "transparent", &JsValue::TRUE)?;
            set_param(&params, "opacity", &JsValue::from_f64(1.0))?;
            let material = MeshPhongMaterial::new(&params);
            let mesh = Mesh::new(
                &SphereGeometry::new(shell.radius, spec.segments, spec.segments),
                &material,
            );
            scene.add(&mesh);
            clouds.push(CloudMesh { mesh, material });
        }

        Ok(Self {
            scene,
            camera,
            renderer,
            world,
            motion: GlobeMotion::new(clouds.len()),
            clouds,
        })
    }

    fn frame(&mut self) {
        self.motion.advance();

        let rotation = self.world.rotation();
        rotation.set_x(self.motion.rotation_x);
        rotation.set_y(self.motion.rotation_y);

        let opacity = self.motion.cloud_opacity();
        for (i, cloud) in self.clouds.iter().enumerate() {
            let rotation = cloud.mesh.rotation();
            rotation.set_x(self.motion.rotation_x);
            rotation.set_y(self.motion.cloud_rotation_y(i));
            cloud.material.set_opacity(opacity);
        }

        self.renderer.render(&self.scene, &self.camera);
    }
}

fn set_param(params: &Object, key: &str, value: &JsValue) -> ViewerResult<()> {
    Reflect::set(params, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(ViewerError::js)
}

type FrameSlot = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// A running globe. Dropping it stops the frame loop and releases the canvas listeners.
pub struct GlobeHandle {
    cancelled: Rc<Cell<bool>>,
    frame_id: Rc<Cell<Option<i32>>>,
    tick: FrameSlot,
    viewport: Element,
    on_move: Closure<dyn FnMut(MouseEvent)>,
    renderer: WebGLRenderer,
}

/// Build the scene into `viewport` and start animating it.
pub fn start(viewport: &Element, spec: &GlobeSpec) -> ViewerResult<GlobeHandle> {
    let window = web_sys::window().ok_or_else(|| ViewerError::Js("no window".to_string()))?;
    let globe = GlobeScene::build(spec)?;
    let renderer = globe.renderer.clone();
    viewport
        .append_child(&renderer.dom_element())
        .map_err(ViewerError::js)?;

    let state = Rc::new(RefCell::new(globe));

    let on_move = {
        let state = state.clone();
        let target = viewport.clone();
        Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            let rect = target.get_bounding_client_rect();
            if rect.width() <= 0.0 || rect.height() <= 0.0 {
                return;
            }
            let dx = (f64::from(event.client_x()) - rect.left()) / rect.width() - 0.5;
            let dy = (f64::from(event.client_y()) - rect.top()) / rect.height() - 0.5;
            state.borrow_mut().motion.pointer_moved(dx, dy);
        })
    };
    viewport
        .add_event_listener_with_callback("mousemove", on_move.as_ref().unchecked_ref())
        .map_err(ViewerError::js)?;

    let cancelled = Rc::new(Cell::new(false));
    let frame_id = Rc::new(Cell::new(None));
    let tick: FrameSlot = Rc::new(RefCell::new(None));

    {
        let cancelled = cancelled.clone();
        let frame_id = frame_id.clone();
        let slot = tick.clone();
        let window = window.clone();
        *tick.borrow_mut() = Some(Closure::<dyn FnMut()>::new(move || {
            if cancelled.get() {
                let _ = slot.borrow_mut().take();
                return;
            }
            state.borrow_mut().frame();
            if let Some(callback) = slot.borrow().as_ref() {
                match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
                    Ok(id) => frame_id.set(Some(id)),
                    Err(e) => log::error!("globe frame not scheduled: {:?}", e),
                }
            }
        }));
    }

    if let Some(callback) = tick.borrow().as_ref() {
        let id = window
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .map_err(ViewerError::js)?;
        frame_id.set(Some(id));
    }

    Ok(GlobeHandle {
        cancelled,
        frame_id,
        tick,
        viewport: viewport.clone(),
        on_move,
        renderer,
    })
}

impl Drop for GlobeHandle {
    fn drop(&mut self) {
        self.cancelled.set(true);
        if let (Some(window), Some(id)) = (web_sys::window(), self.frame_id.take()) {
            let _ = window.cancel_animation_frame(id);
        }
        let _ = self.tick.borrow_mut().take();
        let _ = self.viewport.remove_event_listener_with_callback(
            "mousemove",
            self.on_move.as_ref().unchecked_ref(),
        );
        self.renderer.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::body::BodyId;

    fn layers(names: &[&str]) -> MapLayers {
        MapLayers::new(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn spec_textures_come_from_stretched_layers() {
        let body = CelestialBody {
            id: BodyId(11),
            distance: 150_000_000,
            ..CelestialBody::default()
        };
        let spec = GlobeSpec::new(
            &body,
            &layers(&["main", "height", "deform", "cloud-0", "cloud-1"]),
            &DataService::default(),
            &ViewerConfig::default(),
        );

        assert_eq!((spec.width, spec.height), (800, 400));
        assert_eq!(spec.main_url, "/api/planet/11/map?stretch=true&width=1024");
        assert_eq!(
            spec.height_url,
            "/api/planet/11/map?stretch=true&name=height&width=1024"
        );
        assert_eq!(
            spec.deform_url,
            "/api/planet/11/map?stretch=true&name=deform&width=1024"
        );
        assert_eq!(spec.star_distance, 150_000_000.0);
        assert_eq!(spec.clouds.len(), 2);
        assert_eq!(
            spec.clouds[1].texture_url,
            "/api/planet/11/map?stretch=true&name=cloud-1&width=1024"
        );
        assert!(spec.clouds[0].radius > spec.radius);
        assert!(spec.clouds[1].radius > spec.clouds[0].radius);
    }

    #[test]
    fn no_cloud_layers_no_shells() {
        let spec = GlobeSpec::new(
            &CelestialBody::default(),
            &layers(&["main"]),
            &DataService::default(),
            &ViewerConfig::default(),
        );
        assert!(spec.clouds.is_empty());
    }

    #[test]
    fn idle_globe_spins_and_clouds_counter_rotate() {
        let mut motion = GlobeMotion::new(2);
        for _ in 0..10 {
            motion.advance();
        }
        assert!((motion.rotation_x - 10.0 * SPIN.0).abs() < 1e-12);
        assert!((motion.rotation_y - 10.0 * SPIN.1).abs() < 1e-12);
        assert_eq!(motion.cloud_opacity(), 1.0);

        let inner = motion.rotation_y - motion.cloud_rotation_y(0);
        let outer = motion.rotation_y - motion.cloud_rotation_y(1);
        assert!((inner - 10.0 * CLOUD_DRIFT).abs() < 1e-12);
        assert!((outer - 20.0 * CLOUD_DRIFT).abs() < 1e-12);
    }

    #[test]
    fn pointer_sets_rotation_and_restarts_settle() {
        let mut motion = GlobeMotion::new(1);
        motion.pointer_moved(0.25, -0.5);
        assert!((motion.rotation_y - TAU / 4.0).abs() < 1e-12);
        assert!((motion.rotation_x + TAU / 2.0).abs() < 1e-12);
        assert!(motion.settling());
        assert_eq!(motion.cloud_opacity(), 0.0);

        for _ in 0..SETTLE_FRAMES / 2 {
            motion.advance();
        }
        assert!((motion.cloud_opacity() - 0.5).abs() < 1e-12);
        assert!((motion.rotation_y - TAU / 4.0).abs() < 1e-12, "no spin while settling");

        for _ in 0..SETTLE_FRAMES / 2 {
            motion.advance();
        }
        assert!(!motion.settling());
        assert_eq!(motion.cloud_opacity(), 1.0);

        motion.advance();
        assert!((motion.rotation_y - (TAU / 4.0 + SPIN.1)).abs() < 1e-12);
    }
}
