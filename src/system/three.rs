use wasm_bindgen::prelude::*;

#[wasm_bindgen(js_namespace = THREE)]
extern "C" {
    #[derive(Clone, Debug)]
    pub type Object3D;

    #[wasm_bindgen(method)]
    pub fn add(this: &Object3D, child: &Object3D);

    #[wasm_bindgen(method, getter)]
    pub fn rotation(this: &Object3D) -> Euler;

    #[wasm_bindgen(method, getter)]
    pub fn position(this: &Object3D) -> Vector3;

    #[derive(Clone, Debug)]
    pub type Euler;

    #[wasm_bindgen(method, setter)]
    pub fn set_x(this: &Euler, value: f64);

    #[wasm_bindgen(method, setter)]
    pub fn set_y(this: &Euler, value: f64);

    #[derive(Clone, Debug)]
    pub type Vector3;

    #[wasm_bindgen(method, js_name = set)]
    pub fn set_xyz(this: &Vector3, x: f64, y: f64, z: f64);

    #[wasm_bindgen(extends = Object3D)]
    #[derive(Clone, Debug)]
    pub type Scene;

    #[wasm_bindgen(constructor)]
    pub fn new() -> Scene;

    #[wasm_bindgen(extends = Object3D)]
    #[derive(Clone, Debug)]
    pub type PerspectiveCamera;

    #[wasm_bindgen(constructor)]
    pub fn new(fov: f64, aspect: f64, near: f64, far: f64) -> PerspectiveCamera;

    #[derive(Clone, Debug)]
    pub type WebGLRenderer;

    #[wasm_bindgen(constructor)]
    pub fn new() -> WebGLRenderer;

    #[wasm_bindgen(method, js_name = setSize)]
    pub fn set_size(this: &WebGLRenderer, width: u32, height: u32);

    #[wasm_bindgen(method, getter, js_name = domElement)]
    pub fn dom_element(this: &WebGLRenderer) -> web_sys::HtmlCanvasElement;

    #[wasm_bindgen(method)]
    pub fn render(this: &WebGLRenderer, scene: &Scene, camera: &PerspectiveCamera);

    #[wasm_bindgen(method)]
    pub fn dispose(this: &WebGLRenderer);

    #[derive(Clone, Debug)]
    pub type Texture;

    #[derive(Clone, Debug)]
    pub type TextureLoader;

    #[wasm_bindgen(constructor)]
    pub fn new() -> TextureLoader;

    #[wasm_bindgen(method)]
    pub fn load(this: &TextureLoader, url: &str) -> Texture;

    #[derive(Clone, Debug)]
    pub type SphereGeometry;

    #[wasm_bindgen(constructor)]
    pub fn new(radius: f64, width_segments: u32, height_segments: u32) -> SphereGeometry;

    #[derive(Clone, Debug)]
    pub type MeshPhongMaterial;

    /// `params` is a plain object of material options.
    #[wasm_bindgen(constructor)]
    pub fn new(params: &JsValue) -> MeshPhongMaterial;

    #[wasm_bindgen(method, setter)]
    pub fn set_opacity(this: &MeshPhongMaterial, value: f64);

    #[wasm_bindgen(extends = Object3D)]
    #[derive(Clone, Debug)]
    pub type Mesh;

    #[wasm_bindgen(constructor)]
    pub fn new(geometry: &SphereGeometry, material: &MeshPhongMaterial) -> Mesh;

    #[wasm_bindgen(extends = Object3D)]
    #[derive(Clone, Debug)]
    pub type AmbientLight;

    #[wasm_bindgen(constructor)]
    pub fn new(color: u32) -> AmbientLight;

    #[wasm_bindgen(extends = Object3D)]
    #[derive(Clone, Debug)]
    pub type PointLight;

    #[wasm_bindgen(constructor)]
    pub fn new(color: u32, intensity: f64, distance: f64, decay: f64) -> PointLight;
}
