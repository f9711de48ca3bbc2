use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

mod error;
mod format;
mod logging;
mod system;
use system::body::StarId;
use system::{Presenter, ViewerConfig};

thread_local! {
    static PRESENTER: RefCell<Option<Rc<Presenter>>> = RefCell::new(None);
}

fn with_presenter<R>(f: impl FnOnce(&Rc<Presenter>) -> R) -> Result<R, &'static str> {
    PRESENTER.with(|cell| match cell.borrow().as_ref() {
        Some(presenter) => Ok(f(presenter)),
        None => Err("viewer not initialized"),
    })
}

#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init(ViewerConfig::default().log_level);
}

/// Set up the viewer against the API at `api_base` ("" for same origin).
#[wasm_bindgen]
pub fn init_viewer(api_base: String) {
    let config = ViewerConfig {
        api_base,
        ..ViewerConfig::default()
    };
    logging::init(config.log_level);
    PRESENTER.with(|p| {
        if let Some(old) = p.borrow_mut().replace(Presenter::new(config)) {
            log::info!("viewer re-initialized against {:?}", old.config().api_base);
        }
    });
}

/// Fill `#planet-menu-{star}` and `#planet-content-{star}` with the star's bodies.
#[wasm_bindgen]
pub fn show_planets(star_id: u32) -> Result<(), JsValue> {
    let presenter = with_presenter(Rc::clone).map_err(JsValue::from_str)?;
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(err) = presenter.load_body_list(StarId(star_id)).await {
            log::error!("star {}: {}", star_id, err);
        }
    });
    Ok(())
}

/// Drop the views of a star, stopping any globes they run.
#[wasm_bindgen]
pub fn close_system(star_id: u32) -> Result<(), JsValue> {
    with_presenter(|p| p.teardown(StarId(star_id))).map_err(JsValue::from_str)
}

// JS numbers arrive as f64; truncate the way the page's own integer parsing does.
fn whole(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.trunc() as u64
    } else {
        0
    }
}

#[wasm_bindgen]
pub fn pluralize(count: f64, noun: &str) -> String {
    format::pluralize(whole(count), noun)
}

#[wasm_bindgen]
pub fn format_distance(km: f64) -> String {
    format::format_distance(whole(km))
}

#[wasm_bindgen]
pub fn format_period(seconds: f64) -> String {
    format::format_period(whole(seconds))
}

#[wasm_bindgen]
pub fn format_pressure(pascals: f64) -> String {
    format::format_pressure(whole(pascals))
}
