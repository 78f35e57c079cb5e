pub mod config;
pub mod engine;
pub mod error;
pub mod game;

mod audio;
mod logger;
mod storage;

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlCanvasElement, KeyboardEvent, Request, RequestInit, RequestMode, Response, WebGlRenderingContext};

use crate::audio::BrowserAudio;
use crate::config::AppConfig;
use crate::engine::mesh::Mesh;
use crate::engine::renderer::Renderer;
use crate::game::player::Step;
use crate::game::prefs::{MemoryPrefs, PrefsStore};
use crate::game::session::{GameEvent, Session};
use crate::game::Game;
use crate::storage::LocalStoragePrefs;

/// Longest frame the simulation will integrate; longer gaps (tab switches) are clamped.
const MAX_FRAME_SECONDS: f32 = 0.1;

thread_local! {
    static GAME: RefCell<Option<Game>> = RefCell::new(None);
}

#[wasm_bindgen]
pub async fn init_game() -> Result<(), JsValue> {
    logger::init(log::LevelFilter::Info);

    let window = web_sys::window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;
    let canvas = document.get_element_by_id("canvas")
        .ok_or("No canvas")?
        .dyn_into::<HtmlCanvasElement>()?;

    let gl = canvas
        .get_context("webgl")?
        .ok_or("No WebGL")?
        .dyn_into::<WebGlRenderingContext>()?;

    let renderer = Renderer::new(gl)?;

    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let config = match fetch_ok(&window, "/assets/config.json", &opts).await {
        Some(resp) => {
            let text = JsFuture::from(resp.text()?).await?;
            let text = text.as_string().ok_or("config.json is not text")?;
            AppConfig::from_json(&text)?
        }
        None => {
            log::warn!("no /assets/config.json, using defaults");
            AppConfig::default()
        }
    };

    let car_mesh = match fetch_ok(&window, &config.car_model.path, &opts).await {
        Some(resp) => {
            let buffer = JsFuture::from(resp.array_buffer()?).await?;
            let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
            match Mesh::from_gltf(&bytes) {
                Ok(mesh) => Some(mesh),
                Err(err) => {
                    log::warn!("car model {} unusable, drawing voxel cars: {}", config.car_model.path, err);
                    None
                }
            }
        }
        None => {
            log::warn!("car model {} not found, drawing voxel cars", config.car_model.path);
            None
        }
    };

    let prefs: Box<dyn PrefsStore> = match LocalStoragePrefs::open() {
        Some(store) => Box::new(store),
        None => {
            log::warn!("localStorage unavailable, progress will not be saved");
            Box::new(MemoryPrefs::new())
        }
    };
    let session = Session::new(config, None, prefs, Box::new(BrowserAudio::load()))?;
    let game = Game::new(renderer, session, car_mesh)?;
    GAME.with(|g| *g.borrow_mut() = Some(game));

    // Input handling
    let closure = Closure::wrap(Box::new(move |event: KeyboardEvent| {
        if event.repeat() {
            return;
        }
        let handled = with_game(|game| {
            let session = &mut game.session;
            match event.key().as_str() {
                "ArrowUp" | "w" | "W" | " " => session.queue_step(Step::Forward),
                "ArrowDown" | "s" | "S" => session.queue_step(Step::Back),
                "ArrowLeft" | "a" | "A" => session.queue_step(Step::Left),
                "ArrowRight" | "d" | "D" => session.queue_step(Step::Right),
                "p" | "P" | "Escape" if session.is_over() => session.cancel_effects(),
                "p" | "P" | "Escape" => {
                    session.toggle_pause();
                }
                "r" | "R" => session.restart(None),
                _ => return false,
            }
            true
        });
        if handled == Some(true) {
            event.prevent_default();
        }
    }) as Box<dyn FnMut(_)>);

    window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
    closure.forget();

    // Game loop
    let f: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();
    let mut last_frame: Option<f64> = None;

    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |now: f64| {
        let dt = last_frame.map_or(0.0, |last| ((now - last) / 1000.0) as f32);
        last_frame = Some(now);

        with_game(|game| {
            game.update(dt.clamp(0.0, MAX_FRAME_SECONDS));
            game.render();
            for event in game.session.drain_events() {
                if let GameEvent::GameOver { steps, new_record: true, .. } = event {
                    log::info!("record run of {} steps", steps);
                }
            }
            update_ui(&game.session);
        });
        if let Some(callback) = f.borrow().as_ref() {
            request_animation_frame(callback);
        }
    }) as Box<dyn FnMut(f64)>));

    if let Some(callback) = g.borrow().as_ref() {
        request_animation_frame(callback);
    }

    Ok(())
}

async fn fetch_ok(window: &web_sys::Window, url: &str, opts: &RequestInit) -> Option<Response> {
    let request = Request::new_with_str_and_init(url, opts).ok()?;
    let resp: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .ok()?
        .dyn_into()
        .ok()?;
    resp.ok().then_some(resp)
}

fn with_game<R>(f: impl FnOnce(&mut Game) -> R) -> Option<R> {
    GAME.with(|g| g.borrow_mut().as_mut().map(f))
}

fn request_animation_frame(f: &Closure<dyn FnMut(f64)>) {
    let requested = web_sys::window()
        .map(|window| window.request_animation_frame(f.as_ref().unchecked_ref()));
    if !matches!(requested, Some(Ok(_))) {
        log::error!("requestAnimationFrame failed, stopping the game loop");
    }
}

fn update_ui(session: &Session) {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };
    let summary = session.summary();
    if let Some(score_el) = document.get_element_by_id("score") {
        score_el.set_inner_html(&format!(
            "Score: {} | Coins: {} | Best: {}",
            summary.steps, summary.coins, summary.high_score
        ));
    }
    if let Some(gameover_el) = document.get_element_by_id("gameover") {
        let display = if summary.alive { "none" } else { "block" };
        gameover_el.set_attribute("style", &format!("display: {};", display)).ok();
    }
    if let Some(paused_el) = document.get_element_by_id("paused") {
        let display = if summary.paused { "block" } else { "none" };
        paused_el.set_attribute("style", &format!("display: {};", display)).ok();
    }
}

fn queue(step: Step) {
    with_game(|game| game.session.queue_step(step));
}

#[wasm_bindgen]
pub fn touch_forward() {
    queue(Step::Forward);
}

#[wasm_bindgen]
pub fn touch_left() {
    queue(Step::Left);
}

#[wasm_bindgen]
pub fn touch_right() {
    queue(Step::Right);
}

#[wasm_bindgen]
pub fn touch_back() {
    queue(Step::Back);
}

#[wasm_bindgen]
pub fn touch_restart() {
    with_game(|game| game.session.restart(None));
}

/// Returns whether the game is paused afterwards.
#[wasm_bindgen]
pub fn toggle_pause() -> bool {
    with_game(|game| game.session.toggle_pause()).unwrap_or(false)
}

/// Clears the saved high score and coin total.
#[wasm_bindgen]
pub fn reset_progress() {
    with_game(|game| game.session.reset_saved_progress());
}

#[wasm_bindgen]
pub fn session_stats() -> Result<JsValue, JsValue> {
    let summary = with_game(|game| game.session.summary()).ok_or("Game not started")?;
    Ok(serde_wasm_bindgen::to_value(&summary)?)
}
