//! Silicon Requiem entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlImageElement, HtmlInputElement,
        KeyboardEvent, MouseEvent,
    };

    use silicon_requiem::audio::WebAudio;
    use silicon_requiem::input::InputBuffer;
    use silicon_requiem::renderer::FramePresenter;
    use silicon_requiem::sim::{Campaign, GameMode, WeaponKind};
    use silicon_requiem::{Game, SetupError, Settings};

    /// Give up on sprite downloads after this long and draw the fallbacks
    const ASSET_DEADLINE_MS: f64 = 5000.0;

    /// Browser-side state around the orchestrator
    struct App {
        game: Game,
        input: InputBuffer,
        presenter: FramePresenter,
        canvas: HtmlCanvasElement,
        last_time: f64,
        started_at: f64,
        fallbacks_installed: bool,
        pointer_locked: bool,
    }

    impl App {
        /// Match canvas and raster to the element's CSS size
        fn sync_size(&mut self) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let dpr = window.device_pixel_ratio();
            let width = (self.canvas.client_width() as f64 * dpr) as u32;
            let height = (self.canvas.client_height() as f64 * dpr) as u32;
            if width == 0 || height == 0 || (width, height) == self.presenter.size {
                return;
            }
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            self.presenter.resize(width, height);
            self.game.resize(width, height);
        }

        fn frame(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                (time - self.last_time) as f32
            } else {
                16.0
            };
            self.last_time = time;
            if self.started_at == 0.0 {
                self.started_at = time;
            }

            if !self.fallbacks_installed && time - self.started_at > ASSET_DEADLINE_MS {
                self.game.renderer.assets.install_fallbacks();
                self.fallbacks_installed = true;
            }

            self.sync_size();
            let snapshot = self.input.snapshot();
            self.game.frame(dt, &snapshot);

            match self.presenter.present(self.game.framebuffer(), time) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost) => {
                    self.presenter
                        .resize(self.presenter.size.0, self.presenter.size.1);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Present error: {:?}", e),
            }
        }

        /// Update HUD text and overlay visibility in the DOM
        fn update_hud(&self, document: &Document) {
            let state = self.game.snapshot();
            let player = &state.player;
            let set_text = |selector: &str, text: &str| {
                if let Some(el) = document.query_selector(selector).ok().flatten() {
                    el.set_text_content(Some(text));
                }
            };
            let show = |id: &str, visible: bool| {
                if let Some(el) = document.get_element_by_id(id) {
                    let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
                }
            };

            set_text("#hud-score .hud-value", &state.score.to_string());
            set_text("#hud-level .hud-value", &state.current_level.to_string());
            set_text("#hud-health .hud-value", &format!("{:.0}", player.health.max(0.0).ceil()));
            set_text("#hud-soul .hud-value", &format!("{:.0}", player.soul_energy.ceil()));
            set_text(
                "#hud-fragments .hud-value",
                &format!("{}/{}", player.memory_fragments, player.max_memory_fragments),
            );
            set_text("#hud-weapon .hud-value", weapon_label(player.active_weapon));

            if let Some(list) = document.get_element_by_id("objectives") {
                let text: Vec<String> = state
                    .objectives
                    .iter()
                    .map(|o| {
                        let mark = if o.completed { "[x]" } else { "[ ]" };
                        format!("{} {} ({:.0}/{:.0})", mark, o.description, o.progress, o.max_progress)
                    })
                    .collect();
                list.set_text_content(Some(&text.join("\n")));
            }

            let mode = state.mode;
            show("menu", mode == GameMode::Menu);
            show("hud", matches!(mode, GameMode::Playing | GameMode::Paused));
            show("pause-menu", mode == GameMode::Paused);
            show("death-screen", mode == GameMode::Dead);
            show(
                "level-complete",
                mode == GameMode::LevelComplete && !self.game.is_campaign_complete(),
            );
            show("campaign-complete", self.game.is_campaign_complete());
            if mode == GameMode::Dead || self.game.is_campaign_complete() {
                set_text("#final-score", &state.score.to_string());
            }
        }
    }

    fn weapon_label(weapon: WeaponKind) -> &'static str {
        weapon.spec().name
    }

    pub async fn run() -> Result<(), SetupError> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Silicon Requiem starting...");

        let window = web_sys::window().ok_or(SetupError::NoWindow)?;
        let document = window.document().ok_or(SetupError::NoWindow)?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into().ok())
            .ok_or_else(|| SetupError::NoCanvas("canvas".into()))?;

        let dpr = window.device_pixel_ratio();
        let width = ((canvas.client_width() as f64 * dpr) as u32).max(1);
        let height = ((canvas.client_height() as f64 * dpr) as u32).max(1);
        canvas.set_width(width);
        canvas.set_height(height);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });
        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| SetupError::Surface(e.to_string()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| SetupError::Adapter)?;
        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let presenter = FramePresenter::new(surface, &adapter, width, height).await?;

        let seed = js_sys::Date::now() as u64;
        let mut game = Game::new(Box::new(Campaign), Box::new(WebAudio::new()), seed);
        game.apply_settings(Settings::load());
        game.resize(width, height);

        let app = Rc::new(RefCell::new(App {
            game,
            input: InputBuffer::new(),
            presenter,
            canvas: canvas.clone(),
            last_time: 0.0,
            started_at: 0.0,
            fallbacks_installed: false,
            pointer_locked: false,
        }));

        load_sprites(&document, app.clone());
        setup_input_handlers(&canvas, app.clone());
        setup_buttons(&document, app.clone());
        setup_volume_sliders(&document, app.clone());
        setup_auto_pause(app.clone());

        request_animation_frame(app);

        log::info!("Silicon Requiem running!");
        Ok(())
    }

    /// Fetch each sheet through an `<img>` and read its pixels back from a
    /// scratch 2D canvas
    fn load_sprites(document: &Document, app: Rc<RefCell<App>>) {
        let requests = app.borrow_mut().game.renderer.assets.preload();
        for request in requests {
            let id = request.id;
            let Ok(image) = HtmlImageElement::new() else {
                app.borrow_mut().game.renderer.assets.fail_load(id);
                continue;
            };

            let onload = {
                let app = app.clone();
                let image = image.clone();
                let document = document.clone();
                Closure::once(move |_event: web_sys::Event| {
                    let mut a = app.borrow_mut();
                    match decode_image(&document, &image) {
                        Some((w, h, rgba)) => {
                            if let Err(e) = a.game.renderer.assets.complete_load(id, w, h, &rgba) {
                                log::warn!("{}", e);
                            }
                        }
                        None => a.game.renderer.assets.fail_load(id),
                    }
                })
            };
            let onerror = {
                let app = app.clone();
                Closure::once(move |_event: web_sys::Event| {
                    app.borrow_mut().game.renderer.assets.fail_load(id);
                })
            };
            image.set_onload(Some(onload.as_ref().unchecked_ref()));
            image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
            onload.forget();
            onerror.forget();
            image.set_src(request.path);
        }
    }

    fn decode_image(document: &Document, image: &HtmlImageElement) -> Option<(u32, u32, Vec<u8>)> {
        let (w, h) = (image.natural_width(), image.natural_height());
        if w == 0 || h == 0 {
            return None;
        }
        let scratch: HtmlCanvasElement = document.create_element("canvas").ok()?.dyn_into().ok()?;
        scratch.set_width(w);
        scratch.set_height(h);
        let ctx: CanvasRenderingContext2d = scratch.get_context("2d").ok()??.dyn_into().ok()?;
        ctx.draw_image_with_html_image_element(image, 0.0, 0.0).ok()?;
        let data = ctx.get_image_data(0.0, 0.0, w as f64, h as f64).ok()?;
        Some((w, h, data.data().0))
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Pointer lock change
        {
            let app = app.clone();
            let doc = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let locked = doc.pointer_lock_element().is_some();
                log::debug!("Pointer lock {}", if locked { "acquired" } else { "released" });
                app.borrow_mut().pointer_locked = locked;
            });
            let _ = document.add_event_listener_with_callback(
                "pointerlockchange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Mouse move: movementX/Y while locked
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut a = app.borrow_mut();
                let (dx, dy) = if a.pointer_locked {
                    (event.movement_x() as f32, event.movement_y() as f32)
                } else {
                    (0.0, 0.0)
                };
                a.input
                    .mouse_move(dx, dy, event.offset_x() as f32, event.offset_y() as f32);
            });
            let _ = document
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse down: grab the pointer while playing, record the button
        {
            let app = app.clone();
            let target = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut a = app.borrow_mut();
                a.input.mouse_button(event.button(), true);
                if !a.pointer_locked && a.game.mode() == GameMode::Playing {
                    drop(a);
                    target.request_pointer_lock();
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                app.borrow_mut().input.mouse_button(event.button(), false);
            });
            let _ = window
                .add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if app.borrow_mut().input.key_down(&event.code()) {
                    event.prevent_default();
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                app.borrow_mut().input.key_up(&event.code());
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn on_click(document: &Document, id: &str, mut action: impl FnMut() + 'static) {
        if let Some(btn) = document.get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| action());
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(document: &Document, app: Rc<RefCell<App>>) {
        {
            let app = app.clone();
            on_click(document, "start-btn", move || app.borrow_mut().game.start());
        }
        {
            let app = app.clone();
            on_click(document, "restart-btn", move || app.borrow_mut().game.restart());
        }
        on_click(document, "resume-btn", move || app.borrow_mut().game.resume());
    }

    fn setup_volume_sliders(document: &Document, app: Rc<RefCell<App>>) {
        let sliders: [(&str, fn(&mut Game, f32)); 2] = [
            ("music-volume", Game::set_music_volume),
            ("sfx-volume", Game::set_sfx_volume),
        ];
        for (id, apply) in sliders {
            let Some(input) = document
                .get_element_by_id(id)
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            else {
                continue;
            };
            let app = app.clone();
            let source = input.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let Ok(percent) = source.value().parse::<f32>() else {
                    return;
                };
                let mut a = app.borrow_mut();
                apply(&mut a.game, percent / 100.0);
                a.game.settings.save();
            });
            let _ = input.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();
            let before = a.game.mode();
            a.frame(time);
            let after = a.game.mode();

            // Release the pointer whenever play stops
            if before == GameMode::Playing && after != GameMode::Playing && a.pointer_locked {
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    document.exit_pointer_lock();
                }
            }
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                a.update_hud(&document);
            }
        }

        request_animation_frame(app);
    }

    fn setup_auto_pause(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let app = app.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut a = app.borrow_mut();
                    a.input.release_all();
                    if a.game.mode() == GameMode::Playing {
                        a.game.pause();
                        log::info!("Auto-paused (tab hidden)");
                    }
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut a = app.borrow_mut();
                a.input.release_all();
                if a.game.mode() == GameMode::Playing {
                    a.game.pause();
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_game::run().await {
        log::error!("Startup failed: {}", e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Silicon Requiem (native) starting...");
    log::info!("The playable build targets the browser - run with `trunk serve` for the web version");

    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless run of the first level: walk, turn and shoot for a few
/// simulated seconds, then report
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use silicon_requiem::Game;
    use silicon_requiem::audio::NullAudio;
    use silicon_requiem::input::InputBuffer;
    use silicon_requiem::sim::Campaign;

    const FRAMES: usize = 600;
    const FRAME_MS: f32 = 16.0;

    pub fn run() {
        let mut game = Game::new(Box::new(Campaign), Box::new(NullAudio), 1);
        game.resize(640, 400);
        game.renderer.assets.install_fallbacks();
        game.start();

        let mut input = InputBuffer::new();
        input.key_down("KeyW");
        for frame in 0..FRAMES {
            input.mouse_move(if frame % 120 < 60 { 3.0 } else { -3.0 }, 0.0, 0.0, 0.0);
            input.mouse_button(0, frame % 20 < 10);
            let snapshot = input.snapshot();
            game.frame(FRAME_MS, &snapshot);
        }

        let state = game.snapshot();
        log::info!(
            "Demo finished: mode {:?}, t={:.0} ms, score {}, health {:.0}, {} enemies alive",
            state.mode,
            state.game_time,
            state.score,
            state.player.health,
            state.enemies.iter().filter(|e| !e.is_dead()).count()
        );
        println!(
            "Rendered {} frames at {}x{}, final mode {:?}, score {}",
            FRAMES,
            game.framebuffer().width,
            game.framebuffer().height,
            state.mode,
            state.score
        );
    }
}
