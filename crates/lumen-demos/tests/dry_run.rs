use lumen_demos::{ClearScreen, Demo, Triangle, dry_run};
use lumen_engine::config::LumenConfig;
use lumen_engine::coords::{Color, Viewport};
use lumen_engine::device::{BackendPreference, BackendRequest, Call, Primitive};

fn config(extra: &str) -> LumenConfig {
    LumenConfig::from_toml(extra).unwrap()
}

// ── clear-screen ─────────────────────────────────────────────────────────

#[test]
fn clear_screen_clears_blue_every_tick() {
    let api = dry_run::<ClearScreen>(&LumenConfig::default(), 10).unwrap();

    assert_eq!(api.current_clear_color(), Color::blue());
    assert_eq!(api.count_calls(|c| matches!(c, Call::ClearColor(_))), 1);
    assert_eq!(api.count_calls(|c| *c == Call::Clear), 10);
    assert_eq!(api.count_calls(|c| matches!(c, Call::DrawArrays { .. })), 0);
    assert_eq!(api.frames_presented(), 10);
    assert_eq!(api.live_programs() + api.live_buffers() + api.live_shaders(), 0);
}

#[test]
fn configured_clear_color_wins() {
    let cfg = config("[render]\nclear_color = [1.0, 0.0, 0.0, 1.0]");
    let api = dry_run::<ClearScreen>(&cfg, 1).unwrap();
    assert_eq!(api.current_clear_color(), Color::new(1.0, 0.0, 0.0, 1.0));
}

#[test]
fn viewport_matches_window_size() {
    let api = dry_run::<ClearScreen>(&config("[window]\nwidth = 320\nheight = 200"), 1).unwrap();
    assert_eq!(api.current_viewport(), Viewport::full(320, 200));
}

#[test]
fn legacy_only_preference_is_honored() {
    let cfg = config("[render]\nbackend = \"legacy\"");
    assert_eq!(cfg.render.backend, BackendPreference::Legacy);

    let api = dry_run::<ClearScreen>(&cfg, 1).unwrap();
    assert_eq!(api.backend(), BackendRequest::Legacy);
}

// ── triangle ─────────────────────────────────────────────────────────────

#[test]
fn triangle_draws_every_tick_and_cleans_up() {
    let api = dry_run::<Triangle>(&LumenConfig::default(), 30).unwrap();

    assert_eq!(api.current_clear_color(), Triangle::CLEAR_COLOR);
    assert_eq!(api.count_calls(|c| *c == Call::Clear), 30);
    let triangle = Call::DrawArrays {
        mode: Primitive::Triangles,
        first: 0,
        count: 3,
    };
    assert_eq!(api.count_calls(|c| *c == triangle), 30);

    // Shutdown released the program and the buffer.
    assert_eq!(api.live_programs(), 0);
    assert_eq!(api.live_buffers(), 0);
    assert_eq!(api.live_shaders(), 0);
}

#[test]
fn shader_directory_overrides_builtin_text() {
    let dir = std::env::temp_dir().join(format!("lumen-demo-shaders-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("fragment_shader.wgsl"),
        "@fragment fn main() -> @location(0) vec4<f32> { return vec4<f32>(0.0, 1.0, 0.0, 1.0); }",
    )
    .unwrap();

    let cfg = config(&format!("[shaders]\ndirectory = {:?}", dir.display().to_string()));
    let api = dry_run::<Triangle>(&cfg, 2).unwrap();
    assert_eq!(api.count_calls(|c| matches!(c, Call::DrawArrays { .. })), 2);

    std::fs::write(dir.join("vertex_shader.wgsl"), "this is not wgsl").unwrap();
    let err = dry_run::<Triangle>(&cfg, 2).unwrap_err();
    assert!(format!("{err:#}").contains("vertex_shader"), "{err:#}");

    std::fs::remove_dir_all(&dir).unwrap();
}
