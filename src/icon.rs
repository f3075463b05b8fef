//! Tray icons for the two mute states, drawn at startup.

use std::sync::LazyLock;

use image::{Rgba, RgbaImage};
use micmute_core::MicState;

const SIZE: u32 = 32;

const COLOR_LIVE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const COLOR_MUTED: Rgba<u8> = Rgba([152, 152, 157, 255]);
const COLOR_SLASH: Rgba<u8> = Rgba([255, 69, 58, 255]);

static ICON_LIVE: LazyLock<tray_icon::Icon> = LazyLock::new(|| load_icon(MicState::Live));
static ICON_MUTED: LazyLock<tray_icon::Icon> = LazyLock::new(|| load_icon(MicState::Muted));

/// The tray icon for a mute state.
pub fn icon(state: MicState) -> tray_icon::Icon {
    match state {
        MicState::Live => ICON_LIVE.clone(),
        MicState::Muted => ICON_MUTED.clone(),
    }
}

fn load_icon(state: MicState) -> tray_icon::Icon {
    let image = render(state);
    let (width, height) = image.dimensions();
    tray_icon::Icon::from_rgba(image.into_raw(), width, height).expect("Failed to build icon")
}

/// Draw a microphone glyph, struck through when muted.
pub fn render(state: MicState) -> RgbaImage {
    let body = match state {
        MicState::Live => COLOR_LIVE,
        MicState::Muted => COLOR_MUTED,
    };

    RgbaImage::from_fn(SIZE, SIZE, |x, y| {
        // sample at the pixel center
        let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
        if state.is_muted() && on_slash(px, py) {
            COLOR_SLASH
        } else if on_microphone(px, py) {
            body
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

fn on_microphone(x: f32, y: f32) -> bool {
    const CX: f32 = 16.0;
    let dist = |ox: f32, oy: f32| ((x - ox).powi(2) + (y - oy).powi(2)).sqrt();

    // capsule
    let capsule = (x - CX).abs() <= 4.0
        && ((7.0..=14.0).contains(&y) || dist(CX, 7.0) <= 4.0 || dist(CX, 14.0) <= 4.0);
    // cradle
    let r = dist(CX, 14.0);
    let cradle = y >= 14.0 && (7.5..=9.0).contains(&r);
    // stem and base
    let stem = (x - CX).abs() <= 1.0 && (22.5..=27.0).contains(&y);
    let base = (10.0..=22.0).contains(&x) && (27.0..=29.0).contains(&y);

    capsule || cradle || stem || base
}

fn on_slash(x: f32, y: f32) -> bool {
    // distance to the line x == y
    (x - y).abs() / std::f32::consts::SQRT_2 <= 1.5 && (3.0..=29.0).contains(&x)
}
