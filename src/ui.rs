// ui.rs — egui overlay: panorama selector, hint bar, loading cover, exit button, fallback screen

use std::path::{Path, PathBuf};

use egui::{Align2, Color32, RichText};

/// What the user asked for through the overlay this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayAction {
    Select(usize),
    Exit,
    OpenRoom,
}

/// Everything the overlay needs to draw one frame.
#[derive(Debug, Clone)]
pub struct ViewerOverlay<'a> {
    pub labels: &'a [String],
    pub selected: usize,
    pub loading: bool,
}

/// The selector only appears when there is something to choose between.
pub fn selector_visible(entry_count: usize) -> bool {
    entry_count > 1
}

fn pill_frame() -> egui::Frame {
    egui::Frame::none()
        .fill(Color32::from_black_alpha(140))
        .rounding(20.0)
        .inner_margin(egui::Margin::symmetric(12.0, 6.0))
}

pub fn draw_viewer_overlay(ctx: &egui::Context, overlay: &ViewerOverlay<'_>) -> Option<OverlayAction> {
    let mut action = None;

    if overlay.loading {
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::BLACK))
            .show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    ui.add(egui::Spinner::new().size(40.0).color(Color32::WHITE));
                });
            });
    }

    if selector_visible(overlay.labels.len()) {
        egui::Area::new("panorama_selector")
            .anchor(Align2::CENTER_BOTTOM, [0.0, -80.0])
            .show(ctx, |ui| {
                pill_frame().show(ui, |ui| {
                    ui.horizontal(|ui| {
                        for (index, label) in overlay.labels.iter().enumerate() {
                            let text = RichText::new(label).color(Color32::WHITE);
                            if ui.selectable_label(index == overlay.selected, text).clicked() {
                                action = Some(OverlayAction::Select(index));
                            }
                        }
                    });
                });
            });
    }

    egui::Area::new("viewer_hint")
        .anchor(Align2::CENTER_BOTTOM, [0.0, -30.0])
        .interactable(false)
        .show(ctx, |ui| {
            pill_frame().show(ui, |ui| {
                ui.label(RichText::new(crate::i18n::tr("viewer.hint")).color(Color32::WHITE));
            });
        });

    egui::Area::new("viewer_exit")
        .anchor(Align2::RIGHT_TOP, [-20.0, 20.0])
        .show(ctx, |ui| {
            let button = egui::Button::new(
                RichText::new(crate::i18n::tr("viewer.exit"))
                    .color(Color32::WHITE)
                    .size(16.0),
            )
            .fill(Color32::from_black_alpha(160))
            .rounding(6.0);
            if ui.add(button).clicked() {
                action = Some(OverlayAction::Exit);
            }
        });

    action
}

/// Full-window message shown instead of the viewer, with a way back out.
pub fn draw_fallback(ctx: &egui::Context, message: &str) -> Option<OverlayAction> {
    let mut action = None;
    egui::CentralPanel::default()
        .frame(egui::Frame::none().fill(Color32::from_gray(24)))
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.4);
                ui.label(RichText::new(message).color(Color32::WHITE).size(18.0));
                ui.add_space(16.0);
                ui.horizontal(|ui| {
                    if ui.button(crate::i18n::tr("menu.open_room")).clicked() {
                        action = Some(OverlayAction::OpenRoom);
                    }
                    if ui.button(crate::i18n::tr("viewer.back")).clicked() {
                        action = Some(OverlayAction::Exit);
                    }
                });
            });
        });
    action
}

fn font_candidates() -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    if cfg!(windows) {
        let win_fonts = PathBuf::from(r"C:\Windows\Fonts");
        for f in ["malgun.ttf", "malgunbd.ttf", "gulim.ttc", "msyh.ttf", "segoeui.ttf", "arial.ttf"] {
            candidates.push(win_fonts.join(f));
        }
    } else if cfg!(target_os = "macos") {
        for f in [
            "/System/Library/Fonts/AppleSDGothicNeo.ttc",
            "/Library/Fonts/NotoSansKR-Regular.otf",
            "/Library/Fonts/NotoSansCJK-Regular.ttc",
            "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
        ] {
            candidates.push(PathBuf::from(f));
        }
        if let Ok(home) = std::env::var("HOME") {
            candidates.push(PathBuf::from(home).join("Library/Fonts/NotoSansKR-Regular.otf"));
        }
    } else if cfg!(unix) {
        for f in [
            "/usr/share/fonts/opentype/noto/NotoSansKR-Regular.otf",
            "/usr/share/fonts/truetype/noto/NotoSansKR-Regular.ttf",
            "/usr/share/fonts/truetype/nanum/NanumGothic.ttf",
            "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/truetype/wqy/wqy-zenhei.ttc",
        ] {
            candidates.push(PathBuf::from(f));
        }
        if let Ok(home) = std::env::var("HOME") {
            let home = PathBuf::from(home);
            for f in [
                ".local/share/fonts/NotoSansKR-Regular.ttf",
                ".local/share/fonts/NanumGothic.ttf",
                ".fonts/NotoSansKR-Regular.ttf",
            ] {
                candidates.push(home.join(f));
            }
        }
    }

    // fonts shipped next to the binary or in the working directory
    let asset_files = [
        "NotoSansKR-Regular.otf",
        "NotoSansKR-Regular.ttf",
        "NanumGothic.ttf",
        "NotoSansCJK-Regular.ttc",
    ];
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            for f in asset_files {
                candidates.push(dir.join("assets").join(f));
            }
        }
    }
    for f in asset_files {
        candidates.push(PathBuf::from("assets").join(f));
    }
    candidates
}

/// Read `path` and keep it only if ab_glyph can parse it (.ttc support is spotty).
fn load_font(path: &Path) -> Option<Vec<u8>> {
    let bytes = std::fs::read(path).ok()?;
    ab_glyph::FontArc::try_from_vec(bytes.clone()).ok()?;
    Some(bytes)
}

/// Install the first usable Hangul-capable font in front of egui's defaults.
pub fn setup_fonts(ctx: &egui::Context) {
    let chosen = font_candidates()
        .into_iter()
        .find_map(|p| load_font(&p).map(|bytes| (p, bytes)));

    let Some((font_path, font_bytes)) = chosen else {
        log::warn!("{}", crate::i18n::tr("font.not_found"));
        return;
    };
    log::info!(
        "{}",
        crate::i18n::tr_with("font.using", &[("path", font_path.display().to_string())])
    );

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("ui".to_owned(), egui::FontData::from_owned(font_bytes));
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        if let Some(list) = fonts.families.get_mut(&family) {
            list.insert(0, "ui".to_owned());
        }
    }
    ctx.set_fonts(fonts);
}
