//! UI helper components

use eframe::egui;

use stablepay_wallet_core::{CoinType, Notice, NoticeLevel};

const ACCENT: egui::Color32 = egui::Color32::from_rgb(0, 212, 170);

/// Styled heading with accent color
pub fn styled_heading(ui: &mut egui::Ui, text: &str) {
    ui.heading(egui::RichText::new(text).color(ACCENT));
}

/// Section header with separator
pub fn section_header(ui: &mut egui::Ui, text: &str) {
    ui.add_space(10.0);
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(text).strong().size(14.0));
    });
    ui.separator();
}

/// Labeled field with copy button
pub fn labeled_field_with_copy(ui: &mut egui::Ui, label: &str, value: &str) -> bool {
    let mut copied = false;
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(format!("{}:", label)).strong());
        ui.label(egui::RichText::new(value).monospace());
        if ui
            .small_button("📋")
            .on_hover_text("Copy to clipboard")
            .clicked()
        {
            copied = true;
        }
    });
    copied
}

pub fn copy_to_clipboard(text: &str) {
    match arboard::Clipboard::new() {
        Ok(mut clipboard) => {
            if let Err(e) = clipboard.set_text(text) {
                tracing::warn!(error = %e, "clipboard write failed");
            }
        }
        Err(e) => tracing::warn!(error = %e, "clipboard unavailable"),
    }
}

/// Create a styled text edit for address input
pub fn address_input(ui: &mut egui::Ui, value: &mut String) -> egui::Response {
    ui.add(
        egui::TextEdit::singleline(value)
            .hint_text("0x...")
            .desired_width(380.0)
            .font(egui::TextStyle::Monospace),
    )
}

pub fn amount_input(ui: &mut egui::Ui, value: &mut String) -> egui::Response {
    ui.add(
        egui::TextEdit::singleline(value)
            .hint_text("0.00")
            .desired_width(150.0)
            .font(egui::TextStyle::Monospace),
    )
}

pub fn coin_picker(ui: &mut egui::Ui, id: &str, value: &mut CoinType, coins: &[CoinType]) {
    egui::ComboBox::from_id_salt(id)
        .selected_text(value.symbol())
        .width(80.0)
        .show_ui(ui, |ui| {
            for coin in coins {
                ui.selectable_value(value, *coin, coin.symbol());
            }
        });
}

/// Primary action button. Shows `busy_label` with a spinner while busy.
pub fn primary_button(
    ui: &mut egui::Ui,
    text: &str,
    busy_label: Option<&str>,
    enabled: bool,
) -> bool {
    if let Some(label) = busy_label {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(label);
        });
        return false;
    }
    let btn = egui::Button::new(egui::RichText::new(text).size(14.0).color(egui::Color32::WHITE))
        .min_size(egui::vec2(130.0, 34.0))
        .fill(egui::Color32::from_rgb(0, 180, 150));
    ui.add_enabled(enabled, btn).clicked()
}

/// Renders the notice banner. Returns true when the user dismissed it.
pub fn notice_banner(ui: &mut egui::Ui, notice: &Notice) -> bool {
    let (icon, color) = match notice.level {
        NoticeLevel::Success => ("✅", egui::Color32::from_rgb(80, 200, 120)),
        NoticeLevel::Info => ("ℹ", egui::Color32::from_rgb(120, 170, 230)),
        NoticeLevel::Error => ("❌", egui::Color32::from_rgb(220, 80, 80)),
    };
    let mut dismissed = false;
    egui::Frame::group(ui.style())
        .stroke(egui::Stroke::new(1.0, color))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(icon).size(16.0));
                ui.label(egui::RichText::new(&notice.message).color(color));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    dismissed = ui.small_button("✖").on_hover_text("Dismiss").clicked();
                });
            });
        });
    dismissed
}

/// Secondary action button - subdued, outline style
pub fn secondary_button(ui: &mut egui::Ui, text: &str, enabled: bool) -> egui::Response {
    let btn = egui::Button::new(egui::RichText::new(text).size(14.0))
        .min_size(egui::vec2(90.0, 34.0));
    ui.add_enabled(enabled, btn)
}

/// Render content in a subtle card/frame
pub fn card(ui: &mut egui::Ui, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::none()
        .fill(ui.visuals().faint_bg_color)
        .rounding(6.0)
        .inner_margin(12.0)
        .show(ui, add_contents);
}
