//! Thumbnail grid rendering and decoded-image texture slots.

use std::collections::HashMap;

use eframe::egui;
use egui::TextureHandle;
use shared::domain::{Image, ImageId};

use crate::media::PreviewImage;

pub const TILE_SIZE: f32 = 180.0;

/// Lifecycle of one remote image on the UI side.
pub enum ImageSlot {
    Pending,
    Decoded(PreviewImage),
    Uploaded(TextureHandle),
    Failed(String),
}

impl ImageSlot {
    /// Uploads decoded pixels on first use and returns the GPU texture.
    pub fn texture(&mut self, ctx: &egui::Context, name: String) -> Option<&TextureHandle> {
        if let ImageSlot::Decoded(image) = self {
            let color_image =
                egui::ColorImage::from_rgba_unmultiplied([image.width, image.height], &image.rgba);
            let texture = ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR);
            *self = ImageSlot::Uploaded(texture);
        }
        match self {
            ImageSlot::Uploaded(texture) => Some(texture),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ImageSlot::Pending)
    }
}

/// Draws every image as a fixed-size tile in a wrapping layout.
///
/// Returns the index of the clicked tile. When `scroll_to` names a tile, the
/// scroll area is moved so that tile sits at the top of the viewport.
pub fn show_image_grid(
    ui: &mut egui::Ui,
    images: &[Image],
    slots: &mut HashMap<ImageId, ImageSlot>,
    scroll_to: Option<usize>,
) -> Option<usize> {
    let mut clicked = None;
    let tile = egui::vec2(TILE_SIZE, TILE_SIZE);

    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing = egui::vec2(8.0, 8.0);
        for (index, image) in images.iter().enumerate() {
            let texture_name = format!("thumbnail:{}", image.id);
            let response = match slots
                .get_mut(&image.id)
                .and_then(|slot| slot.texture(ui.ctx(), texture_name))
            {
                Some(texture) => {
                    let mut size = texture.size_vec2();
                    let scale = (tile.x / size.x).min(tile.y / size.y);
                    size *= scale;
                    ui.add_sized(
                        tile,
                        egui::Button::image(
                            egui::Image::new(texture)
                                .fit_to_exact_size(size)
                                .corner_radius(egui::CornerRadius::same(6)),
                        )
                        .frame(false),
                    )
                }
                None => placeholder_tile(ui, tile, slots.get(&image.id)),
            };

            if scroll_to == Some(index) {
                response.scroll_to_me(Some(egui::Align::TOP));
            }
            let response = match image.caption() {
                Some(caption) => response.on_hover_text(caption),
                None => response,
            };
            if response.clicked() {
                clicked = Some(index);
            }
        }
    });

    clicked
}

fn placeholder_tile(
    ui: &mut egui::Ui,
    tile: egui::Vec2,
    slot: Option<&ImageSlot>,
) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(tile, egui::Sense::click());
    ui.painter().rect_filled(
        rect,
        egui::CornerRadius::same(6),
        ui.visuals().faint_bg_color,
    );
    match slot {
        Some(ImageSlot::Failed(_)) => {
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Image unavailable",
                egui::FontId::proportional(13.0),
                ui.visuals().weak_text_color(),
            );
        }
        _ => {
            let spinner = rect.shrink((TILE_SIZE - 24.0) / 2.0);
            ui.put(spinner, egui::Spinner::new());
        }
    }
    match slot {
        Some(ImageSlot::Failed(reason)) => response.on_hover_text(reason.as_str()),
        _ => response,
    }
}
