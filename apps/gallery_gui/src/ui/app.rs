//! Gallery app shell: event intake, search actions, and frame rendering.

use std::collections::HashMap;

use arboard::Clipboard;
use chrono::{DateTime, Local, TimeZone, Utc};
use client_core::{FetchTicket, SearchController, SettleOutcome};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::{
    domain::{Image, ImageId, SearchResult},
    error::SearchError,
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{err_label, UiError, UiErrorContext, UiEvent},
    orchestration::dispatch_backend_command,
};
use crate::media::ImagePurpose;
use crate::ui::gallery::{show_image_grid, ImageSlot};

#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    pub initial_query: Option<String>,
    /// Configuration problem found before the window opened.
    pub startup_error: Option<SearchError>,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    message: String,
    retryable: bool,
}

pub struct GalleryApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    search: SearchController,
    query_input: String,
    thumbnails: HashMap<ImageId, ImageSlot>,
    previews: HashMap<ImageId, ImageSlot>,
    selected: Option<Image>,
    status: String,
    status_banner: Option<StatusBanner>,
}

impl GalleryApp {
    pub fn bootstrap(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: StartupConfig,
    ) -> Self {
        let mut app = Self {
            cmd_tx,
            ui_rx,
            search: SearchController::new(),
            query_input: startup.initial_query.clone().unwrap_or_default(),
            thumbnails: HashMap::new(),
            previews: HashMap::new(),
            selected: None,
            status: "Type a search term and press Enter".to_string(),
            status_banner: None,
        };

        if let Some(err) = startup.startup_error {
            let ui_error = UiError::from_search_error(UiErrorContext::BackendStartup, &err);
            app.status = format!("{}: {}", err_label(ui_error.category()), err.message);
            app.status_banner = Some(StatusBanner {
                message: err.message.clone(),
                retryable: false,
            });
        }
        if startup.initial_query.is_some() {
            app.submit_search();
        }
        app
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    if !self.search.state().loading() && self.status_banner.is_none() {
                        self.status = message;
                    }
                }
                UiEvent::Error(err) => self.show_error(&err),
                UiEvent::SearchSettled { seq, outcome } => self.on_search_settled(seq, outcome),
                UiEvent::ImageLoaded {
                    image_id,
                    purpose,
                    image,
                } => {
                    if let Some(slot) = self.slots_for(purpose).get_mut(&image_id) {
                        *slot = ImageSlot::Decoded(image);
                    }
                }
                UiEvent::ImageFailed {
                    image_id,
                    purpose,
                    reason,
                } => {
                    if let Some(slot) = self.slots_for(purpose).get_mut(&image_id) {
                        *slot = ImageSlot::Failed(reason);
                    }
                }
            }
        }
    }

    fn on_search_settled(&mut self, seq: u64, outcome: Result<SearchResult, SearchError>) {
        let context = match self.search.in_flight() {
            Some(ticket) if ticket.seq == seq && !ticket.page.is_first() => {
                UiErrorContext::LoadMore
            }
            _ => UiErrorContext::Search,
        };
        let failure = outcome.as_ref().err().cloned();

        match self.search.on_fetch_settled(seq, outcome) {
            SettleOutcome::Replaced { .. } => {
                self.thumbnails.clear();
                self.previews.clear();
                self.selected = None;
                self.status_banner = None;
                self.request_thumbnails(0);
                self.status = self.results_summary();
            }
            SettleOutcome::Appended { count } => {
                self.status_banner = None;
                let first_new = self.search.state().images().len() - count;
                self.request_thumbnails(first_new);
                self.status = self.results_summary();
            }
            SettleOutcome::Failed => {
                if let Some(err) = failure {
                    self.show_error(&UiError::from_search_error(context, &err));
                }
            }
            SettleOutcome::Stale => {}
        }
    }

    fn show_error(&mut self, err: &UiError) {
        self.status = format!("{} error: {}", err_label(err.category()), err.message());
        self.status_banner = Some(StatusBanner {
            message: err.message().to_string(),
            retryable: !err.requires_reconfigure()
                && !matches!(err.context(), UiErrorContext::BackendStartup),
        });
    }

    fn results_summary(&self) -> String {
        let state = self.search.state();
        let query = state.query().map(|q| q.as_str()).unwrap_or_default();
        if state.images().is_empty() {
            format!("No images found for \"{query}\"")
        } else {
            format!("Showing results for \"{query}\"")
        }
    }

    fn slots_for(&mut self, purpose: ImagePurpose) -> &mut HashMap<ImageId, ImageSlot> {
        match purpose {
            ImagePurpose::Thumbnail => &mut self.thumbnails,
            ImagePurpose::Preview => &mut self.previews,
        }
    }

    /// Queues thumbnail downloads for every image from `from` onwards that has
    /// no slot yet.
    fn request_thumbnails(&mut self, from: usize) {
        let wanted: Vec<(ImageId, String)> = self
            .search
            .state()
            .images()
            .iter()
            .skip(from)
            .filter(|image| !self.thumbnails.contains_key(&image.id))
            .map(|image| (image.id.clone(), image.thumbnail_url.clone()))
            .collect();

        for (image_id, url) in wanted {
            self.request_image(image_id, url, ImagePurpose::Thumbnail);
        }
    }

    fn request_image(&mut self, image_id: ImageId, url: String, purpose: ImagePurpose) {
        let queued = dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::FetchImage {
                image_id: image_id.clone(),
                url,
                purpose,
            },
            &mut self.status,
        );
        let slot = if queued {
            ImageSlot::Pending
        } else {
            ImageSlot::Failed(self.status.clone())
        };
        self.slots_for(purpose).insert(image_id, slot);
    }

    fn submit_search(&mut self) {
        match self.search.submit_query(&self.query_input) {
            Some(ticket) => {
                self.status_banner = None;
                self.dispatch_search(ticket, UiErrorContext::Search);
            }
            None => {
                self.thumbnails.clear();
                self.previews.clear();
                self.selected = None;
                self.status_banner = None;
                self.status = "Type a search term and press Enter".to_string();
            }
        }
    }

    fn load_more(&mut self) {
        if let Some(ticket) = self.search.load_more() {
            self.dispatch_search(ticket, UiErrorContext::LoadMore);
        }
    }

    fn retry(&mut self) {
        self.status_banner = None;
        if let Some(ticket) = self.search.retry() {
            let context = if ticket.page.is_first() {
                UiErrorContext::Search
            } else {
                UiErrorContext::LoadMore
            };
            self.dispatch_search(ticket, context);
        }
    }

    fn dispatch_search(&mut self, ticket: FetchTicket, context: UiErrorContext) {
        let label = if ticket.page.is_first() {
            format!("Searching for \"{}\"...", ticket.query)
        } else {
            format!("Loading page {} of \"{}\"...", ticket.page, ticket.query)
        };
        if dispatch_backend_command(&self.cmd_tx, BackendCommand::Search(ticket), &mut self.status)
        {
            self.status = label;
        } else {
            self.search.cancel_in_flight();
            self.show_error(&UiError::from_message(context, self.status.clone()));
        }
    }

    fn open_preview(&mut self, index: usize) {
        let Some(image) = self.search.state().images().get(index).cloned() else {
            return;
        };
        if !self.previews.contains_key(&image.id) {
            self.request_image(
                image.id.clone(),
                image.full_url.clone(),
                ImagePurpose::Preview,
            );
        }
        self.selected = Some(image);
    }

    fn close_preview(&mut self) {
        self.selected = None;
    }

    fn copy_link(&mut self, url: &str) {
        match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(url.to_string())) {
            Ok(()) => self.status = "Image link copied to clipboard".to_string(),
            Err(err) => self.status = format!("Clipboard unavailable: {err}"),
        }
    }

    fn show_search_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("search_bar").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                let edit = ui.add(
                    egui::TextEdit::singleline(&mut self.query_input)
                        .hint_text("Search photos")
                        .desired_width(360.0),
                );
                let enter_pressed =
                    edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if enter_pressed || ui.button("Search").clicked() {
                    self.submit_search();
                }
                if self.search.state().loading() {
                    ui.add(egui::Spinner::new());
                }
            });
            ui.add_space(6.0);
        });
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(&self.status).small());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if let Some(counter) = result_counter(
                        self.search.state().images().len(),
                        self.search.state().total(),
                    ) {
                        ui.label(egui::RichText::new(counter).small());
                    }
                });
            });
        });
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = self.status_banner.clone() else {
            return;
        };

        egui::Frame::NONE
            .fill(egui::Color32::from_rgb(111, 53, 53))
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(&banner.message).color(egui::Color32::WHITE));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Dismiss").clicked() {
                            self.status_banner = None;
                        }
                        if banner.retryable && ui.button("Retry").clicked() {
                            self.retry();
                        }
                    });
                });
            });
        ui.add_space(8.0);
    }

    fn show_gallery(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_status_banner(ui);

            let scroll_to = self.search.take_scroll_cue().map(|cue| cue.first_new_index);
            let empty_notice = self.results_summary();
            let mut clicked = None;
            let mut load_more = false;

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    let state = self.search.state();
                    if state.query().is_none() {
                        ui.label(
                            egui::RichText::new("Search Unsplash to fill the gallery.").weak(),
                        );
                    } else if state.images().is_empty()
                        && !state.loading()
                        && state.error().is_none()
                    {
                        ui.label(egui::RichText::new(empty_notice).weak());
                    }

                    clicked = show_image_grid(ui, state.images(), &mut self.thumbnails, scroll_to);

                    ui.add_space(12.0);
                    ui.vertical_centered(|ui| {
                        if state.loading() {
                            ui.add(egui::Spinner::new().size(24.0));
                        } else if self.search.show_load_more() && ui.button("Load more").clicked()
                        {
                            load_more = true;
                        }
                    });
                    ui.add_space(12.0);
                });

            if let Some(index) = clicked {
                self.open_preview(index);
            }
            if load_more {
                self.load_more();
            }
        });
    }

    fn show_preview_window(&mut self, ctx: &egui::Context) {
        let Some(image) = self.selected.clone() else {
            return;
        };

        let mut keep_open = true;
        let mut copy_requested = false;
        egui::Window::new(image.caption().unwrap_or("Preview").to_string())
            .id(egui::Id::new("image_preview"))
            .open(&mut keep_open)
            .resizable(true)
            .default_size([900.0, 700.0])
            .show(ctx, |ui| {
                let texture_name = format!("preview:{}", image.id);
                match self
                    .previews
                    .get_mut(&image.id)
                    .map(|slot| (slot.is_pending(), slot.texture(ctx, texture_name)))
                {
                    Some((_, Some(texture))) => {
                        let max_size = ui.available_size() - egui::vec2(0.0, 90.0);
                        let mut size = texture.size_vec2();
                        let scale = (max_size.x / size.x).min(max_size.y / size.y).min(1.0);
                        size *= scale.max(0.1);
                        ui.add(egui::Image::new(texture).fit_to_exact_size(size));
                    }
                    Some((true, None)) => {
                        ui.add(egui::Spinner::new().size(32.0));
                    }
                    _ => {
                        ui.label("Preview not available.");
                    }
                }

                ui.separator();
                if let Some(caption) = image.caption() {
                    ui.label(caption);
                }
                ui.horizontal_wrapped(|ui| {
                    if let Some(author) = &image.author {
                        ui.label(egui::RichText::new(format!("by {author}")).strong());
                    }
                    if let Some(likes) = image.likes {
                        ui.label(format!("{likes} likes"));
                    }
                    if let (Some(width), Some(height)) = (image.width, image.height) {
                        ui.label(format!("{width}×{height}"));
                    }
                    if let Some(created_at) = image.created_at {
                        ui.label(published_label(created_at, &Local));
                    }
                });
                if ui.button("Copy link").clicked() {
                    copy_requested = true;
                }
            });

        if copy_requested {
            self.copy_link(&image.full_url);
        }
        if !keep_open || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.close_preview();
        }
    }
}

fn published_label<Tz: TimeZone>(created_at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("Published {}", created_at.with_timezone(tz).format("%b %-d, %Y"))
}

/// "N of TOTAL results", or just "N results" when the service gave no total.
fn result_counter(shown: usize, total: Option<u64>) -> Option<String> {
    if shown == 0 {
        return None;
    }
    Some(match total {
        Some(total) => format!("{shown} of {total} results"),
        None => format!("{shown} results"),
    })
}

impl eframe::App for GalleryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        self.show_search_bar(ctx);
        self.show_status_bar(ctx);
        self.show_gallery(ctx);
        self.show_preview_window(ctx);

        let waiting_on_images = self
            .thumbnails
            .values()
            .chain(self.previews.values())
            .any(ImageSlot::is_pending);
        if self.search.state().loading() || waiting_on_images {
            ctx.request_repaint_after(std::time::Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
