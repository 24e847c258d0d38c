//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::ImageSearchApi;
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::media::{decode_image, ImagePurpose};

/// Spawns the backend worker thread. It owns a tokio runtime and runs every
/// command as its own task, reporting back through `ui_tx`.
pub fn launch(
    api: Arc<dyn ImageSearchApi>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        let _ = ui_tx.try_send(UiEvent::Info("Ready".to_string()));

        while let Ok(cmd) = cmd_rx.recv() {
            let api = api.clone();
            let ui_tx = ui_tx.clone();
            match cmd {
                BackendCommand::Search(ticket) => {
                    runtime.spawn(async move {
                        let outcome = api.search_photos(&ticket.query, ticket.page).await;
                        if let Err(err) = &outcome {
                            tracing::warn!(
                                seq = ticket.seq,
                                page = ticket.page.get(),
                                "search request failed: {err}"
                            );
                        }
                        post_event(
                            &ui_tx,
                            UiEvent::SearchSettled {
                                seq: ticket.seq,
                                outcome,
                            },
                        );
                    });
                }
                BackendCommand::FetchImage {
                    image_id,
                    url,
                    purpose,
                } => {
                    runtime.spawn(async move {
                        let event = match load_image(api.as_ref(), &url, purpose).await {
                            Ok(image) => UiEvent::ImageLoaded {
                                image_id,
                                purpose,
                                image,
                            },
                            Err(reason) => {
                                tracing::debug!(
                                    image_id = %image_id,
                                    purpose = purpose.label(),
                                    "image load failed: {reason}"
                                );
                                UiEvent::ImageFailed {
                                    image_id,
                                    purpose,
                                    reason,
                                }
                            }
                        };
                        post_event(&ui_tx, event);
                    });
                }
            }
        }

        tracing::debug!("ui command queue closed; backend worker stopping");
    });
}

async fn load_image(
    api: &dyn ImageSearchApi,
    url: &str,
    purpose: ImagePurpose,
) -> Result<crate::media::PreviewImage, String> {
    let bytes = api
        .fetch_image_bytes(url)
        .await
        .map_err(|err| err.to_string())?;
    let max_dimension = purpose.max_dimension();
    tokio::task::spawn_blocking(move || decode_image(&bytes, max_dimension))
        .await
        .map_err(|err| format!("image decode task failed: {err}"))?
}

fn post_event(ui_tx: &Sender<UiEvent>, event: UiEvent) {
    if ui_tx.try_send(event).is_err() {
        tracing::warn!("ui event queue unavailable; dropping backend event");
    }
}
