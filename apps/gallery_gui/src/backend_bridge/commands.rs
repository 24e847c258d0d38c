//! Backend commands queued from UI to backend worker.

use client_core::FetchTicket;
use shared::domain::ImageId;

use crate::media::ImagePurpose;

pub enum BackendCommand {
    Search(FetchTicket),
    FetchImage {
        image_id: ImageId,
        url: String,
        purpose: ImagePurpose,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Search(_) => "search",
            BackendCommand::FetchImage { purpose, .. } => match purpose {
                ImagePurpose::Thumbnail => "fetch_thumbnail",
                ImagePurpose::Preview => "fetch_preview",
            },
        }
    }
}
