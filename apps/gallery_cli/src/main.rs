use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use client_core::{
    load_settings, ImageSearchApi, ImageSearchClient, SearchController, SettleOutcome,
};
use serde::Serialize;
use shared::{domain::Image, error::SearchError};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Search Unsplash photos from the terminal")]
struct Args {
    /// Search term.
    query: String,
    /// Number of result pages to fetch.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pages: u32,
    /// Results per page (the service caps this at 30).
    #[arg(long)]
    per_page: Option<u32>,
    /// Print the collected results as JSON.
    #[arg(long)]
    json: bool,
    /// Settings file; defaults to ./gallery.toml or the platform config dir.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct Report {
    query: String,
    pages_loaded: u32,
    total: Option<u64>,
    total_pages: Option<u32>,
    has_more: bool,
    images: Vec<Image>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<SearchError>,
}

/// Drives a controller through up to `pages` fetches. `pages_loaded` in the
/// report counts only pages that returned images.
///
/// A failure on the first page is returned as an error. A failure on a later
/// page stops paging and is kept in the report next to the pages already
/// loaded.
async fn collect_pages(api: &dyn ImageSearchApi, query: &str, pages: u32) -> Result<Report> {
    let mut controller = SearchController::new();
    let mut next = controller.submit_query(query);
    if next.is_none() {
        return Err(anyhow!("search term must not be blank"));
    }

    let mut pages_requested = 0;
    let mut pages_loaded = 0;
    while let Some(ticket) = next.take() {
        tracing::debug!(seq = ticket.seq, page = ticket.page.get(), "fetching page");
        let outcome = api.search_photos(&ticket.query, ticket.page).await;
        pages_requested += 1;

        match controller.on_fetch_settled(ticket.seq, outcome) {
            SettleOutcome::Replaced { count } | SettleOutcome::Appended { count } => {
                if count > 0 {
                    pages_loaded += 1;
                }
            }
            SettleOutcome::Failed | SettleOutcome::Stale => {}
        }

        if let Some(err) = controller.state().error() {
            if ticket.page.is_first() {
                return Err(anyhow::Error::new(err.clone()).context(err.user_message()));
            }
            tracing::warn!(page = ticket.page.get(), "stopping after failed page: {err}");
            break;
        }

        if pages_requested < pages {
            next = controller.load_more();
        }
    }

    let state = controller.state();
    Ok(Report {
        query: state
            .query()
            .map(|q| q.as_str().to_string())
            .unwrap_or_default(),
        pages_loaded,
        total: state.total(),
        total_pages: state.total_pages(),
        has_more: state.has_more(),
        images: state.images().to_vec(),
        error: state.error().cloned(),
    })
}

fn print_text(report: &Report) {
    match report.total {
        Some(total) => println!(
            "{} of {} results for \"{}\"",
            report.images.len(),
            total,
            report.query
        ),
        None => println!("{} results for \"{}\"", report.images.len(), report.query),
    }

    for (index, image) in report.images.iter().enumerate() {
        let caption = image.caption().unwrap_or("(untitled)");
        match &image.author {
            Some(author) => println!("{:>4}. {caption} by {author}", index + 1),
            None => println!("{:>4}. {caption}", index + 1),
        }
        println!("      {}", image.full_url);
    }

    if let Some(err) = &report.error {
        eprintln!("warning: {} ({})", err.user_message(), err.message);
        if err.is_retryable() {
            eprintln!("warning: run again to fetch the remaining pages");
        }
    } else if report.images.is_empty() {
        println!("No images found.");
    } else if report.has_more {
        println!("More results available; pass --pages to fetch further.");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    if args.per_page.is_some() {
        settings.per_page = args.per_page;
    }
    let config = settings
        .client_config()
        .context("invalid image search configuration")?;
    let client = ImageSearchClient::new(config).context("failed to build HTTP client")?;

    let report = collect_pages(&client, &args.query, args.pages).await?;
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to encode results")?
        );
    } else {
        print_text(&report);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use shared::{
        domain::{ImageId, Page, SearchQuery, SearchResult},
        error::ErrorCode,
    };

    struct ScriptedApi {
        pages: Vec<Result<Vec<&'static str>, SearchError>>,
        requested: Mutex<Vec<u32>>,
    }

    impl ScriptedApi {
        fn new(pages: Vec<Result<Vec<&'static str>, SearchError>>) -> Self {
            Self {
                pages,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().expect("requested lock").clone()
        }
    }

    #[async_trait]
    impl ImageSearchApi for ScriptedApi {
        async fn search_photos(
            &self,
            _query: &SearchQuery,
            page: Page,
        ) -> Result<SearchResult, SearchError> {
            self.requested.lock().expect("requested lock").push(page.get());
            let scripted = self
                .pages
                .get(page.get() as usize - 1)
                .cloned()
                .unwrap_or_else(|| Ok(Vec::new()));
            scripted.map(|ids| SearchResult {
                images: ids
                    .into_iter()
                    .map(|id| Image {
                        id: ImageId(id.to_string()),
                        thumbnail_url: format!("https://images.example/{id}/small.jpg"),
                        full_url: format!("https://images.example/{id}/regular.jpg"),
                        description: None,
                        alt_description: None,
                        author: None,
                        width: None,
                        height: None,
                        likes: None,
                        created_at: None,
                    })
                    .collect(),
                total: Some(5),
                total_pages: Some(3),
            })
        }

        async fn fetch_image_bytes(&self, _url: &str) -> Result<Vec<u8>, SearchError> {
            Ok(Vec::new())
        }
    }

    fn ids(report: &Report) -> Vec<&str> {
        report.images.iter().map(|image| image.id.0.as_str()).collect()
    }

    #[tokio::test]
    async fn fetches_requested_number_of_pages_in_order() {
        let api = ScriptedApi::new(vec![Ok(vec!["a", "b"]), Ok(vec!["c", "d"]), Ok(vec!["e"])]);

        let report = collect_pages(&api, "cats", 2).await.expect("report");

        assert_eq!(api.requested(), vec![1, 2]);
        assert_eq!(ids(&report), vec!["a", "b", "c", "d"]);
        assert_eq!(report.pages_loaded, 2);
        assert!(report.has_more);
        assert_eq!(report.total, Some(5));
    }

    #[tokio::test]
    async fn stops_paging_once_a_page_comes_back_empty() {
        let api = ScriptedApi::new(vec![Ok(vec!["a"]), Ok(Vec::new())]);

        let report = collect_pages(&api, "cats", 5).await.expect("report");

        assert_eq!(api.requested(), vec![1, 2]);
        assert_eq!(ids(&report), vec!["a"]);
        assert_eq!(report.pages_loaded, 1);
        assert!(!report.has_more);
    }

    #[tokio::test]
    async fn first_page_failure_is_an_error() {
        let api = ScriptedApi::new(vec![Err(SearchError::from_status(401, "bad key"))]);

        let err = collect_pages(&api, "cats", 3).await.expect_err("failure");

        let source = err.downcast_ref::<SearchError>().expect("search error");
        assert_eq!(source.code, ErrorCode::Unauthorized);
        assert_eq!(api.requested(), vec![1]);
    }

    #[tokio::test]
    async fn later_page_failure_keeps_loaded_results() {
        let api = ScriptedApi::new(vec![
            Ok(vec!["a", "b"]),
            Err(SearchError::transport("connection reset")),
        ]);

        let report = collect_pages(&api, "cats", 3).await.expect("partial report");

        assert_eq!(ids(&report), vec!["a", "b"]);
        assert_eq!(report.pages_loaded, 1);
        assert_eq!(
            report.error.as_ref().map(|err| err.code),
            Some(ErrorCode::Transport)
        );
    }

    #[tokio::test]
    async fn blank_query_is_rejected_without_a_request() {
        let api = ScriptedApi::new(Vec::new());

        assert!(collect_pages(&api, "   ", 1).await.is_err());
        assert!(api.requested().is_empty());
    }

    #[test]
    fn report_json_omits_error_when_absent() {
        let report = Report {
            query: "cats".to_string(),
            pages_loaded: 1,
            total: Some(0),
            total_pages: Some(0),
            has_more: false,
            images: Vec::new(),
            error: None,
        };
        let json = serde_json::to_value(&report).expect("encode");
        assert_eq!(json["query"], "cats");
        assert!(json.get("error").is_none());
    }
}
