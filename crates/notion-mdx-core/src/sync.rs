//! Full export: database rows to MDX files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::document::Assembler;
use crate::media::Materializer;
use crate::notion::{validate_records, NotionClient, ProblemRecord};

/// What a sync produced
#[derive(Debug, Default)]
pub struct SyncReport {
    pub written: Vec<PathBuf>,
    pub removed: usize,
}

/// Clear old documents, then render and write one document per record.
///
/// Records are processed in order; a failed media download aborts the run
/// before the affected document is written.
pub async fn run(config: &Config, root: &Path) -> Result<SyncReport> {
    config.validate()?;

    let dirs = config.content_dirs(root);
    info!("Clearing existing content in {}", dirs.content_dir.display());
    let removed = dirs.clear_documents().await?;
    dirs.ensure().await?;

    let client = NotionClient::new(&config.notion);
    let materializer = Materializer::http(&dirs.media_dir);

    info!("Fetching records from Notion");
    let records = fetch_records(&client, &config.notion.database_id).await?;
    info!("Found {} records", records.len());

    let assembler = Assembler::new(&materializer).with_loader(&client);
    let mut written = Vec::with_capacity(records.len());

    for record in &records {
        let blocks = client
            .list_children(&record.page_id)
            .await
            .with_context(|| format!("Failed to fetch blocks of {}", record.slug))?;

        // Covers are not part of the front matter, so none is downloaded
        let document = assembler
            .assemble(&record.page_id, &blocks, None)
            .await
            .with_context(|| format!("Failed to render {}", record.slug))?;

        let path = dirs.write_document(record, &document.text).await?;
        info!("Wrote {} → {}", record.slug, path.display());
        written.push(path);
    }

    info!("Done. Generated {} file(s).", written.len());
    Ok(SyncReport { written, removed })
}

async fn fetch_records(client: &NotionClient, database_id: &str) -> Result<Vec<ProblemRecord>> {
    let data_source_id = client.resolve_data_source_id(database_id).await?;
    let pages = client
        .query_pages(&data_source_id)
        .await
        .with_context(|| format!("Failed to query data source {}", data_source_id))?;

    let records = pages
        .iter()
        .map(ProblemRecord::from_page)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(validate_records(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Serve canned bodies by path. `routes` gets the server's base URL so
    /// bodies can link back to it.
    fn spawn_api(routes: impl FnOnce(&str) -> Vec<(&'static str, String)>) -> String {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let base = format!("http://{}", server.server_addr().to_ip().unwrap());
        let routes = routes(&base);

        std::thread::spawn(move || {
            for request in server.incoming_requests() {
                let path = request.url().split('?').next().unwrap_or_default().to_string();
                let response = match routes.iter().find(|(route, _)| *route == path) {
                    Some((_, body)) => tiny_http::Response::from_string(body.clone()),
                    None => tiny_http::Response::from_string("{}").with_status_code(404),
                };
                let _ = request.respond(response);
            }
        });

        base
    }

    fn config(base_url: String) -> Config {
        let mut config = Config::default();
        config.notion.token = "t".to_string();
        config.notion.database_id = "db".to_string();
        config.notion.base_url = base_url;
        config
    }

    #[tokio::test]
    async fn test_sync_writes_documents() {
        let base = spawn_api(|_| {
            vec![
                (
                    "/v1/databases/db",
                    r#"{"data_sources": [{"id": "ds"}]}"#.to_string(),
                ),
                (
                    "/v1/data_sources/ds/query",
                    r#"{"results": [
                        {"object": "page", "id": "p1", "properties": {
                            "ID": {"number": 1},
                            "Title": {"title": [{"plain_text": "Two Sum"}]},
                            "Slug": {"rich_text": [{"plain_text": "two-sum"}]}
                        }},
                        {"object": "page", "id": "p9", "properties": {
                            "ID": {"number": 9},
                            "Slug": {"rich_text": [{"plain_text": "nine"}]}
                        }}
                    ], "has_more": false}"#
                        .to_string(),
                ),
                (
                    "/v1/blocks/p1/children",
                    r#"{"results": [{"id": "b1", "type": "paragraph",
                        "paragraph": {"rich_text": [{"plain_text": "Hello"}]}}]}"#
                        .to_string(),
                ),
                ("/v1/blocks/p9/children", r#"{"results": []}"#.to_string()),
            ]
        });

        let root = tempfile::tempdir().unwrap();
        let config = config(base);
        let dirs = config.content_dirs(root.path());
        std::fs::create_dir_all(&dirs.content_dir).unwrap();
        std::fs::write(dirs.content_dir.join("stale.mdx"), "old").unwrap();

        let report = run(&config, root.path()).await.unwrap();
        assert_eq!(report.removed, 1);
        assert_eq!(
            report.written,
            vec![
                dirs.content_dir.join("nine.mdx"),
                dirs.content_dir.join("two-sum.mdx")
            ]
        );

        let two_sum = std::fs::read_to_string(dirs.content_dir.join("two-sum.mdx")).unwrap();
        assert!(two_sum.starts_with("---\nid: 1\ntitle: Two Sum\n"));
        assert!(two_sum.ends_with("---\nHello\n"));
        assert!(!dirs.content_dir.join("stale.mdx").exists());
        assert!(dirs.media_dir.is_dir());
    }

    #[tokio::test]
    async fn test_sync_skips_page_cover() {
        let base = spawn_api(|base| {
            vec![
                ("/v1/databases/db", r#"{"data_sources": [{"id": "ds"}]}"#.to_string()),
                (
                    "/v1/data_sources/ds/query",
                    format!(
                        r#"{{"results": [{{"object": "page", "id": "p1",
                            "cover": {{"type": "external", "external": {{"url": "{}/cover.jpg"}}}},
                            "properties": {{
                                "ID": {{"number": 1}},
                                "Slug": {{"rich_text": [{{"plain_text": "one"}}]}}
                            }}}}]}}"#,
                        base
                    ),
                ),
                (
                    "/v1/blocks/p1/children",
                    format!(
                        r#"{{"results": [{{"id": "i", "type": "image", "image": {{
                            "type": "external", "external": {{"url": "{}/shot.png"}}
                        }}}}]}}"#,
                        base
                    ),
                ),
                ("/shot.png", "PNG".to_string()),
                ("/cover.jpg", "JPG".to_string()),
            ]
        });

        let root = tempfile::tempdir().unwrap();
        let config = config(base);
        run(&config, root.path()).await.unwrap();

        let dirs = config.content_dirs(root.path());
        let doc = std::fs::read_to_string(dirs.content_dir.join("one.mdx")).unwrap();
        assert!(doc.ends_with("---\n![](/notion/p1/img-1.png)\n"));

        let media: Vec<_> = std::fs::read_dir(dirs.media_dir.join("p1"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(media, vec!["img-1.png"]);
    }

    #[tokio::test]
    async fn test_sync_requires_credentials() {
        let root = tempfile::tempdir().unwrap();
        let err = run(&Config::default(), root.path()).await.unwrap_err();
        assert!(err.to_string().contains("NOTION_TOKEN"));
    }
}
