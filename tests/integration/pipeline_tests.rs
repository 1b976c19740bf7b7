//! Integration tests for the row enrichment pipeline
//!
//! These tests drive whole runs: CSV rows in, worker pool, single writer,
//! CSV rows out. Websites are served by wiremock.

use lead_harvest::config::{parse_config, CrawlerConfig, UserAgentConfig};
use lead_harvest::crawler::{build_http_client, CrawlSettings, SiteCrawler};
use lead_harvest::output::{CsvSink, OutputError, OutputResult, ResultSink};
use lead_harvest::pipeline::{
    read_rows, run_pipeline, EnrichedRow, RowEnricher, WORKER_PANIC_ERROR,
};
use lead_harvest::select::{ContactContext, ContactSelector, SelectError};
use lead_harvest::HarvestError;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONFIG: &str = r#"
[crawler]
max-pages = 3
concurrency = 5
politeness-delay-ms = 0

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[input]
website-column = "website"
name-column = "name"

[enrichment]
select-best-email = true
"#;

/// Collects every written row for inspection
#[derive(Clone, Default)]
struct CollectingSink {
    rows: Arc<Mutex<Vec<EnrichedRow>>>,
    finished: Arc<Mutex<bool>>,
}

impl ResultSink for CollectingSink {
    fn write(&mut self, row: &EnrichedRow) -> OutputResult<()> {
        self.rows.lock().unwrap().push(row.clone());
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        *self.finished.lock().unwrap() = true;
        Ok(())
    }
}

/// Fails on the nth write
struct FailingSink {
    fail_at: usize,
    written: usize,
}

impl ResultSink for FailingSink {
    fn write(&mut self, _row: &EnrichedRow) -> OutputResult<()> {
        self.written += 1;
        if self.written >= self.fail_at {
            return Err(OutputError::Write("disk full".to_string()));
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        Ok(())
    }
}

/// Picks the first candidate, but blows up on one address
struct ExplodingSelector;

#[async_trait::async_trait]
impl ContactSelector for ExplodingSelector {
    async fn select_best_contact(
        &self,
        candidates: &[String],
        _context: &ContactContext,
    ) -> Result<Option<String>, SelectError> {
        if candidates.iter().any(|c| c == "boom@hotel.example") {
            panic!("selector exploded");
        }
        Ok(candidates.first().cloned())
    }
}

fn create_enricher() -> Arc<RowEnricher> {
    Arc::new(build_enricher())
}

fn build_enricher() -> RowEnricher {
    let config = parse_config(CONFIG).expect("valid config");
    let user_agent: UserAgentConfig = config.user_agent.clone();
    let client = build_http_client(&user_agent, &CrawlerConfig::default())
        .expect("Failed to build client");
    let crawler = SiteCrawler::new(
        client,
        CrawlSettings {
            max_pages: config.crawler.max_pages,
            max_page_bytes: 1024 * 1024,
            politeness_delay: Duration::ZERO,
            team_page_count: 5,
        },
    );
    RowEnricher::new(crawler, config.input.clone(), config.enrichment.clone())
}

async fn start_site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(
                    "<p>Management: direktion@hotel.example</p><p>privacy@hotel.example</p>",
                ),
        )
        .mount(&server)
        .await;
    server
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_row_is_written_once_despite_failures() {
    let server = start_site().await;

    let mut csv = String::from("name,website\n");
    for i in 0..50 {
        if i % 5 == 0 {
            csv.push_str(&format!("Closed {},http://127.0.0.1:9/\n", i));
        } else {
            csv.push_str(&format!("Hotel {},{}\n", i, server.uri()));
        }
    }
    let table = read_rows(csv.as_bytes()).unwrap();
    assert_eq!(table.rows.len(), 50);

    let sink = CollectingSink::default();
    let summary = run_pipeline(table.rows, create_enricher(), 5, sink.clone())
        .await
        .unwrap();

    let rows = sink.rows.lock().unwrap();
    assert_eq!(rows.len(), 50);
    assert!(*sink.finished.lock().unwrap());

    let indices: BTreeSet<usize> = rows.iter().map(|r| r.row.index).collect();
    assert_eq!(indices, (0..50).collect());

    for row in rows.iter() {
        if row.row.index % 5 == 0 {
            assert!(row.result.error.is_some());
            assert!(row.result.emails.is_empty());
            assert_eq!(row.best_email, None);
        } else {
            assert!(row.result.error.is_none());
            assert!(row.result.emails.contains("direktion@hotel.example"));
            assert_eq!(row.best_email.as_deref(), Some("direktion@hotel.example"));
        }
    }

    assert_eq!(summary.rows_total, 50);
    assert_eq!(summary.rows_written, 50);
    assert_eq!(summary.rows_with_emails, 40);
    assert_eq!(summary.rows_failed, 10);
    assert_eq!(summary.concurrency, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_missing_website_still_produces_a_row() {
    let server = start_site().await;
    let csv = format!("name,website\nNo Site,\nHotel,{}\n", server.uri());
    let table = read_rows(csv.as_bytes()).unwrap();

    let sink = CollectingSink::default();
    let summary = run_pipeline(table.rows, create_enricher(), 2, sink.clone())
        .await
        .unwrap();

    assert_eq!(summary.rows_written, 2);
    let rows = sink.rows.lock().unwrap();
    let missing = rows.iter().find(|r| r.row.index == 0).unwrap();
    assert_eq!(missing.result.error.as_deref(), Some("missing website"));
    assert_eq!(missing.result.pages_visited, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sink_failure_aborts_the_run() {
    let mut csv = String::from("name,website\n");
    for i in 0..20 {
        csv.push_str(&format!("Closed {},http://127.0.0.1:9/\n", i));
    }
    let table = read_rows(csv.as_bytes()).unwrap();

    let sink = FailingSink {
        fail_at: 3,
        written: 0,
    };
    let outcome = tokio::time::timeout(
        Duration::from_secs(30),
        run_pipeline(table.rows, create_enricher(), 4, sink),
    )
    .await
    .expect("run did not stop after sink failure");

    assert!(matches!(outcome, Err(HarvestError::Output(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_csv_output_keeps_input_columns() {
    let server = start_site().await;
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("enriched.csv");

    let csv = format!(
        "name,website,rating\nAlpine Lodge,{},4.5\nLake Inn,{},4.1\n",
        server.uri(),
        server.uri()
    );
    let table = read_rows(csv.as_bytes()).unwrap();

    let config = parse_config(CONFIG).unwrap();
    let sink = CsvSink::create(
        &output_path,
        &table.headers,
        config.output.clone(),
        true,
        false,
    )
    .unwrap();
    run_pipeline(table.rows, create_enricher(), 2, sink)
        .await
        .unwrap();

    let mut reader = csv::Reader::from_path(&output_path).unwrap();
    let headers: Vec<String> = reader
        .headers()
        .unwrap()
        .iter()
        .map(|h| h.to_string())
        .collect();
    assert_eq!(
        headers,
        vec![
            "name",
            "website",
            "rating",
            "row_index",
            "Emails",
            "SelectedEmail",
            "PagesVisited",
            "CrawlError"
        ]
    );

    let mut records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    records.sort_by_key(|r| r[3].parse::<usize>().unwrap());
    assert_eq!(records.len(), 2);
    assert_eq!(&records[0][0], "Alpine Lodge");
    assert_eq!(&records[0][2], "4.5");
    assert_eq!(&records[0][3], "0");
    assert_eq!(
        &records[0][4],
        "direktion@hotel.example, privacy@hotel.example"
    );
    assert_eq!(&records[0][5], "direktion@hotel.example");
    assert_eq!(&records[0][6], "1");
    assert_eq!(&records[0][7], "");
    assert_eq!(&records[1][0], "Lake Inn");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_panicking_row_is_written_with_error() {
    let server = start_site().await;
    Mock::given(method("GET"))
        .and(path("/boom"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>boom@hotel.example</p>"))
        .mount(&server)
        .await;

    let mut csv = String::from("name,website\n");
    for i in 0..6 {
        if i == 2 {
            csv.push_str(&format!("Hotel {},{}/boom\n", i, server.uri()));
        } else {
            csv.push_str(&format!("Hotel {},{}\n", i, server.uri()));
        }
    }
    let table = read_rows(csv.as_bytes()).unwrap();

    let enricher = Arc::new(build_enricher().with_selector(Arc::new(ExplodingSelector)));
    let sink = CollectingSink::default();
    let summary = run_pipeline(table.rows, enricher, 2, sink.clone())
        .await
        .unwrap();

    assert_eq!(summary.rows_written, 6);
    assert_eq!(summary.rows_failed, 1);

    let rows = sink.rows.lock().unwrap();
    assert_eq!(rows.len(), 6);
    for row in rows.iter() {
        if row.row.index == 2 {
            assert_eq!(row.result.error.as_deref(), Some(WORKER_PANIC_ERROR));
            assert_eq!(row.row.get("name"), Some("Hotel 2"));
            assert_eq!(row.best_email, None);
        } else {
            assert!(row.result.error.is_none());
            assert!(row.best_email.is_some());
        }
    }
}

#[tokio::test]
async fn test_empty_input_writes_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("enriched.csv");
    let table = read_rows("name,website\n".as_bytes()).unwrap();
    assert!(table.rows.is_empty());

    let config = parse_config(CONFIG).unwrap();
    let sink = CsvSink::create(
        &output_path,
        &table.headers,
        config.output.clone(),
        false,
        false,
    )
    .unwrap();
    let summary = run_pipeline(table.rows, create_enricher(), 2, sink)
        .await
        .unwrap();

    assert_eq!(summary.rows_written, 0);
    let output = std::fs::read_to_string(&output_path).unwrap();
    assert_eq!(output, "name,website,row_index,Emails,PagesVisited,CrawlError\n");
}
