//! CSV and HTML report files for a batch of fetched pages
//!
//! Both files hold one row per URL with the fetch status and, when the page
//! was audited, its SEO metrics. They are named after the host of the first
//! URL: `seo_report_<host>.csv` and `seo_report_<host>.html`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use url::Url;

use super::report::{PageOutcome, PageResult};
use super::seo::MAX_SCORE;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot create report directory {dir}: {source}")]
    CreateDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Paths of the written report files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFiles {
    pub csv: PathBuf,
    pub html: PathBuf,
}

/// One flattened report row. Audit columns stay empty for pages that were
/// not audited or failed to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub url: String,
    pub status: String,
    pub error: Option<String>,
    pub score: Option<u32>,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub word_count: Option<usize>,
    pub h1_count: Option<usize>,
    pub h2_count: Option<usize>,
    pub h3_count: Option<usize>,
    pub images_missing_alt: Option<usize>,
    pub has_canonical: Option<bool>,
    pub has_structured_data: Option<bool>,
    pub keywords: Option<String>,
    pub recommendations: Option<String>,
}

impl ReportRow {
    pub const HEADERS: [&'static str; 15] = [
        "url",
        "status",
        "error",
        "score",
        "title",
        "meta_description",
        "word_count",
        "h1_count",
        "h2_count",
        "h3_count",
        "images_missing_alt",
        "has_canonical",
        "has_structured_data",
        "keywords",
        "recommendations",
    ];

    pub fn from_result(result: &PageResult) -> Self {
        let (status, error) = match &result.report.outcome {
            PageOutcome::Success { .. } => ("success", None),
            PageOutcome::Error { error } => ("error", Some(error.clone())),
        };
        let audit = result.audit.as_ref();

        Self {
            url: result.report.url.clone(),
            status: status.to_string(),
            error,
            score: audit.map(|a| a.score),
            title: audit.map(|a| a.title.clone()),
            meta_description: audit.map(|a| a.meta_description.clone()),
            word_count: audit.map(|a| a.word_count),
            h1_count: audit.map(|a| a.h1_count),
            h2_count: audit.map(|a| a.h2_count),
            h3_count: audit.map(|a| a.h3_count),
            images_missing_alt: audit.map(|a| a.images_missing_alt),
            has_canonical: audit.map(|a| a.has_canonical),
            has_structured_data: audit.map(|a| a.has_structured_data),
            keywords: audit.map(|a| {
                a.keywords
                    .iter()
                    .map(|k| format!("{}({})", k.keyword, k.count))
                    .collect::<Vec<_>>()
                    .join("; ")
            }),
            recommendations: audit.map(|a| a.recommendations.join(" | ")),
        }
    }

    /// Cell values in [`HEADERS`](Self::HEADERS) order.
    fn cells(&self) -> [String; 15] {
        fn opt<T: ToString>(value: &Option<T>) -> String {
            value.as_ref().map(ToString::to_string).unwrap_or_default()
        }
        [
            self.url.clone(),
            self.status.clone(),
            opt(&self.error),
            self.score.map(|s| format!("{s}/{MAX_SCORE}")).unwrap_or_default(),
            opt(&self.title),
            opt(&self.meta_description),
            opt(&self.word_count),
            opt(&self.h1_count),
            opt(&self.h2_count),
            opt(&self.h3_count),
            opt(&self.images_missing_alt),
            opt(&self.has_canonical),
            opt(&self.has_structured_data),
            opt(&self.keywords),
            opt(&self.recommendations),
        ]
    }
}

/// `seo_report_<host of the first URL>`, or `seo_report` without one.
pub fn report_stem(results: &[PageResult]) -> String {
    results
        .iter()
        .find_map(|r| {
            Url::parse(&r.report.url)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
        })
        .map(|host| format!("seo_report_{}", host.replace(':', "_")))
        .unwrap_or_else(|| "seo_report".to_string())
}

/// Write the CSV and HTML reports for `results` into `dir`, creating it if needed.
pub fn write_reports(dir: &Path, results: &[PageResult]) -> Result<ReportFiles, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
        dir: dir.to_path_buf(),
        source,
    })?;

    let rows: Vec<ReportRow> = results.iter().map(ReportRow::from_result).collect();
    let stem = report_stem(results);
    let files = ReportFiles {
        csv: dir.join(format!("{stem}.csv")),
        html: dir.join(format!("{stem}.html")),
    };

    write_csv(&files.csv, &rows)?;
    fs::write(&files.html, render_html(&rows)).map_err(|source| ExportError::Io {
        path: files.html.clone(),
        source,
    })?;

    tracing::info!(
        "Wrote reports {} and {}",
        files.csv.display(),
        files.html.display()
    );
    Ok(files)
}

fn write_csv(path: &Path, rows: &[ReportRow]) -> Result<(), ExportError> {
    let csv_error = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    if rows.is_empty() {
        writer.write_record(ReportRow::HEADERS).map_err(csv_error)?;
    }
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn render_html(rows: &[ReportRow]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>SEO report</title>\n\
         <style>table{border-collapse:collapse}th,td{border:1px solid #ccc;padding:4px;text-align:left}</style>\n\
         </head>\n<body>\n<table>\n<thead>\n<tr>",
    );
    for header in ReportRow::HEADERS {
        html.push_str(&format!("<th>{header}</th>"));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in rows {
        html.push_str(&format!("<tr class=\"{}\">", row.status));
        for cell in row.cells() {
            html.push_str("<td>");
            html.push_str(&html_escape::encode_text(&cell));
            html.push_str("</td>");
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::KeywordsConfig;
    use crate::page::{PageReport, SeoAudit};
    use tempfile::TempDir;

    fn results() -> Vec<PageResult> {
        let html = "<html><head><title>Fish &lt;&amp;&gt; Chips</title></head><body><h1>Menu</h1></body></html>";
        vec![
            PageResult {
                report: PageReport::success("https://shop.test/menu", html),
                audit: Some(SeoAudit::from_html(
                    "https://shop.test/menu",
                    html,
                    &KeywordsConfig::default(),
                )),
            },
            PageResult {
                report: PageReport::error("https://shop.test/gone", "HTTP 404 from https://shop.test/gone"),
                audit: None,
            },
        ]
    }

    #[test]
    fn rows_flatten_audit_metrics() {
        let rows: Vec<ReportRow> = results().iter().map(ReportRow::from_result).collect();
        assert_eq!(rows[0].status, "success");
        assert_eq!(rows[0].score, Some(10));
        assert_eq!(rows[0].title.as_deref(), Some("Fish <&> Chips"));
        assert_eq!(rows[1].status, "error");
        assert!(rows[1].error.as_deref().unwrap().contains("404"));
        assert_eq!(rows[1].score, None);
    }

    #[test]
    fn report_files_are_named_after_host() {
        assert_eq!(report_stem(&results()), "seo_report_shop.test");
        assert_eq!(report_stem(&[]), "seo_report");
    }

    #[test]
    fn writes_csv_and_html() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("reports");
        let files = write_reports(&dir, &results()).unwrap();

        let mut reader = csv::Reader::from_path(&files.csv).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
        assert_eq!(headers, ReportRow::HEADERS);
        let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][0], "https://shop.test/menu");
        assert_eq!(&records[0][3], "10");
        assert_eq!(&records[0][4], "Fish <&> Chips");
        assert_eq!(&records[1][1], "error");
        assert_eq!(&records[1][3], "");

        let html = fs::read_to_string(&files.html).unwrap();
        assert!(html.contains("<th>images_missing_alt</th>"));
        assert!(html.contains("Fish &lt;&amp;&gt; Chips"));
        assert!(html.contains("10/45"));
        assert_eq!(html.matches("<tr class=").count(), 2);
    }

    #[test]
    fn empty_batch_still_writes_headers() {
        let tmp = TempDir::new().unwrap();
        let files = write_reports(tmp.path(), &[]).unwrap();
        let csv_text = fs::read_to_string(files.csv).unwrap();
        assert!(csv_text.starts_with("url,status,error,score"));
    }
}
