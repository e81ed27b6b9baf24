//! Finds a filer's latest N-PORT document on EDGAR.

use crate::providers::fetcher::SecFetcher;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

/// Form types carrying a fund's portfolio holdings.
const NPORT_FORMS: [&str; 2] = ["NPORT-P", "NPORT-P/A"];

#[derive(Debug, Default, Deserialize)]
struct SubmissionsResponse {
    #[serde(default)]
    filings: Filings,
}

#[derive(Debug, Default, Deserialize)]
struct Filings {
    #[serde(default)]
    recent: RecentFilings,
}

/// Parallel arrays, newest filing first.
#[derive(Debug, Default, Deserialize)]
struct RecentFilings {
    #[serde(default)]
    form: Vec<String>,
    #[serde(default, rename = "accessionNumber")]
    accession_numbers: Vec<String>,
    #[serde(default, rename = "primaryDocument")]
    primary_documents: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DirectoryIndex {
    #[serde(default)]
    directory: Directory,
}

#[derive(Debug, Default, Deserialize)]
struct Directory {
    #[serde(default)]
    item: Vec<DirectoryItem>,
}

#[derive(Debug, Deserialize)]
struct DirectoryItem {
    #[serde(default)]
    name: String,
}

/// Strips leading zeros and left-pads to the 10 digits EDGAR uses in URLs.
pub fn normalize_cik(cik: &str) -> String {
    format!("{:0>10}", cik.trim().trim_start_matches('0'))
}

pub struct FilingLocator {
    data_url: String,
    archives_url: String,
}

impl FilingLocator {
    pub fn new(data_url: &str, archives_url: &str) -> Self {
        Self {
            data_url: data_url.trim_end_matches('/').to_string(),
            archives_url: archives_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL of the most recent N-PORT XML document for `cik`, or `None` when
    /// there is none or EDGAR could not be read.
    #[instrument(name = "LocateNport", skip(self, fetcher))]
    pub async fn latest_nport_url(&self, fetcher: &SecFetcher, cik: &str) -> Option<String> {
        let cik = normalize_cik(cik);
        let submissions_url = format!("{}/submissions/CIK{}.json", self.data_url, cik);

        let submissions: SubmissionsResponse = match fetcher.fetch(&submissions_url).await {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(submissions) => submissions,
                Err(e) => {
                    warn!("Failed to parse submissions for CIK {}: {}", cik, e);
                    return None;
                }
            },
            Err(e) => {
                warn!("Error fetching filings for CIK {}: {}", cik, e);
                return None;
            }
        };

        let recent = submissions.filings.recent;
        let Some(index) = recent
            .form
            .iter()
            .position(|form| NPORT_FORMS.contains(&form.as_str()))
        else {
            warn!("No N-PORT filing found for CIK {}", cik);
            return None;
        };
        let Some(accession) = recent.accession_numbers.get(index) else {
            warn!("N-PORT filing for CIK {} has no accession number", cik);
            return None;
        };

        let folder = format!(
            "{}/Archives/edgar/data/{}/{}",
            self.archives_url,
            cik,
            accession.replace('-', "")
        );

        let document = match self.find_xml_document(fetcher, &folder).await {
            Some(name) => name,
            None => {
                // The primary document may point at the XSL-rendered view
                // ("xslFormNPORT-P_X01/primary_doc.xml"); the raw XML sits at the root.
                let primary = recent
                    .primary_documents
                    .get(index)
                    .and_then(|doc| doc.rsplit('/').next())
                    .filter(|doc| !doc.is_empty());
                match primary {
                    Some(doc) => doc.to_string(),
                    None => {
                        warn!("No N-PORT document found in {}", folder);
                        return None;
                    }
                }
            }
        };

        info!("Found N-PORT XML file: {}", document);
        Some(format!("{folder}/{document}"))
    }

    /// Picks the N-PORT XML out of the filing's directory listing.
    async fn find_xml_document(&self, fetcher: &SecFetcher, folder: &str) -> Option<String> {
        let index_url = format!("{folder}/index.json");
        let index: DirectoryIndex = match fetcher.fetch(&index_url).await {
            Ok(text) => serde_json::from_str(&text)
                .inspect_err(|e| debug!("Failed to parse filing index {}: {}", index_url, e))
                .ok()?,
            Err(e) => {
                debug!("Failed to fetch filing index {}: {}", index_url, e);
                return None;
            }
        };

        let xml_names: Vec<&str> = index
            .directory
            .item
            .iter()
            .map(|item| item.name.as_str())
            .filter(|name| name.to_lowercase().ends_with(".xml"))
            .collect();

        xml_names
            .iter()
            .find(|name| name.to_lowercase().contains("nport"))
            .or_else(|| xml_names.first())
            .map(|name| name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::fetcher::UserAgent;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SUBMISSIONS: &str = r#"{
        "cik": "884394",
        "name": "SPDR S&P 500 ETF TRUST",
        "filings": {
            "recent": {
                "form": ["N-CEN", "NPORT-P", "NPORT-P", "10-K"],
                "accessionNumber": [
                    "0001752724-25-000001",
                    "0001752724-25-043210",
                    "0001752724-24-999999",
                    "0000000000-24-000001"
                ],
                "primaryDocument": [
                    "primary_doc.xml",
                    "xslFormNPORT-P_X01/primary_doc.xml",
                    "primary_doc.xml",
                    "form10k.htm"
                ]
            }
        }
    }"#;

    fn fetcher() -> SecFetcher {
        let user_agent = UserAgent::new("Overlap-Test/1.0", "test@example.com").unwrap();
        SecFetcher::new(&user_agent, Duration::ZERO).unwrap()
    }

    async fn mount(server: &MockServer, url_path: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(url_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_normalize_cik() {
        assert_eq!(normalize_cik("884394"), "0000884394");
        assert_eq!(normalize_cik("0000884394"), "0000884394");
        assert_eq!(normalize_cik("000102909"), "0000102909");
    }

    #[tokio::test]
    async fn test_picks_nport_xml_from_directory_index() {
        let server = MockServer::start().await;
        mount(&server, "/submissions/CIK0000884394.json", 200, SUBMISSIONS).await;
        mount(
            &server,
            "/Archives/edgar/data/0000884394/000175272425043210/index.json",
            200,
            r#"{"directory": {"item": [
                {"name": "0001752724-25-043210-index.htm"},
                {"name": "primary_doc.xml"},
                {"name": "NPORT_Holdings.XML"}
            ]}}"#,
        )
        .await;

        let locator = FilingLocator::new(&server.uri(), &server.uri());
        let url = locator.latest_nport_url(&fetcher(), "884394").await;

        assert_eq!(
            url,
            Some(format!(
                "{}/Archives/edgar/data/0000884394/000175272425043210/NPORT_Holdings.XML",
                server.uri()
            ))
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_any_xml_in_directory() {
        let server = MockServer::start().await;
        mount(&server, "/submissions/CIK0000884394.json", 200, SUBMISSIONS).await;
        mount(
            &server,
            "/Archives/edgar/data/0000884394/000175272425043210/index.json",
            200,
            r#"{"directory": {"item": [{"name": "filing.htm"}, {"name": "primary_doc.xml"}]}}"#,
        )
        .await;

        let locator = FilingLocator::new(&server.uri(), &server.uri());
        let url = locator.latest_nport_url(&fetcher(), "884394").await.unwrap();

        assert!(url.ends_with("/000175272425043210/primary_doc.xml"));
    }

    #[tokio::test]
    async fn test_falls_back_to_primary_document_without_index() {
        let server = MockServer::start().await;
        mount(&server, "/submissions/CIK0000884394.json", 200, SUBMISSIONS).await;

        let locator = FilingLocator::new(&server.uri(), &server.uri());
        let url = locator.latest_nport_url(&fetcher(), "884394").await.unwrap();

        assert_eq!(
            url,
            format!(
                "{}/Archives/edgar/data/0000884394/000175272425043210/primary_doc.xml",
                server.uri()
            )
        );
    }

    #[tokio::test]
    async fn test_accepts_amended_filings() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/submissions/CIK0001067839.json",
            200,
            r#"{"filings": {"recent": {
                "form": ["NPORT-P/A"],
                "accessionNumber": ["0001067839-25-000123"],
                "primaryDocument": ["primary_doc.xml"]
            }}}"#,
        )
        .await;

        let locator = FilingLocator::new(&server.uri(), &server.uri());
        let url = locator.latest_nport_url(&fetcher(), "0001067839").await.unwrap();

        assert!(url.contains("/0001067839/000106783925000123/"));
    }

    #[tokio::test]
    async fn test_no_nport_filing_is_not_found() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/submissions/CIK0000884394.json",
            200,
            r#"{"filings": {"recent": {"form": ["10-K"], "accessionNumber": ["x"], "primaryDocument": ["y"]}}}"#,
        )
        .await;

        let locator = FilingLocator::new(&server.uri(), &server.uri());

        assert!(locator.latest_nport_url(&fetcher(), "884394").await.is_none());
    }

    #[tokio::test]
    async fn test_unparsable_or_missing_submissions_is_not_found() {
        let server = MockServer::start().await;
        mount(&server, "/submissions/CIK0000884394.json", 200, "<html>oops</html>").await;
        mount(&server, "/submissions/CIK0001067839.json", 503, "").await;

        let locator = FilingLocator::new(&server.uri(), &server.uri());

        assert!(locator.latest_nport_url(&fetcher(), "884394").await.is_none());
        assert!(locator.latest_nport_url(&fetcher(), "1067839").await.is_none());
    }
}
