//! Holdings extraction from SEC N-PORT XML filings.
//!
//! Filers do not agree on a namespace: some use the current N-PORT URI, some
//! an older one, some prefix everything and some declare nothing at all.
//! Extraction therefore locates the `invstOrSec` records with an ordered list
//! of strategies and reads each field with a lookup that tolerates missing
//! or unexpected namespaces.

use crate::core::holdings::{Holding, sort_by_weight};
use crate::providers::xml::{Element, XmlError};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, error, info};

/// Namespace URIs used by N-PORT documents over time.
pub const KNOWN_NAMESPACES: [&str; 3] = [
    "http://www.sec.gov/edgar/nport",
    "http://www.sec.gov/edgar/nportfiling",
    "http://www.sec.gov/edgar/document/nport",
];

const RECORD_ELEMENT: &str = "invstOrSec";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("malformed {field} value '{value}'")]
    MalformedRecord { field: &'static str, value: String },

    #[error("filing is not well-formed XML: {0}")]
    MalformedDocument(#[from] XmlError),
}

/// Holdings read from one filing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Positive weights only, largest first.
    pub holdings: Vec<Holding>,
    /// Reporting period end date (`repPdDate`).
    pub as_of_date: Option<NaiveDate>,
}

/// One way of finding the investment records in a document.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordLocator {
    /// Records in the given namespace.
    Namespace(String),
    /// Records matched by local name only, whatever their namespace.
    AnyNamespace,
}

impl RecordLocator {
    pub fn locate<'a>(&self, root: &'a Element) -> Vec<&'a Element> {
        root.descendants()
            .filter(|e| match self {
                RecordLocator::Namespace(ns) => e.is(Some(ns.as_str()), RECORD_ELEMENT),
                RecordLocator::AnyNamespace => e.local_name == RECORD_ELEMENT,
            })
            .collect()
    }

    /// The namespace to prefer when reading fields of located records.
    fn namespace_hint(&self) -> Option<&str> {
        match self {
            RecordLocator::Namespace(ns) => Some(ns.as_str()),
            RecordLocator::AnyNamespace => None,
        }
    }
}

/// The strategies to try, in order: the namespace the document declares,
/// then the known N-PORT namespaces, then any namespace.
pub fn record_locators(detected: Option<&str>) -> Vec<RecordLocator> {
    detected
        .into_iter()
        .chain(KNOWN_NAMESPACES)
        .map(|ns| RecordLocator::Namespace(ns.to_string()))
        .chain([RecordLocator::AnyNamespace])
        .collect()
}

/// Finds the first default namespace declaration (`xmlns="..."`) in the raw
/// text. A textual heuristic, run before the document is parsed.
pub fn detect_default_namespace(xml: &str) -> Option<&str> {
    const DECLARATION: &str = "xmlns=\"";

    let start = xml.find(DECLARATION)? + DECLARATION.len();
    let len = xml[start..].find('"')?;
    Some(&xml[start..start + len]).filter(|ns| !ns.is_empty())
}

/// Text of the direct child `local_name` of `element`.
///
/// Looks for the child in `namespace`, then without a namespace, then by
/// local name alone. Empty text counts as absent.
pub fn find_field<'a>(
    element: &'a Element,
    local_name: &str,
    namespace: Option<&str>,
) -> Option<&'a str> {
    let children = &element.children;
    namespace
        .and_then(|ns| children.iter().find(|c| c.is(Some(ns), local_name)))
        .or_else(|| children.iter().find(|c| c.is(None, local_name)))
        .or_else(|| children.iter().find(|c| c.local_name == local_name))
        .map(|c| c.text.trim())
        .filter(|text| !text.is_empty())
}

/// Extracts holdings from an N-PORT document.
///
/// Never fails: a document that cannot be parsed yields no holdings, and a
/// record with an unreadable number is skipped.
pub fn extract_holdings(xml: &str) -> Extraction {
    let Some(root) = parse_document(xml) else {
        return Extraction::default();
    };

    let detected = detect_default_namespace(xml);
    let mut records = Vec::new();
    let mut namespace = None;
    for locator in record_locators(detected) {
        records = locator.locate(&root);
        if !records.is_empty() {
            debug!("Located investment records with {:?}", locator);
            namespace = locator.namespace_hint().map(str::to_string);
            break;
        }
    }
    info!("Found {} investment/security elements", records.len());

    let mut holdings = Vec::with_capacity(records.len());
    for record in records {
        match parse_holding(record, namespace.as_deref()) {
            Ok(holding) if holding.percentage > 0.0 => holdings.push(holding),
            Ok(_) => {}
            Err(e) => debug!("Error parsing holding: {}", e),
        }
    }
    sort_by_weight(&mut holdings);

    Extraction {
        holdings,
        as_of_date: report_date(&root),
    }
}

/// Parses the document, retrying once without a byte order mark and
/// surrounding whitespace. quick-xml already skips a leading BOM and
/// whitespace; the retry only changes the outcome for inputs the reader
/// rejects on the first pass.
fn parse_document(xml: &str) -> Option<Element> {
    let err = match Element::parse(xml) {
        Ok(root) => return Some(root),
        Err(e) => ExtractError::from(e),
    };
    error!("Failed to parse XML: {}", err);

    let cleaned = xml.trim().trim_start_matches('\u{feff}').trim_start();
    match Element::parse(cleaned) {
        Ok(root) => Some(root),
        Err(e) => {
            error!("Failed to parse cleaned XML: {}", ExtractError::from(e));
            None
        }
    }
}

fn parse_holding(record: &Element, namespace: Option<&str>) -> Result<Holding, ExtractError> {
    let field = |name: &str| find_field(record, name, namespace);

    let percentage = match field("pctVal") {
        Some(text) => parse_number("pctVal", text)?,
        None => 0.0,
    };
    let value = field("valUSD")
        .map(|text| parse_number("valUSD", text))
        .transpose()?;

    Ok(Holding {
        name: field("name").unwrap_or("Unknown").to_string(),
        cusip: field("cusip").filter(|c| is_security_code(c)).map(str::to_string),
        percentage,
        value,
    })
}

fn parse_number(field: &'static str, text: &str) -> Result<f64, ExtractError> {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ExtractError::MalformedRecord {
            field,
            value: text.to_string(),
        })
}

/// Filers write `N/A` or zeros when an instrument has no CUSIP.
fn is_security_code(code: &str) -> bool {
    !code.eq_ignore_ascii_case("N/A") && !code.chars().all(|c| c == '0')
}

fn report_date(root: &Element) -> Option<NaiveDate> {
    root.descendants()
        .find(|e| e.local_name == "repPdDate")
        .and_then(|e| NaiveDate::parse_from_str(e.text.trim(), "%Y-%m-%d").ok())
}
