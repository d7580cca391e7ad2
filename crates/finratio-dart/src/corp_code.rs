//! Index over the OpenDART `corpCode.xml` company list.
//!
//! OpenDART identifies companies by an 8-digit `corp_code`; listed companies
//! also carry a 6-digit KRX `stock_code`. The XML file is a flat sequence of
//! `<list>` records:
//!
//! ```xml
//! <result>
//!   <list>
//!     <corp_code>00126380</corp_code>
//!     <corp_name>삼성전자</corp_name>
//!     <stock_code>005930</stock_code>
//!     <modify_date>20230110</modify_date>
//!   </list>
//! </result>
//! ```
//!
//! OpenDART serves the file zipped from the `corpCode.xml` endpoint;
//! [`CorpCodeIndex::download`] fetches and unpacks it.

use finratio_core::{CollectError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Serialize;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, info};

use crate::{DART_BASE_URL, check_status};

/// Default location of the downloaded company list.
pub const DEFAULT_CORP_CODE_PATH: &str = "data/corpCode.xml";

/// One `<list>` record of `corpCode.xml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CorpCodeEntry {
    /// 8-digit DART company code.
    pub corp_code: String,
    /// Registered company name.
    pub corp_name: String,
    /// 6-digit stock code, empty for unlisted companies.
    pub stock_code: String,
    /// Last modification date (`YYYYMMDD`).
    pub modify_date: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    CorpCode,
    CorpName,
    StockCode,
    ModifyDate,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"corp_code" => Some(Self::CorpCode),
            b"corp_name" => Some(Self::CorpName),
            b"stock_code" => Some(Self::StockCode),
            b"modify_date" => Some(Self::ModifyDate),
            _ => None,
        }
    }
}

/// Lookup table from stock codes to DART corp codes.
#[derive(Clone, Debug, Default)]
pub struct CorpCodeIndex {
    entries: Vec<CorpCodeEntry>,
    by_stock_code: HashMap<String, usize>,
}

impl CorpCodeIndex {
    /// Builds an index from already-parsed entries.
    #[must_use]
    pub fn from_entries(entries: Vec<CorpCodeEntry>) -> Self {
        let mut by_stock_code = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            if !entry.stock_code.is_empty() {
                by_stock_code.entry(entry.stock_code.clone()).or_insert(i);
            }
        }
        Self {
            entries,
            by_stock_code,
        }
    }

    /// Parses the contents of `corpCode.xml`.
    ///
    /// # Errors
    /// Returns [`CollectError::Parse`] on malformed XML.
    pub fn from_xml_str(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut entries = Vec::new();
        let mut current: Option<CorpCodeEntry> = None;
        let mut field: Option<Field> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = e.name();
                    if name.as_ref() == b"list" {
                        current = Some(CorpCodeEntry::default());
                    } else {
                        field = Field::from_tag(name.as_ref());
                    }
                }
                Ok(Event::Text(t)) => {
                    if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                        let text = t
                            .unescape()
                            .map_err(|e| CollectError::Parse(format!("corpCode.xml: {e}")))?;
                        let value = text.trim().to_string();
                        match f {
                            Field::CorpCode => entry.corp_code = value,
                            Field::CorpName => entry.corp_name = value,
                            Field::StockCode => entry.stock_code = value,
                            Field::ModifyDate => entry.modify_date = value,
                        }
                    }
                }
                Ok(Event::End(e)) => {
                    if e.name().as_ref() == b"list" {
                        if let Some(entry) = current.take()
                            && !entry.corp_code.is_empty()
                        {
                            entries.push(entry);
                        }
                    } else {
                        field = None;
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(CollectError::Parse(format!(
                        "corpCode.xml parse error at byte {}: {e}",
                        reader.buffer_position()
                    )));
                }
            }
        }

        debug!("Loaded {} corp code entries", entries.len());
        Ok(Self::from_entries(entries))
    }

    /// Reads and parses a `corpCode.xml` file.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be read, or a parse error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let xml = std::fs::read_to_string(path)?;
        Self::from_xml_str(&xml)
    }

    /// Downloads and parses the current company list.
    ///
    /// # Errors
    /// Returns a network error if the request fails, the mapped OpenDART status
    /// if the API refuses the key, or a parse error for a damaged archive.
    pub async fn download(client: &reqwest::Client, api_key: &str) -> Result<Self> {
        let xml = download_xml(client, api_key).await?;
        Self::from_xml_str(&xml)
    }

    /// Loads the list from `path`, downloading it there first if the file is
    /// missing or `refresh` is set.
    ///
    /// # Errors
    /// Returns the errors of [`Self::download`] and [`Self::load`], or an I/O
    /// error if the downloaded file cannot be saved.
    pub async fn load_or_download(
        client: &reqwest::Client,
        api_key: &str,
        path: impl AsRef<Path>,
        refresh: bool,
    ) -> Result<Self> {
        let path = path.as_ref();
        if !refresh && path.exists() {
            return Self::load(path);
        }

        let xml = download_xml(client, api_key).await?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &xml).await?;
        info!(path = %path.display(), "Saved corp code list");

        Self::from_xml_str(&xml)
    }

    /// Returns the corp code for a 6-digit stock code.
    #[must_use]
    pub fn resolve(&self, stock_code: &str) -> Option<&str> {
        self.by_stock_code
            .get(stock_code.trim())
            .map(|i| self.entries[*i].corp_code.as_str())
    }

    /// Returns the entry for a stock code.
    #[must_use]
    pub fn get(&self, stock_code: &str) -> Option<&CorpCodeEntry> {
        self.by_stock_code
            .get(stock_code.trim())
            .map(|i| &self.entries[*i])
    }

    /// Finds a company by name.
    ///
    /// An exact case-insensitive match wins, listed companies first. Otherwise
    /// the first entry whose name contains `name` is returned.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&CorpCodeEntry> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return None;
        }

        let mut exact = self
            .entries
            .iter()
            .filter(|e| e.corp_name.to_lowercase() == name);
        let first_exact = exact.next();
        let listed_exact = first_exact
            .filter(|e| !e.stock_code.is_empty())
            .or_else(|| exact.find(|e| !e.stock_code.is_empty()));

        listed_exact
            .or(first_exact)
            .or_else(|| self.search(Some(name.as_str()), None, 1).into_iter().next())
    }

    /// Finds companies by case-insensitive name substring and/or exact stock code.
    ///
    /// Blank criteria match everything. At most `limit` entries are returned,
    /// in file order.
    #[must_use]
    pub fn search(
        &self,
        name: Option<&str>,
        stock_code: Option<&str>,
        limit: usize,
    ) -> Vec<&CorpCodeEntry> {
        let name = name.map(|n| n.trim().to_lowercase()).unwrap_or_default();
        let stock_code = stock_code.map(str::trim).unwrap_or_default();

        self.entries
            .iter()
            .filter(|e| name.is_empty() || e.corp_name.to_lowercase().contains(&name))
            .filter(|e| stock_code.is_empty() || e.stock_code == stock_code)
            .take(limit)
            .collect()
    }

    /// Returns all entries in file order.
    #[must_use]
    pub fn entries(&self) -> &[CorpCodeEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetches the zipped list and returns the XML inside it.
async fn download_xml(client: &reqwest::Client, api_key: &str) -> Result<String> {
    let url = format!("{DART_BASE_URL}/corpCode.xml");
    debug!("Downloading {}", url);

    let response = client
        .get(&url)
        .query(&[("crtfc_key", api_key)])
        .send()
        .await
        .map_err(|e| CollectError::Network(e.to_string()))?;

    if !response.status().is_success() {
        return Err(CollectError::Network(format!(
            "Failed to download corp codes: HTTP {}",
            response.status()
        )));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| CollectError::Network(e.to_string()))?;
    extract_corp_code_xml(&body)
}

/// Unpacks the XML from a `corpCode.xml` response body.
///
/// Errors come back as a bare XML status document instead of an archive.
fn extract_corp_code_xml(body: &[u8]) -> Result<String> {
    if !body.starts_with(b"PK") {
        let (status, message) = error_status(body);
        check_status(&status, &message)?;
        return Err(CollectError::Parse(format!(
            "corpCode.xml: expected a zip archive, got status {status}"
        )));
    }

    let mut archive = zip::ZipArchive::new(Cursor::new(body))
        .map_err(|e| CollectError::Parse(format!("corpCode.xml archive: {e}")))?;
    if archive.is_empty() {
        return Err(CollectError::Parse("corpCode.xml archive is empty".to_string()));
    }

    let mut file = archive
        .by_index(0)
        .map_err(|e| CollectError::Parse(format!("corpCode.xml archive: {e}")))?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Reads `<status>` and `<message>` from an OpenDART error document.
fn error_status(body: &[u8]) -> (String, String) {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut tag = Vec::new();
    let (mut status, mut message) = (String::new(), String::new());
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => tag = e.name().as_ref().to_vec(),
            Ok(Event::Text(t)) => {
                let text = t.unescape().map(|t| t.trim().to_string()).unwrap_or_default();
                match tag.as_slice() {
                    b"status" => status = text,
                    b"message" => message = text,
                    _ => {}
                }
            }
            Ok(Event::End(_)) => tag.clear(),
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
        buf.clear();
    }
    (status, message)
}
