#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/finratio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! OpenDART statement provider.
//!
//! This crate provides access to the Korean FSS OpenDART disclosure API:
//!
//! - Full single-company financial statements (`fnlttSinglAcntAll.json`)
//! - Stock code and company name to DART corp code lookup via `corpCode.xml`,
//!   downloaded on demand
//!
//! # Example
//!
//! ```no_run
//! use finratio_core::{CompanyId, Quarter, StatementProvider, StatementScope};
//! use finratio_dart::{CorpCodeIndex, DartProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = DartProvider::from_env()?;
//!     let index = provider.load_corp_codes("data/corpCode.xml", false).await?;
//!     let provider = provider.with_corp_codes(index);
//!
//!     let items = provider
//!         .fetch_statements(
//!             &CompanyId::new("005930"),
//!             2023,
//!             Quarter::Q1,
//!             StatementScope::Consolidated,
//!         )
//!         .await?;
//!     println!("{} line items", items.len());
//!
//!     Ok(())
//! }
//! ```

/// `corpCode.xml` index.
pub mod corp_code;

pub use corp_code::{CorpCodeEntry, CorpCodeIndex, DEFAULT_CORP_CODE_PATH};

use async_trait::async_trait;
use finratio_core::{
    CollectError, CompanyId, Quarter, RawLineItem, Result, StatementProvider, StatementScope,
    StatementType,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument};

/// OpenDART API base URL
const DART_BASE_URL: &str = "https://opendart.fss.or.kr/api";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "DART_API_KEY";

/// Default minimum spacing between two requests from one provider
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(100);

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Status: normal
const STATUS_OK: &str = "000";

/// Status: no data for the query
const STATUS_NO_DATA: &str = "013";

/// Status: request limit exceeded
const STATUS_RATE_LIMITED: &str = "020";

/// Statuses for unregistered, disabled or unauthorized keys
const AUTH_STATUSES: [&str; 4] = ["010", "011", "012", "901"];

/// Rate limiter to keep request spacing above the configured interval
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            last_request: now.checked_sub(min_interval).unwrap_or(now),
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// OpenDART statement provider.
///
/// Company identifiers are either 8-digit DART corp codes, used as-is, or stock
/// codes resolved through an explicit override or a [`CorpCodeIndex`].
#[derive(Debug)]
pub struct DartProvider {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    api_key: String,
    corp_codes: Option<Arc<CorpCodeIndex>>,
    overrides: HashMap<CompanyId, String>,
}

impl DartProvider {
    /// Create a new OpenDART provider with the given API key.
    ///
    /// # Example
    /// ```
    /// use finratio_dart::DartProvider;
    ///
    /// let provider = DartProvider::new("0123456789abcdef0123456789abcdef01234567");
    /// ```
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self::with_client(client, api_key)
    }

    /// Create a new OpenDART provider with a custom HTTP client.
    pub fn with_client(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(DEFAULT_RATE_LIMIT))),
            api_key: api_key.into(),
            corp_codes: None,
            overrides: HashMap::new(),
        }
    }

    /// Create a provider from the `DART_API_KEY` environment variable.
    ///
    /// # Errors
    /// Returns [`CollectError::ProviderNotConfigured`] if the variable is unset or blank.
    pub fn from_env() -> Result<Self> {
        let key = std::env::var(API_KEY_ENV)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                CollectError::ProviderNotConfigured(format!(
                    "OpenDART: set {API_KEY_ENV} or pass an API key"
                ))
            })?;
        Ok(Self::new(key))
    }

    /// Loads the corp code list from `path`, downloading it with this
    /// provider's key when the file is missing or `refresh` is set.
    ///
    /// # Errors
    /// See [`CorpCodeIndex::load_or_download`].
    pub async fn load_corp_codes(
        &self,
        path: impl AsRef<std::path::Path>,
        refresh: bool,
    ) -> Result<CorpCodeIndex> {
        self.rate_limiter.lock().await.wait().await;
        CorpCodeIndex::load_or_download(&self.client, &self.api_key, path, refresh).await
    }

    /// Attach a corp code index used to resolve stock codes and names.
    #[must_use]
    pub fn with_corp_codes(mut self, index: CorpCodeIndex) -> Self {
        self.corp_codes = Some(Arc::new(index));
        self
    }

    /// Map a company identifier to a known corp code, bypassing the index.
    #[must_use]
    pub fn with_corp_code(mut self, company: CompanyId, corp_code: impl Into<String>) -> Self {
        self.overrides.insert(company, corp_code.into());
        self
    }

    /// Resolve a company identifier to a DART corp code.
    ///
    /// Identifiers that are not a known stock code are looked up as company
    /// names (see [`CorpCodeIndex::find_by_name`]).
    ///
    /// # Errors
    /// Returns [`CollectError::CompanyNotFound`] if the identifier matches no
    /// entry of the index, or [`CollectError::ProviderNotConfigured`] if no
    /// index is loaded.
    pub fn resolve_corp_code(&self, company: &CompanyId) -> Result<String> {
        if let Some(code) = self.overrides.get(company) {
            return Ok(code.clone());
        }

        let id = company.as_str();
        if is_corp_code(id) {
            return Ok(id.to_string());
        }

        let index = self.corp_codes.as_ref().ok_or_else(|| {
            CollectError::ProviderNotConfigured(format!(
                "OpenDART: corpCode.xml is required to resolve stock code {id}"
            ))
        })?;

        index
            .resolve(id)
            .or_else(|| index.find_by_name(id).map(|e| e.corp_code.as_str()))
            .map(str::to_string)
            .ok_or_else(|| CollectError::CompanyNotFound(id.to_string()))
    }

    /// Fetches one report as the raw OpenDART JSON document.
    ///
    /// A "no data" answer is returned as-is; other failure statuses are errors.
    ///
    /// # Errors
    /// Returns resolution, network and status errors as
    /// [`StatementProvider::fetch_statements`] does.
    pub async fn fetch_statement_json(
        &self,
        company: &CompanyId,
        year: i32,
        quarter: Quarter,
        scope: StatementScope,
    ) -> Result<serde_json::Value> {
        let corp_code = self.resolve_corp_code(company)?;
        let body = self.fetch_report(&corp_code, year, quarter, scope).await?;
        parse_statement_json(&body)
    }

    async fn fetch_report(
        &self,
        corp_code: &str,
        year: i32,
        quarter: Quarter,
        scope: StatementScope,
    ) -> Result<String> {
        // Rate limit
        self.rate_limiter.lock().await.wait().await;

        let url = format!("{DART_BASE_URL}/fnlttSinglAcntAll.json");
        let year = year.to_string();

        debug!(corp_code, reprt_code = quarter.report_code(), "Fetching {}", url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("crtfc_key", self.api_key.as_str()),
                ("corp_code", corp_code),
                ("bsns_year", year.as_str()),
                ("reprt_code", quarter.report_code()),
                ("fs_div", scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| CollectError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CollectError::Network(format!(
                "Failed to fetch statements for {corp_code}: HTTP {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| CollectError::Network(e.to_string()))
    }
}

/// Returns true for 8-digit DART corp codes, which need no index lookup.
#[must_use]
pub fn is_corp_code(id: &str) -> bool {
    id.len() == 8 && id.bytes().all(|b| b.is_ascii_digit())
}

#[async_trait]
impl StatementProvider for DartProvider {
    fn name(&self) -> &str {
        "OpenDART"
    }

    #[instrument(skip(self), fields(company = %company, quarter = %quarter, scope = %scope))]
    async fn fetch_statements(
        &self,
        company: &CompanyId,
        year: i32,
        quarter: Quarter,
        scope: StatementScope,
    ) -> Result<Vec<RawLineItem>> {
        let corp_code = self.resolve_corp_code(company)?;
        let body = self.fetch_report(&corp_code, year, quarter, scope).await?;
        let items = parse_statement_response(&body)?;
        debug!("Fetched {} line items", items.len());
        Ok(items)
    }
}

// OpenDART JSON structure
// Based on: https://opendart.fss.or.kr/guide/detail.do?apiGrpCd=DS003&apiId=2019020

#[derive(Debug, Deserialize)]
struct StatementResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    list: Vec<StatementRow>,
}

#[derive(Debug, Deserialize)]
struct StatementRow {
    #[serde(default)]
    sj_div: String,
    #[serde(default)]
    account_nm: String,
    thstrm_amount: Option<String>,
    frmtrm_amount: Option<String>,
    bfefrmtrm_amount: Option<String>,
}

fn statement_type(sj_div: &str) -> Option<StatementType> {
    match sj_div.trim() {
        "BS" => Some(StatementType::BalanceSheet),
        "IS" | "CIS" => Some(StatementType::IncomeStatement),
        "CF" => Some(StatementType::CashFlow),
        _ => None,
    }
}

/// Map an OpenDART status to an error; `Ok(false)` means "no data".
fn check_status(status: &str, message: &str) -> Result<bool> {
    match status {
        STATUS_OK => Ok(true),
        STATUS_NO_DATA => Ok(false),
        STATUS_RATE_LIMITED => Err(CollectError::RateLimited {
            provider: "OpenDART".to_string(),
            retry_after: None,
        }),
        s if AUTH_STATUSES.contains(&s) => {
            Err(CollectError::AuthenticationFailed(format!("OpenDART [{s}]: {message}")))
        }
        s => Err(CollectError::Api {
            status: s.to_string(),
            message: message.to_string(),
        }),
    }
}

/// Parses a body into JSON and checks its status.
fn parse_statement_json(body: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| CollectError::Parse(format!("Failed to parse statements: {e}")))?;
    let status = value["status"].as_str().unwrap_or_default();
    let message = value["message"].as_str().unwrap_or_default();
    check_status(status.trim(), message)?;
    Ok(value)
}

/// Parse a `fnlttSinglAcntAll.json` body into raw line items.
///
/// Rows from statements other than BS, IS/CIS and CF (e.g. the statement of
/// changes in equity) are dropped.
///
/// # Errors
/// Returns a parse error for malformed JSON and an API error for any status
/// other than "normal" or "no data".
pub fn parse_statement_response(body: &str) -> Result<Vec<RawLineItem>> {
    let response: StatementResponse = serde_json::from_str(body)
        .map_err(|e| CollectError::Parse(format!("Failed to parse statements: {e}")))?;

    if !check_status(response.status.trim(), &response.message)? {
        return Ok(Vec::new());
    }

    let items = response
        .list
        .into_iter()
        .filter_map(|row| {
            let statement_type = statement_type(&row.sj_div)?;
            Some(RawLineItem {
                account_name: row.account_nm,
                statement_type,
                current_amount: row.thstrm_amount,
                prior_amount: row.frmtrm_amount,
                prior_prior_amount: row.bfefrmtrm_amount,
            })
        })
        .collect();

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "status": "000",
        "message": "정상",
        "list": [
            {"rcept_no": "20230515000123", "sj_div": "BS", "sj_nm": "재무상태표",
             "account_nm": "자산총계", "thstrm_amount": "500,000,000",
             "frmtrm_amount": "450,000,000"},
            {"sj_div": "CIS", "account_nm": "매출액",
             "thstrm_amount": "100000000", "frmtrm_amount": "80000000"},
            {"sj_div": "SCE", "account_nm": "자본총계", "thstrm_amount": "1"},
            {"sj_div": "CF", "account_nm": "감가상각비", "thstrm_amount": "7",
             "bfefrmtrm_amount": "5"}
        ]
    }"#;

    #[test]
    fn test_parse_statement_response() {
        let items = parse_statement_response(SAMPLE).unwrap();
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].account_name, "자산총계");
        assert_eq!(items[0].statement_type, StatementType::BalanceSheet);
        assert_eq!(items[0].current_amount.as_deref(), Some("500,000,000"));
        assert_eq!(items[0].prior_amount.as_deref(), Some("450,000,000"));
        assert_eq!(items[0].prior_prior_amount, None);

        assert_eq!(items[1].statement_type, StatementType::IncomeStatement);
        assert_eq!(items[2].statement_type, StatementType::CashFlow);
        assert_eq!(items[2].prior_prior_amount.as_deref(), Some("5"));
    }

    #[test]
    fn test_no_data_status_is_empty() {
        let body = r#"{"status": "013", "message": "조회된 데이타가 없습니다."}"#;
        assert!(parse_statement_response(body).unwrap().is_empty());
    }

    #[test]
    fn test_auth_statuses() {
        for status in AUTH_STATUSES {
            let body = format!(r#"{{"status": "{status}", "message": "등록되지 않은 키입니다."}}"#);
            assert!(matches!(
                parse_statement_response(&body),
                Err(CollectError::AuthenticationFailed(_))
            ));
        }
    }

    #[test]
    fn test_rate_limited_status() {
        let body = r#"{"status": "020", "message": "요청 제한을 초과하였습니다."}"#;
        assert!(matches!(
            parse_statement_response(body),
            Err(CollectError::RateLimited { .. })
        ));
    }

    #[test]
    fn test_other_status_is_api_error() {
        let body = r#"{"status": "100", "message": "필드의 부적절한 값입니다."}"#;
        match parse_statement_response(body) {
            Err(CollectError::Api { status, .. }) => assert_eq!(status, "100"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            parse_statement_response("<html>maintenance</html>"),
            Err(CollectError::Parse(_))
        ));
    }

    #[test]
    fn test_corp_code_detection() {
        assert!(is_corp_code("00126380"));
        assert!(!is_corp_code("005930"));
        assert!(!is_corp_code("0012638A"));
    }

    #[test]
    fn test_resolve_corp_code() {
        let index = CorpCodeIndex::from_entries(vec![CorpCodeEntry {
            corp_code: "00126380".to_string(),
            corp_name: "삼성전자".to_string(),
            stock_code: "005930".to_string(),
            modify_date: "20230110".to_string(),
        }]);
        let provider = DartProvider::new("test-key")
            .with_corp_codes(index)
            .with_corp_code(CompanyId::new("019440"), "00999999");

        assert_eq!(
            provider.resolve_corp_code(&CompanyId::new("005930")).unwrap(),
            "00126380"
        );
        assert_eq!(
            provider.resolve_corp_code(&CompanyId::new("00164779")).unwrap(),
            "00164779"
        );
        assert_eq!(
            provider.resolve_corp_code(&CompanyId::new("019440")).unwrap(),
            "00999999"
        );
        assert!(matches!(
            provider.resolve_corp_code(&CompanyId::new("123456")),
            Err(CollectError::CompanyNotFound(_))
        ));
    }

    #[test]
    fn test_resolve_by_company_name() {
        let index = CorpCodeIndex::from_entries(vec![
            CorpCodeEntry {
                corp_code: "00411921".to_string(),
                corp_name: "세아특수강".to_string(),
                stock_code: "019440".to_string(),
                modify_date: "20230301".to_string(),
            },
            CorpCodeEntry {
                corp_code: "00434003".to_string(),
                corp_name: "삼성전자서비스".to_string(),
                stock_code: String::new(),
                modify_date: "20170630".to_string(),
            },
        ]);
        let provider = DartProvider::new("test-key").with_corp_codes(index);

        assert_eq!(
            provider.resolve_corp_code(&CompanyId::new("세아특수강")).unwrap(),
            "00411921"
        );
        assert_eq!(
            provider.resolve_corp_code(&CompanyId::new("삼성전자서비스")).unwrap(),
            "00434003"
        );
        assert!(matches!(
            provider.resolve_corp_code(&CompanyId::new("현대자동차")),
            Err(CollectError::CompanyNotFound(_))
        ));
    }

    #[test]
    fn test_statement_json_keeps_document() {
        let value = parse_statement_json(SAMPLE).unwrap();
        assert_eq!(value["list"].as_array().unwrap().len(), 4);

        let no_data = parse_statement_json(r#"{"status": "013", "message": "조회된 데이타가 없습니다."}"#)
            .unwrap();
        assert_eq!(no_data["status"], "013");

        assert!(matches!(
            parse_statement_json(r#"{"status": "011", "message": "사용할 수 없는 키입니다."}"#),
            Err(CollectError::AuthenticationFailed(_))
        ));
    }

    #[test]
    fn test_resolve_without_index() {
        let provider = DartProvider::new("test-key");
        assert!(matches!(
            provider.resolve_corp_code(&CompanyId::new("005930")),
            Err(CollectError::ProviderNotConfigured(_))
        ));
    }

    #[test]
    fn test_provider_name() {
        let provider = DartProvider::new("test-key");
        assert_eq!(provider.name(), "OpenDART");
    }
}
