//! Company list input.

use finratio_core::{CollectError, Company, CompanyId, Result, YearRange};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// One row of a company list CSV.
///
/// Either `stock_code` or `corp_name` is required; a row without a stock code
/// is identified, and resolved, by its name. `corp_code` pins the DART corp
/// code and `start_year`/`end_year` override the batch years for this company.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompanyRecord {
    /// 6-digit stock code.
    pub stock_code: String,
    /// Company name.
    pub corp_name: String,
    /// Opaque classification label.
    pub label: String,
    /// Opaque sector tag.
    pub sector: String,
    /// DART corp code, if known.
    pub corp_code: Option<String>,
    /// First year to collect.
    pub start_year: Option<i32>,
    /// Last year to collect.
    pub end_year: Option<i32>,
}

impl CompanyRecord {
    /// Converts the record into a batch company.
    ///
    /// A record with only one of `start_year`/`end_year` collects that single year.
    ///
    /// # Errors
    /// Returns [`CollectError::InvalidParameter`] for a row with neither stock
    /// code nor name, or an inverted year range.
    pub fn to_company(&self) -> Result<Company> {
        let stock_code = self.stock_code.trim();
        let id = if stock_code.is_empty() {
            CompanyId::new(self.corp_name.trim())
        } else {
            CompanyId::new(stock_code)
        };
        if id.as_str().is_empty() {
            return Err(CollectError::InvalidParameter(
                "Company row without stock_code or corp_name".to_string(),
            ));
        }

        let mut company = Company::new(id)
            .with_name(self.corp_name.trim())
            .with_label(self.label.trim())
            .with_sector(self.sector.trim());

        let years = match (self.start_year, self.end_year) {
            (Some(start), Some(end)) => Some(YearRange::new(start, end)?),
            (Some(year), None) | (None, Some(year)) => Some(YearRange::new(year, year)?),
            (None, None) => None,
        };
        if let Some(years) = years {
            company = company.with_years(years);
        }
        Ok(company)
    }

    /// Returns the pinned corp code, if the cell was not blank.
    #[must_use]
    pub fn corp_code(&self) -> Option<&str> {
        self.corp_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Reads company records from CSV with a header row.
///
/// # Errors
/// Returns [`CollectError::Parse`] for malformed rows.
pub fn read_companies<R: Read>(reader: R) -> Result<Vec<CompanyRecord>> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv.deserialize()
        .map(|row| row.map_err(|e| CollectError::Parse(format!("company list: {e}"))))
        .collect()
}

/// Reads company records from a CSV file.
///
/// # Errors
/// Returns an I/O error if the file cannot be opened, or a parse error.
pub fn load_companies(path: impl AsRef<Path>) -> Result<Vec<CompanyRecord>> {
    let file = std::fs::File::open(path)?;
    read_companies(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_companies() {
        let data = "\
stock_code,corp_name,label,sector,corp_code,start_year,end_year
019440,세아특수강,0,Materials,00411921,2019,2021
005930,삼성전자,1,Information Technology,,,
";
        let records = read_companies(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);

        let first = records[0].to_company().unwrap();
        assert_eq!(first.id.as_str(), "019440");
        assert_eq!(first.sector, "Materials");
        assert_eq!(first.years, Some(YearRange::new(2019, 2021).unwrap()));
        assert_eq!(records[0].corp_code(), Some("00411921"));

        let second = records[1].to_company().unwrap();
        assert_eq!(second.years, None);
        assert_eq!(second.label, "1");
        assert_eq!(records[1].corp_code(), None);
    }

    #[test]
    fn test_minimal_columns() {
        let records = read_companies("stock_code\n035720\n".as_bytes()).unwrap();
        let company = records[0].to_company().unwrap();
        assert_eq!(company.id.as_str(), "035720");
        assert!(company.corp_name.is_empty());
    }

    #[test]
    fn test_single_bound_is_single_year() {
        let record = CompanyRecord {
            stock_code: "019440".to_string(),
            start_year: Some(2020),
            ..Default::default()
        };
        let company = record.to_company().unwrap();
        assert_eq!(company.years, Some(YearRange::new(2020, 2020).unwrap()));
    }

    #[test]
    fn test_name_only_row_is_identified_by_name() {
        let records = read_companies("stock_code,corp_name\n,세아특수강\n".as_bytes()).unwrap();
        let company = records[0].to_company().unwrap();
        assert_eq!(company.id.as_str(), "세아특수강");
        assert_eq!(company.corp_name, "세아특수강");
    }

    #[test]
    fn test_invalid_rows() {
        let blank = CompanyRecord::default();
        assert!(blank.to_company().is_err());

        let inverted = CompanyRecord {
            stock_code: "019440".to_string(),
            start_year: Some(2023),
            end_year: Some(2020),
            ..Default::default()
        };
        assert!(inverted.to_company().is_err());

        assert!(read_companies("stock_code,start_year\n019440,abc\n".as_bytes()).is_err());
    }
}
