use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::entity::holding;
use crate::error::{ AppError, Result };
use crate::services::portfolio_service::{ AddHoldingRequest, PortfolioService };

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    /// Line number in the uploaded file; the header is line 1.
    pub row: u64,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub created: Vec<holding::Model>,
    pub imported_count: usize,
    pub errors: Vec<RowError>,
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    symbol: usize,
    shares: usize,
    purchase_price: usize,
    purchase_date: usize,
    sector: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| {
                h.trim_start_matches('\u{feff}')
                    .chars()
                    .filter(|c| !c.is_whitespace() && *c != '_')
                    .collect::<String>()
                    .to_lowercase()
            })
            .collect();

        let find = |names: &[&str]| normalized.iter().position(|h| names.contains(&h.as_str()));

        let mut missing = Vec::new();
        let symbol = find(&["symbol"]);
        let shares = find(&["shares"]);
        let purchase_price = find(&["purchaseprice", "price"]);
        let purchase_date = find(&["purchasedate", "date"]);
        for (found, name) in [
            (symbol, "symbol"),
            (shares, "shares"),
            (purchase_price, "purchase_price"),
            (purchase_date, "purchase_date"),
        ] {
            if found.is_none() {
                missing.push(name);
            }
        }

        match (symbol, shares, purchase_price, purchase_date) {
            (Some(symbol), Some(shares), Some(purchase_price), Some(purchase_date)) =>
                Ok(Columns {
                    symbol,
                    shares,
                    purchase_price,
                    purchase_date,
                    sector: find(&["sector"]),
                }),
            _ =>
                Err(
                    AppError::validation(
                        "file",
                        format!("CSV is missing required columns: {}", missing.join(", "))
                    )
                ),
        }
    }
}

pub struct ImportService {
    portfolio: Arc<PortfolioService>,
}

impl ImportService {
    pub fn new(portfolio: Arc<PortfolioService>) -> Self {
        Self { portfolio }
    }

    /// Insert one holding per data row. Bad rows are reported and skipped.
    pub async fn import_csv(&self, user_id: i32, data: &[u8]) -> Result<ImportSummary> {
        let mut reader = csv::ReaderBuilder
            ::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(data);

        let headers = reader
            .headers()
            .map_err(|e| AppError::validation("file", format!("Unreadable CSV header: {}", e)))?
            .clone();
        let columns = Columns::from_headers(&headers)?;

        let mut created = Vec::new();
        let mut errors = Vec::new();

        for (index, result) in reader.records().enumerate() {
            let fallback_row = (index as u64) + 2;
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    let row = e
                        .position()
                        .map(|p| p.line())
                        .unwrap_or(fallback_row);
                    errors.push(RowError { row, error: format!("Malformed CSV row: {}", e) });
                    continue;
                }
            };
            let row = record
                .position()
                .map(|p| p.line())
                .unwrap_or(fallback_row);

            let outcome = match parse_row(&record, &columns) {
                Ok(req) => self.portfolio.add_holding(user_id, req).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(holding) => created.push(holding),
                Err(AppError::Validation { message, .. }) => {
                    errors.push(RowError { row, error: message });
                }
                Err(e) => {
                    tracing::warn!("Import of row {} failed for user {}: {}", row, user_id, e);
                    errors.push(RowError { row, error: e.to_string() });
                }
            }
        }

        tracing::info!(
            "User {} imported {} holdings ({} rows rejected)",
            user_id,
            created.len(),
            errors.len()
        );

        Ok(ImportSummary {
            imported_count: created.len(),
            created,
            errors,
        })
    }
}

fn parse_row(record: &csv::StringRecord, columns: &Columns) -> Result<AddHoldingRequest> {
    let field = |i: usize| record.get(i).unwrap_or("").trim();

    let shares = field(columns.shares)
        .parse::<f64>()
        .map_err(|_| {
            AppError::validation("shares", format!("Invalid shares value '{}'", field(columns.shares)))
        })?;
    let purchase_price = field(columns.purchase_price)
        .parse::<f64>()
        .map_err(|_| {
            AppError::validation(
                "purchase_price",
                format!("Invalid purchase price '{}'", field(columns.purchase_price))
            )
        })?;

    let raw_date = field(columns.purchase_date);
    if raw_date.is_empty() {
        return Err(AppError::validation("purchase_date", "Purchase date is required"));
    }

    Ok(AddHoldingRequest {
        symbol: field(columns.symbol).to_string(),
        shares,
        purchase_price,
        purchase_date: Some(us_date_to_iso(raw_date)),
        sector: columns.sector.map(|i| field(i).to_string()),
    })
}

/// Rewrite `MM/DD/YYYY` as `YYYY-MM-DD`; anything else passes through.
fn us_date_to_iso(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw, "%m/%d/%Y") {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserRepository;
    use crate::test_support::{ market_data, memory_db, StubProvider };

    async fn setup() -> (ImportService, Arc<PortfolioService>, i32) {
        let db = memory_db().await;
        let user = UserRepository::new(db.clone())
            .create("alice".into(), "alice@example.com".into(), "x".into()).await
            .unwrap();
        let stub = Arc::new(StubProvider::with_prices(&[]));
        let portfolio = Arc::new(PortfolioService::new(db, market_data(&stub)));
        (ImportService::new(portfolio.clone()), portfolio, user.id)
    }

    #[tokio::test]
    async fn test_malformed_row_skipped_and_reported() {
        let (importer, portfolio, user_id) = setup().await;
        let csv = "symbol,shares,purchase_price,purchase_date,sector\n\
                   AAPL,10,150.5,2024-01-15,Technology\n\
                   MSFT,abc,300,2024-01-16,Technology\n\
                   xom,4,100,03/01/2024,Energy\n";

        let summary = importer.import_csv(user_id, csv.as_bytes()).await.unwrap();
        assert_eq!(summary.imported_count, 2);
        assert_eq!(summary.created.len(), 2);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].row, 3);
        assert!(summary.errors[0].error.contains("shares"));

        let holdings = portfolio.list_holdings(user_id, None, None).await.unwrap();
        assert_eq!(holdings.len(), 2);
        let xom = holdings.iter().find(|h| h.symbol == "XOM").unwrap();
        assert_eq!(xom.purchase_date.format("%Y-%m-%d").to_string(), "2024-03-01");
    }

    #[tokio::test]
    async fn test_header_aliases_and_case() {
        let (importer, _, user_id) = setup().await;
        let csv = "Symbol,Shares,Price,Date\nIBM,2,120,2023-06-01\n";

        let summary = importer.import_csv(user_id, csv.as_bytes()).await.unwrap();
        assert_eq!(summary.imported_count, 1);
        assert_eq!(summary.created[0].sector, None);

        let csv = "SYMBOL, Purchase Price ,purchase_date,shares\nIBM,120,2023-06-01,2\n";
        let summary = importer.import_csv(user_id, csv.as_bytes()).await.unwrap();
        assert_eq!(summary.created[0].purchase_price, 120.0);
        assert_eq!(summary.created[0].shares, 2.0);
    }

    #[tokio::test]
    async fn test_missing_required_columns_rejects_upload() {
        let (importer, _, user_id) = setup().await;
        let csv = "symbol,shares\nAAPL,10\n";

        match importer.import_csv(user_id, csv.as_bytes()).await {
            Err(AppError::Validation { message, .. }) => {
                assert!(message.contains("purchase_price"));
                assert!(message.contains("purchase_date"));
            }
            other => panic!("expected validation error, got {:?}", other.map(|s| s.imported_count)),
        }
    }

    #[tokio::test]
    async fn test_validation_rules_apply_per_row() {
        let (importer, _, user_id) = setup().await;
        let csv = "symbol,shares,price,date\n\
                   ,1,1,2024-01-01\n\
                   AAPL,-1,1,2024-01-01\n\
                   AAPL,1,1,\n\
                   AAPL,1,1,not-a-date\n";

        let summary = importer.import_csv(user_id, csv.as_bytes()).await.unwrap();
        assert_eq!(summary.imported_count, 0);
        let rows: Vec<u64> = summary.errors
            .iter()
            .map(|e| e.row)
            .collect();
        assert_eq!(rows, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_us_date_conversion() {
        assert_eq!(us_date_to_iso("12/31/2023"), "2023-12-31");
        assert_eq!(us_date_to_iso("2023-12-31"), "2023-12-31");
    }
}
