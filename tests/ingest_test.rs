use folio_risk::ingest::{CancelToken, StatementIngestor};
use folio_risk::IngestError;

fn canonical_csv() -> Vec<u8> {
    let mut csv = String::from("ticker,name,quantity,avgPrice,instrument,sector\n");
    for (t, q, p, s) in [
        ("TCS", 10, 3500, "IT"),
        ("INFY", 20, 1500, "IT"),
        ("HDFCBANK", 15, 1600, "Financials"),
        ("RELIANCE", 5, 2400, "Energy"),
        ("SUNPHARMA", 8, 1100, "Healthcare"),
        ("TATASTEEL", 30, 140, "Metals"),
    ] {
        csv.push_str(&format!("{t},{t} Ltd,{q},{p},EQ,{s}\n"));
    }
    csv.into_bytes()
}

fn broker_statement_csv() -> Vec<u8> {
    let csv = "\
Zerodha Account Statement,,
Client ID: AB1234,,
Equity Holdings,,
Symbol,Quantity Available,Average Price
TCS,10,\"3,500.00\"
INFY,20,1500
WIPRO,0,400
RELIANCE,5,2400.50
Grand Total,35,
Disclaimer: prices are indicative,,
";
    csv.as_bytes().to_vec()
}

#[tokio::test]
async fn canonical_export_ingests_every_row() {
    let ingestor = StatementIngestor::with_defaults();
    let report = ingestor
        .ingest_file(
            "holdings.csv",
            Some("text/csv"),
            &canonical_csv(),
            &CancelToken::new(),
            |_| {},
        )
        .await
        .unwrap();

    assert_eq!(report.holdings.len(), 6);
    assert!(report.warnings.is_empty());

    let tcs = &report.holdings[0];
    assert_eq!(tcs.ticker, "TCS");
    assert_eq!(tcs.name, "TCS Ltd");
    assert_eq!(tcs.quantity, 10.0);
    assert_eq!(tcs.avg_price, 3500.0);
    assert_eq!(tcs.invested_amount, 35_000.0);
    assert_eq!(tcs.sector.as_deref(), Some("IT"));
}

#[tokio::test]
async fn broker_statement_stops_at_totals() {
    let ingestor = StatementIngestor::with_defaults();
    let report = ingestor
        .ingest_file(
            "statement.csv",
            None,
            &broker_statement_csv(),
            &CancelToken::new(),
            |_| {},
        )
        .await
        .unwrap();

    // WIPRO has zero quantity, the grand-total row ends the table
    let tickers: Vec<&str> = report.holdings.iter().map(|h| h.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["TCS", "INFY", "RELIANCE"]);
    assert_eq!(report.holdings[0].avg_price, 3500.0);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("WIPRO"));
}

#[tokio::test]
async fn headerless_rows_fall_back_to_pattern_matching() {
    let csv = b"\
TCS,10,3500,extra
INFY,20,1500,extra
RELIANCE,5,2400,extra
HDFCBANK,15,1600,extra
SUNPHARMA,8,1100,extra
";
    let ingestor = StatementIngestor::with_defaults();
    let report = ingestor
        .ingest_file("dump.csv", None, csv, &CancelToken::new(), |_| {})
        .await
        .unwrap();

    assert_eq!(report.holdings.len(), 5);
    assert_eq!(report.holdings[0].ticker, "TCS");
    // the statement carries no sector column; the ticker table fills it in
    assert_eq!(report.holdings[0].sector.as_deref(), Some("IT"));
}

#[tokio::test]
async fn wrong_extension_is_rejected_before_parsing() {
    let ingestor = StatementIngestor::with_defaults();
    let err = ingestor
        .ingest_file("report.pdf", None, b"whatever", &CancelToken::new(), |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Validation(_)));
}

#[tokio::test]
async fn rejected_uploads_never_report_progress() {
    let mut fired = false;
    let ingestor = StatementIngestor::with_defaults();
    let err = ingestor
        .ingest_file("report.pdf", None, b"whatever", &CancelToken::new(), |_| {
            fired = true;
        })
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Validation(_)));
    assert!(!fired);
}

#[tokio::test]
async fn undersized_statement_is_rejected() {
    let csv = b"ticker,name,quantity,avgPrice\nTCS,TCS,10,3500\n";
    let ingestor = StatementIngestor::with_defaults();
    let err = ingestor
        .ingest_file("tiny.csv", None, csv, &CancelToken::new(), |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Validation(_)));
}

#[tokio::test]
async fn cancelled_import_commits_nothing() {
    let cancel = CancelToken::new();
    cancel.cancel();

    let ingestor = StatementIngestor::with_defaults();
    let err = ingestor
        .ingest_file(
            "holdings.csv",
            None,
            &canonical_csv(),
            &cancel,
            |_| {},
        )
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Cancelled));
}

#[tokio::test]
async fn progress_reaches_completion() {
    let mut seen: Vec<u8> = Vec::new();
    let ingestor = StatementIngestor::with_defaults();
    ingestor
        .ingest_file(
            "holdings.csv",
            None,
            &canonical_csv(),
            &CancelToken::new(),
            |p| seen.push(p),
        )
        .await
        .unwrap();

    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
}
