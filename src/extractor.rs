use std::path::Path;
#[cfg(any(feature = "pdf", test))]
use std::sync::OnceLock;

#[cfg(any(feature = "pdf", test))]
use regex::Regex;

use crate::error::Result;
#[cfg(any(feature = "pdf", feature = "xlsx"))]
use crate::error::TaxdocError;
use crate::models::{CandidateRow, SkippedRow, TransactionType};
#[cfg(any(feature = "pdf", test))]
use crate::normalize::{parse_amount, parse_date};

/// Candidate rows plus the rows that were dropped along the way. Dropping is
/// silent by default; the skip list is the diagnostics channel.
#[derive(Debug, Default)]
pub struct Extraction {
    pub rows: Vec<CandidateRow>,
    pub skipped: Vec<SkippedRow>,
}

/// Anything that can produce candidate rows from a file of a known format.
pub trait Extractor {
    fn extract(&self, path: &Path) -> Result<Extraction>;
}

// ---------------------------------------------------------------------------
// Format registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    #[cfg(feature = "pdf")]
    PdfStatement,
    DelimitedText,
    #[cfg(feature = "xlsx")]
    Spreadsheet,
}

impl SourceFormat {
    pub fn key(&self) -> &'static str {
        match self {
            #[cfg(feature = "pdf")]
            Self::PdfStatement => "pdf",
            Self::DelimitedText => "csv",
            #[cfg(feature = "xlsx")]
            Self::Spreadsheet => "spreadsheet",
        }
    }

    /// Resolve a format from the file extension, falling back to the mime
    /// hint recorded at upload time.
    pub fn detect(file_name: &str, mime_type: &str) -> Option<SourceFormat> {
        let ext = Path::new(file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            #[cfg(feature = "pdf")]
            "pdf" => return Some(Self::PdfStatement),
            "csv" => return Some(Self::DelimitedText),
            #[cfg(feature = "xlsx")]
            "xlsx" | "xls" => return Some(Self::Spreadsheet),
            _ => {}
        }
        match mime_type {
            #[cfg(feature = "pdf")]
            "application/pdf" => Some(Self::PdfStatement),
            "text/csv" => Some(Self::DelimitedText),
            #[cfg(feature = "xlsx")]
            "application/vnd.ms-excel"
            | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
                Some(Self::Spreadsheet)
            }
            _ => None,
        }
    }

    pub fn extractor(&self) -> &'static dyn Extractor {
        match self {
            #[cfg(feature = "pdf")]
            Self::PdfStatement => &PdfStatementExtractor,
            Self::DelimitedText => &DelimitedExtractor,
            #[cfg(feature = "xlsx")]
            Self::Spreadsheet => &SpreadsheetExtractor,
        }
    }
}

// ---------------------------------------------------------------------------
// Text-statement extractor (PDF-derived plain text)
// ---------------------------------------------------------------------------

#[cfg(any(feature = "pdf", test))]
fn date_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{1,2}[/-]\d{1,2}[/-]\d{2,4}").unwrap())
}

#[cfg(any(feature = "pdf", test))]
fn amount_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\u{20a6}$]?[\d,]+\.?\d*").unwrap())
}

#[cfg(feature = "pdf")]
pub struct PdfStatementExtractor;

#[cfg(feature = "pdf")]
impl Extractor for PdfStatementExtractor {
    fn extract(&self, path: &Path) -> Result<Extraction> {
        let text =
            pdf_extract::extract_text(path).map_err(|e| TaxdocError::Pdf(e.to_string()))?;
        Ok(scan_statement_text(&text))
    }
}

/// Line-by-line scan of statement text. A date token anywhere in a line
/// updates the current-date cursor; a line whose remainder still holds an
/// amount token while the cursor is set becomes a candidate row. The
/// description is the remainder with amount tokens stripped, or the following
/// line when the remainder is shorter than 5 characters. Lines that cannot be
/// parsed are skipped, never errors.
#[cfg(any(feature = "pdf", test))]
pub fn scan_statement_text(text: &str) -> Extraction {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let mut out = Extraction::default();
    let mut current_date: Option<String> = None;

    for (i, line) in lines.iter().enumerate() {
        let source_ref = format!("line {}", i + 1);
        let mut remainder = (*line).to_string();

        if let Some(m) = date_token_re().find(line) {
            // Cursor only advances to a date that actually parses; a bad
            // token clears it so amounts cannot attach to a stale date.
            current_date = parse_date(m.as_str()).map(|_| m.as_str().to_string());
            remainder = format!("{}{}", &line[..m.start()], &line[m.end()..]);
        }

        let Some(amount_match) = amount_token_re().find(&remainder) else {
            continue;
        };
        let Some(raw_date) = current_date.clone() else {
            out.skipped.push(SkippedRow {
                source_ref,
                reason: "amount with no preceding date".to_string(),
            });
            continue;
        };

        let raw_amount = amount_match.as_str().to_string();
        let mut description = amount_token_re().replace_all(&remainder, "").trim().to_string();
        if description.len() < 5 {
            if let Some(next) = lines.get(i + 1) {
                description = (*next).to_string();
            }
        }

        if parse_amount(&raw_amount) <= 0.0 {
            out.skipped.push(SkippedRow {
                source_ref,
                reason: "non-positive amount".to_string(),
            });
            continue;
        }
        if description.is_empty() {
            out.skipped.push(SkippedRow {
                source_ref,
                reason: "no description".to_string(),
            });
            continue;
        }

        out.rows.push(CandidateRow {
            raw_date,
            raw_amount,
            description,
            source_ref,
            raw: (*line).to_string(),
            type_hint: None,
            reference: None,
        });
    }

    out
}

// ---------------------------------------------------------------------------
// Column alias resolution, shared by the tabular extractors
// ---------------------------------------------------------------------------

const DATE_ALIASES: &[&str] = &["date", "transaction_date", "value_date", "posting_date", "date_posted"];
const DESCRIPTION_ALIASES: &[&str] = &[
    "description", "narration", "details", "particulars", "remarks", "transaction_details",
];
const CREDIT_ALIASES: &[&str] = &["credit", "deposit", "credit_amount", "inflow"];
const DEBIT_ALIASES: &[&str] = &["debit", "withdrawal", "debit_amount", "outflow"];
const AMOUNT_ALIASES: &[&str] = &["amount", "transaction_amount", "value"];
const REFERENCE_ALIASES: &[&str] = &["reference", "transaction_id", "ref", "transaction_ref", "tran_id"];

#[derive(Debug, Default)]
struct ColumnMap {
    date: Option<usize>,
    description: Option<usize>,
    credit: Option<usize>,
    debit: Option<usize>,
    amount: Option<usize>,
    reference: Option<usize>,
}

impl ColumnMap {
    fn resolve<I: IntoIterator<Item = S>, S: AsRef<str>>(headers: I) -> Self {
        let lowered: Vec<String> = headers
            .into_iter()
            .map(|h| h.as_ref().trim().to_lowercase())
            .collect();
        Self {
            date: resolve_column(&lowered, DATE_ALIASES),
            description: resolve_column(&lowered, DESCRIPTION_ALIASES),
            credit: resolve_column(&lowered, CREDIT_ALIASES),
            debit: resolve_column(&lowered, DEBIT_ALIASES),
            amount: resolve_column(&lowered, AMOUNT_ALIASES),
            reference: resolve_column(&lowered, REFERENCE_ALIASES),
        }
    }
}

/// Case-insensitive exact match over the ordered alias list first, then a
/// partial pass (header contains alias or alias contains header).
fn resolve_column(headers: &[String], aliases: &[&str]) -> Option<usize> {
    for alias in aliases {
        if let Some(i) = headers.iter().position(|h| h == alias) {
            return Some(i);
        }
    }
    for alias in aliases {
        if let Some(i) = headers
            .iter()
            .position(|h| !h.is_empty() && (h.contains(alias) || alias.contains(h.as_str())))
        {
            return Some(i);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Delimited-text extractor
// ---------------------------------------------------------------------------

pub struct DelimitedExtractor;

impl Extractor for DelimitedExtractor {
    fn extract(&self, path: &Path) -> Result<Extraction> {
        let file = std::fs::File::open(path)?;
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(std::io::BufReader::new(file));

        let cols = ColumnMap::resolve(rdr.headers()?.iter());
        let mut out = Extraction::default();

        for (i, result) in rdr.records().enumerate() {
            // Header is row 1.
            let source_ref = format!("row {}", i + 2);
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    out.skipped.push(SkippedRow { source_ref, reason: format!("unreadable row: {e}") });
                    continue;
                }
            };
            let field = |col: Option<usize>| {
                col.and_then(|ix| record.get(ix))
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
            };

            let Some(raw_date) = field(cols.date) else {
                out.skipped.push(SkippedRow { source_ref, reason: "no date value".to_string() });
                continue;
            };
            let description = field(cols.description).unwrap_or("").to_string();

            // Credit/debit columns decide the type outright; a single amount
            // column leaves it for the classifier's keyword inference.
            let (raw_amount, type_hint) = if let Some(v) = field(cols.credit) {
                (v, Some(TransactionType::Income))
            } else if let Some(v) = field(cols.debit) {
                (v, Some(TransactionType::Expense))
            } else if let Some(v) = field(cols.amount) {
                (v, None)
            } else {
                out.skipped.push(SkippedRow { source_ref, reason: "no amount value".to_string() });
                continue;
            };

            out.rows.push(CandidateRow {
                raw_date: raw_date.to_string(),
                raw_amount: raw_amount.to_string(),
                description,
                source_ref,
                raw: record.iter().collect::<Vec<_>>().join(","),
                type_hint,
                reference: field(cols.reference).map(|v| v.to_string()),
            });
        }

        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet extractor
// ---------------------------------------------------------------------------

#[cfg(feature = "xlsx")]
pub struct SpreadsheetExtractor;

#[cfg(feature = "xlsx")]
impl Extractor for SpreadsheetExtractor {
    fn extract(&self, path: &Path) -> Result<Extraction> {
        use calamine::Reader;

        let mut workbook = calamine::open_workbook_auto(path)
            .map_err(|e| TaxdocError::Spreadsheet(e.to_string()))?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| TaxdocError::Spreadsheet("workbook has no sheets".to_string()))?;
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| TaxdocError::Spreadsheet(e.to_string()))?;

        let mut out = Extraction::default();
        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            return Ok(out);
        };
        let cols = ColumnMap::resolve(header.iter().map(cell_text));

        for (i, row) in rows.enumerate() {
            let source_ref = format!("row {}", i + 2);
            let cell = |col: Option<usize>| col.and_then(|ix| row.get(ix));

            let raw_date = cell(cols.date).map(cell_date_text).unwrap_or_default();
            if raw_date.is_empty() {
                out.skipped.push(SkippedRow { source_ref, reason: "no date value".to_string() });
                continue;
            }
            let raw_amount = cell(cols.amount)
                .or_else(|| cell(cols.credit))
                .or_else(|| cell(cols.debit))
                .map(cell_text)
                .unwrap_or_default();
            if raw_amount.is_empty() {
                out.skipped.push(SkippedRow { source_ref, reason: "no amount value".to_string() });
                continue;
            }
            let description = cell(cols.description).map(cell_text).unwrap_or_default();

            // Sign decides the type; the absolute value is stored downstream.
            let value = crate::normalize::parse_amount(&raw_amount);
            let type_hint = if value > 0.0 {
                Some(TransactionType::Income)
            } else if value < 0.0 {
                Some(TransactionType::Expense)
            } else {
                None
            };

            out.rows.push(CandidateRow {
                raw_date,
                raw_amount,
                description,
                source_ref,
                raw: row.iter().map(cell_text).collect::<Vec<_>>().join(","),
                type_hint,
                reference: cell(cols.reference).map(cell_text).filter(|v| !v.is_empty()),
            });
        }

        Ok(out)
    }
}

#[cfg(feature = "xlsx")]
fn cell_text(cell: &calamine::Data) -> String {
    use calamine::Data;
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(feature = "xlsx")]
fn cell_date_text(cell: &calamine::Data) -> String {
    use calamine::Data;

    use crate::normalize::excel_serial_to_date;

    match cell {
        Data::Float(f) => excel_serial_to_date(*f).format("%Y-%m-%d").to_string(),
        Data::Int(i) => excel_serial_to_date(*i as f64).format("%Y-%m-%d").to_string(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()).format("%Y-%m-%d").to_string(),
        Data::String(s) => s.trim().to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_csv(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(
            SourceFormat::detect("statement.CSV", ""),
            Some(SourceFormat::DelimitedText)
        );
        #[cfg(feature = "pdf")]
        assert_eq!(
            SourceFormat::detect("statement.pdf", ""),
            Some(SourceFormat::PdfStatement)
        );
        #[cfg(feature = "xlsx")]
        {
            assert_eq!(
                SourceFormat::detect("book.xlsx", ""),
                Some(SourceFormat::Spreadsheet)
            );
            assert_eq!(
                SourceFormat::detect("book.xls", ""),
                Some(SourceFormat::Spreadsheet)
            );
        }
        assert_eq!(SourceFormat::detect("statement.docx", ""), None);
    }

    #[test]
    fn test_detect_by_mime_fallback() {
        assert_eq!(
            SourceFormat::detect("upload.tmp", "text/csv"),
            Some(SourceFormat::DelimitedText)
        );
        assert_eq!(SourceFormat::detect("upload.tmp", "image/png"), None);
    }

    #[test]
    fn test_scan_statement_date_then_amount_line() {
        let text = "STATEMENT OF ACCOUNT\n05/03/2025\n\u{20a6}25,000 HOSPITAL BILL PAYMENT\n";
        let out = scan_statement_text(text);
        assert_eq!(out.rows.len(), 1);
        let row = &out.rows[0];
        assert_eq!(row.raw_date, "05/03/2025");
        assert_eq!(row.raw_amount, "\u{20a6}25,000");
        assert_eq!(row.description, "HOSPITAL BILL PAYMENT");
    }

    #[test]
    fn test_scan_statement_inline_date_uses_next_line_description() {
        let text = "05/03/2025 \u{20a6}12,500.00\nTAXI FARE AIRPORT\n";
        let out = scan_statement_text(text);
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].description, "TAXI FARE AIRPORT");
    }

    #[test]
    fn test_scan_statement_amount_before_any_date_is_skipped() {
        let out = scan_statement_text("\u{20a6}4,000 OPENING ITEM\n");
        assert!(out.rows.is_empty());
        assert_eq!(out.skipped.len(), 1);
        assert!(out.skipped[0].reason.contains("no preceding date"));
    }

    #[test]
    fn test_scan_statement_unparseable_lines_are_silent() {
        let text = "Account Holder: J. DOE\nPage 1 of 3\n";
        let out = scan_statement_text(text);
        assert!(out.rows.is_empty());
    }

    #[test]
    fn test_scan_statement_bad_date_clears_cursor() {
        // 30/02 never parses, so the following amount has no date to attach to.
        let text = "01/03/2025\n\u{20a6}100.00 FIRST ITEM\n30/02/2025\n\u{20a6}200.00 SECOND ITEM\n";
        let out = scan_statement_text(text);
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].description, "FIRST ITEM");
    }

    #[test]
    fn test_resolve_column_exact_before_partial() {
        let headers: Vec<String> = vec!["posting date".into(), "date".into()];
        // "date" matches exactly at index 1 even though index 0 would match
        // partially first.
        assert_eq!(resolve_column(&headers, DATE_ALIASES), Some(1));
    }

    #[test]
    fn test_resolve_column_partial() {
        let headers: Vec<String> = vec!["transaction date".into(), "details".into(), "credit amt".into()];
        assert_eq!(resolve_column(&headers, DATE_ALIASES), Some(0));
        assert_eq!(resolve_column(&headers, DESCRIPTION_ALIASES), Some(1));
        assert_eq!(resolve_column(&headers, CREDIT_ALIASES), Some(2));
        assert_eq!(resolve_column(&headers, REFERENCE_ALIASES), None);
    }

    #[test]
    fn test_delimited_credit_debit_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "stmt.csv",
            "Date,Description,Credit,Debit\n\
             01/03/2025,SALARY PAYMENT MARCH,150000,\n\
             02/03/2025,POS GROCERY STORE,,8200.50\n",
        );
        let out = DelimitedExtractor.extract(&path).unwrap();
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0].type_hint, Some(TransactionType::Income));
        assert_eq!(out.rows[0].raw_amount, "150000");
        assert_eq!(out.rows[1].type_hint, Some(TransactionType::Expense));
        assert_eq!(out.rows[1].raw_amount, "8200.50");
    }

    #[test]
    fn test_delimited_single_amount_leaves_type_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "stmt.csv",
            "Date,Narration,Amount,Reference\n\
             01/03/2025,ATM WITHDRAWAL,5000,TRX-99\n",
        );
        let out = DelimitedExtractor.extract(&path).unwrap();
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].type_hint, None);
        assert_eq!(out.rows[0].reference.as_deref(), Some("TRX-99"));
    }

    #[test]
    fn test_delimited_rows_without_date_or_amount_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "stmt.csv",
            "Date,Description,Amount\n\
             ,NO DATE HERE,100\n\
             01/03/2025,NO AMOUNT HERE,\n\
             01/03/2025,GOOD ROW,250\n",
        );
        let out = DelimitedExtractor.extract(&path).unwrap();
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].description, "GOOD ROW");
        assert_eq!(out.skipped.len(), 2);
    }

    #[test]
    fn test_delimited_missing_file_is_an_error() {
        let err = DelimitedExtractor
            .extract(Path::new("/nonexistent/statement.csv"))
            .unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn test_cell_date_text_serials_and_strings() {
        use calamine::Data;
        assert_eq!(cell_date_text(&Data::Float(45667.0)), "2025-01-10");
        assert_eq!(cell_date_text(&Data::String(" 01/03/2025 ".into())), "01/03/2025");
        assert_eq!(cell_date_text(&Data::Empty), "");
    }
}
