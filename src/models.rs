use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

}

/// Fixed category sets, scoped per transaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    // Income
    Salary,
    BusinessIncome,
    RentalIncome,
    InvestmentIncome,
    OtherIncome,
    // Expense
    Rent,
    Utilities,
    Transportation,
    Healthcare,
    Education,
    BusinessExpenses,
    Food,
    Entertainment,
    OtherExpenses,
}

pub const INCOME_CATEGORIES: &[Category] = &[
    Category::Salary,
    Category::BusinessIncome,
    Category::RentalIncome,
    Category::InvestmentIncome,
    Category::OtherIncome,
];

pub const EXPENSE_CATEGORIES: &[Category] = &[
    Category::Rent,
    Category::Utilities,
    Category::Transportation,
    Category::Healthcare,
    Category::Education,
    Category::BusinessExpenses,
    Category::Food,
    Category::Entertainment,
    Category::OtherExpenses,
];

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Salary => "salary",
            Self::BusinessIncome => "business_income",
            Self::RentalIncome => "rental_income",
            Self::InvestmentIncome => "investment_income",
            Self::OtherIncome => "other_income",
            Self::Rent => "rent",
            Self::Utilities => "utilities",
            Self::Transportation => "transportation",
            Self::Healthcare => "healthcare",
            Self::Education => "education",
            Self::BusinessExpenses => "business_expenses",
            Self::Food => "food",
            Self::Entertainment => "entertainment",
            Self::OtherExpenses => "other_expenses",
        }
    }

    pub fn valid_for(transaction_type: TransactionType) -> &'static [Category] {
        match transaction_type {
            TransactionType::Income => INCOME_CATEGORIES,
            TransactionType::Expense => EXPENSE_CATEGORIES,
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub name: String,
}

/// One uploaded statement and its processing outcome.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Document {
    pub id: i64,
    pub account_id: i64,
    pub document_type: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub checksum: Option<String>,
    pub status: DocumentStatus,
    pub error_message: Option<String>,
    pub extracted_count: Option<i64>,
    pub processed_at: Option<String>,
}

/// Unvalidated extraction result, raw strings as found in the source.
/// Exists only within one processing run.
#[derive(Debug, Clone)]
pub struct CandidateRow {
    pub raw_date: String,
    pub raw_amount: String,
    pub description: String,
    /// Line or row number in the source file, for diagnostics.
    pub source_ref: String,
    /// The raw line/row as found in the source, kept for audit.
    pub raw: String,
    /// Set when the extractor could already determine the type
    /// (credit/debit column, amount sign).
    pub type_hint: Option<TransactionType>,
    pub reference: Option<String>,
}

/// Reason a candidate row was dropped. Lenient by default: collected for
/// diagnostics, never surfaced as an error.
#[derive(Debug, Clone)]
pub struct SkippedRow {
    pub source_ref: String,
    pub reason: String,
}

/// A candidate row after normalization and classification, ready to persist.
#[derive(Debug, Clone)]
pub struct ClassifiedTransaction {
    pub date: NaiveDate,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub category: Category,
    pub description: String,
    pub is_tax_deductible: bool,
    pub is_tax_applicable: bool,
    pub extracted_from: String,
    pub raw_source: String,
    pub reference: Option<String>,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub document_id: Option<i64>,
    pub date: NaiveDate,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub category: Category,
    pub description: String,
    pub is_tax_deductible: bool,
    pub is_tax_applicable: bool,
}
