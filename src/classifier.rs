use crate::models::{Category, TransactionType};

/// Keyword heuristics driving classification. Injected as data rather than
/// hard-coded so deployments can tune the lists; `Default` carries the
/// standard sets. Group order is significant: the first matching group wins.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub income_keywords: Vec<String>,
    pub expense_keywords: Vec<String>,
    pub income_rules: Vec<(Category, Vec<String>)>,
    pub expense_rules: Vec<(Category, Vec<String>)>,
    pub deductible_categories: Vec<Category>,
    pub deduction_keywords: Vec<String>,
    /// Categories whose name contains one of these phrases are exempt from
    /// VAT-style applicability.
    pub exempt_phrases: Vec<String>,
}

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            income_keywords: strings(&[
                "salary", "wage", "deposit", "credit", "transfer in", "payment received", "income",
            ]),
            expense_keywords: strings(&[
                "withdrawal", "debit", "transfer out", "payment", "purchase", "fee", "charge",
            ]),
            income_rules: vec![
                (Category::Salary, strings(&["salary", "wage", "payroll"])),
                (Category::BusinessIncome, strings(&["business", "sales", "revenue"])),
                (Category::RentalIncome, strings(&["rent", "rental"])),
                (Category::InvestmentIncome, strings(&["investment", "dividend", "interest"])),
            ],
            expense_rules: vec![
                (Category::Rent, strings(&["rent", "accommodation"])),
                (Category::Utilities, strings(&["electricity", "water", "utility", "power"])),
                (Category::Transportation, strings(&["transport", "uber", "taxi", "bus", "fuel"])),
                (Category::Healthcare, strings(&["medical", "hospital", "pharmacy", "health"])),
                (Category::Education, strings(&["school", "education", "training", "course"])),
                (Category::BusinessExpenses, strings(&["business", "office", "equipment", "supplies"])),
                (Category::Food, strings(&["food", "restaurant", "grocery", "supermarket"])),
                (Category::Entertainment, strings(&["entertainment", "movie", "cinema"])),
            ],
            deductible_categories: vec![
                Category::Healthcare,
                Category::Education,
                Category::BusinessExpenses,
            ],
            deduction_keywords: strings(&["medical", "training", "professional", "charity", "donation"]),
            exempt_phrases: strings(&[
                "food",
                "healthcare",
                "education",
                "residential rent",
                "public transport",
            ]),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Classification {
    pub transaction_type: TransactionType,
    pub category: Category,
    pub is_tax_deductible: bool,
    pub is_tax_applicable: bool,
}

/// Classify a transaction description. Pure and deterministic: substring
/// matching over the lower-cased description, fixed group priority. The type
/// hint, when the extractor could already determine it, takes precedence
/// over keyword inference.
pub fn classify(
    config: &ClassifierConfig,
    description: &str,
    type_hint: Option<TransactionType>,
) -> Classification {
    let desc = description.to_lowercase();

    let transaction_type = type_hint.unwrap_or_else(|| infer_type(config, &desc));

    let rules = match transaction_type {
        TransactionType::Income => &config.income_rules,
        TransactionType::Expense => &config.expense_rules,
    };
    let category = rules
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| desc.contains(kw.as_str())))
        .map(|(category, _)| *category)
        .unwrap_or(match transaction_type {
            TransactionType::Income => Category::OtherIncome,
            TransactionType::Expense => Category::OtherExpenses,
        });

    let is_tax_deductible = config.deductible_categories.contains(&category)
        || config.deduction_keywords.iter().any(|kw| desc.contains(kw.as_str()));

    Classification {
        transaction_type,
        category,
        is_tax_deductible,
        is_tax_applicable: is_tax_applicable(config, category),
    }
}

/// Infer income vs expense from description keywords; income keywords are
/// checked first, anything unmatched defaults to expense.
pub fn infer_type(config: &ClassifierConfig, lowered_description: &str) -> TransactionType {
    if config
        .income_keywords
        .iter()
        .any(|kw| lowered_description.contains(kw.as_str()))
    {
        return TransactionType::Income;
    }
    TransactionType::Expense
}

fn is_tax_applicable(config: &ClassifierConfig, category: Category) -> bool {
    let name = category.as_str().replace('_', " ");
    !config.exempt_phrases.iter().any(|phrase| name.contains(phrase.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_default(description: &str, hint: Option<TransactionType>) -> Classification {
        classify(&ClassifierConfig::default(), description, hint)
    }

    #[test]
    fn test_salary_credit_row() {
        let c = classify_default("SALARY PAYMENT MARCH", Some(TransactionType::Income));
        assert_eq!(c.transaction_type, TransactionType::Income);
        assert_eq!(c.category, Category::Salary);
        assert!(!c.is_tax_deductible);
        assert!(c.is_tax_applicable);
    }

    #[test]
    fn test_hospital_bill_is_deductible_and_exempt() {
        let c = classify_default("HOSPITAL BILL PAYMENT", None);
        assert_eq!(c.transaction_type, TransactionType::Expense);
        assert_eq!(c.category, Category::Healthcare);
        assert!(c.is_tax_deductible);
        assert!(!c.is_tax_applicable);
    }

    #[test]
    fn test_type_hint_takes_precedence() {
        // "rent" would infer expense via keywords, but the extractor said income.
        let c = classify_default("RENT RECEIVED FLAT 2B", Some(TransactionType::Income));
        assert_eq!(c.transaction_type, TransactionType::Income);
        assert_eq!(c.category, Category::RentalIncome);
    }

    #[test]
    fn test_income_inference_before_expense() {
        // Contains both "deposit" (income) and "fee" (expense); income wins.
        let c = classify_default("DEPOSIT PROCESSING FEE REVERSAL", None);
        assert_eq!(c.transaction_type, TransactionType::Income);
    }

    #[test]
    fn test_default_type_is_expense() {
        let c = classify_default("POS 0942 LAGOS", None);
        assert_eq!(c.transaction_type, TransactionType::Expense);
        assert_eq!(c.category, Category::OtherExpenses);
    }

    #[test]
    fn test_first_group_wins() {
        // "business" (group 6) and "restaurant" (group 7) both match; the
        // earlier group takes it.
        let c = classify_default("BUSINESS LUNCH RESTAURANT PAYMENT", None);
        assert_eq!(c.category, Category::BusinessExpenses);
    }

    #[test]
    fn test_category_closure() {
        let samples = [
            "SALARY APRIL", "WHOLESALE REVENUE", "RENTAL INCOME 2B", "DIVIDEND PAYOUT",
            "MISC CREDIT", "RENT Q2", "ELECTRICITY BILL", "UBER TRIP", "PHARMACY PURCHASE",
            "SCHOOL FEES", "OFFICE SUPPLIES", "SUPERMARKET", "CINEMA TICKETS", "UNKNOWN 123",
        ];
        for desc in samples {
            let c = classify_default(desc, None);
            assert!(
                Category::valid_for(c.transaction_type).contains(&c.category),
                "{desc}: {:?} not valid for {:?}",
                c.category,
                c.transaction_type
            );
        }
    }

    #[test]
    fn test_deductibility_monotonic_for_deductible_categories() {
        for desc in ["HOSPITAL XRAY", "SCHOOL FEES TERM 1", "OFFICE EQUIPMENT"] {
            let c = classify_default(desc, None);
            assert!(
                c.is_tax_deductible,
                "{desc} classified {:?} must be deductible",
                c.category
            );
        }
    }

    #[test]
    fn test_deduction_keyword_overrides_category() {
        // Category is other_expenses, but the deduction signal keyword applies.
        let c = classify_default("CHARITY GALA TICKET", None);
        assert_eq!(c.category, Category::OtherExpenses);
        assert!(c.is_tax_deductible);
    }

    #[test]
    fn test_exempt_categories_not_applicable() {
        for desc in ["GROCERY STORE", "HOSPITAL BILL", "TRAINING COURSE"] {
            let c = classify_default(desc, None);
            assert!(!c.is_tax_applicable, "{desc} should be VAT exempt");
        }
        // Plain rent and transport stay applicable: only the residential-rent
        // and public-transport phrasings are exempt, and no current category
        // name matches them.
        for desc in ["RENT Q2", "BUS FARE"] {
            let c = classify_default(desc, None);
            assert!(c.is_tax_applicable, "{desc} should be VAT applicable");
        }
    }

    #[test]
    fn test_config_is_injectable() {
        let mut config = ClassifierConfig::default();
        config
            .expense_rules
            .insert(0, (Category::Entertainment, vec!["steam".to_string()]));
        let c = classify(&config, "STEAM PURCHASE 4421", None);
        assert_eq!(c.category, Category::Entertainment);
    }
}
