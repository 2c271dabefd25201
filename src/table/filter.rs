use crate::fmt::{money, plain_amount};
use crate::models::TransactionRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignFilter {
    #[default]
    All,
    IncomeOnly,
    ExpenseOnly,
}

impl SignFilter {
    /// All -> Income -> Expense -> All, for a single cycling key.
    pub fn next(self) -> Self {
        match self {
            SignFilter::All => SignFilter::IncomeOnly,
            SignFilter::IncomeOnly => SignFilter::ExpenseOnly,
            SignFilter::ExpenseOnly => SignFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SignFilter::All => "all",
            SignFilter::IncomeOnly => "income",
            SignFilter::ExpenseOnly => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" | "*" | "" => Some(SignFilter::All),
            "income" | "+" => Some(SignFilter::IncomeOnly),
            "expense" | "-" => Some(SignFilter::ExpenseOnly),
            _ => None,
        }
    }

    fn matches(self, amount: Option<f64>) -> bool {
        match (self, amount) {
            (SignFilter::All, _) => true,
            (SignFilter::IncomeOnly, Some(a)) => a >= 0.0,
            (SignFilter::ExpenseOnly, Some(a)) => a < 0.0,
            (_, None) => false,
        }
    }
}

/// Year/month filter; `None` is the `*` wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateFilter {
    pub year: Option<String>,
    pub month: Option<String>,
}

impl DateFilter {
    /// Build from UI selections where `*` (or blank) means "any".
    /// Returns `None` when a specific value is not a 4-digit year or a 01-12 month.
    pub fn parse(year: &str, month: &str) -> Option<Self> {
        let year = match year.trim() {
            "" | "*" => None,
            y if y.len() == 4 && y.bytes().all(|b| b.is_ascii_digit()) => Some(y.to_string()),
            _ => return None,
        };
        let month = match month.trim() {
            "" | "*" => None,
            m => {
                let n: u32 = m.parse().ok()?;
                if !(1..=12).contains(&n) {
                    return None;
                }
                Some(format!("{n:02}"))
            }
        };
        Some(Self { year, month })
    }

    pub fn is_wildcard(&self) -> bool {
        self.year.is_none() && self.month.is_none()
    }

    fn matches(&self, record: &TransactionRecord) -> bool {
        if self.is_wildcard() {
            return true;
        }
        let Some((y, m)) = record.year_month() else {
            return false;
        };
        self.year.as_deref().map_or(true, |want| want == y)
            && self.month.as_deref().map_or(true, |want| want == m)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search_text: String,
    pub sign: SignFilter,
    pub date: DateFilter,
}

impl FilterState {
    /// The sign component implied by the search box: a lone `-` or `+` is a
    /// shortcut for the expense/income filter rather than a text query.
    fn search_sign(&self) -> Option<SignFilter> {
        match self.search_text.trim() {
            "-" => Some(SignFilter::ExpenseOnly),
            "+" => Some(SignFilter::IncomeOnly),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search_text.trim().is_empty() && self.sign == SignFilter::All && self.date.is_wildcard()
    }

    /// `currency` is the sign rows are displayed with, so a search for
    /// what the user sees in the amount column finds the row.
    pub fn matches(&self, record: &TransactionRecord, currency: &str) -> bool {
        if !self.sign.matches(record.amount) {
            return false;
        }
        if !self.date.matches(record) {
            return false;
        }
        match self.search_sign() {
            Some(sign) => sign.matches(record.amount),
            None => {
                let query = self.search_text.trim().to_lowercase();
                query.is_empty() || haystack(record, currency).contains(&query)
            }
        }
    }

    /// Short human description of the active filters, empty when none.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        let search = self.search_text.trim();
        if !search.is_empty() {
            parts.push(format!("search: {search}"));
        }
        if self.sign != SignFilter::All {
            parts.push(format!("sign: {}", self.sign.label()));
        }
        if !self.date.is_wildcard() {
            parts.push(format!(
                "date: {}-{}",
                self.date.year.as_deref().unwrap_or("*"),
                self.date.month.as_deref().unwrap_or("*"),
            ));
        }
        parts.join(", ")
    }
}

fn haystack(record: &TransactionRecord, currency: &str) -> String {
    let (shown, plain) = match record.amount {
        Some(a) => (money(a, currency), plain_amount(a)),
        None => (String::new(), String::new()),
    };
    format!(
        "{} {} {} {} {}",
        record.date, shown, plain, record.tag, record.description
    )
    .to_lowercase()
}

/// Indices of `records` that pass `filter`, in their original order.
pub fn apply(records: &[TransactionRecord], filter: &FilterState, currency: &str) -> Vec<usize> {
    if filter.is_empty() {
        return (0..records.len()).collect();
    }
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| filter.matches(r, currency))
        .map(|(i, _)| i)
        .collect()
}
