// src/reports/statement.rs

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::tabular::Table;
use crate::utils::error::ReportError;

// --- CSS Selectors (Lazy Static) ---
// Rendered XBRL pages (R2.htm, ...) put the statement in `table.report`
static REPORT_TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table.report").expect("Failed to compile REPORT_TABLE_SELECTOR")
});

static ANY_TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("Failed to compile ANY_TABLE_SELECTOR"));

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("Failed to compile ROW_SELECTOR"));

static HEADER_CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th").expect("Failed to compile HEADER_CELL_SELECTOR"));

static DATA_CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("Failed to compile DATA_CELL_SELECTOR"));

// --- Regex Patterns (Lazy Static) ---
static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile WHITESPACE_RE"));

// Footnote markers such as "[1]"
static FOOTNOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\d+\]").expect("Failed to compile FOOTNOTE_RE"));

// Currency symbols, thousands separators, parentheses and spaces
static AMOUNT_NOISE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s$€£,()]").expect("Failed to compile AMOUNT_NOISE_RE"));

/// Anything that can answer "what is `label` in `period`?".
pub trait LineItemSource {
    fn value(&self, label: &str, period: &str) -> Option<f64>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub label: String,
    /// One entry per period column; `None` for blank cells.
    pub values: Vec<Option<f64>>,
}

/// A financial statement scraped from a rendered report page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    pub title: String,
    pub periods: Vec<String>,
    pub items: Vec<LineItem>,
}

impl Statement {
    /// Parses the first report table in `html`. `source` only labels errors.
    pub fn parse(html: &str, source: &str) -> Result<Self, ReportError> {
        let document = Html::parse_document(html);

        let table = document
            .select(&REPORT_TABLE_SELECTOR)
            .next()
            .or_else(|| document.select(&ANY_TABLE_SELECTOR).next())
            .ok_or_else(|| ReportError::TableNotFound(source.to_string()))?;

        let mut header_rows: Vec<Vec<ElementRef<'_>>> = Vec::new();
        let mut items = Vec::new();

        for row in table.select(&ROW_SELECTOR) {
            let data: Vec<ElementRef<'_>> = row.select(&DATA_CELL_SELECTOR).collect();

            if data.is_empty() {
                let headers: Vec<ElementRef<'_>> = row.select(&HEADER_CELL_SELECTOR).collect();
                if !headers.is_empty() {
                    header_rows.push(headers);
                }
                continue;
            }

            let label = cell_text(data[0]);
            if label.is_empty() {
                continue;
            }
            let values = data[1..]
                .iter()
                .map(|cell| parse_amount(&cell_text(*cell)))
                .collect();
            items.push(LineItem { label, values });
        }

        if items.is_empty() {
            return Err(ReportError::TableNotFound(source.to_string()));
        }

        let title = header_rows
            .first()
            .and_then(|row| row.first())
            .map(|cell| cell_text(*cell))
            .unwrap_or_default();

        // Period labels live in the last header row. The title cell carries
        // class "tl"; without that marker a single header row starts with it.
        let periods: Vec<String> = match header_rows.last() {
            Some(row) => {
                let marked = row.iter().any(|cell| is_title_cell(*cell));
                let skip = usize::from(!marked && header_rows.len() == 1);
                row.iter()
                    .filter(|cell| !is_title_cell(**cell))
                    .skip(skip)
                    .map(|cell| cell_text(*cell))
                    .collect()
            }
            None => Vec::new(),
        };

        if !periods.is_empty() {
            for item in &mut items {
                item.values.resize(periods.len(), None);
            }
        }

        tracing::debug!(
            "Parsed statement {:?}: {} periods, {} line items",
            title,
            periods.len(),
            items.len()
        );

        Ok(Self { title, periods, items })
    }

    /// Column index for `period`: an exact label match, else the first label
    /// containing it (so "2023" finds "Dec. 30, 2023").
    pub fn period_index(&self, period: &str) -> Option<usize> {
        let wanted = normalize_label(period);
        if wanted.is_empty() {
            return None;
        }
        let normalized: Vec<String> = self.periods.iter().map(|p| normalize_label(p)).collect();
        normalized
            .iter()
            .position(|p| *p == wanted)
            .or_else(|| normalized.iter().position(|p| p.contains(&wanted)))
    }

    pub fn line_item(&self, label: &str) -> Option<&LineItem> {
        let wanted = normalize_label(label);
        self.items.iter().find(|item| normalize_label(&item.label) == wanted)
    }

    pub fn to_table(&self) -> Table {
        let headers = std::iter::once("line item".to_string()).chain(self.periods.iter().cloned());
        let mut table = Table::new(headers);
        for item in &self.items {
            let mut row = vec![item.label.clone()];
            row.extend(item.values.iter().map(|v| v.map(|v| v.to_string()).unwrap_or_default()));
            table.push_row(row);
        }
        table
    }
}

impl LineItemSource for Statement {
    fn value(&self, label: &str, period: &str) -> Option<f64> {
        let column = self.period_index(period)?;
        self.line_item(label)?.values.get(column).copied().flatten()
    }
}

/// Several statements of one filing, queried together.
#[derive(Debug, Clone, Default)]
pub struct Financials {
    statements: Vec<Statement>,
}

impl Financials {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }
}

impl LineItemSource for Financials {
    fn value(&self, label: &str, period: &str) -> Option<f64> {
        self.statements.iter().find_map(|s| s.value(label, period))
    }
}

fn is_title_cell(cell: ElementRef<'_>) -> bool {
    cell.value().classes().any(|c| c == "tl")
}

fn cell_text(cell: ElementRef<'_>) -> String {
    let raw = cell.text().collect::<String>().replace('\u{a0}', " ");
    let without_notes = FOOTNOTE_RE.replace_all(&raw, "");
    WHITESPACE_RE.replace_all(&without_notes, " ").trim().to_string()
}

/// Case-, whitespace- and apostrophe-insensitive form of a label.
pub fn normalize_label(label: &str) -> String {
    let lowered = label.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'");
    WHITESPACE_RE
        .replace_all(lowered.trim(), " ")
        .trim_end_matches(':')
        .to_string()
}

/// "$ 1,234" -> 1234, "(56)" -> -56, "" or "—" -> None.
pub fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let negative = trimmed.contains('(') && trimmed.contains(')');
    let digits = AMOUNT_NOISE_RE.replace_all(trimmed, "");
    let value: f64 = digits.parse().ok()?;
    Some(if negative { -value.abs() } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPERATIONS_HTML: &str = r#"<html><body>
<table class="report" border="0" cellspacing="2" id="idm1">
<tr>
<th class="tl" colspan="1" rowspan="2"><div style="width: 200px;"><strong>Consolidated Statements of Operations - USD ($)<br> shares in Millions, $ in Millions</strong></div></th>
<th class="th" colspan="3">12 Months Ended</th>
</tr>
<tr>
<th class="th"><div>Dec. 30, 2023</div></th>
<th class="th"><div>Dec. 31, 2022</div></th>
<th class="th"><div>Dec. 25, 2021</div></th>
</tr>
<tr class="re"><td class="pl"><a>Net revenue</a></td><td class="nump">$ 22,680</td><td class="nump">$ 23,601</td><td class="nump">$ 16,434</td></tr>
<tr class="ro"><td class="pl"><a>Operating income (loss)</a></td><td class="nump">401</td><td class="nump">1,264</td><td class="nump">3,648</td></tr>
<tr class="re"><td class="pl"><a>Income tax provision (benefit)</a></td><td class="num">(346)</td><td class="num">(122)</td><td class="nump">513</td></tr>
<tr class="ro"><td class="pl"><a>Net income</a></td><td class="nump">$ 854</td><td class="nump">$ 1,320</td><td class="nump">$ 3,162</td></tr>
<tr class="rh"><td class="pl"><a>Earnings per share</a></td><td class="text">&#160;</td><td class="text">&#160;</td><td class="text">&#160;</td></tr>
</table>
</body></html>"#;

    const BALANCE_HTML: &str = r#"<table class="report">
<tr><th class="tl"><strong>Consolidated Balance Sheets - USD ($)<br> $ in Millions</strong></th>
<th class="th"><div>Dec. 30, 2023</div></th><th class="th"><div>Dec. 31, 2022</div></th></tr>
<tr class="ro"><td class="pl"><a>Total assets</a></td><td class="nump">$ 67,885</td><td class="nump">$ 67,580</td></tr>
<tr class="re"><td class="pl"><a>Total stockholders&#8217; equity</a> [1]</td><td class="nump">55,892</td><td class="nump">54,750</td></tr>
</table>"#;

    #[test]
    fn parses_title_periods_and_items() {
        let statement = Statement::parse(OPERATIONS_HTML, "R2.htm").unwrap();
        assert!(statement.title.starts_with("Consolidated Statements of Operations"));
        assert_eq!(statement.periods, ["Dec. 30, 2023", "Dec. 31, 2022", "Dec. 25, 2021"]);
        assert_eq!(statement.items.len(), 5);

        let revenue = statement.line_item("NET REVENUE").unwrap();
        assert_eq!(revenue.values, vec![Some(22680.0), Some(23601.0), Some(16434.0)]);

        let header = statement.line_item("Earnings per share").unwrap();
        assert_eq!(header.values, vec![None, None, None]);
    }

    #[test]
    fn single_header_row_balance_sheet() {
        let statement = Statement::parse(BALANCE_HTML, "R4.htm").unwrap();
        assert_eq!(statement.periods, ["Dec. 30, 2023", "Dec. 31, 2022"]);
        assert_eq!(
            statement.value("Total stockholders' equity", "Dec. 30, 2023"),
            Some(55892.0),
            "typographic apostrophes and footnote markers are normalized"
        );
    }

    #[test]
    fn value_matches_period_by_year() {
        let statement = Statement::parse(OPERATIONS_HTML, "R2.htm").unwrap();
        assert_eq!(statement.value("Net income", "2022"), Some(1320.0));
        assert_eq!(statement.value("Income tax provision (benefit)", "2023"), Some(-346.0));
        assert_eq!(statement.value("Net income", "2019"), None);
        assert_eq!(statement.value("Gross margin", "2023"), None);
    }

    #[test]
    fn financials_search_every_statement() {
        let financials = Financials::new(vec![
            Statement::parse(OPERATIONS_HTML, "R2.htm").unwrap(),
            Statement::parse(BALANCE_HTML, "R4.htm").unwrap(),
        ]);
        assert_eq!(financials.value("net income", "2023"), Some(854.0));
        assert_eq!(financials.value("total assets", "2023"), Some(67885.0));
    }

    #[test]
    fn page_without_table_is_an_error() {
        let err = Statement::parse("<html><p>No data</p></html>", "R9.htm").unwrap_err();
        assert!(matches!(err, ReportError::TableNotFound(ref s) if s == "R9.htm"));
    }

    #[test]
    fn amounts() {
        assert_eq!(parse_amount("$ 1,234"), Some(1234.0));
        assert_eq!(parse_amount("(56)"), Some(-56.0));
        assert_eq!(parse_amount("$ (7.5)"), Some(-7.5));
        assert_eq!(parse_amount("0.52"), Some(0.52));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("—"), None);
    }

    #[test]
    fn table_has_label_column_plus_periods() {
        let table = Statement::parse(BALANCE_HTML, "R4.htm").unwrap().to_table();
        assert_eq!(table.headers, ["line item", "Dec. 30, 2023", "Dec. 31, 2022"]);
        assert_eq!(table.rows[0], ["Total assets", "67885", "67580"]);
    }
}
