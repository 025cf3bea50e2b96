// src/reports/index.rs
use roxmltree::{Document, Node};

use crate::tabular::Table;
use crate::utils::error::ReportError;

/// One sub-report listed in a filing's `FilingSummary.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRef {
    pub short_name: String,
    pub long_name: String,
    /// "Statements", "Notes", "Details", ...
    pub menu_category: Option<String>,
    pub position: Option<u32>,
    pub file_name: String,
    pub url: String,
}

impl ReportRef {
    pub fn is_statement(&self) -> bool {
        self.menu_category
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case("statements"))
    }

    fn is_parenthetical(&self) -> bool {
        self.short_name.to_lowercase().contains("parenthetical")
    }
}

/// The named sub-reports of a single filing.
#[derive(Debug, Clone, Default)]
pub struct ReportIndex {
    base_url: String,
    reports: Vec<ReportRef>,
}

impl ReportIndex {
    /// Parses `FilingSummary.xml`. Report file names are resolved against
    /// `base_url` (the filing's archive directory). Reports with neither an
    /// HTML nor an XML file are skipped.
    pub fn parse(xml: &str, base_url: &str) -> Result<Self, ReportError> {
        let doc = Document::parse(xml).map_err(|e| ReportError::Xml(e.to_string()))?;

        let root = doc.root_element();
        if !root.has_tag_name("FilingSummary") {
            return Err(ReportError::Xml(format!(
                "expected <FilingSummary> root, found <{}>",
                root.tag_name().name()
            )));
        }

        let base_url = base_url.trim_end_matches('/').to_string();
        let mut reports = Vec::new();

        let listed = root
            .children()
            .filter(|n| n.has_tag_name("MyReports"))
            .flat_map(|my_reports| my_reports.children())
            .filter(|n| n.has_tag_name("Report"));

        for node in listed {
            // Prefer the rendered HTML page over the raw XML one
            let file_name =
                child_text(node, "HtmlFileName").or_else(|| child_text(node, "XmlFileName"));
            let Some(file_name) = file_name else {
                tracing::trace!("Skipping report without a file: {:?}", child_text(node, "ShortName"));
                continue;
            };

            let short_name = child_text(node, "ShortName").unwrap_or_default();
            let long_name = child_text(node, "LongName").unwrap_or_else(|| short_name.clone());

            reports.push(ReportRef {
                url: format!("{}/{}", base_url, file_name),
                short_name,
                long_name,
                menu_category: child_text(node, "MenuCategory"),
                position: child_text(node, "Position").and_then(|p| p.parse().ok()),
                file_name,
            });
        }

        tracing::debug!("Parsed {} reports from filing summary", reports.len());
        Ok(Self { base_url, reports })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn reports(&self) -> &[ReportRef] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn statements(&self) -> impl Iterator<Item = &ReportRef> {
        self.reports.iter().filter(|r| r.is_statement())
    }

    /// Finds a report by name, case-insensitively.
    ///
    /// Exact matches on the short or long name win; otherwise the first report
    /// whose name contains `name`, preferring non-parenthetical ones.
    pub fn find(&self, name: &str) -> Option<&ReportRef> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        let exact = self.reports.iter().find(|r| {
            r.short_name.to_lowercase() == needle || r.long_name.to_lowercase() == needle
        });
        if exact.is_some() {
            return exact;
        }

        let mut partial = self.reports.iter().filter(|r| {
            r.short_name.to_lowercase().contains(&needle)
                || r.long_name.to_lowercase().contains(&needle)
        });
        let first = partial.next()?;
        if !first.is_parenthetical() {
            return Some(first);
        }
        partial.find(|r| !r.is_parenthetical()).or(Some(first))
    }

    /// First name in `names` that resolves to a report.
    pub fn find_any(&self, names: &[&str]) -> Option<&ReportRef> {
        names.iter().find_map(|name| self.find(name))
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new(["#", "category", "report", "file"]);
        for report in &self.reports {
            table.push_row(vec![
                report.position.map(|p| p.to_string()).unwrap_or_default(),
                report.menu_category.clone().unwrap_or_default(),
                report.short_name.clone(),
                report.file_name.clone(),
            ]);
        }
        table
    }
}

fn child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|c| c.has_tag_name(tag))
        .and_then(|c| c.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
