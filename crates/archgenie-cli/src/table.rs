//! Plain-text rendering of cost estimates.

use archgenie_core::{format_money, CostEstimate};

/// Shown when a generation produced no estimate (mock providers, or the
/// backend omitted the field).
pub const NO_COST_PLACEHOLDER: &str =
    "No cost data available for this generation. Run `archgenie estimate` to price Terraform directly.";

/// Shown instead when the provider's endpoints never return cost data, so
/// the absence is expected rather than a degraded generation.
pub const NO_LIVE_COST_PLACEHOLDER: &str =
    "This provider returns no cost data. Run `archgenie estimate` to price Terraform directly.";

/// Cost panel for a generation: the table when an estimate exists, the
/// placeholder matching why one doesn't otherwise.
pub fn render_cost_panel(cost: Option<&CostEstimate>, live_cost_supported: bool) -> String {
    if cost.is_none() && !live_cost_supported {
        return NO_LIVE_COST_PLACEHOLDER.to_string();
    }
    render_cost_table(cost)
}

const COLUMNS: &[&str] = &[
    "Cloud", "Service", "SKU", "Region", "Qty", "Size GB", "Hours", "Unit/mo", "Monthly",
];

// Qty onward are numeric and right-aligned.
const FIRST_NUMERIC: usize = 4;

fn opt_str(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn opt_num(value: Option<f64>) -> String {
    match value {
        Some(v) => {
            if v.fract() == 0.0 {
                format!("{v:.0}")
            } else {
                format!("{v:.2}")
            }
        }
        None => "-".to_string(),
    }
}

/// Render the estimate as an aligned table with a footer total, plus the
/// notes list. `None` yields the explicit placeholder, never an empty
/// table.
pub fn render_cost_table(cost: Option<&CostEstimate>) -> String {
    let Some(est) = cost else {
        return NO_COST_PLACEHOLDER.to_string();
    };

    let mut out = String::with_capacity(1024);

    if est.items.is_empty() {
        out.push_str("(no line items)\n");
    } else {
        let rows: Vec<Vec<String>> = est
            .items
            .iter()
            .map(|item| {
                vec![
                    opt_str(item.cloud.as_deref()),
                    item.service.clone(),
                    opt_str(item.sku.as_deref()),
                    opt_str(item.region.as_deref()),
                    opt_num(item.qty),
                    opt_num(item.size_gb),
                    opt_num(item.hours),
                    opt_num(item.unit_monthly),
                    opt_num(item.monthly),
                ]
            })
            .collect();

        let mut widths: Vec<usize> = COLUMNS.iter().map(|c| c.len()).collect();
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        push_row(&mut out, COLUMNS.iter().map(|s| s.to_string()).collect(), &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_row(&mut out, rule, &widths);
        for row in rows {
            push_row(&mut out, row, &widths);
        }
    }

    out.push_str("Total (");
    out.push_str(&est.currency);
    out.push_str("/mo): ");
    out.push_str(&format_money(&est.currency, est.total_estimate));
    out.push('\n');

    if let Some(method) = &est.method {
        out.push_str("Method: ");
        out.push_str(method);
        out.push('\n');
    }
    for note in &est.notes {
        out.push_str("  - ");
        out.push_str(note);
        out.push('\n');
    }

    out
}

fn push_row(out: &mut String, cells: Vec<String>, widths: &[usize]) {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push_str("  ");
        }
        let pad = widths[i].saturating_sub(cell.chars().count());
        if i >= FIRST_NUMERIC {
            out.push_str(&" ".repeat(pad));
            out.push_str(cell);
        } else {
            out.push_str(cell);
            if i + 1 < cells.len() {
                out.push_str(&" ".repeat(pad));
            }
        }
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use archgenie_core::CostItem;

    #[test]
    fn no_cost_renders_placeholder_not_empty_table() {
        let out = render_cost_table(None);
        assert_eq!(out, NO_COST_PLACEHOLDER);
        assert!(!out.contains("Total"));
    }

    #[test]
    fn cost_panel_distinguishes_unsupported_from_missing() {
        assert_eq!(render_cost_panel(None, false), NO_LIVE_COST_PLACEHOLDER);
        assert_eq!(render_cost_panel(None, true), NO_COST_PLACEHOLDER);
        // A returned estimate always wins, supported or not.
        let est = CostEstimate::default();
        assert!(render_cost_panel(Some(&est), false).contains("Total"));
    }

    #[test]
    fn empty_items_render_notice_and_total() {
        let est = CostEstimate {
            total_estimate: 12.5,
            ..Default::default()
        };
        let out = render_cost_table(Some(&est));
        assert!(out.contains("(no line items)"));
        assert!(out.contains("Total (USD/mo): $12.50"));
    }

    #[test]
    fn line_items_render_one_row_each_with_footer() {
        let est = CostEstimate {
            total_estimate: 66.25,
            items: vec![
                CostItem {
                    cloud: Some("azure".to_string()),
                    service: "App Service".to_string(),
                    sku: Some("B1".to_string()),
                    monthly: Some(54.75),
                    ..Default::default()
                },
                CostItem {
                    cloud: Some("azure".to_string()),
                    service: "SQL Database".to_string(),
                    size_gb: Some(10.0),
                    monthly: Some(11.5),
                    ..Default::default()
                },
            ],
            notes: vec!["Prices are list prices.".to_string()],
            method: Some("sku-table".to_string()),
            ..Default::default()
        };
        let out = render_cost_table(Some(&est));
        assert!(out.contains("App Service"));
        assert!(out.contains("SQL Database"));
        assert!(out.contains("54.75"));
        assert!(out.contains("Total (USD/mo): $66.25"));
        assert!(out.contains("Method: sku-table"));
        assert!(out.contains("- Prices are list prices."));
        // Header + rule + two item rows precede the footer.
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("Cloud"));
        assert!(lines[1].starts_with("---"));
    }
}
