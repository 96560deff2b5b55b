//! Deposit display formatting

use crate::models::Deposit;

/// Format deposits as a table, newest first
pub fn format_deposit_list(deposits: &[Deposit]) -> String {
    if deposits.is_empty() {
        return "No deposits found.".to_string();
    }

    let source_width = deposits
        .iter()
        .map(|d| d.source.as_deref().unwrap_or("").len())
        .max()
        .unwrap_or(6)
        .max(6);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12}  {:<16}  {:>12}  {:<source_width$}  {}\n",
        "ID",
        "Detected",
        "Amount",
        "Source",
        "Status",
        source_width = source_width,
    ));
    output.push_str(&format!(
        "{:-<12}  {:-<16}  {:->12}  {:-<source_width$}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        source_width = source_width,
    ));

    for deposit in deposits {
        output.push_str(&format!(
            "{:<12}  {:<16}  {:>12}  {:<source_width$}  {}\n",
            deposit.id.to_string(),
            deposit.detected_at.format("%Y-%m-%d %H:%M"),
            deposit.amount.to_string(),
            deposit.source.as_deref().unwrap_or(""),
            deposit.status,
            source_width = source_width,
        ));
    }

    output
}

/// Format a single deposit's details
pub fn format_deposit_details(deposit: &Deposit) -> String {
    let mut output = String::new();

    output.push_str(&format!("Deposit: {}\n", deposit.id));
    output.push_str(&format!("  Amount:   {}\n", deposit.amount));
    output.push_str(&format!("  Status:   {}\n", deposit.status));
    if let Some(source) = &deposit.source {
        output.push_str(&format!("  Source:   {}\n", source));
    }
    if let Some(description) = &deposit.description {
        output.push_str(&format!("  Memo:     {}\n", description));
    }
    if let Some(contact) = &deposit.contact {
        output.push_str(&format!("  Notify:   {}\n", contact));
    }
    output.push('\n');
    output.push_str(&format!(
        "  Detected:  {}\n",
        deposit.detected_at.format("%Y-%m-%d %H:%M UTC")
    ));
    if let Some(processed) = deposit.processed_at {
        output.push_str(&format!(
            "  Processed: {}\n",
            processed.format("%Y-%m-%d %H:%M UTC")
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;

    #[test]
    fn test_format_deposit_list() {
        let deposits = vec![Deposit::new(Money::from_dollars(1200)).with_source("ACME Payroll")];
        let output = format_deposit_list(&deposits);
        assert!(output.contains("$1200.00"));
        assert!(output.contains("ACME Payroll"));
        assert!(output.contains("pending"));
    }

    #[test]
    fn test_format_deposit_details() {
        let deposit = Deposit::new(Money::from_dollars(50)).with_contact("+15550100");
        let output = format_deposit_details(&deposit);
        assert!(output.contains("$50.00"));
        assert!(output.contains("+15550100"));
        assert!(!output.contains("Processed"));
    }
}
