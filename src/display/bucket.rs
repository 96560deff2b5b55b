//! Bucket display formatting

use crate::models::Bucket;

/// Format buckets as a table in allocation order
pub fn format_bucket_list(buckets: &[Bucket]) -> String {
    if buckets.is_empty() {
        return "No buckets found.".to_string();
    }

    let name_width = buckets
        .iter()
        .map(|b| b.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:>5}  {:<name_width$}  {:>16}  {:<8}  {}\n",
        "Order",
        "Name",
        "Rule",
        "Mode",
        "ID",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:->5}  {:-<name_width$}  {:->16}  {:-<8}  {:-<12}\n",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for bucket in buckets {
        let mode = if !bucket.active {
            "inactive"
        } else if bucket.requires_manual_action() {
            "manual"
        } else {
            "auto"
        };

        output.push_str(&format!(
            "{:>5}  {:<name_width$}  {:>16}  {:<8}  {}\n",
            bucket.sort_order,
            bucket.name,
            bucket.rule.to_string(),
            mode,
            bucket.id,
            name_width = name_width,
        ));
    }

    output
}

/// Format a single bucket's details
pub fn format_bucket_details(bucket: &Bucket) -> String {
    let mut output = String::new();

    output.push_str(&format!("Bucket: {}\n", bucket.name));
    output.push_str(&format!("  ID:       {}\n", bucket.id));
    output.push_str(&format!("  Rule:     {}\n", bucket.rule));
    output.push_str(&format!("  Order:    {}\n", bucket.sort_order));
    output.push_str(&format!(
        "  Active:   {}\n",
        if bucket.active { "Yes" } else { "No" }
    ));

    if let Some(link) = &bucket.external_link {
        output.push_str(&format!("  Link:     {}\n", link));
    }
    if let Some(name) = &bucket.external_name {
        output.push_str(&format!("  Pays to:  {}\n", name));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, Percentage};

    #[test]
    fn test_format_bucket_list() {
        let mut inactive = Bucket::fixed("Old", Money::from_dollars(5));
        inactive.deactivate();
        let buckets = vec![
            Bucket::percentage("Tithe", Percentage::from_points(10))
                .with_external_link("https://give.example.com/?amt={amount}"),
            Bucket::fixed("Rent", Money::from_dollars(900)),
            inactive,
        ];

        let output = format_bucket_list(&buckets);
        assert!(output.contains("Tithe"));
        assert!(output.contains("10%"));
        assert!(output.contains("$900.00 fixed"));
        assert!(output.contains("manual"));
        assert!(output.contains("inactive"));
    }

    #[test]
    fn test_format_empty_list() {
        assert!(format_bucket_list(&[]).contains("No buckets found"));
    }
}
