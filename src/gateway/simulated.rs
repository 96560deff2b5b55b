//! Simulated transfer gateway
//!
//! Stands in for a bank integration: every transfer is accepted with a
//! generated transaction reference. Payment links are rendered from the
//! bucket's template.

use tracing::info;
use uuid::Uuid;

use super::{GatewayError, TransferGateway, TransferOutcome, TransferRequest};

/// Transfer gateway that accepts every transfer
#[derive(Debug, Clone)]
pub struct SimulatedTransferGateway {
    fallback_link_base: String,
}

impl SimulatedTransferGateway {
    /// `fallback_link_base` is used when a template is blank
    pub fn new(fallback_link_base: impl Into<String>) -> Self {
        Self {
            fallback_link_base: fallback_link_base.into(),
        }
    }
}

impl TransferGateway for SimulatedTransferGateway {
    async fn execute_transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<TransferOutcome, GatewayError> {
        let transaction_id = format!("txn_{}", &Uuid::new_v4().simple().to_string()[..12]);
        info!(
            bucket = %request.bucket_id,
            deposit = %request.deposit_id,
            amount = %request.amount,
            transaction_id = %transaction_id,
            "simulated transfer accepted"
        );
        Ok(TransferOutcome::Accepted { transaction_id })
    }

    async fn generate_external_link(&self, request: &TransferRequest, template: &str) -> String {
        let link = render_link(template, request, &self.fallback_link_base);
        info!(bucket = %request.bucket_id, amount = %request.amount, "generated payment link");
        link
    }
}

/// Render a payment link template for a transfer
///
/// `{amount}`, `{deposit}` and `{bucket}` placeholders are substituted. A
/// template without placeholders gets `a=<amount>` appended as a query
/// parameter. A blank template falls back to `fallback_base`.
pub fn render_link(template: &str, request: &TransferRequest, fallback_base: &str) -> String {
    let amount = request.amount.to_decimal_string();
    let template = template.trim();

    if template.is_empty() {
        return format!(
            "{}?bucket={}&amount={}&ref={}",
            fallback_base,
            request.bucket_id.as_uuid(),
            amount,
            request.deposit_id.as_uuid()
        );
    }

    let has_placeholders = ["{amount}", "{deposit}", "{bucket}"]
        .iter()
        .any(|p| template.contains(p));

    if has_placeholders {
        return template
            .replace("{amount}", &amount)
            .replace("{deposit}", &request.deposit_id.as_uuid().to_string())
            .replace("{bucket}", &request.bucket_id.as_uuid().to_string());
    }

    let separator = if template.contains('?') { '&' } else { '?' };
    format!("{}{}a={}", template, separator, amount)
}
