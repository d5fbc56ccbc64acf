use store::{Money, Order, Transaction};

use super::order_total_overflow;

use crate::error::DomainError;

/// Re-sums the stored line totals of an order and writes the sum back.
///
/// `order` must have been read inside `tx`; the write fails with
/// `ConcurrencyConflict` if its version changed in between. A sum that
/// overflows is rejected as `InvalidArgument` before anything is written.
pub(crate) async fn recompute_order_total<T: Transaction>(
    tx: &mut T,
    mut order: Order,
) -> Result<Order, DomainError> {
    let details = tx.list_details_for_order(order.id).await?;
    let previous = order.total;
    order.total = Money::checked_sum(details.iter().map(|d| d.line_total))
        .ok_or_else(order_total_overflow)?;

    let saved = tx.save_order(&order).await?;

    metrics::counter!("order_total_recomputations_total").increment(1);
    tracing::debug!(
        order_id = %saved.id,
        lines = details.len(),
        previous = %previous,
        total = %saved.total,
        version = %saved.version,
        "order total recomputed"
    );

    Ok(saved)
}
