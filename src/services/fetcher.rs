//! Paged retrieval of one day's transaction lines.

use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, warn};

use crate::models::TransactionLine;
use crate::pos::wire::TransactionRow;
use crate::pos::{PosApi, PosResult};

/// Pages through the transactions endpoint and flattens each transaction's
/// nested order lines into [`TransactionLine`] records.
pub struct TransactionFetcher {
    pos: Arc<dyn PosApi>,
    per_page: u32,
}

impl TransactionFetcher {
    pub fn new(pos: Arc<dyn PosApi>, per_page: u32) -> Self {
        Self {
            pos,
            per_page: per_page.max(1),
        }
    }

    /// All line items of transactions closed on `day`.
    ///
    /// Pages forward (1-based) while `page * per_page < total` as reported
    /// upstream, or while pages come back full when the response carries no
    /// usable total, and stops immediately on an empty page so a misreported
    /// total cannot loop forever. Unparsable rows are dropped at line
    /// granularity; an upstream transport failure aborts the day and
    /// propagates to the caller, which degrades it to an empty day.
    pub async fn fetch_day(&self, day: NaiveDate) -> PosResult<Vec<TransactionLine>> {
        let mut lines = Vec::new();
        let mut page = 1u32;

        loop {
            let response = self.pos.transactions_page(day, page, self.per_page).await?;

            if response.data.is_empty() {
                break;
            }

            // Trust the per_page echoed upstream when sane, else what we asked for.
            let per_page = response
                .page
                .as_ref()
                .and_then(|p| p.per_page)
                .filter(|p| *p > 0)
                .unwrap_or(i64::from(self.per_page));
            let fetched = response.data.len();

            flatten_transactions(day, &response.data, &mut lines);

            let more = match response.count {
                Some(total) => i64::from(page) * per_page < total.max(0),
                // No usable total: fall back to paging while pages are full.
                None => {
                    if page == 1 {
                        warn!("{day}: transactions page reports no count, paging on fullness");
                    }
                    fetched as i64 >= per_page
                }
            };
            if !more {
                break;
            }
            page += 1;
        }

        debug!("{day}: {} transaction lines across {page} page(s)", lines.len());
        Ok(lines)
    }
}

/// Flatten transaction rows into lines, dropping what cannot be parsed.
///
/// A transaction without a parsable `date_close` loses all its lines (there
/// is no hour to bin them into); a line with a bad product id or quantity is
/// dropped alone. Dropped data is logged, never estimated.
fn flatten_transactions(day: NaiveDate, rows: &[TransactionRow], out: &mut Vec<TransactionLine>) {
    for row in rows {
        let Some(closed_at) = row.closed_at() else {
            warn!(
                "{day}: dropping transaction with unparsable date_close {:?} ({} line(s))",
                row.date_close,
                row.products.len()
            );
            continue;
        };

        for line in &row.products {
            let (Some(product_id), Some(quantity)) = (line.product_id, line.num) else {
                warn!("{day}: dropping order line with unparsable fields at {closed_at}");
                continue;
            };
            if quantity < 0.0 {
                warn!("{day}: dropping order line with negative quantity {quantity} (product {product_id})");
                continue;
            }
            out.push(TransactionLine {
                product_id,
                quantity,
                closed_at,
            });
        }
    }
}
