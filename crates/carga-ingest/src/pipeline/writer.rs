//! Transactional batch writer
//!
//! Persists the validated records of one block as a single multi-row
//! parameterized INSERT inside one transaction. Identifier and store fields
//! originate from untrusted input, so every value is bound as a statement
//! parameter; nothing is ever string-interpolated into the SQL text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, warn};

use super::types::Buyer;

/// Destination for the validated records of one block.
///
/// The production implementation is [`BatchWriter`]; tests substitute
/// in-memory sinks to exercise the orchestrator without PostgreSQL.
#[async_trait]
pub trait BlockSink: Send + Sync {
    /// Persist all records of one block atomically, returning the number of
    /// rows actually inserted. An error means the whole block was rolled
    /// back; no partial row-level retry is attempted.
    async fn write_block(&self, buyers: &[Buyer]) -> Result<u64>;
}

/// PostgreSQL batch writer for the `pessoas` relation
pub struct BatchWriter {
    pool: PgPool,
}

impl BatchWriter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlockSink for BatchWriter {
    async fn write_block(&self, buyers: &[Buyer]) -> Result<u64> {
        // A block whose lines were all rejected inserts nothing; skip the
        // transaction entirely.
        if buyers.is_empty() {
            debug!("Block has no valid records, skipping transaction");
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin block transaction")?;

        let mut query = build_insert(buyers);
        let executed = query.build().execute(&mut *tx).await;

        match executed {
            Ok(done) => {
                tx.commit()
                    .await
                    .context("Failed to commit block transaction")?;
                debug!(
                    records = buyers.len(),
                    rows_inserted = done.rows_affected(),
                    "Block committed"
                );
                Ok(done.rows_affected())
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback after failed block insert also failed");
                }
                Err(e).context("Failed to insert block")
            }
        }
    }
}

/// Build the multi-row INSERT for one block.
///
/// Column order is fixed: cpf, private, incompleto, data_ultima_compra,
/// ticket_medio, ticket_ultima_compra, loja_mais_frequente,
/// loja_ultima_compra. Duplicate primary identifiers are resolved
/// first-write-wins via `ON CONFLICT DO NOTHING`, which keeps the committed
/// row count independent of block interleaving across workers.
fn build_insert(buyers: &[Buyer]) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(
        "INSERT INTO pessoas (cpf, private, incompleto, data_ultima_compra, \
         ticket_medio, ticket_ultima_compra, loja_mais_frequente, loja_ultima_compra) ",
    );

    builder.push_values(buyers, |mut row, buyer| {
        row.push_bind(buyer.cpf.as_str())
            .push_bind(buyer.private)
            .push_bind(buyer.incomplete)
            .push_bind(buyer.last_purchase)
            .push_bind(buyer.avg_ticket.as_ref())
            .push_bind(buyer.last_ticket.as_ref())
            .push_bind(buyer.most_frequent_store.as_str())
            .push_bind(buyer.last_purchase_store.as_str());
    });

    builder.push(" ON CONFLICT (cpf) DO NOTHING");
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::sanitize::parse_line;

    fn sample_buyers(n: usize) -> Vec<Buyer> {
        let line = "52998224725,1,0,2011-10-17,495,30,50000000000000,60000000000000";
        (0..n).map(|_| parse_line(line).unwrap()).collect()
    }

    #[test]
    fn insert_covers_all_rows_with_bound_parameters() {
        let buyers = sample_buyers(3);
        let sql = build_insert(&buyers).into_sql();

        assert!(sql.starts_with(
            "INSERT INTO pessoas (cpf, private, incompleto, data_ultima_compra, \
             ticket_medio, ticket_ultima_compra, loja_mais_frequente, loja_ultima_compra)"
        ));
        // 3 rows x 8 columns = 24 placeholders
        assert!(sql.contains("$24"));
        assert!(!sql.contains("$25"));
        assert!(sql.ends_with("ON CONFLICT (cpf) DO NOTHING"));
    }

    #[test]
    fn insert_never_interpolates_values() {
        let buyers = sample_buyers(1);
        let sql = build_insert(&buyers).into_sql();

        assert!(!sql.contains("52998224725"));
        assert!(!sql.contains("50000000000000"));
    }
}
