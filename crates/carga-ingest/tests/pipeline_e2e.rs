//! End-to-end pipeline tests over real files, using an in-memory sink in
//! place of PostgreSQL.

use anyhow::Result;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

use carga_ingest::pipeline::{self, BlockSink, Buyer, PipelineConfig};

#[derive(Default)]
struct CollectingSink {
    rows: Mutex<Vec<Buyer>>,
}

#[async_trait]
impl BlockSink for CollectingSink {
    async fn write_block(&self, buyers: &[Buyer]) -> Result<u64> {
        self.rows.lock().unwrap().extend_from_slice(buyers);
        Ok(buyers.len() as u64)
    }
}

async fn load_file(contents: &str, config: &PipelineConfig) -> (pipeline::RunSummary, Vec<Buyer>) {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();

    let opened = tokio::fs::File::open(file.path()).await.unwrap();
    let reader = tokio::io::BufReader::new(opened);

    let sink = Arc::new(CollectingSink::default());
    let summary = pipeline::run(reader, Arc::clone(&sink), config).await.unwrap();

    let rows = sink.rows.lock().unwrap().clone();
    (summary, rows)
}

#[tokio::test]
async fn loads_a_mixed_file() {
    let contents = "\
CPF,PRIVATE,INCOMPLETO,DATA_ULTIMA_COMPRA,TICKET_MEDIO,TICKET_ULTIMA_COMPRA,LOJA_MAIS_FREQUENTE,LOJA_ULTIMA_COMPRA
52998224725,1,0,NULL,10,5,50000000000000,60000000000000
529.982.247-25,0,1,2011-10-17,NULL,NULL,NULL,NULL
11111111111,1,0,NULL,10,5,50000000000000,60000000000000
garbage line
";
    let config = PipelineConfig {
        workers: 3,
        max_block_size: 2,
        queue_capacity: 2,
    };
    let (summary, mut rows) = load_file(contents, &config).await;

    assert_eq!(summary.lines_read, 4);
    assert_eq!(summary.rows_inserted, 2);
    assert_eq!(summary.lines_skipped.invalid_cpf, 1);
    assert_eq!(summary.lines_skipped.malformed_lines, 1);
    assert_eq!(summary.blocks_failed, 0);

    rows.sort_by(|a, b| a.private.cmp(&b.private));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].cpf, "52998224725");
    assert_eq!(rows[1].cpf, "52998224725");
}

#[tokio::test]
async fn committed_row_with_expected_field_values() {
    let contents = "\
header
52998224725,1,0,NULL,10,5,50000000000000,60000000000000
";
    let (summary, rows) = load_file(contents, &PipelineConfig::default()).await;

    assert_eq!(summary.rows_inserted, 1);
    let buyer = &rows[0];
    assert!(buyer.private);
    assert!(!buyer.incomplete);
    assert_eq!(buyer.last_purchase, None);
    assert_eq!(buyer.avg_ticket, Some(BigDecimal::from(10)));
    assert_eq!(buyer.last_ticket, Some(BigDecimal::from(5)));
    assert_eq!(buyer.most_frequent_store, "50000000000000");
    assert_eq!(buyer.last_purchase_store, "60000000000000");
}

#[tokio::test]
async fn worker_count_does_not_change_the_committed_row_set() {
    let mut contents = String::from("header\n");
    for i in 0..50 {
        // Alternate valid and invalid lines.
        if i % 2 == 0 {
            contents.push_str("52998224725,1,0,NULL,10,5,50000000000000,60000000000000\n");
        } else {
            contents.push_str("52998224700,1,0,NULL,10,5,50000000000000,60000000000000\n");
        }
    }

    let mut row_sets = Vec::new();
    for workers in [1, 4] {
        let config = PipelineConfig {
            workers,
            max_block_size: 7,
            queue_capacity: 3,
        };
        let (summary, mut rows) = load_file(&contents, &config).await;

        assert_eq!(summary.lines_read, 50);
        assert_eq!(summary.rows_inserted, 25);
        assert_eq!(summary.lines_skipped.invalid_cpf, 25);

        rows.sort_by(|a, b| a.cpf.cmp(&b.cpf));
        row_sets.push(rows);
    }
    assert_eq!(row_sets[0], row_sets[1]);
}
