//! Example running pattern detection and relationship mining end to end.
//!
//! Samples arrive as an Arrow record batch, the way an upstream profiler would
//! hand them over. Run with `RUST_LOG=discovery_core=debug` for detail logs.

use std::sync::Arc;

use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType as ArrowDataType, Field, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use discovery_core::logging::setup::{init_logging, LoggingConfig};
use discovery_core::prelude::*;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingConfig::development())?;

    // Transaction samples: steadily growing latency with one spike
    let mut durations: Vec<f64> = (0..48).map(|i| 120.0 + 1.5 * i as f64).collect();
    durations[40] = 900.0;
    let urls: Vec<String> = (0..48)
        .map(|i| format!("https://shop.example.com/checkout/{i}"))
        .collect();

    let batch = RecordBatch::try_new(
        Arc::new(ArrowSchema::new(vec![
            Field::new("duration", ArrowDataType::Float64, false),
            Field::new("request.uri", ArrowDataType::Utf8, false),
        ])),
        vec![
            Arc::new(Float64Array::from(durations)),
            Arc::new(StringArray::from(urls)),
        ],
    )?;

    let engine = PatternEngine::new();
    let columns: Vec<(String, Vec<RawValue>, DataType)> = vec![
        (
            "duration".to_string(),
            RawValue::from_arrow_array(batch.column(0).as_ref()),
            DataType::Numeric,
        ),
        (
            "request.uri".to_string(),
            RawValue::from_arrow_array(batch.column(1).as_ref()),
            DataType::String,
        ),
    ];
    for (attribute, patterns) in engine.detect_attributes(&columns) {
        println!("== {attribute}");
        println!("{}", serde_json::to_string_pretty(&patterns)?);
    }

    let guid = Attribute::new("guid", DataType::String)
        .with_semantic_type(SemanticType::Identifier)
        .with_cardinality(Cardinality::from_counts(48, 48, 0.5));
    let schemas = vec![
        Schema::new("Application").with_attribute(Attribute::new("appName", DataType::String)),
        Schema::new("Transaction")
            .with_attribute(guid)
            .with_attribute(Attribute::new("appName", DataType::String))
            .with_attribute(Attribute::new("timestamp", DataType::Timestamp))
            .with_attribute(Attribute::new("duration", DataType::Numeric)),
        Schema::new("TransactionError")
            .with_attribute(Attribute::new("guid", DataType::String).with_semantic_type(SemanticType::Identifier))
            .with_attribute(Attribute::new("timestamp", DataType::Timestamp))
            .with_attribute(Attribute::new("responseTime", DataType::Numeric)),
        Schema::new("Host").with_attribute(Attribute::new("hostname", DataType::String)),
    ];

    let relationships = RelationshipMiner::new().find_relationships(&schemas).await?;
    println!("{}", serde_json::to_string_pretty(&relationships)?);

    let graph = analyze_with_schemas(&schemas, &relationships);
    println!(
        "{} schemas, {} relationships, hubs {:?}, isolated {:?}, average degree {:.2}",
        graph.node_count, graph.edge_count, graph.hubs, graph.isolated, graph.average_degree
    );

    Ok(())
}
