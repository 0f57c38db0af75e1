//! Drug-repurposing workflow core — demo CLI.
//!
//! Drives the orchestrator (`repurpose-orchestrator`) end-to-end against
//! the fixture-backed mocks in `repurpose-mocks`, printing each stage's
//! contribution to the final candidate list and verifying the audit chain
//! the run produced.
//!
//! Usage:
//!   cargo run -p demo -- query "Can metformin be repurposed for breast cancer?"
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- verify-audit

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use repurpose_audit::{verify_partition, FallbackAuditStore, FileAuditStore, InMemoryAuditStore};
use repurpose_domain::safety::SafetySeverity;
use repurpose_domain::workflow::QueryRequest;
use repurpose_graph::InMemoryGraphStore;
use repurpose_mocks::{FixtureLiteratureClient, HeuristicScorer, KeywordNerExtractor, TemplateSynthesizer};
use repurpose_orchestrator::config::CoreConfig;
use repurpose_orchestrator::projection::GraphProjection;
use repurpose_orchestrator::Orchestrator;
use repurpose_repo::{AuditStore, KnowledgeGraphRepository, LiteratureClient, NerExtractor, Scorer, Synthesizer};

const SAMPLE_QUERIES: &[&str] = &[
    "Can metformin be repurposed for breast cancer?",
    "Could aspirin help with colorectal cancer?",
    "Is thalidomide a candidate for multiple myeloma?",
    "What causes breast cancer to metastasize?",
];

#[derive(Parser)]
#[command(
    name = "demo",
    about = "Drug-repurposing workflow core demo",
    long_about = "Runs the six-stage drug-repurposing pipeline against fixture-backed\n\
                  literature, scoring, and synthesis mocks, and prints the resulting\n\
                  ranked candidates, safety verdict, and audit trail.\n\n\
                  The pipeline walk:\n\
                  1. entity_extraction — NER over the raw query\n\
                  2. literature        — search + fetch + rescoring\n\
                  3. pathway_simulation — bounded BFS with confidence propagation\n\
                  4. reasoning         — mechanism paths + candidate synthesis\n\
                  5. ranking           — composite score, min_confidence filter\n\
                  6. safety            — per-candidate + global checks, approval"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one query through the pipeline.
    Query {
        /// Natural-language drug-repurposing question.
        text: String,
    },
    /// Run every sample query in sequence.
    RunAll,
    /// Run a query, then replay and verify its audit partition.
    VerifyAudit,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    print_banner();

    let result = match cli.command {
        Command::Query { text } => run_query(&text).await.map(|_| ()),
        Command::RunAll => run_all().await,
        Command::VerifyAudit => run_verify_audit().await,
    };

    if let Err(e) = result {
        eprintln!("demo error: {e}");
        std::process::exit(1);
    }
}

fn build_orchestrator() -> Orchestrator {
    let config = CoreConfig::from_env().unwrap_or_else(|e| {
        eprintln!("demo: ignoring malformed environment override ({e}), using spec defaults");
        CoreConfig::defaults()
    });

    let graph: Arc<dyn KnowledgeGraphRepository> = Arc::new(InMemoryGraphStore::new());
    // §4.C: primary in-memory store, file-backed fallback at the configured
    // directory — the same pair `FallbackAuditStore` combines in-process.
    let audit: Arc<dyn AuditStore> = Arc::new(FallbackAuditStore::new(InMemoryAuditStore::new(), FileAuditStore::new(config.audit_fallback_dir.clone())));
    let literature: Arc<dyn LiteratureClient> = Arc::new(FixtureLiteratureClient);
    let extractor: Arc<dyn NerExtractor> = Arc::new(KeywordNerExtractor);
    let scorer: Arc<dyn Scorer> = Arc::new(HeuristicScorer);
    let synthesizer: Arc<dyn Synthesizer> = Arc::new(TemplateSynthesizer);
    Orchestrator::with_config(graph, audit, literature, extractor, scorer, synthesizer, config)
}

async fn run_all() -> Result<(), String> {
    for query in SAMPLE_QUERIES {
        run_query(query).await?;
        println!();
    }
    Ok(())
}

async fn run_query(text: &str) -> Result<repurpose_domain::workflow::WorkflowState, String> {
    let orchestrator = build_orchestrator();
    let request = QueryRequest { query: text.to_string(), max_candidates: 10, min_confidence: 0.5, include_experimental: false };
    let request_id = format!("demo-{}", uuid::Uuid::new_v4());

    println!("── query ───────────────────────────────────────────────");
    println!("  {text}");
    println!();

    let state = match orchestrator.run(request, "demo-user".to_string(), request_id.clone()).await {
        Ok(state) => state,
        Err(e) => {
            println!("  pipeline did not complete: {e}");
            return Err(e.to_string());
        }
    };

    println!("  stages run: {}", state.stage_history_names().join(" -> "));

    if let Some(entities) = &state.extracted_entities {
        println!("  entities:");
        for entity in entities {
            println!("    - {} ({:?}, confidence {:.2})", entity.canonical_name, entity.kind, entity.extraction_confidence);
        }
    }

    if let Some(candidates) = &state.final_candidates {
        println!("  candidates:");
        if candidates.is_empty() {
            println!("    (none survived safety)");
        }
        for candidate in candidates {
            println!(
                "    #{:?} {} -> {} | score {:.2} confidence {:.2} | {} citation(s)",
                candidate.rank,
                candidate.drug.canonical_name,
                candidate.disease.canonical_name,
                candidate.overall_score,
                candidate.confidence,
                candidate.citations.len(),
            );
            println!("      hypothesis: {}", candidate.hypothesis);
        }
    }

    if let Some(verdict) = &state.safety_result {
        println!(
            "  safety: passed={} approved={:?} critical={} warning={}",
            verdict.passed,
            state.workflow_approved,
            verdict.flags.iter().filter(|f| f.severity == SafetySeverity::Critical).count(),
            verdict.flags.iter().filter(|f| f.severity == SafetySeverity::Warning).count(),
        );
        for flag in &verdict.flags {
            println!("    [{:?}] {}: {}", flag.severity, flag.kind, flag.message);
        }
    }

    match GraphProjection::build(&state) {
        Ok(projection) if !projection.edges.is_empty() => {
            println!("  graph projection: {} node(s), {} edge(s)", projection.nodes.len(), projection.edges.len());
            for edge in &projection.edges {
                println!("    {} --{}--> {} ({:.2})", edge.source, edge.relation, edge.target, edge.confidence);
            }
        }
        Ok(_) => {}
        Err(e) => println!("  graph projection unavailable: {e}"),
    }

    Ok(state)
}

async fn run_verify_audit() -> Result<(), String> {
    let orchestrator = build_orchestrator();
    let request = QueryRequest {
        query: "Can metformin be repurposed for breast cancer?".to_string(),
        max_candidates: 10,
        min_confidence: 0.5,
        include_experimental: false,
    };
    let request_id = "demo-audit-verify".to_string();

    let _ = orchestrator.run(request, "demo-user".to_string(), request_id.clone()).await.map_err(|e| e.to_string())?;

    println!("── audit verification ──────────────────────────────────");
    let events = orchestrator.audit_store().by_request(&request_id).await.map_err(|e| e.to_string())?;
    println!("  {} event(s) recorded for request {request_id}", events.len());

    let partitions: std::collections::BTreeSet<_> = events.iter().map(|e| e.partition_date).collect();
    for partition in partitions {
        let partition_events = orchestrator.audit_store().range(partition, 0, u64::MAX).await.map_err(|e| e.to_string())?;
        match verify_partition(partition, &partition_events) {
            Ok(()) => println!("  partition {partition}: chain OK ({} events)", partition_events.len()),
            Err(failure) => println!("  partition {partition}: chain BROKEN: {failure:?}"),
        }
    }

    Ok(())
}

fn print_banner() {
    println!();
    println!("Drug-Repurposing Workflow Core");
    println!("===============================");
    println!();
    println!("Pipeline: entity_extraction -> literature -> pathway_simulation -> reasoning -> (ranking?) -> safety");
    println!("Every run ends with a safety verdict and an appended, hash-chained audit event.");
    println!();
}
