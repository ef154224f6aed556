use std::io::IsTerminal;
use std::sync::Arc;

use ai_llm_service::{LlmServiceProfiles, error_handler::process_env, telemetry};
use anyhow::Context;
use api::{ApiConfig, AppState};
use conversation_log::ConversationLog;
use profile_corpus::{ProfileRecord, build_documents};
use rag_store::{
    IndexingOptions, IndicatifProgress, NoopProgress, Progress, RagConfig, Retriever, build_embedder,
    build_index, index_corpus,
};
use responder::{LanguageModel, Responder, ResponderConfig, chat_model};
use tracing::{Level, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; variables may come from the environment.
    let dotenv = dotenvy::dotenv();

    telemetry::init("info", Level::DEBUG).context("installing tracing subscriber")?;
    if let Err(e) = dotenv {
        info!(reason = %e, ".env not loaded");
    }

    let profile = ProfileRecord::from_env().context("loading profile")?;
    let corpus = build_documents(&profile);
    info!(name = %profile.name, chunks = corpus.len(), "profile corpus built");

    let rag_cfg = RagConfig::from_env().context("reading retrieval configuration")?;
    let responder_cfg = ResponderConfig::from_env()
        .context("reading responder configuration")?
        .with_persona(&profile.name, &profile.title);

    let profiles = LlmServiceProfiles::from_lookup(&process_env)
        .map(Arc::new)
        .map_err(|e| e.to_string());
    let embedder = build_embedder(profiles.clone(), &rag_cfg);
    let model = profiles.as_ref().ok().and_then(chat_model);
    match &model {
        Some(m) => info!(model = %m.name(), mode = ?responder_cfg.mode, "chat model configured"),
        None => warn!("no chat model configured; answers will be rule-based"),
    }

    let index = build_index(&rag_cfg).context("building vector index")?;
    let indexing = IndexingOptions::from(&rag_cfg);
    let retriever = Retriever::new(index, embedder, rag_cfg);

    if process_env("INIT_ON_STARTUP").is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1") {
        let progress: Box<dyn Progress> = if std::io::stderr().is_terminal() {
            Box::new(IndicatifProgress::bar(corpus.len() as u64))
        } else {
            Box::new(NoopProgress)
        };
        match index_corpus(
            retriever.index().as_ref(),
            retriever.embedder().as_ref(),
            corpus.clone(),
            &indexing,
            progress.as_ref(),
        )
        .await
        {
            Ok(report) => info!(indexed = report.indexed, count = report.count, "{}", report.message),
            Err(e) => warn!(error = %e, "startup indexing failed; call POST /api/initialize once fixed"),
        }
    }

    let responder = Responder::new(retriever, model, Arc::new(ConversationLog::new()), responder_cfg);
    let state = Arc::new(AppState::new(responder, corpus, indexing, profiles.ok()));

    api::start(&ApiConfig::from_env(), state).await?;

    Ok(())
}
