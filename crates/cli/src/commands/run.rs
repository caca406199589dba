//! `agentloop run`: Run a scenario against the configured model.
//!
//! Demo mode uses the scenario's hardcoded payload and prints a transcript.
//! Eval mode reads the initial state from stdin and prints the final state
//! as a single JSON document.

use std::io::Read;
use std::sync::Arc;

use agentloop_agent::{AgentLoop, CancellationToken, ExecutionMode};
use agentloop_config::AppConfig;
use agentloop_core::message::{Conversation, Role};
use agentloop_core::provider::ModelInvoker;
use agentloop_providers::OpenAiCompatInvoker;
use agentloop_tools::{
    EcommerceScenario, FinancialServicesScenario, HealthcareScenario, MathScenario, RunStatus, Scenario,
    ScenarioInput, ScenarioOutput, SocScenario, SupplyChainScenario, WeatherScenario,
};
use anyhow::{Context, bail};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::ScenarioName;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub eval: bool,
    pub max_rounds: Option<u32>,
    pub concurrent: bool,
}

pub async fn run(scenario: ScenarioName, options: RunOptions) -> anyhow::Result<()> {
    match scenario {
        ScenarioName::Math => run_scenario::<MathScenario>(options).await,
        ScenarioName::Ecommerce => run_scenario::<EcommerceScenario>(options).await,
        ScenarioName::Soc => run_scenario::<SocScenario>(options).await,
        ScenarioName::Weather => run_scenario::<WeatherScenario>(options).await,
        ScenarioName::FinancialServices => run_scenario::<FinancialServicesScenario>(options).await,
        ScenarioName::Healthcare => run_scenario::<HealthcareScenario>(options).await,
        ScenarioName::SupplyChain => run_scenario::<SupplyChainScenario>(options).await,
    }
}

async fn run_scenario<S: Scenario>(options: RunOptions) -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    let invoker = OpenAiCompatInvoker::from_config(&config).with_context(|| {
        format!(
            "cannot reach the model; set AGENTLOOP_API_KEY or OPENAI_API_KEY, or add api_key to {}",
            AppConfig::config_dir().join("config.toml").display()
        )
    })?;

    let input = if options.eval {
        read_input::<S::Context>(std::io::stdin().lock())?
    } else {
        S::demo()
    };

    let agent = build_loop::<S>(Arc::new(invoker), &config, options)?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling conversation");
            trigger.cancel();
        }
    });

    info!(scenario = S::NAME, eval = options.eval, "Running scenario");
    let output = execute::<S>(&agent, input, &cancel).await;

    if options.eval {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print!("{}", render_transcript(&output));
    }

    match (output.status, output.error) {
        (RunStatus::Failed, Some(error)) => bail!("conversation failed: {error}"),
        _ => Ok(()),
    }
}

/// Build the loop for scenario `S` from configuration and CLI options.
/// Command-line options win over the config file.
pub fn build_loop<S: Scenario>(
    invoker: Arc<dyn ModelInvoker>,
    config: &AppConfig,
    options: RunOptions,
) -> anyhow::Result<AgentLoop<S::Context>> {
    let registry = S::registry().with_context(|| format!("failed to build {} tools", S::NAME))?;
    let prompt: fn(&S::Context) -> String = S::system_prompt;

    let mut agent = AgentLoop::new(invoker, Arc::new(registry), prompt, config.model.clone())
        .with_temperature(config.temperature);

    if let Some(max_tokens) = config.max_tokens {
        agent = agent.with_max_tokens(max_tokens);
    }
    if let Some(max_rounds) = options.max_rounds.or(config.agent.max_rounds) {
        agent = agent.with_max_rounds(max_rounds);
    }
    if options.concurrent || config.agent.concurrent_tools {
        agent = agent.with_execution_mode(ExecutionMode::Concurrent);
    }
    Ok(agent)
}

/// Run one conversation and package its final state.
pub async fn execute<S: Scenario>(
    agent: &AgentLoop<S::Context>,
    input: ScenarioInput<S::Context>,
    cancel: &CancellationToken,
) -> ScenarioOutput<S::Context> {
    let ScenarioInput { context, messages } = input;
    let mut conversation = Conversation::new();
    for message in messages {
        conversation.push(message);
    }

    let result = agent.run_with_cancel(&mut conversation, &context, cancel).await;

    let mut output = ScenarioOutput {
        context,
        messages: conversation.messages,
        status: RunStatus::Done,
        answer: None,
        rounds: 0,
        budget_exhausted: false,
        error: None,
    };
    match result {
        Ok(completion) => {
            output.answer = Some(completion.answer);
            output.rounds = completion.rounds;
            output.budget_exhausted = completion.budget_exhausted;
        }
        Err(e) => {
            output.status = RunStatus::Failed;
            output.error = Some(e.to_string());
        }
    }
    output
}

/// Parse an eval document. A missing context falls back to `C::default()`.
pub fn read_input<C: DeserializeOwned + Default>(reader: impl Read) -> anyhow::Result<ScenarioInput<C>> {
    serde_json::from_reader(reader).context("failed to parse scenario input from stdin")
}

pub fn render_transcript<C>(output: &ScenarioOutput<C>) -> String {
    let mut out = String::from("Final Messages:\n");
    for msg in &output.messages {
        if msg.role == Role::System {
            continue;
        }
        out.push_str(&format!("[{}]: {}\n", msg.role, msg.content));
        for inv in &msg.tool_invocations {
            out.push_str(&format!("  (Tool Call: {} args={})\n", inv.name, inv.arguments));
        }
    }
    if output.budget_exhausted {
        out.push_str("(stopped: round budget exhausted)\n");
    }
    out
}
