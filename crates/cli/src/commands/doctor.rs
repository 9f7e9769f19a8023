use courtside_agent::PhotoLocator;
use courtside_core::catalog::Catalog;
use courtside_core::config::{AppConfig, LlmProvider, LoadOptions};
use serde::Serialize;

use super::{escape_json, CommandResult};

const DOCTOR_FAILURE_EXIT: u8 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    run_with(LoadOptions::default(), json_output)
}

pub fn run_with(options: LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(options);
    let exit_code = if report.overall_status == CheckStatus::Fail { DOCTOR_FAILURE_EXIT } else { 0 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_oracle(&config));
            checks.push(check_images(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["oracle_readiness", "image_assets"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let warned = checks.iter().any(|check| check.status == CheckStatus::Warn);
    let (overall_status, summary) = match (failed, warned) {
        (true, _) => (CheckStatus::Fail, "doctor: one or more readiness checks failed"),
        (false, true) => (CheckStatus::Warn, "doctor: ready with warnings"),
        (false, false) => (CheckStatus::Pass, "doctor: all readiness checks passed"),
    };

    DoctorReport { overall_status, summary: summary.to_string(), checks }
}

fn check_oracle(config: &AppConfig) -> DoctorCheck {
    let key_state = match (config.llm.provider, config.llm.api_key.is_some()) {
        (_, true) => "api key configured",
        (LlmProvider::Ollama, false) => "no api key required",
        (LlmProvider::OpenAi, false) => "api key missing",
    };

    DoctorCheck {
        name: "oracle_readiness",
        status: CheckStatus::Pass,
        details: format!(
            "{} model `{}` at {} ({key_state})",
            config.llm.provider.as_str(),
            config.llm.model,
            config.llm.endpoint_base()
        ),
    }
}

/// Missing images degrade to text captions at runtime, so they only warn.
fn check_images(config: &AppConfig) -> DoctorCheck {
    let catalog = Catalog::builtin();
    let photos = PhotoLocator::new(config.assets.image_root.clone());

    let missing: Vec<String> = catalog
        .iter()
        .map(|item| photos.path_for(item))
        .filter(|path| !path.is_file())
        .map(|path| path.display().to_string())
        .collect();

    if missing.is_empty() {
        return DoctorCheck {
            name: "image_assets",
            status: CheckStatus::Pass,
            details: format!("all {} catalog images present", catalog.len()),
        };
    }

    DoctorCheck {
        name: "image_assets",
        status: CheckStatus::Warn,
        details: format!(
            "{} of {} catalog images missing: {}",
            missing.len(),
            catalog.len(),
            missing.join(", ")
        ),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
