use std::path::PathBuf;

use balloonbot_core::config::{bot_token_shape_is_valid, AppConfig};
use secrecy::ExposeSecret;
use serde::Serialize;

use super::{escape_json, load_options, CommandResult, EXIT_CONFIG_FAILURE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
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

pub fn run(config_path: Option<PathBuf>, json_output: bool) -> CommandResult {
    let report = build_report(config_path);
    let exit_code =
        if report.overall_status == CheckStatus::Pass { 0 } else { EXIT_CONFIG_FAILURE };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\
                 \"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(config_path: Option<PathBuf>) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load_unvalidated(load_options(config_path)) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_load",
                status: CheckStatus::Pass,
                details: "file and environment layers parsed".to_string(),
            });
            checks.push(check_bot_token(&config));
            checks.push(check_validation(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_load",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["bot_token_readiness", "config_validation"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_bot_token(config: &AppConfig) -> DoctorCheck {
    let token = config.telegram.bot_token.expose_secret().trim();
    let (status, details) = if token.is_empty() {
        (CheckStatus::Fail, "no bot token configured (set TELEGRAM_BOT_TOKEN)".to_string())
    } else if bot_token_shape_is_valid(token) {
        (CheckStatus::Pass, "token has the `<bot id>:<secret>` shape".to_string())
    } else {
        (CheckStatus::Fail, "token does not look like `<bot id>:<secret>`".to_string())
    };

    DoctorCheck { name: "bot_token_readiness", status, details }
}

fn check_validation(config: &AppConfig) -> DoctorCheck {
    match config.validate() {
        Ok(()) => DoctorCheck {
            name: "config_validation",
            status: CheckStatus::Pass,
            details: format!(
                "membership gate on {}, long-poll timeout {}s",
                config.telegram.required_channel, config.telegram.poll_timeout_secs
            ),
        },
        Err(error) => DoctorCheck {
            name: "config_validation",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
