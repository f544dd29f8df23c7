use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Why a story is being written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryKind {
    /// First draft from the request alone
    Initial,
    /// Rewrite driven by the judge's improvements
    Refinement,
    /// Rewrite driven by listener feedback
    UserFeedback,
}

/// Structured log events for the generate/judge/refine pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    PipelineStarted {
        request: String,
        age_range: String,
        threshold: u8,
        max_rounds: usize,
    },
    StoryStarted {
        round: usize,
        kind: StoryKind,
    },
    StoryCompleted {
        round: usize,
        chars: usize,
        duration_secs: f64,
    },
    JudgeStarted {
        round: usize,
    },
    JudgeCompleted {
        round: usize,
        overall_score: u8,
        acceptable: bool,
        decision: String,
    },
    RefinementStarted {
        round: usize,
        feedback: String,
    },
    ThresholdMet {
        rounds: usize,
        overall_score: u8,
        duration_secs: f64,
    },
    MaxRoundsReached {
        rounds: usize,
        overall_score: u8,
    },
    ErrorEncountered {
        round: usize,
        error: String,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors and visual structure
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logger for pipeline events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    quiet: bool,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            quiet: false,
            file_writer: None,
        }
    }

    /// A logger that writes nothing to the console
    pub fn silent() -> Self {
        Self {
            format: LogFormat::Compact,
            quiet: true,
            file_writer: None,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            quiet: false,
            file_writer: Some(Mutex::new(file)),
        })
    }

    /// Stop echoing events to the console; file output is unaffected
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    pub fn log(&self, event: &LogEvent) {
        // Log to file if configured (always JSON format for file)
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        if self.quiet {
            return;
        }

        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::PipelineStarted {
                request,
                age_range,
                threshold,
                max_rounds,
            } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╭─────────────────────────────────────────────────────────────────────╮"
                        .bright_blue()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {}{}",
                    "│".bright_blue(),
                    "storyloops".bold().bright_white(),
                    " ".repeat(57) + &"│".bright_blue().to_string()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Request:".dimmed(),
                    Self::truncate_with_padding(request, 55, 59).dimmed()
                );
                let settings = format!(
                    "ages {}, threshold {}/10, up to {} refinement(s)",
                    age_range, threshold, max_rounds
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Plan:".dimmed(),
                    Self::truncate_with_padding(&settings, 58, 62).dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╰─────────────────────────────────────────────────────────────────────╯"
                        .bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::StoryStarted { round, kind } => {
                let round_text = match kind {
                    StoryKind::Initial => "─ First draft ".to_string(),
                    StoryKind::Refinement => format!("─ Refinement {} ", round),
                    StoryKind::UserFeedback => "─ Your changes ".to_string(),
                };
                let padding = "─".repeat(67usize.saturating_sub(round_text.chars().count()));
                let _ = writeln!(
                    stderr,
                    "{}{}{}",
                    "┌".bright_blue(),
                    round_text.bright_blue().bold(),
                    padding.bright_blue()
                );
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "▶".bright_cyan(),
                    "STORYTELLER".bright_cyan().bold()
                );
            }
            LogEvent::StoryCompleted {
                chars,
                duration_secs,
                ..
            } => {
                let _ = writeln!(
                    stderr,
                    "    {} {} characters ({:.1}s)",
                    "✓".bright_green(),
                    chars,
                    duration_secs
                );
                let _ = writeln!(stderr);
            }
            LogEvent::JudgeStarted { .. } => {
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "▶".bright_magenta(),
                    "JUDGE".bright_magenta().bold()
                );
            }
            LogEvent::JudgeCompleted {
                acceptable,
                decision,
                ..
            } => {
                let styled_decision = if *acceptable {
                    format!("✓ Verdict: {}", decision).bright_green().to_string()
                } else {
                    format!("→ Verdict: {}", decision).bright_yellow().to_string()
                };
                let _ = writeln!(stderr, "    {}", styled_decision);
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{}",
                    "└─────────────────────────────────────────────────────────────────────┘"
                        .bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::RefinementStarted { feedback, .. } => {
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "Feedback:".dimmed(),
                    Self::truncate(feedback, 200).dimmed()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::ThresholdMet { .. } => {
                // Final report is printed by the CLI
            }
            LogEvent::MaxRoundsReached {
                rounds,
                overall_score,
            } => {
                let _ = writeln!(
                    stderr,
                    "{} Maximum refinement rounds reached ({}), keeping the last story ({}/10)",
                    "⚠".bright_yellow(),
                    rounds,
                    overall_score
                );
            }
            LogEvent::ErrorEncountered { round, error } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{} Error in round {}: {}",
                    "✗".bright_red(),
                    round,
                    error.bright_red()
                );
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::PipelineStarted { .. } => format!("[{}] pipeline:start", timestamp),
            LogEvent::StoryStarted { round, kind } => {
                let kind = match kind {
                    StoryKind::Initial => "initial",
                    StoryKind::Refinement => "refine",
                    StoryKind::UserFeedback => "feedback",
                };
                format!("[{}] story:start:{} {}", timestamp, round, kind)
            }
            LogEvent::StoryCompleted {
                round,
                chars,
                duration_secs,
            } => format!(
                "[{}] story:done:{} {}c {:.1}s",
                timestamp, round, chars, duration_secs
            ),
            LogEvent::JudgeStarted { round } => format!("[{}] judge:start:{}", timestamp, round),
            LogEvent::JudgeCompleted {
                round, decision, ..
            } => format!("[{}] judge:done:{} {}", timestamp, round, decision),
            LogEvent::RefinementStarted { round, .. } => {
                format!("[{}] refine:{}", timestamp, round)
            }
            LogEvent::ThresholdMet {
                rounds,
                overall_score,
                duration_secs,
            } => format!(
                "[{}] pipeline:done:{} {}/10 {:.1}s",
                timestamp, rounds, overall_score, duration_secs
            ),
            LogEvent::MaxRoundsReached {
                rounds,
                overall_score,
            } => format!("[{}] pipeline:limit:{} {}/10", timestamp, rounds, overall_score),
            LogEvent::ErrorEncountered { round, error } => {
                format!("[{}] error:{}:{}", timestamp, round, error)
            }
        };
        let _ = writeln!(stderr, "{}", msg);
    }

    fn truncate(s: &str, max_chars: usize) -> String {
        if s.chars().count() > max_chars {
            let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
            format!("{}...", head)
        } else {
            s.to_string()
        }
    }

    /// Truncate a string and pad to exact width
    fn truncate_with_padding(s: &str, max_len: usize, total_width: usize) -> String {
        let truncated = Self::truncate(s, max_len);
        let padding_needed = total_width.saturating_sub(truncated.chars().count() + 1); // +1 for trailing │
        format!("{}{}│", truncated, " ".repeat(padding_needed))
    }
}
