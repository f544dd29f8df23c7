//! Terminal rendering for stories and quality reports.

use colored::Colorize;

use storyloops_core::{PipelineResult, PipelineSettings};
use storyloops_judge::ScoreRecord;

pub const DISPLAY_WIDTH: usize = 70;
const SEPARATOR_CHAR: char = '=';

fn separator() -> String {
    SEPARATOR_CHAR.to_string().repeat(DISPLAY_WIDTH)
}

fn centered(text: &str) -> String {
    format!("{:^width$}", text, width = DISPLAY_WIDTH)
}

fn banner(title: &str) {
    println!("{}", separator().dimmed());
    println!("{}", centered(title).bold());
    println!("{}", separator().dimmed());
}

pub fn print_header(settings: &PipelineSettings) {
    println!();
    println!("{}", separator().dimmed());
    println!("{}", centered("BEDTIME STORY GENERATOR").bold().cyan());
    println!(
        "{}",
        centered(&format!(
            "Stories for children ages {}",
            settings.default_age_range
        ))
    );
    println!("{}", separator().dimmed());
    println!();
}

pub fn print_story(story: &str) {
    println!();
    banner("YOUR BEDTIME STORY");
    println!();
    println!("{}", story);
    println!();
}

/// Score table for a finished run
pub fn print_quality_report(result: &PipelineResult) {
    let score = result.score();

    banner("STORY QUALITY REPORT");
    println!();
    for (label, value) in score_rows(score) {
        println!("{:<22}{}", format!("{}:", label), colored_score(value));
    }
    println!();
    println!("{:<22}{}", "Refinement Rounds:", result.refinement_rounds());
    println!();

    if !score.strengths().is_empty() {
        println!("{}", "Strengths:".green().bold());
        println!("  {}", score.strengths());
        println!();
    }

    println!("{}", result.improvement_summary().dimmed());
    println!();
}

fn score_rows(score: &ScoreRecord) -> [(&'static str, u8); 6] {
    let s = score.scores();
    [
        ("Overall Score", s.overall_score),
        ("Age Appropriateness", s.age_appropriateness),
        ("Clarity", s.clarity),
        ("Engagement", s.engagement),
        ("Emotional Tone", s.emotional_tone),
        ("Story Structure", s.story_structure),
    ]
}

fn colored_score(value: u8) -> colored::ColoredString {
    let text = format!("{}/10", value);
    match value {
        8..=10 => text.green(),
        6..=7 => text.yellow(),
        _ => text.red(),
    }
}

pub fn print_dry_run(settings: &PipelineSettings, prompt: Option<&str>, model: &str) {
    println!("=== Dry Run ===");
    match prompt {
        Some(p) if p.chars().count() > 100 => {
            println!("Prompt: {}...", p.chars().take(100).collect::<String>())
        }
        Some(p) => println!("Prompt: {}", p),
        None => println!("Prompt: (interactive)"),
    }
    println!("Model: {}", model);
    println!("Age range: {}", settings.default_age_range);
    println!("Threshold: {}/10", settings.threshold);
    println!("Max refinement rounds: {}", settings.max_rounds);
    println!(
        "Story sampling: temperature {}, {} tokens",
        settings.story_params.temperature, settings.story_params.max_tokens
    );
    println!(
        "Judge sampling: temperature {}, {} tokens",
        settings.judge_params.temperature, settings.judge_params.max_tokens
    );
}
