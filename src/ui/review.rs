use crate::review::{ReviewIssue, ReviewResult, UnstagedSuggestion};
use colored::*;

fn issue_block(issue: &ReviewIssue, index: usize) -> String {
    let location = issue.location().unwrap_or_else(|| "General".to_string());
    let mut lines = vec![
        format!("{}. {}", index, location.bold()),
        format!("   {}", issue.message),
    ];
    if let Some(suggestion) = &issue.suggestion {
        lines.push(format!("   → {}", suggestion.dimmed()));
    }
    lines.join("\n")
}

fn issues_section(issues: &[ReviewIssue], label: ColoredString) -> String {
    let blocks: Vec<String> = issues
        .iter()
        .enumerate()
        .map(|(i, issue)| issue_block(issue, i + 1))
        .collect();
    format!("\n{}\n\n{}", label, blocks.join("\n\n"))
}

fn suggestions_section(suggestions: &[UnstagedSuggestion]) -> String {
    let mut lines = vec![format!("\n{}\n", "📁 Related unstaged files to consider:".cyan())];
    for suggestion in suggestions {
        lines.push(format!("  • {}", suggestion.file));
        lines.push(format!("    {}", suggestion.reason));
    }
    lines.join("\n")
}

/// 리뷰 결과를 터미널 출력용 문자열로 변환
pub fn render_review(result: &ReviewResult) -> String {
    let mut sections = Vec::new();

    if result.has_blocking() {
        sections.push(issues_section(
            &result.blocking,
            "❌ Blocking issues (must fix before commit):".red().bold(),
        ));
    }
    if result.has_warnings() {
        sections.push(issues_section(
            &result.warnings,
            "⚠️  Warnings (consider fixing):".yellow().bold(),
        ));
    }
    if result.has_unstaged_suggestions() {
        sections.push(suggestions_section(&result.unstaged_suggestions));
    }

    if result.is_clean() {
        if result.has_unstaged_suggestions() {
            sections.push(format!("\n{}", "✅ No code issues found".green()));
        } else {
            sections.push(format!("{}", "✅ No issues found in review".green()));
        }
    }

    sections.join("\n")
}
