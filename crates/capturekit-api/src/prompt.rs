//! Task prompt assembly.
//!
//! Sections, in order: task text, captured markup and DOM path, box metrics
//! and computed styles (CSS capture only), console logs, network activity.

use std::fmt::Write;

use chrono::{DateTime, SecondsFormat, Utc};

use capturekit_protocols::{CapturedElement, CapturedLogRecord, CapturedNetworkRecord};

const TITLE_LIMIT: usize = 80;

/// Everything that goes into one prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub task: &'a str,
    pub element: Option<&'a CapturedElement>,
    pub include_css: bool,
    pub logs: &'a [CapturedLogRecord],
    pub network: &'a [CapturedNetworkRecord],
}

/// First line of the trimmed task, at most 80 characters.
pub fn task_title(task: &str) -> String {
    task.trim()
        .lines()
        .next()
        .unwrap_or_default()
        .chars()
        .take(TITLE_LIMIT)
        .collect()
}

pub fn build_prompt(ctx: &PromptContext<'_>) -> String {
    let mut prompt = ctx.task.trim().to_string();

    if let Some(element) = ctx.element.filter(|e| !e.outer_html.is_empty()) {
        let _ = write!(
            prompt,
            "\n\nThe user has selected the following HTML element:\n```html\n{}\n```",
            element.outer_html
        );
        if !element.selector.is_empty() {
            let _ = write!(
                prompt,
                "\n\nThe element is located at the following DOM Path:\n```css\n{}\n```",
                element.selector
            );
        }
    }

    if ctx.include_css {
        if let Some(element) = ctx.element {
            push_css(&mut prompt, element);
        }
    }

    if !ctx.logs.is_empty() {
        let logs = ctx
            .logs
            .iter()
            .map(|log| format!("[{}] [{}] {}", log.timestamp, log.level, log.message))
            .collect::<Vec<_>>()
            .join("\n");
        let _ = write!(
            prompt,
            "\n\n--- Captured Console Logs ---\n{}\n--- End Logs ---",
            logs
        );
    }

    if !ctx.network.is_empty() {
        let network = ctx
            .network
            .iter()
            .map(format_request)
            .collect::<Vec<_>>()
            .join("\n\n");
        let _ = write!(
            prompt,
            "\n\n--- Captured Network Activity ---\n{}\n--- End Network Activity ---",
            network
        );
    }

    prompt
}

fn push_css(prompt: &mut String, element: &CapturedElement) {
    if let Some(dims) = &element.dimensions {
        let _ = write!(
            prompt,
            "\n\n--- Element Dimensions ---\nWidth: {}px, Height: {}px\nMargin: {}\nPadding: {}\nBorder: {}\n",
            dims.width, dims.height, dims.margin, dims.padding, dims.border
        );
    }

    let Some(css) = &element.computed_css else {
        return;
    };
    let mut formatted = String::new();
    for (state, properties) in css {
        let _ = writeln!(formatted, "/* {} */", state);
        if properties.is_empty() {
            continue;
        }
        formatted.push_str("element {\n");
        for (prop, value) in properties {
            let _ = writeln!(formatted, "  {}: {};", prop, value);
        }
        formatted.push_str("}\n");
    }
    if !formatted.is_empty() {
        let _ = write!(
            prompt,
            "\n\nThe element has the following computed CSS styles:\n```css\n{}\n```",
            formatted.trim()
        );
    }
}

fn format_request(record: &CapturedNetworkRecord) -> String {
    let status = record
        .status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    format!(
        "[{}] {} {} - Status: {}\nResponse Body (truncated):\n{}",
        seconds_to_iso(record.timestamp),
        record.method,
        record.url,
        status,
        record.response_body.as_deref().unwrap_or("N/A")
    )
}

fn seconds_to_iso(seconds: f64) -> String {
    DateTime::<Utc>::from_timestamp_millis((seconds * 1000.0) as i64)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
