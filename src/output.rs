use crate::pipeline::PipelineReport;
use crate::summary::StructuredSummary;

/// Render the summary as plain text for terminal reading.
pub fn render_text(report: &PipelineReport) -> String {
    let s = &report.summary;
    let mut out = String::new();

    out.push_str(&format!("TAKEAWAY: {}\n", s.quick_takeaway));
    if s.fallback_source {
        out.push_str("(extractive fallback: generated summary was unavailable)\n");
    }

    out.push_str("\nKEY POINTS:\n");
    for point in &s.key_points {
        out.push_str(&format!("  - {point}\n"));
    }

    if !s.topics.is_empty() {
        out.push_str("\nTOPICS:\n");
        for topic in &s.topics {
            out.push_str(&format!("  - {}: {}\n", topic.name, topic.body));
        }
    }

    if !s.timestamps.is_empty() {
        out.push_str("\nMOMENTS:\n");
        for moment in &s.timestamps {
            out.push_str(&format!("  [{}] {}\n", moment.time, moment.description));
        }
    }

    out.push_str("\nSUMMARY:\n");
    for paragraph in &s.full_summary {
        out.push_str(&format!("\n{}\n", paragraph.content));
    }

    push_indepth_text(&mut out, s);

    out
}

fn push_indepth_text(out: &mut String, s: &StructuredSummary) {
    if let Some(analyses) = &s.detailed_analysis {
        out.push_str("\nDETAILED ANALYSIS:\n");
        for a in analyses {
            out.push_str(&format!("\n{}\n{}\n", a.topic, a.analysis));
        }
    }
    if let Some(quotes) = &s.key_quotes {
        out.push_str("\nKEY QUOTES:\n");
        for q in quotes {
            out.push_str(&format!("  \"{}\"", q.quote));
            if !q.speaker.is_empty() {
                out.push_str(&format!(" -- {}", q.speaker));
            }
            out.push('\n');
            if !q.context.is_empty() {
                out.push_str(&format!("    ({})\n", q.context));
            }
        }
    }
    if let Some(arguments) = &s.arguments {
        out.push_str("\nARGUMENTS:\n");
        for arg in arguments {
            out.push_str(&format!("  Claim: {}\n", arg.claim));
            if !arg.evidence.is_empty() {
                out.push_str(&format!("  Evidence: {}\n", arg.evidence));
            }
            if !arg.counterpoint.is_empty() {
                out.push_str(&format!("  Counterpoint: {}\n", arg.counterpoint));
            }
            out.push('\n');
        }
    }
}

/// Render the summary as Markdown.
pub fn render_markdown(report: &PipelineReport) -> String {
    let s = &report.summary;
    let mut out = String::new();

    out.push_str(&format!("# Summary: {}\n\n", report.video.canonical_url));
    out.push_str(&format!("> {}\n\n", s.quick_takeaway));
    if s.fallback_source {
        out.push_str("_Extractive fallback: a generated summary was unavailable._\n\n");
    }

    out.push_str("## Key Points\n\n");
    for point in &s.key_points {
        out.push_str(&format!("- {point}\n"));
    }

    if !s.topics.is_empty() {
        out.push_str("\n## Topics\n\n");
        for topic in &s.topics {
            out.push_str(&format!("- **{}**: {}\n", topic.name, topic.body));
        }
    }

    if !s.timestamps.is_empty() {
        out.push_str("\n## Moments\n\n");
        for moment in &s.timestamps {
            out.push_str(&format!("- `{}` {}\n", moment.time, moment.description));
        }
    }

    out.push_str("\n## Full Summary\n");
    for paragraph in &s.full_summary {
        out.push_str(&format!("\n{}\n", paragraph.content));
    }

    if let Some(analyses) = &s.detailed_analysis {
        out.push_str("\n## Detailed Analysis\n");
        for a in analyses {
            out.push_str(&format!("\n### {}\n\n{}\n", a.topic, a.analysis));
        }
    }
    if let Some(quotes) = &s.key_quotes {
        out.push_str("\n## Key Quotes\n\n");
        for q in quotes {
            out.push_str(&format!("> {}\n", q.quote));
            if !q.speaker.is_empty() || !q.context.is_empty() {
                out.push_str(format!(">\n> -- {} {}", q.speaker, q.context).trim_end());
                out.push('\n');
            }
            out.push('\n');
        }
    }
    if let Some(arguments) = &s.arguments {
        out.push_str("\n## Arguments\n\n");
        for arg in arguments {
            out.push_str(&format!("- **Claim:** {}\n", arg.claim));
            if !arg.evidence.is_empty() {
                out.push_str(&format!("  - Evidence: {}\n", arg.evidence));
            }
            if !arg.counterpoint.is_empty() {
                out.push_str(&format!("  - Counterpoint: {}\n", arg.counterpoint));
            }
        }
    }

    out
}

/// Render the summary as its canonical JSON document, with request context.
pub fn render_json(report: &PipelineReport) -> String {
    let doc = serde_json::json!({
        "video_id": report.video.video_id,
        "url": report.video.canonical_url,
        "mode": report.mode,
        "summary": report.summary,
    });
    serde_json::to_string_pretty(&doc).unwrap_or_else(|_| "{}".to_string())
}
