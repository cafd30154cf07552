use crate::models::JobRecord;

pub const META_DESCRIPTION_MAX: usize = 160;

const OG_WIDTH: u32 = 1200;
const OG_HEIGHT: u32 = 630;
const OG_TITLE_COLUMNS: usize = 28;
const OG_TITLE_MAX_LINES: usize = 3;

/// Cut to at most `max` characters, ending in "..." when anything was dropped.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One-line summary of the posting, suitable for `<meta name="description">`.
pub fn meta_description(job: &JobRecord) -> String {
    let mut text = format!(
        "{} at {} in {}, {}.",
        job.title, job.organization, job.location, job.country
    );
    if let Some(description) = job.description.as_deref() {
        let description = collapse_whitespace(description);
        if !description.is_empty() {
            text.push(' ');
            text.push_str(&description);
        }
    }
    truncate(&text, META_DESCRIPTION_MAX)
}

pub fn page_title(job: &JobRecord, site_name: &str) -> String {
    format!("{} - {} | {}", job.title, job.organization, site_name)
}

/// Title lines for the OG card: wrapped, capped, last line ellipsized on overflow.
fn og_title_lines(title: &str) -> Vec<String> {
    let mut lines: Vec<String> = textwrap::wrap(title.trim(), OG_TITLE_COLUMNS)
        .into_iter()
        .map(|line| line.into_owned())
        .collect();

    if lines.len() > OG_TITLE_MAX_LINES {
        lines.truncate(OG_TITLE_MAX_LINES);
        if let Some(last) = lines.last_mut() {
            let shortened: String = last.chars().take(OG_TITLE_COLUMNS - 3).collect();
            *last = format!("{}...", shortened.trim_end());
        }
    }
    lines
}

/// Render the Open Graph preview card for a job as an SVG document.
pub fn og_image_svg(job: &JobRecord, site_name: &str) -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
        w = OG_WIDTH,
        h = OG_HEIGHT
    ));
    svg.push_str("  <rect width=\"100%\" height=\"100%\" fill=\"#0f2a44\"/>\n");
    svg.push_str("  <rect x=\"0\" y=\"0\" width=\"16\" height=\"100%\" fill=\"#e4572e\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"80\" y=\"110\" font-family=\"Helvetica, Arial, sans-serif\" font-size=\"32\" fill=\"#9fb3c8\">{}</text>\n",
        escape_xml(site_name)
    ));

    let title_lines = og_title_lines(&job.title);
    svg.push_str(
        "  <text x=\"80\" y=\"230\" font-family=\"Helvetica, Arial, sans-serif\" font-size=\"64\" font-weight=\"bold\" fill=\"#ffffff\">\n",
    );
    for (i, line) in title_lines.iter().enumerate() {
        let dy = if i == 0 { 0 } else { 76 };
        svg.push_str(&format!(
            "    <tspan x=\"80\" dy=\"{}\">{}</tspan>\n",
            dy,
            escape_xml(line)
        ));
    }
    svg.push_str("  </text>\n");

    let details_y = 230 + 76 * title_lines.len() as u32 + 40;
    svg.push_str(&format!(
        "  <text x=\"80\" y=\"{}\" font-family=\"Helvetica, Arial, sans-serif\" font-size=\"36\" fill=\"#ffffff\">{}</text>\n",
        details_y,
        escape_xml(&truncate(&job.organization, 50))
    ));
    svg.push_str(&format!(
        "  <text x=\"80\" y=\"{}\" font-family=\"Helvetica, Arial, sans-serif\" font-size=\"30\" fill=\"#9fb3c8\">{}</text>\n",
        details_y + 50,
        escape_xml(&format!("{}, {}", job.location, job.country))
    ));
    if let Some(sector) = job.sector.as_deref().filter(|s| !s.trim().is_empty()) {
        svg.push_str(&format!(
            "  <text x=\"80\" y=\"580\" font-family=\"Helvetica, Arial, sans-serif\" font-size=\"26\" fill=\"#e4572e\">{}</text>\n",
            escape_xml(sector)
        ));
    }
    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_job;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("eleven chars", 10), "eleven ...");
        assert_eq!(truncate("éééééééééééé", 10), "ééééééé...");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("M&E <Lead> \"x\" 'y'"), "M&amp;E &lt;Lead&gt; &quot;x&quot; &apos;y&apos;");
    }

    #[test]
    fn test_meta_description_includes_summary_and_description() {
        let job = sample_job();
        let text = meta_description(&job);
        assert!(text.starts_with("Senior Program Officer at Médecins Sans Frontières in Nairobi, Kenya."));
        assert!(text.ends_with("Lead program delivery across field sites."));
    }

    #[test]
    fn test_meta_description_is_capped() {
        let mut job = sample_job();
        job.description = Some("word\n\n   ".repeat(100));
        let text = meta_description(&job);
        assert_eq!(text.chars().count(), META_DESCRIPTION_MAX);
        assert!(text.ends_with("..."));
        assert!(!text.contains('\n'));
    }

    #[test]
    fn test_meta_description_without_description() {
        let mut job = sample_job();
        job.description = Some("   ".to_string());
        assert_eq!(
            meta_description(&job),
            "Senior Program Officer at Médecins Sans Frontières in Nairobi, Kenya."
        );
    }

    #[test]
    fn test_page_title() {
        assert_eq!(
            page_title(&sample_job(), "AidBoard"),
            "Senior Program Officer - Médecins Sans Frontières | AidBoard"
        );
    }

    #[test]
    fn test_og_title_lines_wrap_and_cap() {
        let lines = og_title_lines("Senior Program Officer");
        assert_eq!(lines, vec!["Senior Program Officer"]);

        let long = "Regional Emergency Preparedness and Response Coordinator for the Eastern and Southern Africa Region";
        let lines = og_title_lines(long);
        assert_eq!(lines.len(), OG_TITLE_MAX_LINES);
        assert!(lines.last().unwrap().ends_with("..."));
        assert!(lines.iter().all(|l| l.chars().count() <= OG_TITLE_COLUMNS));
    }

    #[test]
    fn test_og_image_svg_escapes_text() {
        let mut job = sample_job();
        job.title = "Cash & Voucher <Lead>".to_string();
        let svg = og_image_svg(&job, "Aid & Jobs");
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"1200\" height=\"630\""));
        assert!(svg.contains("Cash &amp; Voucher &lt;Lead&gt;"));
        assert!(svg.contains(">Aid &amp; Jobs</text>"));
        assert!(svg.contains("Nairobi, Kenya"));
        assert!(svg.contains(">Health</text>"));
        assert!(!svg.contains("<Lead>"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
