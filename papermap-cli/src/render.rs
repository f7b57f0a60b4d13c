//! Plain-text and JSON renderers for view output.

use std::io::{self, Write};

use papermap_core::view::{CatalogOutput, KeywordMapOutput, RenderOutput, Renderer};
use serde_json::json;
use unicode_width::UnicodeWidthStr;

/// Widest bar drawn for a keyword leaf.
const BAR_WIDTH: usize = 24;

/// Pad `text` with spaces to `width` display columns.
fn pad(text: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(text);
    format!("{text}{}", " ".repeat(width.saturating_sub(used)))
}

/// Writes human-readable output. The first write error is kept and reported
/// by [`TextRenderer::finish`].
pub struct TextRenderer<W: Write> {
    out: W,
    width: usize,
    error: Option<io::Error>,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W, width: usize) -> Self {
        Self {
            out,
            width,
            error: None,
        }
    }

    pub fn finish(self) -> io::Result<W> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.out),
        }
    }

    fn catalog(&mut self, output: &CatalogOutput) -> io::Result<()> {
        if let Some(notice) = &output.session_notice {
            writeln!(self.out, "Papers in {notice}")?;
            writeln!(self.out)?;
        }

        for card in &output.cards {
            let marker = if card.read { "✓ " } else { "" };
            for line in textwrap::wrap(&format!("{marker}{}", card.title), self.width) {
                writeln!(self.out, "{line}")?;
            }
            let indent = textwrap::Options::new(self.width)
                .initial_indent("  ")
                .subsequent_indent("  ");
            for line in textwrap::wrap(&card.authors.join(", "), &indent) {
                writeln!(self.out, "{line}")?;
            }
            if !card.track.is_empty() {
                writeln!(self.out, "  [{}] {}", card.track, card.id)?;
            }
            if !card.keywords.is_empty() {
                for line in textwrap::wrap(&card.keywords.join(" · "), &indent) {
                    writeln!(self.out, "{line}")?;
                }
            }
            for session in &card.sessions {
                writeln!(self.out, "  {session}")?;
            }
            writeln!(self.out)?;
        }

        writeln!(self.out, "{} of {} papers", output.cards.len(), output.total)
    }

    fn keyword_map(&mut self, output: &KeywordMapOutput) -> io::Result<()> {
        let max_value = output
            .tree
            .leaves()
            .map(|(_, leaf)| leaf.value)
            .max()
            .unwrap_or(0);
        let name_width = output
            .tree
            .leaves()
            .map(|(_, leaf)| UnicodeWidthStr::width(leaf.name.as_str()))
            .max()
            .unwrap_or(0)
            .min(self.width / 2);

        for track in &output.tree.children {
            writeln!(self.out, "{} ({})", track.name, track.value())?;
            for leaf in &track.children {
                let highlighted = output
                    .highlighted
                    .as_ref()
                    .is_some_and(|key| key.track == track.name && key.keyword == leaf.name);
                let marker = if highlighted { '>' } else { ' ' };
                let bar = "█".repeat((leaf.value * BAR_WIDTH).div_ceil(max_value.max(1)));
                writeln!(
                    self.out,
                    " {marker} {} {bar} {}",
                    pad(&leaf.name, name_width),
                    leaf.value
                )?;
            }
            writeln!(self.out)?;
        }

        if !output.highlighted_ids.is_empty() {
            writeln!(
                self.out,
                "{} papers carry this keyword",
                output.highlighted_ids.len()
            )?;
        }
        if !output.track_highlight.is_empty() {
            writeln!(
                self.out,
                "{} papers in the selected track",
                output.track_highlight.len()
            )?;
        }
        if !output.selected_ids.is_empty() {
            writeln!(self.out, "{} papers match the filters", output.selected_ids.len())?;
        }

        for summary in &output.list {
            let line = format!("{} — {}", summary.title, summary.authors.join(", "));
            for (i, wrapped) in textwrap::wrap(&line, self.width.saturating_sub(4))
                .into_iter()
                .enumerate()
            {
                let bullet = if i == 0 { "  • " } else { "    " };
                writeln!(self.out, "{bullet}{wrapped}")?;
            }
        }
        Ok(())
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, output: &RenderOutput) {
        if self.error.is_some() {
            return;
        }
        let result = match output {
            RenderOutput::Catalog(out) => self.catalog(out),
            RenderOutput::KeywordMap(out) => self.keyword_map(out),
        };
        if let Err(e) = result {
            self.error = Some(e);
        }
    }
}

/// Keeps only the most recent output, for callers that draw once at the end.
#[derive(Debug, Default)]
pub struct LatestFrame(Option<RenderOutput>);

impl LatestFrame {
    pub fn into_inner(self) -> Option<RenderOutput> {
        self.0
    }
}

impl Renderer for LatestFrame {
    fn render(&mut self, output: &RenderOutput) {
        self.0 = Some(output.clone());
    }
}

/// Writes one JSON document per rendered output.
pub struct JsonRenderer<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    pub fn finish(self) -> io::Result<W> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.out),
        }
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render(&mut self, output: &RenderOutput) {
        if self.error.is_some() {
            return;
        }
        let value = match output {
            RenderOutput::Catalog(out) => json!({
                "cards": out.cards,
                "total": out.total,
                "session_notice": out.session_notice,
            }),
            RenderOutput::KeywordMap(out) => json!({
                "tree": out.tree,
                "frame": out.frame,
                "extent": out.extent,
                "highlighted": out.highlighted,
                "highlighted_ids": out.highlighted_ids,
                "selected_ids": out.selected_ids,
                "track_highlight": out.track_highlight,
                "list": out.list,
            }),
        };
        let result = serde_json::to_writer_pretty(&mut self.out, &value)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(self.out));
        if let Err(e) = result {
            self.error = Some(e);
        }
    }
}
