/// Render progress decoded from the engine's free-text status line.
///
/// Rebuilt on every poll and never carried across polls.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderJobProgress {
    /// Units of work finished (tiles, samples, or tile-samples).
    pub work_done: u64,
    /// Total units of work.
    pub work_total: u64,
    /// Sample currently reported by the engine.
    pub samples_rendered: u32,
    /// Engine finished or stopped.
    pub complete: bool,
    /// Engine is path tracing.
    pub render_in_progress: bool,
    /// Engine stopped because of an error.
    pub errored: bool,
    /// Error text reported by the engine, empty unless `errored`.
    pub error_message: String,
}

const PATH_TRACING: &str = "Path Tracing ";

impl RenderJobProgress {
    /// Decode a status line.
    ///
    /// Recognized forms: `Path Tracing Sample s/S`, `Path Tracing Tile t/T`,
    /// `Path Tracing Tile t/T, Sample s/S`, plus the `Finished`, `Done` and `Cancel` sentinels.
    /// A `Cancel` status that mentions an error marks the job as errored. Anything else
    /// decodes to an idle, incomplete progress.
    pub fn parse(status: &str) -> Self {
        let status = status.trim();
        let mut out = Self::default();

        if status.starts_with("Finished") || status.starts_with("Done") {
            out.complete = true;
            return out;
        }

        if let Some(rest) = status.strip_prefix("Cancel") {
            out.complete = true;
            if status.to_ascii_lowercase().contains("error") {
                out.errored = true;
                let msg = rest.trim_start_matches(|c: char| {
                    c.is_whitespace() || c == '|' || c == ':' || c == '-'
                });
                out.error_message = if msg.is_empty() {
                    status.to_string()
                } else {
                    msg.to_string()
                };
            }
            return out;
        }

        let Some(at) = status.find(PATH_TRACING) else {
            return out;
        };
        let body = &status[at + PATH_TRACING.len()..];

        if let Some(rest) = body.strip_prefix("Sample ")
            && let Some((s, total)) = parse_fraction(rest)
        {
            out.render_in_progress = true;
            out.samples_rendered = u32::try_from(s).unwrap_or(u32::MAX);
            out.work_done = s;
            out.work_total = total;
        } else if let Some(rest) = body.strip_prefix("Tile ")
            && let Some((t, tiles)) = parse_fraction(rest)
        {
            out.render_in_progress = true;
            out.work_done = t;
            out.work_total = tiles;
            if let Some(idx) = rest.find(", Sample ")
                && let Some((s, samples)) = parse_fraction(&rest[idx + ", Sample ".len()..])
            {
                out.samples_rendered = u32::try_from(s).unwrap_or(u32::MAX);
                out.work_done = s.saturating_sub(1).saturating_mul(tiles).saturating_add(t);
                out.work_total = tiles.saturating_mul(samples);
            }
        }
        out
    }

    /// Completed fraction in `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        if self.work_total == 0 {
            return if self.complete { 1.0 } else { 0.0 };
        }
        (self.work_done as f64 / self.work_total as f64).clamp(0.0, 1.0) as f32
    }
}

// Leading `a/b` of `s`; trailing text is ignored.
fn parse_fraction(s: &str) -> Option<(u64, u64)> {
    let (num, rest) = s.split_once('/')?;
    let den: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    Some((num.trim().parse().ok()?, den.parse().ok()?))
}

#[cfg(test)]
#[path = "../../tests/unit/engine/progress.rs"]
mod tests;
