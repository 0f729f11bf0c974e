use indicatif::ProgressStyle;
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

const TEMPLATE: &str = "{bar:48.green/bright_black} {pos:>3}/{len:3} {msg}";

/// Script progress, one tick per command. The bar lives as long as the span.
pub struct ScriptProgress {
    span: Span,
}

impl ScriptProgress {
    pub fn start(total: usize) -> Self {
        let span = info_span!("script_progress", "indicatif.pb_show" = tracing::field::Empty);
        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        span.pb_set_style(&style);
        span.pb_set_length(total as u64);
        span.pb_start();
        Self { span }
    }

    pub fn running(&self, command: &str) {
        self.span.pb_set_message(command);
    }

    pub fn advance(&self) {
        self.span.pb_inc(1);
    }
}
