//! Decoding of a response log through a format template

mod context;
mod render;

pub use context::{DecodeContext, ErrorInfo};
pub use render::{center_text, render_all, render_line, RenderOptions, DEFAULT_BANNER_WIDTH};

use log::{info, warn};

use crate::apdu::ResponseLog;

/// Decode a raw log with a raw template in a single pass
pub fn decode(log_text: &str, template: &str, options: &RenderOptions) -> String {
    let log = ResponseLog::parse(log_text);
    if log.is_empty() {
        warn!("Log has no 'Response:' section with In/Out lines");
    } else {
        info!(
            "Decoding {} exchanges ({} commands / {} responses)",
            log.len(),
            log.inputs.len(),
            log.outputs.len()
        );
    }

    let mut ctx = DecodeContext::new(&log, options.debug);
    render_all(template, &mut ctx, options.banner_width)
}
