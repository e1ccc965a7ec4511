//! Logging bootstrap and run summary publishers.

mod logging;
mod publishers;

pub use logging::setup_logging;
pub use publishers::{render_html, HtmlReportPublisher, LogSummaryPublisher};
