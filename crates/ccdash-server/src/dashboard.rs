//! The browser dashboard served at `/`.

const DASHBOARD_HTML: &str = include_str!("../assets/dashboard.html");

/// Static HTML page that subscribes to `/api/events` and renders one card
/// per session.
pub fn render_dashboard_document() -> &'static str {
    DASHBOARD_HTML
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_a_full_html_document() {
        let html = render_dashboard_document();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn listens_for_every_frame_label() {
        let html = render_dashboard_document();
        assert!(html.contains("new EventSource('/api/events')"));
        for label in ["'init'", "'update'", "'shutdown'", "'restart'"] {
            assert!(html.contains(label), "missing listener for {label}");
        }
    }

    #[test]
    fn probes_snapshot_endpoint_before_reconnecting() {
        assert!(render_dashboard_document().contains("/api/sessions"));
    }
}
