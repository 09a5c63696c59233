use crate::dom::Dom;
use crate::transport::Transport;

pub const DEFAULT_PATH: &str = "svg/icons.svg";

/// Loads an SVG sprite and mounts it, hidden, at the end of `<body>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icons {
    path: String,
}

impl Icons {
    /// Starts the request for `path` (or [`DEFAULT_PATH`]). The sprite is
    /// mounted when the transport completes; failures are logged and nothing
    /// is mounted.
    pub fn load<D: Dom>(dom: &D, transport: &dyn Transport, path: Option<&str>) -> Self {
        let path = path.filter(|p| !p.is_empty()).unwrap_or(DEFAULT_PATH);
        let dom = dom.clone();
        let requested = path.to_string();
        transport.get_text(
            path,
            Box::new(move |result| match result {
                Ok(svg) => mount(&dom, &svg),
                Err(err) => log::error!("Failed to load icons from {requested}: {err}"),
            }),
        );
        Self {
            path: path.to_string(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

fn mount<D: Dom>(dom: &D, svg: &str) {
    let (Some(body), Some(sprite)) = (dom.body(), dom.create_element("div")) else {
        return;
    };
    dom.set_inner_html(&sprite, svg);
    dom.set_attribute(&sprite, "aria-hidden", "true");
    dom.set_attribute(&sprite, "style", "display: none;");
    dom.append_child(&body, &sprite);
}
