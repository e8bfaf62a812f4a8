/// Page rendering boundary
///
/// HTML pages are produced by a front end this crate does not own. Handlers
/// only decide which component to show and with which props, then hand a
/// [`Page`] to a [`PageRenderer`].
///
/// The default [`JsonPageRenderer`] answers with the page object itself,
/// the shape a single-page-app bootstrapper consumes:
///
/// ```json
/// { "component": "tasks/ShowTask", "props": { "task_id": "..." }, "url": "/tasks/..." }
/// ```

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

/// A page to render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// Front-end component name
    pub component: String,

    /// Component props
    pub props: Value,

    /// Path the page was requested at
    pub url: String,
}

impl Page {
    /// Page with no props
    pub fn new(component: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            props: Value::Object(Map::new()),
            url: url.into(),
        }
    }

    /// Adds one prop
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        if let Value::Object(props) = &mut self.props {
            props.insert(key.to_string(), value);
        }
        self
    }
}

/// Turns a [`Page`] into a response
pub trait PageRenderer: Send + Sync {
    fn render(&self, page: Page) -> Response;
}

/// Renders pages as JSON page objects
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPageRenderer;

impl PageRenderer for JsonPageRenderer {
    fn render(&self, page: Page) -> Response {
        tracing::debug!(component = %page.component, url = %page.url, "Rendering page");
        Json(page).into_response()
    }
}
