//! Typed result of an action: data plus render directives.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::http::response::ResponseHead;

/// What an action hands back to the render pipeline.
///
/// `view` and `layout` are logical names without their `views/` and
/// `layout/` prefixes. With neither set the response body is empty.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    data: Value,
    view: Option<String>,
    layout: Option<String>,
    layout_vars: Map<String, Value>,
    head: ResponseHead,
}

impl Outcome {
    /// An outcome that renders nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Carry `data` as the view's render input.
    pub fn new(data: Value) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Serialize `data` into the view's render input.
    pub fn from_serialize<T: Serialize>(data: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::to_value(data)?))
    }

    pub fn view(mut self, name: impl Into<String>) -> Self {
        self.view = Some(name.into());
        self
    }

    pub fn layout(mut self, name: impl Into<String>) -> Self {
        self.layout = Some(name.into());
        self
    }

    /// Extra variable for the layout. `content` is reserved for the
    /// rendered view and is overwritten.
    pub fn layout_var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.layout_vars.insert(key.into(), value.into());
        self
    }

    pub fn layout_vars(mut self, vars: Map<String, Value>) -> Self {
        self.layout_vars = vars;
        self
    }

    /// Respond with `302 Found` and a `Location` header.
    pub fn redirect(mut self, url: &str) -> Self {
        self.head.redirect(url);
        self
    }

    pub fn head_mut(&mut self) -> &mut ResponseHead {
        &mut self.head
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn view_name(&self) -> Option<&str> {
        self.view.as_deref()
    }

    pub fn layout_name(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    pub(crate) fn into_parts(self) -> OutcomeParts {
        OutcomeParts {
            data: self.data,
            view: self.view,
            layout: self.layout,
            layout_vars: self.layout_vars,
            head: self.head,
        }
    }
}

pub(crate) struct OutcomeParts {
    pub data: Value,
    pub view: Option<String>,
    pub layout: Option<String>,
    pub layout_vars: Map<String, Value>,
    pub head: ResponseHead,
}
