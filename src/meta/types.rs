use serde::{Deserialize, Serialize};

use crate::filter::FilterDirection;

/// Semantic type a handler argument is coerced to after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    /// Passed through untouched
    Json,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Json => "json",
        };
        f.write_str(s)
    }
}

/// Marks a method as a route handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteAnnotation {
    /// Path pattern relative to the controller base path (`/items/:id`)
    pub path: String,
    /// HTTP verb, `GET` when omitted
    #[serde(default = "default_verb")]
    pub method: String,
}

fn default_verb() -> String {
    "GET".to_string()
}

/// Marks a method as a before or after filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterAnnotation {
    pub direction: FilterDirection,
    #[serde(default)]
    pub priority: i32,
}

/// Declares the authentication a controller or method requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthAnnotation {
    /// One of `BASIC`, `JWT`, `API_TOKEN`, `REDIRECT` (validated at compile time)
    pub method: String,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

impl AuthAnnotation {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            redirect_url: None,
        }
    }

    pub fn redirect(target: impl Into<String>) -> Self {
        Self {
            method: "REDIRECT".to_string(),
            redirect_url: Some(target.into()),
        }
    }
}

/// A declared handler parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub name: String,
    /// Resolver kind tag (`path`, `query`, `header`, `body`, `context`, ...)
    pub kind: String,
    #[serde(default, rename = "type")]
    pub value_type: ValueType,
    #[serde(default)]
    pub required: bool,
}

impl ParamDescriptor {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            value_type: ValueType::String,
            required: false,
        }
    }

    pub fn typed(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A method declared on a controller, with its annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    #[serde(default)]
    pub route: Option<RouteAnnotation>,
    #[serde(default)]
    pub filter: Option<FilterAnnotation>,
    #[serde(default)]
    pub auth: Option<AuthAnnotation>,
    #[serde(default)]
    pub params: Vec<ParamDescriptor>,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            route: None,
            filter: None,
            auth: None,
            params: Vec::new(),
        }
    }

    pub fn route(mut self, verb: &str, path: impl Into<String>) -> Self {
        self.route = Some(RouteAnnotation {
            path: path.into(),
            method: verb.to_string(),
        });
        self
    }

    pub fn before_filter(mut self, priority: i32) -> Self {
        self.filter = Some(FilterAnnotation {
            direction: FilterDirection::Before,
            priority,
        });
        self
    }

    pub fn after_filter(mut self, priority: i32) -> Self {
        self.filter = Some(FilterAnnotation {
            direction: FilterDirection::After,
            priority,
        });
        self
    }

    pub fn auth(mut self, auth: AuthAnnotation) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn param(mut self, param: ParamDescriptor) -> Self {
        self.params.push(param);
        self
    }
}

/// Everything the compiler needs to know about one controller type.
///
/// Controllers without a `base_path` are abstract bases: they contribute
/// filters, processors and auth to subclasses but produce no routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerDescriptor {
    pub name: String,
    #[serde(default)]
    pub base_path: Option<String>,
    /// Superclass name; the chain ends at `None` or [`ROOT_CONTROLLER`](super::ROOT_CONTROLLER)
    #[serde(default)]
    pub extends: Option<String>,
    /// Class-level annotation types, in declaration order
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub auth: Option<AuthAnnotation>,
    /// Declared methods, in declaration order
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
}

impl ControllerDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_path: None,
            extends: None,
            annotations: Vec::new(),
            auth: None,
            methods: Vec::new(),
        }
    }

    pub fn base_path(mut self, path: impl Into<String>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    pub fn annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    pub fn auth(mut self, auth: AuthAnnotation) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    /// `true` when the controller produces routes.
    #[must_use]
    pub fn is_routable(&self) -> bool {
        self.base_path.is_some()
    }
}
