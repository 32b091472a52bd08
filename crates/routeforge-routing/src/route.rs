//! The route entity.
//!
//! A [`Route`] describes one routable endpoint: a path template, a unique
//! name, the HTTP methods it answers, and opaque references to its handler and
//! middleware. Routes are assembled with consuming builder methods and then
//! compiled exactly once, after which they are never mutated.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use routeforge_core::{RouterError, RouterResult};

use crate::snapshot::RouteRecord;
use crate::urls::compiler::{self, CompiledPath};

/// An HTTP method token.
///
/// The declaration order is the iteration order used for every per-method
/// table, so results that probe several methods are deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Connect,
    Trace,
}

impl Method {
    /// Every method, in table iteration order.
    pub const ALL: [Self; 9] = [
        Self::Get,
        Self::Head,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Options,
        Self::Connect,
        Self::Trace,
    ];

    /// Returns the upper-case wire token for this method.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Connect => "CONNECT",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RouterError::ConfigurationError(format!("Unknown HTTP method: {s}")))
    }
}

/// The pipeline stage a middleware entry is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiddlewareStage {
    Matched,
    Dispatched,
    SendingResponse,
    Terminated,
    ThrowableCaught,
}

/// An opaque reference to a handler or middleware.
///
/// The routing core never interprets it; it is carried through matching and
/// caching untouched so the dispatch layer can resolve it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerRef(String);

impl HandlerRef {
    /// Creates a handler reference.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Returns the reference text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HandlerRef {
    fn from(reference: &str) -> Self {
        Self::new(reference)
    }
}

impl From<String> for HandlerRef {
    fn from(reference: String) -> Self {
        Self(reference)
    }
}

/// One parameter of a dynamic path, in capture-group order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// The parameter name (also the regex capture group name).
    pub name: String,
    /// The regex body the parameter must match.
    pub constraint: String,
    /// Whether the segment may be absent.
    pub optional: bool,
}

/// A routable endpoint.
///
/// # Examples
///
/// ```
/// use routeforge_routing::route::{Method, MiddlewareStage, Route};
///
/// let route = Route::new("/users/{id:\\d+}", "user.show")
///     .method(Method::Get)
///     .method(Method::Head)
///     .middleware(MiddlewareStage::Matched, "auth")
///     .target("UserController::show");
///
/// assert_eq!(route.methods(), &[Method::Get, Method::Head]);
/// assert!(!route.is_static());
/// ```
#[derive(Debug, Clone)]
pub struct Route {
    path: String,
    name: String,
    methods: Vec<Method>,
    secure: bool,
    middleware: BTreeMap<MiddlewareStage, Vec<HandlerRef>>,
    target: Option<HandlerRef>,
    compiled: Option<CompiledPath>,
    trailing_slash: bool,
}

impl Route {
    /// Creates a route for `path` named `name`.
    ///
    /// A route given no method answers `GET` once compiled.
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            methods: Vec::new(),
            secure: false,
            middleware: BTreeMap::new(),
            target: None,
            compiled: None,
            trailing_slash: false,
        }
    }

    /// Creates a `GET` route.
    pub fn get(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(path, name).method(Method::Get)
    }

    /// Creates a `POST` route.
    pub fn post(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(path, name).method(Method::Post)
    }

    /// Creates a `PUT` route.
    pub fn put(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(path, name).method(Method::Put)
    }

    /// Creates a `PATCH` route.
    pub fn patch(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(path, name).method(Method::Patch)
    }

    /// Creates a `DELETE` route.
    pub fn delete(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(path, name).method(Method::Delete)
    }

    /// Adds a method. Repeated methods are ignored.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    /// Adds several methods, keeping first-seen order.
    #[must_use]
    pub fn with_methods(self, methods: impl IntoIterator<Item = Method>) -> Self {
        methods.into_iter().fold(self, Self::method)
    }

    /// Marks the route as secure, so generated URLs use `https`.
    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Appends a middleware reference to the given stage.
    #[must_use]
    pub fn middleware(mut self, stage: MiddlewareStage, handler: impl Into<HandlerRef>) -> Self {
        self.middleware.entry(stage).or_default().push(handler.into());
        self
    }

    /// Sets the dispatch target.
    #[must_use]
    pub fn target(mut self, handler: impl Into<HandlerRef>) -> Self {
        self.target = Some(handler.into());
        self
    }

    /// Compiles the path template, filling the derived fields.
    ///
    /// `trailing_slash` selects the normalization applied to the template
    /// before compilation and must match the one used for matching. A route
    /// already compiled under the same policy is returned unchanged; one
    /// compiled under the other policy is recompiled from its template.
    pub fn compile(mut self, trailing_slash: bool) -> RouterResult<Self> {
        if self.compiled_trailing_slash() == Some(trailing_slash) {
            return Ok(self);
        }
        if self.path.is_empty() {
            return Err(RouterError::invalid_path("", "path is empty"));
        }
        if self.methods.is_empty() {
            self.methods.push(Method::Get);
        }
        let normalized = compiler::normalize_path(&self.path, trailing_slash);
        let compiled = compiler::compile(&normalized).map_err(|err| match err {
            // Report the template as written, not its normalized form.
            RouterError::InvalidRoutePath { reason, .. } => {
                RouterError::invalid_path(&self.path, reason)
            }
            other => other,
        })?;
        self.compiled = Some(compiled);
        self.trailing_slash = trailing_slash;
        Ok(self)
    }

    /// Returns the path template as registered.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the unique route name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the methods this route answers.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Returns `true` if the route answers `method`.
    pub fn allows(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }

    /// Returns whether generated URLs for this route use `https`.
    pub const fn is_secure(&self) -> bool {
        self.secure
    }

    /// Returns the middleware attached to `stage`, in registration order.
    pub fn middleware_for(&self, stage: MiddlewareStage) -> &[HandlerRef] {
        self.middleware.get(&stage).map_or(&[], Vec::as_slice)
    }

    /// Returns the middleware of every stage.
    pub const fn middleware_stages(&self) -> &BTreeMap<MiddlewareStage, Vec<HandlerRef>> {
        &self.middleware
    }

    /// Returns the dispatch target, if set.
    pub const fn dispatch_target(&self) -> Option<&HandlerRef> {
        self.target.as_ref()
    }

    /// Returns `true` once the derived fields have been computed.
    pub const fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    /// Returns the trailing-slash policy the route was compiled under.
    pub const fn compiled_trailing_slash(&self) -> Option<bool> {
        if self.compiled.is_some() {
            Some(self.trailing_slash)
        } else {
            None
        }
    }

    /// Returns `true` if the path has no placeholders.
    pub fn is_static(&self) -> bool {
        self.compiled
            .as_ref()
            .map_or_else(|| !self.path.contains('{'), CompiledPath::is_static)
    }

    /// Returns the compiled path, once compiled.
    pub const fn compiled(&self) -> Option<&CompiledPath> {
        self.compiled.as_ref()
    }

    /// Returns the anchored regex of a compiled dynamic route.
    pub fn regex(&self) -> Option<&regex::Regex> {
        self.compiled.as_ref().and_then(CompiledPath::regex)
    }

    /// Returns the parameter specs of a compiled route.
    pub fn parameters(&self) -> &[ParamSpec] {
        self.compiled.as_ref().map_or(&[], CompiledPath::parameters)
    }

    /// Flattens the route into its serializable snapshot record.
    ///
    /// An uncompiled route is recorded as if compiled without trailing slashes.
    pub fn to_record(&self) -> RouterResult<RouteRecord> {
        let route = if self.is_compiled() {
            std::borrow::Cow::Borrowed(self)
        } else {
            std::borrow::Cow::Owned(self.clone().compile(false)?)
        };
        Ok(RouteRecord {
            path: route.path.clone(),
            name: route.name.clone(),
            methods: route.methods.clone(),
            secure: route.secure,
            middleware: route.middleware.clone(),
            target: route.target.clone(),
            is_static: route.is_static(),
            regex: route.regex().map(|regex| regex.as_str().to_string()),
            parameters: route.parameters().to_vec(),
        })
    }

    /// Rebuilds a compiled route from a snapshot record.
    ///
    /// The stored regex source is handed straight to the regex engine; the
    /// path template is not recompiled. `trailing_slash` is the policy the
    /// record was compiled under.
    pub fn from_record(record: RouteRecord, trailing_slash: bool) -> RouterResult<Self> {
        let compiled = CompiledPath::from_parts(record.regex.as_deref(), record.parameters)
            .map_err(|reason| {
                RouterError::CacheLoad(format!("route '{}': {reason}", record.name))
            })?;
        if compiled.is_static() != record.is_static {
            return Err(RouterError::CacheLoad(format!(
                "route '{}': static flag disagrees with stored regex",
                record.name
            )));
        }
        if record.methods.is_empty() {
            return Err(RouterError::CacheLoad(format!(
                "route '{}': no methods recorded",
                record.name
            )));
        }

        Ok(Self {
            path: record.path,
            name: record.name,
            methods: record.methods,
            secure: record.secure,
            middleware: record.middleware,
            target: record.target,
            compiled: Some(compiled),
            trailing_slash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse_and_display() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!(" DELETE ".parse::<Method>().unwrap(), Method::Delete);
        assert_eq!(Method::Options.to_string(), "OPTIONS");
        assert!("FETCH".parse::<Method>().is_err());
    }

    #[test]
    fn test_method_serde_tokens() {
        let json = serde_json::to_string(&Method::Patch).unwrap();
        assert_eq!(json, "\"PATCH\"");
        let back: Method = serde_json::from_str("\"TRACE\"").unwrap();
        assert_eq!(back, Method::Trace);
    }

    #[test]
    fn test_builder_dedupes_methods() {
        let route = Route::new("/a", "a").with_methods([Method::Post, Method::Get, Method::Post]);
        assert_eq!(route.methods(), &[Method::Post, Method::Get]);
    }

    #[test]
    fn test_compile_defaults_to_get() {
        let route = Route::new("/a", "a").compile(false).unwrap();
        assert_eq!(route.methods(), &[Method::Get]);
        assert!(route.allows(Method::Get));
        assert!(!route.allows(Method::Post));
    }

    #[test]
    fn test_static_route_has_no_regex() {
        let route = Route::get("/version", "version").compile(false).unwrap();
        assert!(route.is_compiled());
        assert!(route.is_static());
        assert!(route.regex().is_none());
        assert!(route.parameters().is_empty());
    }

    #[test]
    fn test_dynamic_route_derived_fields() {
        let route = Route::get("/users/{id:\\d+}", "user.show").compile(false).unwrap();
        assert!(!route.is_static());
        assert_eq!(route.regex().unwrap().as_str(), r"^/users/(?P<id>\d+)$");
        assert_eq!(route.parameters().len(), 1);
        assert_eq!(route.parameters()[0].name, "id");
    }

    #[test]
    fn test_compile_error_reports_template_as_written() {
        let err = Route::get("/users/{id/", "bad").compile(false).unwrap_err();
        match err {
            RouterError::InvalidRoutePath { path, .. } => assert_eq!(path, "/users/{id/"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_middleware_and_target_pass_through() {
        let route = Route::get("/", "home")
            .middleware(MiddlewareStage::Matched, "auth")
            .middleware(MiddlewareStage::Matched, "csrf")
            .middleware(MiddlewareStage::Terminated, "log")
            .target("HomeController::index")
            .secure(true);

        assert_eq!(
            route.middleware_for(MiddlewareStage::Matched),
            &[HandlerRef::new("auth"), HandlerRef::new("csrf")]
        );
        assert!(route.middleware_for(MiddlewareStage::Dispatched).is_empty());
        assert_eq!(route.dispatch_target().unwrap().as_str(), "HomeController::index");
        assert!(route.is_secure());
    }

    #[test]
    fn test_record_roundtrip_keeps_derived_fields() {
        let route = Route::get("/posts/{slug}/{page?}", "post.show")
            .middleware(MiddlewareStage::ThrowableCaught, "report")
            .compile(true)
            .unwrap();
        let record = route.to_record().unwrap();
        assert!(!record.is_static);
        assert_eq!(record.parameters.len(), 2);

        let back = Route::from_record(record, true).unwrap();
        assert_eq!(back.compiled_trailing_slash(), Some(true));
        assert_eq!(back.regex().unwrap().as_str(), route.regex().unwrap().as_str());
        assert_eq!(back.parameters(), route.parameters());
        assert_eq!(
            back.middleware_for(MiddlewareStage::ThrowableCaught),
            &[HandlerRef::new("report")]
        );
    }

    #[test]
    fn test_compile_under_other_policy_recompiles() {
        let route = Route::get("/about", "about").compile(true).unwrap();
        assert_eq!(route.compiled_trailing_slash(), Some(true));

        let route = route.compile(false).unwrap();
        assert_eq!(route.compiled_trailing_slash(), Some(false));
        assert!(route.is_static());

        let route = Route::get("/team/{member}", "team").compile(true).unwrap();
        let trailing = route.regex().unwrap().as_str().to_string();
        let route = route.compile(false).unwrap();
        assert_ne!(route.regex().unwrap().as_str(), trailing);
        assert!(route.regex().unwrap().is_match("/team/ada"));
        assert!(Route::get("/x", "x").compiled_trailing_slash().is_none());
    }

    #[test]
    fn test_from_record_rejects_inconsistent_static_flag() {
        let mut record = Route::get("/a/{b}", "a").compile(false).unwrap().to_record().unwrap();
        record.is_static = true;
        assert!(matches!(
            Route::from_record(record, false),
            Err(RouterError::CacheLoad(_))
        ));
    }

    #[test]
    fn test_from_record_rejects_bad_regex() {
        let mut record = Route::get("/a/{b}", "a").compile(false).unwrap().to_record().unwrap();
        record.regex = Some("^(unclosed$".to_string());
        assert!(matches!(
            Route::from_record(record, false),
            Err(RouterError::CacheLoad(_))
        ));
    }
}
