//! Reverse URL generation.
//!
//! [`UrlGenerator`] turns a route name plus parameter values back into a URL
//! by substituting the values into the route's template. It also answers
//! whether an arbitrary URI points at a route of this application.

use std::collections::HashMap;
use std::hash::BuildHasher;

use url::Url;

use routeforge_core::{RouterError, RouterResult, Settings};

use crate::urls::collection::Collection;
use crate::urls::compiler::{self, Segment};
use crate::urls::matcher::Matcher;

/// Generation policy shared by every URL a generator produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlOptions {
    /// Host (optionally `host:port`) used for absolute URLs.
    pub host: String,
    /// Whether every generated URL is absolute.
    pub always_absolute: bool,
    /// Whether generated paths end in `/`.
    pub trailing_slash: bool,
}

impl UrlOptions {
    /// Reads the generation policy from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            host: settings.host.clone(),
            always_absolute: settings.always_absolute,
            trailing_slash: settings.trailing_slash,
        }
    }
}

/// Generates URLs for named routes of a [`Collection`].
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
///
/// use routeforge_routing::route::Route;
/// use routeforge_routing::urls::collection::Collection;
/// use routeforge_routing::urls::reverse::{UrlGenerator, UrlOptions};
///
/// let mut routes = Collection::new();
/// routes.add(Route::get("/login", "login").secure(true)).unwrap();
///
/// let options = UrlOptions { host: "example.com".to_string(), ..UrlOptions::default() };
/// let urls = UrlGenerator::new(&routes, options);
/// let url = urls.url("login", &HashMap::<&str, &str>::new(), false).unwrap();
/// assert_eq!(url, "https://example.com/login");
/// ```
#[derive(Debug, Clone)]
pub struct UrlGenerator<'a> {
    routes: &'a Collection,
    options: UrlOptions,
}

impl<'a> UrlGenerator<'a> {
    /// Creates a generator over `routes`.
    pub const fn new(routes: &'a Collection, options: UrlOptions) -> Self {
        Self { routes, options }
    }

    /// Returns the generation policy.
    pub const fn options(&self) -> &UrlOptions {
        &self.options
    }

    /// Generates the URL of the route named `name`.
    ///
    /// Each placeholder is replaced by the value `data` holds for its name.
    /// Values are inserted as given, without percent-encoding. A required
    /// placeholder with no value stays in the output verbatim; an optional
    /// one is dropped together with the `/` before it. Keys naming no
    /// placeholder are ignored.
    ///
    /// The URL is absolute when `absolute` is set, when the options say
    /// `always_absolute`, or when the route is secure. Secure routes use
    /// `https`, all others `http`.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidRouteName`] for an unknown name and
    /// [`RouterError::ConfigurationError`] if an absolute URL is needed but no
    /// host is configured.
    pub fn url<S: BuildHasher>(
        &self,
        name: &str,
        data: &HashMap<&str, &str, S>,
        absolute: bool,
    ) -> RouterResult<String> {
        let route = self.routes.get_by_name(name)?;
        let mut path = substitute(route.path(), data)?;
        if self.options.trailing_slash && !path.ends_with('/') {
            path.push('/');
        }

        if !(absolute || self.options.always_absolute || route.is_secure()) {
            return Ok(path);
        }
        if self.options.host.is_empty() {
            return Err(RouterError::ConfigurationError(format!(
                "cannot build an absolute URL for '{name}': no host configured"
            )));
        }
        let scheme = if route.is_secure() { "https" } else { "http" };
        Ok(format!("{scheme}://{}{path}", self.options.host))
    }

    /// Generates the URL of `name`, relative unless the route or the options
    /// force it absolute.
    pub fn path<S: BuildHasher>(
        &self,
        name: &str,
        data: &HashMap<&str, &str, S>,
    ) -> RouterResult<String> {
        self.url(name, data, false)
    }

    /// Returns `true` if `uri` resolves to a route of this collection.
    ///
    /// `uri` may be absolute (`scheme://host/path`), protocol-relative
    /// (`//host/path`), or a bare path. When it names a host, that host must
    /// equal `request_host` (ASCII case-insensitively, with the scheme's
    /// default port implied when either side omits it).
    /// Query and fragment are ignored. The path is then matched under any
    /// method.
    pub fn is_internal_uri(&self, uri: &str, request_host: &str) -> bool {
        let Some((authority, path)) = split_uri(uri) else {
            return false;
        };
        if let Some(url) = authority {
            if !same_host(&url, request_host) {
                return false;
            }
        }
        Matcher::new(self.routes).match_path(&path, None).is_some()
    }
}

/// Substitutes `data` into a path template.
fn substitute<S: BuildHasher>(template: &str, data: &HashMap<&str, &str, S>) -> RouterResult<String> {
    let mut out = String::with_capacity(template.len());
    for segment in compiler::tokenize(template)? {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder(placeholder) => match data.get(placeholder.name) {
                Some(value) => out.push_str(value),
                None if placeholder.optional => {
                    if out.len() > 1 && out.ends_with('/') {
                        out.pop();
                    }
                }
                None => out.push_str(placeholder.raw),
            },
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    Ok(out)
}

/// Splits a URI into its parsed authority, when it has one, and its path.
///
/// Returns `None` if the URI has an authority that does not parse.
fn split_uri(uri: &str) -> Option<(Option<Url>, String)> {
    let uri = uri.split(['?', '#']).next().unwrap_or_default();

    let absolute = if uri.contains("://") {
        Some(Url::parse(uri).ok()?)
    } else if uri.starts_with("//") {
        Some(Url::parse(&format!("http:{uri}")).ok()?)
    } else {
        None
    };

    match absolute {
        Some(url) => {
            url.host_str()?;
            let path = url.path().to_string();
            Some((Some(url), path))
        }
        None if uri.is_empty() => Some((None, "/".to_string())),
        None => Some((None, uri.to_string())),
    }
}

/// Compares the authority of `url` with a `host[:port]` request host.
///
/// Ports are compared after applying the scheme's default, so
/// `https://example.com:443` and `example.com` name the same host.
fn same_host(url: &Url, request_host: &str) -> bool {
    let Ok(request) = Url::parse(&format!("{}://{request_host}", url.scheme())) else {
        return false;
    };
    match (url.host_str(), request.host_str()) {
        (Some(host), Some(expected)) => {
            host.eq_ignore_ascii_case(expected)
                && url.port_or_known_default() == request.port_or_known_default()
        }
        _ => false,
    }
}
