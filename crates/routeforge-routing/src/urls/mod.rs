//! Route tables, matching, and reverse URL generation.
//!
//! - [`compiler`]: Path templates to anchored regexes with named captures
//! - [`collection`]: The static, dynamic, and named route tables
//! - [`matcher`]: Resolving `(path, method)` to a route and its parameters
//! - [`reverse`]: Generating URLs from route names
//!
//! # Examples
//!
//! ```
//! use std::collections::HashMap;
//!
//! use routeforge_routing::route::{Method, Route};
//! use routeforge_routing::urls::collection::Collection;
//! use routeforge_routing::urls::matcher::Matcher;
//! use routeforge_routing::urls::reverse::{UrlGenerator, UrlOptions};
//!
//! let mut routes = Collection::new();
//! routes.add(Route::get("/users/{id:\\d+}", "user.show")).unwrap();
//!
//! // Forward resolution
//! let m = Matcher::new(&routes).match_path("/users/42", Some(Method::Get)).unwrap();
//! assert_eq!(m.param("id"), Some("42"));
//!
//! // Reverse resolution
//! let mut data = HashMap::new();
//! data.insert("id", "42");
//! let url = UrlGenerator::new(&routes, UrlOptions::default())
//!     .url("user.show", &data, false)
//!     .unwrap();
//! assert_eq!(url, "/users/42");
//! ```

pub mod collection;
pub mod compiler;
pub mod matcher;
pub mod reverse;
