use http::Method;
use importer_sdk::{PluginManifest, CAPABILITY_FILE_IMPORTER};

/// Operations exposed over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ImportFile,
    Manifest,
    Health,
}

impl Endpoint {
    pub const fn name(self) -> &'static str {
        match self {
            Endpoint::ImportFile => "import_file",
            Endpoint::Manifest => "manifest",
            Endpoint::Health => "health",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Matched(Endpoint),
    MethodNotAllowed,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<RouteHandle>,
}

#[derive(Debug, Clone)]
struct RouteHandle {
    endpoint: Endpoint,
    method: Method,
    path: &'static str,
}

impl Router {
    /// Builds the route table for a plugin; the import route is only mounted
    /// when the manifest advertises the importer capability.
    pub fn build(manifest: &PluginManifest) -> Self {
        let mut routes = vec![
            RouteHandle {
                endpoint: Endpoint::Manifest,
                method: Method::GET,
                path: "/manifest",
            },
            RouteHandle {
                endpoint: Endpoint::Health,
                method: Method::GET,
                path: "/health",
            },
        ];
        if manifest.requires_capability(CAPABILITY_FILE_IMPORTER) {
            routes.insert(
                0,
                RouteHandle {
                    endpoint: Endpoint::ImportFile,
                    method: Method::POST,
                    path: "/import_file",
                },
            );
        }
        Self { routes }
    }

    pub fn select(&self, method: &Method, path: &str) -> Selection {
        let path = normalize(path);
        let mut path_known = false;
        for route in self.routes.iter().filter(|route| route.path == path) {
            path_known = true;
            if route.method == method
                || (method == Method::HEAD && route.method == Method::GET)
            {
                return Selection::Matched(route.endpoint);
            }
        }
        if path_known {
            Selection::MethodNotAllowed
        } else {
            Selection::NotFound
        }
    }
}

fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
