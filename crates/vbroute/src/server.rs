//! Cluster nodes and the service endpoints they expose.

use std::fmt;

/// A service a node may expose on its own port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// The key-value (memcached binary protocol) service.
    Data,
    /// The cluster management REST API.
    Mgmt,
    /// Map/reduce views.
    Views,
    /// The query service.
    Query,
    /// Full-text search.
    Search,
    /// Analytics.
    Analytics,
    /// Eventing functions.
    Eventing,
}

impl ServiceKind {
    /// Every service kind, in display order.
    pub const ALL: [ServiceKind; 7] = [
        ServiceKind::Data,
        ServiceKind::Mgmt,
        ServiceKind::Views,
        ServiceKind::Query,
        ServiceKind::Search,
        ServiceKind::Analytics,
        ServiceKind::Eventing,
    ];

    /// Parses a service name as used on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "data" | "kv" => Some(ServiceKind::Data),
            "mgmt" => Some(ServiceKind::Mgmt),
            "views" | "capi" => Some(ServiceKind::Views),
            "query" | "n1ql" => Some(ServiceKind::Query),
            "search" | "fts" => Some(ServiceKind::Search),
            "analytics" | "cbas" => Some(ServiceKind::Analytics),
            "eventing" => Some(ServiceKind::Eventing),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceKind::Data => "data",
            ServiceKind::Mgmt => "mgmt",
            ServiceKind::Views => "views",
            ServiceKind::Query => "query",
            ServiceKind::Search => "search",
            ServiceKind::Analytics => "analytics",
            ServiceKind::Eventing => "eventing",
        };
        write!(f, "{name}")
    }
}

/// Whether to address the plain or the TLS port of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceMode {
    #[default]
    Plain,
    Tls,
}

/// Ports for each service on a node. Zero means the service is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Services {
    pub data: u16,
    pub mgmt: u16,
    pub views: u16,
    pub query: u16,
    pub search: u16,
    pub analytics: u16,
    pub eventing: u16,
}

impl Services {
    /// Returns the port for `kind`, or `None` if the service is absent.
    pub fn port(&self, kind: ServiceKind) -> Option<u16> {
        let port = match kind {
            ServiceKind::Data => self.data,
            ServiceKind::Mgmt => self.mgmt,
            ServiceKind::Views => self.views,
            ServiceKind::Query => self.query,
            ServiceKind::Search => self.search,
            ServiceKind::Analytics => self.analytics,
            ServiceKind::Eventing => self.eventing,
        };
        (port > 0).then_some(port)
    }

    /// Sets the port for `kind`.
    pub fn set_port(&mut self, kind: ServiceKind, port: u16) {
        let slot = match kind {
            ServiceKind::Data => &mut self.data,
            ServiceKind::Mgmt => &mut self.mgmt,
            ServiceKind::Views => &mut self.views,
            ServiceKind::Query => &mut self.query,
            ServiceKind::Search => &mut self.search,
            ServiceKind::Analytics => &mut self.analytics,
            ServiceKind::Eventing => &mut self.eventing,
        };
        *slot = port;
    }

    /// Returns true if no service has a port.
    pub fn is_empty(&self) -> bool {
        ServiceKind::ALL.iter().all(|k| self.port(*k).is_none())
    }
}

impl fmt::Display for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = ServiceKind::ALL
            .iter()
            .filter_map(|k| self.port(*k).map(|p| format!("{k}={p}")))
            .collect();
        if parts.is_empty() {
            write!(f, "-")
        } else {
            write!(f, "{}", parts.join(","))
        }
    }
}

/// A single node of the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    /// Host name or address, without brackets for IPv6 literals.
    pub hostname: String,
    /// `host:port` display form, using the data port when there is one.
    pub authority: String,
    /// Plain-text service ports.
    pub services: Services,
    /// TLS service ports (all zero on configs that predate TLS).
    pub services_ssl: Services,
}

impl Server {
    /// Creates a server exposing `services` over plain connections only.
    pub fn new(hostname: impl Into<String>, services: Services) -> Self {
        let hostname = hostname.into();
        let authority = make_authority(&hostname, &services);
        Self {
            hostname,
            authority,
            services,
            services_ssl: Services::default(),
        }
    }

    /// Sets the TLS service ports.
    pub fn with_ssl(mut self, services_ssl: Services) -> Self {
        self.services_ssl = services_ssl;
        self
    }

    /// Returns true if this node carries data (exposes the data service).
    pub fn is_data_node(&self) -> bool {
        self.services.data > 0
    }

    /// Returns the port of a service in the given mode.
    pub fn port(&self, kind: ServiceKind, mode: ServiceMode) -> Option<u16> {
        match mode {
            ServiceMode::Plain => self.services.port(kind),
            ServiceMode::Tls => self.services_ssl.port(kind),
        }
    }

    /// Returns `host:port` for a service, bracketing IPv6 hosts.
    pub fn hostport(&self, kind: ServiceKind, mode: ServiceMode) -> Option<String> {
        self.port(kind, mode)
            .map(|port| join_hostport(&self.hostname, port))
    }

    /// Returns the base REST URL for an HTTP service.
    ///
    /// The data service is not HTTP and never has a URL.
    pub fn rest_url(&self, kind: ServiceKind, mode: ServiceMode) -> Option<String> {
        if kind == ServiceKind::Data {
            return None;
        }
        let scheme = match mode {
            ServiceMode::Plain => "http",
            ServiceMode::Tls => "https",
        };
        self.hostport(kind, mode)
            .map(|hp| format!("{scheme}://{hp}"))
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.authority)
    }
}

/// Authority for a node: data port if present, else management port.
pub(crate) fn make_authority(hostname: &str, services: &Services) -> String {
    let port = services
        .port(ServiceKind::Data)
        .or(services.port(ServiceKind::Mgmt))
        .unwrap_or(0);
    join_hostport(hostname, port)
}

pub(crate) fn join_hostport(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// Splits `host:port`, accepting bracketed IPv6 hosts. Returns the bare
/// host (brackets removed) and the port.
pub(crate) fn split_hostport(s: &str) -> Option<(&str, u16)> {
    let (host, port) = if let Some(rest) = s.strip_prefix('[') {
        let close = rest.find(']')?;
        let port = rest[close + 1..].strip_prefix(':')?;
        (&rest[..close], port)
    } else {
        s.rsplit_once(':')?
    };
    if host.is_empty() {
        return None;
    }
    Some((host, port.parse().ok()?))
}
