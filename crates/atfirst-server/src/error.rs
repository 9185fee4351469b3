use miette::Diagnostic;
use thiserror::Error;

/// Failures while loading a feed. The `Display` text is shown on the page.
#[derive(Debug, Error, Diagnostic)]
pub enum FeedError {
    #[error("Could not resolve handle {actor}: {reason}")]
    #[diagnostic(code(feed::resolution))]
    Resolution { actor: String, reason: String },

    #[error("Could not resolve DID {did}: {reason}")]
    #[diagnostic(code(feed::did_document))]
    DidDocument { did: String, reason: String },

    #[error("No PDS found for {did}")]
    #[diagnostic(code(feed::no_pds))]
    NoPds { did: String },

    #[error("{endpoint} returned {status}")]
    #[diagnostic(code(feed::upstream))]
    Upstream { endpoint: String, status: u16 },

    #[error("request failed: {0}")]
    #[diagnostic(code(feed::http))]
    Http(#[from] reqwest::Error),
}

/// HTTP server errors
#[derive(Debug, Error, Diagnostic)]
pub enum ServerError {
    #[error("failed to bind to {addr}")]
    #[diagnostic(code(server::bind))]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server terminated unexpectedly")]
    #[diagnostic(code(server::serve))]
    Serve {
        #[source]
        source: std::io::Error,
    },
}
