use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("intent classifier unreachable: {0}")]
    Transport(String),

    #[error("intent classifier returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed intent classifier payload: {0}")]
    Malformed(String),
}

/// Failures surfaced by a reply resolution. Absence of data is never an error.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error("reply store failure: {0:#}")]
    Store(#[source] anyhow::Error),
}

impl ResolveError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Classifier(_) => "classifier",
            Self::Store(_) => "store",
        }
    }
}
