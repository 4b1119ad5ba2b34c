use thiserror::Error;

/// Failure kinds at the document-parsing seam.
///
/// Anything above the parsers wraps these into `anyhow` context; the variants
/// matter to the fetch layer, which falls back from the tabular form to the
/// HTML form on `Decode`/`Structure` and aborts the run on `NoData`.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A date cell did not hold a valid ROC-calendar token. Fatal to the one
    /// row carrying it; parsing continues past it.
    #[error("malformed ROC date token: {0:?}")]
    MalformedDate(String),

    /// The raw bytes did not decode under the declared source encoding.
    #[error("content does not decode as {encoding}")]
    Decode { encoding: &'static str },

    /// The expected header/table shape was absent from the document.
    #[error("{0}")]
    Structure(String),

    /// Both venues failed, or succeeded with zero rows.
    #[error("no attention rows from any venue")]
    NoData,
}
